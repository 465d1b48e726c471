//! Per-language translation table.

use indexmap::IndexMap;
use serde::{
    Deserialize,
    Serialize,
};

/// Single-character ellipsis, as used by macOS menus.
pub const ELLIPSIS: &str = "\u{2026}";
/// Three-dot ellipsis, as used by Windows menus.
pub const THREE_DOTS: &str = "...";

/// Both ellipsis spellings, in the order companions are synthesized.
const ELLIPSIS_SUFFIXES: [&str; 2] = [ELLIPSIS, THREE_DOTS];

/// Returns `key` without its trailing ellipsis, if it has one.
#[must_use]
pub fn strip_ellipsis(key: &str) -> Option<&str> {
    split_ellipsis(key).map(|(stem, _)| stem)
}

/// Splits `key` into its stem and trailing ellipsis spelling.
fn split_ellipsis(key: &str) -> Option<(&str, &'static str)> {
    ELLIPSIS_SUFFIXES
        .into_iter()
        .find_map(|suffix| key.strip_suffix(suffix).map(|stem| (stem, suffix)))
}

/// The other ellipsis spelling.
fn complementary(suffix: &str) -> &'static str {
    if suffix == ELLIPSIS { THREE_DOTS } else { ELLIPSIS }
}

/// Descriptive fields written alongside the translations.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TranslationMetadata {
    /// Language name, e.g. "French".
    pub language: String,
    /// Language code, e.g. "fr-FR".
    pub language_code: String,
    /// Language code of the native strings.
    pub source_language: String,
    pub company_name: String,
    pub product_name: String,
    pub contact_email: String,
}

/// Native string → translation for one language.
///
/// `None` marks an untranslated string. Ellipsis variants of translated
/// strings are not stored; [`Self::get_translation_dict`] projects them on
/// read.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TranslationRecord {
    pub metadata: TranslationMetadata,
    translations: IndexMap<String, Option<String>>,
}

impl TranslationRecord {
    #[must_use]
    pub fn new(metadata: TranslationMetadata) -> Self {
        Self { metadata, translations: IndexMap::new() }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.translations.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.translations.is_empty()
    }

    /// Stored entries, without ellipsis projection.
    pub fn entries(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
        self.translations.iter().map(|(key, value)| (key.as_str(), value.as_deref()))
    }

    /// Adds or replaces the translation for `native`.
    ///
    /// An untranslated ellipsis string is dropped when its short form is
    /// already present, so it cannot shadow a translated short form.
    pub fn add_translation(&mut self, native: &str, translation: Option<String>) {
        if translation.is_none()
            && let Some(stripped) = strip_ellipsis(native)
            && self.translations.contains_key(stripped)
        {
            return;
        }

        self.translations.insert(native.to_string(), translation);
    }

    pub fn delete_translation(&mut self, native: &str) {
        self.translations.shift_remove(native);
    }

    #[must_use]
    pub fn get_translation(&self, native: &str) -> Option<&str> {
        self.translations.get(native).and_then(Option::as_deref)
    }

    /// Returns true when at least one string is translated.
    #[must_use]
    pub fn has_translations(&self) -> bool {
        self.translations.values().any(Option::is_some)
    }

    #[must_use]
    pub fn untranslated_keys(&self) -> Vec<&str> {
        self.translations
            .iter()
            .filter(|(_, value)| value.is_none())
            .map(|(key, _)| key.as_str())
            .collect()
    }

    /// Returns all translations plus synthesized ellipsis companions.
    ///
    /// For every translated key without an ellipsis, `key…` and `key...` map
    /// to the translation with the same suffix. A translated key that ends in
    /// one spelling also gets the other, with the suffix of its translation
    /// swapped; it takes precedence over a companion of the short key.
    /// Explicitly stored keys are never replaced. The record itself is not
    /// modified.
    #[must_use]
    pub fn get_translation_dict(&self) -> IndexMap<String, Option<String>> {
        let mut projected = self.translations.clone();
        let translated = self
            .translations
            .iter()
            .filter_map(|(key, value)| value.as_deref().map(|value| (key.as_str(), value)));

        let (long, short): (Vec<_>, Vec<_>) =
            translated.partition(|(key, _)| split_ellipsis(key).is_some());

        for (key, value) in short {
            for suffix in ELLIPSIS_SUFFIXES {
                let companion = format!("{key}{suffix}");
                if !self.translations.contains_key(&companion) {
                    projected.insert(companion, Some(format!("{value}{suffix}")));
                }
            }
        }

        for (key, value) in long {
            let Some((stem, suffix)) = split_ellipsis(key) else {
                continue;
            };
            let other = complementary(suffix);
            let companion = format!("{stem}{other}");
            if !self.translations.contains_key(&companion) {
                let value_stem = value.strip_suffix(suffix).unwrap_or(value);
                projected.insert(companion, Some(format!("{value_stem}{other}")));
            }
        }

        projected
    }

    /// Merges `other` into this record; `other` wins, except that a
    /// translated entry is never replaced by an untranslated one.
    pub fn combine_with(&mut self, other: &Self) {
        for (key, value) in other.get_translation_dict() {
            let keeps_translation =
                value.is_none() && self.translations.get(&key).is_some_and(Option::is_some);
            if !keeps_translation {
                self.add_translation(&key, value);
            }
        }
    }

    pub fn remove_untranslated_strings(&mut self) {
        self.translations.retain(|_, value| value.is_some());
    }

    pub fn remove_translated_strings(&mut self) {
        self.translations.retain(|_, value| value.is_none());
    }
}

/// Replaces every untranslated value with its key wrapped in `≤…≥`, so
/// missing translations stand out in localized builds.
#[must_use]
pub fn mark_untranslated(
    translations: IndexMap<String, Option<String>>,
) -> IndexMap<String, Option<String>> {
    translations
        .into_iter()
        .map(|(key, value)| {
            let value = value.unwrap_or_else(|| format!("\u{2264}{key}\u{2265}"));
            (key, Some(value))
        })
        .collect()
}
