//! Deduplicating table of logical string keys.
//!
//! Extractors build one [`StringMapping`] per file; the pipeline folds them
//! together with [`StringMapping::combine_with`]. The first value seen for a
//! key wins, and every file that mentioned the key is kept as provenance.

use std::collections::HashSet;

use indexmap::IndexMap;
use indexmap::map::Entry;

use crate::placeholder::normalize;

/// Source identifier used when a mapping is not tied to a file.
pub const REFERENCE_SOURCE: &str = "reference mapping";

/// Normalizes escapes in extracted text.
///
/// `\'`, `\"`, `\\`, `\t` and `\uXXXX` are unescaped. Line breaks, whether
/// real or already escaped, end up as the two-character sequences `\r` and
/// `\n` so they survive being written back into a resource file.
///
/// # Examples
/// ```
/// use l10n_sync::mapping::filter_string;
///
/// assert_eq!(filter_string(r"There\'s no escape!"), "There's no escape!");
/// assert_eq!(filter_string("New\r\nline"), r"New\r\nline");
/// assert_eq!(filter_string(r"New\r\nline"), r"New\r\nline");
/// ```
#[must_use]
pub fn filter_string(raw: &str) -> String {
    let mut result = String::with_capacity(raw.len());
    let mut chars = raw.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\r' => result.push_str("\\r"),
            '\n' => result.push_str("\\n"),
            '\\' => match chars.next() {
                Some('r') => result.push_str("\\r"),
                Some('n') => result.push_str("\\n"),
                Some('t') => result.push('\t'),
                Some(escaped @ ('\\' | '\'' | '"')) => result.push(escaped),
                Some('u') => {
                    let hex: String = chars.clone().take(4).collect();
                    let is_hex = hex.len() == 4 && hex.chars().all(|h| h.is_ascii_hexdigit());
                    match u32::from_str_radix(&hex, 16).ok().and_then(char::from_u32) {
                        Some(decoded) if is_hex => {
                            result.push(decoded);
                            for _ in 0..4 {
                                chars.next();
                            }
                        }
                        _ => result.push_str("\\u"),
                    }
                }
                Some(other) => {
                    result.push('\\');
                    result.push(other);
                }
                None => result.push('\\'),
            },
            other => result.push(other),
        }
    }
    result
}

/// Logical key → native-language string, with provenance per key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StringMapping {
    /// Identifier recorded as provenance by [`Self::add_mapping`].
    source: String,
    strings: IndexMap<String, Option<String>>,
    sources: IndexMap<String, Vec<String>>,
    /// Keys for which a different value was discarded, once per discard.
    conflicts: Vec<String>,
}

impl Default for StringMapping {
    fn default() -> Self {
        Self::new(REFERENCE_SOURCE)
    }
}

impl StringMapping {
    #[must_use]
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            strings: IndexMap::new(),
            sources: IndexMap::new(),
            conflicts: Vec::new(),
        }
    }

    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.strings.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }

    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.strings.contains_key(key)
    }

    /// Returns the native-language string mapped to `key`.
    #[must_use]
    pub fn get_string(&self, key: &str) -> Option<&str> {
        self.strings.get(key).and_then(Option::as_deref)
    }

    /// Returns every source that contributed `key`.
    ///
    /// A key without recorded provenance reports this mapping's own source.
    #[must_use]
    pub fn get_filenames(&self, key: &str) -> &[String] {
        self.sources.get(key).map_or_else(|| std::slice::from_ref(&self.source), Vec::as_slice)
    }

    /// Iterates keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.strings.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
        self.strings.iter().map(|(key, value)| (key.as_str(), value.as_deref()))
    }

    /// Adds a key read from this mapping's source.
    ///
    /// The first value stored for a key is kept. A repeat only appends the
    /// source to the key's provenance, and counts a dropped conflict when
    /// its value differs.
    pub fn add_mapping(&mut self, key: &str, value: Option<&str>) {
        let key = filter_string(key);
        let value = value.map(filter_string);

        match self.strings.entry(key.clone()) {
            Entry::Vacant(entry) => {
                entry.insert(value);
            }
            Entry::Occupied(entry) if *entry.get() != value => {
                tracing::debug!(
                    key = %key,
                    source = %self.source,
                    "Duplicate key with a different value; keeping the first"
                );
                self.conflicts.push(key.clone());
            }
            Entry::Occupied(_) => {}
        }

        let source = self.source.clone();
        self.add_filenames(&key, std::iter::once(source));
    }

    fn add_filenames(&mut self, key: &str, filenames: impl IntoIterator<Item = String>) {
        self.sources.entry(key.to_string()).or_default().extend(filenames);
    }

    pub fn delete_mapping(&mut self, key: &str) {
        self.strings.shift_remove(key);
        self.sources.shift_remove(key);
    }

    /// Merges `other` into this mapping.
    ///
    /// Values are imported only for keys this mapping does not have yet;
    /// provenance is always merged.
    pub fn combine_with(&mut self, other: &Self) {
        for (key, value) in &other.strings {
            match self.strings.entry(key.clone()) {
                Entry::Vacant(entry) => {
                    entry.insert(value.clone());
                }
                Entry::Occupied(entry) if entry.get() != value => {
                    tracing::debug!(
                        key = %key,
                        source = %other.source,
                        "Duplicate key across files with a different value; keeping the first"
                    );
                    self.conflicts.push(key.clone());
                }
                Entry::Occupied(_) => {}
            }

            let filenames = other.get_filenames(key).to_vec();
            self.add_filenames(key, filenames);
        }
        self.conflicts.extend(other.conflicts.iter().cloned());
    }

    /// Returns a detached copy of the key → value table.
    #[must_use]
    pub fn get_string_mapping_dict(&self) -> IndexMap<String, Option<String>> {
        self.strings.clone()
    }

    /// Number of values discarded by first-writer-wins.
    #[must_use]
    pub fn dropped_conflicts(&self) -> usize {
        self.conflicts.len()
    }

    #[must_use]
    pub fn conflicting_keys(&self) -> &[String] {
        &self.conflicts
    }

    /// Deletes every entry whose key or value, in canonical form, is ignored.
    ///
    /// Returns the number of deleted entries.
    #[allow(clippy::implicit_hasher)]
    pub fn remove_ignored(&mut self, ignored: &HashSet<String>) -> usize {
        if ignored.is_empty() {
            return 0;
        }

        let doomed: Vec<String> = self
            .strings
            .iter()
            .filter(|(key, value)| {
                ignored.contains(&normalize(key).0)
                    || value.as_deref().is_some_and(|value| ignored.contains(&normalize(value).0))
            })
            .map(|(key, _)| key.clone())
            .collect();

        for key in &doomed {
            self.delete_mapping(key);
        }
        doomed.len()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use googletest::prelude::*;
    use rstest::rstest;

    use super::*;

    #[googletest::test]
    fn get_accessors() {
        let mut mapping = StringMapping::new("1.txt");
        mapping.add_mapping("SomeKey", Some("Translation for some key"));

        expect_that!(mapping.get_string("SomeKey"), some(eq("Translation for some key")));
        expect_that!(mapping.get_filenames("SomeKey").to_vec(), elements_are![eq("1.txt")]);
        expect_that!(mapping.get_string("Missing"), none());
        expect_that!(mapping.get_filenames("Missing").to_vec(), elements_are![eq("1.txt")]);
    }

    #[googletest::test]
    fn add_mapping_first_writer_wins() {
        let mut first = StringMapping::new("a.strings");
        first.add_mapping("Key", Some("v1"));
        let mut second = StringMapping::new("b.strings");
        second.add_mapping("Key", Some("v2"));
        let mut mapping = StringMapping::default();

        mapping.combine_with(&first);
        mapping.combine_with(&second);

        expect_that!(mapping.get_string("Key"), some(eq("v1")));
        expect_that!(mapping.get_filenames("Key").to_vec(), elements_are![eq("a.strings"), eq("b.strings")]);
        expect_that!(mapping.dropped_conflicts(), eq(1));
    }

    #[googletest::test]
    fn add_mapping_repeat_within_file() {
        let mut mapping = StringMapping::new("1.txt");
        mapping.add_mapping("Key", Some("v1"));
        mapping.add_mapping("Key", Some("v2"));
        mapping.add_mapping("Key", Some("v1"));

        expect_that!(mapping.get_string("Key"), some(eq("v1")));
        expect_that!(mapping.get_filenames("Key").to_vec(), elements_are![eq("1.txt"), eq("1.txt"), eq("1.txt")]);
        expect_that!(mapping.dropped_conflicts(), eq(1));
        expect_that!(mapping.conflicting_keys().to_vec(), elements_are![eq("Key")]);
    }

    #[googletest::test]
    fn combine_string_mappings() {
        let mut mapping1 = StringMapping::new("1.txt");
        mapping1.add_mapping("SomeKey", Some("Translation for some key"));
        let mut mapping2 = StringMapping::new("2.txt");
        mapping2.add_mapping("SomeOtherKey", Some("Translation for the other string"));
        let mut reference = StringMapping::default();

        reference.combine_with(&mapping1);
        reference.combine_with(&mapping2);

        expect_that!(reference.get_string("SomeKey"), some(eq("Translation for some key")));
        expect_that!(reference.get_filenames("SomeKey").to_vec(), elements_are![eq("1.txt")]);
        expect_that!(
            reference.get_string("SomeOtherKey"),
            some(eq("Translation for the other string"))
        );
        expect_that!(reference.get_filenames("SomeOtherKey").to_vec(), elements_are![eq("2.txt")]);
        expect_that!(reference.dropped_conflicts(), eq(0));
    }

    #[googletest::test]
    fn combine_with_counts_donor_conflicts() {
        let mut donor = StringMapping::new("1.txt");
        donor.add_mapping("Key", Some("v1"));
        donor.add_mapping("Key", Some("v2"));
        let mut reference = StringMapping::default();

        reference.combine_with(&donor);

        expect_that!(reference.dropped_conflicts(), eq(1));
    }

    #[googletest::test]
    fn keys_keep_insertion_order() {
        let mut mapping = StringMapping::new("1.txt");
        mapping.add_mapping("SomeKey", Some("Translation for some key"));
        mapping.add_mapping("SomeOtherKey", Some("Translation for the other string"));

        let keys: Vec<&str> = mapping.keys().collect();

        expect_that!(keys, elements_are![eq(&"SomeKey"), eq(&"SomeOtherKey")]);
    }

    #[googletest::test]
    fn string_mapping_dict_is_detached() {
        let mut mapping = StringMapping::new("1.txt");
        mapping.add_mapping("Key", Some("Value"));

        let mut dict = mapping.get_string_mapping_dict();
        dict.insert("Other".to_string(), None);
        dict.shift_remove("Key");

        expect_that!(mapping.get_string("Key"), some(eq("Value")));
        expect_that!(mapping.contains_key("Other"), eq(false));
    }

    #[googletest::test]
    fn delete_mapping_removes_provenance() {
        let mut mapping = StringMapping::new("1.txt");
        mapping.add_mapping("Key", Some("Value"));

        mapping.delete_mapping("Key");

        expect_that!(mapping.is_empty(), eq(true));
        expect_that!(mapping.get_filenames("Key").to_vec(), elements_are![eq("1.txt")]);
    }

    #[googletest::test]
    fn remove_ignored_matches_canonical_key_or_value() {
        let mut mapping = StringMapping::new("1.txt");
        mapping.add_mapping("Page %d", Some("Page %d"));
        mapping.add_mapping("OK_BUTTON", Some("OK"));
        mapping.add_mapping("Cancel", Some("Cancel"));
        let ignored: HashSet<String> = ["Page {0}", "OK"].iter().map(ToString::to_string).collect();

        let removed = mapping.remove_ignored(&ignored);

        expect_that!(removed, eq(2));
        expect_that!(mapping.keys().collect::<Vec<_>>(), elements_are![eq(&"Cancel")]);
    }

    #[rstest]
    #[case::apostrophe(r"There\'s no escape!", "There's no escape!")]
    #[case::real_newline("New\r\nline", r"New\r\nline")]
    #[case::escaped_newline(r"New\r\nline", r"New\r\nline")]
    #[case::quote(r#"Say \"hi\""#, r#"Say "hi""#)]
    #[case::backslash(r"C:\\Temp", r"C:\Temp")]
    #[case::tab(r"a\tb", "a\tb")]
    #[case::unicode(r"Loading\u2026", "Loading\u{2026}")]
    #[case::bad_unicode(r"\uZZ", r"\uZZ")]
    #[case::unknown(r"\q", r"\q")]
    #[case::trailing(r"end\", r"end\")]
    fn filter_string_unescapes(#[case] raw: &str, #[case] expected: &str) {
        assert_that!(filter_string(raw), eq(expected));
    }
}
