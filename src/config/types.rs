use indexmap::IndexMap;
use serde::{
    Deserialize,
    Serialize,
};
use thiserror::Error;

use crate::extract::ExtractorKind;
use crate::store::DEFAULT_RETENTION_DAYS;
use crate::translation::TranslationFormatKind;
use crate::vcs::VcsKind;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Configuration error in '{field_path}': {message}")]
pub struct ValidationError {
    /// JSON path to the field (e.g., "platforms.ios.includePatterns[0]")
    pub field_path: String,
    pub message: String,
}

impl ValidationError {
    #[must_use]
    pub fn new(field_path: impl Into<String>, message: impl Into<String>) -> Self {
        Self { field_path: field_path.into(), message: message.into() }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration validation failed:\n{}", format_validation_errors(.0))]
    ValidationErrors(Vec<ValidationError>),

    #[error("Failed to load configuration file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse configuration: {0}")]
    ParseError(#[from] serde_json::Error),
}

fn format_validation_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .enumerate()
        .map(|(i, err)| format!("  {}. {} - {}", i + 1, err.field_path, err.message))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Contents of the `.l10n-sync.json` file.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SyncSettings {
    /// SQL dump of the translation store, relative to `translations_path`.
    pub database_path: String,
    /// Directory (usually its own repository) holding the translation files.
    pub translations_path: String,
    pub vcs: VcsKind,

    /// Language the native strings are written in, e.g. "English".
    pub native_language: String,
    pub output_languages: Vec<String>,
    /// Language name → language code, e.g. "French" → "fr-FR".
    pub language_codes: IndexMap<String, String>,
    /// Language name → translation file, relative to `translations_path`.
    pub files_by_language: IndexMap<String, String>,
    pub translation_format: TranslationFormatKind,

    pub company_name: String,
    pub product_name: String,
    pub contact_email: String,

    /// Fail a platform when a translation file has no translated entries.
    pub abort_if_no_translations: bool,
    /// Wrap untranslated strings in `≤…≥` in localized resources.
    pub mark_untranslated: bool,
    /// Days a key may go unseen on every platform before it is purged.
    pub retention_days: u32,
    pub strings_to_ignore: Vec<String>,

    /// Platforms in run order.
    pub platforms: IndexMap<String, PlatformSettings>,
}

/// One codebase whose resources are synced.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PlatformSettings {
    /// Source root, relative to the working root.
    pub source_path: String,
    pub include_patterns: Vec<String>,
    pub exclude_patterns: Vec<String>,
    /// Files whose key/value pairs form the platform mapping.
    ///
    /// Other parseable files only contribute referenced strings.
    pub mapping_patterns: Vec<String>,
    /// File extension (without the dot) → extractor.
    pub parsers_by_extension: IndexMap<String, ExtractorKind>,
    /// Where localized resources are written, relative to the source root.
    ///
    /// Defaults to the directory of each mapping file.
    pub localization_output_dir: Option<String>,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            database_path: "translations.sql".to_string(),
            translations_path: "translations".to_string(),
            vcs: VcsKind::default(),
            native_language: "English".to_string(),
            output_languages: Vec::new(),
            language_codes: IndexMap::new(),
            files_by_language: IndexMap::new(),
            translation_format: TranslationFormatKind::default(),
            company_name: String::new(),
            product_name: String::new(),
            contact_email: String::new(),
            abort_if_no_translations: false,
            mark_untranslated: false,
            retention_days: DEFAULT_RETENTION_DAYS,
            strings_to_ignore: Vec::new(),
            platforms: IndexMap::new(),
        }
    }
}

impl Default for PlatformSettings {
    fn default() -> Self {
        Self {
            source_path: ".".to_string(),
            include_patterns: vec!["**/*".to_string()],
            exclude_patterns: Vec::new(),
            mapping_patterns: Vec::new(),
            parsers_by_extension: IndexMap::new(),
            localization_output_dir: None,
        }
    }
}

fn validate_patterns(field_path: &str, patterns: &[String], errors: &mut Vec<ValidationError>) {
    for (index, pattern) in patterns.iter().enumerate() {
        if let Err(e) = globset::Glob::new(pattern) {
            errors.push(ValidationError::new(
                format!("{field_path}[{index}]"),
                format!("Invalid glob pattern '{pattern}': {e}"),
            ));
        }
    }
}

impl PlatformSettings {
    fn validate_into(&self, name: &str, errors: &mut Vec<ValidationError>) {
        let prefix = format!("platforms.{name}");

        if self.include_patterns.is_empty() {
            errors.push(ValidationError::new(
                format!("{prefix}.includePatterns"),
                "At least one pattern is required. Example: [\"**/*\"]",
            ));
        }
        validate_patterns(&format!("{prefix}.includePatterns"), &self.include_patterns, errors);
        validate_patterns(&format!("{prefix}.excludePatterns"), &self.exclude_patterns, errors);
        validate_patterns(&format!("{prefix}.mappingPatterns"), &self.mapping_patterns, errors);

        if self.parsers_by_extension.is_empty() {
            errors.push(ValidationError::new(
                format!("{prefix}.parsersByExtension"),
                "At least one parser is required. Example: {\"strings\": \"strings\"}",
            ));
        }
    }
}

impl SyncSettings {
    /// # Errors
    /// - No platform is defined
    /// - A language has no code or translation file
    /// - Invalid glob pattern
    /// - Zero retention
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if self.database_path.is_empty() {
            errors.push(ValidationError::new(
                "databasePath",
                "The path cannot be empty. Example: \"translations.sql\"",
            ));
        }

        if !self.language_codes.contains_key(&self.native_language) {
            errors.push(ValidationError::new(
                "languageCodes",
                format!("No language code for the native language '{}'", self.native_language),
            ));
        }

        for (index, language) in self.output_languages.iter().enumerate() {
            if !self.language_codes.contains_key(language) {
                errors.push(ValidationError::new(
                    format!("outputLanguages[{index}]"),
                    format!("No language code for '{language}'. Add it to 'languageCodes'"),
                ));
            }
            if !self.files_by_language.contains_key(language) {
                errors.push(ValidationError::new(
                    format!("outputLanguages[{index}]"),
                    format!("No translation file for '{language}'. Add it to 'filesByLanguage'"),
                ));
            }
        }

        if self.retention_days == 0 {
            errors.push(ValidationError::new(
                "retentionDays",
                "Must be at least 1 day",
            ));
        }

        if self.platforms.is_empty() {
            errors.push(ValidationError::new(
                "platforms",
                "At least one platform is required",
            ));
        }

        for (name, platform) in &self.platforms {
            platform.validate_into(name, &mut errors);
        }

        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing, clippy::expect_used, clippy::panic)]
mod tests {
    use googletest::prelude::*;
    use rstest::*;

    use super::*;

    fn platform() -> PlatformSettings {
        let mut parsers = IndexMap::new();
        parsers.insert("strings".to_string(), ExtractorKind::Strings);
        PlatformSettings { parsers_by_extension: parsers, ..PlatformSettings::default() }
    }

    #[fixture]
    fn settings() -> SyncSettings {
        let mut settings = SyncSettings {
            output_languages: vec!["French".to_string()],
            ..SyncSettings::default()
        };
        settings.language_codes.insert("English".to_string(), "en-US".to_string());
        settings.language_codes.insert("French".to_string(), "fr-FR".to_string());
        settings.files_by_language.insert("French".to_string(), "fr.json".to_string());
        settings.platforms.insert("ios".to_string(), platform());
        settings
    }

    #[rstest]
    fn validate_valid_settings(settings: SyncSettings) {
        assert_that!(settings.validate(), ok(anything()));
    }

    #[rstest]
    fn deserialize_empty_settings() {
        let settings: SyncSettings = serde_json::from_str("{}").unwrap();

        assert_that!(settings.database_path, eq("translations.sql"));
        assert_that!(settings.native_language, eq("English"));
        assert_that!(settings.retention_days, eq(90));
        assert_that!(settings.vcs, eq(VcsKind::None));
        assert_that!(settings.platforms.len(), eq(0));
    }

    #[rstest]
    fn deserialize_platforms_keep_file_order() {
        let json = r#"{
            "vcs": "git",
            "markUntranslated": true,
            "platforms": {
                "web": {"parsersByExtension": {"json": "json"}, "mappingPatterns": ["locales/en.json"]},
                "android": {"sourcePath": "android", "parsersByExtension": {"properties": "properties"}}
            }
        }"#;

        let settings: SyncSettings = serde_json::from_str(json).unwrap();

        assert_that!(settings.vcs, eq(VcsKind::Git));
        assert_that!(settings.mark_untranslated, eq(true));
        assert_that!(
            settings.platforms.keys().collect::<Vec<_>>(),
            elements_are![eq(&"web"), eq(&"android")]
        );
        let android = &settings.platforms["android"];
        assert_that!(android.source_path, eq("android"));
        assert_that!(android.include_patterns, elements_are![eq("**/*")]);
        assert_that!(
            android.parsers_by_extension.get("properties"),
            some(eq(&ExtractorKind::Properties))
        );
    }

    #[rstest]
    fn validate_requires_a_platform(mut settings: SyncSettings) {
        settings.platforms.clear();

        assert_that!(
            settings.validate(),
            err(elements_are![all![
                field!(ValidationError.field_path, eq("platforms")),
                field!(ValidationError.message, contains_substring("At least one platform"))
            ]])
        );
    }

    #[rstest]
    fn validate_output_language_without_code_or_file(mut settings: SyncSettings) {
        settings.output_languages.push("German".to_string());

        assert_that!(
            settings.validate(),
            err(elements_are![
                all![
                    field!(ValidationError.field_path, eq("outputLanguages[1]")),
                    field!(ValidationError.message, contains_substring("No language code for 'German'"))
                ],
                all![
                    field!(ValidationError.field_path, eq("outputLanguages[1]")),
                    field!(ValidationError.message, contains_substring("No translation file"))
                ]
            ])
        );
    }

    #[rstest]
    fn validate_native_language_needs_code(mut settings: SyncSettings) {
        settings.native_language = "Klingon".to_string();

        assert_that!(
            settings.validate(),
            err(elements_are![field!(ValidationError.field_path, eq("languageCodes"))])
        );
    }

    #[rstest]
    fn validate_zero_retention(mut settings: SyncSettings) {
        settings.retention_days = 0;

        assert_that!(
            settings.validate(),
            err(elements_are![field!(ValidationError.field_path, eq("retentionDays"))])
        );
    }

    #[rstest]
    fn validate_platform_without_parsers(mut settings: SyncSettings) {
        settings.platforms.insert("web".to_string(), PlatformSettings::default());

        assert_that!(
            settings.validate(),
            err(elements_are![all![
                field!(ValidationError.field_path, eq("platforms.web.parsersByExtension")),
                field!(ValidationError.message, contains_substring("At least one parser"))
            ]])
        );
    }

    #[rstest]
    #[case::include("includePatterns")]
    #[case::exclude("excludePatterns")]
    #[case::mapping("mappingPatterns")]
    fn validate_invalid_glob(mut settings: SyncSettings, #[case] field: &str) {
        let platform = settings.platforms.get_mut("ios").unwrap();
        let broken = vec!["**/*.{strings".to_string()];
        match field {
            "includePatterns" => platform.include_patterns = broken,
            "excludePatterns" => platform.exclude_patterns = broken,
            _ => platform.mapping_patterns = broken,
        }
        let expected_path = format!("platforms.ios.{field}[0]");

        assert_that!(
            settings.validate(),
            err(elements_are![all![
                field!(ValidationError.field_path, eq(expected_path.as_str())),
                field!(ValidationError.message, contains_substring("Invalid glob pattern")),
                field!(ValidationError.message, contains_substring("**/*.{strings"))
            ]])
        );
    }

    #[rstest]
    fn config_error_validation_errors_format(mut settings: SyncSettings) {
        settings.retention_days = 0;
        settings.platforms.clear();

        let errors = settings.validate().unwrap_err();
        let config_error = ConfigError::ValidationErrors(errors);

        let error_message = format!("{config_error}");
        assert_that!(error_message, contains_substring("Configuration validation failed"));
        assert_that!(error_message, contains_substring("1. retentionDays"));
        assert_that!(error_message, contains_substring("2. platforms"));
    }
}
