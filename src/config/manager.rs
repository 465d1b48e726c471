//! Loads, validates and resolves the run configuration.

use std::path::{
    Path,
    PathBuf,
};

use super::{
    ConfigError,
    PlatformSettings,
    SyncSettings,
    ValidationError,
    loader,
};
use crate::translation::TranslationMetadata;

/// Validated settings plus the root every relative path resolves against.
#[derive(Default, Debug, Clone)]
pub struct ConfigManager {
    current_settings: SyncSettings,
    root: PathBuf,
}

impl ConfigManager {
    /// Loads `config_path`, or `<root>/.l10n-sync.json` when `None`.
    ///
    /// A missing file falls back to defaults, which then fail validation
    /// for want of platforms.
    ///
    /// # Errors
    /// - File read error
    /// - JSON parse error
    /// - Validation errors
    pub fn load_settings(root: &Path, config_path: Option<&Path>) -> Result<Self, ConfigError> {
        let config_path = config_path
            .map_or_else(|| root.join(loader::DEFAULT_CONFIG_FILE), Path::to_path_buf);

        let settings = loader::load_from_path(&config_path)?.unwrap_or_default();
        Self::from_settings(root.to_path_buf(), settings)
    }

    /// # Errors
    /// Returns the validation errors of `settings`.
    pub fn from_settings(root: PathBuf, settings: SyncSettings) -> Result<Self, ConfigError> {
        settings.validate().map_err(ConfigError::ValidationErrors)?;
        tracing::debug!(root = %root.display(), platforms = settings.platforms.len(), "Settings loaded");

        Ok(Self { current_settings: settings, root })
    }

    #[must_use]
    pub const fn get_settings(&self) -> &SyncSettings {
        &self.current_settings
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Platforms to process, in order.
    ///
    /// # Errors
    /// Returns a validation error if `only` names no configured platform.
    pub fn platform_queue(&self, only: Option<&str>) -> Result<Vec<String>, ConfigError> {
        let platforms = &self.current_settings.platforms;
        match only {
            None => Ok(platforms.keys().cloned().collect()),
            Some(name) if platforms.contains_key(name) => Ok(vec![name.to_string()]),
            Some(name) => {
                let known = platforms.keys().map(String::as_str).collect::<Vec<_>>().join(", ");
                Err(ConfigError::ValidationErrors(vec![ValidationError::new(
                    "platforms",
                    format!("Unknown platform '{name}'. Configured platforms: {known}"),
                )]))
            }
        }
    }

    #[must_use]
    pub fn platform(&self, name: &str) -> Option<&PlatformSettings> {
        self.current_settings.platforms.get(name)
    }

    #[must_use]
    pub fn translations_dir(&self) -> PathBuf {
        self.root.join(&self.current_settings.translations_path)
    }

    #[must_use]
    pub fn database_path(&self) -> PathBuf {
        self.translations_dir().join(&self.current_settings.database_path)
    }

    #[must_use]
    pub fn translation_file_path(&self, language: &str) -> Option<PathBuf> {
        self.current_settings
            .files_by_language
            .get(language)
            .map(|file| self.translations_dir().join(file))
    }

    #[must_use]
    pub fn source_root(&self, platform: &PlatformSettings) -> PathBuf {
        self.root.join(&platform.source_path)
    }

    #[must_use]
    pub fn language_code(&self, language: &str) -> Option<&str> {
        self.current_settings.language_codes.get(language).map(String::as_str)
    }

    /// Header written into the translation file for `language`.
    #[must_use]
    pub fn translation_metadata(&self, language: &str) -> TranslationMetadata {
        let settings = &self.current_settings;
        TranslationMetadata {
            language: language.to_string(),
            language_code: self.language_code(language).unwrap_or_default().to_string(),
            source_language: self
                .language_code(&settings.native_language)
                .unwrap_or_default()
                .to_string(),
            company_name: settings.company_name.clone(),
            product_name: settings.product_name.clone(),
            contact_email: settings.contact_email.clone(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::fs;

    use googletest::prelude::*;
    use rstest::rstest;
    use tempfile::TempDir;

    use super::*;

    const CONFIG: &str = r#"{
        "translationsPath": "l10n",
        "outputLanguages": ["French"],
        "languageCodes": {"English": "en-US", "French": "fr-FR"},
        "filesByLanguage": {"French": "fr.json"},
        "productName": "Widget",
        "platforms": {
            "ios": {"sourcePath": "ios", "parsersByExtension": {"strings": "strings"}},
            "android": {"sourcePath": "android", "parsersByExtension": {"properties": "properties"}}
        }
    }"#;

    fn write_config(dir: &TempDir) {
        fs::write(dir.path().join(".l10n-sync.json"), CONFIG).unwrap();
    }

    #[rstest]
    fn load_settings_from_root() {
        let temp_dir = TempDir::new().unwrap();
        write_config(&temp_dir);

        let manager = ConfigManager::load_settings(temp_dir.path(), None).unwrap();

        assert_eq!(manager.get_settings().product_name, "Widget");
        assert_eq!(manager.database_path(), temp_dir.path().join("l10n/translations.sql"));
        assert_eq!(manager.translation_file_path("French"), Some(temp_dir.path().join("l10n/fr.json")));
        assert_eq!(manager.translation_file_path("German"), None);
    }

    #[rstest]
    fn load_settings_from_explicit_path() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("custom.json");
        fs::write(&config_path, CONFIG).unwrap();

        let manager = ConfigManager::load_settings(temp_dir.path(), Some(&config_path)).unwrap();

        assert_eq!(manager.root(), temp_dir.path());
    }

    #[rstest]
    fn missing_config_fails_validation() {
        let temp_dir = TempDir::new().unwrap();

        let result = ConfigManager::load_settings(temp_dir.path(), None);

        assert!(matches!(result, Err(ConfigError::ValidationErrors(_))));
    }

    #[rstest]
    #[case::all(None, &["ios", "android"])]
    #[case::single(Some("android"), &["android"])]
    fn platform_queue_keeps_file_order(#[case] only: Option<&str>, #[case] expected: &[&str]) {
        let temp_dir = TempDir::new().unwrap();
        write_config(&temp_dir);
        let manager = ConfigManager::load_settings(temp_dir.path(), None).unwrap();

        let queue = manager.platform_queue(only).unwrap();

        assert_eq!(queue, expected);
    }

    #[rstest]
    fn platform_queue_rejects_unknown_platform() {
        let temp_dir = TempDir::new().unwrap();
        write_config(&temp_dir);
        let manager = ConfigManager::load_settings(temp_dir.path(), None).unwrap();

        let result = manager.platform_queue(Some("windows"));

        assert_that!(
            result,
            err(displays_as(contains_substring("Unknown platform 'windows'")))
        );
    }

    #[rstest]
    fn translation_metadata_uses_language_codes() {
        let temp_dir = TempDir::new().unwrap();
        write_config(&temp_dir);
        let manager = ConfigManager::load_settings(temp_dir.path(), None).unwrap();

        let metadata = manager.translation_metadata("French");

        assert_eq!(metadata.language, "French");
        assert_eq!(metadata.language_code, "fr-FR");
        assert_eq!(metadata.source_language, "en-US");
        assert_eq!(metadata.product_name, "Widget");
    }
}
