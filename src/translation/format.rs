use std::path::PathBuf;

use serde::{
    Deserialize,
    Serialize,
};
use thiserror::Error;

use super::json::JsonFormat;
use super::record::TranslationRecord;
use super::xlf::XlfFormat;

/// Errors raised while reading or writing a translation file.
#[derive(Error, Debug)]
pub enum TranslationFileError {
    /// The file parsed but contained no strings at all.
    #[error("Translation file '{0}' contains no translations")]
    Empty(String),
    #[error("Failed to parse translation file '{origin}': {source}")]
    Parse {
        origin: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("Failed to parse translation file '{origin}': {source}")]
    Xml {
        origin: String,
        #[source]
        source: quick_xml::Error,
    },
    #[error("Failed to serialize translations: {0}")]
    Serialize(#[source] serde_json::Error),
    #[error("I/O error on translation file '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// A serialization format for translation records.
pub trait TranslationFormat: std::fmt::Debug {
    /// Parses `content`, adding every entry and the file header to `record`.
    ///
    /// `origin` names the content in error messages.
    ///
    /// # Errors
    /// Returns [`TranslationFileError::Empty`] when the content has no
    /// entries, or a parse error when it is malformed.
    fn read(
        &self,
        origin: &str,
        content: &str,
        record: &mut TranslationRecord,
    ) -> Result<(), TranslationFileError>;

    /// Renders `record` as file content.
    ///
    /// # Errors
    /// Returns an error if serialization fails.
    fn write(&self, record: &TranslationRecord) -> Result<String, TranslationFileError>;
}

/// Config tag selecting a [`TranslationFormat`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TranslationFormatKind {
    #[default]
    Json,
    /// XLIFF 1.2
    Xlf,
}

impl TranslationFormatKind {
    #[must_use]
    pub fn create(self) -> Box<dyn TranslationFormat> {
        match self {
            Self::Json => Box::new(JsonFormat),
            Self::Xlf => Box::new(XlfFormat),
        }
    }
}

/// Stored entries in file order: untranslated first, then translated, each
/// group sorted by key. Blank keys are left out.
pub(super) fn entries_for_writing(record: &TranslationRecord) -> Vec<(&str, Option<&str>)> {
    let (mut untranslated, mut translated): (Vec<_>, Vec<_>) = record
        .entries()
        .filter(|(native, _)| !native.trim().is_empty())
        .partition(|(_, translation)| translation.is_none());
    untranslated.sort_unstable();
    translated.sort_unstable();
    untranslated.extend(translated);
    untranslated
}
