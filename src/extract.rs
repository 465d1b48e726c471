//! Per-format string extractors and writers.
/// Nested JSON resources
mod json;
/// Java `.properties` files
mod properties;
/// Apple `.strings` files
mod strings;

use std::fmt;
use std::path::PathBuf;

use indexmap::IndexMap;
pub use json::{
    JsonExtractor,
    flatten_json,
};
pub use properties::PropertiesExtractor;
use serde::{
    Deserialize,
    Serialize,
};
pub use strings::StringsExtractor;
use thiserror::Error;

use crate::mapping::StringMapping;

/// Errors raised while extracting or writing a resource file.
#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("{source_name}:{line}: {message}")]
    Syntax { source_name: String, line: usize, message: String },
    #[error("Failed to parse '{source_name}': {source}")]
    Json {
        source_name: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("Failed to render resource file: {0}")]
    Render(String),
    #[error("I/O error on '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Reads key/value pairs out of one resource format and writes them back.
pub trait Extractor: fmt::Debug {
    /// Parses `content` into a mapping whose provenance is `source`.
    ///
    /// # Errors
    /// Returns error if `content` is malformed.
    fn extract_mapping(&self, source: &str, content: &str) -> Result<StringMapping, ExtractError>;

    /// Lookup keys referenced by `content`.
    ///
    /// # Errors
    /// Returns error if `content` is malformed.
    fn extract_strings(&self, source: &str, content: &str) -> Result<Vec<String>, ExtractError> {
        Ok(self.extract_mapping(source, content)?.keys().map(str::to_string).collect())
    }

    /// Renders `mapping` in this format. Entries without a value are skipped.
    ///
    /// # Errors
    /// Returns error if the mapping cannot be represented.
    fn write_mapping(
        &self,
        mapping: &IndexMap<String, Option<String>>,
    ) -> Result<String, ExtractError>;
}

/// Config tag selecting an [`Extractor`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtractorKind {
    Properties,
    Strings,
    Json,
}

impl ExtractorKind {
    #[must_use]
    pub fn create(self) -> Box<dyn Extractor> {
        match self {
            Self::Properties => Box::new(PropertiesExtractor),
            Self::Strings => Box::new(StringsExtractor),
            Self::Json => Box::new(JsonExtractor),
        }
    }
}

impl fmt::Display for ExtractorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self {
            Self::Properties => "properties",
            Self::Strings => "strings",
            Self::Json => "json",
        };
        f.write_str(tag)
    }
}

/// Decodes resource bytes, honoring UTF-8 and UTF-16 byte order marks.
///
/// Without a BOM the bytes are read as UTF-8, replacing invalid sequences.
#[must_use]
pub fn decode_text(bytes: &[u8]) -> String {
    fn utf16(bytes: &[u8], from_bytes: fn([u8; 2]) -> u16) -> String {
        let units: Vec<u16> = bytes
            .chunks_exact(2)
            .map(|pair| from_bytes([pair.first().copied().unwrap_or(0), pair.get(1).copied().unwrap_or(0)]))
            .collect();
        String::from_utf16_lossy(&units)
    }

    match bytes {
        [0xEF, 0xBB, 0xBF, rest @ ..] => String::from_utf8_lossy(rest).into_owned(),
        [0xFF, 0xFE, rest @ ..] => utf16(rest, u16::from_le_bytes),
        [0xFE, 0xFF, rest @ ..] => utf16(rest, u16::from_be_bytes),
        _ => String::from_utf8_lossy(bytes).into_owned(),
    }
}
