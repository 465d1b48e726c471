use std::fs;
use std::path::Path;

use super::format::{
    TranslationFileError,
    TranslationFormat,
};
use super::record::{
    TranslationMetadata,
    TranslationRecord,
};

/// Loads the translation file at `path`.
///
/// A missing file yields an empty record carrying `metadata`; the caller
/// creates the file on the next save.
///
/// # Errors
/// Returns error if the file cannot be read, is malformed, or has no entries.
pub fn load_translation_file(
    format: &dyn TranslationFormat,
    path: &Path,
    metadata: TranslationMetadata,
) -> Result<TranslationRecord, TranslationFileError> {
    let mut record = TranslationRecord::new(metadata);

    if !path.exists() {
        tracing::debug!(path = %path.display(), "Translation file does not exist yet");
        return Ok(record);
    }

    let content = fs::read_to_string(path)
        .map_err(|source| TranslationFileError::Io { path: path.to_path_buf(), source })?;
    format.read(&path.to_string_lossy(), &content, &mut record)?;

    tracing::debug!(path = %path.display(), entries = record.len(), "Loaded translation file");
    Ok(record)
}

/// Writes `record` to `path`, creating parent directories as needed.
///
/// # Errors
/// Returns error if serialization or the write fails.
pub fn save_translation_file(
    format: &dyn TranslationFormat,
    record: &TranslationRecord,
    path: &Path,
) -> Result<(), TranslationFileError> {
    let content = format.write(record)?;

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|source| TranslationFileError::Io { path: parent.to_path_buf(), source })?;
    }
    fs::write(path, content)
        .map_err(|source| TranslationFileError::Io { path: path.to_path_buf(), source })
}
