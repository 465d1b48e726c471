use std::path::PathBuf;

use thiserror::Error;

/// Errors raised by the translation store.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The persisted dump could not be loaded, or a fresh store could not
    /// be created.
    #[error("Translation store '{}' is unavailable: {reason}", path.display())]
    Unavailable { path: PathBuf, reason: String },
    /// A native translation refers to a translation key that does not exist.
    #[error("Translation key '{0}' is missing from the store")]
    MissingKey(String),
    #[error("Database error: {0}")]
    Db(#[from] rusqlite::Error),
    #[error("I/O error on '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
