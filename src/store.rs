//! Persistent translation state shared across platforms.
//!
//! The store lives in an in-memory `SQLite` database for the length of a run.
//! On disk it is a plain SQL dump, so it diffs cleanly under version control.
/// Timestamp source
mod clock;
/// SQL dump reader and writer
mod dump;
/// Store error types
mod error;
/// Table definitions
mod schema;
/// `SQLite`-backed sync engine
mod sqlite;

pub use clock::{
    Clock,
    FixedClock,
    SystemClock,
    TIMESTAMP_FORMAT,
};
pub use error::StoreError;
pub use sqlite::{
    NativeTranslation,
    SqliteStore,
    SyncStats,
};

/// Default number of days an unmapped translation key is kept.
pub const DEFAULT_RETENTION_DAYS: u32 = 90;
