use std::fmt;

use chrono::{
    NaiveDateTime,
    Utc,
};

/// Format of the `last_updated` column. Lexical order matches time order.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Source of the current time for `last_updated` stamps and retention.
pub trait Clock: fmt::Debug {
    /// Current UTC time.
    fn now(&self) -> NaiveDateTime;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Utc::now().naive_utc()
    }
}

/// A clock stopped at one instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedClock(pub NaiveDateTime);

impl FixedClock {
    /// Parses a `YYYY-MM-DD HH:MM:SS` timestamp.
    ///
    /// # Errors
    /// Returns error if `timestamp` is not in [`TIMESTAMP_FORMAT`].
    pub fn parse(timestamp: &str) -> Result<Self, chrono::ParseError> {
        NaiveDateTime::parse_from_str(timestamp, TIMESTAMP_FORMAT).map(Self)
    }
}

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        self.0
    }
}
