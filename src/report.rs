//! Outcome of a run: per-platform results plus every warning and error.
//!
//! The exit status is derived from the report, not from logger state.

use std::fmt;

use crate::store::SyncStats;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    #[default]
    Info,
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Error => "error",
        };
        f.write_str(name)
    }
}

/// A warning or error raised while processing a platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub platform: String,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlatformStatus {
    Succeeded,
    /// Aborted and reverted.
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformOutcome {
    pub platform: String,
    pub status: PlatformStatus,
    /// Store writes, present once the mapping was written.
    pub stats: Option<SyncStats>,
    /// Keys purged past retention.
    pub purged: usize,
}

#[derive(Debug, Clone, Default)]
pub struct RunReport {
    platforms: Vec<PlatformOutcome>,
    diagnostics: Vec<Diagnostic>,
}

impl RunReport {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records and logs a warning.
    pub fn warn(&mut self, platform: &str, message: impl Into<String>) {
        let message = message.into();
        tracing::warn!(platform = %platform, "{message}");
        self.push(Severity::Warning, platform, message);
    }

    /// Records and logs an error.
    pub fn error(&mut self, platform: &str, message: impl Into<String>) {
        let message = message.into();
        tracing::error!(platform = %platform, "{message}");
        self.push(Severity::Error, platform, message);
    }

    fn push(&mut self, severity: Severity, platform: &str, message: String) {
        self.diagnostics.push(Diagnostic { severity, platform: platform.to_string(), message });
    }

    pub fn record_outcome(&mut self, outcome: PlatformOutcome) {
        self.platforms.push(outcome);
    }

    #[must_use]
    pub fn platforms(&self) -> &[PlatformOutcome] {
        &self.platforms
    }

    #[must_use]
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(|d| d.severity == Severity::Warning)
    }

    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(|d| d.severity == Severity::Error)
    }

    /// Highest severity recorded, `Info` for a clean run.
    #[must_use]
    pub fn max_severity(&self) -> Severity {
        self.diagnostics.iter().map(|d| d.severity).max().unwrap_or_default()
    }

    /// Process exit code: 1 when anything worse than a warning happened.
    #[must_use]
    pub fn exit_code(&self) -> u8 {
        u8::from(self.max_severity() > Severity::Warning)
    }
}
