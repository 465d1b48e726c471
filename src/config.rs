//! Run configuration: the `.l10n-sync.json` file and its validation.
/// Config file loader
mod loader;
/// Configuration manager
mod manager;
/// Source file pattern matcher
mod matcher;
/// Configuration types and settings
mod types;

pub use loader::DEFAULT_CONFIG_FILE;
pub use manager::ConfigManager;
pub use matcher::{
    FileMatcher,
    MatcherError,
};
pub use types::{
    ConfigError,
    PlatformSettings,
    SyncSettings,
    ValidationError,
};
