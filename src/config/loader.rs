//! Config file loading.

use std::path::Path;

use super::{
    ConfigError,
    SyncSettings,
};

/// Config file looked up in the working root when none is given.
pub const DEFAULT_CONFIG_FILE: &str = ".l10n-sync.json";

/// Reads settings from `config_path`.
///
/// # Returns
/// - `Ok(Some(settings))`: the file exists and parsed
/// - `Ok(None)`: the file does not exist
///
/// # Errors
/// - File read error
/// - JSON parse error
pub(super) fn load_from_path(config_path: &Path) -> Result<Option<SyncSettings>, ConfigError> {
    if !config_path.exists() {
        tracing::debug!(path = %config_path.display(), "Configuration file not found");
        return Ok(None);
    }

    tracing::debug!(path = %config_path.display(), "Loading configuration");

    let content = std::fs::read_to_string(config_path)?;
    let settings: SyncSettings = serde_json::from_str(&content)?;

    Ok(Some(settings))
}
