// autorip-cli/src/config.rs
//
// Locates and loads the settings file.

use crate::error::{CliErrorContext, CliResult};
use autorip_core::CoreConfig;
use std::path::{Path, PathBuf};

/// File name searched for in the working directory.
pub const LOCAL_CONFIG_FILE: &str = "autorip.yaml";

/// System-wide settings file.
pub const SYSTEM_CONFIG_FILE: &str = "/etc/autorip/settings.yaml";

/// Picks the settings file to load.
///
/// An explicit path always wins, even if it does not exist (loading it then
/// fails). Otherwise the first existing default location is used.
pub fn resolve_config_path(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }
    [PathBuf::from(LOCAL_CONFIG_FILE), PathBuf::from(SYSTEM_CONFIG_FILE)]
        .into_iter()
        .find(|candidate| candidate.is_file())
}

/// Loads and validates the configuration, falling back to built-in defaults
/// when no settings file exists.
pub fn load_config(explicit: Option<&Path>) -> CliResult<CoreConfig> {
    match resolve_config_path(explicit) {
        Some(path) => CoreConfig::load(&path).cli_with_context(|| path.display().to_string()),
        None => {
            let config = CoreConfig::default();
            config
                .validate()
                .cli_context("built-in default configuration")?;
            Ok(config)
        }
    }
}
