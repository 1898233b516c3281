//! Path utilities.

use std::path::PathBuf;

/// Get the kando configuration directory.
///
/// - `$XDG_CONFIG_HOME/kando` if set
/// - `~/.config/kando` otherwise
pub fn config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("kando"))
}

/// Get the kando data directory, where file-backed mediums live.
pub fn data_dir() -> Option<PathBuf> {
    dirs::data_local_dir().map(|p| p.join("kando"))
}

/// Default location of the optional `kando.json` config file.
pub fn default_config_file() -> Option<PathBuf> {
    config_dir().map(|p| p.join("kando.json"))
}
