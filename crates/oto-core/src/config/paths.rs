//! Standard locations for oto configuration files

use std::path::PathBuf;

/// Application directory name under the platform config dir
const APP_DIR: &str = "oto";

/// Directory holding oto's config files
///
/// `~/.config/oto` on Linux, the platform equivalent elsewhere, or `./oto`
/// when no config dir can be determined.
pub fn config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
}

/// Path of the player config file
pub fn default_config_path() -> PathBuf {
    config_dir().join("player.yaml")
}
