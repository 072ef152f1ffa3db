//! Configuration file location
//!
//! Uses the directories crate for platform-appropriate locations:
//! - Linux: `~/.config/chatprobe/config.toml`
//! - macOS: `~/Library/Application Support/chatprobe/config.toml`
//! - Windows: `%APPDATA%\chatprobe\config.toml`

use std::path::PathBuf;

/// Get the path to the configuration file
pub fn config_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "chatprobe")
        .map(|dirs| dirs.config_dir().join("config.toml"))
}
