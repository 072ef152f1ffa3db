//! Configuration file handling

use serde::Deserialize;

use super::paths::config_path;
use super::Result;

/// Main configuration structure
#[derive(Debug, Deserialize)]
pub struct Config {
    /// WebSocket endpoint of the service under test
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Requester identifier stamped on outbound messages
    #[serde(default = "default_user_id")]
    pub user_id: String,

    /// Timeout settings
    #[serde(default)]
    pub timeouts: Timeouts,

    /// Per-step receive budget and pacing
    #[serde(default)]
    pub limits: Limits,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            user_id: default_user_id(),
            timeouts: Timeouts::default(),
            limits: Limits::default(),
        }
    }
}

fn default_endpoint() -> String {
    "ws://localhost:8083/chat".to_string()
}

fn default_user_id() -> String {
    "chatprobe".to_string()
}

/// Timeout settings in seconds
#[derive(Debug, Deserialize)]
pub struct Timeouts {
    /// Timeout for the connect handshake plus acknowledgement
    #[serde(default = "default_connect")]
    pub connect_secs: u64,

    /// Timeout for each receive attempt while waiting for a reply
    #[serde(default = "default_receive")]
    pub receive_secs: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            connect_secs: default_connect(),
            receive_secs: default_receive(),
        }
    }
}

fn default_connect() -> u64 {
    10
}
fn default_receive() -> u64 {
    5
}

/// Receive budget and pacing settings
#[derive(Debug, Deserialize)]
pub struct Limits {
    /// Maximum receive attempts per step before giving up
    #[serde(default = "default_max_messages")]
    pub max_messages_per_step: u32,

    /// Pause between steps, so exchanges never overlap on one session
    #[serde(default = "default_inter_step_delay")]
    pub inter_step_delay_ms: u64,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_messages_per_step: default_max_messages(),
            inter_step_delay_ms: default_inter_step_delay(),
        }
    }
}

fn default_max_messages() -> u32 {
    10
}
fn default_inter_step_delay() -> u64 {
    1000
}

impl Config {
    /// Load configuration from the default config file
    ///
    /// Returns default configuration if file doesn't exist
    pub fn load() -> Result<Self> {
        if let Some(path) = config_path() {
            if path.exists() {
                let content = std::fs::read_to_string(&path)
                    .map_err(|e| super::Error::file_read(&path, e))?;
                return toml::from_str(&content)
                    .map_err(|e| super::Error::ConfigParse(e.to_string()));
            }
        }
        Ok(Self::default())
    }
}
