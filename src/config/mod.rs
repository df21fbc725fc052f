//! Service configuration.
//!
//! # Components
//!
//! - [`cli`] - Command line parsing into [`ServiceConfig`]

mod cli;

pub use cli::{Cli, DEFAULT_LOCAL_NAME};

use crate::advertising::{advertising_duration, DEFAULT_ADVERTISING_SECS};
use crate::characteristic::DEVICE_MODEL_PATH;
use crate::wifi::{DEFAULT_INTERFACE, DEFAULT_WPA_CONFIG};
use std::path::PathBuf;
use std::time::Duration;

/// Runtime configuration of the peripheral.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    /// Advertising period in seconds; ≤ 0 advertises until shutdown.
    pub advertising_secs: i64,
    /// Wireless interface to configure and sample.
    pub interface: String,
    /// Advertised local name.
    pub local_name: String,
    /// System supplicant config. Never written; relaunched from when a new
    /// config fails to start.
    pub wpa_config: PathBuf,
    /// File holding the hardware model string.
    pub device_model_path: PathBuf,
    /// Whether the command characteristic may execute commands.
    pub enable_command_execution: bool,
}

impl ServiceConfig {
    /// Advertising period, or `None` to advertise indefinitely.
    pub fn advertising_duration(&self) -> Option<Duration> {
        advertising_duration(self.advertising_secs)
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            advertising_secs: DEFAULT_ADVERTISING_SECS,
            interface: DEFAULT_INTERFACE.to_string(),
            local_name: DEFAULT_LOCAL_NAME.to_string(),
            wpa_config: PathBuf::from(DEFAULT_WPA_CONFIG),
            device_model_path: PathBuf::from(DEVICE_MODEL_PATH),
            enable_command_execution: false,
        }
    }
}
