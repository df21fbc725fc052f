//! Command line surface.

use super::ServiceConfig;
use crate::advertising::DEFAULT_ADVERTISING_SECS;
use crate::characteristic::DEVICE_MODEL_PATH;
use crate::wifi::{DEFAULT_INTERFACE, DEFAULT_WPA_CONFIG};
use clap::Parser;
use std::path::PathBuf;

/// Default advertised local name.
pub const DEFAULT_LOCAL_NAME: &str = "pisugar";

#[derive(Debug, Parser)]
#[command(name = "ble-wifi-config")]
#[command(about = "Configure WiFi credentials over a BLE GATT service")]
pub struct Cli {
    /// Advertising duration in seconds (0 or negative advertises forever)
    #[arg(short = 't', long = "time", default_value_t = DEFAULT_ADVERTISING_SECS, allow_negative_numbers = true)]
    pub time: i64,

    /// Wireless interface to configure and sample
    #[arg(long, default_value = DEFAULT_INTERFACE)]
    pub interface: String,

    /// Advertised local name
    #[arg(long, default_value = DEFAULT_LOCAL_NAME)]
    pub local_name: String,

    /// System wpa_supplicant config, used as the fallback (never written)
    #[arg(long, default_value = DEFAULT_WPA_CONFIG)]
    pub wpa_config: PathBuf,

    /// Hardware model file
    #[arg(long, default_value = DEVICE_MODEL_PATH)]
    pub device_model_path: PathBuf,

    /// Allow the command characteristic to run shell commands (unauthenticated!)
    #[arg(long)]
    pub enable_command_execution: bool,
}

impl From<Cli> for ServiceConfig {
    fn from(cli: Cli) -> Self {
        Self {
            advertising_secs: cli.time,
            interface: cli.interface,
            local_name: cli.local_name,
            wpa_config: cli.wpa_config,
            device_model_path: cli.device_model_path,
            enable_command_execution: cli.enable_command_execution,
        }
    }
}
