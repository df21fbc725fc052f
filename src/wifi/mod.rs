//! WiFi credential handling and the network configurator bridge.
//!
//! # Components
//!
//! - [`credentials`] - Credential type and validation (host-testable)
//! - [`configurator`] - The [`WifiConfigurator`] collaborator trait
//! - [`wpa`] - `wpa_supplicant` implementation
//! - [`queue`] - Single-writer queue serializing applies

mod configurator;
mod credentials;
mod queue;
mod wpa;

pub use configurator::{ApplyError, WifiConfigurator};
pub use credentials::{
    CredentialError, WifiCredentials, MAX_PASSWORD_LEN, MAX_SSID_LEN, MIN_PASSWORD_LEN,
};
pub use queue::{ConfiguratorQueue, ConfiguratorWorker, DRAIN_TIMEOUT};
pub use wpa::{WpaSupplicantConfigurator, DEFAULT_INTERFACE, DEFAULT_WPA_CONFIG};
