//! BLE WiFi provisioning peripheral.
//!
//! Exposes a fixed GATT service that lets a mobile client push WiFi
//! credentials to a headless device and watch its network status. The core
//! (object tree, characteristic behaviour, reassembly, pollers, advertising
//! lifecycle) is host-stack agnostic and tested on any machine; the BlueZ
//! binding lives behind the `bluez` feature.

pub mod advertising;
pub mod app;
pub mod application;
pub mod characteristic;
pub mod config;
pub mod gatt;
pub mod host;
pub mod poller;
pub mod wifi;

#[cfg(test)]
pub(crate) mod testing;

// Re-export commonly used items
pub use advertising::{Advertisement, AdvertisementState, AdvertisingLifecycle, StopOutcome};
pub use app::{build_application, AppContext, StartupError};
pub use application::GattApplication;
pub use characteristic::{CredentialMessage, ReassemblyBuffer};
pub use config::{Cli, ServiceConfig};
pub use gatt::{GattError, ObjectPath, ObjectTree};
pub use host::{AdvertisingManager, GattManager, HostError, NotificationSink};
pub use poller::{NotificationSession, StatusKind, SystemStatusProvider};
pub use wifi::{ConfiguratorQueue, ConfiguratorWorker, WifiConfigurator, WifiCredentials};
