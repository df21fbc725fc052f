//! Host BLE stack boundary.
//!
//! The core never talks to the platform directly. It registers the GATT
//! application and the advertisement through these traits and pushes
//! notification values through a [`NotificationSink`].
//!
//! # Components
//!
//! - [`bluez`] - BlueZ implementation over D-Bus (requires `bluez` feature)

#[cfg(feature = "bluez")]
mod bluez;

#[cfg(feature = "bluez")]
pub use bluez::{BluezHost, BluezSink};

use crate::advertising::Advertisement;
use crate::application::GattApplication;
use crate::gatt::ObjectPath;
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;

/// Receives value-changed events for subscribed characteristics.
///
/// Must not block: pollers and command tasks call it inline.
pub trait NotificationSink: Send + Sync + 'static {
    fn value_changed(&self, path: &ObjectPath, value: Vec<u8>);
}

/// Registers the GATT application with the host stack.
#[async_trait]
pub trait GattManager: Send + Sync {
    async fn register_application(&self, application: Arc<GattApplication>)
        -> Result<(), HostError>;
}

/// Registers and unregisters the advertisement.
#[async_trait]
pub trait AdvertisingManager: Send + Sync + 'static {
    /// Registration token, consumed on unregister.
    type Handle: Send + 'static;

    async fn register_advertisement(
        &self,
        advertisement: &Advertisement,
    ) -> Result<Self::Handle, HostError>;

    async fn unregister_advertisement(&self, handle: Self::Handle) -> Result<(), HostError>;
}

/// Host stack errors.
#[derive(Debug)]
pub enum HostError {
    /// No Bluetooth adapter is available.
    NoAdapter,
    /// The stack rejected a registration.
    Registration(String),
    /// Transport-level failure talking to the stack.
    Transport(String),
}

impl fmt::Display for HostError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoAdapter => write!(f, "no Bluetooth adapter available"),
            Self::Registration(msg) => write!(f, "registration failed: {}", msg),
            Self::Transport(msg) => write!(f, "host stack error: {}", msg),
        }
    }
}

impl std::error::Error for HostError {}
