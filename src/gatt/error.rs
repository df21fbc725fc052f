//! Errors returned synchronously to the host stack.

use std::fmt;

/// Errors a GATT object can return to the host stack.
///
/// Each variant maps to the D-Bus error name BlueZ expects, so a host-stack
/// binding can forward the failure to the peer unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GattError {
    /// The object does not implement the requested operation.
    NotSupported,
    /// The operation exists but is disabled by configuration.
    NotPermitted,
    /// A property query named an interface the object does not expose,
    /// or the request referenced an unknown object.
    InvalidArgs(String),
    /// The operation was accepted but failed.
    Failed(String),
}

impl GattError {
    /// D-Bus error name understood by BlueZ.
    pub fn dbus_name(&self) -> &'static str {
        match self {
            Self::NotSupported => "org.bluez.Error.NotSupported",
            Self::NotPermitted => "org.bluez.Error.NotPermitted",
            Self::InvalidArgs(_) => "org.freedesktop.DBus.Error.InvalidArgs",
            Self::Failed(_) => "org.bluez.Error.Failed",
        }
    }
}

impl fmt::Display for GattError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotSupported => write!(f, "operation not supported"),
            Self::NotPermitted => write!(f, "operation not permitted"),
            Self::InvalidArgs(msg) => write!(f, "invalid arguments: {}", msg),
            Self::Failed(msg) => write!(f, "operation failed: {}", msg),
        }
    }
}

impl std::error::Error for GattError {}
