//! Network configurator bridge.

use super::credentials::{CredentialError, WifiCredentials};
use async_trait::async_trait;
use std::fmt;
use std::process::ExitStatus;

/// Applies new WiFi credentials to the host.
///
/// Implementations regenerate the wireless client configuration and restart
/// the wireless client. Callers treat this as fire-and-forget: errors are
/// logged, never retried, and never reported to the BLE peer.
#[async_trait]
pub trait WifiConfigurator: Send + Sync + 'static {
    async fn apply_wifi_credentials(&self, credentials: &WifiCredentials)
        -> Result<(), ApplyError>;
}

/// Errors from applying credentials.
#[derive(Debug)]
pub enum ApplyError {
    /// Credentials cannot be written safely.
    InvalidCredentials(CredentialError),
    /// Config file or process I/O failed.
    Io(std::io::Error),
    /// A helper process exited unsuccessfully.
    CommandFailed {
        program: &'static str,
        status: ExitStatus,
    },
}

impl fmt::Display for ApplyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidCredentials(e) => write!(f, "invalid credentials: {}", e),
            Self::Io(e) => write!(f, "I/O error: {}", e),
            Self::CommandFailed { program, status } => {
                write!(f, "{} exited with {}", program, status)
            }
        }
    }
}

impl std::error::Error for ApplyError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::InvalidCredentials(e) => Some(e),
            Self::Io(e) => Some(e),
            Self::CommandFailed { .. } => None,
        }
    }
}

impl From<std::io::Error> for ApplyError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<CredentialError> for ApplyError {
    fn from(e: CredentialError) -> Self {
        Self::InvalidCredentials(e)
    }
}
