//! WiFi credential types.
//!
//! # Example
//!
//! ```
//! use ble_wifi_config::wifi::WifiCredentials;
//!
//! let creds = WifiCredentials::new("MyNetwork", "MyPassword");
//! assert!(creds.validate().is_ok());
//! assert!(!creds.is_open());
//! ```

use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Maximum SSID length per IEEE 802.11 standard.
pub const MAX_SSID_LEN: usize = 32;

/// Maximum WPA passphrase length (64 would be a raw hex PSK).
pub const MAX_PASSWORD_LEN: usize = 63;

/// Minimum WPA passphrase length.
pub const MIN_PASSWORD_LEN: usize = 8;

/// Characters that cannot appear inside a quoted supplicant config value.
const FORBIDDEN_CHARS: [char; 4] = ['\n', '\r', '\0', '"'];

/// Network credentials received from a BLE peer.
///
/// Both fields are zeroed when the value is dropped.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct WifiCredentials {
    /// Network SSID.
    pub ssid: String,
    /// Passphrase (empty for open networks).
    pub password: String,
}

impl WifiCredentials {
    pub fn new(ssid: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            ssid: ssid.into(),
            password: password.into(),
        }
    }

    /// Check if this is an open network (no password).
    pub fn is_open(&self) -> bool {
        self.password.is_empty()
    }

    /// Check that the credentials can be written to a supplicant config.
    pub fn validate(&self) -> Result<(), CredentialError> {
        if self.ssid.is_empty() {
            return Err(CredentialError::SsidEmpty);
        }
        if self.ssid.len() > MAX_SSID_LEN {
            return Err(CredentialError::SsidTooLong {
                len: self.ssid.len(),
                max: MAX_SSID_LEN,
            });
        }
        if let Some(c) = self.ssid.chars().find(|c| FORBIDDEN_CHARS.contains(c)) {
            return Err(CredentialError::ForbiddenChar { field: "ssid", c });
        }

        if self.is_open() {
            return Ok(());
        }
        if self.password.len() < MIN_PASSWORD_LEN {
            return Err(CredentialError::PasswordTooShort {
                len: self.password.len(),
                min: MIN_PASSWORD_LEN,
            });
        }
        if self.password.len() > MAX_PASSWORD_LEN {
            return Err(CredentialError::PasswordTooLong {
                len: self.password.len(),
                max: MAX_PASSWORD_LEN,
            });
        }
        if let Some(c) = self.password.chars().find(|c| FORBIDDEN_CHARS.contains(c)) {
            return Err(CredentialError::ForbiddenChar {
                field: "password",
                c,
            });
        }

        Ok(())
    }
}

impl fmt::Debug for WifiCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WifiCredentials")
            .field("ssid", &self.ssid)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Credential validation errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialError {
    /// SSID is empty.
    SsidEmpty,
    /// SSID exceeds maximum length.
    SsidTooLong { len: usize, max: usize },
    /// Password is too short for WPA.
    PasswordTooShort { len: usize, min: usize },
    /// Password exceeds maximum length.
    PasswordTooLong { len: usize, max: usize },
    /// Field contains a character that would corrupt the config file.
    ForbiddenChar { field: &'static str, c: char },
}

impl fmt::Display for CredentialError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SsidEmpty => write!(f, "SSID cannot be empty"),
            Self::SsidTooLong { len, max } => {
                write!(f, "SSID too long: {} bytes (max {})", len, max)
            }
            Self::PasswordTooShort { len, min } => {
                write!(f, "password too short: {} bytes (min {})", len, min)
            }
            Self::PasswordTooLong { len, max } => {
                write!(f, "password too long: {} bytes (max {})", len, max)
            }
            Self::ForbiddenChar { field, c } => {
                write!(f, "{} contains forbidden character {:?}", field, c)
            }
        }
    }
}

impl std::error::Error for CredentialError {}
