//! Credential message wire format.
//!
//! ```text
//! single-shot:  key %&% ssid %&% password
//! segmented:    key %&% ssid %&% password &#&
//! ```
//!
//! Tokens are not escaped, so an SSID or password containing either token
//! cannot be sent.
//!
//! # Example
//!
//! ```
//! use ble_wifi_config::characteristic::CredentialMessage;
//!
//! let msg: CredentialMessage = "k%&%HomeNetwork%&%password123".parse().unwrap();
//! assert_eq!(msg.credentials.ssid, "HomeNetwork");
//! ```

use crate::wifi::WifiCredentials;
use std::fmt;
use std::str::FromStr;

/// Field separator.
pub const SEPARATOR: &str = "%&%";

/// Message terminator for segmented writes.
pub const TERMINATOR: &str = "&#&";

/// Number of fields in a well-formed message.
const FIELD_COUNT: usize = 3;

/// A decoded `key SEP ssid SEP password` message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialMessage {
    /// Opaque client key. Carried but not interpreted.
    pub key: String,
    pub credentials: WifiCredentials,
}

impl CredentialMessage {
    /// Decode a single write's raw bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, MessageError> {
        std::str::from_utf8(bytes)
            .map_err(|_| MessageError::InvalidEncoding)?
            .parse()
    }
}

impl FromStr for CredentialMessage {
    type Err = MessageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let fields: Vec<&str> = s.split(SEPARATOR).collect();
        match fields.as_slice() {
            [key, ssid, password] => Ok(Self {
                key: key.to_string(),
                credentials: WifiCredentials::new(*ssid, *password),
            }),
            _ => Err(MessageError::FieldCount {
                found: fields.len(),
            }),
        }
    }
}

/// Errors decoding a credential message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageError {
    /// Payload is not valid UTF-8.
    InvalidEncoding,
    /// Wrong number of separated fields.
    FieldCount { found: usize },
}

impl fmt::Display for MessageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidEncoding => write!(f, "decode error: payload is not valid UTF-8"),
            Self::FieldCount { found } => {
                write!(f, "expected {} fields, found {}", FIELD_COUNT, found)
            }
        }
    }
}

impl std::error::Error for MessageError {}
