//! Segmented credential reassembly.
//!
//! The transport bounds single-write size and provides no framing, so a
//! message is accumulated across writes until the text ends with
//! [`TERMINATOR`]. A pause longer than [`REASSEMBLY_GAP`] between writes starts
//! a new message.
//!
//! ```text
//! write 1: "key%&%Home"          buffer = "key%&%Home"
//! write 2: "Net%&%pass"          buffer = "key%&%HomeNet%&%pass"
//! write 3: "word&#&"             complete: "key%&%HomeNet%&%password"
//! ```
//!
//! # Example
//!
//! ```
//! use ble_wifi_config::characteristic::ReassemblyBuffer;
//!
//! let mut buffer = ReassemblyBuffer::new();
//! assert_eq!(buffer.push(b"k%&%Home"), None);
//! assert_eq!(buffer.push(b"%&%secret&#&").as_deref(), Some("k%&%Home%&%secret"));
//! ```

use super::message::TERMINATOR;
use log::{debug, warn};
use std::time::{Duration, Instant};

/// Maximum pause between writes of one message.
pub const REASSEMBLY_GAP: Duration = Duration::from_secs(1);

/// Maximum buffered bytes before the buffer is dropped.
pub const MAX_REASSEMBLY_LEN: usize = 4096;

/// Accumulates writes for one characteristic.
#[derive(Debug, Default)]
pub struct ReassemblyBuffer {
    data: Vec<u8>,
    last_update: Option<Instant>,
}

impl ReassemblyBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a write received now.
    pub fn push(&mut self, bytes: &[u8]) -> Option<String> {
        self.push_at(bytes, Instant::now())
    }

    /// Append a write received at `now`.
    ///
    /// Returns the complete message (without terminator) once the buffered
    /// text ends with [`TERMINATOR`], and resets the buffer.
    pub fn push_at(&mut self, bytes: &[u8], now: Instant) -> Option<String> {
        if let Some(last) = self.last_update {
            if now.saturating_duration_since(last) > REASSEMBLY_GAP && !self.data.is_empty() {
                debug!("Reassembly gap exceeded, discarding {} bytes", self.data.len());
                self.data.clear();
            }
        }

        self.data.extend_from_slice(bytes);
        self.last_update = Some(now);

        if self.data.len() > MAX_REASSEMBLY_LEN {
            warn!(
                "Reassembly buffer exceeded {} bytes, discarding",
                MAX_REASSEMBLY_LEN
            );
            self.data.clear();
            return None;
        }

        // Incomplete UTF-8 may be finished by the next write
        let text = std::str::from_utf8(&self.data).ok()?;
        if !text.ends_with(TERMINATOR) {
            return None;
        }

        let message = text
            .split_once(TERMINATOR)
            .map(|(message, _)| message.to_string());
        self.data.clear();
        message
    }

    /// Bytes currently buffered.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}
