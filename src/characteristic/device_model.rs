//! Host hardware model lookup.

use log::warn;
use std::path::Path;

/// Device-tree model file on Raspberry Pi style boards.
pub const DEVICE_MODEL_PATH: &str = "/proc/device-tree/model";

/// Read the hardware model string, or an empty string if unavailable.
pub fn load_device_model(path: impl AsRef<Path>) -> String {
    let path = path.as_ref();
    match std::fs::read(path) {
        Ok(raw) => clean_model(&raw),
        Err(e) => {
            warn!("Device model unavailable ({}): {}", path.display(), e);
            String::new()
        }
    }
}

/// Strip the trailing NUL the device tree appends, plus whitespace.
fn clean_model(raw: &[u8]) -> String {
    String::from_utf8_lossy(raw)
        .trim_end_matches(|c: char| c == '\0' || c.is_whitespace())
        .to_string()
}
