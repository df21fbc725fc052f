//! Fixed UUID namespace of the WiFi configuration service.
//!
//! All 128-bit UUIDs share the `fd2b4448-aa0f-4a15-a62f-eb0be77a` prefix;
//! mobile clients match on these values, so they must never change.

use uuid::Uuid;

/// WiFi configuration service.
pub const SERVICE_UUID: Uuid = Uuid::from_u128(0xfd2b4448_aa0f_4a15_a62f_eb0be77a0000);

/// Service name (read).
pub const SERVICE_NAME_UUID: Uuid = Uuid::from_u128(0xfd2b4448_aa0f_4a15_a62f_eb0be77a0001);

/// Device model (read).
pub const DEVICE_MODEL_UUID: Uuid = Uuid::from_u128(0xfd2b4448_aa0f_4a15_a62f_eb0be77a0002);

/// Current WiFi network name (notify).
pub const NETWORK_NAME_UUID: Uuid = Uuid::from_u128(0xfd2b4448_aa0f_4a15_a62f_eb0be77a0003);

/// Current wireless interface address (notify).
pub const INTERFACE_ADDRESS_UUID: Uuid = Uuid::from_u128(0xfd2b4448_aa0f_4a15_a62f_eb0be77a0004);

/// Single-write credential input.
pub const CREDENTIAL_INPUT_UUID: Uuid = Uuid::from_u128(0xfd2b4448_aa0f_4a15_a62f_eb0be77a0005);

/// Reserved notify channel for input feedback.
pub const NOTIFY_MESSAGE_UUID: Uuid = Uuid::from_u128(0xfd2b4448_aa0f_4a15_a62f_eb0be77a0006);

/// Segmented (multi-write) credential input.
pub const SEGMENTED_INPUT_UUID: Uuid = Uuid::from_u128(0xfd2b4448_aa0f_4a15_a62f_eb0be77a0007);

/// Remote command execution (write + notify).
pub const COMMAND_UUID: Uuid = Uuid::from_u128(0xfd2b4448_aa0f_4a15_a62f_eb0be77a0020);

/// Service name descriptor (16-bit `0x2001` on the Bluetooth base UUID).
pub const SERVICE_NAME_DESCRIPTOR_UUID: Uuid =
    Uuid::from_u128(0x00002001_0000_1000_8000_00805f9b34fb);

/// Device model descriptor (16-bit `0x2002` on the Bluetooth base UUID).
pub const DEVICE_MODEL_DESCRIPTOR_UUID: Uuid =
    Uuid::from_u128(0x00002002_0000_1000_8000_00805f9b34fb);
