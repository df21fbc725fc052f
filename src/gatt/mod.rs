//! GATT object model.
//!
//! This module contains the static object hierarchy exposed to the host
//! stack and the introspection contract the host stack consumes.
//!
//! # Components
//!
//! - [`kind`] - Fixed characteristic catalogue (UUIDs, capabilities, descriptors)
//! - [`object`] - Object paths, property maps, and the [`ObjectTree`]
//! - [`uuids`] - Fixed 128-bit UUID namespace
//!
//! Behaviour behind each characteristic lives in [`crate::characteristic`].

mod error;
mod kind;
mod object;
mod uuids;

pub use error::GattError;
pub use kind::{CharacteristicKind, DescriptorSpec, DEVICE_MODEL_LABEL, SERVICE_NAME};
pub use object::{
    Capabilities, CharacteristicNode, DescriptorNode, InterfaceMap, ManagedObjects, Node,
    ObjectPath, ObjectTree, PropertyMap, PropertyValue, ServiceNode, GATT_CHRC_IFACE,
    GATT_DESC_IFACE, GATT_SERVICE_IFACE,
};
pub use uuids::*;
