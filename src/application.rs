//! GATT application: the object tree plus a handler registry.
//!
//! The host stack addresses objects by path. Characteristic operations are
//! dispatched to the matching [`CharacteristicHandler`]; descriptor reads
//! return their static value.

use crate::characteristic::{CharacteristicHandler, Collaborators, Options};
use crate::gatt::{GattError, ManagedObjects, Node, ObjectPath, ObjectTree, PropertyMap};
use log::{debug, info};
use std::collections::BTreeMap;
use std::sync::Arc;
use uuid::Uuid;

/// The WiFi configuration GATT application.
pub struct GattApplication {
    tree: ObjectTree,
    handlers: BTreeMap<ObjectPath, CharacteristicHandler>,
}

impl GattApplication {
    pub fn new(tree: ObjectTree, collaborators: Collaborators) -> Self {
        let collaborators = Arc::new(collaborators);
        let handlers = tree
            .characteristics()
            .map(|node| {
                (
                    node.path.clone(),
                    CharacteristicHandler::new(node, collaborators.clone()),
                )
            })
            .collect();

        Self { tree, handlers }
    }

    pub fn tree(&self) -> &ObjectTree {
        &self.tree
    }

    /// Introspection query (`GetManagedObjects`).
    pub fn managed_objects(&self) -> ManagedObjects {
        self.tree.managed_objects()
    }

    /// Property query (`GetAll`).
    pub fn get_all(&self, path: &ObjectPath, interface: &str) -> Result<PropertyMap, GattError> {
        self.tree.get_all(path, interface)
    }

    /// Handler registered at `path`.
    pub fn handler(&self, path: &ObjectPath) -> Option<&CharacteristicHandler> {
        self.handlers.get(path)
    }

    /// Handler for the characteristic with `uuid`.
    pub fn handler_by_uuid(&self, uuid: Uuid) -> Option<&CharacteristicHandler> {
        self.handlers.values().find(|h| h.kind().uuid() == uuid)
    }

    /// `ReadValue` on a characteristic or descriptor.
    pub fn read_value(&self, path: &ObjectPath, options: &Options) -> Result<Vec<u8>, GattError> {
        log_options("ReadValue", path, options);
        match self.tree.find(path) {
            Some(Node::Characteristic(_)) => self.characteristic(path)?.read(),
            Some(Node::Descriptor(desc)) => Ok(desc.spec.value.as_bytes().to_vec()),
            Some(Node::Service(_)) => Err(GattError::NotSupported),
            None => Err(unknown(path)),
        }
    }

    /// `WriteValue` on a characteristic or descriptor.
    pub fn write_value(
        &self,
        path: &ObjectPath,
        value: &[u8],
        options: &Options,
    ) -> Result<(), GattError> {
        log_options("WriteValue", path, options);
        match self.tree.find(path) {
            Some(Node::Characteristic(_)) => self.characteristic(path)?.write(value),
            Some(_) => Err(GattError::NotSupported),
            None => Err(unknown(path)),
        }
    }

    pub async fn start_notify(&self, path: &ObjectPath) -> Result<(), GattError> {
        self.characteristic(path)?.start_notify().await
    }

    pub async fn stop_notify(&self, path: &ObjectPath) -> Result<(), GattError> {
        self.characteristic(path)?.stop_notify().await
    }

    /// Stop every active notification session.
    pub async fn shutdown(&self) {
        for handler in self.handlers.values() {
            if handler.is_notifying().await {
                info!("Stopping {} notifications", handler.kind());
                let _ = handler.stop_notify().await;
            }
        }
    }

    fn characteristic(&self, path: &ObjectPath) -> Result<&CharacteristicHandler, GattError> {
        match self.handlers.get(path) {
            Some(handler) => Ok(handler),
            None if self.tree.find(path).is_some() => Err(GattError::NotSupported),
            None => Err(unknown(path)),
        }
    }
}

fn unknown(path: &ObjectPath) -> GattError {
    GattError::InvalidArgs(format!("unknown object {}", path))
}

fn log_options(operation: &str, path: &ObjectPath, options: &Options) {
    if !options.is_empty() {
        debug!("{} {} options: {:?}", operation, path, options);
    }
}
