//! Per-characteristic behaviour.
//!
//! Every characteristic implements the same capability interface
//! (`read`, `write`, `start_notify`, `stop_notify`). Operations outside the
//! declared [`Capabilities`](crate::gatt::Capabilities) fail with
//! [`GattError::NotSupported`] before reaching the behaviour.
//!
//! # Components
//!
//! - [`message`] - Credential wire format
//! - [`reassembly`] - Segmented write reassembly
//! - [`command`] - Shell command execution
//! - [`device_model`] - Hardware model lookup

mod command;
mod device_model;
mod message;
mod reassembly;

pub use command::{CommandRunner, ShellCommandRunner};
pub use device_model::{load_device_model, DEVICE_MODEL_PATH};
pub use message::{CredentialMessage, MessageError, SEPARATOR, TERMINATOR};
pub use reassembly::{ReassemblyBuffer, MAX_REASSEMBLY_LEN, REASSEMBLY_GAP};

use crate::gatt::{Capabilities, CharacteristicKind, CharacteristicNode, GattError, ObjectPath};
use crate::host::NotificationSink;
use crate::poller::{NotificationSession, PollTarget, StatusKind, SystemStatusProvider};
use crate::wifi::ConfiguratorQueue;
use log::{debug, info, warn};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// Host-supplied options on read and write requests (offset, mtu, device, ...).
///
/// Accepted for logging only.
pub type Options = BTreeMap<String, String>;

/// Shared collaborators every characteristic may use.
#[derive(Clone)]
pub struct Collaborators {
    /// Hardware model string for the device model characteristic.
    pub device_model: String,
    pub status: Arc<dyn SystemStatusProvider>,
    pub sink: Arc<dyn NotificationSink>,
    pub configurator: ConfiguratorQueue,
    /// `None` disables command execution.
    pub command_runner: Option<Arc<dyn CommandRunner>>,
}

enum Behavior {
    Static(&'static str),
    DeviceModel(String),
    Polled {
        kind: StatusKind,
        session: NotificationSession,
    },
    SingleInput,
    SegmentedInput(Mutex<ReassemblyBuffer>),
    Reserved,
    Command {
        runner: Option<Arc<dyn CommandRunner>>,
        subscribed: Arc<AtomicBool>,
    },
}

/// Runtime state and behaviour of one characteristic.
pub struct CharacteristicHandler {
    kind: CharacteristicKind,
    path: ObjectPath,
    capabilities: Capabilities,
    behavior: Behavior,
    collaborators: Arc<Collaborators>,
}

impl CharacteristicHandler {
    pub fn new(node: &CharacteristicNode, collaborators: Arc<Collaborators>) -> Self {
        let behavior = match node.kind {
            CharacteristicKind::ServiceName => Behavior::Static(crate::gatt::SERVICE_NAME),
            CharacteristicKind::DeviceModel => {
                Behavior::DeviceModel(collaborators.device_model.clone())
            }
            CharacteristicKind::NetworkName => Behavior::Polled {
                kind: StatusKind::NetworkName,
                session: NotificationSession::new(),
            },
            CharacteristicKind::InterfaceAddress => Behavior::Polled {
                kind: StatusKind::InterfaceAddress,
                session: NotificationSession::new(),
            },
            CharacteristicKind::CredentialInput => Behavior::SingleInput,
            CharacteristicKind::SegmentedInput => {
                Behavior::SegmentedInput(Mutex::new(ReassemblyBuffer::new()))
            }
            CharacteristicKind::NotifyMessage => Behavior::Reserved,
            CharacteristicKind::CommandExecution => Behavior::Command {
                runner: collaborators.command_runner.clone(),
                subscribed: Arc::new(AtomicBool::new(false)),
            },
        };

        Self {
            kind: node.kind,
            path: node.path.clone(),
            capabilities: node.capabilities(),
            behavior,
            collaborators,
        }
    }

    pub fn kind(&self) -> CharacteristicKind {
        self.kind
    }

    pub fn path(&self) -> &ObjectPath {
        &self.path
    }

    pub fn read(&self) -> Result<Vec<u8>, GattError> {
        if !self.capabilities.contains(Capabilities::READ) {
            return Err(GattError::NotSupported);
        }
        match &self.behavior {
            Behavior::Static(value) => Ok(value.as_bytes().to_vec()),
            Behavior::DeviceModel(model) => Ok(model.as_bytes().to_vec()),
            _ => Err(GattError::NotSupported),
        }
    }

    /// Handle a write. Never blocks on external effects.
    pub fn write(&self, value: &[u8]) -> Result<(), GattError> {
        if !self.capabilities.can_write() {
            return Err(GattError::NotSupported);
        }
        match &self.behavior {
            Behavior::SingleInput => {
                match CredentialMessage::from_bytes(value) {
                    Ok(message) => self.submit(message),
                    Err(e) => warn!("{}: dropping message: {}", self.kind, e),
                }
                Ok(())
            }
            Behavior::SegmentedInput(buffer) => {
                // Held through submit so completed messages queue in delivery order
                let mut buffer = buffer
                    .lock()
                    .unwrap_or_else(|poisoned| poisoned.into_inner());
                if let Some(text) = buffer.push(value) {
                    match text.parse::<CredentialMessage>() {
                        Ok(message) => self.submit(message),
                        Err(e) => warn!("{}: dropping message: {}", self.kind, e),
                    }
                }
                drop(buffer);
                Ok(())
            }
            Behavior::Command { runner, subscribed } => {
                let Some(runner) = runner else {
                    warn!("{}: command execution is disabled", self.kind);
                    return Err(GattError::NotPermitted);
                };
                let command = match std::str::from_utf8(value) {
                    Ok(command) => command.to_string(),
                    Err(_) => {
                        warn!("{}: decode error, dropping command", self.kind);
                        return Ok(());
                    }
                };
                self.spawn_command(runner.clone(), subscribed.clone(), command);
                Ok(())
            }
            _ => Err(GattError::NotSupported),
        }
    }

    pub async fn start_notify(&self) -> Result<(), GattError> {
        if !self.capabilities.contains(Capabilities::NOTIFY) {
            return Err(GattError::NotSupported);
        }
        match &self.behavior {
            Behavior::Polled { kind, session } => {
                session
                    .start(PollTarget {
                        kind: *kind,
                        path: self.path.clone(),
                        provider: self.collaborators.status.clone(),
                        sink: self.collaborators.sink.clone(),
                    })
                    .await;
            }
            Behavior::Command { subscribed, .. } => {
                subscribed.store(true, Ordering::SeqCst);
            }
            _ => debug!("{}: notifications have no source", self.kind),
        }
        Ok(())
    }

    pub async fn stop_notify(&self) -> Result<(), GattError> {
        if !self.capabilities.contains(Capabilities::NOTIFY) {
            return Err(GattError::NotSupported);
        }
        match &self.behavior {
            Behavior::Polled { session, .. } => {
                session.stop().await;
            }
            Behavior::Command { subscribed, .. } => {
                subscribed.store(false, Ordering::SeqCst);
            }
            _ => {}
        }
        Ok(())
    }

    /// True while a poller or subscription is live.
    pub async fn is_notifying(&self) -> bool {
        match &self.behavior {
            Behavior::Polled { session, .. } => session.is_active().await,
            Behavior::Command { subscribed, .. } => subscribed.load(Ordering::SeqCst),
            _ => false,
        }
    }

    fn submit(&self, message: CredentialMessage) {
        info!(
            "{}: received credentials for '{}'",
            self.kind, message.credentials.ssid
        );
        self.collaborators.configurator.submit(message.credentials);
    }

    fn spawn_command(
        &self,
        runner: Arc<dyn CommandRunner>,
        subscribed: Arc<AtomicBool>,
        command: String,
    ) {
        let sink = self.collaborators.sink.clone();
        let path = self.path.clone();
        info!("{}: running '{}'", self.kind, command);

        tokio::spawn(async move {
            match runner.run(&command).await {
                Ok(output) if subscribed.load(Ordering::SeqCst) => {
                    sink.value_changed(&path, output);
                }
                Ok(output) => debug!("No subscriber for {} bytes of output", output.len()),
                Err(e) => warn!("Command '{}' failed: {}", command, e),
            }
        });
    }
}
