//! Fixed characteristic catalogue.
//!
//! ```text
//! Service: WiFi Configuration (fd2b…0000)
//! ├── Service Name       (Read)              └── desc 2001
//! ├── Device Model       (Read)              └── desc 2002
//! ├── Network Name       (Notify)
//! ├── Interface Address  (Notify)
//! ├── Credential Input   (Write, WriteWithoutResponse)
//! ├── Segmented Input    (Write, WriteWithoutResponse)
//! ├── Notify Message     (Notify)
//! └── Command Execution  (Write, WriteWithoutResponse, Notify)
//! ```

use super::object::Capabilities;
use super::uuids::*;
use std::fmt;
use uuid::Uuid;

/// Static string returned by the service name characteristic and descriptor.
pub const SERVICE_NAME: &str = "PiSugar BLE Wifi Config";

/// Static string returned by the device model descriptor.
pub const DEVICE_MODEL_LABEL: &str = "Raspberry Hardware Model";

/// One of the characteristics of the WiFi configuration service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CharacteristicKind {
    ServiceName,
    DeviceModel,
    NetworkName,
    InterfaceAddress,
    CredentialInput,
    SegmentedInput,
    NotifyMessage,
    CommandExecution,
}

/// A descriptor attached to a characteristic, with its static value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DescriptorSpec {
    pub uuid: Uuid,
    pub capabilities: Capabilities,
    pub value: &'static str,
}

impl CharacteristicKind {
    /// All characteristics in declared order.
    pub const ALL: [CharacteristicKind; 8] = [
        Self::ServiceName,
        Self::DeviceModel,
        Self::NetworkName,
        Self::InterfaceAddress,
        Self::CredentialInput,
        Self::SegmentedInput,
        Self::NotifyMessage,
        Self::CommandExecution,
    ];

    pub fn uuid(&self) -> Uuid {
        match self {
            Self::ServiceName => SERVICE_NAME_UUID,
            Self::DeviceModel => DEVICE_MODEL_UUID,
            Self::NetworkName => NETWORK_NAME_UUID,
            Self::InterfaceAddress => INTERFACE_ADDRESS_UUID,
            Self::CredentialInput => CREDENTIAL_INPUT_UUID,
            Self::SegmentedInput => SEGMENTED_INPUT_UUID,
            Self::NotifyMessage => NOTIFY_MESSAGE_UUID,
            Self::CommandExecution => COMMAND_UUID,
        }
    }

    pub fn capabilities(&self) -> Capabilities {
        let write = Capabilities::WRITE | Capabilities::WRITE_WITHOUT_RESPONSE;
        match self {
            Self::ServiceName | Self::DeviceModel => Capabilities::READ,
            Self::NetworkName | Self::InterfaceAddress | Self::NotifyMessage => {
                Capabilities::NOTIFY
            }
            Self::CredentialInput | Self::SegmentedInput => write,
            Self::CommandExecution => write | Capabilities::NOTIFY,
        }
    }

    /// Descriptors exposed under this characteristic, in declared order.
    pub fn descriptors(&self) -> &'static [DescriptorSpec] {
        const SERVICE_NAME_DESCRIPTORS: &[DescriptorSpec] = &[DescriptorSpec {
            uuid: SERVICE_NAME_DESCRIPTOR_UUID,
            capabilities: Capabilities::READ,
            value: SERVICE_NAME,
        }];
        const DEVICE_MODEL_DESCRIPTORS: &[DescriptorSpec] = &[DescriptorSpec {
            uuid: DEVICE_MODEL_DESCRIPTOR_UUID,
            capabilities: Capabilities::READ,
            value: DEVICE_MODEL_LABEL,
        }];

        match self {
            Self::ServiceName => SERVICE_NAME_DESCRIPTORS,
            Self::DeviceModel => DEVICE_MODEL_DESCRIPTORS,
            _ => &[],
        }
    }

    /// Short human-readable name for logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::ServiceName => "service-name",
            Self::DeviceModel => "device-model",
            Self::NetworkName => "network-name",
            Self::InterfaceAddress => "interface-address",
            Self::CredentialInput => "credential-input",
            Self::SegmentedInput => "segmented-input",
            Self::NotifyMessage => "notify-message",
            Self::CommandExecution => "command-execution",
        }
    }
}

impl fmt::Display for CharacteristicKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
