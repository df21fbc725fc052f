//! Advertisement object.

use crate::gatt::{GattError, ObjectPath, PropertyMap, PropertyValue};
use uuid::Uuid;

/// BlueZ advertisement interface.
pub const LE_ADVERTISEMENT_IFACE: &str = "org.bluez.LEAdvertisement1";

/// Base path of advertisement objects.
const ADVERTISEMENT_PATH_BASE: &str = "/com/pisugar/wifi/advertisement";

/// Advertising role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdvertisementType {
    Broadcast,
    Peripheral,
}

impl AdvertisementType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Broadcast => "broadcast",
            Self::Peripheral => "peripheral",
        }
    }
}

/// The peripheral's LE advertisement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Advertisement {
    pub path: ObjectPath,
    pub advertisement_type: AdvertisementType,
    pub service_uuids: Vec<Uuid>,
    pub local_name: String,
    pub include_tx_power: bool,
}

impl Advertisement {
    /// Connectable advertisement listing `service_uuids`, with tx power included.
    pub fn peripheral(index: usize, service_uuids: Vec<Uuid>, local_name: impl Into<String>) -> Self {
        Self {
            path: ObjectPath::new(format!("{}{}", ADVERTISEMENT_PATH_BASE, index)),
            advertisement_type: AdvertisementType::Peripheral,
            service_uuids,
            local_name: local_name.into(),
            include_tx_power: true,
        }
    }

    pub fn properties(&self) -> PropertyMap {
        let mut props = PropertyMap::new();
        props.insert(
            "Type",
            PropertyValue::Str(self.advertisement_type.as_str().to_string()),
        );
        props.insert(
            "ServiceUUIDs",
            PropertyValue::Strs(self.service_uuids.iter().map(Uuid::to_string).collect()),
        );
        props.insert("LocalName", PropertyValue::Str(self.local_name.clone()));
        props.insert("IncludeTxPower", PropertyValue::Bool(self.include_tx_power));
        props
    }

    /// Property query (`GetAll`).
    pub fn get_all(&self, interface: &str) -> Result<PropertyMap, GattError> {
        if interface != LE_ADVERTISEMENT_IFACE {
            return Err(GattError::InvalidArgs(interface.to_string()));
        }
        Ok(self.properties())
    }
}
