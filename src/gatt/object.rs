//! GATT object hierarchy and its introspection contract.
//!
//! The tree is built once at startup and never changes: one application at
//! `/`, one primary service, the fixed characteristics of
//! [`CharacteristicKind::ALL`] and their descriptors. Paths follow the BlueZ
//! convention of nesting each object under its owner:
//!
//! ```text
//! /com/pisugar/wifi/service0
//! /com/pisugar/wifi/service0/char0
//! /com/pisugar/wifi/service0/char0/desc0
//! ```
//!
//! # Example
//!
//! ```
//! use ble_wifi_config::gatt::{ObjectTree, GATT_SERVICE_IFACE};
//!
//! let tree = ObjectTree::wifi_config();
//! let objects = tree.managed_objects();
//! let (path, interfaces) = objects.iter().next().unwrap();
//! assert_eq!(path.as_str(), "/com/pisugar/wifi/service0");
//! assert!(interfaces.contains_key(GATT_SERVICE_IFACE));
//! ```

use super::error::GattError;
use super::kind::{CharacteristicKind, DescriptorSpec};
use super::uuids::SERVICE_UUID;
use std::collections::BTreeMap;
use std::fmt;
use std::ops::BitOr;
use uuid::Uuid;

/// BlueZ GATT service interface.
pub const GATT_SERVICE_IFACE: &str = "org.bluez.GattService1";

/// BlueZ GATT characteristic interface.
pub const GATT_CHRC_IFACE: &str = "org.bluez.GattCharacteristic1";

/// BlueZ GATT descriptor interface.
pub const GATT_DESC_IFACE: &str = "org.bluez.GattDescriptor1";

/// Base path under which services are registered.
const SERVICE_PATH_BASE: &str = "/com/pisugar/wifi/service";

/// Hierarchical object path, unique for the process lifetime.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectPath(String);

impl ObjectPath {
    pub fn new(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    /// Child path `{self}/{segment}{index}`.
    pub fn child(&self, segment: &str, index: usize) -> Self {
        Self(format!("{}/{}{}", self.0, segment, index))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ObjectPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ObjectPath {
    fn from(path: &str) -> Self {
        Self::new(path)
    }
}

/// Set of operations a characteristic or descriptor permits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct Capabilities(u8);

impl Capabilities {
    pub const READ: Self = Self(0x01);
    pub const WRITE: Self = Self(0x02);
    pub const WRITE_WITHOUT_RESPONSE: Self = Self(0x04);
    pub const NOTIFY: Self = Self(0x08);

    /// Flag names in the order BlueZ documents them.
    const NAMES: [(Self, &'static str); 4] = [
        (Self::READ, "read"),
        (Self::WRITE, "write"),
        (Self::WRITE_WITHOUT_RESPONSE, "write-without-response"),
        (Self::NOTIFY, "notify"),
    ];

    /// Empty set.
    pub const fn empty() -> Self {
        Self(0)
    }

    #[inline]
    pub const fn contains(&self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// True if either write flavour is permitted.
    #[inline]
    pub const fn can_write(&self) -> bool {
        self.0 & (Self::WRITE.0 | Self::WRITE_WITHOUT_RESPONSE.0) != 0
    }

    /// BlueZ `Flags` property value.
    pub fn flags(&self) -> Vec<&'static str> {
        Self::NAMES
            .iter()
            .filter(|(flag, _)| self.contains(*flag))
            .map(|(_, name)| *name)
            .collect()
    }
}

impl BitOr for Capabilities {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

/// A single property value as exposed to the host stack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropertyValue {
    Str(String),
    Bool(bool),
    Path(ObjectPath),
    Paths(Vec<ObjectPath>),
    Strs(Vec<String>),
}

/// Properties of one interface, keyed by property name.
pub type PropertyMap = BTreeMap<&'static str, PropertyValue>;

/// Interfaces of one object, keyed by interface name.
pub type InterfaceMap = BTreeMap<&'static str, PropertyMap>;

/// Result of an introspection query, in depth-first declared order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ManagedObjects(Vec<(ObjectPath, InterfaceMap)>);

impl ManagedObjects {
    pub fn iter(&self) -> impl Iterator<Item = &(ObjectPath, InterfaceMap)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Interfaces registered at `path`, if any.
    pub fn get(&self, path: &ObjectPath) -> Option<&InterfaceMap> {
        self.0.iter().find(|(p, _)| p == path).map(|(_, i)| i)
    }

    /// Paths in traversal order.
    pub fn paths(&self) -> Vec<&ObjectPath> {
        self.0.iter().map(|(p, _)| p).collect()
    }

    fn push(&mut self, path: ObjectPath, interface: &'static str, properties: PropertyMap) {
        let mut interfaces = InterfaceMap::new();
        interfaces.insert(interface, properties);
        self.0.push((path, interfaces));
    }
}

/// A descriptor node.
#[derive(Debug, Clone)]
pub struct DescriptorNode {
    pub path: ObjectPath,
    pub characteristic: ObjectPath,
    pub spec: DescriptorSpec,
}

impl DescriptorNode {
    pub fn properties(&self) -> PropertyMap {
        let mut props = PropertyMap::new();
        props.insert("Characteristic", PropertyValue::Path(self.characteristic.clone()));
        props.insert("UUID", PropertyValue::Str(self.spec.uuid.to_string()));
        props.insert("Flags", flags_value(self.spec.capabilities));
        props
    }
}

/// A characteristic node.
#[derive(Debug, Clone)]
pub struct CharacteristicNode {
    pub path: ObjectPath,
    pub service: ObjectPath,
    pub kind: CharacteristicKind,
    pub descriptors: Vec<DescriptorNode>,
}

impl CharacteristicNode {
    pub fn uuid(&self) -> Uuid {
        self.kind.uuid()
    }

    pub fn capabilities(&self) -> Capabilities {
        self.kind.capabilities()
    }

    pub fn properties(&self) -> PropertyMap {
        let mut props = PropertyMap::new();
        props.insert("Service", PropertyValue::Path(self.service.clone()));
        props.insert("UUID", PropertyValue::Str(self.uuid().to_string()));
        props.insert("Flags", flags_value(self.capabilities()));
        props.insert(
            "Descriptors",
            PropertyValue::Paths(self.descriptors.iter().map(|d| d.path.clone()).collect()),
        );
        props
    }
}

/// A service node.
#[derive(Debug, Clone)]
pub struct ServiceNode {
    pub path: ObjectPath,
    pub uuid: Uuid,
    pub primary: bool,
    pub characteristics: Vec<CharacteristicNode>,
}

impl ServiceNode {
    pub fn properties(&self) -> PropertyMap {
        let mut props = PropertyMap::new();
        props.insert("UUID", PropertyValue::Str(self.uuid.to_string()));
        props.insert("Primary", PropertyValue::Bool(self.primary));
        props.insert(
            "Characteristics",
            PropertyValue::Paths(self.characteristics.iter().map(|c| c.path.clone()).collect()),
        );
        props
    }
}

fn flags_value(capabilities: Capabilities) -> PropertyValue {
    PropertyValue::Strs(capabilities.flags().into_iter().map(String::from).collect())
}

/// Reference to any node of the tree.
#[derive(Debug, Clone, Copy)]
pub enum Node<'a> {
    Service(&'a ServiceNode),
    Characteristic(&'a CharacteristicNode),
    Descriptor(&'a DescriptorNode),
}

/// The static Application → Service → Characteristic → Descriptor hierarchy.
#[derive(Debug, Clone)]
pub struct ObjectTree {
    services: Vec<ServiceNode>,
}

impl ObjectTree {
    /// Build the WiFi configuration application.
    pub fn wifi_config() -> Self {
        let service_path = ObjectPath::new(format!("{}{}", SERVICE_PATH_BASE, 0));

        let characteristics = CharacteristicKind::ALL
            .iter()
            .enumerate()
            .map(|(index, kind)| {
                let path = service_path.child("char", index);
                let descriptors = kind
                    .descriptors()
                    .iter()
                    .enumerate()
                    .map(|(desc_index, spec)| DescriptorNode {
                        path: path.child("desc", desc_index),
                        characteristic: path.clone(),
                        spec: *spec,
                    })
                    .collect();
                CharacteristicNode {
                    path,
                    service: service_path.clone(),
                    kind: *kind,
                    descriptors,
                }
            })
            .collect();

        Self {
            services: vec![ServiceNode {
                path: service_path,
                uuid: SERVICE_UUID,
                primary: true,
                characteristics,
            }],
        }
    }

    pub fn services(&self) -> &[ServiceNode] {
        &self.services
    }

    /// All characteristics across services, in declared order.
    pub fn characteristics(&self) -> impl Iterator<Item = &CharacteristicNode> {
        self.services.iter().flat_map(|s| s.characteristics.iter())
    }

    /// Find the characteristic of a given kind.
    pub fn characteristic(&self, kind: CharacteristicKind) -> Option<&CharacteristicNode> {
        self.characteristics().find(|c| c.kind == kind)
    }

    /// Find any node by path.
    pub fn find(&self, path: &ObjectPath) -> Option<Node<'_>> {
        for service in &self.services {
            if &service.path == path {
                return Some(Node::Service(service));
            }
            for chrc in &service.characteristics {
                if &chrc.path == path {
                    return Some(Node::Characteristic(chrc));
                }
                if let Some(desc) = chrc.descriptors.iter().find(|d| &d.path == path) {
                    return Some(Node::Descriptor(desc));
                }
            }
        }
        None
    }

    /// Introspection query: every service, then its characteristics in
    /// declared order, each followed by its descriptors.
    pub fn managed_objects(&self) -> ManagedObjects {
        let mut objects = ManagedObjects::default();
        for service in &self.services {
            objects.push(service.path.clone(), GATT_SERVICE_IFACE, service.properties());
            for chrc in &service.characteristics {
                objects.push(chrc.path.clone(), GATT_CHRC_IFACE, chrc.properties());
                for desc in &chrc.descriptors {
                    objects.push(desc.path.clone(), GATT_DESC_IFACE, desc.properties());
                }
            }
        }
        objects
    }

    /// Property query (`GetAll`) for one object and interface.
    ///
    /// Fails with [`GattError::InvalidArgs`] when the object does not expose
    /// `interface` or the path is unknown.
    pub fn get_all(&self, path: &ObjectPath, interface: &str) -> Result<PropertyMap, GattError> {
        let node = self
            .find(path)
            .ok_or_else(|| GattError::InvalidArgs(format!("unknown object {}", path)))?;

        let (expected, properties) = match node {
            Node::Service(s) => (GATT_SERVICE_IFACE, s.properties()),
            Node::Characteristic(c) => (GATT_CHRC_IFACE, c.properties()),
            Node::Descriptor(d) => (GATT_DESC_IFACE, d.properties()),
        };

        if interface != expected {
            return Err(GattError::InvalidArgs(interface.to_string()));
        }
        Ok(properties)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ==================== Capabilities Tests ====================

    #[test]
    fn test_capabilities_contains() {
        let caps = Capabilities::WRITE | Capabilities::NOTIFY;
        assert!(caps.contains(Capabilities::WRITE));
        assert!(caps.contains(Capabilities::NOTIFY));
        assert!(!caps.contains(Capabilities::READ));
        assert!(caps.can_write());
        assert!(!Capabilities::READ.can_write());
        assert!(Capabilities::WRITE_WITHOUT_RESPONSE.can_write());
        assert!(Capabilities::empty().flags().is_empty());
    }

    // ==================== Tree Shape Tests ====================

    #[test]
    fn test_paths_nest_under_owner() {
        let tree = ObjectTree::wifi_config();
        let service = &tree.services()[0];
        assert_eq!(service.path.as_str(), "/com/pisugar/wifi/service0");

        for (index, chrc) in service.characteristics.iter().enumerate() {
            assert_eq!(chrc.path, service.path.child("char", index));
            assert_eq!(chrc.service, service.path);
            for desc in &chrc.descriptors {
                assert!(desc.path.as_str().starts_with(chrc.path.as_str()));
                assert_eq!(desc.characteristic, chrc.path);
            }
        }
    }

    #[test]
    fn test_characteristics_in_declared_order() {
        let tree = ObjectTree::wifi_config();
        let kinds: Vec<_> = tree.characteristics().map(|c| c.kind).collect();
        assert_eq!(kinds, CharacteristicKind::ALL.to_vec());
    }

    // ==================== Introspection Tests ====================

    #[test]
    fn test_managed_objects_depth_first() {
        let tree = ObjectTree::wifi_config();
        let objects = tree.managed_objects();

        // 1 service + 8 characteristics + 2 descriptors
        assert_eq!(objects.len(), 11);

        let paths: Vec<&str> = objects.paths().iter().map(|p| p.as_str()).collect();
        assert_eq!(
            paths,
            vec![
                "/com/pisugar/wifi/service0",
                "/com/pisugar/wifi/service0/char0",
                "/com/pisugar/wifi/service0/char0/desc0",
                "/com/pisugar/wifi/service0/char1",
                "/com/pisugar/wifi/service0/char1/desc0",
                "/com/pisugar/wifi/service0/char2",
                "/com/pisugar/wifi/service0/char3",
                "/com/pisugar/wifi/service0/char4",
                "/com/pisugar/wifi/service0/char5",
                "/com/pisugar/wifi/service0/char6",
                "/com/pisugar/wifi/service0/char7",
            ]
        );
    }

    #[test]
    fn test_managed_objects_one_interface_each() {
        let tree = ObjectTree::wifi_config();
        for (path, interfaces) in tree.managed_objects().iter() {
            assert_eq!(interfaces.len(), 1, "{} has {} interfaces", path, interfaces.len());
        }
    }

    #[test]
    fn test_service_properties() {
        let tree = ObjectTree::wifi_config();
        let objects = tree.managed_objects();
        let service = &tree.services()[0];
        let props = &objects.get(&service.path).unwrap()[GATT_SERVICE_IFACE];

        assert_eq!(
            props["UUID"],
            PropertyValue::Str("fd2b4448-aa0f-4a15-a62f-eb0be77a0000".into())
        );
        assert_eq!(props["Primary"], PropertyValue::Bool(true));
        match &props["Characteristics"] {
            PropertyValue::Paths(paths) => assert_eq!(paths.len(), 8),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_characteristic_properties() {
        let tree = ObjectTree::wifi_config();
        let chrc = tree.characteristic(CharacteristicKind::CommandExecution).unwrap();
        let props = chrc.properties();

        assert_eq!(props["Service"], PropertyValue::Path(chrc.service.clone()));
        assert_eq!(
            props["Flags"],
            PropertyValue::Strs(vec![
                "write".into(),
                "write-without-response".into(),
                "notify".into()
            ])
        );
        assert_eq!(props["Descriptors"], PropertyValue::Paths(vec![]));
    }

    #[test]
    fn test_descriptor_properties() {
        let tree = ObjectTree::wifi_config();
        let chrc = tree.characteristic(CharacteristicKind::ServiceName).unwrap();
        let desc = &chrc.descriptors[0];
        let props = desc.properties();

        assert_eq!(props["Characteristic"], PropertyValue::Path(chrc.path.clone()));
        assert_eq!(props["Flags"], PropertyValue::Strs(vec!["read".into()]));
    }

    // ==================== GetAll Tests ====================

    #[test]
    fn test_get_all_matching_interface() {
        let tree = ObjectTree::wifi_config();
        let chrc = tree.characteristic(CharacteristicKind::DeviceModel).unwrap();
        let props = tree.get_all(&chrc.path, GATT_CHRC_IFACE).unwrap();
        assert_eq!(props, chrc.properties());
    }

    #[test]
    fn test_get_all_wrong_interface() {
        let tree = ObjectTree::wifi_config();
        let service_path = tree.services()[0].path.clone();
        assert_eq!(
            tree.get_all(&service_path, GATT_CHRC_IFACE),
            Err(GattError::InvalidArgs(GATT_CHRC_IFACE.to_string()))
        );

        let desc_path = tree
            .characteristic(CharacteristicKind::ServiceName)
            .unwrap()
            .descriptors[0]
            .path
            .clone();
        assert!(matches!(
            tree.get_all(&desc_path, "org.example.Bogus"),
            Err(GattError::InvalidArgs(_))
        ));
    }

    #[test]
    fn test_get_all_unknown_path() {
        let tree = ObjectTree::wifi_config();
        let result = tree.get_all(&ObjectPath::new("/nowhere"), GATT_SERVICE_IFACE);
        assert!(matches!(result, Err(GattError::InvalidArgs(_))));
    }
}
