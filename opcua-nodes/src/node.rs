// OPCUA for Rust
// SPDX-License-Identifier: MPL-2.0

use opcua_types::{status_code::StatusCode, DataValue, LocalizedText, NodeId, QualifiedName, Variant};

use crate::{AccessLevel, EventNotifier, NodeClass};

/// Attribute ids common to every node class. Part 4 Figure B.7 wire values.
mod attr {
    pub const NODE_ID: u32 = 1;
    pub const NODE_CLASS: u32 = 2;
    pub const BROWSE_NAME: u32 = 3;
    pub const DISPLAY_NAME: u32 = 4;
    pub const DESCRIPTION: u32 = 5;
    pub const WRITE_MASK: u32 = 6;
    pub const USER_WRITE_MASK: u32 = 7;
    pub const EVENT_NOTIFIER: u32 = 12;
    pub const VALUE: u32 = 13;
    pub const DATA_TYPE: u32 = 14;
    pub const VALUE_RANK: u32 = 15;
    pub const ARRAY_DIMENSIONS: u32 = 16;
    pub const ACCESS_LEVEL: u32 = 17;
    pub const USER_ACCESS_LEVEL: u32 = 18;
    pub const MINIMUM_SAMPLING_INTERVAL: u32 = 19;
    pub const HISTORIZING: u32 = 20;
    pub const EXECUTABLE: u32 = 21;
    pub const USER_EXECUTABLE: u32 = 22;
}

/// Common accessors every node class exposes, backed by [`Base`].
pub trait NodeBase {
    /// This node's class.
    fn node_class(&self) -> NodeClass;
    /// This node's id. Immutable once inserted into an address space.
    fn node_id(&self) -> &NodeId;
    /// This node's browse name. Unique among its siblings under a given parent.
    fn browse_name(&self) -> &QualifiedName;
    /// This node's display name.
    fn display_name(&self) -> &LocalizedText;
    /// Set the display name.
    fn set_display_name(&mut self, display_name: LocalizedText);
    /// This node's description, if any.
    fn description(&self) -> Option<&LocalizedText>;
    /// Set the description.
    fn set_description(&mut self, description: LocalizedText);
    /// This node's write mask, if it declares one.
    fn write_mask(&self) -> Option<u32>;
    /// Set the write mask.
    fn set_write_mask(&mut self, write_mask: u32);
    /// This node's user write mask, if it declares one.
    fn user_write_mask(&self) -> Option<u32>;
    /// Set the user write mask.
    fn set_user_write_mask(&mut self, user_write_mask: u32);
}

/// Read/write a node's attributes by numeric [`opcua_types::AttributeId`].
pub trait Node: NodeBase {
    /// Read one attribute, or `None` if this node class doesn't have it.
    fn get_attribute(&self, attribute_id: u32) -> Option<DataValue>;
    /// Write one attribute. `BadAttributeIdInvalid` if this node class doesn't have it;
    /// `BadNotWritable` if the attribute is read-only; `BadTypeMismatch` on a type-incompatible
    /// value.
    fn set_attribute(&mut self, attribute_id: u32, value: Variant) -> Result<(), StatusCode>;
}

/// Attributes shared by every node class: Part 3 diagram B.4.
#[derive(Debug, Clone)]
pub struct Base {
    node_id: NodeId,
    node_class: NodeClass,
    browse_name: QualifiedName,
    display_name: LocalizedText,
    description: Option<LocalizedText>,
    write_mask: Option<u32>,
    user_write_mask: Option<u32>,
}

impl Base {
    /// Construct a new base with no description or write masks set.
    pub fn new(node_id: NodeId, node_class: NodeClass, browse_name: QualifiedName, display_name: LocalizedText) -> Self {
        Self { node_id, node_class, browse_name, display_name, description: None, write_mask: None, user_write_mask: None }
    }

    fn get_attribute(&self, attribute_id: u32) -> Option<DataValue> {
        match attribute_id {
            attr::NODE_ID => Some(DataValue::new_now(Variant::NodeId(Box::new(self.node_id.clone())))),
            attr::NODE_CLASS => Some(DataValue::new_now(Variant::Int32(self.node_class as i32))),
            attr::BROWSE_NAME => Some(DataValue::new_now(Variant::QualifiedName(Box::new(self.browse_name.clone())))),
            attr::DISPLAY_NAME => Some(DataValue::new_now(Variant::LocalizedText(Box::new(self.display_name.clone())))),
            attr::DESCRIPTION => self.description.clone().map(|d| DataValue::new_now(Variant::LocalizedText(Box::new(d)))),
            attr::WRITE_MASK => self.write_mask.map(|v| DataValue::new_now(Variant::UInt32(v))),
            attr::USER_WRITE_MASK => self.user_write_mask.map(|v| DataValue::new_now(Variant::UInt32(v))),
            _ => None,
        }
    }

    fn set_attribute(&mut self, attribute_id: u32, value: Variant) -> Result<Option<()>, StatusCode> {
        match attribute_id {
            attr::DISPLAY_NAME => match value {
                Variant::LocalizedText(v) => {
                    self.display_name = *v;
                    Ok(Some(()))
                }
                _ => Err(StatusCode::BadTypeMismatch),
            },
            attr::DESCRIPTION => match value {
                Variant::LocalizedText(v) => {
                    self.description = Some(*v);
                    Ok(Some(()))
                }
                _ => Err(StatusCode::BadTypeMismatch),
            },
            attr::WRITE_MASK => match value {
                Variant::UInt32(v) => {
                    self.write_mask = Some(v);
                    Ok(Some(()))
                }
                _ => Err(StatusCode::BadTypeMismatch),
            },
            attr::USER_WRITE_MASK => match value {
                Variant::UInt32(v) => {
                    self.user_write_mask = Some(v);
                    Ok(Some(()))
                }
                _ => Err(StatusCode::BadTypeMismatch),
            },
            attr::NODE_ID | attr::NODE_CLASS | attr::BROWSE_NAME => Err(StatusCode::BadNotWritable),
            _ => Ok(None),
        }
    }
}

impl NodeBase for Base {
    fn node_class(&self) -> NodeClass {
        self.node_class
    }
    fn node_id(&self) -> &NodeId {
        &self.node_id
    }
    fn browse_name(&self) -> &QualifiedName {
        &self.browse_name
    }
    fn display_name(&self) -> &LocalizedText {
        &self.display_name
    }
    fn set_display_name(&mut self, display_name: LocalizedText) {
        self.display_name = display_name;
    }
    fn description(&self) -> Option<&LocalizedText> {
        self.description.as_ref()
    }
    fn set_description(&mut self, description: LocalizedText) {
        self.description = Some(description);
    }
    fn write_mask(&self) -> Option<u32> {
        self.write_mask
    }
    fn set_write_mask(&mut self, write_mask: u32) {
        self.write_mask = Some(write_mask);
    }
    fn user_write_mask(&self) -> Option<u32> {
        self.user_write_mask
    }
    fn set_user_write_mask(&mut self, user_write_mask: u32) {
        self.user_write_mask = Some(user_write_mask);
    }
}

macro_rules! node_base_impl {
    ($ty:ident) => {
        impl NodeBase for $ty {
            fn node_class(&self) -> NodeClass {
                self.base.node_class()
            }
            fn node_id(&self) -> &NodeId {
                self.base.node_id()
            }
            fn browse_name(&self) -> &QualifiedName {
                self.base.browse_name()
            }
            fn display_name(&self) -> &LocalizedText {
                self.base.display_name()
            }
            fn set_display_name(&mut self, display_name: LocalizedText) {
                self.base.set_display_name(display_name);
            }
            fn description(&self) -> Option<&LocalizedText> {
                self.base.description()
            }
            fn set_description(&mut self, description: LocalizedText) {
                self.base.set_description(description);
            }
            fn write_mask(&self) -> Option<u32> {
                self.base.write_mask()
            }
            fn set_write_mask(&mut self, write_mask: u32) {
                self.base.set_write_mask(write_mask);
            }
            fn user_write_mask(&self) -> Option<u32> {
                self.base.user_write_mask()
            }
            fn set_user_write_mask(&mut self, user_write_mask: u32) {
                self.base.set_user_write_mask(user_write_mask);
            }
        }
    };
}

/// An Object node: a container for other nodes, optionally able to raise events.
#[derive(Debug, Clone)]
pub struct ObjectNode {
    base: Base,
    event_notifier: EventNotifier,
}

impl ObjectNode {
    /// Build a new Object node with no event-raising capability.
    pub fn new(node_id: NodeId, browse_name: QualifiedName, display_name: LocalizedText) -> Self {
        Self { base: Base::new(node_id, NodeClass::Object, browse_name, display_name), event_notifier: EventNotifier::empty() }
    }

    /// Set the `EventNotifier` bits, e.g. `SUBSCRIBE_TO_EVENTS` for an object that raises events.
    pub fn set_event_notifier(&mut self, event_notifier: EventNotifier) {
        self.event_notifier = event_notifier;
    }

    /// The current `EventNotifier` bits.
    pub fn event_notifier(&self) -> EventNotifier {
        self.event_notifier
    }
}

node_base_impl!(ObjectNode);

impl Node for ObjectNode {
    fn get_attribute(&self, attribute_id: u32) -> Option<DataValue> {
        if attribute_id == attr::EVENT_NOTIFIER {
            return Some(DataValue::new_now(Variant::Byte(self.event_notifier.bits())));
        }
        self.base.get_attribute(attribute_id)
    }

    fn set_attribute(&mut self, attribute_id: u32, value: Variant) -> Result<(), StatusCode> {
        if attribute_id == attr::EVENT_NOTIFIER {
            return match value {
                Variant::Byte(v) => {
                    self.event_notifier = EventNotifier::from_bits_truncate(v);
                    Ok(())
                }
                _ => Err(StatusCode::BadTypeMismatch),
            };
        }
        match self.base.set_attribute(attribute_id, value)? {
            Some(()) => Ok(()),
            None => Err(StatusCode::BadAttributeIdInvalid),
        }
    }
}

/// A Variable node: the current value, data type, and access rules for a data point.
#[derive(Debug, Clone)]
pub struct VariableNode {
    base: Base,
    value: DataValue,
    data_type: NodeId,
    value_rank: i32,
    array_dimensions: Option<Vec<u32>>,
    access_level: AccessLevel,
    user_access_level: AccessLevel,
    minimum_sampling_interval: f64,
    historizing: bool,
}

impl VariableNode {
    /// Build a new Variable node, initially holding `value` and readable/writable
    /// (`CURRENT_READ | CURRENT_WRITE`).
    pub fn new(node_id: NodeId, browse_name: QualifiedName, display_name: LocalizedText, data_type: NodeId, value: Variant) -> Self {
        Self {
            base: Base::new(node_id, NodeClass::Variable, browse_name, display_name),
            value: DataValue::new_now(value),
            data_type,
            value_rank: -1,
            array_dimensions: None,
            access_level: AccessLevel::CURRENT_READ | AccessLevel::CURRENT_WRITE,
            user_access_level: AccessLevel::CURRENT_READ | AccessLevel::CURRENT_WRITE,
            minimum_sampling_interval: 0.0,
            historizing: false,
        }
    }

    /// The current value, with its status and timestamps.
    pub fn value(&self) -> &DataValue {
        &self.value
    }

    /// Overwrite the current value, bypassing the access-level check `set_attribute` applies.
    /// Used by server-side code that owns the variable (e.g. a simulated data source).
    pub fn set_value_direct(&mut self, value: DataValue) {
        self.value = value;
    }

    /// Restrict who may read/write the current value.
    pub fn set_access_level(&mut self, access_level: AccessLevel) {
        self.access_level = access_level;
        self.user_access_level = access_level;
    }

    /// The declared access level.
    pub fn access_level(&self) -> AccessLevel {
        self.access_level
    }

    /// The smallest interval, in ms, a MonitoredItem may sample this variable at; 0 means no
    /// limit.
    pub fn minimum_sampling_interval(&self) -> f64 {
        self.minimum_sampling_interval
    }

    /// Set the minimum sampling interval.
    pub fn set_minimum_sampling_interval(&mut self, minimum_sampling_interval: f64) {
        self.minimum_sampling_interval = minimum_sampling_interval;
    }
}

node_base_impl!(VariableNode);

impl Node for VariableNode {
    fn get_attribute(&self, attribute_id: u32) -> Option<DataValue> {
        match attribute_id {
            attr::VALUE => Some(self.value.clone()),
            attr::DATA_TYPE => Some(DataValue::new_now(Variant::NodeId(Box::new(self.data_type.clone())))),
            attr::VALUE_RANK => Some(DataValue::new_now(Variant::Int32(self.value_rank))),
            attr::ARRAY_DIMENSIONS => self.array_dimensions.clone().map(|d| {
                DataValue::new_now(Variant::Array(Box::new(opcua_types::variant::VariantArray {
                    type_id: opcua_types::VariantScalarTypeId::UInt32,
                    elements: d.into_iter().map(Variant::UInt32).collect(),
                    dimensions: None,
                })))
            }),
            attr::ACCESS_LEVEL => Some(DataValue::new_now(Variant::Byte(self.access_level.bits()))),
            attr::USER_ACCESS_LEVEL => Some(DataValue::new_now(Variant::Byte(self.user_access_level.bits()))),
            attr::MINIMUM_SAMPLING_INTERVAL => Some(DataValue::new_now(Variant::Double(self.minimum_sampling_interval))),
            attr::HISTORIZING => Some(DataValue::new_now(Variant::Boolean(self.historizing))),
            _ => self.base.get_attribute(attribute_id),
        }
    }

    fn set_attribute(&mut self, attribute_id: u32, value: Variant) -> Result<(), StatusCode> {
        if attribute_id == attr::VALUE {
            if !self.access_level.contains(AccessLevel::CURRENT_WRITE) {
                return Err(StatusCode::BadNotWritable);
            }
            self.value = DataValue::new_now(value);
            return Ok(());
        }
        match self.base.set_attribute(attribute_id, value)? {
            Some(()) => Ok(()),
            None => Err(StatusCode::BadAttributeIdInvalid),
        }
    }
}

/// A Method node: callable via the `Call` service.
#[derive(Debug, Clone)]
pub struct MethodNode {
    base: Base,
    executable: bool,
    user_executable: bool,
}

impl MethodNode {
    /// Build a new Method node, initially executable.
    pub fn new(node_id: NodeId, browse_name: QualifiedName, display_name: LocalizedText) -> Self {
        Self { base: Base::new(node_id, NodeClass::Method, browse_name, display_name), executable: true, user_executable: true }
    }

    /// Whether `Call` may currently invoke this method.
    pub fn executable(&self) -> bool {
        self.executable
    }

    /// Enable or disable this method.
    pub fn set_executable(&mut self, executable: bool) {
        self.executable = executable;
        self.user_executable = executable;
    }
}

node_base_impl!(MethodNode);

impl Node for MethodNode {
    fn get_attribute(&self, attribute_id: u32) -> Option<DataValue> {
        match attribute_id {
            attr::EXECUTABLE => Some(DataValue::new_now(Variant::Boolean(self.executable))),
            attr::USER_EXECUTABLE => Some(DataValue::new_now(Variant::Boolean(self.user_executable))),
            _ => self.base.get_attribute(attribute_id),
        }
    }

    fn set_attribute(&mut self, attribute_id: u32, value: Variant) -> Result<(), StatusCode> {
        match self.base.set_attribute(attribute_id, value)? {
            Some(()) => Ok(()),
            None => Err(StatusCode::BadAttributeIdInvalid),
        }
    }
}

/// A View node: a named, filtered subset of the address space for Browse's `view_id` parameter.
#[derive(Debug, Clone)]
pub struct ViewNode {
    base: Base,
    event_notifier: EventNotifier,
    contains_no_loops: bool,
}

impl ViewNode {
    /// Build a new View node.
    pub fn new(node_id: NodeId, browse_name: QualifiedName, display_name: LocalizedText) -> Self {
        Self { base: Base::new(node_id, NodeClass::View, browse_name, display_name), event_notifier: EventNotifier::empty(), contains_no_loops: true }
    }
}

node_base_impl!(ViewNode);

impl Node for ViewNode {
    fn get_attribute(&self, attribute_id: u32) -> Option<DataValue> {
        match attribute_id {
            attr::EVENT_NOTIFIER => Some(DataValue::new_now(Variant::Byte(self.event_notifier.bits()))),
            23 => Some(DataValue::new_now(Variant::Boolean(self.contains_no_loops))),
            _ => self.base.get_attribute(attribute_id),
        }
    }

    fn set_attribute(&mut self, attribute_id: u32, value: Variant) -> Result<(), StatusCode> {
        match self.base.set_attribute(attribute_id, value)? {
            Some(()) => Ok(()),
            None => Err(StatusCode::BadAttributeIdInvalid),
        }
    }
}

/// Any node class this address space can store.
#[derive(Debug, Clone)]
pub enum NodeType {
    /// An Object node.
    Object(Box<ObjectNode>),
    /// A Variable node.
    Variable(Box<VariableNode>),
    /// A Method node.
    Method(Box<MethodNode>),
    /// A View node.
    View(Box<ViewNode>),
}

macro_rules! dispatch {
    ($self:ident, $method:ident $(, $arg:ident)*) => {
        match $self {
            NodeType::Object(n) => n.$method($($arg),*),
            NodeType::Variable(n) => n.$method($($arg),*),
            NodeType::Method(n) => n.$method($($arg),*),
            NodeType::View(n) => n.$method($($arg),*),
        }
    };
}

impl NodeBase for NodeType {
    fn node_class(&self) -> NodeClass {
        dispatch!(self, node_class)
    }
    fn node_id(&self) -> &NodeId {
        dispatch!(self, node_id)
    }
    fn browse_name(&self) -> &QualifiedName {
        dispatch!(self, browse_name)
    }
    fn display_name(&self) -> &LocalizedText {
        dispatch!(self, display_name)
    }
    fn set_display_name(&mut self, display_name: LocalizedText) {
        dispatch!(self, set_display_name, display_name)
    }
    fn description(&self) -> Option<&LocalizedText> {
        dispatch!(self, description)
    }
    fn set_description(&mut self, description: LocalizedText) {
        dispatch!(self, set_description, description)
    }
    fn write_mask(&self) -> Option<u32> {
        dispatch!(self, write_mask)
    }
    fn set_write_mask(&mut self, write_mask: u32) {
        dispatch!(self, set_write_mask, write_mask)
    }
    fn user_write_mask(&self) -> Option<u32> {
        dispatch!(self, user_write_mask)
    }
    fn set_user_write_mask(&mut self, user_write_mask: u32) {
        dispatch!(self, set_user_write_mask, user_write_mask)
    }
}

impl Node for NodeType {
    fn get_attribute(&self, attribute_id: u32) -> Option<DataValue> {
        dispatch!(self, get_attribute, attribute_id)
    }
    fn set_attribute(&mut self, attribute_id: u32, value: Variant) -> Result<(), StatusCode> {
        dispatch!(self, set_attribute, attribute_id, value)
    }
}

impl From<ObjectNode> for NodeType {
    fn from(value: ObjectNode) -> Self {
        Self::Object(Box::new(value))
    }
}
impl From<VariableNode> for NodeType {
    fn from(value: VariableNode) -> Self {
        Self::Variable(Box::new(value))
    }
}
impl From<MethodNode> for NodeType {
    fn from(value: MethodNode) -> Self {
        Self::Method(Box::new(value))
    }
}
impl From<ViewNode> for NodeType {
    fn from(value: ViewNode) -> Self {
        Self::View(Box::new(value))
    }
}
