// OPCUA for Rust
// SPDX-License-Identifier: MPL-2.0

#![warn(missing_docs)]

//! In-memory address space: node storage, the reference graph, and the
//! attribute-level Read/Write/Browse/TranslateBrowsePath operations the
//! Services layer dispatches into.
//!
//! This crate does not model the full OPC UA type system (ObjectType,
//! VariableType, DataType and ReferenceType nodes with their own subtype
//! hierarchies) — it stores instance nodes (`Object`, `Variable`, `Method`,
//! `View`) and lets references point at type nodes addressed only by
//! `NodeId`, which is all the Services layer needs to answer Browse and
//! attribute requests.

mod address_space;
mod node;
mod references;

pub use address_space::{AddressSpace, ContinuationPoint, NodeLifecycleHook};
pub use node::{Base, MethodNode, Node, NodeBase, ObjectNode, ViewNode, NodeType, VariableNode};
pub use references::{Reference, References};

use bitflags::bitflags;

/// Direction of a reference relative to the node it is being added to.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ReferenceDirection {
    /// Reference from the source node to the target.
    Forward,
    /// Reference from the target node to the source.
    Inverse,
}

/// The instance node classes this address space can store.
///
/// OPC UA defines four more (ObjectType, VariableType, ReferenceType,
/// DataType); this crate only ever stores instances of those, addressed by
/// `NodeId` in reference targets, never as full nodes.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum NodeClass {
    /// An Object node.
    Object = 1,
    /// A Variable node.
    Variable = 2,
    /// A Method node.
    Method = 4,
    /// A View node.
    View = 128,
}

bitflags! {
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
    /// Variable access level, attribute id 17/18.
    pub struct AccessLevel: u8 {
        /// Read the current value of the node.
        const CURRENT_READ = 1;
        /// Write the current value of the node.
        const CURRENT_WRITE = 2;
        /// Read historical values of the node.
        const HISTORY_READ = 4;
        /// Write historical values of the node.
        const HISTORY_WRITE = 8;
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
    /// Node event notifier, attribute id 12.
    pub struct EventNotifier: u8 {
        /// The node may be subscribed to for events.
        const SUBSCRIBE_TO_EVENTS = 1;
        /// The node supports reading historical events.
        const HISTORY_READ = 4;
        /// The node supports writing historical events.
        const HISTORY_WRITE = 8;
    }
}

/// Well-known reference type identifiers, in namespace 0.
///
/// The full standard defines several dozen; this crate's `opcua-codegen`
/// tool only emits the handful Browse and the builders below actually use.
pub mod reference_type {
    use opcua_types::NodeId;

    /// `i=35`: hierarchical containment used to organize the address space tree.
    pub fn organizes() -> NodeId {
        NodeId::new(0, 35u32)
    }
    /// `i=47`: a component owned by its parent (e.g. a Variable on an Object).
    pub fn has_component() -> NodeId {
        NodeId::new(0, 47u32)
    }
    /// `i=46`: a property of its parent.
    pub fn has_property() -> NodeId {
        NodeId::new(0, 46u32)
    }
    /// `i=40`: instance-to-type binding.
    pub fn has_type_definition() -> NodeId {
        NodeId::new(0, 40u32)
    }
    /// `i=41`: event-generating node to the event type it can raise.
    pub fn generates_event() -> NodeId {
        NodeId::new(0, 41u32)
    }
}
