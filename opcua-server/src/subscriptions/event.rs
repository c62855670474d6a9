// OPCUA for Rust
// SPDX-License-Identifier: MPL-2.0

//! Event notification: a fired event's field values, and the "bubbling up"
//! walk that finds which notifier nodes an event reported on a source node
//! also reaches (`SPEC_FULL.md` §4.9's Event MonitoredItem support).

use std::collections::HashMap;

use opcua_nodes::{reference_type, AddressSpace, EventNotifier, NodeBase, NodeType};
use opcua_types::generated::event_filter::{EventFieldSource, SimpleAttributeOperand};
use opcua_types::{NodeId, Variant};

/// One occurrence of an event, as field name -> value. Built by whatever part of the server
/// raises the event (e.g. a method call, a condition transition); this crate has no built-in
/// event sources of its own.
#[derive(Debug, Clone, Default)]
pub struct FiredEvent {
    /// Node the event was reported on, e.g. the object whose state changed.
    pub source_node: NodeId,
    /// Field values, keyed by the last browse-name hop of the field's path (e.g. `"Severity"`,
    /// `"Message"`). Matches how `SimpleAttributeOperand::value_of` builds single-hop paths.
    pub fields: HashMap<String, Variant>,
}

impl FiredEvent {
    /// An event with no fields set yet, for callers to fill in with `set`.
    pub fn new(source_node: NodeId) -> Self {
        Self { source_node, fields: HashMap::new() }
    }

    /// Set one field's value, returning `self` for chaining.
    pub fn with_field(mut self, name: impl Into<String>, value: Variant) -> Self {
        self.fields.insert(name.into(), value);
        self
    }
}

impl EventFieldSource for FiredEvent {
    fn resolve(&self, field: &SimpleAttributeOperand) -> Option<Variant> {
        let name = field.browse_path.as_ref()?.last()?.name.as_ref();
        self.fields.get(name).cloned()
    }
}

fn event_notifier_of(node: &NodeType) -> EventNotifier {
    match node {
        NodeType::Object(obj) => obj.event_notifier(),
        _ => EventNotifier::empty(),
    }
}

/// Walk `organizes()`/`has_component()` parent edges from `source_node` (inclusive) up through
/// the address space tree, collecting every node whose `EventNotifier::SUBSCRIBE_TO_EVENTS` bit
/// is set. Event MonitoredItems on any of these nodes are reached by an event fired on
/// `source_node` (the standard's `HasNotifier`/`HasEventSource` bubbling rule, expressed here
/// over the two hierarchical reference types this address space actually models — see
/// `opcua-nodes`' `reference_type` module).
pub fn reachable_notifiers(space: &AddressSpace, source_node: &NodeId) -> Vec<NodeId> {
    let organizes = reference_type::organizes();
    let has_component = reference_type::has_component();

    let mut reached = Vec::new();
    let mut frontier = vec![source_node.clone()];
    let mut visited = std::collections::HashSet::new();
    visited.insert(source_node.clone());

    while let Some(current) = frontier.pop() {
        if let Some(node) = space.find(&current) {
            if event_notifier_of(node).contains(EventNotifier::SUBSCRIBE_TO_EVENTS) {
                reached.push(current.clone());
            }
        }
        let parents = space
            .references()
            .inverse(&current, Some(&organizes))
            .chain(space.references().inverse(&current, Some(&has_component)))
            .map(|r| r.target_node.clone())
            .collect::<Vec<_>>();
        for parent in parents {
            if visited.insert(parent.clone()) {
                frontier.push(parent);
            }
        }
    }

    reached
}

#[cfg(test)]
mod tests {
    use super::*;
    use opcua_nodes::{ObjectNode, ReferenceDirection};
    use opcua_types::{LocalizedText, QualifiedName};

    fn object(id: u32) -> ObjectNode {
        let name = format!("N{id}");
        ObjectNode::new(NodeId::new(1, id), QualifiedName::new(1, name.clone()), LocalizedText::from(name.as_str()))
    }

    #[test]
    fn event_bubbles_up_to_subscribed_ancestor() {
        let mut space = AddressSpace::new();
        let server = NodeId::new(1, 1u32);
        let mut server_node = object(1);
        server_node.set_event_notifier(EventNotifier::SUBSCRIBE_TO_EVENTS);
        space.insert(server_node, &[]);

        let device = NodeId::new(1, 2u32);
        space.insert(object(2), &[(&server, opcua_nodes::reference_type::organizes(), ReferenceDirection::Inverse)]);

        let reached = reachable_notifiers(&space, &device);
        assert_eq!(reached, vec![server]);
    }

    #[test]
    fn source_node_itself_counts_if_subscribable() {
        let mut space = AddressSpace::new();
        let mut node = object(1);
        node.set_event_notifier(EventNotifier::SUBSCRIBE_TO_EVENTS);
        let id = node.node_id().clone();
        space.insert(node, &[]);

        assert_eq!(reachable_notifiers(&space, &id), vec![id]);
    }

    #[test]
    fn fired_event_resolves_fields_by_last_path_segment() {
        let event = FiredEvent::new(NodeId::new(1, 1u32)).with_field("Severity", Variant::UInt16(500));
        let resolved = event.resolve(&SimpleAttributeOperand::value_of(&["Severity"]));
        assert_eq!(resolved, Some(Variant::UInt16(500)));
    }
}
