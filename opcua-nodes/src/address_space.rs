// OPCUA for Rust
// SPDX-License-Identifier: MPL-2.0

use hashbrown::HashMap;

use opcua_types::{
    generated::{BrowseDescription, BrowseDirection, BrowsePath, BrowsePathResult, BrowsePathTarget, BrowseResult, ReferenceDescription},
    status_code::StatusCode,
    ByteString, DataValue, NodeId, Variant,
};

use crate::{Node, NodeBase, NodeClass, NodeType, ReferenceDirection, References};

/// Hook invoked as nodes enter or leave the address space, e.g. to notify the subscription
/// engine that a MonitoredItem's target no longer exists.
pub trait NodeLifecycleHook {
    /// Called after a node has been inserted.
    fn on_create(&self, node_id: &NodeId) {
        let _ = node_id;
    }
    /// Called just before a node is removed.
    fn on_delete(&self, node_id: &NodeId) {
        let _ = node_id;
    }
}

/// Opaque token naming a suspended Browse result, resumed by BrowseNext.
#[derive(Debug, Clone)]
pub struct ContinuationPoint {
    remaining: Vec<ReferenceDescription>,
}

fn node_class_matches(mask: u32, class: NodeClass) -> bool {
    mask == 0 || (mask & class as u32) != 0
}

/// An in-memory OPC UA address space: node storage, the reference graph, and the
/// attribute/browse operations the Services layer dispatches Read/Write/Browse/
/// TranslateBrowsePathsToNodeIds requests into.
pub struct AddressSpace {
    nodes: HashMap<NodeId, NodeType>,
    references: References,
    continuation_points: HashMap<Vec<u8>, ContinuationPoint>,
    next_continuation_point: u64,
    hooks: Vec<Box<dyn NodeLifecycleHook + Send + Sync>>,
}

impl Default for AddressSpace {
    fn default() -> Self {
        Self::new()
    }
}

impl AddressSpace {
    /// An empty address space with no nodes or references.
    pub fn new() -> Self {
        Self { nodes: HashMap::new(), references: References::new(), continuation_points: HashMap::new(), next_continuation_point: 1, hooks: Vec::new() }
    }

    /// Register a lifecycle hook, invoked on every future node insertion/removal.
    pub fn add_lifecycle_hook(&mut self, hook: impl NodeLifecycleHook + Send + Sync + 'static) {
        self.hooks.push(Box::new(hook));
    }

    /// Insert a node, plus any references to attach to it. Returns `false` (and does nothing) if
    /// a node with the same id already exists.
    pub fn insert(&mut self, node: impl Into<NodeType>, references: &[(&NodeId, NodeId, ReferenceDirection)]) -> bool {
        let node = node.into();
        let node_id = node.node_id().clone();
        if self.nodes.contains_key(&node_id) {
            return false;
        }
        for (target, reference_type, direction) in references {
            self.references.insert(&node_id, *target, reference_type.clone(), *direction);
        }
        self.nodes.insert(node_id.clone(), node);
        for hook in &self.hooks {
            hook.on_create(&node_id);
        }
        true
    }

    /// Remove a node and every reference touching it.
    pub fn remove(&mut self, node_id: &NodeId) -> Option<NodeType> {
        let node = self.nodes.remove(node_id)?;
        for hook in &self.hooks {
            hook.on_delete(node_id);
        }
        self.references.remove_node(node_id);
        Some(node)
    }

    /// Look up a node by id.
    pub fn find(&self, node_id: &NodeId) -> Option<&NodeType> {
        self.nodes.get(node_id)
    }

    /// Look up a node by id, mutably.
    pub fn find_mut(&mut self, node_id: &NodeId) -> Option<&mut NodeType> {
        self.nodes.get_mut(node_id)
    }

    /// The reference graph, for callers that need lower-level traversal (e.g. event
    /// "bubbling up" through `HasNotifier`/`HasEventSource`).
    pub fn references(&self) -> &References {
        &self.references
    }

    /// Read one attribute of one node. `index_range` is accepted but only a null range is
    /// supported; a non-null range is rejected with `BadIndexRangeInvalid` since this address
    /// space stores values as whole units, not slices.
    pub fn read_attribute(&self, node_id: &NodeId, attribute_id: u32, index_range_is_null: bool) -> DataValue {
        let Some(node) = self.nodes.get(node_id) else {
            return DataValue::new_error(StatusCode::BadNodeIdUnknown);
        };
        if !index_range_is_null {
            return DataValue::new_error(StatusCode::BadIndexRangeInvalid);
        }
        node.get_attribute(attribute_id).unwrap_or_else(|| DataValue::new_error(StatusCode::BadAttributeIdInvalid))
    }

    /// Write one attribute of one node.
    pub fn write_attribute(&mut self, node_id: &NodeId, attribute_id: u32, value: Variant, index_range_is_null: bool) -> StatusCode {
        let Some(node) = self.nodes.get_mut(node_id) else {
            return StatusCode::BadNodeIdUnknown;
        };
        if !index_range_is_null {
            return StatusCode::BadIndexRangeInvalid;
        }
        match node.set_attribute(attribute_id, value) {
            Ok(()) => StatusCode::Good,
            Err(e) => e,
        }
    }

    fn reference_description(&self, reference_type: NodeId, is_forward: bool, target: &NodeId) -> ReferenceDescription {
        match self.nodes.get(target) {
            Some(node) => ReferenceDescription {
                reference_type_id: reference_type,
                is_forward,
                node_id: target.clone(),
                browse_name: node.browse_name().clone(),
                display_name: node.display_name().clone(),
                node_class: node.node_class() as u32,
                type_definition: self.type_definition(target).unwrap_or_else(NodeId::null),
            },
            // The target is a type node (ObjectType, VariableType, ...) this address space
            // never stores as a full node; report what little Browse can know about it.
            None => ReferenceDescription { reference_type_id: reference_type, is_forward, node_id: target.clone(), ..Default::default() },
        }
    }

    fn type_definition(&self, node_id: &NodeId) -> Option<NodeId> {
        let has_type_definition = crate::reference_type::has_type_definition();
        let result = self.references.forward(node_id, Some(&has_type_definition)).next().map(|r| r.target_node.clone());
        result
    }

    /// Resolve one `BrowseDescription`, truncating to `max_references_per_node` and stashing the
    /// remainder behind a continuation point if `max_references_per_node > 0` and there's more.
    pub fn browse(&mut self, description: &BrowseDescription, max_references_per_node: u32) -> BrowseResult {
        if !self.nodes.contains_key(&description.node_id) {
            return BrowseResult { status_code: StatusCode::BadNodeIdUnknown, ..Default::default() };
        }

        let reference_type_filter = if description.reference_type_id.is_null() { None } else { Some(&description.reference_type_id) };

        let mut found = Vec::new();
        if matches!(description.browse_direction, BrowseDirection::Forward | BrowseDirection::Both) {
            for r in self.references.forward(&description.node_id, reference_type_filter) {
                found.push((r.reference_type.clone(), true, r.target_node.clone()));
            }
        }
        if matches!(description.browse_direction, BrowseDirection::Inverse | BrowseDirection::Both) {
            for r in self.references.inverse(&description.node_id, reference_type_filter) {
                found.push((r.reference_type.clone(), false, r.target_node.clone()));
            }
        }

        let mut references: Vec<ReferenceDescription> = found
            .into_iter()
            .filter(|(_, _, target)| self.nodes.get(target).map_or(true, |n| node_class_matches(description.node_class_mask, n.node_class())))
            .map(|(rt, fwd, target)| self.reference_description(rt, fwd, &target))
            .collect();

        self.paginate(&mut references, max_references_per_node)
    }

    fn paginate(&mut self, references: &mut Vec<ReferenceDescription>, max_references_per_node: u32) -> BrowseResult {
        if max_references_per_node == 0 || (references.len() as u32) <= max_references_per_node {
            return BrowseResult { status_code: StatusCode::Good, continuation_point: ByteString::null(), references: Some(std::mem::take(references)) };
        }

        let remaining = references.split_off(max_references_per_node as usize);
        let token = self.next_continuation_point;
        self.next_continuation_point += 1;
        let token_bytes = token.to_be_bytes().to_vec();
        self.continuation_points.insert(token_bytes.clone(), ContinuationPoint { remaining });

        BrowseResult { status_code: StatusCode::Good, continuation_point: ByteString::from(token_bytes), references: Some(std::mem::take(references)) }
    }

    /// Resume (or release) a Browse result previously truncated behind a continuation point.
    pub fn browse_next(&mut self, continuation_point: &ByteString, release: bool, max_references_per_node: u32) -> BrowseResult {
        let token = continuation_point.as_bytes();
        let Some(state) = self.continuation_points.remove(token) else {
            return BrowseResult { status_code: StatusCode::BadContinuationPointInvalid, ..Default::default() };
        };
        if release {
            return BrowseResult { status_code: StatusCode::Good, ..Default::default() };
        }

        let mut remaining = state.remaining;
        self.paginate(&mut remaining, max_references_per_node)
    }

    /// Resolve one relative browse path (a chain of browse names hopped via `Organizes`-or-other
    /// forward references) down from `path.starting_node`.
    pub fn translate_browse_path(&self, path: &BrowsePath) -> BrowsePathResult {
        if !self.nodes.contains_key(&path.starting_node) {
            return BrowsePathResult { status_code: StatusCode::BadNodeIdUnknown, targets: None };
        }
        let Some(hops) = &path.relative_path else {
            return BrowsePathResult { status_code: StatusCode::BadNothingToDo, targets: None };
        };
        if hops.is_empty() {
            return BrowsePathResult { status_code: StatusCode::BadNothingToDo, targets: None };
        }

        let mut current = vec![path.starting_node.clone()];
        for (i, hop) in hops.iter().enumerate() {
            let mut next = Vec::new();
            for node_id in &current {
                for r in self.references.forward(node_id, None) {
                    if let Some(target) = self.nodes.get(&r.target_node) {
                        if target.browse_name() == hop {
                            next.push(r.target_node.clone());
                        }
                    }
                }
            }
            if next.is_empty() {
                return BrowsePathResult {
                    status_code: StatusCode::BadNoMatch,
                    targets: Some(vec![BrowsePathTarget { target_id: NodeId::null(), remaining_path_index: (hops.len() - i) as u32 }]),
                };
            }
            current = next;
        }

        BrowsePathResult {
            status_code: StatusCode::Good,
            targets: Some(current.into_iter().map(|target_id| BrowsePathTarget { target_id, remaining_path_index: 0 }).collect()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ObjectNode, VariableNode};
    use opcua_types::{LocalizedText, QualifiedName};

    fn qn(name: &str) -> QualifiedName {
        QualifiedName::new(1, name)
    }

    fn insert_object(space: &mut AddressSpace, id: u32, name: &str, parent: Option<u32>) -> NodeId {
        let node_id = NodeId::new(1, id);
        let node = ObjectNode::new(node_id.clone(), qn(name), LocalizedText::from(name));
        let refs: Vec<(&NodeId, NodeId, ReferenceDirection)> = Vec::new();
        if let Some(parent) = parent {
            let parent_id = NodeId::new(1, parent);
            space.insert(node, &[(&parent_id, crate::reference_type::organizes(), ReferenceDirection::Inverse)]);
        } else {
            space.insert(node, &refs);
        }
        node_id
    }

    #[test]
    fn read_unknown_node_is_bad_node_id_unknown() {
        let space = AddressSpace::new();
        let result = space.read_attribute(&NodeId::new(1, 1u32), 1, true);
        assert_eq!(result.status, Some(StatusCode::BadNodeIdUnknown));
    }

    #[test]
    fn read_write_value_round_trips() {
        let mut space = AddressSpace::new();
        let node_id = NodeId::new(1, 1u32);
        let variable = VariableNode::new(node_id.clone(), qn("Temperature"), LocalizedText::from("Temperature"), NodeId::new(0, 11u32), Variant::Double(21.5));
        space.insert(variable, &[]);

        let status = space.write_attribute(&node_id, 13, Variant::Double(22.0), true);
        assert_eq!(status, StatusCode::Good);

        let read = space.read_attribute(&node_id, 13, true);
        assert_eq!(read.value, Some(Variant::Double(22.0)));
    }

    #[test]
    fn write_read_only_attribute_is_rejected() {
        let mut space = AddressSpace::new();
        let node_id = NodeId::new(1, 1u32);
        space.insert(ObjectNode::new(node_id.clone(), qn("Root"), LocalizedText::from("Root")), &[]);

        let status = space.write_attribute(&node_id, 1, Variant::UInt32(7), true);
        assert_eq!(status, StatusCode::BadNotWritable);
    }

    #[test]
    fn browse_finds_children_and_paginates() {
        let mut space = AddressSpace::new();
        let root = insert_object(&mut space, 1, "Root", None);
        for i in 2..7 {
            insert_object(&mut space, i, &format!("Child{i}"), Some(1));
        }

        let description = BrowseDescription { node_id: root.clone(), browse_direction: BrowseDirection::Forward, ..Default::default() };
        let first = space.browse(&description, 3);
        assert_eq!(first.status_code, StatusCode::Good);
        assert_eq!(first.references.as_ref().unwrap().len(), 3);
        assert!(!first.continuation_point.is_null());

        let second = space.browse_next(&first.continuation_point, false, 3);
        assert_eq!(second.status_code, StatusCode::Good);
        assert_eq!(second.references.as_ref().unwrap().len(), 2);
        assert!(second.continuation_point.is_null());
    }

    #[test]
    fn browse_next_with_unknown_token_is_rejected() {
        let mut space = AddressSpace::new();
        let result = space.browse_next(&ByteString::from(vec![9, 9, 9, 9, 9, 9, 9, 9]), false, 10);
        assert_eq!(result.status_code, StatusCode::BadContinuationPointInvalid);
    }

    #[test]
    fn translate_browse_path_resolves_one_hop() {
        let mut space = AddressSpace::new();
        let root = insert_object(&mut space, 1, "Root", None);
        insert_object(&mut space, 2, "Child", Some(1));

        let path = BrowsePath { starting_node: root, relative_path: Some(vec![qn("Child")]) };
        let result = space.translate_browse_path(&path);
        assert_eq!(result.status_code, StatusCode::Good);
        assert_eq!(result.targets.unwrap()[0].target_id, NodeId::new(1, 2u32));
    }

    #[test]
    fn remove_node_drops_it_from_browse_results() {
        let mut space = AddressSpace::new();
        let root = insert_object(&mut space, 1, "Root", None);
        let child = insert_object(&mut space, 2, "Child", Some(1));

        space.remove(&child);

        let description = BrowseDescription { node_id: root, browse_direction: BrowseDirection::Forward, ..Default::default() };
        let result = space.browse(&description, 0);
        assert!(result.references.unwrap().is_empty());
    }
}
