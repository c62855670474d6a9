// OPCUA for Rust
// SPDX-License-Identifier: MPL-2.0

use hashbrown::{HashMap, HashSet};
use opcua_types::NodeId;

use crate::ReferenceDirection;

/// An owned reference: `reference_type` edge from some source node to `target_node`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Reference {
    /// Reference type id, e.g. `i=35` for `Organizes`.
    pub reference_type: NodeId,
    /// The node this edge points at.
    pub target_node: NodeId,
}

/// The reference graph: forward and inverse adjacency lists keyed by node id.
///
/// Kept as two independent indices (rather than one with a direction bit per
/// entry) so Browse's `BrowseDirection::Forward`/`Inverse`/`Both` can look
/// each side up directly instead of filtering every edge touching a node.
#[derive(Debug, Default)]
pub struct References {
    by_source: HashMap<NodeId, HashSet<Reference>>,
    by_target: HashMap<NodeId, HashSet<Reference>>,
}

impl References {
    /// An empty reference graph.
    pub fn new() -> Self {
        Self { by_source: HashMap::new(), by_target: HashMap::new() }
    }

    /// Add one edge. `direction` is relative to `node`: `Forward` means `node -> target`,
    /// `Inverse` means `target -> node`.
    pub fn insert(&mut self, node: &NodeId, target: &NodeId, reference_type: NodeId, direction: ReferenceDirection) {
        match direction {
            ReferenceDirection::Forward => self.insert_edge(node, target, reference_type),
            ReferenceDirection::Inverse => self.insert_edge(target, node, reference_type),
        }
    }

    fn insert_edge(&mut self, source: &NodeId, target: &NodeId, reference_type: NodeId) {
        self.by_source.entry(source.clone()).or_default().insert(Reference { reference_type: reference_type.clone(), target_node: target.clone() });
        self.by_target.entry(target.clone()).or_default().insert(Reference { reference_type, target_node: source.clone() });
    }

    /// Remove every edge touching `node`, in either direction. Called when a node is deleted.
    pub fn remove_node(&mut self, node: &NodeId) {
        if let Some(forward) = self.by_source.remove(node) {
            for r in forward {
                if let Some(set) = self.by_target.get_mut(&r.target_node) {
                    set.retain(|e| !(e.target_node == *node && e.reference_type == r.reference_type));
                }
            }
        }
        if let Some(inverse) = self.by_target.remove(node) {
            for r in inverse {
                if let Some(set) = self.by_source.get_mut(&r.target_node) {
                    set.retain(|e| !(e.target_node == *node && e.reference_type == r.reference_type));
                }
            }
        }
    }

    /// Every forward edge ( `node -> X` ) from `node`, optionally restricted to one reference
    /// type.
    pub fn forward<'a, 'b>(&'a self, node: &NodeId, reference_type: Option<&'b NodeId>) -> impl Iterator<Item = &'a Reference> + 'b
    where
        'a: 'b,
    {
        self.by_source.get(node).into_iter().flatten().filter(move |r| reference_type.map_or(true, |t| &r.reference_type == t))
    }

    /// Every inverse edge ( `X -> node` ) pointing at `node`, optionally restricted to one
    /// reference type. The returned `Reference::target_node` is the edge's source, `X`.
    pub fn inverse<'a, 'b>(&'a self, node: &NodeId, reference_type: Option<&'b NodeId>) -> impl Iterator<Item = &'a Reference> + 'b
    where
        'a: 'b,
    {
        self.by_target.get(node).into_iter().flatten().filter(move |r| reference_type.map_or(true, |t| &r.reference_type == t))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn n(i: u32) -> NodeId {
        NodeId::new(1, i)
    }

    #[test]
    fn forward_and_inverse_are_symmetric() {
        let mut refs = References::new();
        refs.insert(&n(1), &n(2), NodeId::new(0, 35u32), ReferenceDirection::Forward);

        assert_eq!(refs.forward(&n(1), None).count(), 1);
        assert_eq!(refs.inverse(&n(2), None).count(), 1);
        assert_eq!(refs.forward(&n(2), None).count(), 0);
    }

    #[test]
    fn inverse_direction_flips_the_edge() {
        let mut refs = References::new();
        refs.insert(&n(1), &n(2), NodeId::new(0, 35u32), ReferenceDirection::Inverse);

        // node=1, target=2, Inverse means the edge is 2 -> 1.
        assert_eq!(refs.forward(&n(2), None).count(), 1);
        assert_eq!(refs.inverse(&n(1), None).count(), 1);
    }

    #[test]
    fn remove_node_drops_both_sides() {
        let mut refs = References::new();
        let rt = NodeId::new(0, 35u32);
        refs.insert(&n(1), &n(2), rt.clone(), ReferenceDirection::Forward);
        refs.insert(&n(3), &n(1), rt, ReferenceDirection::Forward);

        refs.remove_node(&n(1));

        assert_eq!(refs.forward(&n(1), None).count(), 0);
        assert_eq!(refs.inverse(&n(1), None).count(), 0);
        assert_eq!(refs.forward(&n(3), None).count(), 0);
        assert_eq!(refs.inverse(&n(2), None).count(), 0);
    }
}
