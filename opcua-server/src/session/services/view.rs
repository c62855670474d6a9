// OPCUA for Rust
// SPDX-License-Identifier: MPL-2.0

//! `Browse`, `BrowseNext` and `TranslateBrowsePathsToNodeIds`.

use opcua_types::generated::{BrowseNextRequest, BrowsePathResult, BrowseRequest, BrowseResult, TranslateBrowsePathsToNodeIdsRequest};
use opcua_types::StatusCode;

use super::{check_operation_count, ServiceContext};

/// `Browse`: one [`BrowseResult`] per entry in `nodes_to_browse`. A starting node the caller
/// isn't allowed to see reports `BadNodeIdUnknown`; references to nodes it isn't allowed to see
/// are filtered from the result rather than causing the whole operation to fail.
pub fn browse(request: &BrowseRequest, ctx: &ServiceContext<'_>) -> Result<Vec<BrowseResult>, StatusCode> {
    let items = request.nodes_to_browse.as_deref().unwrap_or_default();
    check_operation_count(items, ctx.config.limits.operational.max_nodes_per_browse)?;

    let mut space = ctx.address_space.write();
    Ok(items
        .iter()
        .map(|description| {
            if !ctx.access_control.allow_browse_node(ctx.user, &description.node_id) {
                return BrowseResult { status_code: StatusCode::BadNodeIdUnknown, ..Default::default() };
            }
            let mut result = space.browse(description, request.requested_max_references_per_node);
            if let Some(refs) = result.references.as_mut() {
                refs.retain(|r| ctx.access_control.allow_browse_node(ctx.user, &r.node_id));
            }
            result
        })
        .collect())
}

/// `BrowseNext`: resume or release continuation points from a prior `Browse`/`BrowseNext`.
pub fn browse_next(request: &BrowseNextRequest, ctx: &ServiceContext<'_>) -> Result<Vec<BrowseResult>, StatusCode> {
    let points = request.continuation_points.as_deref().unwrap_or_default();
    check_operation_count(points, 0)?;

    let mut space = ctx.address_space.write();
    Ok(points
        .iter()
        .map(|cp| {
            let mut result = space.browse_next(cp, request.release_continuation_points, 0);
            if let Some(refs) = result.references.as_mut() {
                refs.retain(|r| ctx.access_control.allow_browse_node(ctx.user, &r.node_id));
            }
            result
        })
        .collect())
}

/// `TranslateBrowsePathsToNodeIds`: resolve relative browse paths to concrete node ids.
pub fn translate_browse_paths(request: &TranslateBrowsePathsToNodeIdsRequest, ctx: &ServiceContext<'_>) -> Result<Vec<BrowsePathResult>, StatusCode> {
    let paths = request.browse_paths.as_deref().unwrap_or_default();
    check_operation_count(paths, ctx.config.limits.operational.max_nodes_per_translate_browse_paths)?;

    let space = ctx.address_space.read();
    Ok(paths
        .iter()
        .map(|path| {
            if !ctx.access_control.allow_browse_node(ctx.user, &path.starting_node) {
                return BrowsePathResult { status_code: StatusCode::BadNodeIdUnknown, targets: None };
            }
            space.translate_browse_path(path)
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access_control::{DefaultAccessControl, UserToken};
    use crate::config::ServerConfig;
    use crate::session::services::method::MethodRegistry;
    use opcua_core::sync::RwLock;
    use opcua_nodes::{AddressSpace, ObjectNode, ReferenceDirection};
    use opcua_types::generated::{BrowseDescription, BrowseDirection, RequestHeader};
    use opcua_types::{LocalizedText, NodeId, QualifiedName};

    fn ctx<'a>(space: &'a RwLock<AddressSpace>, ac: &'a DefaultAccessControl, config: &'a ServerConfig, methods: &'a MethodRegistry, user: &'a UserToken) -> ServiceContext<'a> {
        ServiceContext { address_space: space, user, access_control: ac, config, methods }
    }

    #[test]
    fn browse_rejects_unknown_starting_node() {
        let space = RwLock::new(AddressSpace::new());
        let ac = DefaultAccessControl;
        let config = ServerConfig::default();
        let methods = MethodRegistry::new();
        let user = UserToken::default();
        let c = ctx(&space, &ac, &config, &methods, &user);

        let req = BrowseRequest {
            request_header: RequestHeader::new(NodeId::null(), 1),
            view_id: NodeId::null(),
            requested_max_references_per_node: 0,
            nodes_to_browse: Some(vec![BrowseDescription { node_id: NodeId::new(1, 99u32), browse_direction: BrowseDirection::Forward, ..Default::default() }]),
        };
        let results = browse(&req, &c).unwrap();
        assert_eq!(results[0].status_code, StatusCode::BadNodeIdUnknown);
    }

    #[test]
    fn browse_finds_child_object() {
        let mut space_inner = AddressSpace::new();
        let root = NodeId::new(1, 1u32);
        let child = NodeId::new(1, 2u32);
        space_inner.insert(ObjectNode::new(root.clone(), QualifiedName::new(1, "Root"), LocalizedText::from("Root")), &[]);
        space_inner.insert(
            ObjectNode::new(child.clone(), QualifiedName::new(1, "Child"), LocalizedText::from("Child")),
            &[(&root, opcua_nodes::reference_type::organizes(), ReferenceDirection::Inverse)],
        );
        let space = RwLock::new(space_inner);
        let ac = DefaultAccessControl;
        let config = ServerConfig::default();
        let methods = MethodRegistry::new();
        let user = UserToken::default();
        let c = ctx(&space, &ac, &config, &methods, &user);

        let req = BrowseRequest {
            request_header: RequestHeader::new(NodeId::null(), 1),
            view_id: NodeId::null(),
            requested_max_references_per_node: 0,
            nodes_to_browse: Some(vec![BrowseDescription { node_id: root, browse_direction: BrowseDirection::Forward, ..Default::default() }]),
        };
        let results = browse(&req, &c).unwrap();
        assert_eq!(results[0].status_code, StatusCode::Good);
        assert_eq!(results[0].references.as_ref().unwrap().len(), 1);
    }
}
