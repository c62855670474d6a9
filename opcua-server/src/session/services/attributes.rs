// OPCUA for Rust
// SPDX-License-Identifier: MPL-2.0

//! `Read` and `Write`: per-node attribute access through the
//! [`AccessControl`](crate::access_control::AccessControl) plugin.

use opcua_nodes::Node;
use opcua_types::generated::{AttributeId, ReadRequest, WriteRequest};
use opcua_types::{DataValue, StatusCode};

use super::{check_operation_count, ServiceContext};

/// `Read`: one [`DataValue`] per entry in `nodes_to_read`, in order. A node the caller isn't
/// allowed to see reports `BadNodeIdUnknown` rather than `BadUserAccessDenied`, so its existence
/// isn't leaked; a node it may see but not read this attribute of reports `BadUserAccessDenied`.
pub fn read(request: &ReadRequest, ctx: &ServiceContext<'_>) -> Result<Vec<DataValue>, StatusCode> {
    let nodes = request.nodes_to_read.as_deref().unwrap_or_default();
    check_operation_count(nodes, ctx.config.limits.operational.max_nodes_per_read)?;

    let space = ctx.address_space.read();
    Ok(nodes
        .iter()
        .map(|item| {
            if !ctx.access_control.allow_browse_node(ctx.user, &item.node_id) {
                return DataValue::new_error(StatusCode::BadNodeIdUnknown);
            }
            if item.attribute_id == AttributeId::Value as u32 {
                if let Some(node) = space.find(&item.node_id) {
                    let level = node_access_level(node);
                    let allowed = ctx.access_control.user_access_level(ctx.user, level, &item.node_id);
                    if !allowed.contains(opcua_nodes::AccessLevel::CURRENT_READ) {
                        return DataValue::new_error(StatusCode::BadUserAccessDenied);
                    }
                }
            }
            space.read_attribute(&item.node_id, item.attribute_id, item.index_range.is_null())
        })
        .collect())
}

/// `Write`: one [`StatusCode`] per entry in `nodes_to_write`, in order.
pub fn write(request: &WriteRequest, ctx: &ServiceContext<'_>) -> Result<Vec<StatusCode>, StatusCode> {
    let items = request.nodes_to_write.as_deref().unwrap_or_default();
    check_operation_count(items, ctx.config.limits.operational.max_nodes_per_write)?;

    let mut space = ctx.address_space.write();
    Ok(items
        .iter()
        .map(|item| {
            if !ctx.access_control.allow_browse_node(ctx.user, &item.node_id) {
                return StatusCode::BadNodeIdUnknown;
            }
            if item.attribute_id == AttributeId::Value as u32 {
                if let Some(node) = space.find(&item.node_id) {
                    let level = node_access_level(node);
                    let allowed = ctx.access_control.user_access_level(ctx.user, level, &item.node_id);
                    if !allowed.contains(opcua_nodes::AccessLevel::CURRENT_WRITE) {
                        return StatusCode::BadUserAccessDenied;
                    }
                }
            }
            let Some(value) = item.value.value.clone() else {
                return StatusCode::BadTypeMismatch;
            };
            space.write_attribute(&item.node_id, item.attribute_id, value, item.index_range.is_null())
        })
        .collect())
}

fn node_access_level(node: &opcua_nodes::NodeType) -> opcua_nodes::AccessLevel {
    match node.get_attribute(AttributeId::AccessLevel as u32).and_then(|dv| dv.value) {
        Some(opcua_types::Variant::Byte(bits)) => opcua_nodes::AccessLevel::from_bits_truncate(bits),
        _ => opcua_nodes::AccessLevel::all(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access_control::DefaultAccessControl;
    use crate::config::ServerConfig;
    use crate::session::services::method::MethodRegistry;
    use opcua_core::sync::RwLock;
    use opcua_nodes::{AddressSpace, VariableNode};
    use opcua_types::generated::{RequestHeader, ReadValueId};
    use opcua_types::{LocalizedText, NodeId, QualifiedName, UAString, Variant};

    fn ctx<'a>(space: &'a RwLock<AddressSpace>, ac: &'a DefaultAccessControl, config: &'a ServerConfig, methods: &'a MethodRegistry) -> ServiceContext<'a> {
        static USER: std::sync::OnceLock<crate::access_control::UserToken> = std::sync::OnceLock::new();
        ServiceContext { address_space: space, user: USER.get_or_init(crate::access_control::UserToken::default), access_control: ac, config, methods }
    }

    #[test]
    fn read_value_round_trips_through_write() {
        let node_id = NodeId::new(1, 1u32);
        let mut space = AddressSpace::new();
        space.insert(
            VariableNode::new(node_id.clone(), QualifiedName::new(1, "Temp"), LocalizedText::from("Temp"), NodeId::new(0, 11u32), Variant::Double(1.0)),
            &[],
        );
        let space = RwLock::new(space);
        let ac = DefaultAccessControl;
        let config = ServerConfig::default();
        let methods = MethodRegistry::new();
        let c = ctx(&space, &ac, &config, &methods);

        let write_req = WriteRequest {
            request_header: RequestHeader::new(NodeId::null(), 1),
            nodes_to_write: Some(vec![opcua_types::generated::WriteValue {
                node_id: node_id.clone(),
                attribute_id: AttributeId::Value as u32,
                index_range: UAString::null(),
                value: opcua_types::DataValue::new_now(Variant::Double(2.5)),
            }]),
        };
        let write_results = write(&write_req, &c).unwrap();
        assert_eq!(write_results, vec![StatusCode::Good]);

        let read_req = ReadRequest {
            request_header: RequestHeader::new(NodeId::null(), 2),
            max_age: 0.0,
            timestamps_to_return: opcua_types::generated::TimestampsToReturn::Both,
            nodes_to_read: Some(vec![ReadValueId { node_id, attribute_id: AttributeId::Value as u32, index_range: UAString::null(), data_encoding: QualifiedName::default() }]),
        };
        let read_results = read(&read_req, &c).unwrap();
        assert_eq!(read_results[0].value, Some(Variant::Double(2.5)));
    }

    #[test]
    fn empty_request_is_bad_nothing_to_do() {
        let space = RwLock::new(AddressSpace::new());
        let ac = DefaultAccessControl;
        let config = ServerConfig::default();
        let methods = MethodRegistry::new();
        let c = ctx(&space, &ac, &config, &methods);
        let req = ReadRequest { request_header: RequestHeader::new(NodeId::null(), 1), max_age: 0.0, timestamps_to_return: opcua_types::generated::TimestampsToReturn::Both, nodes_to_read: None };
        assert_eq!(read(&req, &c), Err(StatusCode::BadNothingToDo));
    }
}
