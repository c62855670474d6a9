// OPCUA for Rust
// SPDX-License-Identifier: MPL-2.0

//! Cross-module round trips that don't belong to any single file: a request
//! wrapped in its header, a notification boxed in an `ExtensionObject`, an
//! `EventFilter` evaluated end to end. Per-type edge cases live next to the
//! type; this module is for wiring between them.

use crate::{
    data_value::DataValue,
    encoding::{BinaryDecodable, BinaryEncodable, Context},
    generated::{
        attribute::{AttributeId, ReadRequest, ReadResponse, ReadValueId, TimestampsToReturn},
        event_filter::{EventFieldSource, EventFilter, FilterEvaluator, FilterOperator, SimpleAttributeOperand},
        headers::RequestHeader,
        notification::{DataChangeNotification, MonitoredItemNotification, NotificationMessage},
    },
    namespaces::NamespaceMap,
    node_id::NodeId,
    qualified_name::QualifiedName,
    status_code::StatusCode,
    variant::{ExtensionObject, Variant},
    ServiceFault,
};

fn ctx() -> Context<'static> {
    static NS: std::sync::OnceLock<NamespaceMap> = std::sync::OnceLock::new();
    Context::new(NS.get_or_init(NamespaceMap::new))
}

fn roundtrip<T: BinaryEncodable + BinaryDecodable>(value: &T, ctx: &Context<'_>) -> T {
    let bytes = value.to_bytes(ctx).unwrap();
    let mut cur = std::io::Cursor::new(bytes.as_slice());
    T::decode(&mut cur, ctx).unwrap()
}

#[test]
fn read_request_roundtrips_with_header_and_values_to_read() {
    let ctx = ctx();
    let req = ReadRequest {
        request_header: RequestHeader::new(NodeId::new(0, 7u32), 99),
        max_age: 0.0,
        timestamps_to_return: TimestampsToReturn::Both,
        nodes_to_read: Some(vec![ReadValueId {
            node_id: NodeId::new(2, 1001u32),
            attribute_id: AttributeId::Value as u32,
            index_range: Default::default(),
            data_encoding: QualifiedName::default(),
        }]),
    };
    let back = roundtrip(&req, &ctx);
    assert_eq!(back.request_header.request_handle, 99);
    assert_eq!(
        back.nodes_to_read.unwrap()[0].node_id,
        NodeId::new(2, 1001u32)
    );
}

#[test]
fn read_response_carries_one_result_per_node_in_order() {
    let ctx = ctx();
    let resp = ReadResponse {
        response_header: Default::default(),
        results: Some(vec![
            DataValue::new_now(Variant::Int32(1)),
            DataValue::new_now(Variant::Int32(2)),
        ]),
        diagnostic_infos: None,
    };
    let back = roundtrip(&resp, &ctx);
    let results = back.results.unwrap();
    assert_eq!(results[0].value, Some(Variant::Int32(1)));
    assert_eq!(results[1].value, Some(Variant::Int32(2)));
}

#[test]
fn service_fault_roundtrips_status_and_handle() {
    let ctx = ctx();
    let fault = ServiceFault::new(42u32, StatusCode::BadNodeIdUnknown);
    let back = roundtrip(&fault, &ctx);
    assert_eq!(back.response_header.request_handle, 42);
    assert_eq!(back.response_header.service_result, StatusCode::BadNodeIdUnknown);
}

#[test]
fn notification_message_survives_extension_object_wrapping() {
    let ctx = ctx();
    let notification = DataChangeNotification {
        monitored_items: Some(vec![MonitoredItemNotification {
            client_handle: 5,
            value: DataValue::new_now(Variant::Double(1.5)),
        }]),
        diagnostic_infos: None,
    };
    let type_id = NodeId::new(0, 811u32);
    let wrapped = ExtensionObject::from_encodable(type_id.clone(), &notification, &ctx).unwrap();

    let message = NotificationMessage {
        sequence_number: 1,
        publish_time: crate::UtcTime::now(),
        notification_data: Some(vec![wrapped]),
    };
    assert!(!message.is_keep_alive());

    let back = roundtrip(&message, &ctx);
    let body: DataChangeNotification = back.notification_data.unwrap()[0].decode_inner(&ctx).unwrap();
    assert_eq!(body.monitored_items.unwrap()[0].client_handle, 5);
}

struct FixedSeverity(u16);

impl EventFieldSource for FixedSeverity {
    fn resolve(&self, field: &SimpleAttributeOperand) -> Option<Variant> {
        let name = field.browse_path.as_ref()?.last()?.name.as_ref();
        (name == "Severity").then(|| Variant::UInt16(self.0))
    }
}

#[test]
fn event_filter_select_clause_projects_resolved_field_through_evaluator() {
    let filter = EventFilter {
        select_clauses: Some(vec![SimpleAttributeOperand::value_of(&["Severity"])]),
        where_clause: crate::generated::event_filter::ContentFilter {
            elements: Some(vec![crate::generated::event_filter::ContentFilterElement {
                filter_operator: FilterOperator::GreaterThan,
                filter_operands: Some(vec![
                    crate::generated::event_filter::FilterOperand::SimpleAttribute(
                        SimpleAttributeOperand::value_of(&["Severity"]),
                    ),
                    crate::generated::event_filter::FilterOperand::Literal(
                        crate::generated::event_filter::LiteralOperand { value: Variant::UInt16(400) },
                    ),
                ]),
            }]),
        },
    };
    let source = FixedSeverity(900);
    let evaluator = FilterEvaluator::new(&filter.where_clause, &source);
    assert!(evaluator.matches());

    let projected = evaluator.project(filter.select_clauses.as_ref().unwrap());
    assert_eq!(projected, vec![Variant::UInt16(900)]);
}
