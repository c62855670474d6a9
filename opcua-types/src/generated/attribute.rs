// OPCUA for Rust
// SPDX-License-Identifier: MPL-2.0
// This file was generated by opcua-codegen from dictionary/types.yaml. DO NOT EDIT.

//! `Read`/`Write` services: [`AttributeId`], [`ReadValueId`], [`WriteValue`]
//! and their request/response envelopes.

use crate::{
    binary_struct,
    data_value::DataValue,
    generated::headers::{RequestHeader, ResponseHeader},
    node_id::NodeId,
    status_code::StatusCode,
    string::UAString,
    wire_enum, UaNullable,
};

wire_enum!(TimestampsToReturn, default = Neither {
    Source = 0,
    Server = 1,
    Both = 2,
    Neither = 3,
});

/// Numeric attribute identifier, from OPC UA Part 4 Figure B.7.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum AttributeId {
    /// Node's own id.
    NodeId = 1,
    /// Node class.
    NodeClass = 2,
    /// Browse name.
    BrowseName = 3,
    /// Display name.
    DisplayName = 4,
    /// Description.
    Description = 5,
    /// Write mask.
    WriteMask = 6,
    /// User write mask.
    UserWriteMask = 7,
    /// Whether the node can produce events.
    EventNotifier = 12,
    /// Variable value.
    Value = 13,
    /// Variable data type.
    DataType = 14,
    /// Variable value rank.
    ValueRank = 15,
    /// Variable array dimensions.
    ArrayDimensions = 16,
    /// Variable access level.
    AccessLevel = 17,
    /// Variable user access level.
    UserAccessLevel = 18,
    /// Variable minimum sampling interval.
    MinimumSamplingInterval = 19,
    /// Whether the variable stores history.
    Historizing = 20,
    /// Whether the method is executable.
    Executable = 21,
    /// Whether the method is executable by the current user.
    UserExecutable = 22,
}

impl AttributeId {
    /// Parse a wire attribute id, rejecting unknown values.
    pub fn from_u32(v: u32) -> Option<Self> {
        use AttributeId::*;
        Some(match v {
            1 => NodeId,
            2 => NodeClass,
            3 => BrowseName,
            4 => DisplayName,
            5 => Description,
            6 => WriteMask,
            7 => UserWriteMask,
            12 => EventNotifier,
            13 => Value,
            14 => DataType,
            15 => ValueRank,
            16 => ArrayDimensions,
            17 => AccessLevel,
            18 => UserAccessLevel,
            19 => MinimumSamplingInterval,
            20 => Historizing,
            21 => Executable,
            22 => UserExecutable,
            _ => return None,
        })
    }
}

/// Identifies the attribute of a node to read or write, with an optional
/// index range for array/string slicing.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ReadValueId {
    /// Node being addressed.
    pub node_id: NodeId,
    /// Attribute id, per [`AttributeId`].
    pub attribute_id: u32,
    /// Index range, e.g. `"1:2"`; null means the whole value.
    pub index_range: UAString,
    /// Data encoding for structured values; null means the default encoding.
    pub data_encoding: crate::qualified_name::QualifiedName,
}

impl UaNullable for ReadValueId {
    fn is_ua_null(&self) -> bool {
        self.node_id.is_null()
    }
}

binary_struct!(ReadValueId {
    node_id: NodeId,
    attribute_id: u32,
    index_range: UAString,
    data_encoding: crate::qualified_name::QualifiedName,
});

/// Request body for the Read service.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ReadRequest {
    /// Standard request envelope.
    pub request_header: RequestHeader,
    /// Maximum age, in ms, of a cached value the server may return (0 = read fresh).
    pub max_age: f64,
    /// Which timestamps to include in each returned [`DataValue`].
    pub timestamps_to_return: TimestampsToReturn,
    /// One entry per value to read.
    pub nodes_to_read: Option<Vec<ReadValueId>>,
}

impl UaNullable for ReadRequest {
    fn is_ua_null(&self) -> bool {
        false
    }
}

binary_struct!(ReadRequest {
    request_header: RequestHeader,
    max_age: f64,
    timestamps_to_return: TimestampsToReturn,
    nodes_to_read: Option<Vec<ReadValueId>>,
});

/// Response body for the Read service.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ReadResponse {
    /// Standard response envelope.
    pub response_header: ResponseHeader,
    /// One result per entry in `nodes_to_read`, in the same order.
    pub results: Option<Vec<DataValue>>,
    /// Per-operation diagnostic info; empty unless requested.
    pub diagnostic_infos: Option<Vec<StatusCode>>,
}

impl UaNullable for ReadResponse {
    fn is_ua_null(&self) -> bool {
        false
    }
}

binary_struct!(ReadResponse {
    response_header: ResponseHeader,
    results: Option<Vec<DataValue>>,
    diagnostic_infos: Option<Vec<StatusCode>>,
});

/// One value to write, naming the target attribute and the new value.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct WriteValue {
    /// Node being addressed.
    pub node_id: NodeId,
    /// Attribute id, per [`AttributeId`].
    pub attribute_id: u32,
    /// Index range for array/string slicing; null means the whole value.
    pub index_range: UAString,
    /// The new value, with status/timestamps as applicable to the attribute.
    pub value: DataValue,
}

impl UaNullable for WriteValue {
    fn is_ua_null(&self) -> bool {
        self.node_id.is_null()
    }
}

binary_struct!(WriteValue {
    node_id: NodeId,
    attribute_id: u32,
    index_range: UAString,
    value: DataValue,
});

/// Request body for the Write service.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct WriteRequest {
    /// Standard request envelope.
    pub request_header: RequestHeader,
    /// One entry per value to write.
    pub nodes_to_write: Option<Vec<WriteValue>>,
}

impl UaNullable for WriteRequest {
    fn is_ua_null(&self) -> bool {
        false
    }
}

binary_struct!(WriteRequest {
    request_header: RequestHeader,
    nodes_to_write: Option<Vec<WriteValue>>,
});

/// Response body for the Write service.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct WriteResponse {
    /// Standard response envelope.
    pub response_header: ResponseHeader,
    /// One status per entry in `nodes_to_write`, in the same order.
    pub results: Option<Vec<StatusCode>>,
    /// Per-operation diagnostic info; empty unless requested.
    pub diagnostic_infos: Option<Vec<StatusCode>>,
}

impl UaNullable for WriteResponse {
    fn is_ua_null(&self) -> bool {
        false
    }
}

binary_struct!(WriteResponse {
    response_header: ResponseHeader,
    results: Option<Vec<StatusCode>>,
    diagnostic_infos: Option<Vec<StatusCode>>,
});

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        encoding::{BinaryDecodable, BinaryEncodable, Context},
        namespaces::NamespaceMap,
        Variant,
    };

    fn ctx() -> Context<'static> {
        static NS: std::sync::OnceLock<NamespaceMap> = std::sync::OnceLock::new();
        Context::new(NS.get_or_init(NamespaceMap::new))
    }

    #[test]
    fn read_value_id_roundtrip() {
        let ctx = ctx();
        let rv = ReadValueId {
            node_id: NodeId::new(1, 10u32),
            attribute_id: AttributeId::Value as u32,
            index_range: UAString::null(),
            data_encoding: crate::qualified_name::QualifiedName::default(),
        };
        let bytes = rv.to_bytes(&ctx).unwrap();
        let mut cur = std::io::Cursor::new(bytes);
        assert_eq!(ReadValueId::decode(&mut cur, &ctx).unwrap(), rv);
    }

    #[test]
    fn write_request_roundtrip() {
        use crate::encoding::{BinaryDecodable, BinaryEncodable};
        let ctx = ctx();
        let req = WriteRequest {
            request_header: RequestHeader::new(NodeId::null(), 1),
            nodes_to_write: Some(vec![WriteValue {
                node_id: NodeId::new(1, 10u32),
                attribute_id: AttributeId::Value as u32,
                index_range: UAString::null(),
                value: DataValue::new_now(Variant::Int32(5)),
            }]),
        };
        let bytes = req.to_bytes(&ctx).unwrap();
        let mut cur = std::io::Cursor::new(bytes);
        let back = WriteRequest::decode(&mut cur, &ctx).unwrap();
        assert_eq!(back.nodes_to_write.unwrap().len(), 1);
    }
}
