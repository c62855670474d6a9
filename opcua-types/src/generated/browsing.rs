// OPCUA for Rust
// SPDX-License-Identifier: MPL-2.0
// This file was generated by opcua-codegen from dictionary/types.yaml. DO NOT EDIT.

//! Browse/BrowseNext/TranslateBrowsePathsToNodeIds service bodies.

use crate::{
    binary_struct,
    generated::headers::{RequestHeader, ResponseHeader},
    localized_text::LocalizedText,
    node_id::NodeId,
    qualified_name::QualifiedName,
    status_code::StatusCode,
    string::UAString,
    wire_enum, ByteString, UaNullable,
};

wire_enum!(BrowseDirection, default = Forward {
    Forward = 0,
    Inverse = 1,
    Both = 2,
});

/// Specifies how to walk the reference graph from a starting node.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BrowseDescription {
    /// Node to browse from.
    pub node_id: NodeId,
    /// Which direction of references to follow.
    pub browse_direction: BrowseDirection,
    /// Restrict to this reference type (and its subtypes if `include_subtypes`); null = all types.
    pub reference_type_id: NodeId,
    /// Whether subtypes of `reference_type_id` are also matched.
    pub include_subtypes: bool,
    /// Bitmask of `NodeClass` values to include; 0 means all classes.
    pub node_class_mask: u32,
    /// Bitmask of `BrowseResultMask` fields to populate in each [`ReferenceDescription`].
    pub result_mask: u32,
}

impl UaNullable for BrowseDescription {
    fn is_ua_null(&self) -> bool {
        self.node_id.is_null()
    }
}

binary_struct!(BrowseDescription {
    node_id: NodeId,
    browse_direction: BrowseDirection,
    reference_type_id: NodeId,
    include_subtypes: bool,
    node_class_mask: u32,
    result_mask: u32,
});

/// One edge found while browsing.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ReferenceDescription {
    /// Reference type traversed.
    pub reference_type_id: NodeId,
    /// True if traversed in the forward direction.
    pub is_forward: bool,
    /// Target node id.
    pub node_id: NodeId,
    /// Target's browse name.
    pub browse_name: QualifiedName,
    /// Target's display name.
    pub display_name: LocalizedText,
    /// Target's node class bit (single value, not a mask).
    pub node_class: u32,
    /// Target's DataType, TypeDefinition, etc, if requested by `result_mask`.
    pub type_definition: NodeId,
}

impl UaNullable for ReferenceDescription {
    fn is_ua_null(&self) -> bool {
        self.node_id.is_null()
    }
}

binary_struct!(ReferenceDescription {
    reference_type_id: NodeId,
    is_forward: bool,
    node_id: NodeId,
    browse_name: QualifiedName,
    display_name: LocalizedText,
    node_class: u32,
    type_definition: NodeId,
});

/// Result of browsing one [`BrowseDescription`].
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BrowseResult {
    /// `Good`, or an error such as `BadNodeIdUnknown`.
    pub status_code: StatusCode,
    /// Opaque token to resume truncated results via BrowseNext; null if complete.
    pub continuation_point: ByteString,
    /// Matched references, up to the caller's `maxReferences` limit.
    pub references: Option<Vec<ReferenceDescription>>,
}

impl UaNullable for BrowseResult {
    fn is_ua_null(&self) -> bool {
        false
    }
}

binary_struct!(BrowseResult {
    status_code: StatusCode,
    continuation_point: ByteString,
    references: Option<Vec<ReferenceDescription>>,
});

/// Request body for the Browse service.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BrowseRequest {
    /// Standard request envelope.
    pub request_header: RequestHeader,
    /// Node the browse is relative to, for relative-path views; usually null.
    pub view_id: NodeId,
    /// Maximum number of references returned per node before truncation.
    pub requested_max_references_per_node: u32,
    /// One entry per starting node.
    pub nodes_to_browse: Option<Vec<BrowseDescription>>,
}

impl UaNullable for BrowseRequest {
    fn is_ua_null(&self) -> bool {
        false
    }
}

binary_struct!(BrowseRequest {
    request_header: RequestHeader,
    view_id: NodeId,
    requested_max_references_per_node: u32,
    nodes_to_browse: Option<Vec<BrowseDescription>>,
});

/// Response body for the Browse service.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BrowseResponse {
    /// Standard response envelope.
    pub response_header: ResponseHeader,
    /// One result per entry in `nodes_to_browse`.
    pub results: Option<Vec<BrowseResult>>,
    /// Per-operation diagnostic info; empty unless requested.
    pub diagnostic_infos: Option<Vec<StatusCode>>,
}

impl UaNullable for BrowseResponse {
    fn is_ua_null(&self) -> bool {
        false
    }
}

binary_struct!(BrowseResponse {
    response_header: ResponseHeader,
    results: Option<Vec<BrowseResult>>,
    diagnostic_infos: Option<Vec<StatusCode>>,
});

/// Request body for the BrowseNext service, resuming truncated Browse results.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BrowseNextRequest {
    /// Standard request envelope.
    pub request_header: RequestHeader,
    /// If true, the listed continuation points are released without browsing further.
    pub release_continuation_points: bool,
    /// Continuation points previously returned by Browse/BrowseNext.
    pub continuation_points: Option<Vec<ByteString>>,
}

impl UaNullable for BrowseNextRequest {
    fn is_ua_null(&self) -> bool {
        false
    }
}

binary_struct!(BrowseNextRequest {
    request_header: RequestHeader,
    release_continuation_points: bool,
    continuation_points: Option<Vec<ByteString>>,
});

/// Response body for the BrowseNext service.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BrowseNextResponse {
    /// Standard response envelope.
    pub response_header: ResponseHeader,
    /// One result per requested continuation point.
    pub results: Option<Vec<BrowseResult>>,
    /// Per-operation diagnostic info; empty unless requested.
    pub diagnostic_infos: Option<Vec<StatusCode>>,
}

impl UaNullable for BrowseNextResponse {
    fn is_ua_null(&self) -> bool {
        false
    }
}

binary_struct!(BrowseNextResponse {
    response_header: ResponseHeader,
    results: Option<Vec<BrowseResult>>,
    diagnostic_infos: Option<Vec<StatusCode>>,
});

/// One relative path, described as a sequence of browse-name hops from `starting_node`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BrowsePath {
    /// Node the relative path starts from.
    pub starting_node: NodeId,
    /// Ordered browse names to follow.
    pub relative_path: Option<Vec<QualifiedName>>,
}

impl UaNullable for BrowsePath {
    fn is_ua_null(&self) -> bool {
        self.starting_node.is_null()
    }
}

binary_struct!(BrowsePath {
    starting_node: NodeId,
    relative_path: Option<Vec<QualifiedName>>,
});

/// One resolved target of a [`BrowsePath`].
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BrowsePathTarget {
    /// Resolved node.
    pub target_id: NodeId,
    /// Remaining unresolved path segments; 0 if fully resolved.
    pub remaining_path_index: u32,
}

impl UaNullable for BrowsePathTarget {
    fn is_ua_null(&self) -> bool {
        self.target_id.is_null()
    }
}

binary_struct!(BrowsePathTarget {
    target_id: NodeId,
    remaining_path_index: u32,
});

/// Result of resolving one [`BrowsePath`].
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BrowsePathResult {
    /// `Good`, or an error such as `BadNoMatch`.
    pub status_code: StatusCode,
    /// Nodes matching the path; more than one if the path was ambiguous.
    pub targets: Option<Vec<BrowsePathTarget>>,
}

impl UaNullable for BrowsePathResult {
    fn is_ua_null(&self) -> bool {
        false
    }
}

binary_struct!(BrowsePathResult {
    status_code: StatusCode,
    targets: Option<Vec<BrowsePathTarget>>,
});

/// Request body for the TranslateBrowsePathsToNodeIds service.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TranslateBrowsePathsToNodeIdsRequest {
    /// Standard request envelope.
    pub request_header: RequestHeader,
    /// Paths to resolve.
    pub browse_paths: Option<Vec<BrowsePath>>,
}

impl UaNullable for TranslateBrowsePathsToNodeIdsRequest {
    fn is_ua_null(&self) -> bool {
        false
    }
}

binary_struct!(TranslateBrowsePathsToNodeIdsRequest {
    request_header: RequestHeader,
    browse_paths: Option<Vec<BrowsePath>>,
});

/// Response body for the TranslateBrowsePathsToNodeIds service.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TranslateBrowsePathsToNodeIdsResponse {
    /// Standard response envelope.
    pub response_header: ResponseHeader,
    /// One result per entry in `browse_paths`.
    pub results: Option<Vec<BrowsePathResult>>,
    /// Per-operation diagnostic info; empty unless requested.
    pub diagnostic_infos: Option<Vec<StatusCode>>,
}

impl UaNullable for TranslateBrowsePathsToNodeIdsResponse {
    fn is_ua_null(&self) -> bool {
        false
    }
}

binary_struct!(TranslateBrowsePathsToNodeIdsResponse {
    response_header: ResponseHeader,
    results: Option<Vec<BrowsePathResult>>,
    diagnostic_infos: Option<Vec<StatusCode>>,
});

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        encoding::{BinaryDecodable, BinaryEncodable, Context},
        namespaces::NamespaceMap,
    };

    fn ctx() -> Context<'static> {
        static NS: std::sync::OnceLock<NamespaceMap> = std::sync::OnceLock::new();
        Context::new(NS.get_or_init(NamespaceMap::new))
    }

    #[test]
    fn browse_result_with_continuation_point_roundtrips() {
        let ctx = ctx();
        let result = BrowseResult {
            status_code: StatusCode::Good,
            continuation_point: ByteString::from(vec![1, 2, 3]),
            references: Some(vec![ReferenceDescription {
                reference_type_id: NodeId::new(0, 35u32),
                is_forward: true,
                node_id: NodeId::new(1, 99u32),
                browse_name: QualifiedName::new(1, "Child"),
                display_name: LocalizedText::from("Child"),
                node_class: 2,
                type_definition: NodeId::null(),
            }]),
        };
        let bytes = result.to_bytes(&ctx).unwrap();
        let mut cur = std::io::Cursor::new(bytes);
        let back = BrowseResult::decode(&mut cur, &ctx).unwrap();
        assert_eq!(back, result);
    }
}
