// OPCUA for Rust
// SPDX-License-Identifier: MPL-2.0
// This file was generated by opcua-codegen from dictionary/types.yaml. DO NOT EDIT.

//! `Call` service bodies: invoking MethodNode handlers with typed arguments.

use crate::{
    binary_struct,
    generated::headers::{RequestHeader, ResponseHeader},
    node_id::NodeId,
    status_code::StatusCode,
    variant::Variant,
    UaNullable,
};

/// One method invocation: target object, method, and input arguments.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CallMethodRequest {
    /// Object (or object type instance) the method is called on.
    pub object_id: NodeId,
    /// MethodNode being invoked.
    pub method_id: NodeId,
    /// Positional input arguments.
    pub input_arguments: Option<Vec<Variant>>,
}

impl UaNullable for CallMethodRequest {
    fn is_ua_null(&self) -> bool {
        self.object_id.is_null()
    }
}

binary_struct!(CallMethodRequest {
    object_id: NodeId,
    method_id: NodeId,
    input_arguments: Option<Vec<Variant>>,
});

/// Result of one [`CallMethodRequest`].
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CallMethodResult {
    /// Overall status of the call.
    pub status_code: StatusCode,
    /// Per-argument validation status, same length and order as the request's
    /// `input_arguments`.
    pub input_argument_results: Option<Vec<StatusCode>>,
    /// Per-argument diagnostic info; empty unless requested.
    pub input_argument_diagnostic_infos: Option<Vec<StatusCode>>,
    /// Positional output arguments, present only on `Good`.
    pub output_arguments: Option<Vec<Variant>>,
}

impl UaNullable for CallMethodResult {
    fn is_ua_null(&self) -> bool {
        false
    }
}

binary_struct!(CallMethodResult {
    status_code: StatusCode,
    input_argument_results: Option<Vec<StatusCode>>,
    input_argument_diagnostic_infos: Option<Vec<StatusCode>>,
    output_arguments: Option<Vec<Variant>>,
});

/// Request body for the Call service.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CallRequest {
    /// Standard request envelope.
    pub request_header: RequestHeader,
    /// One entry per method invocation.
    pub methods_to_call: Option<Vec<CallMethodRequest>>,
}

impl UaNullable for CallRequest {
    fn is_ua_null(&self) -> bool {
        false
    }
}

binary_struct!(CallRequest {
    request_header: RequestHeader,
    methods_to_call: Option<Vec<CallMethodRequest>>,
});

/// Response body for the Call service.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CallResponse {
    /// Standard response envelope.
    pub response_header: ResponseHeader,
    /// One result per entry in `methods_to_call`.
    pub results: Option<Vec<CallMethodResult>>,
    /// Per-operation diagnostic info; empty unless requested.
    pub diagnostic_infos: Option<Vec<StatusCode>>,
}

impl UaNullable for CallResponse {
    fn is_ua_null(&self) -> bool {
        false
    }
}

binary_struct!(CallResponse {
    response_header: ResponseHeader,
    results: Option<Vec<CallMethodResult>>,
    diagnostic_infos: Option<Vec<StatusCode>>,
});
