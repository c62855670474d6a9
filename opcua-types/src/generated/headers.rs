// OPCUA for Rust
// SPDX-License-Identifier: MPL-2.0
// This file was generated by opcua-codegen from dictionary/types.yaml. DO NOT EDIT.

//! `RequestHeader`/`ResponseHeader`: the envelope carried by every service
//! call. Hand-authored here in the shape `opcua-codegen` would emit them in
//! (see `opcua-codegen/src/dictionary/types.yaml`).

use std::io::{Read, Write};

use crate::{
    binary_struct,
    date_time::UtcTime,
    encoding::{BinaryDecodable, BinaryEncodable, Context, EncodingResult},
    status_code::StatusCode,
    string::UAString,
    variant::ExtensionObject,
    NodeId, UaNullable,
};

/// Information common to every request sent from a client to the server.
///
/// The full standard header also carries a vendor-diagnostics bitmask; this
/// crate's AccessControl/diagnostics surface (see `SPEC_FULL.md` §6) does not
/// consume it, so it is dropped rather than carried as dead weight.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestHeader {
    /// Session authentication token, echoing the value handed out by
    /// `CreateSession`/`ActivateSession`.
    pub authentication_token: NodeId,
    /// Time the client sent the request, for logging only.
    pub timestamp: UtcTime,
    /// Client-assigned handle, echoed back in the response and usable to
    /// cancel the request.
    pub request_handle: u32,
    /// Per-call timeout hint in milliseconds; `0` means no timeout.
    pub timeout_hint: u32,
    /// Reserved extension slot. Always null in this implementation.
    pub additional_header: ExtensionObject,
}

impl Default for RequestHeader {
    fn default() -> Self {
        Self {
            authentication_token: NodeId::null(),
            timestamp: UtcTime::default(),
            request_handle: 0,
            timeout_hint: 0,
            additional_header: ExtensionObject::null(),
        }
    }
}

impl UaNullable for RequestHeader {
    fn is_ua_null(&self) -> bool {
        false
    }
}

impl RequestHeader {
    /// Build a request header for a given session token and client handle.
    pub fn new(authentication_token: NodeId, request_handle: u32) -> Self {
        Self {
            authentication_token,
            timestamp: UtcTime::now(),
            request_handle,
            timeout_hint: 0,
            additional_header: ExtensionObject::null(),
        }
    }
}

binary_struct!(RequestHeader {
    authentication_token: NodeId,
    timestamp: UtcTime,
    request_handle: u32,
    timeout_hint: u32,
    additional_header: ExtensionObject,
});

/// Anything that can report the client-assigned request handle it answers,
/// so `ResponseHeader::new_service_result` can be built from either a
/// `&RequestHeader` or a bare handle.
pub trait AsRequestHandle {
    /// The handle to echo back.
    fn as_request_handle(&self) -> u32;
}

impl AsRequestHandle for &RequestHeader {
    fn as_request_handle(&self) -> u32 {
        self.request_handle
    }
}

impl AsRequestHandle for u32 {
    fn as_request_handle(&self) -> u32 {
        *self
    }
}

/// Information common to every response sent from the server back to a client.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ResponseHeader {
    /// Time the server produced the response.
    pub timestamp: UtcTime,
    /// Echoes the request's `request_handle`.
    pub request_handle: u32,
    /// Overall status of the service call.
    pub service_result: StatusCode,
    /// String table referenced by diagnostic info in the body, if any.
    pub string_table: Option<Vec<UAString>>,
    /// Reserved extension slot. Always null in this implementation.
    pub additional_header: ExtensionObject,
}

impl UaNullable for ResponseHeader {
    fn is_ua_null(&self) -> bool {
        false
    }
}

impl ResponseHeader {
    /// Build a `Good`-result response header answering `request_header`.
    pub fn new_good(request_header: impl AsRequestHandle) -> Self {
        Self::new_service_result(request_header, StatusCode::Good)
    }

    /// Build a response header carrying the given overall result.
    pub fn new_service_result(
        request_header: impl AsRequestHandle,
        service_result: StatusCode,
    ) -> Self {
        Self {
            timestamp: UtcTime::now(),
            request_handle: request_header.as_request_handle(),
            service_result,
            string_table: None,
            additional_header: ExtensionObject::null(),
        }
    }
}

binary_struct!(ResponseHeader {
    timestamp: UtcTime,
    request_handle: u32,
    service_result: StatusCode,
    string_table: Option<Vec<UAString>>,
    additional_header: ExtensionObject,
});

#[cfg(test)]
mod tests {
    use super::*;
    use crate::namespaces::NamespaceMap;

    fn ctx() -> Context<'static> {
        static NS: std::sync::OnceLock<NamespaceMap> = std::sync::OnceLock::new();
        Context::new(NS.get_or_init(NamespaceMap::new))
    }

    #[test]
    fn request_header_roundtrip() {
        let ctx = ctx();
        let hdr = RequestHeader::new(NodeId::new(0, 7u32), 42);
        let bytes = hdr.to_bytes(&ctx).unwrap();
        let mut cur = std::io::Cursor::new(bytes);
        let back = RequestHeader::decode(&mut cur, &ctx).unwrap();
        assert_eq!(back.request_handle, 42);
        assert_eq!(back.authentication_token, NodeId::new(0, 7u32));
    }

    #[test]
    fn response_header_echoes_request_handle() {
        let ctx = ctx();
        let req = RequestHeader::new(NodeId::null(), 99);
        let resp = ResponseHeader::new_good(&req);
        let bytes = resp.to_bytes(&ctx).unwrap();
        let mut cur = std::io::Cursor::new(bytes);
        let back = ResponseHeader::decode(&mut cur, &ctx).unwrap();
        assert_eq!(back.request_handle, 99);
        assert_eq!(back.service_result, StatusCode::Good);
    }
}
