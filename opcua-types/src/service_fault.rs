// OPCUA for Rust
// SPDX-License-Identifier: MPL-2.0

//! `ServiceFault`: the response sent in place of a service's normal response
//! body when the whole call fails before producing one.

use crate::{
    binary_struct,
    generated::headers::{AsRequestHandle, ResponseHeader},
    status_code::StatusCode,
    UaNullable,
};

/// Sent instead of a service's normal response when the request as a whole
/// could not be serviced (bad request header, unsupported service, etc).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ServiceFault {
    /// Carries the failing `service_result` and the echoed request handle.
    pub response_header: ResponseHeader,
}

impl UaNullable for ServiceFault {
    fn is_ua_null(&self) -> bool {
        false
    }
}

impl ServiceFault {
    /// Build a fault response for a request handle, with the given status.
    pub fn new(request_header: impl AsRequestHandle, service_result: StatusCode) -> Self {
        Self {
            response_header: ResponseHeader::new_service_result(request_header, service_result),
        }
    }
}

binary_struct!(ServiceFault {
    response_header: ResponseHeader,
});
