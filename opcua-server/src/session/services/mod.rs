// OPCUA for Rust
// SPDX-License-Identifier: MPL-2.0

//! The services dispatch table (`SPEC_FULL.md` §4.7): Read/Write/Browse/
//! BrowseNext/TranslateBrowsePathsToNodeIds/Call, all running against one
//! [`AddressSpace`](opcua_nodes::AddressSpace) behind the session's
//! [`AccessControl`] checks.
//!
//! `CreateSession`/`ActivateSession`/`CloseSession` are handled directly by
//! [`crate::session::SessionManager`] rather than through this table, since
//! they mutate the session table itself rather than the address space;
//! subscription and MonitoredItem services are handled by
//! [`crate::subscriptions`]. This module is the static table's remaining
//! "operate on nodes" quadrant.

pub mod attributes;
pub mod method;
pub mod view;

pub use method::{CallOutcome, MethodHandler, MethodRegistry};

use opcua_core::sync::RwLock;
use opcua_core::messages::{RequestMessage, ResponseMessage};
use opcua_types::generated::{RequestHeader, ResponseHeader};
use opcua_types::{ServiceFault, StatusCode};

use crate::access_control::{AccessControl, UserToken};
use crate::config::ServerConfig;

use opcua_nodes::AddressSpace;

/// Everything one service handler needs: the address space, the caller's
/// identity, the plugin to consult, and the configured operation limits.
pub struct ServiceContext<'a> {
    /// The address space this server serves.
    pub address_space: &'a RwLock<AddressSpace>,
    /// Identity established by `ActivateSession`.
    pub user: &'a UserToken,
    /// The access-control plugin to consult for every operation.
    pub access_control: &'a dyn AccessControl,
    /// Resource limits (`maxNodesPerX`).
    pub config: &'a ServerConfig,
    /// Method handlers registered for `Call`.
    pub methods: &'a MethodRegistry,
}

/// Reject `items` with `BadTooManyOperations` if it exceeds `max` (`0` = unlimited), or with
/// `BadNothingToDo` if it's empty.
pub(crate) fn check_operation_count<T>(items: &[T], max: usize) -> Result<(), StatusCode> {
    if items.is_empty() {
        return Err(StatusCode::BadNothingToDo);
    }
    if max != 0 && items.len() > max {
        return Err(StatusCode::BadTooManyOperations);
    }
    Ok(())
}

/// Dispatch one node-oriented service request (`Read`, `Write`, `Browse`, `BrowseNext`,
/// `TranslateBrowsePathsToNodeIds`, `Call`) to its handler, producing a `ServiceFault` for a
/// whole-request failure or the service's own response on a (possibly partial) success.
pub async fn dispatch(request: RequestMessage, ctx: &ServiceContext<'_>) -> ResponseMessage {
    match request {
        RequestMessage::Read(req) => match attributes::read(&req, ctx) {
            Ok(results) => ResponseMessage::from(opcua_types::generated::ReadResponse {
                response_header: ResponseHeader::new_good(&req.request_header),
                results: Some(results),
                diagnostic_infos: None,
            }),
            Err(status) => fault(&req.request_header, status),
        },
        RequestMessage::Write(req) => match attributes::write(&req, ctx) {
            Ok(results) => ResponseMessage::from(opcua_types::generated::WriteResponse {
                response_header: ResponseHeader::new_good(&req.request_header),
                results: Some(results),
                diagnostic_infos: None,
            }),
            Err(status) => fault(&req.request_header, status),
        },
        RequestMessage::Browse(req) => match view::browse(&req, ctx) {
            Ok(results) => ResponseMessage::from(opcua_types::generated::BrowseResponse {
                response_header: ResponseHeader::new_good(&req.request_header),
                results: Some(results),
                diagnostic_infos: None,
            }),
            Err(status) => fault(&req.request_header, status),
        },
        RequestMessage::BrowseNext(req) => match view::browse_next(&req, ctx) {
            Ok(results) => ResponseMessage::from(opcua_types::generated::BrowseNextResponse {
                response_header: ResponseHeader::new_good(&req.request_header),
                results: Some(results),
                diagnostic_infos: None,
            }),
            Err(status) => fault(&req.request_header, status),
        },
        RequestMessage::TranslateBrowsePathsToNodeIds(req) => match view::translate_browse_paths(&req, ctx) {
            Ok(results) => ResponseMessage::from(opcua_types::generated::TranslateBrowsePathsToNodeIdsResponse {
                response_header: ResponseHeader::new_good(&req.request_header),
                results: Some(results),
                diagnostic_infos: None,
            }),
            Err(status) => fault(&req.request_header, status),
        },
        RequestMessage::Call(req) => match method::call(&req, ctx).await {
            Ok(results) => ResponseMessage::from(opcua_types::generated::CallResponse {
                response_header: ResponseHeader::new_good(&req.request_header),
                results: Some(results),
                diagnostic_infos: None,
            }),
            Err(status) => fault(&req.request_header, status),
        },
        other => fault(other.request_header(), StatusCode::BadServiceUnsupported),
    }
}

fn fault(request_header: &RequestHeader, status: StatusCode) -> ResponseMessage {
    ResponseMessage::from(ServiceFault::new(request_header, status))
}
