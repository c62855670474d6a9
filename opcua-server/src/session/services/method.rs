// OPCUA for Rust
// SPDX-License-Identifier: MPL-2.0

//! `Call`: dispatches `CallMethodRequest`s to the [`MethodHandler`] registered
//! for each `method_id`.
//!
//! A handler that cannot answer inline returns [`CallOutcome::Pending`]
//! carrying the receiver half of an [`AsyncOperations::park`] call and the
//! deadline it was parked with — `SPEC_FULL.md` §4.8's
//! `GoodCompletesAsynchronously` path. This crate is tokio-based throughout,
//! so "park the operation, suspend the response, resume on
//! `set_async_result`" is just awaiting that receiver with a deadline rather
//! than a second, separate response-assembly pass.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use opcua_core::sync::RwLock;
use opcua_types::generated::{CallMethodRequest, CallMethodResult, CallRequest};
use opcua_types::{NodeId, StatusCode, Variant};
use tokio::sync::oneshot;
use tokio::time::Instant;

use crate::async_op::AsyncOutcome;

use super::{check_operation_count, ServiceContext};

/// What a [`MethodHandler`] answers a `Call` with.
pub enum CallOutcome {
    /// The call's result, known immediately.
    Ready(Result<Vec<Variant>, StatusCode>),
    /// `GoodCompletesAsynchronously`: await `receiver` (bounded by `deadline`) for the result.
    /// The handler is expected to have parked it with [`crate::async_op::AsyncOperations::park`].
    Pending { receiver: oneshot::Receiver<AsyncOutcome>, deadline: Instant },
}

/// Invokes a MethodNode. Registered per `method_id` in a [`MethodRegistry`].
#[async_trait]
pub trait MethodHandler: Send + Sync {
    /// Validate and invoke the method on `object_id` with `input_arguments`.
    async fn call(&self, object_id: &NodeId, input_arguments: &[Variant]) -> CallOutcome;
}

/// Maps a MethodNode's id to the [`MethodHandler`] that implements it. A method with no
/// registered handler answers `Call` with `BadMethodInvalid`, the same as the standard's "method
/// not callable" case.
#[derive(Default)]
pub struct MethodRegistry {
    handlers: RwLock<HashMap<NodeId, Arc<dyn MethodHandler>>>,
}

impl MethodRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self { handlers: RwLock::new(HashMap::new()) }
    }

    /// Register (or replace) the handler for `method_id`.
    pub fn register(&self, method_id: NodeId, handler: Arc<dyn MethodHandler>) {
        self.handlers.write().insert(method_id, handler);
    }

    /// Remove the handler registered for `method_id`, if any.
    pub fn unregister(&self, method_id: &NodeId) {
        self.handlers.write().remove(method_id);
    }

    fn get(&self, method_id: &NodeId) -> Option<Arc<dyn MethodHandler>> {
        self.handlers.read().get(method_id).cloned()
    }
}

async fn call_one(call: &CallMethodRequest, ctx: &ServiceContext<'_>) -> CallMethodResult {
    if !ctx.access_control.allow_browse_node(ctx.user, &call.object_id) {
        return CallMethodResult { status_code: StatusCode::BadNodeIdUnknown, ..Default::default() };
    }
    if !ctx.access_control.allow_call(ctx.user, &call.method_id) {
        return CallMethodResult { status_code: StatusCode::BadUserAccessDenied, ..Default::default() };
    }
    let Some(handler) = ctx.methods.get(&call.method_id) else {
        return CallMethodResult { status_code: StatusCode::BadMethodInvalid, ..Default::default() };
    };

    let inputs = call.input_arguments.clone().unwrap_or_default();
    let outcome = handler.call(&call.object_id, &inputs).await;
    let result = match outcome {
        CallOutcome::Ready(result) => result,
        CallOutcome::Pending { receiver, deadline } => match tokio::time::timeout_at(deadline, receiver).await {
            Ok(Ok(AsyncOutcome::Call(status, outputs))) => if status.is_good() { Ok(outputs) } else { Err(status) },
            Ok(Ok(_)) => Err(StatusCode::BadInternalError),
            Ok(Err(_)) => Err(StatusCode::BadInternalError),
            Err(_) => Err(StatusCode::BadTimeout),
        },
    };

    match result {
        Ok(outputs) => CallMethodResult { status_code: StatusCode::Good, output_arguments: Some(outputs), ..Default::default() },
        Err(status) => CallMethodResult { status_code: status, ..Default::default() },
    }
}

/// `Call`: one [`CallMethodResult`] per entry in `methods_to_call`, in order.
pub async fn call(request: &CallRequest, ctx: &ServiceContext<'_>) -> Result<Vec<CallMethodResult>, StatusCode> {
    let calls = request.methods_to_call.as_deref().unwrap_or_default();
    check_operation_count(calls, ctx.config.limits.operational.max_nodes_per_method_call)?;

    let mut results = Vec::with_capacity(calls.len());
    for call in calls {
        results.push(call_one(call, ctx).await);
    }
    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access_control::{DefaultAccessControl, UserToken};
    use crate::config::ServerConfig;
    use opcua_core::sync::RwLock as CoreRwLock;
    use opcua_nodes::AddressSpace;
    use opcua_types::generated::RequestHeader;

    struct Doubler;

    #[async_trait]
    impl MethodHandler for Doubler {
        async fn call(&self, _object_id: &NodeId, input_arguments: &[Variant]) -> CallOutcome {
            match input_arguments.first() {
                Some(Variant::Int32(n)) => CallOutcome::Ready(Ok(vec![Variant::Int32(n * 2)])),
                _ => CallOutcome::Ready(Err(StatusCode::BadInvalidArgument)),
            }
        }
    }

    fn ctx<'a>(space: &'a CoreRwLock<AddressSpace>, ac: &'a DefaultAccessControl, config: &'a ServerConfig, methods: &'a MethodRegistry, user: &'a UserToken) -> ServiceContext<'a> {
        ServiceContext { address_space: space, user, access_control: ac, config, methods }
    }

    #[tokio::test]
    async fn call_dispatches_to_the_registered_handler() {
        let space = CoreRwLock::new(AddressSpace::new());
        let ac = DefaultAccessControl;
        let config = ServerConfig::default();
        let methods = MethodRegistry::new();
        let method_id = NodeId::new(1, 10u32);
        methods.register(method_id.clone(), Arc::new(Doubler));
        let user = UserToken::default();
        let c = ctx(&space, &ac, &config, &methods, &user);

        let request = CallRequest {
            request_header: RequestHeader::new(NodeId::null(), 1),
            methods_to_call: Some(vec![CallMethodRequest { object_id: NodeId::new(1, 1u32), method_id, input_arguments: Some(vec![Variant::Int32(21)]) }]),
        };
        let results = call(&request, &c).await.unwrap();
        assert_eq!(results[0].status_code, StatusCode::Good);
        assert_eq!(results[0].output_arguments, Some(vec![Variant::Int32(42)]));
    }

    #[tokio::test]
    async fn call_to_unregistered_method_is_bad_method_invalid() {
        let space = CoreRwLock::new(AddressSpace::new());
        let ac = DefaultAccessControl;
        let config = ServerConfig::default();
        let methods = MethodRegistry::new();
        let user = UserToken::default();
        let c = ctx(&space, &ac, &config, &methods, &user);

        let request = CallRequest {
            request_header: RequestHeader::new(NodeId::null(), 1),
            methods_to_call: Some(vec![CallMethodRequest { object_id: NodeId::new(1, 1u32), method_id: NodeId::new(1, 999u32), input_arguments: None }]),
        };
        let results = call(&request, &c).await.unwrap();
        assert_eq!(results[0].status_code, StatusCode::BadMethodInvalid);
    }
}
