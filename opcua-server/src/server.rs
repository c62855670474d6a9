// OPCUA for Rust
// SPDX-License-Identifier: MPL-2.0

//! [`Server`]: the single entry point every public API call and every
//! decoded request goes through (`SPEC_FULL.md` §5's "re-entrant server
//! mutex" — the session table and subscription table share one lock here,
//! acquired once per [`Server::dispatch`] call and held for its duration,
//! which is as close to the spec's single-threaded cooperative model as a
//! multi-threaded tokio runtime gets without a hand-rolled reactor; see
//! `DESIGN.md`).
//!
//! Grounded on the teacher's `opcua-server/src/server.rs`, minus the parts
//! of that file concerned with an actual TCP listener and certificate
//! store (`opcua-core::comms` provides the chunk/SecureChannel framing this
//! crate targets, but driving real sockets is left to embedding code, per
//! this crate's Non-goals) — kept here are the pieces that generalize: one
//! struct owning every other subsystem, a single lock serializing mutation,
//! and a periodic tick driving timeouts and the publishing engine forward.

use std::sync::Arc;

use opcua_core::comms::secure_channel::SecureChannel;
use opcua_core::messages::{RequestMessage, ResponseMessage};
use opcua_core::sync::RwLock;
use opcua_core::event_loop::EventLoop;
use opcua_types::generated::{
    AttributeId, CloseSessionRequest, DeleteSubscriptionsResponse, PublishResponse, RequestHeader, ResponseHeader,
    SetPublishingModeResponse, TransferSubscriptionsResponse,
};
use opcua_types::{DataValue, NodeId, ServiceFault, StatusCode};
use opcua_nodes::AddressSpace;
use tokio::time::{Duration, Instant};

use crate::access_control::AccessControl;
use crate::config::ServerConfig;
use crate::session::services::{self, method::MethodRegistry, ServiceContext};
use crate::session::SessionManager;
use crate::subscriptions::SubscriptionManager;

/// Mutable state shared by the session and subscription tables, behind one lock so a `Publish`
/// and a `CreateSubscription` on two different channels can never interleave inconsistently.
struct ServerState {
    sessions: SessionManager,
    subscriptions: SubscriptionManager,
}

/// An OPC UA server: the address space, the session and subscription tables, the services
/// dispatch table, and the access-control plugin, wired into one request router.
///
/// Built once at startup and shared behind an `Arc` with every connection's decode/dispatch
/// loop; [`Server::dispatch`] and [`Server::tick`] are the only two entry points a transport
/// layer needs to drive.
pub struct Server {
    config: Arc<ServerConfig>,
    address_space: Arc<RwLock<AddressSpace>>,
    access_control: Arc<dyn AccessControl>,
    methods: MethodRegistry,
    state: RwLock<ServerState>,
    event_loop: EventLoop,
    publish_timeout: Duration,
}

impl Server {
    /// Build a server with an empty session/subscription table over `address_space`.
    pub fn new(config: ServerConfig, address_space: AddressSpace, access_control: Arc<dyn AccessControl>) -> Self {
        let max_sessions = config.limits.max_sessions;
        Self {
            config: Arc::new(config),
            address_space: Arc::new(RwLock::new(address_space)),
            access_control,
            methods: MethodRegistry::new(),
            state: RwLock::new(ServerState { sessions: SessionManager::new(max_sessions), subscriptions: SubscriptionManager::new() }),
            event_loop: EventLoop::new(),
            publish_timeout: Duration::from_secs(60),
        }
    }

    /// Server configuration, as loaded at startup.
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// The address space this server serves. Shared with `Call` handlers and other embedding
    /// code that needs to mutate nodes outside of a `Write` request.
    pub fn address_space(&self) -> &Arc<RwLock<AddressSpace>> {
        &self.address_space
    }

    /// Registry of `Call` handlers. Populate before accepting connections.
    pub fn methods(&self) -> &MethodRegistry {
        &self.methods
    }

    /// The cooperative scheduler driving session/subscription timeouts. Callers own the
    /// `tokio::select!` loop that awaits `iterate`/`tick`; this crate's Non-goals exclude an
    /// owned accept loop.
    pub fn event_loop(&self) -> &EventLoop {
        &self.event_loop
    }

    /// Decode-to-dispatch entry point: route one request to its handler, behind the server's
    /// single state lock. `CreateSession`/`ActivateSession`/`CloseSession` and every
    /// subscription/MonitoredItem/Publish/Republish service are handled directly here since they
    /// mutate the session or subscription table; everything else is delegated to
    /// [`crate::session::services::dispatch`] against the node-oriented `ServiceContext`.
    pub async fn dispatch(&self, channel: &mut SecureChannel, request: RequestMessage) -> ResponseMessage {
        match request {
            RequestMessage::CreateSession(req) => {
                let mut state = self.state.write();
                match state.sessions.create_session(channel, &self.config, &req) {
                    Ok(resp) => resp.into(),
                    Err(status) => fault(&req.request_header, status),
                }
            }
            RequestMessage::ActivateSession(req) => {
                let state = self.state.read();
                match state.sessions.activate_session(channel, &req, self.access_control.as_ref()).await {
                    Ok(resp) => resp.into(),
                    Err(status) => fault(&req.request_header, status),
                }
            }
            RequestMessage::CloseSession(req) => self.close_session(channel, &req),

            RequestMessage::CreateSubscription(req) => {
                let mut state = self.state.write();
                let Some(session) = state.sessions.find_by_token(&req.request_header.authentication_token) else {
                    return fault(&req.request_header, StatusCode::BadSessionIdInvalid);
                };
                let resp = state.subscriptions.create_subscription(&req, &self.config.limits.subscriptions, Instant::now());
                session.write().add_subscription(resp.subscription_id);
                resp.into()
            }
            RequestMessage::ModifySubscription(req) => {
                let mut state = self.state.write();
                match state.subscriptions.modify_subscription(&req, &self.config.limits.subscriptions) {
                    Ok(resp) => resp.into(),
                    Err(status) => fault(&req.request_header, status),
                }
            }
            RequestMessage::SetPublishingMode(req) => {
                let mut state = self.state.write();
                let ids = req.subscription_ids.as_deref().unwrap_or_default();
                let results = state.subscriptions.set_publishing_mode(req.publishing_enabled, ids);
                ResponseMessage::from(SetPublishingModeResponse {
                    response_header: ResponseHeader::new_good(&req.request_header),
                    results: Some(results),
                    diagnostic_infos: None,
                })
            }
            RequestMessage::DeleteSubscriptions(req) => {
                let mut state = self.state.write();
                let ids = req.subscription_ids.as_deref().unwrap_or_default();
                let results = state.subscriptions.delete_subscriptions(ids);
                if let Some(session) = state.sessions.find_by_token(&req.request_header.authentication_token) {
                    let mut session = session.write();
                    for &id in ids {
                        session.remove_subscription(id);
                    }
                }
                ResponseMessage::from(DeleteSubscriptionsResponse {
                    response_header: ResponseHeader::new_good(&req.request_header),
                    results: Some(results),
                    diagnostic_infos: None,
                })
            }
            RequestMessage::TransferSubscriptions(req) => {
                let mut state = self.state.write();
                let Some(new_session) = state.sessions.find_by_token(&req.request_header.authentication_token) else {
                    return fault(&req.request_header, StatusCode::BadSessionIdInvalid);
                };
                let ids = req.subscription_ids.clone().unwrap_or_default();
                let results = state.subscriptions.transfer_subscriptions(&ids);
                let mut new_session = new_session.write();
                for (id, result) in ids.iter().zip(&results) {
                    if result.status_code == StatusCode::GoodSubscriptionTransferred {
                        new_session.add_subscription(*id);
                    }
                }
                ResponseMessage::from(TransferSubscriptionsResponse {
                    response_header: ResponseHeader::new_good(&req.request_header),
                    results: Some(results),
                    diagnostic_infos: None,
                })
            }
            RequestMessage::CreateMonitoredItems(req) => {
                let mut state = self.state.write();
                match state.subscriptions.create_monitored_items(&req, &self.config.limits.subscriptions) {
                    Ok(resp) => resp.into(),
                    Err(status) => fault(&req.request_header, status),
                }
            }
            RequestMessage::ModifyMonitoredItems(req) => {
                let mut state = self.state.write();
                match state.subscriptions.modify_monitored_items(&req, &self.config.limits.subscriptions) {
                    Ok(resp) => resp.into(),
                    Err(status) => fault(&req.request_header, status),
                }
            }
            RequestMessage::DeleteMonitoredItems(req) => {
                let mut state = self.state.write();
                match state.subscriptions.delete_monitored_items(&req) {
                    Ok(resp) => resp.into(),
                    Err(status) => fault(&req.request_header, status),
                }
            }
            RequestMessage::SetMonitoringMode(req) => {
                let mut state = self.state.write();
                match state.subscriptions.set_monitoring_mode(&req) {
                    Ok(resp) => resp.into(),
                    Err(status) => fault(&req.request_header, status),
                }
            }
            RequestMessage::SetTriggering(req) => {
                let mut state = self.state.write();
                match state.subscriptions.set_triggering(&req) {
                    Ok(resp) => resp.into(),
                    Err(status) => fault(&req.request_header, status),
                }
            }
            RequestMessage::Republish(req) => {
                let state = self.state.read();
                match state.subscriptions.republish(req.subscription_id, req.retransmit_sequence_number) {
                    Ok(message) => opcua_types::generated::RepublishResponse { response_header: ResponseHeader::new_good(&req.request_header), notification_message: message }.into(),
                    Err(status) => fault(&req.request_header, status),
                }
            }
            RequestMessage::Publish(req) => self.publish(req).await,

            RequestMessage::Read(_)
            | RequestMessage::Write(_)
            | RequestMessage::Browse(_)
            | RequestMessage::BrowseNext(_)
            | RequestMessage::TranslateBrowsePathsToNodeIds(_)
            | RequestMessage::Call(_) => self.dispatch_node_service(request).await,

            other => fault(other.request_header(), StatusCode::BadServiceUnsupported),
        }
    }

    fn close_session(&self, channel: &SecureChannel, req: &CloseSessionRequest) -> ResponseMessage {
        let mut state = self.state.write();
        match state.sessions.close_session(req, channel) {
            Ok((resp, session)) => {
                if req.delete_subscriptions {
                    let ids = session.read().subscriptions().to_vec();
                    state.subscriptions.delete_subscriptions(&ids);
                }
                resp.into()
            }
            Err(status) => fault(&req.request_header, status),
        }
    }

    async fn dispatch_node_service(&self, request: RequestMessage) -> ResponseMessage {
        let token = &request.request_header().authentication_token;
        let user = {
            let state = self.state.read();
            let Some(session) = state.sessions.find_by_token(token) else {
                return fault(request.request_header(), StatusCode::BadSessionIdInvalid);
            };
            let mut session = session.write();
            if let Err(status) = session.validate_not_timed_out() {
                return fault(request.request_header(), status);
            }
            session.touch();
            let Some(user) = session.user_token().cloned() else {
                return fault(request.request_header(), StatusCode::BadSessionNotActivated);
            };
            user
        };

        let written = if let RequestMessage::Write(req) = &request {
            Some(req.nodes_to_write.clone().unwrap_or_default())
        } else {
            None
        };

        let ctx = ServiceContext { address_space: &self.address_space, user: &user, access_control: self.access_control.as_ref(), config: &self.config, methods: &self.methods };
        let response = services::dispatch(request, &ctx).await;

        if let Some(items) = written {
            let mut state = self.state.write();
            let space = self.address_space.read();
            for item in items {
                if item.attribute_id != AttributeId::Value as u32 {
                    continue;
                }
                let value = space.read_attribute(&item.node_id, item.attribute_id, true);
                state.subscriptions.notify_data_change(&item.node_id, item.attribute_id, &value);
            }
        }

        response
    }

    async fn publish(&self, req: Box<opcua_types::generated::PublishRequest>) -> ResponseMessage {
        let owned: Vec<u32> = {
            let state = self.state.read();
            match state.sessions.find_by_token(&req.request_header.authentication_token) {
                Some(session) => session.read().subscriptions().to_vec(),
                None => return fault(&req.request_header, StatusCode::BadSessionIdInvalid),
            }
        };

        let outcome = {
            let mut state = self.state.write();
            state.subscriptions.publish(&req, &owned, self.publish_timeout, Instant::now())
        };

        match outcome {
            crate::subscriptions::PublishOutcome::Ready(resp) => resp.into(),
            crate::subscriptions::PublishOutcome::Pending { receiver, deadline, results, diagnostic_infos } => {
                match tokio::time::timeout_at(deadline, receiver).await {
                    Ok(Ok(Ok((subscription_id, notification_message)))) => {
                        let available_sequence_numbers = {
                            let state = self.state.read();
                            state.subscriptions.get(subscription_id).map(|s| s.retransmission_sequence_numbers())
                        };
                        PublishResponse {
                            response_header: ResponseHeader::new_good(&req.request_header),
                            subscription_id,
                            available_sequence_numbers,
                            more_notifications: false,
                            notification_message,
                            results,
                            diagnostic_infos,
                        }
                        .into()
                    }
                    Ok(Ok(Err(status))) => fault(&req.request_header, status),
                    Ok(Err(_)) | Err(_) => fault(&req.request_header, StatusCode::BadTimeout),
                }
            }
        }
    }

    /// Advance every session/subscription deadline as of `now`: expire idle sessions (moving
    /// their subscriptions into the transferable pool rather than deleting them, per
    /// `SPEC_FULL.md` §4.6's "subscriptions survive session timeout" rule) and tick every
    /// subscription's publishing timer.
    pub fn tick(&self, now: Instant) {
        let mut state = self.state.write();
        let expired = state.sessions.expire_sessions(now);
        for (_, session) in expired {
            let _owned = session.read().subscriptions().to_vec();
            // Subscriptions outlive the session transfer window; they are left in the
            // subscription table for a subsequent TransferSubscriptions to reclaim, and are
            // only reaped by their own lifetime-counter timeout (`tick_all` below).
        }
        state.subscriptions.tick_all(now);
    }

    /// The next instant [`Server::tick`] should be called, the nearer of the session and
    /// subscription deadlines.
    pub fn next_deadline(&self) -> Option<Instant> {
        let state = self.state.read();
        match (state.sessions.next_deadline(), state.subscriptions.next_deadline()) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// Feed a fired event into every subscription's Event MonitoredItems, bubbling it through the
    /// address space's notifier hierarchy (`SPEC_FULL.md` §4.9's Event MonitoredItem support).
    /// Exposed for embedding code that raises events outside of a `Write` (e.g. a `Call` handler
    /// transitioning a condition).
    pub fn raise_event(&self, event: &crate::subscriptions::FiredEvent) {
        let space = self.address_space.read();
        let mut state = self.state.write();
        state.subscriptions.notify_event(&space, event);
    }
}

fn fault(request_header: &RequestHeader, status: StatusCode) -> ResponseMessage {
    ResponseMessage::from(ServiceFault::new(request_header, status))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access_control::DefaultAccessControl;
    use opcua_core::comms::secure_channel::Role;
    use opcua_types::generated::{ApplicationDescription, CreateSubscriptionRequest, PublishRequest};
    use opcua_types::{ByteString, Variant};

    fn server() -> Server {
        Server::new(ServerConfig::default(), AddressSpace::new(), Arc::new(DefaultAccessControl))
    }

    fn channel() -> SecureChannel {
        SecureChannel::new(Role::Server)
    }

    async fn create_and_activate_session(server: &Server) -> NodeId {
        let mut ch = channel();
        let create = RequestMessage::from(opcua_types::generated::CreateSessionRequest {
            request_header: RequestHeader::new(NodeId::null(), 1),
            client_description: ApplicationDescription::default(),
            server_uri: Default::default(),
            endpoint_url: "opc.tcp://127.0.0.1:4840".into(),
            session_name: "test".into(),
            client_nonce: ByteString::null(),
            client_certificate: ByteString::null(),
            requested_session_timeout: 60_000.0,
            max_response_message_size: 1 << 20,
        });
        let ResponseMessage::CreateSession(resp) = server.dispatch(&mut ch, create).await else { panic!("expected CreateSessionResponse") };
        let token = resp.authentication_token.clone();

        let activate = RequestMessage::from(opcua_types::generated::ActivateSessionRequest {
            request_header: RequestHeader::new(token.clone(), 2),
            client_signature: Default::default(),
            locale_ids: None,
            user_identity_token: Default::default(),
            user_token_signature: Default::default(),
        });
        server.dispatch(&mut ch, activate).await;
        token
    }

    #[tokio::test]
    async fn create_session_then_activate_succeeds() {
        let server = server();
        let token = create_and_activate_session(&server).await;
        assert_ne!(token, NodeId::null());
    }

    #[tokio::test]
    async fn write_then_read_round_trips_through_dispatch() {
        let mut space = AddressSpace::new();
        let node_id = NodeId::new(1, 1u32);
        space.insert(
            opcua_nodes::VariableNode::new(node_id.clone(), opcua_types::QualifiedName::new(1, "Temp"), opcua_types::LocalizedText::from("Temp"), NodeId::new(0, 11u32), Variant::Double(1.0)),
            &[],
        );
        let server = Server::new(ServerConfig::default(), space, Arc::new(DefaultAccessControl));
        let token = create_and_activate_session(&server).await;
        let mut ch = channel();

        let write = RequestMessage::from(opcua_types::generated::WriteRequest {
            request_header: RequestHeader::new(token.clone(), 3),
            nodes_to_write: Some(vec![opcua_types::generated::WriteValue {
                node_id: node_id.clone(),
                attribute_id: AttributeId::Value as u32,
                index_range: Default::default(),
                value: DataValue::new_now(Variant::Double(4.5)),
            }]),
        });
        server.dispatch(&mut ch, write).await;

        let read = RequestMessage::from(opcua_types::generated::ReadRequest {
            request_header: RequestHeader::new(token, 4),
            max_age: 0.0,
            timestamps_to_return: opcua_types::generated::TimestampsToReturn::Both,
            nodes_to_read: Some(vec![opcua_types::generated::ReadValueId { node_id, attribute_id: AttributeId::Value as u32, index_range: Default::default(), data_encoding: Default::default() }]),
        });
        let ResponseMessage::Read(resp) = server.dispatch(&mut ch, read).await else { panic!("expected ReadResponse") };
        assert_eq!(resp.results.as_ref().unwrap()[0].value, Some(Variant::Double(4.5)));
    }

    #[tokio::test]
    async fn write_delivers_a_data_change_notification_to_a_subscribed_publish() {
        let mut space = AddressSpace::new();
        let node_id = NodeId::new(1, 1u32);
        space.insert(
            opcua_nodes::VariableNode::new(node_id.clone(), opcua_types::QualifiedName::new(1, "Temp"), opcua_types::LocalizedText::from("Temp"), NodeId::new(0, 11u32), Variant::Double(1.0)),
            &[],
        );
        let server = Server::new(ServerConfig::default(), space, Arc::new(DefaultAccessControl));
        let token = create_and_activate_session(&server).await;
        let mut ch = channel();

        let create_sub = RequestMessage::from(CreateSubscriptionRequest {
            request_header: RequestHeader::new(token.clone(), 3),
            requested_publishing_interval: 10_000.0,
            requested_lifetime_count: 100,
            requested_max_keep_alive_count: 50,
            max_notifications_per_publish: 0,
            publishing_enabled: true,
            priority: 0,
        });
        let ResponseMessage::CreateSubscription(sub_resp) = server.dispatch(&mut ch, create_sub).await else { panic!("expected CreateSubscriptionResponse") };
        let subscription_id = sub_resp.subscription_id;

        let create_item = RequestMessage::from(opcua_types::generated::CreateMonitoredItemsRequest {
            request_header: RequestHeader::new(token.clone(), 4),
            subscription_id,
            timestamps_to_return: opcua_types::generated::TimestampsToReturn::Both,
            items_to_create: Some(vec![opcua_types::generated::MonitoredItemCreateRequest {
                item_to_monitor: opcua_types::generated::ReadValueId { node_id: node_id.clone(), attribute_id: AttributeId::Value as u32, index_range: Default::default(), data_encoding: Default::default() },
                monitoring_mode: opcua_types::generated::MonitoringMode::Reporting,
                requested_parameters: opcua_types::generated::MonitoringParameters { client_handle: 1, sampling_interval: 10_000.0, filter: Default::default(), queue_size: 5, discard_oldest: true },
            }]),
        });
        server.dispatch(&mut ch, create_item).await;

        let write = RequestMessage::from(opcua_types::generated::WriteRequest {
            request_header: RequestHeader::new(token.clone(), 5),
            nodes_to_write: Some(vec![opcua_types::generated::WriteValue { node_id, attribute_id: AttributeId::Value as u32, index_range: Default::default(), value: DataValue::new_now(Variant::Double(9.0)) }]),
        });
        server.dispatch(&mut ch, write).await;

        let publish = RequestMessage::from(PublishRequest { request_header: RequestHeader::new(token, 6), subscription_acknowledgements: None });
        let ResponseMessage::Publish(resp) = server.dispatch(&mut ch, publish).await else { panic!("expected PublishResponse") };
        assert_eq!(resp.subscription_id, subscription_id);
        assert!(!resp.notification_message.is_keep_alive());
    }
}
