// OPCUA for Rust
// SPDX-License-Identifier: MPL-2.0

//! [`Session`]: per-client state that survives across `SecureChannel`
//! renewal and transfer (`SPEC_FULL.md`'s Session entity). Lifecycle and
//! lookup live in [`manager`]; service dispatch lives in [`services`].

pub mod manager;
pub mod services;

use std::collections::HashMap;

use opcua_types::{
    generated::ApplicationDescription, ByteString, NodeId, QualifiedName, StatusCode, UAString, Variant,
};
use tokio::time::Instant;

pub use manager::SessionManager;

use crate::access_control::UserToken;

/// A client session: created by `CreateSession`, made usable by
/// `ActivateSession`, and torn down by `CloseSession`, timeout, or server
/// shutdown. Subscriptions outlive a session transfer (`TransferSubscriptions`)
/// but not an owning session's termination without one.
#[derive(Debug)]
pub struct Session {
    session_id: NodeId,
    authentication_token: NodeId,
    secure_channel_id: u32,
    timeout_ms: u64,
    last_activity: Instant,
    activated: bool,
    user_token: Option<UserToken>,
    server_nonce: ByteString,
    locale_ids: Option<Vec<UAString>>,
    endpoint_url: UAString,
    session_name: UAString,
    client_description: ApplicationDescription,
    max_request_message_size: u32,
    max_response_message_size: u32,
    attributes: HashMap<QualifiedName, Variant>,
    subscriptions: Vec<u32>,
}

impl Session {
    /// Build a new, not-yet-activated session as `CreateSession` would.
    #[allow(clippy::too_many_arguments)]
    pub fn create(
        session_id: NodeId,
        authentication_token: NodeId,
        secure_channel_id: u32,
        timeout_ms: u64,
        max_request_message_size: u32,
        max_response_message_size: u32,
        endpoint_url: UAString,
        session_name: UAString,
        client_description: ApplicationDescription,
        server_nonce: ByteString,
    ) -> Self {
        Self {
            session_id,
            authentication_token,
            secure_channel_id,
            timeout_ms,
            last_activity: Instant::now(),
            activated: false,
            user_token: None,
            server_nonce,
            locale_ids: None,
            endpoint_url,
            session_name,
            client_description,
            max_request_message_size,
            max_response_message_size,
            attributes: HashMap::new(),
            subscriptions: Vec::new(),
        }
    }

    /// Server-assigned session identity.
    pub fn session_id(&self) -> &NodeId {
        &self.session_id
    }

    /// The secret token the client must echo in every request header.
    pub fn authentication_token(&self) -> &NodeId {
        &self.authentication_token
    }

    /// Id of the `SecureChannel` this session was created on, or most recently activated on.
    pub fn secure_channel_id(&self) -> u32 {
        self.secure_channel_id
    }

    /// `ActivateSession` transfers the session to a new channel.
    pub fn set_secure_channel_id(&mut self, id: u32) {
        self.secure_channel_id = id;
    }

    /// `true` once `ActivateSession` has succeeded at least once.
    pub fn is_activated(&self) -> bool {
        self.activated
    }

    /// The endpoint URL this session was created against.
    pub fn endpoint_url(&self) -> &UAString {
        &self.endpoint_url
    }

    /// The nonce the client must sign to prove identity on the next activation.
    pub fn server_nonce(&self) -> &ByteString {
        &self.server_nonce
    }

    /// Identity established by the most recent `ActivateSession`, if any.
    pub fn user_token(&self) -> Option<&UserToken> {
        self.user_token.as_ref()
    }

    /// Client-preferred locales from the most recent `ActivateSession`.
    pub fn locale_ids(&self) -> Option<&[UAString]> {
        self.locale_ids.as_deref()
    }

    /// Subscriptions this session currently owns.
    pub fn subscriptions(&self) -> &[u32] {
        &self.subscriptions
    }

    /// Record that `id` is now owned by this session (`CreateSubscription`, or the target of a
    /// successful `TransferSubscriptions`).
    pub fn add_subscription(&mut self, id: u32) {
        if !self.subscriptions.contains(&id) {
            self.subscriptions.push(id);
        }
    }

    /// Stop tracking `id` (`DeleteSubscriptions`, or the source of a successful
    /// `TransferSubscriptions`).
    pub fn remove_subscription(&mut self, id: u32) {
        self.subscriptions.retain(|&s| s != id);
    }

    /// Attach the user identity established by `ActivateSession`, transfer to `secure_channel_id`,
    /// and refresh the activity deadline.
    pub fn activate(&mut self, secure_channel_id: u32, server_nonce: ByteString, locale_ids: Option<Vec<UAString>>, user_token: UserToken) {
        self.secure_channel_id = secure_channel_id;
        self.server_nonce = server_nonce;
        self.locale_ids = locale_ids;
        self.user_token = Some(user_token);
        self.activated = true;
        self.touch();
    }

    /// Refresh the session-timeout deadline. Called on every service request the session serves.
    pub fn touch(&mut self) {
        self.last_activity = Instant::now();
    }

    /// The instant at which this session times out absent further activity.
    pub fn deadline(&self) -> Instant {
        self.last_activity + std::time::Duration::from_millis(self.timeout_ms)
    }

    /// `Err(BadSessionIdInvalid)` once the session's deadline has passed.
    pub fn validate_not_timed_out(&self) -> Result<(), StatusCode> {
        if Instant::now() >= self.deadline() {
            Err(StatusCode::BadSessionIdInvalid)
        } else {
            Ok(())
        }
    }

    /// Session-scoped key/value storage (`SetSessionAttribute`-style extensions some clients
    /// rely on; not a standard service in this crate's scope, but the storage itself is part of
    /// the Session entity per `SPEC_FULL.md`).
    pub fn set_attribute(&mut self, name: QualifiedName, value: Variant) {
        self.attributes.insert(name, value);
    }

    /// Look up a session attribute previously set with [`Session::set_attribute`].
    pub fn attribute(&self, name: &QualifiedName) -> Option<&Variant> {
        self.attributes.get(name)
    }

    /// Human-readable name supplied at `CreateSession`, for diagnostics only.
    pub fn session_name(&self) -> &UAString {
        &self.session_name
    }

    /// Description of the connecting client application.
    pub fn client_description(&self) -> &ApplicationDescription {
        &self.client_description
    }

    /// Ceiling on a request this session may send.
    pub fn max_request_message_size(&self) -> u32 {
        self.max_request_message_size
    }

    /// Ceiling on a response this session will accept.
    pub fn max_response_message_size(&self) -> u32 {
        self.max_response_message_size
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_session() -> Session {
        Session::create(
            NodeId::new(1, 1u32),
            NodeId::new(0, ByteString::from(vec![1, 2, 3])),
            7,
            1000,
            1 << 16,
            1 << 16,
            UAString::from("opc.tcp://localhost:4840"),
            UAString::from("test session"),
            ApplicationDescription::default(),
            ByteString::from(vec![9, 9, 9]),
        )
    }

    #[test]
    fn new_session_is_not_activated() {
        let session = make_session();
        assert!(!session.is_activated());
        assert!(session.user_token().is_none());
    }

    #[test]
    fn activate_sets_user_token_and_flips_activated() {
        let mut session = make_session();
        session.activate(9, ByteString::from(vec![1]), None, UserToken("alice".to_string()));
        assert!(session.is_activated());
        assert_eq!(session.user_token(), Some(&UserToken("alice".to_string())));
        assert_eq!(session.secure_channel_id(), 9);
    }

    #[test]
    fn subscriptions_are_tracked_without_duplicates() {
        let mut session = make_session();
        session.add_subscription(1);
        session.add_subscription(1);
        session.add_subscription(2);
        assert_eq!(session.subscriptions(), &[1, 2]);
        session.remove_subscription(1);
        assert_eq!(session.subscriptions(), &[2]);
    }
}
