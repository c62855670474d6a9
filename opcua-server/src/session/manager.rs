// OPCUA for Rust
// SPDX-License-Identifier: MPL-2.0

//! [`SessionManager`]: the session table plus `CreateSession`,
//! `ActivateSession` and `CloseSession`.
//!
//! Grounded on the teacher's `opcua-server/src/session/manager.rs`, but
//! reworked against this crate's `opcua-crypto`, which has no
//! `create_signature_data`/`verify_signature_data` free functions or
//! `SecurityPolicy::random_nonce`. Server/client signature proof is built
//! directly from `SecurityPolicy::asym_sign`/`asym_verify` against the
//! channel's own key material instead (see `DESIGN.md`).

use std::collections::HashMap;
use std::sync::Arc;

use opcua_core::comms::secure_channel::SecureChannel;
use opcua_core::sync::RwLock;
use opcua_crypto::random;
use opcua_crypto::SecurityPolicy;
use opcua_types::generated::{
    ActivateSessionRequest, ActivateSessionResponse, CloseSessionRequest, CloseSessionResponse, CreateSessionRequest,
    CreateSessionResponse, ResponseHeader, SignatureData,
};
use opcua_types::{ByteString, NodeId, StatusCode};
use tokio::time::Instant;

use crate::access_control::AccessControl;
use crate::config::ServerConfig;
use crate::identity_token::IdentityToken;

use super::Session;

/// The session table for one server. Sessions are reference-counted so a
/// caller can hold one across an `await` (e.g. while authenticating) without
/// keeping the whole table locked.
pub struct SessionManager {
    sessions: HashMap<NodeId, Arc<RwLock<Session>>>,
    max_sessions: usize,
}

fn next_session_numeric_id() -> u32 {
    use std::sync::atomic::{AtomicU32, Ordering};
    static NEXT: AtomicU32 = AtomicU32::new(1);
    NEXT.fetch_add(1, Ordering::Relaxed)
}

impl SessionManager {
    /// An empty session table admitting at most `max_sessions` concurrent sessions.
    pub fn new(max_sessions: usize) -> Self {
        Self { sessions: HashMap::new(), max_sessions }
    }

    /// Look up a session by the `authentication_token` every request header carries.
    pub fn find_by_token(&self, authentication_token: &NodeId) -> Option<Arc<RwLock<Session>>> {
        self.sessions.get(authentication_token).cloned()
    }

    /// `CreateSession`: allocate a new, inactive session on `channel`.
    pub fn create_session(
        &mut self,
        channel: &mut SecureChannel,
        config: &ServerConfig,
        request: &CreateSessionRequest,
    ) -> Result<CreateSessionResponse, StatusCode> {
        if self.sessions.len() >= self.max_sessions {
            return Err(StatusCode::BadTooManySessions);
        }
        if request.endpoint_url.is_null() {
            return Err(StatusCode::BadTcpEndpointUrlInvalid);
        }
        let endpoint_url = request.endpoint_url.as_ref().to_string();
        let endpoints = config.endpoint_descriptions(&endpoint_url);
        if endpoints.is_empty() {
            return Err(StatusCode::BadTcpEndpointUrlInvalid);
        }

        let session_timeout = (config.max_session_timeout_ms as f64).min(request.requested_session_timeout.max(1.0)) as u64;
        let authentication_token = NodeId::new(0, random::byte_string(32));
        let session_id = NodeId::new(1, next_session_numeric_id());
        let server_nonce = channel.create_random_nonce();

        let security_policy = channel.security_policy();
        let server_signature = match channel.private_key() {
            Some(pkey) if security_policy != SecurityPolicy::None => {
                let mut data = request.client_certificate.as_bytes().to_vec();
                data.extend_from_slice(request.client_nonce.as_bytes());
                security_policy
                    .asym_sign(pkey, &data)
                    .map(|signature| SignatureData { algorithm: security_policy.uri().into(), signature: ByteString::from(signature) })
                    .unwrap_or_default()
            }
            _ => SignatureData::default(),
        };

        let session = Session::create(
            session_id.clone(),
            authentication_token.clone(),
            channel.secure_channel_id(),
            session_timeout,
            config.limits.operational.max_nodes_per_read.max(1) as u32 * 4096,
            request.max_response_message_size,
            request.endpoint_url.clone(),
            request.session_name.clone(),
            request.client_description.clone(),
            server_nonce.clone(),
        );

        self.sessions.insert(authentication_token.clone(), Arc::new(RwLock::new(session)));

        Ok(CreateSessionResponse {
            response_header: ResponseHeader::new_good(&request.request_header),
            session_id,
            authentication_token,
            revised_session_timeout: session_timeout as f64,
            server_nonce,
            server_certificate: channel.cert_der().map(|d| ByteString::from(d.to_vec())).unwrap_or_default(),
            server_endpoints: Some(endpoints),
            server_signature,
            max_request_message_size: request.max_response_message_size,
        })
    }

    /// `ActivateSession`: authenticate the presented identity token and, on success, transfer the
    /// session to `channel` and mark it activated.
    pub async fn activate_session(
        &self,
        channel: &mut SecureChannel,
        request: &ActivateSessionRequest,
        access_control: &dyn AccessControl,
    ) -> Result<ActivateSessionResponse, StatusCode> {
        let session_lck = self.find_by_token(&request.request_header.authentication_token).ok_or(StatusCode::BadSessionIdInvalid)?;

        {
            let session = session_lck.read();
            session.validate_not_timed_out()?;
            if session.is_activated() && session.secure_channel_id() != channel.secure_channel_id() {
                self.verify_client_signature(channel, &session, &request.client_signature)?;
            }
        }

        let user_token = match IdentityToken::decode(&request.user_identity_token) {
            IdentityToken::None | IdentityToken::Anonymous(_) => access_control.authenticate_anonymous().await.map_err(StatusCode::from)?,
            IdentityToken::UserName(token) if token.is_valid() => access_control
                .authenticate_username(token.user_name.as_ref(), token.password.as_bytes())
                .await
                .map_err(StatusCode::from)?,
            IdentityToken::UserName(_) | IdentityToken::Invalid => return Err(StatusCode::BadIdentityTokenInvalid),
        };

        let server_nonce = channel.create_random_nonce();
        {
            let mut session = session_lck.write();
            session.activate(channel.secure_channel_id(), server_nonce.clone(), request.locale_ids.clone(), user_token);
        }

        Ok(ActivateSessionResponse {
            response_header: ResponseHeader::new_good(&request.request_header),
            server_nonce,
            results: None,
            diagnostic_infos: None,
        })
    }

    fn verify_client_signature(&self, channel: &SecureChannel, _session: &Session, signature: &SignatureData) -> Result<(), StatusCode> {
        let security_policy = channel.security_policy();
        if security_policy == SecurityPolicy::None {
            return Ok(());
        }
        let Some(public_key) = channel.remote_public_key() else {
            return Err(StatusCode::BadUserSignatureInvalid);
        };
        let Some(cert_der) = channel.cert_der() else {
            return Err(StatusCode::BadUserSignatureInvalid);
        };
        let mut data = cert_der.to_vec();
        data.extend_from_slice(channel.local_nonce());
        security_policy.asym_verify(public_key, &data, signature.signature.as_bytes()).map_err(|_| StatusCode::BadUserSignatureInvalid)
    }

    /// `CloseSession`: remove the session from the table. Returns the removed session so the
    /// caller can tear down its subscriptions when `delete_subscriptions` was requested.
    pub fn close_session(&mut self, request: &CloseSessionRequest, channel: &SecureChannel) -> Result<(CloseSessionResponse, Arc<RwLock<Session>>), StatusCode> {
        let token = &request.request_header.authentication_token;
        let session_lck = self.find_by_token(token).ok_or(StatusCode::BadSessionIdInvalid)?;
        {
            let session = session_lck.read();
            if !session.is_activated() && session.secure_channel_id() != channel.secure_channel_id() {
                return Err(StatusCode::BadSecureChannelIdInvalid);
            }
        }
        self.sessions.remove(token);
        Ok((CloseSessionResponse { response_header: ResponseHeader::new_good(&request.request_header) }, session_lck))
    }

    /// Remove and return every session past its deadline as of `now`.
    pub fn expire_sessions(&mut self, now: Instant) -> Vec<(NodeId, Arc<RwLock<Session>>)> {
        let expired: Vec<NodeId> = self.sessions.iter().filter(|(_, s)| s.read().deadline() <= now).map(|(token, _)| token.clone()).collect();
        expired.into_iter().map(|token| { let session = self.sessions.remove(&token).unwrap(); (token, session) }).collect()
    }

    /// The next deadline among all live sessions, for the caller's `EventLoop` tick.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.sessions.values().map(|s| s.read().deadline()).min()
    }

    /// Number of sessions currently tracked.
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// `true` if no sessions are tracked.
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access_control::DefaultAccessControl;
    use opcua_core::comms::secure_channel::Role;
    use opcua_types::generated::{ApplicationDescription, RequestHeader};

    fn channel() -> SecureChannel {
        SecureChannel::new(Role::Server)
    }

    fn create_request() -> CreateSessionRequest {
        CreateSessionRequest {
            request_header: RequestHeader::new(NodeId::new(0, 1u32), 1),
            client_description: ApplicationDescription::default(),
            server_uri: Default::default(),
            endpoint_url: "opc.tcp://127.0.0.1:4840".into(),
            session_name: "test".into(),
            client_nonce: ByteString::null(),
            client_certificate: ByteString::null(),
            requested_session_timeout: 60_000.0,
            max_response_message_size: 1 << 20,
        }
    }

    #[test]
    fn create_session_rejects_unknown_endpoint() {
        let mut mgr = SessionManager::new(10);
        let config = ServerConfig::default();
        let mut req = create_request();
        req.endpoint_url = "opc.tcp://nowhere:1".into();
        assert_eq!(mgr.create_session(&mut channel(), &config, &req), Err(StatusCode::BadTcpEndpointUrlInvalid));
    }

    #[test]
    fn create_session_enforces_max_sessions() {
        let mut mgr = SessionManager::new(1);
        let config = ServerConfig::default();
        assert!(mgr.create_session(&mut channel(), &config, &create_request()).is_ok());
        assert_eq!(mgr.create_session(&mut channel(), &config, &create_request()), Err(StatusCode::BadTooManySessions));
    }

    #[tokio::test]
    async fn activate_session_with_anonymous_token_succeeds() {
        let mut mgr = SessionManager::new(10);
        let config = ServerConfig::default();
        let response = mgr.create_session(&mut channel(), &config, &create_request()).unwrap();

        let mut activate_channel = channel();
        let request = ActivateSessionRequest {
            request_header: RequestHeader::new(response.authentication_token.clone(), 2),
            client_signature: SignatureData::default(),
            locale_ids: None,
            user_identity_token: Default::default(),
            user_token_signature: SignatureData::default(),
        };
        let ac = DefaultAccessControl;
        let result = mgr.activate_session(&mut activate_channel, &request, &ac).await;
        assert!(result.is_ok());
        let session = mgr.find_by_token(&response.authentication_token).unwrap();
        assert!(session.read().is_activated());
    }

    #[test]
    fn close_session_removes_it_from_the_table() {
        let mut mgr = SessionManager::new(10);
        let config = ServerConfig::default();
        let response = mgr.create_session(&mut channel(), &config, &create_request()).unwrap();
        assert_eq!(mgr.len(), 1);

        let close_request = CloseSessionRequest {
            request_header: RequestHeader::new(response.authentication_token.clone(), 3),
            delete_subscriptions: true,
        };
        assert!(mgr.close_session(&close_request, &channel()).is_ok());
        assert_eq!(mgr.len(), 0);
    }
}
