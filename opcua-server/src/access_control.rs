// OPCUA for Rust
// SPDX-License-Identifier: MPL-2.0

//! Authentication and authorization hooks (`SPEC_FULL.md` §4.7.1).
//!
//! [`AccessControl`] is the one extension point the services dispatch table
//! consults before touching the address space: it turns an identity token
//! into a [`UserToken`] during `ActivateSession`, and is asked again on every
//! `Read`/`Write`/`Browse`/`Call` to confirm the authenticated user may
//! actually perform the operation.

use async_trait::async_trait;
use opcua_nodes::AccessLevel;
use opcua_types::{generated::UserTokenPolicy, Error, NodeId, StatusCode};
use std::collections::BTreeMap;

/// A unique identifier for an authenticated user. Distinct from a session: a
/// user may hold several sessions open at once, and two sessions presenting
/// the same token are treated as the same principal for access checks.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct UserToken(pub String);

/// The identity every unauthenticated client is assigned.
pub const ANONYMOUS_USER_TOKEN: &str = "anonymous";

impl UserToken {
    /// `true` if this is the anonymous identity.
    pub fn is_anonymous(&self) -> bool {
        self.0 == ANONYMOUS_USER_TOKEN
    }
}

impl Default for UserToken {
    fn default() -> Self {
        Self(ANONYMOUS_USER_TOKEN.to_string())
    }
}

/// Authenticates identity tokens and authorizes operations against the
/// address space. A server built on this crate implements this trait once
/// and hands an instance to [`crate::Server`]; the default is
/// [`DefaultAccessControl`], which accepts anonymous sessions and grants
/// every operation.
#[async_trait]
pub trait AccessControl: Send + Sync + 'static {
    /// Validate an anonymous identity token. `Err` rejects `ActivateSession`
    /// with the contained status.
    async fn authenticate_anonymous(&self) -> Result<UserToken, Error> {
        Err(Error::new(StatusCode::BadIdentityTokenRejected, "anonymous authentication disabled"))
    }

    /// Validate a username/password identity token.
    async fn authenticate_username(&self, _username: &str, _password: &[u8]) -> Result<UserToken, Error> {
        Err(Error::new(StatusCode::BadIdentityTokenRejected, "username authentication disabled"))
    }

    /// The identity token policies this server offers; drives what
    /// `CreateSession`'s returned endpoint advertises and what
    /// `ActivateSession` accepts.
    fn user_token_policies(&self) -> Vec<UserTokenPolicy> {
        vec![UserTokenPolicy::anonymous()]
    }

    /// Narrow a node's statically configured access level to what `user` may
    /// actually do with it. The default passes the node's own access level
    /// through unchanged.
    fn user_access_level(&self, _user: &UserToken, access_level: AccessLevel, _node_id: &NodeId) -> AccessLevel {
        access_level
    }

    /// Whether `user` may call the method at `method_id`. Consulted in
    /// addition to the method node's own `Executable`/`UserExecutable`
    /// attributes.
    fn allow_call(&self, _user: &UserToken, _method_id: &NodeId) -> bool {
        true
    }

    /// Whether `user` may see `node_id` at all. Nodes this returns `false`
    /// for are omitted from Browse results and fail attribute reads with
    /// `BadNodeIdUnknown` rather than `BadUserAccessDenied`, so their
    /// existence isn't leaked.
    fn allow_browse_node(&self, _user: &UserToken, _node_id: &NodeId) -> bool {
        true
    }
}

/// A permissive [`AccessControl`] that accepts only anonymous sessions and
/// imposes no restriction beyond each node's own access level. Suitable for
/// examples and tests; production servers should supply their own.
#[derive(Debug, Default)]
pub struct DefaultAccessControl;

#[async_trait]
impl AccessControl for DefaultAccessControl {
    async fn authenticate_anonymous(&self) -> Result<UserToken, Error> {
        Ok(UserToken::default())
    }
}

/// A username/password [`AccessControl`] backed by an in-memory user table,
/// for small deployments and tests that need more than the anonymous
/// default. Passwords are compared as raw bytes; production servers should
/// hash them.
#[derive(Debug, Default)]
pub struct StaticAccessControl {
    users: BTreeMap<String, Vec<u8>>,
    allow_anonymous: bool,
}

impl StaticAccessControl {
    /// An access control with no registered users, rejecting all authentication.
    pub fn new(allow_anonymous: bool) -> Self {
        Self { users: BTreeMap::new(), allow_anonymous }
    }

    /// Register a user's password, overwriting any previous entry.
    pub fn add_user(&mut self, username: impl Into<String>, password: impl Into<Vec<u8>>) {
        self.users.insert(username.into(), password.into());
    }
}

#[async_trait]
impl AccessControl for StaticAccessControl {
    async fn authenticate_anonymous(&self) -> Result<UserToken, Error> {
        if self.allow_anonymous {
            Ok(UserToken::default())
        } else {
            Err(Error::new(StatusCode::BadIdentityTokenRejected, "anonymous authentication disabled"))
        }
    }

    async fn authenticate_username(&self, username: &str, password: &[u8]) -> Result<UserToken, Error> {
        match self.users.get(username) {
            Some(expected) if expected.as_slice() == password => Ok(UserToken(username.to_string())),
            _ => Err(Error::new(StatusCode::BadIdentityTokenRejected, format!("cannot authenticate \"{username}\""))),
        }
    }

    fn user_token_policies(&self) -> Vec<UserTokenPolicy> {
        let mut policies = Vec::with_capacity(2);
        if self.allow_anonymous {
            policies.push(UserTokenPolicy::anonymous());
        }
        if !self.users.is_empty() {
            policies.push(UserTokenPolicy::user_name());
        }
        policies
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn default_access_control_accepts_anonymous() {
        let ac = DefaultAccessControl;
        assert!(ac.authenticate_anonymous().await.is_ok());
    }

    #[tokio::test]
    async fn static_access_control_rejects_unknown_user() {
        let ac = StaticAccessControl::new(false);
        assert!(ac.authenticate_username("bob", b"hunter2").await.is_err());
    }

    #[tokio::test]
    async fn static_access_control_accepts_registered_user() {
        let mut ac = StaticAccessControl::new(false);
        ac.add_user("bob", b"hunter2".to_vec());
        let token = ac.authenticate_username("bob", b"hunter2").await.unwrap();
        assert_eq!(token, UserToken("bob".to_string()));
    }

    #[tokio::test]
    async fn static_access_control_rejects_wrong_password() {
        let mut ac = StaticAccessControl::new(false);
        ac.add_user("bob", b"hunter2".to_vec());
        assert!(ac.authenticate_username("bob", b"wrong").await.is_err());
    }
}
