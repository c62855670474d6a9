// OPCUA for Rust
// SPDX-License-Identifier: MPL-2.0

//! Decoding the `ExtensionObject` carried as `ActivateSessionRequest::user_identity_token`.
//!
//! This crate has no generated `...Encoding_DefaultBinary` NodeId table (see
//! `DESIGN.md`'s "Messages" entry), so the binary-encoding ids below are this
//! crate's own small, stable convention rather than ones assigned by the
//! standard.

use opcua_types::{
    encoding::UaNullable,
    generated::{AnonymousIdentityToken, UserNameIdentityToken},
    node_id::Identifier,
    variant::ExtensionObject,
    NamespaceMap, NodeId, UAString,
};

/// Policy id a server's `anonymous` endpoint entry advertises and a client echoes back.
pub const POLICY_ID_ANONYMOUS: &str = "anonymous";
/// Policy id a server's `username` endpoint entry advertises and a client echoes back.
pub const POLICY_ID_USER_NAME: &str = "username";

const ENCODING_ID_ANONYMOUS: u32 = 1;
const ENCODING_ID_USER_NAME: u32 = 2;

/// An identity token decoded from the wire, ready for [`crate::AccessControl`] to authenticate.
pub enum IdentityToken {
    /// No token was presented; treated the same as an explicit anonymous token.
    None,
    /// An anonymous identity token.
    Anonymous(AnonymousIdentityToken),
    /// A username/password identity token.
    UserName(UserNameIdentityToken),
    /// A token this crate doesn't recognize or couldn't decode.
    Invalid,
}

impl IdentityToken {
    /// Decode `token` against a namespace-free [`NamespaceMap`] — user identity tokens never
    /// reference namespaced members, so this needs no more context than that.
    pub fn decode(token: &ExtensionObject) -> Self {
        if token.is_ua_null() {
            return IdentityToken::Anonymous(AnonymousIdentityToken { policy_id: UAString::from(POLICY_ID_ANONYMOUS) });
        }
        let ns = NamespaceMap::new();
        let ctx = opcua_types::encoding::Context::new(&ns);
        match &token.type_id.identifier {
            Identifier::Numeric(ENCODING_ID_ANONYMOUS) => token
                .decode_inner::<AnonymousIdentityToken>(&ctx)
                .map(IdentityToken::Anonymous)
                .unwrap_or(IdentityToken::Invalid),
            Identifier::Numeric(ENCODING_ID_USER_NAME) => token
                .decode_inner::<UserNameIdentityToken>(&ctx)
                .map(IdentityToken::UserName)
                .unwrap_or(IdentityToken::Invalid),
            _ => IdentityToken::Invalid,
        }
    }

    /// Wrap an [`AnonymousIdentityToken`] the way a client would before sending `ActivateSession`.
    pub fn wrap_anonymous(ctx: &opcua_types::encoding::Context<'_>) -> ExtensionObject {
        ExtensionObject::from_encodable(
            NodeId::new(0, ENCODING_ID_ANONYMOUS),
            &AnonymousIdentityToken { policy_id: UAString::from(POLICY_ID_ANONYMOUS) },
            ctx,
        )
        .unwrap_or_else(|_| ExtensionObject::null())
    }

    /// Wrap a [`UserNameIdentityToken`] the way a client would before sending `ActivateSession`.
    pub fn wrap_user_name(ctx: &opcua_types::encoding::Context<'_>, username: &str, password: &[u8]) -> ExtensionObject {
        ExtensionObject::from_encodable(
            NodeId::new(0, ENCODING_ID_USER_NAME),
            &UserNameIdentityToken {
                policy_id: UAString::from(POLICY_ID_USER_NAME),
                user_name: UAString::from(username),
                password: password.to_vec().into(),
                encryption_algorithm: UAString::null(),
            },
            ctx,
        )
        .unwrap_or_else(|_| ExtensionObject::null())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> (NamespaceMap, ()) {
        (NamespaceMap::new(), ())
    }

    #[test]
    fn null_token_decodes_as_anonymous() {
        match IdentityToken::decode(&ExtensionObject::null()) {
            IdentityToken::Anonymous(t) => assert_eq!(t.policy_id.as_ref(), POLICY_ID_ANONYMOUS),
            _ => panic!("expected anonymous"),
        }
    }

    #[test]
    fn anonymous_token_round_trips() {
        let (ns, _) = ctx();
        let c = opcua_types::encoding::Context::new(&ns);
        let wrapped = IdentityToken::wrap_anonymous(&c);
        match IdentityToken::decode(&wrapped) {
            IdentityToken::Anonymous(_) => {}
            _ => panic!("expected anonymous"),
        }
    }

    #[test]
    fn user_name_token_round_trips() {
        let (ns, _) = ctx();
        let c = opcua_types::encoding::Context::new(&ns);
        let wrapped = IdentityToken::wrap_user_name(&c, "alice", b"hunter2");
        match IdentityToken::decode(&wrapped) {
            IdentityToken::UserName(t) => {
                assert_eq!(t.user_name.as_ref(), "alice");
                assert_eq!(t.password.as_bytes(), b"hunter2");
            }
            _ => panic!("expected username token"),
        }
    }
}
