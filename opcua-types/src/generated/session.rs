// OPCUA for Rust
// SPDX-License-Identifier: MPL-2.0
// This file was generated by opcua-codegen from dictionary/types.yaml. DO NOT EDIT.

//! CreateSession/ActivateSession/CloseSession bodies, plus the descriptive
//! types (`ApplicationDescription`, `EndpointDescription`, `BuildInfo`) and
//! user identity tokens they carry.

use crate::{
    binary_struct,
    date_time::UtcTime,
    generated::headers::{RequestHeader, ResponseHeader},
    localized_text::LocalizedText,
    node_id::NodeId,
    status_code::StatusCode,
    string::UAString,
    variant::ExtensionObject,
    wire_enum, ByteString, UaNullable,
};

wire_enum!(ApplicationType, default = Client {
    Server = 0,
    Client = 1,
    ClientAndServer = 2,
    DiscoveryServer = 3,
});

wire_enum!(MessageSecurityMode, default = Invalid {
    Invalid = 0,
    None = 1,
    Sign = 2,
    SignAndEncrypt = 3,
});

wire_enum!(UserTokenType, default = Anonymous {
    Anonymous = 0,
    UserName = 1,
    Certificate = 2,
    IssuedToken = 3,
});

/// Identifies an application instance: client, server, or both.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ApplicationDescription {
    /// Globally unique URI identifying the application instance.
    pub application_uri: UAString,
    /// URI of the product, stable across instances/versions.
    pub product_uri: UAString,
    /// Human-readable name.
    pub application_name: LocalizedText,
    /// Server, client, or both.
    pub application_type: ApplicationType,
    /// Gateway server URI, for aggregating gateways only.
    pub gateway_server_uri: UAString,
    /// Discovery profile URI, for discovery servers only.
    pub discovery_profile_uri: UAString,
    /// URLs this application can be reached at.
    pub discovery_urls: Option<Vec<UAString>>,
}

impl UaNullable for ApplicationDescription {
    fn is_ua_null(&self) -> bool {
        self.application_uri.is_null()
    }
}

binary_struct!(ApplicationDescription {
    application_uri: UAString,
    product_uri: UAString,
    application_name: LocalizedText,
    application_type: ApplicationType,
    gateway_server_uri: UAString,
    discovery_profile_uri: UAString,
    discovery_urls: Option<Vec<UAString>>,
});

/// One way a client may authenticate to a server: which token type and
/// security policy to use.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct UserTokenPolicy {
    /// Identifies this policy among an endpoint's `user_identity_tokens`.
    pub policy_id: UAString,
    /// Kind of token this policy accepts.
    pub token_type: UserTokenType,
    /// For `IssuedToken`, the type of token issued; otherwise null.
    pub issued_token_type: UAString,
    /// Endpoint the issued token should be obtained from; otherwise null.
    pub issuer_endpoint_url: UAString,
    /// Security policy used to encrypt the token; null = the channel's policy.
    pub security_policy_uri: UAString,
}

impl UaNullable for UserTokenPolicy {
    fn is_ua_null(&self) -> bool {
        self.policy_id.is_null()
    }
}

impl UserTokenPolicy {
    /// The anonymous policy every endpoint in this implementation advertises.
    pub fn anonymous() -> Self {
        Self {
            policy_id: UAString::from("anonymous"),
            token_type: UserTokenType::Anonymous,
            issued_token_type: UAString::null(),
            issuer_endpoint_url: UAString::null(),
            security_policy_uri: UAString::null(),
        }
    }

    /// A username/password policy using the channel's own security policy.
    pub fn user_name() -> Self {
        Self {
            policy_id: UAString::from("username"),
            token_type: UserTokenType::UserName,
            issued_token_type: UAString::null(),
            issuer_endpoint_url: UAString::null(),
            security_policy_uri: UAString::null(),
        }
    }
}

binary_struct!(UserTokenPolicy {
    policy_id: UAString,
    token_type: UserTokenType,
    issued_token_type: UAString,
    issuer_endpoint_url: UAString,
    security_policy_uri: UAString,
});

/// An asymmetric signature: the algorithm used and the resulting bytes.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SignatureData {
    /// URI of the signing algorithm.
    pub algorithm: UAString,
    /// Signature bytes.
    pub signature: ByteString,
}

impl UaNullable for SignatureData {
    fn is_ua_null(&self) -> bool {
        self.algorithm.is_null()
    }
}

binary_struct!(SignatureData {
    algorithm: UAString,
    signature: ByteString,
});

/// One combination of transport, security policy and message security mode a
/// server offers for a given endpoint URL.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct EndpointDescription {
    /// URL the endpoint is reached at.
    pub endpoint_url: UAString,
    /// Description of the server offering this endpoint.
    pub server: ApplicationDescription,
    /// Server certificate, DER-encoded.
    pub server_certificate: ByteString,
    /// Sign/SignAndEncrypt/None.
    pub security_mode: MessageSecurityMode,
    /// Security policy URI, e.g. `http://opcfoundation.org/UA/SecurityPolicy#Basic256Sha256`.
    pub security_policy_uri: UAString,
    /// Accepted user identity token kinds for this endpoint.
    pub user_identity_tokens: Option<Vec<UserTokenPolicy>>,
    /// Binary transport profile URI.
    pub transport_profile_uri: UAString,
    /// Relative trustworthiness among the server's endpoints, 0-255.
    pub security_level: u8,
}

impl UaNullable for EndpointDescription {
    fn is_ua_null(&self) -> bool {
        self.endpoint_url.is_null()
    }
}

impl EndpointDescription {
    /// Find the first accepted token policy matching `token_type`.
    pub fn find_policy(&self, token_type: UserTokenType) -> Option<&UserTokenPolicy> {
        self.user_identity_tokens
            .as_ref()?
            .iter()
            .find(|t| t.token_type == token_type)
    }
}

binary_struct!(EndpointDescription {
    endpoint_url: UAString,
    server: ApplicationDescription,
    server_certificate: ByteString,
    security_mode: MessageSecurityMode,
    security_policy_uri: UAString,
    user_identity_tokens: Option<Vec<UserTokenPolicy>>,
    transport_profile_uri: UAString,
    security_level: u8,
});

/// Static build/version metadata a server reports in its `ServerStatus` variable.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BuildInfo {
    /// URI identifying the product.
    pub product_uri: UAString,
    /// Manufacturer name.
    pub manufacturer_name: UAString,
    /// Product name.
    pub product_name: UAString,
    /// Software version string.
    pub software_version: UAString,
    /// Build number or identifier.
    pub build_number: UAString,
    /// Time the running binary was built.
    pub build_date: UtcTime,
}

impl UaNullable for BuildInfo {
    fn is_ua_null(&self) -> bool {
        self.product_uri.is_null()
    }
}

binary_struct!(BuildInfo {
    product_uri: UAString,
    manufacturer_name: UAString,
    product_name: UAString,
    software_version: UAString,
    build_number: UAString,
    build_date: UtcTime,
});

/// Anonymous identity: no credentials, just a policy id.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AnonymousIdentityToken {
    /// Matches an [`UserTokenPolicy::policy_id`] on the endpoint used.
    pub policy_id: UAString,
}

impl UaNullable for AnonymousIdentityToken {
    fn is_ua_null(&self) -> bool {
        self.policy_id.is_null()
    }
}

binary_struct!(AnonymousIdentityToken { policy_id: UAString });

/// Username/password identity. The password is expected to travel encrypted
/// under the policy's `security_policy_uri` when the channel itself is `None`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct UserNameIdentityToken {
    /// Matches an [`UserTokenPolicy::policy_id`] on the endpoint used.
    pub policy_id: UAString,
    /// Username.
    pub user_name: UAString,
    /// Password, plaintext or encrypted per `encryption_algorithm`.
    pub password: ByteString,
    /// Encryption algorithm applied to `password`; null if unencrypted.
    pub encryption_algorithm: UAString,
}

impl UaNullable for UserNameIdentityToken {
    fn is_ua_null(&self) -> bool {
        self.policy_id.is_null()
    }
}

impl UserNameIdentityToken {
    /// True if both username and password are present.
    pub fn is_valid(&self) -> bool {
        !self.user_name.is_null() && !self.password.is_null()
    }
}

binary_struct!(UserNameIdentityToken {
    policy_id: UAString,
    user_name: UAString,
    password: ByteString,
    encryption_algorithm: UAString,
});

/// Request body for the CreateSession service.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CreateSessionRequest {
    /// Standard request envelope.
    pub request_header: RequestHeader,
    /// Description of the connecting client application.
    pub client_description: ApplicationDescription,
    /// Endpoint URL the client connected to.
    pub server_uri: UAString,
    /// Endpoint URL the client connected to.
    pub endpoint_url: UAString,
    /// Human-readable session name, for diagnostics/UI only.
    pub session_name: UAString,
    /// Random nonce the server must sign to prove its private key, for `None` security.
    pub client_nonce: ByteString,
    /// Client certificate, DER-encoded; null when the channel security is `None`.
    pub client_certificate: ByteString,
    /// Requested session timeout in milliseconds; the server may revise it.
    pub requested_session_timeout: f64,
    /// Maximum combined size of a response message the client will accept.
    pub max_response_message_size: u32,
}

impl UaNullable for CreateSessionRequest {
    fn is_ua_null(&self) -> bool {
        false
    }
}

binary_struct!(CreateSessionRequest {
    request_header: RequestHeader,
    client_description: ApplicationDescription,
    server_uri: UAString,
    endpoint_url: UAString,
    session_name: UAString,
    client_nonce: ByteString,
    client_certificate: ByteString,
    requested_session_timeout: f64,
    max_response_message_size: u32,
});

/// Response body for the CreateSession service.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CreateSessionResponse {
    /// Standard response envelope.
    pub response_header: ResponseHeader,
    /// Server-assigned session identity, used internally (never sent back by the client).
    pub session_id: NodeId,
    /// Secret token the client echoes in every request's `authentication_token`.
    pub authentication_token: NodeId,
    /// Session timeout the server actually applied, in milliseconds.
    pub revised_session_timeout: f64,
    /// Nonce the client must use when signing `ActivateSession`.
    pub server_nonce: ByteString,
    /// Server certificate, DER-encoded; null when the channel security is `None`.
    pub server_certificate: ByteString,
    /// Endpoints the server actually offers, for the client to detect MITM mismatch.
    pub server_endpoints: Option<Vec<EndpointDescription>>,
    /// Proof the server holds the private key matching `server_certificate`.
    pub server_signature: SignatureData,
    /// Maximum number of bytes the server will accept in one request.
    pub max_request_message_size: u32,
}

impl UaNullable for CreateSessionResponse {
    fn is_ua_null(&self) -> bool {
        false
    }
}

binary_struct!(CreateSessionResponse {
    response_header: ResponseHeader,
    session_id: NodeId,
    authentication_token: NodeId,
    revised_session_timeout: f64,
    server_nonce: ByteString,
    server_certificate: ByteString,
    server_endpoints: Option<Vec<EndpointDescription>>,
    server_signature: SignatureData,
    max_request_message_size: u32,
});

/// Request body for the ActivateSession service.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ActivateSessionRequest {
    /// Standard request envelope.
    pub request_header: RequestHeader,
    /// Proof the client holds the private key matching its certificate.
    pub client_signature: SignatureData,
    /// Locales the client prefers responses translated to, most-preferred first.
    pub locale_ids: Option<Vec<UAString>>,
    /// The user's credentials, wrapped as an `AnonymousIdentityToken` or
    /// `UserNameIdentityToken` [`ExtensionObject`].
    pub user_identity_token: ExtensionObject,
    /// Proof the user holds the credentials claimed in `user_identity_token`.
    pub user_token_signature: SignatureData,
}

impl UaNullable for ActivateSessionRequest {
    fn is_ua_null(&self) -> bool {
        false
    }
}

binary_struct!(ActivateSessionRequest {
    request_header: RequestHeader,
    client_signature: SignatureData,
    locale_ids: Option<Vec<UAString>>,
    user_identity_token: ExtensionObject,
    user_token_signature: SignatureData,
});

/// Response body for the ActivateSession service.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ActivateSessionResponse {
    /// Standard response envelope.
    pub response_header: ResponseHeader,
    /// Fresh nonce for the next renewal/activation on this session.
    pub server_nonce: ByteString,
    /// Per-locale result of applying `locale_ids`; empty unless diagnostics requested.
    pub results: Option<Vec<StatusCode>>,
    /// Per-locale diagnostic info; empty unless requested.
    pub diagnostic_infos: Option<Vec<StatusCode>>,
}

impl UaNullable for ActivateSessionResponse {
    fn is_ua_null(&self) -> bool {
        false
    }
}

binary_struct!(ActivateSessionResponse {
    response_header: ResponseHeader,
    server_nonce: ByteString,
    results: Option<Vec<StatusCode>>,
    diagnostic_infos: Option<Vec<StatusCode>>,
});

/// Request body for the CloseSession service.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CloseSessionRequest {
    /// Standard request envelope.
    pub request_header: RequestHeader,
    /// Whether subscriptions owned by this session should be deleted too,
    /// rather than entering the transferable pool.
    pub delete_subscriptions: bool,
}

impl UaNullable for CloseSessionRequest {
    fn is_ua_null(&self) -> bool {
        false
    }
}

binary_struct!(CloseSessionRequest {
    request_header: RequestHeader,
    delete_subscriptions: bool,
});

/// Response body for the CloseSession service.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CloseSessionResponse {
    /// Standard response envelope.
    pub response_header: ResponseHeader,
}

impl UaNullable for CloseSessionResponse {
    fn is_ua_null(&self) -> bool {
        false
    }
}

binary_struct!(CloseSessionResponse {
    response_header: ResponseHeader,
});

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoding::{BinaryDecodable, BinaryEncodable, Context};
    use crate::namespaces::NamespaceMap;

    fn ctx() -> Context<'static> {
        static NS: std::sync::OnceLock<NamespaceMap> = std::sync::OnceLock::new();
        Context::new(NS.get_or_init(NamespaceMap::new))
    }

    #[test]
    fn user_name_token_wraps_and_unwraps_through_extension_object() {
        let ctx = ctx();
        let token = UserNameIdentityToken {
            policy_id: UAString::from("username"),
            user_name: UAString::from("alice"),
            password: ByteString::from(b"hunter2".to_vec()),
            encryption_algorithm: UAString::null(),
        };
        assert!(token.is_valid());
        let wrapped =
            ExtensionObject::from_encodable(NodeId::new(0, 1u32), &token, &ctx).unwrap();
        let back: UserNameIdentityToken = wrapped.decode_inner(&ctx).unwrap();
        assert_eq!(back, token);
    }

    #[test]
    fn endpoint_description_finds_policy_by_token_type() {
        let endpoint = EndpointDescription {
            user_identity_tokens: Some(vec![UserTokenPolicy::anonymous(), UserTokenPolicy::user_name()]),
            ..Default::default()
        };
        assert!(endpoint.find_policy(UserTokenType::UserName).is_some());
        assert!(endpoint.find_policy(UserTokenType::Certificate).is_none());
    }

    #[test]
    fn close_session_request_roundtrip() {
        let ctx = ctx();
        let req = CloseSessionRequest {
            request_header: RequestHeader::new(NodeId::new(0, 5u32), 1),
            delete_subscriptions: true,
        };
        let bytes = req.to_bytes(&ctx).unwrap();
        let mut cur = std::io::Cursor::new(bytes);
        assert_eq!(CloseSessionRequest::decode(&mut cur, &ctx).unwrap(), req);
    }
}
