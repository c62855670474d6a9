// OPCUA for Rust
// SPDX-License-Identifier: MPL-2.0
// This file was generated by opcua-codegen from dictionary/types.yaml. DO NOT EDIT.

//! OpenSecureChannel/CloseSecureChannel service bodies, carried inside OPN/CLO
//! chunks by `opcua-core`'s SecureChannel state machine.

use crate::{
    binary_struct,
    date_time::UtcTime,
    generated::{
        headers::{RequestHeader, ResponseHeader},
        session::MessageSecurityMode,
    },
    wire_enum, ByteString, UaNullable,
};

wire_enum!(SecurityTokenRequestType, default = Issue {
    Issue = 0,
    Renew = 1,
});

/// The symmetric key lease negotiated for a channel: its identity, lifetime,
/// and when it was created.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ChannelSecurityToken {
    /// Channel this token belongs to.
    pub channel_id: u32,
    /// Identifies this specific token among the channel's issued/renewed tokens.
    pub token_id: u32,
    /// When the server created the token.
    pub created_at: UtcTime,
    /// Validity window in milliseconds from `created_at`.
    pub revised_lifetime: u32,
}

impl UaNullable for ChannelSecurityToken {
    fn is_ua_null(&self) -> bool {
        self.channel_id == 0
    }
}

binary_struct!(ChannelSecurityToken {
    channel_id: u32,
    token_id: u32,
    created_at: UtcTime,
    revised_lifetime: u32,
});

/// Request body for opening or renewing a SecureChannel, carried in an OPN chunk.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct OpenSecureChannelRequest {
    /// Standard request envelope. Only meaningful on renewal; fresh opens
    /// carry a placeholder since no `authentication_token` exists yet.
    pub request_header: RequestHeader,
    /// Protocol version the client implements.
    pub client_protocol_version: u32,
    /// Whether this is a fresh channel or a renewal of an existing one.
    pub request_type: SecurityTokenRequestType,
    /// Requested message security mode.
    pub security_mode: MessageSecurityMode,
    /// Random bytes contributing to symmetric key derivation.
    pub client_nonce: ByteString,
    /// Requested token lifetime in milliseconds.
    pub requested_lifetime: u32,
}

impl UaNullable for OpenSecureChannelRequest {
    fn is_ua_null(&self) -> bool {
        false
    }
}

binary_struct!(OpenSecureChannelRequest {
    request_header: RequestHeader,
    client_protocol_version: u32,
    request_type: SecurityTokenRequestType,
    security_mode: MessageSecurityMode,
    client_nonce: ByteString,
    requested_lifetime: u32,
});

/// Response body for OpenSecureChannel.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct OpenSecureChannelResponse {
    /// Standard response envelope.
    pub response_header: ResponseHeader,
    /// Protocol version the server implements.
    pub server_protocol_version: u32,
    /// The token the server issued or renewed.
    pub security_token: ChannelSecurityToken,
    /// Random bytes contributing to symmetric key derivation.
    pub server_nonce: ByteString,
}

impl UaNullable for OpenSecureChannelResponse {
    fn is_ua_null(&self) -> bool {
        false
    }
}

binary_struct!(OpenSecureChannelResponse {
    response_header: ResponseHeader,
    server_protocol_version: u32,
    security_token: ChannelSecurityToken,
    server_nonce: ByteString,
});

/// Request body for closing a SecureChannel, carried in a CLO chunk.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CloseSecureChannelRequest {
    /// Standard request envelope.
    pub request_header: RequestHeader,
}

impl UaNullable for CloseSecureChannelRequest {
    fn is_ua_null(&self) -> bool {
        false
    }
}

binary_struct!(CloseSecureChannelRequest {
    request_header: RequestHeader,
});

/// Response body for CloseSecureChannel. The server does not actually send
/// this; the channel is simply torn down after the request is processed.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CloseSecureChannelResponse {
    /// Standard response envelope.
    pub response_header: ResponseHeader,
}

impl UaNullable for CloseSecureChannelResponse {
    fn is_ua_null(&self) -> bool {
        false
    }
}

binary_struct!(CloseSecureChannelResponse {
    response_header: ResponseHeader,
});
