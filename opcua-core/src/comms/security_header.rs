// OPCUA for Rust
// SPDX-License-Identifier: MPL-2.0

//! [`SecurityHeader`] and related headers.
//!
//! The security header is part of an OPC UA message chunk describing the
//! security token and certificates in play. OpenSecureChannel chunks carry
//! an asymmetric header; ordinary message chunks carry a symmetric one.

use std::io::{Read, Write};

use opcua_crypto::SecurityPolicy;
use opcua_types::{
    constants,
    encoding::{BinaryDecodable, BinaryEncodable, Context, EncodingResult},
    status_code::StatusCode,
    ByteString, Error, UAString,
};

/// Either half of the `SecurityHeader` union, distinguished by the chunk's message type.
#[derive(Debug, Clone, PartialEq)]
pub enum SecurityHeader {
    /// Header carried by OpenSecureChannel chunks.
    Asymmetric(AsymmetricSecurityHeader),
    /// Header carried by ordinary message chunks.
    Symmetric(SymmetricSecurityHeader),
}

impl SecurityHeader {
    /// Byte length of the header as it would be encoded.
    pub fn byte_len(&self, ctx: &Context<'_>) -> usize {
        match self {
            SecurityHeader::Asymmetric(h) => h.byte_len(ctx),
            SecurityHeader::Symmetric(h) => h.byte_len(ctx),
        }
    }

    /// Encode the header.
    pub fn encode<S: Write + ?Sized>(&self, stream: &mut S, ctx: &Context<'_>) -> EncodingResult<()> {
        match self {
            SecurityHeader::Asymmetric(h) => h.encode(stream, ctx),
            SecurityHeader::Symmetric(h) => h.encode(stream, ctx),
        }
    }

    /// Decode a header from a stream, given whether the owning chunk is an OpenSecureChannel chunk
    /// (the chunk header determines which variant follows; this type has no self-describing tag).
    pub fn decode_from_stream<S: Read + ?Sized>(
        stream: &mut S,
        is_open_secure_channel: bool,
        ctx: &Context<'_>,
    ) -> EncodingResult<Self> {
        if is_open_secure_channel {
            let header = AsymmetricSecurityHeader::decode(stream, ctx)?;
            if !header.security_policy_uri.is_null() && SecurityPolicy::from_uri(header.security_policy_uri.as_ref()).is_none() {
                return Err(Error::new(
                    StatusCode::BadSecurityPolicyRejected,
                    format!("unknown security policy uri {}", header.security_policy_uri),
                ));
            }
            Ok(SecurityHeader::Asymmetric(header))
        } else {
            Ok(SecurityHeader::Symmetric(SymmetricSecurityHeader::decode(stream, ctx)?))
        }
    }
}

/// Security header for symmetric (ordinary message) chunks: just the active token id.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SymmetricSecurityHeader {
    /// The security token identifying which derived key set signs/encrypts this chunk.
    pub token_id: u32,
}

impl SymmetricSecurityHeader {
    fn byte_len(&self, _ctx: &Context<'_>) -> usize {
        4
    }

    fn encode<S: Write + ?Sized>(&self, stream: &mut S, ctx: &Context<'_>) -> EncodingResult<()> {
        self.token_id.encode(stream, ctx)
    }

    fn decode<S: Read + ?Sized>(stream: &mut S, ctx: &Context<'_>) -> EncodingResult<Self> {
        Ok(Self {
            token_id: u32::decode(stream, ctx)?,
        })
    }
}

/// Security header for asymmetric (OpenSecureChannel) chunks: carries the sender's certificate
/// and names the certificate the sender encrypted this message's body with.
#[derive(Debug, Clone, PartialEq)]
pub struct AsymmetricSecurityHeader {
    /// URI of the security policy used for this channel.
    pub security_policy_uri: UAString,
    /// The sender's own certificate, DER-encoded.
    pub sender_certificate: ByteString,
    /// SHA-1 thumbprint of the certificate the sender used to encrypt, so the receiver can pick
    /// the right private key if it holds more than one.
    pub receiver_certificate_thumbprint: ByteString,
}

impl AsymmetricSecurityHeader {
    /// The header sent when no security is in effect.
    pub fn none() -> Self {
        Self {
            security_policy_uri: UAString::from(SecurityPolicy::None.uri()),
            sender_certificate: ByteString::null(),
            receiver_certificate_thumbprint: ByteString::null(),
        }
    }

    /// Build a header carrying our certificate and the thumbprint of the peer's.
    pub fn new(security_policy: SecurityPolicy, sender_certificate_der: &[u8], receiver_certificate_thumbprint: ByteString) -> Self {
        Self {
            security_policy_uri: UAString::from(security_policy.uri()),
            sender_certificate: ByteString::from(sender_certificate_der.to_vec()),
            receiver_certificate_thumbprint,
        }
    }

    fn byte_len(&self, ctx: &Context<'_>) -> usize {
        self.security_policy_uri.byte_len(ctx) + self.sender_certificate.byte_len(ctx) + self.receiver_certificate_thumbprint.byte_len(ctx)
    }

    fn encode<S: Write + ?Sized>(&self, stream: &mut S, ctx: &Context<'_>) -> EncodingResult<()> {
        self.security_policy_uri.encode(stream, ctx)?;
        self.sender_certificate.encode(stream, ctx)?;
        self.receiver_certificate_thumbprint.encode(stream, ctx)
    }

    fn decode<S: Read + ?Sized>(stream: &mut S, ctx: &Context<'_>) -> EncodingResult<Self> {
        let security_policy_uri = UAString::decode(stream, ctx)?;
        let sender_certificate = ByteString::decode(stream, ctx)?;
        let receiver_certificate_thumbprint = ByteString::decode(stream, ctx)?;

        if sender_certificate.as_bytes().len() >= constants::MAX_BYTE_STRING_LENGTH.min(64 * 1024) {
            return Err(Error::new(StatusCode::BadEncodingLimitsExceeded, "sender certificate exceeds max certificate size"));
        }
        let thumbprint_len = receiver_certificate_thumbprint.as_bytes().len();
        if thumbprint_len > 0 && thumbprint_len != 20 {
            return Err(Error::decoding(format!("receiver certificate thumbprint is {thumbprint_len} bytes, expected 20")));
        }
        Ok(Self {
            security_policy_uri,
            sender_certificate,
            receiver_certificate_thumbprint,
        })
    }
}

/// Sequence number and request id carried by every chunk, signed/encrypted along with the body.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SequenceHeader {
    /// Monotonically increasing (with wraparound) per-channel, per-direction counter.
    pub sequence_number: u32,
    /// Groups the chunks of one message; echoed in the response.
    pub request_id: u32,
}

impl SequenceHeader {
    /// Byte length of the header as it would be encoded.
    pub fn byte_len(&self, _ctx: &Context<'_>) -> usize {
        8
    }

    /// Encode the header.
    pub fn encode<S: Write + ?Sized>(&self, stream: &mut S, ctx: &Context<'_>) -> EncodingResult<()> {
        self.sequence_number.encode(stream, ctx)?;
        self.request_id.encode(stream, ctx)
    }

    /// Decode the header.
    pub fn decode<S: Read + ?Sized>(stream: &mut S, ctx: &Context<'_>) -> EncodingResult<Self> {
        let sequence_number = u32::decode(stream, ctx)?;
        let request_id = u32::decode(stream, ctx)?;
        Ok(Self { sequence_number, request_id })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use opcua_types::namespaces::NamespaceMap;

    fn ctx() -> (NamespaceMap, Context<'static>) {
        let ns = Box::leak(Box::new(NamespaceMap::new()));
        (NamespaceMap::new(), Context::new(ns))
    }

    #[test]
    fn symmetric_header_roundtrips() {
        let (_ns, ctx) = ctx();
        let header = SymmetricSecurityHeader { token_id: 7 };
        let mut buf = Vec::new();
        header.encode(&mut buf, &ctx).unwrap();
        let mut cur = std::io::Cursor::new(buf.as_slice());
        let decoded = SymmetricSecurityHeader::decode(&mut cur, &ctx).unwrap();
        assert_eq!(decoded.token_id, 7);
    }

    #[test]
    fn asymmetric_none_header_has_null_certificates() {
        let header = AsymmetricSecurityHeader::none();
        assert!(header.sender_certificate.is_null());
        assert!(header.receiver_certificate_thumbprint.is_null());
        assert_eq!(header.security_policy_uri.as_ref(), SecurityPolicy::None.uri());
    }

    #[test]
    fn rejects_wrong_length_thumbprint() {
        let (_ns, ctx) = ctx();
        let header = AsymmetricSecurityHeader {
            security_policy_uri: UAString::from(SecurityPolicy::None.uri()),
            sender_certificate: ByteString::null(),
            receiver_certificate_thumbprint: ByteString::from(vec![0u8; 5]),
        };
        let mut buf = Vec::new();
        header.encode(&mut buf, &ctx).unwrap();
        let mut cur = std::io::Cursor::new(buf.as_slice());
        assert!(AsymmetricSecurityHeader::decode(&mut cur, &ctx).is_err());
    }
}
