// OPCUA for Rust
// SPDX-License-Identifier: MPL-2.0

//! [`RequestMessage`]/[`ResponseMessage`]: the union of every service request
//! and response type this implementation supports, plus the numeric type-id
//! that selects a variant when decoding a chunk's body.
//!
//! The upstream standard assigns every service's request/response struct a
//! `NodeId` in the `i=...` numeric namespace; this crate's `opcua-codegen`
//! tool assigns its own compact, contiguous ids instead (see
//! `opcua-codegen/src/dictionary/types.yaml`) since the reduced type
//! dictionary it targets never needs to interoperate with the full OPC UA
//! binary type id space.

mod request;
mod response;

pub use request::RequestMessage;
pub use response::ResponseMessage;

use std::io::{Cursor, Read, Write};

use opcua_types::encoding::{BinaryDecodable, BinaryEncodable, Context, EncodingResult};

/// Associates a message type with the numeric id `opcua-codegen` assigned it.
pub trait MessageType {
    /// The id identifying this type's wire encoding, used as a dispatch key when decoding.
    fn type_id() -> u32;
}

/// A decodable, request-handle-bearing service message: either a `RequestMessage` or a
/// `ResponseMessage` variant.
pub trait Message: BinaryEncodable + Sized {
    /// The client-assigned handle this message carries, for correlating responses to requests.
    fn request_handle(&self) -> u32;

    /// Decode a message whose type-id prefix has already been consumed, given the id that
    /// named it.
    fn decode_by_type_id<S: Read + ?Sized>(stream: &mut S, type_id: u32, ctx: &Context<'_>) -> EncodingResult<Self>;
}

impl RequestMessage {
    /// Encode this request with its leading type-id prefix, as it appears in a chunk body.
    pub fn to_bytes_with_type_id(&self, ctx: &Context<'_>) -> EncodingResult<Vec<u8>> {
        let mut buf = Vec::new();
        self.type_id_of().encode(&mut buf, ctx)?;
        self.encode(&mut buf, ctx)?;
        Ok(buf)
    }

    /// Decode a request from a chunk body carrying its leading type-id prefix, the inverse
    /// of [`RequestMessage::to_bytes_with_type_id`].
    pub fn from_bytes_with_type_id(bytes: &[u8], ctx: &Context<'_>) -> EncodingResult<Self> {
        let mut stream = Cursor::new(bytes);
        let type_id = u32::decode(&mut stream, ctx)?;
        Self::decode_by_type_id(&mut stream, type_id, ctx)
    }
}

impl ResponseMessage {
    /// Encode this response with its leading type-id prefix, as it appears in a chunk body.
    pub fn to_bytes_with_type_id(&self, ctx: &Context<'_>) -> EncodingResult<Vec<u8>> {
        let mut buf = Vec::new();
        self.type_id_of().encode(&mut buf, ctx)?;
        self.encode(&mut buf, ctx)?;
        Ok(buf)
    }

    /// Decode a response from a chunk body carrying its leading type-id prefix, the inverse
    /// of [`ResponseMessage::to_bytes_with_type_id`].
    pub fn from_bytes_with_type_id(bytes: &[u8], ctx: &Context<'_>) -> EncodingResult<Self> {
        let mut stream = Cursor::new(bytes);
        let type_id = u32::decode(&mut stream, ctx)?;
        Self::decode_by_type_id(&mut stream, type_id, ctx)
    }
}
