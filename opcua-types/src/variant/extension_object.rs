// OPCUA for Rust
// SPDX-License-Identifier: MPL-2.0

//! `ExtensionObject`: an opaque, type-tagged binary blob used to carry
//! structured types that a `Variant` cannot express directly (e.g. a
//! `NotificationData` inside a `NotificationMessage`).

use std::io::{Read, Write};

use crate::{
    byte_string::ByteString,
    encoding::{BinaryDecodable, BinaryEncodable, Context, DecodingOptions, EncodingResult},
    node_id::NodeId,
    Error, UaNullable,
};

/// A structured value addressed by its binary-encoding-id [`NodeId`], carried
/// as an opaque byte string rather than decoded eagerly.
///
/// The real OPC UA `ExtensionObject` can also carry an XML or no body; this
/// reduced form only supports the binary body every service in this crate
/// actually emits, matching the codec's Non-goal of a generic dynamic type
/// loader.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ExtensionObject {
    /// NodeId of the `...Encoding_DefaultBinary` node identifying the body's type.
    pub type_id: NodeId,
    /// Encoded body. Empty when `type_id` is null.
    pub body: ByteString,
}

impl UaNullable for ExtensionObject {
    fn is_ua_null(&self) -> bool {
        self.type_id.is_null()
    }
}

impl ExtensionObject {
    /// Wrap an already-encoded body under the given type id.
    pub fn new(type_id: NodeId, body: ByteString) -> Self {
        Self { type_id, body }
    }

    /// The null `ExtensionObject`, carrying no value.
    pub fn null() -> Self {
        Self::default()
    }

    /// Encode `value` and wrap the result under `type_id`.
    pub fn from_encodable<T: BinaryEncodable>(
        type_id: NodeId,
        value: &T,
        ctx: &Context<'_>,
    ) -> EncodingResult<Self> {
        let bytes = value.to_bytes(ctx)?;
        Ok(Self::new(type_id, ByteString::from(bytes)))
    }

    /// Decode the body as `T`, using conservative [`DecodingOptions::minimal`]
    /// limits since the body's own length was not validated by an outer
    /// array-length check.
    pub fn decode_inner<T: BinaryDecodable>(&self, ctx: &Context<'_>) -> EncodingResult<T> {
        if self.body.is_null() {
            return Err(Error::decoding("ExtensionObject has no body to decode"));
        }
        let inner_ctx = Context::with_options(ctx.namespaces, DecodingOptions::minimal());
        let mut cur = std::io::Cursor::new(self.body.as_bytes());
        T::decode(&mut cur, &inner_ctx)
    }
}

/// Body encoding byte: 0 = none, 1 = binary, 2 = XML. Only `Binary` is ever
/// written by this crate.
const ENCODING_NONE: u8 = 0;
const ENCODING_BINARY: u8 = 1;

impl BinaryEncodable for ExtensionObject {
    fn byte_len(&self, ctx: &Context<'_>) -> usize {
        let mut size = self.type_id.byte_len(ctx) + 1;
        if !self.body.is_null() {
            size += self.body.byte_len(ctx);
        }
        size
    }

    fn encode<S: Write + ?Sized>(&self, stream: &mut S, ctx: &Context<'_>) -> EncodingResult<()> {
        self.type_id.encode(stream, ctx)?;
        if self.body.is_null() {
            ENCODING_NONE.encode(stream, ctx)
        } else {
            ENCODING_BINARY.encode(stream, ctx)?;
            self.body.encode(stream, ctx)
        }
    }
}

impl BinaryDecodable for ExtensionObject {
    fn decode<S: Read + ?Sized>(stream: &mut S, ctx: &Context<'_>) -> EncodingResult<Self> {
        let type_id = NodeId::decode(stream, ctx)?;
        let encoding = u8::decode(stream, ctx)?;
        let body = match encoding {
            ENCODING_NONE => ByteString::null(),
            ENCODING_BINARY => ByteString::decode(stream, ctx)?,
            other => {
                return Err(Error::decoding(format!(
                    "unsupported ExtensionObject body encoding {other}"
                )))
            }
        };
        Ok(Self { type_id, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::namespaces::NamespaceMap;

    fn ctx() -> Context<'static> {
        static NS: std::sync::OnceLock<NamespaceMap> = std::sync::OnceLock::new();
        Context::new(NS.get_or_init(NamespaceMap::new))
    }

    #[test]
    fn null_roundtrip() {
        let ctx = ctx();
        let obj = ExtensionObject::null();
        let bytes = obj.to_bytes(&ctx).unwrap();
        let mut cur = std::io::Cursor::new(bytes);
        assert_eq!(ExtensionObject::decode(&mut cur, &ctx).unwrap(), obj);
    }

    #[test]
    fn wraps_and_decodes_inner_value() {
        let ctx = ctx();
        let type_id = NodeId::new(1, 42u32);
        let inner: i32 = -99;
        let obj = ExtensionObject::from_encodable(type_id.clone(), &inner, &ctx).unwrap();
        let bytes = obj.to_bytes(&ctx).unwrap();
        let mut cur = std::io::Cursor::new(bytes);
        let back = ExtensionObject::decode(&mut cur, &ctx).unwrap();
        assert_eq!(back.type_id, type_id);
        let decoded: i32 = back.decode_inner(&ctx).unwrap();
        assert_eq!(decoded, inner);
    }
}
