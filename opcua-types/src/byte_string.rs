// OPCUA for Rust
// SPDX-License-Identifier: MPL-2.0

//! `ByteString`: a length-prefixed, null-distinct-from-empty octet string.

use std::fmt;

use base64::Engine;

use crate::encoding::{BinaryDecodable, BinaryEncodable, Context, EncodingResult, UaNullable};
use crate::{Error, StatusCode};

/// OPC UA byte string. Null is distinct from empty, same as [`crate::UAString`].
#[derive(Eq, PartialEq, Debug, Clone, Hash, Default)]
pub struct ByteString {
    value: Option<Vec<u8>>,
}

impl fmt::Display for ByteString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_base64())
    }
}

impl UaNullable for ByteString {
    fn is_ua_null(&self) -> bool {
        self.is_null()
    }
}

impl ByteString {
    /// The null byte string.
    pub fn null() -> Self {
        Self { value: None }
    }

    /// True if null.
    pub fn is_null(&self) -> bool {
        self.value.is_none()
    }

    /// Borrow the bytes, or `&[]` if null.
    pub fn as_bytes(&self) -> &[u8] {
        self.value.as_deref().unwrap_or(&[])
    }

    /// Base64 representation, used by the reversible JSON form.
    pub fn as_base64(&self) -> String {
        base64::engine::general_purpose::STANDARD.encode(self.as_bytes())
    }

    /// Parse from a base64 string.
    pub fn from_base64(s: &str) -> Result<Self, base64::DecodeError> {
        Ok(ByteString::from(
            base64::engine::general_purpose::STANDARD.decode(s)?,
        ))
    }
}

impl From<Vec<u8>> for ByteString {
    fn from(value: Vec<u8>) -> Self {
        Self { value: Some(value) }
    }
}

impl From<&[u8]> for ByteString {
    fn from(value: &[u8]) -> Self {
        Self {
            value: Some(value.to_vec()),
        }
    }
}

impl BinaryEncodable for ByteString {
    fn byte_len(&self, _ctx: &Context<'_>) -> usize {
        4 + self.as_bytes().len()
    }

    fn encode<S: std::io::Write + ?Sized>(
        &self,
        stream: &mut S,
        ctx: &Context<'_>,
    ) -> EncodingResult<()> {
        match &self.value {
            None => (-1i32).encode(stream, ctx),
            Some(v) => {
                (v.len() as i32).encode(stream, ctx)?;
                stream.write_all(v).map_err(Error::from)
            }
        }
    }
}

impl BinaryDecodable for ByteString {
    fn decode<S: std::io::Read + ?Sized>(
        stream: &mut S,
        ctx: &Context<'_>,
    ) -> EncodingResult<Self> {
        let len = i32::decode(stream, ctx)?;
        if len < 0 {
            return Ok(ByteString::null());
        }
        let len = len as usize;
        if ctx.options.max_byte_string_length != 0 && len > ctx.options.max_byte_string_length {
            return Err(Error::new(
                StatusCode::BadDecoding,
                format!(
                    "byte string length {} exceeds configured max {}",
                    len, ctx.options.max_byte_string_length
                ),
            ));
        }
        let mut buf = vec![0u8; len];
        stream.read_exact(&mut buf).map_err(Error::from)?;
        Ok(ByteString::from(buf))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::namespaces::NamespaceMap;

    #[test]
    fn roundtrip() {
        let ns = NamespaceMap::new();
        let ctx = Context::new(&ns);
        for bs in [ByteString::null(), ByteString::from(vec![]), ByteString::from(vec![1, 2, 3])] {
            let bytes = bs.to_bytes(&ctx).unwrap();
            let mut cur = std::io::Cursor::new(bytes);
            assert_eq!(ByteString::decode(&mut cur, &ctx).unwrap(), bs);
        }
    }
}
