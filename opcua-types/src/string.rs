// OPCUA for Rust
// SPDX-License-Identifier: MPL-2.0

//! `UAString`: a UTF-8 string distinguishing "null" from "empty", matching
//! the OPC UA wire encoding (`-1` length prefix for null).

use std::fmt;

use crate::encoding::{BinaryDecodable, BinaryEncodable, Context, EncodingResult, UaNullable};
use crate::{Error, StatusCode};

/// OPC UA string: named `UAString` to avoid colliding with `std::string::String`.
/// Null is distinct from empty.
#[derive(Eq, PartialEq, Debug, Clone, Hash, Default)]
pub struct UAString {
    value: Option<String>,
}

impl fmt::Display for UAString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.value {
            Some(v) => write!(f, "{v}"),
            None => write!(f, "[null]"),
        }
    }
}

impl UaNullable for UAString {
    fn is_ua_null(&self) -> bool {
        self.is_null()
    }
}

impl UAString {
    /// The null string.
    pub fn null() -> Self {
        Self { value: None }
    }

    /// True if this is the null string (distinct from an empty one).
    pub fn is_null(&self) -> bool {
        self.value.is_none()
    }

    /// True if this is null or has zero length.
    pub fn is_empty(&self) -> bool {
        self.value.as_ref().map(|v| v.is_empty()).unwrap_or(true)
    }

    /// Borrow the contents as `&str`, or `""` if null.
    pub fn as_ref(&self) -> &str {
        self.value.as_deref().unwrap_or("")
    }

    /// Length in bytes, or 0 if null.
    pub fn len(&self) -> usize {
        self.value.as_ref().map(|v| v.len()).unwrap_or(0)
    }
}

impl From<&str> for UAString {
    fn from(value: &str) -> Self {
        Self {
            value: Some(value.to_string()),
        }
    }
}

impl From<String> for UAString {
    fn from(value: String) -> Self {
        Self { value: Some(value) }
    }
}

impl From<Option<String>> for UAString {
    fn from(value: Option<String>) -> Self {
        Self { value }
    }
}

impl BinaryEncodable for UAString {
    fn byte_len(&self, _ctx: &Context<'_>) -> usize {
        4 + self.len()
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
                stream.write_all(v.as_bytes()).map_err(Error::from)
            }
        }
    }
}

impl BinaryDecodable for UAString {
    fn decode<S: std::io::Read + ?Sized>(
        stream: &mut S,
        ctx: &Context<'_>,
    ) -> EncodingResult<Self> {
        let len = i32::decode(stream, ctx)?;
        if len < 0 {
            return Ok(UAString::null());
        }
        let len = len as usize;
        if ctx.options.max_string_length != 0 && len > ctx.options.max_string_length {
            return Err(Error::new(
                StatusCode::BadDecoding,
                format!(
                    "string length {} exceeds configured max {}",
                    len, ctx.options.max_string_length
                ),
            ));
        }
        let mut buf = vec![0u8; len];
        stream.read_exact(&mut buf).map_err(Error::from)?;
        let s = String::from_utf8(buf)
            .map_err(|e| Error::new(StatusCode::BadDecoding, e))?;
        Ok(UAString::from(s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::namespaces::NamespaceMap;

    #[test]
    fn null_is_distinct_from_empty() {
        assert!(UAString::null().is_null());
        assert!(!UAString::from("").is_null());
        assert!(UAString::from("").is_empty());
    }

    #[test]
    fn roundtrip() {
        let ns = NamespaceMap::new();
        let ctx = Context::new(&ns);
        for s in [UAString::null(), UAString::from(""), UAString::from("hello")] {
            let bytes = s.to_bytes(&ctx).unwrap();
            let mut cur = std::io::Cursor::new(bytes);
            assert_eq!(UAString::decode(&mut cur, &ctx).unwrap(), s);
        }
    }

    #[test]
    fn truncated_string_is_bad_decoding_not_truncation_panic() {
        let ns = NamespaceMap::new();
        let ctx = Context::new(&ns);
        // claims 10 bytes, supplies 2
        let mut bytes = 10i32.to_le_bytes().to_vec();
        bytes.extend_from_slice(b"hi");
        let mut cur = std::io::Cursor::new(bytes);
        let err = UAString::decode(&mut cur, &ctx).unwrap_err();
        assert_eq!(err.status(), StatusCode::BadDecoding);
    }
}
