// OPCUA for Rust
// SPDX-License-Identifier: MPL-2.0

//! `Guid`: a 128-bit globally unique identifier, used for session ids and
//! the `g=...` NodeId identifier form.

use std::fmt;

use uuid::Uuid;

use crate::encoding::{BinaryDecodable, BinaryEncodable, Context, EncodingResult, UaNullable};
use crate::Error;

/// OPC UA GUID, wire-compatible with `uuid::Uuid`.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Default)]
pub struct Guid(Uuid);

impl fmt::Display for Guid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

impl UaNullable for Guid {
    fn is_ua_null(&self) -> bool {
        self.0.is_nil()
    }
}

impl Guid {
    /// Generate a new random (v4) GUID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// The nil GUID (all zero bits).
    pub fn nil() -> Self {
        Self(Uuid::nil())
    }

    /// Parse a GUID from its hyphenated string form.
    pub fn parse(s: &str) -> Result<Self, uuid::Error> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

impl From<Uuid> for Guid {
    fn from(value: Uuid) -> Self {
        Self(value)
    }
}

impl BinaryEncodable for Guid {
    fn byte_len(&self, _ctx: &Context<'_>) -> usize {
        16
    }

    fn encode<S: std::io::Write + ?Sized>(
        &self,
        stream: &mut S,
        _ctx: &Context<'_>,
    ) -> EncodingResult<()> {
        // OPC UA packs the GUID fields in mixed-endian form: data1/2/3 little
        // endian, data4 as raw bytes, matching `Uuid`'s own field accessors.
        let (d1, d2, d3, d4) = self.0.as_fields();
        stream.write_all(&d1.to_le_bytes()).map_err(Error::from)?;
        stream.write_all(&d2.to_le_bytes()).map_err(Error::from)?;
        stream.write_all(&d3.to_le_bytes()).map_err(Error::from)?;
        stream.write_all(d4).map_err(Error::from)
    }
}

impl BinaryDecodable for Guid {
    fn decode<S: std::io::Read + ?Sized>(
        stream: &mut S,
        _ctx: &Context<'_>,
    ) -> EncodingResult<Self> {
        let mut d1 = [0u8; 4];
        let mut d2 = [0u8; 2];
        let mut d3 = [0u8; 2];
        let mut d4 = [0u8; 8];
        stream.read_exact(&mut d1).map_err(Error::from)?;
        stream.read_exact(&mut d2).map_err(Error::from)?;
        stream.read_exact(&mut d3).map_err(Error::from)?;
        stream.read_exact(&mut d4).map_err(Error::from)?;
        Ok(Guid(Uuid::from_fields(
            u32::from_le_bytes(d1),
            u16::from_le_bytes(d2),
            u16::from_le_bytes(d3),
            &d4,
        )))
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
        let g = Guid::new();
        let bytes = g.to_bytes(&ctx).unwrap();
        assert_eq!(bytes.len(), 16);
        let mut cur = std::io::Cursor::new(bytes);
        assert_eq!(Guid::decode(&mut cur, &ctx).unwrap(), g);
    }
}
