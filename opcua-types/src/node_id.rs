// OPCUA for Rust
// SPDX-License-Identifier: MPL-2.0

//! `NodeId`: the universal addressing primitive of the information model.

use std::{cmp::Ordering, fmt};

use crate::{
    byte_string::ByteString,
    encoding::{BinaryDecodable, BinaryEncodable, Context, EncodingResult, UaNullable},
    guid::Guid,
    string::UAString,
    Error, StatusCode,
};

/// The kind of identifier carried by a [`NodeId`].
#[derive(Eq, PartialEq, Clone, Debug, Hash)]
pub enum Identifier {
    /// Numeric identifier, `i=123`.
    Numeric(u32),
    /// String identifier, `s=...`.
    String(UAString),
    /// GUID identifier, `g=...`.
    Guid(Guid),
    /// Opaque byte string identifier, `b=...`.
    ByteString(ByteString),
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Identifier::Numeric(v) => write!(f, "i={v}"),
            Identifier::String(v) => write!(f, "s={v}"),
            Identifier::Guid(v) => write!(f, "g={v}"),
            Identifier::ByteString(v) => write!(f, "b={}", v.as_base64()),
        }
    }
}

/// Ordinal used for [`NodeId`]'s total order: groups by identifier kind
/// before comparing values, per the data model's "(namespace, kind, identifier)" rule.
fn identifier_kind_rank(id: &Identifier) -> u8 {
    match id {
        Identifier::Numeric(_) => 0,
        Identifier::String(_) => 1,
        Identifier::Guid(_) => 2,
        Identifier::ByteString(_) => 3,
    }
}

/// Addresses a node (or, more generally, any identifier) within a namespace.
#[derive(Eq, PartialEq, Clone, Debug, Hash)]
pub struct NodeId {
    /// Index into the active [`crate::NamespaceMap`].
    pub namespace: u16,
    /// The identifier itself.
    pub identifier: Identifier,
}

impl Default for NodeId {
    fn default() -> Self {
        NodeId::null()
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.namespace != 0 {
            write!(f, "ns={};{}", self.namespace, self.identifier)
        } else {
            write!(f, "{}", self.identifier)
        }
    }
}

impl UaNullable for NodeId {
    fn is_ua_null(&self) -> bool {
        self.is_null()
    }
}

impl PartialOrd for NodeId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for NodeId {
    fn cmp(&self, other: &Self) -> Ordering {
        self.namespace
            .cmp(&other.namespace)
            .then_with(|| identifier_kind_rank(&self.identifier).cmp(&identifier_kind_rank(&other.identifier)))
            .then_with(|| match (&self.identifier, &other.identifier) {
                (Identifier::Numeric(a), Identifier::Numeric(b)) => a.cmp(b),
                (Identifier::String(a), Identifier::String(b)) => a.as_ref().cmp(b.as_ref()),
                (Identifier::Guid(a), Identifier::Guid(b)) => a.to_string().cmp(&b.to_string()),
                (Identifier::ByteString(a), Identifier::ByteString(b)) => {
                    a.as_bytes().cmp(b.as_bytes())
                }
                _ => Ordering::Equal,
            })
    }
}

/// Anything convertible to a [`NodeId`]'s identifier.
pub trait IntoIdentifier {
    /// Build the identifier.
    fn into_identifier(self) -> Identifier;
}

impl IntoIdentifier for u32 {
    fn into_identifier(self) -> Identifier {
        Identifier::Numeric(self)
    }
}
impl IntoIdentifier for &str {
    fn into_identifier(self) -> Identifier {
        Identifier::String(UAString::from(self))
    }
}
impl IntoIdentifier for String {
    fn into_identifier(self) -> Identifier {
        Identifier::String(UAString::from(self))
    }
}
impl IntoIdentifier for UAString {
    fn into_identifier(self) -> Identifier {
        Identifier::String(self)
    }
}
impl IntoIdentifier for Guid {
    fn into_identifier(self) -> Identifier {
        Identifier::Guid(self)
    }
}
impl IntoIdentifier for ByteString {
    fn into_identifier(self) -> Identifier {
        Identifier::ByteString(self)
    }
}

impl NodeId {
    /// Build a NodeId from a namespace index and anything identifier-like.
    pub fn new<T: IntoIdentifier>(namespace: u16, value: T) -> Self {
        Self {
            namespace,
            identifier: value.into_identifier(),
        }
    }

    /// The null NodeId: namespace 0, numeric identifier 0.
    pub fn null() -> Self {
        NodeId::new(0, 0u32)
    }

    /// True if this is the null NodeId.
    pub fn is_null(&self) -> bool {
        matches!(&self.identifier, Identifier::Numeric(0)) && self.namespace == 0
    }

    /// Parse the `ns=<n>;i=<v>` / `ns=<n>;s=<v>` / `ns=<n>;g=<v>` / `ns=<n>;b=<v>` string form.
    pub fn from_str_form(s: &str) -> EncodingResult<Self> {
        let mut namespace = 0u16;
        let mut rest = s;
        if let Some(stripped) = s.strip_prefix("ns=") {
            let (ns_part, remainder) = stripped
                .split_once(';')
                .ok_or_else(|| Error::decoding("missing ';' in NodeId string form"))?;
            namespace = ns_part
                .parse()
                .map_err(|_| Error::decoding("invalid namespace index in NodeId string form"))?;
            rest = remainder;
        }
        let identifier = if let Some(v) = rest.strip_prefix("i=") {
            Identifier::Numeric(
                v.parse()
                    .map_err(|_| Error::decoding("invalid numeric identifier"))?,
            )
        } else if let Some(v) = rest.strip_prefix("s=") {
            Identifier::String(UAString::from(v))
        } else if let Some(v) = rest.strip_prefix("g=") {
            Identifier::Guid(
                Guid::parse(v).map_err(|_| Error::decoding("invalid guid identifier"))?,
            )
        } else if let Some(v) = rest.strip_prefix("b=") {
            Identifier::ByteString(
                ByteString::from_base64(v)
                    .map_err(|_| Error::decoding("invalid byte string identifier"))?,
            )
        } else {
            return Err(Error::decoding("unrecognized NodeId identifier prefix"));
        };
        Ok(NodeId {
            namespace,
            identifier,
        })
    }
}

impl BinaryEncodable for NodeId {
    fn byte_len(&self, ctx: &Context<'_>) -> usize {
        1 + match &self.identifier {
            Identifier::Numeric(v) => {
                if self.namespace == 0 && *v <= 255 {
                    1
                } else if self.namespace <= 255 && *v <= 65535 {
                    3
                } else {
                    6
                }
            }
            Identifier::String(v) => 2 + v.byte_len(ctx),
            Identifier::Guid(v) => 2 + v.byte_len(ctx),
            Identifier::ByteString(v) => 2 + v.byte_len(ctx),
        }
    }

    fn encode<S: std::io::Write + ?Sized>(
        &self,
        stream: &mut S,
        ctx: &Context<'_>,
    ) -> EncodingResult<()> {
        match &self.identifier {
            Identifier::Numeric(value) => {
                if self.namespace == 0 && *value <= 255 {
                    0x0u8.encode(stream, ctx)?;
                    (*value as u8).encode(stream, ctx)
                } else if self.namespace <= 255 && *value <= 65535 {
                    0x1u8.encode(stream, ctx)?;
                    (self.namespace as u8).encode(stream, ctx)?;
                    (*value as u16).encode(stream, ctx)
                } else {
                    0x2u8.encode(stream, ctx)?;
                    self.namespace.encode(stream, ctx)?;
                    value.encode(stream, ctx)
                }
            }
            Identifier::String(value) => {
                0x3u8.encode(stream, ctx)?;
                self.namespace.encode(stream, ctx)?;
                value.encode(stream, ctx)
            }
            Identifier::Guid(value) => {
                0x4u8.encode(stream, ctx)?;
                self.namespace.encode(stream, ctx)?;
                value.encode(stream, ctx)
            }
            Identifier::ByteString(value) => {
                0x5u8.encode(stream, ctx)?;
                self.namespace.encode(stream, ctx)?;
                value.encode(stream, ctx)
            }
        }
    }
}

impl BinaryDecodable for NodeId {
    fn decode<S: std::io::Read + ?Sized>(
        stream: &mut S,
        ctx: &Context<'_>,
    ) -> EncodingResult<Self> {
        let encoding_byte = u8::decode(stream, ctx)?;
        Ok(match encoding_byte {
            0x0 => NodeId::new(0, u32::from(u8::decode(stream, ctx)?)),
            0x1 => {
                let namespace = u8::decode(stream, ctx)?;
                let value = u16::decode(stream, ctx)?;
                NodeId::new(u16::from(namespace), u32::from(value))
            }
            0x2 => {
                let namespace = u16::decode(stream, ctx)?;
                let value = u32::decode(stream, ctx)?;
                NodeId::new(namespace, value)
            }
            0x3 => {
                let namespace = u16::decode(stream, ctx)?;
                NodeId::new(namespace, UAString::decode(stream, ctx)?)
            }
            0x4 => {
                let namespace = u16::decode(stream, ctx)?;
                NodeId::new(namespace, Guid::decode(stream, ctx)?)
            }
            0x5 => {
                let namespace = u16::decode(stream, ctx)?;
                NodeId::new(namespace, ByteString::decode(stream, ctx)?)
            }
            other => {
                return Err(Error::new(
                    StatusCode::BadDecoding,
                    format!("unrecognized NodeId encoding byte {other}"),
                ))
            }
        })
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
    fn compact_two_byte_form_roundtrips() {
        let ctx = ctx();
        let id = NodeId::new(0, 5u32);
        let bytes = id.to_bytes(&ctx).unwrap();
        assert_eq!(bytes, vec![0x0, 5]);
        let mut cur = std::io::Cursor::new(bytes);
        assert_eq!(NodeId::decode(&mut cur, &ctx).unwrap(), id);
    }

    #[test]
    fn string_form_roundtrips_through_display_and_parse() {
        let id = NodeId::new(1, "MyNode");
        let s = id.to_string();
        assert_eq!(s, "ns=1;s=MyNode");
        assert_eq!(NodeId::from_str_form(&s).unwrap(), id);
    }

    #[test]
    fn total_order_groups_by_namespace_then_kind() {
        let a = NodeId::new(0, 1u32);
        let b = NodeId::new(0, "a");
        let c = NodeId::new(1, 0u32);
        assert!(a < b);
        assert!(b < c);
    }

    #[test]
    fn full_numeric_form_roundtrips() {
        let ctx = ctx();
        let id = NodeId::new(300, 70000u32);
        let bytes = id.to_bytes(&ctx).unwrap();
        assert_eq!(bytes[0], 0x2);
        let mut cur = std::io::Cursor::new(bytes);
        assert_eq!(NodeId::decode(&mut cur, &ctx).unwrap(), id);
    }
}
