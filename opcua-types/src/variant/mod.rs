// OPCUA for Rust
// SPDX-License-Identifier: MPL-2.0

//! `Variant`: the dynamically-typed value at the heart of the type system,
//! plus the [`DataTypeDescriptor`] reflection record the codec's generated
//! types register themselves under.

use std::io::{Read, Write};

use crate::{
    byte_string::ByteString,
    encoding::{BinaryDecodable, BinaryEncodable, Context, EncodingResult},
    errors::DepthLock,
    guid::Guid,
    localized_text::LocalizedText,
    node_id::NodeId,
    qualified_name::QualifiedName,
    status_code::StatusCode,
    string::UAString,
    Error, UaNullable,
};

mod extension_object;
pub use extension_object::ExtensionObject;

/// Discriminant identifying a Variant's scalar builtin type; the low 6 bits
/// of the wire encoding mask.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum VariantScalarTypeId {
    /// No value.
    Null = 0,
    /// `bool`.
    Boolean = 1,
    /// `i8`.
    SByte = 2,
    /// `u8`.
    Byte = 3,
    /// `i16`.
    Int16 = 4,
    /// `u16`.
    UInt16 = 5,
    /// `i32`.
    Int32 = 6,
    /// `u32`.
    UInt32 = 7,
    /// `i64`.
    Int64 = 8,
    /// `u64`.
    UInt64 = 9,
    /// `f32`.
    Float = 10,
    /// `f64`.
    Double = 11,
    /// `UAString`.
    String = 12,
    /// OPC UA DateTime (100ns ticks since 1601-01-01), stored as `i64`.
    DateTime = 13,
    /// `Guid`.
    Guid = 14,
    /// `ByteString`.
    ByteString = 15,
    /// `NodeId`.
    NodeId = 17,
    /// `StatusCode`.
    StatusCode = 19,
    /// `QualifiedName`.
    QualifiedName = 20,
    /// `LocalizedText`.
    LocalizedText = 21,
}

impl VariantScalarTypeId {
    fn from_bits(bits: u8) -> Option<Self> {
        use VariantScalarTypeId::*;
        Some(match bits {
            0 => Null,
            1 => Boolean,
            2 => SByte,
            3 => Byte,
            4 => Int16,
            5 => UInt16,
            6 => Int32,
            7 => UInt32,
            8 => Int64,
            9 => UInt64,
            10 => Float,
            11 => Double,
            12 => String,
            13 => DateTime,
            14 => Guid,
            15 => ByteString,
            17 => NodeId,
            19 => StatusCode,
            20 => QualifiedName,
            21 => LocalizedText,
            _ => return None,
        })
    }
}

const ARRAY_VALUES_BIT: u8 = 0x80;
const ARRAY_DIMENSIONS_BIT: u8 = 0x40;
const TYPE_ID_MASK: u8 = 0x3F;

/// A single-dimension (optionally reshaped) homogeneous array of scalar Variants.
#[derive(Debug, Clone, PartialEq)]
pub struct VariantArray {
    /// Scalar type shared by every element.
    pub type_id: VariantScalarTypeId,
    /// Flat element list.
    pub elements: Vec<Variant>,
    /// Optional multi-dimensional shape; when present its product must equal
    /// `elements.len()`.
    pub dimensions: Option<Vec<u32>>,
}

/// Whether a Variant owns its storage or borrows from somewhere that will
/// outlive it. Implementations without FFI interop can treat every Variant
/// as owned; the bit is retained so downstream node managers that wrap
/// externally-owned buffers can express the distinction described in §3.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StorageDiscipline {
    /// Variant owns and will drop its storage.
    #[default]
    Owned,
    /// Variant borrows storage the caller guarantees will outlive it, and
    /// must never free it.
    BorrowedNoDelete,
}

/// A dynamically-typed value: a scalar or array of one builtin type.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Variant {
    /// No value.
    #[default]
    Empty,
    /// Boolean.
    Boolean(bool),
    /// Signed byte.
    SByte(i8),
    /// Unsigned byte.
    Byte(u8),
    /// Signed 16-bit integer.
    Int16(i16),
    /// Unsigned 16-bit integer.
    UInt16(u16),
    /// Signed 32-bit integer.
    Int32(i32),
    /// Unsigned 32-bit integer.
    UInt32(u32),
    /// Signed 64-bit integer.
    Int64(i64),
    /// Unsigned 64-bit integer.
    UInt64(u64),
    /// 32-bit float.
    Float(f32),
    /// 64-bit float.
    Double(f64),
    /// UTF-8 string.
    String(UAString),
    /// 100ns ticks since 1601-01-01.
    DateTime(i64),
    /// GUID.
    Guid(Box<Guid>),
    /// Octet string.
    ByteString(ByteString),
    /// Node address.
    NodeId(Box<NodeId>),
    /// Result/severity code.
    StatusCode(StatusCode),
    /// Namespace-scoped name.
    QualifiedName(Box<QualifiedName>),
    /// Locale-tagged text.
    LocalizedText(Box<LocalizedText>),
    /// Homogeneous array, optionally reshaped.
    Array(Box<VariantArray>),
}

impl UaNullable for Variant {
    fn is_ua_null(&self) -> bool {
        matches!(self, Variant::Empty)
    }
}

impl Variant {
    /// The builtin type discriminant of this value (for a scalar) or of its
    /// elements (for an array).
    pub fn scalar_type_id(&self) -> VariantScalarTypeId {
        use VariantScalarTypeId as T;
        match self {
            Variant::Empty => T::Null,
            Variant::Boolean(_) => T::Boolean,
            Variant::SByte(_) => T::SByte,
            Variant::Byte(_) => T::Byte,
            Variant::Int16(_) => T::Int16,
            Variant::UInt16(_) => T::UInt16,
            Variant::Int32(_) => T::Int32,
            Variant::UInt32(_) => T::UInt32,
            Variant::Int64(_) => T::Int64,
            Variant::UInt64(_) => T::UInt64,
            Variant::Float(_) => T::Float,
            Variant::Double(_) => T::Double,
            Variant::String(_) => T::String,
            Variant::DateTime(_) => T::DateTime,
            Variant::Guid(_) => T::Guid,
            Variant::ByteString(_) => T::ByteString,
            Variant::NodeId(_) => T::NodeId,
            Variant::StatusCode(_) => T::StatusCode,
            Variant::QualifiedName(_) => T::QualifiedName,
            Variant::LocalizedText(_) => T::LocalizedText,
            Variant::Array(a) => a.type_id,
        }
    }

    /// True if this is an array.
    pub fn is_array(&self) -> bool {
        matches!(self, Variant::Array(_))
    }

    fn encode_scalar_value<S: Write + ?Sized>(
        &self,
        stream: &mut S,
        ctx: &Context<'_>,
    ) -> EncodingResult<()> {
        match self {
            Variant::Empty => Ok(()),
            Variant::Boolean(v) => v.encode(stream, ctx),
            Variant::SByte(v) => (*v as u8).encode(stream, ctx),
            Variant::Byte(v) => v.encode(stream, ctx),
            Variant::Int16(v) => v.encode(stream, ctx),
            Variant::UInt16(v) => v.encode(stream, ctx),
            Variant::Int32(v) => v.encode(stream, ctx),
            Variant::UInt32(v) => v.encode(stream, ctx),
            Variant::Int64(v) => v.encode(stream, ctx),
            Variant::UInt64(v) => v.encode(stream, ctx),
            Variant::Float(v) => v.encode(stream, ctx),
            Variant::Double(v) => v.encode(stream, ctx),
            Variant::String(v) => v.encode(stream, ctx),
            Variant::DateTime(v) => v.encode(stream, ctx),
            Variant::Guid(v) => v.encode(stream, ctx),
            Variant::ByteString(v) => v.encode(stream, ctx),
            Variant::NodeId(v) => v.encode(stream, ctx),
            Variant::StatusCode(v) => v.encode(stream, ctx),
            Variant::QualifiedName(v) => v.encode(stream, ctx),
            Variant::LocalizedText(v) => v.encode(stream, ctx),
            Variant::Array(_) => unreachable!("array elements are scalar"),
        }
    }

    fn scalar_byte_len(&self, ctx: &Context<'_>) -> usize {
        match self {
            Variant::Empty => 0,
            Variant::Boolean(v) => v.byte_len(ctx),
            Variant::SByte(_) => 1,
            Variant::Byte(v) => v.byte_len(ctx),
            Variant::Int16(v) => v.byte_len(ctx),
            Variant::UInt16(v) => v.byte_len(ctx),
            Variant::Int32(v) => v.byte_len(ctx),
            Variant::UInt32(v) => v.byte_len(ctx),
            Variant::Int64(v) => v.byte_len(ctx),
            Variant::UInt64(v) => v.byte_len(ctx),
            Variant::Float(v) => v.byte_len(ctx),
            Variant::Double(v) => v.byte_len(ctx),
            Variant::String(v) => v.byte_len(ctx),
            Variant::DateTime(v) => v.byte_len(ctx),
            Variant::Guid(v) => v.byte_len(ctx),
            Variant::ByteString(v) => v.byte_len(ctx),
            Variant::NodeId(v) => v.byte_len(ctx),
            Variant::StatusCode(v) => v.byte_len(ctx),
            Variant::QualifiedName(v) => v.byte_len(ctx),
            Variant::LocalizedText(v) => v.byte_len(ctx),
            Variant::Array(_) => unreachable!("array elements are scalar"),
        }
    }

    fn decode_scalar_value<S: Read + ?Sized>(
        stream: &mut S,
        type_id: VariantScalarTypeId,
        ctx: &Context<'_>,
    ) -> EncodingResult<Variant> {
        use VariantScalarTypeId as T;
        Ok(match type_id {
            T::Null => Variant::Empty,
            T::Boolean => Variant::Boolean(bool::decode(stream, ctx)?),
            T::SByte => Variant::SByte(u8::decode(stream, ctx)? as i8),
            T::Byte => Variant::Byte(u8::decode(stream, ctx)?),
            T::Int16 => Variant::Int16(i16::decode(stream, ctx)?),
            T::UInt16 => Variant::UInt16(u16::decode(stream, ctx)?),
            T::Int32 => Variant::Int32(i32::decode(stream, ctx)?),
            T::UInt32 => Variant::UInt32(u32::decode(stream, ctx)?),
            T::Int64 => Variant::Int64(i64::decode(stream, ctx)?),
            T::UInt64 => Variant::UInt64(u64::decode(stream, ctx)?),
            T::Float => Variant::Float(f32::decode(stream, ctx)?),
            T::Double => Variant::Double(f64::decode(stream, ctx)?),
            T::String => Variant::String(UAString::decode(stream, ctx)?),
            T::DateTime => Variant::DateTime(i64::decode(stream, ctx)?),
            T::Guid => Variant::Guid(Box::new(Guid::decode(stream, ctx)?)),
            T::ByteString => Variant::ByteString(ByteString::decode(stream, ctx)?),
            T::NodeId => Variant::NodeId(Box::new(NodeId::decode(stream, ctx)?)),
            T::StatusCode => Variant::StatusCode(StatusCode::decode(stream, ctx)?),
            T::QualifiedName => Variant::QualifiedName(Box::new(QualifiedName::decode(stream, ctx)?)),
            T::LocalizedText => Variant::LocalizedText(Box::new(LocalizedText::decode(stream, ctx)?)),
        })
    }
}

impl BinaryEncodable for Variant {
    fn byte_len(&self, ctx: &Context<'_>) -> usize {
        match self {
            Variant::Array(a) => {
                let mut size = 1 + 4;
                for e in &a.elements {
                    size += e.scalar_byte_len(ctx);
                }
                if let Some(dims) = &a.dimensions {
                    size += 4 + dims.len() * 4;
                }
                size
            }
            other => 1 + other.scalar_byte_len(ctx),
        }
    }

    fn encode<S: Write + ?Sized>(&self, stream: &mut S, ctx: &Context<'_>) -> EncodingResult<()> {
        match self {
            Variant::Array(a) => {
                let mut mask = a.type_id as u8 | ARRAY_VALUES_BIT;
                if a.dimensions.is_some() {
                    mask |= ARRAY_DIMENSIONS_BIT;
                }
                mask.encode(stream, ctx)?;
                (a.elements.len() as i32).encode(stream, ctx)?;
                for e in &a.elements {
                    e.encode_scalar_value(stream, ctx)?;
                }
                if let Some(dims) = &a.dimensions {
                    (dims.len() as i32).encode(stream, ctx)?;
                    for d in dims {
                        d.encode(stream, ctx)?;
                    }
                }
                Ok(())
            }
            other => {
                let mask = other.scalar_type_id() as u8;
                mask.encode(stream, ctx)?;
                other.encode_scalar_value(stream, ctx)
            }
        }
    }
}

impl BinaryDecodable for Variant {
    fn decode<S: Read + ?Sized>(stream: &mut S, ctx: &Context<'_>) -> EncodingResult<Self> {
        let _depth = DepthLock::obtain(&ctx.options.depth_gauge)?;
        let mask = u8::decode(stream, ctx)?;
        let is_array = mask & ARRAY_VALUES_BIT != 0;
        let has_dims = mask & ARRAY_DIMENSIONS_BIT != 0;
        let type_id = VariantScalarTypeId::from_bits(mask & TYPE_ID_MASK)
            .ok_or_else(|| Error::decoding(format!("unrecognized Variant type id {}", mask & TYPE_ID_MASK)))?;

        if !is_array {
            return Variant::decode_scalar_value(stream, type_id, ctx);
        }

        let len = i32::decode(stream, ctx)?;
        if len < 0 {
            return Ok(Variant::Array(Box::new(VariantArray {
                type_id,
                elements: Vec::new(),
                dimensions: None,
            })));
        }
        let len = len as usize;
        if ctx.options.max_array_length != 0 && len > ctx.options.max_array_length {
            return Err(Error::decoding(format!(
                "array length {} exceeds configured max {}",
                len, ctx.options.max_array_length
            )));
        }
        let mut elements = Vec::with_capacity(len.min(4096));
        for _ in 0..len {
            elements.push(Variant::decode_scalar_value(stream, type_id, ctx)?);
        }
        let dimensions = if has_dims {
            let dim_len = i32::decode(stream, ctx)?;
            if dim_len < 0 {
                None
            } else {
                let dim_len = dim_len as usize;
                if ctx.options.max_array_length != 0 && dim_len > ctx.options.max_array_length {
                    return Err(Error::decoding("array dimensions length exceeds configured max"));
                }
                let mut dims = Vec::with_capacity(dim_len.min(64));
                for _ in 0..dim_len {
                    dims.push(u32::decode(stream, ctx)?);
                }
                Some(dims)
            }
        } else {
            None
        };
        Ok(Variant::Array(Box::new(VariantArray {
            type_id,
            elements,
            dimensions,
        })))
    }
}

macro_rules! variant_from {
    ($variant:ident, $t:ty) => {
        impl From<$t> for Variant {
            fn from(value: $t) -> Self {
                Variant::$variant(value)
            }
        }
    };
}
variant_from!(Boolean, bool);
variant_from!(SByte, i8);
variant_from!(Byte, u8);
variant_from!(Int16, i16);
variant_from!(UInt16, u16);
variant_from!(Int32, i32);
variant_from!(UInt32, u32);
variant_from!(Int64, i64);
variant_from!(UInt64, u64);
variant_from!(Float, f32);
variant_from!(Double, f64);
variant_from!(StatusCode, StatusCode);

impl From<&str> for Variant {
    fn from(value: &str) -> Self {
        Variant::String(UAString::from(value))
    }
}

/// Kind of structured type a [`DataTypeDescriptor`] reflects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataTypeKind {
    /// One of the builtin scalar types above.
    Builtin,
    /// An enumeration backed by `i32`.
    Enum,
    /// A plain structure.
    Struct,
    /// A structure with one or more optional fields (encoding-mask prefixed).
    OptStruct,
    /// A tagged union.
    Union,
}

/// One member of a structured type, as reflected by [`DataTypeDescriptor`].
#[derive(Debug, Clone)]
pub struct MemberDescriptor {
    /// Field name, matching the generated Rust struct field.
    pub name: &'static str,
    /// Name of the member's own type, for diagnostics.
    pub type_name: &'static str,
    /// True if the member is `Option<Vec<T>>`.
    pub is_array: bool,
    /// True if the member is optional (OptStruct only).
    pub is_optional: bool,
}

/// Runtime reflection record for a structured type: the binary encoding id,
/// kind, and ordered member list that lets generic code (diagnostics,
/// ExtensionObject dispatch) introspect a type without matching on it.
///
/// The actual encode/decode dispatch does not walk this table — the
/// `opcua-codegen`-emitted types in [`crate::generated`] implement
/// [`crate::BinaryEncodable`]/[`crate::BinaryDecodable`] directly, the same
/// way the teacher's `#[derive(BinaryEncodable)]` macro expands to direct
/// field-by-field code rather than a runtime walk. This descriptor exists
/// for the reflection use cases in the spec: a decoder picking a type by
/// `binary_encoding_id`, and a human inspecting "what does this type look
/// like".
#[derive(Debug, Clone)]
pub struct DataTypeDescriptor {
    /// NodeId of the abstract DataType node.
    pub type_id: NodeId,
    /// NodeId of the `...Encoding_DefaultBinary` object used to tag
    /// ExtensionObjects of this type.
    pub binary_encoding_id: NodeId,
    /// Structural kind.
    pub kind: DataTypeKind,
    /// True if the type contains no owned heap pointers (NodeId/String/etc
    /// disqualify it).
    pub pointer_free: bool,
    /// Ordered member list.
    pub members: &'static [MemberDescriptor],
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
    fn scalar_roundtrip() {
        let ctx = ctx();
        for v in [
            Variant::Empty,
            Variant::Boolean(true),
            Variant::Int32(-7),
            Variant::Double(1.5),
            Variant::String(UAString::from("hi")),
            Variant::StatusCode(StatusCode::BadTimeout),
        ] {
            let bytes = v.to_bytes(&ctx).unwrap();
            let mut cur = std::io::Cursor::new(bytes);
            assert_eq!(Variant::decode(&mut cur, &ctx).unwrap(), v);
        }
    }

    #[test]
    fn array_roundtrip_with_dimensions() {
        let ctx = ctx();
        let v = Variant::Array(Box::new(VariantArray {
            type_id: VariantScalarTypeId::Int32,
            elements: vec![Variant::Int32(1), Variant::Int32(2), Variant::Int32(3), Variant::Int32(4)],
            dimensions: Some(vec![2, 2]),
        }));
        let bytes = v.to_bytes(&ctx).unwrap();
        let mut cur = std::io::Cursor::new(bytes);
        assert_eq!(Variant::decode(&mut cur, &ctx).unwrap(), v);
    }

    #[test]
    fn unrecognized_type_id_is_bad_decoding() {
        let ctx = ctx();
        let mut cur = std::io::Cursor::new(vec![0x3Fu8]);
        let err = Variant::decode(&mut cur, &ctx).unwrap_err();
        assert_eq!(err.status(), StatusCode::BadDecoding);
    }
}
