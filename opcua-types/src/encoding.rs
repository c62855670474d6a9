// OPCUA for Rust
// SPDX-License-Identifier: MPL-2.0

//! The [`BinaryEncodable`]/[`BinaryDecodable`] traits and the scalar
//! read/write helpers every generated structured type is built from.

use std::io::{Read, Write};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use crate::{constants, errors::DepthGauge, namespaces::NamespaceMap, status_code::StatusCode, Error};

pub use crate::errors::EncodingResult;

/// Decoding limits threaded through every decode call. Lengths are validated
/// against these *before* any allocation, per the codec contract.
#[derive(Clone, Debug)]
pub struct DecodingOptions {
    /// Maximum size of a whole message in bytes. 0 means unlimited.
    pub max_message_size: usize,
    /// Maximum number of chunks composing one message. 0 means unlimited.
    pub max_chunk_count: usize,
    /// Maximum length in bytes of a string.
    pub max_string_length: usize,
    /// Maximum length in bytes of a byte string.
    pub max_byte_string_length: usize,
    /// Maximum number of elements in an array.
    pub max_array_length: usize,
    /// Recursion depth gauge for nested structures/Variants.
    pub depth_gauge: DepthGauge,
}

impl Default for DecodingOptions {
    fn default() -> Self {
        Self {
            max_message_size: constants::MAX_MESSAGE_SIZE,
            max_chunk_count: constants::MAX_CHUNK_COUNT,
            max_string_length: constants::MAX_STRING_LENGTH,
            max_byte_string_length: constants::MAX_BYTE_STRING_LENGTH,
            max_array_length: constants::MAX_ARRAY_LENGTH,
            depth_gauge: DepthGauge::default(),
        }
    }
}

impl DecodingOptions {
    /// Tight limits, useful for decoding an `ExtensionObject` payload that is
    /// not expected to hold much data.
    pub fn minimal() -> Self {
        Self {
            max_string_length: 8192,
            max_byte_string_length: 8192,
            max_array_length: 8192,
            depth_gauge: DepthGauge::new(8),
            ..Default::default()
        }
    }
}

/// Decoding/encoding context: the options above plus the namespace table
/// NodeId (de)serialization consults.
#[derive(Clone)]
pub struct Context<'a> {
    /// Active namespace table.
    pub namespaces: &'a NamespaceMap,
    /// Decoding limits.
    pub options: DecodingOptions,
}

impl<'a> Context<'a> {
    /// Build a context over the given namespace map with default options.
    pub fn new(namespaces: &'a NamespaceMap) -> Self {
        Self {
            namespaces,
            options: DecodingOptions::default(),
        }
    }

    /// Build a context with explicit options.
    pub fn with_options(namespaces: &'a NamespaceMap, options: DecodingOptions) -> Self {
        Self { namespaces, options }
    }
}

/// Indicates whether a value is the OPC UA "null"/default for its type, used
/// to decide whether to omit a field in non-reversible JSON.
pub trait UaNullable {
    /// True if this value may be omitted when encoding non-reversible JSON.
    fn is_ua_null(&self) -> bool {
        false
    }
}

impl<T: UaNullable> UaNullable for Option<T> {
    fn is_ua_null(&self) -> bool {
        self.as_ref().map(|v| v.is_ua_null()).unwrap_or(true)
    }
}

impl<T: UaNullable> UaNullable for Vec<T> {
    fn is_ua_null(&self) -> bool {
        self.is_empty()
    }
}

impl<T: UaNullable> UaNullable for Box<T> {
    fn is_ua_null(&self) -> bool {
        self.as_ref().is_ua_null()
    }
}

macro_rules! is_null_at_default {
    ($($t:ty),+) => {
        $(impl UaNullable for $t {
            fn is_ua_null(&self) -> bool {
                *self == <$t>::default()
            }
        })+
    };
}
is_null_at_default!(bool, u8, u16, u32, u64, i8, i16, i32, i64, f32, f64);
impl UaNullable for String {}

/// Anything that can serialize itself to the OPC UA binary form.
pub trait BinaryEncodable {
    /// Exact number of bytes `encode` will write.
    fn byte_len(&self, ctx: &Context<'_>) -> usize;

    /// Write the binary encoding to `stream`.
    fn encode<S: Write + ?Sized>(&self, stream: &mut S, ctx: &Context<'_>) -> EncodingResult<()>;

    /// Convenience: encode to an owned `Vec<u8>`.
    fn to_bytes(&self, ctx: &Context<'_>) -> EncodingResult<Vec<u8>> {
        let mut buf = Vec::with_capacity(self.byte_len(ctx));
        self.encode(&mut buf, ctx)?;
        Ok(buf)
    }
}

/// Anything that can deserialize itself from the OPC UA binary form.
///
/// Implementations MUST validate every length against `ctx.options` before
/// allocating memory for it.
pub trait BinaryDecodable: Sized {
    /// Read one value from `stream`.
    fn decode<S: Read + ?Sized>(stream: &mut S, ctx: &Context<'_>) -> EncodingResult<Self>;
}

macro_rules! impl_scalar {
    ($t:ty, $write:ident, $read:ident) => {
        impl BinaryEncodable for $t {
            fn byte_len(&self, _ctx: &Context<'_>) -> usize {
                std::mem::size_of::<$t>()
            }

            fn encode<S: Write + ?Sized>(
                &self,
                stream: &mut S,
                _ctx: &Context<'_>,
            ) -> EncodingResult<()> {
                stream.$write::<LittleEndian>(*self).map_err(Error::from)
            }
        }

        impl BinaryDecodable for $t {
            fn decode<S: Read + ?Sized>(
                stream: &mut S,
                _ctx: &Context<'_>,
            ) -> EncodingResult<Self> {
                stream.$read::<LittleEndian>().map_err(Error::from)
            }
        }
    };
}

impl_scalar!(u16, write_u16, read_u16);
impl_scalar!(i16, write_i16, read_i16);
impl_scalar!(u32, write_u32, read_u32);
impl_scalar!(i32, write_i32, read_i32);
impl_scalar!(u64, write_u64, read_u64);
impl_scalar!(i64, write_i64, read_i64);
impl_scalar!(f32, write_f32, read_f32);
impl_scalar!(f64, write_f64, read_f64);

impl BinaryEncodable for u8 {
    fn byte_len(&self, _ctx: &Context<'_>) -> usize {
        1
    }

    fn encode<S: Write + ?Sized>(&self, stream: &mut S, _ctx: &Context<'_>) -> EncodingResult<()> {
        stream.write_u8(*self).map_err(Error::from)
    }
}

impl BinaryDecodable for u8 {
    fn decode<S: Read + ?Sized>(stream: &mut S, _ctx: &Context<'_>) -> EncodingResult<Self> {
        stream.read_u8().map_err(Error::from)
    }
}

impl BinaryEncodable for bool {
    fn byte_len(&self, _ctx: &Context<'_>) -> usize {
        1
    }

    fn encode<S: Write + ?Sized>(&self, stream: &mut S, _ctx: &Context<'_>) -> EncodingResult<()> {
        stream.write_u8(u8::from(*self)).map_err(Error::from)
    }
}

impl BinaryDecodable for bool {
    fn decode<S: Read + ?Sized>(stream: &mut S, _ctx: &Context<'_>) -> EncodingResult<Self> {
        Ok(stream.read_u8().map_err(Error::from)? != 0)
    }
}

/// Array length sentinel meaning "null array" on the wire.
pub const ARRAY_LENGTH_NULL: i32 = -1;

/// Encode `Option<Vec<T>>` as an `Int32` length prefix (`-1` for `None`)
/// followed by the elements in order.
impl<T: BinaryEncodable> BinaryEncodable for Option<Vec<T>> {
    fn byte_len(&self, ctx: &Context<'_>) -> usize {
        4 + self
            .as_ref()
            .map(|v| v.iter().map(|e| e.byte_len(ctx)).sum())
            .unwrap_or(0)
    }

    fn encode<S: Write + ?Sized>(&self, stream: &mut S, ctx: &Context<'_>) -> EncodingResult<()> {
        match self {
            None => ARRAY_LENGTH_NULL.encode(stream, ctx),
            Some(v) => {
                (v.len() as i32).encode(stream, ctx)?;
                for item in v {
                    item.encode(stream, ctx)?;
                }
                Ok(())
            }
        }
    }
}

impl<T: BinaryDecodable> BinaryDecodable for Option<Vec<T>> {
    fn decode<S: Read + ?Sized>(stream: &mut S, ctx: &Context<'_>) -> EncodingResult<Self> {
        let len = i32::decode(stream, ctx)?;
        if len < 0 {
            return Ok(None);
        }
        let len = len as usize;
        if ctx.options.max_array_length != 0 && len > ctx.options.max_array_length {
            return Err(Error::decoding(format!(
                "array length {} exceeds configured max {}",
                len, ctx.options.max_array_length
            )));
        }
        let mut out = Vec::with_capacity(len.min(4096));
        for _ in 0..len {
            out.push(T::decode(stream, ctx)?);
        }
        Ok(Some(out))
    }
}

/// Encode an `Option<T>` using an externally-tracked encoding mask bit: when
/// the bit is clear the value is entirely absent from the stream (no length
/// prefix), matching the optional-struct-field scheme in the codec contract.
pub fn encode_optional<S: Write + ?Sized, T: BinaryEncodable>(
    stream: &mut S,
    ctx: &Context<'_>,
    value: &Option<T>,
) -> EncodingResult<()> {
    if let Some(v) = value {
        v.encode(stream, ctx)?;
    }
    Ok(())
}

/// Counterpart to [`encode_optional`]: only reads a value when `present` is true.
pub fn decode_optional<S: Read + ?Sized, T: BinaryDecodable>(
    stream: &mut S,
    ctx: &Context<'_>,
    present: bool,
) -> EncodingResult<Option<T>> {
    if present {
        Ok(Some(T::decode(stream, ctx)?))
    } else {
        Ok(None)
    }
}

/// Define `BinaryEncodable`/`BinaryDecodable` for a plain struct by listing
/// its fields in wire order. This is the hand-rolled equivalent of what the
/// `opcua-codegen` tool emits per generated type (see
/// `opcua-types/src/generated`): declared-order fields, each delegating to
/// its own type's impl.
#[macro_export]
macro_rules! binary_struct {
    ($name:ident { $($field:ident : $ty:ty),* $(,)? }) => {
        impl $crate::encoding::BinaryEncodable for $name {
            fn byte_len(&self, ctx: &$crate::encoding::Context<'_>) -> usize {
                let mut size = 0usize;
                $( size += <$ty as $crate::encoding::BinaryEncodable>::byte_len(&self.$field, ctx); )*
                size
            }

            #[allow(unused_variables)]
            fn encode<S: std::io::Write + ?Sized>(
                &self,
                stream: &mut S,
                ctx: &$crate::encoding::Context<'_>,
            ) -> $crate::encoding::EncodingResult<()> {
                $( <$ty as $crate::encoding::BinaryEncodable>::encode(&self.$field, stream, ctx)?; )*
                Ok(())
            }
        }

        impl $crate::encoding::BinaryDecodable for $name {
            #[allow(unused_variables)]
            fn decode<S: std::io::Read + ?Sized>(
                stream: &mut S,
                ctx: &$crate::encoding::Context<'_>,
            ) -> $crate::encoding::EncodingResult<Self> {
                $( let $field = <$ty as $crate::encoding::BinaryDecodable>::decode(stream, ctx)?; )*
                Ok(Self { $($field),* })
            }
        }
    };
}

/// Define an `Int32`-backed C-like enum with `BinaryEncodable`/`BinaryDecodable`
/// impls: unrecognized wire values decode to the listed `$default` variant
/// rather than failing, matching the standard's guidance that unknown enum
/// values should degrade gracefully rather than reject the whole message.
#[macro_export]
macro_rules! wire_enum {
    ($name:ident, default = $default:ident { $($variant:ident = $val:expr),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        #[repr(i32)]
        pub enum $name {
            $(
                #[allow(missing_docs)]
                $variant = $val,
            )+
        }

        impl Default for $name {
            fn default() -> Self {
                $name::$default
            }
        }

        impl $name {
            fn from_i32(v: i32) -> Self {
                match v {
                    $( $val => $name::$variant, )+
                    _ => $name::$default,
                }
            }
        }

        impl $crate::encoding::UaNullable for $name {
            fn is_ua_null(&self) -> bool {
                *self == $name::$default
            }
        }

        impl $crate::encoding::BinaryEncodable for $name {
            fn byte_len(&self, _ctx: &$crate::encoding::Context<'_>) -> usize {
                4
            }

            fn encode<S: std::io::Write + ?Sized>(
                &self,
                stream: &mut S,
                ctx: &$crate::encoding::Context<'_>,
            ) -> $crate::encoding::EncodingResult<()> {
                (*self as i32).encode(stream, ctx)
            }
        }

        impl $crate::encoding::BinaryDecodable for $name {
            fn decode<S: std::io::Read + ?Sized>(
                stream: &mut S,
                ctx: &$crate::encoding::Context<'_>,
            ) -> $crate::encoding::EncodingResult<Self> {
                Ok($name::from_i32(i32::decode(stream, ctx)?))
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::namespaces::NamespaceMap;

    #[test]
    fn option_vec_roundtrip() {
        let ns = NamespaceMap::new();
        let ctx = Context::new(&ns);
        let v: Option<Vec<u32>> = Some(vec![1, 2, 3]);
        let bytes = v.to_bytes(&ctx).unwrap();
        let mut cur = std::io::Cursor::new(bytes);
        let back = Option::<Vec<u32>>::decode(&mut cur, &ctx).unwrap();
        assert_eq!(v, back);
    }

    #[test]
    fn null_array_roundtrips_to_none() {
        let ns = NamespaceMap::new();
        let ctx = Context::new(&ns);
        let v: Option<Vec<u32>> = None;
        let bytes = v.to_bytes(&ctx).unwrap();
        assert_eq!(bytes, (-1i32).to_le_bytes());
        let mut cur = std::io::Cursor::new(bytes);
        let back = Option::<Vec<u32>>::decode(&mut cur, &ctx).unwrap();
        assert_eq!(back, None);
    }

    #[test]
    fn array_length_over_max_is_rejected_before_allocating() {
        let ns = NamespaceMap::new();
        let mut options = DecodingOptions::default();
        options.max_array_length = 4;
        let ctx = Context::with_options(&ns, options);
        // Claim a huge array length but supply no element bytes: if decoding
        // allocated before validating, this would panic/OOM instead of
        // returning an error.
        let mut cur = std::io::Cursor::new(i32::MAX.to_le_bytes());
        let err = Option::<Vec<u32>>::decode(&mut cur, &ctx).unwrap_err();
        assert_eq!(err.status(), StatusCode::BadDecoding);
    }
}
