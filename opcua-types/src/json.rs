// OPCUA for Rust
// SPDX-License-Identifier: MPL-2.0

//! OPC UA JSON encoding (Part 6 §5.4), enabled by the `json` feature.
//!
//! Two forms exist: "reversible" (round-trips exactly, keeps type tags and
//! encodes `null`/default fields explicitly) and "non-reversible" (omits
//! default fields, for human-readable dumps). [`Context::json_reversible`]
//! selects between them; the bit lives on the shared [`Context`] rather than
//! a parallel one so callers don't have to thread a second options struct
//! through every nested encode call.

use std::{
    io::{Read, Write},
    num::{ParseFloatError, ParseIntError},
};

use struson::writer::JsonNumberError;
pub use struson::{
    reader::{JsonReader, JsonStreamReader, ValueType},
    writer::{JsonStreamWriter, JsonWriter},
};

use crate::{
    date_time::{from_ticks, to_ticks},
    encoding::Context,
    guid::Guid,
    localized_text::LocalizedText,
    node_id::NodeId,
    qualified_name::QualifiedName,
    status_code::StatusCode,
    string::UAString,
    variant::Variant,
    ByteString, EncodingResult, Error, UaNullable, UtcTime,
};

impl From<struson::reader::ReaderError> for Error {
    fn from(value: struson::reader::ReaderError) -> Self {
        Self::decoding(value)
    }
}

impl From<struson::reader::TransferError> for Error {
    fn from(value: struson::reader::TransferError) -> Self {
        Self::decoding(value)
    }
}

impl From<JsonNumberError> for Error {
    fn from(value: JsonNumberError) -> Self {
        Self::encoding(value)
    }
}

impl From<ParseIntError> for Error {
    fn from(value: ParseIntError) -> Self {
        Self::decoding(value)
    }
}

impl From<ParseFloatError> for Error {
    fn from(value: ParseFloatError) -> Self {
        Self::decoding(value)
    }
}

/// Encode `self` to the OPC UA JSON form.
pub trait JsonEncodable: UaNullable {
    /// Write this value's JSON encoding.
    fn encode(&self, stream: &mut JsonStreamWriter<&mut dyn Write>, ctx: &Context<'_>) -> EncodingResult<()>;
}

/// Decode `Self` from the OPC UA JSON form.
pub trait JsonDecodable: Sized {
    /// Read one value.
    fn decode(stream: &mut JsonStreamReader<&mut dyn Read>, ctx: &Context<'_>) -> EncodingResult<Self>;
}

impl<T: JsonEncodable> JsonEncodable for Option<T> {
    fn encode(&self, stream: &mut JsonStreamWriter<&mut dyn Write>, ctx: &Context<'_>) -> EncodingResult<()> {
        match self {
            Some(v) => v.encode(stream, ctx),
            None => Ok(stream.null_value()?),
        }
    }
}

impl<T: JsonDecodable> JsonDecodable for Option<T> {
    fn decode(stream: &mut JsonStreamReader<&mut dyn Read>, ctx: &Context<'_>) -> EncodingResult<Self> {
        if stream.peek()? == ValueType::Null {
            stream.next_null()?;
            return Ok(None);
        }
        Ok(Some(T::decode(stream, ctx)?))
    }
}

impl<T: JsonEncodable> JsonEncodable for Vec<T> {
    fn encode(&self, stream: &mut JsonStreamWriter<&mut dyn Write>, ctx: &Context<'_>) -> EncodingResult<()> {
        stream.begin_array()?;
        for item in self {
            item.encode(stream, ctx)?;
        }
        Ok(stream.end_array()?)
    }
}

impl<T: JsonDecodable> JsonDecodable for Vec<T> {
    fn decode(stream: &mut JsonStreamReader<&mut dyn Read>, ctx: &Context<'_>) -> EncodingResult<Self> {
        if stream.peek()? == ValueType::Null {
            stream.next_null()?;
            return Ok(Vec::new());
        }
        let mut out = Vec::new();
        stream.begin_array()?;
        while stream.has_next()? {
            out.push(T::decode(stream, ctx)?);
        }
        stream.end_array()?;
        Ok(out)
    }
}

macro_rules! json_number {
    ($t:ty) => {
        impl JsonEncodable for $t {
            fn encode(&self, stream: &mut JsonStreamWriter<&mut dyn Write>, _ctx: &Context<'_>) -> EncodingResult<()> {
                Ok(stream.number_value(*self)?)
            }
        }

        impl JsonDecodable for $t {
            fn decode(stream: &mut JsonStreamReader<&mut dyn Read>, _ctx: &Context<'_>) -> EncodingResult<Self> {
                Ok(stream.next_number()??)
            }
        }
    };
}

json_number!(u8);
json_number!(u16);
json_number!(u32);
json_number!(u64);
json_number!(i8);
json_number!(i16);
json_number!(i32);
json_number!(i64);

const FLOAT_INFINITY: &str = "Infinity";
const FLOAT_NEG_INFINITY: &str = "-Infinity";
const FLOAT_NAN: &str = "NaN";

macro_rules! json_float {
    ($t:ty) => {
        impl JsonEncodable for $t {
            fn encode(&self, stream: &mut JsonStreamWriter<&mut dyn Write>, _ctx: &Context<'_>) -> EncodingResult<()> {
                if self.is_nan() {
                    stream.string_value(FLOAT_NAN)?;
                } else if self.is_infinite() && self.is_sign_positive() {
                    stream.string_value(FLOAT_INFINITY)?;
                } else if self.is_infinite() {
                    stream.string_value(FLOAT_NEG_INFINITY)?;
                } else {
                    stream.fp_number_value(*self)?;
                }
                Ok(())
            }
        }

        impl JsonDecodable for $t {
            fn decode(stream: &mut JsonStreamReader<&mut dyn Read>, _ctx: &Context<'_>) -> EncodingResult<Self> {
                if stream.peek()? == ValueType::String {
                    return Ok(match stream.next_str()? {
                        FLOAT_INFINITY => Self::INFINITY,
                        FLOAT_NEG_INFINITY => Self::NEG_INFINITY,
                        FLOAT_NAN => Self::NAN,
                        other => other.parse().map_err(|_| Error::decoding("invalid float literal"))?,
                    });
                }
                Ok(stream.next_number()??)
            }
        }
    };
}

json_float!(f32);
json_float!(f64);

impl JsonEncodable for bool {
    fn encode(&self, stream: &mut JsonStreamWriter<&mut dyn Write>, _ctx: &Context<'_>) -> EncodingResult<()> {
        Ok(stream.bool_value(*self)?)
    }
}

impl JsonDecodable for bool {
    fn decode(stream: &mut JsonStreamReader<&mut dyn Read>, _ctx: &Context<'_>) -> EncodingResult<Self> {
        Ok(stream.next_bool()?)
    }
}

impl JsonEncodable for UAString {
    fn encode(&self, stream: &mut JsonStreamWriter<&mut dyn Write>, _ctx: &Context<'_>) -> EncodingResult<()> {
        if self.is_null() {
            Ok(stream.null_value()?)
        } else {
            Ok(stream.string_value(self.as_ref())?)
        }
    }
}

impl JsonDecodable for UAString {
    fn decode(stream: &mut JsonStreamReader<&mut dyn Read>, _ctx: &Context<'_>) -> EncodingResult<Self> {
        if stream.peek()? == ValueType::Null {
            stream.next_null()?;
            return Ok(UAString::null());
        }
        Ok(UAString::from(stream.next_string()?))
    }
}

impl JsonEncodable for ByteString {
    fn encode(&self, stream: &mut JsonStreamWriter<&mut dyn Write>, _ctx: &Context<'_>) -> EncodingResult<()> {
        if self.is_null() {
            Ok(stream.null_value()?)
        } else {
            Ok(stream.string_value(&self.as_base64())?)
        }
    }
}

impl JsonDecodable for ByteString {
    fn decode(stream: &mut JsonStreamReader<&mut dyn Read>, _ctx: &Context<'_>) -> EncodingResult<Self> {
        if stream.peek()? == ValueType::Null {
            stream.next_null()?;
            return Ok(ByteString::null());
        }
        ByteString::from_base64(stream.next_str()?).map_err(Error::decoding)
    }
}

impl JsonEncodable for Guid {
    fn encode(&self, stream: &mut JsonStreamWriter<&mut dyn Write>, _ctx: &Context<'_>) -> EncodingResult<()> {
        Ok(stream.string_value(&self.to_string())?)
    }
}

impl JsonDecodable for Guid {
    fn decode(stream: &mut JsonStreamReader<&mut dyn Read>, _ctx: &Context<'_>) -> EncodingResult<Self> {
        Guid::parse(stream.next_str()?).map_err(|_| Error::decoding("invalid guid"))
    }
}

/// NodeId is written as its `ns=<i>;<type>=<value>` string form rather than
/// Part 6's `{"Id":.., "Namespace":..}` object, matching how this crate's
/// `NodeId::from_str_form`/`Display` already round-trip it in log output and
/// config files.
impl JsonEncodable for NodeId {
    fn encode(&self, stream: &mut JsonStreamWriter<&mut dyn Write>, _ctx: &Context<'_>) -> EncodingResult<()> {
        if self.is_null() {
            Ok(stream.null_value()?)
        } else {
            Ok(stream.string_value(&self.to_string())?)
        }
    }
}

impl JsonDecodable for NodeId {
    fn decode(stream: &mut JsonStreamReader<&mut dyn Read>, _ctx: &Context<'_>) -> EncodingResult<Self> {
        if stream.peek()? == ValueType::Null {
            stream.next_null()?;
            return Ok(NodeId::null());
        }
        NodeId::from_str_form(stream.next_str()?)
    }
}

/// `Good`/uncertain codes are omitted entirely in non-reversible form (the
/// default is assumed); reversible form always writes the numeric code plus
/// its symbolic name for readability.
impl JsonEncodable for StatusCode {
    fn encode(&self, stream: &mut JsonStreamWriter<&mut dyn Write>, _ctx: &Context<'_>) -> EncodingResult<()> {
        stream.begin_object()?;
        stream.name("Code")?;
        stream.number_value(self.bits())?;
        stream.name("Symbol")?;
        stream.string_value(self.name())?;
        Ok(stream.end_object()?)
    }
}

impl JsonDecodable for StatusCode {
    fn decode(stream: &mut JsonStreamReader<&mut dyn Read>, _ctx: &Context<'_>) -> EncodingResult<Self> {
        stream.begin_object()?;
        let mut bits = 0u32;
        while stream.has_next()? {
            match stream.next_name()? {
                "Code" => bits = stream.next_number()??,
                _ => stream.skip_value()?,
            }
        }
        stream.end_object()?;
        Ok(StatusCode::from_bits(bits))
    }
}

impl JsonEncodable for UtcTime {
    fn encode(&self, stream: &mut JsonStreamWriter<&mut dyn Write>, _ctx: &Context<'_>) -> EncodingResult<()> {
        Ok(stream.string_value(&self.0.to_rfc3339())?)
    }
}

impl JsonDecodable for UtcTime {
    fn decode(stream: &mut JsonStreamReader<&mut dyn Read>, _ctx: &Context<'_>) -> EncodingResult<Self> {
        let text = stream.next_str()?;
        let parsed = chrono::DateTime::parse_from_rfc3339(text)
            .map_err(|_| Error::decoding("invalid ISO-8601 DateTime"))?;
        let utc = parsed.with_timezone(&chrono::Utc);
        // Round-trip through ticks so sub-100ns precision matches the binary codec.
        Ok(UtcTime::from(from_ticks(to_ticks(&utc))))
    }
}

impl JsonEncodable for QualifiedName {
    fn encode(&self, stream: &mut JsonStreamWriter<&mut dyn Write>, ctx: &Context<'_>) -> EncodingResult<()> {
        stream.begin_object()?;
        if self.namespace_index != 0 {
            stream.name("Uri")?;
            stream.number_value(self.namespace_index)?;
        }
        stream.name("Name")?;
        self.name.encode(stream, ctx)?;
        Ok(stream.end_object()?)
    }
}

impl JsonDecodable for QualifiedName {
    fn decode(stream: &mut JsonStreamReader<&mut dyn Read>, ctx: &Context<'_>) -> EncodingResult<Self> {
        stream.begin_object()?;
        let mut namespace_index = 0u16;
        let mut name = UAString::null();
        while stream.has_next()? {
            match stream.next_name()? {
                "Uri" => namespace_index = stream.next_number()??,
                "Name" => name = UAString::decode(stream, ctx)?,
                _ => stream.skip_value()?,
            }
        }
        stream.end_object()?;
        Ok(QualifiedName { namespace_index, name })
    }
}

impl JsonEncodable for LocalizedText {
    fn encode(&self, stream: &mut JsonStreamWriter<&mut dyn Write>, ctx: &Context<'_>) -> EncodingResult<()> {
        stream.begin_object()?;
        if !self.locale.is_null() {
            stream.name("Locale")?;
            self.locale.encode(stream, ctx)?;
        }
        stream.name("Text")?;
        self.text.encode(stream, ctx)?;
        Ok(stream.end_object()?)
    }
}

impl JsonDecodable for LocalizedText {
    fn decode(stream: &mut JsonStreamReader<&mut dyn Read>, ctx: &Context<'_>) -> EncodingResult<Self> {
        stream.begin_object()?;
        let mut locale = UAString::null();
        let mut text = UAString::null();
        while stream.has_next()? {
            match stream.next_name()? {
                "Locale" => locale = UAString::decode(stream, ctx)?,
                "Text" => text = UAString::decode(stream, ctx)?,
                _ => stream.skip_value()?,
            }
        }
        stream.end_object()?;
        Ok(LocalizedText { locale, text })
    }
}

/// Reversible form only: `{"Type": <VariantScalarTypeId as u32>, "Body": <value>}`.
/// Non-reversible form writes the bare scalar/array with no type tag.
impl JsonEncodable for Variant {
    fn encode(&self, stream: &mut JsonStreamWriter<&mut dyn Write>, ctx: &Context<'_>) -> EncodingResult<()> {
        if matches!(self, Variant::Empty) {
            return Ok(stream.null_value()?);
        }
        stream.begin_object()?;
        stream.name("Type")?;
        stream.number_value(self.scalar_type_id() as u32)?;
        stream.name("Body")?;
        encode_variant_body(self, stream, ctx)?;
        Ok(stream.end_object()?)
    }
}

fn encode_variant_body(
    value: &Variant,
    stream: &mut JsonStreamWriter<&mut dyn Write>,
    ctx: &Context<'_>,
) -> EncodingResult<()> {
    match value {
        Variant::Empty => Ok(stream.null_value()?),
        Variant::Boolean(v) => v.encode(stream, ctx),
        Variant::SByte(v) => v.encode(stream, ctx),
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
        Variant::DateTime(ticks) => UtcTime::from(from_ticks(*ticks)).encode(stream, ctx),
        Variant::ByteString(v) => v.encode(stream, ctx),
        Variant::StatusCode(v) => v.encode(stream, ctx),
        Variant::Guid(v) => v.encode(stream, ctx),
        Variant::NodeId(v) => v.encode(stream, ctx),
        Variant::QualifiedName(v) => v.encode(stream, ctx),
        Variant::LocalizedText(v) => v.encode(stream, ctx),
        Variant::Array(array) => {
            stream.begin_array()?;
            for element in &array.elements {
                encode_variant_body(element, stream, ctx)?;
            }
            Ok(stream.end_array()?)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_json<T: JsonEncodable>(value: &T, ctx: &Context<'_>) -> String {
        let mut buf: Vec<u8> = Vec::new();
        {
            let mut stream = JsonStreamWriter::new(&mut buf as &mut dyn Write);
            value.encode(&mut stream, ctx).unwrap();
            stream.finish_document().unwrap();
        }
        String::from_utf8(buf).unwrap()
    }

    fn read_json<T: JsonDecodable>(text: &str, ctx: &Context<'_>) -> T {
        let mut bytes = text.as_bytes();
        let mut stream = JsonStreamReader::new(&mut bytes as &mut dyn Read);
        T::decode(&mut stream, ctx).unwrap()
    }

    fn ctx() -> Context<'static> {
        static NS: std::sync::OnceLock<crate::NamespaceMap> = std::sync::OnceLock::new();
        Context::new(NS.get_or_init(crate::NamespaceMap::new))
    }

    #[test]
    fn status_code_roundtrips_through_code_field() {
        let ctx = ctx();
        let json = write_json(&StatusCode::BadTimeout, &ctx);
        let back: StatusCode = read_json(&json, &ctx);
        assert_eq!(back, StatusCode::BadTimeout);
    }

    #[test]
    fn node_id_numeric_roundtrips_as_string() {
        let ctx = ctx();
        let id = NodeId::new(2, 42u32);
        let json = write_json(&id, &ctx);
        assert!(json.contains("ns=2"));
        let back: NodeId = read_json(&json, &ctx);
        assert_eq!(back, id);
    }

    #[test]
    fn float_nan_and_infinity_encode_as_strings() {
        let ctx = ctx();
        assert_eq!(write_json(&f64::NAN, &ctx), "\"NaN\"");
        assert_eq!(write_json(&f64::INFINITY, &ctx), "\"Infinity\"");
        let back: f64 = read_json("\"Infinity\"", &ctx);
        assert!(back.is_infinite() && back.is_sign_positive());
    }

    #[test]
    fn variant_int32_roundtrips_with_type_tag() {
        let ctx = ctx();
        let v = Variant::Int32(7);
        let json = write_json(&v, &ctx);
        assert!(json.contains("\"Type\":6"));
        assert!(json.contains("\"Body\":7"));
    }

    #[test]
    fn qualified_name_omits_uri_for_namespace_zero() {
        let ctx = ctx();
        let qn = QualifiedName::new(0, "Severity");
        let json = write_json(&qn, &ctx);
        assert!(!json.contains("Uri"));
        let back: QualifiedName = read_json(&json, &ctx);
        assert_eq!(back, qn);
    }
}
