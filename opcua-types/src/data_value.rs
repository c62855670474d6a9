// OPCUA for Rust
// SPDX-License-Identifier: MPL-2.0

//! `DataValue`: a [`crate::Variant`] plus status and source/server timestamps.

use chrono::{DateTime as ChronoDateTime, Utc};
use std::io::{Read, Write};

use crate::{
    date_time::{from_ticks, to_ticks},
    encoding::{BinaryDecodable, BinaryEncodable, Context, EncodingResult},
    status_code::StatusCode,
    variant::Variant,
    UaNullable,
};

bitflags::bitflags! {
    /// Which optional fields of a [`DataValue`] are present on the wire.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct DataValueFlags: u8 {
        /// Value field present.
        const VALUE = 0x01;
        /// Status field present.
        const STATUS = 0x02;
        /// Source timestamp present.
        const SOURCE_TIMESTAMP = 0x04;
        /// Server timestamp present.
        const SERVER_TIMESTAMP = 0x08;
        /// Source picoseconds present.
        const SOURCE_PICOSECONDS = 0x10;
        /// Server picoseconds present.
        const SERVER_PICOSECONDS = 0x20;
    }
}

/// Value plus quality status plus source/server timestamps.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DataValue {
    /// The value itself.
    pub value: Option<Variant>,
    /// Quality of the value.
    pub status: Option<StatusCode>,
    /// Timestamp the value was produced at the source.
    pub source_timestamp: Option<ChronoDateTime<Utc>>,
    /// Sub-100ns component of `source_timestamp`, in units of 100 picoseconds.
    pub source_picoseconds: Option<u16>,
    /// Timestamp the server received/produced the value.
    pub server_timestamp: Option<ChronoDateTime<Utc>>,
    /// Sub-100ns component of `server_timestamp`.
    pub server_picoseconds: Option<u16>,
}

impl UaNullable for DataValue {
    fn is_ua_null(&self) -> bool {
        self.value.is_none() && self.status.is_none()
    }
}

impl DataValue {
    /// Build a `Good`-status value stamped with the current time for both
    /// source and server timestamps.
    pub fn new_now(value: Variant) -> Self {
        let now = Utc::now();
        Self {
            value: Some(value),
            status: Some(StatusCode::Good),
            source_timestamp: Some(now),
            server_timestamp: Some(now),
            source_picoseconds: None,
            server_picoseconds: None,
        }
    }

    /// Build a value carrying only a bad status code, no value.
    pub fn new_error(status: StatusCode) -> Self {
        Self {
            value: None,
            status: Some(status),
            ..Default::default()
        }
    }

    fn flags(&self) -> DataValueFlags {
        let mut flags = DataValueFlags::empty();
        if self.value.is_some() {
            flags |= DataValueFlags::VALUE;
        }
        if self.status.is_some() {
            flags |= DataValueFlags::STATUS;
        }
        if self.source_timestamp.is_some() {
            flags |= DataValueFlags::SOURCE_TIMESTAMP;
        }
        if self.server_timestamp.is_some() {
            flags |= DataValueFlags::SERVER_TIMESTAMP;
        }
        if self.source_picoseconds.is_some() {
            flags |= DataValueFlags::SOURCE_PICOSECONDS;
        }
        if self.server_picoseconds.is_some() {
            flags |= DataValueFlags::SERVER_PICOSECONDS;
        }
        flags
    }
}

fn encode_datetime<S: Write + ?Sized>(
    stream: &mut S,
    ctx: &Context<'_>,
    dt: &ChronoDateTime<Utc>,
) -> EncodingResult<()> {
    to_ticks(dt).encode(stream, ctx)
}

fn decode_datetime<S: Read + ?Sized>(
    stream: &mut S,
    ctx: &Context<'_>,
) -> EncodingResult<ChronoDateTime<Utc>> {
    Ok(from_ticks(i64::decode(stream, ctx)?))
}

impl BinaryEncodable for DataValue {
    fn byte_len(&self, ctx: &Context<'_>) -> usize {
        let mut size = 1;
        if let Some(v) = &self.value {
            size += v.byte_len(ctx);
        }
        if self.status.is_some() {
            size += 4;
        }
        if self.source_timestamp.is_some() {
            size += 8;
        }
        if self.source_picoseconds.is_some() {
            size += 2;
        }
        if self.server_timestamp.is_some() {
            size += 8;
        }
        if self.server_picoseconds.is_some() {
            size += 2;
        }
        size
    }

    fn encode<S: Write + ?Sized>(&self, stream: &mut S, ctx: &Context<'_>) -> EncodingResult<()> {
        self.flags().bits().encode(stream, ctx)?;
        if let Some(v) = &self.value {
            v.encode(stream, ctx)?;
        }
        if let Some(s) = self.status {
            s.encode(stream, ctx)?;
        }
        if let Some(t) = &self.source_timestamp {
            encode_datetime(stream, ctx, t)?;
        }
        if let Some(p) = self.source_picoseconds {
            p.encode(stream, ctx)?;
        }
        if let Some(t) = &self.server_timestamp {
            encode_datetime(stream, ctx, t)?;
        }
        if let Some(p) = self.server_picoseconds {
            p.encode(stream, ctx)?;
        }
        Ok(())
    }
}

impl BinaryDecodable for DataValue {
    fn decode<S: Read + ?Sized>(stream: &mut S, ctx: &Context<'_>) -> EncodingResult<Self> {
        let flags = DataValueFlags::from_bits_truncate(u8::decode(stream, ctx)?);
        let value = flags
            .contains(DataValueFlags::VALUE)
            .then(|| Variant::decode(stream, ctx))
            .transpose()?;
        let status = flags
            .contains(DataValueFlags::STATUS)
            .then(|| StatusCode::decode(stream, ctx))
            .transpose()?;
        let source_timestamp = flags
            .contains(DataValueFlags::SOURCE_TIMESTAMP)
            .then(|| decode_datetime(stream, ctx))
            .transpose()?;
        let source_picoseconds = flags
            .contains(DataValueFlags::SOURCE_PICOSECONDS)
            .then(|| u16::decode(stream, ctx))
            .transpose()?;
        let server_timestamp = flags
            .contains(DataValueFlags::SERVER_TIMESTAMP)
            .then(|| decode_datetime(stream, ctx))
            .transpose()?;
        let server_picoseconds = flags
            .contains(DataValueFlags::SERVER_PICOSECONDS)
            .then(|| u16::decode(stream, ctx))
            .transpose()?;
        Ok(Self {
            value,
            status,
            source_timestamp,
            source_picoseconds,
            server_timestamp,
            server_picoseconds,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::namespaces::NamespaceMap;

    #[test]
    fn roundtrip_good_value() {
        let ns = NamespaceMap::new();
        let ctx = Context::new(&ns);
        let dv = DataValue::new_now(Variant::Int32(42));
        let bytes = dv.to_bytes(&ctx).unwrap();
        let mut cur = std::io::Cursor::new(bytes);
        let back = DataValue::decode(&mut cur, &ctx).unwrap();
        assert_eq!(back.value, Some(Variant::Int32(42)));
        assert_eq!(back.status, Some(StatusCode::Good));
    }

    #[test]
    fn error_value_omits_value_field() {
        let ns = NamespaceMap::new();
        let ctx = Context::new(&ns);
        let dv = DataValue::new_error(StatusCode::BadNodeIdUnknown);
        let bytes = dv.to_bytes(&ctx).unwrap();
        let mut cur = std::io::Cursor::new(bytes);
        let back = DataValue::decode(&mut cur, &ctx).unwrap();
        assert_eq!(back.value, None);
        assert_eq!(back.status, Some(StatusCode::BadNodeIdUnknown));
    }
}
