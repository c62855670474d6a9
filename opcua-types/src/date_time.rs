// OPCUA for Rust
// SPDX-License-Identifier: MPL-2.0

//! OPC UA `DateTime`: 100ns ticks since 1601-01-01 00:00:00 UTC, exchanged as
//! `chrono::DateTime<Utc>` everywhere else in this crate.

use std::io::{Read, Write};
use std::sync::OnceLock;

use chrono::{DateTime as ChronoDateTime, Duration, Utc};

use crate::encoding::{BinaryDecodable, BinaryEncodable, Context, EncodingResult, UaNullable};

fn epoch() -> ChronoDateTime<Utc> {
    static EPOCH: OnceLock<ChronoDateTime<Utc>> = OnceLock::new();
    *EPOCH.get_or_init(|| {
        ChronoDateTime::parse_from_rfc3339("1601-01-01T00:00:00Z")
            .expect("constant epoch string is valid")
            .with_timezone(&Utc)
    })
}

/// Convert a `chrono` UTC instant to its OPC UA 100ns-tick representation.
pub fn to_ticks(dt: &ChronoDateTime<Utc>) -> i64 {
    dt.signed_duration_since(epoch())
        .num_nanoseconds()
        .unwrap_or(0)
        / 100
}

/// Convert OPC UA 100ns ticks since the 1601 epoch to a `chrono` UTC instant.
pub fn from_ticks(ticks: i64) -> ChronoDateTime<Utc> {
    epoch() + Duration::nanoseconds(ticks.saturating_mul(100))
}

/// A thin wire-format wrapper so `DateTime<Utc>` fields can participate in
/// `binary_struct!` without every caller writing the tick conversion by hand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UtcTime(pub ChronoDateTime<Utc>);

impl Default for UtcTime {
    fn default() -> Self {
        UtcTime(epoch())
    }
}

impl UaNullable for UtcTime {
    fn is_ua_null(&self) -> bool {
        self.0 == epoch()
    }
}

impl UtcTime {
    /// The current instant.
    pub fn now() -> Self {
        UtcTime(Utc::now())
    }
}

impl From<ChronoDateTime<Utc>> for UtcTime {
    fn from(value: ChronoDateTime<Utc>) -> Self {
        UtcTime(value)
    }
}

impl BinaryEncodable for UtcTime {
    fn byte_len(&self, _ctx: &Context<'_>) -> usize {
        8
    }

    fn encode<S: Write + ?Sized>(&self, stream: &mut S, ctx: &Context<'_>) -> EncodingResult<()> {
        to_ticks(&self.0).encode(stream, ctx)
    }
}

impl BinaryDecodable for UtcTime {
    fn decode<S: Read + ?Sized>(stream: &mut S, ctx: &Context<'_>) -> EncodingResult<Self> {
        Ok(UtcTime(from_ticks(i64::decode(stream, ctx)?)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ticks_roundtrip_to_millisecond_precision() {
        let now = Utc::now();
        let ticks = to_ticks(&now);
        let back = from_ticks(ticks);
        assert!((now - back).num_milliseconds().abs() <= 1);
    }
}
