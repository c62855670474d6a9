// OPCUA for Rust
// SPDX-License-Identifier: MPL-2.0

//! Status codes: a 32-bit value with a deterministic, loggable name.
//!
//! The top two bits classify severity (`00` = Good, `01` = Uncertain,
//! `10`/`11` = Bad) exactly as the OPC UA wire format does; everything below
//! this crate treats [`StatusCode`] as an opaque, `Copy`, nameable value and
//! must never log the raw `u32`.

use std::fmt;

use crate::encoding::{BinaryDecodable, BinaryEncodable, Context, EncodingResult, UaNullable};

macro_rules! status_codes {
    ($( $name:ident = $val:expr ),+ $(,)?) => {
        /// A 32-bit OPC UA result/severity code.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
        pub struct StatusCode(u32);

        impl StatusCode {
            $(
                #[allow(missing_docs)]
                pub const $name: StatusCode = StatusCode($val);
            )+

            /// The raw wire value of this code.
            pub const fn bits(&self) -> u32 {
                self.0
            }

            /// Construct from a raw wire value. Unrecognized values keep their bits
            /// and print as a hex literal rather than panicking.
            pub const fn from_bits(bits: u32) -> Self {
                StatusCode(bits)
            }

            /// Deterministic printable name, used everywhere instead of the raw bits.
            pub fn name(&self) -> &'static str {
                match *self {
                    $( StatusCode::$name => stringify!($name), )+
                    _ => "Unknown",
                }
            }

            /// True if this is a `Good_*` code (top two bits `00`).
            pub fn is_good(&self) -> bool {
                self.0 & 0xC000_0000 == 0
            }

            /// True if this is an `Uncertain_*` code (top two bits `01`).
            pub fn is_uncertain(&self) -> bool {
                self.0 & 0xC000_0000 == 0x4000_0000
            }

            /// True if this is a `Bad_*` code (high bit set).
            pub fn is_bad(&self) -> bool {
                self.0 & 0x8000_0000 != 0
            }
        }
    };
}

status_codes! {
    Good = 0x0000_0000,
    GoodCompletesAsynchronously = 0x002D_0000,
    GoodSubscriptionTransferred = 0x002E_0000,
    GoodNoData = 0x002F_0000,
    GoodMoreData = 0x0300_0000,
    Uncertain = 0x4000_0000,
    UncertainInitialValue = 0x4009_0000,

    BadUnexpectedError = 0x8001_0000,
    BadInternalError = 0x8002_0000,
    BadOutOfMemory = 0x8003_0000,
    BadResourceUnavailable = 0x8004_0000,
    BadCommunicationError = 0x8005_0000,
    BadEncoding = 0x8007_0000,
    BadDecoding = 0x8008_0000,
    BadInvalidArgument = 0x8020_0000,
    BadConnectionClosed = 0x8055_0000,
    BadDisconnect = 0x8057_0000,
    BadTimeout = 0x800A_0000,
    BadSecurityChecksFailed = 0x8130_0000,
    BadCertificateInvalid = 0x8018_0000,
    BadCertificateUntrusted = 0x8019_0000,
    BadCertificateTimeInvalid = 0x801A_0000,
    BadCertificateHostNameInvalid = 0x801C_0000,
    BadSecureChannelTokenUnknown = 0x8026_0000,
    BadSecureChannelClosed = 0x8027_0000,
    BadSecureChannelIdInvalid = 0x8009_0000,
    BadTcpMessageTooLarge = 0x8063_0000,
    BadTcpMessageTypeInvalid = 0x8061_0000,
    BadResponseTooLarge = 0x810D_0000,
    BadNodeIdUnknown = 0x8033_0000,
    BadNodeIdInvalid = 0x8034_0000,
    BadAttributeIdInvalid = 0x8035_0000,
    BadNoMatch = 0x8039_0000,
    BadTypeMismatch = 0x8038_0000,
    BadNotWritable = 0x803E_0000,
    BadNotReadable = 0x803D_0000,
    BadUserAccessDenied = 0x801F_0000,
    BadSessionIdInvalid = 0x8006_0000,
    BadSessionNotActivated = 0x80BD_0000,
    BadSessionClosed = 0x800D_0000,
    BadTooManySessions = 0x8060_0000,
    BadIdentityTokenInvalid = 0x8045_0000,
    BadIdentityTokenRejected = 0x8046_0000,
    BadRequestTimeout = 0x800E_0000,
    BadTooManyOperations = 0x80E5_0000,
    BadNothingToDo = 0x800F_0000,
    BadNoSubscription = 0x80EF_0000,
    BadSubscriptionIdInvalid = 0x8050_0000,
    BadMonitoredItemIdInvalid = 0x80C6_0000,
    BadMonitoringModeInvalid = 0x80C8_0000,
    BadFilterNotAllowed = 0x8045_1000,
    BadIndexRangeInvalid = 0x8048_0000,
    BadIndexRangeNoData = 0x8049_0000,
    BadContinuationPointInvalid = 0x8043_0000,
    BadNoContinuationPoints = 0x804C_0000,
    BadOutOfRange = 0x803C_0000,
    BadWriteNotSupported = 0x80E6_0000,
    BadMethodInvalid = 0x8067_0000,
    BadArgumentsMissing = 0x8068_0000,
    BadServiceUnsupported = 0x800B_0000,
    BadShutdown = 0x800C_0000,
    BadSequenceNumberUnknown = 0x8079_0000,
    BadSequenceNumberInvalid = 0x80EB_0000,
    BadSecurityPolicyRejected = 0x80E1_0000,
    BadEncodingLimitsExceeded = 0x80B8_0000,
    BadCertificateRevoked = 0x801D_0000,
    BadCertificateIssuerRevoked = 0x801E_0000,
    BadCertificateChainIncomplete = 0x810E_0000,
    BadTcpEndpointUrlInvalid = 0x80AF_0000,
    BadUserSignatureInvalid = 0x80B0_0000,
    BadTooManyMonitoredItems = 0x80DB_0000,
    BadTooManySubscriptions = 0x80E4_0000,
    BadMessageNotAvailable = 0x80ED_0000,
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl UaNullable for StatusCode {
    fn is_ua_null(&self) -> bool {
        *self == StatusCode::Good
    }
}

impl BinaryEncodable for StatusCode {
    fn byte_len(&self, _ctx: &Context<'_>) -> usize {
        4
    }

    fn encode<S: std::io::Write + ?Sized>(
        &self,
        stream: &mut S,
        ctx: &Context<'_>,
    ) -> EncodingResult<()> {
        self.0.encode(stream, ctx)
    }
}

impl BinaryDecodable for StatusCode {
    fn decode<S: std::io::Read + ?Sized>(
        stream: &mut S,
        ctx: &Context<'_>,
    ) -> EncodingResult<Self> {
        Ok(StatusCode::from_bits(u32::decode(stream, ctx)?))
    }
}

#[cfg(feature = "json")]
impl serde::Serialize for StatusCode {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_u32(self.0)
    }
}

#[cfg(feature = "json")]
impl<'de> serde::Deserialize<'de> for StatusCode {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        Ok(StatusCode::from_bits(u32::deserialize(deserializer)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_bits() {
        assert!(StatusCode::Good.is_good());
        assert!(StatusCode::UncertainInitialValue.is_uncertain());
        assert!(StatusCode::BadDecoding.is_bad());
        assert!(!StatusCode::BadDecoding.is_good());
    }

    #[test]
    fn name_is_used_for_display() {
        assert_eq!(format!("{}", StatusCode::BadNodeIdUnknown), "BadNodeIdUnknown");
    }
}
