// OPCUA for Rust
// SPDX-License-Identifier: MPL-2.0

//! Common constants bounding decoding and the wire protocol.

/// Default OPC UA TCP port.
pub const DEFAULT_OPC_UA_SERVER_PORT: u16 = 4840;

/// Default maximum message size in bytes. 0 would mean unlimited.
pub const MAX_MESSAGE_SIZE: usize = 16 * 1024 * 1024;

/// Default maximum number of chunks composing one message.
pub const MAX_CHUNK_COUNT: usize = 1024;

/// Default maximum string length in bytes.
pub const MAX_STRING_LENGTH: usize = 1024 * 1024;

/// Default maximum byte string length in bytes.
pub const MAX_BYTE_STRING_LENGTH: usize = 1024 * 1024;

/// Default maximum number of elements in an array.
pub const MAX_ARRAY_LENGTH: usize = 1024 * 1024;

/// Default maximum recursion depth while decoding nested structures/variants.
pub const MAX_DECODING_DEPTH: u64 = 100;

/// Sequence number at which the secure channel sequence counter wraps back to 1,
/// per the OPC UA specification.
pub const SEQUENCE_NUMBER_WRAP_AT: u32 = 4_294_966_271;

/// Advance a sequence number by one, wrapping to 1 instead of 0 once
/// [`SEQUENCE_NUMBER_WRAP_AT`] is reached. The one place this rule is
/// implemented; every counter that wraps per the spec calls this instead of
/// a bare `+= 1`/`wrapping_add(1)`.
pub fn next_sequence_number(current: u32) -> u32 {
    if current >= SEQUENCE_NUMBER_WRAP_AT {
        1
    } else {
        current + 1
    }
}

/// Fraction of a security token's lifetime at which renewal is due.
pub const TOKEN_RENEWAL_FRACTION: f64 = 0.75;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wraps_to_one_instead_of_zero() {
        assert_eq!(next_sequence_number(SEQUENCE_NUMBER_WRAP_AT - 1), SEQUENCE_NUMBER_WRAP_AT);
        assert_eq!(next_sequence_number(SEQUENCE_NUMBER_WRAP_AT), 1);
        assert_eq!(next_sequence_number(1), 2);
    }
}
