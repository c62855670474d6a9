// OPCUA for Rust
// SPDX-License-Identifier: MPL-2.0

//! Cryptographically strong random bytes, used for nonces and session/channel ids.

use opcua_types::byte_string::ByteString;
use rand::RngCore;

/// Fill `bytes` with cryptographically strong pseudo-random data.
pub fn bytes(bytes: &mut [u8]) {
    let mut rng = rand::thread_rng();
    rng.fill_bytes(bytes);
}

/// Build a random nonce of `number_of_bytes` bytes.
pub fn byte_string(number_of_bytes: usize) -> ByteString {
    let mut data = vec![0u8; number_of_bytes];
    bytes(&mut data);
    ByteString::from(data)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nonce_has_requested_length() {
        let nonce = byte_string(32);
        assert_eq!(nonce.as_bytes().len(), 32);
    }

    #[test]
    fn successive_nonces_differ() {
        assert_ne!(byte_string(32).as_bytes(), byte_string(32).as_bytes());
    }
}
