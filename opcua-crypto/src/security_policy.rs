// OPCUA for Rust
// SPDX-License-Identifier: MPL-2.0

//! The pluggable crypto suite a `SecureChannel` negotiates: asymmetric
//! sign/verify/encrypt/decrypt for the handshake, symmetric sign/encrypt for
//! message chunks, and the P_SHA KDF that derives both from nonces.

use hmac::{Hmac, Mac};
use rand::rngs::OsRng;
use rsa::{
    pkcs1v15::{Signature as Pkcs1v15Signature, SigningKey, VerifyingKey},
    signature::{SignatureEncoding, Signer, Verifier},
    Oaep, Pkcs1v15Encrypt, RsaPrivateKey, RsaPublicKey,
};
use sha1::Sha1;
use sha2::Sha256;

use opcua_types::{status_code::StatusCode, Error};

use crate::aes_key::AesKey;

type EncodingResult<T> = Result<T, Error>;

/// One of the standard OPC UA security policy URIs, identifying the whole
/// crypto suite (hash, signature padding, symmetric cipher, key lengths) used
/// for a channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SecurityPolicy {
    /// No security: messages are sent in cleartext, unsigned.
    None,
    /// RSA-15 asymmetric, AES-128-CBC symmetric, SHA-1 signing.
    Basic128Rsa15,
    /// RSA-OAEP asymmetric, AES-256-CBC symmetric, SHA-1 signing.
    Basic256,
    /// RSA-OAEP-SHA256 asymmetric, AES-256-CBC symmetric, SHA-256 signing.
    Basic256Sha256,
    /// RSA-OAEP-SHA256 asymmetric, AES-128-CBC symmetric, SHA-256 signing.
    Aes128Sha256RsaOaep,
    /// RSA-PSS-SHA256 asymmetric, AES-256-CBC symmetric, SHA-256 signing.
    Aes256Sha256RsaPss,
}

impl SecurityPolicy {
    /// The policy's URI, as carried on the wire in `OpenSecureChannelRequest`.
    pub fn uri(&self) -> &'static str {
        match self {
            SecurityPolicy::None => "http://opcfoundation.org/UA/SecurityPolicy#None",
            SecurityPolicy::Basic128Rsa15 => "http://opcfoundation.org/UA/SecurityPolicy#Basic128Rsa15",
            SecurityPolicy::Basic256 => "http://opcfoundation.org/UA/SecurityPolicy#Basic256",
            SecurityPolicy::Basic256Sha256 => "http://opcfoundation.org/UA/SecurityPolicy#Basic256Sha256",
            SecurityPolicy::Aes128Sha256RsaOaep => "http://opcfoundation.org/UA/SecurityPolicy#Aes128_Sha256_RsaOaep",
            SecurityPolicy::Aes256Sha256RsaPss => "http://opcfoundation.org/UA/SecurityPolicy#Aes256_Sha256_RsaPss",
        }
    }

    /// Parse a policy from its wire URI.
    pub fn from_uri(uri: &str) -> Option<Self> {
        Some(match uri {
            "http://opcfoundation.org/UA/SecurityPolicy#None" => SecurityPolicy::None,
            "http://opcfoundation.org/UA/SecurityPolicy#Basic128Rsa15" => SecurityPolicy::Basic128Rsa15,
            "http://opcfoundation.org/UA/SecurityPolicy#Basic256" => SecurityPolicy::Basic256,
            "http://opcfoundation.org/UA/SecurityPolicy#Basic256Sha256" => SecurityPolicy::Basic256Sha256,
            "http://opcfoundation.org/UA/SecurityPolicy#Aes128_Sha256_RsaOaep" => SecurityPolicy::Aes128Sha256RsaOaep,
            "http://opcfoundation.org/UA/SecurityPolicy#Aes256_Sha256_RsaPss" => SecurityPolicy::Aes256Sha256RsaPss,
            _ => return None,
        })
    }

    /// True for every policy except `None`: a channel using it must carry a
    /// certificate and sign/encrypt its chunks.
    pub fn is_secure(&self) -> bool {
        !matches!(self, SecurityPolicy::None)
    }

    /// Number of bytes the symmetric signature occupies at chunk end.
    pub fn symmetric_signature_size(&self) -> usize {
        match self {
            SecurityPolicy::None => 0,
            SecurityPolicy::Basic128Rsa15 | SecurityPolicy::Basic256 => 20, // HMAC-SHA1
            SecurityPolicy::Basic256Sha256
            | SecurityPolicy::Aes128Sha256RsaOaep
            | SecurityPolicy::Aes256Sha256RsaPss => 32, // HMAC-SHA256
        }
    }

    /// Length in bytes of the derived symmetric signing key.
    pub fn signing_key_length(&self) -> usize {
        match self {
            SecurityPolicy::None => 0,
            SecurityPolicy::Basic128Rsa15 | SecurityPolicy::Basic256 => 24,
            _ => 32,
        }
    }

    /// Length in bytes of the derived symmetric encryption key.
    pub fn encryption_key_length(&self) -> usize {
        match self {
            SecurityPolicy::None => 0,
            SecurityPolicy::Basic128Rsa15 | SecurityPolicy::Aes128Sha256RsaOaep => 16,
            SecurityPolicy::Basic256 | SecurityPolicy::Basic256Sha256 | SecurityPolicy::Aes256Sha256RsaPss => 32,
        }
    }

    /// Length in bytes of the derived symmetric IV. Matches the AES block size.
    pub fn encryption_block_size(&self) -> usize {
        if matches!(self, SecurityPolicy::None) {
            0
        } else {
            16
        }
    }

    /// Sign `data` with the local private key, per this policy's asymmetric scheme.
    pub fn asym_sign(&self, private_key: &RsaPrivateKey, data: &[u8]) -> EncodingResult<Vec<u8>> {
        match self {
            SecurityPolicy::Basic128Rsa15 | SecurityPolicy::Basic256 => {
                let key = SigningKey::<Sha1>::new(private_key.clone());
                Ok(key.sign(data).to_vec())
            }
            SecurityPolicy::Basic256Sha256 | SecurityPolicy::Aes128Sha256RsaOaep | SecurityPolicy::Aes256Sha256RsaPss => {
                let key = SigningKey::<Sha256>::new(private_key.clone());
                Ok(key.sign(data).to_vec())
            }
            SecurityPolicy::None => Err(Error::new(StatusCode::BadSecurityPolicyRejected, "None has no asymmetric signature")),
        }
    }

    /// Verify a signature produced by [`Self::asym_sign`] against the peer's public key.
    pub fn asym_verify(&self, public_key: &RsaPublicKey, data: &[u8], signature: &[u8]) -> EncodingResult<()> {
        let sig_err = |e: rsa::signature::Error| Error::new(StatusCode::BadSecurityChecksFailed, e.to_string());
        match self {
            SecurityPolicy::Basic128Rsa15 | SecurityPolicy::Basic256 => {
                let key = VerifyingKey::<Sha1>::new(public_key.clone());
                let sig = Pkcs1v15Signature::try_from(signature).map_err(sig_err)?;
                key.verify(data, &sig).map_err(sig_err)
            }
            SecurityPolicy::Basic256Sha256 | SecurityPolicy::Aes128Sha256RsaOaep | SecurityPolicy::Aes256Sha256RsaPss => {
                let key = VerifyingKey::<Sha256>::new(public_key.clone());
                let sig = Pkcs1v15Signature::try_from(signature).map_err(sig_err)?;
                key.verify(data, &sig).map_err(sig_err)
            }
            SecurityPolicy::None => Err(Error::new(StatusCode::BadSecurityPolicyRejected, "None has no asymmetric signature")),
        }
    }

    /// Encrypt `plaintext` to the peer's certificate public key for the OPN handshake.
    pub fn asym_encrypt(&self, remote_public_key: &RsaPublicKey, plaintext: &[u8]) -> EncodingResult<Vec<u8>> {
        let mut rng = OsRng;
        match self {
            SecurityPolicy::Basic128Rsa15 => remote_public_key
                .encrypt(&mut rng, Pkcs1v15Encrypt, plaintext)
                .map_err(|e| Error::new(StatusCode::BadEncodingLimitsExceeded, e.to_string())),
            SecurityPolicy::Basic256 | SecurityPolicy::Aes128Sha256RsaOaep | SecurityPolicy::Aes256Sha256RsaPss => remote_public_key
                .encrypt(&mut rng, Oaep::new::<Sha256>(), plaintext)
                .map_err(|e| Error::new(StatusCode::BadEncodingLimitsExceeded, e.to_string())),
            SecurityPolicy::Basic256Sha256 => remote_public_key
                .encrypt(&mut rng, Oaep::new::<Sha1>(), plaintext)
                .map_err(|e| Error::new(StatusCode::BadEncodingLimitsExceeded, e.to_string())),
            SecurityPolicy::None => Err(Error::new(StatusCode::BadSecurityPolicyRejected, "None has no asymmetric encryption")),
        }
    }

    /// Decrypt a ciphertext produced by the peer's [`Self::asym_encrypt`].
    pub fn asym_decrypt(&self, private_key: &RsaPrivateKey, ciphertext: &[u8]) -> EncodingResult<Vec<u8>> {
        match self {
            SecurityPolicy::Basic128Rsa15 => private_key
                .decrypt(Pkcs1v15Encrypt, ciphertext)
                .map_err(|e| Error::new(StatusCode::BadSecurityChecksFailed, e.to_string())),
            SecurityPolicy::Basic256 | SecurityPolicy::Aes128Sha256RsaOaep | SecurityPolicy::Aes256Sha256RsaPss => private_key
                .decrypt(Oaep::new::<Sha256>(), ciphertext)
                .map_err(|e| Error::new(StatusCode::BadSecurityChecksFailed, e.to_string())),
            SecurityPolicy::Basic256Sha256 => private_key
                .decrypt(Oaep::new::<Sha1>(), ciphertext)
                .map_err(|e| Error::new(StatusCode::BadSecurityChecksFailed, e.to_string())),
            SecurityPolicy::None => Err(Error::new(StatusCode::BadSecurityPolicyRejected, "None has no asymmetric encryption")),
        }
    }

    /// Sign a symmetric message chunk with the derived per-direction signing key.
    pub fn sym_sign(&self, signing_key: &[u8], data: &[u8]) -> EncodingResult<Vec<u8>> {
        match self {
            SecurityPolicy::Basic128Rsa15 | SecurityPolicy::Basic256 => hmac_sha1_sign(signing_key, data),
            SecurityPolicy::Basic256Sha256 | SecurityPolicy::Aes128Sha256RsaOaep | SecurityPolicy::Aes256Sha256RsaPss => {
                hmac_sha256_sign(signing_key, data)
            }
            SecurityPolicy::None => Ok(Vec::new()),
        }
    }

    /// Verify a symmetric HMAC produced by [`Self::sym_sign`].
    pub fn sym_verify(&self, signing_key: &[u8], data: &[u8], signature: &[u8]) -> EncodingResult<()> {
        let expected = self.sym_sign(signing_key, data)?;
        if expected.as_slice() == signature {
            Ok(())
        } else {
            Err(Error::new(StatusCode::BadSecurityChecksFailed, "symmetric signature mismatch"))
        }
    }

    /// Encrypt a chunk body with the derived per-direction AES key.
    pub fn sym_encrypt(&self, key: &AesKey, iv: &[u8], src: &[u8], dst: &mut [u8]) -> EncodingResult<usize> {
        key.encrypt(src, iv, dst)
    }

    /// Decrypt a chunk body with the derived per-direction AES key.
    pub fn sym_decrypt(&self, key: &AesKey, iv: &[u8], src: &[u8], dst: &mut [u8]) -> EncodingResult<usize> {
        key.decrypt(src, iv, dst)
    }

    /// P_SHA KDF (RFC 2246 `P_hash` keyed by this policy's signing hash),
    /// producing `signing_len + encrypt_len + iv_len` pseudo-random bytes
    /// split into (signing key, encryption key, IV).
    pub fn derive_keys(&self, secret: &[u8], seed: &[u8]) -> (Vec<u8>, AesKey, Vec<u8>) {
        let total = self.signing_key_length() + self.encryption_key_length() + self.encryption_block_size();
        let bytes = match self {
            SecurityPolicy::Basic128Rsa15 | SecurityPolicy::Basic256 => p_hash_sha1(secret, seed, total),
            _ => p_hash_sha256(secret, seed, total),
        };
        let (signing, rest) = bytes.split_at(self.signing_key_length());
        let (encrypt, iv) = rest.split_at(self.encryption_key_length());
        (signing.to_vec(), AesKey::new(*self, encrypt), iv.to_vec())
    }
}

fn hmac_sha1_sign(key: &[u8], data: &[u8]) -> EncodingResult<Vec<u8>> {
    let mut mac = Hmac::<Sha1>::new_from_slice(key).map_err(|e| Error::new(StatusCode::BadUnexpectedError, e.to_string()))?;
    mac.update(data);
    Ok(mac.finalize().into_bytes().to_vec())
}

fn hmac_sha256_sign(key: &[u8], data: &[u8]) -> EncodingResult<Vec<u8>> {
    let mut mac = Hmac::<Sha256>::new_from_slice(key).map_err(|e| Error::new(StatusCode::BadUnexpectedError, e.to_string()))?;
    mac.update(data);
    Ok(mac.finalize().into_bytes().to_vec())
}

/// RFC 2246 `P_hash`: `HMAC(secret, A(1)||seed) || HMAC(secret, A(2)||seed) || ...`
/// where `A(0) = seed` and `A(i) = HMAC(secret, A(i-1))`, truncated to `len` bytes.
fn p_hash_sha1(secret: &[u8], seed: &[u8], len: usize) -> Vec<u8> {
    p_hash_with(secret, seed, len, |key, data| {
        let mut mac = Hmac::<Sha1>::new_from_slice(key).expect("HMAC accepts any key length");
        mac.update(data);
        mac.finalize().into_bytes().to_vec()
    })
}

fn p_hash_sha256(secret: &[u8], seed: &[u8], len: usize) -> Vec<u8> {
    p_hash_with(secret, seed, len, |key, data| {
        let mut mac = Hmac::<Sha256>::new_from_slice(key).expect("HMAC accepts any key length");
        mac.update(data);
        mac.finalize().into_bytes().to_vec()
    })
}

fn p_hash_with(secret: &[u8], seed: &[u8], len: usize, hmac: impl Fn(&[u8], &[u8]) -> Vec<u8>) -> Vec<u8> {
    let mut result = Vec::with_capacity(len + 64);
    let mut a = seed.to_vec();
    while result.len() < len {
        a = hmac(secret, &a);
        let mut block_input = a.clone();
        block_input.extend_from_slice(seed);
        result.extend_from_slice(&hmac(secret, &block_input));
    }
    result.truncate(len);
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn p_hash_is_deterministic_and_exact_length() {
        let a = p_hash_sha256(b"secret", b"seed", 48);
        let b = p_hash_sha256(b"secret", b"seed", 48);
        assert_eq!(a, b);
        assert_eq!(a.len(), 48);
    }

    #[test]
    fn p_hash_differs_for_different_seeds() {
        let a = p_hash_sha256(b"secret", b"seed-one", 32);
        let b = p_hash_sha256(b"secret", b"seed-two", 32);
        assert_ne!(a, b);
    }

    #[test]
    fn derive_keys_splits_into_expected_lengths() {
        let policy = SecurityPolicy::Basic256Sha256;
        let (signing, encrypt, iv) = policy.derive_keys(b"shared-secret", b"client-server-nonces");
        assert_eq!(signing.len(), policy.signing_key_length());
        assert_eq!(encrypt.value().len(), policy.encryption_key_length());
        assert_eq!(iv.len(), policy.encryption_block_size());
    }

    #[test]
    fn sym_sign_and_verify_roundtrip() {
        let policy = SecurityPolicy::Basic256Sha256;
        let key = vec![7u8; 32];
        let sig = policy.sym_sign(&key, b"message bytes").unwrap();
        assert!(policy.sym_verify(&key, b"message bytes", &sig).is_ok());
        assert!(policy.sym_verify(&key, b"tampered bytes", &sig).is_err());
    }

    #[test]
    fn uri_roundtrips_through_from_uri() {
        for policy in [
            SecurityPolicy::None,
            SecurityPolicy::Basic128Rsa15,
            SecurityPolicy::Basic256,
            SecurityPolicy::Basic256Sha256,
            SecurityPolicy::Aes128Sha256RsaOaep,
            SecurityPolicy::Aes256Sha256RsaPss,
        ] {
            assert_eq!(SecurityPolicy::from_uri(policy.uri()), Some(policy));
        }
    }
}
