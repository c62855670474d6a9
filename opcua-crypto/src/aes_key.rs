// OPCUA for Rust
// SPDX-License-Identifier: MPL-2.0

//! Symmetric encryption/decryption wrapper around a derived AES key.

use aes::cipher::{block_padding::NoPadding, generic_array::GenericArray, BlockDecryptMut, BlockEncryptMut, KeyIvInit};

use opcua_types::{status_code::StatusCode, Error};

use crate::security_policy::SecurityPolicy;

type Aes128CbcEnc = cbc::Encryptor<aes::Aes128>;
type Aes128CbcDec = cbc::Decryptor<aes::Aes128>;
type Aes256CbcEnc = cbc::Encryptor<aes::Aes256>;
type Aes256CbcDec = cbc::Decryptor<aes::Aes256>;

const AES_BLOCK_SIZE: usize = 16;
const AES128_KEY_SIZE: usize = 16;
const AES256_KEY_SIZE: usize = 32;

type AesArray128 = GenericArray<u8, <aes::Aes128 as aes::cipher::BlockSizeUser>::BlockSize>;
type AesArray256 = GenericArray<u8, <aes::Aes256 as aes::cipher::KeySizeUser>::KeySize>;

type EncryptResult = Result<usize, Error>;

/// A derived per-direction AES key, paired with the policy that dictates its
/// size and cipher mode (always CBC with no padding; chunk bodies are
/// pre-padded to the block size per Part 6's chunking rules).
#[derive(Debug, Clone)]
pub struct AesKey {
    value: Vec<u8>,
    security_policy: SecurityPolicy,
}

impl AesKey {
    /// Wrap a raw derived key under the given security policy.
    pub fn new(security_policy: SecurityPolicy, value: &[u8]) -> AesKey {
        AesKey {
            value: value.to_vec(),
            security_policy,
        }
    }

    /// The raw key bytes.
    pub fn value(&self) -> &[u8] {
        &self.value
    }

    fn validate_args(&self, src: &[u8], iv: &[u8], dst: &[u8]) -> Result<(), Error> {
        if dst.len() < src.len() {
            Err(Error::new(
                StatusCode::BadUnexpectedError,
                format!("dst buffer too small: {} vs src {}", dst.len(), src.len()),
            ))
        } else if iv.len() != self.iv_length() {
            Err(Error::new(
                StatusCode::BadUnexpectedError,
                format!("iv is not the expected size, len = {}", iv.len()),
            ))
        } else if src.len() % self.block_size() != 0 {
            Err(Error::new(
                StatusCode::BadUnexpectedError,
                format!("src length {} is not a multiple of the block size", src.len()),
            ))
        } else {
            Ok(())
        }
    }

    fn encrypt_aes128_cbc(&self, src: &[u8], iv: &[u8], dst: &mut [u8]) -> EncryptResult {
        self.validate_args(src, iv, dst)?;
        Aes128CbcEnc::new(AesArray128::from_slice(&self.value), AesArray128::from_slice(iv))
            .encrypt_padded_b2b_mut::<NoPadding>(src, dst)
            .map_err(|e| Error::new(StatusCode::BadUnexpectedError, e.to_string()))?;
        Ok(src.len())
    }

    fn encrypt_aes256_cbc(&self, src: &[u8], iv: &[u8], dst: &mut [u8]) -> EncryptResult {
        self.validate_args(src, iv, dst)?;
        Aes256CbcEnc::new(AesArray256::from_slice(&self.value), AesArray128::from_slice(iv))
            .encrypt_padded_b2b_mut::<NoPadding>(src, dst)
            .map_err(|e| Error::new(StatusCode::BadUnexpectedError, e.to_string()))?;
        Ok(src.len())
    }

    fn decrypt_aes128_cbc(&self, src: &[u8], iv: &[u8], dst: &mut [u8]) -> EncryptResult {
        self.validate_args(src, iv, dst)?;
        Aes128CbcDec::new(AesArray128::from_slice(&self.value), AesArray128::from_slice(iv))
            .decrypt_padded_b2b_mut::<NoPadding>(src, dst)
            .map_err(|e| Error::new(StatusCode::BadUnexpectedError, e.to_string()))?;
        Ok(src.len())
    }

    fn decrypt_aes256_cbc(&self, src: &[u8], iv: &[u8], dst: &mut [u8]) -> EncryptResult {
        self.validate_args(src, iv, dst)?;
        Aes256CbcDec::new(AesArray256::from_slice(&self.value), AesArray128::from_slice(iv))
            .decrypt_padded_b2b_mut::<NoPadding>(src, dst)
            .map_err(|e| Error::new(StatusCode::BadUnexpectedError, e.to_string()))?;
        Ok(src.len())
    }

    /// Cipher block size for this key's policy; `0` for `SecurityPolicy::None`.
    pub fn block_size(&self) -> usize {
        if matches!(self.security_policy, SecurityPolicy::None) {
            0
        } else {
            AES_BLOCK_SIZE
        }
    }

    /// IV length. Equal to the block size for every AES-CBC policy.
    pub fn iv_length(&self) -> usize {
        self.block_size()
    }

    /// Expected key length for this key's policy.
    pub fn key_length(&self) -> usize {
        match self.security_policy {
            SecurityPolicy::Basic128Rsa15 | SecurityPolicy::Aes128Sha256RsaOaep => AES128_KEY_SIZE,
            SecurityPolicy::Basic256 | SecurityPolicy::Basic256Sha256 | SecurityPolicy::Aes256Sha256RsaPss => AES256_KEY_SIZE,
            SecurityPolicy::None => 0,
        }
    }

    /// Encrypt `src` (already block-aligned) into `dst` under `iv`.
    pub fn encrypt(&self, src: &[u8], iv: &[u8], dst: &mut [u8]) -> EncryptResult {
        match self.security_policy {
            SecurityPolicy::Basic128Rsa15 | SecurityPolicy::Aes128Sha256RsaOaep => self.encrypt_aes128_cbc(src, iv, dst),
            SecurityPolicy::Basic256 | SecurityPolicy::Basic256Sha256 | SecurityPolicy::Aes256Sha256RsaPss => {
                self.encrypt_aes256_cbc(src, iv, dst)
            }
            SecurityPolicy::None => Err(Error::new(StatusCode::BadSecurityPolicyRejected, "None has no symmetric cipher")),
        }
    }

    /// Decrypt `src` into `dst` under `iv`, the nonce negotiated for the channel direction.
    pub fn decrypt(&self, src: &[u8], iv: &[u8], dst: &mut [u8]) -> EncryptResult {
        match self.security_policy {
            SecurityPolicy::Basic128Rsa15 | SecurityPolicy::Aes128Sha256RsaOaep => self.decrypt_aes128_cbc(src, iv, dst),
            SecurityPolicy::Basic256 | SecurityPolicy::Basic256Sha256 | SecurityPolicy::Aes256Sha256RsaPss => {
                self.decrypt_aes256_cbc(src, iv, dst)
            }
            SecurityPolicy::None => Err(Error::new(StatusCode::BadSecurityPolicyRejected, "None has no symmetric cipher")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aes256_cbc_roundtrips() {
        let key_bytes = [9u8; AES256_KEY_SIZE];
        let iv = [1u8; AES_BLOCK_SIZE];
        let key = AesKey::new(SecurityPolicy::Basic256Sha256, &key_bytes);
        let plaintext = [42u8; 32]; // two blocks
        let mut ciphertext = [0u8; 32];
        key.encrypt(&plaintext, &iv, &mut ciphertext).unwrap();
        assert_ne!(ciphertext, plaintext);

        let mut decrypted = [0u8; 32];
        key.decrypt(&ciphertext, &iv, &mut decrypted).unwrap();
        assert_eq!(decrypted, plaintext);
    }

    #[test]
    fn rejects_wrong_iv_length() {
        let key = AesKey::new(SecurityPolicy::Basic256Sha256, &[9u8; AES256_KEY_SIZE]);
        let mut dst = [0u8; 16];
        assert!(key.encrypt(&[0u8; 16], &[0u8; 8], &mut dst).is_err());
    }
}
