// OPCUA for Rust
// SPDX-License-Identifier: MPL-2.0

//! [`SecureChannel`]: the per-connection security state machine. Tracks the
//! negotiated policy and mode, the active and about-to-expire symmetric
//! tokens, and the certificates/nonces used to derive them.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use opcua_crypto::{random, CertificateGroup, RsaPrivateKey, RsaPublicKey, SecurityPolicy};
use opcua_types::{
    generated::MessageSecurityMode, status_code::StatusCode, ByteString, Error,
};

use super::security_header::{AsymmetricSecurityHeader, SecurityHeader, SymmetricSecurityHeader};
use super::MessageChunkType;

/// Fraction of a token's lifetime after which the channel should ask for a renewal.
pub const TOKEN_RENEWAL_FRACTION: f64 = 0.75;

/// Which end of a channel this state belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Role hasn't been established yet.
    Unknown,
    /// The connection-initiating side.
    Client,
    /// The listening side.
    Server,
}

/// Keys derived for one token id, valid until `expires_at`.
#[derive(Debug, Clone)]
struct DerivedKeys {
    signing_key: Vec<u8>,
    encrypting_key: opcua_crypto::AesKey,
    iv: Vec<u8>,
    expires_at: DateTime<Utc>,
}

/// Negotiated security state for one transport connection.
///
/// Holds the policy, mode, certificates, and nonces exchanged during the
/// OpenSecureChannel handshake, plus the symmetric keys derived from them for
/// each token that has been issued (old tokens are kept around briefly so
/// in-flight chunks signed under them still verify during a renewal).
pub struct SecureChannel {
    role: Role,
    security_policy: SecurityPolicy,
    security_mode: MessageSecurityMode,
    secure_channel_id: u32,
    token_id: u32,
    previous_token_id: Option<u32>,
    token_created_at: DateTime<Utc>,
    token_lifetime: u32,
    cert_der: Option<Vec<u8>>,
    private_key: Option<RsaPrivateKey>,
    remote_cert_der: Option<Vec<u8>>,
    remote_public_key: Option<RsaPublicKey>,
    local_nonce: Vec<u8>,
    remote_nonce: Vec<u8>,
    local_keys: HashMap<u32, DerivedKeys>,
    remote_keys: HashMap<u32, DerivedKeys>,
}

impl SecureChannel {
    /// A fresh, unestablished channel for the given role.
    pub fn new(role: Role) -> Self {
        Self {
            role,
            security_policy: SecurityPolicy::None,
            security_mode: MessageSecurityMode::None,
            secure_channel_id: 0,
            token_id: 0,
            previous_token_id: None,
            token_created_at: Utc::now(),
            token_lifetime: 0,
            cert_der: None,
            private_key: None,
            remote_cert_der: None,
            remote_public_key: None,
            local_nonce: Vec::new(),
            remote_nonce: Vec::new(),
            local_keys: HashMap::new(),
            remote_keys: HashMap::new(),
        }
    }

    /// Which end of the channel this state represents.
    pub fn role(&self) -> Role {
        self.role
    }

    /// The negotiated security policy.
    pub fn security_policy(&self) -> SecurityPolicy {
        self.security_policy
    }

    /// Set the negotiated security policy.
    pub fn set_security_policy(&mut self, security_policy: SecurityPolicy) {
        self.security_policy = security_policy;
    }

    /// The negotiated message security mode.
    pub fn security_mode(&self) -> MessageSecurityMode {
        self.security_mode
    }

    /// Set the negotiated message security mode.
    pub fn set_security_mode(&mut self, security_mode: MessageSecurityMode) {
        self.security_mode = security_mode;
    }

    /// This channel's numeric id, assigned by the server on open.
    pub fn secure_channel_id(&self) -> u32 {
        self.secure_channel_id
    }

    /// Set the channel id.
    pub fn set_secure_channel_id(&mut self, id: u32) {
        self.secure_channel_id = id;
    }

    /// The currently active token id, echoed in symmetric security headers.
    pub fn token_id(&self) -> u32 {
        self.token_id
    }

    /// Our own certificate, DER-encoded.
    pub fn cert_der(&self) -> Option<&[u8]> {
        self.cert_der.as_deref()
    }

    /// Set our own certificate and matching private key.
    pub fn set_cert_and_private_key(&mut self, cert_der: Vec<u8>, private_key: RsaPrivateKey) {
        self.cert_der = Some(cert_der);
        self.private_key = Some(private_key);
    }

    /// Our own private key, once set by [`SecureChannel::set_cert_and_private_key`].
    pub fn private_key(&self) -> Option<&RsaPrivateKey> {
        self.private_key.as_ref()
    }

    /// The peer's certificate, DER-encoded, once received.
    pub fn remote_cert_der(&self) -> Option<&[u8]> {
        self.remote_cert_der.as_deref()
    }

    /// Record the peer's certificate and cache its decoded public key.
    pub fn set_remote_cert(&mut self, cert_der: Vec<u8>) -> Result<(), Error> {
        let public_key = opcua_crypto::StoredCertificate::from_der(cert_der.clone())
            .public_key()
            .ok_or_else(|| Error::new(StatusCode::BadCertificateInvalid, "could not extract RSA public key from certificate"))?;
        self.remote_cert_der = Some(cert_der);
        self.remote_public_key = Some(public_key);
        Ok(())
    }

    /// The peer's RSA public key, once its certificate has been received.
    pub fn remote_public_key(&self) -> Option<&RsaPublicKey> {
        self.remote_public_key.as_ref()
    }

    /// The most recent nonce generated by [`SecureChannel::create_random_nonce`].
    pub fn local_nonce(&self) -> &[u8] {
        &self.local_nonce
    }

    /// Generate and remember a fresh local nonce, returning it.
    pub fn create_random_nonce(&mut self) -> ByteString {
        let len = if self.security_policy.is_secure() { self.security_policy.signing_key_length() } else { 32 };
        let nonce = random::byte_string(len);
        self.local_nonce = nonce.as_bytes().to_vec();
        nonce
    }

    /// Record the nonce the peer sent.
    pub fn set_remote_nonce(&mut self, nonce: &ByteString) {
        self.remote_nonce = nonce.as_bytes().to_vec();
    }

    /// Derive symmetric keys for both directions from the exchanged nonces and install
    /// them under `token_id`. The previously active token (if any) is kept around so
    /// in-flight chunks signed under it still verify, and is discarded by
    /// [`SecureChannel::verify_and_remove_symmetric_security`] the first time a message
    /// verifies under the new token (SPEC_FULL.md's renewal rule: at most two tokens valid
    /// at once, closing back to exactly one).
    pub fn derive_keys(&mut self, token_id: u32, lifetime_ms: u32) {
        if self.token_id != 0 && self.token_id != token_id {
            self.previous_token_id = Some(self.token_id);
        }
        self.token_id = token_id;
        self.token_created_at = Utc::now();
        self.token_lifetime = lifetime_ms;

        let (client_signing, client_encrypting, client_iv) = self.security_policy.derive_keys(&self.remote_nonce, &self.local_nonce);
        let (server_signing, server_encrypting, server_iv) = self.security_policy.derive_keys(&self.local_nonce, &self.remote_nonce);

        let expires_at = self.token_created_at + Duration::milliseconds(lifetime_ms as i64);

        let (local, remote) = match self.role {
            Role::Server => (
                DerivedKeys { signing_key: server_signing, encrypting_key: server_encrypting, iv: server_iv, expires_at },
                DerivedKeys { signing_key: client_signing, encrypting_key: client_encrypting, iv: client_iv, expires_at },
            ),
            _ => (
                DerivedKeys { signing_key: client_signing, encrypting_key: client_encrypting, iv: client_iv, expires_at },
                DerivedKeys { signing_key: server_signing, encrypting_key: server_encrypting, iv: server_iv, expires_at },
            ),
        };
        self.local_keys.insert(token_id, local);
        self.remote_keys.insert(token_id, remote);
    }

    /// `true` once the active token has consumed `TOKEN_RENEWAL_FRACTION` of its lifetime.
    pub fn should_renew_security_token(&self) -> bool {
        if self.token_lifetime == 0 {
            return false;
        }
        let deadline = self.token_created_at + Duration::milliseconds((self.token_lifetime as f64 * TOKEN_RENEWAL_FRACTION) as i64);
        Utc::now() >= deadline
    }

    /// Build the security header for a chunk of the given type.
    pub fn make_security_header(&self, message_type: MessageChunkType) -> SecurityHeader {
        if message_type.is_open_secure_channel() {
            if self.security_policy == SecurityPolicy::None {
                SecurityHeader::Asymmetric(AsymmetricSecurityHeader::none())
            } else {
                let thumbprint = self
                    .remote_cert_der
                    .as_deref()
                    .map(opcua_crypto::certificate_store::thumbprint)
                    .map(ByteString::from)
                    .unwrap_or_else(ByteString::null);
                SecurityHeader::Asymmetric(AsymmetricSecurityHeader::new(
                    self.security_policy,
                    self.cert_der.as_deref().unwrap_or(&[]),
                    thumbprint,
                ))
            }
        } else {
            SecurityHeader::Symmetric(SymmetricSecurityHeader { token_id: self.token_id })
        }
    }

    /// Length in bytes of the symmetric signature this channel appends to message chunks.
    pub fn symmetric_signature_size(&self) -> usize {
        if self.security_mode == MessageSecurityMode::None {
            0
        } else {
            self.security_policy.symmetric_signature_size()
        }
    }

    /// Sign (and, if the mode calls for it, encrypt) a plaintext chunk body using the
    /// currently active token's local keys.
    pub fn apply_symmetric_security(&self, plaintext: &[u8]) -> Result<Vec<u8>, Error> {
        if self.security_mode == MessageSecurityMode::None {
            return Ok(plaintext.to_vec());
        }
        let keys = self
            .local_keys
            .get(&self.token_id)
            .ok_or_else(|| Error::new(StatusCode::BadSecureChannelTokenUnknown, "no local keys for active token"))?;

        let block_size = keys.encrypting_key.block_size();
        let mut padded = plaintext.to_vec();
        let pad_len = block_size - (padded.len() % block_size);
        padded.resize(padded.len() + pad_len, pad_len as u8);

        let body = if self.security_mode == MessageSecurityMode::SignAndEncrypt {
            let mut ciphertext = vec![0u8; padded.len()];
            self.security_policy.sym_encrypt(&keys.encrypting_key, &keys.iv, &padded, &mut ciphertext)?;
            ciphertext
        } else {
            padded
        };

        let signature = self.security_policy.sym_sign(&keys.signing_key, &body)?;
        let mut out = body;
        out.extend_from_slice(&signature);
        Ok(out)
    }

    /// Verify and, if the mode calls for it, decrypt a chunk body signed under `token_id`
    /// using that token's remote keys. Returns the plaintext with padding removed.
    ///
    /// Once a message verifies under the *current* token, the previous token's keys (if
    /// any survived a renewal) are dropped from both `local_keys` and `remote_keys` — the
    /// channel has now observed the handover and no longer needs to accept the old token.
    pub fn verify_and_remove_symmetric_security(&mut self, token_id: u32, data: &[u8]) -> Result<Vec<u8>, Error> {
        if self.security_mode == MessageSecurityMode::None {
            if token_id == self.token_id {
                self.discard_previous_token();
            }
            return Ok(data.to_vec());
        }
        let keys = self
            .remote_keys
            .get(&token_id)
            .ok_or_else(|| Error::new(StatusCode::BadSecureChannelTokenUnknown, "unknown or expired token"))?;

        let sig_len = self.security_policy.symmetric_signature_size();
        if data.len() < sig_len {
            return Err(Error::new(StatusCode::BadSecurityChecksFailed, "chunk too small to contain signature"));
        }
        let (body, signature) = data.split_at(data.len() - sig_len);
        self.security_policy.sym_verify(&keys.signing_key, body, signature)?;

        let plaintext = if self.security_mode == MessageSecurityMode::SignAndEncrypt {
            let mut plaintext = vec![0u8; body.len()];
            self.security_policy.sym_decrypt(&keys.encrypting_key, &keys.iv, body, &mut plaintext)?;
            plaintext
        } else {
            body.to_vec()
        };

        let pad_len = *plaintext.last().unwrap_or(&0) as usize;
        if pad_len == 0 || pad_len > plaintext.len() {
            return Err(Error::new(StatusCode::BadSecurityChecksFailed, "invalid padding"));
        }
        let mut plaintext = plaintext;
        plaintext.truncate(plaintext.len() - pad_len);
        if token_id == self.token_id {
            self.discard_previous_token();
        }
        Ok(plaintext)
    }

    /// Drop the previous token's local/remote key material, if any remains. Called once a
    /// message has verified under the current token, closing the renewal window.
    fn discard_previous_token(&mut self) {
        if let Some(previous) = self.previous_token_id.take() {
            self.local_keys.remove(&previous);
            self.remote_keys.remove(&previous);
        }
    }

    /// The token id that is still valid alongside the current one during a brief renewal
    /// window, if a message hasn't yet verified under the current token.
    pub fn previous_token_id(&self) -> Option<u32> {
        self.previous_token_id
    }

    /// Validate the peer's certificate against a trust list, failing the handshake if untrusted.
    pub fn verify_remote_certificate(&self, trust_group: &CertificateGroup) -> Result<(), Error> {
        let der = self.remote_cert_der.clone().ok_or_else(|| Error::new(StatusCode::BadCertificateInvalid, "no remote certificate"))?;
        let cert = opcua_crypto::StoredCertificate::from_der(der);
        trust_group.verify_trust(&cert)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_channel_has_no_security() {
        let channel = SecureChannel::new(Role::Client);
        assert_eq!(channel.security_policy(), SecurityPolicy::None);
        assert_eq!(channel.security_mode(), MessageSecurityMode::None);
        assert!(!channel.should_renew_security_token());
    }

    #[test]
    fn apply_and_remove_symmetric_security_roundtrips_when_signed_and_encrypted() {
        let mut client = SecureChannel::new(Role::Client);
        let mut server = SecureChannel::new(Role::Server);
        client.set_security_policy(SecurityPolicy::Basic256Sha256);
        server.set_security_policy(SecurityPolicy::Basic256Sha256);
        client.set_security_mode(MessageSecurityMode::SignAndEncrypt);
        server.set_security_mode(MessageSecurityMode::SignAndEncrypt);

        let client_nonce = client.create_random_nonce();
        let server_nonce = server.create_random_nonce();
        client.set_remote_nonce(&server_nonce);
        server.set_remote_nonce(&client_nonce);

        client.derive_keys(1, 60_000);
        server.derive_keys(1, 60_000);

        let plaintext = b"hello secure world".to_vec();
        let wire = client.apply_symmetric_security(&plaintext).unwrap();
        let recovered = server.verify_and_remove_symmetric_security(1, &wire).unwrap();
        assert_eq!(recovered, plaintext);
    }

    #[test]
    fn renewal_keeps_both_tokens_until_the_new_one_verifies_then_discards_the_old_one() {
        let mut client = SecureChannel::new(Role::Client);
        let mut server = SecureChannel::new(Role::Server);
        client.set_security_policy(SecurityPolicy::Basic256Sha256);
        server.set_security_policy(SecurityPolicy::Basic256Sha256);
        client.set_security_mode(MessageSecurityMode::Sign);
        server.set_security_mode(MessageSecurityMode::Sign);

        let client_nonce = client.create_random_nonce();
        let server_nonce = server.create_random_nonce();
        client.set_remote_nonce(&server_nonce);
        server.set_remote_nonce(&client_nonce);

        client.derive_keys(1, 60_000);
        server.derive_keys(1, 60_000);
        assert_eq!(server.previous_token_id(), None);

        // A message signed under token 1 is still in flight when the renewal completes.
        let in_flight = client.apply_symmetric_security(b"pre-renewal").unwrap();

        let client_nonce = client.create_random_nonce();
        let server_nonce = server.create_random_nonce();
        client.set_remote_nonce(&server_nonce);
        server.set_remote_nonce(&client_nonce);
        client.derive_keys(2, 60_000);
        server.derive_keys(2, 60_000);
        assert_eq!(server.previous_token_id(), Some(1));

        // The in-flight chunk signed under the old token still verifies.
        assert!(server.verify_and_remove_symmetric_security(1, &in_flight).is_ok());
        // Old keys haven't been pruned yet: no message has verified under token 2.
        assert_eq!(server.previous_token_id(), Some(1));

        let under_new_token = client.apply_symmetric_security(b"post-renewal").unwrap();
        assert!(server.verify_and_remove_symmetric_security(2, &under_new_token).is_ok());
        // The handover is observed: the old token is gone.
        assert_eq!(server.previous_token_id(), None);
        assert!(server.verify_and_remove_symmetric_security(1, &in_flight).is_err());
    }

    #[test]
    fn tampering_is_rejected() {
        let mut client = SecureChannel::new(Role::Client);
        let mut server = SecureChannel::new(Role::Server);
        client.set_security_policy(SecurityPolicy::Basic256Sha256);
        server.set_security_policy(SecurityPolicy::Basic256Sha256);
        client.set_security_mode(MessageSecurityMode::Sign);
        server.set_security_mode(MessageSecurityMode::Sign);

        let client_nonce = client.create_random_nonce();
        let server_nonce = server.create_random_nonce();
        client.set_remote_nonce(&server_nonce);
        server.set_remote_nonce(&client_nonce);
        client.derive_keys(9, 60_000);
        server.derive_keys(9, 60_000);

        let mut wire = client.apply_symmetric_security(b"payload").unwrap();
        let last = wire.len() - 1;
        wire[last] ^= 0xFF;
        assert!(server.verify_and_remove_symmetric_security(9, &wire).is_err());
    }
}
