// OPCUA for Rust
// SPDX-License-Identifier: MPL-2.0

//! In-memory trust/reject/issuer certificate lists, replaced atomically by
//! pointer swap so the SecureChannel's handshake thread never blocks on a
//! writer reloading the trust list from disk.
//!
//! Loading certificates from a watched directory is an external
//! collaborator's job (see `SPEC_FULL.md` §1 Non-goals); this module only
//! owns the in-memory lists and the verification decision against them.

use std::sync::Arc;

use arc_swap::ArcSwap;
use der::Decode;
use opcua_types::{status_code::StatusCode, Error};
use rsa::pkcs1::DecodeRsaPublicKey;
use sha1::{Digest, Sha1};
use x509_cert::Certificate;

use crate::RsaPublicKey;

/// One DER-encoded X.509 certificate, kept verbatim alongside its parsed
/// subject for logging (parsing is best-effort and never blocks trust checks).
#[derive(Debug, Clone)]
pub struct StoredCertificate {
    der: Vec<u8>,
    subject: Option<String>,
}

impl StoredCertificate {
    /// Wrap a DER-encoded certificate, parsing its subject for diagnostics.
    pub fn from_der(der: Vec<u8>) -> Self {
        let subject = Certificate::from_der(&der).ok().map(|c| c.tbs_certificate.subject.to_string());
        Self { der, subject }
    }

    /// The raw DER bytes, as they'd appear on the wire.
    pub fn der(&self) -> &[u8] {
        &self.der
    }

    /// The parsed subject distinguished name, if the certificate parsed.
    pub fn subject(&self) -> Option<&str> {
        self.subject.as_deref()
    }

    /// Extract the RSA public key carried in this certificate, if it parses
    /// as one. OPC UA security policies are all RSA-based.
    pub fn public_key(&self) -> Option<RsaPublicKey> {
        let cert = Certificate::from_der(&self.der).ok()?;
        let spki = &cert.tbs_certificate.subject_public_key_info;
        let raw = spki.subject_public_key.as_bytes()?;
        RsaPublicKey::from_pkcs1_der(raw).ok()
    }
}

/// SHA-1 thumbprint of a DER-encoded certificate, as carried in the security
/// header's `receiver_certificate_thumbprint` field.
pub fn thumbprint(der: &[u8]) -> Vec<u8> {
    let mut hasher = Sha1::new();
    hasher.update(der);
    hasher.finalize().to_vec()
}

impl PartialEq for StoredCertificate {
    fn eq(&self, other: &Self) -> bool {
        self.der == other.der
    }
}

#[derive(Debug, Default, Clone)]
struct CertificateGroupLists {
    trusted: Vec<StoredCertificate>,
    rejected: Vec<StoredCertificate>,
    issuers: Vec<StoredCertificate>,
}

/// A named certificate trust domain (e.g. "secureChannelPKI" or
/// "sessionPKI" per `SPEC_FULL.md` §3.1's configuration note), holding
/// atomically-replaceable trust/reject/issuer lists.
pub struct CertificateGroup {
    name: String,
    lists: ArcSwap<CertificateGroupLists>,
}

impl CertificateGroup {
    /// Create an empty group with no trusted/rejected/issuer certificates.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            lists: ArcSwap::from_pointee(CertificateGroupLists::default()),
        }
    }

    /// The group's name, e.g. `"secureChannelPKI"`.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Atomically replace the trusted/rejected/issuer lists. Readers mid-handshake
    /// keep seeing the old snapshot until their next lookup.
    pub fn replace(&self, trusted: Vec<StoredCertificate>, rejected: Vec<StoredCertificate>, issuers: Vec<StoredCertificate>) {
        self.lists.store(Arc::new(CertificateGroupLists { trusted, rejected, issuers }));
    }

    /// Accept `cert` if it is directly in the trust list, or if it is signed
    /// by a certificate in the issuer list and not explicitly rejected.
    ///
    /// This is a simplified trust decision (direct match or single-level
    /// issuer match) rather than a full X.509 path-building chain validator;
    /// multi-level CA chains are not walked.
    pub fn verify_trust(&self, cert: &StoredCertificate) -> Result<(), Error> {
        let lists = self.lists.load();
        if lists.rejected.iter().any(|r| r == cert) {
            return Err(Error::new(StatusCode::BadCertificateUntrusted, "certificate is in the reject list"));
        }
        if lists.trusted.iter().any(|t| t == cert) {
            return Ok(());
        }
        let issued_by_trusted_issuer = match (cert.subject(), &lists.issuers) {
            (Some(_), issuers) if !issuers.is_empty() => {
                let parsed = Certificate::from_der(cert.der()).map_err(|e| Error::new(StatusCode::BadCertificateInvalid, e.to_string()))?;
                let issuer_name = parsed.tbs_certificate.issuer.to_string();
                issuers.iter().any(|i| i.subject() == Some(issuer_name.as_str()))
            }
            _ => false,
        };
        if issued_by_trusted_issuer {
            Ok(())
        } else {
            Err(Error::new(StatusCode::BadCertificateUntrusted, "certificate is not trusted and has no trusted issuer"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fake_cert(tag: u8) -> StoredCertificate {
        // Not a real X.509 structure; subject parsing is expected to fail and
        // fall back to `None`, which is exactly the "untrusted, no issuer
        // match" path these tests exercise.
        StoredCertificate::from_der(vec![tag; 16])
    }

    #[test]
    fn untrusted_certificate_is_rejected() {
        let group = CertificateGroup::new("secureChannelPKI");
        let cert = fake_cert(1);
        assert!(group.verify_trust(&cert).is_err());
    }

    #[test]
    fn directly_trusted_certificate_is_accepted() {
        let group = CertificateGroup::new("secureChannelPKI");
        let cert = fake_cert(2);
        group.replace(vec![cert.clone()], vec![], vec![]);
        assert!(group.verify_trust(&cert).is_ok());
    }

    #[test]
    fn rejected_certificate_is_never_accepted_even_if_also_trusted() {
        let group = CertificateGroup::new("secureChannelPKI");
        let cert = fake_cert(3);
        group.replace(vec![cert.clone()], vec![cert.clone()], vec![]);
        assert!(group.verify_trust(&cert).is_err());
    }

    #[test]
    fn trust_list_replacement_is_visible_to_subsequent_checks() {
        let group = CertificateGroup::new("secureChannelPKI");
        let cert = fake_cert(4);
        assert!(group.verify_trust(&cert).is_err());
        group.replace(vec![cert.clone()], vec![], vec![]);
        assert!(group.verify_trust(&cert).is_ok());
    }
}
