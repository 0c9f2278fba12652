//! Network certificates.
//!
//! The network may sign callbacks with more than one key, e.g. during a key rotation. Certificates are configured as
//! JSON objects:
//!
//! ```json
//! {"subject": "NETWORK", "public_key": "<64 hex chars>", "not_before": "2024-01-01T00:00:00Z", "not_after": null}
//! ```
//!
//! The validity window is optional on both ends.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tari_crypto::{ristretto::RistrettoPublicKey, tari_utilities::hex::Hex};
use thiserror::Error;

use crate::helpers::MessageSchnorr;

#[derive(Debug, Clone, Error)]
pub enum CertificateError {
    #[error("Certificate is not valid JSON. {0}")]
    InvalidFormat(String),
    #[error("Certificate contains an invalid public key. {0}")]
    InvalidPublicKey(String),
    #[error("Certificate validity window is empty")]
    EmptyValidityWindow,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Certificate {
    /// The participant the key belongs to, e.g. the network's `fin_id`
    pub subject: String,
    pub public_key: RistrettoPublicKey,
    pub not_before: Option<DateTime<Utc>>,
    pub not_after: Option<DateTime<Utc>>,
}

#[derive(Serialize, Deserialize)]
struct CertificateJson {
    subject: String,
    public_key: String,
    #[serde(default)]
    not_before: Option<DateTime<Utc>>,
    #[serde(default)]
    not_after: Option<DateTime<Utc>>,
}

impl Certificate {
    pub fn new<S: Into<String>>(subject: S, public_key: RistrettoPublicKey) -> Self {
        Self { subject: subject.into(), public_key, not_before: None, not_after: None }
    }

    pub fn with_validity(
        mut self,
        not_before: Option<DateTime<Utc>>,
        not_after: Option<DateTime<Utc>>,
    ) -> Result<Self, CertificateError> {
        if let (Some(a), Some(b)) = (not_before, not_after) {
            if b <= a {
                return Err(CertificateError::EmptyValidityWindow);
            }
        }
        self.not_before = not_before;
        self.not_after = not_after;
        Ok(self)
    }

    pub fn from_json(json: &str) -> Result<Self, CertificateError> {
        let raw = serde_json::from_str::<CertificateJson>(json)
            .map_err(|e| CertificateError::InvalidFormat(e.to_string()))?;
        let public_key = RistrettoPublicKey::from_hex(&raw.public_key)
            .map_err(|e| CertificateError::InvalidPublicKey(e.to_string()))?;
        Self::new(raw.subject, public_key).with_validity(raw.not_before, raw.not_after)
    }

    pub fn as_json(&self) -> Result<String, CertificateError> {
        let raw = CertificateJson {
            subject: self.subject.clone(),
            public_key: self.public_key.to_hex(),
            not_before: self.not_before,
            not_after: self.not_after,
        };
        serde_json::to_string(&raw).map_err(|e| CertificateError::InvalidFormat(e.to_string()))
    }

    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        self.not_before.map_or(true, |t| now >= t) && self.not_after.map_or(true, |t| now < t)
    }
}

/// An ordered collection of certificates. Earlier entries are tried first.
#[derive(Debug, Clone, Default)]
pub struct CertificateSet {
    certificates: Vec<Certificate>,
}

impl CertificateSet {
    pub fn new(certificates: Vec<Certificate>) -> Self {
        Self { certificates }
    }

    pub fn len(&self) -> usize {
        self.certificates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.certificates.is_empty()
    }

    /// Appends a certificate, unless one with the same subject and key is already present.
    pub fn add(&mut self, certificate: Certificate) -> &mut Self {
        let exists = self
            .certificates
            .iter()
            .any(|c| c.subject == certificate.subject && c.public_key == certificate.public_key);
        if !exists {
            self.certificates.push(certificate);
        }
        self
    }

    /// Removes every certificate for the given key. Returns true if anything was removed.
    pub fn remove(&mut self, public_key: &RistrettoPublicKey) -> bool {
        let before = self.certificates.len();
        self.certificates.retain(|c| &c.public_key != public_key);
        before != self.certificates.len()
    }

    pub fn active(&self, now: DateTime<Utc>) -> impl Iterator<Item = &Certificate> {
        self.certificates.iter().filter(move |c| c.is_active_at(now))
    }

    /// The first active certificate for `subject` whose key verifies `signature` over `body`.
    pub fn find_signer(
        &self,
        body: &str,
        signature: &MessageSchnorr,
        subject: &str,
        now: DateTime<Utc>,
    ) -> Option<&Certificate> {
        self.active(now).filter(|c| c.subject == subject).find(|c| signature.verify(&c.public_key, body.as_bytes()))
    }
}
