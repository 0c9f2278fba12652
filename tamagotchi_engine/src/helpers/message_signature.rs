//! # Message signatures
//!
//! Envelopes and callbacks are signed with a domain-separated Ristretto Schnorr signature over the exact bytes of the
//! serialized JSON body. The signature travels in a header, separately from the body, as a 128 character hex string:
//!
//! ```text
//!    {public nonce (64 hex chars)}{signature scalar (64 hex chars)}
//! ```
//!
//! Because the signature covers the raw bytes, a body must be verified exactly as it was received. Re-serializing a
//! parsed message will, in general, not reproduce the signed bytes.
use chrono::Utc;
use clearing_client::MessageHeader;
use log::*;
use tari_crypto::{
    hash_domain,
    keys::PublicKey,
    ristretto::{RistrettoPublicKey, RistrettoSchnorrWithDomain, RistrettoSecretKey},
    signatures::SchnorrSignatureError,
    tari_utilities::hex::Hex,
};

use crate::{
    helpers::CertificateSet,
    traits::{MessageSigner, MessageVerifier, SignatureError},
};

hash_domain!(ClearingMessageDomain, "Tamagotchi.ClearingMessage");

pub type MessageSchnorr = RistrettoSchnorrWithDomain<ClearingMessageDomain>;

pub fn sign_message(body: &str, secret_key: &RistrettoSecretKey) -> Result<MessageSchnorr, SchnorrSignatureError> {
    let mut rng = rand::thread_rng();
    MessageSchnorr::sign(secret_key, body.as_bytes(), &mut rng)
}

pub fn signature_to_hex(sig: &MessageSchnorr) -> String {
    let nonce = sig.get_public_nonce().to_hex();
    let sig = sig.get_signature().to_hex();
    format!("{nonce}{sig}")
}

pub fn hex_to_schnorr<E: From<String>>(s: &str) -> Result<MessageSchnorr, E> {
    if s.len() != 128 || !s.is_ascii() {
        return Err(E::from("Invalid signature length".into()));
    }
    let nonce = RistrettoPublicKey::from_hex(&s[..64])
        .map_err(|e| E::from(format!("Signature contains an invalid public nonce. {e}")))?;
    let sig = RistrettoSecretKey::from_hex(&s[64..])
        .map_err(|e| E::from(format!("Signature contains an invalid signature key. {e}")))?;
    Ok(MessageSchnorr::new(nonce, sig))
}

//-------------------------------------------------  KeySigner  --------------------------------------------------------
/// Signs outbound envelopes with the merchant's secret key.
#[derive(Clone)]
pub struct KeySigner {
    secret_key: RistrettoSecretKey,
    public_key: RistrettoPublicKey,
}

impl KeySigner {
    pub fn new(secret_key: RistrettoSecretKey) -> Self {
        let public_key = RistrettoPublicKey::from_secret_key(&secret_key);
        Self { secret_key, public_key }
    }

    pub fn from_hex(hex: &str) -> Result<Self, SignatureError> {
        let secret_key = RistrettoSecretKey::from_hex(hex)
            .map_err(|e| SignatureError::SigningFailed(format!("Invalid signing key. {e}")))?;
        Ok(Self::new(secret_key))
    }

    pub fn public_key(&self) -> &RistrettoPublicKey {
        &self.public_key
    }
}

impl MessageSigner for KeySigner {
    fn sign(&self, body: &str) -> Result<String, SignatureError> {
        let sig = sign_message(body, &self.secret_key).map_err(|e| SignatureError::SigningFailed(e.to_string()))?;
        Ok(signature_to_hex(&sig))
    }
}

//---------------------------------------------  CertificateVerifier  --------------------------------------------------
/// Accepts callbacks sent by the network to the merchant and signed by any currently valid network certificate.
#[derive(Debug, Clone)]
pub struct CertificateVerifier {
    network_id: String,
    merchant_id: String,
    certificates: CertificateSet,
}

impl CertificateVerifier {
    pub fn new<S: Into<String>>(network_id: S, merchant_id: S, certificates: CertificateSet) -> Self {
        Self { network_id: network_id.into(), merchant_id: merchant_id.into(), certificates }
    }
}

impl MessageVerifier for CertificateVerifier {
    fn verify(&self, body: &str, signature: &str, header: &MessageHeader) -> Result<String, SignatureError> {
        if header.sender.fin_id != self.network_id || header.receiver.fin_id != self.merchant_id {
            return Err(SignatureError::UnexpectedParties {
                sender: header.sender.fin_id.clone(),
                receiver: header.receiver.fin_id.clone(),
            });
        }
        let sig = hex_to_schnorr::<SignatureError>(signature)?;
        let cert = self
            .certificates
            .find_signer(body, &sig, &self.network_id, Utc::now())
            .ok_or(SignatureError::NoMatchingCertificate)?;
        trace!("🔐️ Callback signature verified against certificate for {}", cert.subject);
        Ok(cert.subject.clone())
    }
}
