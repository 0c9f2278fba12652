mod certificates;
mod message_signature;

pub use certificates::{Certificate, CertificateError, CertificateSet};
pub use message_signature::{
    hex_to_schnorr,
    sign_message,
    signature_to_hex,
    CertificateVerifier,
    KeySigner,
    MessageSchnorr,
};
