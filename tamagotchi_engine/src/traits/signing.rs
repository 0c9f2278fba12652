use clearing_client::MessageHeader;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum SignatureError {
    #[error("Could not sign message. {0}")]
    SigningFailed(String),
    #[error("Malformed signature. {0}")]
    MalformedSignature(String),
    #[error("Message was sent by {sender} to {receiver}, which is not a valid route")]
    UnexpectedParties { sender: String, receiver: String },
    #[error("No valid certificate matches the signature")]
    NoMatchingCertificate,
}

impl From<String> for SignatureError {
    fn from(e: String) -> Self {
        Self::MalformedSignature(e)
    }
}

/// Produces the detached signature sent alongside an outbound envelope.
pub trait MessageSigner {
    fn sign(&self, body: &str) -> Result<String, SignatureError>;
}

/// Authenticates inbound callbacks.
pub trait MessageVerifier {
    /// Checks `signature` over the exact `body` bytes. The parsed `header` must name the network as sender and the
    /// merchant as receiver. On success, returns the subject of the certificate that matched.
    fn verify(&self, body: &str, signature: &str, header: &MessageHeader) -> Result<String, SignatureError>;
}
