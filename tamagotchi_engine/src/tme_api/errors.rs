use clearing_client::{ClearingApiError, ErrorDetail};
use thiserror::Error;

use crate::{
    db_types::TransactionId,
    traits::{CorrelationError, MessageStoreError, SignatureError},
};

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("Could not sign the envelope. {0}")]
    Signing(#[from] SignatureError),
    #[error("Could not serialize the envelope. {0}")]
    Serialization(String),
    #[error("Could not reach the clearing network. {0}")]
    Transport(String),
    #[error("The clearing network did not answer in time")]
    TransportTimeout,
    #[error("The clearing network rejected the submission with status {status}")]
    SubmissionRejected { status: u16, errors: Vec<ErrorDetail> },
    #[error("The clearing network accepted the submission but sent no network transaction id for {0}")]
    MissingNetworkTransactionId(TransactionId),
    #[error("Only envelopes with exactly one instruction can be submitted. This one has {0}.")]
    UnsupportedEnvelope(usize),
    #[error("{0}")]
    Store(#[from] MessageStoreError),
}

impl From<ClearingApiError> for DispatchError {
    fn from(e: ClearingApiError) -> Self {
        match e {
            ClearingApiError::Timeout => DispatchError::TransportTimeout,
            e => DispatchError::Transport(e.to_string()),
        }
    }
}

impl From<serde_json::Error> for DispatchError {
    fn from(e: serde_json::Error) -> Self {
        DispatchError::Serialization(e.to_string())
    }
}

/// Every variant but `Correlation` is raised before storage is touched.
#[derive(Debug, Error)]
pub enum CallbackError {
    #[error("The callback could not be parsed. {0}")]
    MalformedCallback(String),
    #[error("The callback carries no signature")]
    MissingSignature,
    #[error("The callback signature is invalid. {0}")]
    InvalidSignature(SignatureError),
    #[error("{0}")]
    Correlation(#[from] CorrelationError),
}
