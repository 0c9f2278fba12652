use serde::{Deserialize, Serialize};
use tmg_common::MessageKind;

use crate::common::{from_document_json, to_document_json, MessageHeader};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub error_code: String,
    pub error_message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayoutResponse {
    pub response_status: String,
    pub network_transaction_id: String,
    #[serde(default)]
    pub transaction_id: Option<String>,
    pub network_transaction_status: String,
    #[serde(default)]
    pub errors: Vec<ErrorDetail>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayinResponse {
    pub response_status: String,
    pub network_transaction_id: String,
    #[serde(default)]
    pub transaction_id: Option<String>,
    pub network_transaction_status: String,
    #[serde(default)]
    pub payment_reference: Option<String>,
    #[serde(default)]
    pub errors: Vec<ErrorDetail>,
}

/// The outcome of a single instruction, as reported asynchronously by the network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "transaction_type", rename_all = "lowercase")]
pub enum Response {
    Payout(PayoutResponse),
    Payin(PayinResponse),
}

impl Response {
    pub fn kind(&self) -> MessageKind {
        match self {
            Response::Payout(_) => MessageKind::Payout,
            Response::Payin(_) => MessageKind::Payin,
        }
    }

    pub fn network_transaction_id(&self) -> &str {
        match self {
            Response::Payout(r) => &r.network_transaction_id,
            Response::Payin(r) => &r.network_transaction_id,
        }
    }

    pub fn transaction_id(&self) -> Option<&str> {
        match self {
            Response::Payout(r) => r.transaction_id.as_deref(),
            Response::Payin(r) => r.transaction_id.as_deref(),
        }
    }

    pub fn network_transaction_status(&self) -> &str {
        match self {
            Response::Payout(r) => &r.network_transaction_status,
            Response::Payin(r) => &r.network_transaction_status,
        }
    }

    pub fn response_status(&self) -> &str {
        match self {
            Response::Payout(r) => &r.response_status,
            Response::Payin(r) => &r.response_status,
        }
    }

    pub fn errors(&self) -> &[ErrorDetail] {
        match self {
            Response::Payout(r) => &r.errors,
            Response::Payin(r) => &r.errors,
        }
    }
}

/// A callback delivered by the network. One message may report on several instructions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseMessage {
    pub header: MessageHeader,
    #[serde(default)]
    pub responses: Vec<Response>,
}

impl ResponseMessage {
    pub fn new(header: MessageHeader, responses: Vec<Response>) -> Self {
        Self { header, responses }
    }

    pub fn as_json(&self) -> Result<String, serde_json::Error> {
        to_document_json(self)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        from_document_json(json)
    }

    /// The outcome reported for the given network transaction id, if this message carries one.
    pub fn response_for(&self, network_transaction_id: &str) -> Option<&Response> {
        self.responses.iter().find(|r| r.network_transaction_id() == network_transaction_id)
    }
}
