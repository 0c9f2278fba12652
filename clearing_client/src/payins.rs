use serde::{Deserialize, Serialize};

use crate::common::{from_document_json, new_transaction_id, to_document_json, MessageHeader, Party};

/// Payins where the payer is redirected to a payment page hosted by the network.
pub const INTERACTIVE_PAYIN: &str = "interactive";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayinTransaction {
    pub transaction_id: String,
    pub payin_type: String,
    pub currency: String,
    pub amount: String,
    pub description: String,
    /// The merchant account receiving the funds
    pub creditor: Party,
    /// The payer, when known in advance. Interactive payins normally leave this empty.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub debtor: Option<Party>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub success_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure_url: Option<String>,
}

impl PayinTransaction {
    pub fn interactive<S: Into<String>>(currency: S, amount: S, description: S, creditor: Party) -> Self {
        Self {
            transaction_id: new_transaction_id(),
            payin_type: INTERACTIVE_PAYIN.to_string(),
            currency: currency.into(),
            amount: amount.into(),
            description: description.into(),
            creditor,
            debtor: None,
            success_url: None,
            failure_url: None,
        }
    }

    pub fn with_redirects(mut self, success_url: Option<String>, failure_url: Option<String>) -> Self {
        self.success_url = success_url;
        self.failure_url = failure_url;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayinMessage {
    pub header: MessageHeader,
    pub transactions: Vec<PayinTransaction>,
}

impl PayinMessage {
    pub fn new(header: MessageHeader, transactions: Vec<PayinTransaction>) -> Self {
        Self { header, transactions }
    }

    pub fn as_json(&self) -> Result<String, serde_json::Error> {
        to_document_json(self)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        from_document_json(json)
    }
}
