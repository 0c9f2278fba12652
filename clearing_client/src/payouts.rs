use serde::{Deserialize, Serialize};

use crate::common::{from_document_json, new_transaction_id, to_document_json, MessageHeader, Party};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayoutTransaction {
    pub transaction_id: String,
    pub currency: String,
    /// Integer amount, as a string of digits
    pub amount: String,
    pub description: String,
    pub debtor: Party,
    pub creditor: Party,
}

impl PayoutTransaction {
    /// Builds a payout with a freshly generated client transaction id.
    pub fn new<S: Into<String>>(currency: S, amount: S, description: S, debtor: Party, creditor: Party) -> Self {
        Self {
            transaction_id: new_transaction_id(),
            currency: currency.into(),
            amount: amount.into(),
            description: description.into(),
            debtor,
            creditor,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayoutMessage {
    pub header: MessageHeader,
    pub transactions: Vec<PayoutTransaction>,
}

impl PayoutMessage {
    pub fn new(header: MessageHeader, transactions: Vec<PayoutTransaction>) -> Self {
        Self { header, transactions }
    }

    pub fn as_json(&self) -> Result<String, serde_json::Error> {
        to_document_json(self)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        from_document_json(json)
    }
}
