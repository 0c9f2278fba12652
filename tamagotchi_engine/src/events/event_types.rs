use chrono::{DateTime, Utc};

use crate::db_types::NetworkTransactionId;

/// A verified callback contained outcomes that matched neither a stored message nor a running test suite.
///
/// `content` and `signature` are exactly what was received, so the callback can be forwarded untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrphanCallbackEvent {
    pub content: String,
    pub signature: String,
    pub network_transaction_ids: Vec<NetworkTransactionId>,
    pub received_at: DateTime<Utc>,
}

impl OrphanCallbackEvent {
    pub fn new(content: String, signature: String, network_transaction_ids: Vec<NetworkTransactionId>) -> Self {
        Self { content, signature, network_transaction_ids, received_at: Utc::now() }
    }
}
