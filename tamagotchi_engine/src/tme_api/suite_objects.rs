use std::collections::{BTreeMap, BTreeSet};

use clearing_client::{ErrorDetail, OutboundMessage};
use log::*;
use serde::Serialize;
use tmg_common::MessageKind;

use crate::db_types::{TestMessage, TestResponse, TestSuite};

/// One instruction of an envelope sent by a test suite.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SentTransaction {
    pub test_message_id: i64,
    pub description: String,
    pub kind: MessageKind,
    pub transaction_id: String,
    pub network_transaction_id: Option<String>,
    pub http_status: Option<i64>,
    pub error_message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CapturedOutcome {
    pub test_response_id: i64,
    pub network_transaction_id: String,
    /// The client transaction id, either carried by the outcome or resolved through the network id
    pub transaction_id: Option<String>,
    pub status: Option<String>,
    pub response_status: Option<String>,
    pub errors: Vec<ErrorDetail>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatchedTransaction {
    pub transaction: SentTransaction,
    pub outcome: CapturedOutcome,
}

/// What a test suite sent, what it received, and how the two line up.
#[derive(Debug, Clone, Serialize)]
pub struct SuiteReport {
    pub suite: TestSuite,
    pub messages_sent: usize,
    pub transactions: Vec<SentTransaction>,
    pub outcomes: Vec<CapturedOutcome>,
    pub matched: Vec<MatchedTransaction>,
}

impl SuiteReport {
    /// Joins sent instructions and captured outcomes on the client transaction id. Outcomes that only carry the
    /// network id are resolved through the id mappings returned when the envelopes were accepted.
    pub fn build(suite: TestSuite, messages: Vec<TestMessage>, responses: Vec<TestResponse>) -> Self {
        let mut network_to_client = BTreeMap::new();
        let mut transactions = Vec::new();
        for message in &messages {
            for (tx_id, network_id) in message.transaction_id_mapping.0.iter() {
                network_to_client.insert(network_id.clone(), tx_id.clone());
            }
            let tx_ids = match OutboundMessage::from_json(message.kind, &message.content) {
                Ok(envelope) => envelope.transaction_ids().into_iter().map(String::from).collect::<Vec<_>>(),
                Err(e) => {
                    debug!("🧪️ Test message {} has no parseable content. {e}", message.id);
                    message.transaction_ids().cloned().collect()
                },
            };
            for tx_id in tx_ids {
                transactions.push(SentTransaction {
                    test_message_id: message.id,
                    description: message.description.clone(),
                    kind: message.kind,
                    network_transaction_id: message.network_transaction_id(&tx_id).map(String::from),
                    transaction_id: tx_id,
                    http_status: message.http_status,
                    error_message: message.error_message.clone(),
                });
            }
        }
        let outcomes = responses
            .iter()
            .map(|r| {
                let outcome = r
                    .outcome()
                    .map_err(|e| warn!("🧪️ Captured response {} could not be parsed. {e}", r.id))
                    .ok();
                let transaction_id = r
                    .transaction_id
                    .as_ref()
                    .map(|t| t.as_str().to_string())
                    .or_else(|| network_to_client.get(r.network_transaction_id.as_str()).cloned());
                CapturedOutcome {
                    test_response_id: r.id,
                    network_transaction_id: r.network_transaction_id.as_str().to_string(),
                    transaction_id,
                    status: outcome.as_ref().map(|o| o.network_transaction_status().to_string()),
                    response_status: outcome.as_ref().map(|o| o.response_status().to_string()),
                    errors: outcome.as_ref().map(|o| o.errors().to_vec()).unwrap_or_default(),
                }
            })
            .collect::<Vec<_>>();
        let by_tx_id = transactions.iter().map(|t| (t.transaction_id.as_str(), t)).collect::<BTreeMap<_, _>>();
        let matched = outcomes
            .iter()
            .filter_map(|o| {
                let tx = by_tx_id.get(o.transaction_id.as_deref()?)?;
                Some(MatchedTransaction { transaction: (*tx).clone(), outcome: o.clone() })
            })
            .collect();
        Self { suite, messages_sent: messages.len(), transactions, outcomes, matched }
    }

    pub fn transactions_sent(&self) -> usize {
        self.transactions.len()
    }

    pub fn responses_received(&self) -> usize {
        self.outcomes.len()
    }

    /// Sent instructions for which at least one outcome was captured.
    pub fn acknowledged(&self) -> usize {
        self.matched.iter().map(|m| m.transaction.transaction_id.as_str()).collect::<BTreeSet<_>>().len()
    }
}
