use std::fmt::Display;

use chrono::SecondsFormat;
use clearing_client::{OutboundMessage, Party};
use log::*;
use serde::{Deserialize, Serialize};
use tamagotchi_engine::{
    db_types::{PersistedMessage, TestSuite},
    suite_objects::{CapturedOutcome, MatchedTransaction, SuiteReport},
};
use tmg_common::{digits_only, format_amount, MessageKind};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonResponse {
    pub success: bool,
    pub message: String,
}

impl JsonResponse {
    pub fn success<S: Display>(message: S) -> Self {
        Self { success: true, message: message.to_string() }
    }
}

/// The operator's payout form. The merchant is always the debtor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PayoutForm {
    pub name: String,
    pub rut: String,
    pub email: String,
    pub bank_id: String,
    pub account_number: String,
    pub account_type: String,
    /// Free text. Everything but the digits is dropped.
    pub amount: String,
    pub description: String,
}

/// The operator's payin form. The merchant is the creditor and the payer picks their account on the network's
/// payment page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PayinForm {
    pub amount: String,
    pub description: String,
    #[serde(default)]
    pub success_url: Option<String>,
    #[serde(default)]
    pub failure_url: Option<String>,
}

/// A stored message as the operator sees it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageView {
    pub id: String,
    pub kind: MessageKind,
    pub transaction_id: String,
    pub network_transaction_id: String,
    pub currency: String,
    /// With `.` as the thousands separator
    pub amount: String,
    pub description: String,
    /// The creditor of a payout, or the payer of a payin once known
    pub counterparty: Option<Party>,
    /// `"pending"` until the network reports on the transaction
    pub status: String,
    pub response_status: Option<String>,
    pub redirect_url: Option<String>,
    pub created_at: String,
}

impl From<&PersistedMessage> for MessageView {
    fn from(message: &PersistedMessage) -> Self {
        let (currency, amount, description, counterparty) = match message.outbound() {
            Ok(OutboundMessage::Payout(m)) => match m.transactions.first() {
                Some(tx) => {
                    (tx.currency.clone(), tx.amount.clone(), tx.description.clone(), Some(tx.creditor.clone()))
                },
                None => Default::default(),
            },
            Ok(OutboundMessage::Payin(m)) => match m.transactions.first() {
                Some(tx) => (tx.currency.clone(), tx.amount.clone(), tx.description.clone(), tx.debtor.clone()),
                None => Default::default(),
            },
            Err(e) => {
                warn!("💻️ Stored message {} could not be parsed. {e}", message.id);
                Default::default()
            },
        };
        let amount = digits_only(&amount).map(format_amount).unwrap_or(amount);
        Self {
            id: message.id.to_string(),
            kind: message.kind,
            transaction_id: message.transaction_id.to_string(),
            network_transaction_id: message.network_transaction_id.to_string(),
            currency,
            amount,
            description,
            counterparty,
            status: message.status(),
            response_status: message.response_status(),
            redirect_url: message.redirect_url.clone(),
            created_at: message.created_at.to_rfc3339_opts(SecondsFormat::Secs, true).replace('T', " "),
        }
    }
}

/// Summary of the running test suite. All counts are zero when no suite is running.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TesterDashboard {
    pub current_suite: Option<TestSuite>,
    pub messages_sent: usize,
    pub transactions_sent: usize,
    pub responses_received: usize,
    pub acknowledged: usize,
    pub matched: Vec<MatchedTransaction>,
    pub outcomes: Vec<CapturedOutcome>,
}

impl From<SuiteReport> for TesterDashboard {
    fn from(report: SuiteReport) -> Self {
        Self {
            messages_sent: report.messages_sent,
            transactions_sent: report.transactions_sent(),
            responses_received: report.responses_received(),
            acknowledged: report.acknowledged(),
            current_suite: Some(report.suite),
            matched: report.matched,
            outcomes: report.outcomes,
        }
    }
}
