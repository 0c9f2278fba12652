use std::{collections::BTreeMap, fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
use clearing_client::{ErrorDetail, OutboundMessage, Response, ResponseMessage};
use log::*;
use serde::{Deserialize, Serialize};
use sqlx::{types::Json, FromRow, Type};
use thiserror::Error;
pub use tmg_common::MessageKind;

/// The status reported for a message before any callback has been stored for it.
pub const PENDING_STATUS: &str = "pending";

//--------------------------------------       MessageId       ---------------------------------------------------------
/// Identifies an outbound envelope. It is the `message_id` in the envelope header.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct MessageId(pub String);

impl MessageId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for MessageId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for MessageId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl Display for MessageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

//--------------------------------------     TransactionId     ---------------------------------------------------------
/// Client generated identifier of a single instruction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct TransactionId(pub String);

impl TransactionId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for TransactionId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for TransactionId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl Display for TransactionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

//--------------------------------------  NetworkTransactionId  --------------------------------------------------------
/// The identifier the clearing network assigns to an instruction when it accepts it. Callbacks are matched on it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct NetworkTransactionId(pub String);

impl NetworkTransactionId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for NetworkTransactionId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for NetworkTransactionId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl Display for NetworkTransactionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

//--------------------------------------      NewMessage       ---------------------------------------------------------
#[derive(Debug, Clone)]
pub struct NewMessage {
    pub id: MessageId,
    pub kind: MessageKind,
    pub transaction_id: TransactionId,
    pub network_transaction_id: NetworkTransactionId,
    pub content: String,
    pub signature: String,
    pub redirect_url: Option<String>,
}

//--------------------------------------   PersistedMessage    ---------------------------------------------------------
/// A single-instruction envelope that the network accepted, along with the most recent callback received for it.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct PersistedMessage {
    pub id: MessageId,
    pub kind: MessageKind,
    pub transaction_id: TransactionId,
    pub network_transaction_id: NetworkTransactionId,
    pub content: String,
    pub signature: String,
    pub redirect_url: Option<String>,
    pub response_content: Option<String>,
    pub response_signature: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PersistedMessage {
    /// Parses the stored envelope.
    pub fn outbound(&self) -> Result<OutboundMessage, serde_json::Error> {
        OutboundMessage::from_json(self.kind, &self.content)
    }

    /// The outcome for this message's network id in the stored callback, if there is one.
    ///
    /// A stored callback can report on several instructions; only the entry for this message is returned.
    pub fn response(&self) -> Option<Response> {
        let content = self.response_content.as_ref()?;
        let message = ResponseMessage::from_json(content)
            .map_err(|e| warn!("🗃️ Stored callback for message {} could not be parsed. {e}", self.id))
            .ok()?;
        message.response_for(self.network_transaction_id.as_str()).cloned()
    }

    /// The network transaction status, or `"pending"` until a callback has been stored.
    pub fn status(&self) -> String {
        self.response().map(|r| r.network_transaction_status().to_string()).unwrap_or_else(|| PENDING_STATUS.into())
    }

    pub fn response_status(&self) -> Option<String> {
        self.response().map(|r| r.response_status().to_string())
    }
}

//--------------------------------------      SuiteStatus      ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum SuiteStatus {
    Running,
    Finished,
}

impl Display for SuiteStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SuiteStatus::Running => write!(f, "running"),
            SuiteStatus::Finished => write!(f, "finished"),
        }
    }
}

#[derive(Debug, Clone, Error)]
#[error("Invalid suite status: {0}")]
pub struct ConversionError(String);

impl FromStr for SuiteStatus {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "running" => Ok(Self::Running),
            "finished" => Ok(Self::Finished),
            s => Err(ConversionError(s.to_string())),
        }
    }
}

//--------------------------------------       TestSuite       ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize)]
pub struct TestSuite {
    pub id: i64,
    pub status: SuiteStatus,
    pub created_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl TestSuite {
    pub fn is_running(&self) -> bool {
        self.status == SuiteStatus::Running
    }
}

//--------------------------------------      TestMessage      ---------------------------------------------------------
#[derive(Debug, Clone)]
pub struct NewTestMessage {
    pub description: String,
    pub kind: MessageKind,
    pub content: String,
    pub http_status: Option<u16>,
    pub http_response: Option<String>,
    pub error_message: Option<String>,
    /// client transaction id -> network transaction id
    pub transaction_id_mapping: BTreeMap<String, String>,
}

/// An envelope sent by a test suite, whether or not the network accepted it.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct TestMessage {
    pub id: i64,
    pub suite_id: i64,
    pub created_at: DateTime<Utc>,
    pub description: String,
    pub kind: MessageKind,
    pub content: String,
    pub http_status: Option<i64>,
    pub http_response: Option<String>,
    pub error_message: Option<String>,
    pub transaction_id_mapping: Json<BTreeMap<String, String>>,
}

impl TestMessage {
    pub fn transaction_ids(&self) -> impl Iterator<Item = &String> {
        self.transaction_id_mapping.0.keys()
    }

    pub fn network_transaction_id(&self, transaction_id: &str) -> Option<&str> {
        self.transaction_id_mapping.0.get(transaction_id).map(String::as_str)
    }
}

//--------------------------------------     TestResponse      ---------------------------------------------------------
#[derive(Debug, Clone)]
pub struct NewTestResponse {
    pub network_transaction_id: NetworkTransactionId,
    pub transaction_id: Option<TransactionId>,
    /// The outcome, serialized as JSON
    pub content: String,
}

/// A callback outcome captured by a running test suite because no stored message matched it.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct TestResponse {
    pub id: i64,
    pub suite_id: i64,
    pub created_at: DateTime<Utc>,
    pub network_transaction_id: NetworkTransactionId,
    pub transaction_id: Option<TransactionId>,
    pub content: String,
}

impl TestResponse {
    pub fn outcome(&self) -> Result<Response, serde_json::Error> {
        serde_json::from_str(&self.content)
    }
}

//--------------------------------------    CallbackOutcome    ---------------------------------------------------------
/// One outcome out of a verified callback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallbackOutcome {
    pub kind: MessageKind,
    pub network_transaction_id: NetworkTransactionId,
    pub transaction_id: Option<TransactionId>,
    pub status: String,
    pub response_status: String,
    pub errors: Vec<ErrorDetail>,
    /// The outcome as it appeared in the callback, serialized as JSON
    pub content: String,
}

impl CallbackOutcome {
    pub fn from_response(response: &Response) -> Result<Self, serde_json::Error> {
        Ok(Self {
            kind: response.kind(),
            network_transaction_id: response.network_transaction_id().into(),
            transaction_id: response.transaction_id().map(TransactionId::from),
            status: response.network_transaction_status().to_string(),
            response_status: response.response_status().to_string(),
            errors: response.errors().to_vec(),
            content: serde_json::to_string(response)?,
        })
    }
}

/// A verified callback, ready for correlation.
#[derive(Debug, Clone)]
pub struct CallbackDelivery {
    /// The raw request body, exactly as received
    pub content: String,
    pub signature: String,
    pub outcomes: Vec<CallbackOutcome>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackTarget {
    /// The callback was stored against this message
    Recorded(MessageId),
    /// The running test suite captured the outcome
    Captured { suite_id: i64 },
    /// Nothing matched
    Orphan,
}

#[derive(Debug, Clone)]
pub struct CallbackDisposition {
    pub outcome: CallbackOutcome,
    pub target: CallbackTarget,
}

impl CallbackDisposition {
    pub fn is_orphan(&self) -> bool {
        matches!(self.target, CallbackTarget::Orphan)
    }
}
