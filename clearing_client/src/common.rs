use chrono::{SecondsFormat, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use uuid::Uuid;

pub const NETWORK_FIN_ID_SCHEMA: &str = "NETWORK_ID";
pub const CHILEAN_ID_SCHEMA: &str = "CLID";

pub const CURRENT_ACCOUNT: &str = "current_account";
pub const SAVINGS_ACCOUNT: &str = "savings_account";
pub const CASH_ACCOUNT: &str = "cash_account";

/// A participant of the clearing network: a bank, the network itself, or a merchant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinancialInstitution {
    pub fin_id: String,
    pub fin_id_schema: String,
}

impl FinancialInstitution {
    pub fn new<S: Into<String>>(fin_id: S) -> Self {
        Self { fin_id: fin_id.into(), fin_id_schema: NETWORK_FIN_ID_SCHEMA.to_string() }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonId {
    pub id_schema: String,
    pub id: String,
}

impl PersonId {
    pub fn new<S: Into<String>>(id_schema: S, id: S) -> Self {
        Self { id_schema: id_schema.into(), id: id.into() }
    }

    /// A Chilean RUT, e.g. `11111111-1`.
    pub fn chilean<S: Into<String>>(rut: S) -> Self {
        Self { id_schema: CHILEAN_ID_SCHEMA.to_string(), id: rut.into() }
    }
}

/// The holder of a bank account: the debtor or creditor of an instruction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Party {
    pub name: String,
    pub identification: PersonId,
    pub financial_institution: FinancialInstitution,
    pub account: String,
    pub account_type: String,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageHeader {
    pub message_id: String,
    pub creation_date: String,
    pub sender: FinancialInstitution,
    pub receiver: FinancialInstitution,
}

impl MessageHeader {
    /// Creates a header with a fresh message id, stamped with the current time.
    pub fn new(sender: FinancialInstitution, receiver: FinancialInstitution) -> Self {
        Self {
            message_id: Uuid::new_v4().to_string(),
            creation_date: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, false),
            sender,
            receiver,
        }
    }
}

// Every message on the wire is wrapped in a `{"document": ...}` object.
#[derive(Serialize)]
struct DocumentRef<'a, T> {
    document: &'a T,
}

#[derive(Deserialize)]
struct Document<T> {
    document: T,
}

pub(crate) fn to_document_json<T: Serialize>(value: &T) -> Result<String, serde_json::Error> {
    serde_json::to_string(&DocumentRef { document: value })
}

pub(crate) fn from_document_json<T: DeserializeOwned>(json: &str) -> Result<T, serde_json::Error> {
    serde_json::from_str::<Document<T>>(json).map(|d| d.document)
}

pub(crate) fn new_transaction_id() -> String {
    Uuid::new_v4().to_string()
}
