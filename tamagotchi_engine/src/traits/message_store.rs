use thiserror::Error;
use tmg_common::MessageKind;

use crate::db_types::{MessageId, NetworkTransactionId, NewMessage, PersistedMessage};

#[derive(Debug, Clone, Error)]
pub enum MessageStoreError {
    #[error("We have an internal database engine (configuration/uptime etc.) : {0}")]
    DatabaseError(String),
    #[error("Cannot insert message, since it already exists with id {0}")]
    DuplicateKey(MessageId),
    #[error("A message for network transaction {0} already exists")]
    DuplicateNetworkTransactionId(NetworkTransactionId),
}

impl From<sqlx::Error> for MessageStoreError {
    fn from(e: sqlx::Error) -> Self {
        MessageStoreError::DatabaseError(e.to_string())
    }
}

/// Persistence for accepted outbound messages.
///
/// Messages are never deleted, and their instruction content never changes. The only mutations are
/// [`record_callback`](MessageStore::record_callback) and
/// [`record_first_callback`](MessageStore::record_first_callback).
#[allow(async_fn_in_trait)]
pub trait MessageStore: Clone {
    /// Stores a newly accepted message.
    ///
    /// Fails with [`MessageStoreError::DuplicateKey`] if the message id is taken and with
    /// [`MessageStoreError::DuplicateNetworkTransactionId`] if another message already carries the network id.
    async fn put_message(&self, message: NewMessage) -> Result<PersistedMessage, MessageStoreError>;

    async fn fetch_message(&self, id: &MessageId) -> Result<Option<PersistedMessage>, MessageStoreError>;

    async fn fetch_message_by_network_id(
        &self,
        network_id: &NetworkTransactionId,
    ) -> Result<Option<PersistedMessage>, MessageStoreError>;

    /// All messages of the given kind, newest first.
    async fn fetch_messages(&self, kind: MessageKind) -> Result<Vec<PersistedMessage>, MessageStoreError>;

    /// Overwrites the callback body and signature of the message with the given network id.
    ///
    /// Returns the id of the updated message, or `None` if no message carries that network id.
    async fn record_callback(
        &self,
        network_id: &NetworkTransactionId,
        content: &str,
        signature: &str,
    ) -> Result<Option<MessageId>, MessageStoreError>;

    /// Like [`MessageStore::record_callback`], but leaves a message that already carries a callback untouched.
    /// Returns the id of the message that was updated, if any.
    async fn record_first_callback(
        &self,
        network_id: &NetworkTransactionId,
        content: &str,
        signature: &str,
    ) -> Result<Option<MessageId>, MessageStoreError>;
}
