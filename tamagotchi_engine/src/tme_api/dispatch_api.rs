use std::{fmt::Debug, sync::Arc};

use clearing_client::{ClearingTransport, OutboundMessage, SubmissionResponse};
use log::*;
use tmg_common::MessageKind;

use crate::{
    db_types::{MessageId, NetworkTransactionId, NewMessage, PersistedMessage, TransactionId},
    tme_api::errors::DispatchError,
    traits::{MessageSigner, MessageStore, MessageStoreError},
};

/// An envelope that was signed and posted, along with the network's synchronous answer.
#[derive(Debug, Clone)]
pub struct SentMessage {
    pub message_id: MessageId,
    pub kind: MessageKind,
    /// The exact bytes that were signed and posted
    pub content: String,
    pub signature: String,
    pub response: SubmissionResponse,
}

/// `DispatchApi` signs outbound envelopes, hands them to the clearing transport and registers accepted submissions in
/// the message store. It never retries.
pub struct DispatchApi<B, T> {
    db: B,
    transport: T,
    signer: Arc<dyn MessageSigner + Send + Sync>,
}

impl<B, T> Debug for DispatchApi<B, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "DispatchApi")
    }
}

impl<B, T> DispatchApi<B, T> {
    pub fn new(db: B, transport: T, signer: Arc<dyn MessageSigner + Send + Sync>) -> Self {
        Self { db, transport, signer }
    }

    pub fn db(&self) -> &B {
        &self.db
    }
}

impl<B, T> DispatchApi<B, T>
where
    B: MessageStore,
    T: ClearingTransport,
{
    /// Serializes, signs and posts the envelope. Nothing is persisted.
    ///
    /// Any HTTP status counts as a successful send here. Only signing, serialization and transport failures are errors.
    pub async fn send(&self, envelope: &OutboundMessage) -> Result<SentMessage, DispatchError> {
        let content = envelope.as_json()?;
        let signature = self.signer.sign(&content)?;
        let kind = envelope.kind();
        let message_id = MessageId::from(envelope.message_id());
        trace!("🔄️ Sending {kind} message {message_id}");
        let response = self.transport.post_signed(kind, &content, &signature).await?;
        debug!("🔄️ {kind} message {message_id} answered with HTTP {}", response.http_status);
        Ok(SentMessage { message_id, kind, content, signature, response })
    }

    /// Sends a single-instruction envelope and, if the network accepts it, stores it against its network id.
    ///
    /// If the network reports the submission as already accepted and a message with the same network id is already
    /// stored, that message is returned unchanged.
    pub async fn submit(&self, envelope: OutboundMessage) -> Result<PersistedMessage, DispatchError> {
        let count = envelope.transaction_count();
        if count != 1 {
            return Err(DispatchError::UnsupportedEnvelope(count));
        }
        let sent = self.send(&envelope).await?;
        if !sent.response.is_accepted() {
            warn!(
                "🔄️ {} message {} was rejected with HTTP {}: {}",
                sent.kind, sent.message_id, sent.response.http_status, sent.response.http_body
            );
            return Err(DispatchError::SubmissionRejected {
                status: sent.response.http_status,
                errors: sent.response.errors,
            });
        }
        let transaction_id = envelope
            .transaction_ids()
            .first()
            .map(|t| TransactionId::from(*t))
            .ok_or(DispatchError::UnsupportedEnvelope(0))?;
        let network_id = sent
            .response
            .network_transaction_id(transaction_id.as_str())
            .map(NetworkTransactionId::from)
            .ok_or_else(|| DispatchError::MissingNetworkTransactionId(transaction_id.clone()))?;
        if sent.response.is_already_accepted() {
            if let Some(existing) = self.db.fetch_message_by_network_id(&network_id).await? {
                info!("🔄️ Network transaction {network_id} was already accepted as message {}", existing.id);
                return Ok(existing);
            }
        }
        let redirect_url = sent.response.redirect_url(transaction_id.as_str()).map(String::from);
        let message = NewMessage {
            id: sent.message_id,
            kind: sent.kind,
            transaction_id,
            network_transaction_id: network_id.clone(),
            content: sent.content,
            signature: sent.signature,
            redirect_url,
        };
        match self.db.put_message(message).await {
            Ok(message) => {
                info!("🔄️ {} message {} accepted as network transaction {network_id}", message.kind, message.id);
                Ok(message)
            },
            // A concurrent submission of the same content got there first
            Err(MessageStoreError::DuplicateNetworkTransactionId(_)) if sent.response.is_already_accepted() => self
                .db
                .fetch_message_by_network_id(&network_id)
                .await?
                .ok_or(DispatchError::Store(MessageStoreError::DuplicateNetworkTransactionId(network_id))),
            Err(e) => Err(e.into()),
        }
    }
}
