use std::{fmt::Debug, sync::Arc};

use clearing_client::ResponseMessage;
use log::*;

use crate::{
    db_types::{CallbackDelivery, CallbackDisposition, CallbackOutcome, CallbackTarget, NetworkTransactionId},
    events::{EventProducers, OrphanCallbackEvent},
    tme_api::errors::CallbackError,
    traits::{CallbackCorrelation, MessageStore, MessageStoreError, MessageVerifier},
};

/// `CallbackApi` handles the signed callbacks the clearing network delivers to the merchant.
///
/// A callback is parsed, then authenticated, and only then correlated. Nothing is written unless every check passes.
pub struct CallbackApi<B> {
    db: B,
    verifier: Arc<dyn MessageVerifier + Send + Sync>,
    producers: EventProducers,
}

impl<B> Debug for CallbackApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "CallbackApi")
    }
}

impl<B> CallbackApi<B> {
    pub fn new(db: B, verifier: Arc<dyn MessageVerifier + Send + Sync>, producers: EventProducers) -> Self {
        Self { db, verifier, producers }
    }

    pub fn db(&self) -> &B {
        &self.db
    }
}

impl<B> CallbackApi<B>
where B: CallbackCorrelation + MessageStore
{
    /// Processes one callback delivery. `body` must be the request body exactly as received.
    ///
    /// Outcomes that match nothing are reported through the orphan callback hook once the correlation has been
    /// committed.
    pub async fn process_callback(
        &self,
        body: &str,
        signature: Option<&str>,
    ) -> Result<Vec<CallbackDisposition>, CallbackError> {
        let message = ResponseMessage::from_json(body).map_err(|e| CallbackError::MalformedCallback(e.to_string()))?;
        let signature = signature.filter(|s| !s.is_empty()).ok_or(CallbackError::MissingSignature)?;
        let signer = self.verifier.verify(body, signature, &message.header).map_err(CallbackError::InvalidSignature)?;
        trace!("🔄️ Callback {} signed by {signer}", message.header.message_id);
        let outcomes = message
            .responses
            .iter()
            .map(CallbackOutcome::from_response)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| CallbackError::MalformedCallback(e.to_string()))?;
        let delivery = CallbackDelivery { content: body.to_string(), signature: signature.to_string(), outcomes };
        let dispositions = self.db.correlate_callback(&delivery).await?;
        let orphans = dispositions
            .iter()
            .filter(|d| d.is_orphan())
            .map(|d| d.outcome.network_transaction_id.clone())
            .collect::<Vec<_>>();
        let recorded = dispositions.iter().filter(|d| matches!(d.target, CallbackTarget::Recorded(_))).count();
        let captured = dispositions.len() - recorded - orphans.len();
        debug!(
            "🔄️ Callback {} processed. {recorded} recorded, {captured} captured by the test suite, {} orphaned",
            message.header.message_id,
            orphans.len()
        );
        if !orphans.is_empty() {
            let ids = orphans.iter().map(|id| id.as_str()).collect::<Vec<_>>().join(", ");
            warn!("🔄️ Callback {} carries outcomes for unknown transactions: {ids}", message.header.message_id);
            let event = OrphanCallbackEvent::new(delivery.content, delivery.signature, orphans);
            self.producers.publish_orphan_callback(event).await;
        }
        Ok(dispositions)
    }

    /// Looks up the orphaned network ids of a callback again, and records the callback on any that now match.
    ///
    /// A message that received a callback in the meantime keeps it, since that callback is newer than the orphan.
    /// Returns the ids that still match no message.
    pub async fn recheck_orphans(
        &self,
        event: &OrphanCallbackEvent,
    ) -> Result<Vec<NetworkTransactionId>, MessageStoreError> {
        let mut remaining = Vec::new();
        for network_id in &event.network_transaction_ids {
            if let Some(id) = self.db.record_first_callback(network_id, &event.content, &event.signature).await? {
                info!("🔄️ Late correlation: callback for {network_id} recorded on message {id}");
                continue;
            }
            match self.db.fetch_message_by_network_id(network_id).await? {
                Some(message) => {
                    debug!("🔄️ Message {} already has a callback for {network_id}. Orphan dropped.", message.id)
                },
                None => remaining.push(network_id.clone()),
            }
        }
        Ok(remaining)
    }
}
