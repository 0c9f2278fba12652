//! Handling of callbacks that matched no stored message and no running test suite.
//!
//! A callback can beat the local commit of the submission it reports on. Each orphan is therefore looked up again
//! after a short delay. Whatever still matches nothing is forwarded, body and signature untouched, to the configured
//! downstream URL, or logged when there is none.
use std::sync::Arc;

use clearing_client::SIGNATURE_HEADER;
use futures::FutureExt;
use log::*;
use reqwest::{header::CONTENT_TYPE, Client};
use tamagotchi_engine::{
    db_types::NetworkTransactionId,
    events::{EventHooks, OrphanCallbackEvent},
    CallbackApi,
    CallbackCorrelation,
    MessageStore,
    SqliteDatabase,
};

use crate::{config::OrphanConfig, errors::ServerError};

pub struct OrphanForwarder<B> {
    api: CallbackApi<B>,
    client: Client,
    config: OrphanConfig,
}

impl<B> OrphanForwarder<B>
where B: CallbackCorrelation + MessageStore
{
    pub fn new(api: CallbackApi<B>, config: OrphanConfig) -> Result<Self, ServerError> {
        let client = Client::builder().build().map_err(|e| ServerError::InitializeError(e.to_string()))?;
        Ok(Self { api, client, config })
    }

    /// Waits out the recheck delay, then records late matches and forwards the rest.
    ///
    /// Returns the ids that were still orphaned after the recheck.
    pub async fn handle(&self, event: OrphanCallbackEvent) -> Vec<NetworkTransactionId> {
        tokio::time::sleep(self.config.recheck_delay).await;
        let remaining = match self.api.recheck_orphans(&event).await {
            Ok(remaining) => remaining,
            Err(e) => {
                error!("📨️ Could not recheck orphaned callback received at {}. {e}", event.received_at);
                event.network_transaction_ids.clone()
            },
        };
        if remaining.is_empty() {
            debug!("📨️ Every outcome of the callback received at {} has since been matched", event.received_at);
            return remaining;
        }
        let ids = remaining.iter().map(|id| id.as_str()).collect::<Vec<_>>().join(", ");
        match &self.config.forward_url {
            Some(url) => self.forward(url, &event, &ids).await,
            None => error!(
                "📨️ Received a callback for unknown transactions [{ids}] and there is nowhere to forward it. Body: {}",
                event.content
            ),
        }
        remaining
    }

    async fn forward(&self, url: &str, event: &OrphanCallbackEvent, ids: &str) {
        let result = self
            .client
            .post(url)
            .header(CONTENT_TYPE, "application/json")
            .header(SIGNATURE_HEADER, event.signature.as_str())
            .body(event.content.clone())
            .send()
            .await;
        match result {
            Ok(res) if res.status().is_success() => info!("📨️ Forwarded callback for [{ids}] to {url}"),
            Ok(res) => warn!("📨️ {url} answered HTTP {} to the forwarded callback for [{ids}]", res.status()),
            Err(e) => error!("📨️ Could not forward callback for [{ids}] to {url}. {e}"),
        }
    }
}

/// Registers the forwarder as the orphan callback hook.
pub fn register_orphan_hook(hooks: &mut EventHooks, forwarder: OrphanForwarder<SqliteDatabase>) {
    let forwarder = Arc::new(forwarder);
    hooks.on_orphan_callback(move |event| {
        let forwarder = Arc::clone(&forwarder);
        async move {
            forwarder.handle(event).await;
        }
        .boxed()
    });
}
