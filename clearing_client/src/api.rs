use std::sync::Arc;

use log::*;
use reqwest::{
    header::{HeaderMap, HeaderValue, CONTENT_TYPE},
    Client,
};
use tmg_common::MessageKind;

use crate::{config::ClearingConfig, ClearingApiError, SubmissionResponse};

pub const API_KEY_HEADER: &str = "X-Clearing-Api-Key";
pub const SIGNATURE_HEADER: &str = "X-Clearing-Signature";

/// Posts already signed envelopes to the clearing network.
///
/// The transport never retries. Whatever the network answers is handed back as a [`SubmissionResponse`]; only
/// transport level failures (timeouts, connection errors) are returned as errors.
#[allow(async_fn_in_trait)]
pub trait ClearingTransport {
    async fn post_signed(
        &self,
        kind: MessageKind,
        envelope_json: &str,
        signature: &str,
    ) -> Result<SubmissionResponse, ClearingApiError>;
}

#[derive(Clone)]
pub struct ClearingApi {
    config: ClearingConfig,
    client: Arc<Client>,
}

impl ClearingApi {
    pub fn new(config: ClearingConfig) -> Result<Self, ClearingApiError> {
        let mut headers = HeaderMap::with_capacity(2);
        let val = HeaderValue::from_str(config.api_key.reveal().as_str())
            .map_err(|e| ClearingApiError::Initialization(e.to_string()))?;
        headers.insert(API_KEY_HEADER, val);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let client = Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()
            .map_err(|e| ClearingApiError::Initialization(e.to_string()))?;
        Ok(Self { config, client: Arc::new(client) })
    }

    pub fn url(&self, kind: MessageKind) -> String {
        format!("{}/messages/{}", self.config.base_url, kind.plural())
    }
}

impl ClearingTransport for ClearingApi {
    async fn post_signed(
        &self,
        kind: MessageKind,
        envelope_json: &str,
        signature: &str,
    ) -> Result<SubmissionResponse, ClearingApiError> {
        let url = self.url(kind);
        let sig = HeaderValue::from_str(signature).map_err(|e| ClearingApiError::RequestError(e.to_string()))?;
        trace!("Posting {kind} message to {url}");
        let response =
            self.client.post(url.as_str()).header(SIGNATURE_HEADER, sig).body(envelope_json.to_string()).send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;
        debug!("Clearing network answered {status} for {kind} submission");
        Ok(SubmissionResponse::from_http(status, body))
    }
}
