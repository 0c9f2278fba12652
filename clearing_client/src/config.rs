use std::time::Duration;

use log::*;
use tmg_common::Secret;

pub const DEFAULT_API_HOST: &str = "dev.clearing.example";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
pub struct ClearingConfig {
    /// e.g. `https://dev.clearing.example/v1`
    pub base_url: String,
    pub api_key: Secret<String>,
    pub timeout: Duration,
}

impl Default for ClearingConfig {
    fn default() -> Self {
        Self {
            base_url: format!("https://{DEFAULT_API_HOST}/v1"),
            api_key: Secret::default(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl ClearingConfig {
    pub fn new<S: Into<String>>(base_url: S, api_key: Secret<String>, timeout: Duration) -> Self {
        Self { base_url: base_url.into(), api_key, timeout }
    }

    pub fn new_from_env_or_default() -> Self {
        let host = std::env::var("TMG_NETWORK_API_HOST").unwrap_or_else(|_| {
            warn!("🪛️ TMG_NETWORK_API_HOST not set, using {DEFAULT_API_HOST} as default");
            DEFAULT_API_HOST.to_string()
        });
        let api_key = Secret::new(std::env::var("TMG_API_KEY").unwrap_or_else(|_| {
            warn!("🪛️ TMG_API_KEY not set. Submissions to the clearing network will be rejected.");
            String::default()
        }));
        let timeout = std::env::var("TMG_TRANSPORT_TIMEOUT")
            .ok()
            .and_then(|s| {
                s.parse::<u64>()
                    .map_err(|e| warn!("🪛️ Invalid TMG_TRANSPORT_TIMEOUT '{s}': {e}. Using the default."))
                    .ok()
            })
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_TIMEOUT);
        Self { base_url: format!("https://{host}/v1"), api_key, timeout }
    }
}
