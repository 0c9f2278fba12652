use std::fmt::Debug;

use clearing_client::{ClearingTransport, OutboundMessage};
use log::*;
use serde::Serialize;

use crate::{
    db_types::{NewTestMessage, TestSuite},
    tme_api::{dispatch_api::DispatchApi, suite_objects::SuiteReport},
    traits::{MessageStore, TestSuiteError, TestSuiteManagement},
};

/// One entry of a test batch.
#[derive(Debug, Clone)]
pub struct BatchItem {
    pub description: String,
    pub message: OutboundMessage,
}

impl BatchItem {
    pub fn new<S: Into<String>, M: Into<OutboundMessage>>(description: S, message: M) -> Self {
        Self { description: description.into(), message: message.into() }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    pub suite_id: i64,
    /// Envelopes sent and recorded
    pub recorded: usize,
    /// Of those, how many the network accepted
    pub accepted: usize,
    /// Set when the suite stopped running before the batch was exhausted
    pub interrupted: bool,
}

/// `TestSuiteApi` drives the test suite state machine.
pub struct TestSuiteApi<B> {
    db: B,
}

impl<B> Debug for TestSuiteApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "TestSuiteApi")
    }
}

impl<B> TestSuiteApi<B> {
    pub fn new(db: B) -> Self {
        Self { db }
    }

    pub fn db(&self) -> &B {
        &self.db
    }
}

impl<B> TestSuiteApi<B>
where B: TestSuiteManagement
{
    pub async fn start(&self) -> Result<TestSuite, TestSuiteError> {
        self.db.start_suite().await
    }

    pub async fn current(&self) -> Result<Option<TestSuite>, TestSuiteError> {
        self.db.current_suite().await
    }

    pub async fn latest(&self) -> Result<Option<TestSuite>, TestSuiteError> {
        self.db.fetch_latest_suite().await
    }

    pub async fn finish(&self) -> Result<TestSuite, TestSuiteError> {
        self.db.finish_suite().await
    }

    pub async fn fetch(&self, suite_id: i64) -> Result<Option<TestSuite>, TestSuiteError> {
        self.db.fetch_suite(suite_id).await
    }

    pub async fn report(&self, suite_id: i64) -> Result<SuiteReport, TestSuiteError> {
        let suite = self.db.fetch_suite(suite_id).await?.ok_or(TestSuiteError::SuiteNotFound(suite_id))?;
        let messages = self.db.fetch_test_messages(suite_id).await?;
        let responses = self.db.fetch_test_responses(suite_id).await?;
        Ok(SuiteReport::build(suite, messages, responses))
    }

    /// Sends every item through the dispatcher and records the outcome of each send on the suite, failed or not.
    ///
    /// Sent envelopes are never stored as messages, so callbacks for them reach the suite instead. The batch stops
    /// early if the suite stops running.
    pub async fn run_batch<D, T>(
        &self,
        suite_id: i64,
        dispatcher: &DispatchApi<D, T>,
        items: Vec<BatchItem>,
    ) -> Result<BatchSummary, TestSuiteError>
    where
        D: MessageStore,
        T: ClearingTransport,
    {
        let total = items.len();
        info!("🧪️ Running {total} messages in test suite {suite_id}");
        let mut summary = BatchSummary { suite_id, ..Default::default() };
        for item in items {
            if !self.is_running(suite_id).await? {
                summary.interrupted = true;
                break;
            }
            let kind = item.message.kind();
            let record = match dispatcher.send(&item.message).await {
                Ok(sent) => {
                    let accepted = sent.response.is_accepted();
                    NewTestMessage {
                        description: item.description,
                        kind,
                        content: sent.content,
                        http_status: Some(sent.response.http_status),
                        error_message: (!accepted)
                            .then(|| format!("The network answered with HTTP {}", sent.response.http_status)),
                        http_response: Some(sent.response.http_body),
                        transaction_id_mapping: sent.response.transaction_ids,
                    }
                },
                Err(e) => {
                    warn!("🧪️ Could not send '{}'. {e}", item.description);
                    let content = item.message.as_json().unwrap_or_else(|e| {
                        warn!("🧪️ Could not serialize '{}'. Recording it without content. {e}", item.description);
                        String::new()
                    });
                    NewTestMessage {
                        description: item.description,
                        kind,
                        content,
                        http_status: None,
                        http_response: None,
                        error_message: Some(e.to_string()),
                        transaction_id_mapping: Default::default(),
                    }
                },
            };
            let accepted = record.error_message.is_none();
            match self.db.add_test_message(suite_id, record).await {
                Ok(_) => {
                    summary.recorded += 1;
                    if accepted {
                        summary.accepted += 1;
                    }
                },
                Err(TestSuiteError::SuiteNotRunning(_)) | Err(TestSuiteError::SuiteNotFound(_)) => {
                    summary.interrupted = true;
                    break;
                },
                Err(e) => return Err(e),
            }
        }
        if summary.interrupted {
            warn!("🧪️ Test suite {suite_id} stopped after {} of {total} messages", summary.recorded);
        } else {
            info!("🧪️ {total} messages sent in test suite {suite_id}, {} accepted", summary.accepted);
        }
        Ok(summary)
    }

    async fn is_running(&self, suite_id: i64) -> Result<bool, TestSuiteError> {
        let running = self.db.current_suite().await?.map(|s| s.id == suite_id).unwrap_or(false);
        Ok(running)
    }
}
