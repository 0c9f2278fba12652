//! `SqliteDatabase` is the concrete backend of the Tamagotchi engine.
//!
//! It implements every trait defined in the [`crate::traits`] module on top of an SQLite connection pool.
use std::fmt::Debug;

use log::*;
use sqlx::SqlitePool;
use tmg_common::MessageKind;

use super::db::{db_url, messages, new_pool, test_suites};
use crate::{
    db_types::{
        CallbackDelivery,
        CallbackDisposition,
        CallbackTarget,
        MessageId,
        NetworkTransactionId,
        NewMessage,
        NewTestMessage,
        NewTestResponse,
        PersistedMessage,
        TestMessage,
        TestResponse,
        TestSuite,
    },
    traits::{
        CallbackCorrelation,
        CorrelationError,
        MessageStore,
        MessageStoreError,
        TestSuiteError,
        TestSuiteManagement,
    },
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl SqliteDatabase {
    /// Creates a new database API object, using `TMG_DATABASE_URL` for the location.
    pub async fn new(max_connections: u32) -> Result<Self, sqlx::Error> {
        let url = db_url();
        SqliteDatabase::new_with_url(url.as_str(), max_connections).await
    }

    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        trace!("🗃️ Creating new database connection pool with url {url}");
        let pool = new_pool(url, max_connections).await?;
        let url = url.to_string();
        Ok(Self { url, pool })
    }

    /// Brings the schema up to date using the embedded migrations.
    pub async fn migrate(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./src/sqlite/migrations").run(&self.pool).await?;
        info!("🗃️ Database migrations complete");
        Ok(())
    }

    pub fn url(&self) -> &str {
        self.url.as_str()
    }

    /// Returns a reference to the database connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn close(&self) {
        self.pool.close().await
    }
}

impl MessageStore for SqliteDatabase {
    async fn put_message(&self, message: NewMessage) -> Result<PersistedMessage, MessageStoreError> {
        let mut tx = self.pool.begin().await?;
        let id = message.id.clone();
        let network_id = message.network_transaction_id.clone();
        let message = messages::insert_message(message, &mut tx).await.map_err(|e| match e {
            sqlx::Error::Database(err) if err.is_unique_violation() => {
                if err.message().contains("network_transaction_id") {
                    MessageStoreError::DuplicateNetworkTransactionId(network_id)
                } else {
                    MessageStoreError::DuplicateKey(id)
                }
            },
            e => MessageStoreError::from(e),
        })?;
        tx.commit().await?;
        debug!(
            "🗃️ Stored {} message {} for network transaction {}",
            message.kind, message.id, message.network_transaction_id
        );
        Ok(message)
    }

    async fn fetch_message(&self, id: &MessageId) -> Result<Option<PersistedMessage>, MessageStoreError> {
        let mut conn = self.pool.acquire().await?;
        let message = messages::fetch_message(id, &mut conn).await?;
        Ok(message)
    }

    async fn fetch_message_by_network_id(
        &self,
        network_id: &NetworkTransactionId,
    ) -> Result<Option<PersistedMessage>, MessageStoreError> {
        let mut conn = self.pool.acquire().await?;
        let message = messages::fetch_message_by_network_id(network_id, &mut conn).await?;
        Ok(message)
    }

    async fn fetch_messages(&self, kind: MessageKind) -> Result<Vec<PersistedMessage>, MessageStoreError> {
        let mut conn = self.pool.acquire().await?;
        let messages = messages::fetch_messages(kind, &mut conn).await?;
        Ok(messages)
    }

    async fn record_callback(
        &self,
        network_id: &NetworkTransactionId,
        content: &str,
        signature: &str,
    ) -> Result<Option<MessageId>, MessageStoreError> {
        let mut tx = self.pool.begin().await?;
        let id = messages::record_callback(network_id, content, signature, &mut tx).await?;
        tx.commit().await?;
        Ok(id)
    }

    async fn record_first_callback(
        &self,
        network_id: &NetworkTransactionId,
        content: &str,
        signature: &str,
    ) -> Result<Option<MessageId>, MessageStoreError> {
        let mut tx = self.pool.begin().await?;
        let id = messages::record_first_callback(network_id, content, signature, &mut tx).await?;
        tx.commit().await?;
        Ok(id)
    }
}

impl TestSuiteManagement for SqliteDatabase {
    async fn start_suite(&self) -> Result<TestSuite, TestSuiteError> {
        let mut tx = self.pool.begin().await?;
        let suite = test_suites::insert_suite(&mut tx).await?;
        tx.commit().await?;
        info!("🧪️ Test suite {} started", suite.id);
        Ok(suite)
    }

    async fn current_suite(&self) -> Result<Option<TestSuite>, TestSuiteError> {
        let mut conn = self.pool.acquire().await?;
        let suite = test_suites::fetch_running_suite(&mut conn).await?;
        Ok(suite)
    }

    async fn fetch_suite(&self, id: i64) -> Result<Option<TestSuite>, TestSuiteError> {
        let mut conn = self.pool.acquire().await?;
        let suite = test_suites::fetch_suite(id, &mut conn).await?;
        Ok(suite)
    }

    async fn fetch_latest_suite(&self) -> Result<Option<TestSuite>, TestSuiteError> {
        let mut conn = self.pool.acquire().await?;
        let suite = test_suites::fetch_latest_suite(&mut conn).await?;
        Ok(suite)
    }

    async fn finish_suite(&self) -> Result<TestSuite, TestSuiteError> {
        let mut tx = self.pool.begin().await?;
        let suite = test_suites::finish_running_suite(&mut tx).await?.ok_or(TestSuiteError::NoSuiteRunning)?;
        tx.commit().await?;
        info!("🧪️ Test suite {} finished", suite.id);
        Ok(suite)
    }

    async fn add_test_message(&self, suite_id: i64, message: NewTestMessage) -> Result<TestMessage, TestSuiteError> {
        let mut tx = self.pool.begin().await?;
        let result = match test_suites::insert_test_message(suite_id, message, &mut tx).await? {
            Some(message) => Ok(message),
            None => Err(rejected_write(suite_id, test_suites::fetch_suite(suite_id, &mut tx).await?)),
        };
        tx.commit().await?;
        result
    }

    async fn add_test_response(
        &self,
        suite_id: i64,
        response: NewTestResponse,
    ) -> Result<TestResponse, TestSuiteError> {
        let mut tx = self.pool.begin().await?;
        let result = match test_suites::insert_test_response(suite_id, response, &mut tx).await? {
            Some(response) => Ok(response),
            None => Err(rejected_write(suite_id, test_suites::fetch_suite(suite_id, &mut tx).await?)),
        };
        tx.commit().await?;
        result
    }

    async fn fetch_test_messages(&self, suite_id: i64) -> Result<Vec<TestMessage>, TestSuiteError> {
        let mut conn = self.pool.acquire().await?;
        let messages = test_suites::fetch_test_messages(suite_id, &mut conn).await?;
        Ok(messages)
    }

    async fn fetch_test_responses(&self, suite_id: i64) -> Result<Vec<TestResponse>, TestSuiteError> {
        let mut conn = self.pool.acquire().await?;
        let responses = test_suites::fetch_test_responses(suite_id, &mut conn).await?;
        Ok(responses)
    }
}

fn rejected_write(suite_id: i64, suite: Option<TestSuite>) -> TestSuiteError {
    match suite {
        Some(_) => TestSuiteError::SuiteNotRunning(suite_id),
        None => TestSuiteError::SuiteNotFound(suite_id),
    }
}

impl CallbackCorrelation for SqliteDatabase {
    async fn correlate_callback(
        &self,
        delivery: &CallbackDelivery,
    ) -> Result<Vec<CallbackDisposition>, CorrelationError> {
        let mut tx = self.pool.begin().await?;
        let mut dispositions = Vec::with_capacity(delivery.outcomes.len());
        // Looked up at most once, after the first write has taken the lock
        let mut running_suite: Option<Option<TestSuite>> = None;
        for outcome in &delivery.outcomes {
            let network_id = &outcome.network_transaction_id;
            let recorded =
                messages::record_callback(network_id, &delivery.content, &delivery.signature, &mut tx).await?;
            let target = match recorded {
                Some(id) => CallbackTarget::Recorded(id),
                None => {
                    if running_suite.is_none() {
                        running_suite = Some(test_suites::fetch_running_suite(&mut tx).await?);
                    }
                    match running_suite.as_ref().and_then(|s| s.as_ref()) {
                        Some(suite) => {
                            let response = NewTestResponse {
                                network_transaction_id: network_id.clone(),
                                transaction_id: outcome.transaction_id.clone(),
                                content: outcome.content.clone(),
                            };
                            match test_suites::insert_test_response(suite.id, response, &mut tx).await? {
                                Some(_) => CallbackTarget::Captured { suite_id: suite.id },
                                None => CallbackTarget::Orphan,
                            }
                        },
                        None => CallbackTarget::Orphan,
                    }
                },
            };
            trace!("🔄️ Outcome for {network_id}: {target:?}");
            dispositions.push(CallbackDisposition { outcome: outcome.clone(), target });
        }
        tx.commit().await?;
        Ok(dispositions)
    }
}
