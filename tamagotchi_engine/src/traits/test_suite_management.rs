use thiserror::Error;

use crate::db_types::{NewTestMessage, NewTestResponse, TestMessage, TestResponse, TestSuite};

#[derive(Debug, Clone, Error)]
pub enum TestSuiteError {
    #[error("We have an internal database engine (configuration/uptime etc.) : {0}")]
    DatabaseError(String),
    #[error("A test suite is already running")]
    AlreadyRunning,
    #[error("No test suite is running")]
    NoSuiteRunning,
    #[error("Test suite {0} is not running")]
    SuiteNotRunning(i64),
    #[error("Test suite {0} does not exist")]
    SuiteNotFound(i64),
}

impl From<sqlx::Error> for TestSuiteError {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::Database(err) if err.is_unique_violation() => TestSuiteError::AlreadyRunning,
            e => TestSuiteError::DatabaseError(e.to_string()),
        }
    }
}

/// The test suite state machine.
///
/// At most one suite is `running` at any time. A suite goes from `running` to `finished` exactly once, and a finished
/// suite accepts no further writes.
#[allow(async_fn_in_trait)]
pub trait TestSuiteManagement: Clone {
    /// Starts a new suite. Fails with [`TestSuiteError::AlreadyRunning`] if one is running already. When several
    /// callers race, exactly one of them succeeds.
    async fn start_suite(&self) -> Result<TestSuite, TestSuiteError>;

    async fn current_suite(&self) -> Result<Option<TestSuite>, TestSuiteError>;

    async fn fetch_suite(&self, id: i64) -> Result<Option<TestSuite>, TestSuiteError>;

    /// The most recently started suite, running or not.
    async fn fetch_latest_suite(&self) -> Result<Option<TestSuite>, TestSuiteError>;

    /// Marks the running suite as finished. Fails with [`TestSuiteError::NoSuiteRunning`] if there is none.
    async fn finish_suite(&self) -> Result<TestSuite, TestSuiteError>;

    /// Appends a sent message to the suite. The suite must be running.
    async fn add_test_message(&self, suite_id: i64, message: NewTestMessage) -> Result<TestMessage, TestSuiteError>;

    /// Appends a captured callback outcome to the suite. The suite must be running.
    async fn add_test_response(&self, suite_id: i64, response: NewTestResponse)
        -> Result<TestResponse, TestSuiteError>;

    /// Messages sent by the suite, in the order they were sent.
    async fn fetch_test_messages(&self, suite_id: i64) -> Result<Vec<TestMessage>, TestSuiteError>;

    /// Outcomes captured by the suite, in the order they arrived.
    async fn fetch_test_responses(&self, suite_id: i64) -> Result<Vec<TestResponse>, TestSuiteError>;
}
