use clearing_client::{ClearingApiError, ClearingTransport, SubmissionResponse};
use mockall::mock;
use tamagotchi_engine::{
    db_types::{
        CallbackDelivery,
        CallbackDisposition,
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
use tmg_common::MessageKind;

mock! {
    pub Store {}
    impl Clone for Store {
        fn clone(&self) -> Self;
    }
    impl MessageStore for Store {
        async fn put_message(&self, message: NewMessage) -> Result<PersistedMessage, MessageStoreError>;
        async fn fetch_message(&self, id: &MessageId) -> Result<Option<PersistedMessage>, MessageStoreError>;
        async fn fetch_message_by_network_id(&self, network_id: &NetworkTransactionId) -> Result<Option<PersistedMessage>, MessageStoreError>;
        async fn fetch_messages(&self, kind: MessageKind) -> Result<Vec<PersistedMessage>, MessageStoreError>;
        async fn record_callback(&self, network_id: &NetworkTransactionId, content: &str, signature: &str) -> Result<Option<MessageId>, MessageStoreError>;
        async fn record_first_callback(&self, network_id: &NetworkTransactionId, content: &str, signature: &str) -> Result<Option<MessageId>, MessageStoreError>;
    }
    impl CallbackCorrelation for Store {
        async fn correlate_callback(&self, delivery: &CallbackDelivery) -> Result<Vec<CallbackDisposition>, CorrelationError>;
    }
}

mock! {
    pub Suites {}
    impl Clone for Suites {
        fn clone(&self) -> Self;
    }
    impl TestSuiteManagement for Suites {
        async fn start_suite(&self) -> Result<TestSuite, TestSuiteError>;
        async fn current_suite(&self) -> Result<Option<TestSuite>, TestSuiteError>;
        async fn fetch_suite(&self, id: i64) -> Result<Option<TestSuite>, TestSuiteError>;
        async fn fetch_latest_suite(&self) -> Result<Option<TestSuite>, TestSuiteError>;
        async fn finish_suite(&self) -> Result<TestSuite, TestSuiteError>;
        async fn add_test_message(&self, suite_id: i64, message: NewTestMessage) -> Result<TestMessage, TestSuiteError>;
        async fn add_test_response(&self, suite_id: i64, response: NewTestResponse) -> Result<TestResponse, TestSuiteError>;
        async fn fetch_test_messages(&self, suite_id: i64) -> Result<Vec<TestMessage>, TestSuiteError>;
        async fn fetch_test_responses(&self, suite_id: i64) -> Result<Vec<TestResponse>, TestSuiteError>;
    }
}

mock! {
    pub Transport {}
    impl ClearingTransport for Transport {
        async fn post_signed(&self, kind: MessageKind, envelope_json: &str, signature: &str) -> Result<SubmissionResponse, ClearingApiError>;
    }
}
