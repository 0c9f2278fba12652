use thiserror::Error;

use crate::db_types::{CallbackDelivery, CallbackDisposition};

#[derive(Debug, Clone, Error)]
pub enum CorrelationError {
    #[error("We have an internal database engine (configuration/uptime etc.) : {0}")]
    DatabaseError(String),
}

impl From<sqlx::Error> for CorrelationError {
    fn from(e: sqlx::Error) -> Self {
        CorrelationError::DatabaseError(e.to_string())
    }
}

/// Routes the outcomes of a verified callback.
#[allow(async_fn_in_trait)]
pub trait CallbackCorrelation: Clone {
    /// In a single transaction, for every outcome in the delivery:
    /// * if a stored message carries the outcome's network id, the full callback body and signature are recorded on it;
    /// * otherwise, if a test suite is running, the outcome is appended to it;
    /// * otherwise the outcome is an orphan.
    ///
    /// Either every outcome is applied, or none is.
    async fn correlate_callback(
        &self,
        delivery: &CallbackDelivery,
    ) -> Result<Vec<CallbackDisposition>, CorrelationError>;
}
