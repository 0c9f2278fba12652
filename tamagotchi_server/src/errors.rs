use actix_web::{
    error::ResponseError,
    http::{header::ContentType, StatusCode},
    HttpResponse,
};
use clearing_client::ErrorDetail;
use log::error;
use tamagotchi_engine::{CallbackError, DispatchError, MessageStoreError, TestSuiteError};
use thiserror::Error;

/// The only body a rejected callback ever gets. Senders learn nothing about why it was refused.
pub const INVALID_CALLBACK_MESSAGE: &str = "Invalid callback message";

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Could not initialize server. {0}")]
    InitializeError(String),
    #[error("An error occurred on the backend of the server. {0}")]
    BackendError(String),
    #[error("Could not read request body: {0}")]
    InvalidRequestBody(String),
    #[error("An I/O error happened in the server. {0}")]
    IOError(#[from] std::io::Error),
    #[error("Invalid server configuration. {0}")]
    ConfigurationError(String),
    #[error("UnspecifiedError. {0}")]
    Unspecified(String),
    #[error("The data was not found. {0}")]
    NoRecordFound(String),
    #[error("{INVALID_CALLBACK_MESSAGE}")]
    InvalidCallback,
    #[error("The clearing network rejected the submission with HTTP {status}. Errors: {errors}")]
    SubmissionRejected { status: u16, errors: String },
    #[error("Could not reach the clearing network. {0}")]
    GatewayError(String),
    #[error("The clearing network did not answer in time")]
    GatewayTimeout,
    #[error("{0}")]
    Conflict(String),
}

impl ResponseError for ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequestBody(_) => StatusCode::BAD_REQUEST,
            Self::InvalidCallback => StatusCode::BAD_REQUEST,
            Self::NoRecordFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::SubmissionRejected { .. } => StatusCode::BAD_GATEWAY,
            Self::GatewayError(_) => StatusCode::BAD_GATEWAY,
            Self::GatewayTimeout => StatusCode::GATEWAY_TIMEOUT,
            Self::InitializeError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BackendError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::IOError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ConfigurationError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Unspecified(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        if let Self::InvalidCallback = self {
            return HttpResponse::build(self.status_code())
                .insert_header(ContentType::plaintext())
                .body(INVALID_CALLBACK_MESSAGE);
        }
        HttpResponse::build(self.status_code())
            .insert_header(ContentType::json())
            .body(serde_json::json!({ "error": self.to_string() }).to_string())
    }
}

fn error_list(errors: &[ErrorDetail]) -> String {
    if errors.is_empty() {
        return "none reported".to_string();
    }
    errors.iter().map(|e| format!("[{}] {}", e.error_code, e.error_message)).collect::<Vec<_>>().join(", ")
}

impl From<MessageStoreError> for ServerError {
    fn from(e: MessageStoreError) -> Self {
        match e {
            MessageStoreError::DatabaseError(s) => Self::BackendError(format!("Database error: {s}")),
            e @ MessageStoreError::DuplicateKey(_) => {
                error!("🗃️ Message id collision. {e}");
                Self::BackendError(e.to_string())
            },
            e @ MessageStoreError::DuplicateNetworkTransactionId(_) => Self::Conflict(e.to_string()),
        }
    }
}

impl From<TestSuiteError> for ServerError {
    fn from(e: TestSuiteError) -> Self {
        match e {
            TestSuiteError::DatabaseError(s) => Self::BackendError(format!("Database error: {s}")),
            TestSuiteError::SuiteNotFound(id) => Self::NoRecordFound(format!("Test suite {id}")),
            e @ TestSuiteError::AlreadyRunning => Self::Conflict(e.to_string()),
            e @ TestSuiteError::NoSuiteRunning => Self::Conflict(e.to_string()),
            e @ TestSuiteError::SuiteNotRunning(_) => Self::Conflict(e.to_string()),
        }
    }
}

impl From<DispatchError> for ServerError {
    fn from(e: DispatchError) -> Self {
        match e {
            DispatchError::SubmissionRejected { status, errors } => {
                Self::SubmissionRejected { status, errors: error_list(&errors) }
            },
            DispatchError::TransportTimeout => Self::GatewayTimeout,
            e @ DispatchError::Transport(_) => Self::GatewayError(e.to_string()),
            e @ DispatchError::MissingNetworkTransactionId(_) => Self::GatewayError(e.to_string()),
            e @ DispatchError::UnsupportedEnvelope(_) => Self::InvalidRequestBody(e.to_string()),
            DispatchError::Store(e) => e.into(),
            e @ DispatchError::Signing(_) => {
                error!("🔐️ Outbound message could not be signed. {e}");
                Self::BackendError(e.to_string())
            },
            e @ DispatchError::Serialization(_) => Self::BackendError(e.to_string()),
        }
    }
}

impl From<CallbackError> for ServerError {
    fn from(e: CallbackError) -> Self {
        match e {
            CallbackError::Correlation(e) => Self::BackendError(e.to_string()),
            CallbackError::MalformedCallback(_)
            | CallbackError::MissingSignature
            | CallbackError::InvalidSignature(_) => Self::InvalidCallback,
        }
    }
}
