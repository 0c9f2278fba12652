use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClearingApiError {
    #[error("Could not initialize client: {0}")]
    Initialization(String),
    #[error("The request to the clearing network timed out")]
    Timeout,
    #[error("Invalid request: {0}")]
    RequestError(String),
    #[error("Invalid response: {0}")]
    ResponseError(String),
}

impl From<reqwest::Error> for ClearingApiError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ClearingApiError::Timeout
        } else if e.is_body() || e.is_decode() {
            ClearingApiError::ResponseError(e.to_string())
        } else {
            ClearingApiError::RequestError(e.to_string())
        }
    }
}
