use std::collections::BTreeMap;

use serde::Deserialize;

use crate::ErrorDetail;

/// The network accepted the submission.
pub const HTTP_ACCEPTED: u16 = 200;
/// The network had already accepted a submission with this content.
pub const HTTP_ALREADY_ACCEPTED: u16 = 409;

/// The network's synchronous answer to a submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionResponse {
    pub http_status: u16,
    pub http_body: String,
    /// client transaction id -> network transaction id
    pub transaction_ids: BTreeMap<String, String>,
    /// client transaction id -> interactive payin redirect URL
    pub redirect_urls: BTreeMap<String, String>,
    pub errors: Vec<ErrorDetail>,
}

#[derive(Deserialize)]
struct AcceptedBody {
    #[serde(default)]
    transaction_ids: Vec<TransactionIdPair>,
}

#[derive(Deserialize)]
struct TransactionIdPair {
    transaction_id: String,
    network_transaction_id: String,
    #[serde(default)]
    redirect_url: Option<String>,
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    errors: Vec<ErrorDetail>,
}

impl SubmissionResponse {
    /// Interprets a raw HTTP answer. Bodies that do not follow the expected shape are tolerated: the id maps or the
    /// error list are simply left empty.
    pub fn from_http(http_status: u16, http_body: String) -> Self {
        let mut transaction_ids = BTreeMap::new();
        let mut redirect_urls = BTreeMap::new();
        let mut errors = Vec::new();
        if Self::is_accepted_status(http_status) {
            if let Ok(body) = serde_json::from_str::<AcceptedBody>(&http_body) {
                for pair in body.transaction_ids {
                    if let Some(url) = pair.redirect_url {
                        redirect_urls.insert(pair.transaction_id.clone(), url);
                    }
                    transaction_ids.insert(pair.transaction_id, pair.network_transaction_id);
                }
            }
        } else if let Ok(body) = serde_json::from_str::<ErrorBody>(&http_body) {
            errors = body.errors;
        }
        Self { http_status, http_body, transaction_ids, redirect_urls, errors }
    }

    fn is_accepted_status(status: u16) -> bool {
        status == HTTP_ACCEPTED || status == HTTP_ALREADY_ACCEPTED
    }

    pub fn is_accepted(&self) -> bool {
        Self::is_accepted_status(self.http_status)
    }

    pub fn is_already_accepted(&self) -> bool {
        self.http_status == HTTP_ALREADY_ACCEPTED
    }

    pub fn network_transaction_id(&self, transaction_id: &str) -> Option<&str> {
        self.transaction_ids.get(transaction_id).map(String::as_str)
    }

    pub fn redirect_url(&self, transaction_id: &str) -> Option<&str> {
        self.redirect_urls.get(transaction_id).map(String::as_str)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn accepted_with_redirect() {
        let body = r#"{"message_id": "m1", "transaction_ids": [
            {"transaction_id": "t1", "network_transaction_id": "n1"},
            {"transaction_id": "t2", "network_transaction_id": "n2", "redirect_url": "https://pay.example/n2"}
        ]}"#;
        let resp = SubmissionResponse::from_http(200, body.to_string());
        assert!(resp.is_accepted());
        assert!(!resp.is_already_accepted());
        assert_eq!(resp.network_transaction_id("t1"), Some("n1"));
        assert_eq!(resp.network_transaction_id("t2"), Some("n2"));
        assert_eq!(resp.redirect_url("t1"), None);
        assert_eq!(resp.redirect_url("t2"), Some("https://pay.example/n2"));
        assert!(resp.errors.is_empty());
    }

    #[test]
    fn already_accepted_counts_as_accepted() {
        let body = r#"{"transaction_ids": [{"transaction_id": "t1", "network_transaction_id": "n1"}]}"#;
        let resp = SubmissionResponse::from_http(409, body.to_string());
        assert!(resp.is_accepted());
        assert!(resp.is_already_accepted());
        assert_eq!(resp.network_transaction_id("t1"), Some("n1"));
    }

    #[test]
    fn rejected_with_errors() {
        let body = r#"{"errors": [{"error_code": "amount", "error_message": "Too many pesos"}]}"#;
        let resp = SubmissionResponse::from_http(400, body.to_string());
        assert!(!resp.is_accepted());
        assert_eq!(resp.errors.len(), 1);
        assert_eq!(resp.errors[0].error_message, "Too many pesos");
        assert!(resp.transaction_ids.is_empty());
    }

    #[test]
    fn lenient_on_garbage() {
        let resp = SubmissionResponse::from_http(502, "<html>Bad gateway</html>".to_string());
        assert!(!resp.is_accepted());
        assert!(resp.errors.is_empty());
        assert_eq!(resp.http_body, "<html>Bad gateway</html>");
        let resp = SubmissionResponse::from_http(200, "{}".to_string());
        assert!(resp.is_accepted());
        assert!(resp.transaction_ids.is_empty());
    }
}
