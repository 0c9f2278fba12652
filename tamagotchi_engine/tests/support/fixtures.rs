use std::sync::{Arc, Mutex};

use clearing_client::{
    ClearingApiError,
    ClearingTransport,
    FinancialInstitution,
    MessageHeader,
    Party,
    PayinMessage,
    PayinTransaction,
    PayoutMessage,
    PayoutResponse,
    PayoutTransaction,
    PersonId,
    Response,
    ResponseMessage,
    SubmissionResponse,
    CURRENT_ACCOUNT,
};
use serde_json::{json, Value};
use tamagotchi_engine::{
    helpers::{Certificate, CertificateSet, CertificateVerifier, KeySigner},
    DispatchApi,
    MessageSigner,
    SqliteDatabase,
};
use tmg_common::MessageKind;

pub const MERCHANT_KEY: &str = "925842e11914fdd0c9a2ab8a38dac9de57b3e392372cde1661b1a84b1d8e430e";
pub const NETWORK_KEY: &str = "1dbbce83de2b0233c404b96b9234233bb3cec51503e2124d8c728a2d9b4fb00c";
pub const MERCHANT: &str = "TAMAGOTCHI";
pub const NETWORK: &str = "NETWORK";

pub fn party(name: &str, rut: &str) -> Party {
    Party {
        name: name.to_string(),
        identification: PersonId::chilean(rut),
        financial_institution: FinancialInstitution::new("BANCO_BICE_CL"),
        account: "4242424242".to_string(),
        account_type: CURRENT_ACCOUNT.to_string(),
        email: format!("{}@example.com", name.to_lowercase()),
    }
}

pub fn debtor() -> Party {
    party("Tamagotchi", "11111111-1")
}

pub fn creditor() -> Party {
    party("Bob", "22222222-2")
}

pub fn outbound_header() -> MessageHeader {
    MessageHeader::new(FinancialInstitution::new(MERCHANT), FinancialInstitution::new(NETWORK))
}

pub fn payout_with_id(transaction_id: &str, amount: &str) -> PayoutMessage {
    let mut tx = PayoutTransaction::new("CLP", amount, "Test payout", debtor(), creditor());
    tx.transaction_id = transaction_id.to_string();
    PayoutMessage::new(outbound_header(), vec![tx])
}

pub fn payout(amount: &str) -> PayoutMessage {
    let tx = PayoutTransaction::new("CLP", amount, "Test payout", debtor(), creditor());
    PayoutMessage::new(outbound_header(), vec![tx])
}

pub fn multi_payout(amounts: &[&str]) -> PayoutMessage {
    let txs = amounts
        .iter()
        .map(|a| PayoutTransaction::new("CLP", *a, "Few pesos", debtor(), creditor()))
        .collect();
    PayoutMessage::new(outbound_header(), txs)
}

pub fn payin(amount: &str) -> PayinMessage {
    let tx = PayinTransaction::interactive("CLP", amount, "Top up", debtor());
    PayinMessage::new(outbound_header(), vec![tx])
}

pub fn merchant_signer() -> Arc<dyn MessageSigner + Send + Sync> {
    Arc::new(KeySigner::from_hex(MERCHANT_KEY).unwrap())
}

pub fn network_verifier() -> CertificateVerifier {
    let network = KeySigner::from_hex(NETWORK_KEY).unwrap();
    let certs = CertificateSet::new(vec![Certificate::new(NETWORK, network.public_key().clone())]);
    CertificateVerifier::new(NETWORK, MERCHANT, certs)
}

/// Builds a callback from the network and signs it with the network key.
pub fn signed_callback(outcomes: &[(&str, Option<&str>, &str)]) -> (String, String) {
    let responses = outcomes
        .iter()
        .map(|(network_id, tx_id, status)| {
            Response::Payout(PayoutResponse {
                response_status: "ok".to_string(),
                network_transaction_id: network_id.to_string(),
                transaction_id: tx_id.map(String::from),
                network_transaction_status: status.to_string(),
                errors: vec![],
            })
        })
        .collect();
    let header = MessageHeader::new(FinancialInstitution::new(NETWORK), FinancialInstitution::new(MERCHANT));
    let body = ResponseMessage::new(header, responses).as_json().unwrap();
    let signature = KeySigner::from_hex(NETWORK_KEY).unwrap().sign(&body).unwrap();
    (body, signature)
}

type Responder = dyn Fn(MessageKind, &Value) -> Result<SubmissionResponse, ClearingApiError> + Send + Sync;

/// A stand-in for the clearing network. Every post is recorded and answered by the responder.
#[derive(Clone)]
pub struct FakeNetwork {
    responder: Arc<Responder>,
    pub posts: Arc<Mutex<Vec<(MessageKind, String, String)>>>,
}

impl FakeNetwork {
    pub fn new<F>(f: F) -> Self
    where F: Fn(MessageKind, &Value) -> Result<SubmissionResponse, ClearingApiError> + Send + Sync + 'static {
        Self { responder: Arc::new(f), posts: Arc::new(Mutex::new(Vec::new())) }
    }

    /// Accepts everything with the given status, assigning `NET-{transaction_id}` as the network id.
    pub fn accepting(status: u16) -> Self {
        Self::new(move |kind, envelope| {
            let ids = transaction_ids(envelope)
                .into_iter()
                .map(|t| {
                    let mut v = json!({"transaction_id": t, "network_transaction_id": format!("NET-{t}")});
                    if kind == MessageKind::Payin {
                        v["redirect_url"] = json!(format!("https://pay.example/NET-{t}"));
                    }
                    v
                })
                .collect::<Vec<_>>();
            let body = json!({"message_id": "ack", "transaction_ids": ids}).to_string();
            Ok(SubmissionResponse::from_http(status, body))
        })
    }

    /// Rejects everything over `limit` pesos with a 422, accepts the rest.
    pub fn with_limit(limit: u64) -> Self {
        let accept = Self::accepting(200);
        Self::new(move |kind, envelope| {
            let too_big = envelope["document"]["transactions"]
                .as_array()
                .map(|txs| {
                    txs.iter().any(|t| t["amount"].as_str().and_then(|a| a.parse::<u64>().ok()).unwrap_or(0) > limit)
                })
                .unwrap_or(false);
            if too_big {
                let body = json!({"errors": [{"error_code": "amount", "error_message": "Too many pesos"}]});
                Ok(SubmissionResponse::from_http(422, body.to_string()))
            } else {
                (accept.responder)(kind, envelope)
            }
        })
    }

    pub fn post_count(&self) -> usize {
        self.posts.lock().unwrap().len()
    }
}

pub fn transaction_ids(envelope: &Value) -> Vec<String> {
    envelope["document"]["transactions"]
        .as_array()
        .map(|txs| txs.iter().filter_map(|t| t["transaction_id"].as_str().map(String::from)).collect())
        .unwrap_or_default()
}

impl ClearingTransport for FakeNetwork {
    async fn post_signed(
        &self,
        kind: MessageKind,
        envelope_json: &str,
        signature: &str,
    ) -> Result<SubmissionResponse, ClearingApiError> {
        self.posts.lock().unwrap().push((kind, envelope_json.to_string(), signature.to_string()));
        let envelope = serde_json::from_str::<Value>(envelope_json)
            .map_err(|e| ClearingApiError::RequestError(e.to_string()))?;
        (self.responder)(kind, &envelope)
    }
}

pub fn dispatcher(db: &SqliteDatabase, network: &FakeNetwork) -> DispatchApi<SqliteDatabase, FakeNetwork> {
    DispatchApi::new(db.clone(), network.clone(), merchant_signer())
}
