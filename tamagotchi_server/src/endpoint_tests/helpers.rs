use actix_web::{
    body::MessageBody,
    http::StatusCode,
    test,
    test::TestRequest,
    web::ServiceConfig,
    App,
};
use chrono::{TimeZone, Utc};
use clearing_client::{
    FinancialInstitution,
    MessageHeader,
    Party,
    PayoutMessage,
    PayoutResponse,
    PayoutTransaction,
    PersonId,
    Response,
    ResponseMessage,
    CURRENT_ACCOUNT,
    SIGNATURE_HEADER,
};
use log::debug;
use tamagotchi_engine::{
    db_types::{PersistedMessage, SuiteStatus, TestSuite},
    helpers::{Certificate, CertificateSet, CertificateVerifier, KeySigner},
    MessageSigner,
};
use tmg_common::MessageKind;

// Test keys. DO NOT re-use these keys anywhere.
pub const MERCHANT_KEY: &str = "925842e11914fdd0c9a2ab8a38dac9de57b3e392372cde1661b1a84b1d8e430e";
pub const NETWORK_KEY: &str = "1dbbce83de2b0233c404b96b9234233bb3cec51503e2124d8c728a2d9b4fb00c";
pub const MERCHANT: &str = "TAMAGOTCHI";
pub const NETWORK: &str = "NETWORK";


pub fn signer() -> KeySigner {
    KeySigner::from_hex(MERCHANT_KEY).unwrap()
}

pub fn network_verifier() -> CertificateVerifier {
    let network = KeySigner::from_hex(NETWORK_KEY).unwrap();
    let certs = CertificateSet::new(vec![Certificate::new(NETWORK, network.public_key().clone())]);
    CertificateVerifier::new(NETWORK, MERCHANT, certs)
}

/// A payout callback from the network, signed with the network key.
pub fn signed_callback(network_id: &str, status: &str) -> (String, String) {
    let response = Response::Payout(PayoutResponse {
        response_status: "ok".to_string(),
        network_transaction_id: network_id.to_string(),
        transaction_id: None,
        network_transaction_status: status.to_string(),
        errors: vec![],
    });
    let header = MessageHeader::new(FinancialInstitution::new(NETWORK), FinancialInstitution::new(MERCHANT));
    let body = ResponseMessage::new(header, vec![response]).as_json().unwrap();
    let signature = KeySigner::from_hex(NETWORK_KEY).unwrap().sign(&body).unwrap();
    (body, signature)
}

pub fn party(name: &str, rut: &str) -> Party {
    Party {
        name: name.to_string(),
        identification: PersonId::chilean(rut),
        financial_institution: FinancialInstitution::new("BANCO_BICE_CL"),
        account: "4242".to_string(),
        account_type: CURRENT_ACCOUNT.to_string(),
        email: format!("{}@example.com", name.to_lowercase()),
    }
}

/// A payout of 1.500.000 pesos from the merchant to Bob, accepted as `NET-T1`.
pub fn stored_payout() -> PersistedMessage {
    let debtor = party("Tamagotchi", "11111111-1");
    let mut tx = PayoutTransaction::new("CLP", "1500000", "Rent", debtor, party("Bob", "22222222-2"));
    tx.transaction_id = "T1".to_string();
    let header = MessageHeader::new(FinancialInstitution::new(MERCHANT), FinancialInstitution::new(NETWORK));
    let content = PayoutMessage::new(header, vec![tx]).as_json().unwrap();
    let created_at = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
    PersistedMessage {
        id: "M-PAYOUT-1".into(),
        kind: MessageKind::Payout,
        transaction_id: "T1".into(),
        network_transaction_id: "NET-T1".into(),
        content,
        signature: "sig".to_string(),
        redirect_url: None,
        response_content: None,
        response_signature: None,
        created_at,
        updated_at: created_at,
    }
}

pub fn running_suite(id: i64) -> TestSuite {
    TestSuite {
        id,
        status: SuiteStatus::Running,
        created_at: Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap(),
        finished_at: None,
    }
}

pub async fn get_request(path: &str, configure: fn(&mut ServiceConfig)) -> (StatusCode, String) {
    make_request(TestRequest::get().uri(path), configure).await
}

pub async fn post_request(
    path: &str,
    body: &str,
    headers: &[(&str, &str)],
    configure: fn(&mut ServiceConfig),
) -> (StatusCode, String) {
    let mut req = TestRequest::post().uri(path).insert_header(("Content-Type", "application/json"));
    for (name, value) in headers {
        req = req.insert_header((*name, *value));
    }
    make_request(req.set_payload(body.to_string()), configure).await
}

async fn make_request(req: TestRequest, configure: fn(&mut ServiceConfig)) -> (StatusCode, String) {
    let req = req.to_request();
    let app = App::new().configure(configure);
    let service = test::init_service(app).await;
    debug!("Making request");
    let (_, res) = test::try_call_service(&service, req).await.expect("Request failed").into_parts();
    let status = res.status();
    let body = String::from_utf8_lossy(&res.into_body().try_into_bytes().unwrap()).into_owned();
    (status, body)
}

pub fn signature_header(signature: &str) -> [(&'static str, &str); 1] {
    [(SIGNATURE_HEADER, signature)]
}
