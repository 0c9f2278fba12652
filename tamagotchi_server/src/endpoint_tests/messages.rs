use std::sync::Arc;

use actix_web::{http::StatusCode, web, web::ServiceConfig};
use chrono::Utc;
use clearing_client::SubmissionResponse;
use serde_json::{json, Value};
use tamagotchi_engine::{db_types::PersistedMessage, DispatchApi, MessageApi};
use tmg_common::MessageKind;

use super::helpers::{get_request, post_request, signer, stored_payout};
use crate::{
    config::{MerchantConfig, ServerOptions},
    data_objects::MessageView,
    endpoint_tests::mocks::{MockStore, MockTransport},
    routes::{PayinByIdRoute, PayoutByIdRoute, PayoutsRoute, SubmitPayinRoute, SubmitPayoutRoute},
};

const PAYOUT_FORM: &str = r#"{
    "name": "Bob",
    "rut": "22.222.222-2",
    "email": "bob@example.com",
    "bank_id": "BANCO_BICE_CL",
    "account_number": "4242",
    "account_type": "current_account",
    "amount": "$25.000",
    "description": "Rent"
}"#;

#[actix_web::test]
async fn list_payouts() {
    let _ = env_logger::try_init().ok();
    let (status, body) = get_request("/payouts", configure_reads).await;
    assert_eq!(status, StatusCode::OK);
    let views: Vec<MessageView> = serde_json::from_str(&body).expect("Not a list of messages");
    assert_eq!(views.len(), 1);
    let view = &views[0];
    assert_eq!(view.id, "M-PAYOUT-1");
    assert_eq!(view.network_transaction_id, "NET-T1");
    assert_eq!(view.amount, "1.500.000");
    assert_eq!(view.currency, "CLP");
    assert_eq!(view.status, "pending");
    assert_eq!(view.counterparty.as_ref().map(|p| p.name.as_str()), Some("Bob"));
    assert_eq!(view.created_at, "2024-03-01 12:00:00Z");
}

#[actix_web::test]
async fn fetch_payout_by_id() {
    let _ = env_logger::try_init().ok();
    let (status, body) = get_request("/payouts/M-PAYOUT-1", configure_reads).await;
    assert_eq!(status, StatusCode::OK);
    let view: MessageView = serde_json::from_str(&body).expect("Not a message");
    assert_eq!(view.transaction_id, "T1");
    assert_eq!(view.description, "Rent");
}

#[actix_web::test]
async fn unknown_payout_is_not_found() {
    let _ = env_logger::try_init().ok();
    let (status, body) = get_request("/payouts/M-NOPE", configure_reads).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body.contains("M-NOPE"), "{body}");
}

#[actix_web::test]
async fn payout_is_not_found_as_a_payin() {
    let _ = env_logger::try_init().ok();
    let (status, _) = get_request("/payins/M-PAYOUT-1", configure_reads).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn submit_accepted_payout() {
    let _ = env_logger::try_init().ok();
    let (status, body) = post_request("/payouts", PAYOUT_FORM, &[], configure_accepting).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let view: MessageView = serde_json::from_str(&body).expect("Not a message");
    assert_eq!(view.kind, MessageKind::Payout);
    assert_eq!(view.network_transaction_id, format!("NET-{}", view.transaction_id));
    assert_eq!(view.amount, "25.000");
    assert_eq!(view.status, "pending");
    let creditor = view.counterparty.expect("A payout has a creditor");
    assert_eq!(creditor.identification.id, "22222222-2");
}

#[actix_web::test]
async fn submit_accepted_payin() {
    let _ = env_logger::try_init().ok();
    let form = r#"{"amount": "5.000", "description": "Top up"}"#;
    let (status, body) = post_request("/payins", form, &[], configure_accepting).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let view: MessageView = serde_json::from_str(&body).expect("Not a message");
    assert_eq!(view.kind, MessageKind::Payin);
    assert_eq!(view.redirect_url, Some(format!("https://pay.example/NET-{}", view.transaction_id)));
    assert!(view.counterparty.is_none());
}

#[actix_web::test]
async fn rejected_payout_is_not_stored() {
    let _ = env_logger::try_init().ok();
    let (status, body) = post_request("/payouts", PAYOUT_FORM, &[], configure_rejecting).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    let body: Value = serde_json::from_str(&body).expect("Not JSON");
    let error = body["error"].as_str().unwrap_or_default();
    assert!(error.contains("HTTP 422"), "{error}");
    assert!(error.contains("[AMOUNT_TOO_LARGE] Too many pesos"), "{error}");
}

#[actix_web::test]
async fn already_accepted_payout_returns_the_stored_one() {
    let _ = env_logger::try_init().ok();
    let (status, body) = post_request("/payouts", PAYOUT_FORM, &[], configure_already_accepted).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let view: MessageView = serde_json::from_str(&body).expect("Not a message");
    assert_eq!(view.id, "M-PAYOUT-1");
}

#[actix_web::test]
async fn payout_with_invalid_rut() {
    let _ = env_logger::try_init().ok();
    let form = PAYOUT_FORM.replace("22.222.222-2", "-");
    let (status, body) = post_request("/payouts", &form, &[], configure_rejecting).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("is not a valid RUT"), "{body}");
}

fn accepted(kind: MessageKind, envelope: &str, status: u16) -> SubmissionResponse {
    let envelope: Value = serde_json::from_str(envelope).unwrap();
    let ids = envelope["document"]["transactions"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| {
            let tx_id = t["transaction_id"].as_str().unwrap();
            let mut v = json!({"transaction_id": tx_id, "network_transaction_id": format!("NET-{tx_id}")});
            if kind == MessageKind::Payin {
                v["redirect_url"] = json!(format!("https://pay.example/NET-{tx_id}"));
            }
            v
        })
        .collect::<Vec<_>>();
    SubmissionResponse::from_http(status, json!({"transaction_ids": ids}).to_string())
}

fn configure_reads(cfg: &mut ServiceConfig) {
    let mut store = MockStore::new();
    store.expect_fetch_messages().returning(|kind| match kind {
        MessageKind::Payout => Ok(vec![stored_payout()]),
        MessageKind::Payin => Ok(vec![]),
    });
    store.expect_fetch_message().returning(|id| Ok(Some(stored_payout()).filter(|m| &m.id == id)));
    cfg.service(PayoutsRoute::<MockStore>::new())
        .service(PayoutByIdRoute::<MockStore>::new())
        .service(PayinByIdRoute::<MockStore>::new())
        .app_data(web::Data::new(MessageApi::new(store)));
}

fn configure_submissions(cfg: &mut ServiceConfig, store: MockStore, transport: MockTransport) {
    let api = DispatchApi::new(store, transport, Arc::new(signer()));
    cfg.service(SubmitPayoutRoute::<MockStore, MockTransport>::new())
        .service(SubmitPayinRoute::<MockStore, MockTransport>::new())
        .app_data(web::Data::new(api))
        .app_data(web::Data::new(MerchantConfig { legal_name: "Tamagotchi".into(), ..MerchantConfig::default() }))
        .app_data(web::Data::new(ServerOptions::default()));
}

fn configure_accepting(cfg: &mut ServiceConfig) {
    let mut store = MockStore::new();
    store.expect_put_message().times(1).returning(|m| {
        let now = Utc::now();
        Ok(PersistedMessage {
            id: m.id,
            kind: m.kind,
            transaction_id: m.transaction_id,
            network_transaction_id: m.network_transaction_id,
            content: m.content,
            signature: m.signature,
            redirect_url: m.redirect_url,
            response_content: None,
            response_signature: None,
            created_at: now,
            updated_at: now,
        })
    });
    let mut transport = MockTransport::new();
    transport.expect_post_signed().times(1).returning(|kind, envelope, _| Ok(accepted(kind, envelope, 200)));
    configure_submissions(cfg, store, transport);
}

fn configure_rejecting(cfg: &mut ServiceConfig) {
    let mut store = MockStore::new();
    store.expect_put_message().never();
    let mut transport = MockTransport::new();
    transport.expect_post_signed().returning(|_, _, _| {
        let body = r#"{"errors":[{"error_code":"AMOUNT_TOO_LARGE","error_message":"Too many pesos"}]}"#;
        Ok(SubmissionResponse::from_http(422, body.to_string()))
    });
    configure_submissions(cfg, store, transport);
}

fn configure_already_accepted(cfg: &mut ServiceConfig) {
    let mut store = MockStore::new();
    store.expect_fetch_message_by_network_id().times(1).returning(|_| Ok(Some(stored_payout())));
    store.expect_put_message().never();
    let mut transport = MockTransport::new();
    transport.expect_post_signed().times(1).returning(|kind, envelope, _| Ok(accepted(kind, envelope, 409)));
    configure_submissions(cfg, store, transport);
}
