use std::sync::Arc;

use actix_web::{http::StatusCode, web, web::ServiceConfig};
use tamagotchi_engine::{
    db_types::{CallbackDisposition, CallbackTarget, MessageId},
    events::EventProducers,
    CallbackApi,
    MessageSigner,
};

use super::helpers::{network_verifier, post_request, signature_header, signed_callback, signer};
use crate::{endpoint_tests::mocks::MockStore, errors::INVALID_CALLBACK_MESSAGE, routes::NetworkMessageRoute};

#[actix_web::test]
async fn verified_callback_is_acknowledged() {
    let _ = env_logger::try_init().ok();
    let (body, signature) = signed_callback("NET-T1", "succeeded");
    let (status, res) = post_request("/network/messages", &body, &signature_header(&signature), configure).await;
    assert_eq!(status, StatusCode::OK);
    assert!(res.is_empty(), "{res}");
}

#[actix_web::test]
async fn orphaned_callback_is_still_acknowledged() {
    let _ = env_logger::try_init().ok();
    let (body, signature) = signed_callback("NET-UNKNOWN", "succeeded");
    let (status, res) = post_request("/network/messages", &body, &signature_header(&signature), configure).await;
    assert_eq!(status, StatusCode::OK);
    assert!(res.is_empty(), "{res}");
}

#[actix_web::test]
async fn tampered_callback_is_refused() {
    let _ = env_logger::try_init().ok();
    let (body, signature) = signed_callback("NET-T1", "succeeded");
    let body = body.replace("succeeded", "failed");
    let (status, res) =
        post_request("/network/messages", &body, &signature_header(&signature), configure_untouched).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(res, INVALID_CALLBACK_MESSAGE);
}

#[actix_web::test]
async fn unsigned_callback_is_refused() {
    let _ = env_logger::try_init().ok();
    let (body, _) = signed_callback("NET-T1", "succeeded");
    let (status, res) = post_request("/network/messages", &body, &[], configure_untouched).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(res, INVALID_CALLBACK_MESSAGE);
}

#[actix_web::test]
async fn malformed_callback_gets_the_same_answer() {
    let _ = env_logger::try_init().ok();
    let (_, signature) = signed_callback("NET-T1", "succeeded");
    let body = r#"{"not": "a callback"}"#;
    let (status, res) =
        post_request("/network/messages", body, &signature_header(&signature), configure_untouched).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(res, INVALID_CALLBACK_MESSAGE);
}

#[actix_web::test]
async fn callback_signed_by_someone_else_is_refused() {
    let _ = env_logger::try_init().ok();
    let (body, _) = signed_callback("NET-T1", "succeeded");
    let forged = signer().sign(&body).unwrap();
    let (status, res) = post_request("/network/messages", &body, &signature_header(&forged), configure_untouched).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(res, INVALID_CALLBACK_MESSAGE);
}

fn configure(cfg: &mut ServiceConfig) {
    let mut store = MockStore::new();
    store.expect_correlate_callback().times(1).returning(|delivery| {
        let dispositions = delivery
            .outcomes
            .iter()
            .map(|outcome| {
                let target = match outcome.network_transaction_id.as_str() {
                    "NET-T1" => CallbackTarget::Recorded(MessageId::from("M-PAYOUT-1")),
                    _ => CallbackTarget::Orphan,
                };
                CallbackDisposition { outcome: outcome.clone(), target }
            })
            .collect();
        Ok(dispositions)
    });
    register(cfg, store);
}

fn configure_untouched(cfg: &mut ServiceConfig) {
    let mut store = MockStore::new();
    store.expect_correlate_callback().never();
    store.expect_record_callback().never();
    register(cfg, store);
}

fn register(cfg: &mut ServiceConfig, store: MockStore) {
    let api = CallbackApi::new(store, Arc::new(network_verifier()), EventProducers::default());
    cfg.service(NetworkMessageRoute::<MockStore>::new()).app_data(web::Data::new(api));
}
