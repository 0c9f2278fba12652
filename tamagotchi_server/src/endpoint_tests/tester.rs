use std::sync::Arc;

use actix_web::{http::StatusCode, web, web::ServiceConfig};
use serde_json::Value;
use tamagotchi_engine::{DispatchApi, TestSuiteApi, TestSuiteError};

use super::helpers::{get_request, post_request, running_suite, signer};
use crate::{
    config::{MerchantConfig, TesterConfig},
    endpoint_tests::mocks::{MockStore, MockSuites, MockTransport},
    routes::{StartTesterRoute, StopTesterRoute, SuiteReportRoute, TesterRoute},
};

#[actix_web::test]
async fn dashboard_without_a_running_suite() {
    let _ = env_logger::try_init().ok();
    let (status, body) = get_request("/tester", configure_idle).await;
    assert_eq!(status, StatusCode::OK);
    let dashboard: Value = serde_json::from_str(&body).expect("Not JSON");
    assert!(dashboard["current_suite"].is_null());
    assert_eq!(dashboard["messages_sent"], 0);
    assert_eq!(dashboard["transactions_sent"], 0);
    assert_eq!(dashboard["responses_received"], 0);
    assert_eq!(dashboard["acknowledged"], 0);
}

#[actix_web::test]
async fn dashboard_of_the_running_suite() {
    let _ = env_logger::try_init().ok();
    let (status, body) = get_request("/tester", configure_running).await;
    assert_eq!(status, StatusCode::OK);
    let dashboard: Value = serde_json::from_str(&body).expect("Not JSON");
    assert_eq!(dashboard["current_suite"]["id"], 7);
    assert_eq!(dashboard["current_suite"]["status"], "running");
    assert_eq!(dashboard["messages_sent"], 0);
}

#[actix_web::test]
async fn report_of_a_suite() {
    let _ = env_logger::try_init().ok();
    let (status, body) = get_request("/tester/suites/7", configure_running).await;
    assert_eq!(status, StatusCode::OK);
    let report: Value = serde_json::from_str(&body).expect("Not JSON");
    assert_eq!(report["suite"]["id"], 7);
    assert_eq!(report["transactions"], Value::Array(vec![]));
}

#[actix_web::test]
async fn report_of_an_unknown_suite() {
    let _ = env_logger::try_init().ok();
    let (status, _) = get_request("/tester/suites/99", configure_running).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn start_a_suite() {
    let _ = env_logger::try_init().ok();
    let (status, body) = post_request("/tester/start", "", &[], configure_idle).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let suite: Value = serde_json::from_str(&body).expect("Not JSON");
    assert_eq!(suite["id"], 8);
    assert_eq!(suite["status"], "running");
}

#[actix_web::test]
async fn only_one_suite_runs_at_a_time() {
    let _ = env_logger::try_init().ok();
    let (status, body) = post_request("/tester/start", "", &[], configure_running).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body.contains("already running"), "{body}");
}

#[actix_web::test]
async fn stop_without_a_running_suite() {
    let _ = env_logger::try_init().ok();
    let (status, _) = post_request("/tester/stop", "", &[], configure_idle).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

fn configure_idle(cfg: &mut ServiceConfig) {
    let mut suites = MockSuites::new();
    suites.expect_current_suite().returning(|| Ok(None));
    suites.expect_start_suite().returning(|| Ok(running_suite(8)));
    suites.expect_finish_suite().returning(|| Err(TestSuiteError::NoSuiteRunning));
    register(cfg, suites);
}

fn configure_running(cfg: &mut ServiceConfig) {
    let mut suites = MockSuites::new();
    suites.expect_current_suite().returning(|| Ok(Some(running_suite(7))));
    suites.expect_fetch_suite().returning(|id| Ok(Some(running_suite(id)).filter(|s| s.id == 7)));
    suites.expect_fetch_test_messages().returning(|_| Ok(vec![]));
    suites.expect_fetch_test_responses().returning(|_| Ok(vec![]));
    suites.expect_start_suite().returning(|| Err(TestSuiteError::AlreadyRunning));
    register(cfg, suites);
}

fn register(cfg: &mut ServiceConfig, suites: MockSuites) {
    let mut transport = MockTransport::new();
    transport.expect_post_signed().never();
    let dispatcher = DispatchApi::new(MockStore::new(), transport, Arc::new(signer()));
    cfg.service(TesterRoute::<MockSuites>::new())
        .service(SuiteReportRoute::<MockSuites>::new())
        .service(StartTesterRoute::<MockSuites, MockStore, MockTransport>::new())
        .service(StopTesterRoute::<MockSuites>::new())
        .app_data(web::Data::new(TestSuiteApi::new(suites)))
        .app_data(web::Data::new(dispatcher))
        .app_data(web::Data::new(MerchantConfig::default()))
        .app_data(web::Data::new(TesterConfig::default()));
}
