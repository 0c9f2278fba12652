use std::{sync::Arc, time::Duration};

use actix_web::{dev::Server, http::KeepAlive, middleware::Logger, web, App, HttpServer};
use clearing_client::ClearingApi;
use log::*;
use tamagotchi_engine::{
    events::{EventHandlers, EventHooks, EventProducers},
    CallbackApi,
    DispatchApi,
    MessageApi,
    MessageSigner,
    MessageVerifier,
    SqliteDatabase,
    TestSuiteApi,
};

use crate::{
    config::{ServerConfig, ServerOptions},
    errors::ServerError,
    orphan_worker::{register_orphan_hook, OrphanForwarder},
    routes::{
        health,
        NetworkMessageRoute,
        PayinByIdRoute,
        PayinsRoute,
        PayoutByIdRoute,
        PayoutsRoute,
        StartTesterRoute,
        StopTesterRoute,
        SubmitPayinRoute,
        SubmitPayoutRoute,
        SuiteReportRoute,
        TesterRoute,
    },
};

const EVENT_BUFFER_SIZE: usize = 64;

/// Everything the request handlers share, built once at start-up.
#[derive(Clone)]
pub struct ServerState {
    pub transport: ClearingApi,
    pub signer: Arc<dyn MessageSigner + Send + Sync>,
    pub verifier: Arc<dyn MessageVerifier + Send + Sync>,
    pub producers: EventProducers,
}

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let db = SqliteDatabase::new_with_url(&config.database_url, 25)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    db.migrate().await.map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let signer = config.signing.signer()?;
    info!("🔐️ Signing outbound messages with public key {}", config.signing.public_key);
    let verifier: Arc<dyn MessageVerifier + Send + Sync> = Arc::new(config.verifier());
    let transport = ClearingApi::new(config.clearing.clone()).map_err(|e| ServerError::InitializeError(e.to_string()))?;

    let mut hooks = EventHooks::default();
    let recheck_api = CallbackApi::new(db.clone(), Arc::clone(&verifier), EventProducers::default());
    register_orphan_hook(&mut hooks, OrphanForwarder::new(recheck_api, config.orphans.clone())?);
    let handlers = EventHandlers::new(EVENT_BUFFER_SIZE, hooks);
    let producers = handlers.producers();
    handlers.start_handlers().await;

    let state = ServerState { transport, signer: Arc::new(signer), verifier, producers };
    let srv = create_server_instance(config, db, state)?;
    srv.await.map_err(|e| ServerError::Unspecified(e.to_string()))
}

pub fn create_server_instance(
    config: ServerConfig,
    db: SqliteDatabase,
    state: ServerState,
) -> Result<Server, ServerError> {
    let options = ServerOptions::from_config(&config);
    let merchant = config.merchant.clone();
    let tester = config.tester.clone();
    let srv = HttpServer::new(move || {
        let message_api = MessageApi::new(db.clone());
        let dispatch_api = DispatchApi::new(db.clone(), state.transport.clone(), Arc::clone(&state.signer));
        let callback_api = CallbackApi::new(db.clone(), Arc::clone(&state.verifier), state.producers.clone());
        let test_suite_api = TestSuiteApi::new(db.clone());
        App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("tmg::access_log"))
            .app_data(web::Data::new(message_api))
            .app_data(web::Data::new(dispatch_api))
            .app_data(web::Data::new(callback_api))
            .app_data(web::Data::new(test_suite_api))
            .app_data(web::Data::new(merchant.clone()))
            .app_data(web::Data::new(tester.clone()))
            .app_data(web::Data::new(options))
            .service(health)
            .service(PayoutsRoute::<SqliteDatabase>::new())
            .service(SubmitPayoutRoute::<SqliteDatabase, ClearingApi>::new())
            .service(PayoutByIdRoute::<SqliteDatabase>::new())
            .service(PayinsRoute::<SqliteDatabase>::new())
            .service(SubmitPayinRoute::<SqliteDatabase, ClearingApi>::new())
            .service(PayinByIdRoute::<SqliteDatabase>::new())
            .service(NetworkMessageRoute::<SqliteDatabase>::new())
            .service(TesterRoute::<SqliteDatabase>::new())
            .service(SuiteReportRoute::<SqliteDatabase>::new())
            .service(StartTesterRoute::<SqliteDatabase, SqliteDatabase, ClearingApi>::new())
            .service(StopTesterRoute::<SqliteDatabase>::new())
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((config.host.as_str(), config.port))?
    .run();
    info!("💻️ Listening on {}:{}", config.host, config.port);
    Ok(srv)
}
