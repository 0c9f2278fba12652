//! Request handler definitions
//!
//! Define each route and its handler here. Handlers that are more than a line or two belong in a separate module
//! ([`crate::helpers`], [`crate::tester`]).
//!
//! Since each worker thread processes its requests sequentially, handlers must never block. Storage and network calls
//! are all expressed as futures. The one long-running job, a test batch, is spawned onto the runtime so that the
//! request that starts it returns at once.
use actix_web::{get, web, HttpRequest, HttpResponse, Responder};
use clearing_client::{ClearingTransport, OutboundMessage};
use log::*;
use tamagotchi_engine::{
    db_types::{CallbackTarget, MessageId},
    CallbackApi,
    CallbackCorrelation,
    DispatchApi,
    MessageApi,
    MessageStore,
    TestSuiteApi,
    TestSuiteManagement,
};
use tmg_common::MessageKind;

use crate::{
    config::{MerchantConfig, ServerOptions, TesterConfig},
    data_objects::{JsonResponse, MessageView, PayinForm, PayoutForm, TesterDashboard},
    errors::ServerError,
    helpers::{callback_signature, payin_from_form, payout_from_form},
    tester::{compose_batch, spawn_batch},
};

// Web-actix cannot handle generics in handlers, so it's implemented manually using the `route!` macro
#[macro_export]
macro_rules! route {
    // One type parameter per bound
    ($name:ident => $method:ident $path:literal impl $($bounds:ty),+) => {
        paste::paste! { pub struct [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ >( $( core::marker::PhantomData<fn() -> [< T $bounds:camel> ] >,)+ );}
        paste::paste! { impl< $( [< T $bounds:camel> ],)+ > [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ > {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self($( core::marker::PhantomData::<fn() -> [< T $bounds:camel> ] >,)+)
            }
        }}
        paste::paste! { impl<$( [< T $bounds:camel >] , )+> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<$([<T $bounds:camel>],)+>
        where
            $([<T $bounds:camel>]: $bounds + 'static,)+
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::< $( [< T $bounds:camel >], )+>);
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };

    // A single type parameter that satisfies every bound
    ($name:ident => $method:ident $path:literal with $($bounds:ident)&+) => {
        paste::paste! { pub struct [<$name:camel Route>]<A>(core::marker::PhantomData<fn() -> A>);}
        paste::paste! { impl<A> [<$name:camel Route>]<A> {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self(core::marker::PhantomData::<fn() -> A>)
            }
        }}
        paste::paste! { impl<A> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<A>
        where
            A: $($bounds +)+ 'static,
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::<A>);
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };
}

// ----------------------------------------------   Health  ----------------------------------------------------
#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

// ----------------------------------------------   Payouts  ---------------------------------------------------
route!(payouts => Get "/payouts" impl MessageStore);
pub async fn payouts<B: MessageStore>(api: web::Data<MessageApi<B>>) -> Result<HttpResponse, ServerError> {
    trace!("💻️ Received payouts request");
    list_messages(&api, MessageKind::Payout).await
}

route!(payout_by_id => Get "/payouts/{id}" impl MessageStore);
pub async fn payout_by_id<B: MessageStore>(
    path: web::Path<String>,
    api: web::Data<MessageApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let id = MessageId::from(path.into_inner());
    trace!("💻️ Received payout request for {id}");
    message_by_id(&api, MessageKind::Payout, id).await
}

route!(submit_payout => Post "/payouts" impl MessageStore, ClearingTransport);
/// Sends a single payout from the merchant account to the creditor given in the form.
///
/// The RUT is normalised, the amount is reduced to its digits and capped at `TMG_MAX_AMOUNT`. The payout is only
/// stored once the network has accepted it. A refusal is passed on as a `502` naming the network's errors.
pub async fn submit_payout<B, T>(
    form: web::Json<PayoutForm>,
    api: web::Data<DispatchApi<B, T>>,
    merchant: web::Data<MerchantConfig>,
    options: web::Data<ServerOptions>,
) -> Result<HttpResponse, ServerError>
where
    B: MessageStore,
    T: ClearingTransport,
{
    trace!("💻️ Received new payout request");
    let message = payout_from_form(&form, &merchant, options.max_amount)?;
    submit(&api, message.into()).await
}

// ----------------------------------------------   Payins  ----------------------------------------------------
route!(payins => Get "/payins" impl MessageStore);
pub async fn payins<B: MessageStore>(api: web::Data<MessageApi<B>>) -> Result<HttpResponse, ServerError> {
    trace!("💻️ Received payins request");
    list_messages(&api, MessageKind::Payin).await
}

route!(payin_by_id => Get "/payins/{id}" impl MessageStore);
pub async fn payin_by_id<B: MessageStore>(
    path: web::Path<String>,
    api: web::Data<MessageApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let id = MessageId::from(path.into_inner());
    trace!("💻️ Received payin request for {id}");
    message_by_id(&api, MessageKind::Payin, id).await
}

route!(submit_payin => Post "/payins" impl MessageStore, ClearingTransport);
/// Requests an interactive payin in favour of the merchant. The payer completes it at the `redirect_url` in the
/// response.
pub async fn submit_payin<B, T>(
    form: web::Json<PayinForm>,
    api: web::Data<DispatchApi<B, T>>,
    merchant: web::Data<MerchantConfig>,
    options: web::Data<ServerOptions>,
) -> Result<HttpResponse, ServerError>
where
    B: MessageStore,
    T: ClearingTransport,
{
    trace!("💻️ Received new payin request");
    let message = payin_from_form(&form, &merchant, options.max_amount)?;
    submit(&api, message.into()).await
}

async fn list_messages<B: MessageStore>(api: &MessageApi<B>, kind: MessageKind) -> Result<HttpResponse, ServerError> {
    let messages = api.messages(kind).await?;
    let views = messages.iter().map(MessageView::from).collect::<Vec<_>>();
    debug!("💻️ Returning {} {}", views.len(), kind.plural());
    Ok(HttpResponse::Ok().json(views))
}

async fn message_by_id<B: MessageStore>(
    api: &MessageApi<B>,
    kind: MessageKind,
    id: MessageId,
) -> Result<HttpResponse, ServerError> {
    let message = api.message(kind, &id).await?.ok_or_else(|| ServerError::NoRecordFound(format!("{kind} {id}")))?;
    Ok(HttpResponse::Ok().json(MessageView::from(&message)))
}

async fn submit<B, T>(api: &DispatchApi<B, T>, message: OutboundMessage) -> Result<HttpResponse, ServerError>
where
    B: MessageStore,
    T: ClearingTransport,
{
    let kind = message.kind();
    let stored = api.submit(message).await.map_err(|e| {
        warn!("💻️ Could not submit {kind}. {e}");
        ServerError::from(e)
    })?;
    info!("💻️ {kind} {} submitted as network transaction {}", stored.id, stored.network_transaction_id);
    Ok(HttpResponse::Ok().json(MessageView::from(&stored)))
}

// ----------------------------------------------   Network callbacks  -----------------------------------------
route!(network_message => Post "/network/messages" with CallbackCorrelation & MessageStore);
/// Webhook for the clearing network's signed callbacks.
///
/// The body is verified exactly as received. Anything that cannot be parsed or authenticated is refused with the
/// same `400`, and nothing is stored. Accepted callbacks get an empty `200`, even when some of their outcomes match
/// nothing we know about.
pub async fn network_message<B>(
    req: HttpRequest,
    body: web::Bytes,
    api: web::Data<CallbackApi<B>>,
) -> Result<HttpResponse, ServerError>
where
    B: CallbackCorrelation + MessageStore,
{
    let signature = callback_signature(&req);
    let body = std::str::from_utf8(&body).map_err(|e| {
        warn!("💻️ Callback body is not valid UTF-8. {e}");
        ServerError::InvalidCallback
    })?;
    info!("💻️ Callback received: {body}");
    info!("💻️ Callback signature: {}", signature.unwrap_or("<none>"));
    let dispositions = api.process_callback(body, signature).await.map_err(|e| {
        warn!("💻️ Callback refused. {e}");
        ServerError::from(e)
    })?;
    for d in &dispositions {
        match &d.target {
            CallbackTarget::Recorded(id) => debug!("💻️ {} recorded on message {id}", d.outcome.network_transaction_id),
            CallbackTarget::Captured { suite_id } => {
                debug!("💻️ {} captured by test suite {suite_id}", d.outcome.network_transaction_id)
            },
            CallbackTarget::Orphan => warn!("💻️ {} matches no known transaction", d.outcome.network_transaction_id),
        }
    }
    Ok(HttpResponse::Ok().finish())
}

// ----------------------------------------------   Tester  ----------------------------------------------------
route!(tester => Get "/tester" impl TestSuiteManagement);
/// Progress of the running test suite.
pub async fn tester<S: TestSuiteManagement>(api: web::Data<TestSuiteApi<S>>) -> Result<HttpResponse, ServerError> {
    trace!("💻️ Received tester dashboard request");
    let dashboard = match api.current().await? {
        Some(suite) => TesterDashboard::from(api.report(suite.id).await?),
        None => TesterDashboard::default(),
    };
    Ok(HttpResponse::Ok().json(dashboard))
}

route!(suite_report => Get "/tester/suites/{id}" impl TestSuiteManagement);
pub async fn suite_report<S: TestSuiteManagement>(
    path: web::Path<i64>,
    api: web::Data<TestSuiteApi<S>>,
) -> Result<HttpResponse, ServerError> {
    let suite_id = path.into_inner();
    trace!("💻️ Received report request for test suite {suite_id}");
    let report = api.report(suite_id).await?;
    Ok(HttpResponse::Ok().json(report))
}

route!(start_tester => Post "/tester/start" impl TestSuiteManagement, MessageStore, ClearingTransport);
/// Starts a new test suite and sends its batch in the background. Fails with `409` if a suite is already running.
pub async fn start_tester<S, B, T>(
    api: web::Data<TestSuiteApi<S>>,
    dispatcher: web::Data<DispatchApi<B, T>>,
    merchant: web::Data<MerchantConfig>,
    tester: web::Data<TesterConfig>,
) -> Result<HttpResponse, ServerError>
where
    S: TestSuiteManagement + 'static,
    B: MessageStore + 'static,
    T: ClearingTransport + 'static,
{
    let suite = api.start().await?;
    let items = compose_batch(&merchant, &tester);
    info!("🧪️ Test suite {} started with {} messages to send", suite.id, items.len());
    spawn_batch(api.clone(), dispatcher.clone(), suite.id, items);
    Ok(HttpResponse::Ok().json(suite))
}

route!(stop_tester => Post "/tester/stop" impl TestSuiteManagement);
pub async fn stop_tester<S: TestSuiteManagement>(api: web::Data<TestSuiteApi<S>>) -> Result<HttpResponse, ServerError> {
    let suite = api.finish().await?;
    info!("🧪️ Test suite {} finished", suite.id);
    Ok(HttpResponse::Ok().json(JsonResponse::success(format!("Test suite {} finished", suite.id))))
}
