//! Tamagotchi Engine
//!
//! The engine is the correlation core of the Tamagotchi merchant gateway. A merchant submits payouts and payins to a
//! clearing network, and later receives signed callbacks reporting on them. This library keeps track of what was sent
//! and matches each callback to it.
//!
//! The library is divided into the following sections:
//! 1. Storage ([`traits`] and the SQLite backend, [`SqliteDatabase`]). Every accepted outbound message is stored once,
//!    keyed on its message id and indexed on the network transaction id that callbacks refer to.
//! 2. The public API. [`DispatchApi`] signs and submits envelopes, [`CallbackApi`] authenticates and correlates
//!    callbacks, and [`TestSuiteApi`] runs synthetic batches against the network while capturing the callbacks that
//!    match no stored message.
//! 3. Events ([`mod@events`]). Callbacks that match nothing are published as [`events::OrphanCallbackEvent`]s for
//!    hooks to deal with.
pub mod db_types;
pub mod events;
pub mod helpers;
#[cfg(feature = "sqlite")]
mod sqlite;
mod tme_api;
pub mod traits;

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteDatabase;
pub use tme_api::{
    callback_api::CallbackApi,
    dispatch_api::{DispatchApi, SentMessage},
    errors::{CallbackError, DispatchError},
    message_api::MessageApi,
    suite_objects,
    test_suite_api::{BatchItem, BatchSummary, TestSuiteApi},
};
pub use traits::{
    CallbackCorrelation,
    CorrelationError,
    MessageSigner,
    MessageStore,
    MessageStoreError,
    MessageVerifier,
    SignatureError,
    TestSuiteError,
    TestSuiteManagement,
};
