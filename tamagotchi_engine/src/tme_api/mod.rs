//! # Tamagotchi engine public API
//!
//! * [`dispatch_api`] signs and submits outbound envelopes and registers accepted ones in the message store.
//! * [`callback_api`] authenticates inbound callbacks and routes their outcomes.
//! * [`message_api`] reads back stored messages.
//! * [`test_suite_api`] drives the test suite state machine and its synthetic batches.
//!
//! Every API is created by supplying a backend that implements the traits it needs:
//!
//! ```rust,ignore
//! use tamagotchi_engine::{CallbackApi, SqliteDatabase};
//! let db = SqliteDatabase::new_with_url(...).await?;
//! let api = CallbackApi::new(db, verifier, producers);
//! let dispositions = api.process_callback(&body, signature.as_deref()).await?;
//! ```
pub mod callback_api;
pub mod dispatch_api;
pub mod errors;
pub mod message_api;
pub mod suite_objects;
pub mod test_suite_api;
