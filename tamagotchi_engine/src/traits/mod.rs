//! # Storage and signing interfaces
//!
//! The engine talks to its backend exclusively through the traits in this module.
//!
//! * [`MessageStore`] persists accepted outbound messages and the callbacks that arrive for them.
//! * [`TestSuiteManagement`] manages the single running test suite, along with the messages it sent and the callback
//!   outcomes it captured.
//! * [`CallbackCorrelation`] routes every outcome of a verified callback to a stored message, the running suite, or
//!   the orphan path, in one atomic unit.
//! * [`MessageSigner`] and [`MessageVerifier`] sign outbound envelopes and authenticate inbound callbacks.
mod callback_correlation;
mod message_store;
mod signing;
mod test_suite_management;

pub use callback_correlation::{CallbackCorrelation, CorrelationError};
pub use message_store::{MessageStore, MessageStoreError};
pub use signing::{MessageSigner, MessageVerifier, SignatureError};
pub use test_suite_management::{TestSuiteError, TestSuiteManagement};
