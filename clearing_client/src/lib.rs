//! # Clearing network client
//!
//! Everything needed to talk to the clearing network's messaging API lives here:
//!
//! * The wire types for outbound instruction envelopes ([`PayoutMessage`], [`PayinMessage`]) and the asynchronous
//!   [`ResponseMessage`] callbacks the network delivers later.
//! * [`SubmissionResponse`], the interpretation of the synchronous answer to a submission.
//! * [`ClearingApi`], a `reqwest` based implementation of the [`ClearingTransport`] trait.
//!
//! Signing is not done here. Callers hand over an envelope that has already been serialized and signed, and the
//! transport posts exactly those bytes.
mod api;
mod common;
mod config;
mod error;
mod messages;
mod payins;
mod payouts;
mod responses;
mod submission;

pub use api::{ClearingApi, ClearingTransport, API_KEY_HEADER, SIGNATURE_HEADER};
pub use common::{
    FinancialInstitution,
    MessageHeader,
    Party,
    PersonId,
    CASH_ACCOUNT,
    CHILEAN_ID_SCHEMA,
    CURRENT_ACCOUNT,
    NETWORK_FIN_ID_SCHEMA,
    SAVINGS_ACCOUNT,
};
pub use config::ClearingConfig;
pub use error::ClearingApiError;
pub use messages::OutboundMessage;
pub use payins::{PayinMessage, PayinTransaction, INTERACTIVE_PAYIN};
pub use payouts::{PayoutMessage, PayoutTransaction};
pub use responses::{ErrorDetail, PayinResponse, PayoutResponse, Response, ResponseMessage};
pub use submission::{SubmissionResponse, HTTP_ACCEPTED, HTTP_ALREADY_ACCEPTED};
