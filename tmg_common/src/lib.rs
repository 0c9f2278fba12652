mod amounts;
mod message_kind;
mod secret;

pub use amounts::{digits_only, format_amount, AmountError, CLP_CURRENCY_CODE};
pub use message_kind::{MessageKind, MessageKindParseError};
pub use secret::Secret;
