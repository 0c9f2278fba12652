use std::{fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The two families of instruction the clearing network understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum MessageKind {
    /// Money leaves the merchant account towards a creditor.
    Payout,
    /// Money arrives into the merchant account, usually through an interactive payment page.
    Payin,
}

impl MessageKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageKind::Payout => "payout",
            MessageKind::Payin => "payin",
        }
    }

    /// The plural form used in URL paths, e.g. `/messages/payouts`.
    pub fn plural(&self) -> &'static str {
        match self {
            MessageKind::Payout => "payouts",
            MessageKind::Payin => "payins",
        }
    }
}

impl Display for MessageKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Error)]
#[error("Invalid message kind: {0}")]
pub struct MessageKindParseError(String);

impl FromStr for MessageKind {
    type Err = MessageKindParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "payout" | "payouts" => Ok(Self::Payout),
            "payin" | "payins" => Ok(Self::Payin),
            _ => Err(MessageKindParseError(s.to_string())),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn parse_kinds() {
        assert_eq!("payout".parse::<MessageKind>().unwrap(), MessageKind::Payout);
        assert_eq!("Payins".parse::<MessageKind>().unwrap(), MessageKind::Payin);
        assert!("refund".parse::<MessageKind>().is_err());
    }

    #[test]
    fn serde_names() {
        assert_eq!(serde_json::to_string(&MessageKind::Payin).unwrap(), r#""payin""#);
        assert_eq!(MessageKind::Payout.plural(), "payouts");
    }
}
