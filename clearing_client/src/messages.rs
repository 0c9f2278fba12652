use tmg_common::MessageKind;

use crate::{common::MessageHeader, PayinMessage, PayoutMessage};

/// Any envelope the merchant can send to the network.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutboundMessage {
    Payout(PayoutMessage),
    Payin(PayinMessage),
}

impl OutboundMessage {
    pub fn kind(&self) -> MessageKind {
        match self {
            OutboundMessage::Payout(_) => MessageKind::Payout,
            OutboundMessage::Payin(_) => MessageKind::Payin,
        }
    }

    pub fn header(&self) -> &MessageHeader {
        match self {
            OutboundMessage::Payout(m) => &m.header,
            OutboundMessage::Payin(m) => &m.header,
        }
    }

    pub fn message_id(&self) -> &str {
        &self.header().message_id
    }

    /// The client transaction ids of every instruction in the envelope, in order.
    pub fn transaction_ids(&self) -> Vec<&str> {
        match self {
            OutboundMessage::Payout(m) => m.transactions.iter().map(|t| t.transaction_id.as_str()).collect(),
            OutboundMessage::Payin(m) => m.transactions.iter().map(|t| t.transaction_id.as_str()).collect(),
        }
    }

    pub fn transaction_count(&self) -> usize {
        match self {
            OutboundMessage::Payout(m) => m.transactions.len(),
            OutboundMessage::Payin(m) => m.transactions.len(),
        }
    }

    pub fn as_json(&self) -> Result<String, serde_json::Error> {
        match self {
            OutboundMessage::Payout(m) => m.as_json(),
            OutboundMessage::Payin(m) => m.as_json(),
        }
    }

    pub fn from_json(kind: MessageKind, json: &str) -> Result<Self, serde_json::Error> {
        match kind {
            MessageKind::Payout => PayoutMessage::from_json(json).map(OutboundMessage::Payout),
            MessageKind::Payin => PayinMessage::from_json(json).map(OutboundMessage::Payin),
        }
    }
}

impl From<PayoutMessage> for OutboundMessage {
    fn from(value: PayoutMessage) -> Self {
        OutboundMessage::Payout(value)
    }
}

impl From<PayinMessage> for OutboundMessage {
    fn from(value: PayinMessage) -> Self {
        OutboundMessage::Payin(value)
    }
}
