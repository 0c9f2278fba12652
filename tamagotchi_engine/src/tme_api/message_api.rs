use std::fmt::Debug;

use log::*;
use tmg_common::MessageKind;

use crate::{
    db_types::{MessageId, PersistedMessage},
    traits::{MessageStore, MessageStoreError},
};

/// Read-only access to the stored outbound messages.
pub struct MessageApi<B> {
    db: B,
}

impl<B> Debug for MessageApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "MessageApi")
    }
}

impl<B> MessageApi<B> {
    pub fn new(db: B) -> Self {
        Self { db }
    }
}

impl<B> MessageApi<B>
where B: MessageStore
{
    /// All stored messages of the given kind, newest first.
    pub async fn messages(&self, kind: MessageKind) -> Result<Vec<PersistedMessage>, MessageStoreError> {
        self.db.fetch_messages(kind).await
    }

    /// Fetches a single message. A message of a different kind is treated as not found.
    pub async fn message(
        &self,
        kind: MessageKind,
        id: &MessageId,
    ) -> Result<Option<PersistedMessage>, MessageStoreError> {
        let message = self.db.fetch_message(id).await?.filter(|m| {
            let matches = m.kind == kind;
            if !matches {
                debug!("🔄️ Message {id} is a {}, not a {kind}", m.kind);
            }
            matches
        });
        Ok(message)
    }
}
