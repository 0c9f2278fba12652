use chrono::Utc;
use log::*;
use sqlx::SqliteConnection;
use tmg_common::MessageKind;

use crate::db_types::{MessageId, NetworkTransactionId, NewMessage, PersistedMessage};

/// Inserts a new message. Unique violations on the primary key or on the network transaction id are returned as
/// database errors for the caller to interpret.
pub async fn insert_message(message: NewMessage, conn: &mut SqliteConnection) -> Result<PersistedMessage, sqlx::Error> {
    let now = Utc::now();
    let message: PersistedMessage = sqlx::query_as(
        r#"
            INSERT INTO messages (
                id,
                kind,
                transaction_id,
                network_transaction_id,
                content,
                signature,
                redirect_url,
                created_at,
                updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *;
        "#,
    )
    .bind(message.id)
    .bind(message.kind)
    .bind(message.transaction_id)
    .bind(message.network_transaction_id)
    .bind(message.content)
    .bind(message.signature)
    .bind(message.redirect_url)
    .bind(now)
    .bind(now)
    .fetch_all(conn)
    .await?
    .into_iter()
    .next()
    .ok_or(sqlx::Error::RowNotFound)?;
    Ok(message)
}

pub async fn fetch_message(
    id: &MessageId,
    conn: &mut SqliteConnection,
) -> Result<Option<PersistedMessage>, sqlx::Error> {
    let message = sqlx::query_as("SELECT * FROM messages WHERE id = $1").bind(id.as_str()).fetch_optional(conn).await?;
    Ok(message)
}

pub async fn fetch_message_by_network_id(
    network_id: &NetworkTransactionId,
    conn: &mut SqliteConnection,
) -> Result<Option<PersistedMessage>, sqlx::Error> {
    let message = sqlx::query_as("SELECT * FROM messages WHERE network_transaction_id = $1")
        .bind(network_id.as_str())
        .fetch_optional(conn)
        .await?;
    Ok(message)
}

/// Newest first. Messages created in the same instant come back in reverse insertion order.
pub async fn fetch_messages(
    kind: MessageKind,
    conn: &mut SqliteConnection,
) -> Result<Vec<PersistedMessage>, sqlx::Error> {
    let messages = sqlx::query_as("SELECT * FROM messages WHERE kind = $1 ORDER BY created_at DESC, rowid DESC")
        .bind(kind)
        .fetch_all(conn)
        .await?;
    Ok(messages)
}

/// Writes both callback fields in one statement, so that no reader ever sees one without the other.
///
/// This is a write even when no row matches. Issued first inside a transaction, it takes the database write lock
/// before anything is read.
pub async fn record_callback(
    network_id: &NetworkTransactionId,
    content: &str,
    signature: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<MessageId>, sqlx::Error> {
    let id: Option<MessageId> = sqlx::query_scalar(
        r#"
            UPDATE messages SET response_content = $1, response_signature = $2, updated_at = $3
            WHERE network_transaction_id = $4
            RETURNING id;
        "#,
    )
    .bind(content)
    .bind(signature)
    .bind(Utc::now())
    .bind(network_id.as_str())
    .fetch_all(conn)
    .await?
    .into_iter()
    .next();
    if let Some(id) = &id {
        trace!("🗃️ Callback for {network_id} stored on message {id}");
    }
    Ok(id)
}

/// Stores the callback only if the message has none yet. Returns `None` if no message matches, or if the message
/// already carries a callback.
pub async fn record_first_callback(
    network_id: &NetworkTransactionId,
    content: &str,
    signature: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<MessageId>, sqlx::Error> {
    let id: Option<MessageId> = sqlx::query_scalar(
        r#"
            UPDATE messages SET response_content = $1, response_signature = $2, updated_at = $3
            WHERE network_transaction_id = $4 AND response_content IS NULL
            RETURNING id;
        "#,
    )
    .bind(content)
    .bind(signature)
    .bind(Utc::now())
    .bind(network_id.as_str())
    .fetch_all(conn)
    .await?
    .into_iter()
    .next();
    Ok(id)
}
