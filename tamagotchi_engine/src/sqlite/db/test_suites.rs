use chrono::Utc;
use sqlx::{types::Json, SqliteConnection};

use crate::db_types::{NewTestMessage, NewTestResponse, TestMessage, TestResponse, TestSuite};

/// Inserts a new running suite. A unique violation means another suite is already running.
///
/// Every `RETURNING` write in this module is read with `fetch_all`, so the statement always runs to completion.
pub async fn insert_suite(conn: &mut SqliteConnection) -> Result<TestSuite, sqlx::Error> {
    let suite: TestSuite =
        sqlx::query_as("INSERT INTO test_suites (status, created_at) VALUES ('running', $1) RETURNING *")
            .bind(Utc::now())
            .fetch_all(conn)
            .await?
            .into_iter()
            .next()
            .ok_or(sqlx::Error::RowNotFound)?;
    Ok(suite)
}

pub async fn fetch_running_suite(conn: &mut SqliteConnection) -> Result<Option<TestSuite>, sqlx::Error> {
    let suite = sqlx::query_as("SELECT * FROM test_suites WHERE status = 'running'").fetch_optional(conn).await?;
    Ok(suite)
}

pub async fn fetch_suite(id: i64, conn: &mut SqliteConnection) -> Result<Option<TestSuite>, sqlx::Error> {
    let suite = sqlx::query_as("SELECT * FROM test_suites WHERE id = $1").bind(id).fetch_optional(conn).await?;
    Ok(suite)
}

pub async fn fetch_latest_suite(conn: &mut SqliteConnection) -> Result<Option<TestSuite>, sqlx::Error> {
    let suite = sqlx::query_as("SELECT * FROM test_suites ORDER BY id DESC LIMIT 1").fetch_optional(conn).await?;
    Ok(suite)
}

/// Returns the suite that was finished, or `None` if nothing was running.
pub async fn finish_running_suite(conn: &mut SqliteConnection) -> Result<Option<TestSuite>, sqlx::Error> {
    let suite: Option<TestSuite> = sqlx::query_as(
        "UPDATE test_suites SET status = 'finished', finished_at = $1 WHERE status = 'running' RETURNING *",
    )
    .bind(Utc::now())
    .fetch_all(conn)
    .await?
    .into_iter()
    .next();
    Ok(suite)
}

/// Appends a message to the suite, provided the suite is still running. Returns `None` (and writes nothing) otherwise.
pub async fn insert_test_message(
    suite_id: i64,
    message: NewTestMessage,
    conn: &mut SqliteConnection,
) -> Result<Option<TestMessage>, sqlx::Error> {
    let message: Option<TestMessage> = sqlx::query_as(
        r#"
            INSERT INTO test_messages (
                suite_id,
                created_at,
                description,
                kind,
                content,
                http_status,
                http_response,
                error_message,
                transaction_id_mapping
            )
            SELECT $1, $2, $3, $4, $5, $6, $7, $8, $9
            WHERE EXISTS (SELECT 1 FROM test_suites WHERE id = $1 AND status = 'running')
            RETURNING *;
        "#,
    )
    .bind(suite_id)
    .bind(Utc::now())
    .bind(message.description)
    .bind(message.kind)
    .bind(message.content)
    .bind(message.http_status.map(i64::from))
    .bind(message.http_response)
    .bind(message.error_message)
    .bind(Json(message.transaction_id_mapping))
    .fetch_all(conn)
    .await?
    .into_iter()
    .next();
    Ok(message)
}

/// Appends a captured outcome to the suite, provided the suite is still running. Returns `None` otherwise.
pub async fn insert_test_response(
    suite_id: i64,
    response: NewTestResponse,
    conn: &mut SqliteConnection,
) -> Result<Option<TestResponse>, sqlx::Error> {
    let response: Option<TestResponse> = sqlx::query_as(
        r#"
            INSERT INTO test_responses (suite_id, created_at, network_transaction_id, transaction_id, content)
            SELECT $1, $2, $3, $4, $5
            WHERE EXISTS (SELECT 1 FROM test_suites WHERE id = $1 AND status = 'running')
            RETURNING *;
        "#,
    )
    .bind(suite_id)
    .bind(Utc::now())
    .bind(response.network_transaction_id)
    .bind(response.transaction_id)
    .bind(response.content)
    .fetch_all(conn)
    .await?
    .into_iter()
    .next();
    Ok(response)
}

pub async fn fetch_test_messages(suite_id: i64, conn: &mut SqliteConnection) -> Result<Vec<TestMessage>, sqlx::Error> {
    let messages = sqlx::query_as("SELECT * FROM test_messages WHERE suite_id = $1 ORDER BY id")
        .bind(suite_id)
        .fetch_all(conn)
        .await?;
    Ok(messages)
}

pub async fn fetch_test_responses(
    suite_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Vec<TestResponse>, sqlx::Error> {
    let responses = sqlx::query_as("SELECT * FROM test_responses WHERE suite_id = $1 ORDER BY id")
        .bind(suite_id)
        .fetch_all(conn)
        .await?;
    Ok(responses)
}
