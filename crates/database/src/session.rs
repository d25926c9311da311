//! Chat session and message persistence.

use sqlx::SqlitePool;

use crate::error::{DatabaseError, Result};
use crate::models::{ChatMessageRow, ChatSession, SessionData};
use crate::validation;

/// Create a new chat session.
pub async fn create_session(pool: &SqlitePool, id: &str, data: &SessionData) -> Result<ChatSession> {
    sqlx::query("INSERT INTO chat_sessions (id, character_id, title) VALUES (?, ?, ?)")
        .bind(id)
        .bind(&data.character_id)
        .bind(&data.title)
        .execute(pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e {
                if db_err.is_unique_violation() {
                    return DatabaseError::AlreadyExists {
                        entity: "ChatSession",
                        id: id.to_string(),
                    };
                }
            }
            DatabaseError::Sqlx(e)
        })?;

    get_session(pool, id).await
}

/// Get a session by ID.
pub async fn get_session(pool: &SqlitePool, id: &str) -> Result<ChatSession> {
    sqlx::query_as::<_, ChatSession>(
        "SELECT id, character_id, title, created_at, updated_at FROM chat_sessions WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| DatabaseError::NotFound {
        entity: "ChatSession",
        id: id.to_string(),
    })
}

/// Delete a session and (by cascade) its messages.
pub async fn delete_session(pool: &SqlitePool, id: &str) -> Result<()> {
    let result = sqlx::query("DELETE FROM chat_sessions WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(DatabaseError::NotFound {
            entity: "ChatSession",
            id: id.to_string(),
        });
    }

    Ok(())
}

/// List sessions, most recently updated first.
///
/// Pass a character ID to list only that character's sessions.
pub async fn list_sessions(
    pool: &SqlitePool,
    character_id: Option<&str>,
) -> Result<Vec<ChatSession>> {
    let sessions = match character_id {
        Some(character_id) => {
            sqlx::query_as::<_, ChatSession>(
                r#"
                SELECT id, character_id, title, created_at, updated_at
                FROM chat_sessions
                WHERE character_id = ?
                ORDER BY updated_at DESC, id
                "#,
            )
            .bind(character_id)
            .fetch_all(pool)
            .await?
        }
        None => {
            sqlx::query_as::<_, ChatSession>(
                r#"
                SELECT id, character_id, title, created_at, updated_at
                FROM chat_sessions
                ORDER BY updated_at DESC, id
                "#,
            )
            .fetch_all(pool)
            .await?
        }
    };

    Ok(sessions)
}

/// Append a message to a session and bump the session's updated_at.
pub async fn append_message(
    pool: &SqlitePool,
    session_id: &str,
    role: &str,
    content: &str,
) -> Result<ChatMessageRow> {
    validation::validate_role(role)?;

    // Surface a missing session as NotFound rather than a bare FK violation.
    get_session(pool, session_id).await?;

    let result = sqlx::query("INSERT INTO chat_messages (session_id, role, content) VALUES (?, ?, ?)")
        .bind(session_id)
        .bind(role)
        .bind(content)
        .execute(pool)
        .await?;

    sqlx::query("UPDATE chat_sessions SET updated_at = datetime('now') WHERE id = ?")
        .bind(session_id)
        .execute(pool)
        .await?;

    let id = result.last_insert_rowid();
    let message = sqlx::query_as::<_, ChatMessageRow>(
        "SELECT id, session_id, role, content, created_at FROM chat_messages WHERE id = ?",
    )
    .bind(id)
    .fetch_one(pool)
    .await?;

    Ok(message)
}

/// List all messages in a session, oldest first.
pub async fn list_messages(pool: &SqlitePool, session_id: &str) -> Result<Vec<ChatMessageRow>> {
    let messages = sqlx::query_as::<_, ChatMessageRow>(
        r#"
        SELECT id, session_id, role, content, created_at
        FROM chat_messages
        WHERE session_id = ?
        ORDER BY id
        "#,
    )
    .bind(session_id)
    .fetch_all(pool)
    .await?;

    Ok(messages)
}

/// The last `limit` messages of a session, in chronological order.
pub async fn recent_messages(
    pool: &SqlitePool,
    session_id: &str,
    limit: usize,
) -> Result<Vec<ChatMessageRow>> {
    let mut messages = sqlx::query_as::<_, ChatMessageRow>(
        r#"
        SELECT id, session_id, role, content, created_at
        FROM chat_messages
        WHERE session_id = ?
        ORDER BY id DESC
        LIMIT ?
        "#,
    )
    .bind(session_id)
    .bind(limit as i64)
    .fetch_all(pool)
    .await?;

    messages.reverse();
    Ok(messages)
}

/// Count messages in a session.
pub async fn count_messages(pool: &SqlitePool, session_id: &str) -> Result<i64> {
    let count =
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM chat_messages WHERE session_id = ?")
            .bind(session_id)
            .fetch_one(pool)
            .await?;

    Ok(count)
}
