//! Session database queries.
//!
//! Sessions back the cookie-based authentication: the session ID is a
//! random nanoid stored server-side and used directly as the cookie
//! value.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::{Error, Result};

use super::DbPool;

/// Web session record.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    pub user_id: i64,
    pub expires_at: String,
    pub created_at: String,
}

impl Session {
    pub fn is_expired(&self) -> bool {
        match DateTime::parse_from_rfc3339(&self.expires_at) {
            Ok(expires) => expires < Utc::now(),
            // If we can't parse, treat as expired
            Err(_) => true,
        }
    }
}

/// Input for creating a session.
#[derive(Debug, Clone)]
pub struct CreateSession {
    pub id: String,
    pub user_id: i64,
    pub expires_at: DateTime<Utc>,
}

/// Create a new session.
pub async fn create_session(pool: &DbPool, input: CreateSession) -> Result<Session> {
    sqlx::query_as::<_, Session>(
        r#"
        INSERT INTO sessions (id, user_id, expires_at)
        VALUES (?, ?, ?)
        RETURNING *
        "#,
    )
    .bind(&input.id)
    .bind(input.user_id)
    .bind(input.expires_at.to_rfc3339())
    .fetch_one(pool)
    .await
    .map_err(Error::Database)
}

/// Get a session by ID.
pub async fn get_session(pool: &DbPool, id: &str) -> Result<Option<Session>> {
    sqlx::query_as::<_, Session>("SELECT * FROM sessions WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(Error::Database)
}

/// Update a session's expiry (sliding sessions).
pub async fn extend_session(pool: &DbPool, id: &str, expires_at: DateTime<Utc>) -> Result<()> {
    sqlx::query("UPDATE sessions SET expires_at = ? WHERE id = ?")
        .bind(expires_at.to_rfc3339())
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

/// Delete a session.
pub async fn delete_session(pool: &DbPool, id: &str) -> Result<()> {
    sqlx::query("DELETE FROM sessions WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

/// Delete expired sessions.
/// Uses idx_sessions_expires index.
pub async fn cleanup_expired_sessions(pool: &DbPool) -> Result<u64> {
    // expires_at is stored as RFC 3339, so compare against the same format
    let result = sqlx::query("DELETE FROM sessions WHERE expires_at < ?")
        .bind(Utc::now().to_rfc3339())
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}

/// Cleanup interval for the background session sweep.
const CLEANUP_INTERVAL_SECS: u64 = 3600;

/// Start the background task that sweeps expired sessions.
///
/// Expired sessions are also deleted lazily when presented, so this
/// only reclaims rows for sessions that were simply abandoned.
pub fn start_session_cleanup(pool: DbPool) {
    tokio::spawn(async move {
        loop {
            tokio::time::sleep(std::time::Duration::from_secs(CLEANUP_INTERVAL_SECS)).await;

            match cleanup_expired_sessions(&pool).await {
                Ok(removed) if removed > 0 => {
                    tracing::debug!(removed, "Cleaned up expired sessions");
                }
                Ok(_) => {}
                Err(e) => tracing::warn!("Session cleanup failed: {}", e),
            }
        }
    });
}
