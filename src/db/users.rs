//! User database queries.
//!
//! Users are identified by a unique, case-normalized email address.
//! Accounts are never deleted through the API; `delete_user` exists
//! for administrative use and cascades to albums, quotes, and
//! sessions.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::{Error, Result};

use super::DbPool;

/// User record from the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub nickname: String,
    pub date_of_birth: NaiveDate,
    pub password_hash: Option<String>,
    pub is_active: bool,
    pub is_admin: bool,
    pub last_login: Option<String>,
    pub created_at: String,
}

impl User {
    /// All admins are staff.
    pub fn is_staff(&self) -> bool {
        self.is_admin
    }
}

/// Input for creating a new user.
#[derive(Debug, Clone)]
pub struct CreateUser {
    pub email: String,
    pub nickname: String,
    pub date_of_birth: NaiveDate,
    pub password_hash: Option<String>,
    pub is_admin: bool,
}

/// Normalize an email address by lowercasing its domain part.
///
/// The local part is left untouched, matching the behavior of the
/// account system this data originated from.
pub fn normalize_email(email: &str) -> String {
    match email.rsplit_once('@') {
        Some((local, domain)) => format!("{}@{}", local, domain.to_lowercase()),
        None => email.to_string(),
    }
}

/// Create a new user.
///
/// The caller is expected to have normalized the email and hashed the
/// password already. A duplicate email surfaces as a field-level
/// validation error rather than a conflict, since registration is the
/// only path that hits it.
pub async fn create_user(pool: &DbPool, input: CreateUser) -> Result<User> {
    sqlx::query_as::<_, User>(
        r#"
        INSERT INTO users (email, nickname, date_of_birth, password_hash, is_admin)
        VALUES (?, ?, ?, ?, ?)
        RETURNING *
        "#,
    )
    .bind(&input.email)
    .bind(&input.nickname)
    .bind(input.date_of_birth)
    .bind(&input.password_hash)
    .bind(input.is_admin)
    .fetch_one(pool)
    .await
    .map_err(|e| match e {
        sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
            let mut fields = serde_json::Map::new();
            fields.insert(
                "email".to_string(),
                serde_json::json!(["A user with this email is already registered."]),
            );
            Error::FieldValidation(fields)
        }
        _ => Error::Database(e),
    })
}

/// Get a user by ID.
pub async fn get_user(pool: &DbPool, id: i64) -> Result<User> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| Error::NotFound(format!("User not found: {}", id)))
}

/// Get an active user by ID (public directory view).
pub async fn get_active_user(pool: &DbPool, id: i64) -> Result<User> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ? AND is_active = 1")
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| Error::NotFound(format!("User not found: {}", id)))
}

/// Get a user by email.
/// Uses idx_users_email index.
pub async fn get_user_by_email(pool: &DbPool, email: &str) -> Result<Option<User>> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = ?")
        .bind(email)
        .fetch_optional(pool)
        .await
        .map_err(Error::Database)
}

/// List active users, newest first, paginated.
pub async fn list_active_users(pool: &DbPool, limit: i64, offset: i64) -> Result<Vec<User>> {
    sqlx::query_as::<_, User>(
        r#"
        SELECT * FROM users
        WHERE is_active = 1
        ORDER BY id ASC
        LIMIT ? OFFSET ?
        "#,
    )
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await
    .map_err(Error::Database)
}

/// Count active users (for pagination).
pub async fn count_active_users(pool: &DbPool) -> Result<i64> {
    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users WHERE is_active = 1")
        .fetch_one(pool)
        .await?;
    Ok(count)
}

/// Delete a user and cascade to owned albums, quotes, and sessions.
pub async fn delete_user(pool: &DbPool, id: i64) -> Result<()> {
    let result = sqlx::query("DELETE FROM users WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(Error::NotFound(format!("User not found: {}", id)));
    }

    Ok(())
}

/// Update user's last login timestamp.
pub async fn update_last_login(pool: &DbPool, id: i64) -> Result<()> {
    sqlx::query("UPDATE users SET last_login = datetime('now') WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

/// Check whether any admin user exists (bootstrap gate).
pub async fn admin_exists(pool: &DbPool) -> Result<bool> {
    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users WHERE is_admin = 1")
        .fetch_one(pool)
        .await?;
    Ok(count > 0)
}
