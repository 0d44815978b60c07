//! Account registration and credential authentication.
//!
//! Passwords are hashed with Argon2id and stored as PHC-format
//! strings. A user without a stored hash has no usable password and
//! can never authenticate with credentials.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::NaiveDate;

use crate::db::{self, DbPool, User};
use crate::{Error, Result};

/// Hash a password using Argon2id. Returns a PHC-format string.
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| Error::Internal(format!("Failed to hash password: {}", e)))?;
    Ok(hash.to_string())
}

/// Verify a password against a PHC-format hash string.
pub fn verify_password(password: &str, hash: &str) -> Result<bool> {
    let parsed_hash =
        PasswordHash::new(hash).map_err(|e| Error::Internal(format!("Invalid password hash: {}", e)))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

/// Input for registering a user.
#[derive(Debug, Clone)]
pub struct Registration {
    pub email: String,
    pub nickname: Option<String>,
    pub date_of_birth: NaiveDate,
    pub password: Option<String>,
}

/// Account service: registration and credential authentication.
#[derive(Clone)]
pub struct AuthService {
    db: DbPool,
}

impl AuthService {
    pub fn new(db: DbPool) -> Self {
        Self { db }
    }

    /// Create a regular user account.
    ///
    /// The email is case-normalized before storage; validation and
    /// duplicate registration both surface as field-level validation
    /// errors (400).
    pub async fn register(&self, input: Registration) -> Result<User> {
        self.create_account(input, false).await
    }

    /// Create an admin account. Same rules as `register`.
    pub async fn register_superuser(&self, input: Registration) -> Result<User> {
        self.create_account(input, true).await
    }

    async fn create_account(&self, input: Registration, is_admin: bool) -> Result<User> {
        let email = input.email.trim();
        if email.is_empty() || !email.contains('@') {
            let mut fields = serde_json::Map::new();
            fields.insert(
                "email".to_string(),
                serde_json::json!(["A valid email address is required."]),
            );
            return Err(Error::FieldValidation(fields));
        }

        let password_hash = match input.password.as_deref() {
            Some(password) if !password.is_empty() => Some(hash_password(password)?),
            _ => None,
        };

        db::create_user(
            &self.db,
            db::CreateUser {
                email: db::normalize_email(email),
                nickname: input.nickname.unwrap_or_default(),
                date_of_birth: input.date_of_birth,
                password_hash,
                is_admin,
            },
        )
        .await
    }

    /// Authenticate with email and password.
    ///
    /// Unknown email, inactive account, missing password hash, and
    /// hash mismatch are indistinguishable to the caller. On success
    /// the user's last_login timestamp is refreshed.
    pub async fn authenticate(&self, email: &str, password: &str) -> Result<User> {
        let email = db::normalize_email(email.trim());

        let user = db::get_user_by_email(&self.db, &email)
            .await?
            .ok_or(Error::InvalidCredentials)?;

        if !user.is_active {
            return Err(Error::InvalidCredentials);
        }

        let hash = user
            .password_hash
            .as_deref()
            .ok_or(Error::InvalidCredentials)?;

        if !verify_password(password, hash)? {
            return Err(Error::InvalidCredentials);
        }

        db::update_last_login(&self.db, user.id).await?;

        // Re-read so the returned record carries the fresh last_login
        db::get_user(&self.db, user.id).await
    }
}
