//! Middleware for Dantrum.
//!
//! Session-cookie authentication: every entity route sits behind
//! `require_auth`, so unauthenticated callers are rejected before any
//! entity logic runs.
//!
//! # Session Flow
//!
//! 1. User logs in with email + password
//! 2. Server creates a session row and sets the `dantrum_session` cookie
//! 3. Subsequent requests include the cookie, validated here
//! 4. Session expires after the configured duration or on logout
//!
//! # Security Model
//!
//! - Session IDs are cryptographically random (nanoid)
//! - Sessions are stored server-side in the database
//! - Cookie is HttpOnly, Secure (behind https), SameSite=Lax
//! - Sessions can be invalidated server-side (logout)

use axum::{
    body::Body,
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::CookieJar;

use crate::{config::config, db, error::Error, AppState};

/// Session cookie name.
pub const SESSION_COOKIE_NAME: &str = "dantrum_session";

/// Caller identity injected into request extensions after successful
/// session validation.
#[derive(Clone, Debug)]
pub struct AuthUser {
    /// Unique user identifier
    pub user_id: i64,
    /// User's email address
    pub email: String,
    /// User's display name (may be empty)
    pub nickname: String,
    /// Whether the user is an administrator
    pub is_admin: bool,
}

impl AuthUser {
    /// Ownership check used by the write-permission policy.
    pub fn owns(&self, owner_id: i64) -> bool {
        self.user_id == owner_id
    }
}

/// Middleware that requires a valid session.
///
/// Extracts the session ID from the cookie, validates it against the
/// database, and injects `AuthUser` into request extensions.
///
/// # Errors
///
/// Returns 403 Forbidden if:
/// - No session cookie present
/// - Session not found in database
/// - Session is expired
/// - User not found or inactive
pub async fn require_auth(
    State(state): State<AppState>,
    jar: CookieJar,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, Error> {
    // Extract session ID from cookie
    let session_id = jar
        .get(SESSION_COOKIE_NAME)
        .map(|c| c.value().to_string())
        .ok_or(Error::Unauthenticated)?;

    // Validate session and get user
    let auth_user = validate_session(&state, &session_id).await?;

    // Inject AuthUser into request extensions
    req.extensions_mut().insert(auth_user);

    Ok(next.run(req).await)
}

/// Validate a session ID and return the caller identity.
async fn validate_session(state: &AppState, session_id: &str) -> Result<AuthUser, Error> {
    let config = config();

    let session = db::get_session(&state.db, session_id)
        .await?
        .ok_or(Error::Unauthenticated)?;

    if session.is_expired() {
        // Clean up expired session lazily
        let db = state.db.clone();
        let sid = session_id.to_string();
        tokio::spawn(async move {
            let _ = db::delete_session(&db, &sid).await;
        });
        return Err(Error::Unauthenticated);
    }

    let user = match db::get_user(&state.db, session.user_id).await {
        Ok(user) => user,
        Err(_) => return Err(Error::Unauthenticated),
    };

    if !user.is_active {
        return Err(Error::Unauthenticated);
    }

    // Extend the session if it's more than halfway through its lifetime
    let max_age = chrono::Duration::seconds(config.session.max_age_seconds as i64);
    let halfway = chrono::Utc::now() + (max_age / 2);

    if let Ok(expires_at) = chrono::DateTime::parse_from_rfc3339(&session.expires_at) {
        if expires_at < halfway {
            let new_expires = chrono::Utc::now() + max_age;
            let db = state.db.clone();
            let sid = session_id.to_string();
            tokio::spawn(async move {
                let _ = db::extend_session(&db, &sid, new_expires).await;
            });
        }
    }

    Ok(AuthUser {
        user_id: user.id,
        email: user.email,
        nickname: user.nickname,
        is_admin: user.is_admin,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_user_owns() {
        let caller = AuthUser {
            user_id: 7,
            email: "caller@example.com".to_string(),
            nickname: String::new(),
            is_admin: false,
        };

        assert!(caller.owns(7));
        assert!(!caller.owns(8));
    }
}
