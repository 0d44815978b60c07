//! Authentication routes.
//!
//! Credential-based login backed by server-side sessions. The session
//! ID doubles as the cookie value; see `middleware` for validation.
//!
//! Request bodies are validated field by field, same as the entity
//! handlers, so missing or mistyped fields come back as 400 with
//! per-field messages.
//!
//! Routes:
//! - POST /auth/register - Create an account (public)
//! - POST /auth/login - Exchange credentials for a session cookie
//! - POST /auth/logout - Invalidate the session and clear the cookie
//! - POST /auth/bootstrap - Create the initial admin (token-gated)

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::post,
    Json, Router,
};
use axum_extra::extract::cookie::{Cookie, SameSite};
use axum_extra::extract::CookieJar;
use chrono::Utc;
use serde_json::Value;

use crate::api::users::AuthenticatedUserResponse;
use crate::api::validate::{self, FieldErrors, BOOTSTRAP_FIELDS, LOGIN_FIELDS, REGISTER_FIELDS};
use crate::db;
use crate::middleware::SESSION_COOKIE_NAME;
use crate::services::Registration;
use crate::{config::config, AppState, Error, Result};

/// Build authentication routes. All public; logout degrades to a
/// cookie clear when no session exists.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/bootstrap", post(bootstrap))
}

// ============================================================================
// Handlers
// ============================================================================

/// Register a new account.
///
/// POST /auth/register
async fn register(
    State(state): State<AppState>,
    Json(payload): Json<Value>,
) -> Result<impl IntoResponse> {
    let payload = validate::require_object(&payload)?;

    let mut errors = FieldErrors::default();
    validate::check_required(payload, REGISTER_FIELDS, &mut errors);

    let email = validate::string_field(payload, "email", &mut errors);
    let nickname = validate::string_field(payload, "nickname", &mut errors);
    let date_of_birth = validate::date_field(payload, "date_of_birth", &mut errors);
    let password = validate::string_field(payload, "password", &mut errors);

    errors.into_result()?;

    let (Some(email), Some(date_of_birth)) = (email, date_of_birth) else {
        return Err(Error::Validation("Invalid registration payload".to_string()));
    };

    let user = state
        .auth
        .register(Registration {
            email,
            nickname,
            date_of_birth,
            password,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(AuthenticatedUserResponse::from(user)),
    ))
}

/// Log in with email and password.
///
/// POST /auth/login
///
/// On success sets the session cookie and returns the caller's
/// extended user view.
async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(payload): Json<Value>,
) -> Result<impl IntoResponse> {
    let config = config();
    let payload = validate::require_object(&payload)?;

    let mut errors = FieldErrors::default();
    validate::check_required(payload, LOGIN_FIELDS, &mut errors);

    let email = validate::string_field(payload, "email", &mut errors);
    let password = validate::string_field(payload, "password", &mut errors);

    errors.into_result()?;

    let (Some(email), Some(password)) = (email, password) else {
        return Err(Error::Validation("Invalid login payload".to_string()));
    };

    let user = state.auth.authenticate(&email, &password).await?;

    // Create session
    let session_id = nanoid::nanoid!(32);
    let max_age = config.session.max_age_seconds as i64;
    db::create_session(
        &state.db,
        db::CreateSession {
            id: session_id.clone(),
            user_id: user.id,
            expires_at: Utc::now() + chrono::Duration::seconds(max_age),
        },
    )
    .await?;

    // Set session cookie
    let cookie = Cookie::build((SESSION_COOKIE_NAME, session_id))
        .path("/")
        .http_only(true)
        .secure(config.server.public_url.starts_with("https"))
        .same_site(SameSite::Lax)
        .max_age(time::Duration::seconds(max_age))
        .build();

    let jar = jar.add(cookie);

    Ok((jar, Json(AuthenticatedUserResponse::from(user))))
}

/// End the current session.
///
/// POST /auth/logout
///
/// Clears the session cookie and invalidates the session server-side.
async fn logout(State(state): State<AppState>, jar: CookieJar) -> Result<impl IntoResponse> {
    // Invalidate server-side if a session cookie is present
    if let Some(cookie) = jar.get(SESSION_COOKIE_NAME) {
        db::delete_session(&state.db, cookie.value()).await?;
    }

    // Clear cookie
    let cookie = Cookie::build((SESSION_COOKIE_NAME, ""))
        .path("/")
        .max_age(time::Duration::seconds(0))
        .build();

    let jar = jar.add(cookie);

    Ok((
        jar,
        Json(serde_json::json!({
            "message": "Logged out successfully"
        })),
    ))
}

/// Bootstrap the initial admin user.
///
/// POST /auth/bootstrap
///
/// Creates a superuser using a bootstrap token. Only works while no
/// admin user exists and a valid token is configured.
async fn bootstrap(
    State(state): State<AppState>,
    Json(payload): Json<Value>,
) -> Result<impl IntoResponse> {
    let config = config();
    let payload = validate::require_object(&payload)?;

    let mut errors = FieldErrors::default();
    validate::check_required(payload, BOOTSTRAP_FIELDS, &mut errors);

    let token = validate::string_field(payload, "token", &mut errors);
    let email = validate::string_field(payload, "email", &mut errors);
    let nickname = validate::string_field(payload, "nickname", &mut errors);
    let date_of_birth = validate::date_field(payload, "date_of_birth", &mut errors);
    let password = validate::string_field(payload, "password", &mut errors);

    errors.into_result()?;

    let (Some(token), Some(email), Some(date_of_birth), Some(password)) =
        (token, email, date_of_birth, password)
    else {
        return Err(Error::Validation("Invalid bootstrap payload".to_string()));
    };

    let expected_token = config
        .auth
        .bootstrap_token
        .as_ref()
        .ok_or(Error::Forbidden)?;

    if token != *expected_token {
        return Err(Error::InvalidCredentials);
    }

    if db::admin_exists(&state.db).await? {
        return Err(Error::Validation(
            "Bootstrap not allowed: admin user already exists".into(),
        ));
    }

    let user = state
        .auth
        .register_superuser(Registration {
            email,
            nickname,
            date_of_birth,
            password: Some(password),
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(AuthenticatedUserResponse::from(user)),
    ))
}
