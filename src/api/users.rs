//! User directory routes (read-only).
//!
//! Other users are visible through a restricted public serialization
//! that hides contact details; `/users/me` returns the caller's own
//! record with the extended field set.
//!
//! Routes:
//! - GET /users - List active users (public view, paginated)
//! - GET /users/me - The caller's own record (extended view)
//! - GET /users/:id - Get an active user (public view)

use axum::{
    extract::{Extension, Path, Query, State},
    middleware,
    routing::get,
    Json, Router,
};
use chrono::NaiveDate;
use serde::Serialize;

use crate::api::pagination::{self, Page, PageQuery};
use crate::db::{self, User};
use crate::middleware::{require_auth, AuthUser};
use crate::{AppState, Result};

/// Build user routes. All of them require an authenticated caller.
pub fn routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/", get(list_users))
        .route("/me", get(get_authenticated_user))
        .route("/:id", get(get_user))
        .layer(middleware::from_fn_with_state(state, require_auth))
}

// ============================================================================
// Response Types
// ============================================================================

/// Public view of a user, shown to other authenticated users.
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: i64,
    pub nickname: String,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        UserResponse {
            id: user.id,
            nickname: user.nickname,
        }
    }
}

/// Extended view of a user, shown only to the account holder.
#[derive(Debug, Serialize)]
pub struct AuthenticatedUserResponse {
    pub id: i64,
    pub email: String,
    pub nickname: String,
    pub date_of_birth: NaiveDate,
    pub is_active: bool,
    pub is_admin: bool,
    pub is_staff: bool,
    pub last_login: Option<String>,
}

impl From<User> for AuthenticatedUserResponse {
    fn from(user: User) -> Self {
        let is_staff = user.is_staff();
        AuthenticatedUserResponse {
            id: user.id,
            email: user.email,
            nickname: user.nickname,
            date_of_birth: user.date_of_birth,
            is_active: user.is_active,
            is_admin: user.is_admin,
            is_staff,
            last_login: user.last_login,
        }
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// List active users in the restricted public serialization.
///
/// GET /users
async fn list_users(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> Result<Json<Page<UserResponse>>> {
    let count = db::count_active_users(&state.db).await?;
    let (limit, offset) = pagination::page_bounds(query.page, count)?;

    let users = db::list_active_users(&state.db, limit, offset).await?;
    let results = users.into_iter().map(UserResponse::from).collect();

    Ok(Json(pagination::envelope("/users", query.page, count, results)))
}

/// Get an active user by ID (public view). Inactive users are hidden.
///
/// GET /users/:id
async fn get_user(State(state): State<AppState>, Path(id): Path<i64>) -> Result<Json<UserResponse>> {
    let user = db::get_active_user(&state.db, id).await?;
    Ok(Json(UserResponse::from(user)))
}

/// Get the caller's own record with the extended field set.
///
/// GET /users/me
async fn get_authenticated_user(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<AuthenticatedUserResponse>> {
    let user = db::get_user(&state.db, auth.user_id).await?;
    Ok(Json(AuthenticatedUserResponse::from(user)))
}
