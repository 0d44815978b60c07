//! API Routes for Dantrum.
//!
//! This module combines all API routes into a single router.
//!
//! Route structure:
//! - /auth/* - Registration, login, logout, admin bootstrap (public)
//! - /albums/* - Album CRUD (session-protected)
//! - /quotes/* - Quote CRUD (session-protected)
//! - /users/* - Read-only user directory + self lookup (session-protected)
//! - /health - Health check (public)

mod albums;
mod auth;
pub mod pagination;
mod quotes;
mod users;
pub mod validate;

use axum::{routing::get, Json, Router};

use crate::AppState;

/// Build the complete API router.
pub fn routes(state: AppState) -> Router<AppState> {
    Router::new()
        // Health endpoint (public)
        .route("/health", get(health))
        // Authentication routes (public)
        .nest("/auth", auth::routes())
        // Entity routes (each applies session auth internally)
        .nest("/albums", albums::routes(state.clone()))
        .nest("/quotes", quotes::routes(state.clone()))
        .nest("/users", users::routes(state))
}

/// Liveness check.
async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}
