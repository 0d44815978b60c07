//! Application state for Dantrum.
//!
//! Contains the shared state that is passed to all handlers.

use crate::db::DbPool;
use crate::services::{AuthService, Notifier};
use crate::{config, Result};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub db: DbPool,
    /// Account registration and credential authentication.
    pub auth: AuthService,
    /// Fire-and-forget webhook notifications.
    pub notifier: Notifier,
}

impl AppState {
    /// Create a new application state, initializing all services.
    pub async fn new() -> Result<Self> {
        let config = config::config();

        // Initialize database
        let db = crate::db::init_pool(&config.database.path).await?;
        crate::db::initialize_schema(&db).await?;

        let auth = AuthService::new(db.clone());
        let notifier = Notifier::new(&config.notifier);

        Ok(Self { db, auth, notifier })
    }

    /// Build state on top of an existing pool (used by tests).
    pub fn with_pool(db: DbPool) -> Self {
        let config = config::config();
        Self {
            auth: AuthService::new(db.clone()),
            notifier: Notifier::new(&config.notifier),
            db,
        }
    }
}
