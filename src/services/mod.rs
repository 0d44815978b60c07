//! Services for Dantrum.

mod auth;
mod notifier;

pub use auth::{hash_password, verify_password, AuthService, Registration};
pub use notifier::Notifier;
