//! Fire-and-forget notifications.
//!
//! Posts a Slack-style `{"text": ...}` message to an incoming webhook
//! when an album is created. The request runs on a spawned task:
//! failures are logged and never affect the triggering operation.

use std::sync::Arc;

use serde_json::json;
use tracing::{debug, warn};

use crate::config::NotifierConfig;

/// Webhook notification sink. Cheap to clone; a missing webhook URL
/// turns every notification into a no-op.
#[derive(Clone)]
pub struct Notifier {
    inner: Arc<Inner>,
}

struct Inner {
    client: reqwest::Client,
    webhook_url: Option<String>,
}

impl Notifier {
    pub fn new(config: &NotifierConfig) -> Self {
        Self::with_url(config.webhook_url.clone())
    }

    /// Build a notifier with an explicit webhook URL (or none).
    pub fn with_url(webhook_url: Option<String>) -> Self {
        Self {
            inner: Arc::new(Inner {
                client: reqwest::Client::new(),
                webhook_url,
            }),
        }
    }

    /// Announce a newly created album. Returns immediately; the POST
    /// happens on a background task.
    pub fn album_created(&self, title: &str, owner_email: &str) {
        let Some(url) = self.inner.webhook_url.clone() else {
            debug!("No webhook URL configured, skipping album notification");
            return;
        };

        let body = json!({
            "text": format!("New album created: {} (by {})", title, owner_email),
        });

        let client = self.inner.client.clone();
        tokio::spawn(async move {
            match client.post(&url).json(&body).send().await {
                Ok(response) if !response.status().is_success() => {
                    warn!(status = %response.status(), "Album notification rejected by webhook");
                }
                Ok(_) => {}
                Err(e) => {
                    warn!(error = %e, "Failed to deliver album notification");
                }
            }
        });
    }
}
