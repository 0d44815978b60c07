//! Configuration management for Dantrum.
//!
//! Loads configuration from environment variables (with .env support
//! via dotenvy) once at startup, held behind a OnceLock.

use std::env;
use std::sync::OnceLock;

/// Global configuration instance
static CONFIG: OnceLock<Config> = OnceLock::new();

/// Get the global configuration
pub fn config() -> &'static Config {
    CONFIG.get_or_init(Config::from_env)
}

/// Initialize configuration (call once at startup)
pub fn init() -> &'static Config {
    config()
}

#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub session: SessionConfig,
    pub api: ApiConfig,
    pub notifier: NotifierConfig,
    pub auth: AuthConfig,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub public_url: String,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub path: String,
}

#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub max_age_seconds: u64,
}

#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Fixed page size for list endpoints.
    pub page_size: u32,
}

#[derive(Debug, Clone)]
pub struct NotifierConfig {
    /// Slack-style incoming webhook URL. Notifications are disabled
    /// when unset.
    pub webhook_url: Option<String>,
}

#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Token that gates the one-time admin bootstrap endpoint.
    pub bootstrap_token: Option<String>,
}

impl Config {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        Self {
            server: ServerConfig {
                host: env_or("HOST", "0.0.0.0"),
                port: env_or("PORT", "8000").parse().expect("Invalid PORT"),
                public_url: env_or("PUBLIC_URL", "http://localhost:8000"),
            },
            database: DatabaseConfig {
                path: env_or("DATABASE_PATH", "./data/dantrum.db"),
            },
            session: SessionConfig {
                max_age_seconds: env_or("SESSION_MAX_AGE", "604800")
                    .parse()
                    .unwrap_or(604800), // 7 days
            },
            api: ApiConfig {
                page_size: env_or("PAGE_SIZE", "10").parse().unwrap_or(10),
            },
            notifier: NotifierConfig {
                webhook_url: env::var("SLACK_WEBHOOK_URL").ok(),
            },
            auth: AuthConfig {
                bootstrap_token: env::var("ADMIN_BOOTSTRAP_TOKEN").ok(),
            },
        }
    }
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}
