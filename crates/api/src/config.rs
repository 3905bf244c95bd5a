//! Application configuration loaded from environment variables.

use wholesaler::{DEFAULT_BASE_URL, WholesalerConfig};

use crate::mail::MailConfig;

/// Server configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `HOST` — bind address (default: `"0.0.0.0"`)
/// - `PORT` — listen port (default: `3000`)
/// - `RUST_LOG` — tracing filter directive (default: `"info"`)
/// - `DATABASE_URL` — Postgres connection string
/// - `CATALOG_PATH` — product catalog JSON file (default: `"produkte.json"`)
/// - `PUBLIC_BASE_URL` — external URL for cancellation links
/// - `BUCHBUTLER_BASE_URL` / `BUCHBUTLER_USER` / `BUCHBUTLER_PASSWORD` —
///   wholesaler API access
/// - `ORDER_SANDBOX` — set to `"false"` or `"0"` to submit orders to the
///   live wholesaler endpoint; anything else keeps the sandbox on
/// - `SENDGRID_API_KEY` / `EMAIL_SENDER` — mail provider access
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub database_url: String,
    pub catalog_path: String,
    pub public_base_url: String,
    pub wholesaler: WholesalerConfig,
    pub mail: MailConfig,
}

fn env_opt(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

impl Config {
    /// Loads configuration from environment variables, falling back to
    /// defaults.
    pub fn from_env() -> Self {
        Self {
            host: std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: std::env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(3000),
            log_level: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            database_url: std::env::var("DATABASE_URL")
                .unwrap_or_else(|_| "postgres://localhost/buchladen".to_string()),
            catalog_path: std::env::var("CATALOG_PATH")
                .unwrap_or_else(|_| "produkte.json".to_string()),
            public_base_url: std::env::var("PUBLIC_BASE_URL")
                .unwrap_or_else(|_| "http://localhost:3000".to_string()),
            wholesaler: WholesalerConfig {
                base_url: std::env::var("BUCHBUTLER_BASE_URL")
                    .unwrap_or_else(|_| DEFAULT_BASE_URL.to_string()),
                username: env_opt("BUCHBUTLER_USER"),
                password: env_opt("BUCHBUTLER_PASSWORD"),
                // Live submission must be opted into explicitly.
                sandbox: !matches!(
                    std::env::var("ORDER_SANDBOX").as_deref(),
                    Ok("false") | Ok("0")
                ),
            },
            mail: MailConfig {
                api_key: env_opt("SENDGRID_API_KEY"),
                sender: env_opt("EMAIL_SENDER"),
            },
        }
    }

    /// Returns the `"host:port"` bind address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            log_level: "info".to_string(),
            database_url: "postgres://localhost/buchladen".to_string(),
            catalog_path: "produkte.json".to_string(),
            public_base_url: "http://localhost:3000".to_string(),
            wholesaler: WholesalerConfig::default(),
            mail: MailConfig::default(),
        }
    }
}
