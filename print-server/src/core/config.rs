use std::path::PathBuf;
use std::time::Duration;

use crate::printing::renderer::{DEFAULT_CURRENCY, DEFAULT_HEADER_LINES, DEFAULT_UTC_OFFSET_MINUTES};

/// Print server configuration
///
/// # Environment variables
///
/// | Variable | Default | Meaning |
/// |----------|---------|---------|
/// | WORK_DIR | ./data | Working directory (database, logs) |
/// | HTTP_PORT | 3000 | HTTP API port |
/// | ENVIRONMENT | development | development / staging / production |
/// | LOG_LEVEL | info | Log level when `RUST_LOG` is unset |
/// | LOG_DIR | (unset) | Directory for rotating log files |
/// | RETRY_INTERVAL_SECS | 60 | Retry sweep interval, 0 disables |
/// | DISPATCH_TIMEOUT_MS | 5000 | Bound on one printer send |
/// | TICKET_HEADER | LAS TORTILLAS\|MEXICAN GRILL | Header lines, `\|`-separated |
/// | TICKET_UTC_OFFSET_MINUTES | 60 | Offset for ticket date/time |
/// | TICKET_CURRENCY | Kz | Currency suffix on totals |
///
/// # Example
///
/// ```ignore
/// WORK_DIR=/var/lib/print-server HTTP_PORT=8080 cargo run
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    pub work_dir: String,
    pub http_port: u16,
    /// development | staging | production
    pub environment: String,
    pub log_level: String,
    pub log_dir: Option<String>,
    pub retry_interval_secs: u64,
    pub dispatch_timeout_ms: u64,
    pub ticket_header: Vec<String>,
    pub ticket_utc_offset_minutes: i32,
    pub ticket_currency: String,
}

impl Config {
    /// Load configuration from the environment, falling back to defaults
    pub fn from_env() -> Self {
        Self {
            work_dir: std::env::var("WORK_DIR").unwrap_or_else(|_| "./data".into()),
            http_port: std::env::var("HTTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(3000),
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into()),
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".into()),
            log_dir: std::env::var("LOG_DIR").ok().filter(|d| !d.trim().is_empty()),
            retry_interval_secs: std::env::var("RETRY_INTERVAL_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(60),
            dispatch_timeout_ms: std::env::var("DISPATCH_TIMEOUT_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|ms| *ms > 0)
                .unwrap_or(5000),
            ticket_header: std::env::var("TICKET_HEADER")
                .ok()
                .map(|h| parse_header(&h))
                .filter(|lines| !lines.is_empty())
                .unwrap_or_else(default_header),
            ticket_utc_offset_minutes: std::env::var("TICKET_UTC_OFFSET_MINUTES")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|m: &i32| m.abs() < 24 * 60)
                .unwrap_or(DEFAULT_UTC_OFFSET_MINUTES),
            ticket_currency: std::env::var("TICKET_CURRENCY")
                .unwrap_or_else(|_| DEFAULT_CURRENCY.into()),
        }
    }

    /// Override the working directory and port
    ///
    /// Used by tests
    pub fn with_overrides(work_dir: impl Into<String>, http_port: u16) -> Self {
        let mut config = Self::from_env();
        config.work_dir = work_dir.into();
        config.http_port = http_port;
        config
    }

    /// Database file inside the working directory
    pub fn db_path(&self) -> PathBuf {
        PathBuf::from(&self.work_dir).join("print.redb")
    }

    pub fn dispatch_timeout(&self) -> Duration {
        Duration::from_millis(self.dispatch_timeout_ms)
    }

    /// `None` when periodic retries are disabled
    pub fn retry_interval(&self) -> Option<Duration> {
        (self.retry_interval_secs > 0).then(|| Duration::from_secs(self.retry_interval_secs))
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}

fn default_header() -> Vec<String> {
    DEFAULT_HEADER_LINES.iter().map(|s| s.to_string()).collect()
}

fn parse_header(raw: &str) -> Vec<String> {
    raw.split('|')
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}
