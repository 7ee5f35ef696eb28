use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub database: DatabaseConfig,
    pub api: ApiConfig,
    pub heartbeat: HeartbeatConfig,
    pub presence: PresenceConfig,
    pub report: ReportConfig,
}

/// Database connection pool configuration
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout: Duration,
    pub idle_timeout: Duration,
    pub max_lifetime: Duration,
}

/// Upstream stats API configuration
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Base URL, always ending with a slash so relative joins stay under it
    pub base_url: String,
    pub api_key: Option<String>,
    /// Per-request timeout enforced by the HTTP client
    pub timeout: Duration,
    /// Maximum number of requests dispatched concurrently by one fetch run
    pub max_concurrency: usize,
    /// Quota assumed before the first response reports the real one
    pub initial_rate_limit: u32,
    /// Delay before a failed roster poll is attempted again
    pub roster_retry: Duration,
}

/// First delay and interval of every heartbeat task
#[derive(Debug, Clone)]
pub struct HeartbeatConfig {
    pub api_fetch_first_delay: Duration,
    pub api_fetch_interval: Duration,
    pub db_insert_first_delay: Duration,
    pub db_insert_interval: Duration,
    pub status_report_first_delay: Duration,
    pub status_report_interval: Duration,
    /// Upper bound on converted batches kept while the database is failing
    pub max_pending_batches: usize,
}

/// Presence tracking configuration
#[derive(Debug, Clone)]
pub struct PresenceConfig {
    /// Added to a player response's expiry before polling that player again
    pub player_requeue_grace: Duration,
}

/// Status report configuration
#[derive(Debug, Clone)]
pub struct ReportConfig {
    pub webhook_url: Option<String>,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            database: DatabaseConfig::from_env()?,
            api: ApiConfig::from_env()?,
            heartbeat: HeartbeatConfig::from_env(),
            presence: PresenceConfig::from_env(),
            report: ReportConfig::from_env()?,
        })
    }
}

/// Reads `key` and parses it, falling back to `default` when unset or malformed
fn env_or<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

fn env_millis(key: &str, default: u64) -> Duration {
    Duration::from_millis(env_or(key, default))
}

fn env_secs(key: &str, default: u64) -> Duration {
    Duration::from_secs(env_or(key, default))
}

impl DatabaseConfig {
    /// Load database configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let url = env::var("DATABASE_URL").map_err(|_| ConfigError::MissingDatabaseUrl)?;

        Ok(Self {
            url,
            max_connections: env_or("DATABASE_MAX_CONNECTIONS", 10),
            min_connections: env_or("DATABASE_MIN_CONNECTIONS", 1),
            acquire_timeout: env_secs("DATABASE_ACQUIRE_TIMEOUT_SECS", 5),
            idle_timeout: env_secs("DATABASE_IDLE_TIMEOUT_SECS", 600),
            max_lifetime: env_secs("DATABASE_MAX_LIFETIME_SECS", 1800),
        })
    }
}

impl ApiConfig {
    pub const DEFAULT_BASE_URL: &'static str = "https://api.wynncraft.com/v3/";

    /// Load API configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let raw = env::var("WYNN_API_URL").unwrap_or_else(|_| Self::DEFAULT_BASE_URL.to_string());
        let base_url = normalize_base_url(&raw)?;

        Ok(Self {
            base_url,
            api_key: env::var("WYNN_API_KEY").ok().filter(|k| !k.is_empty()),
            timeout: env_secs("API_TIMEOUT_SECS", 30),
            max_concurrency: env_or("API_MAX_CONCURRENCY", 50usize).max(1),
            initial_rate_limit: env_or("API_RATE_LIMIT", 180),
            roster_retry: env_secs("API_ROSTER_RETRY_SECS", 5),
        })
    }
}

/// Validates an http(s) base URL and guarantees a trailing slash
fn normalize_base_url(raw: &str) -> Result<String, ConfigError> {
    let parsed = url::Url::parse(raw).map_err(|_| ConfigError::InvalidUrl(raw.to_string()))?;
    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(raw.to_string()));
    }

    let mut normalized = parsed.to_string();
    if !normalized.ends_with('/') {
        normalized.push('/');
    }
    Ok(normalized)
}

impl HeartbeatConfig {
    /// Load task scheduling configuration from environment variables
    pub fn from_env() -> Self {
        Self {
            api_fetch_first_delay: env_millis("API_FETCH_FIRST_DELAY_MS", 0),
            api_fetch_interval: env_millis("API_FETCH_INTERVAL_MS", 1000),
            db_insert_first_delay: env_millis("DB_INSERT_FIRST_DELAY_MS", 1000),
            db_insert_interval: env_millis("DB_INSERT_INTERVAL_MS", 5000),
            status_report_first_delay: env_millis("STATUS_REPORT_FIRST_DELAY_MS", 5000),
            status_report_interval: env_millis("STATUS_REPORT_INTERVAL_MS", 5000),
            max_pending_batches: env_or("DB_MAX_PENDING_BATCHES", 100usize).max(1),
        }
    }
}

impl PresenceConfig {
    pub fn from_env() -> Self {
        Self {
            player_requeue_grace: env_secs("PLAYER_REQUEUE_GRACE_SECS", 480),
        }
    }
}

impl ReportConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let webhook_url = match env::var("STATUS_WEBHOOK_URL") {
            Ok(url) if !url.is_empty() => {
                url::Url::parse(&url).map_err(|_| ConfigError::InvalidUrl(url.clone()))?;
                Some(url)
            }
            _ => None,
        };

        Ok(Self { webhook_url })
    }
}

#[derive(Debug)]
pub enum ConfigError {
    MissingDatabaseUrl,
    InvalidUrl(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::MissingDatabaseUrl => {
                write!(f, "DATABASE_URL environment variable is required")
            }
            ConfigError::InvalidUrl(url) => {
                write!(f, "'{}' is not a valid http(s) URL", url)
            }
        }
    }
}

impl std::error::Error for ConfigError {}
