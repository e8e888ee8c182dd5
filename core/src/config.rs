use std::env;
use std::time::Duration;

/// Settings shared by both the ingestion and worker binaries, loaded from
/// the enumerated environment variables. Each binary additionally reads the
/// options relevant only to itself (HTTP bind address, worker count, ...).
#[derive(Debug, Clone)]
pub struct SharedConfig {
    pub store_url: String,
    pub queue_url: String,
    pub stream_name: String,
    pub consumer_group: String,
    pub idle_reclaim: Duration,
    pub max_retries: u32,
    pub retry_base: Duration,
    pub retry_max: Duration,
    pub block_timeout: Duration,
    pub high_value_threshold: f64,
    pub metrics_port: u16,
}

impl SharedConfig {
    pub fn from_env() -> Result<Self, String> {
        Ok(Self {
            store_url: require_env("DATABASE_URL")?,
            queue_url: require_env("REDIS_URL")?,
            stream_name: env_or("STREAM_NAME", "event_queue"),
            consumer_group: env_or("CONSUMER_GROUP", "event_processors"),
            idle_reclaim: Duration::from_millis(parse_env("IDLE_RECLAIM_MS", 60_000)?),
            max_retries: parse_env("MAX_RETRIES", 3)?,
            retry_base: Duration::from_secs(parse_env("RETRY_BASE_S", 2)?),
            retry_max: Duration::from_secs(parse_env("RETRY_MAX_S", 10)?),
            block_timeout: Duration::from_millis(parse_env("BLOCK_TIMEOUT_MS", 5_000)?),
            high_value_threshold: parse_env("HIGH_VALUE_THRESHOLD", 1000.0)?,
            metrics_port: parse_env("METRICS_PORT", 9091)?,
        })
    }
}

/// Reads a required environment variable, surfacing a descriptive error
/// rather than panicking — callers decide whether to `expect` at bootstrap.
pub fn require_env(key: &str) -> Result<String, String> {
    env::var(key).map_err(|_| format!("{key} must be set"))
}

pub fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Parses an environment variable with a typed default, surfacing a
/// descriptive error on malformed input instead of silently falling back.
pub fn parse_env<T>(key: &str, default: T) -> Result<T, String>
where
    T: std::str::FromStr + ToString,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .parse()
            .map_err(|e| format!("{key}={raw:?} is invalid: {e}")),
        Err(_) => Ok(default),
    }
}
