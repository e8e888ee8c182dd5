use std::time::Duration;

use eventflow_core::config::{env_or, parse_env, SharedConfig};

#[derive(Debug, Clone)]
pub struct Config {
    pub shared: SharedConfig,
    pub worker_count: u32,
    pub worker_id_prefix: String,
    pub shutdown_deadline: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        Ok(Self {
            shared: SharedConfig::from_env()?,
            worker_count: parse_env("WORKER_COUNT", 3)?,
            worker_id_prefix: env_or("WORKER_ID_PREFIX", "worker"),
            shutdown_deadline: Duration::from_secs(parse_env("SHUTDOWN_DEADLINE_S", 30)?),
        })
    }

    /// Stable per-worker label, e.g. `worker-1` for ordinal 1.
    pub fn worker_id(&self, ordinal: u32) -> String {
        format!("{}-{}", self.worker_id_prefix, ordinal)
    }
}
