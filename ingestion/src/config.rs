use eventflow_core::config::{env_or, parse_env, SharedConfig};

#[derive(Debug, Clone)]
pub struct Config {
    pub shared: SharedConfig,
    pub host: String,
    pub port: u16,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        Ok(Self {
            shared: SharedConfig::from_env()?,
            host: env_or("HOST", "0.0.0.0"),
            port: parse_env("PORT", 8080)?,
        })
    }
}
