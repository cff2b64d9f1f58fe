use std::env;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_DATABASE_URL: &str = "recipes.db";
pub const DEFAULT_RECIPE_API_BASE_URL: &str = "https://api.spoonacular.com";
const DEFAULT_PORT: u16 = 5001;
const DEFAULT_UPSTREAM_TIMEOUT_SECS: u64 = 10;
const DEFAULT_CACHE_TTL_SECS: u64 = 600;
const DEFAULT_DATABASE_POOL_SIZE: u32 = 8;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{name} has an invalid value {value:?}")]
    Invalid { name: &'static str, value: String },
}

/// Settings for the recipe search API.
#[derive(Debug, Clone)]
pub struct UpstreamConfig {
    pub base_url: String,
    /// `None` when no credential is configured; suggestions then fail with a
    /// configuration error instead of calling out.
    pub api_key: Option<String>,
    pub timeout: Duration,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        UpstreamConfig {
            base_url: DEFAULT_RECIPE_API_BASE_URL.to_string(),
            api_key: None,
            timeout: Duration::from_secs(DEFAULT_UPSTREAM_TIMEOUT_SECS),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub database_pool_size: u32,
    pub upstream: UpstreamConfig,
    pub redis_url: Option<String>,
    pub cache_ttl_secs: u64,
}

impl Settings {
    /// Reads settings from the process environment. Call `dotenv` first to
    /// pick up a `.env` file.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Settings {
            host: optional("HOST").unwrap_or_else(|| "127.0.0.1".to_string()),
            port: parsed("PORT", DEFAULT_PORT)?,
            database_url: optional("DATABASE_URL")
                .unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string()),
            database_pool_size: parsed("DATABASE_POOL_SIZE", DEFAULT_DATABASE_POOL_SIZE)?,
            upstream: UpstreamConfig {
                base_url: optional("RECIPE_API_BASE_URL")
                    .unwrap_or_else(|| DEFAULT_RECIPE_API_BASE_URL.to_string()),
                api_key: optional("SPOONACULAR_API_KEY"),
                timeout: Duration::from_secs(parsed(
                    "UPSTREAM_TIMEOUT_SECS",
                    DEFAULT_UPSTREAM_TIMEOUT_SECS,
                )?),
            },
            redis_url: optional("REDIS_URL"),
            cache_ttl_secs: parsed("SUGGESTION_CACHE_TTL_SECS", DEFAULT_CACHE_TTL_SECS)?,
        })
    }
}

// blank values count as unset
fn optional(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn parsed<T: FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match optional(name) {
        None => Ok(default),
        Some(value) => value
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value }),
    }
}
