use std::ops::DerefMut;
use std::time::Duration;

use r2d2_redis::redis::{self, Commands};
use r2d2_redis::{r2d2, RedisConnectionManager};
use serde::de::DeserializeOwned;
use serde::Serialize;

pub type RedisPool = r2d2::Pool<RedisConnectionManager>;

const CACHE_POOL_MAX_OPEN: u32 = 16;
const CACHE_POOL_MIN_IDLE: u32 = 2;
const CACHE_POOL_EXPIRE_SECONDS: u64 = 60;
const CACHE_CONNECT_TIMEOUT_SECONDS: u64 = 2;

#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("redis pool error: {0}")]
    Pool(#[from] r2d2::Error),
    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),
    #[error("cached value could not be decoded: {0}")]
    Codec(#[from] bincode::Error),
}

/// Optional redis cache for suggestion results, stored as bincode bytes.
///
/// A disabled cache misses on every lookup and ignores writes. Callers are
/// expected to log and bypass any `CacheError`.
#[derive(Clone)]
pub struct SuggestionCache {
    pool: Option<RedisPool>,
    ttl_secs: u64,
}

impl SuggestionCache {
    pub fn disabled() -> Self {
        SuggestionCache {
            pool: None,
            ttl_secs: 0,
        }
    }

    /// Connects to redis at `url`. Falls back to a disabled cache when redis
    /// cannot be reached at startup.
    pub fn connect(url: &str, ttl_secs: u64) -> Self {
        let pool = RedisConnectionManager::new(url)
            .map_err(CacheError::from)
            .and_then(|manager| {
                r2d2::Pool::builder()
                    .max_size(CACHE_POOL_MAX_OPEN)
                    .max_lifetime(Some(Duration::from_secs(CACHE_POOL_EXPIRE_SECONDS)))
                    .min_idle(Some(CACHE_POOL_MIN_IDLE))
                    .connection_timeout(Duration::from_secs(CACHE_CONNECT_TIMEOUT_SECONDS))
                    .build(manager)
                    .map_err(CacheError::from)
            });

        match pool {
            Ok(pool) => {
                log::info!("suggestion cache enabled, ttl {ttl_secs}s");
                SuggestionCache {
                    pool: Some(pool),
                    ttl_secs,
                }
            }
            Err(err) => {
                log::warn!("suggestion cache disabled, redis unavailable: {err}");
                Self::disabled()
            }
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.pool.is_some() && self.ttl_secs > 0
    }

    /// Blocking lookup.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, CacheError> {
        let pool = match &self.pool {
            Some(pool) if self.ttl_secs > 0 => pool,
            _ => return Ok(None),
        };
        let mut conn = pool.get()?;
        let value: Option<Vec<u8>> = conn.deref_mut().get(key)?;
        match value {
            Some(bytes) if !bytes.is_empty() => Ok(Some(bincode::deserialize(&bytes)?)),
            _ => Ok(None),
        }
    }

    /// Blocking write with the configured ttl.
    pub fn put<T: Serialize>(&self, key: &str, value: &T) -> Result<(), CacheError> {
        let pool = match &self.pool {
            Some(pool) if self.ttl_secs > 0 => pool,
            _ => return Ok(()),
        };
        let bytes = bincode::serialize(value)?;
        let mut conn = pool.get()?;
        redis::cmd("SET")
            .arg(key)
            .arg(bytes)
            .arg("EX")
            .arg(self.ttl_secs)
            .query::<()>(conn.deref_mut())?;
        Ok(())
    }
}
