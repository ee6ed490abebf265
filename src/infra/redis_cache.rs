//! Redis-backed [`TtlCache`].
//!
//! Values are stored as JSON and expire server-side, so several processes
//! can share one cache. `SET .. NX EX` keeps the first writer's value.

use std::{fmt, marker::PhantomData};

use async_trait::async_trait;
use redis::{AsyncCommands, aio::ConnectionManager};
use serde::{Serialize, de::DeserializeOwned};
use time::OffsetDateTime;
use tracing::{debug, info};

use crate::cache::{CacheError, TtlCache};

pub struct RedisTtlCache<V> {
    conn_manager: ConnectionManager,
    redis_url: String,
    _value: PhantomData<fn() -> V>,
}

impl<V> fmt::Debug for RedisTtlCache<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedisTtlCache")
            .field("redis_url", &self.redis_url)
            .finish_non_exhaustive()
    }
}

impl<V> RedisTtlCache<V> {
    pub async fn connect(redis_url: &str) -> Result<Self, CacheError> {
        let client = redis::Client::open(redis_url).map_err(CacheError::backend)?;
        let conn_manager = ConnectionManager::new(client)
            .await
            .map_err(CacheError::backend)?;
        info!(redis_url, "Redis cache connection established");

        Ok(Self {
            conn_manager,
            redis_url: redis_url.to_string(),
            _value: PhantomData,
        })
    }
}

/// Whole seconds until `expires_at`, rounded up. `None` once it has passed.
fn ttl_seconds(expires_at: OffsetDateTime, now: OffsetDateTime) -> Option<u64> {
    let remaining = expires_at - now;
    if remaining.is_negative() || remaining.is_zero() {
        return None;
    }
    let whole = remaining.whole_seconds();
    let ceil = if remaining.subsec_nanoseconds() > 0 {
        whole + 1
    } else {
        whole
    };
    u64::try_from(ceil).ok()
}

#[async_trait]
impl<V> TtlCache<V> for RedisTtlCache<V>
where
    V: Serialize + DeserializeOwned + Send + Sync + 'static,
{
    async fn get(&self, key: &str) -> Result<Option<V>, CacheError> {
        let mut conn = self.conn_manager.clone();
        let payload: Option<String> = conn.get(key).await.map_err(CacheError::backend)?;

        match payload {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    async fn put_if_absent(
        &self,
        key: &str,
        value: V,
        expires_at: OffsetDateTime,
    ) -> Result<bool, CacheError> {
        let Some(ttl) = ttl_seconds(expires_at, OffsetDateTime::now_utc()) else {
            return Ok(false);
        };
        let payload = serde_json::to_string(&value)?;

        let mut conn = self.conn_manager.clone();
        let reply: Option<String> = redis::cmd("SET")
            .arg(key)
            .arg(payload)
            .arg("NX")
            .arg("EX")
            .arg(ttl)
            .query_async(&mut conn)
            .await
            .map_err(CacheError::backend)?;

        let stored = reply.is_some();
        debug!(key, ttl, stored, "Redis SET NX");
        Ok(stored)
    }
}
