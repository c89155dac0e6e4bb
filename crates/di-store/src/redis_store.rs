//! Redis-backed store over the native socket protocol.
//!
//! Available only when the `redis` cargo feature is enabled. Values are
//! written with `SET .. PX` so Redis owns expiry; reads never see an expired
//! key. TTLs are kept at millisecond precision so short test TTLs behave.

use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, RedisError};
use tracing::debug;

use crate::{bounded, EphemeralStore, StoreError, StoreResult};

/// Redis store.
///
/// Uses `redis::aio::ConnectionManager`, which reconnects on transient
/// failures and is cheaply cloneable, so one instance serves every request.
pub struct RedisStore {
    conn: ConnectionManager,
    op_timeout: Duration,
}

impl RedisStore {
    /// Connect to `redis_url`, e.g. `redis://:password@127.0.0.1:6379`.
    ///
    /// Fails if the server cannot be reached within `op_timeout`.
    pub async fn connect(redis_url: &str, op_timeout: Duration) -> StoreResult<Self> {
        let client = redis::Client::open(redis_url).map_err(map_redis_err)?;
        let conn = bounded(op_timeout, async {
            ConnectionManager::new(client).await.map_err(map_redis_err)
        })
        .await?;
        debug!("connected to redis");
        Ok(Self { conn, op_timeout })
    }
}

#[async_trait]
impl EphemeralStore for RedisStore {
    fn backend(&self) -> &'static str {
        "redis"
    }

    async fn put(&self, key: &str, value: &str, ttl: Duration) -> StoreResult<()> {
        let mut conn = self.conn.clone();
        if ttl.is_zero() {
            return bounded(self.op_timeout, async move {
                conn.del::<_, i64>(key).await.map_err(map_redis_err)?;
                Ok(())
            })
            .await;
        }
        let ttl_ms = ttl.as_millis().max(1) as u64;
        bounded(self.op_timeout, async move {
            conn.pset_ex::<_, _, ()>(key, value, ttl_ms)
                .await
                .map_err(map_redis_err)
        })
        .await
    }

    async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        let mut conn = self.conn.clone();
        bounded(self.op_timeout, async move {
            conn.get::<_, Option<String>>(key)
                .await
                .map_err(map_redis_err)
        })
        .await
    }

    async fn exists(&self, key: &str) -> StoreResult<bool> {
        let mut conn = self.conn.clone();
        bounded(self.op_timeout, async move {
            conn.exists::<_, bool>(key).await.map_err(map_redis_err)
        })
        .await
    }

    async fn remaining_ttl(&self, key: &str) -> StoreResult<Option<Duration>> {
        let mut conn = self.conn.clone();
        let ttl_ms = bounded(self.op_timeout, async move {
            conn.pttl::<_, i64>(key).await.map_err(map_redis_err)
        })
        .await?;
        Ok(ttl_from_pttl(ttl_ms))
    }

    async fn delete(&self, key: &str) -> StoreResult<()> {
        let mut conn = self.conn.clone();
        bounded(self.op_timeout, async move {
            conn.del::<_, i64>(key).await.map_err(map_redis_err)?;
            Ok(())
        })
        .await
    }
}

/// `PTTL` answers -2 for a missing key and -1 for a key without expiry.
pub(crate) fn ttl_from_pttl(ttl_ms: i64) -> Option<Duration> {
    u64::try_from(ttl_ms).ok().map(Duration::from_millis)
}

fn map_redis_err(e: RedisError) -> StoreError {
    if e.is_io_error() || e.is_connection_dropped() || e.is_connection_refusal() || e.is_timeout()
    {
        StoreError::Unavailable(e.to_string())
    } else {
        StoreError::Protocol(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pttl_sentinels_map_to_none() {
        assert_eq!(ttl_from_pttl(-2), None);
        assert_eq!(ttl_from_pttl(-1), None);
        assert_eq!(ttl_from_pttl(0), Some(Duration::ZERO));
        assert_eq!(ttl_from_pttl(1500), Some(Duration::from_millis(1500)));
    }

    #[tokio::test]
    async fn test_invalid_url_is_rejected() {
        let err = RedisStore::connect("not a url", Duration::from_millis(100))
            .await
            .err()
            .unwrap();
        assert!(matches!(
            err,
            StoreError::Protocol(_) | StoreError::Unavailable(_)
        ));
    }
}
