//! Key/value storage with per-key time-to-live.
//!
//! [`EphemeralStore`] is the only persistence seam of the service: context
//! sessions and cached reviews both live here and vanish when their TTL
//! elapses. Backends:
//!
//! - [`MemoryStore`]: in-process, for tests and embedding.
//! - [`RedisStore`]: direct Redis protocol (feature `redis`).
//! - [`RestStore`]: Upstash-style REST command API (feature `rest`).
//! - [`OfflineStore`]: always unavailable; what callers get when no backend
//!   is configured or reachable.

pub mod config;
pub mod memory;
pub mod offline;
#[cfg(feature = "redis")]
pub mod redis_store;
#[cfg(feature = "rest")]
pub mod rest;

use std::time::Duration;

use async_trait::async_trait;
pub use di_core::StoreError;

pub use config::{connect, StoreBackend, StoreConfig};
pub use memory::MemoryStore;
pub use offline::OfflineStore;
#[cfg(feature = "redis")]
pub use redis_store::RedisStore;
#[cfg(feature = "rest")]
pub use rest::RestStore;

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Trait for TTL-bounded key/value backends.
///
/// Implementations must be safe to share between many concurrent callers.
/// `get` returns `Ok(None)` for keys that were never written and for keys
/// whose TTL has passed alike; it never returns stale data.
#[async_trait]
pub trait EphemeralStore: Send + Sync + 'static {
    /// Short backend name for logs.
    fn backend(&self) -> &'static str;

    /// Store `value` under `key`, replacing any prior value and resetting
    /// the TTL. A zero `ttl` leaves the key absent.
    async fn put(&self, key: &str, value: &str, ttl: Duration) -> StoreResult<()>;

    async fn get(&self, key: &str) -> StoreResult<Option<String>>;

    async fn exists(&self, key: &str) -> StoreResult<bool>;

    /// Time left before `key` expires, or `None` if it is absent (or has no
    /// expiry at all).
    async fn remaining_ttl(&self, key: &str) -> StoreResult<Option<Duration>>;

    /// Best-effort removal. Deleting a missing key is not an error.
    async fn delete(&self, key: &str) -> StoreResult<()>;
}

/// Bound a store round-trip so an unresponsive backend fails fast instead
/// of hanging the request.
#[cfg(any(feature = "redis", feature = "rest"))]
pub(crate) async fn bounded<T, F>(timeout: Duration, fut: F) -> StoreResult<T>
where
    F: std::future::Future<Output = StoreResult<T>>,
{
    tokio::time::timeout(timeout, fut)
        .await
        .unwrap_or(Err(StoreError::Timeout(timeout)))
}
