//! Backend selection.
//!
//! Two mutually exclusive backends can be configured: a REST-style managed
//! store and a direct Redis connection. When both are configured, REST wins.
//! With neither (or when the chosen one can't be reached at startup), the
//! service runs against [`OfflineStore`] and simply works without a cache.

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use crate::{EphemeralStore, OfflineStore, StoreError, StoreResult};

/// Default bound on a single store round-trip.
pub const DEFAULT_OP_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreBackend {
    Rest { url: String, token: String },
    Redis { url: String },
    Disabled,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    pub op_timeout: Duration,
}

impl StoreConfig {
    /// Pick a backend from the raw settings. Blank values count as unset.
    pub fn resolve(
        rest_url: Option<String>,
        rest_token: Option<String>,
        redis_url: Option<String>,
        op_timeout: Duration,
    ) -> Self {
        let rest_url = non_blank(rest_url);
        let rest_token = non_blank(rest_token);
        let redis_url = non_blank(redis_url);

        let backend = match (rest_url, rest_token, redis_url) {
            (Some(url), Some(token), _) => StoreBackend::Rest { url, token },
            (rest_url, rest_token, redis_url) => {
                if rest_url.is_some() != rest_token.is_some() {
                    warn!("REST store needs both a URL and a token; ignoring partial REST settings");
                }
                match redis_url {
                    Some(url) => StoreBackend::Redis { url },
                    None => StoreBackend::Disabled,
                }
            }
        };

        Self {
            backend,
            op_timeout,
        }
    }

    /// Read settings from the environment:
    ///
    /// - `UPSTASH_REDIS_REST_URL` / `UPSTASH_REDIS_REST_TOKEN`
    /// - `REDIS_URL`, or `REDIS_HOST` (+ `REDIS_PORT`, `REDIS_PASSWORD`)
    /// - `DI_STORE_TIMEOUT_MS`
    pub fn from_env() -> Self {
        let redis_url = std::env::var("REDIS_URL").ok().or_else(redis_url_from_parts);
        let op_timeout = std::env::var("DI_STORE_TIMEOUT_MS")
            .ok()
            .and_then(|v| v.trim().parse::<u64>().ok())
            .map(Duration::from_millis)
            .unwrap_or(DEFAULT_OP_TIMEOUT);
        Self::resolve(
            std::env::var("UPSTASH_REDIS_REST_URL").ok(),
            std::env::var("UPSTASH_REDIS_REST_TOKEN").ok(),
            redis_url,
            op_timeout,
        )
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

/// `redis://[:password@]host:port` from `REDIS_HOST`, `REDIS_PORT` and
/// `REDIS_PASSWORD`, for deployments that don't set `REDIS_URL`.
pub fn redis_url_from_parts() -> Option<String> {
    let host = non_blank(std::env::var("REDIS_HOST").ok())?;
    let port = non_blank(std::env::var("REDIS_PORT").ok());
    let password = non_blank(std::env::var("REDIS_PASSWORD").ok());
    Some(redis_url(&host, port.as_deref(), password.as_deref()))
}

/// The password is percent-encoded; the host goes in verbatim so IPv6
/// literals like `[::1]` keep their brackets.
fn redis_url(host: &str, port: Option<&str>, password: Option<&str>) -> String {
    let port = port.unwrap_or("6379");
    match password {
        Some(password) => format!(
            "redis://:{}@{host}:{port}",
            urlencoding::encode(password)
        ),
        None => format!("redis://{host}:{port}"),
    }
}

/// Open the configured backend.
///
/// Errors are returned as-is; see [`connect`] for the degrading variant.
pub async fn try_connect(config: &StoreConfig) -> StoreResult<Arc<dyn EphemeralStore>> {
    match &config.backend {
        StoreBackend::Rest { url, token } => open_rest(url, token, config.op_timeout),
        StoreBackend::Redis { url } => open_redis(url, config.op_timeout).await,
        StoreBackend::Disabled => Err(StoreError::Unavailable(
            "no cache backend configured".to_string(),
        )),
    }
}

/// Open the configured backend, falling back to [`OfflineStore`] on failure
/// so the service keeps running without a cache.
pub async fn connect(config: &StoreConfig) -> Arc<dyn EphemeralStore> {
    match try_connect(config).await {
        Ok(store) => {
            info!(backend = store.backend(), "cache store ready");
            store
        }
        Err(e) => {
            warn!("running without cache: {e}");
            Arc::new(OfflineStore::new(e.to_string()))
        }
    }
}

#[cfg(feature = "rest")]
fn open_rest(url: &str, token: &str, op_timeout: Duration) -> StoreResult<Arc<dyn EphemeralStore>> {
    Ok(Arc::new(crate::RestStore::new(url, token, op_timeout)?))
}

#[cfg(not(feature = "rest"))]
fn open_rest(_url: &str, _token: &str, _op_timeout: Duration) -> StoreResult<Arc<dyn EphemeralStore>> {
    Err(StoreError::Unavailable(
        "REST store configured but the `rest` feature is not enabled".to_string(),
    ))
}

#[cfg(feature = "redis")]
async fn open_redis(url: &str, op_timeout: Duration) -> StoreResult<Arc<dyn EphemeralStore>> {
    Ok(Arc::new(crate::RedisStore::connect(url, op_timeout).await?))
}

#[cfg(not(feature = "redis"))]
async fn open_redis(_url: &str, _op_timeout: Duration) -> StoreResult<Arc<dyn EphemeralStore>> {
    Err(StoreError::Unavailable(
        "Redis configured but the `redis` feature is not enabled".to_string(),
    ))
}
