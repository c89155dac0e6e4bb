use std::sync::Arc;
use std::time::Duration;

use di_core::review::CodeReview;
use di_core::Fingerprint;
use di_store::EphemeralStore;
use tracing::{debug, warn};

/// Lifetime of a cached review: 1 hour.
pub const REVIEW_TTL: Duration = Duration::from_secs(60 * 60);

const REVIEW_PREFIX: &str = "review:";

/// Content-addressed review results.
///
/// Keyed by `sha256(context || changes)`, so identical inputs share one
/// entry no matter which session they came from. The cache is an
/// optimisation only: every store failure degrades to a miss or a skipped
/// write and is never surfaced to the caller.
#[derive(Clone)]
pub struct ReviewCache {
    store: Arc<dyn EphemeralStore>,
    ttl: Duration,
}

impl ReviewCache {
    pub fn new(store: Arc<dyn EphemeralStore>) -> Self {
        Self {
            store,
            ttl: REVIEW_TTL,
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn fingerprint(context: &str, changes: &str) -> Fingerprint {
        Fingerprint::of_pair(context, changes)
    }

    fn key(fingerprint: &Fingerprint) -> String {
        format!("{REVIEW_PREFIX}{fingerprint}")
    }

    pub async fn lookup(&self, context: &str, changes: &str) -> Option<CodeReview> {
        self.lookup_fingerprint(&Self::fingerprint(context, changes))
            .await
    }

    pub async fn lookup_fingerprint(&self, fingerprint: &Fingerprint) -> Option<CodeReview> {
        let raw = match self.store.get(&Self::key(fingerprint)).await {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                debug!(%fingerprint, "review cache miss");
                return None;
            }
            Err(e) => {
                warn!(%fingerprint, backend = self.store.backend(), "review cache read failed: {e}");
                return None;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(review) => {
                debug!(%fingerprint, "review cache hit");
                Some(review)
            }
            Err(e) => {
                warn!(%fingerprint, "discarding undecodable cached review: {e}");
                None
            }
        }
    }

    pub async fn store(&self, context: &str, changes: &str, review: &CodeReview) {
        self.store_fingerprint(&Self::fingerprint(context, changes), review)
            .await
    }

    pub async fn store_fingerprint(&self, fingerprint: &Fingerprint, review: &CodeReview) {
        let json = match serde_json::to_string(review) {
            Ok(json) => json,
            Err(e) => {
                warn!(%fingerprint, "failed to serialize review for cache: {e}");
                return;
            }
        };
        if let Err(e) = self.store.put(&Self::key(fingerprint), &json, self.ttl).await {
            warn!(%fingerprint, backend = self.store.backend(), "review cache write failed: {e}");
        }
    }
}
