use std::time::Duration;

use async_trait::async_trait;

use crate::{EphemeralStore, StoreError, StoreResult};

/// A store that is never reachable.
///
/// Stands in when no backend is configured or the configured one failed to
/// connect at startup. Cache paths degrade to "always miss"; session paths
/// fail with a storage error.
pub struct OfflineStore {
    reason: String,
}

impl OfflineStore {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }

    fn err(&self) -> StoreError {
        StoreError::Unavailable(self.reason.clone())
    }
}

#[async_trait]
impl EphemeralStore for OfflineStore {
    fn backend(&self) -> &'static str {
        "offline"
    }

    async fn put(&self, _key: &str, _value: &str, _ttl: Duration) -> StoreResult<()> {
        Err(self.err())
    }

    async fn get(&self, _key: &str) -> StoreResult<Option<String>> {
        Err(self.err())
    }

    async fn exists(&self, _key: &str) -> StoreResult<bool> {
        Err(self.err())
    }

    async fn remaining_ttl(&self, _key: &str) -> StoreResult<Option<Duration>> {
        Err(self.err())
    }

    async fn delete(&self, _key: &str) -> StoreResult<()> {
        Err(self.err())
    }
}
