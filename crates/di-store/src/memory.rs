//! In-process store backed by DashMap.
//!
//! Expiry uses `tokio::time::Instant`, so tests can drive it with a paused
//! clock. Expired entries are dropped lazily on access. Keys that are never
//! read again are reclaimed by [`MemoryStore::spawn_sweeper`] (long-lived
//! embeddings) or an explicit [`MemoryStore::purge_expired`].

use std::sync::{Arc, Weak};
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::debug;

use crate::{EphemeralStore, StoreResult};

struct Entry {
    value: String,
    expires_at: Instant,
}

impl Entry {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at > now
    }
}

#[derive(Default)]
pub struct MemoryStore {
    entries: DashMap<String, Entry>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop every expired entry. Returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.is_live(now));
        before - self.entries.len()
    }

    /// Purge expired entries every `every` until the store is dropped.
    pub fn spawn_sweeper(self: &Arc<Self>, every: Duration) -> JoinHandle<()> {
        let store: Weak<Self> = Arc::downgrade(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let Some(live) = store.upgrade() else {
                    break;
                };
                let purged = live.purge_expired();
                if purged > 0 {
                    debug!(purged, "swept expired entries");
                }
            }
        })
    }

    /// Number of stored entries, including expired ones not yet purged.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Read a live entry, evicting it if it has expired.
    fn with_live<T>(&self, key: &str, f: impl FnOnce(&Entry, Instant) -> T) -> Option<T> {
        let now = Instant::now();
        {
            // The read guard must be released before `remove_if` locks the shard.
            let entry = self.entries.get(key)?;
            if entry.is_live(now) {
                return Some(f(&entry, now));
            }
        }
        self.entries.remove_if(key, |_, e| !e.is_live(now));
        None
    }
}

#[async_trait]
impl EphemeralStore for MemoryStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn put(&self, key: &str, value: &str, ttl: Duration) -> StoreResult<()> {
        if ttl.is_zero() {
            self.entries.remove(key);
            return Ok(());
        }
        self.entries.insert(
            key.to_string(),
            Entry {
                value: value.to_string(),
                expires_at: Instant::now() + ttl,
            },
        );
        Ok(())
    }

    async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        Ok(self.with_live(key, |entry, _| entry.value.clone()))
    }

    async fn exists(&self, key: &str) -> StoreResult<bool> {
        Ok(self.with_live(key, |_, _| ()).is_some())
    }

    async fn remaining_ttl(&self, key: &str) -> StoreResult<Option<Duration>> {
        Ok(self.with_live(key, |entry, now| entry.expires_at - now))
    }

    async fn delete(&self, key: &str) -> StoreResult<()> {
        self.entries.remove(key);
        Ok(())
    }
}
