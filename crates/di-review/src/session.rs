//! Context sessions: an uploaded codebase held in the store under a random
//! identifier for a fixed lifetime.
//!
//! Each session is two keys written once with the same TTL:
//!
//! - `context:<id>`: the flattened project context blob
//! - `context-meta:<id>`: JSON [`ContextMetadata`]
//!
//! There is no update or delete path; the store's TTL is the only way a
//! session ends. Store failures are fatal here, since a session has no
//! other home.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use di_core::context::build_project_context;
use di_core::{
    ContextMetadata, ContextStats, Error, ProjectFile, Result, SessionId, SessionInfo,
};
use di_store::EphemeralStore;
use tracing::{info, warn};

/// Session lifetime: 24 hours.
pub const SESSION_TTL: Duration = Duration::from_secs(24 * 60 * 60);

const CONTEXT_PREFIX: &str = "context:";
const META_PREFIX: &str = "context-meta:";

#[derive(Clone)]
pub struct ContextSession {
    store: Arc<dyn EphemeralStore>,
    ttl: Duration,
}

impl ContextSession {
    pub fn new(store: Arc<dyn EphemeralStore>) -> Self {
        Self {
            store,
            ttl: SESSION_TTL,
        }
    }

    /// Override the session lifetime (tests use near-zero TTLs to exercise expiry).
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    fn context_key(id: &SessionId) -> String {
        format!("{CONTEXT_PREFIX}{id}")
    }

    fn meta_key(id: &SessionId) -> String {
        format!("{META_PREFIX}{id}")
    }

    /// Store a project's context and return its new session identifier.
    pub async fn create_session(&self, files: &[ProjectFile]) -> Result<SessionId> {
        if files.is_empty() {
            return Err(Error::InvalidInput("no project files to store".to_string()));
        }

        let blob = build_project_context(files);
        let metadata = ContextMetadata {
            stats: ContextStats::from_files(files),
            created_at: Utc::now(),
        };
        let meta_json = serde_json::to_string(&metadata)
            .map_err(|e| Error::Internal(format!("failed to serialize context metadata: {e}")))?;

        let id = SessionId::generate();
        let context_key = Self::context_key(&id);

        self.store
            .put(&context_key, &blob, self.ttl)
            .await
            .map_err(Error::StorageFailure)?;

        if let Err(e) = self.store.put(&Self::meta_key(&id), &meta_json, self.ttl).await {
            // Don't leave a session without its metadata behind.
            if let Err(cleanup) = self.store.delete(&context_key).await {
                warn!(session = %id, "failed to remove orphaned context blob: {cleanup}");
            }
            return Err(Error::StorageFailure(e));
        }

        info!(
            session = %id,
            files = metadata.stats.total_files,
            lines = metadata.stats.total_lines,
            bytes = metadata.stats.size_in_bytes,
            "stored project context"
        );
        Ok(id)
    }

    /// The stored context blob, or `ContextNotFound` if the session never
    /// existed or has expired.
    pub async fn get_session_blob(&self, id: &str) -> Result<String> {
        let Some(sid) = SessionId::parse(id) else {
            return Err(Error::ContextNotFound(id.to_string()));
        };
        self.store
            .get(&Self::context_key(&sid))
            .await
            .map_err(Error::StorageFailure)?
            .ok_or_else(|| Error::ContextNotFound(id.to_string()))
    }

    /// Existence, stats and remaining lifetime of a session, without its content.
    pub async fn get_session_info(&self, id: &str) -> Result<SessionInfo> {
        let Some(sid) = SessionId::parse(id) else {
            return Ok(SessionInfo::missing(id));
        };

        let context_key = Self::context_key(&sid);
        let exists = self
            .store
            .exists(&context_key)
            .await
            .map_err(Error::StorageFailure)?;
        if !exists {
            return Ok(SessionInfo::missing(sid.as_str()));
        }

        let expires_in = self
            .store
            .remaining_ttl(&context_key)
            .await
            .map_err(Error::StorageFailure)?
            .map(|ttl| ttl.as_secs())
            .filter(|secs| *secs > 0);

        let metadata = match self
            .store
            .get(&Self::meta_key(&sid))
            .await
            .map_err(Error::StorageFailure)?
        {
            Some(json) => match serde_json::from_str::<ContextMetadata>(&json) {
                Ok(meta) => Some(meta),
                Err(e) => {
                    warn!(session = %sid, "unreadable context metadata: {e}");
                    None
                }
            },
            None => {
                warn!(session = %sid, "context metadata missing");
                None
            }
        };

        Ok(SessionInfo {
            context_id: sid.to_string(),
            exists: true,
            created_at: metadata.as_ref().map(|m| m.created_at),
            stats: metadata.map(|m| m.stats),
            expires_in,
        })
    }
}
