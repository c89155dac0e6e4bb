use std::sync::Arc;
use std::time::Duration;

use di_core::context::{build_changes_content, build_project_context};
use di_core::review::{CodeReview, ReviewStats};
use di_core::{
    ChangeSet, ContextStats, Error, Fingerprint, GatewayError, ProjectFile, Result, SessionId,
    SessionInfo,
};
use di_store::EphemeralStore;
use serde::{Deserialize, Serialize};
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::cache::ReviewCache;
use crate::gateway::{build_review_prompt, parse_review_response, AnalysisGateway};
use crate::session::ContextSession;

/// Default upper bound on a single analysis call.
pub const DEFAULT_GATEWAY_TIMEOUT: Duration = Duration::from_secs(120);

/// What a review request returns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewOutcome {
    pub review: CodeReview,
    pub stats: ReviewStats,
    pub files_reviewed: Vec<String>,
    /// Served from the review cache without calling the gateway.
    pub cached: bool,
    /// Only set by one-step reviews, which have no session to ask.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_stats: Option<ContextStats>,
}

/// Session management plus the cache-then-analyze review flow.
///
/// Cheap to clone; all clones share the store and gateway handles.
#[derive(Clone)]
pub struct ReviewService {
    sessions: ContextSession,
    cache: ReviewCache,
    gateway: Arc<dyn AnalysisGateway>,
    gateway_timeout: Duration,
}

impl ReviewService {
    pub fn new(
        store: Arc<dyn EphemeralStore>,
        gateway: Arc<dyn AnalysisGateway>,
        gateway_timeout: Duration,
    ) -> Self {
        info!(
            store = store.backend(),
            gateway = gateway.name(),
            timeout_secs = gateway_timeout.as_secs(),
            "review service ready"
        );
        Self {
            sessions: ContextSession::new(store.clone()),
            cache: ReviewCache::new(store),
            gateway,
            gateway_timeout,
        }
    }

    pub fn with_session_ttl(mut self, ttl: Duration) -> Self {
        self.sessions = self.sessions.with_ttl(ttl);
        self
    }

    pub fn with_review_ttl(mut self, ttl: Duration) -> Self {
        self.cache = self.cache.with_ttl(ttl);
        self
    }

    pub async fn create_session(&self, files: &[ProjectFile]) -> Result<SessionId> {
        self.sessions.create_session(files).await
    }

    pub async fn session_info(&self, session_id: &str) -> Result<SessionInfo> {
        self.sessions.get_session_info(session_id).await
    }

    /// Review a change set against a previously uploaded project context.
    pub async fn review(
        &self,
        session_id: &str,
        changes: &ChangeSet,
        description: &str,
    ) -> Result<ReviewOutcome> {
        validate_request(changes, description)?;
        let context = self.sessions.get_session_blob(session_id).await?;
        debug!(session = session_id, changes = changes.len(), "reviewing against session");
        self.review_against(context, changes, description, None).await
    }

    /// Review a change set against a project supplied in the same request.
    /// Nothing is stored apart from the cached review.
    pub async fn quick_review(
        &self,
        files: &[ProjectFile],
        changes: &ChangeSet,
        description: &str,
    ) -> Result<ReviewOutcome> {
        if files.is_empty() {
            return Err(Error::InvalidInput("no project files to review against".to_string()));
        }
        validate_request(changes, description)?;
        let context = build_project_context(files);
        let stats = ContextStats::from_files(files);
        self.review_against(context, changes, description, Some(stats))
            .await
    }

    async fn review_against(
        &self,
        context: String,
        changes: &ChangeSet,
        description: &str,
        project_stats: Option<ContextStats>,
    ) -> Result<ReviewOutcome> {
        let changes_blob = build_changes_content(changes);
        let fingerprint = ReviewCache::fingerprint(&context, &changes_blob);

        let (review, cached) = match self.cache.lookup_fingerprint(&fingerprint).await {
            Some(review) => {
                info!(%fingerprint, "serving cached review");
                (review, true)
            }
            None => {
                let prompt = build_review_prompt(description, &context, &changes_blob);
                let started = Instant::now();
                // Runs detached so a cancelled caller still leaves the result cached.
                let task = tokio::spawn(analyze_and_cache(
                    self.gateway.clone(),
                    self.cache.clone(),
                    prompt,
                    fingerprint.clone(),
                    self.gateway_timeout,
                ));
                let review = task
                    .await
                    .map_err(|e| Error::Internal(format!("analysis task failed: {e}")))??;
                info!(
                    %fingerprint,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "analysis complete"
                );
                (review, false)
            }
        };

        Ok(ReviewOutcome {
            stats: review.stats(),
            review,
            files_reviewed: changes.paths(),
            cached,
            project_stats,
        })
    }
}

fn validate_request(changes: &ChangeSet, description: &str) -> Result<()> {
    if description.trim().is_empty() {
        return Err(Error::InvalidInput("a change description is required".to_string()));
    }
    if changes.is_empty() {
        return Err(Error::InvalidInput("no changes to review".to_string()));
    }
    Ok(())
}

async fn analyze_and_cache(
    gateway: Arc<dyn AnalysisGateway>,
    cache: ReviewCache,
    prompt: String,
    fingerprint: Fingerprint,
    timeout: Duration,
) -> Result<CodeReview> {
    let raw = match tokio::time::timeout(timeout, gateway.generate(&prompt)).await {
        Ok(result) => result?,
        Err(_) => {
            warn!(%fingerprint, gateway = gateway.name(), "analysis timed out after {timeout:?}");
            return Err(GatewayError::Timeout(timeout).into());
        }
    };

    let review = match parse_review_response(&raw) {
        Ok(review) => review,
        Err(e) => {
            warn!(%fingerprint, "rejecting analysis output: {e}");
            return Err(e);
        }
    };
    cache.store_fingerprint(&fingerprint, &review).await;
    Ok(review)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use di_store::MemoryStore;

    struct Unused;

    #[async_trait]
    impl AnalysisGateway for Unused {
        fn name(&self) -> &str {
            "unused"
        }

        async fn generate(&self, _prompt: &str) -> std::result::Result<String, GatewayError> {
            Err(GatewayError::EmptyResponse)
        }
    }

    fn service() -> ReviewService {
        ReviewService::new(
            Arc::new(MemoryStore::new()),
            Arc::new(Unused),
            DEFAULT_GATEWAY_TIMEOUT,
        )
    }

    fn changes() -> ChangeSet {
        ChangeSet::from_diff(vec![("a.ts".into(), "+const x=2;".into())])
    }

    #[tokio::test]
    async fn test_blank_description_is_invalid() {
        let err = service()
            .quick_review(&[ProjectFile::new("a.ts", "const x=1;")], &changes(), "  ")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_empty_changes_are_invalid() {
        let err = service()
            .quick_review(
                &[ProjectFile::new("a.ts", "const x=1;")],
                &ChangeSet::default(),
                "bump x",
            )
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_validation_runs_before_session_lookup() {
        let err = service()
            .review("0123456789abcdef0123456789abcdef", &changes(), "")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_gateway_error_is_surfaced() {
        let err = service()
            .quick_review(&[ProjectFile::new("a.ts", "const x=1;")], &changes(), "bump x")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Gateway(GatewayError::EmptyResponse)));
        assert_eq!(err.status(), 502);
    }

    #[test]
    fn test_outcome_wire_format() {
        let review: CodeReview = serde_json::from_str(
            r#"{"overallQuality":"ok","summary":{"totalIssues":0,"criticalIssues":0,"filesReviewed":1},
                "potentialBugs":[],"performanceIssues":[],"securityVulnerabilities":[],
                "conventionViolations":[],"improvements":[],"positivePoints":[]}"#,
        )
        .unwrap();
        let outcome = ReviewOutcome {
            stats: review.stats(),
            review,
            files_reviewed: vec!["a.ts".into()],
            cached: true,
            project_stats: None,
        };
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["filesReviewed"][0], "a.ts");
        assert_eq!(json["cached"], true);
        assert!(json.get("projectStats").is_none());
        assert_eq!(json["stats"]["issuesBySeverity"]["critical"], 0);
    }
}
