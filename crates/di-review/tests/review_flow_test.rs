use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use di_core::context::build_project_context;
use di_core::{ChangeSet, Error, GatewayError, ProjectFile};
use di_review::{split_diff, AnalysisGateway, ReviewCache, ReviewService};
use di_store::{EphemeralStore, MemoryStore, OfflineStore};

const REVIEW_JSON: &str = r#"{
    "overallQuality": "Straightforward constant bump.",
    "summary": {"totalIssues": 1, "criticalIssues": 0, "filesReviewed": 1},
    "potentialBugs": [],
    "performanceIssues": [],
    "securityVulnerabilities": [],
    "conventionViolations": [
        {"file": "a.ts", "line": 1, "severity": "low", "issue": "magic number", "suggestion": "name it"}
    ],
    "improvements": [],
    "positivePoints": ["small diff"]
}"#;

/// Gateway double that counts calls and answers with a canned payload.
struct MockGateway {
    calls: AtomicUsize,
    response: String,
    delay: Duration,
}

impl MockGateway {
    fn new(response: &str) -> Arc<Self> {
        Self::with_delay(response, Duration::ZERO)
    }

    fn with_delay(response: &str, delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            response: response.to_string(),
            delay,
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AnalysisGateway for MockGateway {
    fn name(&self) -> &str {
        "mock"
    }

    async fn generate(&self, _prompt: &str) -> Result<String, GatewayError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        Ok(self.response.clone())
    }
}

fn project() -> Vec<ProjectFile> {
    vec![ProjectFile::new("a.ts", "const x=1;")]
}

fn bump_x() -> ChangeSet {
    ChangeSet::from_diff(split_diff("+++ b/a.ts\n+const x=2;"))
}

fn service(store: Arc<dyn EphemeralStore>, gateway: Arc<MockGateway>) -> ReviewService {
    ReviewService::new(store, gateway, Duration::from_secs(30))
}

#[tokio::test]
async fn test_upload_then_review_then_cached_repeat() {
    let gateway = MockGateway::new(REVIEW_JSON);
    let svc = service(Arc::new(MemoryStore::new()), gateway.clone());

    let id = svc.create_session(&project()).await.unwrap();
    assert_eq!(id.as_str().len(), 32);
    assert!(id.as_str().chars().all(|c| c.is_ascii_hexdigit()));

    let info = svc.session_info(id.as_str()).await.unwrap();
    assert!(info.exists);
    let stats = info.stats.unwrap();
    assert_eq!(stats.total_files, 1);
    assert_eq!(stats.total_lines, 1);
    assert_eq!(stats.files_by_extension.get(".ts"), Some(&1));
    assert!(info.expires_in.unwrap() > 0);

    let first = svc.review(id.as_str(), &bump_x(), "bump x").await.unwrap();
    assert!(!first.cached);
    assert_eq!(first.files_reviewed, vec!["a.ts".to_string()]);
    assert_eq!(first.stats.issues_by_category.convention, 1);
    assert_eq!(gateway.calls(), 1);

    let second = svc.review(id.as_str(), &bump_x(), "bump x").await.unwrap();
    assert!(second.cached);
    assert_eq!(gateway.calls(), 1);
    assert_eq!(
        serde_json::to_string(&first.review).unwrap(),
        serde_json::to_string(&second.review).unwrap()
    );
}

#[tokio::test]
async fn test_identical_content_shares_cache_across_sessions() {
    let gateway = MockGateway::new(REVIEW_JSON);
    let svc = service(Arc::new(MemoryStore::new()), gateway.clone());

    let a = svc.create_session(&project()).await.unwrap();
    let b = svc.create_session(&project()).await.unwrap();
    assert_ne!(a, b);

    svc.review(a.as_str(), &bump_x(), "bump x").await.unwrap();
    let again = svc.review(b.as_str(), &bump_x(), "bump x").await.unwrap();
    assert!(again.cached);
    assert_eq!(gateway.calls(), 1);

    // One-step reviews of the same bytes hit the same entry.
    let quick = svc.quick_review(&project(), &bump_x(), "bump x").await.unwrap();
    assert!(quick.cached);
    assert_eq!(quick.project_stats.unwrap().total_files, 1);
    assert_eq!(gateway.calls(), 1);
}

#[tokio::test]
async fn test_different_changes_call_gateway_again() {
    let gateway = MockGateway::new(REVIEW_JSON);
    let svc = service(Arc::new(MemoryStore::new()), gateway.clone());
    let id = svc.create_session(&project()).await.unwrap();

    svc.review(id.as_str(), &bump_x(), "bump x").await.unwrap();
    let other = ChangeSet::from_diff(split_diff("+++ b/a.ts\n+const x=3;"));
    let outcome = svc.review(id.as_str(), &other, "bump x").await.unwrap();
    assert!(!outcome.cached);
    assert_eq!(gateway.calls(), 2);
}

#[tokio::test]
async fn test_many_sessions_get_distinct_ids() {
    let svc = service(Arc::new(MemoryStore::new()), MockGateway::new(REVIEW_JSON));
    let mut ids = std::collections::HashSet::new();
    for _ in 0..200 {
        let id = svc.create_session(&project()).await.unwrap();
        assert!(ids.insert(id));
    }
}

#[tokio::test(start_paused = true)]
async fn test_expired_session_is_not_found() {
    let svc = service(Arc::new(MemoryStore::new()), MockGateway::new(REVIEW_JSON))
        .with_session_ttl(Duration::from_millis(50));
    let id = svc.create_session(&project()).await.unwrap();
    assert!(svc.session_info(id.as_str()).await.unwrap().exists);

    tokio::time::advance(Duration::from_millis(100)).await;

    assert!(!svc.session_info(id.as_str()).await.unwrap().exists);
    let err = svc.review(id.as_str(), &bump_x(), "bump x").await.unwrap_err();
    assert!(matches!(err, Error::ContextNotFound(_)));
    assert_eq!(err.status(), 404);
}

#[tokio::test]
async fn test_unknown_session_is_not_found() {
    let gateway = MockGateway::new(REVIEW_JSON);
    let svc = service(Arc::new(MemoryStore::new()), gateway.clone());
    let err = svc
        .review("ffffffffffffffffffffffffffffffff", &bump_x(), "bump x")
        .await
        .unwrap_err();
    assert!(matches!(err, Error::ContextNotFound(_)));
    assert_eq!(gateway.calls(), 0);
}

#[tokio::test]
async fn test_unavailable_store_degrades_to_no_cache() {
    let gateway = MockGateway::new(REVIEW_JSON);
    let svc = service(Arc::new(OfflineStore::new("no backend")), gateway.clone());

    let first = svc.quick_review(&project(), &bump_x(), "bump x").await.unwrap();
    let second = svc.quick_review(&project(), &bump_x(), "bump x").await.unwrap();
    assert!(!first.cached && !second.cached);
    assert_eq!(gateway.calls(), 2);

    // Sessions need the store, so they fail loudly instead.
    let err = svc.create_session(&project()).await.unwrap_err();
    assert!(matches!(err, Error::StorageFailure(_)));
}

#[tokio::test]
async fn test_malformed_output_is_not_cached() {
    let gateway = MockGateway::new("Sorry, I can't help with that.");
    let store = Arc::new(MemoryStore::new());
    let svc = service(store.clone(), gateway.clone());

    for _ in 0..2 {
        let err = svc
            .quick_review(&project(), &bump_x(), "bump x")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::MalformedAnalysisResult(_)));
    }
    assert_eq!(gateway.calls(), 2);
    assert!(store.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_slow_gateway_times_out() {
    let gateway = MockGateway::with_delay(REVIEW_JSON, Duration::from_secs(60));
    let svc = ReviewService::new(
        Arc::new(MemoryStore::new()),
        gateway.clone(),
        Duration::from_secs(5),
    );

    let err = svc
        .quick_review(&project(), &bump_x(), "bump x")
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Gateway(GatewayError::Timeout(_))));
    assert_eq!(gateway.calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_cancelled_caller_still_caches_result() {
    let gateway = MockGateway::with_delay(REVIEW_JSON, Duration::from_millis(100));
    let store = Arc::new(MemoryStore::new());
    let svc = service(store.clone(), gateway.clone());

    let caller = {
        let svc = svc.clone();
        tokio::spawn(async move { svc.quick_review(&project(), &bump_x(), "bump x").await })
    };
    tokio::time::sleep(Duration::from_millis(10)).await;
    caller.abort();
    tokio::time::sleep(Duration::from_millis(200)).await;

    let context = build_project_context(&project());
    let changes = di_core::context::build_changes_content(&bump_x());
    assert!(ReviewCache::new(store).lookup(&context, &changes).await.is_some());
    assert_eq!(gateway.calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_concurrent_identical_misses_both_analyze() {
    let gateway = MockGateway::with_delay(REVIEW_JSON, Duration::from_millis(100));
    let svc = service(Arc::new(MemoryStore::new()), gateway.clone());
    let (files, changes) = (project(), bump_x());

    let (a, b) = tokio::join!(
        svc.quick_review(&files, &changes, "bump x"),
        svc.quick_review(&files, &changes, "bump x"),
    );
    let (a, b) = (a.unwrap(), b.unwrap());
    assert!(!a.cached && !b.cached);
    assert_eq!(a.review, b.review);
    assert_eq!(gateway.calls(), 2);

    let third = svc.quick_review(&files, &changes, "bump x").await.unwrap();
    assert!(third.cached);
    assert_eq!(third.review, a.review);
    assert_eq!(gateway.calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_cached_review_expires() {
    let gateway = MockGateway::new(REVIEW_JSON);
    let svc = service(Arc::new(MemoryStore::new()), gateway.clone())
        .with_review_ttl(Duration::from_secs(60));

    svc.quick_review(&project(), &bump_x(), "bump x").await.unwrap();
    assert!(svc.quick_review(&project(), &bump_x(), "bump x").await.unwrap().cached);

    tokio::time::advance(Duration::from_secs(61)).await;

    let after = svc.quick_review(&project(), &bump_x(), "bump x").await.unwrap();
    assert!(!after.cached);
    assert_eq!(gateway.calls(), 2);
}
