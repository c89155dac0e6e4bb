//! Context sessions, the content-addressed review cache, and the review
//! flow that ties them to the analysis gateway.

pub mod cache;
pub mod diff;
pub mod extract;
pub mod gateway;
pub mod service;
pub mod session;

pub use cache::{ReviewCache, REVIEW_TTL};
pub use diff::split_diff;
pub use extract::{ArchiveEntry, ArchiveExtractor, ArchiveSource, DirectorySource};
pub use gateway::{AnalysisGateway, GeminiGateway};
pub use service::{ReviewOutcome, ReviewService};
pub use session::{ContextSession, SESSION_TTL};
