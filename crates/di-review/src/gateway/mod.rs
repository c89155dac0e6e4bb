pub mod gemini;
pub mod parse;
pub mod prompt;

use async_trait::async_trait;
use di_core::GatewayError;

pub use gemini::GeminiGateway;
pub use parse::parse_review_response;
pub use prompt::build_review_prompt;

/// The external generative model.
///
/// One prompt in, raw model text out. Implementations do not retry and do
/// not enforce a deadline; the caller bounds each call.
#[async_trait]
pub trait AnalysisGateway: Send + Sync + 'static {
    fn name(&self) -> &str;
    async fn generate(&self, prompt: &str) -> Result<String, GatewayError>;
}
