//! Grounded model trait

use async_trait::async_trait;
use futures::stream::BoxStream;

use crate::error::Result;
use crate::types::grounding::GenerateContentResponse;

/// Stream of response frames for one answer
pub type ResponseStream = BoxStream<'static, Result<GenerateContentResponse>>;

/// A model that answers prompts grounded on a set of URLs
///
/// Implementations:
/// - `GeminiClient`: Gemini API with the URL context tool
#[async_trait]
pub trait GroundedModel: Send + Sync {
    /// Start streaming an answer to `prompt` using `urls` as context
    async fn stream_with_url_context(&self, prompt: &str, urls: &[String]) -> Result<ResponseStream>;

    /// Quick-start questions about the documents behind `urls`
    async fn initial_suggestions(&self, urls: &[String]) -> Result<Vec<String>>;

    /// Get provider name for logging
    fn name(&self) -> &str;

    /// Get the model being used
    fn model(&self) -> &str;
}
