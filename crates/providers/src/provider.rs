use async_trait::async_trait;

use crate::error::Result;

/// A single-shot text completion backend.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Provider name for logs (e.g. "gemini").
    fn name(&self) -> &str;

    /// Model identifier requests are sent to.
    fn id(&self) -> &str;

    /// Send `prompt` verbatim and return the generated text.
    async fn generate_reply(&self, prompt: &str) -> Result<String>;
}
