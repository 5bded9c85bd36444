use async_trait::async_trait;
use askweb_common::Result;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LlmResponse {
    /// Generated text, already trimmed. Empty when the provider sent none.
    pub text: String,
    pub model: Option<String>,
    pub tokens_used: Option<u32>,
}

#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Generate a single, non-streamed completion for `prompt`.
    async fn generate(&self, prompt: &str) -> Result<LlmResponse>;

    /// Check if the LLM service is reachable.
    async fn health_check(&self) -> Result<bool>;

    /// Get the model name being used
    fn model_name(&self) -> &str;
}
