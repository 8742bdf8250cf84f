//! LLM trait definitions

use super::{Completion, Message, ToolChoice, ToolDefinition};
use crate::error::Result;
use async_trait::async_trait;

/// Embedding generation trait
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Generate embedding for single text
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Generate embeddings for batch of texts
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Get embedding dimensions
    fn dimensions(&self) -> usize;

    /// Get model name
    fn model_name(&self) -> &str;
}

/// Chat completion with function calling
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Complete a conversation; `tools` may be empty
    async fn complete(
        &self,
        messages: &[Message],
        tools: &[ToolDefinition],
        tool_choice: ToolChoice,
    ) -> Result<Completion>;

    /// Get model name
    fn model_name(&self) -> &str;
}
