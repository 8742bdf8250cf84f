//! Guarded access to the embedding capability

use super::Embedder;
use crate::error::{ConciergeError, Result};
use std::sync::Arc;

/// Embedder wrapper that validates input and normalizes provider failures
///
/// Blank text is rejected locally with [`ConciergeError::EmptyInput`]; every
/// provider failure surfaces as [`ConciergeError::EmbeddingGeneration`] with
/// the original error as its source.
#[derive(Clone)]
pub struct EmbeddingClient {
    embedder: Arc<dyn Embedder>,
}

impl EmbeddingClient {
    pub fn new(embedder: Arc<dyn Embedder>) -> Self {
        Self { embedder }
    }

    pub async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        if text.trim().is_empty() {
            return Err(ConciergeError::EmptyInput);
        }

        let vector = self
            .embedder
            .embed(text)
            .await
            .map_err(|e| ConciergeError::EmbeddingGeneration(Box::new(e)))?;

        if vector.is_empty() {
            return Err(ConciergeError::EmbeddingGeneration(Box::new(
                ConciergeError::Llm("Provider returned an empty embedding".to_string()),
            )));
        }

        Ok(vector)
    }

    pub fn dimensions(&self) -> usize {
        self.embedder.dimensions()
    }

    pub fn model_name(&self) -> &str {
        self.embedder.model_name()
    }
}
