//! Semantic search over the knowledge base
//!
//! Embeds the query and delegates ranking to the [`KnowledgeRepository`],
//! which is expected to return entries already sorted by similarity.

use crate::error::{ConciergeError, Result};
use crate::knowledge::{KnowledgeEntry, KnowledgeRepository};
use crate::llm::EmbeddingClient;
use std::sync::Arc;

/// Separator between knowledge blocks in prompts and tool results
pub const BLOCK_SEPARATOR: &str = "\n\n---\n\n";

#[derive(Clone)]
pub struct SemanticSearchService {
    embedding: EmbeddingClient,
    repository: Arc<dyn KnowledgeRepository>,
}

impl SemanticSearchService {
    pub fn new(embedding: EmbeddingClient, repository: Arc<dyn KnowledgeRepository>) -> Self {
        Self {
            embedding,
            repository,
        }
    }

    /// Up to `k` entries, most similar first
    ///
    /// "No results" is an empty vector; only embedding or repository failures
    /// are errors, reported as [`ConciergeError::SearchFailed`].
    pub async fn search(&self, query: &str, k: usize) -> Result<Vec<KnowledgeEntry>> {
        if k == 0 {
            return Ok(Vec::new());
        }

        let vector = self
            .embedding
            .embed(query)
            .await
            .map_err(|e| ConciergeError::SearchFailed(Box::new(e)))?;

        let mut entries = self
            .repository
            .top_k_by_similarity(&vector, k)
            .await
            .map_err(|e| ConciergeError::SearchFailed(Box::new(e)))?;
        entries.truncate(k);

        tracing::debug!("Semantic search returned {} entries", entries.len());
        Ok(entries)
    }
}

/// Render entries as `**title**\ncontent` blocks for the system prompt
pub fn format_grounding_context(entries: &[KnowledgeEntry]) -> String {
    entries
        .iter()
        .map(|e| format!("**{}**\n{}", e.title, e.content))
        .collect::<Vec<_>>()
        .join(BLOCK_SEPARATOR)
}

/// Render entries with their relevance for a tool result
pub fn format_search_results(entries: &[KnowledgeEntry]) -> String {
    entries
        .iter()
        .map(|e| {
            format!(
                "**{}** ({:.0}% relevant)\n{}",
                e.title,
                e.similarity * 100.0,
                e.content
            )
        })
        .collect::<Vec<_>>()
        .join(BLOCK_SEPARATOR)
}
