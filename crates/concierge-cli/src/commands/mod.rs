//! CLI command handlers

pub mod chat;
pub mod contacts;
pub mod kb;
pub mod tools;

use anyhow::Result;
use concierge_core::{
    ChatOrchestrator, Config, Database, EmbeddingClient, InMemoryRateLimiter, OpenAiCompatClient,
    SemanticSearchService, ToolRegistry,
};
use std::sync::Arc;

/// Search over the SQLite knowledge base using the configured embedding service
pub fn build_search(config: &Config, db: Arc<Database>) -> Result<SemanticSearchService> {
    let client = Arc::new(OpenAiCompatClient::new(config.llm_service.clone())?);
    Ok(SemanticSearchService::new(EmbeddingClient::new(client), db))
}

/// Wire the full assistant from configuration
///
/// The returned client is the one behind both the chat model and the
/// embeddings, for reading its request metrics.
pub fn build_orchestrator(
    config: &Config,
    db: Arc<Database>,
) -> Result<(ChatOrchestrator, Arc<OpenAiCompatClient>)> {
    let client = Arc::new(OpenAiCompatClient::new(config.llm_service.clone())?);
    let search = SemanticSearchService::new(EmbeddingClient::new(client.clone()), db.clone());
    let tools = ToolRegistry::standard(search.clone(), config.assistant.tool_search_limit, db);
    let limiter = InMemoryRateLimiter::with_sweep_threshold(config.rate_limit.sweep_threshold);

    let orchestrator = ChatOrchestrator::new(client.clone(), Arc::new(limiter))
        .with_search(search)
        .with_tools(tools)
        .with_rate_limit(config.rate_limit.clone())
        .with_assistant(config.assistant.clone());
    Ok((orchestrator, client))
}
