//! search_knowledge_base tool

use super::{required_str, ToolHandler};
use crate::error::Result;
use crate::llm::ToolDefinition;
use crate::search::{format_search_results, SemanticSearchService};
use async_trait::async_trait;
use serde_json::Value;

pub const NO_RESULTS: &str = "No relevant information found in the knowledge base.";

pub struct SearchKnowledgeBaseTool {
    search: SemanticSearchService,
    limit: usize,
}

impl SearchKnowledgeBaseTool {
    pub fn new(search: SemanticSearchService, limit: usize) -> Self {
        Self { search, limit }
    }
}

#[async_trait]
impl ToolHandler for SearchKnowledgeBaseTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: "search_knowledge_base".to_string(),
            description: "Search the company knowledge base for information about products, \
                          services, pricing, policies and frequently asked questions. Use this \
                          when the answer is not already in the conversation."
                .to_string(),
            parameters: serde_json::json!({
                "type": "object",
                "properties": {
                    "query": {
                        "type": "string",
                        "description": "What to look up, in natural language"
                    }
                },
                "required": ["query"]
            }),
        }
    }

    async fn call(&self, arguments: Value) -> Result<String> {
        let query = required_str(&arguments, "query")?;
        let entries = self.search.search(query, self.limit).await?;

        if entries.is_empty() {
            return Ok(NO_RESULTS.to_string());
        }
        Ok(format_search_results(&entries))
    }
}
