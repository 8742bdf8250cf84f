//! Server-side tools the assistant can call
//!
//! The registry is the boundary where tool failures become text: a handler
//! error is rendered into the tool result so the model can react to it in
//! the follow-up completion instead of the turn being aborted.

mod contact;
mod knowledge;

pub use contact::SubmitContactFormTool;
pub use knowledge::SearchKnowledgeBaseTool;

use crate::error::{ConciergeError, Result};
use crate::knowledge::ContactRepository;
use crate::llm::ToolDefinition;
use crate::search::SemanticSearchService;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// A callable tool
#[async_trait]
pub trait ToolHandler: Send + Sync {
    /// Schema advertised to the model
    fn definition(&self) -> ToolDefinition;

    /// Execute with parsed arguments, returning the tool result text
    async fn call(&self, arguments: Value) -> Result<String>;
}

/// Static table of tools, immutable after construction
#[derive(Clone, Default)]
pub struct ToolRegistry {
    handlers: HashMap<String, Arc<dyn ToolHandler>>,
    definitions: Vec<ToolDefinition>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The assistant's standard tools: knowledge search and contact form
    pub fn standard(
        search: SemanticSearchService,
        search_limit: usize,
        contacts: Arc<dyn ContactRepository>,
    ) -> Self {
        Self::new()
            .with_tool(Arc::new(SearchKnowledgeBaseTool::new(search, search_limit)))
            .with_tool(Arc::new(SubmitContactFormTool::new(contacts)))
    }

    /// Register a tool; a later tool with the same name replaces the earlier one
    pub fn with_tool(mut self, handler: Arc<dyn ToolHandler>) -> Self {
        let definition = handler.definition();
        self.definitions.retain(|d| d.name != definition.name);
        self.handlers.insert(definition.name.clone(), handler);
        self.definitions.push(definition);
        self
    }

    /// Definitions in registration order
    pub fn definitions(&self) -> &[ToolDefinition] {
        &self.definitions
    }

    pub fn contains(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    /// Run tool `name` with JSON-encoded `arguments`
    ///
    /// Unknown names and unparseable arguments are errors; failures inside
    /// the handler are returned as `Ok` text describing the failure.
    pub async fn dispatch(&self, name: &str, arguments: &str) -> Result<String> {
        let handler = self
            .handlers
            .get(name)
            .ok_or_else(|| ConciergeError::UnknownTool(name.to_string()))?;

        let raw = if arguments.trim().is_empty() {
            "{}"
        } else {
            arguments
        };
        let parsed: Value =
            serde_json::from_str(raw).map_err(|source| ConciergeError::ArgumentParse {
                tool: name.to_string(),
                source,
            })?;

        tracing::debug!("Dispatching tool {}", name);

        match handler.call(parsed).await {
            Ok(text) => Ok(text),
            Err(e) => {
                tracing::warn!("Tool {} failed: {}", name, e);
                Ok(format!("Error executing {}: {}", name, e))
            }
        }
    }
}

/// Read a required, non-blank string argument
pub(crate) fn required_str<'a>(args: &'a Value, field: &str) -> Result<&'a str> {
    args.get(field)
        .and_then(|v| v.as_str())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ConciergeError::InvalidInput(format!("Missing {}", field)))
}

/// Read an optional string argument, treating blanks as absent
pub(crate) fn optional_str(args: &Value, field: &str) -> Option<String> {
    args.get(field)
        .and_then(|v| v.as_str())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
}
