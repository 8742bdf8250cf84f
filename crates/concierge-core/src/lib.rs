//! Concierge Core Library
//!
//! The assistant core behind the website chat widget.
//!
//! # Features
//! - Fixed-window per-key rate limiting
//! - Retrieval-augmented grounding via embedding similarity
//! - Two-phase tool-calling conversations with an OpenAI-compatible LLM
//! - SQLite-backed knowledge base and contact inbox

pub mod chat;
pub mod config;
pub mod db;
pub mod error;
pub mod knowledge;
pub mod llm;
pub mod ratelimit;
pub mod search;
pub mod tools;

pub use chat::{ChatEndpointResponse, ChatOrchestrator, ChatReply, ChatRequest, TurnError};
pub use config::{AssistantConfig, Config, LLMServiceConfig, RateLimitConfig};
pub use db::Database;
pub use error::{ConciergeError, Error, Result};
pub use knowledge::{
    ContactRepository, ContactSubmission, KnowledgeEntry, KnowledgeRepository,
    MemoryContactRepository, MemoryKnowledgeRepository, StoredKnowledgeEntry,
};
pub use llm::{
    cosine_similarity, rank_by_similarity, ChatModel, Completion, Embedder, EmbeddingClient,
    FunctionCall, Message, MetricsSnapshot, OpenAiCompatClient, Role, ToolCall, ToolChoice,
    ToolDefinition,
};
pub use ratelimit::{InMemoryRateLimiter, RateLimitDecision, RateLimitStore};
pub use search::SemanticSearchService;
pub use tools::{ToolHandler, ToolRegistry};

/// Default config directory name
pub const CONFIG_DIR_NAME: &str = "concierge";

/// Default data directory name
pub const DATA_DIR_NAME: &str = "concierge";
