//! LLM integration
//!
//! Provides traits and implementations for:
//! - Chat completions with function calling via external services (OpenAI, vLLM, etc.)
//! - Embedding generation
//! - Cosine similarity ranking

mod cache;
mod client;
pub mod embedding;
pub mod similarity;
mod traits;
mod types;

pub use client::{MetricsSnapshot, OpenAiCompatClient};
pub use embedding::EmbeddingClient;
pub use similarity::{cosine_similarity, rank_by_similarity};
pub use traits::*;
pub use types::*;
