//! Knowledge base and contact inbox collaborators
//!
//! The assistant only talks to persistence through [`KnowledgeRepository`]
//! and [`ContactRepository`]. [`crate::db::Database`] implements both on
//! SQLite; the in-memory versions here back tests and embedding-free demos.

mod memory;

pub use memory::{MemoryContactRepository, MemoryKnowledgeRepository};

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Knowledge entry scored against a query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeEntry {
    pub id: String,
    pub title: String,
    pub content: String,
    pub category: String,
    /// Cosine similarity to the query, in [-1, 1]
    pub similarity: f64,
}

/// Knowledge entry as stored, with its embedding if one was generated
#[derive(Debug, Clone, PartialEq)]
pub struct StoredKnowledgeEntry {
    pub id: String,
    pub title: String,
    pub content: String,
    pub category: String,
    pub embedding: Option<Vec<f32>>,
}

impl StoredKnowledgeEntry {
    pub fn to_entry(&self, similarity: f64) -> KnowledgeEntry {
        KnowledgeEntry {
            id: self.id.clone(),
            title: self.title.clone(),
            content: self.content.clone(),
            category: self.category.clone(),
            similarity,
        }
    }
}

#[async_trait]
pub trait KnowledgeRepository: Send + Sync {
    /// The `k` entries most similar to `query`, most similar first
    async fn top_k_by_similarity(&self, query: &[f32], k: usize) -> Result<Vec<KnowledgeEntry>>;
}

/// Fields captured by the contact form tool
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactSubmission {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub product: Option<String>,
    #[serde(default)]
    pub inquiry_type: Option<String>,
    pub message: String,
    /// Where the submission came from, e.g. "chat"
    #[serde(default)]
    pub source: Option<String>,
}

#[async_trait]
pub trait ContactRepository: Send + Sync {
    /// Persist a submission and return its id
    async fn create(&self, submission: ContactSubmission) -> Result<String>;
}

/// Content-derived unique record id (64 hex chars)
pub fn new_record_id(seed: &str) -> String {
    use std::sync::atomic::{AtomicU64, Ordering};
    static COUNTER: AtomicU64 = AtomicU64::new(0);

    let mut hasher = blake3::Hasher::new();
    hasher.update(seed.as_bytes());
    hasher.update(
        chrono::Utc::now()
            .timestamp_nanos_opt()
            .unwrap_or_default()
            .to_le_bytes()
            .as_slice(),
    );
    hasher.update(COUNTER.fetch_add(1, Ordering::Relaxed).to_le_bytes().as_slice());
    hasher.finalize().to_hex().to_string()
}
