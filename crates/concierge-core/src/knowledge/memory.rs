//! In-memory repositories

use super::{
    new_record_id, ContactRepository, ContactSubmission, KnowledgeEntry, KnowledgeRepository,
    StoredKnowledgeEntry,
};
use crate::error::{ConciergeError, Result};
use crate::llm::rank_by_similarity;
use async_trait::async_trait;
use std::sync::RwLock;

/// Knowledge base held in a vector, ranked with [`rank_by_similarity`]
#[derive(Default)]
pub struct MemoryKnowledgeRepository {
    entries: RwLock<Vec<StoredKnowledgeEntry>>,
}

impl MemoryKnowledgeRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entries(entries: Vec<StoredKnowledgeEntry>) -> Self {
        Self {
            entries: RwLock::new(entries),
        }
    }

    pub fn insert(&self, entry: StoredKnowledgeEntry) -> Result<()> {
        self.entries
            .write()
            .map_err(|_| ConciergeError::Repository("knowledge store poisoned".to_string()))?
            .push(entry);
        Ok(())
    }
}

#[async_trait]
impl KnowledgeRepository for MemoryKnowledgeRepository {
    async fn top_k_by_similarity(&self, query: &[f32], k: usize) -> Result<Vec<KnowledgeEntry>> {
        let entries = self
            .entries
            .read()
            .map_err(|_| ConciergeError::Repository("knowledge store poisoned".to_string()))?;
        rank_by_similarity(query, &entries, k)
    }
}

/// Contact inbox held in memory
#[derive(Default)]
pub struct MemoryContactRepository {
    submissions: RwLock<Vec<(String, ContactSubmission)>>,
}

impl MemoryContactRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of stored submissions with their ids, oldest first
    pub fn submissions(&self) -> Vec<(String, ContactSubmission)> {
        self.submissions
            .read()
            .map(|s| s.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl ContactRepository for MemoryContactRepository {
    async fn create(&self, submission: ContactSubmission) -> Result<String> {
        let id = new_record_id(&submission.email);
        self.submissions
            .write()
            .map_err(|_| ConciergeError::Repository("contact store poisoned".to_string()))?
            .push((id.clone(), submission));
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_knowledge_ranks() {
        let repo = MemoryKnowledgeRepository::new();
        repo.insert(StoredKnowledgeEntry {
            id: "1".to_string(),
            title: "Shipping".to_string(),
            content: "We ship worldwide.".to_string(),
            category: "faq".to_string(),
            embedding: Some(vec![1.0, 0.0]),
        })
        .unwrap();
        repo.insert(StoredKnowledgeEntry {
            id: "2".to_string(),
            title: "Returns".to_string(),
            content: "30 day returns.".to_string(),
            category: "faq".to_string(),
            embedding: Some(vec![0.0, 1.0]),
        })
        .unwrap();

        let results = repo.top_k_by_similarity(&[0.9, 0.1], 1).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].title, "Shipping");
    }

    #[tokio::test]
    async fn test_memory_contacts_store_submission() {
        let repo = MemoryContactRepository::new();
        let id = repo
            .create(ContactSubmission {
                name: "Ada".to_string(),
                email: "ada@example.com".to_string(),
                message: "Hi".to_string(),
                ..Default::default()
            })
            .await
            .unwrap();

        let stored = repo.submissions();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].0, id);
        assert_eq!(stored[0].1.name, "Ada");
    }
}
