//! Knowledge entry storage and similarity lookup

use super::vectors::{bytes_to_embedding, embedding_to_bytes};
use super::Database;
use crate::error::{ConciergeError, Result};
use crate::knowledge::{new_record_id, KnowledgeEntry, KnowledgeRepository, StoredKnowledgeEntry};
use crate::llm::rank_by_similarity;
use async_trait::async_trait;
use chrono::Utc;
use rusqlite::params;

impl Database {
    /// Insert a knowledge entry, returning its id
    pub fn add_knowledge_entry(
        &self,
        title: &str,
        content: &str,
        category: &str,
        embedding: Option<(&[f32], &str)>,
    ) -> Result<String> {
        let id = new_record_id(&format!("{}\n{}", title, content));
        let now = Utc::now().to_rfc3339();
        let (blob, model) = match embedding {
            Some((vector, model)) => (Some(embedding_to_bytes(vector)), Some(model)),
            None => (None, None),
        };

        self.conn().execute(
            "INSERT INTO knowledge_entries
                (id, title, content, category, embedding, embedding_model, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)",
            params![id, title, content, category, blob, model, now],
        )?;

        Ok(id)
    }

    /// Attach or replace the embedding of an existing entry
    pub fn set_knowledge_embedding(&self, id: &str, embedding: &[f32], model: &str) -> Result<()> {
        let updated = self.conn().execute(
            "UPDATE knowledge_entries
             SET embedding = ?2, embedding_model = ?3, updated_at = ?4
             WHERE id = ?1",
            params![id, embedding_to_bytes(embedding), model, Utc::now().to_rfc3339()],
        )?;
        if updated == 0 {
            return Err(ConciergeError::NotFound(format!("knowledge entry {}", id)));
        }
        Ok(())
    }

    /// Remove an entry; returns whether it existed
    pub fn remove_knowledge_entry(&self, id: &str) -> Result<bool> {
        let removed = self
            .conn()
            .execute("DELETE FROM knowledge_entries WHERE id = ?1", params![id])?;
        Ok(removed > 0)
    }

    /// All entries ordered by creation time
    pub fn list_knowledge_entries(&self) -> Result<Vec<StoredKnowledgeEntry>> {
        self.query_knowledge(
            "SELECT id, title, content, category, embedding FROM knowledge_entries
             ORDER BY created_at, id",
        )
    }

    /// Entries that still need an embedding
    pub fn knowledge_entries_missing_embeddings(&self) -> Result<Vec<StoredKnowledgeEntry>> {
        self.query_knowledge(
            "SELECT id, title, content, category, embedding FROM knowledge_entries
             WHERE embedding IS NULL ORDER BY created_at, id",
        )
    }

    pub fn knowledge_count(&self) -> Result<usize> {
        let count: i64 =
            self.conn()
                .query_row("SELECT COUNT(*) FROM knowledge_entries", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    fn query_knowledge(&self, sql: &str) -> Result<Vec<StoredKnowledgeEntry>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(sql)?;
        let entries = stmt
            .query_map([], |row| {
                let embedding: Option<Vec<u8>> = row.get(4)?;
                Ok(StoredKnowledgeEntry {
                    id: row.get(0)?,
                    title: row.get(1)?,
                    content: row.get(2)?,
                    category: row.get(3)?,
                    embedding: embedding.map(|bytes| bytes_to_embedding(&bytes)),
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(entries)
    }
}

#[async_trait]
impl KnowledgeRepository for Database {
    async fn top_k_by_similarity(&self, query: &[f32], k: usize) -> Result<Vec<KnowledgeEntry>> {
        let mut corpus = self.query_knowledge(
            "SELECT id, title, content, category, embedding FROM knowledge_entries
             WHERE embedding IS NOT NULL",
        )?;

        let before = corpus.len();
        corpus.retain(|entry| entry.embedding.as_ref().map(Vec::len) == Some(query.len()));
        if corpus.len() < before {
            tracing::warn!(
                "Skipped {} knowledge entries with embeddings of a different dimension than {}",
                before - corpus.len(),
                query.len()
            );
        }

        rank_by_similarity(query, &corpus, k)
    }
}
