//! Embedding cache to avoid re-embedding repeated queries

use std::collections::HashMap;
use std::sync::RwLock;
use std::time::{Duration, Instant};

/// Upper bound on cached vectors before expired ones are dropped
const MAX_ENTRIES: usize = 4096;

#[derive(Clone)]
struct CacheEntry {
    vector: Vec<f32>,
    expires_at: Instant,
}

/// In-memory TTL cache keyed by model and text
pub struct EmbeddingCache {
    entries: RwLock<HashMap<blake3::Hash, CacheEntry>>,
    ttl: Duration,
}

impl EmbeddingCache {
    /// Create new cache with default TTL of 1 hour
    pub fn new() -> Self {
        Self::with_ttl(Duration::from_secs(3600))
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    pub fn get(&self, model: &str, text: &str) -> Option<Vec<f32>> {
        let entries = self.entries.read().ok()?;
        let entry = entries.get(&cache_key(model, text))?;

        if Instant::now() < entry.expires_at {
            Some(entry.vector.clone())
        } else {
            None
        }
    }

    pub fn set(&self, model: &str, text: &str, vector: Vec<f32>) {
        let now = Instant::now();
        if let Ok(mut entries) = self.entries.write() {
            if entries.len() >= MAX_ENTRIES {
                entries.retain(|_, entry| now < entry.expires_at);
            }
            if entries.len() < MAX_ENTRIES {
                entries.insert(
                    cache_key(model, text),
                    CacheEntry {
                        vector,
                        expires_at: now + self.ttl,
                    },
                );
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }
}

impl Default for EmbeddingCache {
    fn default() -> Self {
        Self::new()
    }
}

/// Length-prefixed so `("ab", "c")` and `("a", "bc")` never share a key
fn cache_key(model: &str, text: &str) -> blake3::Hash {
    let mut hasher = blake3::Hasher::new();
    hasher.update(&(model.len() as u64).to_le_bytes());
    hasher.update(model.as_bytes());
    hasher.update(text.as_bytes());
    hasher.finalize()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_basic() {
        let cache = EmbeddingCache::new();

        cache.set("model", "hello", vec![1.0, 2.0]);
        assert_eq!(cache.get("model", "hello"), Some(vec![1.0, 2.0]));
        assert_eq!(cache.get("model", "other"), None);
        assert_eq!(cache.get("other-model", "hello"), None);
    }

    #[test]
    fn test_model_and_text_boundary_is_part_of_key() {
        let cache = EmbeddingCache::new();

        cache.set("ab", "c", vec![1.0]);
        assert_eq!(cache.get("a", "bc"), None);
        assert_ne!(cache_key("ab", "c"), cache_key("a", "bc"));
        assert_eq!(cache_key("ab", "c"), cache_key("ab", "c"));
    }

    #[test]
    fn test_cache_expiry() {
        let cache = EmbeddingCache::with_ttl(Duration::from_millis(50));

        cache.set("model", "hello", vec![1.0]);
        assert!(cache.get("model", "hello").is_some());

        std::thread::sleep(Duration::from_millis(80));
        assert_eq!(cache.get("model", "hello"), None);
    }
}
