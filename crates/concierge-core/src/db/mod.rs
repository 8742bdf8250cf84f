//! Database layer for concierge
//!
//! Provides SQLite-based storage with:
//! - Knowledge entries with BLOB embeddings, ranked in Rust
//! - Contact submissions captured by the assistant

mod contacts;
mod knowledge;
mod schema;
pub mod vectors;

pub use contacts::ContactRecord;
pub use schema::Database;
use std::path::PathBuf;

impl Database {
    /// Get the default database path
    pub fn default_path() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(crate::DATA_DIR_NAME)
            .join("concierge.sqlite")
    }
}
