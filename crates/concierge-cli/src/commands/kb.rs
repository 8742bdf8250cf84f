//! Knowledge base management commands

use super::build_search;
use crate::app::{KbAction, KbArgs, OutputFormat};
use crate::output::{format_entries, format_search_results};
use anyhow::Result;
use concierge_core::{ConciergeError, Config, Database, EmbeddingClient, OpenAiCompatClient};
use std::sync::Arc;

/// Text embedded for an entry
fn embedding_text(title: &str, content: &str) -> String {
    format!("{}\n\n{}", title, content)
}

fn embedding_client(config: &Config) -> Result<EmbeddingClient> {
    let client = OpenAiCompatClient::new(config.llm_service.clone())?;
    Ok(EmbeddingClient::new(Arc::new(client)))
}

pub async fn run(
    args: KbArgs,
    config: &Config,
    db: Arc<Database>,
    format: OutputFormat,
) -> Result<()> {
    match args.action {
        KbAction::Add {
            title,
            category,
            content,
            file,
        } => {
            let content = match (content, file) {
                (Some(text), _) => text,
                (None, Some(path)) => std::fs::read_to_string(&path).map_err(ConciergeError::Io)?,
                (None, None) => String::new(),
            };
            if title.trim().is_empty() || content.trim().is_empty() {
                return Err(ConciergeError::InvalidInput(
                    "Title and content must not be empty".to_string(),
                )
                .into());
            }

            let embedder = embedding_client(config)?;
            let id = match embedder.embed(&embedding_text(&title, &content)).await {
                Ok(vector) => db.add_knowledge_entry(
                    &title,
                    &content,
                    &category,
                    Some((vector.as_slice(), embedder.model_name())),
                )?,
                Err(e) => {
                    tracing::warn!("Storing '{}' without embedding: {}", title, e);
                    eprintln!("Warning: could not embed entry, run `concierge kb embed` later");
                    db.add_knowledge_entry(&title, &content, &category, None)?
                }
            };
            println!("Added knowledge entry '{}' ({})", title, &id[..8]);
        }
        KbAction::List => {
            let entries = db.list_knowledge_entries()?;
            print!("{}", format_entries(&entries, format));
        }
        KbAction::Search { query, limit } => {
            let query = query.join(" ");
            if query.trim().is_empty() {
                return Err(ConciergeError::InvalidInput("Query is required".to_string()).into());
            }
            let search = build_search(config, db)?;
            let results = search.search(&query, limit).await?;
            print!("{}", format_search_results(&results, format));
        }
        KbAction::Embed => {
            let pending = db.knowledge_entries_missing_embeddings()?;
            if pending.is_empty() {
                println!("All {} entries are embedded", db.knowledge_count()?);
                return Ok(());
            }

            let embedder = embedding_client(config)?;
            let mut embedded = 0usize;
            for entry in &pending {
                match embedder.embed(&embedding_text(&entry.title, &entry.content)).await {
                    Ok(vector) => {
                        db.set_knowledge_embedding(&entry.id, &vector, embedder.model_name())?;
                        embedded += 1;
                    }
                    Err(e) => eprintln!("Failed to embed '{}': {}", entry.title, e),
                }
            }
            println!("Embedded {}/{} entries", embedded, pending.len());
        }
        KbAction::Remove { id } => {
            if !db.remove_knowledge_entry(&id)? {
                return Err(ConciergeError::NotFound(format!("Knowledge entry {}", id)).into());
            }
            println!("Removed knowledge entry {}", id);
        }
    }
    Ok(())
}
