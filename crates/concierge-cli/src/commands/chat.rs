//! Chat command

use super::build_orchestrator;
use crate::app::{ChatArgs, OutputFormat};
use crate::output::{json, terminal};
use anyhow::Result;
use concierge_core::{ChatRequest, ConciergeError, Config, Database, Message};
use std::path::Path;
use std::sync::Arc;

pub async fn run(
    args: ChatArgs,
    config: &Config,
    db: Arc<Database>,
    format: OutputFormat,
) -> Result<()> {
    let history = match &args.history {
        Some(path) => load_history(path)?,
        None => Vec::new(),
    };
    let request = ChatRequest::new(args.message.join(" ")).with_history(history);

    let (orchestrator, client) = build_orchestrator(config, db)?;
    let reply = orchestrator.handle(&args.key, request).await;
    tracing::debug!("LLM usage: {:?}", client.metrics());
    let reply = reply?;

    match format {
        OutputFormat::Json => print!("{}", json::format_value(&reply)),
        OutputFormat::Cli => terminal::print_reply(&reply)?,
    }
    Ok(())
}

/// Prior turns stored as a JSON array of messages
fn load_history(path: &Path) -> Result<Vec<Message>> {
    let content = std::fs::read_to_string(path).map_err(ConciergeError::Io)?;
    let history = serde_json::from_str(&content).map_err(|e| {
        ConciergeError::InvalidInput(format!("Invalid history file {}: {}", path.display(), e))
    })?;
    Ok(history)
}
