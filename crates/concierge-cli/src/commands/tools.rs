//! Tools command

use super::build_search;
use crate::app::OutputFormat;
use crate::output::format_tools;
use anyhow::Result;
use concierge_core::{Config, Database, ToolRegistry};
use std::sync::Arc;

pub async fn run(config: &Config, db: Arc<Database>, format: OutputFormat) -> Result<()> {
    let search = build_search(config, db.clone())?;
    let registry = ToolRegistry::standard(search, config.assistant.tool_search_limit, db);
    print!("{}", format_tools(registry.definitions(), format));
    Ok(())
}
