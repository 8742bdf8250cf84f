//! Output formatters

pub mod json;
pub mod terminal;

use crate::app::OutputFormat;
use concierge_core::db::ContactRecord;
use concierge_core::{KnowledgeEntry, StoredKnowledgeEntry, ToolDefinition};

pub fn format_entries(entries: &[StoredKnowledgeEntry], format: OutputFormat) -> String {
    match format {
        OutputFormat::Json => json::format_entries(entries),
        OutputFormat::Cli => terminal::format_entries(entries),
    }
}

pub fn format_search_results(results: &[KnowledgeEntry], format: OutputFormat) -> String {
    match format {
        OutputFormat::Json => json::format_value(results),
        OutputFormat::Cli => terminal::format_search_results(results),
    }
}

pub fn format_contacts(contacts: &[ContactRecord], format: OutputFormat) -> String {
    match format {
        OutputFormat::Json => json::format_value(contacts),
        OutputFormat::Cli => terminal::format_contacts(contacts),
    }
}

pub fn format_tools(tools: &[ToolDefinition], format: OutputFormat) -> String {
    match format {
        OutputFormat::Json => json::format_value(tools),
        OutputFormat::Cli => terminal::format_tools(tools),
    }
}
