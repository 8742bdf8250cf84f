//! Terminal output formatter

use concierge_core::db::ContactRecord;
use concierge_core::{ChatReply, KnowledgeEntry, StoredKnowledgeEntry, ToolDefinition};
use std::io::Write;
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

const PREVIEW_CHARS: usize = 80;

fn preview(text: &str) -> String {
    let first_line = text.lines().next().unwrap_or("");
    if first_line.chars().count() > PREVIEW_CHARS {
        let cut: String = first_line.chars().take(PREVIEW_CHARS).collect();
        format!("{}...", cut)
    } else {
        first_line.to_string()
    }
}

/// Print a chat reply, highlighting degraded answers
pub fn print_reply(reply: &ChatReply) -> std::io::Result<()> {
    let mut stdout = StandardStream::stdout(ColorChoice::Auto);

    writeln!(stdout, "{}", reply.message)?;
    writeln!(stdout)?;

    stdout.set_color(ColorSpec::new().set_dimmed(true))?;
    if !reply.tool_calls.is_empty() {
        writeln!(stdout, "Tools used: {}", reply.tool_calls.join(", "))?;
    }
    writeln!(
        stdout,
        "Requests remaining: {} (resets {})",
        reply.rate_limit.remaining,
        reply.rate_limit.reset_at.to_rfc3339()
    )?;
    stdout.reset()?;

    if reply.degraded {
        stdout.set_color(ColorSpec::new().set_fg(Some(Color::Yellow)))?;
        writeln!(stdout, "Note: the answer was produced in degraded mode")?;
        stdout.reset()?;
    }

    Ok(())
}

pub fn format_entries(entries: &[StoredKnowledgeEntry]) -> String {
    if entries.is_empty() {
        return "No knowledge entries\n".to_string();
    }

    let mut output = String::new();
    for entry in entries {
        let marker = if entry.embedding.is_some() { ' ' } else { '*' };
        output.push_str(&format!(
            "{}{} [{}] {}\n   {}\n",
            marker,
            &entry.id[..entry.id.len().min(8)],
            entry.category,
            entry.title,
            preview(&entry.content)
        ));
    }
    if entries.iter().any(|e| e.embedding.is_none()) {
        output.push_str("\n* not embedded yet, run `concierge kb embed`\n");
    }
    output
}

pub fn format_search_results(results: &[KnowledgeEntry]) -> String {
    if results.is_empty() {
        return "No matching entries\n".to_string();
    }

    let mut output = String::new();
    for result in results {
        let score_pct = (result.similarity * 100.0).round() as i64;
        output.push_str(&format!(
            "{:>3}% {} [{}]\n  {}\n",
            score_pct,
            result.title,
            result.category,
            preview(&result.content)
        ));
    }
    output
}

pub fn format_contacts(contacts: &[ContactRecord]) -> String {
    if contacts.is_empty() {
        return "No contact submissions\n".to_string();
    }

    let mut output = String::new();
    for record in contacts {
        let s = &record.submission;
        output.push_str(&format!(
            "{} {} <{}>{}\n  {} | {} | {}\n  {}\n",
            &record.id[..record.id.len().min(8)],
            s.name,
            s.email,
            s.company
                .as_deref()
                .map(|c| format!(" ({})", c))
                .unwrap_or_default(),
            record.created_at,
            s.inquiry_type.as_deref().unwrap_or("general"),
            s.source.as_deref().unwrap_or("website"),
            preview(&s.message)
        ));
    }
    output
}

pub fn format_tools(tools: &[ToolDefinition]) -> String {
    let mut output = String::new();
    for tool in tools {
        let required: Vec<&str> = tool.parameters["required"]
            .as_array()
            .map(|fields| fields.iter().filter_map(|f| f.as_str()).collect())
            .unwrap_or_default();
        output.push_str(&format!("{}({})\n", tool.name, required.join(", ")));
        output.push_str(&format!("  {}\n", tool.description));
    }
    output
}
