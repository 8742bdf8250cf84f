//! CLI argument definitions

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "concierge")]
#[command(
    author,
    version,
    about = "Website assistant with knowledge-base grounding and tool calling"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output format
    #[arg(long, global = true, value_enum, default_value = "cli")]
    pub format: OutputFormat,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Send one message through the assistant
    Chat(ChatArgs),

    /// Manage the knowledge base
    Kb(KbArgs),

    /// List contact submissions
    Contacts,

    /// List the tools offered to the model
    Tools,

    /// Start the JSON-RPC server on stdio
    Serve,
}

#[derive(Args)]
pub struct ChatArgs {
    /// Message text
    pub message: Vec<String>,

    /// Rate-limit key to charge the turn to
    #[arg(long, default_value = "cli")]
    pub key: String,

    /// JSON file holding prior messages
    #[arg(long)]
    pub history: Option<PathBuf>,
}

#[derive(Args)]
pub struct KbArgs {
    #[command(subcommand)]
    pub action: KbAction,
}

#[derive(Subcommand)]
pub enum KbAction {
    /// Add an entry and embed it
    Add {
        #[arg(long)]
        title: String,
        #[arg(long, default_value = "general")]
        category: String,
        /// Entry text
        #[arg(long, conflicts_with = "file", required_unless_present = "file")]
        content: Option<String>,
        /// Read entry text from a file
        #[arg(long)]
        file: Option<PathBuf>,
    },
    /// List all entries
    List,
    /// Semantic search over embedded entries
    Search {
        query: Vec<String>,
        /// Number of results
        #[arg(short = 'n', default_value = "5")]
        limit: usize,
    },
    /// Embed entries that have no embedding yet
    Embed,
    /// Remove an entry
    #[command(alias = "rm")]
    Remove { id: String },
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Cli,
    Json,
}
