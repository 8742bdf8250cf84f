//! Concierge CLI
//!
//! Chat with the assistant, curate its knowledge base and read the contact
//! inbox from the terminal.

use anyhow::Result;
use clap::Parser;
use concierge_core::error::exit_codes;
use concierge_core::{ConciergeError, Config, Database, TurnError};
use std::sync::Arc;

mod app;
mod commands;
mod output;

use app::{Cli, Commands};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {:#}", e);
        std::process::exit(exit_code(&e));
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = Config::load()?;

    // Open database (use CONCIERGE_DB env var if set, otherwise use default)
    let db_path = std::env::var("CONCIERGE_DB")
        .map(std::path::PathBuf::from)
        .unwrap_or_else(|_| Database::default_path());
    let db = Database::open(&db_path)?;
    db.initialize()?;
    let db = Arc::new(db);

    match cli.command {
        Commands::Chat(args) => commands::chat::run(args, &config, db, cli.format).await,
        Commands::Kb(args) => commands::kb::run(args, &config, db, cli.format).await,
        Commands::Contacts => commands::contacts::run(&db, cli.format).await,
        Commands::Tools => commands::tools::run(&config, db, cli.format).await,
        Commands::Serve => {
            let (orchestrator, client) = commands::build_orchestrator(&config, db)?;
            let server = concierge_server::ChatServer::new(orchestrator).with_llm_metrics(client);
            concierge_server::start_server(server).await
        }
    }
}

fn exit_code(error: &anyhow::Error) -> i32 {
    if let Some(e) = error.downcast_ref::<TurnError>() {
        return e.exit_code();
    }
    if let Some(e) = error.downcast_ref::<ConciergeError>() {
        return e.exit_code();
    }
    exit_codes::GENERAL_ERROR
}
