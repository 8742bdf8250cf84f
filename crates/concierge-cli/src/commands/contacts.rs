//! Contacts command

use crate::app::OutputFormat;
use crate::output::format_contacts;
use anyhow::Result;
use concierge_core::Database;

pub async fn run(db: &Database, format: OutputFormat) -> Result<()> {
    let contacts = db.list_contacts()?;
    print!("{}", format_contacts(&contacts, format));
    Ok(())
}
