//! History CLI command

use crate::error::AgendaResult;
use crate::storage::Storage;

/// Print the most recent price changes, oldest first
pub fn handle_history_command(storage: &Storage, count: usize) -> AgendaResult<()> {
    let entries = storage.audit_log().read_recent(count)?;

    if entries.is_empty() {
        println!("No price changes recorded.");
        return Ok(());
    }

    for entry in &entries {
        println!("{}", entry.format_human_readable());
    }
    Ok(())
}
