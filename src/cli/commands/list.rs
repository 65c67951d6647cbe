//! `itaccess list` — display access records in a table.

use crate::cli::output;
use crate::cli::{open_context, Cli};
use crate::errors::{ItAccessError, Result};

/// Execute the `list` command.
pub fn execute(cli: &Cli, all: bool, equipment: Option<i64>, json: bool) -> Result<()> {
    let ctx = open_context(cli)?;

    let records = match equipment {
        Some(eid) => {
            ctx.store.equipment(eid)?;
            ctx.store.access_for_equipment(eid)?
        }
        None => ctx.store.list_access(all)?,
    };

    if json {
        let text = serde_json::to_string_pretty(&records)
            .map_err(|e| ItAccessError::SerializationError(format!("access list: {e}")))?;
        println!("{text}");
        return Ok(());
    }

    output::info(&format!("{} access record(s)", records.len()));
    output::print_access_table(&records);

    Ok(())
}
