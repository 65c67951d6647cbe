//! `itaccess delete` — permanently remove an access record.

use crate::cli::output;
use crate::cli::{confirm, open_context, Cli};
use crate::errors::Result;

/// Execute the `delete` command.
pub fn execute(cli: &Cli, id: i64, force: bool) -> Result<()> {
    let ctx = open_context(cli)?;
    let access = ctx.store.access(id)?;

    // Unless --force is set, ask for confirmation before deleting.
    if !confirm(
        &format!("Delete access #{id} ('{}') and its SSL artifacts?", access.name),
        force,
    )? {
        output::info("Cancelled.");
        return Ok(());
    }

    ctx.store.delete_access(id)?;
    ctx.audit("delete", Some(id), Some(&access.name));
    output::success(&format!("Deleted access #{id}"));
    output::tip("To keep the record but hide it, use `itaccess archive` instead.");

    Ok(())
}
