//! `itaccess archive` / `itaccess unarchive` — toggle the `active` flag.

use crate::cli::output;
use crate::cli::{format_ids, open_context, Cli};
use crate::errors::Result;

/// Execute `archive` (`active = false`) or `unarchive` (`active = true`).
pub fn execute(cli: &Cli, ids: &[i64], active: bool) -> Result<()> {
    let mut ctx = open_context(cli)?;
    ctx.store.set_active(ids, active)?;

    let op = if active { "unarchive" } else { "archive" };
    for &id in ids {
        ctx.audit(op, Some(id), None);
    }

    if active {
        output::success(&format!("Restored {}", format_ids(ids)));
    } else {
        output::success(&format!("Archived {}", format_ids(ids)));
        output::tip("Archived records are hidden from `itaccess list` unless you pass --all.");
    }

    Ok(())
}
