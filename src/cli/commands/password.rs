//! Password operations on a selection of access records:
//! `set-password`, `generate`, `encrypt` and `decrypt`.

use crate::cli::output;
use crate::cli::{format_ids, open_context, read_password, Cli};
use crate::errors::{ItAccessError, Result};

/// Execute the `set-password` command.
pub fn execute_set(cli: &Cli, id: i64, value: Option<&str>) -> Result<()> {
    let ctx = open_context(cli)?;
    // Fail on a bad id before prompting.
    let access = ctx.store.access(id)?;

    let password = read_password(value, &format!("New password for '{}'", access.name))?;
    ctx.store.set_password(id, &password)?;

    ctx.audit("set-password", Some(id), None);
    output::success(&format!("Password of access #{id} updated (plaintext)"));
    output::tip(&format!("Run `itaccess encrypt {id}` to encrypt it."));

    Ok(())
}

/// Execute the `generate` command.
pub fn execute_generate(cli: &Cli, ids: &[i64]) -> Result<()> {
    let mut ctx = open_context(cli)?;
    ctx.store.generate_passwords(ids)?;

    for &id in ids {
        ctx.audit("generate", Some(id), None);
    }
    output::success(&format!(
        "Generated {}-character password(s) for {}",
        ctx.settings.password_length,
        format_ids(ids)
    ));
    output::tip("Generated passwords are stored in plaintext until you run `itaccess encrypt`.");

    Ok(())
}

/// Execute the `encrypt` command.
pub fn execute_encrypt(cli: &Cli, ids: &[i64]) -> Result<()> {
    let mut ctx = open_context(cli)?;
    ctx.store.encrypt_passwords(ids)?;

    for &id in ids {
        ctx.audit("encrypt", Some(id), None);
    }
    output::success(&format!("Encrypted password(s) of {}", format_ids(ids)));

    Ok(())
}

/// Execute the `decrypt` command.
///
/// A single password is printed bare so it can be captured by scripts;
/// several are printed one per line with their record id and username.
pub fn execute_decrypt(cli: &Cli, ids: &[i64], copy: bool) -> Result<()> {
    if copy && ids.len() != 1 {
        return Err(ItAccessError::CommandFailed(
            "--copy works with exactly one access id".into(),
        ));
    }

    let mut ctx = open_context(cli)?;
    let revealed = ctx.store.decrypt_passwords(ids)?;

    for r in &revealed {
        ctx.audit("decrypt", Some(r.id), Some(if copy { "clipboard" } else { "stdout" }));
    }

    if copy {
        if let Some(r) = revealed.first() {
            let mut clipboard = arboard::Clipboard::new()
                .map_err(|e| ItAccessError::ClipboardError(e.to_string()))?;
            clipboard
                .set_text(r.password.as_str())
                .map_err(|e| ItAccessError::ClipboardError(e.to_string()))?;
            output::success(&format!(
                "Password of '{}' (#{}) copied to the clipboard",
                r.username, r.id
            ));
        }
        return Ok(());
    }

    if let [single] = revealed.as_slice() {
        println!("{}", single.password.as_str());
    } else {
        for r in &revealed {
            println!("#{} {}: {}", r.id, r.username, r.password.as_str());
        }
    }

    Ok(())
}
