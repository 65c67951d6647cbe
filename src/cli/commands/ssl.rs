//! `itaccess ssl` — attach, export, remove and list SSL artifacts.

use std::fs;
use std::io::{self, Write};
use std::path::Path;

use crate::access::SslKind;
use crate::cli::output;
use crate::cli::{open_context, Cli};
use crate::errors::{ItAccessError, Result};

/// Largest artifact accepted (certificates and keys are a few KiB).
const MAX_ARTIFACT_BYTES: u64 = 1024 * 1024;

/// Execute `ssl attach`.
pub fn execute_attach(cli: &Cli, id: i64, kind: SslKind, file: &Path) -> Result<()> {
    let ctx = open_context(cli)?;

    let size = fs::metadata(file)?.len();
    if size > MAX_ARTIFACT_BYTES {
        return Err(ItAccessError::CommandFailed(format!(
            "{} is {size} bytes — artifacts are limited to {MAX_ARTIFACT_BYTES} bytes",
            file.display()
        )));
    }

    let data = fs::read(file)?;
    let filename = file.file_name().map(|n| n.to_string_lossy().into_owned());
    ctx.store.attach_ssl(id, kind, filename.as_deref(), &data)?;

    ctx.audit("ssl-attach", Some(id), Some(kind.as_str()));
    output::success(&format!(
        "{} attached to access #{id} ({} bytes)",
        kind.label(),
        data.len()
    ));

    Ok(())
}

/// Execute `ssl export`.
pub fn execute_export(cli: &Cli, id: i64, kind: SslKind, dest: Option<&Path>) -> Result<()> {
    let ctx = open_context(cli)?;
    let artifact = ctx.store.ssl_artifact(id, kind)?.ok_or_else(|| {
        ItAccessError::CommandFailed(format!("access #{id} has no {} stored", kind.label()))
    })?;

    ctx.audit("ssl-export", Some(id), Some(kind.as_str()));

    match dest {
        Some(path) => {
            fs::write(path, &artifact.data)?;

            // Private keys leave the store owner-readable only.
            #[cfg(unix)]
            {
                use std::os::unix::fs::PermissionsExt;
                if kind == SslKind::PrivateKey {
                    fs::set_permissions(path, fs::Permissions::from_mode(0o600))?;
                }
            }

            output::success(&format!("{} written to {}", kind.label(), path.display()));
        }
        None => {
            let mut stdout = io::stdout().lock();
            stdout.write_all(&artifact.data)?;
            stdout.flush()?;
        }
    }

    Ok(())
}

/// Execute `ssl remove`.
pub fn execute_remove(cli: &Cli, id: i64, kind: SslKind) -> Result<()> {
    let ctx = open_context(cli)?;
    if ctx.store.remove_ssl(id, kind)? {
        ctx.audit("ssl-remove", Some(id), Some(kind.as_str()));
        output::success(&format!("{} removed from access #{id}", kind.label()));
    } else {
        output::info(&format!("Access #{id} has no {} stored.", kind.label()));
    }
    Ok(())
}

/// Execute `ssl list`.
pub fn execute_list(cli: &Cli, id: i64) -> Result<()> {
    let ctx = open_context(cli)?;
    let rows = ctx
        .store
        .ssl_artifacts(id)?
        .into_iter()
        .map(|a| {
            vec![
                a.kind.label().to_string(),
                a.filename.unwrap_or_else(|| "-".into()),
                a.data.len().to_string(),
            ]
        })
        .collect();

    output::print_table(
        vec!["Artifact", "Filename", "Bytes"],
        rows,
        &format!("Access #{id} has no SSL artifacts."),
    );
    Ok(())
}
