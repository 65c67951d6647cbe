//! `itaccess show` — display one access record with its references.
//!
//! The password itself is never printed here; use `itaccess decrypt`.

use console::style;
use serde::Serialize;

use crate::access::Access;
use crate::cli::output;
use crate::cli::{open_context, Cli};
use crate::errors::{ItAccessError, Result};

#[derive(Serialize)]
struct ArtifactSummary<'a> {
    kind: &'static str,
    filename: Option<&'a str>,
    size: usize,
}

#[derive(Serialize)]
struct AccessDetail<'a> {
    #[serde(flatten)]
    access: &'a Access,
    password: &'static str,
    ssl: Vec<ArtifactSummary<'a>>,
}

/// Execute the `show` command.
pub fn execute(cli: &Cli, id: i64, json: bool) -> Result<()> {
    let mut ctx = open_context(cli)?;
    let access = ctx.store.access(id)?;
    let artifacts = ctx.store.ssl_artifacts(id)?;

    if json {
        let detail = AccessDetail {
            access: &access,
            password: output::password_state(&access),
            ssl: artifacts
                .iter()
                .map(|a| ArtifactSummary {
                    kind: a.kind.as_str(),
                    filename: a.filename.as_deref(),
                    size: a.data.len(),
                })
                .collect(),
        };
        let text = serde_json::to_string_pretty(&detail)
            .map_err(|e| ItAccessError::SerializationError(format!("access #{id}: {e}")))?;
        println!("{text}");
        return Ok(());
    }

    let company = ctx.store.company(access.company_id)?;
    let equipment = access
        .equipment_id
        .map(|eid| ctx.store.equipment(eid))
        .transpose()?;
    let site = access.site_id.map(|sid| ctx.store.site(sid)).transpose()?;
    let partner = access
        .partner_id
        .map(|pid| ctx.store.partner(pid))
        .transpose()?;

    println!("{}", style(format!("Access #{}", access.id)).bold());
    field("Username", &access.name);
    field("Company", &company.name);
    field(
        "Equipment",
        &equipment.map_or_else(|| "-".into(), |e| format!("{} (#{})", e.name, e.id)),
    );
    field(
        "Site",
        &site.map_or_else(|| "-".into(), |s| format!("{} (#{})", s.name, s.id)),
    );
    field(
        "Partner",
        &partner.map_or_else(|| "-".into(), |p| format!("{} (#{})", p.name, p.id)),
    );
    field("Password", output::password_state(&access));

    if access.is_encrypted() {
        // A token that no longer verifies is reported here rather than failing `show`.
        match ctx.store.encrypted_at(id) {
            Ok(at) => field("Encrypted at", &at.format("%Y-%m-%d %H:%M:%S").to_string()),
            Err(e) => field("Encrypted at", &style(e.to_string()).red().to_string()),
        }
    }

    field("Active", if access.active { "yes" } else { "no (archived)" });
    field(
        "Created",
        &access.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
    );
    field(
        "Updated",
        &access.updated_at.format("%Y-%m-%d %H:%M:%S").to_string(),
    );

    if artifacts.is_empty() {
        field("SSL", "-");
    } else {
        for a in &artifacts {
            field(
                a.kind.label(),
                &format!(
                    "{} ({} bytes)",
                    a.filename.as_deref().unwrap_or("unnamed"),
                    a.data.len()
                ),
            );
        }
    }

    Ok(())
}

fn field(label: &str, value: &str) {
    println!("  {:<13} {}", style(label).dim(), value);
}
