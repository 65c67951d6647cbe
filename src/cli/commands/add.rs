//! `itaccess add` — create an access record.

use crate::access::{AccessDefaults, NewAccess};
use crate::cli::output;
use crate::cli::{open_context, Cli};
use crate::errors::Result;

/// Arguments of the `add` command.
pub struct AddArgs<'a> {
    pub username: &'a str,
    pub equipment: Option<i64>,
    pub site: Option<i64>,
    pub partner: Option<i64>,
    pub company: Option<i64>,
    pub password: Option<&'a str>,
    pub generate: bool,
    pub encrypt: bool,
}

/// Execute the `add` command.
pub fn execute(cli: &Cli, args: &AddArgs<'_>) -> Result<()> {
    let mut ctx = open_context(cli)?;

    // Partner and site default to the equipment's when created for one.
    let equipment = args
        .equipment
        .map(|id| ctx.store.equipment(id))
        .transpose()?;
    let defaults = AccessDefaults::from_equipment(equipment.as_ref());

    if args.password.is_some() {
        output::warning("Password provided on command line — it may appear in shell history.");
    }

    let new = NewAccess {
        name: args.username.to_string(),
        password: args.password.map(str::to_string),
        company_id: args.company,
        equipment_id: args.equipment,
        site_id: args.site,
        partner_id: args.partner,
    }
    .with_defaults(defaults);

    let id = ctx.store.create_access(new)?;
    ctx.audit("create", Some(id), Some(args.username));

    if args.generate {
        ctx.store.generate_passwords(&[id])?;
        ctx.audit("generate", Some(id), None);
    }
    if args.encrypt {
        ctx.store.encrypt_passwords(&[id])?;
        ctx.audit("encrypt", Some(id), None);
    }

    let access = ctx.store.access(id)?;
    output::success(&format!(
        "Access #{id} created for '{}' (password: {})",
        access.name,
        output::password_state(&access)
    ));

    if !access.has_password() {
        output::tip(&format!("Run `itaccess set-password {id}` or `itaccess generate {id}`."));
    } else if !access.is_encrypted() {
        output::tip(&format!("Run `itaccess encrypt {id}` to encrypt the password."));
    }

    Ok(())
}
