//! `itaccess edit` — change the username or references of a record.

use crate::cli::output;
use crate::cli::{open_context, Cli};
use crate::errors::{ItAccessError, Result};

/// Arguments of the `edit` command.
#[derive(Default)]
pub struct EditArgs<'a> {
    pub username: Option<&'a str>,
    pub equipment: Option<i64>,
    pub no_equipment: bool,
    pub site: Option<i64>,
    pub no_site: bool,
    pub partner: Option<i64>,
    pub no_partner: bool,
    pub company: Option<i64>,
}

impl EditArgs<'_> {
    fn is_empty(&self) -> bool {
        self.username.is_none()
            && self.equipment.is_none()
            && !self.no_equipment
            && self.site.is_none()
            && !self.no_site
            && self.partner.is_none()
            && !self.no_partner
            && self.company.is_none()
    }
}

/// Execute the `edit` command.
pub fn execute(cli: &Cli, id: i64, args: &EditArgs<'_>) -> Result<()> {
    if args.is_empty() {
        return Err(ItAccessError::CommandFailed(
            "nothing to change — pass at least one field flag".into(),
        ));
    }

    let ctx = open_context(cli)?;
    let mut access = ctx.store.access(id)?;

    if let Some(name) = args.username {
        access.name = name.trim().to_string();
    }

    // The partner follows the equipment; an explicit --partner below wins.
    if args.no_equipment {
        access.on_equipment_change(None);
    } else if let Some(eid) = args.equipment {
        let equipment = ctx.store.equipment(eid)?;
        access.on_equipment_change(Some(&equipment));
    }

    if args.no_site {
        access.site_id = None;
    } else if args.site.is_some() {
        access.site_id = args.site;
    }

    if args.no_partner {
        access.partner_id = None;
    } else if args.partner.is_some() {
        access.partner_id = args.partner;
    }

    if let Some(cid) = args.company {
        access.company_id = cid;
    }

    ctx.store.save_access(&access)?;
    ctx.audit("edit", Some(id), None);
    output::success(&format!("Access #{id} updated"));

    Ok(())
}
