//! `itaccess company|partner|site|equipment` — manage the records access
//! entries refer to.

use crate::cli::output::{self, opt_id};
use crate::cli::{open_context, Cli, CompanyAction, EquipmentAction, PartnerAction, SiteAction};
use crate::errors::Result;
use crate::store::NewEquipment;

/// Execute a `company` subcommand.
pub fn execute_company(cli: &Cli, action: &CompanyAction) -> Result<()> {
    let ctx = open_context(cli)?;
    match action {
        CompanyAction::Add { name } => {
            let id = ctx.store.add_company(name)?;
            output::success(&format!("Company '{name}' added (#{id})"));
        }
        CompanyAction::List => {
            let rows = ctx
                .store
                .companies()?
                .into_iter()
                .map(|c| vec![c.id.to_string(), c.name])
                .collect();
            output::print_table(vec!["ID", "Name"], rows, "No companies yet.");
        }
        CompanyAction::Delete { id } => {
            ctx.store.delete_company(*id)?;
            output::success(&format!("Deleted company #{id}"));
        }
    }
    Ok(())
}

/// Execute a `partner` subcommand.
pub fn execute_partner(cli: &Cli, action: &PartnerAction) -> Result<()> {
    let ctx = open_context(cli)?;
    match action {
        PartnerAction::Add { name, it_manager } => {
            let id = ctx.store.add_partner(name, *it_manager)?;
            output::success(&format!("Partner '{name}' added (#{id})"));
            if !it_manager {
                output::tip("Only IT managers can be linked to access records (use --it-manager).");
            }
        }
        PartnerAction::List { it_managers } => {
            let rows = ctx
                .store
                .partners(*it_managers)?
                .into_iter()
                .map(|p| {
                    vec![
                        p.id.to_string(),
                        p.name,
                        if p.manage_it { "yes" } else { "no" }.to_string(),
                    ]
                })
                .collect();
            output::print_table(vec!["ID", "Name", "IT manager"], rows, "No partners yet.");
        }
        PartnerAction::Delete { id } => {
            ctx.store.delete_partner(*id)?;
            output::success(&format!("Deleted partner #{id}"));
        }
    }
    Ok(())
}

/// Execute a `site` subcommand.
pub fn execute_site(cli: &Cli, action: &SiteAction) -> Result<()> {
    let ctx = open_context(cli)?;
    match action {
        SiteAction::Add { name, company } => {
            let id = ctx.store.add_site(name, *company)?;
            output::success(&format!("Site '{name}' added (#{id})"));
        }
        SiteAction::List => {
            let rows = ctx
                .store
                .sites()?
                .into_iter()
                .map(|s| vec![s.id.to_string(), s.name, opt_id(s.company_id)])
                .collect();
            output::print_table(vec!["ID", "Name", "Company"], rows, "No sites yet.");
        }
        SiteAction::Delete { id } => {
            ctx.store.delete_site(*id)?;
            output::success(&format!("Deleted site #{id}"));
        }
    }
    Ok(())
}

/// Execute an `equipment` subcommand.
pub fn execute_equipment(cli: &Cli, action: &EquipmentAction) -> Result<()> {
    let ctx = open_context(cli)?;
    match action {
        EquipmentAction::Add {
            name,
            partner,
            site,
        } => {
            let id = ctx.store.add_equipment(&NewEquipment {
                name: name.clone(),
                partner_id: *partner,
                site_id: *site,
            })?;
            output::success(&format!("Equipment '{name}' added (#{id})"));
        }
        EquipmentAction::List => {
            let rows = ctx
                .store
                .equipments()?
                .into_iter()
                .map(|e| {
                    vec![
                        e.id.to_string(),
                        e.name,
                        opt_id(e.partner_id),
                        opt_id(e.site_id),
                    ]
                })
                .collect();
            output::print_table(
                vec!["ID", "Name", "Partner", "Site"],
                rows,
                "No equipment yet.",
            );
        }
        EquipmentAction::Delete { id } => {
            ctx.store.delete_equipment(*id)?;
            output::success(&format!("Deleted equipment #{id}"));
        }
    }
    Ok(())
}
