//! Colored terminal output helpers.
//!
//! All user-facing output goes through these functions so we get
//! consistent styling across every command.

use comfy_table::{ContentArrangement, Table};
use console::style;

use crate::access::Access;

/// Print a green success message: "check_mark {msg}"
pub fn success(msg: &str) {
    println!("{} {}", style("\u{2713}").green().bold(), msg);
}

/// Print a red error message: "x_mark {msg}"
pub fn error(msg: &str) {
    eprintln!("{} {}", style("\u{2717}").red().bold(), msg);
}

/// Print a yellow warning: "warning_sign {msg}"
pub fn warning(msg: &str) {
    eprintln!("{} {}", style("\u{26a0}").yellow().bold(), msg);
}

/// Print a blue info message: "info_sign {msg}"
pub fn info(msg: &str) {
    println!("{} {}", style("\u{2139}").blue().bold(), msg);
}

/// Print a dim tip/hint: "arrow {msg}"
pub fn tip(msg: &str) {
    println!("{} {}", style("\u{2192}").dim(), style(msg).dim());
}

/// Text shown in place of a password.
pub fn password_state(access: &Access) -> &'static str {
    match (access.has_password(), access.is_encrypted()) {
        (false, _) => "-",
        (true, true) => "encrypted",
        (true, false) => "plaintext",
    }
}

/// Format an optional record id as `#3`, or `-` when unset.
pub fn opt_id(id: Option<i64>) -> String {
    id.map_or_else(|| "-".to_string(), |v| format!("#{v}"))
}

/// Print a table of access records.  Passwords are never shown.
pub fn print_access_table(records: &[Access]) {
    if records.is_empty() {
        info("No access records yet.");
        tip("Run `itaccess add <USERNAME>` to add one.");
        return;
    }

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        "ID",
        "Username",
        "Password",
        "Equipment",
        "Site",
        "Partner",
        "Active",
        "Updated",
    ]);

    for a in records {
        table.add_row(vec![
            a.id.to_string(),
            a.name.clone(),
            password_state(a).to_string(),
            opt_id(a.equipment_id),
            opt_id(a.site_id),
            opt_id(a.partner_id),
            if a.active { "yes" } else { "no" }.to_string(),
            a.updated_at.format("%Y-%m-%d %H:%M:%S").to_string(),
        ]);
    }

    println!("{table}");
}

/// Print a generic two-column id/name table with optional extra columns.
pub fn print_table(header: Vec<&str>, rows: Vec<Vec<String>>, empty_msg: &str) {
    if rows.is_empty() {
        info(empty_msg);
        return;
    }

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(header);
    for row in rows {
        table.add_row(row);
    }
    println!("{table}");
}
