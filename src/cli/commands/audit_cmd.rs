//! `itaccess audit` — display the audit log.
//!
//! Usage:
//!   itaccess audit                 # last 50 entries
//!   itaccess audit --last 20       # last 20
//!   itaccess audit --since 7d      # entries from the last 7 days
//!   itaccess audit --access 12     # entries about access #12

use chrono::{DateTime, TimeDelta, Utc};

use crate::audit::{AuditEntry, AuditLog};
use crate::cli::output;
use crate::cli::{load_settings, Cli};
use crate::errors::{ItAccessError, Result};

/// Execute the `audit` command.
pub fn execute(cli: &Cli, last: usize, since: Option<&str>, access: Option<i64>) -> Result<()> {
    let cwd = std::env::current_dir()?;
    let data_dir = load_settings(cli)?.data_path(&cwd);

    if !data_dir.exists() {
        return Err(ItAccessError::DatabaseNotFound(data_dir));
    }

    let audit = AuditLog::open(&data_dir)
        .ok_or_else(|| ItAccessError::AuditError("failed to open audit database".into()))?;

    let since_dt = since.map(parse_duration).transpose()?;
    let entries = audit.query(last, since_dt, access)?;

    if entries.is_empty() {
        output::info("No audit entries found.");
        return Ok(());
    }

    print_audit_table(&entries);
    Ok(())
}

/// Parse a duration like "7d", "24h" or "30m" into the instant that long ago.
fn parse_duration(input: &str) -> Result<DateTime<Utc>> {
    let input = input.trim();
    let invalid = |what: &str| {
        ItAccessError::CommandFailed(format!(
            "invalid duration '{input}' — {what} (use 7d, 24h or 30m)"
        ))
    };

    let split = input
        .char_indices()
        .last()
        .map(|(i, unit)| (&input[..i], unit))
        .ok_or_else(|| invalid("empty"))?;

    let num: i64 = split.0.parse().map_err(|_| invalid("number part is not valid"))?;
    let duration = match split.1 {
        'd' => TimeDelta::try_days(num),
        'h' => TimeDelta::try_hours(num),
        'm' => TimeDelta::try_minutes(num),
        _ => return Err(invalid("unknown unit")),
    };

    duration
        .and_then(|d| Utc::now().checked_sub_signed(d))
        .ok_or_else(|| invalid("out of range"))
}

/// Print audit entries in a formatted table.
fn print_audit_table(entries: &[AuditEntry]) {
    use comfy_table::{ContentArrangement, Table};
    use console::style;

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Time", "Operation", "Access", "Actor", "Details"]);

    for entry in entries {
        table.add_row(vec![
            entry.timestamp.format("%Y-%m-%d %H:%M:%S").to_string(),
            colorize_operation(&entry.operation),
            output::opt_id(entry.access_id),
            entry.actor.clone(),
            entry.details.clone().unwrap_or_else(|| "-".into()),
        ]);
    }

    println!(
        "{}",
        style(format!("{} audit entries:", entries.len())).bold()
    );
    println!("{table}");
}

/// Colorize operation names for display.
fn colorize_operation(op: &str) -> String {
    use console::style;

    match op {
        "init" | "create" => style(op).green().to_string(),
        "edit" | "set-password" | "generate" => style(op).blue().to_string(),
        "delete" | "ssl-remove" => style(op).red().to_string(),
        "decrypt" | "ssl-export" => style(op).yellow().to_string(),
        "encrypt" | "ssl-attach" => style(op).cyan().to_string(),
        "archive" | "unarchive" => style(op).magenta().to_string(),
        _ => op.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_duration_days() {
        let dt = parse_duration("7d").unwrap();
        let diff = Utc::now() - dt;
        assert!((diff.num_days() - 7).abs() <= 1);
    }

    #[test]
    fn parse_duration_hours() {
        let dt = parse_duration("24h").unwrap();
        let diff = Utc::now() - dt;
        assert!((diff.num_hours() - 24).abs() <= 1);
    }

    #[test]
    fn parse_duration_minutes() {
        let dt = parse_duration(" 30m ").unwrap();
        let diff = Utc::now() - dt;
        assert!((diff.num_minutes() - 30).abs() <= 1);
    }

    #[test]
    fn parse_duration_invalid() {
        assert!(parse_duration("abc").is_err());
        assert!(parse_duration("7x").is_err());
        assert!(parse_duration("d").is_err());
        assert!(parse_duration("").is_err());
    }

    #[test]
    fn parse_duration_out_of_range_is_an_error() {
        assert!(parse_duration("99999999999999d").is_err());
        assert!(parse_duration("9223372036854775807m").is_err());
        assert!(parse_duration("-99999999999999h").is_err());
    }

    #[test]
    fn colorize_operation_keeps_name() {
        console::set_colors_enabled(false);
        assert_eq!(colorize_operation("decrypt"), "decrypt");
        assert_eq!(colorize_operation("unknown"), "unknown");
    }

    #[test]
    fn since_filter_keeps_recent_entries() {
        let dir = tempfile::TempDir::new().unwrap();
        let audit = AuditLog::open(dir.path()).unwrap();

        audit.log("decrypt", Some(3), Some("stdout"));

        let since = parse_duration("1h").unwrap();
        let entries = audit.query(10, Some(since), None).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].access_id, Some(3));
    }
}
