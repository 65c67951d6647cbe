//! CLI module — Clap argument parser, output helpers, and command implementations.

pub mod commands;
pub mod output;

use std::io::{self, IsTerminal, Read};
use std::path::{Path, PathBuf};

use clap::Parser;
use zeroize::Zeroizing;

use crate::access::SslKind;
use crate::config::Settings;
use crate::errors::{ItAccessError, Result};
use crate::store::AccessStore;

/// itaccess CLI: access credentials for IT equipment.
#[derive(Parser)]
#[command(
    name = "itaccess",
    about = "Encrypted access credentials for IT equipment",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Data directory (default: from .itaccess.toml, else .itaccess)
    #[arg(long, env = "ITACCESS_DATA_DIR", global = true)]
    pub data_dir: Option<String>,
}

/// All available subcommands.
#[derive(clap::Subcommand)]
pub enum Commands {
    /// Create the database and the installation secret
    Init,

    /// Add an access record
    Add {
        /// Username
        username: String,
        /// Equipment the access belongs to (prefills partner and site)
        #[arg(long)]
        equipment: Option<i64>,
        /// Site (overrides the equipment's site)
        #[arg(long)]
        site: Option<i64>,
        /// IT manager partner (overrides the equipment's partner)
        #[arg(long)]
        partner: Option<i64>,
        /// Owning company (default: the configured default company)
        #[arg(long)]
        company: Option<i64>,
        /// Password value (omit to add the record without one; see --generate)
        #[arg(long, conflicts_with = "generate")]
        password: Option<String>,
        /// Generate a random password
        #[arg(long)]
        generate: bool,
        /// Encrypt the password right away
        #[arg(long)]
        encrypt: bool,
    },

    /// List access records
    List {
        /// Include archived records
        #[arg(short, long)]
        all: bool,
        /// Only records of this equipment
        #[arg(long)]
        equipment: Option<i64>,
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Show one access record
    Show {
        /// Access id
        id: i64,
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Change fields of an access record
    Edit {
        /// Access id
        id: i64,
        /// New username
        #[arg(long)]
        username: Option<String>,
        /// Link to another equipment (resets the partner from it)
        #[arg(long, conflicts_with = "no_equipment")]
        equipment: Option<i64>,
        /// Unlink the equipment (clears the partner)
        #[arg(long)]
        no_equipment: bool,
        /// New site
        #[arg(long, conflicts_with = "no_site")]
        site: Option<i64>,
        /// Clear the site
        #[arg(long)]
        no_site: bool,
        /// New IT manager partner
        #[arg(long, conflicts_with = "no_partner")]
        partner: Option<i64>,
        /// Clear the partner
        #[arg(long)]
        no_partner: bool,
        /// New owning company
        #[arg(long)]
        company: Option<i64>,
    },

    /// Set a new plaintext password (clears the encrypted flag)
    SetPassword {
        /// Access id
        id: i64,
        /// Password value (omit for interactive prompt or stdin)
        value: Option<String>,
    },

    /// Replace passwords with random ones
    Generate {
        /// Access ids
        #[arg(required = true)]
        ids: Vec<i64>,
    },

    /// Encrypt stored passwords
    Encrypt {
        /// Access ids
        #[arg(required = true)]
        ids: Vec<i64>,
    },

    /// Decrypt and print stored passwords
    Decrypt {
        /// Access ids
        #[arg(required = true)]
        ids: Vec<i64>,
        /// Copy the password to the clipboard instead of printing it
        #[arg(long)]
        copy: bool,
    },

    /// Archive access records
    Archive {
        /// Access ids
        #[arg(required = true)]
        ids: Vec<i64>,
    },

    /// Restore archived access records
    Unarchive {
        /// Access ids
        #[arg(required = true)]
        ids: Vec<i64>,
    },

    /// Permanently delete an access record
    Delete {
        /// Access id
        id: i64,
        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },

    /// Manage SSL artifacts of an access record
    Ssl {
        #[command(subcommand)]
        action: SslAction,
    },

    /// Manage companies
    Company {
        #[command(subcommand)]
        action: CompanyAction,
    },

    /// Manage partners
    Partner {
        #[command(subcommand)]
        action: PartnerAction,
    },

    /// Manage sites
    Site {
        #[command(subcommand)]
        action: SiteAction,
    },

    /// Manage equipment
    Equipment {
        #[command(subcommand)]
        action: EquipmentAction,
    },

    /// View the audit log of credential operations
    Audit {
        /// Number of entries to show (default: 50)
        #[arg(long, default_value = "50")]
        last: usize,
        /// Show entries since a duration ago (e.g. 7d, 24h, 30m)
        #[arg(long)]
        since: Option<String>,
        /// Only entries about this access id
        #[arg(long)]
        access: Option<i64>,
    },

    /// Generate shell completion scripts
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

/// SSL artifact subcommands.
#[derive(clap::Subcommand)]
pub enum SslAction {
    /// Store a file in an artifact slot
    Attach {
        /// Access id
        id: i64,
        /// Artifact slot
        #[arg(value_enum)]
        kind: SslKind,
        /// File to read
        file: PathBuf,
    },

    /// Write an artifact to a file or stdout
    Export {
        /// Access id
        id: i64,
        /// Artifact slot
        #[arg(value_enum)]
        kind: SslKind,
        /// Output file path (prints to stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Clear an artifact slot
    Remove {
        /// Access id
        id: i64,
        /// Artifact slot
        #[arg(value_enum)]
        kind: SslKind,
    },

    /// List the artifacts of a record
    List {
        /// Access id
        id: i64,
    },
}

/// Company subcommands.
#[derive(clap::Subcommand)]
pub enum CompanyAction {
    /// Add a company
    Add { name: String },
    /// List companies
    List,
    /// Delete a company without access records
    Delete { id: i64 },
}

/// Partner subcommands.
#[derive(clap::Subcommand)]
pub enum PartnerAction {
    /// Add a partner
    Add {
        name: String,
        /// Flag the partner as an IT manager
        #[arg(long)]
        it_manager: bool,
    },
    /// List partners
    List {
        /// Only IT managers
        #[arg(long)]
        it_managers: bool,
    },
    /// Delete a partner (links to it are cleared)
    Delete { id: i64 },
}

/// Site subcommands.
#[derive(clap::Subcommand)]
pub enum SiteAction {
    /// Add a site
    Add {
        name: String,
        #[arg(long)]
        company: Option<i64>,
    },
    /// List sites
    List,
    /// Delete a site nothing refers to
    Delete { id: i64 },
}

/// Equipment subcommands.
#[derive(clap::Subcommand)]
pub enum EquipmentAction {
    /// Add an equipment
    Add {
        name: String,
        #[arg(long)]
        partner: Option<i64>,
        #[arg(long)]
        site: Option<i64>,
    },
    /// List equipment
    List,
    /// Delete an equipment no access record refers to
    Delete { id: i64 },
}

// ---------------------------------------------------------------------------
// Shared helpers used by multiple commands
// ---------------------------------------------------------------------------

/// Load settings from the current directory, with `--data-dir` applied.
pub fn load_settings(cli: &Cli) -> Result<Settings> {
    let cwd = std::env::current_dir()?;
    let mut settings = Settings::load(&cwd)?;
    if let Some(dir) = &cli.data_dir {
        settings.data_dir.clone_from(dir);
    }
    Ok(settings)
}

/// Everything a command needs: settings, data directory and an open store.
pub struct Context {
    pub settings: Settings,
    pub data_dir: PathBuf,
    pub store: AccessStore,
}

impl Context {
    /// Log an audit event for this installation.
    pub fn audit(&self, op: &str, access_id: Option<i64>, details: Option<&str>) {
        crate::audit::log_audit(&self.data_dir, op, access_id, details);
    }
}

/// Open the store of an initialized installation.
pub fn open_context(cli: &Cli) -> Result<Context> {
    let cwd = std::env::current_dir()?;
    let settings = load_settings(cli)?;
    let data_dir = settings.data_path(&cwd);
    let store = AccessStore::open(&settings.database_path(&cwd), settings.store_options())?;
    Ok(Context {
        settings,
        data_dir,
        store,
    })
}

/// Read a password from one of three sources: inline value, piped stdin,
/// or an interactive prompt with confirmation.
///
/// Returns `Zeroizing<String>` so the password is wiped from memory on drop.
pub fn read_password(value: Option<&str>, prompt: &str) -> Result<Zeroizing<String>> {
    if let Some(v) = value {
        output::warning("Password provided on command line — it may appear in shell history.");
        return Ok(Zeroizing::new(v.to_string()));
    }

    if !io::stdin().is_terminal() {
        let mut buf = Zeroizing::new(String::new());
        io::stdin().read_to_string(&mut buf)?;
        let trimmed = Zeroizing::new(buf.trim_end_matches(['\r', '\n']).to_string());
        if trimmed.is_empty() {
            return Err(ItAccessError::CommandFailed("no password on stdin".into()));
        }
        return Ok(trimmed);
    }

    let pw = dialoguer::Password::new()
        .with_prompt(prompt)
        .with_confirmation("Confirm password", "Passwords do not match, try again")
        .interact()
        .map_err(|e| ItAccessError::CommandFailed(format!("password prompt: {e}")))?;
    Ok(Zeroizing::new(pw))
}

/// Ask for confirmation unless `force` is set.
pub fn confirm(prompt: &str, force: bool) -> Result<bool> {
    if force {
        return Ok(true);
    }
    dialoguer::Confirm::new()
        .with_prompt(prompt)
        .default(false)
        .interact()
        .map_err(|e| ItAccessError::CommandFailed(format!("confirm prompt: {e}")))
}

/// Format a list of ids as `#1, #2`.
pub fn format_ids(ids: &[i64]) -> String {
    ids.iter()
        .map(|id| format!("#{id}"))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Display a path relative to `base` when possible.
pub fn display_path(path: &Path, base: &Path) -> String {
    path.strip_prefix(base)
        .unwrap_or(path)
        .display()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_selection_commands() {
        let cli = Cli::try_parse_from(["itaccess", "encrypt", "1", "2", "3"]).unwrap();
        match cli.command {
            Commands::Encrypt { ids } => assert_eq!(ids, vec![1, 2, 3]),
            _ => panic!("expected encrypt"),
        }
    }

    #[test]
    fn selection_commands_require_ids() {
        assert!(Cli::try_parse_from(["itaccess", "decrypt"]).is_err());
        assert!(Cli::try_parse_from(["itaccess", "generate"]).is_err());
    }

    #[test]
    fn add_rejects_password_with_generate() {
        let result = Cli::try_parse_from([
            "itaccess", "add", "root", "--password", "x", "--generate",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn ssl_kind_parses_kebab_case() {
        let cli = Cli::try_parse_from(["itaccess", "ssl", "remove", "4", "private-key"]).unwrap();
        match cli.command {
            Commands::Ssl {
                action: SslAction::Remove { id, kind },
            } => {
                assert_eq!(id, 4);
                assert_eq!(kind, SslKind::PrivateKey);
            }
            _ => panic!("expected ssl remove"),
        }
    }

    #[test]
    fn completions_shell_is_validated_by_parser() {
        let cli = Cli::try_parse_from(["itaccess", "completions", "zsh"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Completions {
                shell: clap_complete::Shell::Zsh
            }
        ));
        assert!(Cli::try_parse_from(["itaccess", "completions", "csh"]).is_err());
    }

    #[test]
    fn format_ids_joins_with_hash() {
        assert_eq!(format_ids(&[1, 22]), "#1, #22");
    }
}
