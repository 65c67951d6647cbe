//! `itaccess init` — create the database and the installation secret.
//!
//! This is the one-time setup step: it generates the passphrase and salt
//! every access key is derived from.  Running it again is harmless; an
//! existing secret is never replaced.

use std::fs;

use crate::cli::output;
use crate::cli::{display_path, load_settings, Cli};
use crate::errors::Result;
use crate::store::AccessStore;

/// Execute the `init` command.
pub fn execute(cli: &Cli) -> Result<()> {
    let cwd = std::env::current_dir()?;
    let settings = load_settings(cli)?;
    let data_dir = settings.data_path(&cwd);

    // 1. Create the data directory if it doesn't exist.
    if !data_dir.exists() {
        fs::create_dir_all(&data_dir)?;
        output::info(&format!(
            "Created data directory: {}",
            display_path(&data_dir, &cwd)
        ));
    }

    // 2. Create the database (or re-open an existing one).
    let db_path = settings.database_path(&cwd);
    let existed = db_path.exists();
    let mut store = AccessStore::create(&db_path, settings.store_options())?;
    if !existed {
        output::success(&format!("Database created at {}", display_path(&db_path, &cwd)));
    }

    // 3. Make sure the default company exists.
    let company_id = store.default_company_id()?;

    // 4. Generate the installation secret (first run only).
    if store.bootstrap_secret()? {
        output::success("Installation secret generated.");
        output::warning("Back up the database: without it encrypted passwords cannot be recovered.");
        crate::audit::log_audit(&data_dir, "init", None, Some("secret created"));
    } else {
        output::info("Installation secret already present — left unchanged.");
    }

    output::info(&format!(
        "Default company: '{}' (#{company_id})",
        settings.default_company
    ));
    output::tip("Run `itaccess equipment add <NAME>` to register equipment.");
    output::tip("Run `itaccess add <USERNAME> --equipment <ID> --generate` to add an access.");

    Ok(())
}
