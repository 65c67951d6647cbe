//! SQLite database holding access records, their references and the
//! installation's configuration parameters.
//!
//! Foreign keys are enforced on every connection so that equipment and
//! sites referenced by an access record cannot be deleted underneath it.

use std::path::Path;

use rusqlite::Connection;

use crate::errors::{ItAccessError, Result};

/// File name of the record database inside the data directory.
pub const DB_FILE_NAME: &str = "itaccess.db";

/// Open an existing database file.
///
/// Fails with `DatabaseNotFound` if the file does not exist, so a typo in
/// `--data-dir` never silently creates a second, empty installation.
pub fn open(path: &Path) -> Result<Connection> {
    if !path.exists() {
        return Err(ItAccessError::DatabaseNotFound(path.to_path_buf()));
    }
    let conn = Connection::open(path)?;
    prepare(&conn)?;
    Ok(conn)
}

/// Create (or re-open) the database file and make sure the schema exists.
pub fn create(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let conn = Connection::open(path)?;

    // Owner-only: the file holds the passphrase the access key derives from.
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let perms = std::fs::Permissions::from_mode(0o600);
        std::fs::set_permissions(path, perms)?;
    }

    prepare(&conn)?;
    Ok(conn)
}

/// Open a private in-memory database (used by tests and dry runs).
pub fn open_in_memory() -> Result<Connection> {
    let conn = Connection::open_in_memory()?;
    prepare(&conn)?;
    Ok(conn)
}

fn prepare(conn: &Connection) -> Result<()> {
    conn.pragma_update(None, "foreign_keys", "ON")?;
    run_migrations(conn)
}

/// Create or update tables.
fn run_migrations(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS config_parameter (
            key     TEXT PRIMARY KEY,
            value   TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS company (
            id      INTEGER PRIMARY KEY AUTOINCREMENT,
            name    TEXT NOT NULL UNIQUE
        );

        CREATE TABLE IF NOT EXISTS partner (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            name        TEXT NOT NULL,
            manage_it   INTEGER NOT NULL DEFAULT 0
        );

        CREATE TABLE IF NOT EXISTS site (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            name        TEXT NOT NULL,
            company_id  INTEGER REFERENCES company(id) ON DELETE RESTRICT
        );

        CREATE TABLE IF NOT EXISTS equipment (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            name        TEXT NOT NULL,
            partner_id  INTEGER REFERENCES partner(id) ON DELETE SET NULL,
            site_id     INTEGER REFERENCES site(id) ON DELETE RESTRICT
        );

        CREATE TABLE IF NOT EXISTS access (
            id              INTEGER PRIMARY KEY AUTOINCREMENT,
            company_id      INTEGER NOT NULL REFERENCES company(id) ON DELETE RESTRICT,
            equipment_id    INTEGER REFERENCES equipment(id) ON DELETE RESTRICT,
            site_id         INTEGER REFERENCES site(id) ON DELETE RESTRICT,
            name            TEXT NOT NULL,
            password        TEXT,
            encrypted       INTEGER NOT NULL DEFAULT 0,
            partner_id      INTEGER REFERENCES partner(id) ON DELETE SET NULL,
            active          INTEGER NOT NULL DEFAULT 1,
            created_at      TEXT NOT NULL,
            updated_at      TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS ssl_artifact (
            access_id   INTEGER NOT NULL REFERENCES access(id) ON DELETE CASCADE,
            kind        TEXT NOT NULL,
            filename    TEXT,
            data        BLOB NOT NULL,
            PRIMARY KEY (access_id, kind)
        );

        CREATE INDEX IF NOT EXISTS idx_access_equipment ON access(equipment_id);
        CREATE INDEX IF NOT EXISTS idx_access_site ON access(site_id);
        ",
    )?;
    Ok(())
}
