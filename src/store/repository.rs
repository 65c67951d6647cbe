//! High-level record operations used by CLI commands.
//!
//! `AccessStore` wraps the SQLite connection, the installation secret and
//! the access-record logic so the rest of the application works with calls
//! like `store.encrypt_passwords(&[3, 4])`.
//!
//! Operations on a selection of records run in one transaction: either
//! every selected record is updated or none is.

use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use super::db;
use super::models::{Company, Equipment, NewEquipment, Partner, Site};
use super::params::{self, SecretState};
use crate::access::{Access, NewAccess, RevealedPassword, SslArtifact, SslKind};
use crate::crypto::password::DEFAULT_PASSWORD_LEN;
use crate::crypto::AccessKey;
use crate::errors::{ItAccessError, Result};

const ACCESS_COLUMNS: &str = "id, company_id, equipment_id, site_id, name, password, encrypted,
     partner_id, active, created_at, updated_at";

/// Tunables taken from `Settings`.
#[derive(Debug, Clone)]
pub struct StoreOptions {
    /// Name of the company new records belong to by default.
    pub default_company: String,
    /// Length of generated passwords.
    pub password_length: usize,
    /// Maximum token age accepted on decrypt; `None` disables the check.
    pub token_ttl_secs: Option<u64>,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            default_company: "My Company".to_string(),
            password_length: DEFAULT_PASSWORD_LEN,
            token_ttl_secs: None,
        }
    }
}

/// The main store handle.  Create one with `AccessStore::create`,
/// `AccessStore::open` or `AccessStore::open_in_memory`.
pub struct AccessStore {
    conn: Connection,
    options: StoreOptions,
}

impl AccessStore {
    // ------------------------------------------------------------------
    // Construction
    // ------------------------------------------------------------------

    /// Create (or re-open) the database at `path`.
    pub fn create(path: &Path, options: StoreOptions) -> Result<Self> {
        let conn = db::create(path)?;
        Ok(Self {
            conn,
            options,
        })
    }

    /// Open an existing database at `path`.
    pub fn open(path: &Path, options: StoreOptions) -> Result<Self> {
        let conn = db::open(path)?;
        Ok(Self {
            conn,
            options,
        })
    }

    /// Open a private in-memory store.
    pub fn open_in_memory(options: StoreOptions) -> Result<Self> {
        Ok(Self {
            conn: db::open_in_memory()?,
            options,
        })
    }

    // ------------------------------------------------------------------
    // Installation secret
    // ------------------------------------------------------------------

    /// Generate the installation secret if it does not exist yet.
    ///
    /// Returns `true` if this call created it.
    pub fn bootstrap_secret(&mut self) -> Result<bool> {
        Ok(params::load_or_bootstrap(&mut self.conn)?.created)
    }

    /// Returns `true` if the installation secret exists.
    pub fn has_secret(&self) -> Result<bool> {
        params::secret_exists(&self.conn)
    }

    /// Derive the access key, bootstrapping the secret on first use.
    pub fn access_key(&mut self) -> Result<AccessKey> {
        let state: SecretState = params::load_or_bootstrap(&mut self.conn)?;
        state.derive_key()
    }

    // ------------------------------------------------------------------
    // Companies
    // ------------------------------------------------------------------

    pub fn add_company(&self, name: &str) -> Result<i64> {
        let name = required_name("company name", name)?;
        self.conn
            .execute("INSERT INTO company (name) VALUES (?1)", [name])?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Return the id of the company named `name`, creating it if needed.
    pub fn ensure_company(&self, name: &str) -> Result<i64> {
        let name = required_name("company name", name)?;
        let existing: Option<i64> = self
            .conn
            .query_row("SELECT id FROM company WHERE name = ?1", [name], |row| {
                row.get(0)
            })
            .optional()?;
        match existing {
            Some(id) => Ok(id),
            None => self.add_company(name),
        }
    }

    /// The id of the configured default company, created on first use.
    pub fn default_company_id(&self) -> Result<i64> {
        self.ensure_company(&self.options.default_company)
    }

    pub fn company(&self, id: i64) -> Result<Company> {
        self.conn
            .query_row(
                "SELECT id, name FROM company WHERE id = ?1",
                [id],
                Company::from_row,
            )
            .optional()?
            .ok_or(ItAccessError::RecordNotFound {
                model: "Company",
                id,
            })
    }

    pub fn companies(&self) -> Result<Vec<Company>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name FROM company ORDER BY name")?;
        let rows = stmt.query_map([], Company::from_row)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    pub fn delete_company(&self, id: i64) -> Result<()> {
        self.company(id)?;
        let site_refs: i64 = self.conn.query_row(
            "SELECT count(*) FROM site WHERE company_id = ?1",
            [id],
            |row| row.get(0),
        )?;
        if site_refs > 0 || self.count_references("company_id", id)? > 0 {
            return Err(ItAccessError::ReferenceRestricted {
                model: "Company",
                id,
            });
        }
        self.conn.execute("DELETE FROM company WHERE id = ?1", [id])?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Partners
    // ------------------------------------------------------------------

    pub fn add_partner(&self, name: &str, manage_it: bool) -> Result<i64> {
        let name = required_name("partner name", name)?;
        self.conn.execute(
            "INSERT INTO partner (name, manage_it) VALUES (?1, ?2)",
            params![name, manage_it],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn partner(&self, id: i64) -> Result<Partner> {
        self.conn
            .query_row(
                "SELECT id, name, manage_it FROM partner WHERE id = ?1",
                [id],
                Partner::from_row,
            )
            .optional()?
            .ok_or(ItAccessError::RecordNotFound {
                model: "Partner",
                id,
            })
    }

    /// List partners, optionally only those flagged as IT managers.
    pub fn partners(&self, it_managers_only: bool) -> Result<Vec<Partner>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, manage_it FROM partner
             WHERE manage_it = 1 OR ?1 = 0
             ORDER BY name",
        )?;
        let rows = stmt.query_map([it_managers_only], Partner::from_row)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// Delete a partner; access records and equipment linked to it lose the link.
    pub fn delete_partner(&self, id: i64) -> Result<()> {
        self.partner(id)?;
        self.conn.execute("DELETE FROM partner WHERE id = ?1", [id])?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Sites
    // ------------------------------------------------------------------

    pub fn add_site(&self, name: &str, company_id: Option<i64>) -> Result<i64> {
        let name = required_name("site name", name)?;
        if let Some(cid) = company_id {
            self.company(cid)?;
        }
        self.conn.execute(
            "INSERT INTO site (name, company_id) VALUES (?1, ?2)",
            params![name, company_id],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn site(&self, id: i64) -> Result<Site> {
        self.conn
            .query_row(
                "SELECT id, name, company_id FROM site WHERE id = ?1",
                [id],
                Site::from_row,
            )
            .optional()?
            .ok_or(ItAccessError::RecordNotFound { model: "Site", id })
    }

    pub fn sites(&self) -> Result<Vec<Site>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, company_id FROM site ORDER BY name")?;
        let rows = stmt.query_map([], Site::from_row)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// Delete a site.  Fails while access records or equipment refer to it.
    pub fn delete_site(&self, id: i64) -> Result<()> {
        self.site(id)?;
        let equipment_refs: i64 = self.conn.query_row(
            "SELECT count(*) FROM equipment WHERE site_id = ?1",
            [id],
            |row| row.get(0),
        )?;
        if equipment_refs > 0 || self.count_references("site_id", id)? > 0 {
            return Err(ItAccessError::ReferenceRestricted { model: "Site", id });
        }
        self.conn.execute("DELETE FROM site WHERE id = ?1", [id])?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Equipment
    // ------------------------------------------------------------------

    pub fn add_equipment(&self, new: &NewEquipment) -> Result<i64> {
        let name = required_name("equipment name", &new.name)?;
        if let Some(pid) = new.partner_id {
            self.partner(pid)?;
        }
        if let Some(sid) = new.site_id {
            self.site(sid)?;
        }
        self.conn.execute(
            "INSERT INTO equipment (name, partner_id, site_id) VALUES (?1, ?2, ?3)",
            params![name, new.partner_id, new.site_id],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn equipment(&self, id: i64) -> Result<Equipment> {
        self.conn
            .query_row(
                "SELECT id, name, partner_id, site_id FROM equipment WHERE id = ?1",
                [id],
                Equipment::from_row,
            )
            .optional()?
            .ok_or(ItAccessError::RecordNotFound {
                model: "Equipment",
                id,
            })
    }

    pub fn equipments(&self) -> Result<Vec<Equipment>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, partner_id, site_id FROM equipment ORDER BY name")?;
        let rows = stmt.query_map([], Equipment::from_row)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// Delete an equipment.  Fails while access records refer to it,
    /// archived ones included.
    pub fn delete_equipment(&self, id: i64) -> Result<()> {
        self.equipment(id)?;
        if self.count_references("equipment_id", id)? > 0 {
            return Err(ItAccessError::ReferenceRestricted {
                model: "Equipment",
                id,
            });
        }
        self.conn
            .execute("DELETE FROM equipment WHERE id = ?1", [id])?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Access records
    // ------------------------------------------------------------------

    /// Create an access record and return its id.
    ///
    /// Partner and site defaults from an equipment context must already be
    /// applied by the caller (see `NewAccess::with_defaults`).
    pub fn create_access(&self, new: NewAccess) -> Result<i64> {
        let name = required_name("username", &new.name)?.to_string();
        let company_id = match new.company_id {
            Some(id) => id,
            None => self.default_company_id()?,
        };

        let now = Utc::now();
        let mut access = Access::from_parts(
            0,
            company_id,
            new.equipment_id,
            new.site_id,
            name,
            None,
            false,
            new.partner_id,
            true,
            now,
            now,
        );
        if let Some(pw) = new.password {
            access.set_password(pw);
        }
        self.validate_links(&access)?;

        self.conn.execute(
            "INSERT INTO access
                (company_id, equipment_id, site_id, name, password, encrypted,
                 partner_id, active, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                access.company_id,
                access.equipment_id,
                access.site_id,
                access.name,
                access.password(),
                access.is_encrypted(),
                access.partner_id,
                access.active,
                now.to_rfc3339(),
                now.to_rfc3339(),
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Fetch one access record, archived or not.
    pub fn access(&self, id: i64) -> Result<Access> {
        fetch_access(&self.conn, id)
    }

    /// List access records, sorted by id.  Archived records are included
    /// only when `include_archived` is set.
    pub fn list_access(&self, include_archived: bool) -> Result<Vec<Access>> {
        let sql = format!(
            "SELECT {ACCESS_COLUMNS} FROM access WHERE active = 1 OR ?1 = 1 ORDER BY id"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([include_archived], access_from_row)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// Access records linked to an equipment.
    pub fn access_for_equipment(&self, equipment_id: i64) -> Result<Vec<Access>> {
        let sql = format!(
            "SELECT {ACCESS_COLUMNS} FROM access WHERE equipment_id = ?1 AND active = 1 ORDER BY id"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([equipment_id], access_from_row)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// Write every field of `access` back to its row.
    pub fn save_access(&self, access: &Access) -> Result<()> {
        required_name("username", &access.name)?;
        self.validate_links(access)?;
        write_access(&self.conn, access)
    }

    /// Link a record to another equipment (or none) and save it.
    ///
    /// The partner is reset from the new equipment.
    pub fn set_equipment(&self, id: i64, equipment_id: Option<i64>) -> Result<Access> {
        let mut access = self.access(id)?;
        let equipment = equipment_id.map(|eid| self.equipment(eid)).transpose()?;
        access.on_equipment_change(equipment.as_ref());
        self.save_access(&access)?;
        Ok(access)
    }

    /// Store a new plaintext password on a record.
    pub fn set_password(&self, id: i64, plaintext: &str) -> Result<()> {
        let mut access = self.access(id)?;
        access.set_password(plaintext);
        write_access(&self.conn, &access)
    }

    /// Replace the password of every selected record with a generated one.
    pub fn generate_passwords(&mut self, ids: &[i64]) -> Result<()> {
        let len = self.options.password_length;
        let tx = self.conn.transaction()?;
        for &id in ids {
            let mut access = fetch_access(&tx, id)?;
            access.generate_password(len);
            write_access(&tx, &access)?;
        }
        tx.commit()?;
        Ok(())
    }

    /// Encrypt the password of every selected record.
    ///
    /// Fails with `AlreadyEncrypted` if any selected record is already
    /// encrypted; nothing is written in that case.
    pub fn encrypt_passwords(&mut self, ids: &[i64]) -> Result<()> {
        let key = self.access_key()?;
        let tx = self.conn.transaction()?;
        for &id in ids {
            let mut access = fetch_access(&tx, id)?;
            access.encrypt_password(&key)?;
            write_access(&tx, &access)?;
        }
        tx.commit()?;
        Ok(())
    }

    /// Decrypt the password of every selected record.
    ///
    /// Records are not modified: the plaintexts are only returned.
    pub fn decrypt_passwords(&mut self, ids: &[i64]) -> Result<Vec<RevealedPassword>> {
        let key = self.access_key()?;
        let ttl = self.options.token_ttl_secs;
        let mut revealed = Vec::with_capacity(ids.len());
        for &id in ids {
            let access = self.access(id)?;
            let password = access.decrypt_password(&key, ttl)?;
            revealed.push(RevealedPassword {
                id,
                username: access.name,
                password,
            });
        }
        Ok(revealed)
    }

    /// When the stored token of an encrypted record was created.
    pub fn encrypted_at(&mut self, id: i64) -> Result<DateTime<Utc>> {
        let key = self.access_key()?;
        self.access(id)?.encrypted_at(&key)
    }

    /// Archive (`active = false`) or restore the selected records.
    pub fn set_active(&mut self, ids: &[i64], active: bool) -> Result<()> {
        let tx = self.conn.transaction()?;
        for &id in ids {
            let mut access = fetch_access(&tx, id)?;
            access.active = active;
            write_access(&tx, &access)?;
        }
        tx.commit()?;
        Ok(())
    }

    /// Permanently delete a record and its SSL artifacts.
    pub fn delete_access(&self, id: i64) -> Result<()> {
        let deleted = self.conn.execute("DELETE FROM access WHERE id = ?1", [id])?;
        if deleted == 0 {
            return Err(ItAccessError::RecordNotFound {
                model: "Access",
                id,
            });
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // SSL artifacts
    // ------------------------------------------------------------------

    /// Store an artifact, replacing whatever the slot held.
    pub fn attach_ssl(
        &self,
        id: i64,
        kind: SslKind,
        filename: Option<&str>,
        data: &[u8],
    ) -> Result<()> {
        self.access(id)?;
        self.conn.execute(
            "INSERT INTO ssl_artifact (access_id, kind, filename, data) VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(access_id, kind) DO UPDATE
                SET filename = excluded.filename, data = excluded.data",
            params![id, kind.as_str(), filename, data],
        )?;
        self.touch(id)
    }

    pub fn ssl_artifact(&self, id: i64, kind: SslKind) -> Result<Option<SslArtifact>> {
        self.access(id)?;
        let artifact = self
            .conn
            .query_row(
                "SELECT filename, data FROM ssl_artifact WHERE access_id = ?1 AND kind = ?2",
                params![id, kind.as_str()],
                |row| {
                    Ok(SslArtifact {
                        kind,
                        filename: row.get(0)?,
                        data: row.get(1)?,
                    })
                },
            )
            .optional()?;
        Ok(artifact)
    }

    /// All artifacts of a record, in slot order.
    pub fn ssl_artifacts(&self, id: i64) -> Result<Vec<SslArtifact>> {
        let mut found = Vec::new();
        for kind in SslKind::ALL {
            if let Some(a) = self.ssl_artifact(id, kind)? {
                found.push(a);
            }
        }
        Ok(found)
    }

    /// Clear an artifact slot.  Returns `true` if it held something.
    pub fn remove_ssl(&self, id: i64, kind: SslKind) -> Result<bool> {
        self.access(id)?;
        let removed = self.conn.execute(
            "DELETE FROM ssl_artifact WHERE access_id = ?1 AND kind = ?2",
            params![id, kind.as_str()],
        )?;
        if removed > 0 {
            self.touch(id)?;
        }
        Ok(removed > 0)
    }

    // ------------------------------------------------------------------
    // Validation
    // ------------------------------------------------------------------

    /// Check that every reference of `access` exists and that a partner
    /// chosen for it is an IT manager.
    ///
    /// A partner equal to the linked equipment's partner came from the
    /// equipment and is accepted whatever its flag.
    fn validate_links(&self, access: &Access) -> Result<()> {
        self.company(access.company_id)?;
        let equipment = access
            .equipment_id
            .map(|eid| self.equipment(eid))
            .transpose()?;
        if let Some(sid) = access.site_id {
            self.site(sid)?;
        }
        if let Some(pid) = access.partner_id {
            let partner = self.partner(pid)?;
            let inherited = equipment.as_ref().is_some_and(|e| e.partner_id == Some(pid));
            if !partner.manage_it && !inherited {
                return Err(ItAccessError::PartnerNotItManager(pid));
            }
        }
        Ok(())
    }

    fn count_references(&self, column: &str, id: i64) -> Result<i64> {
        let sql = format!("SELECT count(*) FROM access WHERE {column} = ?1");
        Ok(self.conn.query_row(&sql, [id], |row| row.get(0))?)
    }

    fn touch(&self, id: i64) -> Result<()> {
        self.conn.execute(
            "UPDATE access SET updated_at = ?1 WHERE id = ?2",
            params![Utc::now().to_rfc3339(), id],
        )?;
        Ok(())
    }
}

// ----------------------------------------------------------------------
// Row helpers shared by the connection and transactions
// ----------------------------------------------------------------------

fn fetch_access(conn: &Connection, id: i64) -> Result<Access> {
    let sql = format!("SELECT {ACCESS_COLUMNS} FROM access WHERE id = ?1");
    conn.query_row(&sql, [id], access_from_row)
        .optional()?
        .ok_or(ItAccessError::RecordNotFound {
            model: "Access",
            id,
        })
}

fn write_access(conn: &Connection, access: &Access) -> Result<()> {
    conn.execute(
        "UPDATE access SET
            company_id = ?1, equipment_id = ?2, site_id = ?3, name = ?4,
            password = ?5, encrypted = ?6, partner_id = ?7, active = ?8,
            updated_at = ?9
         WHERE id = ?10",
        params![
            access.company_id,
            access.equipment_id,
            access.site_id,
            access.name,
            access.password(),
            access.is_encrypted(),
            access.partner_id,
            access.active,
            Utc::now().to_rfc3339(),
            access.id,
        ],
    )?;
    Ok(())
}

fn access_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Access> {
    let created_at = parse_timestamp(row, 9)?;
    let updated_at = parse_timestamp(row, 10)?;

    Ok(Access::from_parts(
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
        row.get(6)?,
        row.get(7)?,
        row.get(8)?,
        created_at,
        updated_at,
    ))
}

fn parse_timestamp(row: &rusqlite::Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let text: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&text)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
        })
}

fn required_name<'a>(field: &'static str, value: &'a str) -> Result<&'a str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ItAccessError::InvalidField {
            field,
            reason: "cannot be empty".into(),
        });
    }
    Ok(trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn corrupt_timestamp_is_a_row_error() {
        let store = AccessStore::open_in_memory(StoreOptions::default()).unwrap();
        let id = store
            .create_access(NewAccess {
                name: "admin".into(),
                ..NewAccess::default()
            })
            .unwrap();
        store
            .conn
            .execute(
                "UPDATE access SET created_at = 'yesterday' WHERE id = ?1",
                [id],
            )
            .unwrap();

        assert!(matches!(
            store.access(id),
            Err(ItAccessError::Database(
                rusqlite::Error::FromSqlConversionFailure(9, _, _)
            ))
        ));
        assert!(store.list_access(true).is_err());
    }
}
