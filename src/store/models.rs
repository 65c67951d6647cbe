//! Records an access entry refers to: companies, partners, sites and
//! equipment.  Only the fields the credential store reads are modelled.

use serde::Serialize;

/// The organization that owns access records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Company {
    pub id: i64,
    pub name: String,
}

/// A contact.  Only partners with `manage_it` set may be linked to an
/// access record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Partner {
    pub id: i64,
    pub name: String,
    pub manage_it: bool,
}

/// A physical or logical location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Site {
    pub id: i64,
    pub name: String,
    pub company_id: Option<i64>,
}

/// An equipment asset.  Its partner and site prefill new access records
/// created for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Equipment {
    pub id: i64,
    pub name: String,
    pub partner_id: Option<i64>,
    pub site_id: Option<i64>,
}

/// Fields for a new equipment record.
#[derive(Debug, Clone, Default)]
pub struct NewEquipment {
    pub name: String,
    pub partner_id: Option<i64>,
    pub site_id: Option<i64>,
}

impl Partner {
    pub(crate) fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            name: row.get(1)?,
            manage_it: row.get(2)?,
        })
    }
}

impl Company {
    pub(crate) fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            name: row.get(1)?,
        })
    }
}

impl Site {
    pub(crate) fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            name: row.get(1)?,
            company_id: row.get(2)?,
        })
    }
}

impl Equipment {
    pub(crate) fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            name: row.get(1)?,
            partner_id: row.get(2)?,
            site_id: row.get(3)?,
        })
    }
}
