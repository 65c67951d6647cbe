//! Values prefilled on an access record created from an equipment.

use crate::store::models::Equipment;

/// Partner and site a new access record starts with.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AccessDefaults {
    pub partner_id: Option<i64>,
    pub site_id: Option<i64>,
}

impl AccessDefaults {
    /// Defaults for a record created in the context of `equipment`.
    ///
    /// Without an equipment both fields stay unset.
    pub fn from_equipment(equipment: Option<&Equipment>) -> Self {
        match equipment {
            Some(e) => Self {
                partner_id: e.partner_id,
                site_id: e.site_id,
            },
            None => Self::default(),
        }
    }
}
