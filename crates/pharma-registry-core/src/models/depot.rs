//! Community drug depot records.

use serde::{Deserialize, Serialize};

use super::{Sex, SiteProfile};

/// Depot record: the geographic footprint plus manager metadata.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Depot {
    pub id: Option<i64>,
    /// Registry code (`dep-NNNN`), immutable after creation.
    pub code: Option<String>,
    pub name: String,
    pub profile: SiteProfile,
    pub phone: String,
    pub opening_year: i32,
    /// Responsable / dépositaire.
    pub manager_name: String,
    pub manager_sex: Sex,
}

impl Depot {
    pub fn new(
        name: String,
        profile: SiteProfile,
        phone: String,
        opening_year: i32,
        manager_name: String,
    ) -> Self {
        Self {
            id: None,
            code: None,
            name,
            profile,
            phone,
            opening_year,
            manager_name,
            manager_sex: Sex::Unspecified,
        }
    }
}
