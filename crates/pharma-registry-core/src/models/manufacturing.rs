//! Pharmaceutical manufacturing site records.

use serde::{Deserialize, Serialize};

use super::SiteProfile;

/// Manufacturing site: the shared footprint plus production staffing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ManufacturingSite {
    pub id: Option<i64>,
    /// Registry code (`eta-NNNN`), immutable after creation.
    pub code: Option<String>,
    pub name: String,
    pub profile: SiteProfile,
    pub phone: String,
    pub opening_year: i32,
    pub manager_name: String,
    pub pharmacist_staff: u32,
    pub non_pharmacist_staff: u32,
    pub security_staff: u32,
    pub hygiene_staff: u32,
    pub revenue: f64,
}

impl ManufacturingSite {
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
            pharmacist_staff: 0,
            non_pharmacist_staff: 0,
            security_staff: 0,
            hygiene_staff: 0,
            revenue: 0.0,
        }
    }
}
