//! Pharmaceutical promotion agency records.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::SiteProfile;

/// Agency record including regulatory identifiers and staffing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Agency {
    pub id: Option<i64>,
    /// Registry code (`agen-NNNN`), immutable after creation.
    pub code: Option<String>,
    pub name: String,
    pub profile: SiteProfile,
    pub phone: String,
    pub opening_year: i32,
    pub license_number: String,
    pub license_date: NaiveDate,
    pub responsible_pharmacist: String,
    pub pharmacist_staff: u32,
    pub non_pharmacist_staff: u32,
    pub revenue: f64,
    pub currency: String,
    pub represented_laboratory: Option<String>,
}

impl Agency {
    pub fn new(
        name: String,
        profile: SiteProfile,
        phone: String,
        opening_year: i32,
        license_number: String,
        license_date: NaiveDate,
        responsible_pharmacist: String,
    ) -> Self {
        Self {
            id: None,
            code: None,
            name,
            profile,
            phone,
            opening_year,
            license_number,
            license_date,
            responsible_pharmacist,
            pharmacist_staff: 0,
            non_pharmacist_staff: 0,
            revenue: 0.0,
            currency: "XOF".into(),
            represented_laboratory: None,
        }
    }
}
