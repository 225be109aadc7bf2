//! Community pharmacy (officine) records.

use serde::{Deserialize, Serialize};

use super::{AgeBracket, PharmacyStatus, Sex, SiteProfile};

/// Pharmacy record enriched with workforce and business indicators.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Pharmacy {
    /// Database id; None until the record has been created.
    pub id: Option<i64>,
    /// Registry code (`off-NNNN`), assigned once at creation, never changed.
    pub code: Option<String>,
    pub name: String,
    pub profile: SiteProfile,
    pub phone: String,
    pub founding_year: i32,
    pub operating_year: i32,
    pub status: Option<PharmacyStatus>,
    /// Titulaire / responsible pharmacist.
    pub owner_name: String,
    /// Registration number with the pharmacists' board.
    pub board_number: String,
    pub owner_sex: Sex,
    pub owner_age_bracket: AgeBracket,
    pub assistant_count: Option<u32>,
    pub pharmacist_staff: Option<u32>,
    pub non_pharmacist_staff: Option<u32>,
    pub security_staff: Option<u32>,
    pub hygiene_staff: Option<u32>,
    pub revenue: f64,
    pub currency: String,
    pub vehicle_count: Option<u32>,
}

impl Pharmacy {
    /// Create an unsaved pharmacy with the required fields.
    pub fn new(
        name: String,
        profile: SiteProfile,
        phone: String,
        founding_year: i32,
        operating_year: i32,
        owner_name: String,
        board_number: String,
    ) -> Self {
        Self {
            id: None,
            code: None,
            name,
            profile,
            phone,
            founding_year,
            operating_year,
            status: None,
            owner_name,
            board_number,
            owner_sex: Sex::Unspecified,
            owner_age_bracket: AgeBracket::Unspecified,
            assistant_count: None,
            pharmacist_staff: None,
            non_pharmacist_staff: None,
            security_staff: None,
            hygiene_staff: None,
            revenue: 0.0,
            currency: "XOF".into(),
            vehicle_count: None,
        }
    }

    /// Whether the record has been persisted (and therefore coded).
    pub fn is_registered(&self) -> bool {
        self.code.is_some()
    }
}
