//! Controlled vocabularies shared by the establishment records.
//!
//! Each enum maps to a short stored code and offers a lenient `from_raw`
//! coercion for the free-text values found in source spreadsheets.

use serde::{Deserialize, Serialize};

/// Sex of a responsible person, as recorded on the establishment sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Sex {
    Feminine,
    Masculine,
    Unspecified,
}

impl Sex {
    pub fn as_str(self) -> &'static str {
        match self {
            Sex::Feminine => "f",
            Sex::Masculine => "m",
            Sex::Unspecified => "na",
        }
    }

    pub fn from_code(code: &str) -> Option<Sex> {
        match code {
            "f" => Some(Sex::Feminine),
            "m" => Some(Sex::Masculine),
            "na" => Some(Sex::Unspecified),
            _ => None,
        }
    }

    /// Coerce a free-text value: first letter decides, anything else is
    /// unspecified.
    pub fn from_raw(value: &str) -> Sex {
        let value = value.trim().to_lowercase();
        if value.starts_with('f') {
            Sex::Feminine
        } else if value.starts_with('m') {
            Sex::Masculine
        } else {
            Sex::Unspecified
        }
    }
}

/// Age bracket of a pharmacy owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AgeBracket {
    Under30,
    From30To39,
    From40To49,
    From50To59,
    Over60,
    Unspecified,
}

impl AgeBracket {
    pub fn as_str(self) -> &'static str {
        match self {
            AgeBracket::Under30 => "under_30",
            AgeBracket::From30To39 => "30_39",
            AgeBracket::From40To49 => "40_49",
            AgeBracket::From50To59 => "50_59",
            AgeBracket::Over60 => "60_plus",
            AgeBracket::Unspecified => "na",
        }
    }

    pub fn from_code(code: &str) -> Option<AgeBracket> {
        match code {
            "under_30" => Some(AgeBracket::Under30),
            "30_39" => Some(AgeBracket::From30To39),
            "40_49" => Some(AgeBracket::From40To49),
            "50_59" => Some(AgeBracket::From50To59),
            "60_plus" => Some(AgeBracket::Over60),
            "na" => Some(AgeBracket::Unspecified),
            _ => None,
        }
    }

    /// Coerce a free-text bracket ("40 - 49 ans", "60 et plus", ...) by
    /// digit substring, checked in source order.
    pub fn from_raw(value: &str) -> AgeBracket {
        let value = value.trim().to_lowercase();
        if value.is_empty() {
            return AgeBracket::Unspecified;
        }
        const STEPS: [(&str, AgeBracket); 9] = [
            ("18", AgeBracket::Under30),
            ("25", AgeBracket::Under30),
            ("30", AgeBracket::From30To39),
            ("35", AgeBracket::From30To39),
            ("40", AgeBracket::From40To49),
            ("45", AgeBracket::From40To49),
            ("50", AgeBracket::From50To59),
            ("55", AgeBracket::From50To59),
            ("60", AgeBracket::Over60),
        ];
        for (needle, bracket) in STEPS {
            if value.contains(needle) {
                return bracket;
            }
        }
        if value.contains("plus") {
            return AgeBracket::Over60;
        }
        AgeBracket::Unspecified
    }
}

/// How a pharmacy came to exist under its current ownership.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PharmacyStatus {
    Transfer,
    Buyout,
    Creation,
    Other,
}

impl PharmacyStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            PharmacyStatus::Transfer => "transfer",
            PharmacyStatus::Buyout => "buyout",
            PharmacyStatus::Creation => "creation",
            PharmacyStatus::Other => "other",
        }
    }

    pub fn from_code(code: &str) -> Option<PharmacyStatus> {
        match code {
            "transfer" => Some(PharmacyStatus::Transfer),
            "buyout" => Some(PharmacyStatus::Buyout),
            "creation" => Some(PharmacyStatus::Creation),
            "other" => Some(PharmacyStatus::Other),
            _ => None,
        }
    }

    /// Coerce a free-text status ("Transfert", "rachat", ...).
    pub fn from_raw(value: &str) -> PharmacyStatus {
        let value = value.trim().to_lowercase();
        if value.contains("trans") {
            PharmacyStatus::Transfer
        } else if value.contains("rach") {
            PharmacyStatus::Buyout
        } else if value.contains("cr") {
            PharmacyStatus::Creation
        } else {
            PharmacyStatus::Other
        }
    }
}
