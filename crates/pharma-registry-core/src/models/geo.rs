//! Geographic reference hierarchy: region, department, commune.

use serde::{Deserialize, Serialize};

/// Top-level administrative area. Every establishment sits in exactly one.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Region {
    pub id: i64,
    /// Unique across the whole table; lookups are case-insensitive exact.
    pub name: String,
}

/// Intermediate level, owned by a region.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Department {
    pub id: i64,
    /// Unique within its region.
    pub name: String,
    pub region_id: i64,
}

/// Lowest administrative unit, tied to a department and (redundantly, for
/// query convenience) to that department's region. The redundant reference
/// must always agree with the department's own region.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Commune {
    pub id: i64,
    /// Unique within its department.
    pub name: String,
    pub region_id: i64,
    pub department_id: i64,
}
