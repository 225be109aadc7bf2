//! Shared building blocks for every establishment record kind.

use serde::{Deserialize, Serialize};

/// The five regulated establishment kinds tracked by the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EstablishmentKind {
    Pharmacy,
    Depot,
    Wholesaler,
    Agency,
    ManufacturingSite,
}

impl EstablishmentKind {
    pub const ALL: [EstablishmentKind; 5] = [
        EstablishmentKind::Pharmacy,
        EstablishmentKind::Depot,
        EstablishmentKind::Wholesaler,
        EstablishmentKind::Agency,
        EstablishmentKind::ManufacturingSite,
    ];

    /// Prefix baked into every generated record code.
    pub fn code_prefix(self) -> &'static str {
        match self {
            EstablishmentKind::Pharmacy => "off",
            EstablishmentKind::Depot => "dep",
            EstablishmentKind::Wholesaler => "gros",
            EstablishmentKind::Agency => "agen",
            EstablishmentKind::ManufacturingSite => "eta",
        }
    }

    /// Key of the per-kind counter row in `code_sequences`.
    pub fn sequence_key(self) -> &'static str {
        match self {
            EstablishmentKind::Pharmacy => "pharmacy",
            EstablishmentKind::Depot => "depot",
            EstablishmentKind::Wholesaler => "wholesaler",
            EstablishmentKind::Agency => "agency",
            EstablishmentKind::ManufacturingSite => "manufacturing",
        }
    }

    /// SQLite table holding records of this kind.
    pub fn table(self) -> &'static str {
        match self {
            EstablishmentKind::Pharmacy => "pharmacies",
            EstablishmentKind::Depot => "depots",
            EstablishmentKind::Wholesaler => "wholesalers",
            EstablishmentKind::Agency => "agencies",
            EstablishmentKind::ManufacturingSite => "manufacturing_sites",
        }
    }

    /// Human-readable label used in operator-facing messages.
    pub fn label(self) -> &'static str {
        match self {
            EstablishmentKind::Pharmacy => "pharmacy",
            EstablishmentKind::Depot => "depot",
            EstablishmentKind::Wholesaler => "wholesaler",
            EstablishmentKind::Agency => "promotion agency",
            EstablishmentKind::ManufacturingSite => "manufacturing site",
        }
    }
}

/// A latitude/longitude pair. Coordinates are always stored together: a
/// record either has both or has neither.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    /// Display form shown on record sheets: latitude, longitude, trailing
    /// comma included (legacy sheet format).
    pub fn display_string(&self) -> String {
        format!("{},{},", self.latitude, self.longitude)
    }

    /// Parse a combined free-text coordinate value.
    ///
    /// The combined column carries longitude FIRST, latitude second, which
    /// is the reverse of the dedicated LATITUDE/LONGITUDE columns. Source
    /// files are produced that way; do not "fix" the order here.
    pub fn from_combined(raw: &str) -> Option<GeoPoint> {
        let parts: Vec<&str> = raw
            .split(',')
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .collect();
        if parts.len() < 2 {
            return None;
        }
        let longitude: f64 = parts[0].parse().ok()?;
        let latitude: f64 = parts[1].parse().ok()?;
        Some(GeoPoint {
            latitude,
            longitude,
        })
    }
}

/// Geographic footprint and shared administrative fields carried by every
/// establishment kind.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SiteProfile {
    pub region_id: i64,
    /// Must belong to `region_id`; re-checked on every save.
    pub department_id: i64,
    /// Must belong to `department_id`; re-checked on every save.
    pub commune_id: i64,
    /// Quartier / village / hameau.
    pub locality: String,
    /// Exact street address.
    pub address: String,
    pub coordinates: Option<GeoPoint>,
    pub observations: Option<String>,
    /// Records are deactivated rather than deleted.
    pub active: bool,
    pub photo: Option<Vec<u8>>,
}

impl SiteProfile {
    /// Create a profile with the required references and address fields.
    pub fn new(
        region_id: i64,
        department_id: i64,
        commune_id: i64,
        locality: String,
        address: String,
    ) -> Self {
        Self {
            region_id,
            department_id,
            commune_id,
            locality,
            address,
            coordinates: None,
            observations: None,
            active: true,
            photo: None,
        }
    }

    /// Display string combining the coordinates, or None when unset.
    pub fn geolocation_display(&self) -> Option<String> {
        self.coordinates.as_ref().map(GeoPoint::display_string)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_prefixes() {
        assert_eq!(EstablishmentKind::Pharmacy.code_prefix(), "off");
        assert_eq!(EstablishmentKind::Depot.code_prefix(), "dep");
        assert_eq!(EstablishmentKind::Wholesaler.code_prefix(), "gros");
        assert_eq!(EstablishmentKind::Agency.code_prefix(), "agen");
        assert_eq!(EstablishmentKind::ManufacturingSite.code_prefix(), "eta");
    }

    #[test]
    fn test_geopoint_display() {
        let point = GeoPoint {
            latitude: 14.7,
            longitude: -17.4,
        };
        assert_eq!(point.display_string(), "14.7,-17.4,");
    }

    #[test]
    fn test_combined_parse_is_longitude_first() {
        let point = GeoPoint::from_combined("-17.4,14.7").unwrap();
        assert_eq!(point.longitude, -17.4);
        assert_eq!(point.latitude, 14.7);
    }

    #[test]
    fn test_combined_parse_tolerates_trailing_comma() {
        let point = GeoPoint::from_combined(" -17.4 , 14.7 ,").unwrap();
        assert_eq!(point.longitude, -17.4);
        assert_eq!(point.latitude, 14.7);
    }

    #[test]
    fn test_combined_parse_rejects_garbage() {
        assert!(GeoPoint::from_combined("").is_none());
        assert!(GeoPoint::from_combined("14.7").is_none());
        assert!(GeoPoint::from_combined("north,south").is_none());
    }

    #[test]
    fn test_profile_defaults() {
        let profile = SiteProfile::new(1, 2, 3, "Plateau".into(), "12 Rue Carnot".into());
        assert!(profile.active);
        assert!(profile.coordinates.is_none());
        assert!(profile.geolocation_display().is_none());
    }
}
