//! Pharmacy database operations.

use rusqlite::{params, OptionalExtension, Row};

use super::establishments::{merge_coordinates, split_coordinates};
use super::{is_constraint_violation, Database, DbError, DbResult};
use crate::models::{
    AgeBracket, EstablishmentKind, Pharmacy, PharmacyStatus, Sex, SiteProfile,
};

const COLUMNS: &str = "id, code, name, region_id, department_id, commune_id, locality, address,
    latitude, longitude, observations, active, photo, phone, founding_year, operating_year,
    status, owner_name, board_number, owner_sex, owner_age_bracket, assistant_count,
    pharmacist_staff, non_pharmacist_staff, security_staff, hygiene_staff, revenue,
    currency, vehicle_count";

impl Database {
    /// Create a pharmacy: the geo references are validated, the next `off-`
    /// code is drawn and the record's id and code are filled in.
    pub fn create_pharmacy(&self, pharmacy: &mut Pharmacy) -> DbResult<()> {
        self.validate_site_profile(&pharmacy.profile)?;
        if pharmacy.code.is_none() {
            pharmacy.code = Some(self.next_code(EstablishmentKind::Pharmacy)?);
        }
        let (latitude, longitude) = split_coordinates(pharmacy.profile.coordinates);

        let result = self.conn.execute(
            r#"
            INSERT INTO pharmacies (
                code, name, region_id, department_id, commune_id, locality, address,
                latitude, longitude, observations, active, photo, phone, founding_year,
                operating_year, status, owner_name, board_number, owner_sex,
                owner_age_bracket, assistant_count, pharmacist_staff, non_pharmacist_staff,
                security_staff, hygiene_staff, revenue, currency, vehicle_count
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14,
                      ?15, ?16, ?17, ?18, ?19, ?20, ?21, ?22, ?23, ?24, ?25, ?26, ?27, ?28)
            "#,
            params![
                pharmacy.code,
                pharmacy.name,
                pharmacy.profile.region_id,
                pharmacy.profile.department_id,
                pharmacy.profile.commune_id,
                pharmacy.profile.locality,
                pharmacy.profile.address,
                latitude,
                longitude,
                pharmacy.profile.observations,
                pharmacy.profile.active,
                pharmacy.profile.photo,
                pharmacy.phone,
                pharmacy.founding_year,
                pharmacy.operating_year,
                pharmacy.status.map(PharmacyStatus::as_str),
                pharmacy.owner_name,
                pharmacy.board_number,
                pharmacy.owner_sex.as_str(),
                pharmacy.owner_age_bracket.as_str(),
                pharmacy.assistant_count,
                pharmacy.pharmacist_staff,
                pharmacy.non_pharmacist_staff,
                pharmacy.security_staff,
                pharmacy.hygiene_staff,
                pharmacy.revenue,
                pharmacy.currency,
                pharmacy.vehicle_count,
            ],
        );
        match result {
            Ok(_) => {
                pharmacy.id = Some(self.conn.last_insert_rowid());
                Ok(())
            }
            Err(e) if is_constraint_violation(&e) => Err(DbError::Constraint(format!(
                "pharmacy '{}' violates a constraint: {}",
                pharmacy.name, e
            ))),
            Err(e) => Err(e.into()),
        }
    }

    /// Overwrite an existing pharmacy. The code, photo and active flag are
    /// managed by their own operations and left untouched; the geo chain is
    /// re-validated on every call.
    pub fn update_pharmacy(&self, pharmacy: &Pharmacy) -> DbResult<bool> {
        let id = pharmacy.id.ok_or_else(|| {
            DbError::Constraint("cannot update a pharmacy that was never saved".into())
        })?;
        self.validate_site_profile(&pharmacy.profile)?;
        let (latitude, longitude) = split_coordinates(pharmacy.profile.coordinates);

        let rows_affected = self.conn.execute(
            r#"
            UPDATE pharmacies SET
                name = ?2, region_id = ?3, department_id = ?4, commune_id = ?5,
                locality = ?6, address = ?7, latitude = ?8, longitude = ?9,
                observations = ?10, phone = ?11, founding_year = ?12, operating_year = ?13,
                status = ?14, owner_name = ?15, board_number = ?16, owner_sex = ?17,
                owner_age_bracket = ?18, assistant_count = ?19, pharmacist_staff = ?20,
                non_pharmacist_staff = ?21, security_staff = ?22, hygiene_staff = ?23,
                revenue = ?24, currency = ?25, vehicle_count = ?26,
                updated_at = datetime('now')
            WHERE id = ?1
            "#,
            params![
                id,
                pharmacy.name,
                pharmacy.profile.region_id,
                pharmacy.profile.department_id,
                pharmacy.profile.commune_id,
                pharmacy.profile.locality,
                pharmacy.profile.address,
                latitude,
                longitude,
                pharmacy.profile.observations,
                pharmacy.phone,
                pharmacy.founding_year,
                pharmacy.operating_year,
                pharmacy.status.map(PharmacyStatus::as_str),
                pharmacy.owner_name,
                pharmacy.board_number,
                pharmacy.owner_sex.as_str(),
                pharmacy.owner_age_bracket.as_str(),
                pharmacy.assistant_count,
                pharmacy.pharmacist_staff,
                pharmacy.non_pharmacist_staff,
                pharmacy.security_staff,
                pharmacy.hygiene_staff,
                pharmacy.revenue,
                pharmacy.currency,
                pharmacy.vehicle_count,
            ],
        )?;
        Ok(rows_affected > 0)
    }

    /// Case-insensitive exact name lookup among active pharmacies.
    pub fn find_pharmacy_by_name(&self, name: &str) -> DbResult<Option<Pharmacy>> {
        let sql = format!(
            "SELECT {} FROM pharmacies WHERE name = ?1 COLLATE NOCASE AND active = 1 LIMIT 1",
            COLUMNS
        );
        self.conn
            .query_row(&sql, [name.trim()], read_row)
            .optional()?
            .map(TryInto::try_into)
            .transpose()
    }

    pub fn get_pharmacy(&self, id: i64) -> DbResult<Option<Pharmacy>> {
        let sql = format!("SELECT {} FROM pharmacies WHERE id = ?1", COLUMNS);
        self.conn
            .query_row(&sql, [id], read_row)
            .optional()?
            .map(TryInto::try_into)
            .transpose()
    }

    pub fn list_pharmacies(&self, active_only: bool) -> DbResult<Vec<Pharmacy>> {
        let sql = if active_only {
            format!("SELECT {} FROM pharmacies WHERE active = 1 ORDER BY name", COLUMNS)
        } else {
            format!("SELECT {} FROM pharmacies ORDER BY name", COLUMNS)
        };
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([], read_row)?;

        let mut pharmacies = Vec::new();
        for row in rows {
            pharmacies.push(row?.try_into()?);
        }
        Ok(pharmacies)
    }
}

/// Intermediate row struct for database mapping.
struct PharmacyRow {
    id: i64,
    code: String,
    name: String,
    region_id: i64,
    department_id: i64,
    commune_id: i64,
    locality: String,
    address: String,
    latitude: Option<f64>,
    longitude: Option<f64>,
    observations: Option<String>,
    active: bool,
    photo: Option<Vec<u8>>,
    phone: String,
    founding_year: i32,
    operating_year: i32,
    status: Option<String>,
    owner_name: String,
    board_number: String,
    owner_sex: String,
    owner_age_bracket: String,
    assistant_count: Option<u32>,
    pharmacist_staff: Option<u32>,
    non_pharmacist_staff: Option<u32>,
    security_staff: Option<u32>,
    hygiene_staff: Option<u32>,
    revenue: f64,
    currency: String,
    vehicle_count: Option<u32>,
}

fn read_row(row: &Row<'_>) -> rusqlite::Result<PharmacyRow> {
    Ok(PharmacyRow {
        id: row.get(0)?,
        code: row.get(1)?,
        name: row.get(2)?,
        region_id: row.get(3)?,
        department_id: row.get(4)?,
        commune_id: row.get(5)?,
        locality: row.get(6)?,
        address: row.get(7)?,
        latitude: row.get(8)?,
        longitude: row.get(9)?,
        observations: row.get(10)?,
        active: row.get(11)?,
        photo: row.get(12)?,
        phone: row.get(13)?,
        founding_year: row.get(14)?,
        operating_year: row.get(15)?,
        status: row.get(16)?,
        owner_name: row.get(17)?,
        board_number: row.get(18)?,
        owner_sex: row.get(19)?,
        owner_age_bracket: row.get(20)?,
        assistant_count: row.get(21)?,
        pharmacist_staff: row.get(22)?,
        non_pharmacist_staff: row.get(23)?,
        security_staff: row.get(24)?,
        hygiene_staff: row.get(25)?,
        revenue: row.get(26)?,
        currency: row.get(27)?,
        vehicle_count: row.get(28)?,
    })
}

impl TryFrom<PharmacyRow> for Pharmacy {
    type Error = DbError;

    fn try_from(row: PharmacyRow) -> Result<Self, Self::Error> {
        let owner_sex = Sex::from_code(&row.owner_sex)
            .ok_or_else(|| DbError::Constraint(format!("unknown sex code: {}", row.owner_sex)))?;
        let owner_age_bracket = AgeBracket::from_code(&row.owner_age_bracket).ok_or_else(|| {
            DbError::Constraint(format!("unknown age bracket code: {}", row.owner_age_bracket))
        })?;
        let status = row
            .status
            .as_deref()
            .map(|code| {
                PharmacyStatus::from_code(code)
                    .ok_or_else(|| DbError::Constraint(format!("unknown status code: {}", code)))
            })
            .transpose()?;

        Ok(Pharmacy {
            id: Some(row.id),
            code: Some(row.code),
            name: row.name,
            profile: SiteProfile {
                region_id: row.region_id,
                department_id: row.department_id,
                commune_id: row.commune_id,
                locality: row.locality,
                address: row.address,
                coordinates: merge_coordinates(row.latitude, row.longitude),
                observations: row.observations,
                active: row.active,
                photo: row.photo,
            },
            phone: row.phone,
            founding_year: row.founding_year,
            operating_year: row.operating_year,
            status,
            owner_name: row.owner_name,
            board_number: row.board_number,
            owner_sex,
            owner_age_bracket,
            assistant_count: row.assistant_count,
            pharmacist_staff: row.pharmacist_staff,
            non_pharmacist_staff: row.non_pharmacist_staff,
            security_staff: row.security_staff,
            hygiene_staff: row.hygiene_staff,
            revenue: row.revenue,
            currency: row.currency,
            vehicle_count: row.vehicle_count,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::GeoPoint;

    fn setup_db() -> (Database, SiteProfile) {
        let db = Database::open_in_memory().unwrap();
        let region = db.create_region("Dakar").unwrap();
        let dept = db.create_department("Dakar", region.id).unwrap();
        let commune = db.create_commune("Plateau", dept.id, region.id).unwrap();
        let profile = SiteProfile::new(
            region.id,
            dept.id,
            commune.id,
            "Plateau".into(),
            "12 Rue Carnot".into(),
        );
        (db, profile)
    }

    fn sample_pharmacy(profile: SiteProfile) -> Pharmacy {
        let mut pharmacy = Pharmacy::new(
            "Pharmacie du Plateau".into(),
            profile,
            "+221 33 821 00 00".into(),
            1998,
            1999,
            "Awa Ndiaye".into(),
            "ORD-4521".into(),
        );
        pharmacy.owner_sex = Sex::Feminine;
        pharmacy.owner_age_bracket = AgeBracket::From40To49;
        pharmacy.assistant_count = Some(2);
        pharmacy.revenue = 45_000_000.0;
        pharmacy
    }

    #[test]
    fn test_create_assigns_code_and_id() {
        let (db, profile) = setup_db();
        let mut pharmacy = sample_pharmacy(profile);

        db.create_pharmacy(&mut pharmacy).unwrap();
        assert_eq!(pharmacy.code.as_deref(), Some("off-0001"));
        assert!(pharmacy.id.is_some());
        assert!(pharmacy.is_registered());
    }

    #[test]
    fn test_round_trip() {
        let (db, mut profile) = setup_db();
        profile.coordinates = Some(GeoPoint {
            latitude: 14.67,
            longitude: -17.43,
        });
        profile.observations = Some("garde de nuit".into());
        let mut pharmacy = sample_pharmacy(profile);

        db.create_pharmacy(&mut pharmacy).unwrap();
        let stored = db.get_pharmacy(pharmacy.id.unwrap()).unwrap().unwrap();
        assert_eq!(stored, pharmacy);
    }

    #[test]
    fn test_create_rejects_incoherent_geo() {
        let (db, mut profile) = setup_db();
        let thies = db.create_region("Thiès").unwrap();
        profile.region_id = thies.id; // department still belongs to Dakar

        let mut pharmacy = sample_pharmacy(profile);
        let result = db.create_pharmacy(&mut pharmacy);
        assert!(matches!(result, Err(DbError::Validation(_))));
        assert!(db.find_pharmacy_by_name("Pharmacie du Plateau").unwrap().is_none());
    }

    #[test]
    fn test_find_by_name_case_insensitive_exact() {
        let (db, profile) = setup_db();
        let mut pharmacy = sample_pharmacy(profile);
        db.create_pharmacy(&mut pharmacy).unwrap();

        assert!(db
            .find_pharmacy_by_name("PHARMACIE DU PLATEAU")
            .unwrap()
            .is_some());
        assert!(db.find_pharmacy_by_name("Pharmacie du").unwrap().is_none());
    }

    #[test]
    fn test_update_keeps_code_and_revalidates() {
        let (db, profile) = setup_db();
        let mut pharmacy = sample_pharmacy(profile);
        db.create_pharmacy(&mut pharmacy).unwrap();
        let code = pharmacy.code.clone();

        pharmacy.phone = "+221 33 821 99 99".into();
        pharmacy.status = Some(PharmacyStatus::Transfer);
        assert!(db.update_pharmacy(&pharmacy).unwrap());

        let stored = db.get_pharmacy(pharmacy.id.unwrap()).unwrap().unwrap();
        assert_eq!(stored.code, code);
        assert_eq!(stored.phone, "+221 33 821 99 99");
        assert_eq!(stored.status, Some(PharmacyStatus::Transfer));

        // An incoherent geo change is rejected on update as well
        let thies = db.create_region("Thiès").unwrap();
        pharmacy.profile.region_id = thies.id;
        assert!(matches!(
            db.update_pharmacy(&pharmacy),
            Err(DbError::Validation(_))
        ));
    }

    #[test]
    fn test_update_unsaved_record_rejected() {
        let (db, profile) = setup_db();
        let pharmacy = sample_pharmacy(profile);
        assert!(matches!(
            db.update_pharmacy(&pharmacy),
            Err(DbError::Constraint(_))
        ));
    }
}
