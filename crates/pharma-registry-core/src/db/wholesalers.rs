//! Wholesaler database operations.

use rusqlite::{params, OptionalExtension, Row};

use super::establishments::{merge_coordinates, split_coordinates};
use super::{is_constraint_violation, Database, DbError, DbResult};
use crate::models::{EstablishmentKind, SiteProfile, Wholesaler};

const COLUMNS: &str = "id, code, name, region_id, department_id, commune_id, locality, address,
    latitude, longitude, observations, active, photo, phone, opening_year, manager_name,
    pharmacist_staff, non_pharmacist_staff, security_staff, hygiene_staff, revenue,
    vehicle_count";

impl Database {
    /// Create a wholesaler, validating the geo chain and drawing the next
    /// `gros-` code.
    pub fn create_wholesaler(&self, wholesaler: &mut Wholesaler) -> DbResult<()> {
        self.validate_site_profile(&wholesaler.profile)?;
        if wholesaler.code.is_none() {
            wholesaler.code = Some(self.next_code(EstablishmentKind::Wholesaler)?);
        }
        let (latitude, longitude) = split_coordinates(wholesaler.profile.coordinates);

        let result = self.conn.execute(
            r#"
            INSERT INTO wholesalers (
                code, name, region_id, department_id, commune_id, locality, address,
                latitude, longitude, observations, active, photo, phone, opening_year,
                manager_name, pharmacist_staff, non_pharmacist_staff, security_staff,
                hygiene_staff, revenue, vehicle_count
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14,
                      ?15, ?16, ?17, ?18, ?19, ?20, ?21)
            "#,
            params![
                wholesaler.code,
                wholesaler.name,
                wholesaler.profile.region_id,
                wholesaler.profile.department_id,
                wholesaler.profile.commune_id,
                wholesaler.profile.locality,
                wholesaler.profile.address,
                latitude,
                longitude,
                wholesaler.profile.observations,
                wholesaler.profile.active,
                wholesaler.profile.photo,
                wholesaler.phone,
                wholesaler.opening_year,
                wholesaler.manager_name,
                wholesaler.pharmacist_staff,
                wholesaler.non_pharmacist_staff,
                wholesaler.security_staff,
                wholesaler.hygiene_staff,
                wholesaler.revenue,
                wholesaler.vehicle_count,
            ],
        );
        match result {
            Ok(_) => {
                wholesaler.id = Some(self.conn.last_insert_rowid());
                Ok(())
            }
            Err(e) if is_constraint_violation(&e) => Err(DbError::Constraint(format!(
                "wholesaler '{}' violates a constraint: {}",
                wholesaler.name, e
            ))),
            Err(e) => Err(e.into()),
        }
    }

    /// Overwrite an existing wholesaler; code, photo and active flag untouched.
    pub fn update_wholesaler(&self, wholesaler: &Wholesaler) -> DbResult<bool> {
        let id = wholesaler.id.ok_or_else(|| {
            DbError::Constraint("cannot update a wholesaler that was never saved".into())
        })?;
        self.validate_site_profile(&wholesaler.profile)?;
        let (latitude, longitude) = split_coordinates(wholesaler.profile.coordinates);

        let rows_affected = self.conn.execute(
            r#"
            UPDATE wholesalers SET
                name = ?2, region_id = ?3, department_id = ?4, commune_id = ?5,
                locality = ?6, address = ?7, latitude = ?8, longitude = ?9,
                observations = ?10, phone = ?11, opening_year = ?12, manager_name = ?13,
                pharmacist_staff = ?14, non_pharmacist_staff = ?15, security_staff = ?16,
                hygiene_staff = ?17, revenue = ?18, vehicle_count = ?19,
                updated_at = datetime('now')
            WHERE id = ?1
            "#,
            params![
                id,
                wholesaler.name,
                wholesaler.profile.region_id,
                wholesaler.profile.department_id,
                wholesaler.profile.commune_id,
                wholesaler.profile.locality,
                wholesaler.profile.address,
                latitude,
                longitude,
                wholesaler.profile.observations,
                wholesaler.phone,
                wholesaler.opening_year,
                wholesaler.manager_name,
                wholesaler.pharmacist_staff,
                wholesaler.non_pharmacist_staff,
                wholesaler.security_staff,
                wholesaler.hygiene_staff,
                wholesaler.revenue,
                wholesaler.vehicle_count,
            ],
        )?;
        Ok(rows_affected > 0)
    }

    /// Case-insensitive exact name lookup among active wholesalers.
    pub fn find_wholesaler_by_name(&self, name: &str) -> DbResult<Option<Wholesaler>> {
        let sql = format!(
            "SELECT {} FROM wholesalers WHERE name = ?1 COLLATE NOCASE AND active = 1 LIMIT 1",
            COLUMNS
        );
        self.conn
            .query_row(&sql, [name.trim()], read_row)
            .optional()?
            .map(TryInto::try_into)
            .transpose()
    }

    pub fn get_wholesaler(&self, id: i64) -> DbResult<Option<Wholesaler>> {
        let sql = format!("SELECT {} FROM wholesalers WHERE id = ?1", COLUMNS);
        self.conn
            .query_row(&sql, [id], read_row)
            .optional()?
            .map(TryInto::try_into)
            .transpose()
    }

    pub fn list_wholesalers(&self, active_only: bool) -> DbResult<Vec<Wholesaler>> {
        let sql = if active_only {
            format!("SELECT {} FROM wholesalers WHERE active = 1 ORDER BY name", COLUMNS)
        } else {
            format!("SELECT {} FROM wholesalers ORDER BY name", COLUMNS)
        };
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([], read_row)?;

        let mut wholesalers = Vec::new();
        for row in rows {
            wholesalers.push(row?.try_into()?);
        }
        Ok(wholesalers)
    }
}

struct WholesalerRow {
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
    opening_year: i32,
    manager_name: String,
    pharmacist_staff: u32,
    non_pharmacist_staff: u32,
    security_staff: u32,
    hygiene_staff: u32,
    revenue: f64,
    vehicle_count: Option<u32>,
}

fn read_row(row: &Row<'_>) -> rusqlite::Result<WholesalerRow> {
    Ok(WholesalerRow {
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
        opening_year: row.get(14)?,
        manager_name: row.get(15)?,
        pharmacist_staff: row.get(16)?,
        non_pharmacist_staff: row.get(17)?,
        security_staff: row.get(18)?,
        hygiene_staff: row.get(19)?,
        revenue: row.get(20)?,
        vehicle_count: row.get(21)?,
    })
}

impl TryFrom<WholesalerRow> for Wholesaler {
    type Error = DbError;

    fn try_from(row: WholesalerRow) -> Result<Self, Self::Error> {
        Ok(Wholesaler {
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
            opening_year: row.opening_year,
            manager_name: row.manager_name,
            pharmacist_staff: row.pharmacist_staff,
            non_pharmacist_staff: row.non_pharmacist_staff,
            security_staff: row.security_staff,
            hygiene_staff: row.hygiene_staff,
            revenue: row.revenue,
            vehicle_count: row.vehicle_count,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup_db() -> (Database, SiteProfile) {
        let db = Database::open_in_memory().unwrap();
        let region = db.create_region("Dakar").unwrap();
        let dept = db.create_department("Rufisque", region.id).unwrap();
        let commune = db.create_commune("Bargny", dept.id, region.id).unwrap();
        let profile = SiteProfile::new(
            region.id,
            dept.id,
            commune.id,
            "Zone industrielle".into(),
            "Km 18, Route de Rufisque".into(),
        );
        (db, profile)
    }

    #[test]
    fn test_create_and_round_trip() {
        let (db, profile) = setup_db();
        let mut wholesaler = Wholesaler::new(
            "Sodipharm".into(),
            profile,
            "+221 33 836 00 00".into(),
            2002,
            "Cheikh Ba".into(),
        );
        wholesaler.pharmacist_staff = 4;
        wholesaler.non_pharmacist_staff = 25;
        wholesaler.security_staff = 3;
        wholesaler.hygiene_staff = 2;
        wholesaler.revenue = 1_200_000_000.0;
        wholesaler.vehicle_count = Some(12);

        db.create_wholesaler(&mut wholesaler).unwrap();
        assert_eq!(wholesaler.code.as_deref(), Some("gros-0001"));

        let stored = db.get_wholesaler(wholesaler.id.unwrap()).unwrap().unwrap();
        assert_eq!(stored, wholesaler);
    }

    #[test]
    fn test_find_by_name_skips_inactive() {
        let (db, profile) = setup_db();
        let mut wholesaler = Wholesaler::new(
            "Sodipharm".into(),
            profile,
            "+221 33 836 00 00".into(),
            2002,
            "Cheikh Ba".into(),
        );
        db.create_wholesaler(&mut wholesaler).unwrap();

        db.set_establishment_active(EstablishmentKind::Wholesaler, wholesaler.id.unwrap(), false)
            .unwrap();
        assert!(db.find_wholesaler_by_name("sodipharm").unwrap().is_none());
    }
}
