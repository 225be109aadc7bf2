//! Depot database operations.

use rusqlite::{params, OptionalExtension, Row};

use super::establishments::{merge_coordinates, split_coordinates};
use super::{is_constraint_violation, Database, DbError, DbResult};
use crate::models::{Depot, EstablishmentKind, Sex, SiteProfile};

const COLUMNS: &str = "id, code, name, region_id, department_id, commune_id, locality, address,
    latitude, longitude, observations, active, photo, phone, opening_year, manager_name,
    manager_sex";

impl Database {
    /// Create a depot, validating the geo chain and drawing the next `dep-` code.
    pub fn create_depot(&self, depot: &mut Depot) -> DbResult<()> {
        self.validate_site_profile(&depot.profile)?;
        if depot.code.is_none() {
            depot.code = Some(self.next_code(EstablishmentKind::Depot)?);
        }
        let (latitude, longitude) = split_coordinates(depot.profile.coordinates);

        let result = self.conn.execute(
            r#"
            INSERT INTO depots (
                code, name, region_id, department_id, commune_id, locality, address,
                latitude, longitude, observations, active, photo, phone, opening_year,
                manager_name, manager_sex
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)
            "#,
            params![
                depot.code,
                depot.name,
                depot.profile.region_id,
                depot.profile.department_id,
                depot.profile.commune_id,
                depot.profile.locality,
                depot.profile.address,
                latitude,
                longitude,
                depot.profile.observations,
                depot.profile.active,
                depot.profile.photo,
                depot.phone,
                depot.opening_year,
                depot.manager_name,
                depot.manager_sex.as_str(),
            ],
        );
        match result {
            Ok(_) => {
                depot.id = Some(self.conn.last_insert_rowid());
                Ok(())
            }
            Err(e) if is_constraint_violation(&e) => Err(DbError::Constraint(format!(
                "depot '{}' violates a constraint: {}",
                depot.name, e
            ))),
            Err(e) => Err(e.into()),
        }
    }

    /// Overwrite an existing depot; code, photo and active flag untouched.
    pub fn update_depot(&self, depot: &Depot) -> DbResult<bool> {
        let id = depot.id.ok_or_else(|| {
            DbError::Constraint("cannot update a depot that was never saved".into())
        })?;
        self.validate_site_profile(&depot.profile)?;
        let (latitude, longitude) = split_coordinates(depot.profile.coordinates);

        let rows_affected = self.conn.execute(
            r#"
            UPDATE depots SET
                name = ?2, region_id = ?3, department_id = ?4, commune_id = ?5,
                locality = ?6, address = ?7, latitude = ?8, longitude = ?9,
                observations = ?10, phone = ?11, opening_year = ?12,
                manager_name = ?13, manager_sex = ?14,
                updated_at = datetime('now')
            WHERE id = ?1
            "#,
            params![
                id,
                depot.name,
                depot.profile.region_id,
                depot.profile.department_id,
                depot.profile.commune_id,
                depot.profile.locality,
                depot.profile.address,
                latitude,
                longitude,
                depot.profile.observations,
                depot.phone,
                depot.opening_year,
                depot.manager_name,
                depot.manager_sex.as_str(),
            ],
        )?;
        Ok(rows_affected > 0)
    }

    /// Case-insensitive exact name lookup among active depots.
    pub fn find_depot_by_name(&self, name: &str) -> DbResult<Option<Depot>> {
        let sql = format!(
            "SELECT {} FROM depots WHERE name = ?1 COLLATE NOCASE AND active = 1 LIMIT 1",
            COLUMNS
        );
        self.conn
            .query_row(&sql, [name.trim()], read_row)
            .optional()?
            .map(TryInto::try_into)
            .transpose()
    }

    pub fn get_depot(&self, id: i64) -> DbResult<Option<Depot>> {
        let sql = format!("SELECT {} FROM depots WHERE id = ?1", COLUMNS);
        self.conn
            .query_row(&sql, [id], read_row)
            .optional()?
            .map(TryInto::try_into)
            .transpose()
    }

    pub fn list_depots(&self, active_only: bool) -> DbResult<Vec<Depot>> {
        let sql = if active_only {
            format!("SELECT {} FROM depots WHERE active = 1 ORDER BY name", COLUMNS)
        } else {
            format!("SELECT {} FROM depots ORDER BY name", COLUMNS)
        };
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([], read_row)?;

        let mut depots = Vec::new();
        for row in rows {
            depots.push(row?.try_into()?);
        }
        Ok(depots)
    }
}

struct DepotRow {
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
    manager_sex: String,
}

fn read_row(row: &Row<'_>) -> rusqlite::Result<DepotRow> {
    Ok(DepotRow {
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
        manager_sex: row.get(16)?,
    })
}

impl TryFrom<DepotRow> for Depot {
    type Error = DbError;

    fn try_from(row: DepotRow) -> Result<Self, Self::Error> {
        let manager_sex = Sex::from_code(&row.manager_sex)
            .ok_or_else(|| DbError::Constraint(format!("unknown sex code: {}", row.manager_sex)))?;

        Ok(Depot {
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
            manager_sex,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup_db() -> (Database, SiteProfile) {
        let db = Database::open_in_memory().unwrap();
        let region = db.create_region("Fatick").unwrap();
        let dept = db.create_department("Foundiougne", region.id).unwrap();
        let commune = db
            .create_commune("Soum", dept.id, region.id)
            .unwrap();
        let profile = SiteProfile::new(
            region.id,
            dept.id,
            commune.id,
            "Soum centre".into(),
            "Route de Karang".into(),
        );
        (db, profile)
    }

    #[test]
    fn test_create_and_round_trip() {
        let (db, profile) = setup_db();
        let mut depot = Depot::new(
            "Dépôt de Soum".into(),
            profile,
            "+221 77 511 22 33".into(),
            2015,
            "Moussa Sow".into(),
        );
        depot.manager_sex = Sex::Masculine;

        db.create_depot(&mut depot).unwrap();
        assert_eq!(depot.code.as_deref(), Some("dep-0001"));

        let stored = db.get_depot(depot.id.unwrap()).unwrap().unwrap();
        assert_eq!(stored, depot);
    }

    #[test]
    fn test_update_preserves_code() {
        let (db, profile) = setup_db();
        let mut depot = Depot::new(
            "Dépôt de Soum".into(),
            profile,
            "+221 77 511 22 33".into(),
            2015,
            "Moussa Sow".into(),
        );
        db.create_depot(&mut depot).unwrap();

        depot.manager_name = "Aïssatou Diallo".into();
        depot.manager_sex = Sex::Feminine;
        assert!(db.update_depot(&depot).unwrap());

        let stored = db.get_depot(depot.id.unwrap()).unwrap().unwrap();
        assert_eq!(stored.code.as_deref(), Some("dep-0001"));
        assert_eq!(stored.manager_name, "Aïssatou Diallo");
    }
}
