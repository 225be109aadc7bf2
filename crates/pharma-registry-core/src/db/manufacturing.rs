//! Manufacturing site database operations.

use rusqlite::{params, OptionalExtension, Row};

use super::establishments::{merge_coordinates, split_coordinates};
use super::{is_constraint_violation, Database, DbError, DbResult};
use crate::models::{EstablishmentKind, ManufacturingSite, SiteProfile};

const COLUMNS: &str = "id, code, name, region_id, department_id, commune_id, locality, address,
    latitude, longitude, observations, active, photo, phone, opening_year, manager_name,
    pharmacist_staff, non_pharmacist_staff, security_staff, hygiene_staff, revenue";

impl Database {
    /// Create a manufacturing site, validating the geo chain and drawing the
    /// next `eta-` code.
    pub fn create_manufacturing_site(&self, site: &mut ManufacturingSite) -> DbResult<()> {
        self.validate_site_profile(&site.profile)?;
        if site.code.is_none() {
            site.code = Some(self.next_code(EstablishmentKind::ManufacturingSite)?);
        }
        let (latitude, longitude) = split_coordinates(site.profile.coordinates);

        let result = self.conn.execute(
            r#"
            INSERT INTO manufacturing_sites (
                code, name, region_id, department_id, commune_id, locality, address,
                latitude, longitude, observations, active, photo, phone, opening_year,
                manager_name, pharmacist_staff, non_pharmacist_staff, security_staff,
                hygiene_staff, revenue
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14,
                      ?15, ?16, ?17, ?18, ?19, ?20)
            "#,
            params![
                site.code,
                site.name,
                site.profile.region_id,
                site.profile.department_id,
                site.profile.commune_id,
                site.profile.locality,
                site.profile.address,
                latitude,
                longitude,
                site.profile.observations,
                site.profile.active,
                site.profile.photo,
                site.phone,
                site.opening_year,
                site.manager_name,
                site.pharmacist_staff,
                site.non_pharmacist_staff,
                site.security_staff,
                site.hygiene_staff,
                site.revenue,
            ],
        );
        match result {
            Ok(_) => {
                site.id = Some(self.conn.last_insert_rowid());
                Ok(())
            }
            Err(e) if is_constraint_violation(&e) => Err(DbError::Constraint(format!(
                "manufacturing site '{}' violates a constraint: {}",
                site.name, e
            ))),
            Err(e) => Err(e.into()),
        }
    }

    /// Overwrite an existing site; code, photo and active flag untouched.
    pub fn update_manufacturing_site(&self, site: &ManufacturingSite) -> DbResult<bool> {
        let id = site.id.ok_or_else(|| {
            DbError::Constraint("cannot update a manufacturing site that was never saved".into())
        })?;
        self.validate_site_profile(&site.profile)?;
        let (latitude, longitude) = split_coordinates(site.profile.coordinates);

        let rows_affected = self.conn.execute(
            r#"
            UPDATE manufacturing_sites SET
                name = ?2, region_id = ?3, department_id = ?4, commune_id = ?5,
                locality = ?6, address = ?7, latitude = ?8, longitude = ?9,
                observations = ?10, phone = ?11, opening_year = ?12, manager_name = ?13,
                pharmacist_staff = ?14, non_pharmacist_staff = ?15, security_staff = ?16,
                hygiene_staff = ?17, revenue = ?18,
                updated_at = datetime('now')
            WHERE id = ?1
            "#,
            params![
                id,
                site.name,
                site.profile.region_id,
                site.profile.department_id,
                site.profile.commune_id,
                site.profile.locality,
                site.profile.address,
                latitude,
                longitude,
                site.profile.observations,
                site.phone,
                site.opening_year,
                site.manager_name,
                site.pharmacist_staff,
                site.non_pharmacist_staff,
                site.security_staff,
                site.hygiene_staff,
                site.revenue,
            ],
        )?;
        Ok(rows_affected > 0)
    }

    /// Case-insensitive exact name lookup among active sites.
    pub fn find_manufacturing_site_by_name(
        &self,
        name: &str,
    ) -> DbResult<Option<ManufacturingSite>> {
        let sql = format!(
            "SELECT {} FROM manufacturing_sites
             WHERE name = ?1 COLLATE NOCASE AND active = 1 LIMIT 1",
            COLUMNS
        );
        self.conn
            .query_row(&sql, [name.trim()], read_row)
            .optional()?
            .map(TryInto::try_into)
            .transpose()
    }

    pub fn get_manufacturing_site(&self, id: i64) -> DbResult<Option<ManufacturingSite>> {
        let sql = format!("SELECT {} FROM manufacturing_sites WHERE id = ?1", COLUMNS);
        self.conn
            .query_row(&sql, [id], read_row)
            .optional()?
            .map(TryInto::try_into)
            .transpose()
    }

    pub fn list_manufacturing_sites(&self, active_only: bool) -> DbResult<Vec<ManufacturingSite>> {
        let sql = if active_only {
            format!(
                "SELECT {} FROM manufacturing_sites WHERE active = 1 ORDER BY name",
                COLUMNS
            )
        } else {
            format!("SELECT {} FROM manufacturing_sites ORDER BY name", COLUMNS)
        };
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([], read_row)?;

        let mut sites = Vec::new();
        for row in rows {
            sites.push(row?.try_into()?);
        }
        Ok(sites)
    }
}

struct ManufacturingSiteRow {
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
}

fn read_row(row: &Row<'_>) -> rusqlite::Result<ManufacturingSiteRow> {
    Ok(ManufacturingSiteRow {
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
    })
}

impl TryFrom<ManufacturingSiteRow> for ManufacturingSite {
    type Error = DbError;

    fn try_from(row: ManufacturingSiteRow) -> Result<Self, Self::Error> {
        Ok(ManufacturingSite {
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
        })
    }
}
