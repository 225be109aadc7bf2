//! Promotion agency database operations.

use chrono::NaiveDate;
use rusqlite::{params, OptionalExtension, Row};

use super::establishments::{merge_coordinates, split_coordinates};
use super::{is_constraint_violation, Database, DbError, DbResult};
use crate::models::{Agency, EstablishmentKind, SiteProfile};

const COLUMNS: &str = "id, code, name, region_id, department_id, commune_id, locality, address,
    latitude, longitude, observations, active, photo, phone, opening_year, license_number,
    license_date, responsible_pharmacist, pharmacist_staff, non_pharmacist_staff, revenue,
    currency, represented_laboratory";

/// Licence dates are stored as ISO `YYYY-MM-DD` text.
const DATE_FORMAT: &str = "%Y-%m-%d";

impl Database {
    /// Create an agency, validating the geo chain and drawing the next
    /// `agen-` code.
    pub fn create_agency(&self, agency: &mut Agency) -> DbResult<()> {
        self.validate_site_profile(&agency.profile)?;
        if agency.code.is_none() {
            agency.code = Some(self.next_code(EstablishmentKind::Agency)?);
        }
        let (latitude, longitude) = split_coordinates(agency.profile.coordinates);

        let result = self.conn.execute(
            r#"
            INSERT INTO agencies (
                code, name, region_id, department_id, commune_id, locality, address,
                latitude, longitude, observations, active, photo, phone, opening_year,
                license_number, license_date, responsible_pharmacist, pharmacist_staff,
                non_pharmacist_staff, revenue, currency, represented_laboratory
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14,
                      ?15, ?16, ?17, ?18, ?19, ?20, ?21, ?22)
            "#,
            params![
                agency.code,
                agency.name,
                agency.profile.region_id,
                agency.profile.department_id,
                agency.profile.commune_id,
                agency.profile.locality,
                agency.profile.address,
                latitude,
                longitude,
                agency.profile.observations,
                agency.profile.active,
                agency.profile.photo,
                agency.phone,
                agency.opening_year,
                agency.license_number,
                agency.license_date.format(DATE_FORMAT).to_string(),
                agency.responsible_pharmacist,
                agency.pharmacist_staff,
                agency.non_pharmacist_staff,
                agency.revenue,
                agency.currency,
                agency.represented_laboratory,
            ],
        );
        match result {
            Ok(_) => {
                agency.id = Some(self.conn.last_insert_rowid());
                Ok(())
            }
            Err(e) if is_constraint_violation(&e) => Err(DbError::Constraint(format!(
                "agency '{}' violates a constraint: {}",
                agency.name, e
            ))),
            Err(e) => Err(e.into()),
        }
    }

    /// Overwrite an existing agency; code, photo and active flag untouched.
    pub fn update_agency(&self, agency: &Agency) -> DbResult<bool> {
        let id = agency.id.ok_or_else(|| {
            DbError::Constraint("cannot update an agency that was never saved".into())
        })?;
        self.validate_site_profile(&agency.profile)?;
        let (latitude, longitude) = split_coordinates(agency.profile.coordinates);

        let rows_affected = self.conn.execute(
            r#"
            UPDATE agencies SET
                name = ?2, region_id = ?3, department_id = ?4, commune_id = ?5,
                locality = ?6, address = ?7, latitude = ?8, longitude = ?9,
                observations = ?10, phone = ?11, opening_year = ?12, license_number = ?13,
                license_date = ?14, responsible_pharmacist = ?15, pharmacist_staff = ?16,
                non_pharmacist_staff = ?17, revenue = ?18, currency = ?19,
                represented_laboratory = ?20,
                updated_at = datetime('now')
            WHERE id = ?1
            "#,
            params![
                id,
                agency.name,
                agency.profile.region_id,
                agency.profile.department_id,
                agency.profile.commune_id,
                agency.profile.locality,
                agency.profile.address,
                latitude,
                longitude,
                agency.profile.observations,
                agency.phone,
                agency.opening_year,
                agency.license_number,
                agency.license_date.format(DATE_FORMAT).to_string(),
                agency.responsible_pharmacist,
                agency.pharmacist_staff,
                agency.non_pharmacist_staff,
                agency.revenue,
                agency.currency,
                agency.represented_laboratory,
            ],
        )?;
        Ok(rows_affected > 0)
    }

    /// Case-insensitive exact name lookup among active agencies.
    pub fn find_agency_by_name(&self, name: &str) -> DbResult<Option<Agency>> {
        let sql = format!(
            "SELECT {} FROM agencies WHERE name = ?1 COLLATE NOCASE AND active = 1 LIMIT 1",
            COLUMNS
        );
        self.conn
            .query_row(&sql, [name.trim()], read_row)
            .optional()?
            .map(TryInto::try_into)
            .transpose()
    }

    pub fn get_agency(&self, id: i64) -> DbResult<Option<Agency>> {
        let sql = format!("SELECT {} FROM agencies WHERE id = ?1", COLUMNS);
        self.conn
            .query_row(&sql, [id], read_row)
            .optional()?
            .map(TryInto::try_into)
            .transpose()
    }

    pub fn list_agencies(&self, active_only: bool) -> DbResult<Vec<Agency>> {
        let sql = if active_only {
            format!("SELECT {} FROM agencies WHERE active = 1 ORDER BY name", COLUMNS)
        } else {
            format!("SELECT {} FROM agencies ORDER BY name", COLUMNS)
        };
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([], read_row)?;

        let mut agencies = Vec::new();
        for row in rows {
            agencies.push(row?.try_into()?);
        }
        Ok(agencies)
    }
}

struct AgencyRow {
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
    license_number: String,
    license_date: String,
    responsible_pharmacist: String,
    pharmacist_staff: u32,
    non_pharmacist_staff: u32,
    revenue: f64,
    currency: String,
    represented_laboratory: Option<String>,
}

fn read_row(row: &Row<'_>) -> rusqlite::Result<AgencyRow> {
    Ok(AgencyRow {
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
        license_number: row.get(15)?,
        license_date: row.get(16)?,
        responsible_pharmacist: row.get(17)?,
        pharmacist_staff: row.get(18)?,
        non_pharmacist_staff: row.get(19)?,
        revenue: row.get(20)?,
        currency: row.get(21)?,
        represented_laboratory: row.get(22)?,
    })
}

impl TryFrom<AgencyRow> for Agency {
    type Error = DbError;

    fn try_from(row: AgencyRow) -> Result<Self, Self::Error> {
        let license_date = NaiveDate::parse_from_str(&row.license_date, DATE_FORMAT)
            .map_err(|_| {
                DbError::Constraint(format!("malformed licence date: {}", row.license_date))
            })?;

        Ok(Agency {
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
            license_number: row.license_number,
            license_date,
            responsible_pharmacist: row.responsible_pharmacist,
            pharmacist_staff: row.pharmacist_staff,
            non_pharmacist_staff: row.non_pharmacist_staff,
            revenue: row.revenue,
            currency: row.currency,
            represented_laboratory: row.represented_laboratory,
        })
    }
}
