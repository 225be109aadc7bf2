//! Operations shared by every establishment kind.

use rusqlite::params;

use super::{Database, DbResult};
use crate::models::{EstablishmentKind, GeoPoint};

/// Split a coordinate pair into the two nullable columns.
pub(crate) fn split_coordinates(point: Option<GeoPoint>) -> (Option<f64>, Option<f64>) {
    match point {
        Some(p) => (Some(p.latitude), Some(p.longitude)),
        None => (None, None),
    }
}

/// Rebuild the pair from the two columns; the schema CHECK guarantees they
/// are set together.
pub(crate) fn merge_coordinates(
    latitude: Option<f64>,
    longitude: Option<f64>,
) -> Option<GeoPoint> {
    match (latitude, longitude) {
        (Some(latitude), Some(longitude)) => Some(GeoPoint {
            latitude,
            longitude,
        }),
        _ => None,
    }
}

impl Database {
    /// Flip the active flag. Records are deactivated rather than deleted, so
    /// there is no `delete_*` for establishments.
    pub fn set_establishment_active(
        &self,
        kind: EstablishmentKind,
        id: i64,
        active: bool,
    ) -> DbResult<bool> {
        let sql = format!(
            "UPDATE {} SET active = ?1, updated_at = datetime('now') WHERE id = ?2",
            kind.table()
        );
        let rows_affected = self.conn.execute(&sql, params![active, id])?;
        Ok(rows_affected > 0)
    }

    /// Total rows of a kind, active or not.
    pub fn count_establishments(&self, kind: EstablishmentKind) -> DbResult<i64> {
        let sql = format!("SELECT COUNT(*) FROM {}", kind.table());
        self.conn
            .query_row(&sql, [], |row| row.get(0))
            .map_err(Into::into)
    }

    /// Attach or replace the photo of a record. Kept out of the generic
    /// update path so imports can never clobber a stored image.
    pub fn set_establishment_photo(
        &self,
        kind: EstablishmentKind,
        id: i64,
        photo: Option<&[u8]>,
    ) -> DbResult<bool> {
        let sql = format!(
            "UPDATE {} SET photo = ?1, updated_at = datetime('now') WHERE id = ?2",
            kind.table()
        );
        let rows_affected = self.conn.execute(&sql, params![photo, id])?;
        Ok(rows_affected > 0)
    }
}
