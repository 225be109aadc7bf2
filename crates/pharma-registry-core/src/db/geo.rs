//! Geographic hierarchy database operations.

use rusqlite::{params, OptionalExtension};

use super::{is_constraint_violation, Database, DbError, DbResult};
use crate::models::{Commune, Department, Region, SiteProfile};

impl Database {
    // =========================================================================
    // Regions
    // =========================================================================

    /// Insert a new region. The name must not already exist (case-sensitive
    /// uniqueness; use `find_region_by_name` first for tolerant matching).
    pub fn create_region(&self, name: &str) -> DbResult<Region> {
        let result = self
            .conn
            .execute("INSERT INTO geo_regions (name) VALUES (?1)", [name]);
        match result {
            Ok(_) => Ok(Region {
                id: self.conn.last_insert_rowid(),
                name: name.to_string(),
            }),
            Err(e) if is_constraint_violation(&e) => Err(DbError::Constraint(format!(
                "region '{}' already exists",
                name
            ))),
            Err(e) => Err(e.into()),
        }
    }

    /// Case-insensitive exact lookup by name.
    pub fn find_region_by_name(&self, name: &str) -> DbResult<Option<Region>> {
        self.conn
            .query_row(
                "SELECT id, name FROM geo_regions WHERE name = ?1 COLLATE NOCASE LIMIT 1",
                [name.trim()],
                |row| {
                    Ok(Region {
                        id: row.get(0)?,
                        name: row.get(1)?,
                    })
                },
            )
            .optional()
            .map_err(Into::into)
    }

    pub fn get_region(&self, id: i64) -> DbResult<Option<Region>> {
        self.conn
            .query_row(
                "SELECT id, name FROM geo_regions WHERE id = ?1",
                [id],
                |row| {
                    Ok(Region {
                        id: row.get(0)?,
                        name: row.get(1)?,
                    })
                },
            )
            .optional()
            .map_err(Into::into)
    }

    pub fn list_regions(&self) -> DbResult<Vec<Region>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name FROM geo_regions ORDER BY name")?;
        let rows = stmt.query_map([], |row| {
            Ok(Region {
                id: row.get(0)?,
                name: row.get(1)?,
            })
        })?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Delete a region. Fails while departments, communes or establishments
    /// still reference it.
    pub fn delete_region(&self, id: i64) -> DbResult<bool> {
        let result = self
            .conn
            .execute("DELETE FROM geo_regions WHERE id = ?1", [id]);
        match result {
            Ok(rows_affected) => Ok(rows_affected > 0),
            Err(e) if is_constraint_violation(&e) => Err(DbError::Constraint(
                "region is still referenced by departments, communes or establishments".into(),
            )),
            Err(e) => Err(e.into()),
        }
    }

    // =========================================================================
    // Departments
    // =========================================================================

    /// Insert a new department under a region.
    pub fn create_department(&self, name: &str, region_id: i64) -> DbResult<Department> {
        let result = self.conn.execute(
            "INSERT INTO geo_departments (name, region_id) VALUES (?1, ?2)",
            params![name, region_id],
        );
        match result {
            Ok(_) => Ok(Department {
                id: self.conn.last_insert_rowid(),
                name: name.to_string(),
                region_id,
            }),
            Err(e) if is_constraint_violation(&e) => Err(DbError::Constraint(format!(
                "department '{}' already exists in this region",
                name
            ))),
            Err(e) => Err(e.into()),
        }
    }

    /// Case-insensitive exact lookup by name, scoped to a region.
    pub fn find_department_by_name(
        &self,
        name: &str,
        region_id: i64,
    ) -> DbResult<Option<Department>> {
        self.conn
            .query_row(
                "SELECT id, name, region_id FROM geo_departments
                 WHERE name = ?1 COLLATE NOCASE AND region_id = ?2 LIMIT 1",
                params![name.trim(), region_id],
                |row| {
                    Ok(Department {
                        id: row.get(0)?,
                        name: row.get(1)?,
                        region_id: row.get(2)?,
                    })
                },
            )
            .optional()
            .map_err(Into::into)
    }

    pub fn get_department(&self, id: i64) -> DbResult<Option<Department>> {
        self.conn
            .query_row(
                "SELECT id, name, region_id FROM geo_departments WHERE id = ?1",
                [id],
                |row| {
                    Ok(Department {
                        id: row.get(0)?,
                        name: row.get(1)?,
                        region_id: row.get(2)?,
                    })
                },
            )
            .optional()
            .map_err(Into::into)
    }

    pub fn list_departments(&self, region_id: i64) -> DbResult<Vec<Department>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, region_id FROM geo_departments
             WHERE region_id = ?1 ORDER BY name",
        )?;
        let rows = stmt.query_map([region_id], |row| {
            Ok(Department {
                id: row.get(0)?,
                name: row.get(1)?,
                region_id: row.get(2)?,
            })
        })?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Delete a department. Fails while communes or establishments reference it.
    pub fn delete_department(&self, id: i64) -> DbResult<bool> {
        let result = self
            .conn
            .execute("DELETE FROM geo_departments WHERE id = ?1", [id]);
        match result {
            Ok(rows_affected) => Ok(rows_affected > 0),
            Err(e) if is_constraint_violation(&e) => Err(DbError::Constraint(
                "department is still referenced by communes or establishments".into(),
            )),
            Err(e) => Err(e.into()),
        }
    }

    // =========================================================================
    // Communes
    // =========================================================================

    /// Insert a new commune. The department must belong to the given region;
    /// the redundant region reference is what makes region-wide commune
    /// queries cheap, so it is validated on every write.
    pub fn create_commune(
        &self,
        name: &str,
        department_id: i64,
        region_id: i64,
    ) -> DbResult<Commune> {
        self.check_commune_coherence(department_id, region_id)?;
        let result = self.conn.execute(
            "INSERT INTO geo_communes (name, region_id, department_id) VALUES (?1, ?2, ?3)",
            params![name, region_id, department_id],
        );
        match result {
            Ok(_) => Ok(Commune {
                id: self.conn.last_insert_rowid(),
                name: name.to_string(),
                region_id,
                department_id,
            }),
            Err(e) if is_constraint_violation(&e) => Err(DbError::Constraint(format!(
                "commune '{}' already exists in this department",
                name
            ))),
            Err(e) => Err(e.into()),
        }
    }

    /// Update a commune's name or references, re-validating coherence.
    pub fn update_commune(&self, commune: &Commune) -> DbResult<bool> {
        self.check_commune_coherence(commune.department_id, commune.region_id)?;
        let rows_affected = self.conn.execute(
            "UPDATE geo_communes SET
                name = ?2,
                region_id = ?3,
                department_id = ?4,
                updated_at = datetime('now')
             WHERE id = ?1",
            params![
                commune.id,
                commune.name,
                commune.region_id,
                commune.department_id
            ],
        )?;
        Ok(rows_affected > 0)
    }

    /// Case-insensitive exact lookup by name, scoped to a department.
    pub fn find_commune_by_name(
        &self,
        name: &str,
        department_id: i64,
    ) -> DbResult<Option<Commune>> {
        self.conn
            .query_row(
                "SELECT id, name, region_id, department_id FROM geo_communes
                 WHERE name = ?1 COLLATE NOCASE AND department_id = ?2 LIMIT 1",
                params![name.trim(), department_id],
                |row| {
                    Ok(Commune {
                        id: row.get(0)?,
                        name: row.get(1)?,
                        region_id: row.get(2)?,
                        department_id: row.get(3)?,
                    })
                },
            )
            .optional()
            .map_err(Into::into)
    }

    pub fn get_commune(&self, id: i64) -> DbResult<Option<Commune>> {
        self.conn
            .query_row(
                "SELECT id, name, region_id, department_id FROM geo_communes WHERE id = ?1",
                [id],
                |row| {
                    Ok(Commune {
                        id: row.get(0)?,
                        name: row.get(1)?,
                        region_id: row.get(2)?,
                        department_id: row.get(3)?,
                    })
                },
            )
            .optional()
            .map_err(Into::into)
    }

    pub fn list_communes(&self, department_id: i64) -> DbResult<Vec<Commune>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, region_id, department_id FROM geo_communes
             WHERE department_id = ?1 ORDER BY name",
        )?;
        let rows = stmt.query_map([department_id], |row| {
            Ok(Commune {
                id: row.get(0)?,
                name: row.get(1)?,
                region_id: row.get(2)?,
                department_id: row.get(3)?,
            })
        })?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Delete a commune. Fails while establishments reference it.
    pub fn delete_commune(&self, id: i64) -> DbResult<bool> {
        let result = self
            .conn
            .execute("DELETE FROM geo_communes WHERE id = ?1", [id]);
        match result {
            Ok(rows_affected) => Ok(rows_affected > 0),
            Err(e) if is_constraint_violation(&e) => Err(DbError::Constraint(
                "commune is still referenced by establishments".into(),
            )),
            Err(e) => Err(e.into()),
        }
    }

    // =========================================================================
    // Coherence validation
    // =========================================================================

    fn check_commune_coherence(&self, department_id: i64, region_id: i64) -> DbResult<()> {
        let department = self
            .get_department(department_id)?
            .ok_or_else(|| DbError::NotFound(format!("department #{}", department_id)))?;
        if department.region_id != region_id {
            let region = self
                .get_region(region_id)?
                .ok_or_else(|| DbError::NotFound(format!("region #{}", region_id)))?;
            return Err(DbError::Validation(format!(
                "department '{}' does not belong to region '{}'",
                department.name, region.name
            )));
        }
        Ok(())
    }

    /// Check that an establishment's three geo references form a coherent
    /// chain. Runs before every establishment insert and update.
    pub fn validate_site_profile(&self, profile: &SiteProfile) -> DbResult<()> {
        let region = self
            .get_region(profile.region_id)?
            .ok_or_else(|| DbError::NotFound(format!("region #{}", profile.region_id)))?;
        let department = self
            .get_department(profile.department_id)?
            .ok_or_else(|| DbError::NotFound(format!("department #{}", profile.department_id)))?;
        let commune = self
            .get_commune(profile.commune_id)?
            .ok_or_else(|| DbError::NotFound(format!("commune #{}", profile.commune_id)))?;

        if department.region_id != region.id {
            return Err(DbError::Validation(format!(
                "department '{}' does not belong to region '{}'",
                department.name, region.name
            )));
        }
        if commune.department_id != department.id {
            return Err(DbError::Validation(format!(
                "commune '{}' does not belong to department '{}'",
                commune.name, department.name
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup_db() -> Database {
        Database::open_in_memory().unwrap()
    }

    #[test]
    fn test_create_and_find_region_case_insensitive() {
        let db = setup_db();
        let region = db.create_region("Dakar").unwrap();

        let found = db.find_region_by_name("DAKAR").unwrap().unwrap();
        assert_eq!(found.id, region.id);
        assert_eq!(found.name, "Dakar");

        // Exact match, not substring
        assert!(db.find_region_by_name("Dak").unwrap().is_none());
    }

    #[test]
    fn test_duplicate_region_rejected() {
        let db = setup_db();
        db.create_region("Dakar").unwrap();
        let result = db.create_region("Dakar");
        assert!(matches!(result, Err(DbError::Constraint(_))));
    }

    #[test]
    fn test_department_scoped_uniqueness() {
        let db = setup_db();
        let dakar = db.create_region("Dakar").unwrap();
        let thies = db.create_region("Thiès").unwrap();

        db.create_department("Rufisque", dakar.id).unwrap();
        // Same name in another region is fine
        db.create_department("Rufisque", thies.id).unwrap();
        // Same name in the same region is not
        let result = db.create_department("Rufisque", dakar.id);
        assert!(matches!(result, Err(DbError::Constraint(_))));
    }

    #[test]
    fn test_department_lookup_scoped_to_region() {
        let db = setup_db();
        let dakar = db.create_region("Dakar").unwrap();
        let thies = db.create_region("Thiès").unwrap();
        db.create_department("Rufisque", dakar.id).unwrap();

        assert!(db
            .find_department_by_name("rufisque", dakar.id)
            .unwrap()
            .is_some());
        assert!(db
            .find_department_by_name("rufisque", thies.id)
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_commune_requires_coherent_region() {
        let db = setup_db();
        let dakar = db.create_region("Dakar").unwrap();
        let thies = db.create_region("Thiès").unwrap();
        let dept = db.create_department("Pikine", dakar.id).unwrap();

        // Department belongs to Dakar, not Thiès
        let result = db.create_commune("Pikine Est", dept.id, thies.id);
        assert!(matches!(result, Err(DbError::Validation(_))));

        // Coherent chain is accepted
        let commune = db.create_commune("Pikine Est", dept.id, dakar.id).unwrap();
        assert_eq!(commune.region_id, dakar.id);
    }

    #[test]
    fn test_update_commune_revalidates() {
        let db = setup_db();
        let dakar = db.create_region("Dakar").unwrap();
        let thies = db.create_region("Thiès").unwrap();
        let dept = db.create_department("Pikine", dakar.id).unwrap();
        let mut commune = db.create_commune("Pikine Est", dept.id, dakar.id).unwrap();

        commune.region_id = thies.id;
        let result = db.update_commune(&commune);
        assert!(matches!(result, Err(DbError::Validation(_))));
    }

    #[test]
    fn test_restrict_delete() {
        let db = setup_db();
        let dakar = db.create_region("Dakar").unwrap();
        let dept = db.create_department("Pikine", dakar.id).unwrap();
        db.create_commune("Pikine Est", dept.id, dakar.id).unwrap();

        assert!(matches!(
            db.delete_region(dakar.id),
            Err(DbError::Constraint(_))
        ));
        assert!(matches!(
            db.delete_department(dept.id),
            Err(DbError::Constraint(_))
        ));
    }

    #[test]
    fn test_delete_leaf_commune() {
        let db = setup_db();
        let dakar = db.create_region("Dakar").unwrap();
        let dept = db.create_department("Pikine", dakar.id).unwrap();
        let commune = db.create_commune("Pikine Est", dept.id, dakar.id).unwrap();

        assert!(db.delete_commune(commune.id).unwrap());
        assert!(db.delete_department(dept.id).unwrap());
        assert!(db.delete_region(dakar.id).unwrap());
        assert!(!db.delete_region(dakar.id).unwrap());
    }
}
