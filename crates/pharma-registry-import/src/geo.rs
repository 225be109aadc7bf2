//! Geographic hierarchy import pipeline.
//!
//! Bulk-loads regions, departments and communes from an uploaded file.
//! Matching is find-or-create at each level, so re-running the same file is
//! a no-op; the whole file commits or nothing does.

use std::fmt;

use pharma_registry_core::{Database, DbError};
use tracing::info;

use crate::tabular::{self, RowMap};
use crate::{ImportError, ImportResult};

/// Header aliases tolerated for each geo column.
const REGION_ALIASES: &[&str] = &["REGION", "Région"];
const DEPARTMENT_ALIASES: &[&str] = &["DEPARTEMENT", "Département", "Department"];
const COMMUNE_ALIASES: &[&str] = &["COMMUNE", "Commune"];

/// Counts of newly created rows, one per hierarchy level.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct GeoImportSummary {
    pub regions_created: u32,
    pub departments_created: u32,
    pub communes_created: u32,
}

impl fmt::Display for GeoImportSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} regions created, {} departments created, {} communes created.",
            self.regions_created, self.departments_created, self.communes_created
        )
    }
}

/// Bulk loader for the geographic reference hierarchy.
pub struct GeoImporter<'a> {
    db: &'a Database,
}

impl<'a> GeoImporter<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Run the import. The filename only selects the parser.
    pub fn import(&self, data: &[u8], filename: &str) -> ImportResult<GeoImportSummary> {
        let rows = tabular::read_rows(data, filename)?;
        if rows.is_empty() {
            return Err(ImportError::UserInput("the file contains no data".into()));
        }

        let tx = self.db.transaction()?;
        let mut summary = GeoImportSummary::default();
        for row in &rows {
            self.import_row(row, &mut summary)?;
        }
        tx.commit().map_err(DbError::from)?;

        info!(
            regions = summary.regions_created,
            departments = summary.departments_created,
            communes = summary.communes_created,
            "geo import finished"
        );
        Ok(summary)
    }

    fn import_row(&self, row: &RowMap, summary: &mut GeoImportSummary) -> ImportResult<()> {
        let region_name = row.get_any(REGION_ALIASES).ok_or_else(|| {
            ImportError::UserInput(format!("row {}: the REGION column is required", row.line()))
        })?;

        let region = match self.db.find_region_by_name(region_name)? {
            Some(region) => region,
            None => {
                summary.regions_created += 1;
                self.db.create_region(region_name)?
            }
        };

        let department = match row.get_any(DEPARTMENT_ALIASES) {
            Some(name) => Some(match self.db.find_department_by_name(name, region.id)? {
                Some(department) => department,
                None => {
                    summary.departments_created += 1;
                    self.db.create_department(name, region.id)?
                }
            }),
            None => None,
        };

        // A commune without a resolved department is silently skipped
        if let (Some(name), Some(department)) = (row.get_any(COMMUNE_ALIASES), department) {
            if self.db.find_commune_by_name(name, department.id)?.is_none() {
                summary.communes_created += 1;
                self.db.create_commune(name, department.id, region.id)?;
            }
        }

        Ok(())
    }
}
