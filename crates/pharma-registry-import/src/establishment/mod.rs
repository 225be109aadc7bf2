//! Establishment import pipeline.
//!
//! One importer per uploaded file: the establishment kind is fixed up front,
//! headers are matched exactly (the per-kind templates are controlled
//! documents, unlike the free-form geo files), and every geo reference must
//! already exist in the store.
//!
//! Row lifecycle: parsed → fields resolved → geo resolved → validated →
//! created / updated / skipped. The first failure aborts the file; the
//! surrounding transaction throws away whatever preceded it.

mod mappers;

use std::fmt;

use pharma_registry_core::{Database, DbError, EstablishmentKind, SiteProfile};
use tracing::info;

use self::mappers::ImportedRecord;
use crate::tabular::{self, RowMap};
use crate::{fields, ImportError, ImportResult};

/// Counts reported back to the operator after a successful run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ImportOutcome {
    pub created: u32,
    pub updated: u32,
}

impl fmt::Display for ImportOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} created, {} updated.", self.created, self.updated)
    }
}

/// File importer for one establishment kind.
pub struct EstablishmentImporter<'a> {
    db: &'a Database,
    kind: EstablishmentKind,
    allow_update: bool,
}

impl<'a> EstablishmentImporter<'a> {
    pub fn new(db: &'a Database, kind: EstablishmentKind, allow_update: bool) -> Self {
        Self {
            db,
            kind,
            allow_update,
        }
    }

    /// Run the import. The filename only selects the parser.
    pub fn import(&self, data: &[u8], filename: &str) -> ImportResult<ImportOutcome> {
        let rows = tabular::read_rows(data, filename)?;
        if rows.is_empty() {
            return Err(ImportError::UserInput("the file contains no data".into()));
        }

        let tx = self.db.transaction()?;
        let mut outcome = ImportOutcome::default();
        for row in &rows {
            self.import_row(row, &mut outcome)?;
        }
        tx.commit().map_err(DbError::from)?;

        info!(
            kind = self.kind.label(),
            created = outcome.created,
            updated = outcome.updated,
            "establishment import finished"
        );
        Ok(outcome)
    }

    fn import_row(&self, row: &RowMap, outcome: &mut ImportOutcome) -> ImportResult<()> {
        let name = fields::required_text(row, mappers::name_column(self.kind))?;
        let profile = self.resolve_profile(row)?;
        let record = mappers::build_record(self.kind, row, name, profile)?;
        self.upsert(record, outcome)
    }

    /// Resolve the row's geo references against the store and assemble the
    /// shared profile. Geography must have been imported beforehand; an
    /// unknown name is an operator error, never an implicit create.
    fn resolve_profile(&self, row: &RowMap) -> ImportResult<SiteProfile> {
        let region_name = fields::required_text(row, "REGION")?;
        let region = self.db.find_region_by_name(&region_name)?.ok_or_else(|| {
            ImportError::UserInput(format!(
                "row {}: region '{}' was not found; import the geographic reference data first",
                row.line(),
                region_name
            ))
        })?;

        let department_name = fields::required_text(row, "DEPARTEMENT")?;
        let department = self
            .db
            .find_department_by_name(&department_name, region.id)?
            .ok_or_else(|| {
                ImportError::UserInput(format!(
                    "row {}: department '{}' was not found in region '{}'; \
                     import the geographic reference data first",
                    row.line(),
                    department_name,
                    region.name
                ))
            })?;

        let commune_name = fields::required_text(row, "COMMUNE")?;
        let commune = self
            .db
            .find_commune_by_name(&commune_name, department.id)?
            .ok_or_else(|| {
                ImportError::UserInput(format!(
                    "row {}: commune '{}' was not found in department '{}'; \
                     import the geographic reference data first",
                    row.line(),
                    commune_name,
                    department.name
                ))
            })?;

        let locality = fields::optional_text(row, "QUARTIER")
            .or_else(|| fields::optional_text(row, "QUARTIER/VILLAGE/HAMEAU"))
            .ok_or_else(|| {
                ImportError::UserInput(format!(
                    "row {}: column 'QUARTIER' is required",
                    row.line()
                ))
            })?;
        let address = fields::required_text(row, mappers::address_column(self.kind))?;

        let mut profile = SiteProfile::new(region.id, department.id, commune.id, locality, address);
        profile.coordinates = fields::coordinates(row);
        profile.observations = fields::optional_text(row, "OBSERVATIONS");
        Ok(profile)
    }

    /// Create-or-update keyed by case-insensitive exact name within the
    /// kind. Existing records are only overwritten when the operator opted
    /// into updates; their code is never regenerated.
    fn upsert(&self, record: ImportedRecord, outcome: &mut ImportOutcome) -> ImportResult<()> {
        match record {
            ImportedRecord::Pharmacy(mut pharmacy) => {
                match self.db.find_pharmacy_by_name(&pharmacy.name)? {
                    Some(existing) => {
                        if self.allow_update {
                            pharmacy.id = existing.id;
                            pharmacy.code = existing.code;
                            self.db.update_pharmacy(&pharmacy)?;
                            outcome.updated += 1;
                        }
                    }
                    None => {
                        self.db.create_pharmacy(&mut pharmacy)?;
                        outcome.created += 1;
                    }
                }
            }
            ImportedRecord::Depot(mut depot) => match self.db.find_depot_by_name(&depot.name)? {
                Some(existing) => {
                    if self.allow_update {
                        depot.id = existing.id;
                        depot.code = existing.code;
                        self.db.update_depot(&depot)?;
                        outcome.updated += 1;
                    }
                }
                None => {
                    self.db.create_depot(&mut depot)?;
                    outcome.created += 1;
                }
            },
            ImportedRecord::Wholesaler(mut wholesaler) => {
                match self.db.find_wholesaler_by_name(&wholesaler.name)? {
                    Some(existing) => {
                        if self.allow_update {
                            wholesaler.id = existing.id;
                            wholesaler.code = existing.code;
                            self.db.update_wholesaler(&wholesaler)?;
                            outcome.updated += 1;
                        }
                    }
                    None => {
                        self.db.create_wholesaler(&mut wholesaler)?;
                        outcome.created += 1;
                    }
                }
            }
            ImportedRecord::Agency(mut agency) => {
                match self.db.find_agency_by_name(&agency.name)? {
                    Some(existing) => {
                        if self.allow_update {
                            agency.id = existing.id;
                            agency.code = existing.code;
                            self.db.update_agency(&agency)?;
                            outcome.updated += 1;
                        }
                    }
                    None => {
                        self.db.create_agency(&mut agency)?;
                        outcome.created += 1;
                    }
                }
            }
            ImportedRecord::ManufacturingSite(mut site) => {
                match self.db.find_manufacturing_site_by_name(&site.name)? {
                    Some(existing) => {
                        if self.allow_update {
                            site.id = existing.id;
                            site.code = existing.code;
                            self.db.update_manufacturing_site(&site)?;
                            outcome.updated += 1;
                        }
                    }
                    None => {
                        self.db.create_manufacturing_site(&mut site)?;
                        outcome.created += 1;
                    }
                }
            }
        }
        Ok(())
    }
}
