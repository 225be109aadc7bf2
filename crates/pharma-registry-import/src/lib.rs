//! Pharma Registry Import Assistants
//!
//! Tabular-file ingestion for the establishment registry.
//!
//! # Pipelines
//!
//! ```text
//! uploaded file (CSV / XLSX)
//!        │ parse (header row, blank rows skipped)
//!        ▼
//!    RowMap per data row
//!        │
//!        ├── GeoImporter: alias-tolerant headers, find-or-create
//!        │   region → department → commune (idempotent upsert)
//!        │
//!        └── EstablishmentImporter: exact headers, geo lookups against the
//!            store, typed per-kind field mapping, create-or-update with
//!            code assignment on create
//! ```
//!
//! Both pipelines run a whole file inside one transaction: the first bad row
//! aborts the import and nothing is committed.

pub mod establishment;
pub mod fields;
pub mod geo;
pub mod tabular;

pub use establishment::{EstablishmentImporter, ImportOutcome};
pub use geo::{GeoImportSummary, GeoImporter};
pub use tabular::{normalize_header, read_rows, RowMap};

use pharma_registry_core::DbError;
use thiserror::Error;

/// Import errors.
#[derive(Error, Debug)]
pub enum ImportError {
    /// Operator-correctable data problem. The message is shown verbatim and
    /// the whole file is abandoned.
    #[error("{0}")]
    UserInput(String),

    #[error("unsupported file format: {0}")]
    UnsupportedFormat(String),

    /// Workbook import attempted without the reader compiled in. This is a
    /// deployment problem, not a data problem.
    #[error("workbook support is not enabled: rebuild with the `xlsx` feature to import workbook files")]
    SpreadsheetSupport,

    #[error("CSV parse error: {0}")]
    Csv(#[from] csv::Error),

    #[error("workbook parse error: {0}")]
    Workbook(String),

    #[error(transparent)]
    Db(#[from] DbError),
}

pub type ImportResult<T> = Result<T, ImportError>;
