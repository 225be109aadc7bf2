//! Establishment code generation.
//!
//! Each kind owns a counter row in `code_sequences`; advancing it is a
//! single UPDATE so SQLite serializes concurrent takers (other connections
//! and other server processes included). Codes are `prefix-NNNN`.

use rusqlite::OptionalExtension;

use super::{Database, DbError, DbResult};
use crate::models::EstablishmentKind;

/// Counter key and prefix used when a kind has no counter row of its own.
const GENERIC_SEQUENCE: &str = "establishment";
const GENERIC_PREFIX: &str = "etab";

impl Database {
    /// Draw the next code for a kind, e.g. `off-0012`.
    ///
    /// Called exactly once per record, at creation; updates never touch the
    /// code column. Falls back to the shared counter when a per-kind row is
    /// missing (databases created before the kind was seeded).
    pub fn next_code(&self, kind: EstablishmentKind) -> DbResult<String> {
        if let Some(number) = self.advance_sequence(kind.sequence_key())? {
            return Ok(format!("{}-{:04}", kind.code_prefix(), number));
        }
        let number = self
            .advance_sequence(GENERIC_SEQUENCE)?
            .ok_or_else(|| DbError::NotFound(format!("code sequence '{}'", GENERIC_SEQUENCE)))?;
        Ok(format!("{}-{:04}", GENERIC_PREFIX, number))
    }

    fn advance_sequence(&self, key: &str) -> DbResult<Option<i64>> {
        self.conn
            .query_row(
                "UPDATE code_sequences SET next_value = next_value + 1
                 WHERE kind = ?1
                 RETURNING next_value - 1",
                [key],
                |row| row.get(0),
            )
            .optional()
            .map_err(Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_kind_prefixed_and_sequential() {
        let db = Database::open_in_memory().unwrap();

        assert_eq!(db.next_code(EstablishmentKind::Pharmacy).unwrap(), "off-0001");
        assert_eq!(db.next_code(EstablishmentKind::Pharmacy).unwrap(), "off-0002");
        // Each kind has its own counter
        assert_eq!(db.next_code(EstablishmentKind::Depot).unwrap(), "dep-0001");
        assert_eq!(db.next_code(EstablishmentKind::Wholesaler).unwrap(), "gros-0001");
        assert_eq!(db.next_code(EstablishmentKind::Agency).unwrap(), "agen-0001");
        assert_eq!(
            db.next_code(EstablishmentKind::ManufacturingSite).unwrap(),
            "eta-0001"
        );
        assert_eq!(db.next_code(EstablishmentKind::Pharmacy).unwrap(), "off-0003");
    }

    #[test]
    fn test_many_draws_no_collision() {
        let db = Database::open_in_memory().unwrap();

        let codes: Vec<String> = (0..200)
            .map(|_| db.next_code(EstablishmentKind::Depot).unwrap())
            .collect();

        let unique: std::collections::HashSet<_> = codes.iter().collect();
        assert_eq!(unique.len(), codes.len());
        assert_eq!(codes.last().unwrap(), "dep-0200");
    }

    #[test]
    fn test_counter_shared_across_connections() {
        // Two handles on the same file stand in for two server processes.
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("registry.db");

        let db_a = Database::open(&path).unwrap();
        let db_b = Database::open(&path).unwrap();

        let mut codes = Vec::new();
        for _ in 0..10 {
            codes.push(db_a.next_code(EstablishmentKind::Agency).unwrap());
            codes.push(db_b.next_code(EstablishmentKind::Agency).unwrap());
        }

        let unique: std::collections::HashSet<_> = codes.iter().collect();
        assert_eq!(unique.len(), codes.len());
        assert_eq!(codes.last().unwrap(), "agen-0020");
    }

    #[test]
    fn test_missing_kind_row_falls_back_to_generic() {
        let db = Database::open_in_memory().unwrap();
        db.conn()
            .execute("DELETE FROM code_sequences WHERE kind = 'pharmacy'", [])
            .unwrap();

        assert_eq!(db.next_code(EstablishmentKind::Pharmacy).unwrap(), "etab-0001");
        assert_eq!(db.next_code(EstablishmentKind::Pharmacy).unwrap(), "etab-0002");
    }
}
