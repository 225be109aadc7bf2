//! SQLite schema definition.

/// Complete database schema for the establishment registry.
pub const SCHEMA: &str = r#"
-- Enable foreign keys; restrict-deletes depend on them
PRAGMA foreign_keys = ON;

-- Writers from other processes may hold the lock briefly (code counter)
PRAGMA busy_timeout = 5000;

-- ============================================================================
-- Geographic hierarchy
-- ============================================================================

CREATE TABLE IF NOT EXISTS geo_regions (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL UNIQUE,
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);

-- Lookups are case-insensitive exact
CREATE INDEX IF NOT EXISTS idx_geo_regions_name ON geo_regions(name COLLATE NOCASE);

CREATE TABLE IF NOT EXISTS geo_departments (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL,
    region_id INTEGER NOT NULL REFERENCES geo_regions(id) ON DELETE RESTRICT,
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at TEXT NOT NULL DEFAULT (datetime('now')),
    UNIQUE (name, region_id)
);

CREATE INDEX IF NOT EXISTS idx_geo_departments_region ON geo_departments(region_id);
CREATE INDEX IF NOT EXISTS idx_geo_departments_name
    ON geo_departments(name COLLATE NOCASE, region_id);

CREATE TABLE IF NOT EXISTS geo_communes (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL,
    region_id INTEGER NOT NULL REFERENCES geo_regions(id) ON DELETE RESTRICT,
    department_id INTEGER NOT NULL REFERENCES geo_departments(id) ON DELETE RESTRICT,
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at TEXT NOT NULL DEFAULT (datetime('now')),
    UNIQUE (name, department_id)
);

CREATE INDEX IF NOT EXISTS idx_geo_communes_department ON geo_communes(department_id);
CREATE INDEX IF NOT EXISTS idx_geo_communes_name
    ON geo_communes(name COLLATE NOCASE, department_id);

-- ============================================================================
-- Code sequences (one counter per establishment kind, advanced atomically)
-- ============================================================================

CREATE TABLE IF NOT EXISTS code_sequences (
    kind TEXT PRIMARY KEY,
    next_value INTEGER NOT NULL DEFAULT 1
);

INSERT OR IGNORE INTO code_sequences (kind) VALUES
    ('pharmacy'),
    ('depot'),
    ('wholesaler'),
    ('agency'),
    ('manufacturing'),
    ('establishment');

-- ============================================================================
-- Establishments (one table per kind; shared footprint columns first)
-- ============================================================================

CREATE TABLE IF NOT EXISTS pharmacies (
    id INTEGER PRIMARY KEY,
    code TEXT NOT NULL UNIQUE,
    name TEXT NOT NULL,
    region_id INTEGER NOT NULL REFERENCES geo_regions(id) ON DELETE RESTRICT,
    department_id INTEGER NOT NULL REFERENCES geo_departments(id) ON DELETE RESTRICT,
    commune_id INTEGER NOT NULL REFERENCES geo_communes(id) ON DELETE RESTRICT,
    locality TEXT NOT NULL,
    address TEXT NOT NULL,
    latitude REAL,
    longitude REAL,
    observations TEXT,
    active INTEGER NOT NULL DEFAULT 1,
    photo BLOB,
    phone TEXT NOT NULL,
    founding_year INTEGER NOT NULL,
    operating_year INTEGER NOT NULL,
    status TEXT,
    owner_name TEXT NOT NULL,
    board_number TEXT NOT NULL,
    owner_sex TEXT NOT NULL DEFAULT 'na',
    owner_age_bracket TEXT NOT NULL DEFAULT 'na',
    assistant_count INTEGER,
    pharmacist_staff INTEGER,
    non_pharmacist_staff INTEGER,
    security_staff INTEGER,
    hygiene_staff INTEGER,
    revenue REAL NOT NULL DEFAULT 0,
    currency TEXT NOT NULL DEFAULT 'XOF',
    vehicle_count INTEGER,
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at TEXT NOT NULL DEFAULT (datetime('now')),
    CHECK ((latitude IS NULL) = (longitude IS NULL))
);

CREATE INDEX IF NOT EXISTS idx_pharmacies_name ON pharmacies(name COLLATE NOCASE);

CREATE TABLE IF NOT EXISTS depots (
    id INTEGER PRIMARY KEY,
    code TEXT NOT NULL UNIQUE,
    name TEXT NOT NULL,
    region_id INTEGER NOT NULL REFERENCES geo_regions(id) ON DELETE RESTRICT,
    department_id INTEGER NOT NULL REFERENCES geo_departments(id) ON DELETE RESTRICT,
    commune_id INTEGER NOT NULL REFERENCES geo_communes(id) ON DELETE RESTRICT,
    locality TEXT NOT NULL,
    address TEXT NOT NULL,
    latitude REAL,
    longitude REAL,
    observations TEXT,
    active INTEGER NOT NULL DEFAULT 1,
    photo BLOB,
    phone TEXT NOT NULL,
    opening_year INTEGER NOT NULL,
    manager_name TEXT NOT NULL,
    manager_sex TEXT NOT NULL DEFAULT 'na',
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at TEXT NOT NULL DEFAULT (datetime('now')),
    CHECK ((latitude IS NULL) = (longitude IS NULL))
);

CREATE INDEX IF NOT EXISTS idx_depots_name ON depots(name COLLATE NOCASE);

CREATE TABLE IF NOT EXISTS wholesalers (
    id INTEGER PRIMARY KEY,
    code TEXT NOT NULL UNIQUE,
    name TEXT NOT NULL,
    region_id INTEGER NOT NULL REFERENCES geo_regions(id) ON DELETE RESTRICT,
    department_id INTEGER NOT NULL REFERENCES geo_departments(id) ON DELETE RESTRICT,
    commune_id INTEGER NOT NULL REFERENCES geo_communes(id) ON DELETE RESTRICT,
    locality TEXT NOT NULL,
    address TEXT NOT NULL,
    latitude REAL,
    longitude REAL,
    observations TEXT,
    active INTEGER NOT NULL DEFAULT 1,
    photo BLOB,
    phone TEXT NOT NULL,
    opening_year INTEGER NOT NULL,
    manager_name TEXT NOT NULL,
    pharmacist_staff INTEGER NOT NULL DEFAULT 0,
    non_pharmacist_staff INTEGER NOT NULL DEFAULT 0,
    security_staff INTEGER NOT NULL DEFAULT 0,
    hygiene_staff INTEGER NOT NULL DEFAULT 0,
    revenue REAL NOT NULL DEFAULT 0,
    vehicle_count INTEGER,
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at TEXT NOT NULL DEFAULT (datetime('now')),
    CHECK ((latitude IS NULL) = (longitude IS NULL))
);

CREATE INDEX IF NOT EXISTS idx_wholesalers_name ON wholesalers(name COLLATE NOCASE);

CREATE TABLE IF NOT EXISTS agencies (
    id INTEGER PRIMARY KEY,
    code TEXT NOT NULL UNIQUE,
    name TEXT NOT NULL,
    region_id INTEGER NOT NULL REFERENCES geo_regions(id) ON DELETE RESTRICT,
    department_id INTEGER NOT NULL REFERENCES geo_departments(id) ON DELETE RESTRICT,
    commune_id INTEGER NOT NULL REFERENCES geo_communes(id) ON DELETE RESTRICT,
    locality TEXT NOT NULL,
    address TEXT NOT NULL,
    latitude REAL,
    longitude REAL,
    observations TEXT,
    active INTEGER NOT NULL DEFAULT 1,
    photo BLOB,
    phone TEXT NOT NULL,
    opening_year INTEGER NOT NULL,
    license_number TEXT NOT NULL,
    license_date TEXT NOT NULL,
    responsible_pharmacist TEXT NOT NULL,
    pharmacist_staff INTEGER NOT NULL DEFAULT 0,
    non_pharmacist_staff INTEGER NOT NULL DEFAULT 0,
    revenue REAL NOT NULL DEFAULT 0,
    currency TEXT NOT NULL DEFAULT 'XOF',
    represented_laboratory TEXT,
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at TEXT NOT NULL DEFAULT (datetime('now')),
    CHECK ((latitude IS NULL) = (longitude IS NULL))
);

CREATE INDEX IF NOT EXISTS idx_agencies_name ON agencies(name COLLATE NOCASE);

CREATE TABLE IF NOT EXISTS manufacturing_sites (
    id INTEGER PRIMARY KEY,
    code TEXT NOT NULL UNIQUE,
    name TEXT NOT NULL,
    region_id INTEGER NOT NULL REFERENCES geo_regions(id) ON DELETE RESTRICT,
    department_id INTEGER NOT NULL REFERENCES geo_departments(id) ON DELETE RESTRICT,
    commune_id INTEGER NOT NULL REFERENCES geo_communes(id) ON DELETE RESTRICT,
    locality TEXT NOT NULL,
    address TEXT NOT NULL,
    latitude REAL,
    longitude REAL,
    observations TEXT,
    active INTEGER NOT NULL DEFAULT 1,
    photo BLOB,
    phone TEXT NOT NULL,
    opening_year INTEGER NOT NULL,
    manager_name TEXT NOT NULL,
    pharmacist_staff INTEGER NOT NULL DEFAULT 0,
    non_pharmacist_staff INTEGER NOT NULL DEFAULT 0,
    security_staff INTEGER NOT NULL DEFAULT 0,
    hygiene_staff INTEGER NOT NULL DEFAULT 0,
    revenue REAL NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at TEXT NOT NULL DEFAULT (datetime('now')),
    CHECK ((latitude IS NULL) = (longitude IS NULL))
);

CREATE INDEX IF NOT EXISTS idx_manufacturing_sites_name
    ON manufacturing_sites(name COLLATE NOCASE);
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    #[test]
    fn test_schema_valid() {
        let conn = Connection::open_in_memory().unwrap();
        let result = conn.execute_batch(SCHEMA);
        assert!(result.is_ok(), "Schema should be valid SQL: {:?}", result);
    }

    #[test]
    fn test_schema_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(SCHEMA).unwrap();
        conn.execute_batch(SCHEMA).unwrap();

        // Seeded counters must survive a re-run untouched
        let seeded: i64 = conn
            .query_row("SELECT COUNT(*) FROM code_sequences", [], |row| row.get(0))
            .unwrap();
        assert_eq!(seeded, 6);
    }

    #[test]
    fn test_region_name_unique() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(SCHEMA).unwrap();

        conn.execute("INSERT INTO geo_regions (name) VALUES ('Dakar')", [])
            .unwrap();
        let result = conn.execute("INSERT INTO geo_regions (name) VALUES ('Dakar')", []);
        assert!(result.is_err());
    }

    #[test]
    fn test_coordinates_must_be_paired() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(SCHEMA).unwrap();

        conn.execute("INSERT INTO geo_regions (name) VALUES ('Dakar')", [])
            .unwrap();
        conn.execute(
            "INSERT INTO geo_departments (name, region_id) VALUES ('Dakar', 1)",
            [],
        )
        .unwrap();
        conn.execute(
            "INSERT INTO geo_communes (name, region_id, department_id) VALUES ('Pikine', 1, 1)",
            [],
        )
        .unwrap();

        // Latitude without longitude violates the pairing CHECK
        let result = conn.execute(
            "INSERT INTO depots (code, name, region_id, department_id, commune_id,
                                 locality, address, latitude, phone, opening_year, manager_name)
             VALUES ('dep-0001', 'Depot Pikine', 1, 1, 1, 'Pikine Est', 'Rue 10', 14.75,
                     '+221 77 000 00 00', 2010, 'Moussa Sow')",
            [],
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_restrict_delete_on_referenced_region() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(SCHEMA).unwrap();

        conn.execute("INSERT INTO geo_regions (name) VALUES ('Dakar')", [])
            .unwrap();
        conn.execute(
            "INSERT INTO geo_departments (name, region_id) VALUES ('Rufisque', 1)",
            [],
        )
        .unwrap();

        let result = conn.execute("DELETE FROM geo_regions WHERE id = 1", []);
        assert!(result.is_err());
    }
}
