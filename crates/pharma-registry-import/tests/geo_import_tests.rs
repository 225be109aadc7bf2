//! Geo import pipeline integration tests.

use pharma_registry_core::Database;
use pharma_registry_import::{GeoImporter, ImportError};

const GEO_CSV: &[u8] =
    b"REGION,DEPARTEMENT,COMMUNE\nDakar,Dakar,Pikine\nDakar,Dakar,Pikine\n";

#[test]
fn test_duplicate_rows_create_once() {
    let db = Database::open_in_memory().unwrap();
    let summary = GeoImporter::new(&db).import(GEO_CSV, "geo.csv").unwrap();

    assert_eq!(summary.regions_created, 1);
    assert_eq!(summary.departments_created, 1);
    assert_eq!(summary.communes_created, 1);
    assert_eq!(summary.to_string(), "1 regions created, 1 departments created, 1 communes created.");
}

#[test]
fn test_second_run_is_idempotent() {
    let db = Database::open_in_memory().unwrap();
    let importer = GeoImporter::new(&db);
    importer.import(GEO_CSV, "geo.csv").unwrap();

    let summary = importer.import(GEO_CSV, "geo.csv").unwrap();
    assert_eq!(summary.regions_created, 0);
    assert_eq!(summary.departments_created, 0);
    assert_eq!(summary.communes_created, 0);

    assert_eq!(db.list_regions().unwrap().len(), 1);
}

#[test]
fn test_matching_is_case_insensitive() {
    let db = Database::open_in_memory().unwrap();
    let importer = GeoImporter::new(&db);
    importer.import(GEO_CSV, "geo.csv").unwrap();

    let summary = importer
        .import(
            b"REGION,DEPARTEMENT,COMMUNE\nDAKAR,dakar,PIKINE\n",
            "geo.csv",
        )
        .unwrap();
    assert_eq!(summary.regions_created, 0);
    assert_eq!(summary.departments_created, 0);
    assert_eq!(summary.communes_created, 0);
}

#[test]
fn test_accented_headers_are_tolerated() {
    let db = Database::open_in_memory().unwrap();
    let summary = GeoImporter::new(&db)
        .import(
            "Région,Département,Commune\nFatick,Foundiougne,Soum\n".as_bytes(),
            "geo.csv",
        )
        .unwrap();

    assert_eq!(summary.regions_created, 1);
    assert_eq!(summary.departments_created, 1);
    assert_eq!(summary.communes_created, 1);

    let region = db.find_region_by_name("Fatick").unwrap().unwrap();
    let dept = db
        .find_department_by_name("Foundiougne", region.id)
        .unwrap()
        .unwrap();
    assert!(db.find_commune_by_name("Soum", dept.id).unwrap().is_some());
}

#[test]
fn test_region_only_rows_are_fine() {
    let db = Database::open_in_memory().unwrap();
    let summary = GeoImporter::new(&db)
        .import(b"REGION\nKaolack\nKaffrine\n", "geo.csv")
        .unwrap();
    assert_eq!(summary.regions_created, 2);
    assert_eq!(summary.departments_created, 0);
}

#[test]
fn test_commune_without_department_is_skipped() {
    let db = Database::open_in_memory().unwrap();
    let summary = GeoImporter::new(&db)
        .import(
            b"REGION,DEPARTEMENT,COMMUNE\nKaolack,,Kahone\n",
            "geo.csv",
        )
        .unwrap();
    assert_eq!(summary.regions_created, 1);
    assert_eq!(summary.departments_created, 0);
    assert_eq!(summary.communes_created, 0);
}

#[test]
fn test_missing_region_aborts_whole_file() {
    let db = Database::open_in_memory().unwrap();
    let result = GeoImporter::new(&db).import(
        b"REGION,DEPARTEMENT,COMMUNE\nDakar,Dakar,Pikine\n,Oops,Nulle Part\n",
        "geo.csv",
    );

    let err = result.unwrap_err();
    assert!(matches!(err, ImportError::UserInput(_)));
    assert!(err.to_string().contains("row 2"));
    assert!(err.to_string().contains("REGION"));

    // Nothing from the file survives, including the valid first row
    assert!(db.list_regions().unwrap().is_empty());
}

#[test]
fn test_empty_file_rejected() {
    let db = Database::open_in_memory().unwrap();
    let result = GeoImporter::new(&db).import(b"REGION,DEPARTEMENT,COMMUNE\n", "geo.csv");
    assert!(matches!(result, Err(ImportError::UserInput(_))));
}

#[test]
fn test_unsupported_extension_rejected() {
    let db = Database::open_in_memory().unwrap();
    let result = GeoImporter::new(&db).import(GEO_CSV, "geo.txt");
    assert!(matches!(result, Err(ImportError::UnsupportedFormat(ext)) if ext == "txt"));
}

#[test]
fn test_departments_scoped_by_region() {
    let db = Database::open_in_memory().unwrap();
    // Two regions may both own a department named after themselves
    let summary = GeoImporter::new(&db)
        .import(
            b"REGION,DEPARTEMENT\nDakar,Centre\nThies,Centre\n",
            "geo.csv",
        )
        .unwrap();
    assert_eq!(summary.regions_created, 2);
    assert_eq!(summary.departments_created, 2);
}
