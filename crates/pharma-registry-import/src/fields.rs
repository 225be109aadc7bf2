//! Typed cell extraction and coercion.
//!
//! Every helper either returns a typed value or an error naming the row and
//! column, so a bad cell is reported in operator terms.

use chrono::NaiveDate;
use pharma_registry_core::GeoPoint;

use crate::tabular::RowMap;
use crate::{ImportError, ImportResult};

/// Date renderings accepted by the licence-date column.
const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%d/%m/%Y", "%d-%m-%Y"];

pub fn optional_text(row: &RowMap, key: &str) -> Option<String> {
    row.get(key).map(str::to_string)
}

pub fn required_text(row: &RowMap, key: &str) -> ImportResult<String> {
    row.get(key).map(str::to_string).ok_or_else(|| {
        ImportError::UserInput(format!("row {}: column '{}' is required", row.line(), key))
    })
}

/// Required integer year. Workbook exports render integral cells as "2005"
/// thanks to the tabular layer, but "2005.0" is tolerated anyway.
pub fn required_year(row: &RowMap, key: &str) -> ImportResult<i32> {
    parse_required_year(row.line(), key, row.get(key))
}

/// Same as [`required_year`], with the value already plucked (used when a
/// column has legacy header spellings).
pub fn parse_required_year(line: usize, key: &str, value: Option<&str>) -> ImportResult<i32> {
    let value = value.ok_or_else(|| {
        ImportError::UserInput(format!("row {}: column '{}' is required", line, key))
    })?;
    parse_int(value)
        .and_then(|n| i32::try_from(n).ok())
        .ok_or_else(|| {
            ImportError::UserInput(format!(
                "row {}: column '{}' must be a year, got '{}'",
                line, key, value
            ))
        })
}

/// Required non-negative count.
pub fn required_count(row: &RowMap, key: &str) -> ImportResult<u32> {
    let value = row.get(key).ok_or_else(|| {
        ImportError::UserInput(format!("row {}: column '{}' is required", row.line(), key))
    })?;
    parse_int(value)
        .and_then(|n| u32::try_from(n).ok())
        .ok_or_else(|| {
            ImportError::UserInput(format!(
                "row {}: column '{}' must be a non-negative number, got '{}'",
                row.line(),
                key,
                value
            ))
        })
}

/// Optional count; unparseable values are dropped, not reported.
pub fn optional_count(row: &RowMap, key: &str) -> Option<u32> {
    row.get(key)
        .and_then(parse_int)
        .and_then(|n| u32::try_from(n).ok())
}

/// Revenue figure; blank or unparseable cells read as zero.
pub fn money(row: &RowMap, key: &str) -> f64 {
    row.get(key).and_then(parse_float).unwrap_or(0.0)
}

pub fn required_date(row: &RowMap, key: &str) -> ImportResult<NaiveDate> {
    let value = row.get(key).ok_or_else(|| {
        ImportError::UserInput(format!("row {}: column '{}' is required", row.line(), key))
    })?;
    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(value, format) {
            return Ok(date);
        }
    }
    Err(ImportError::UserInput(format!(
        "row {}: unknown date format: {}",
        row.line(),
        value
    )))
}

/// Coordinate extraction. The dedicated LATITUDE/LONGITUDE columns win; when
/// either is blank or unparseable, the combined free-text column is used
/// instead, and that one carries longitude first (see
/// [`GeoPoint::from_combined`]).
pub fn coordinates(row: &RowMap) -> Option<GeoPoint> {
    let latitude = row.get("LATITUDE").and_then(parse_float);
    let longitude = row.get("LONGITUDE").and_then(parse_float);
    match (latitude, longitude) {
        (Some(latitude), Some(longitude)) => Some(GeoPoint {
            latitude,
            longitude,
        }),
        _ => row
            .get("POINTS DE GEOLOCALISATION")
            .and_then(GeoPoint::from_combined),
    }
}

/// Integer coercion through a float intermediate, so "12", "12.0" and
/// spreadsheet renderings all land on 12.
fn parse_int(value: &str) -> Option<i64> {
    let value = value.trim();
    if let Ok(n) = value.parse::<i64>() {
        return Some(n);
    }
    let f = value.parse::<f64>().ok()?;
    if f.is_finite() {
        Some(f as i64)
    } else {
        None
    }
}

fn parse_float(value: &str) -> Option<f64> {
    value.trim().parse::<f64>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tabular::read_rows;

    fn row_from(csv: &str) -> RowMap {
        read_rows(csv.as_bytes(), "test.csv").unwrap().remove(0)
    }

    #[test]
    fn test_required_text_missing_names_column() {
        let row = row_from("A,B\n1,\n");
        let err = required_text(&row, "B").unwrap_err();
        assert!(err.to_string().contains("'B'"));
        assert!(err.to_string().contains("row 1"));
    }

    #[test]
    fn test_year_tolerates_float_rendering() {
        let row = row_from("ANNEE\n2005.0\n");
        assert_eq!(required_year(&row, "ANNEE").unwrap(), 2005);
    }

    #[test]
    fn test_year_rejects_text() {
        let row = row_from("ANNEE\nvers 2005\n");
        assert!(required_year(&row, "ANNEE").is_err());
    }

    #[test]
    fn test_counts() {
        let row = row_from("N,M,X\n4,-2,abc\n");
        assert_eq!(required_count(&row, "N").unwrap(), 4);
        assert!(required_count(&row, "M").is_err());
        assert_eq!(optional_count(&row, "X"), None);
        assert_eq!(optional_count(&row, "N"), Some(4));
    }

    #[test]
    fn test_money_defaults_to_zero() {
        let row = row_from("CA,VIDE,TXT\n1500000.5,,n/a\n");
        assert_eq!(money(&row, "CA"), 1_500_000.5);
        assert_eq!(money(&row, "VIDE"), 0.0);
        assert_eq!(money(&row, "TXT"), 0.0);
    }

    #[test]
    fn test_date_formats() {
        let expected = NaiveDate::from_ymd_opt(2018, 3, 12).unwrap();
        for value in ["2018-03-12", "12/03/2018", "12-03-2018"] {
            let row = row_from(&format!("DATE\n{}\n", value));
            assert_eq!(required_date(&row, "DATE").unwrap(), expected);
        }
    }

    #[test]
    fn test_date_unknown_format() {
        let row = row_from("DATE\n12 mars 2018\n");
        let err = required_date(&row, "DATE").unwrap_err();
        assert!(err.to_string().contains("unknown date format"));
    }

    #[test]
    fn test_dedicated_coordinates_win() {
        let row = row_from(
            "LATITUDE,LONGITUDE,POINTS DE GEOLOCALISATION\n14.7,-17.4,\"99.0,99.0\"\n",
        );
        let point = coordinates(&row).unwrap();
        assert_eq!(point.latitude, 14.7);
        assert_eq!(point.longitude, -17.4);
    }

    #[test]
    fn test_combined_column_is_longitude_first() {
        let row = row_from("LATITUDE,LONGITUDE,POINTS DE GEOLOCALISATION\n,,\"-17.4,14.7\"\n");
        let point = coordinates(&row).unwrap();
        assert_eq!(point.longitude, -17.4);
        assert_eq!(point.latitude, 14.7);
    }

    #[test]
    fn test_partial_dedicated_falls_back_to_combined() {
        let row = row_from("LATITUDE,LONGITUDE,POINTS DE GEOLOCALISATION\n14.7,,\"-1.0,2.0\"\n");
        let point = coordinates(&row).unwrap();
        assert_eq!(point.longitude, -1.0);
        assert_eq!(point.latitude, 2.0);
    }

    #[test]
    fn test_no_coordinates_at_all() {
        let row = row_from("NOM,LATITUDE,LONGITUDE\nx,,\n");
        assert!(coordinates(&row).is_none());
    }
}
