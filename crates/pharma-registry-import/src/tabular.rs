//! Tabular file reading: CSV and XLSX to header-keyed row maps.

use std::collections::HashMap;

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

use crate::{ImportError, ImportResult};

const UTF8_BOM: &[u8] = b"\xef\xbb\xbf";

/// One data row, keyed by the raw column headers of the source file.
#[derive(Debug, Clone)]
pub struct RowMap {
    cells: HashMap<String, String>,
    line: usize,
}

impl RowMap {
    pub(crate) fn from_pairs(
        line: usize,
        pairs: impl IntoIterator<Item = (String, String)>,
    ) -> Self {
        Self {
            cells: pairs.into_iter().collect(),
            line,
        }
    }

    /// 1-based data row number (header row excluded), for error messages.
    pub fn line(&self) -> usize {
        self.line
    }

    /// Exact-header lookup. Blank cells count as missing.
    pub fn get(&self, header: &str) -> Option<&str> {
        self.cells
            .get(header)
            .map(|value| value.trim())
            .filter(|value| !value.is_empty())
    }

    /// Alias-tolerant lookup used by the geo import: each alias is tried
    /// verbatim, lowercased, uppercased, title-cased and normalized; as a
    /// last resort the stored headers are compared in normalized form, so
    /// `Région` still matches a wanted `REGION`.
    pub fn get_any(&self, aliases: &[&str]) -> Option<&str> {
        for alias in aliases {
            let variants = [
                (*alias).to_string(),
                alias.to_lowercase(),
                alias.to_uppercase(),
                title_case(alias),
                normalize_header(alias),
            ];
            for variant in &variants {
                if let Some(value) = self.get(variant) {
                    return Some(value);
                }
            }
        }
        for alias in aliases {
            let wanted = normalize_header(alias);
            for header in self.cells.keys() {
                if normalize_header(header) == wanted {
                    if let Some(value) = self.get(header) {
                        return Some(value);
                    }
                }
            }
        }
        None
    }

    pub(crate) fn is_blank(&self) -> bool {
        self.cells.values().all(|value| value.trim().is_empty())
    }
}

/// Turn a header into an ASCII-ish uppercase identifier: NFKD decomposition,
/// accents dropped, spaces replaced by underscores.
pub fn normalize_header(header: &str) -> String {
    header
        .trim()
        .nfkd()
        .filter(|c| !is_combining_mark(*c))
        .map(|c| if c == ' ' { '_' } else { c })
        .collect::<String>()
        .to_uppercase()
}

fn title_case(value: &str) -> String {
    value
        .split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first
                    .to_uppercase()
                    .chain(chars.flat_map(char::to_lowercase))
                    .collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

/// Parse an uploaded file into rows. The filename is used only to pick the
/// parser; fully blank rows are dropped.
pub fn read_rows(data: &[u8], filename: &str) -> ImportResult<Vec<RowMap>> {
    let extension = filename
        .rsplit('.')
        .next()
        .unwrap_or_default()
        .to_lowercase();
    match extension.as_str() {
        "csv" => read_csv_rows(data),
        "xlsx" | "xlsm" => read_workbook_rows(data),
        _ => Err(ImportError::UnsupportedFormat(extension)),
    }
}

fn read_csv_rows(data: &[u8]) -> ImportResult<Vec<RowMap>> {
    let data = data.strip_prefix(UTF8_BOM).unwrap_or(data);
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(data);

    let headers = reader.headers()?.clone();
    let mut rows = Vec::new();
    for (index, record) in reader.records().enumerate() {
        let record = record?;
        let pairs = headers
            .iter()
            .zip(record.iter())
            .filter(|(header, _)| !header.is_empty())
            .map(|(header, value)| (header.to_string(), value.to_string()));
        let row = RowMap::from_pairs(index + 1, pairs);
        if row.is_blank() {
            continue;
        }
        rows.push(row);
    }
    Ok(rows)
}

#[cfg(feature = "xlsx")]
fn read_workbook_rows(data: &[u8]) -> ImportResult<Vec<RowMap>> {
    use calamine::{Reader, Xlsx};
    use std::io::Cursor;

    let mut workbook =
        Xlsx::new(Cursor::new(data)).map_err(|e| ImportError::Workbook(e.to_string()))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| ImportError::UserInput("the workbook contains no sheets".into()))?
        .map_err(|e| ImportError::Workbook(e.to_string()))?;

    let mut sheet_rows = range.rows();
    let headers: Vec<String> = match sheet_rows.next() {
        Some(row) => row.iter().map(|cell| cell_to_string(cell)).collect(),
        None => return Ok(Vec::new()),
    };

    let mut rows = Vec::new();
    for (index, sheet_row) in sheet_rows.enumerate() {
        let pairs = headers
            .iter()
            .zip(sheet_row.iter())
            .filter(|(header, _)| !header.is_empty())
            .map(|(header, cell)| (header.clone(), cell_to_string(cell)));
        let row = RowMap::from_pairs(index + 1, pairs);
        if row.is_blank() {
            continue;
        }
        rows.push(row);
    }
    Ok(rows)
}

#[cfg(not(feature = "xlsx"))]
fn read_workbook_rows(_data: &[u8]) -> ImportResult<Vec<RowMap>> {
    Err(ImportError::SpreadsheetSupport)
}

#[cfg(feature = "xlsx")]
fn cell_to_string(cell: &calamine::Data) -> String {
    use calamine::Data;

    match cell {
        Data::Empty | Data::Error(_) => String::new(),
        Data::String(s) => s.trim().to_string(),
        Data::Int(i) => i.to_string(),
        // Integral floats render without the spurious ".0" a spreadsheet
        // would otherwise leak into year and count columns
        Data::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", *f as i64),
        Data::Float(f) => f.to_string(),
        Data::Bool(b) => b.to_string(),
        Data::DateTime(dt) => dt
            .as_datetime()
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_default(),
        Data::DateTimeIso(s) | Data::DurationIso(s) => s.clone(),
    }
}
