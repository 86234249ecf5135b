use crate::data::table::{Cell, Table};
use crate::{Result, ScatterError};
use std::path::Path;

/// Supported input formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataFormat {
    Csv,
    Excel,
}

const ZIP_MAGIC: &[u8] = b"PK\x03\x04";
const OLE_MAGIC: &[u8] = &[0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];
const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

impl DataFormat {
    /// Format implied by a file extension
    pub fn from_path(path: &Path) -> Option<Self> {
        let extension = path.extension()?.to_str()?.to_ascii_lowercase();
        match extension.as_str() {
            "csv" | "txt" => Some(DataFormat::Csv),
            "xlsx" | "xlsm" | "xlsb" | "xls" | "ods" => Some(DataFormat::Excel),
            _ => None,
        }
    }

    /// Format implied by an upload's media type
    pub fn from_media_type(media_type: &str) -> Self {
        if media_type.trim().eq_ignore_ascii_case("text/csv") {
            DataFormat::Csv
        } else {
            DataFormat::Excel
        }
    }

    /// Guesses the format from the leading bytes: workbooks are ZIP or OLE
    /// containers, anything else is read as CSV.
    pub fn sniff(bytes: &[u8]) -> Self {
        if bytes.starts_with(ZIP_MAGIC) || bytes.starts_with(OLE_MAGIC) {
            DataFormat::Excel
        } else {
            DataFormat::Csv
        }
    }
}

/// Reads a table from a file, picking the format from its extension or content
pub fn load_path(path: impl AsRef<Path>) -> Result<Table> {
    let path = path.as_ref();
    let bytes = std::fs::read(path)?;
    let format = DataFormat::from_path(path);
    log::debug!("reading {} ({} bytes, {:?})", path.display(), bytes.len(), format);
    load_bytes(&bytes, format)
}

/// Reads a table from an in-memory upload
pub fn load_bytes(bytes: &[u8], format: Option<DataFormat>) -> Result<Table> {
    let format = format.unwrap_or_else(|| DataFormat::sniff(bytes));
    let table = match format {
        DataFormat::Csv => parse_csv(bytes)?,
        DataFormat::Excel => parse_excel(bytes)?,
    };
    log::info!(
        "loaded {} rows x {} columns",
        table.row_count(),
        table.column_count()
    );
    for column in table.columns() {
        log::debug!(
            "column '{}': {}",
            column.name(),
            if column.is_numeric() { "numeric" } else { "text" }
        );
    }
    Ok(table)
}

fn parse_csv(bytes: &[u8]) -> Result<Table> {
    let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(bytes);

    let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
    if headers.is_empty() || headers.iter().all(|h| h.is_empty()) {
        return Err(ScatterError::FileParse("missing header row".into()));
    }

    let mut records = Vec::new();
    for record in reader.records() {
        let record = record?;
        records.push(record.iter().map(Cell::from_text).collect());
    }

    Table::from_records(headers, records)
}

#[cfg(feature = "excel")]
fn parse_excel(bytes: &[u8]) -> Result<Table> {
    use calamine::{open_workbook_auto_from_rs, Data, Reader};
    use std::io::Cursor;

    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))
        .map_err(|e| ScatterError::FileParse(format!("unreadable workbook: {}", e)))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| ScatterError::FileParse("workbook has no worksheet".into()))?
        .map_err(|e| ScatterError::FileParse(format!("unreadable worksheet: {}", e)))?;

    let mut rows = range.rows();
    let headers: Vec<String> = rows
        .next()
        .ok_or_else(|| ScatterError::FileParse("missing header row".into()))?
        .iter()
        .map(|cell| match cell {
            Data::Empty => String::new(),
            other => other.to_string(),
        })
        .collect();

    let records = rows
        .map(|row| {
            row.iter()
                .map(|cell| match cell {
                    Data::Empty => Cell::Empty,
                    Data::Int(value) => Cell::Number(*value as f64),
                    Data::Float(value) => Cell::Number(*value),
                    Data::String(text) => Cell::from_text(text),
                    other => Cell::Text(other.to_string()),
                })
                .collect()
        })
        .collect();

    Table::from_records(headers, records)
}

#[cfg(not(feature = "excel"))]
fn parse_excel(_bytes: &[u8]) -> Result<Table> {
    Err(ScatterError::FileParse(
        "Excel support is disabled (build with the `excel` feature)".into(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_detect_format() {
        assert_eq!(
            DataFormat::from_path(Path::new("points.CSV")),
            Some(DataFormat::Csv)
        );
        assert_eq!(
            DataFormat::from_path(Path::new("points.xlsx")),
            Some(DataFormat::Excel)
        );
        assert_eq!(DataFormat::from_path(Path::new("points")), None);
        assert_eq!(DataFormat::from_media_type("text/csv"), DataFormat::Csv);
        assert_eq!(
            DataFormat::from_media_type(
                "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
            ),
            DataFormat::Excel
        );
        assert_eq!(DataFormat::sniff(b"PK\x03\x04rest"), DataFormat::Excel);
        assert_eq!(DataFormat::sniff(b"lat,lon\n1,2\n"), DataFormat::Csv);
    }

    #[test]
    fn test_parse_csv() {
        let table = load_bytes(
            b"\xEF\xBB\xBFname, latitude ,longitude\nLyon, 45.76 ,4.83\nParis,48.85,2.35\n",
            Some(DataFormat::Csv),
        )
        .unwrap();

        assert_eq!(table.column_names(), vec!["name", "latitude", "longitude"]);
        assert_eq!(table.numeric("latitude").unwrap(), &[45.76, 48.85]);
        assert!(!table.column("name").unwrap().is_numeric());
    }

    #[test]
    fn test_parse_csv_with_missing_cells() {
        let table = load_bytes(b"lat,lon,v\n1,2,\n3,4,5\n", None).unwrap();
        let v = table.numeric("v").unwrap();
        assert!(v[0].is_nan());
        assert_eq!(v[1], 5.0);
    }

    #[test]
    fn test_ragged_csv_fails() {
        let result = load_bytes(b"lat,lon\n1,2\n3\n", Some(DataFormat::Csv));
        assert!(matches!(result, Err(ScatterError::FileParse(_))));
    }

    #[test]
    fn test_empty_csv_fails() {
        assert!(matches!(
            load_bytes(b"", Some(DataFormat::Csv)),
            Err(ScatterError::FileParse(_))
        ));
    }

    #[test]
    fn test_load_path() {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        writeln!(file, "lat,lng").unwrap();
        writeln!(file, "10,20").unwrap();
        let table = load_path(file.path()).unwrap();
        assert_eq!(table.row_count(), 1);
        assert_eq!(table.numeric("lng").unwrap(), &[20.0]);
    }

    #[cfg(feature = "excel")]
    #[test]
    fn test_garbage_workbook_fails() {
        let result = load_bytes(b"PK\x03\x04 definitely not a zip", None);
        assert!(matches!(result, Err(ScatterError::FileParse(_))));
    }
}
