use crate::cell::RawCell;
use crate::listing::{CleanedTable, CleaningReport, RawRow, clean_rows};
use calamine::{Data, Range, Reader, open_workbook_auto, open_workbook_auto_from_rs};
use log::info;
use std::fs::File;
use std::io::{Cursor, Read};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read workbook: {0}")]
    Workbook(#[from] calamine::Error),
    #[error("failed to read CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("workbook has no sheets")]
    NoSheets,
    #[error("unsupported file extension: {0}")]
    UnsupportedExtension(String),
    #[error("file has no extension")]
    NoExtension,
}

/// The spreadsheet formats an upload may arrive in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SheetFormat {
    Csv,
    Workbook,
}

impl SheetFormat {
    /// Picks a format from a file name's extension, case-insensitively.
    pub fn from_file_name(name: impl AsRef<Path>) -> Result<Self, LoadError> {
        let extension = name
            .as_ref()
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_lowercase());

        match extension.as_deref() {
            Some("csv") => Ok(SheetFormat::Csv),
            Some("xlsx") | Some("xlsm") | Some("xlsb") | Some("xls") | Some("ods") => {
                Ok(SheetFormat::Workbook)
            }
            Some(ext) => Err(LoadError::UnsupportedExtension(ext.to_string())),
            None => Err(LoadError::NoExtension),
        }
    }
}

/// Reads the data rows of a CSV source. The header line is skipped.
pub fn rows_from_csv<R: Read>(reader: R) -> Result<Vec<RawRow>, LoadError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        rows.push(RawRow::from_cells(record.iter().map(RawCell::from)));
    }
    Ok(rows)
}

/// Reads the data rows of the first worksheet. The header row is skipped.
pub fn rows_from_range(range: &Range<Data>) -> Vec<RawRow> {
    range
        .rows()
        .skip(1)
        .map(|row| RawRow::from_cells(row.iter().map(RawCell::from)))
        .collect()
}

/// Load the raw rows of a spreadsheet file on disk, detecting its format from the
/// extension.
///
/// # Examples
/// ```no_run
/// use wheeldash::loader::load_rows;
///
/// match load_rows("vehicle cost analysis2.xlsx") {
///     Ok(rows) => println!("read {} rows", rows.len()),
///     Err(e) => eprintln!("Error loading file: {}", e),
/// }
/// ```
pub fn load_rows(filepath: impl AsRef<Path>) -> Result<Vec<RawRow>, LoadError> {
    let path = filepath.as_ref();
    match SheetFormat::from_file_name(path)? {
        SheetFormat::Csv => rows_from_csv(File::open(path)?),
        SheetFormat::Workbook => {
            let mut workbook = open_workbook_auto(path)?;
            let range = workbook
                .worksheet_range_at(0)
                .ok_or(LoadError::NoSheets)??;
            Ok(rows_from_range(&range))
        }
    }
}

/// Load the raw rows of an uploaded file held in memory. `file_name` only decides
/// the format.
pub fn load_rows_from_bytes(file_name: &str, bytes: Vec<u8>) -> Result<Vec<RawRow>, LoadError> {
    match SheetFormat::from_file_name(file_name)? {
        SheetFormat::Csv => rows_from_csv(bytes.as_slice()),
        SheetFormat::Workbook => {
            let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))?;
            let range = workbook
                .worksheet_range_at(0)
                .ok_or(LoadError::NoSheets)??;
            Ok(rows_from_range(&range))
        }
    }
}

/// Loads and cleans a listing sheet from disk.
pub fn load_table(
    filepath: impl AsRef<Path>,
) -> Result<(CleanedTable, CleaningReport), LoadError> {
    let path = filepath.as_ref();
    let rows = load_rows(path)?;
    info!("loaded {} rows from {}", rows.len(), path.display());
    Ok(clean_rows(rows))
}

/// Loads and cleans an uploaded listing sheet.
pub fn load_table_from_bytes(
    file_name: &str,
    bytes: Vec<u8>,
) -> Result<(CleanedTable, CleaningReport), LoadError> {
    let rows = load_rows_from_bytes(file_name, bytes)?;
    info!("loaded {} rows from upload {}", rows.len(), file_name);
    Ok(clean_rows(rows))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SHEET: &str = "\
S.No,Brand,Model,Mode Price,Ex-Showroom,On-Road,Colors,Mileage,Fuel Capacity,Meter,Gear,Insurance
1,Honda,Shine,\"₹79,000\",\"₹76,000\",\"₹82,500\",Red,55,10.5,Digital,Manual,\"₹4,000\"
2,TVS,Jupiter,,,N/A,Blue,50,6,Analog,Automatic,
3,Hero,Splendor,,,\"₹75,000\",Black,\"70\n\",9.8,Analog,Manual,
";

    #[test]
    fn csv_header_is_skipped_and_cells_are_typed_as_text() {
        let rows = rows_from_csv(SHEET.as_bytes()).unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].cell(1), &RawCell::Text("Honda".to_string()));
        assert!(rows[1].cell(3).is_missing());
    }

    #[test]
    fn csv_upload_is_cleaned() {
        let (table, report) = load_table_from_bytes("bikes.CSV", SHEET.as_bytes().to_vec()).unwrap();
        assert_eq!(report.rows_read, 3);
        assert_eq!(report.rows_retained, 2);
        assert_eq!(table.listings()[0].on_road_price, 82500);
        assert_eq!(table.listings()[1].mileage_kmpl, 70.0);
    }

    #[test]
    fn format_follows_the_extension() {
        assert_eq!(SheetFormat::from_file_name("a.xlsx").unwrap(), SheetFormat::Workbook);
        assert_eq!(SheetFormat::from_file_name("a.Csv").unwrap(), SheetFormat::Csv);
        assert!(matches!(
            SheetFormat::from_file_name("a.json"),
            Err(LoadError::UnsupportedExtension(ext)) if ext == "json"
        ));
        assert!(matches!(
            SheetFormat::from_file_name("listing"),
            Err(LoadError::NoExtension)
        ));
    }

    #[test]
    fn garbage_workbook_is_a_load_error() {
        let result = load_rows_from_bytes("bikes.xlsx", b"definitely not a zip".to_vec());
        assert!(matches!(result, Err(LoadError::Workbook(_))));
    }
}
