//! Loading the pivoted input sheet
//!
//! Only the first worksheet is read. The first row is the header; every
//! later row is data.

use crate::error::{ReportError, Result};
use crate::workbook::CellValue;
use calamine::{open_workbook_auto, Data, Reader};
use std::path::Path;

/// Cell texts read as missing values in CSV input
const NA_TOKENS: &[&str] = &[
    "", "#N/A", "#N/A N/A", "#NA", "-NaN", "-nan", "<NA>", "N/A", "NA", "NULL", "NaN", "None",
    "n/a", "nan", "null",
];

/// Header row plus data rows of one sheet
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SheetTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<CellValue>>,
}

impl SheetTable {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<CellValue>>) -> Self {
        Self { headers, rows }
    }

    /// Index of the first column with exactly this header
    pub fn column(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Cell at (row, col); short rows read as empty
    pub fn cell(&self, row: usize, col: usize) -> &CellValue {
        const EMPTY: &CellValue = &CellValue::Empty;
        self.rows.get(row).and_then(|r| r.get(col)).unwrap_or(EMPTY)
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}

/// Load a spreadsheet or CSV file by extension
pub fn load_table(path: &Path) -> Result<SheetTable> {
    let extension = path
        .extension()
        .and_then(|s| s.to_str())
        .map(|s| s.to_lowercase());

    let table = match extension.as_deref() {
        Some("xlsx") | Some("xlsm") | Some("xlsb") | Some("xls") | Some("ods") => {
            load_workbook(path)?
        }
        Some("csv") => load_csv(path)?,
        _ => {
            return Err(ReportError::UnsupportedInput(format!(
                "{:?} (expected .xlsx, .xlsm, .xlsb, .xls, .ods or .csv)",
                path
            )))
        }
    };

    log::info!(
        "Loaded {} column(s) x {} row(s) from {:?}",
        table.headers.len(),
        table.rows.len(),
        path
    );
    Ok(table)
}

fn load_workbook(path: &Path) -> Result<SheetTable> {
    let mut workbook = open_workbook_auto(path)?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| ReportError::SheetRead(format!("{:?} has no worksheets", path)))??;

    let mut rows = range.rows();
    let headers = match rows.next() {
        Some(header) => header
            .iter()
            .enumerate()
            .map(|(i, cell)| header_text(i, &data_to_cell(cell)))
            .collect(),
        None => Vec::new(),
    };
    let rows = rows
        .map(|row| row.iter().map(data_to_cell).collect())
        .collect();

    Ok(SheetTable::new(headers, rows))
}

fn load_csv(path: &Path) -> Result<SheetTable> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .has_headers(true)
        .from_path(path)?;

    let headers = reader
        .headers()?
        .iter()
        .enumerate()
        .map(|(i, h)| header_text(i, &CellValue::text(h.trim())))
        .collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        rows.push(record.iter().map(csv_to_cell).collect());
    }

    Ok(SheetTable::new(headers, rows))
}

fn header_text(index: usize, cell: &CellValue) -> String {
    match cell {
        CellValue::Empty => format!("Unnamed: {}", index),
        other => other.to_string(),
    }
}

/// Convert a calamine cell
pub fn data_to_cell(data: &Data) -> CellValue {
    match data {
        Data::Int(v) => CellValue::number(*v as f64),
        Data::Float(v) => CellValue::number(*v),
        Data::String(s) => CellValue::text(s.as_str()),
        Data::Bool(b) => CellValue::text(if *b { "TRUE" } else { "FALSE" }),
        Data::DateTime(dt) => CellValue::number(dt.as_f64()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => CellValue::text(s.as_str()),
        Data::Error(_) | Data::Empty => CellValue::Empty,
    }
}

/// Convert a CSV field: numbers, missing-value tokens, or text
pub fn csv_to_cell(field: &str) -> CellValue {
    let trimmed = field.trim();
    if NA_TOKENS.contains(&trimmed) {
        return CellValue::Empty;
    }
    match trimmed.parse::<f64>() {
        Ok(v) if v.is_finite() => CellValue::Number(v),
        _ => CellValue::text(field),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workbook::{Sheet, Workbook};
    use std::io::Write;

    #[test]
    fn test_csv_cells() {
        assert_eq!(csv_to_cell("1.5"), CellValue::Number(1.5));
        assert_eq!(csv_to_cell(" 42 "), CellValue::Number(42.0));
        assert_eq!(csv_to_cell("NaN"), CellValue::Empty);
        assert_eq!(csv_to_cell(""), CellValue::Empty);
        assert_eq!(csv_to_cell("T168"), CellValue::Text("T168".into()));
    }

    #[test]
    fn test_calamine_cells() {
        assert_eq!(data_to_cell(&Data::Int(3)), CellValue::Number(3.0));
        assert_eq!(data_to_cell(&Data::String(String::new())), CellValue::Empty);
        assert_eq!(data_to_cell(&Data::Bool(true)), CellValue::Text("TRUE".into()));
        assert_eq!(data_to_cell(&Data::Empty), CellValue::Empty);
    }

    #[test]
    fn test_load_csv() {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        writeln!(file, "Test_Code,,1000 VOUT").unwrap();
        writeln!(file, "T0,x,1.25").unwrap();
        writeln!(file, "T168,y").unwrap();
        file.flush().unwrap();

        let table = load_table(file.path()).unwrap();
        assert_eq!(table.headers, vec!["Test_Code", "Unnamed: 1", "1000 VOUT"]);
        assert_eq!(table.row_count(), 2);
        assert_eq!(table.cell(0, 2), &CellValue::Number(1.25));
        assert_eq!(table.cell(1, 2), &CellValue::Empty);
        assert_eq!(table.column("Test_Code"), Some(0));
    }

    #[test]
    fn test_load_xlsx() {
        let mut sheet = Sheet::new("Pivot");
        sheet.write(0, 0, "Test_Code");
        sheet.write(0, 1, 1000.0);
        sheet.write(1, 0, "T0");
        sheet.write(1, 1, 2.5);
        let mut workbook = Workbook::new();
        workbook.add_sheet(sheet);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pivot.xlsx");
        workbook.save(&path).unwrap();

        let table = load_table(&path).unwrap();
        assert_eq!(table.headers, vec!["Test_Code", "1000"]);
        assert_eq!(table.rows, vec![vec![CellValue::Text("T0".into()), CellValue::Number(2.5)]]);
    }

    #[test]
    fn test_unsupported_extension() {
        let err = load_table(Path::new("lot.stdf")).unwrap_err();
        assert!(matches!(err, ReportError::UnsupportedInput(_)));
    }
}
