//! Pivoted spreadsheet -> condition-grouped workbook
//!
//! The input is a device-per-row sheet (one row per device, stress code
//! and condition corner). The output regroups it per condition corner with
//! per-code statistics and before/after comparisons.

pub mod columns;
pub mod compare;
pub mod grouping;
pub mod input;
pub mod stats;

use crate::config::TransposeConfig;
use crate::error::Result;
use crate::report::transposed;
use grouping::GroupedTable;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Outcome of one transpose run
#[derive(Debug, Clone, Serialize)]
pub struct TransposeSummary {
    pub input: PathBuf,
    pub output: PathBuf,
    pub sheets: Vec<String>,
    pub rows: usize,
    pub serial_columns: usize,
    pub single_device: bool,
}

/// `dir/pivot.xlsx` -> `dir/Transposed_pivot.xlsx`
pub fn default_output_path(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    input.with_file_name(format!("Transposed_{}.xlsx", stem))
}

/// Load `input`, regroup it and write the workbook to `output`
pub fn transpose_file(input: &Path, output: &Path, config: &TransposeConfig) -> Result<TransposeSummary> {
    log::info!("Transposing {:?}", input);

    let table = self::input::load_table(input)?;
    let grouped = GroupedTable::aggregate(&table, config)?;
    let workbook = transposed::build_workbook(&grouped, config)?;
    workbook.save(output)?;

    let sheets: Vec<String> = workbook.sheet_names().into_iter().map(String::from).collect();
    log::info!("Wrote {:?} with sheets: {}", output, sheets.join(", "));

    Ok(TransposeSummary {
        input: input.to_path_buf(),
        output: output.to_path_buf(),
        sheets,
        rows: grouped.row_count(),
        serial_columns: grouped.serials.len(),
        single_device: grouped.single_device,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ReportError;
    use calamine::{open_workbook_auto, Data, Reader};
    use std::io::Write;

    #[test]
    fn test_default_output_path() {
        assert_eq!(
            default_output_path(Path::new("/data/lot7.xlsx")),
            PathBuf::from("/data/Transposed_lot7.xlsx")
        );
        assert_eq!(
            default_output_path(Path::new("pivot.csv")),
            PathBuf::from("Transposed_pivot.xlsx")
        );
    }

    #[test]
    fn test_transpose_csv_end_to_end() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("pivot.csv");
        let mut file = std::fs::File::create(&input).unwrap();
        writeln!(file, "Test_Code,40150000 MSW,40200000 LSW,5030000 PVIN,1000 VOUT").unwrap();
        writeln!(file, "T0,0,1,5,2.0").unwrap();
        writeln!(file, "T168,0,1,5,2.5").unwrap();
        drop(file);
        let output = default_output_path(&input);

        let summary = transpose_file(&input, &output, &TransposeConfig::default()).unwrap();
        assert!(!summary.single_device);
        assert_eq!(summary.serial_columns, 2);
        assert_eq!(
            summary.sheets,
            vec!["All_NoStats_WithDiff", "Only_T0_Stats", "Only_T168_Stats", "T0_vs_T168"]
        );

        let mut workbook = open_workbook_auto(&output).unwrap();
        let range = workbook.worksheet_range("T0_vs_T168").unwrap();
        assert_eq!(range.get_value((0, 12)), Some(&Data::String("1_%_Diff_T0_T168".into())));
        // Rows: MSW, LSW, PVIN, VOUT
        assert_eq!(range.get_value((4, 12)), Some(&Data::Float(25.0)));
    }

    #[test]
    fn test_missing_test_code_column() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("pivot.csv");
        std::fs::write(&input, "Serial,1000 VOUT\n1,2.0\n").unwrap();
        let output = dir.path().join("out.xlsx");

        let err = transpose_file(&input, &output, &TransposeConfig::default()).unwrap_err();
        assert!(matches!(err, ReportError::MissingColumn(ref c) if c == "Test_Code"));
        assert!(err.is_missing_data());
        assert!(!output.exists());
    }
}
