//! Condition-grouped workbook
//!
//! Sheets, in order: `All_NoStats_WithDiff`, one `Only_<code>_Stats` per
//! code, one `<c1>_vs_<c2>` per comparable code pair.

use crate::config::TransposeConfig;
use crate::error::Result;
use crate::transpose::compare::{comparable_bases, comparisons_enabled, CodePair};
use crate::transpose::grouping::{ConditionKey, GroupedTable, TestRow};
use crate::transpose::stats::Stats;
use crate::workbook::{check_column_count, CellValue, Sheet, Workbook};

pub const PRIMARY_SHEET: &str = "All_NoStats_WithDiff";

const META_HEADERS: [&str; 5] = ["testnum", "test", "sub", "trim", "fine"];
const CONDITION_HEADERS: [&str; 4] = ["PVIN", "AVIN", "VDDIO", "TEMP"];
const STAT_HEADERS: [&str; 3] = ["Average", "StdDev", "StdDev%"];
const META_WIDTH: u16 = (META_HEADERS.len() + CONDITION_HEADERS.len()) as u16;
const COLUMN_WIDTH: f64 = 14.0;

/// Lay out every sheet; fails when a sheet is wider than Excel allows
pub fn build_workbook(grouped: &GroupedTable, config: &TransposeConfig) -> Result<Workbook> {
    let mut workbook = Workbook::new();
    let all_serials: Vec<usize> = (0..grouped.serials.len()).collect();

    let overall = |row: &TestRow| row.overall_stats();
    let overall_stats = config
        .include_overall_stats
        .then_some(&overall as &dyn Fn(&TestRow) -> Stats);
    workbook.add_sheet(serial_sheet(PRIMARY_SHEET, grouped, &all_serials, overall_stats)?);

    if !grouped.single_device {
        for code in &grouped.codes {
            let serials = grouped.serials_with_code(code);
            if serials.is_empty() {
                continue;
            }
            let sample = |row: &TestRow| Stats::sample(&row.numeric_values(&serials));
            let name = workbook.unique_sheet_name(&format!("Only_{}_Stats", code));
            let stats: &dyn Fn(&TestRow) -> Stats = &sample;
            workbook.add_sheet(serial_sheet(&name, grouped, &serials, Some(stats))?);
        }
    }

    if comparisons_enabled(grouped) {
        for pair in CodePair::from_config(&config.code_pairs) {
            let name = workbook.unique_sheet_name(&pair.sheet_name());
            if let Some(sheet) = comparison_sheet(&name, grouped, &pair)? {
                workbook.add_sheet(sheet);
            }
        }
    }

    Ok(workbook)
}

fn write_headers(sheet: &mut Sheet) {
    for (col, header) in META_HEADERS.iter().chain(CONDITION_HEADERS.iter()).enumerate() {
        sheet.write(0, col as u16, *header);
    }
}

fn write_meta(sheet: &mut Sheet, row: u32, condition: &ConditionKey, test: &TestRow) {
    let column = &test.column;
    sheet.write(row, 0, column.number as f64);
    sheet.write(row, 1, column.name.as_str());
    sheet.write(row, 2, column.sub_label.clone().unwrap_or_default());
    sheet.write(row, 3, column.trim_code.map(|v| v as f64));
    sheet.write(row, 4, column.fine_code.map(|v| v as f64));
    for (i, reading) in condition.0.iter().enumerate() {
        sheet.write(row, META_HEADERS.len() as u16 + i as u16, reading.clone());
    }
}

/// Meta columns, one column per serial repeat, then optional statistics
fn serial_sheet(
    name: &str,
    grouped: &GroupedTable,
    serials: &[usize],
    stats: Option<&dyn Fn(&TestRow) -> Stats>,
) -> Result<Sheet> {
    let layout: Vec<(usize, usize)> = serials
        .iter()
        .flat_map(|&serial| (0..grouped.slots(serial)).map(move |slot| (serial, slot)))
        .collect();
    let stat_columns = if stats.is_some() { STAT_HEADERS.len() } else { 0 };
    check_column_count(name, META_WIDTH as usize + layout.len() + stat_columns)?;

    let mut sheet = Sheet::new(name);
    write_headers(&mut sheet);
    for (j, &(serial, _)) in layout.iter().enumerate() {
        sheet.write(0, META_WIDTH + j as u16, grouped.serial_label(serial));
    }
    let stats_col = META_WIDTH + layout.len() as u16;
    if stats.is_some() {
        for (i, header) in STAT_HEADERS.iter().enumerate() {
            sheet.write(0, stats_col + i as u16, *header);
        }
    }

    for (i, (condition, test)) in grouped.rows().enumerate() {
        let row = 1 + i as u32;
        write_meta(&mut sheet, row, condition, test);
        for (j, &(serial, slot)) in layout.iter().enumerate() {
            sheet.write(row, META_WIDTH + j as u16, test.value(serial, slot).clone());
        }
        if let Some(stats) = stats {
            let s = stats(test);
            sheet.write(row, stats_col, s.mean);
            sheet.write(row, stats_col + 1, s.stddev);
            sheet.write(row, stats_col + 2, s.stddev_pct);
        }
    }

    format_sheet(&mut sheet);
    Ok(sheet)
}

fn comparison_sheet(name: &str, grouped: &GroupedTable, pair: &CodePair) -> Result<Option<Sheet>> {
    let bases = comparable_bases(grouped, pair);
    if bases.is_empty() {
        log::debug!("No device measured under both {} and {}", pair.first, pair.second);
        return Ok(None);
    }
    check_column_count(name, META_WIDTH as usize + 4 * bases.len())?;

    let mut sheet = Sheet::new(name);
    write_headers(&mut sheet);
    for (b, base) in bases.iter().enumerate() {
        for (k, header) in base.headers(pair).into_iter().enumerate() {
            sheet.write(0, META_WIDTH + (4 * b + k) as u16, header);
        }
    }

    for (i, (condition, test)) in grouped.rows().enumerate() {
        let row = 1 + i as u32;
        write_meta(&mut sheet, row, condition, test);
        for (b, base) in bases.iter().enumerate() {
            for (k, value) in base.values(test).into_iter().enumerate() {
                sheet.write(row, META_WIDTH + (4 * b + k) as u16, value);
            }
        }
    }

    format_sheet(&mut sheet);
    Ok(Some(sheet))
}

/// Freeze the header row, fix column widths, two decimals for percent diffs
fn format_sheet(sheet: &mut Sheet) {
    sheet.set_freeze_panes(1, 0);

    let columns = sheet.column_count();
    let rows = sheet.row_count();
    for col in 0..columns {
        sheet.set_column_width(col, COLUMN_WIDTH);

        let is_pct = matches!(sheet.value(0, col), CellValue::Text(h) if h.contains("%_Diff"));
        if !is_pct {
            continue;
        }
        for row in 1..rows {
            if matches!(sheet.value(row, col), CellValue::Number(_)) {
                sheet.update_style(row, col, |s| s.two_decimals = true);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ReportError;
    use crate::transpose::input::SheetTable;
    use crate::workbook::MAX_COLUMNS;

    fn table(rows: &[(&str, f64, f64)]) -> SheetTable {
        let headers = [
            "Test_Code",
            "40150000 MSW",
            "40200000 LSW",
            "5030000 PVIN",
            "5035000 AVIN",
            "5040000 VDDIO",
            "5050000 TEMP",
            "1000 VOUT: Fine Code 3",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();
        let rows = rows
            .iter()
            .map(|(code, lsw, vout)| {
                vec![
                    CellValue::text(*code),
                    CellValue::Number(0.0),
                    CellValue::Number(*lsw),
                    CellValue::Number(5.0),
                    CellValue::Number(3.3),
                    CellValue::Number(1.8),
                    CellValue::Number(25.0),
                    CellValue::Number(*vout),
                ]
            })
            .collect();
        SheetTable::new(headers, rows)
    }

    fn build(rows: &[(&str, f64, f64)], config: &TransposeConfig) -> Workbook {
        let grouped = GroupedTable::aggregate(&table(rows), config).unwrap();
        build_workbook(&grouped, config).unwrap()
    }

    fn header(sheet: &Sheet) -> Vec<String> {
        (0..sheet.column_count()).map(|c| sheet.value(0, c).to_string()).collect()
    }

    /// Row of the VOUT test in a single-group sheet
    const VOUT_ROW: u32 = 7;

    #[test]
    fn test_sheet_set() {
        let wb = build(
            &[("T0", 1.0, 2.0), ("T0", 2.0, 4.0), ("T168", 1.0, 3.0)],
            &TransposeConfig::default(),
        );
        assert_eq!(
            wb.sheet_names(),
            vec![PRIMARY_SHEET, "Only_T0_Stats", "Only_T168_Stats", "T0_vs_T168"]
        );
    }

    #[test]
    fn test_primary_sheet() {
        let wb = build(&[("T0", 1.0, 2.0), ("T168", 1.0, 3.0)], &TransposeConfig::default());
        let sheet = wb.sheet(PRIMARY_SHEET).unwrap();

        assert_eq!(
            header(sheet),
            vec![
                "testnum", "test", "sub", "trim", "fine", "PVIN", "AVIN", "VDDIO", "TEMP", "1_T0",
                "1_T168"
            ]
        );
        assert_eq!(sheet.value(VOUT_ROW, 0), CellValue::Number(1000.0));
        assert_eq!(sheet.value(VOUT_ROW, 1), CellValue::text("VOUT"));
        assert_eq!(sheet.value(VOUT_ROW, 2), CellValue::Empty);
        assert_eq!(sheet.value(VOUT_ROW, 4), CellValue::Number(3.0));
        assert_eq!(sheet.value(VOUT_ROW, 5), CellValue::Number(5.0));
        assert_eq!(sheet.value(VOUT_ROW, 10), CellValue::Number(3.0));
        assert_eq!(sheet.freeze_panes(), Some((1, 0)));
        assert_eq!(sheet.column_width(10), Some(14.0));
    }

    #[test]
    fn test_overall_stats_are_optional() {
        let config = TransposeConfig {
            include_overall_stats: true,
            ..TransposeConfig::default()
        };
        let wb = build(&[("T0", 1.0, 2.0), ("T168", 1.0, 4.0)], &config);
        let sheet = wb.sheet(PRIMARY_SHEET).unwrap();

        assert_eq!(header(sheet)[11..], ["Average", "StdDev", "StdDev%"]);
        assert_eq!(sheet.value(VOUT_ROW, 11), CellValue::Number(3.0));
        assert_eq!(sheet.value(VOUT_ROW, 12), CellValue::Number(1.0));
        assert_eq!(sheet.value(VOUT_ROW, 13), CellValue::Number(0.33));
    }

    #[test]
    fn test_per_code_sheet_uses_sample_stats() {
        let wb = build(
            &[("T0", 1.0, 2.0), ("T0", 2.0, 4.0), ("T168", 1.0, 3.0)],
            &TransposeConfig::default(),
        );
        let t0 = wb.sheet("Only_T0_Stats").unwrap();
        assert_eq!(header(t0)[9..], ["1_T0", "2_T0", "Average", "StdDev", "StdDev%"]);
        assert_eq!(t0.value(VOUT_ROW, 11), CellValue::Number(3.0));
        assert_eq!(t0.value(VOUT_ROW, 12), CellValue::Number(2f64.sqrt()));

        let t168 = wb.sheet("Only_T168_Stats").unwrap();
        assert_eq!(t168.value(VOUT_ROW, 10), CellValue::Number(3.0));
        assert_eq!(t168.value(VOUT_ROW, 11), CellValue::Empty);
    }

    #[test]
    fn test_comparison_sheet() {
        let wb = build(
            &[("T0", 1.0, 2.0), ("T0", 2.0, 4.0), ("T168", 1.0, 3.0)],
            &TransposeConfig::default(),
        );
        let sheet = wb.sheet("T0_vs_T168").unwrap();

        assert_eq!(
            header(sheet)[9..],
            ["1_T0", "1_T168", "1_Diff_T0_T168", "1_%_Diff_T0_T168"]
        );
        assert_eq!(sheet.value(VOUT_ROW, 11), CellValue::Number(1.0));
        assert_eq!(sheet.value(VOUT_ROW, 12), CellValue::Number(50.0));
        assert!(sheet.style(VOUT_ROW, 12).two_decimals);
        assert!(!sheet.style(VOUT_ROW, 11).two_decimals);
    }

    #[test]
    fn test_single_device_mode_has_one_sheet() {
        let wb = build(&[("", 1.0, 2.0), ("", 1.0, 2.5)], &TransposeConfig::default());
        assert_eq!(wb.sheet_names(), vec![PRIMARY_SHEET]);

        let sheet = wb.sheet(PRIMARY_SHEET).unwrap();
        // The same serial measured twice keeps both values under one name
        assert_eq!(header(sheet)[9..], ["1", "1"]);
        assert_eq!(sheet.value(VOUT_ROW, 10), CellValue::Number(2.5));
    }

    #[test]
    fn test_unusual_codes_get_safe_sheet_names() {
        let long = format!("T5{}", "A".repeat(40));
        let rows = [("T0/A", 1.0, 2.0), (long.as_str(), 2.0, 3.0)];
        let wb = build(&rows, &TransposeConfig::default());

        let names = wb.sheet_names();
        assert_eq!(names[1], "Only_T0_A_Stats");
        assert!(names[2].starts_with("Only_T5AAA"));
        assert_eq!(names[2].chars().count(), 31);

        let dir = tempfile::tempdir().unwrap();
        wb.save(&dir.path().join("codes.xlsx")).unwrap();
    }

    #[test]
    fn test_too_many_serials_is_an_error() {
        let rows: Vec<(&str, f64, f64)> =
            (0..MAX_COLUMNS).map(|lsw| ("T0", lsw as f64, 1.0)).collect();
        let config = TransposeConfig::default();
        let grouped = GroupedTable::aggregate(&table(&rows), &config).unwrap();

        let err = build_workbook(&grouped, &config).unwrap_err();
        assert!(matches!(
            err,
            ReportError::TooManyColumns { ref sheet, limit: 16_384, .. } if sheet == PRIMARY_SHEET
        ));
    }

    #[test]
    fn test_single_code_has_no_comparisons() {
        let wb = build(&[("T0", 1.0, 2.0)], &TransposeConfig::default());
        assert_eq!(wb.sheet_names(), vec![PRIMARY_SHEET, "Only_T0_Stats"]);
    }
}
