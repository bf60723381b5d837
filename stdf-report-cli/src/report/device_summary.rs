//! "Device Summary" sheet
//!
//! ```text
//!      A            B          ...  E             F      G
//!  1   Start time   <start>         Site Tested   <dev1> <dev2> ...
//!  2   Finish time  <finish>        Soft Bin #
//!  3   Program      <job>           Hard Bin #
//!  4   Tester       <node>          Pass/Fail
//!  5                                Part ID
//!  6   TEST_NUM     TEST_TXT   ...  UNITS         <serial or N/A> ...
//!  7+  pivot rows
//! ```

use crate::classify::{DeviceSummary, RunInfo, Verdict};
use crate::error::Result;
use crate::numeric::{outside_limits, Numeric};
use crate::pivot::{Pivot, META_HEADERS};
use crate::workbook::{check_column_count, Fill, Sheet, Style};

pub const SHEET_NAME: &str = "Device Summary";

const RUN_LABELS: [&str; 4] = ["Start time", "Finish time", "Program", "Tester"];
const DEVICE_LABELS: [&str; 5] = ["Site Tested", "Soft Bin #", "Hard Bin #", "Pass/Fail", "Part ID"];

const DEVICE_LABEL_COL: u16 = 4;
const FIRST_DEVICE_COL: u16 = 5;
const VERDICT_ROW: u32 = 3;
const HEADER_ROW: u32 = 5;
const FIRST_DATA_ROW: u32 = 6;

/// Lay out the summary sheet
///
/// `summaries` is parallel to `pivot.columns`; `None` leaves the device's
/// meta cells blank. Fails when the devices do not fit in one sheet.
pub fn build_sheet(
    run: &RunInfo,
    pivot: &Pivot,
    summaries: &[Option<DeviceSummary>],
) -> Result<Sheet> {
    let columns = pivot
        .column_count()
        .max(FIRST_DEVICE_COL as usize + summaries.len());
    check_column_count(SHEET_NAME, columns)?;

    let mut sheet = Sheet::new(SHEET_NAME);

    let run_values = [&run.start_time, &run.finish_time, &run.program, &run.tester];
    for (row, (label, value)) in RUN_LABELS.iter().zip(run_values).enumerate() {
        sheet.write(row as u32, 0, *label);
        sheet.write(row as u32, 1, value.as_str());
    }

    for (row, label) in DEVICE_LABELS.iter().enumerate() {
        sheet.write_styled(row as u32, DEVICE_LABEL_COL, *label, Style::right_aligned());
    }

    for (j, summary) in summaries.iter().enumerate() {
        let col = FIRST_DEVICE_COL + j as u16;
        let Some(summary) = summary else {
            continue;
        };
        for (row, value) in summary.cells().into_iter().enumerate() {
            sheet.write(row as u32, col, value);
        }
        let fill = match summary.verdict {
            Verdict::Pass => Fill::LightGreen,
            Verdict::Fail => Fill::LightRed,
        };
        sheet.update_style(VERDICT_ROW, col, |s| s.fill = Some(fill));
    }

    for (col, header) in META_HEADERS.iter().enumerate() {
        sheet.write(HEADER_ROW, col as u16, *header);
    }
    for (j, column) in pivot.columns.iter().enumerate() {
        sheet.write(HEADER_ROW, FIRST_DEVICE_COL + j as u16, column.name.header());
    }

    for (i, test) in pivot.tests.iter().enumerate() {
        let row = FIRST_DATA_ROW + i as u32;
        sheet.write(row, 0, test.key.number as f64);
        sheet.write(row, 1, test.key.text.as_str());
        sheet.write(row, 2, test.lo_limit);
        sheet.write(row, 3, test.hi_limit);
        sheet.write(row, 4, test.units.as_str());

        let lo = Numeric::from_opt(test.lo_limit);
        let hi = Numeric::from_opt(test.hi_limit);
        for (j, column) in pivot.columns.iter().enumerate() {
            let col = FIRST_DEVICE_COL + j as u16;
            let value = column.values[i];
            sheet.write(row, col, value);
            if outside_limits(Numeric::from_opt(value), lo, hi) {
                sheet.update_style(row, col, |s| s.fill = Some(Fill::LightRed));
            }
        }
    }

    sheet.set_freeze_panes(FIRST_DATA_ROW, FIRST_DEVICE_COL);
    sheet.set_column_width(0, 11.0);
    sheet.set_column_width(1, 60.0);
    sheet.set_column_width(DEVICE_LABEL_COL, 10.0);
    for j in 0..summaries.len().max(pivot.columns.len()) {
        sheet.set_column_width(FIRST_DEVICE_COL + j as u16, 10.0);
    }
    Ok(sheet)
}

/// Pivot cells flagged as out of limits, as (test index, device index)
pub fn flagged_cells(sheet: &Sheet) -> Vec<(usize, usize)> {
    sheet
        .cells()
        .filter(|((row, col), cell)| {
            *row >= FIRST_DATA_ROW
                && *col >= FIRST_DEVICE_COL
                && cell.style.fill == Some(Fill::LightRed)
        })
        .map(|((row, col), _)| {
            (
                (row - FIRST_DATA_ROW) as usize,
                (col - FIRST_DEVICE_COL) as usize,
            )
        })
        .collect()
}
