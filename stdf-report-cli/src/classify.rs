//! Per-device part results and run information
//!
//! PRR rows are matched to devices by position: the i-th device gets the
//! i-th part result. Bin numbers are labelled from the SBR/HBR summaries.

use crate::config::TimestampZone;
use crate::store::{RecordTable, RecordTables};
use crate::workbook::CellValue;
use chrono::{DateTime, Local, Utc};
use std::collections::HashMap;
use stdf_decoder::{FieldValue, Record};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Bin number -> bin name
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BinLookup {
    names: HashMap<u64, String>,
}

impl BinLookup {
    /// Build from a bin summary table (`SBR`/`SBIN_*` or `HBR`/`HBIN_*`)
    ///
    /// Blank names and the literal `nan` are omitted; later rows override
    /// earlier ones.
    pub fn from_table(table: Option<&RecordTable>, num_field: &str, name_field: &str) -> Self {
        let mut names = HashMap::new();
        for record in table.into_iter().flat_map(|t| t.rows.iter()) {
            let Some(num) = record.get_u64(num_field) else {
                continue;
            };
            let name = record.get_text(name_field).unwrap_or_default().trim();
            if name.is_empty() || name.eq_ignore_ascii_case("nan") {
                continue;
            }
            names.insert(num, name.to_string());
        }
        Self { names }
    }

    pub fn soft_bins(tables: &RecordTables) -> Self {
        Self::from_table(tables.get("SBR"), "SBIN_NUM", "SBIN_NAM")
    }

    pub fn hard_bins(tables: &RecordTables) -> Self {
        Self::from_table(tables.get("HBR"), "HBIN_NUM", "HBIN_NAM")
    }

    pub fn name(&self, num: u64) -> Option<&str> {
        self.names.get(&num).map(String::as_str)
    }

    /// `"<num> (<name>)"`, the bare number, or empty when there is no bin
    pub fn label(&self, num: Option<u64>) -> String {
        match num {
            None => String::new(),
            Some(num) => match self.name(num) {
                Some(name) => format!("{} ({})", num, name),
                None => num.to_string(),
            },
        }
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Pass,
    Fail,
}

impl Verdict {
    /// Pass only when the whole PART_FLG byte is zero
    pub fn from_part_flag(flag: Option<u64>) -> Self {
        match flag {
            Some(0) => Verdict::Pass,
            _ => Verdict::Fail,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Verdict::Pass => "Pass",
            Verdict::Fail => "Fail",
        }
    }
}

/// Part result fields shown above a device column
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceSummary {
    pub site: Option<u64>,
    pub soft_bin: String,
    pub hard_bin: String,
    pub verdict: Verdict,
    pub part_id: String,
}

impl DeviceSummary {
    pub fn from_prr(prr: &Record, soft: &BinLookup, hard: &BinLookup) -> Self {
        Self {
            site: prr.get_u64("SITE_NUM"),
            soft_bin: soft.label(prr.get_u64("SOFT_BIN")),
            hard_bin: hard.label(prr.get_u64("HARD_BIN")),
            verdict: Verdict::from_part_flag(prr.get_u64("PART_FLG")),
            part_id: prr.get_text("PART_ID").unwrap_or_default().to_string(),
        }
    }

    /// Cells in display order: site, soft bin, hard bin, verdict, part id
    pub fn cells(&self) -> [CellValue; 5] {
        [
            self.site.map_or(CellValue::Empty, |s| CellValue::number(s as f64)),
            CellValue::text(self.soft_bin.as_str()),
            CellValue::text(self.hard_bin.as_str()),
            CellValue::text(self.verdict.as_str()),
            part_id_cell(&self.part_id),
        ]
    }
}

fn part_id_cell(part_id: &str) -> CellValue {
    match part_id.trim().parse::<i64>() {
        Ok(n) => CellValue::number(n as f64),
        Err(_) => CellValue::text(part_id),
    }
}

/// Positional join of PRR rows onto `device_count` devices
///
/// Devices past the end of the PRR table get `None` (blank meta cells).
pub fn summarize_devices(
    prr: &RecordTable,
    device_count: usize,
    soft: &BinLookup,
    hard: &BinLookup,
) -> Vec<Option<DeviceSummary>> {
    if prr.len() != device_count {
        log::warn!(
            "{} device(s) but {} PRR record(s); part results are matched by position",
            device_count,
            prr.len()
        );
    }
    (0..device_count)
        .map(|i| prr.rows.get(i).map(|r| DeviceSummary::from_prr(r, soft, hard)))
        .collect()
}

/// Header block of the device summary sheet
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunInfo {
    pub start_time: String,
    pub finish_time: String,
    pub program: String,
    pub tester: String,
}

impl RunInfo {
    /// Read from the first MIR and MRR records; absent fields are empty
    pub fn from_tables(tables: &RecordTables, zone: TimestampZone) -> Self {
        let mut info = RunInfo::default();
        if let Some(mir) = tables.first("MIR") {
            info.start_time = format_timestamp(mir.get("START_T"), zone);
            info.program = mir.get_text("JOB_NAM").unwrap_or_default().to_string();
            info.tester = mir.get_text("NODE_NAM").unwrap_or_default().to_string();
        }
        if let Some(mrr) = tables.first("MRR") {
            info.finish_time = format_timestamp(mrr.get("FINISH_T"), zone);
        }
        info
    }
}

/// Render an epoch-seconds field; unconvertible values fall back to raw text
pub fn format_timestamp(value: Option<&FieldValue>, zone: TimestampZone) -> String {
    let Some(value) = value else {
        return String::new();
    };
    let Some(utc) = value.as_i64().and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0))
    else {
        return value.to_string();
    };
    match zone {
        TimestampZone::Utc => utc.format(TIMESTAMP_FORMAT).to_string(),
        TimestampZone::Local => utc.with_timezone(&Local).format(TIMESTAMP_FORMAT).to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;

    fn tables(records: Vec<Record>) -> RecordTables {
        RecordTables::from_records(records.into_iter().map(Ok)).unwrap()
    }

    #[test]
    fn test_bin_labels() {
        let t = tables(vec![
            fixtures::sbr(1, "GOOD"),
            fixtures::sbr(2, "  "),
            fixtures::sbr(3, "NaN"),
            fixtures::sbr(4, "OPEN"),
            fixtures::sbr(4, "SHORT"),
        ]);
        let soft = BinLookup::soft_bins(&t);

        assert_eq!(soft.len(), 2);
        assert_eq!(soft.label(Some(1)), "1 (GOOD)");
        assert_eq!(soft.label(Some(2)), "2");
        assert_eq!(soft.label(Some(3)), "3");
        assert_eq!(soft.label(Some(4)), "4 (SHORT)");
        assert_eq!(soft.label(Some(9)), "9");
        assert_eq!(soft.label(None), "");
    }

    #[test]
    fn test_missing_bin_tables() {
        let t = tables(vec![fixtures::ptr(1, 1, 0, 0.0, "A", 0.0, 1.0)]);
        assert_eq!(BinLookup::soft_bins(&t).len(), 0);
        assert_eq!(BinLookup::hard_bins(&t).len(), 0);
    }

    #[test]
    fn test_verdict_uses_whole_flag() {
        assert_eq!(Verdict::from_part_flag(Some(0)), Verdict::Pass);
        assert_eq!(Verdict::from_part_flag(Some(0x08)), Verdict::Fail);
        assert_eq!(Verdict::from_part_flag(Some(0x10)), Verdict::Fail);
        assert_eq!(Verdict::from_part_flag(None), Verdict::Fail);
    }

    #[test]
    fn test_positional_join() {
        let t = tables(vec![
            fixtures::hbr(1, "PASS"),
            fixtures::prr(2, 0, 1, 1, "11"),
            fixtures::prr(3, 8, 5, 7, "P-12"),
        ]);
        let soft = BinLookup::soft_bins(&t);
        let hard = BinLookup::hard_bins(&t);
        let summaries = summarize_devices(t.require("PRR").unwrap(), 3, &soft, &hard);

        assert_eq!(summaries.len(), 3);
        let first = summaries[0].as_ref().unwrap();
        assert_eq!(first.site, Some(2));
        assert_eq!(first.hard_bin, "1 (PASS)");
        assert_eq!(first.soft_bin, "1");
        assert_eq!(first.verdict, Verdict::Pass);
        assert_eq!(first.cells()[4], CellValue::Number(11.0));

        let second = summaries[1].as_ref().unwrap();
        assert_eq!(second.verdict, Verdict::Fail);
        assert_eq!(second.cells()[4], CellValue::Text("P-12".into()));
        assert!(summaries[2].is_none());
    }

    #[test]
    fn test_run_info() {
        let t = tables(vec![fixtures::mir(86_400, "FT_PROG", "tester-01"), fixtures::mrr(90_000)]);
        let info = RunInfo::from_tables(&t, TimestampZone::Utc);

        assert_eq!(info.start_time, "1970-01-02 00:00:00");
        assert_eq!(info.finish_time, "1970-01-02 01:00:00");
        assert_eq!(info.program, "FT_PROG");
        assert_eq!(info.tester, "tester-01");
    }

    #[test]
    fn test_run_info_absent_records() {
        let t = tables(vec![fixtures::ptr(1, 1, 0, 0.0, "A", 0.0, 1.0)]);
        assert_eq!(RunInfo::from_tables(&t, TimestampZone::Local), RunInfo::default());
    }

    #[test]
    fn test_timestamp_fallback() {
        let raw = FieldValue::Text("yesterday".into());
        assert_eq!(format_timestamp(Some(&raw), TimestampZone::Utc), "yesterday");
        assert_eq!(format_timestamp(None, TimestampZone::Utc), "");
    }
}
