//! Condition grouping of a pivoted sheet
//!
//! Each input row is one device measured at one test code (stress stage)
//! and one condition corner. Rows are regrouped by corner; within a corner
//! every test column becomes an output row with one value list per
//! (serial, code).

use super::columns::{parse_test_column, TestColumn};
use super::input::SheetTable;
use super::stats::Stats;
use crate::config::TransposeConfig;
use crate::error::{ReportError, Result};
use crate::workbook::CellValue;
use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// Reassemble a serial number from its 16-bit words
pub fn build_serial(msw: Option<i64>, lsw: Option<i64>) -> Option<i64> {
    let (msw, lsw) = (msw?, lsw?);
    msw.checked_mul(1 << 16).map(|high| high | lsw)
}

/// Serial of the device behind an input row
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SerialIdentity {
    Reconstructed(i64),
    /// `Unknown_<n>` for the n-th row whose serial words are unusable
    Synthetic(usize),
}

impl fmt::Display for SerialIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SerialIdentity::Reconstructed(serial) => write!(f, "{}", serial),
            SerialIdentity::Synthetic(n) => write!(f, "Unknown_{}", n),
        }
    }
}

/// Hands out serial identities, numbering unknown serials in first-seen order
#[derive(Debug, Default)]
pub struct SerialAllocator {
    unknown: usize,
}

impl SerialAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn identify(&mut self, msw: Option<i64>, lsw: Option<i64>) -> SerialIdentity {
        match build_serial(msw, lsw) {
            Some(serial) => SerialIdentity::Reconstructed(serial),
            None => {
                self.unknown += 1;
                SerialIdentity::Synthetic(self.unknown)
            }
        }
    }
}

/// A (serial, test code) pair; one output column per pair and repeat
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SerialKey {
    pub base: SerialIdentity,
    pub code: String,
}

impl SerialKey {
    /// Column header: the bare serial in single-device mode
    pub fn label(&self, single_device: bool) -> String {
        if single_device {
            self.base.to_string()
        } else {
            format!("{}_{}", self.base, self.code)
        }
    }
}

/// Readings of the four condition columns
#[derive(Debug, Clone, PartialEq)]
pub struct ConditionKey(pub [CellValue; 4]);

/// One output row: a test column within a condition group
#[derive(Debug, Clone, PartialEq)]
pub struct TestRow {
    pub column: TestColumn,
    /// Serial index -> values in input row order
    pub values: BTreeMap<usize, Vec<CellValue>>,
}

impl TestRow {
    fn new(column: TestColumn) -> Self {
        Self {
            column,
            values: BTreeMap::new(),
        }
    }

    /// Value of the `slot`-th repeat of a serial
    pub fn value(&self, serial: usize, slot: usize) -> &CellValue {
        const EMPTY: &CellValue = &CellValue::Empty;
        self.values
            .get(&serial)
            .and_then(|v| v.get(slot))
            .unwrap_or(EMPTY)
    }

    /// Numeric values of the given serials, every repeat included
    pub fn numeric_values<'a>(&self, serials: impl IntoIterator<Item = &'a usize>) -> Vec<f64> {
        serials
            .into_iter()
            .filter_map(|s| self.values.get(s))
            .flatten()
            .filter_map(|v| v.numeric().value())
            .collect()
    }

    /// Population statistics over every serial in the row
    pub fn overall_stats(&self) -> Stats {
        Stats::population(&self.numeric_values(self.values.keys()))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConditionGroup {
    pub condition: ConditionKey,
    pub tests: Vec<TestRow>,
    index: HashMap<TestColumn, usize>,
}

impl ConditionGroup {
    fn new(condition: ConditionKey) -> Self {
        Self {
            condition,
            tests: Vec::new(),
            index: HashMap::new(),
        }
    }

    fn test_row(&mut self, column: &TestColumn) -> &mut TestRow {
        let idx = match self.index.get(column) {
            Some(&idx) => idx,
            None => {
                self.index.insert(column.clone(), self.tests.len());
                self.tests.push(TestRow::new(column.clone()));
                self.tests.len() - 1
            }
        };
        &mut self.tests[idx]
    }
}

/// Input rows regrouped by condition corner
#[derive(Debug, Clone, PartialEq)]
pub struct GroupedTable {
    /// No row carried a test code
    pub single_device: bool,
    /// Observed codes ordered by their numeric part
    pub codes: Vec<String>,
    /// Serial keys in first-seen order
    pub serials: Vec<SerialKey>,
    /// Groups in first-seen order
    pub groups: Vec<ConditionGroup>,
}

impl GroupedTable {
    pub fn aggregate(table: &SheetTable, config: &TransposeConfig) -> Result<Self> {
        let code_col = table
            .column(&config.test_code_column)
            .ok_or_else(|| ReportError::MissingColumn(config.test_code_column.clone()))?;

        let row_codes: Vec<Option<String>> = (0..table.row_count())
            .map(|i| test_code(table.cell(i, code_col)))
            .collect();
        let single_device = row_codes.iter().all(Option::is_none);
        let codes = if single_device {
            vec![config.single_device_code.clone()]
        } else {
            sorted_codes(row_codes.iter().flatten())
        };

        let test_columns: Vec<(usize, TestColumn)> = table
            .headers
            .iter()
            .enumerate()
            .filter_map(|(i, h)| parse_test_column(h).map(|c| (i, c)))
            .collect();
        let locate = |number: u64| {
            test_columns
                .iter()
                .find(|(_, c)| c.number == number)
                .map(|(i, _)| *i)
        };

        let msw_col = locate(config.msw_test_number);
        let lsw_col = locate(config.lsw_test_number);
        let condition_cols = config.conditions.labelled().map(|(label, number)| {
            let col = locate(number);
            if col.is_none() {
                log::warn!("No {} condition column (test {}); readings left blank", label, number);
            }
            col
        });

        let mut allocator = SerialAllocator::new();
        let mut serials: Vec<SerialKey> = Vec::new();
        let mut serial_index: HashMap<SerialKey, usize> = HashMap::new();
        let mut groups: Vec<ConditionGroup> = Vec::new();
        let mut skipped = 0usize;

        for (i, code) in row_codes.into_iter().enumerate() {
            let word = |col: Option<usize>| col.and_then(|c| table.cell(i, c).as_integer());
            let base = allocator.identify(word(msw_col), word(lsw_col));

            let code = match code {
                _ if single_device => config.single_device_code.clone(),
                Some(code) => code,
                None => {
                    skipped += 1;
                    continue;
                }
            };

            let key = SerialKey { base, code };
            let serial = match serial_index.get(&key) {
                Some(&idx) => idx,
                None => {
                    serial_index.insert(key.clone(), serials.len());
                    serials.push(key);
                    serials.len() - 1
                }
            };

            let condition =
                ConditionKey(condition_cols.map(|c| c.map_or(CellValue::Empty, |c| table.cell(i, c).clone())));
            let group = match groups.iter().position(|g| g.condition == condition) {
                Some(idx) => &mut groups[idx],
                None => {
                    groups.push(ConditionGroup::new(condition));
                    let last = groups.len() - 1;
                    &mut groups[last]
                }
            };

            for (col, column) in &test_columns {
                group
                    .test_row(column)
                    .values
                    .entry(serial)
                    .or_default()
                    .push(table.cell(i, *col).clone());
            }
        }

        if skipped > 0 {
            log::warn!("Skipped {} row(s) without a test code", skipped);
        }
        log::info!(
            "Grouped {} serial column(s) into {} condition group(s); codes: {}",
            serials.len(),
            groups.len(),
            codes.join(", ")
        );

        Ok(Self {
            single_device,
            codes,
            serials,
            groups,
        })
    }

    /// Number of columns a serial needs: its largest repeat count
    pub fn slots(&self, serial: usize) -> usize {
        self.rows()
            .filter_map(|(_, row)| row.values.get(&serial).map(Vec::len))
            .max()
            .unwrap_or(0)
    }

    /// All output rows, group by group
    pub fn rows(&self) -> impl Iterator<Item = (&ConditionKey, &TestRow)> + '_ {
        self.groups
            .iter()
            .flat_map(|g| g.tests.iter().map(move |t| (&g.condition, t)))
    }

    pub fn row_count(&self) -> usize {
        self.groups.iter().map(|g| g.tests.len()).sum()
    }

    pub fn serial_label(&self, serial: usize) -> String {
        self.serials[serial].label(self.single_device)
    }

    /// Serial indices measured under `code`
    pub fn serials_with_code(&self, code: &str) -> Vec<usize> {
        self.serials
            .iter()
            .enumerate()
            .filter(|(_, key)| key.code == code)
            .map(|(i, _)| i)
            .collect()
    }

    pub fn find_serial(&self, base: &SerialIdentity, code: &str) -> Option<usize> {
        self.serials
            .iter()
            .position(|key| &key.base == base && key.code == code)
    }
}

/// Test code of a row; blank cells have none
fn test_code(cell: &CellValue) -> Option<String> {
    let code = cell.to_string();
    let code = code.trim();
    (!code.is_empty()).then(|| code.to_string())
}

/// Distinct codes ordered by the integer formed from their digits
fn sorted_codes<'a>(codes: impl Iterator<Item = &'a String>) -> Vec<String> {
    let mut distinct: Vec<String> = Vec::new();
    for code in codes {
        if !distinct.contains(code) {
            distinct.push(code.clone());
        }
    }
    distinct.sort_by_key(|code| {
        let digits: String = code.chars().filter(char::is_ascii_digit).collect();
        let number = if digits.is_empty() {
            0
        } else {
            digits.parse::<u64>().unwrap_or(u64::MAX)
        };
        (number, code.clone())
    });
    distinct
}

#[cfg(test)]
mod tests {
    use super::*;

    fn n(v: f64) -> CellValue {
        CellValue::Number(v)
    }

    fn t(s: &str) -> CellValue {
        CellValue::text(s)
    }

    fn headers() -> Vec<String> {
        [
            "Test_Code",
            "40150000 SN_MSW",
            "40200000 SN_LSW",
            "5030000 PVIN",
            "5035000 AVIN",
            "5040000 VDDIO",
            "5050000 TEMP",
            "1000 VOUT: Coarse Code 2",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect()
    }

    fn row(code: &str, msw: f64, lsw: f64, pvin: f64, vout: f64) -> Vec<CellValue> {
        vec![t(code), n(msw), n(lsw), n(pvin), n(3.3), n(1.8), n(25.0), n(vout)]
    }

    #[test]
    fn test_build_serial() {
        assert_eq!(build_serial(Some(1), Some(2)), Some(65538));
        assert_eq!(build_serial(Some(0), Some(7)), Some(7));
        assert_eq!(build_serial(None, Some(5)), None);
        assert_eq!(build_serial(Some(1), None), None);
    }

    #[test]
    fn test_unknown_serials_are_numbered_in_order() {
        let mut allocator = SerialAllocator::new();
        assert_eq!(allocator.identify(None, Some(5)), SerialIdentity::Synthetic(1));
        assert_eq!(allocator.identify(Some(1), Some(2)), SerialIdentity::Reconstructed(65538));
        assert_eq!(allocator.identify(Some(1), None).to_string(), "Unknown_2");
    }

    #[test]
    fn test_code_ordering() {
        let codes: Vec<String> = ["T500", "T0", "T1000", "T168", "T0", "X"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(sorted_codes(codes.iter()), vec!["T0", "X", "T168", "T500", "T1000"]);
    }

    #[test]
    fn test_missing_test_code_column() {
        let table = SheetTable::new(vec!["1000 VOUT".into()], vec![vec![n(1.0)]]);
        let err = GroupedTable::aggregate(&table, &TransposeConfig::default()).unwrap_err();
        assert!(matches!(err, ReportError::MissingColumn(ref c) if c == "Test_Code"));
    }

    #[test]
    fn test_grouping_by_condition() {
        let table = SheetTable::new(
            headers(),
            vec![
                row("T0", 1.0, 2.0, 5.0, 1.00),
                row("T0", 1.0, 3.0, 5.0, 1.02),
                row("T168", 1.0, 2.0, 5.0, 1.10),
                row("T0", 1.0, 2.0, 12.0, 0.98),
            ],
        );
        let grouped = GroupedTable::aggregate(&table, &TransposeConfig::default()).unwrap();

        assert!(!grouped.single_device);
        assert_eq!(grouped.codes, vec!["T0", "T168"]);
        assert_eq!(grouped.groups.len(), 2);
        // Seven test columns per group
        assert_eq!(grouped.row_count(), 14);

        let labels: Vec<String> = (0..grouped.serials.len()).map(|i| grouped.serial_label(i)).collect();
        assert_eq!(labels, vec!["65538_T0", "65539_T0", "65538_T168"]);

        let vout = grouped.groups[0]
            .tests
            .iter()
            .find(|r| r.column.number == 1000)
            .unwrap();
        assert_eq!(vout.column.trim_code, Some(2));
        assert_eq!(vout.value(0, 0), &n(1.00));
        assert_eq!(vout.value(2, 0), &n(1.10));
        assert_eq!(grouped.serials_with_code("T0"), vec![0, 1]);
    }

    #[test]
    fn test_repeated_measurements_become_slots() {
        let table = SheetTable::new(
            headers(),
            vec![row("T0", 0.0, 9.0, 5.0, 1.0), row("T0", 0.0, 9.0, 5.0, 2.0)],
        );
        let grouped = GroupedTable::aggregate(&table, &TransposeConfig::default()).unwrap();

        assert_eq!(grouped.serials.len(), 1);
        assert_eq!(grouped.slots(0), 2);
        let vout = grouped.rows().find(|(_, r)| r.column.number == 1000).unwrap().1;
        assert_eq!(vout.value(0, 1), &n(2.0));
        let stats = vout.overall_stats();
        assert_eq!(stats.mean, Some(1.5));
        assert_eq!(stats.stddev, Some(0.5));
    }

    #[test]
    fn test_single_device_mode() {
        let mut rows = vec![row("", 0.0, 1.0, 5.0, 1.0)];
        rows[0][0] = CellValue::Empty;
        let table = SheetTable::new(headers(), rows);
        let grouped = GroupedTable::aggregate(&table, &TransposeConfig::default()).unwrap();

        assert!(grouped.single_device);
        assert_eq!(grouped.codes, vec!["T0"]);
        assert_eq!(grouped.serial_label(0), "1");
    }

    #[test]
    fn test_rows_without_code_are_skipped() {
        let mut rows = vec![row("T0", 0.0, 1.0, 5.0, 1.0), row("T0", 0.0, 2.0, 5.0, 1.0)];
        rows[1][0] = CellValue::Empty;
        let table = SheetTable::new(headers(), rows);
        let grouped = GroupedTable::aggregate(&table, &TransposeConfig::default()).unwrap();
        assert_eq!(grouped.serials.len(), 1);
    }

    #[test]
    fn test_unparsable_serial_words() {
        let mut rows = vec![row("T0", 0.0, 1.0, 5.0, 1.0), row("T0", 0.0, 1.0, 5.0, 1.0)];
        rows[0][1] = t("n/a");
        rows[1][2] = CellValue::Empty;
        let table = SheetTable::new(headers(), rows);
        let grouped = GroupedTable::aggregate(&table, &TransposeConfig::default()).unwrap();

        let labels: Vec<String> = (0..grouped.serials.len()).map(|i| grouped.serial_label(i)).collect();
        assert_eq!(labels, vec!["Unknown_1_T0", "Unknown_2_T0"]);
    }

    #[test]
    fn test_missing_condition_columns_read_blank() {
        let table = SheetTable::new(
            vec!["Test_Code".into(), "1000 VOUT".into()],
            vec![vec![t("T0"), n(1.0)], vec![t("T168"), n(1.1)]],
        );
        let grouped = GroupedTable::aggregate(&table, &TransposeConfig::default()).unwrap();
        assert_eq!(grouped.groups.len(), 1);
        assert_eq!(
            grouped.groups[0].condition,
            ConditionKey([CellValue::Empty, CellValue::Empty, CellValue::Empty, CellValue::Empty])
        );
        assert_eq!(grouped.serial_label(1), "Unknown_2_T168");
    }
}
