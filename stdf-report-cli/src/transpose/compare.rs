//! Paired code comparison
//!
//! For a pair of test codes (e.g. before and after 168h of stress) each
//! device measured under both gets its two values, their difference and
//! the percent change.

use super::grouping::{GroupedTable, SerialIdentity, TestRow};
use crate::workbook::CellValue;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodePair {
    pub first: String,
    pub second: String,
}

impl CodePair {
    pub fn new(first: impl Into<String>, second: impl Into<String>) -> Self {
        Self {
            first: first.into(),
            second: second.into(),
        }
    }

    pub fn from_config(pairs: &[[String; 2]]) -> Vec<Self> {
        pairs
            .iter()
            .map(|[first, second]| Self::new(first.as_str(), second.as_str()))
            .collect()
    }

    pub fn sheet_name(&self) -> String {
        format!("{}_vs_{}", self.first, self.second)
    }
}

/// `v2 - v1`; missing when either side is
pub fn difference(v1: Option<f64>, v2: Option<f64>) -> Option<f64> {
    Some(v2? - v1?).filter(|d| d.is_finite())
}

/// `100 * (v2 - v1) / v1`; missing for a zero or non-finite result
pub fn percent_delta(v1: f64, v2: f64) -> Option<f64> {
    if v1 == 0.0 {
        return None;
    }
    let pct = 100.0 * (v2 - v1) / v1;
    pct.is_finite().then_some(pct)
}

/// One device present under both codes of a pair
#[derive(Debug, Clone, PartialEq)]
pub struct BaseComparison {
    pub base: SerialIdentity,
    /// Serial index under the first code
    pub first: usize,
    /// Serial index under the second code
    pub second: usize,
}

impl BaseComparison {
    pub fn headers(&self, pair: &CodePair) -> [String; 4] {
        let base = &self.base;
        let (c1, c2) = (&pair.first, &pair.second);
        [
            format!("{}_{}", base, c1),
            format!("{}_{}", base, c2),
            format!("{}_Diff_{}_{}", base, c1, c2),
            format!("{}_%_Diff_{}_{}", base, c1, c2),
        ]
    }

    /// First-code value, second-code value, difference, percent difference
    pub fn values(&self, row: &TestRow) -> [CellValue; 4] {
        let a = row.value(self.first, 0);
        let b = row.value(self.second, 0);
        let (v1, v2) = (a.numeric().value(), b.numeric().value());
        let pct = match (v1, v2) {
            (Some(v1), Some(v2)) => percent_delta(v1, v2),
            _ => None,
        };
        [
            a.clone(),
            b.clone(),
            CellValue::from_opt(difference(v1, v2)),
            CellValue::from_opt(pct),
        ]
    }
}

/// Whether comparison sheets apply at all
pub fn comparisons_enabled(grouped: &GroupedTable) -> bool {
    !grouped.single_device && grouped.codes.len() > 1
}

/// Devices measured under both codes, ordered by serial text
pub fn comparable_bases(grouped: &GroupedTable, pair: &CodePair) -> Vec<BaseComparison> {
    let mut bases: Vec<&SerialIdentity> = Vec::new();
    for key in &grouped.serials {
        if !bases.contains(&&key.base) {
            bases.push(&key.base);
        }
    }

    let mut comparisons: Vec<BaseComparison> = bases
        .into_iter()
        .filter_map(|base| {
            Some(BaseComparison {
                base: base.clone(),
                first: grouped.find_serial(base, &pair.first)?,
                second: grouped.find_serial(base, &pair.second)?,
            })
        })
        .collect();
    comparisons.sort_by_key(|c| c.base.to_string());
    comparisons
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TransposeConfig;
    use crate::transpose::input::SheetTable;

    fn grouped(rows: &[(&str, f64, f64)]) -> GroupedTable {
        let headers = vec![
            "Test_Code".to_string(),
            "40150000 MSW".to_string(),
            "40200000 LSW".to_string(),
            "1000 VOUT".to_string(),
        ];
        let rows = rows
            .iter()
            .map(|(code, lsw, vout)| {
                vec![
                    CellValue::text(*code),
                    CellValue::Number(0.0),
                    CellValue::Number(*lsw),
                    CellValue::Number(*vout),
                ]
            })
            .collect();
        GroupedTable::aggregate(&SheetTable::new(headers, rows), &TransposeConfig::default())
            .unwrap()
    }

    #[test]
    fn test_percent_delta() {
        assert_eq!(percent_delta(0.0, 5.0), None);
        assert_eq!(percent_delta(2.0, 3.0), Some(50.0));
        assert_eq!(percent_delta(4.0, 3.0), Some(-25.0));
        assert_eq!(percent_delta(f64::MIN_POSITIVE, f64::MAX), None);
    }

    #[test]
    fn test_difference() {
        assert_eq!(difference(Some(1.0), Some(3.5)), Some(2.5));
        assert_eq!(difference(None, Some(3.5)), None);
    }

    #[test]
    fn test_default_pairs() {
        let pairs = CodePair::from_config(&TransposeConfig::default().code_pairs);
        let names: Vec<String> = pairs.iter().map(CodePair::sheet_name).collect();
        assert_eq!(
            names,
            vec!["T0_vs_T168", "T0_vs_T500", "T0_vs_T1000", "T168_vs_T500", "T500_vs_T1000"]
        );
    }

    #[test]
    fn test_only_bases_under_both_codes() {
        let g = grouped(&[("T0", 20.0, 1.0), ("T0", 10.0, 2.0), ("T168", 10.0, 2.5)]);
        let pair = CodePair::new("T0", "T168");
        let bases = comparable_bases(&g, &pair);

        assert_eq!(bases.len(), 1);
        assert_eq!(bases[0].base, SerialIdentity::Reconstructed(10));
        assert_eq!(
            bases[0].headers(&pair),
            [
                "10_T0".to_string(),
                "10_T168".to_string(),
                "10_Diff_T0_T168".to_string(),
                "10_%_Diff_T0_T168".to_string(),
            ]
        );

        let vout = g.rows().find(|(_, r)| r.column.number == 1000).unwrap().1;
        assert_eq!(
            bases[0].values(vout),
            [
                CellValue::Number(2.0),
                CellValue::Number(2.5),
                CellValue::Number(0.5),
                CellValue::Number(25.0),
            ]
        );
    }

    #[test]
    fn test_bases_sorted_by_text() {
        let g = grouped(&[
            ("T0", 9.0, 1.0),
            ("T0", 10.0, 1.0),
            ("T168", 9.0, 1.0),
            ("T168", 10.0, 1.0),
        ]);
        let bases = comparable_bases(&g, &CodePair::new("T0", "T168"));
        let names: Vec<String> = bases.iter().map(|b| b.base.to_string()).collect();
        assert_eq!(names, vec!["10", "9"]);
        assert!(comparisons_enabled(&g));
    }

    #[test]
    fn test_zero_baseline_gives_missing_percent() {
        let g = grouped(&[("T0", 1.0, 0.0), ("T500", 1.0, 5.0)]);
        let pair = CodePair::new("T0", "T500");
        let bases = comparable_bases(&g, &pair);
        let vout = g.rows().find(|(_, r)| r.column.number == 1000).unwrap().1;
        let values = bases[0].values(vout);
        assert_eq!(values[2], CellValue::Number(5.0));
        assert_eq!(values[3], CellValue::Empty);
    }
}
