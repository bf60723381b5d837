//! Device-by-test pivot
//!
//! Rows are the tests of the first device; every device contributes one
//! column of results matched on (test number, test text).

use crate::segment::{DeviceOrdinal, Segmentation};
use std::collections::HashMap;
use std::fmt;

/// Header cells preceding the device columns
pub const META_HEADERS: [&str; 5] = ["TEST_NUM", "TEST_TXT", "LO_LIMIT", "HI_LIMIT", "UNITS"];

/// Identity of a test across devices
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TestKey {
    pub number: u64,
    pub text: String,
}

/// One anchor row of the pivot
#[derive(Debug, Clone, PartialEq)]
pub struct TestDefinition {
    pub key: TestKey,
    pub lo_limit: Option<f64>,
    pub hi_limit: Option<f64>,
    pub units: String,
}

/// Name of a device column
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnName {
    Serial(String),
    /// k-th device without a serial, counting from 1
    Unnamed(usize),
}

impl ColumnName {
    /// Text shown in the header row
    pub fn header(&self) -> &str {
        match self {
            ColumnName::Serial(serial) => serial,
            ColumnName::Unnamed(_) => "N/A",
        }
    }
}

impl fmt::Display for ColumnName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnName::Serial(serial) => write!(f, "{}", serial),
            ColumnName::Unnamed(k) => write!(f, "N/A_{}", k),
        }
    }
}

/// Results of one device aligned to the anchor rows
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceColumn {
    pub ordinal: DeviceOrdinal,
    pub name: ColumnName,
    pub values: Vec<Option<f64>>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Pivot {
    pub tests: Vec<TestDefinition>,
    pub columns: Vec<DeviceColumn>,
}

impl Pivot {
    pub fn build(segmentation: &Segmentation) -> Self {
        let Some(anchor_device) = segmentation.devices.first() else {
            return Self::default();
        };

        let mut tests: Vec<TestDefinition> = Vec::new();
        let mut anchor_index: HashMap<TestKey, usize> = HashMap::new();
        for row in segmentation.device_rows(anchor_device.ordinal) {
            let key = TestKey {
                number: row.test_num,
                text: row.test_txt.clone(),
            };
            if anchor_index.contains_key(&key) {
                continue;
            }
            anchor_index.insert(key.clone(), tests.len());
            tests.push(TestDefinition {
                key,
                lo_limit: row.lo_limit,
                hi_limit: row.hi_limit,
                units: row.units.clone(),
            });
        }

        let mut unnamed = 0usize;
        let columns = segmentation
            .devices
            .iter()
            .map(|device| {
                let name = if device.serial.trim().is_empty() {
                    unnamed += 1;
                    ColumnName::Unnamed(unnamed)
                } else {
                    ColumnName::Serial(device.serial.clone())
                };

                let mut values = vec![None; tests.len()];
                for row in segmentation.device_rows(device.ordinal) {
                    let key = TestKey {
                        number: row.test_num,
                        text: row.test_txt.clone(),
                    };
                    if let Some(&idx) = anchor_index.get(&key) {
                        // First non-missing result wins
                        if values[idx].is_none() {
                            values[idx] = row.result.filter(|v| !v.is_nan());
                        }
                    }
                }

                DeviceColumn {
                    ordinal: device.ordinal,
                    name,
                    values,
                }
            })
            .collect();

        let pivot = Self { tests, columns };
        log::debug!(
            "Pivot: {} test row(s) x {} device column(s)",
            pivot.tests.len(),
            pivot.columns.len()
        );
        pivot
    }

    pub fn column_count(&self) -> usize {
        META_HEADERS.len() + self.columns.len()
    }
}
