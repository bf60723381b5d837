//! Device segmentation of the parametric test table
//!
//! An STDF stream does not tag PTR rows with the part they belong to. Each
//! (head, site) runs the same test program from the top for every part, so
//! the lowest test number in the table marks the start of a new device.

use crate::store::RecordTable;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;

/// Test whose result carries the device serial number
pub const DEFAULT_ID_TEST_NUMBER: u64 = 40_250_000;

/// Position of a device in the stream, starting at 1
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DeviceOrdinal(pub i64);

impl DeviceOrdinal {
    /// Rows seen on a (head, site) before its first device boundary
    pub const UNASSIGNED: DeviceOrdinal = DeviceOrdinal(-1);
}

impl fmt::Display for DeviceOrdinal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Test head and site a row was measured on
pub type SiteKey = (Option<u64>, Option<u64>);

/// The PTR fields the report uses
#[derive(Debug, Clone, PartialEq)]
pub struct ParametricRow {
    pub test_num: u64,
    pub head: Option<u64>,
    pub site: Option<u64>,
    pub result: Option<f64>,
    pub test_txt: String,
    pub lo_limit: Option<f64>,
    pub hi_limit: Option<f64>,
    pub units: String,
}

impl ParametricRow {
    pub fn site_key(&self) -> SiteKey {
        (self.head, self.site)
    }
}

/// Project PTR records onto [`ParametricRow`]s
///
/// Rows without a test number cannot take part in segmentation and are
/// dropped.
pub fn parametric_rows(table: &RecordTable) -> Vec<ParametricRow> {
    let mut dropped = 0usize;
    let rows: Vec<ParametricRow> = table
        .rows
        .iter()
        .filter_map(|record| {
            let Some(test_num) = record.get_u64("TEST_NUM") else {
                dropped += 1;
                return None;
            };
            Some(ParametricRow {
                test_num,
                head: record.get_u64("HEAD_NUM"),
                site: record.get_u64("SITE_NUM"),
                result: record.get_f64("RESULT"),
                test_txt: record.get_text("TEST_TXT").unwrap_or_default().to_string(),
                lo_limit: record.get_f64("LO_LIMIT"),
                hi_limit: record.get_f64("HI_LIMIT"),
                units: record.get_text("UNITS").unwrap_or_default().to_string(),
            })
        })
        .collect();

    if dropped > 0 {
        log::warn!("Dropped {} PTR row(s) without TEST_NUM", dropped);
    }
    rows
}

/// Assign every row the ordinal of the device its (head, site) is testing
pub fn assign_ordinals(rows: &[ParametricRow]) -> Vec<DeviceOrdinal> {
    let Some(min_test_number) = rows.iter().map(|r| r.test_num).min() else {
        return Vec::new();
    };

    let mut counter = 0i64;
    let mut active: HashMap<SiteKey, DeviceOrdinal> = HashMap::new();
    let mut orphan_sites: BTreeSet<SiteKey> = BTreeSet::new();

    let ordinals = rows
        .iter()
        .map(|row| {
            if row.test_num == min_test_number {
                counter += 1;
                active.insert(row.site_key(), DeviceOrdinal(counter));
            }
            match active.get(&row.site_key()) {
                Some(&ordinal) => ordinal,
                None => {
                    orphan_sites.insert(row.site_key());
                    DeviceOrdinal::UNASSIGNED
                }
            }
        })
        .collect();

    for (head, site) in orphan_sites {
        log::warn!(
            "Rows on head {:?} site {:?} precede the first test {}; grouped as device {}",
            head,
            site,
            min_test_number,
            DeviceOrdinal::UNASSIGNED
        );
    }
    log::debug!("Segmented {} row(s) into {} device(s)", rows.len(), counter);
    ordinals
}

/// Distinct ordinals in first-seen order
pub fn first_seen(ordinals: &[DeviceOrdinal]) -> Vec<DeviceOrdinal> {
    let mut seen = BTreeSet::new();
    ordinals
        .iter()
        .copied()
        .filter(|ordinal| seen.insert(*ordinal))
        .collect()
}

/// One segmented device
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Device {
    pub ordinal: DeviceOrdinal,
    /// Decimal serial from the identification test, or empty
    pub serial: String,
}

/// Parametric rows split into devices
#[derive(Debug, Clone)]
pub struct Segmentation {
    pub rows: Vec<ParametricRow>,
    /// Ordinal of each row, parallel to `rows`
    pub ordinals: Vec<DeviceOrdinal>,
    /// Devices in first-seen order
    pub devices: Vec<Device>,
    /// Row indices per device, in stream order
    buckets: HashMap<DeviceOrdinal, Vec<usize>>,
}

impl Segmentation {
    pub fn new(rows: Vec<ParametricRow>, id_test_number: u64) -> Self {
        let ordinals = assign_ordinals(&rows);
        let serials = resolve_serials(&rows, &ordinals, id_test_number);
        let mut buckets: HashMap<DeviceOrdinal, Vec<usize>> = HashMap::new();
        for (index, ordinal) in ordinals.iter().enumerate() {
            buckets.entry(*ordinal).or_default().push(index);
        }
        let devices = first_seen(&ordinals)
            .into_iter()
            .map(|ordinal| Device {
                ordinal,
                serial: serials.get(&ordinal).cloned().unwrap_or_default(),
            })
            .collect();

        Self {
            rows,
            ordinals,
            devices,
            buckets,
        }
    }

    /// Rows belonging to one device, in stream order
    pub fn device_rows(&self, ordinal: DeviceOrdinal) -> impl Iterator<Item = &ParametricRow> + '_ {
        self.buckets
            .get(&ordinal)
            .map(Vec::as_slice)
            .unwrap_or_default()
            .iter()
            .map(|&index| &self.rows[index])
    }
}

/// Serial per device, read from its first identification-test row
///
/// The integer part of a finite result becomes the serial. A device whose
/// first identification row is not numeric gets an empty serial, even when
/// a later row would parse.
pub fn resolve_serials(
    rows: &[ParametricRow],
    ordinals: &[DeviceOrdinal],
    id_test_number: u64,
) -> BTreeMap<DeviceOrdinal, String> {
    let mut serials = BTreeMap::new();
    for (row, ordinal) in rows.iter().zip(ordinals) {
        if row.test_num != id_test_number {
            continue;
        }
        serials.entry(*ordinal).or_insert_with(|| match row.result {
            Some(value) if value.is_finite() => format!("{}", value.trunc() as i64),
            _ => String::new(),
        });
    }
    serials
}
