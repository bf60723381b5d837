//! Configuration loading and parsing
//!
//! Every field has a default, so an empty or partial `config.toml` is valid.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Main application configuration (loaded from config.toml)
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(default)]
    pub convert: ConvertConfig,
    #[serde(default)]
    pub transpose: TransposeConfig,
}

/// STDF -> device summary settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ConvertConfig {
    /// Test whose result is the device serial number
    #[serde(default = "default_id_test_number")]
    pub id_test_number: u64,
    #[serde(default)]
    pub timestamps: TimestampZone,
}

impl Default for ConvertConfig {
    fn default() -> Self {
        Self {
            id_test_number: default_id_test_number(),
            timestamps: TimestampZone::default(),
        }
    }
}

fn default_id_test_number() -> u64 {
    crate::segment::DEFAULT_ID_TEST_NUMBER
}

/// Time zone used to render MIR/MRR timestamps
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TimestampZone {
    #[default]
    Local,
    Utc,
}

/// Pivoted spreadsheet -> condition/comparison workbook settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TransposeConfig {
    #[serde(default = "default_test_code_column")]
    pub test_code_column: String,
    /// Code used when the sheet has no test codes at all
    #[serde(default = "default_single_device_code")]
    pub single_device_code: String,
    /// Test carrying the upper 16 bits of the serial
    #[serde(default = "default_msw_test_number")]
    pub msw_test_number: u64,
    /// Test carrying the lower 16 bits of the serial
    #[serde(default = "default_lsw_test_number")]
    pub lsw_test_number: u64,
    #[serde(default)]
    pub conditions: ConditionTests,
    #[serde(default = "default_code_pairs")]
    pub code_pairs: Vec<[String; 2]>,
    /// Append cross-code Average/StdDev/StdDev% to the primary sheet
    #[serde(default)]
    pub include_overall_stats: bool,
}

impl Default for TransposeConfig {
    fn default() -> Self {
        Self {
            test_code_column: default_test_code_column(),
            single_device_code: default_single_device_code(),
            msw_test_number: default_msw_test_number(),
            lsw_test_number: default_lsw_test_number(),
            conditions: ConditionTests::default(),
            code_pairs: default_code_pairs(),
            include_overall_stats: false,
        }
    }
}

fn default_test_code_column() -> String {
    "Test_Code".to_string()
}

fn default_single_device_code() -> String {
    "T0".to_string()
}

fn default_msw_test_number() -> u64 {
    40_150_000
}

fn default_lsw_test_number() -> u64 {
    40_200_000
}

fn default_code_pairs() -> Vec<[String; 2]> {
    [
        ("T0", "T168"),
        ("T0", "T500"),
        ("T0", "T1000"),
        ("T168", "T500"),
        ("T500", "T1000"),
    ]
    .iter()
    .map(|(a, b)| [a.to_string(), b.to_string()])
    .collect()
}

/// Test numbers of the four condition readings that define a test corner
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct ConditionTests {
    #[serde(default = "default_supply")]
    pub supply: u64,
    #[serde(default = "default_aux_supply")]
    pub aux_supply: u64,
    #[serde(default = "default_io_supply")]
    pub io_supply: u64,
    #[serde(default = "default_temperature")]
    pub temperature: u64,
}

impl Default for ConditionTests {
    fn default() -> Self {
        Self {
            supply: default_supply(),
            aux_supply: default_aux_supply(),
            io_supply: default_io_supply(),
            temperature: default_temperature(),
        }
    }
}

impl ConditionTests {
    /// Test numbers with their column labels, in grouping order
    pub fn labelled(&self) -> [(&'static str, u64); 4] {
        [
            ("PVIN", self.supply),
            ("AVIN", self.aux_supply),
            ("VDDIO", self.io_supply),
            ("TEMP", self.temperature),
        ]
    }
}

fn default_supply() -> u64 {
    5_030_000
}

fn default_aux_supply() -> u64 {
    5_035_000
}

fn default_io_supply() -> u64 {
    5_040_000
}

fn default_temperature() -> u64 {
    5_050_000
}

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<AppConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let config: AppConfig = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    Ok(config)
}
