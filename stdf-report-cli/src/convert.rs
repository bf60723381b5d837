//! STDF file -> "Device Summary" workbook

use crate::classify::{summarize_devices, BinLookup, RunInfo};
use crate::config::ConvertConfig;
use crate::error::Result;
use crate::pivot::Pivot;
use crate::report::device_summary;
use crate::segment::{parametric_rows, Segmentation};
use crate::store::RecordTables;
use crate::workbook::Workbook;
use serde::Serialize;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use stdf_decoder::{Decoder, DecoderConfig};

/// Record types the report reads
const REPORT_RECORDS: [&str; 6] = ["MIR", "MRR", "PTR", "PRR", "SBR", "HBR"];

/// Outcome of one conversion
#[derive(Debug, Clone, Serialize)]
pub struct ConversionSummary {
    pub input: PathBuf,
    pub output: PathBuf,
    pub records: usize,
    pub devices: usize,
    pub tests: usize,
    pub flagged_cells: usize,
}

/// Workbook plus the figures reported back to the caller
#[derive(Debug)]
pub struct DeviceReport {
    pub workbook: Workbook,
    pub devices: usize,
    pub tests: usize,
    pub flagged_cells: Vec<(usize, usize)>,
}

/// `lot.stdf` -> `lot.xlsx`
pub fn default_output_path(input: &Path) -> PathBuf {
    input.with_extension("xlsx")
}

/// Build the report from decoded tables
pub fn build_report(tables: &RecordTables, config: &ConvertConfig) -> Result<DeviceReport> {
    let ptr = tables.require("PTR")?;
    let prr = tables.require("PRR")?;

    let segmentation = Segmentation::new(parametric_rows(ptr), config.id_test_number);
    let pivot = Pivot::build(&segmentation);

    let soft = BinLookup::soft_bins(tables);
    let hard = BinLookup::hard_bins(tables);
    log::debug!("{} soft bin name(s), {} hard bin name(s)", soft.len(), hard.len());
    let summaries = summarize_devices(prr, pivot.columns.len(), &soft, &hard);

    let run = RunInfo::from_tables(tables, config.timestamps);
    let sheet = device_summary::build_sheet(&run, &pivot, &summaries)?;
    let flagged_cells = device_summary::flagged_cells(&sheet);

    let mut workbook = Workbook::new();
    workbook.add_sheet(sheet);

    Ok(DeviceReport {
        workbook,
        devices: pivot.columns.len(),
        tests: pivot.tests.len(),
        flagged_cells,
    })
}

/// Decode `input` and write the device summary workbook to `output`
///
/// Nothing is written unless the whole report was built.
pub fn convert_file(input: &Path, output: &Path, config: &ConvertConfig) -> Result<ConversionSummary> {
    log::info!("Converting {:?}", input);

    let file = File::open(input)?;
    let source = input
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "input.stdf".to_string());

    let decoder = Decoder::new();
    let decoder_config = DecoderConfig::new().with_record_filter(REPORT_RECORDS);
    let records = decoder.decode_reader(BufReader::new(file), &source, decoder_config)?;
    let tables = RecordTables::from_records(records)?;

    let report = build_report(&tables, config)?;
    report.workbook.save(output)?;

    log::info!(
        "Wrote {:?}: {} device(s), {} test(s), {} cell(s) out of limits",
        output,
        report.devices,
        report.tests,
        report.flagged_cells.len()
    );

    Ok(ConversionSummary {
        input: input.to_path_buf(),
        output: output.to_path_buf(),
        records: tables.total_rows(),
        devices: report.devices,
        tests: report.tests,
        flagged_cells: report.flagged_cells.len(),
    })
}
