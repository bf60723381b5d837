//! Standalone STDF record dump tool
//!
//! Decodes an STDF file and prints one line per record, followed by a
//! per-type record count.
//!
//! Usage:
//!   dump_records <file.stdf> [--only PTR,PRR] [--limit <count>] [--verbose]
//!
//! Example:
//!   dump_records lot.stdf --only MIR,PRR --limit 100 --verbose

use stdf_decoder::{Decoder, DecoderConfig, Record};
use std::collections::BTreeMap;
use std::env;
use std::path::PathBuf;

struct DumpStats {
    total_records: usize,
    decode_errors: usize,
    by_type: BTreeMap<&'static str, usize>,
}

impl DumpStats {
    fn new() -> Self {
        Self {
            total_records: 0,
            decode_errors: 0,
            by_type: BTreeMap::new(),
        }
    }

    fn print_summary(&self) {
        println!("\n=== DECODING SUMMARY ===");
        println!("Total records: {}", self.total_records);
        println!("Decode errors: {}", self.decode_errors);
        for (name, count) in &self.by_type {
            println!("  {}: {}", name, count);
        }
    }
}

fn print_record(record: &Record, verbose: bool) {
    println!("#{:<6} {}", record.index, record.name());

    if verbose {
        for (name, value) in record.field_names().zip(&record.values) {
            match value {
                Some(v) => println!("    {:<9} {}", name, v),
                None => println!("    {:<9} -", name),
            }
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        eprintln!(
            "Usage: {} <file.stdf> [--only PTR,PRR] [--limit <count>] [--verbose]",
            args[0]
        );
        std::process::exit(1);
    }

    let stdf_file = PathBuf::from(&args[1]);
    let mut config = DecoderConfig::new();
    let mut verbose = false;

    let mut i = 2;
    while i < args.len() {
        match args[i].as_str() {
            "--only" => {
                i += 1;
                if i < args.len() {
                    config = config.with_record_filter(args[i].split(','));
                }
            }
            "--limit" => {
                i += 1;
                if i < args.len() {
                    config = config.with_max_records(args[i].parse()?);
                }
            }
            "--verbose" | "-v" => verbose = true,
            other => eprintln!("Unknown argument: {}", other),
        }
        i += 1;
    }

    let decoder = Decoder::new();
    let registry = decoder.registry_stats();
    println!("=== STDF Decoder v{} ===", stdf_decoder::VERSION);
    println!("File: {:?}", stdf_file);
    println!(
        "Schemas: {} record types, {} fields ({} types skipped)\n",
        registry.num_record_types, registry.num_fields, registry.num_skipped_types
    );

    let mut stats = DumpStats::new();
    for result in decoder.decode_file(&stdf_file, config)? {
        match result {
            Ok(record) => {
                stats.total_records += 1;
                *stats.by_type.entry(record.name()).or_insert(0) += 1;
                print_record(&record, verbose);
            }
            Err(e) => {
                stats.decode_errors += 1;
                eprintln!("Error decoding record: {}", e);
            }
        }
    }

    stats.print_summary();
    Ok(())
}
