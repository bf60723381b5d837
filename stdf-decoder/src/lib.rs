//! STDF Decoder Library
//!
//! A stateless, reusable library for decoding STDF V4 (Standard Test Data
//! Format) files into typed records.
//!
//! # Architecture
//!
//! This library is intentionally minimal and focused on decoding:
//! - Parses the binary record stream and emits one [`Record`] per record
//! - Honors the byte order declared by the FAR record
//! - Decodes scalar, string and bit fields by a static per-type schema
//! - Steps over record types with array fields, warning once per type
//!
//! The library does NOT:
//! - Segment parametric results into devices
//! - Join part results with bin definitions
//! - Generate spreadsheets
//!
//! All higher-level functionality is in the application layer (stdf-report-cli).
//!
//! # Example Usage
//!
//! ```no_run
//! use stdf_decoder::{Decoder, DecoderConfig};
//! use std::path::Path;
//!
//! let decoder = Decoder::new();
//! let config = DecoderConfig::new().with_record_filter(["MIR", "PTR"]);
//!
//! for record in decoder.decode_file(Path::new("lot.stdf"), config).unwrap() {
//!     match record {
//!         Ok(record) => println!("{} #{}", record.name(), record.index),
//!         Err(e) => eprintln!("Decode error: {}", e),
//!     }
//! }
//! ```

// Public modules
pub mod config;
pub mod decoder;
pub mod encoder;
pub mod formats;
pub mod schema;
pub mod types;

// Re-export main types for convenience
pub use config::DecoderConfig;
pub use decoder::Decoder;
pub use encoder::StdfWriter;
pub use formats::Endianness;
pub use schema::{FieldDef, RecordSchema, RegistryStats, SchemaRegistry};
pub use types::{DecoderError, FieldKind, FieldValue, Record, Result, Timestamp};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_basics() {
        // Smoke test: the default decoder knows the parametric record
        let decoder = Decoder::new();
        let stats = decoder.registry_stats();
        assert_eq!(stats.num_record_types, schema::v4::RECORDS.len());
    }
}
