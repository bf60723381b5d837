//! Main decoder API
//!
//! This module provides the primary interface for the decoder library.
//! The Decoder struct is the entry point for decoding STDF files into
//! typed records.

use crate::config::DecoderConfig;
use crate::formats::StdfRecordIterator;
use crate::schema::{RegistryStats, SchemaRegistry};
use crate::types::{DecoderError, Record, Result};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

/// The main decoder struct - entry point for all decoding operations
pub struct Decoder {
    /// Record schemas the decoder understands
    registry: SchemaRegistry,
}

impl Decoder {
    /// Create a decoder for STDF V4
    pub fn new() -> Self {
        Self {
            registry: SchemaRegistry::v4(),
        }
    }

    /// Create a decoder over a custom schema registry
    pub fn with_registry(registry: SchemaRegistry) -> Self {
        Self { registry }
    }

    /// Decode an STDF file and return an iterator of decoded records
    ///
    /// The iterator is lazy: records are read from disk as it advances. The
    /// first item is always the FAR record unless the config filters it out.
    ///
    /// # Example
    /// ```no_run
    /// use stdf_decoder::{Decoder, DecoderConfig};
    /// use std::path::Path;
    ///
    /// let decoder = Decoder::new();
    /// let config = DecoderConfig::new().with_record_filter(["PTR"]);
    /// let records = decoder.decode_file(Path::new("lot.stdf"), config).unwrap();
    ///
    /// for record in records {
    ///     match record {
    ///         Ok(ptr) => println!("{:?}", ptr.get("RESULT")),
    ///         Err(e) => eprintln!("Error: {}", e),
    ///     }
    /// }
    /// ```
    pub fn decode_file(
        &self,
        path: &Path,
        config: DecoderConfig,
    ) -> Result<Box<dyn Iterator<Item = Result<Record>> + '_>> {
        log::info!("Decoding STDF file: {:?}", path);

        let extension = path
            .extension()
            .and_then(|s| s.to_str())
            .map(|s| s.to_lowercase());

        match extension.as_deref() {
            Some("stdf") | Some("std") => {
                let file = File::open(path)?;
                let source = path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| "unknown.stdf".to_string());
                self.decode_reader(BufReader::new(file), &source, config)
            }
            _ => Err(DecoderError::InvalidData(format!(
                "Unsupported file format: {:?}",
                extension
            ))),
        }
    }

    /// Decode an STDF byte stream from any reader
    ///
    /// `source_name` is attached to every record as its origin file.
    pub fn decode_reader<'a, R: Read + 'a>(
        &'a self,
        reader: R,
        source_name: &str,
        config: DecoderConfig,
    ) -> Result<Box<dyn Iterator<Item = Result<Record>> + 'a>> {
        let records = StdfRecordIterator::new(reader, source_name, &self.registry)?;
        Ok(Box::new(FilteredRecords::new(records, config)))
    }

    /// Get statistics about the loaded schema registry
    pub fn registry_stats(&self) -> RegistryStats {
        self.registry.stats()
    }
}

impl Default for Decoder {
    fn default() -> Self {
        Self::new()
    }
}

/// Applies the record filter and record limit of a [`DecoderConfig`]
struct FilteredRecords<I>
where
    I: Iterator<Item = Result<Record>>,
{
    records: I,
    config: DecoderConfig,
    emitted: usize,
}

impl<I> FilteredRecords<I>
where
    I: Iterator<Item = Result<Record>>,
{
    fn new(records: I, config: DecoderConfig) -> Self {
        Self {
            records,
            config,
            emitted: 0,
        }
    }
}

impl<I> Iterator for FilteredRecords<I>
where
    I: Iterator<Item = Result<Record>>,
{
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(limit) = self.config.max_records {
            if self.emitted >= limit {
                return None;
            }
        }

        loop {
            match self.records.next()? {
                Ok(record) if !self.config.should_emit(record.name()) => {
                    log::trace!("Filtered out {} record #{}", record.name(), record.index);
                    continue;
                }
                Ok(record) => {
                    self.emitted += 1;
                    return Some(Ok(record));
                }
                Err(e) => return Some(Err(e)),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decoder_creation() {
        let decoder = Decoder::new();
        let stats = decoder.registry_stats();
        assert!(stats.num_record_types > 0);
        assert!(stats.num_fields > stats.num_record_types);
    }

    #[test]
    fn test_unsupported_file_format() {
        let decoder = Decoder::new();
        let config = DecoderConfig::new();
        let result = decoder.decode_file(Path::new("test.txt"), config);
        assert!(result.is_err());
    }

    #[test]
    fn test_stdf_file_not_found() {
        let decoder = Decoder::new();
        let result = decoder.decode_file(Path::new("nonexistent.stdf"), DecoderConfig::new());
        assert!(matches!(result, Err(DecoderError::IoError(_))));
    }

    #[test]
    fn test_max_records_limit() {
        let decoder = Decoder::new();
        // FAR followed by two DTRs
        let bytes: Vec<u8> = vec![
            2, 0, 0, 10, 2, 4, //
            2, 0, 50, 30, 1, b'a', //
            2, 0, 50, 30, 1, b'b',
        ];
        let config = DecoderConfig::new().with_max_records(2);
        let records: Vec<Record> = decoder
            .decode_reader(&bytes[..], "mem.stdf", config)
            .unwrap()
            .collect::<Result<_>>()
            .unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].get_text("TEXT_DAT"), Some("a"));
    }
}
