//! Schema registry
//!
//! Indexes the static record schemas by header pair and by name.

use super::{v4, RecordSchema};
use std::collections::HashMap;

/// Lookup table from STDF header bytes to record schemas
pub struct SchemaRegistry {
    /// Key: (REC_TYP, REC_SUB)
    by_header: HashMap<(u8, u8), &'static RecordSchema>,
    /// Key: record name
    by_name: HashMap<&'static str, &'static RecordSchema>,
    /// Recognised types that are stepped over
    skipped: HashMap<(u8, u8), &'static str>,
}

impl SchemaRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            by_header: HashMap::new(),
            by_name: HashMap::new(),
            skipped: HashMap::new(),
        }
    }

    /// Registry holding every decodable STDF V4 record type
    pub fn v4() -> Self {
        let mut registry = Self::new();
        for schema in v4::RECORDS {
            registry.add_schema(schema);
        }
        for &(typ, sub, name) in v4::SKIPPED {
            registry.skipped.insert((typ, sub), name);
        }
        registry
    }

    /// Add a schema to the registry
    pub fn add_schema(&mut self, schema: &'static RecordSchema) {
        self.by_header.insert((schema.rec_typ, schema.rec_sub), schema);
        self.by_name.insert(schema.name, schema);
    }

    /// Schema for a record header
    pub fn get(&self, rec_typ: u8, rec_sub: u8) -> Option<&'static RecordSchema> {
        self.by_header.get(&(rec_typ, rec_sub)).copied()
    }

    /// Schema by record name (case-sensitive, upper case)
    pub fn by_name(&self, name: &str) -> Option<&'static RecordSchema> {
        self.by_name.get(name).copied()
    }

    /// Name of a recognised but undecoded record type
    pub fn skipped_name(&self, rec_typ: u8, rec_sub: u8) -> Option<&'static str> {
        self.skipped.get(&(rec_typ, rec_sub)).copied()
    }

    /// Get registry statistics
    pub fn stats(&self) -> RegistryStats {
        RegistryStats {
            num_record_types: self.by_header.len(),
            num_fields: self.by_header.values().map(|s| s.fields.len()).sum(),
            num_skipped_types: self.skipped.len(),
        }
    }
}

impl Default for SchemaRegistry {
    fn default() -> Self {
        Self::v4()
    }
}

/// Registry statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegistryStats {
    /// Number of decodable record types
    pub num_record_types: usize,
    /// Total number of fields across all decodable types
    pub num_fields: usize,
    /// Number of recognised types that are skipped
    pub num_skipped_types: usize,
}
