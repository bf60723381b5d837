//! Record tables keyed by record type
//!
//! The conversion engine works on whole tables rather than on the record
//! stream, so the decoded records are bucketed by type first. A table only
//! exists once a record of its type has been seen.

use crate::error::{ReportError, Result};
use std::collections::BTreeMap;
use stdf_decoder::Record;

/// All decoded records of one type, in stream order
#[derive(Debug, Clone)]
pub struct RecordTable {
    pub name: &'static str,
    pub rows: Vec<Record>,
}

impl RecordTable {
    fn new(first: Record) -> Self {
        Self {
            name: first.name(),
            rows: vec![first],
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }
}

/// Record type name -> table
#[derive(Debug, Clone, Default)]
pub struct RecordTables {
    tables: BTreeMap<&'static str, RecordTable>,
}

impl RecordTables {
    /// Bucket a decoded record stream; the first decoder error aborts
    pub fn from_records<I>(records: I) -> Result<Self>
    where
        I: IntoIterator<Item = stdf_decoder::Result<Record>>,
    {
        let mut tables: BTreeMap<&'static str, RecordTable> = BTreeMap::new();
        for record in records {
            let record = record?;
            match tables.get_mut(record.name()) {
                Some(table) => table.rows.push(record),
                None => {
                    tables.insert(record.name(), RecordTable::new(record));
                }
            }
        }

        for table in tables.values() {
            log::debug!("{}: {} row(s)", table.name, table.len());
        }
        Ok(Self { tables })
    }

    pub fn get(&self, name: &str) -> Option<&RecordTable> {
        self.tables.get(name)
    }

    /// Table that the conversion cannot proceed without
    pub fn require(&self, name: &'static str) -> Result<&RecordTable> {
        self.get(name).ok_or(ReportError::MissingRequiredTable(name))
    }

    /// First row of a table, if the table exists
    pub fn first(&self, name: &str) -> Option<&Record> {
        self.get(name).and_then(|t| t.rows.first())
    }

    pub fn total_rows(&self) -> usize {
        self.tables.values().map(RecordTable::len).sum()
    }
}
