//! Record schemas and the schema registry
//!
//! Every record type the decoder understands is described by a static
//! [`RecordSchema`]: its STDF type/sub-type pair, its name and its ordered
//! field list. The registry indexes those schemas for header lookup.

pub mod registry;
pub mod v4;

pub use registry::{RegistryStats, SchemaRegistry};

use crate::types::FieldKind;

/// A single field in a record schema
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDef {
    /// Field name as written in the STDF V4 specification (e.g. `TEST_NUM`)
    pub name: &'static str,
    /// Binary encoding of the field
    pub kind: FieldKind,
}

/// Static description of one record type
#[derive(Debug, PartialEq, Eq)]
pub struct RecordSchema {
    /// Record name (e.g. `PTR`)
    pub name: &'static str,
    /// REC_TYP header byte
    pub rec_typ: u8,
    /// REC_SUB header byte
    pub rec_sub: u8,
    /// Fields in wire order
    pub fields: &'static [FieldDef],
}

impl RecordSchema {
    /// Position of a field by name
    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }

    /// Field names in wire order
    pub fn field_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.fields.iter().map(|f| f.name)
    }
}

pub(crate) const fn field(name: &'static str, kind: FieldKind) -> FieldDef {
    FieldDef { name, kind }
}
