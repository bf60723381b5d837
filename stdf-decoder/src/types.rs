//! Core types for the STDF decoder library
//!
//! This module defines the fundamental types the decoder emits when processing
//! STDF files. The decoder is stateless and only outputs typed records - it
//! does not segment devices, join tables or build reports.

use crate::schema::RecordSchema;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Timestamp type used throughout the decoder
pub type Timestamp = DateTime<Utc>;

/// Result type for decoder operations
pub type Result<T> = std::result::Result<T, DecoderError>;

/// Errors that can occur during decoding
#[derive(Debug, thiserror::Error)]
pub enum DecoderError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Stream does not start with a FAR record")]
    MissingFar,

    #[error("Unsupported CPU type {0} in FAR record")]
    UnsupportedCpuType(u8),

    #[error("Truncated {record} record at byte offset {offset}")]
    Truncated { record: String, offset: u64 },

    #[error("Invalid data: {0}")]
    InvalidData(String),
}

/// Binary encoding of an STDF field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FieldKind {
    U1,
    U2,
    U4,
    I1,
    I2,
    I4,
    R4,
    R8,
    /// Single character
    C1,
    /// Length-prefixed character string
    Cn,
    /// Single byte of flag bits
    B1,
    /// Length-prefixed bit bytes
    Bn,
    /// Bit-count-prefixed bit field
    Dn,
}

/// A decoded field value
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Unsigned(u64),
    Signed(i64),
    Float(f64),
    Text(String),
    Bytes(Vec<u8>),
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Unsigned(v) => write!(f, "{}", v),
            FieldValue::Signed(v) => write!(f, "{}", v),
            FieldValue::Float(v) => write!(f, "{}", v),
            FieldValue::Text(s) => write!(f, "{}", s),
            FieldValue::Bytes(bytes) => {
                for b in bytes {
                    write!(f, "{:02X}", b)?;
                }
                Ok(())
            }
        }
    }
}

impl FieldValue {
    /// Numeric view of the value; text is parsed, bytes are not numeric
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Unsigned(v) => Some(*v as f64),
            FieldValue::Signed(v) => Some(*v as f64),
            FieldValue::Float(v) => Some(*v),
            FieldValue::Text(s) => s.trim().parse().ok(),
            FieldValue::Bytes(_) => None,
        }
    }

    /// Integer view of the value; floats must be finite and are truncated
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            FieldValue::Unsigned(v) => i64::try_from(*v).ok(),
            FieldValue::Signed(v) => Some(*v),
            FieldValue::Float(v) if v.is_finite() => Some(v.trunc() as i64),
            FieldValue::Float(_) => None,
            FieldValue::Text(s) => s.trim().parse().ok(),
            FieldValue::Bytes(_) => None,
        }
    }

    /// Unsigned integer view of the value
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            FieldValue::Unsigned(v) => Some(*v),
            other => other.as_i64().and_then(|v| u64::try_from(v).ok()),
        }
    }

    /// Text view of the value (only for text fields)
    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

/// A single decoded STDF record
///
/// Values are stored in schema order. A `None` value means the field was
/// not present because the record body ended before it.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    /// Static schema of this record type
    pub schema: &'static RecordSchema,
    /// Position of the record among decoded records (0 = FAR)
    pub index: usize,
    /// File name the record was read from
    pub source_file: Arc<str>,
    /// Field values in schema order
    pub values: Vec<Option<FieldValue>>,
}

impl Record {
    /// Record type name (e.g. `PTR`)
    pub fn name(&self) -> &'static str {
        self.schema.name
    }

    /// Field names in schema order
    pub fn field_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.schema.field_names()
    }

    /// Value of a named field, if present
    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.schema
            .field_index(field)
            .and_then(|idx| self.values.get(idx))
            .and_then(|v| v.as_ref())
    }

    pub fn get_u64(&self, field: &str) -> Option<u64> {
        self.get(field).and_then(FieldValue::as_u64)
    }

    pub fn get_i64(&self, field: &str) -> Option<i64> {
        self.get(field).and_then(FieldValue::as_i64)
    }

    pub fn get_f64(&self, field: &str) -> Option<f64> {
        self.get(field).and_then(FieldValue::as_f64)
    }

    pub fn get_text(&self, field: &str) -> Option<&str> {
        self.get(field).and_then(FieldValue::as_str)
    }

    /// Interpret a U4 epoch-seconds field as a UTC timestamp
    pub fn timestamp(&self, field: &str) -> Option<Timestamp> {
        let secs = self.get_i64(field)?;
        DateTime::from_timestamp(secs, 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::v4;

    fn ptr_record(values: Vec<Option<FieldValue>>) -> Record {
        Record {
            schema: &v4::PTR,
            index: 3,
            source_file: Arc::from("lot.stdf"),
            values,
        }
    }

    #[test]
    fn test_field_value_conversions() {
        assert_eq!(FieldValue::Unsigned(42).as_f64(), Some(42.0));
        assert_eq!(FieldValue::Float(3.9).as_i64(), Some(3));
        assert_eq!(FieldValue::Float(f64::NAN).as_i64(), None);
        assert_eq!(FieldValue::Signed(-1).as_u64(), None);
        assert_eq!(FieldValue::Text(" 12 ".into()).as_i64(), Some(12));
        assert_eq!(FieldValue::Bytes(vec![1]).as_f64(), None);
    }

    #[test]
    fn test_field_value_display() {
        assert_eq!(FieldValue::Unsigned(7).to_string(), "7");
        assert_eq!(FieldValue::Bytes(vec![0x0A, 0xFF]).to_string(), "0AFF");
        assert_eq!(FieldValue::Text("VDD".into()).to_string(), "VDD");
    }

    #[test]
    fn test_record_field_access() {
        let record = ptr_record(vec![
            Some(FieldValue::Unsigned(1000)),
            Some(FieldValue::Unsigned(1)),
            Some(FieldValue::Unsigned(2)),
        ]);

        assert_eq!(record.name(), "PTR");
        assert_eq!(record.get_u64("TEST_NUM"), Some(1000));
        assert_eq!(record.get_u64("SITE_NUM"), Some(2));
        // Present in the schema but not in the body
        assert!(record.get("RESULT").is_none());
        // Not in the schema at all
        assert!(record.get("BOGUS").is_none());
    }

    #[test]
    fn test_record_timestamp() {
        let record = Record {
            schema: &v4::MRR,
            index: 9,
            source_file: Arc::from("lot.stdf"),
            values: vec![Some(FieldValue::Unsigned(86_400))],
        };
        let ts = record.timestamp("FINISH_T").unwrap();
        assert_eq!(ts.format("%Y-%m-%d").to_string(), "1970-01-02");
    }
}
