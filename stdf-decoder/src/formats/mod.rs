//! Record stream parsers
//!
//! This module contains the binary STDF V4 stream parser. The parser
//! implements an iterator pattern over decoded [`Record`](crate::types::Record)
//! values.

pub mod stdf;

// Re-export parser types
pub use stdf::{Endianness, StdfRecordIterator};
