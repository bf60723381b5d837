//! Worksheet layouts
//!
//! The engines produce plain data (pivot, part summaries, condition
//! groups); these modules place it on sheets and apply the styling.

pub mod device_summary;
pub mod transposed;
