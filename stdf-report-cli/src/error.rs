//! Error types for the report engines

use stdf_decoder::DecoderError;

/// Result type for report operations
pub type Result<T> = std::result::Result<T, ReportError>;

/// Errors raised by the conversion and transpose engines
#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("Required record table missing: {0}")]
    MissingRequiredTable(&'static str),

    #[error("Missing required column: {0}")]
    MissingColumn(String),

    #[error("Failed to decode STDF stream: {0}")]
    Decode(#[from] DecoderError),

    #[error("Failed to write workbook: {0}")]
    Workbook(#[from] rust_xlsxwriter::XlsxError),

    #[error("Failed to read spreadsheet: {0}")]
    SheetRead(String),

    #[error("Sheet '{sheet}' needs {columns} columns; Excel allows at most {limit}")]
    TooManyColumns {
        sheet: String,
        columns: usize,
        limit: usize,
    },

    #[error("Unsupported input file: {0}")]
    UnsupportedInput(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ReportError {
    /// True when the input lacks data the engine requires, as opposed to
    /// an internal or collaborator failure
    pub fn is_missing_data(&self) -> bool {
        matches!(
            self,
            ReportError::MissingRequiredTable(_) | ReportError::MissingColumn(_)
        )
    }
}

impl From<calamine::Error> for ReportError {
    fn from(err: calamine::Error) -> Self {
        ReportError::SheetRead(err.to_string())
    }
}

impl From<csv::Error> for ReportError {
    fn from(err: csv::Error) -> Self {
        ReportError::SheetRead(err.to_string())
    }
}
