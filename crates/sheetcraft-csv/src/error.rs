//! CSV error types

use thiserror::Error;

/// Result type for CSV operations
pub type CsvResult<T> = std::result::Result<T, CsvError>;

/// Errors that can occur during CSV operations
#[derive(Debug, Error)]
pub enum CsvError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV library error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// A field could not be placed in the sheet (usually out of bounds)
    #[error("Record {record}, field {field}: {source}")]
    Cell {
        /// 1-based record number
        record: usize,
        /// 1-based field number
        field: usize,
        #[source]
        source: sheetcraft_core::Error,
    },

    /// Core error
    #[error("Core error: {0}")]
    Core(#[from] sheetcraft_core::Error),
}
