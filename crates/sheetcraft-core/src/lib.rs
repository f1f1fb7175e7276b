//! # sheetcraft-core
//!
//! Core data structures for the sheetcraft formula engine.
//!
//! This crate provides the fundamental types used throughout sheetcraft:
//! - [`CellValue`] and [`CellError`] - Literal cell values and spreadsheet error codes
//! - [`CellAddress`] and [`CellRange`] - Cell addressing and ranges
//! - [`Cell`] - A stored cell (value, authored formula, display format)
//! - [`Sheet`] and [`SheetSettings`] - The bounded, sparse grid
//!
//! ## Example
//!
//! ```rust
//! use sheetcraft_core::{CellValue, Sheet};
//!
//! let mut sheet = Sheet::new();
//!
//! // Host input: literals and formulas as typed by the learner
//! sheet.set_input("A1", "10").unwrap();
//! sheet.set_input("A2", "=A1*2").unwrap();
//!
//! assert_eq!(sheet.get_value("A1").unwrap(), CellValue::Number(10.0));
//! assert_eq!(sheet.formula("A2").unwrap(), Some("=A1*2"));
//! ```

pub mod cell;
pub mod error;
pub mod settings;
pub mod sheet;

// Re-exports for convenience
pub use cell::{
    format_number, parse_number, Cell, CellAddress, CellError, CellRange, CellValue, SharedString,
};
pub use error::{Error, Result};
pub use settings::SheetSettings;
pub use sheet::Sheet;

/// Default number of rows in a sheet (rows 1..=100)
pub const DEFAULT_MAX_ROWS: u32 = 100;

/// Default number of columns in a sheet (columns A..=Z)
pub const DEFAULT_MAX_COLS: u16 = 26;
