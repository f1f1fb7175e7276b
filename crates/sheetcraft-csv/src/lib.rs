//! # sheetcraft-csv
//!
//! CSV reader and writer for sheetcraft sheets.
//!
//! Record `r`, field `c` of a CSV file maps to the cell at row `r`, column `c`
//! (so the first field of the first record is A1). Fields go through
//! [`Sheet::set_input`](sheetcraft_core::Sheet::set_input): text starting with
//! `=` is kept as a formula, everything else is a literal.

mod error;
mod options;
mod reader;
mod writer;

pub use error::{CsvError, CsvResult};
pub use options::{CsvContent, CsvReadOptions, CsvWriteOptions, LineTerminator};
pub use reader::CsvReader;
pub use writer::CsvWriter;
