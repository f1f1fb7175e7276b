//! # sheetcraft
//!
//! A small spreadsheet formula engine: a bounded grid of cells, an
//! Excel-compatible formula language and the functions learners meet first
//! (SUM, IF, VLOOKUP, COUNTIF, ...).
//!
//! ## Features
//!
//! - Formula parsing with positioned syntax errors
//! - On-demand evaluation of any cell, with circular reference detection
//! - Whole-sheet recalculation that caches results in the cells
//! - A thread-safe shared sheet handle
//! - CSV import and export (`csv` feature, on by default)
//!
//! ## Example
//!
//! ```rust
//! use sheetcraft::prelude::*;
//!
//! let mut sheet = Sheet::new();
//! sheet.set_input("A1", "101").unwrap();
//! sheet.set_input("B1", "Andi").unwrap();
//! sheet.set_input("A2", "102").unwrap();
//! sheet.set_input("B2", "Budi").unwrap();
//! sheet.set_input("D1", "=VLOOKUP(102, A1:B2, 2, FALSE)").unwrap();
//!
//! let result = sheetcraft::evaluate(&sheet, CellAddress::parse("D1").unwrap());
//! assert_eq!(result, Ok(FormulaValue::from("Budi")));
//!
//! let error = sheetcraft::evaluate_formula(&sheet, "=1/0").unwrap_err();
//! assert_eq!(error.display_value(), "#DIV/0!");
//! ```

pub mod calculation;
pub mod prelude;
pub mod shared;

// Re-export calculation types
pub use calculation::{dependents_of, CalculationStats, SheetCalculationExt};
pub use shared::SharedSheet;

// Re-export core types
pub use sheetcraft_core::{
    Cell, CellAddress, CellError, CellRange, CellValue, Error, Result, Sheet, SheetSettings,
    DEFAULT_MAX_COLS, DEFAULT_MAX_ROWS,
};

// Re-export formula types
pub use sheetcraft_formula::{
    parse_formula, Evaluator, EvaluatorOptions, FormulaError, FormulaExpr, FormulaResult,
    FormulaValue, FunctionRegistry, RuntimeError, SyntaxError, SyntaxErrorKind,
};

// Re-export I/O types
#[cfg(feature = "csv")]
pub use sheetcraft_csv::{
    CsvContent, CsvError, CsvReadOptions, CsvReader, CsvWriteOptions, CsvWriter,
};

/// Evaluate one cell of a sheet
///
/// Formula cells are computed from scratch (the cached value is ignored),
/// literal cells return their value and blank cells `Empty`.
pub fn evaluate(sheet: &Sheet, address: CellAddress) -> FormulaResult {
    Evaluator::new(sheet).evaluate_cell(address)
}

/// Evaluate formula text against a sheet without storing it
pub fn evaluate_formula(sheet: &Sheet, formula: &str) -> FormulaResult {
    Evaluator::new(sheet).evaluate_formula(formula)
}
