//! Cell-related types and utilities
//!
//! This module contains:
//! - [`CellValue`] - The value stored in a cell
//! - [`CellAddress`] - A cell's location (e.g., "A1")
//! - [`CellRange`] - A range of cells (e.g., "A1:B10")
//! - [`Cell`] - Complete cell data: value, authored formula and display format

mod address;
mod value;

pub use address::{CellAddress, CellRange, CellRangeIterator};
pub use value::{format_number, parse_number, CellError, CellValue, SharedString};

/// A stored cell
///
/// When `formula` is set, `value` is the result cached by the last
/// recalculation and is never read by evaluation.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Cell {
    /// Literal value, or the cached result of the formula
    pub value: CellValue,
    /// Formula text exactly as authored, including the leading `=`
    pub formula: Option<String>,
    /// Display format (e.g. "0.00"), opaque to the engine
    pub format: Option<String>,
}

impl Cell {
    /// Create a literal cell
    pub fn with_value(value: CellValue) -> Self {
        Self {
            value,
            formula: None,
            format: None,
        }
    }

    /// Create a formula cell with no cached value yet
    pub fn with_formula<S: Into<String>>(formula: S) -> Self {
        Self {
            value: CellValue::Empty,
            formula: Some(formula.into()),
            format: None,
        }
    }

    /// Check if the cell holds a formula
    pub fn is_formula(&self) -> bool {
        self.formula.is_some()
    }

    /// The authored formula text, if any
    pub fn formula(&self) -> Option<&str> {
        self.formula.as_deref()
    }

    /// A cell with no value, formula or format carries no information
    pub fn is_blank(&self) -> bool {
        self.value.is_empty() && self.formula.is_none() && self.format.is_none()
    }

    /// The text the host would put back in an input box
    pub fn input_text(&self) -> String {
        match &self.formula {
            Some(formula) => formula.clone(),
            None => self.value.to_string(),
        }
    }
}
