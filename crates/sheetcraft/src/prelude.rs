//! Prelude module - common imports for sheetcraft users
//!
//! ```rust
//! use sheetcraft::prelude::*;
//! ```

pub use crate::{
    // Cell types
    CellAddress,
    CellError,
    CellRange,
    CellValue,

    // Calculation types
    CalculationStats,
    // Extension traits
    SheetCalculationExt,

    // Error types
    Error,
    FormulaError,
    FormulaResult,
    FormulaValue,
    Result,

    // Main types
    SharedSheet,
    Sheet,
    SheetSettings,
};

#[cfg(feature = "csv")]
pub use crate::{CsvReader, CsvWriter};
