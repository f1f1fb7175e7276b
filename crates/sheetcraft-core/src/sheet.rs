//! Sheet type

use std::collections::BTreeMap;

use crate::cell::{Cell, CellAddress, CellRange, CellValue};
use crate::error::{Error, Result};
use crate::settings::SheetSettings;

/// A bounded, sparse grid of cells
///
/// Cells are keyed by `(row, col)` so iteration is row-major. Absent addresses
/// are implicitly empty.
#[derive(Debug, Clone, Default)]
pub struct Sheet {
    /// Grid bounds
    settings: SheetSettings,
    /// Non-blank cells
    cells: BTreeMap<(u32, u16), Cell>,
}

impl Sheet {
    /// Create an empty sheet with the default bounds (A1:Z100)
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty sheet with custom bounds
    pub fn with_settings(settings: SheetSettings) -> Result<Self> {
        settings.validate()?;
        Ok(Self {
            settings,
            cells: BTreeMap::new(),
        })
    }

    /// The grid bounds
    pub fn settings(&self) -> &SheetSettings {
        &self.settings
    }

    // === Cell Access ===

    /// Get a cell by address string (e.g., "A1")
    pub fn cell(&self, address: &str) -> Result<Option<&Cell>> {
        let addr = CellAddress::parse(address)?;
        Ok(self.cell_at(addr.row, addr.col))
    }

    /// Get a cell by row and column indices
    pub fn cell_at(&self, row: u32, col: u16) -> Option<&Cell> {
        self.cells.get(&(row, col))
    }

    /// Get the stored value by address string
    ///
    /// For formula cells this is the value cached by the last recalculation.
    pub fn get_value(&self, address: &str) -> Result<CellValue> {
        let addr = CellAddress::parse(address)?;
        Ok(self.get_value_at(addr.row, addr.col))
    }

    /// Get the stored value by indices
    pub fn get_value_at(&self, row: u32, col: u16) -> CellValue {
        self.cells
            .get(&(row, col))
            .map(|c| c.value.clone())
            .unwrap_or(CellValue::Empty)
    }

    /// Get the authored formula text by address string
    pub fn formula(&self, address: &str) -> Result<Option<&str>> {
        let addr = CellAddress::parse(address)?;
        Ok(self.formula_at(addr.row, addr.col))
    }

    /// Get the authored formula text by indices
    pub fn formula_at(&self, row: u32, col: u16) -> Option<&str> {
        self.cells.get(&(row, col)).and_then(Cell::formula)
    }

    // === Cell Modification ===

    /// Apply raw host input to a cell
    ///
    /// Text starting with `=` becomes a formula; anything else is a literal as
    /// interpreted by [`CellValue::from_input`]. Empty input clears the cell.
    pub fn set_input(&mut self, address: &str, raw: &str) -> Result<()> {
        let addr = CellAddress::parse(address)?;
        self.set_input_at(addr.row, addr.col, raw)
    }

    /// Apply raw host input to a cell by indices
    pub fn set_input_at(&mut self, row: u32, col: u16, raw: &str) -> Result<()> {
        if raw.starts_with('=') {
            self.set_formula_at(row, col, raw)
        } else {
            self.set_value_at(row, col, CellValue::from_input(raw))
        }
    }

    /// Set a literal value by address string
    pub fn set_value<V: Into<CellValue>>(&mut self, address: &str, value: V) -> Result<()> {
        let addr = CellAddress::parse(address)?;
        self.set_value_at(addr.row, addr.col, value)
    }

    /// Set a literal value by indices, replacing any formula
    pub fn set_value_at<V: Into<CellValue>>(&mut self, row: u32, col: u16, value: V) -> Result<()> {
        self.validate_cell_position(row, col)?;
        let value = value.into();
        let cell = self.cells.entry((row, col)).or_default();
        cell.value = value;
        cell.formula = None;
        self.remove_if_blank(row, col);
        Ok(())
    }

    /// Set a formula by address string
    pub fn set_formula(&mut self, address: &str, formula: &str) -> Result<()> {
        let addr = CellAddress::parse(address)?;
        self.set_formula_at(addr.row, addr.col, formula)
    }

    /// Set a formula by indices
    ///
    /// The text is stored verbatim (a missing `=` is prepended). The cached value
    /// is reset until the next recalculation.
    pub fn set_formula_at(&mut self, row: u32, col: u16, formula: &str) -> Result<()> {
        self.validate_cell_position(row, col)?;

        let formula = if formula.starts_with('=') {
            formula.to_string()
        } else {
            format!("={}", formula)
        };

        let cell = self.cells.entry((row, col)).or_default();
        cell.value = CellValue::Empty;
        cell.formula = Some(formula);
        Ok(())
    }

    /// Store the computed result of a formula cell
    ///
    /// Fails if the cell does not hold a formula.
    pub fn set_cached_value(&mut self, row: u32, col: u16, value: CellValue) -> Result<()> {
        match self.cells.get_mut(&(row, col)) {
            Some(cell) if cell.is_formula() => {
                cell.value = value;
                Ok(())
            }
            _ => Err(Error::other(format!(
                "cell {} does not hold a formula",
                CellAddress::new(row, col)
            ))),
        }
    }

    /// Set or remove the display format of a cell
    pub fn set_format(&mut self, address: &str, format: Option<String>) -> Result<()> {
        let addr = CellAddress::parse(address)?;
        self.validate_cell_position(addr.row, addr.col)?;
        self.cells.entry(addr.key()).or_default().format = format;
        self.remove_if_blank(addr.row, addr.col);
        Ok(())
    }

    /// Clear a cell
    pub fn clear_cell(&mut self, address: &str) -> Result<()> {
        let addr = CellAddress::parse(address)?;
        self.clear_cell_at(addr.row, addr.col);
        Ok(())
    }

    /// Clear a cell by indices
    pub fn clear_cell_at(&mut self, row: u32, col: u16) {
        self.cells.remove(&(row, col));
    }

    /// Clear all cells in a range
    pub fn clear_range(&mut self, range: &CellRange) {
        let start = range.start.key();
        let end = range.end.key();
        self.cells
            .retain(|&(row, col), _| !(row >= start.0 && row <= end.0 && col >= start.1 && col <= end.1));
    }

    /// Remove every cell
    pub fn clear(&mut self) {
        self.cells.clear();
    }

    // === Iteration ===

    /// Get the number of stored cells
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Check if the sheet has no cells
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Iterate over stored cells in row-major order
    pub fn iter_cells(&self) -> impl Iterator<Item = (CellAddress, &Cell)> {
        self.cells
            .iter()
            .map(|(&(row, col), cell)| (CellAddress::new(row, col), cell))
    }

    /// Iterate over all formula cells: (address, formula_text)
    pub fn formula_cells(&self) -> impl Iterator<Item = (CellAddress, &str)> {
        self.iter_cells()
            .filter_map(|(addr, cell)| cell.formula().map(|f| (addr, f)))
    }

    /// Get the used range (bounds of all stored cells)
    pub fn used_range(&self) -> Option<CellRange> {
        let mut keys = self.cells.keys();
        let &(first_row, first_col) = keys.next()?;

        let (mut min_col, mut max_row, mut max_col) = (first_col, first_row, first_col);
        for &(row, col) in keys {
            min_col = min_col.min(col);
            max_col = max_col.max(col);
            max_row = max_row.max(row);
        }

        Some(CellRange::from_indices(first_row, min_col, max_row, max_col))
    }

    /// Validate cell position against the sheet bounds
    fn validate_cell_position(&self, row: u32, col: u16) -> Result<()> {
        self.settings.check(&CellAddress::new(row, col))
    }

    fn remove_if_blank(&mut self, row: u32, col: u16) {
        if self.cells.get(&(row, col)).is_some_and(Cell::is_blank) {
            self.cells.remove(&(row, col));
        }
    }
}
