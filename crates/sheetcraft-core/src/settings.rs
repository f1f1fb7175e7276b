//! Sheet settings

use crate::cell::{CellAddress, CellRange};
use crate::error::{Error, Result};
use crate::{DEFAULT_MAX_COLS, DEFAULT_MAX_ROWS};

/// Largest column count a sheet may be configured with (column XFD)
pub const MAX_CONFIGURABLE_COLS: u16 = 16_384;

/// Largest row count a sheet may be configured with
pub const MAX_CONFIGURABLE_ROWS: u32 = 1_048_576;

/// Sheet configuration
///
/// Defines the addressable grid. References outside these bounds evaluate to `#REF!`
/// and writes outside them are rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "UncheckedSettings"))]
pub struct SheetSettings {
    /// Number of rows (row indices `0..max_rows`)
    pub max_rows: u32,
    /// Number of columns (column indices `0..max_cols`)
    pub max_cols: u16,
}

impl Default for SheetSettings {
    fn default() -> Self {
        Self {
            max_rows: DEFAULT_MAX_ROWS,
            max_cols: DEFAULT_MAX_COLS,
        }
    }
}

/// Settings as written by a host, before validation
#[cfg(feature = "serde")]
#[derive(serde::Deserialize)]
#[serde(default)]
struct UncheckedSettings {
    max_rows: u32,
    max_cols: u16,
}

#[cfg(feature = "serde")]
impl Default for UncheckedSettings {
    fn default() -> Self {
        let settings = SheetSettings::default();
        Self {
            max_rows: settings.max_rows,
            max_cols: settings.max_cols,
        }
    }
}

#[cfg(feature = "serde")]
impl TryFrom<UncheckedSettings> for SheetSettings {
    type Error = Error;

    fn try_from(raw: UncheckedSettings) -> Result<Self> {
        SheetSettings::new(raw.max_rows, raw.max_cols)
    }
}

impl SheetSettings {
    /// Create validated settings
    pub fn new(max_rows: u32, max_cols: u16) -> Result<Self> {
        let settings = Self { max_rows, max_cols };
        settings.validate()?;
        Ok(settings)
    }

    /// Check that the bounds describe a non-empty grid within spreadsheet limits
    pub fn validate(&self) -> Result<()> {
        if self.max_rows == 0 || self.max_rows > MAX_CONFIGURABLE_ROWS {
            return Err(Error::InvalidSettings(format!(
                "row count must be between 1 and {}, got {}",
                MAX_CONFIGURABLE_ROWS, self.max_rows
            )));
        }
        if self.max_cols == 0 || self.max_cols > MAX_CONFIGURABLE_COLS {
            return Err(Error::InvalidSettings(format!(
                "column count must be between 1 and {}, got {}",
                MAX_CONFIGURABLE_COLS, self.max_cols
            )));
        }
        Ok(())
    }

    /// Check if an address lies inside the grid
    pub fn contains(&self, addr: &CellAddress) -> bool {
        addr.row < self.max_rows && addr.col < self.max_cols
    }

    /// Check if both corners of a range lie inside the grid
    pub fn contains_range(&self, range: &CellRange) -> bool {
        self.contains(&range.start) && self.contains(&range.end)
    }

    /// Return an error describing why an address is outside the grid
    pub fn check(&self, addr: &CellAddress) -> Result<()> {
        if addr.row >= self.max_rows {
            return Err(Error::RowOutOfBounds(addr.row.saturating_add(1), self.max_rows));
        }
        if addr.col >= self.max_cols {
            return Err(Error::ColumnOutOfBounds(addr.col.saturating_add(1), self.max_cols));
        }
        Ok(())
    }

    /// The whole grid as a range
    pub fn full_range(&self) -> CellRange {
        CellRange::from_indices(
            0,
            0,
            self.max_rows.saturating_sub(1),
            self.max_cols.saturating_sub(1),
        )
    }

    /// Clip a range to the grid, or `None` if it lies entirely outside
    pub fn clip(&self, range: &CellRange) -> Option<CellRange> {
        range.intersect(&self.full_range())
    }
}
