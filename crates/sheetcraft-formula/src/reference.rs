//! Reference resolution against the sheet bounds

use crate::ast::{CellReference, RangeReference};
use sheetcraft_core::{CellAddress, CellError, CellRange, SheetSettings};

/// Turns parsed references into addresses inside the configured grid
#[derive(Debug, Clone, Copy)]
pub struct ReferenceResolver {
    settings: SheetSettings,
}

impl ReferenceResolver {
    pub fn new(settings: SheetSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &SheetSettings {
        &self.settings
    }

    /// Resolve a single cell reference; `$` flags are kept
    pub fn resolve_cell(&self, reference: &CellReference) -> Result<CellAddress, CellError> {
        if self.settings.contains(&reference.address) {
            Ok(reference.address)
        } else {
            Err(CellError::Ref)
        }
    }

    /// Resolve a range reference; both corners must be inside the grid
    pub fn resolve_range(&self, reference: &RangeReference) -> Result<CellRange, CellError> {
        // Ranges are normalized at construction, but parsed trees may be built by hand
        let range = CellRange::new(reference.range.start, reference.range.end);
        if self.settings.contains_range(&range) {
            Ok(range)
        } else {
            Err(CellError::Ref)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cell(s: &str) -> CellReference {
        CellReference {
            address: CellAddress::parse(s).unwrap(),
        }
    }

    fn range(s: &str) -> RangeReference {
        RangeReference {
            range: CellRange::parse(s).unwrap(),
        }
    }

    #[test]
    fn test_resolve_cell() {
        let resolver = ReferenceResolver::new(SheetSettings::default());

        let addr = resolver.resolve_cell(&cell("$Z$100")).unwrap();
        assert_eq!(addr.key(), (99, 25));
        assert!(addr.row_absolute && addr.col_absolute);

        assert_eq!(resolver.resolve_cell(&cell("AA1")), Err(CellError::Ref));
        assert_eq!(resolver.resolve_cell(&cell("A101")), Err(CellError::Ref));
    }

    #[test]
    fn test_resolve_range() {
        let resolver = ReferenceResolver::new(SheetSettings::default());

        let resolved = resolver.resolve_range(&range("C5:A1")).unwrap();
        assert_eq!(resolved, CellRange::parse("A1:C5").unwrap());
        let members: Vec<_> = resolved.cells().take(4).map(|a| a.key()).collect();
        assert_eq!(members, vec![(0, 0), (0, 1), (0, 2), (1, 0)]);

        assert_eq!(resolver.resolve_range(&range("A1:AA3")), Err(CellError::Ref));

        let small = ReferenceResolver::new(SheetSettings::new(10, 5).unwrap());
        assert_eq!(small.resolve_range(&range("A1:E11")), Err(CellError::Ref));
        assert!(small.resolve_range(&range("A1:E10")).is_ok());
    }
}
