//! Thread-safe sheet handle

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::calculation::{CalculationStats, SheetCalculationExt};
use crate::{CellAddress, Error, Evaluator, FormulaResult, Result, Sheet};

fn poisoned<T>(_: PoisonError<T>) -> Error {
    Error::LockPoisoned
}

/// A sheet shared between threads
///
/// Evaluations take a read lock and may run concurrently; edits and
/// recalculation take the write lock, so no reader ever sees a cell half
/// updated. Cloning the handle shares the same sheet.
#[derive(Debug, Clone, Default)]
pub struct SharedSheet {
    inner: Arc<RwLock<Sheet>>,
}

impl SharedSheet {
    /// Wrap a sheet
    pub fn new(sheet: Sheet) -> Self {
        Self {
            inner: Arc::new(RwLock::new(sheet)),
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Sheet>> {
        self.inner.read().map_err(poisoned)
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Sheet>> {
        self.inner.write().map_err(poisoned)
    }

    /// Evaluate one cell
    pub fn evaluate(&self, address: CellAddress) -> Result<FormulaResult> {
        let sheet = self.read()?;
        Ok(Evaluator::new(&sheet).evaluate_cell(address))
    }

    /// Evaluate formula text against the current contents
    pub fn evaluate_formula(&self, formula: &str) -> Result<FormulaResult> {
        let sheet = self.read()?;
        Ok(Evaluator::new(&sheet).evaluate_formula(formula))
    }

    /// Apply raw host input to a cell
    pub fn set_input(&self, address: &str, raw: &str) -> Result<()> {
        self.write()?.set_input(address, raw)
    }

    /// Clear a cell
    pub fn clear_cell(&self, address: &str) -> Result<()> {
        self.write()?.clear_cell(address)
    }

    /// Remove every cell
    pub fn clear(&self) -> Result<()> {
        self.write()?.clear();
        Ok(())
    }

    /// Recalculate every formula
    pub fn calculate(&self) -> Result<CalculationStats> {
        self.write()?.calculate()
    }

    /// Run a closure against the sheet under the read lock
    pub fn with_sheet<R>(&self, f: impl FnOnce(&Sheet) -> R) -> Result<R> {
        let sheet = self.read()?;
        Ok(f(&sheet))
    }

    /// Copy of the current contents
    pub fn snapshot(&self) -> Result<Sheet> {
        Ok(self.read()?.clone())
    }
}

impl From<Sheet> for SharedSheet {
    fn from(sheet: Sheet) -> Self {
        Self::new(sheet)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CellValue, FormulaValue};
    use std::thread;

    fn addr(a1: &str) -> CellAddress {
        CellAddress::parse(a1).unwrap()
    }

    #[test]
    fn test_edit_and_evaluate() {
        let shared = SharedSheet::default();
        shared.set_input("A1", "2").unwrap();
        shared.set_input("A2", "=A1^10").unwrap();

        assert_eq!(
            shared.evaluate(addr("A2")).unwrap(),
            Ok(FormulaValue::Number(1024.0))
        );

        shared.clear_cell("A1").unwrap();
        assert_eq!(
            shared.evaluate(addr("A2")).unwrap(),
            Ok(FormulaValue::Number(0.0))
        );
    }

    #[test]
    fn test_concurrent_readers() {
        let shared = SharedSheet::default();
        for row in 1..=10 {
            shared.set_input(&format!("A{}", row), &row.to_string()).unwrap();
        }
        shared.set_input("B1", "=SUM(A1:A10)").unwrap();

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let shared = shared.clone();
                thread::spawn(move || shared.evaluate(addr("B1")).unwrap())
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.join().unwrap(), Ok(FormulaValue::Number(55.0)));
        }
    }

    #[test]
    fn test_calculate_and_snapshot() {
        let shared = SharedSheet::new(Sheet::new());
        shared.set_input("A1", "=6*7").unwrap();
        let stats = shared.calculate().unwrap();
        assert_eq!(stats.cells_calculated, 1);

        let snapshot = shared.snapshot().unwrap();
        assert_eq!(snapshot.get_value("A1").unwrap(), CellValue::Number(42.0));
        assert_eq!(shared.with_sheet(|s| s.len()).unwrap(), 1);

        shared.clear().unwrap();
        assert!(shared.with_sheet(|s| s.is_empty()).unwrap());
    }

    #[test]
    fn test_poisoned_lock() {
        let shared = SharedSheet::default();
        let clone = shared.clone();
        let _ = thread::spawn(move || {
            let _guard = clone.inner.write().unwrap();
            panic!("writer panicked");
        })
        .join();

        assert!(matches!(shared.evaluate(addr("A1")), Err(Error::LockPoisoned)));
        assert!(matches!(shared.set_input("A1", "1"), Err(Error::LockPoisoned)));
    }
}
