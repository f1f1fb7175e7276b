//! Re-entrancy guard for recursive cell evaluation
//!
//! Every formula cell being evaluated is pushed onto an [`EvaluationStack`]
//! for as long as its evaluation runs. Re-entering a cell that is still in
//! flight is a circular reference; nesting past the depth budget is reported
//! as `#REF!` instead of overflowing the native stack.
//!
//! Expression nodes are counted too, across every cell in flight, so a chain
//! of cells with deep formulas is bounded as a whole.

use ahash::AHashSet;
use sheetcraft_core::{CellAddress, CellError};
use std::cell::{Cell, RefCell};
use tracing::debug;

/// Default depth budget for nested cell evaluation
pub const DEFAULT_MAX_DEPTH: usize = 256;

/// Default budget for expression nodes open at once, summed over all cells
pub const DEFAULT_MAX_EXPRESSION_DEPTH: usize = 4096;

/// Addresses currently being evaluated
#[derive(Debug)]
pub struct EvaluationStack {
    in_flight: RefCell<AHashSet<(u32, u16)>>,
    depth: Cell<usize>,
    max_depth: usize,
    expression_depth: Cell<usize>,
    max_expression_depth: usize,
    /// Number of cycle or depth failures seen so far
    failures: Cell<u64>,
}

impl EvaluationStack {
    pub fn new(max_depth: usize) -> Self {
        Self::with_expression_depth(max_depth, DEFAULT_MAX_EXPRESSION_DEPTH)
    }

    /// Stack with both budgets set
    pub fn with_expression_depth(max_depth: usize, max_expression_depth: usize) -> Self {
        Self {
            in_flight: RefCell::new(AHashSet::new()),
            depth: Cell::new(0),
            max_depth,
            expression_depth: Cell::new(0),
            max_expression_depth,
            failures: Cell::new(0),
        }
    }

    /// Current nesting depth
    pub fn depth(&self) -> usize {
        self.depth.get()
    }

    /// Check if an address is being evaluated right now
    pub fn contains(&self, address: &CellAddress) -> bool {
        self.in_flight.borrow().contains(&address.key())
    }

    /// Push `address` for the lifetime of the returned guard
    ///
    /// Fails with [`CellError::Circular`] if the address is already in flight
    /// and with [`CellError::Ref`] if the depth budget is used up.
    pub fn enter(&self, address: CellAddress) -> Result<StackGuard<'_>, CellError> {
        let key = address.key();

        if self.in_flight.borrow().contains(&key) {
            debug!(cell = %address.relative(), "circular reference detected");
            self.failures.set(self.failures.get() + 1);
            return Err(CellError::Circular);
        }

        if self.depth.get() >= self.max_depth {
            debug!(
                cell = %address.relative(),
                max_depth = self.max_depth,
                "dependency chain too deep"
            );
            self.failures.set(self.failures.get() + 1);
            return Err(CellError::Ref);
        }

        self.in_flight.borrow_mut().insert(key);
        self.depth.set(self.depth.get() + 1);

        Ok(StackGuard {
            stack: self,
            key,
            failures_at_entry: self.failures.get(),
        })
    }

    /// Open one expression node for the lifetime of the returned guard
    ///
    /// Fails with [`CellError::Ref`] once the expression budget is used up.
    pub fn enter_expression(&self) -> Result<ExpressionGuard<'_>, CellError> {
        let depth = self.expression_depth.get();
        if depth >= self.max_expression_depth {
            debug!(
                max_expression_depth = self.max_expression_depth,
                "formula nesting too deep"
            );
            self.failures.set(self.failures.get() + 1);
            return Err(CellError::Ref);
        }

        self.expression_depth.set(depth + 1);
        Ok(ExpressionGuard { stack: self })
    }

    /// Expression nodes open right now
    pub fn expression_depth(&self) -> usize {
        self.expression_depth.get()
    }
}

impl Default for EvaluationStack {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_DEPTH)
    }
}

/// Pops its address from the stack when dropped
#[derive(Debug)]
pub struct StackGuard<'a> {
    stack: &'a EvaluationStack,
    key: (u32, u16),
    failures_at_entry: u64,
}

impl StackGuard<'_> {
    /// True if no cycle or depth failure happened while this guard was held
    ///
    /// Only clean results may be memoized: a value computed while part of a
    /// cycle depends on which cell of the cycle was requested first.
    pub fn is_clean(&self) -> bool {
        self.stack.failures.get() == self.failures_at_entry
    }
}

impl Drop for StackGuard<'_> {
    fn drop(&mut self) {
        self.stack.in_flight.borrow_mut().remove(&self.key);
        self.stack.depth.set(self.stack.depth.get().saturating_sub(1));
    }
}

/// Closes its expression node when dropped
#[derive(Debug)]
pub struct ExpressionGuard<'a> {
    stack: &'a EvaluationStack,
}

impl Drop for ExpressionGuard<'_> {
    fn drop(&mut self) {
        let depth = &self.stack.expression_depth;
        depth.set(depth.get().saturating_sub(1));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enter_and_drop() {
        let stack = EvaluationStack::new(8);
        let a1 = CellAddress::new(0, 0);

        {
            let _guard = stack.enter(a1).unwrap();
            assert!(stack.contains(&a1));
            assert_eq!(stack.depth(), 1);
        }

        assert!(!stack.contains(&a1));
        assert_eq!(stack.depth(), 0);
    }

    #[test]
    fn test_cycle_detected() {
        let stack = EvaluationStack::new(8);
        let a1 = CellAddress::new(0, 0);
        let b1 = CellAddress::new(0, 1);

        let outer = stack.enter(a1).unwrap();
        let inner = stack.enter(b1).unwrap();
        // Absolute flags do not make a different cell
        assert_eq!(stack.enter(CellAddress::absolute(0, 0)).unwrap_err(), CellError::Circular);

        assert!(!inner.is_clean());
        assert!(!outer.is_clean());
        drop(inner);
        drop(outer);

        // A fresh entry after the failure is clean again
        let guard = stack.enter(b1).unwrap();
        assert!(guard.is_clean());
    }

    #[test]
    fn test_depth_budget() {
        let stack = EvaluationStack::new(2);
        let _a = stack.enter(CellAddress::new(0, 0)).unwrap();
        let _b = stack.enter(CellAddress::new(1, 0)).unwrap();
        assert_eq!(stack.enter(CellAddress::new(2, 0)).unwrap_err(), CellError::Ref);
    }

    #[test]
    fn test_expression_budget_spans_cells() {
        let stack = EvaluationStack::with_expression_depth(8, 3);
        let a1 = stack.enter(CellAddress::new(0, 0)).unwrap();
        let _x = stack.enter_expression().unwrap();
        let b1 = stack.enter(CellAddress::new(0, 1)).unwrap();
        let _y = stack.enter_expression().unwrap();
        {
            let _z = stack.enter_expression().unwrap();
            assert_eq!(stack.expression_depth(), 3);
            assert_eq!(stack.enter_expression().unwrap_err(), CellError::Ref);
        }
        assert_eq!(stack.expression_depth(), 2);
        assert!(!b1.is_clean());
        assert!(!a1.is_clean());
    }
}
