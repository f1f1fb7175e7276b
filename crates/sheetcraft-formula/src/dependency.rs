//! Dependency tracking for sheet recalculation

use crate::ast::{FormulaExpr, Reference};
use ahash::{AHashMap, AHashSet};
use sheetcraft_core::{CellAddress, SheetSettings};
use std::collections::BTreeSet;

/// Location of a cell, without the `$` flags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellKey {
    pub row: u32,
    pub col: u16,
}

impl CellKey {
    /// Create a new cell key
    pub fn new(row: u32, col: u16) -> Self {
        Self { row, col }
    }

    /// The key as a relative address
    pub fn address(&self) -> CellAddress {
        CellAddress::new(self.row, self.col)
    }
}

impl From<CellAddress> for CellKey {
    fn from(addr: CellAddress) -> Self {
        Self::new(addr.row, addr.col)
    }
}

impl From<&CellAddress> for CellKey {
    fn from(addr: &CellAddress) -> Self {
        Self::new(addr.row, addr.col)
    }
}

/// Every cell an expression reads
///
/// Ranges are expanded cell by cell after clipping them to the grid; parts
/// outside the grid are evaluation errors, not dependencies. Sorted, no
/// duplicates.
pub fn references(expr: &FormulaExpr, settings: &SheetSettings) -> Vec<CellKey> {
    let mut keys = BTreeSet::new();

    expr.for_each_reference(&mut |reference: Reference<'_>| match reference {
        Reference::Cell(cell_ref) => {
            if settings.contains(&cell_ref.address) {
                keys.insert(CellKey::from(cell_ref.address));
            }
        }
        Reference::Range(range_ref) => {
            if let Some(range) = settings.clip(&range_ref.range) {
                keys.extend(range.cells().map(CellKey::from));
            }
        }
    });

    keys.into_iter().collect()
}

/// Dependency graph for formula cells
///
/// Tracks which cells depend on which other cells, so a recalculation can
/// visit precedents before their dependents. Edge sets are ordered so every
/// traversal is deterministic.
#[derive(Debug, Default)]
pub struct DependencyGraph {
    /// Cell → Cells that depend on it (dependents)
    dependents: AHashMap<CellKey, BTreeSet<CellKey>>,
    /// Cell → Cells it depends on (precedents)
    precedents: AHashMap<CellKey, BTreeSet<CellKey>>,
}

impl DependencyGraph {
    /// Create a new empty dependency graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a dependency: dependent depends on precedent
    pub fn add_dependency(&mut self, precedent: CellKey, dependent: CellKey) {
        self.dependents
            .entry(precedent)
            .or_default()
            .insert(dependent);
        self.precedents
            .entry(dependent)
            .or_default()
            .insert(precedent);
    }

    /// Record that `dependent` reads every cell `expr` references
    pub fn add_formula(&mut self, dependent: CellKey, expr: &FormulaExpr, settings: &SheetSettings) {
        for precedent in references(expr, settings) {
            self.add_dependency(precedent, dependent);
        }
    }

    /// Remove the edges to a cell's precedents
    ///
    /// Called when a cell's formula changes. Cells that read this cell keep
    /// their edges.
    pub fn clear_dependencies(&mut self, cell: CellKey) {
        if let Some(precedents) = self.precedents.remove(&cell) {
            for precedent in precedents {
                if let Some(deps) = self.dependents.get_mut(&precedent) {
                    deps.remove(&cell);
                    if deps.is_empty() {
                        self.dependents.remove(&precedent);
                    }
                }
            }
        }
    }

    /// Get cells that read the given cell directly
    pub fn dependents(&self, cell: CellKey) -> impl Iterator<Item = CellKey> + '_ {
        self.dependents
            .get(&cell)
            .into_iter()
            .flat_map(|set| set.iter().copied())
    }

    /// Get cells that the given cell reads directly
    pub fn precedents(&self, cell: CellKey) -> impl Iterator<Item = CellKey> + '_ {
        self.precedents
            .get(&cell)
            .into_iter()
            .flat_map(|set| set.iter().copied())
    }

    /// Every cell affected by a change to `cell`, directly or not, excluding `cell`
    pub fn transitive_dependents(&self, cell: CellKey) -> Vec<CellKey> {
        let mut seen = BTreeSet::new();
        let mut pending = vec![cell];

        while let Some(current) = pending.pop() {
            for dependent in self.dependents(current) {
                if dependent != cell && seen.insert(dependent) {
                    pending.push(dependent);
                }
            }
        }

        seen.into_iter().collect()
    }

    /// Cells to recalculate when the given cells change, precedents first
    ///
    /// The changed cells are included. Cells on a cycle appear once, in an
    /// arbitrary but stable position.
    pub fn recalc_order(&self, changed: &[CellKey]) -> Vec<CellKey> {
        let mut result = Vec::new();
        let mut visited = AHashSet::new();

        for &cell in changed {
            self.post_order(cell, &mut result, &mut visited);
        }

        // Post-order puts dependents first
        result.reverse();
        result
    }

    /// Depth-first walk over dependents, pushing each cell once all of its
    /// dependents are done
    ///
    /// Uses an explicit work stack, so chain length is bounded by memory
    /// rather than by the native stack.
    fn post_order(
        &self,
        start: CellKey,
        result: &mut Vec<CellKey>,
        visited: &mut AHashSet<CellKey>,
    ) {
        if !visited.insert(start) {
            return;
        }

        let mut stack = vec![(start, self.dependents(start))];
        loop {
            let Some((cell, pending)) = stack.last_mut() else {
                break;
            };
            let cell = *cell;

            match pending.next() {
                Some(dependent) => {
                    if visited.insert(dependent) {
                        stack.push((dependent, self.dependents(dependent)));
                    }
                }
                None => {
                    stack.pop();
                    result.push(cell);
                }
            }
        }
    }

    /// Detect circular references reachable from a cell
    pub fn has_circular_reference(&self, cell: CellKey) -> bool {
        let mut visited = AHashSet::new();
        let mut on_path = AHashSet::new();

        visited.insert(cell);
        on_path.insert(cell);
        let mut stack = vec![(cell, self.precedents(cell))];

        loop {
            let Some((current, pending)) = stack.last_mut() else {
                return false;
            };
            let current = *current;

            match pending.next() {
                Some(precedent) => {
                    if on_path.contains(&precedent) {
                        return true;
                    }
                    if visited.insert(precedent) {
                        on_path.insert(precedent);
                        stack.push((precedent, self.precedents(precedent)));
                    }
                }
                None => {
                    on_path.remove(&current);
                    stack.pop();
                }
            }
        }
    }

    /// Number of cells with at least one precedent
    pub fn formula_count(&self) -> usize {
        self.precedents.len()
    }

    /// Clear the entire graph
    pub fn clear(&mut self) {
        self.dependents.clear();
        self.precedents.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_formula;
    use pretty_assertions::assert_eq;

    fn key(a1: &str) -> CellKey {
        CellKey::from(CellAddress::parse(a1).unwrap())
    }

    fn keys(list: &[&str]) -> Vec<CellKey> {
        list.iter().map(|a| key(a)).collect()
    }

    #[test]
    fn test_add_dependency() {
        let mut graph = DependencyGraph::new();

        let a1 = key("A1");
        let b1 = key("B1");

        graph.add_dependency(a1, b1);

        assert!(graph.dependents(a1).any(|c| c == b1));
        assert!(graph.precedents(b1).any(|c| c == a1));
        assert_eq!(graph.dependents(b1).count(), 0);
    }

    #[test]
    fn test_references() {
        let settings = SheetSettings::default();
        let expr = parse_formula("=SUM(A1:B2, $A$1, C3) + AA1 + IF(D1, 1, 2)").unwrap();
        assert_eq!(
            references(&expr, &settings),
            keys(&["A1", "B1", "D1", "A2", "B2", "C3"])
        );

        // Clipped to the grid
        let expr = parse_formula("=SUM(Z99:AB101)").unwrap();
        assert_eq!(references(&expr, &settings), keys(&["Z99", "Z100"]));
    }

    #[test]
    fn test_recalc_order() {
        let mut graph = DependencyGraph::new();
        // B1 = A1 * 2, C1 = B1 + A1, D1 = C1
        graph.add_dependency(key("A1"), key("B1"));
        graph.add_dependency(key("B1"), key("C1"));
        graph.add_dependency(key("A1"), key("C1"));
        graph.add_dependency(key("C1"), key("D1"));

        let order = graph.recalc_order(&[key("A1")]);
        assert_eq!(order, keys(&["A1", "B1", "C1", "D1"]));

        let order = graph.recalc_order(&[key("B1")]);
        assert_eq!(order, keys(&["B1", "C1", "D1"]));
    }

    #[test]
    fn test_transitive_dependents() {
        let mut graph = DependencyGraph::new();
        graph.add_dependency(key("A1"), key("B1"));
        graph.add_dependency(key("B1"), key("C1"));
        graph.add_dependency(key("A2"), key("C2"));

        assert_eq!(graph.transitive_dependents(key("A1")), keys(&["B1", "C1"]));
        assert_eq!(graph.transitive_dependents(key("C1")), Vec::new());
    }

    #[test]
    fn test_clear_dependencies() {
        let mut graph = DependencyGraph::new();
        graph.add_dependency(key("A1"), key("B1"));
        graph.add_dependency(key("B1"), key("C1"));

        graph.clear_dependencies(key("B1"));
        assert_eq!(graph.dependents(key("A1")).count(), 0);
        assert_eq!(graph.precedents(key("B1")).count(), 0);
        // C1 still reads B1
        assert_eq!(graph.precedents(key("C1")).collect::<Vec<_>>(), keys(&["B1"]));
    }

    #[test]
    fn test_circular_reference() {
        let mut graph = DependencyGraph::new();

        let a1 = key("A1");
        let b1 = key("B1");
        let c1 = key("C1");
        let d1 = key("D1");

        // A1 -> B1 -> C1 -> A1 (circular)
        graph.add_dependency(a1, b1);
        graph.add_dependency(b1, c1);
        graph.add_dependency(c1, a1);
        graph.add_dependency(d1, d1);

        assert!(graph.has_circular_reference(a1));
        assert!(graph.has_circular_reference(b1));
        assert!(graph.has_circular_reference(c1));
        assert!(graph.has_circular_reference(d1));

        // Recalculation still terminates and lists each cell once
        let order = graph.recalc_order(&[a1]);
        assert_eq!(order.len(), 3);
    }

    #[test]
    fn test_long_chain_does_not_recurse() {
        let mut graph = DependencyGraph::new();
        let len = 200_000u32;
        for row in 1..len {
            graph.add_dependency(CellKey::new(row - 1, 0), CellKey::new(row, 0));
        }

        let order = graph.recalc_order(&[CellKey::new(0, 0)]);
        assert_eq!(order.len(), len as usize);
        assert_eq!(order.first(), Some(&CellKey::new(0, 0)));
        assert_eq!(order.last(), Some(&CellKey::new(len - 1, 0)));

        let last = CellKey::new(len - 1, 0);
        assert!(!graph.has_circular_reference(last));
        graph.add_dependency(last, CellKey::new(0, 0));
        assert!(graph.has_circular_reference(last));
    }

    #[test]
    fn test_no_cycle() {
        let mut graph = DependencyGraph::new();
        graph.add_dependency(key("A1"), key("B1"));
        graph.add_dependency(key("A1"), key("C1"));
        graph.add_dependency(key("B1"), key("C1"));

        assert!(!graph.has_circular_reference(key("C1")));
    }
}
