//! Sheet recalculation
//!
//! Evaluates every formula cell of a sheet and stores the results as the
//! cells' cached values, so hosts can display a whole sheet without
//! evaluating cells one by one.
//!
//! # Example
//!
//! ```rust
//! use sheetcraft::prelude::*;
//!
//! let mut sheet = Sheet::new();
//! sheet.set_input("A1", "10").unwrap();
//! sheet.set_input("A2", "20").unwrap();
//! sheet.set_input("A3", "=A1+A2").unwrap();
//!
//! let stats = sheet.calculate().unwrap();
//! assert_eq!(stats.cells_calculated, 1);
//! assert_eq!(sheet.get_value("A3").unwrap(), CellValue::Number(30.0));
//! ```

use crate::{
    parse_formula, CellAddress, CellError, CellValue, Evaluator, EvaluatorOptions, FormulaExpr,
    FormulaValue, Result, Sheet,
};
use ahash::AHashMap;
use sheetcraft_formula::dependency::{CellKey, DependencyGraph};
use tracing::{debug, warn};

/// Statistics from a calculation run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CalculationStats {
    /// Total number of formula cells
    pub formula_count: usize,
    /// Number of cells evaluated
    pub cells_calculated: usize,
    /// Number of cells caught in a circular reference
    pub circular_references: usize,
    /// Number of cells whose result is an error value (circular ones included)
    pub errors: usize,
    /// Number of formulas that failed to parse
    pub syntax_errors: usize,
}

/// Extension trait for Sheet to add calculation methods
pub trait SheetCalculationExt {
    /// Recalculate every formula with default options
    fn calculate(&mut self) -> Result<CalculationStats>;

    /// Recalculate every formula with custom evaluator options
    fn calculate_with_options(&mut self, options: &EvaluatorOptions) -> Result<CalculationStats>;
}

impl SheetCalculationExt for Sheet {
    fn calculate(&mut self) -> Result<CalculationStats> {
        self.calculate_with_options(&EvaluatorOptions::default())
    }

    fn calculate_with_options(&mut self, options: &EvaluatorOptions) -> Result<CalculationStats> {
        let mut engine = CalculationEngine::new(*options);
        engine.calculate_all(self)
    }
}

/// Cells a host should refresh after `address` changes
///
/// Every formula cell that reads `address`, directly or through other
/// formulas, in row-major order. Formulas that fail to parse read nothing.
pub fn dependents_of(sheet: &Sheet, address: CellAddress) -> Vec<CellAddress> {
    let mut engine = CalculationEngine::new(EvaluatorOptions::default());
    engine.collect_formulas(sheet);

    engine
        .dependency_graph
        .transitive_dependents(CellKey::from(address))
        .into_iter()
        .map(|key| key.address())
        .collect()
}

/// The calculation engine
struct CalculationEngine {
    options: EvaluatorOptions,
    /// Dependency graph built from formulas
    dependency_graph: DependencyGraph,
    /// Parsed formula ASTs, keyed by CellKey
    parsed_formulas: AHashMap<CellKey, FormulaExpr>,
    /// Formulas that failed to parse
    syntax_errors: Vec<CellKey>,
}

impl CalculationEngine {
    fn new(options: EvaluatorOptions) -> Self {
        Self {
            options,
            dependency_graph: DependencyGraph::new(),
            parsed_formulas: AHashMap::new(),
            syntax_errors: Vec::new(),
        }
    }

    /// Calculate all formulas in the sheet
    fn calculate_all(&mut self, sheet: &mut Sheet) -> Result<CalculationStats> {
        let mut stats = CalculationStats::default();

        // Phase 1: Collect and parse all formulas, build dependency graph
        self.collect_formulas(sheet);
        stats.formula_count = self.parsed_formulas.len() + self.syntax_errors.len();
        stats.syntax_errors = self.syntax_errors.len();

        if stats.formula_count == 0 {
            return Ok(stats);
        }

        // Phase 2: Evaluate in dependency order
        let order = self.calculation_order();
        let results = self.evaluate_cells(sheet, &order);

        // Phase 3: Store the results
        for (key, value) in results {
            match &value {
                FormulaValue::Error(CellError::Circular) => {
                    stats.circular_references += 1;
                    stats.errors += 1;
                }
                FormulaValue::Error(_) => stats.errors += 1,
                _ => {}
            }
            sheet.set_cached_value(key.row, key.col, value.into())?;
            stats.cells_calculated += 1;
        }

        for key in &self.syntax_errors {
            sheet.set_cached_value(key.row, key.col, CellValue::Empty)?;
        }

        debug!(
            formulas = stats.formula_count,
            calculated = stats.cells_calculated,
            circular = stats.circular_references,
            errors = stats.errors,
            syntax_errors = stats.syntax_errors,
            "recalculated sheet"
        );

        Ok(stats)
    }

    /// Collect all formulas from the sheet and build the dependency graph
    fn collect_formulas(&mut self, sheet: &Sheet) {
        let settings = *sheet.settings();

        for (address, formula_text) in sheet.formula_cells() {
            let cell_key = CellKey::from(address);

            let ast = match parse_formula(formula_text) {
                Ok(ast) => ast,
                Err(e) => {
                    warn!(cell = %address, error = %e, "failed to parse formula");
                    self.syntax_errors.push(cell_key);
                    continue;
                }
            };

            self.dependency_graph.add_formula(cell_key, &ast, &settings);
            self.parsed_formulas.insert(cell_key, ast);
        }
    }

    /// Formula cells with precedents first
    ///
    /// Evaluating in this order means every precedent is already memoized
    /// when a dependent asks for it, which keeps evaluation shallow.
    fn calculation_order(&self) -> Vec<CellKey> {
        let mut all_cells: Vec<CellKey> = self.parsed_formulas.keys().copied().collect();
        all_cells.sort_unstable();

        let mut order = self.dependency_graph.recalc_order(&all_cells);
        order.retain(|k| self.parsed_formulas.contains_key(k));
        order
    }

    fn evaluate_cells(&self, sheet: &Sheet, order: &[CellKey]) -> Vec<(CellKey, FormulaValue)> {
        let evaluator = Evaluator::with_options(sheet, self.options);

        order
            .iter()
            .map(|&key| (key, evaluator.cell_value(key.address())))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sheet(inputs: &[(&str, &str)]) -> Sheet {
        let mut sheet = Sheet::new();
        for (address, raw) in inputs {
            sheet.set_input(address, raw).unwrap();
        }
        sheet
    }

    fn addr(a1: &str) -> CellAddress {
        CellAddress::parse(a1).unwrap()
    }

    #[test]
    fn test_simple_calculation() {
        let mut s = sheet(&[("A1", "5"), ("A2", "=A1*2"), ("A3", "=A2+A2"), ("A4", "=A3*A1")]);

        let stats = s.calculate().unwrap();
        assert_eq!(stats.formula_count, 3);
        assert_eq!(stats.cells_calculated, 3);
        assert_eq!(stats.errors, 0);

        assert_eq!(s.get_value("A2").unwrap(), CellValue::Number(10.0));
        assert_eq!(s.get_value("A3").unwrap(), CellValue::Number(20.0));
        assert_eq!(s.get_value("A4").unwrap(), CellValue::Number(100.0));
        // Formulas are preserved
        assert_eq!(s.formula("A4").unwrap(), Some("=A3*A1"));
    }

    #[test]
    fn test_sum_range() {
        let mut s = sheet(&[("A1", "1"), ("A2", "2"), ("A3", "3"), ("A4", "4"), ("A5", "=SUM(A1:A4)")]);

        let stats = s.calculate().unwrap();
        assert_eq!(stats.formula_count, 1);
        assert_eq!(s.get_value("A5").unwrap(), CellValue::Number(10.0));
    }

    #[test]
    fn test_circular_reference_detection() {
        // A1 = B1, B1 = A1
        let mut s = sheet(&[("A1", "=B1"), ("B1", "=A1"), ("C1", "=2+2")]);

        let stats = s.calculate().unwrap();

        assert_eq!(stats.circular_references, 2);
        assert_eq!(stats.errors, 2);
        assert_eq!(s.get_value("A1").unwrap(), CellValue::Error(CellError::Circular));
        assert_eq!(s.get_value("C1").unwrap(), CellValue::Number(4.0));
    }

    #[test]
    fn test_syntax_errors_cache_empty() {
        let mut s = sheet(&[("A1", "=1+"), ("A2", "=A1+1"), ("A3", "=7")]);

        let stats = s.calculate().unwrap();
        assert_eq!(stats.formula_count, 3);
        assert_eq!(stats.syntax_errors, 1);
        assert_eq!(stats.cells_calculated, 2);
        assert_eq!(stats.errors, 1);

        assert_eq!(s.get_value("A1").unwrap(), CellValue::Empty);
        assert_eq!(s.get_value("A2").unwrap(), CellValue::Error(CellError::Value));
        assert_eq!(s.get_value("A3").unwrap(), CellValue::Number(7.0));
    }

    #[test]
    fn test_long_chain_stays_within_depth() {
        let mut s = Sheet::new();
        s.set_input("A1", "1").unwrap();
        for row in 2..=100 {
            s.set_input(&format!("A{}", row), &format!("=A{}+1", row - 1)).unwrap();
        }

        // Precedents are computed first, so a small budget is enough
        let options = EvaluatorOptions {
            max_depth: 8,
            ..EvaluatorOptions::default()
        };
        let stats = s.calculate_with_options(&options).unwrap();
        assert_eq!(stats.errors, 0);
        assert_eq!(s.get_value("A100").unwrap(), CellValue::Number(100.0));
    }

    #[test]
    fn test_recalculation_picks_up_edits() {
        let mut s = sheet(&[("A1", "1"), ("A2", "=A1*10")]);
        s.calculate().unwrap();
        assert_eq!(s.get_value("A2").unwrap(), CellValue::Number(10.0));

        s.set_input("A1", "4").unwrap();
        s.calculate().unwrap();
        assert_eq!(s.get_value("A2").unwrap(), CellValue::Number(40.0));
    }

    #[test]
    fn test_dependents_of() {
        let s = sheet(&[
            ("A1", "1"),
            ("B1", "=A1*2"),
            ("C1", "=B1+1"),
            ("A2", "=SUM(A1:A1)"),
            ("D1", "=5"),
        ]);

        assert_eq!(
            dependents_of(&s, addr("A1")),
            vec![addr("B1"), addr("C1"), addr("A2")]
        );
        assert_eq!(dependents_of(&s, addr("D1")), Vec::<CellAddress>::new());
    }

    #[test]
    fn test_empty_sheet() {
        let mut s = Sheet::new();
        assert_eq!(s.calculate().unwrap(), CalculationStats::default());
    }
}
