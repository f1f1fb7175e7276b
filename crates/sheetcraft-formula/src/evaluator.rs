//! Formula evaluator
//!
//! Evaluates formula ASTs against a [`Sheet`]. Referenced formula cells are
//! evaluated recursively, guarded by an [`EvaluationStack`] so that circular
//! references and runaway chains end in an error value instead of a stack
//! overflow.
//!
//! An [`Evaluator`] is a per-request object: it caches parsed formulas and
//! finished cell values for its own lifetime and never mutates the sheet.

use crate::ast::{BinaryOperator, FormulaExpr, UnaryOperator};
use crate::cycle::{EvaluationStack, DEFAULT_MAX_DEPTH, DEFAULT_MAX_EXPRESSION_DEPTH};
use crate::error::{FormulaError, FormulaResult, SyntaxError};
use crate::functions::{math, FunctionImpl, FunctionRegistry, FunctionResult};
use crate::parser::parse_formula;
use crate::reference::ReferenceResolver;
use crate::value::{compare_values, FormulaValue};
use ahash::AHashMap;
use sheetcraft_core::{CellAddress, CellError, CellRange, Sheet};
use std::cell::RefCell;
use std::cmp::Ordering;
use std::rc::Rc;
use tracing::trace;

type ParsedFormula = Rc<Result<FormulaExpr, SyntaxError>>;

/// Remaining native stack below which evaluation moves to a fresh segment
const STACK_RED_ZONE: usize = 128 * 1024;
/// Size of each new stack segment
const STACK_GROW_SIZE: usize = 2 * 1024 * 1024;

/// Evaluator configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EvaluatorOptions {
    /// Deepest chain of formula cells evaluated before giving up with `#REF!`
    pub max_depth: usize,
    /// Most expression nodes open at once, counted across the whole chain of
    /// cells being evaluated, before giving up with `#REF!`
    pub max_expression_depth: usize,
}

impl Default for EvaluatorOptions {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            max_expression_depth: DEFAULT_MAX_EXPRESSION_DEPTH,
        }
    }
}

/// Evaluates cells and formulas of one sheet
pub struct Evaluator<'a> {
    sheet: &'a Sheet,
    registry: &'a FunctionRegistry,
    resolver: ReferenceResolver,
    stack: EvaluationStack,
    /// Finished values of formula cells that did not touch a cycle
    memo: RefCell<AHashMap<(u32, u16), FormulaValue>>,
    parsed: RefCell<AHashMap<(u32, u16), ParsedFormula>>,
}

impl<'a> Evaluator<'a> {
    /// Evaluator with the built-in functions and default options
    pub fn new(sheet: &'a Sheet) -> Self {
        Self::with_options(sheet, EvaluatorOptions::default())
    }

    pub fn with_options(sheet: &'a Sheet, options: EvaluatorOptions) -> Self {
        Self::with_registry(sheet, FunctionRegistry::builtin(), options)
    }

    /// Evaluator with a custom function registry
    pub fn with_registry(
        sheet: &'a Sheet,
        registry: &'a FunctionRegistry,
        options: EvaluatorOptions,
    ) -> Self {
        Self {
            sheet,
            registry,
            resolver: ReferenceResolver::new(*sheet.settings()),
            stack: EvaluationStack::with_expression_depth(
                options.max_depth,
                options.max_expression_depth,
            ),
            memo: RefCell::new(AHashMap::new()),
            parsed: RefCell::new(AHashMap::new()),
        }
    }

    /// The sheet being evaluated
    pub fn sheet(&self) -> &'a Sheet {
        self.sheet
    }

    /// The function registry in use
    pub fn registry(&self) -> &'a FunctionRegistry {
        self.registry
    }

    /// Evaluate a cell
    ///
    /// A formula cell is computed (its cached value is never trusted), a
    /// literal cell returns its stored value and an absent cell is `Empty`.
    pub fn evaluate_cell(&self, address: CellAddress) -> FormulaResult {
        if !self.resolver.settings().contains(&address) {
            return Err(CellError::Ref.into());
        }

        let Some(cell) = self.sheet.cell_at(address.row, address.col) else {
            return Ok(FormulaValue::Empty);
        };

        match cell.formula() {
            Some(formula) => {
                if let Err(e) = self.parsed_formula(address, formula).as_ref() {
                    return Err(FormulaError::Syntax(e.clone()));
                }
                into_result(self.formula_cell_value(address, formula))
            }
            None => into_result(FormulaValue::from(&cell.value)),
        }
    }

    /// Evaluate formula text (with its leading `=`) against the sheet
    pub fn evaluate_formula(&self, formula: &str) -> FormulaResult {
        let expr = parse_formula(formula)?;
        into_result(formula_result(self.evaluate_expr(&expr)))
    }

    /// Evaluate an expression
    ///
    /// A range evaluates to an `Array`; callers that need one value collapse it
    /// with [`FormulaValue::into_scalar`].
    pub fn evaluate_expr(&self, expr: &FormulaExpr) -> FormulaValue {
        let _node = match self.stack.enter_expression() {
            Ok(guard) => guard,
            Err(e) => return FormulaValue::Error(e),
        };

        stacker::maybe_grow(STACK_RED_ZONE, STACK_GROW_SIZE, || self.evaluate_node(expr))
    }

    fn evaluate_node(&self, expr: &FormulaExpr) -> FormulaValue {
        match expr {
            // === Literals ===
            FormulaExpr::Literal(lit) => lit.into(),

            // === References ===
            FormulaExpr::CellRef(cell_ref) => match self.resolver.resolve_cell(cell_ref) {
                Ok(address) => self.cell_value(address),
                Err(e) => FormulaValue::Error(e),
            },

            FormulaExpr::RangeRef(range_ref) => match self.resolver.resolve_range(range_ref) {
                Ok(range) => self.range_values(&range),
                Err(e) => FormulaValue::Error(e),
            },

            // Named ranges are not supported
            FormulaExpr::Name(_) => FormulaValue::Error(CellError::Name),

            // === Operators ===
            FormulaExpr::BinaryOp { op, left, right } => {
                self.evaluate_binary_op(*op, left, right)
            }

            FormulaExpr::UnaryOp { op, operand } => self.evaluate_unary_op(*op, operand),

            // === Functions ===
            FormulaExpr::Function { name, args } => self.evaluate_function(name, args),
        }
    }

    /// Value of a cell as seen by a formula referencing it
    pub fn cell_value(&self, address: CellAddress) -> FormulaValue {
        match self.sheet.cell_at(address.row, address.col) {
            None => FormulaValue::Empty,
            Some(cell) => match cell.formula() {
                Some(formula) => self.formula_cell_value(address, formula),
                None => FormulaValue::from(&cell.value),
            },
        }
    }

    /// Values of a range, row-major
    pub fn range_values(&self, range: &CellRange) -> FormulaValue {
        let cols = range.col_count() as usize;
        let mut rows = Vec::with_capacity(range.row_count() as usize);
        let mut row = Vec::with_capacity(cols);

        for address in range.cells() {
            row.push(self.cell_value(address));
            if row.len() == cols {
                rows.push(std::mem::replace(&mut row, Vec::with_capacity(cols)));
            }
        }

        FormulaValue::Array(rows)
    }

    fn formula_cell_value(&self, address: CellAddress, formula: &str) -> FormulaValue {
        let key = address.key();

        if let Some(value) = self.memo.borrow().get(&key) {
            return value.clone();
        }

        let guard = match self.stack.enter(address) {
            Ok(guard) => guard,
            Err(e) => return FormulaValue::Error(e),
        };

        trace!(cell = %address.relative(), depth = self.stack.depth(), "evaluating formula cell");

        let parsed = self.parsed_formula(address, formula);
        let value = match parsed.as_ref() {
            Ok(expr) => formula_result(self.evaluate_expr(expr)),
            // Dependents of a malformed formula see #VALUE!
            Err(_) => FormulaValue::Error(CellError::Value),
        };

        if guard.is_clean() {
            self.memo.borrow_mut().insert(key, value.clone());
        }

        value
    }

    fn parsed_formula(&self, address: CellAddress, formula: &str) -> ParsedFormula {
        let key = address.key();

        if let Some(parsed) = self.parsed.borrow().get(&key) {
            return Rc::clone(parsed);
        }

        let parsed = Rc::new(parse_formula(formula));
        self.parsed.borrow_mut().insert(key, Rc::clone(&parsed));
        parsed
    }

    /// Evaluate an operand that must be a single value
    fn evaluate_scalar(&self, expr: &FormulaExpr) -> FormulaValue {
        self.evaluate_expr(expr).into_scalar()
    }

    /// Evaluate a binary operation
    fn evaluate_binary_op(
        &self,
        op: BinaryOperator,
        left: &FormulaExpr,
        right: &FormulaExpr,
    ) -> FormulaValue {
        // Propagate errors, left operand first
        let left_val = self.evaluate_scalar(left);
        if left_val.is_error() {
            return left_val;
        }
        let right_val = self.evaluate_scalar(right);
        if right_val.is_error() {
            return right_val;
        }

        binary_op(op, &left_val, &right_val).unwrap_or_else(FormulaValue::Error)
    }

    /// Evaluate a unary operation
    fn evaluate_unary_op(&self, op: UnaryOperator, operand: &FormulaExpr) -> FormulaValue {
        let value = self.evaluate_scalar(operand);

        match op {
            UnaryOperator::Negate => match value.to_number() {
                Ok(n) => FormulaValue::Number(-n),
                Err(e) => FormulaValue::Error(e),
            },
        }
    }

    /// Evaluate a function call
    fn evaluate_function(&self, name: &str, args: &[FormulaExpr]) -> FormulaValue {
        let Some(func) = self.registry.get(name) else {
            return FormulaValue::Error(CellError::Name);
        };

        if !func.accepts(args.len()) {
            return FormulaValue::Error(CellError::Value);
        }

        let result = match func.implementation {
            FunctionImpl::Lazy(implementation) => implementation(args, self),
            FunctionImpl::Eager(implementation) => {
                let values: Vec<FormulaValue> = args
                    .iter()
                    .map(|arg| self.evaluate_argument(arg, func.reference_args))
                    .collect();
                implementation(&values)
            }
        };

        result.unwrap_or_else(FormulaValue::Error)
    }

    fn evaluate_argument(&self, arg: &FormulaExpr, reference_args: bool) -> FormulaValue {
        match arg {
            FormulaExpr::CellRef(cell_ref) if reference_args => {
                match self.resolver.resolve_cell(cell_ref) {
                    Ok(address) => FormulaValue::Array(vec![vec![self.cell_value(address)]]),
                    Err(e) => FormulaValue::Error(e),
                }
            }
            other => self.evaluate_expr(other),
        }
    }
}

/// The value a formula cell shows: one scalar, blank results read as 0
fn formula_result(value: FormulaValue) -> FormulaValue {
    match value.into_scalar() {
        FormulaValue::Empty => FormulaValue::Number(0.0),
        other => other,
    }
}

fn into_result(value: FormulaValue) -> FormulaResult {
    match value {
        FormulaValue::Error(e) => Err(e.into()),
        other => Ok(other),
    }
}

fn binary_op(op: BinaryOperator, left: &FormulaValue, right: &FormulaValue) -> FunctionResult {
    let numbers = || -> Result<(f64, f64), CellError> { Ok((left.to_number()?, right.to_number()?)) };
    let compare = |accept: fn(Ordering) -> bool| {
        Ok(FormulaValue::Boolean(accept(compare_values(left, right))))
    };

    match op {
        // Arithmetic operators
        BinaryOperator::Add => {
            let (l, r) = numbers()?;
            finite(l + r)
        }
        BinaryOperator::Subtract => {
            let (l, r) = numbers()?;
            finite(l - r)
        }
        BinaryOperator::Multiply => {
            let (l, r) = numbers()?;
            finite(l * r)
        }
        BinaryOperator::Divide => {
            let (l, r) = numbers()?;
            if r == 0.0 {
                return Err(CellError::Div0);
            }
            finite(l / r)
        }
        BinaryOperator::Power => {
            let (l, r) = numbers()?;
            math::power(l, r)
        }

        // Comparison operators
        BinaryOperator::Equal => compare(|o| o == Ordering::Equal),
        BinaryOperator::NotEqual => compare(|o| o != Ordering::Equal),
        BinaryOperator::LessThan => compare(|o| o == Ordering::Less),
        BinaryOperator::LessEqual => compare(|o| o != Ordering::Greater),
        BinaryOperator::GreaterThan => compare(|o| o == Ordering::Greater),
        BinaryOperator::GreaterEqual => compare(|o| o != Ordering::Less),

        // Concatenation
        BinaryOperator::Concat => {
            let mut text = left.to_text()?;
            text.push_str(&right.to_text()?);
            Ok(FormulaValue::String(text))
        }
    }
}

fn finite(n: f64) -> FunctionResult {
    if n.is_finite() {
        Ok(FormulaValue::Number(n))
    } else {
        Err(CellError::Num)
    }
}
