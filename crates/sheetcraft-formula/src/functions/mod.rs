//! Built-in spreadsheet functions
//!
//! Functions live in a [`FunctionRegistry`] keyed by upper-case name. Most
//! functions are *eager*: the evaluator evaluates every argument and hands
//! the values over. A few guards (`IF`, `IFERROR`, `IFNA`) are *lazy*: they
//! receive the argument expressions and evaluate only the branch they need.

pub mod criteria;
pub mod info;
pub mod logical;
pub mod lookup;
pub mod math;
pub mod statistical;
pub mod text;

use crate::ast::FormulaExpr;
use crate::evaluator::Evaluator;
use crate::value::FormulaValue;
use ahash::AHashMap;
use sheetcraft_core::{parse_number, CellError};
use std::borrow::Cow;
use std::fmt;
use std::sync::OnceLock;

/// What a function returns; `Err` becomes an error value in the formula
pub type FunctionResult = Result<FormulaValue, CellError>;

/// Function over evaluated arguments
pub type EagerFn = fn(&[FormulaValue]) -> FunctionResult;

/// Function over unevaluated argument expressions
pub type LazyFn = fn(&[FormulaExpr], &Evaluator<'_>) -> FunctionResult;

/// Function implementation
#[derive(Clone, Copy)]
pub enum FunctionImpl {
    Eager(EagerFn),
    Lazy(LazyFn),
}

impl fmt::Debug for FunctionImpl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FunctionImpl::Eager(_) => f.write_str("Eager"),
            FunctionImpl::Lazy(_) => f.write_str("Lazy"),
        }
    }
}

/// Function definition
#[derive(Debug, Clone, Copy)]
pub struct FunctionDef {
    /// Function name (uppercase)
    pub name: &'static str,
    /// Minimum arguments
    pub min_args: usize,
    /// Maximum arguments (None = unlimited)
    pub max_args: Option<usize>,
    /// Implementation
    pub implementation: FunctionImpl,
    /// Pass a bare cell reference as a 1x1 array instead of its value
    ///
    /// Aggregates skip text and blanks they find in referenced cells but
    /// reject the same text typed in as an argument.
    pub reference_args: bool,
}

impl FunctionDef {
    /// Eager function definition
    pub fn eager(
        name: &'static str,
        min_args: usize,
        max_args: Option<usize>,
        implementation: EagerFn,
    ) -> Self {
        Self {
            name,
            min_args,
            max_args,
            implementation: FunctionImpl::Eager(implementation),
            reference_args: false,
        }
    }

    /// Lazy function definition
    pub fn lazy(
        name: &'static str,
        min_args: usize,
        max_args: Option<usize>,
        implementation: LazyFn,
    ) -> Self {
        Self {
            name,
            min_args,
            max_args,
            implementation: FunctionImpl::Lazy(implementation),
            reference_args: false,
        }
    }

    /// Receive bare cell references as 1x1 arrays
    pub fn with_reference_args(mut self) -> Self {
        self.reference_args = true;
        self
    }

    /// Check if `count` arguments are accepted
    pub fn accepts(&self, count: usize) -> bool {
        count >= self.min_args && self.max_args.map_or(true, |max| count <= max)
    }
}

/// Function registry
#[derive(Debug, Clone)]
pub struct FunctionRegistry {
    functions: AHashMap<String, FunctionDef>,
}

static DEFAULT_REGISTRY: OnceLock<FunctionRegistry> = OnceLock::new();

impl FunctionRegistry {
    /// Create a new registry with all built-in functions
    pub fn new() -> Self {
        let mut registry = Self::empty();

        registry.register_math_functions();
        registry.register_statistical_functions();
        registry.register_logical_functions();
        registry.register_text_functions();
        registry.register_info_functions();
        registry.register_lookup_functions();

        registry
    }

    /// Create a registry without any functions
    pub fn empty() -> Self {
        Self {
            functions: AHashMap::new(),
        }
    }

    /// Shared registry with the built-in functions
    pub fn builtin() -> &'static FunctionRegistry {
        DEFAULT_REGISTRY.get_or_init(FunctionRegistry::new)
    }

    /// Look up a function by name
    pub fn get(&self, name: &str) -> Option<&FunctionDef> {
        self.functions.get(&name.to_uppercase())
    }

    /// Check if a function is registered
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Register a function, replacing any function of the same name
    pub fn register(&mut self, def: FunctionDef) {
        self.functions.insert(def.name.to_uppercase(), def);
    }

    /// Number of registered functions
    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }

    /// Registered names, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.functions.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    fn register_math_functions(&mut self) {
        self.register(FunctionDef::eager("SUM", 1, None, math::fn_sum).with_reference_args());
        self.register(FunctionDef::eager("AVERAGE", 1, None, math::fn_average).with_reference_args());
        self.register(FunctionDef::eager("MIN", 1, None, math::fn_min).with_reference_args());
        self.register(FunctionDef::eager("MAX", 1, None, math::fn_max).with_reference_args());
        self.register(FunctionDef::eager("COUNT", 1, None, math::fn_count).with_reference_args());
        self.register(FunctionDef::eager("PRODUCT", 1, None, math::fn_product).with_reference_args());
        self.register(FunctionDef::eager("ABS", 1, Some(1), math::fn_abs));
        self.register(FunctionDef::eager("ROUND", 1, Some(2), math::fn_round));
        self.register(FunctionDef::eager("INT", 1, Some(1), math::fn_int));
        self.register(FunctionDef::eager("MOD", 2, Some(2), math::fn_mod));
        self.register(FunctionDef::eager("POWER", 2, Some(2), math::fn_power));
        self.register(FunctionDef::eager("SQRT", 1, Some(1), math::fn_sqrt));
        self.register(FunctionDef::eager("SUMIF", 2, Some(3), math::fn_sumif).with_reference_args());
    }

    fn register_statistical_functions(&mut self) {
        self.register(
            FunctionDef::eager("COUNTA", 1, None, statistical::fn_counta).with_reference_args(),
        );
        self.register(
            FunctionDef::eager("COUNTBLANK", 1, None, statistical::fn_countblank)
                .with_reference_args(),
        );
        self.register(
            FunctionDef::eager("COUNTIF", 2, Some(2), statistical::fn_countif)
                .with_reference_args(),
        );
        self.register(
            FunctionDef::eager("AVERAGEIF", 2, Some(3), statistical::fn_averageif)
                .with_reference_args(),
        );
    }

    fn register_logical_functions(&mut self) {
        self.register(FunctionDef::lazy("IF", 2, Some(3), logical::fn_if));
        self.register(FunctionDef::lazy("IFERROR", 2, Some(2), logical::fn_iferror));
        self.register(FunctionDef::lazy("IFNA", 2, Some(2), logical::fn_ifna));
        self.register(FunctionDef::eager("AND", 1, None, logical::fn_and).with_reference_args());
        self.register(FunctionDef::eager("OR", 1, None, logical::fn_or).with_reference_args());
        self.register(FunctionDef::eager("NOT", 1, Some(1), logical::fn_not));
        self.register(FunctionDef::eager("TRUE", 0, Some(0), logical::fn_true));
        self.register(FunctionDef::eager("FALSE", 0, Some(0), logical::fn_false));
    }

    fn register_text_functions(&mut self) {
        self.register(FunctionDef::eager("CONCAT", 1, None, text::fn_concat).with_reference_args());
        self.register(
            FunctionDef::eager("CONCATENATE", 1, None, text::fn_concat).with_reference_args(),
        );
        self.register(FunctionDef::eager("LEN", 1, Some(1), text::fn_len));
        self.register(FunctionDef::eager("UPPER", 1, Some(1), text::fn_upper));
        self.register(FunctionDef::eager("LOWER", 1, Some(1), text::fn_lower));
        self.register(FunctionDef::eager("TRIM", 1, Some(1), text::fn_trim));
        self.register(FunctionDef::eager("LEFT", 1, Some(2), text::fn_left));
        self.register(FunctionDef::eager("RIGHT", 1, Some(2), text::fn_right));
    }

    fn register_info_functions(&mut self) {
        self.register(FunctionDef::eager("ISBLANK", 1, Some(1), info::fn_isblank));
        self.register(FunctionDef::eager("ISNUMBER", 1, Some(1), info::fn_isnumber));
        self.register(FunctionDef::eager("ISTEXT", 1, Some(1), info::fn_istext));
        self.register(FunctionDef::eager("ISERROR", 1, Some(1), info::fn_iserror));
        self.register(FunctionDef::eager("ISNA", 1, Some(1), info::fn_isna));
        self.register(FunctionDef::eager("NA", 0, Some(0), info::fn_na));
    }

    fn register_lookup_functions(&mut self) {
        self.register(FunctionDef::eager("VLOOKUP", 3, Some(4), lookup::fn_vlookup));
        self.register(FunctionDef::eager("INDEX", 2, Some(3), lookup::fn_index));
        self.register(FunctionDef::eager("MATCH", 2, Some(3), lookup::fn_match));
    }
}

impl Default for FunctionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

// === Argument helpers shared by the implementations ===

static EMPTY: FormulaValue = FormulaValue::Empty;

/// Iterate over arguments with arrays expanded
///
/// Each value carries `true` when it came from an array (a referenced range
/// or cell) and `false` when it was passed directly.
pub(crate) fn flatten<'a>(
    args: &'a [FormulaValue],
) -> impl Iterator<Item = (&'a FormulaValue, bool)> + 'a {
    args.iter()
        .flat_map(|arg| -> Box<dyn Iterator<Item = (&'a FormulaValue, bool)> + 'a> {
            match arg {
                FormulaValue::Array(rows) => {
                    Box::new(rows.iter().flat_map(|row| row.iter()).map(|v| (v, true)))
                }
                other => Box::new(std::iter::once((other, false))),
            }
        })
}

/// Numbers for aggregate functions
///
/// Direct arguments coerce (booleans, numeric text; other text is `#VALUE!`).
/// Array members count only when they are numbers. Errors propagate.
pub(crate) fn collect_numbers(args: &[FormulaValue]) -> Result<Vec<f64>, CellError> {
    let mut numbers = Vec::new();

    for (value, in_array) in flatten(args) {
        match value {
            FormulaValue::Number(n) => numbers.push(*n),
            FormulaValue::Error(e) => return Err(*e),
            _ if in_array => {}
            FormulaValue::Boolean(b) => numbers.push(if *b { 1.0 } else { 0.0 }),
            FormulaValue::String(s) => numbers.push(parse_number(s).ok_or(CellError::Value)?),
            _ => {}
        }
    }

    Ok(numbers)
}

/// An argument that the declared arity guarantees
pub(crate) fn arg(args: &[FormulaValue], index: usize) -> Result<&FormulaValue, CellError> {
    args.get(index).ok_or(CellError::Value)
}

/// A single value argument; errors propagate and arrays are `#VALUE!`
pub(crate) fn scalar(args: &[FormulaValue], index: usize) -> Result<&FormulaValue, CellError> {
    match args.get(index).unwrap_or(&EMPTY) {
        FormulaValue::Error(e) => Err(*e),
        FormulaValue::Array(_) => Err(CellError::Value),
        value => Ok(value),
    }
}

/// A single value that may arrive as a 1x1 array
pub(crate) fn single(value: &FormulaValue) -> Result<&FormulaValue, CellError> {
    match value {
        FormulaValue::Array(rows) => match rows.as_slice() {
            [row] if row.len() == 1 => single(&row[0]),
            _ => Err(CellError::Value),
        },
        FormulaValue::Error(e) => Err(*e),
        other => Ok(other),
    }
}

pub(crate) fn number_arg(args: &[FormulaValue], index: usize) -> Result<f64, CellError> {
    scalar(args, index)?.to_number()
}

pub(crate) fn optional_number(
    args: &[FormulaValue],
    index: usize,
    default: f64,
) -> Result<f64, CellError> {
    match args.get(index) {
        None => Ok(default),
        Some(_) => number_arg(args, index),
    }
}

pub(crate) fn text_arg(args: &[FormulaValue], index: usize) -> Result<String, CellError> {
    scalar(args, index)?.to_text()
}

pub(crate) fn bool_arg(args: &[FormulaValue], index: usize) -> Result<bool, CellError> {
    scalar(args, index)?.to_bool()
}

/// View an argument as a grid; a single value is a 1x1 grid
pub(crate) fn grid(value: &FormulaValue) -> Result<Cow<'_, [Vec<FormulaValue>]>, CellError> {
    match value {
        FormulaValue::Array(rows) => Ok(Cow::Borrowed(rows.as_slice())),
        FormulaValue::Error(e) => Err(*e),
        other => Ok(Cow::Owned(vec![vec![other.clone()]])),
    }
}

/// Reject results that overflowed or are not a number
pub(crate) fn finite(n: f64) -> FunctionResult {
    if n.is_finite() {
        Ok(FormulaValue::Number(n))
    } else {
        Err(CellError::Num)
    }
}
