//! # sheetcraft-formula
//!
//! Formula parser and evaluator for sheetcraft.
//!
//! This crate provides:
//! - Formula tokenizing and parsing (text → AST)
//! - Formula evaluation (AST → value) with cycle detection
//! - Built-in spreadsheet functions (math, statistics, logic, text, lookup)
//! - Dependency tracking for sheet recalculation
//!
//! ## Example
//!
//! ```rust
//! use sheetcraft_core::{CellAddress, Sheet};
//! use sheetcraft_formula::{Evaluator, FormulaValue};
//!
//! let mut sheet = Sheet::new();
//! sheet.set_input("A1", "10").unwrap();
//! sheet.set_input("A2", "32").unwrap();
//! sheet.set_input("A3", "=SUM(A1:A2)").unwrap();
//!
//! let evaluator = Evaluator::new(&sheet);
//! let a3 = CellAddress::parse("A3").unwrap();
//! assert_eq!(evaluator.evaluate_cell(a3), Ok(FormulaValue::Number(42.0)));
//! ```

pub mod ast;
pub mod cycle;
pub mod dependency;
pub mod error;
pub mod evaluator;
pub mod functions;
pub mod lexer;
pub mod parser;
pub mod reference;
pub mod value;

pub use ast::{BinaryOperator, CellReference, FormulaExpr, RangeReference, UnaryOperator};
pub use cycle::{EvaluationStack, DEFAULT_MAX_DEPTH, DEFAULT_MAX_EXPRESSION_DEPTH};
pub use dependency::{CellKey, DependencyGraph};
pub use error::{FormulaError, FormulaResult, RuntimeError, SyntaxError, SyntaxErrorKind};
pub use evaluator::{Evaluator, EvaluatorOptions};
pub use functions::{FunctionDef, FunctionRegistry, FunctionResult};
pub use parser::parse_formula;
pub use reference::ReferenceResolver;
pub use value::FormulaValue;
