//! Formula Abstract Syntax Tree types

use crate::value::FormulaValue;
use sheetcraft_core::{CellAddress, CellRange};

/// Formula expression AST
#[derive(Debug, Clone, PartialEq)]
pub enum FormulaExpr {
    /// Number, text or boolean literal
    Literal(Literal),

    // === References ===
    /// Single cell reference
    CellRef(CellReference),
    /// Range reference
    RangeRef(RangeReference),
    /// Bare identifier that is not a function call
    Name(String),

    // === Operators ===
    /// Binary operation
    BinaryOp {
        op: BinaryOperator,
        left: Box<FormulaExpr>,
        right: Box<FormulaExpr>,
    },
    /// Unary operation
    UnaryOp {
        op: UnaryOperator,
        operand: Box<FormulaExpr>,
    },

    // === Function call ===
    Function {
        name: String,
        args: Vec<FormulaExpr>,
    },
}

impl FormulaExpr {
    /// Numeric literal
    pub fn number(n: f64) -> Self {
        FormulaExpr::Literal(Literal::Number(n))
    }

    /// Text literal
    pub fn string<S: Into<String>>(s: S) -> Self {
        FormulaExpr::Literal(Literal::String(s.into()))
    }

    /// Boolean literal
    pub fn boolean(b: bool) -> Self {
        FormulaExpr::Literal(Literal::Boolean(b))
    }

    /// Visit every cell and range reference in the tree
    pub fn for_each_reference<F>(&self, f: &mut F)
    where
        F: FnMut(Reference<'_>),
    {
        match self {
            FormulaExpr::CellRef(r) => f(Reference::Cell(r)),
            FormulaExpr::RangeRef(r) => f(Reference::Range(r)),
            FormulaExpr::BinaryOp { left, right, .. } => {
                left.for_each_reference(f);
                right.for_each_reference(f);
            }
            FormulaExpr::UnaryOp { operand, .. } => operand.for_each_reference(f),
            FormulaExpr::Function { args, .. } => {
                for arg in args {
                    arg.for_each_reference(f);
                }
            }
            FormulaExpr::Literal(_) | FormulaExpr::Name(_) => {}
        }
    }
}

/// Literal values
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Number(f64),
    String(String),
    Boolean(bool),
}

impl From<&Literal> for FormulaValue {
    fn from(lit: &Literal) -> Self {
        match lit {
            Literal::Number(n) => FormulaValue::Number(*n),
            Literal::String(s) => FormulaValue::String(s.clone()),
            Literal::Boolean(b) => FormulaValue::Boolean(*b),
        }
    }
}

/// Cell reference as written, `$` flags included
#[derive(Debug, Clone, PartialEq)]
pub struct CellReference {
    pub address: CellAddress,
}

/// Range reference, normalized to top-left / bottom-right corners
#[derive(Debug, Clone, PartialEq)]
pub struct RangeReference {
    pub range: CellRange,
}

/// A reference found while walking an expression
#[derive(Debug, Clone, Copy)]
pub enum Reference<'a> {
    Cell(&'a CellReference),
    Range(&'a RangeReference),
}

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
    // Arithmetic
    Add,
    Subtract,
    Multiply,
    Divide,
    Power,

    // Comparison
    Equal,
    NotEqual,
    LessThan,
    LessEqual,
    GreaterThan,
    GreaterEqual,

    // Text
    Concat,
}

/// Unary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOperator {
    Negate,
}
