//! Formula error types

use crate::value::FormulaValue;
use sheetcraft_core::CellError;
use std::fmt;
use thiserror::Error;

/// Result type for formula operations
pub type FormulaResult<T = FormulaValue> = std::result::Result<T, FormulaError>;

/// Why a formula could not be evaluated
///
/// Syntax errors mean the formula text itself is malformed and nothing was
/// evaluated. Runtime errors are the spreadsheet error codes (`#N/A`, ...).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FormulaError {
    /// The formula text could not be tokenized or parsed
    #[error(transparent)]
    Syntax(#[from] SyntaxError),

    /// Evaluation produced a spreadsheet error value
    #[error(transparent)]
    Runtime(#[from] RuntimeError),
}

impl FormulaError {
    /// The runtime error kind, or `None` for syntax errors
    pub fn kind(&self) -> Option<CellError> {
        match self {
            FormulaError::Syntax(_) => None,
            FormulaError::Runtime(e) => Some(e.kind),
        }
    }

    /// What a cell showing this error displays
    pub fn display_value(&self) -> &'static str {
        match self {
            FormulaError::Syntax(_) => "#ERROR!",
            FormulaError::Runtime(e) => e.kind.as_str(),
        }
    }

    /// Short human-readable description
    pub fn message(&self) -> &str {
        match self {
            FormulaError::Syntax(e) => &e.message,
            FormulaError::Runtime(e) => &e.message,
        }
    }

    /// Proposed fix, if there is one
    pub fn suggestion(&self) -> Option<&'static str> {
        match self {
            FormulaError::Syntax(e) => e.kind.suggestion(),
            FormulaError::Runtime(e) => e.suggestion,
        }
    }

    /// Check if the formula text was malformed
    pub fn is_syntax(&self) -> bool {
        matches!(self, FormulaError::Syntax(_))
    }
}

impl From<CellError> for FormulaError {
    fn from(kind: CellError) -> Self {
        FormulaError::Runtime(RuntimeError::new(kind))
    }
}

/// Malformed formula text
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{message} (at position {position})")]
pub struct SyntaxError {
    /// What went wrong
    pub kind: SyntaxErrorKind,
    /// Byte offset into the formula text
    pub position: usize,
    /// Human-readable description
    pub message: String,
}

impl SyntaxError {
    /// Create a new syntax error
    pub fn new<S: Into<String>>(kind: SyntaxErrorKind, position: usize, message: S) -> Self {
        Self {
            kind,
            position,
            message: message.into(),
        }
    }

    /// Shift the position by the length of text stripped before tokenizing
    pub(crate) fn offset(mut self, by: usize) -> Self {
        self.position += by;
        self
    }
}

/// Syntax error kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SyntaxErrorKind {
    /// A string literal has no closing quote
    UnterminatedString,
    /// A character that cannot start any token
    UnknownCharacter,
    /// A token that does not fit the grammar here
    UnexpectedToken,
    /// An opening or closing parenthesis has no partner
    MissingParenthesis,
    /// Nothing to evaluate (including text without a leading `=`)
    EmptyExpression,
}

impl SyntaxErrorKind {
    /// Name of the kind
    pub fn as_str(&self) -> &'static str {
        match self {
            SyntaxErrorKind::UnterminatedString => "unterminated string",
            SyntaxErrorKind::UnknownCharacter => "unknown character",
            SyntaxErrorKind::UnexpectedToken => "unexpected token",
            SyntaxErrorKind::MissingParenthesis => "missing parenthesis",
            SyntaxErrorKind::EmptyExpression => "empty expression",
        }
    }

    fn suggestion(&self) -> Option<&'static str> {
        match self {
            SyntaxErrorKind::UnterminatedString => Some("close the text with a double quote"),
            SyntaxErrorKind::MissingParenthesis => Some("check that every '(' has a matching ')'"),
            SyntaxErrorKind::EmptyExpression => Some("formulas start with '=' followed by an expression"),
            _ => None,
        }
    }
}

impl fmt::Display for SyntaxErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A spreadsheet error code with hint text
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}: {message}")]
pub struct RuntimeError {
    /// Error code
    pub kind: CellError,
    /// Human-readable description
    pub message: String,
    /// Proposed fix
    pub suggestion: Option<&'static str>,
}

impl RuntimeError {
    /// Create an error with the default message and suggestion for `kind`
    pub fn new(kind: CellError) -> Self {
        Self {
            kind,
            message: kind.message().to_string(),
            suggestion: kind.suggestion(),
        }
    }
}
