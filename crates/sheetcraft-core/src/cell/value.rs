//! Cell value types

use std::fmt;
use std::sync::Arc;

/// Represents the value stored in a cell
///
/// Literal cells hold the value the host typed. Formula cells hold whatever the
/// last recalculation cached here, which may be an error.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum CellValue {
    /// Empty cell (no value)
    #[default]
    Empty,

    /// Boolean value (TRUE/FALSE)
    Boolean(bool),

    /// Numeric value (all numbers stored as f64)
    Number(f64),

    /// String value
    String(SharedString),

    /// Cached error result of a formula
    Error(CellError),
}

impl CellValue {
    /// Create a new string value
    pub fn string<S: AsRef<str>>(s: S) -> Self {
        CellValue::String(SharedString::new(s))
    }

    /// Interpret literal (non-formula) input text
    ///
    /// Empty text is `Empty`, numeric text a number, `TRUE`/`FALSE` in any case a
    /// boolean and anything else text. Surrounding whitespace is kept for text.
    pub fn from_input(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return CellValue::Empty;
        }
        if let Some(n) = parse_number(trimmed) {
            return CellValue::Number(n);
        }
        if trimmed.eq_ignore_ascii_case("TRUE") {
            return CellValue::Boolean(true);
        }
        if trimmed.eq_ignore_ascii_case("FALSE") {
            return CellValue::Boolean(false);
        }
        CellValue::string(raw)
    }

    /// Check if the cell is empty
    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Empty)
    }

    /// Check if the cell contains an error
    pub fn is_error(&self) -> bool {
        matches!(self, CellValue::Error(_))
    }

    /// Try to get the value as a number
    pub fn as_number(&self) -> Option<f64> {
        match self {
            CellValue::Number(n) => Some(*n),
            CellValue::Boolean(true) => Some(1.0),
            CellValue::Boolean(false) => Some(0.0),
            _ => None,
        }
    }

    /// Try to get the value as a boolean
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            CellValue::Boolean(b) => Some(*b),
            CellValue::Number(n) => Some(*n != 0.0),
            _ => None,
        }
    }

    /// Try to get the value as a string
    pub fn as_string(&self) -> Option<&str> {
        match self {
            CellValue::String(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Get the type name for error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            CellValue::Empty => "empty",
            CellValue::Boolean(_) => "boolean",
            CellValue::Number(_) => "number",
            CellValue::String(_) => "string",
            CellValue::Error(_) => "error",
        }
    }
}

/// Parse numeric input text, rejecting the words Rust's float parser accepts
/// (`inf`, `NaN`, ...) that no spreadsheet treats as numbers.
pub fn parse_number(s: &str) -> Option<f64> {
    let s = s.trim();
    if !s
        .bytes()
        .all(|b| b.is_ascii_digit() || matches!(b, b'.' | b'-' | b'+' | b'e' | b'E'))
    {
        return None;
    }
    s.parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Significant digits a spreadsheet shows for a number
const DISPLAY_DIGITS: usize = 15;

/// Format a number the way a cell displays it
///
/// The value is rounded to 15 significant digits first, so binary noise such
/// as `0.1 + 0.2` shows as `0.3`. Integers print without a fraction.
pub fn format_number(n: f64) -> String {
    let rounded = format!("{:.*e}", DISPLAY_DIGITS - 1, n)
        .parse::<f64>()
        .unwrap_or(n);

    if rounded == 0.0 {
        "0".to_string()
    } else if rounded.fract() == 0.0 && rounded.abs() < 1e15 {
        format!("{}", rounded as i64)
    } else {
        format!("{}", rounded)
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Empty => write!(f, ""),
            CellValue::Boolean(b) => write!(f, "{}", if *b { "TRUE" } else { "FALSE" }),
            CellValue::Number(n) => write!(f, "{}", format_number(*n)),
            CellValue::String(s) => write!(f, "{}", s.as_str()),
            CellValue::Error(e) => write!(f, "{}", e),
        }
    }
}

impl From<bool> for CellValue {
    fn from(b: bool) -> Self {
        CellValue::Boolean(b)
    }
}

impl From<i32> for CellValue {
    fn from(n: i32) -> Self {
        CellValue::Number(n as f64)
    }
}

impl From<i64> for CellValue {
    fn from(n: i64) -> Self {
        CellValue::Number(n as f64)
    }
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self {
        CellValue::Number(n)
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::string(s)
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        CellValue::string(s)
    }
}

impl From<CellError> for CellValue {
    fn from(e: CellError) -> Self {
        CellValue::Error(e)
    }
}

/// Spreadsheet error values produced by evaluation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CellError {
    /// #NAME? - Unrecognized function or identifier
    Name,
    /// #VALUE! - Wrong type of argument or operand
    Value,
    /// #REF! - Invalid or out-of-bounds cell reference
    Ref,
    /// #REF! - The formula depends on its own result
    Circular,
    /// #DIV/0! - Division by zero
    Div0,
    /// #N/A - Lookup found no match
    Na,
    /// #NUM! - Invalid numeric operation
    Num,
}

impl CellError {
    /// Get the display string for this error
    pub fn as_str(&self) -> &'static str {
        match self {
            CellError::Name => "#NAME?",
            CellError::Value => "#VALUE!",
            CellError::Ref | CellError::Circular => "#REF!",
            CellError::Div0 => "#DIV/0!",
            CellError::Na => "#N/A",
            CellError::Num => "#NUM!",
        }
    }

    /// Short human-readable description
    pub fn message(&self) -> &'static str {
        match self {
            CellError::Name => "unknown function or name",
            CellError::Value => "wrong type of argument or operand",
            CellError::Ref => "invalid or out-of-range reference",
            CellError::Circular => "circular reference",
            CellError::Div0 => "division by zero",
            CellError::Na => "value not available",
            CellError::Num => "invalid numeric value",
        }
    }

    /// Default hint for fixing a formula that produced this error
    pub fn suggestion(&self) -> Option<&'static str> {
        match self {
            CellError::Name => Some("check the spelling of the function name"),
            CellError::Value => Some("make sure the arguments are numbers where numbers are expected"),
            CellError::Ref => Some("check the lookup range bounds"),
            CellError::Circular => Some("remove the reference back to this cell"),
            CellError::Div0 => Some("make sure the divisor is not zero or empty"),
            CellError::Na => Some("wrap the lookup in IFERROR to show a fallback"),
            CellError::Num => None,
        }
    }
}

impl fmt::Display for CellError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Reference-counted string
///
/// Evaluation clones values freely (range expansion, lookups), so text is kept
/// behind an `Arc<str>` rather than copied.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SharedString(Arc<str>);

impl SharedString {
    /// Create a new shared string
    pub fn new<S: AsRef<str>>(s: S) -> Self {
        SharedString(Arc::from(s.as_ref()))
    }

    /// Get the string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Get the length of the string in bytes
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check if the string is empty
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for SharedString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.0)
    }
}

impl fmt::Display for SharedString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for SharedString {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for SharedString {
    fn from(s: &str) -> Self {
        SharedString::new(s)
    }
}

impl From<String> for SharedString {
    fn from(s: String) -> Self {
        SharedString::new(s)
    }
}
