//! Values produced during formula evaluation

use sheetcraft_core::{format_number, parse_number, CellError, CellValue};
use std::cmp::Ordering;

/// Value types during formula evaluation
///
/// `Array` only ever comes from a cell or range reference; it is row-major and
/// rectangular.
#[derive(Debug, Clone, PartialEq)]
pub enum FormulaValue {
    Number(f64),
    String(String),
    Boolean(bool),
    Error(CellError),
    Array(Vec<Vec<FormulaValue>>),
    Empty,
}

impl FormulaValue {
    /// Convert to number, if possible
    ///
    /// Empty is 0, booleans are 1/0 and numeric text is parsed.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            FormulaValue::Number(n) => Some(*n),
            FormulaValue::Boolean(true) => Some(1.0),
            FormulaValue::Boolean(false) => Some(0.0),
            FormulaValue::String(s) => parse_number(s),
            FormulaValue::Empty => Some(0.0),
            _ => None,
        }
    }

    /// Force conversion to number for arithmetic
    pub fn to_number(&self) -> Result<f64, CellError> {
        match self {
            FormulaValue::Error(e) => Err(*e),
            other => other.as_number().ok_or(CellError::Value),
        }
    }

    /// Convert to boolean
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            FormulaValue::Boolean(b) => Some(*b),
            FormulaValue::Number(n) => Some(*n != 0.0),
            FormulaValue::Empty => Some(false),
            FormulaValue::String(s) => {
                if s.eq_ignore_ascii_case("TRUE") {
                    Some(true)
                } else if s.eq_ignore_ascii_case("FALSE") {
                    Some(false)
                } else {
                    None
                }
            }
            _ => None,
        }
    }

    /// Force conversion to boolean for conditions
    pub fn to_bool(&self) -> Result<bool, CellError> {
        match self {
            FormulaValue::Error(e) => Err(*e),
            other => other.as_bool().ok_or(CellError::Value),
        }
    }

    /// Convert to string
    pub fn as_string(&self) -> String {
        match self {
            FormulaValue::Number(n) => format_number(*n),
            FormulaValue::String(s) => s.clone(),
            FormulaValue::Boolean(true) => "TRUE".to_string(),
            FormulaValue::Boolean(false) => "FALSE".to_string(),
            FormulaValue::Error(e) => e.to_string(),
            FormulaValue::Empty => String::new(),
            FormulaValue::Array(_) => "#VALUE!".to_string(),
        }
    }

    /// Force conversion to text for text functions
    pub fn to_text(&self) -> Result<String, CellError> {
        match self {
            FormulaValue::Error(e) => Err(*e),
            FormulaValue::Array(_) => Err(CellError::Value),
            other => Ok(other.as_string()),
        }
    }

    /// Check if this is an error
    pub fn is_error(&self) -> bool {
        matches!(self, FormulaValue::Error(_))
    }

    /// Get the error if this is one
    pub fn get_error(&self) -> Option<CellError> {
        match self {
            FormulaValue::Error(e) => Some(*e),
            _ => None,
        }
    }

    /// Collapse to a single value: a range where one value is expected is `#VALUE!`
    pub fn into_scalar(self) -> FormulaValue {
        match self {
            FormulaValue::Array(_) => FormulaValue::Error(CellError::Value),
            other => other,
        }
    }

    /// Rank used when values of different types are compared
    ///
    /// Numbers sort before text, text before booleans.
    fn type_rank(&self) -> u8 {
        match self {
            FormulaValue::Number(_) | FormulaValue::Empty => 0,
            FormulaValue::String(_) => 1,
            FormulaValue::Boolean(_) => 2,
            FormulaValue::Error(_) | FormulaValue::Array(_) => 3,
        }
    }

    /// Check if two values belong to the same comparison class
    pub fn same_type_class(&self, other: &FormulaValue) -> bool {
        self.type_rank() == other.type_rank()
    }
}

/// Compare two scalar values (spreadsheet ordering)
///
/// An empty operand takes the type of the other side (0, "" or FALSE). Text
/// compares case-insensitively.
pub fn compare_values(left: &FormulaValue, right: &FormulaValue) -> Ordering {
    let blank_like = |other: &FormulaValue| match other {
        FormulaValue::String(_) => FormulaValue::String(String::new()),
        FormulaValue::Boolean(_) => FormulaValue::Boolean(false),
        _ => FormulaValue::Number(0.0),
    };

    let left_owned;
    let right_owned;
    let (left, right) = match (left, right) {
        (FormulaValue::Empty, FormulaValue::Empty) => return Ordering::Equal,
        (FormulaValue::Empty, r) => {
            left_owned = blank_like(r);
            (&left_owned, r)
        }
        (l, FormulaValue::Empty) => {
            right_owned = blank_like(l);
            (l, &right_owned)
        }
        pair => pair,
    };

    match (left, right) {
        (FormulaValue::Number(l), FormulaValue::Number(r)) => {
            l.partial_cmp(r).unwrap_or(Ordering::Equal)
        }
        (FormulaValue::String(l), FormulaValue::String(r)) => {
            l.to_lowercase().cmp(&r.to_lowercase())
        }
        (FormulaValue::Boolean(l), FormulaValue::Boolean(r)) => l.cmp(r),
        (l, r) => l.type_rank().cmp(&r.type_rank()),
    }
}

/// Equality used by exact lookups
///
/// Text matches case-insensitively and numeric text matches the number.
pub fn values_equal(a: &FormulaValue, b: &FormulaValue) -> bool {
    match (a, b) {
        (FormulaValue::Number(x), FormulaValue::Number(y)) => x == y,
        (FormulaValue::Boolean(x), FormulaValue::Boolean(y)) => x == y,
        (FormulaValue::String(x), FormulaValue::String(y)) => x.to_lowercase() == y.to_lowercase(),

        (FormulaValue::Number(x), FormulaValue::String(s))
        | (FormulaValue::String(s), FormulaValue::Number(x)) => {
            parse_number(s).map(|n| n == *x).unwrap_or(false)
        }

        (FormulaValue::Empty, FormulaValue::Empty) => true,
        (FormulaValue::Empty, FormulaValue::Number(n))
        | (FormulaValue::Number(n), FormulaValue::Empty) => *n == 0.0,
        (FormulaValue::Empty, FormulaValue::String(s))
        | (FormulaValue::String(s), FormulaValue::Empty) => s.is_empty(),

        _ => false,
    }
}

impl From<CellValue> for FormulaValue {
    fn from(value: CellValue) -> Self {
        match value {
            CellValue::Empty => FormulaValue::Empty,
            CellValue::Number(n) => FormulaValue::Number(n),
            CellValue::String(s) => FormulaValue::String(s.as_str().to_string()),
            CellValue::Boolean(b) => FormulaValue::Boolean(b),
            CellValue::Error(e) => FormulaValue::Error(e),
        }
    }
}

impl From<&CellValue> for FormulaValue {
    fn from(value: &CellValue) -> Self {
        value.clone().into()
    }
}

impl From<FormulaValue> for CellValue {
    fn from(value: FormulaValue) -> Self {
        match value {
            FormulaValue::Empty => CellValue::Empty,
            FormulaValue::Number(n) => CellValue::Number(n),
            FormulaValue::String(s) => CellValue::String(s.into()),
            FormulaValue::Boolean(b) => CellValue::Boolean(b),
            FormulaValue::Error(e) => CellValue::Error(e),
            FormulaValue::Array(_) => CellValue::Error(CellError::Value),
        }
    }
}

impl From<f64> for FormulaValue {
    fn from(n: f64) -> Self {
        FormulaValue::Number(n)
    }
}

impl From<bool> for FormulaValue {
    fn from(b: bool) -> Self {
        FormulaValue::Boolean(b)
    }
}

impl From<&str> for FormulaValue {
    fn from(s: &str) -> Self {
        FormulaValue::String(s.to_string())
    }
}

impl From<CellError> for FormulaValue {
    fn from(e: CellError) -> Self {
        FormulaValue::Error(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coercions() {
        assert_eq!(FormulaValue::Empty.to_number(), Ok(0.0));
        assert_eq!(FormulaValue::from(" 12 ").to_number(), Ok(12.0));
        assert_eq!(FormulaValue::from("abc").to_number(), Err(CellError::Value));
        assert_eq!(FormulaValue::Boolean(true).to_number(), Ok(1.0));
        assert_eq!(
            FormulaValue::Error(CellError::Na).to_number(),
            Err(CellError::Na)
        );

        assert_eq!(FormulaValue::from("true").to_bool(), Ok(true));
        assert_eq!(FormulaValue::Empty.to_bool(), Ok(false));
        assert_eq!(FormulaValue::from("yes").to_bool(), Err(CellError::Value));
    }

    #[test]
    fn test_as_string_formats_integers() {
        assert_eq!(FormulaValue::Number(3.0).as_string(), "3");
        assert_eq!(FormulaValue::Number(2.5).as_string(), "2.5");
        assert_eq!(FormulaValue::Boolean(false).as_string(), "FALSE");
        assert_eq!(FormulaValue::Empty.as_string(), "");
    }

    #[test]
    fn test_compare_values() {
        use FormulaValue as V;
        assert_eq!(compare_values(&V::Number(1.0), &V::Number(2.0)), Ordering::Less);
        assert_eq!(compare_values(&V::from("abc"), &V::from("ABC")), Ordering::Equal);
        assert_eq!(compare_values(&V::Number(100.0), &V::from("a")), Ordering::Less);
        assert_eq!(compare_values(&V::from("z"), &V::Boolean(false)), Ordering::Less);
        assert_eq!(compare_values(&V::Empty, &V::Number(0.0)), Ordering::Equal);
        assert_eq!(compare_values(&V::Empty, &V::from("")), Ordering::Equal);
        assert_eq!(compare_values(&V::Boolean(false), &V::Empty), Ordering::Equal);
    }

    #[test]
    fn test_values_equal() {
        use FormulaValue as V;
        assert!(values_equal(&V::Number(103.0), &V::from("103")));
        assert!(values_equal(&V::from("Citra"), &V::from("citra")));
        assert!(!values_equal(&V::Number(1.0), &V::Boolean(true)));
    }
}
