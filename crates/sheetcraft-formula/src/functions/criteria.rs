//! Criteria matching for SUMIF, COUNTIF and AVERAGEIF
//!
//! Criteria can be:
//! - A number: exact match (e.g., 5)
//! - A text string: case-insensitive match (e.g., "apple")
//! - A comparison expression: ">5", ">=10", "<100", "<=50", "<>0", "=5", ">b"
//! - Wildcards: "*" matches any characters, "?" matches single character
//! - Empty string: matches empty cells

use crate::value::FormulaValue;
use sheetcraft_core::parse_number;

/// Criteria matcher for SUMIF/COUNTIF/AVERAGEIF
#[derive(Debug)]
pub struct CriteriaMatcher {
    criteria_type: CriteriaType,
}

#[derive(Debug)]
enum CriteriaType {
    /// Exact number match
    Number(f64),
    /// Comparison with number (operator, value)
    Comparison(ComparisonOp, f64),
    /// Ordering comparison with text, lower-cased
    TextComparison(ComparisonOp, String),
    /// Text match (lower-cased, with wildcards)
    Text(String),
    /// Anything that does not match the text pattern, blanks included
    NotText(String),
    /// Match empty values
    Empty,
    /// Matches nothing (error criteria)
    Nothing,
}

#[derive(Debug, Clone, Copy)]
enum ComparisonOp {
    Equal,
    NotEqual,
    LessThan,
    LessEqual,
    GreaterThan,
    GreaterEqual,
}

impl ComparisonOp {
    fn holds<T: PartialOrd>(self, left: T, right: T) -> bool {
        match self {
            ComparisonOp::Equal => left == right,
            ComparisonOp::NotEqual => left != right,
            ComparisonOp::LessThan => left < right,
            ComparisonOp::LessEqual => left <= right,
            ComparisonOp::GreaterThan => left > right,
            ComparisonOp::GreaterEqual => left >= right,
        }
    }
}

impl CriteriaMatcher {
    /// Create a new criteria matcher from a FormulaValue
    pub fn new(criteria: &FormulaValue) -> Self {
        let criteria_type = match criteria {
            FormulaValue::Number(n) => CriteriaType::Number(*n),
            FormulaValue::Boolean(b) => CriteriaType::Number(if *b { 1.0 } else { 0.0 }),
            FormulaValue::String(s) => Self::parse_string_criteria(s),
            FormulaValue::Empty => CriteriaType::Empty,
            FormulaValue::Error(_) | FormulaValue::Array(_) => CriteriaType::Nothing,
        };

        Self { criteria_type }
    }

    fn parse_string_criteria(s: &str) -> CriteriaType {
        let s = s.trim();

        if s.is_empty() {
            return CriteriaType::Empty;
        }

        if let Some(ct) = Self::try_parse_comparison(s) {
            return ct;
        }

        if let Some(n) = parse_number(s) {
            return CriteriaType::Number(n);
        }

        CriteriaType::Text(s.to_lowercase())
    }

    fn try_parse_comparison(s: &str) -> Option<CriteriaType> {
        // Longer operators first
        let (op, rest) = if let Some(rest) = s.strip_prefix(">=") {
            (ComparisonOp::GreaterEqual, rest)
        } else if let Some(rest) = s.strip_prefix("<=") {
            (ComparisonOp::LessEqual, rest)
        } else if let Some(rest) = s.strip_prefix("<>") {
            (ComparisonOp::NotEqual, rest)
        } else if let Some(rest) = s.strip_prefix('>') {
            (ComparisonOp::GreaterThan, rest)
        } else if let Some(rest) = s.strip_prefix('<') {
            (ComparisonOp::LessThan, rest)
        } else if let Some(rest) = s.strip_prefix('=') {
            (ComparisonOp::Equal, rest)
        } else {
            return None;
        };

        let rest = rest.trim();
        if let Some(n) = parse_number(rest) {
            return Some(CriteriaType::Comparison(op, n));
        }

        let text = rest.to_lowercase();
        Some(match op {
            ComparisonOp::Equal if text.is_empty() => CriteriaType::Empty,
            ComparisonOp::Equal => CriteriaType::Text(text),
            ComparisonOp::NotEqual => CriteriaType::NotText(text),
            other => CriteriaType::TextComparison(other, text),
        })
    }

    /// Check if a value matches the criteria
    pub fn matches(&self, value: &FormulaValue) -> bool {
        match &self.criteria_type {
            // Only actual numbers match, not text that looks like one
            CriteriaType::Number(criteria_num) => match numeric(value) {
                Some(n) => (n - criteria_num).abs() < 1e-10,
                None => false,
            },

            CriteriaType::Comparison(op, criteria_num) => match (op, numeric(value)) {
                (ComparisonOp::Equal, Some(n)) => (n - criteria_num).abs() < 1e-10,
                (ComparisonOp::NotEqual, Some(n)) => (n - criteria_num).abs() >= 1e-10,
                // "<>5" also matches text and blanks
                (ComparisonOp::NotEqual, None) => true,
                (op, Some(n)) => op.holds(n, *criteria_num),
                (_, None) => false,
            },

            CriteriaType::TextComparison(op, criteria_text) => match value {
                FormulaValue::String(s) => op.holds(s.to_lowercase().as_str(), criteria_text.as_str()),
                _ => false,
            },

            CriteriaType::Text(pattern) => match value {
                FormulaValue::Error(_) | FormulaValue::Array(_) | FormulaValue::Empty => false,
                other => Self::wildcard_match(pattern, &other.as_string().to_lowercase()),
            },

            CriteriaType::NotText(pattern) => match value {
                FormulaValue::Error(_) | FormulaValue::Array(_) => false,
                other => !Self::wildcard_match(pattern, &other.as_string().to_lowercase()),
            },

            CriteriaType::Empty => {
                matches!(value, FormulaValue::Empty)
                    || matches!(value, FormulaValue::String(s) if s.is_empty())
            }

            CriteriaType::Nothing => false,
        }
    }

    /// Match with wildcards: * = any characters, ? = single character
    fn wildcard_match(pattern: &str, text: &str) -> bool {
        // If no wildcards, do exact match
        if !pattern.contains('*') && !pattern.contains('?') {
            return pattern == text;
        }

        let pattern_chars: Vec<char> = pattern.chars().collect();
        let text_chars: Vec<char> = text.chars().collect();

        Self::wildcard_match_impl(&pattern_chars, &text_chars)
    }

    fn wildcard_match_impl(pattern: &[char], text: &[char]) -> bool {
        let mut pi = 0; // pattern index
        let mut ti = 0; // text index
        let mut star_pi = None; // position of last * in pattern
        let mut star_ti = 0; // text position when the last * was seen

        while ti < text.len() {
            if pi < pattern.len() && (pattern[pi] == '?' || pattern[pi] == text[ti]) {
                pi += 1;
                ti += 1;
            } else if pi < pattern.len() && pattern[pi] == '*' {
                star_pi = Some(pi);
                star_ti = ti;
                pi += 1; // Try matching * with empty string first
            } else if let Some(sp) = star_pi {
                // Backtrack: let the last * swallow one more character
                pi = sp + 1;
                star_ti += 1;
                ti = star_ti;
            } else {
                return false;
            }
        }

        // Remaining pattern characters must all be *
        while pi < pattern.len() && pattern[pi] == '*' {
            pi += 1;
        }

        pi == pattern.len()
    }
}

fn numeric(value: &FormulaValue) -> Option<f64> {
    match value {
        FormulaValue::Number(n) => Some(*n),
        FormulaValue::Boolean(b) => Some(if *b { 1.0 } else { 0.0 }),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> FormulaValue {
        FormulaValue::String(s.into())
    }

    #[test]
    fn test_number_criteria() {
        let matcher = CriteriaMatcher::new(&FormulaValue::Number(5.0));
        assert!(matcher.matches(&FormulaValue::Number(5.0)));
        assert!(!matcher.matches(&FormulaValue::Number(4.0)));
        assert!(!matcher.matches(&text("5")));

        // Numeric text criteria behaves like the number
        let matcher = CriteriaMatcher::new(&text("5"));
        assert!(matcher.matches(&FormulaValue::Number(5.0)));
    }

    #[test]
    fn test_comparison_criteria() {
        let matcher = CriteriaMatcher::new(&text(">5"));
        assert!(matcher.matches(&FormulaValue::Number(6.0)));
        assert!(!matcher.matches(&FormulaValue::Number(5.0)));
        assert!(!matcher.matches(&text("apple")));

        let matcher = CriteriaMatcher::new(&text(">=5"));
        assert!(matcher.matches(&FormulaValue::Number(5.0)));
        assert!(!matcher.matches(&FormulaValue::Number(4.0)));

        let matcher = CriteriaMatcher::new(&text("<5"));
        assert!(matcher.matches(&FormulaValue::Number(4.0)));
        assert!(!matcher.matches(&FormulaValue::Number(5.0)));

        let matcher = CriteriaMatcher::new(&text("<=5"));
        assert!(matcher.matches(&FormulaValue::Number(5.0)));
        assert!(!matcher.matches(&FormulaValue::Number(6.0)));

        let matcher = CriteriaMatcher::new(&text("<>5"));
        assert!(matcher.matches(&FormulaValue::Number(6.0)));
        assert!(!matcher.matches(&FormulaValue::Number(5.0)));
        assert!(matcher.matches(&text("five")));

        let matcher = CriteriaMatcher::new(&text("= 5"));
        assert!(matcher.matches(&FormulaValue::Number(5.0)));
        assert!(!matcher.matches(&FormulaValue::Number(4.0)));
    }

    #[test]
    fn test_text_comparison_criteria() {
        let matcher = CriteriaMatcher::new(&text(">m"));
        assert!(matcher.matches(&text("Zebra")));
        assert!(!matcher.matches(&text("apple")));
        assert!(!matcher.matches(&FormulaValue::Number(100.0)));

        let matcher = CriteriaMatcher::new(&text("<>apple"));
        assert!(matcher.matches(&text("banana")));
        assert!(matcher.matches(&FormulaValue::Empty));
        assert!(!matcher.matches(&text("APPLE")));

        let matcher = CriteriaMatcher::new(&text("="));
        assert!(matcher.matches(&FormulaValue::Empty));
        assert!(!matcher.matches(&text("x")));
    }

    #[test]
    fn test_text_criteria() {
        let matcher = CriteriaMatcher::new(&text("apple"));
        assert!(matcher.matches(&text("apple")));
        assert!(matcher.matches(&text("APPLE")));
        assert!(!matcher.matches(&text("banana")));
        assert!(!matcher.matches(&FormulaValue::Empty));
    }

    #[test]
    fn test_wildcard_criteria() {
        let matcher = CriteriaMatcher::new(&text("a*"));
        assert!(matcher.matches(&text("apple")));
        assert!(matcher.matches(&text("a")));
        assert!(!matcher.matches(&text("banana")));

        let matcher = CriteriaMatcher::new(&text("a*e"));
        assert!(matcher.matches(&text("apple")));
        assert!(matcher.matches(&text("ae")));
        assert!(!matcher.matches(&text("apples")));

        let matcher = CriteriaMatcher::new(&text("a?ple"));
        assert!(matcher.matches(&text("apple")));
        assert!(!matcher.matches(&text("aple")));

        let matcher = CriteriaMatcher::new(&text("a?p*"));
        assert!(matcher.matches(&text("app")));
        assert!(!matcher.matches(&text("ap")));
    }

    #[test]
    fn test_empty_and_error_criteria() {
        let matcher = CriteriaMatcher::new(&text(""));
        assert!(matcher.matches(&FormulaValue::Empty));
        assert!(matcher.matches(&text("")));
        assert!(!matcher.matches(&text("text")));
        assert!(!matcher.matches(&FormulaValue::Number(0.0)));

        let matcher = CriteriaMatcher::new(&FormulaValue::Error(sheetcraft_core::CellError::Na));
        assert!(!matcher.matches(&FormulaValue::Empty));
        assert!(!matcher.matches(&FormulaValue::Number(1.0)));
    }
}
