//! Text functions

use super::{flatten, optional_number, text_arg, FunctionResult};
use crate::value::FormulaValue;
use sheetcraft_core::CellError;

fn take_left(s: &str, n: usize) -> String {
    s.chars().take(n).collect()
}

fn take_right(s: &str, n: usize) -> String {
    let len = s.chars().count();
    if n >= len {
        return s.to_string();
    }
    s.chars().skip(len - n).collect()
}

/// Character count argument; negative counts are `#VALUE!`
fn char_count(args: &[FormulaValue], index: usize) -> Result<usize, CellError> {
    let n = optional_number(args, index, 1.0)?.trunc();
    if n < 0.0 {
        return Err(CellError::Value);
    }
    Ok(n as usize)
}

/// CONCAT(text1, [text2], ...) - also CONCATENATE
pub fn fn_concat(args: &[FormulaValue]) -> FunctionResult {
    let mut out = String::new();
    for (value, _) in flatten(args) {
        out.push_str(&value.to_text()?);
    }
    Ok(FormulaValue::String(out))
}

/// LEN(text)
pub fn fn_len(args: &[FormulaValue]) -> FunctionResult {
    let s = text_arg(args, 0)?;
    Ok(FormulaValue::Number(s.chars().count() as f64))
}

/// UPPER(text)
pub fn fn_upper(args: &[FormulaValue]) -> FunctionResult {
    Ok(FormulaValue::String(text_arg(args, 0)?.to_uppercase()))
}

/// LOWER(text)
pub fn fn_lower(args: &[FormulaValue]) -> FunctionResult {
    Ok(FormulaValue::String(text_arg(args, 0)?.to_lowercase()))
}

/// TRIM(text) - strips the ends and collapses inner runs of whitespace
pub fn fn_trim(args: &[FormulaValue]) -> FunctionResult {
    let s = text_arg(args, 0)?;
    let trimmed = s.split_whitespace().collect::<Vec<_>>().join(" ");
    Ok(FormulaValue::String(trimmed))
}

/// LEFT(text, [num_chars])
pub fn fn_left(args: &[FormulaValue]) -> FunctionResult {
    let s = text_arg(args, 0)?;
    let n = char_count(args, 1)?;
    Ok(FormulaValue::String(take_left(&s, n)))
}

/// RIGHT(text, [num_chars])
pub fn fn_right(args: &[FormulaValue]) -> FunctionResult {
    let s = text_arg(args, 0)?;
    let n = char_count(args, 1)?;
    Ok(FormulaValue::String(take_right(&s, n)))
}
