//! Information functions

use super::{arg, FunctionResult};
use crate::value::FormulaValue;
use sheetcraft_core::CellError;

fn check(args: &[FormulaValue], test: fn(&FormulaValue) -> bool) -> FunctionResult {
    let v = arg(args, 0)?;
    if matches!(v, FormulaValue::Array(_)) {
        return Err(CellError::Value);
    }
    Ok(FormulaValue::Boolean(test(v)))
}

/// ISBLANK(value)
pub fn fn_isblank(args: &[FormulaValue]) -> FunctionResult {
    check(args, |v| matches!(v, FormulaValue::Empty))
}

/// ISNUMBER(value)
pub fn fn_isnumber(args: &[FormulaValue]) -> FunctionResult {
    check(args, |v| matches!(v, FormulaValue::Number(_)))
}

/// ISTEXT(value)
pub fn fn_istext(args: &[FormulaValue]) -> FunctionResult {
    check(args, |v| matches!(v, FormulaValue::String(_)))
}

/// ISERROR(value)
pub fn fn_iserror(args: &[FormulaValue]) -> FunctionResult {
    check(args, |v| matches!(v, FormulaValue::Error(_)))
}

/// ISNA(value)
pub fn fn_isna(args: &[FormulaValue]) -> FunctionResult {
    check(args, |v| matches!(v, FormulaValue::Error(CellError::Na)))
}

/// NA()
pub fn fn_na(_args: &[FormulaValue]) -> FunctionResult {
    Err(CellError::Na)
}
