//! Logical functions

use super::{bool_arg, flatten, FunctionResult};
use crate::ast::FormulaExpr;
use crate::evaluator::Evaluator;
use crate::value::FormulaValue;
use sheetcraft_core::CellError;

fn expr_arg(args: &[FormulaExpr], index: usize) -> Result<&FormulaExpr, CellError> {
    args.get(index).ok_or(CellError::Value)
}

/// IF(condition, value_if_true, [value_if_false])
///
/// Only the chosen branch is evaluated. A missing else branch gives FALSE.
pub fn fn_if(args: &[FormulaExpr], evaluator: &Evaluator<'_>) -> FunctionResult {
    let condition = evaluator
        .evaluate_expr(expr_arg(args, 0)?)
        .into_scalar()
        .to_bool()?;

    let branch = if condition { args.get(1) } else { args.get(2) };
    match branch {
        Some(expr) => Ok(evaluator.evaluate_expr(expr)),
        None => Ok(FormulaValue::Boolean(false)),
    }
}

/// IFERROR(value, value_if_error) - Any error in `value` gives the evaluated fallback
pub fn fn_iferror(args: &[FormulaExpr], evaluator: &Evaluator<'_>) -> FunctionResult {
    let value = evaluator.evaluate_expr(expr_arg(args, 0)?).into_scalar();

    match value {
        FormulaValue::Error(_) => Ok(evaluator.evaluate_expr(expr_arg(args, 1)?)),
        other => Ok(other),
    }
}

/// IFNA(value, value_if_na) - Like IFERROR but only catches `#N/A`
pub fn fn_ifna(args: &[FormulaExpr], evaluator: &Evaluator<'_>) -> FunctionResult {
    let value = evaluator.evaluate_expr(expr_arg(args, 0)?).into_scalar();

    match value {
        FormulaValue::Error(CellError::Na) => Ok(evaluator.evaluate_expr(expr_arg(args, 1)?)),
        other => Ok(other),
    }
}

/// Truth values of the arguments; referenced text and blanks are skipped
fn logical_values(args: &[FormulaValue]) -> Result<Vec<bool>, CellError> {
    let mut values = Vec::new();

    for (value, in_array) in flatten(args) {
        match value {
            FormulaValue::Boolean(b) => values.push(*b),
            FormulaValue::Number(n) => values.push(*n != 0.0),
            FormulaValue::Error(e) => return Err(*e),
            _ if in_array => {}
            FormulaValue::String(_) => values.push(value.to_bool()?),
            _ => {}
        }
    }

    // Nothing to test at all
    if values.is_empty() {
        return Err(CellError::Value);
    }
    Ok(values)
}

/// AND(logical1, [logical2], ...)
pub fn fn_and(args: &[FormulaValue]) -> FunctionResult {
    Ok(FormulaValue::Boolean(logical_values(args)?.into_iter().all(|b| b)))
}

/// OR(logical1, [logical2], ...)
pub fn fn_or(args: &[FormulaValue]) -> FunctionResult {
    Ok(FormulaValue::Boolean(logical_values(args)?.into_iter().any(|b| b)))
}

/// NOT(logical)
pub fn fn_not(args: &[FormulaValue]) -> FunctionResult {
    Ok(FormulaValue::Boolean(!bool_arg(args, 0)?))
}

/// TRUE()
pub fn fn_true(_args: &[FormulaValue]) -> FunctionResult {
    Ok(FormulaValue::Boolean(true))
}

/// FALSE()
pub fn fn_false(_args: &[FormulaValue]) -> FunctionResult {
    Ok(FormulaValue::Boolean(false))
}
