//! Counting and conditional aggregate functions

use super::criteria::CriteriaMatcher;
use super::{arg, finite, flatten, grid, single, FunctionResult};
use crate::value::FormulaValue;
use sheetcraft_core::CellError;

/// COUNTA(value1, [value2], ...) - Counts non-empty values
///
/// Numbers, text, booleans and errors all count; blanks and empty text do not.
pub fn fn_counta(args: &[FormulaValue]) -> FunctionResult {
    let count = flatten(args)
        .filter(|(value, _)| match value {
            FormulaValue::Empty => false,
            FormulaValue::String(s) => !s.is_empty(),
            _ => true,
        })
        .count();

    Ok(FormulaValue::Number(count as f64))
}

/// COUNTBLANK(range) - Counts blank cells and empty text
pub fn fn_countblank(args: &[FormulaValue]) -> FunctionResult {
    let count = flatten(args)
        .filter(|(value, _)| match value {
            FormulaValue::Empty => true,
            FormulaValue::String(s) => s.is_empty(),
            _ => false,
        })
        .count();

    Ok(FormulaValue::Number(count as f64))
}

/// COUNTIF(range, criteria) - Counts cells that meet a criteria
pub fn fn_countif(args: &[FormulaValue]) -> FunctionResult {
    let range = grid(arg(args, 0)?)?;
    let matcher = CriteriaMatcher::new(single(arg(args, 1)?)?);

    let count = range
        .iter()
        .flat_map(|row| row.iter())
        .filter(|cell| matcher.matches(cell))
        .count();

    Ok(FormulaValue::Number(count as f64))
}

/// AVERAGEIF(range, criteria, [average_range])
///
/// `#DIV/0!` when no matching cell holds a number.
pub fn fn_averageif(args: &[FormulaValue]) -> FunctionResult {
    let range = grid(arg(args, 0)?)?;
    let matcher = CriteriaMatcher::new(single(arg(args, 1)?)?);
    let avg_range = match args.get(2) {
        Some(v) => grid(v)?,
        None => range.clone(),
    };

    let mut sum = 0.0;
    let mut count = 0usize;

    for (row_idx, row) in range.iter().enumerate() {
        for (col_idx, cell) in row.iter().enumerate() {
            if !matcher.matches(cell) {
                continue;
            }
            match avg_range.get(row_idx).and_then(|r| r.get(col_idx)) {
                Some(FormulaValue::Number(n)) => {
                    sum += n;
                    count += 1;
                }
                Some(FormulaValue::Error(e)) => return Err(*e),
                _ => {}
            }
        }
    }

    if count == 0 {
        Err(CellError::Div0)
    } else {
        finite(sum / count as f64)
    }
}
