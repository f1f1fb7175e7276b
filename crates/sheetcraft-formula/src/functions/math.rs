//! Math functions

use super::criteria::CriteriaMatcher;
use super::{
    arg, collect_numbers, finite, flatten, grid, number_arg, optional_number, single,
    FunctionResult,
};
use crate::value::FormulaValue;
use sheetcraft_core::{parse_number, CellError};

/// SUM(number1, [number2], ...)
///
/// Referenced text and blanks are skipped; text typed as an argument must be numeric.
pub fn fn_sum(args: &[FormulaValue]) -> FunctionResult {
    finite(collect_numbers(args)?.iter().sum())
}

/// AVERAGE(number1, [number2], ...)
pub fn fn_average(args: &[FormulaValue]) -> FunctionResult {
    let numbers = collect_numbers(args)?;
    if numbers.is_empty() {
        return Err(CellError::Div0);
    }
    finite(numbers.iter().sum::<f64>() / numbers.len() as f64)
}

/// MIN(number1, [number2], ...) - 0 when there are no numbers
pub fn fn_min(args: &[FormulaValue]) -> FunctionResult {
    let min = collect_numbers(args)?.into_iter().reduce(f64::min);
    Ok(FormulaValue::Number(min.unwrap_or(0.0)))
}

/// MAX(number1, [number2], ...) - 0 when there are no numbers
pub fn fn_max(args: &[FormulaValue]) -> FunctionResult {
    let max = collect_numbers(args)?.into_iter().reduce(f64::max);
    Ok(FormulaValue::Number(max.unwrap_or(0.0)))
}

/// PRODUCT(number1, [number2], ...) - 0 when there are no numbers
pub fn fn_product(args: &[FormulaValue]) -> FunctionResult {
    let numbers = collect_numbers(args)?;
    if numbers.is_empty() {
        return Ok(FormulaValue::Number(0.0));
    }
    finite(numbers.iter().product())
}

/// COUNT(value1, [value2], ...)
///
/// Counts numbers. Direct arguments also count when they are booleans or
/// numeric text. Errors are not counted and do not propagate.
pub fn fn_count(args: &[FormulaValue]) -> FunctionResult {
    let count = flatten(args)
        .filter(|(value, in_array)| match value {
            FormulaValue::Number(_) => true,
            FormulaValue::Boolean(_) => !in_array,
            FormulaValue::String(s) => !in_array && parse_number(s).is_some(),
            _ => false,
        })
        .count();

    Ok(FormulaValue::Number(count as f64))
}

/// ABS(number)
pub fn fn_abs(args: &[FormulaValue]) -> FunctionResult {
    Ok(FormulaValue::Number(number_arg(args, 0)?.abs()))
}

/// ROUND(number, [num_digits]) - half away from zero
pub fn fn_round(args: &[FormulaValue]) -> FunctionResult {
    let number = number_arg(args, 0)?;
    let digits = optional_number(args, 1, 0.0)?.trunc();

    finite(round_half_away(number, digits as i32))
}

fn round_half_away(number: f64, digits: i32) -> f64 {
    if digits > 15 {
        return number;
    }
    if digits >= 0 {
        let multiplier = 10_f64.powi(digits);
        (number * multiplier).round() / multiplier
    } else {
        let divisor = 10_f64.powi(-digits.max(-300));
        (number / divisor).round() * divisor
    }
}

/// INT(number) - rounds down toward negative infinity
pub fn fn_int(args: &[FormulaValue]) -> FunctionResult {
    Ok(FormulaValue::Number(number_arg(args, 0)?.floor()))
}

/// MOD(number, divisor) - the result has the sign of the divisor
pub fn fn_mod(args: &[FormulaValue]) -> FunctionResult {
    let number = number_arg(args, 0)?;
    let divisor = number_arg(args, 1)?;

    if divisor == 0.0 {
        return Err(CellError::Div0);
    }

    finite(number - divisor * (number / divisor).floor())
}

/// POWER(number, power)
pub fn fn_power(args: &[FormulaValue]) -> FunctionResult {
    let base = number_arg(args, 0)?;
    let exponent = number_arg(args, 1)?;
    power(base, exponent)
}

/// `base ^ exponent`; 0^0 and non-finite results are `#NUM!`, 0 to a negative power is `#DIV/0!`
pub(crate) fn power(base: f64, exponent: f64) -> FunctionResult {
    if base == 0.0 {
        if exponent == 0.0 {
            return Err(CellError::Num);
        }
        if exponent < 0.0 {
            return Err(CellError::Div0);
        }
    }
    finite(base.powf(exponent))
}

/// SQRT(number) - negative numbers are `#NUM!`
pub fn fn_sqrt(args: &[FormulaValue]) -> FunctionResult {
    let n = number_arg(args, 0)?;
    if n < 0.0 {
        return Err(CellError::Num);
    }
    Ok(FormulaValue::Number(n.sqrt()))
}

/// SUMIF(range, criteria, [sum_range])
///
/// Sums the cells of `sum_range` (or `range`) whose counterpart in `range`
/// matches the criteria. `sum_range` is read from its top-left corner with the
/// shape of `range`.
pub fn fn_sumif(args: &[FormulaValue]) -> FunctionResult {
    let range = grid(arg(args, 0)?)?;
    let matcher = CriteriaMatcher::new(single(arg(args, 1)?)?);
    let sum_range = match args.get(2) {
        Some(v) => grid(v)?,
        None => range.clone(),
    };

    let mut sum = 0.0;
    for (row_idx, row) in range.iter().enumerate() {
        for (col_idx, cell) in row.iter().enumerate() {
            if !matcher.matches(cell) {
                continue;
            }
            match sum_range.get(row_idx).and_then(|r| r.get(col_idx)) {
                Some(FormulaValue::Number(n)) => sum += n,
                Some(FormulaValue::Error(e)) => return Err(*e),
                // Non-numeric values are ignored
                _ => {}
            }
        }
    }

    finite(sum)
}
