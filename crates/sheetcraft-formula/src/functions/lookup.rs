//! Lookup functions

use super::{arg, bool_arg, grid, number_arg, scalar, FunctionResult};
use crate::value::{compare_values, values_equal, FormulaValue};
use sheetcraft_core::CellError;
use std::cmp::Ordering;

fn array_dims(arr: &[Vec<FormulaValue>]) -> (usize, usize) {
    let rows = arr.len();
    let cols = arr.first().map(|r| r.len()).unwrap_or(0);
    (rows, cols)
}

/// 1-based position argument truncated toward zero
fn position_arg(args: &[FormulaValue], index: usize) -> Result<i64, CellError> {
    Ok(number_arg(args, index)?.trunc() as i64)
}

/// Position of the last value of the key's type that does not pass the key
///
/// Ascending data: greatest value <= key. Descending data: smallest value >= key.
/// Scanning stops at the first value that passes the key.
fn approximate_position<'a>(
    values: impl Iterator<Item = &'a FormulaValue>,
    key: &FormulaValue,
    descending: bool,
) -> Option<usize> {
    let past = if descending {
        Ordering::Less
    } else {
        Ordering::Greater
    };

    let mut best = None;
    for (i, value) in values.enumerate() {
        if matches!(value, FormulaValue::Empty) || !value.same_type_class(key) {
            continue;
        }
        if compare_values(value, key) == past {
            break;
        }
        best = Some(i);
    }
    best
}

/// Position of the first value equal to the key
///
/// Blank keys and blank members never match.
fn exact_position<'a>(
    mut values: impl Iterator<Item = &'a FormulaValue>,
    key: &FormulaValue,
) -> Option<usize> {
    if matches!(key, FormulaValue::Empty) {
        return None;
    }
    values.position(|value| !matches!(value, FormulaValue::Empty) && values_equal(value, key))
}

/// VLOOKUP(lookup_value, table_array, col_index_num, [range_lookup])
///
/// `range_lookup` FALSE (or 0) searches for an exact match; TRUE, 1 or
/// omitted assumes the first column is sorted ascending and takes the last
/// row whose key is <= the lookup value.
pub fn fn_vlookup(args: &[FormulaValue]) -> FunctionResult {
    let key = scalar(args, 0)?;
    let table = grid(arg(args, 1)?)?;
    let col_index = position_arg(args, 2)?;
    let approximate = match args.get(3) {
        Some(_) => bool_arg(args, 3)?,
        None => true,
    };

    if col_index < 1 {
        return Err(CellError::Value);
    }
    let (rows, cols) = array_dims(&table);
    let col = (col_index - 1) as usize;
    if col >= cols {
        return Err(CellError::Ref);
    }
    if rows == 0 {
        return Err(CellError::Na);
    }

    let first_column = table.iter().map(|row| &row[0]);
    let found = if approximate {
        approximate_position(first_column, key, false)
    } else {
        exact_position(first_column, key)
    };

    match found {
        Some(row) => Ok(table[row][col].clone()),
        None => Err(CellError::Na),
    }
}

/// INDEX(array, row_num, [column_num])
///
/// Positions are 1-based. A single-row array takes `INDEX(array, n)` as the
/// column position.
pub fn fn_index(args: &[FormulaValue]) -> FunctionResult {
    let table = grid(arg(args, 0)?)?;
    let (rows, cols) = array_dims(&table);

    let (row_num, col_num) = match args.get(2) {
        Some(_) => (position_arg(args, 1)?, position_arg(args, 2)?),
        None if rows == 1 && cols > 1 => (1, position_arg(args, 1)?),
        None => (position_arg(args, 1)?, 1),
    };

    if row_num < 1 || col_num < 1 {
        return Err(CellError::Value);
    }

    let r = (row_num - 1) as usize;
    let c = (col_num - 1) as usize;
    if r >= rows || c >= cols {
        return Err(CellError::Ref);
    }
    Ok(table[r][c].clone())
}

/// MATCH(lookup_value, lookup_array, [match_type])
///
/// `match_type` 0 finds an exact match, 1 (default) the greatest value <= key
/// in ascending data and -1 the smallest value >= key in descending data.
/// The array must be a single row or a single column.
pub fn fn_match(args: &[FormulaValue]) -> FunctionResult {
    let key = scalar(args, 0)?;
    let table = grid(arg(args, 1)?)?;
    let match_type = match args.get(2) {
        Some(_) => number_arg(args, 2)?,
        None => 1.0,
    };

    let (rows, cols) = array_dims(&table);
    let values: Vec<&FormulaValue> = if rows == 1 {
        table[0].iter().collect()
    } else if cols == 1 {
        table.iter().map(|row| &row[0]).collect()
    } else {
        return Err(CellError::Na);
    };

    let found = if match_type == 0.0 {
        exact_position(values.into_iter(), key)
    } else {
        approximate_position(values.into_iter(), key, match_type < 0.0)
    };

    found
        .map(|i| FormulaValue::Number((i + 1) as f64))
        .ok_or(CellError::Na)
}
