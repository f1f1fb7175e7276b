//! Tests for formula evaluation with cell references

use pretty_assertions::assert_eq;
use proptest::prelude::*;
use sheetcraft::prelude::*;
use sheetcraft::{dependents_of, evaluate, evaluate_formula, Evaluator, SyntaxErrorKind};

fn sheet(inputs: &[(&str, &str)]) -> Sheet {
    let mut sheet = Sheet::new();
    for (address, raw) in inputs {
        sheet.set_input(address, raw).unwrap();
    }
    sheet
}

fn addr(a1: &str) -> CellAddress {
    CellAddress::parse(a1).unwrap()
}

/// The employee table used by the lookup exercises
fn employees() -> Sheet {
    sheet(&[
        ("A1", "ID"),
        ("B1", "Nama"),
        ("C1", "Departemen"),
        ("D1", "Gaji"),
        ("A2", "101"),
        ("B2", "Andi"),
        ("C2", "Sales"),
        ("D2", "7500000"),
        ("A3", "102"),
        ("B3", "Budi"),
        ("C3", "IT"),
        ("D3", "8000000"),
        ("A4", "103"),
        ("B4", "Citra"),
        ("C4", "Finance"),
        ("D4", "9000000"),
        ("A5", "104"),
        ("B5", "Dewi"),
        ("C5", "HR"),
        ("D5", "6500000"),
        ("A6", "105"),
        ("B6", "Eko"),
        ("C6", "IT"),
        ("D6", "8500000"),
    ])
}

/// Test basic formula evaluation without cell references
#[test]
fn test_evaluate_simple_formulas() {
    let s = Sheet::new();

    // Arithmetic
    assert_eq!(evaluate_formula(&s, "=1+2*3"), Ok(FormulaValue::Number(7.0)));

    // String concatenation
    assert_eq!(
        evaluate_formula(&s, "=\"Hello \"&\"World\""),
        Ok(FormulaValue::from("Hello World"))
    );

    // Comparison
    assert_eq!(evaluate_formula(&s, "=5>3"), Ok(FormulaValue::Boolean(true)));
}

/// SUM skips text and blanks in ranges
#[test]
fn test_sum_ignores_text_and_blanks() {
    let s = sheet(&[("A1", "10"), ("A2", "hello"), ("A3", "20"), ("A4", "30"), ("A5", "50")]);
    assert_eq!(evaluate_formula(&s, "=SUM(A1:A5)"), Ok(FormulaValue::Number(110.0)));

    let s = sheet(&[("A1", "10"), ("A3", "20"), ("A4", "30"), ("A5", "50")]);
    assert_eq!(evaluate_formula(&s, "=SUM(A1:A5)"), Ok(FormulaValue::Number(110.0)));
}

#[test]
fn test_sum_of_two_ranges() {
    let s = sheet(&[("A1", "10"), ("A2", "20"), ("A3", "30"), ("C1", "5"), ("C2", "10")]);
    assert_eq!(
        evaluate_formula(&s, "=SUM(A1:A3,C1:C2)"),
        Ok(FormulaValue::Number(75.0))
    );
}

#[test]
fn test_vlookup_exercises() {
    let mut s = employees();
    s.set_input("F2", "=VLOOKUP(103, $A$2:$D$6, 2, FALSE)").unwrap();
    s.set_input("F3", "=VLOOKUP(999, $A$2:$D$6, 2, FALSE)").unwrap();
    s.set_input(
        "F4",
        "=IFERROR(VLOOKUP(999, $A$2:$D$6, 2, FALSE), \"Tidak Ditemukan\")",
    )
    .unwrap();
    s.set_input("F5", "=VLOOKUP(103, $A$2:$D$6, 7, FALSE)").unwrap();

    assert_eq!(evaluate(&s, addr("F2")), Ok(FormulaValue::from("Citra")));

    let miss = evaluate(&s, addr("F3")).unwrap_err();
    assert_eq!(miss.kind(), Some(CellError::Na));
    assert_eq!(miss.display_value(), "#N/A");
    assert!(miss.suggestion().is_some());

    assert_eq!(
        evaluate(&s, addr("F4")),
        Ok(FormulaValue::from("Tidak Ditemukan"))
    );
    assert_eq!(evaluate(&s, addr("F5")).unwrap_err().kind(), Some(CellError::Ref));
}

#[test]
fn test_salary_report() {
    let s = employees();

    assert_eq!(
        evaluate_formula(&s, "=SUMIF(C2:C6, \"IT\", D2:D6)"),
        Ok(FormulaValue::Number(16_500_000.0))
    );
    assert_eq!(
        evaluate_formula(&s, "=COUNTIF(D2:D6, \">=8000000\")"),
        Ok(FormulaValue::Number(3.0))
    );
    assert_eq!(
        evaluate_formula(&s, "=AVERAGEIF(C2:C6, \"IT\", D2:D6)"),
        Ok(FormulaValue::Number(8_250_000.0))
    );
    assert_eq!(
        evaluate_formula(&s, "=IF(AVERAGE(D2:D6)>8000000, \"tinggi\", \"normal\")"),
        Ok(FormulaValue::from("normal"))
    );
    assert_eq!(
        evaluate_formula(&s, "=INDEX(B2:B6, MATCH(\"HR\", C2:C6, 0))"),
        Ok(FormulaValue::from("Dewi"))
    );
    assert_eq!(
        evaluate_formula(&s, "=UPPER(LEFT(B4, 3))&\"-\"&A4"),
        Ok(FormulaValue::from("CIT-103"))
    );
}

/// Test formula evaluation with range references
#[test]
fn test_evaluate_with_range_references() {
    let s = sheet(&[("A1", "10"), ("A2", "20"), ("A3", "30")]);

    assert_eq!(evaluate_formula(&s, "=SUM(A1:A3)"), Ok(FormulaValue::Number(60.0)));
    assert_eq!(evaluate_formula(&s, "=AVERAGE(A1:A3)"), Ok(FormulaValue::Number(20.0)));
    assert_eq!(evaluate_formula(&s, "=MIN(A1:A3)"), Ok(FormulaValue::Number(10.0)));
    assert_eq!(evaluate_formula(&s, "=MAX(A1:A3)"), Ok(FormulaValue::Number(30.0)));
}

#[test]
fn test_reversed_range_is_normalized() {
    let mut s = Sheet::new();
    for (i, address) in ["A1", "B2", "C3", "C5", "A5"].iter().enumerate() {
        s.set_input(address, &(i + 1).to_string()).unwrap();
    }

    assert_eq!(
        evaluate_formula(&s, "=SUM(C5:A1)"),
        evaluate_formula(&s, "=SUM(A1:C5)")
    );
    assert_eq!(evaluate_formula(&s, "=SUM(C5:A1)"), Ok(FormulaValue::Number(15.0)));
    assert_eq!(
        evaluate_formula(&s, "=COUNT(A5:C1)"),
        Ok(FormulaValue::Number(5.0))
    );
}

/// Test complex nested formulas
#[test]
fn test_evaluate_complex_formulas() {
    let s = sheet(&[("A1", "100"), ("A2", "50"), ("B1", "0.1")]);

    // IF A1 > A2, 10% of A1, else 10% of A2
    assert_eq!(
        evaluate_formula(&s, "=IF(A1>A2,A1*B1,A2*B1)"),
        Ok(FormulaValue::Number(10.0))
    );

    // Nested SUM and multiplication
    assert_eq!(
        evaluate_formula(&s, "=SUM(A1,A2)*B1"),
        Ok(FormulaValue::Number(15.0))
    );
}

/// Test error propagation in formulas
#[test]
fn test_error_propagation() {
    let s = Sheet::new();

    let error = evaluate_formula(&s, "=1/0").unwrap_err();
    assert_eq!(error.kind(), Some(CellError::Div0));
    assert_eq!(error.display_value(), "#DIV/0!");

    // Error in arithmetic propagates
    assert_eq!(
        evaluate_formula(&s, "=1/0+5").unwrap_err().kind(),
        Some(CellError::Div0)
    );
    assert_eq!(
        evaluate_formula(&s, "=SUM(1, NOSUCH(2))").unwrap_err().display_value(),
        "#NAME?"
    );
    assert_eq!(
        evaluate_formula(&s, "=SQRT(-4)").unwrap_err().kind(),
        Some(CellError::Num)
    );
}

/// Test empty cell handling
#[test]
fn test_empty_cell_handling() {
    let s = sheet(&[("A1", "10"), ("A3", "30")]);

    // Empty cells are 0 in arithmetic and "" in concatenation
    assert_eq!(evaluate_formula(&s, "=A1+A2"), Ok(FormulaValue::Number(10.0)));
    assert_eq!(evaluate_formula(&s, "=\"[\"&A2&\"]\""), Ok(FormulaValue::from("[]")));

    // SUM ignores empty cells
    assert_eq!(evaluate_formula(&s, "=SUM(A1:A3)"), Ok(FormulaValue::Number(40.0)));

    // A blank cell evaluates to Empty, a formula reading it to 0
    assert_eq!(evaluate(&s, addr("A2")), Ok(FormulaValue::Empty));
}

/// Test boolean functions
#[test]
fn test_boolean_functions() {
    let s = Sheet::new();

    assert_eq!(evaluate_formula(&s, "=AND(TRUE,TRUE,TRUE)"), Ok(FormulaValue::Boolean(true)));
    assert_eq!(evaluate_formula(&s, "=AND(TRUE,FALSE,TRUE)"), Ok(FormulaValue::Boolean(false)));
    assert_eq!(evaluate_formula(&s, "=OR(FALSE,FALSE,TRUE)"), Ok(FormulaValue::Boolean(true)));
    assert_eq!(evaluate_formula(&s, "=NOT(FALSE)"), Ok(FormulaValue::Boolean(true)));
    assert_eq!(
        evaluate_formula(&s, "=AND(NOT(FALSE),OR(TRUE(),0))"),
        Ok(FormulaValue::Boolean(true))
    );
}

#[test]
fn test_circular_references() {
    let s = sheet(&[("A1", "=A1"), ("B1", "=C1"), ("C1", "=B1"), ("D1", "=E1*2"), ("E1", "4")]);

    for cell in ["A1", "B1", "C1"] {
        let error = evaluate(&s, addr(cell)).unwrap_err();
        assert_eq!(error.kind(), Some(CellError::Circular));
        assert_eq!(error.display_value(), "#REF!");
    }
    assert_eq!(evaluate(&s, addr("D1")), Ok(FormulaValue::Number(8.0)));
}

#[test]
fn test_deep_chain_fails_gracefully() {
    let mut s = Sheet::with_settings(SheetSettings::new(2000, 1).unwrap()).unwrap();
    for row in 1..2000 {
        s.set_input(&format!("A{}", row), &format!("=A{}+1", row + 1)).unwrap();
    }
    s.set_input("A2000", "1").unwrap();

    assert_eq!(
        evaluate(&s, addr("A1")).unwrap_err().kind(),
        Some(CellError::Ref)
    );
    // A chain inside the budget still computes
    assert_eq!(evaluate(&s, addr("A1900")), Ok(FormulaValue::Number(101.0)));
}

#[test]
fn test_deep_formulas_across_a_chain_fail_gracefully() {
    let mut s = Sheet::new();
    for row in 1..100 {
        let formula = format!("={}A{}{}", "ABS(".repeat(120), row + 1, ")".repeat(120));
        s.set_input(&format!("A{}", row), &formula).unwrap();
    }
    s.set_input("A100", "1").unwrap();

    assert_eq!(
        evaluate(&s, addr("A1")).unwrap_err().kind(),
        Some(CellError::Ref)
    );

    // Recalculation works precedents first, so every cell computes
    let stats = s.calculate().unwrap();
    assert_eq!(stats.errors, 0);
    assert_eq!(s.get_value("A1").unwrap(), CellValue::Number(1.0));
}

#[test]
fn test_long_operator_chain_is_a_syntax_error() {
    let formula = format!("=1{}", "+1".repeat(10_000));
    let error = evaluate_formula(&Sheet::new(), &formula).unwrap_err();
    assert!(error.is_syntax());
    assert_eq!(error.display_value(), "#ERROR!");
}

#[test]
fn test_long_dependency_chain_recalculates() {
    let rows = 50_000;
    let mut s = Sheet::with_settings(SheetSettings::new(rows, 1).unwrap()).unwrap();
    s.set_input("A1", "1").unwrap();
    for row in 2..=rows {
        s.set_input(&format!("A{}", row), &format!("=A{}+1", row - 1)).unwrap();
    }

    let stats = s.calculate().unwrap();
    assert_eq!(stats.cells_calculated, rows as usize - 1);
    assert_eq!(stats.errors, 0);
    assert_eq!(
        s.get_value(&format!("A{}", rows)).unwrap(),
        CellValue::Number(rows as f64)
    );

    assert_eq!(dependents_of(&s, addr("A1")).len(), rows as usize - 1);
}

#[test]
fn test_syntax_errors_are_distinct() {
    let s = sheet(&[("A1", "=SUM(1,2"), ("A2", "=A1+1")]);

    let error = evaluate(&s, addr("A1")).unwrap_err();
    assert!(error.is_syntax());
    assert_eq!(error.kind(), None);
    match error {
        FormulaError::Syntax(e) => assert_eq!(e.kind, SyntaxErrorKind::MissingParenthesis),
        other => panic!("Expected syntax error, got {:?}", other),
    }

    assert_eq!(evaluate(&s, addr("A2")).unwrap_err().kind(), Some(CellError::Value));
}

#[test]
fn test_literal_text_is_never_parsed() {
    let s = sheet(&[("A1", "SUM(1,2"), ("A2", "'=1")]);
    assert_eq!(evaluate(&s, addr("A1")), Ok(FormulaValue::from("SUM(1,2")));
    assert_eq!(evaluate(&s, addr("A2")), Ok(FormulaValue::from("'=1")));
}

#[test]
fn test_calculate_then_read_cached_values() {
    let mut s = employees();
    s.set_input("F1", "=SUM(D2:D6)").unwrap();
    s.set_input("F2", "=F1/COUNT(D2:D6)").unwrap();
    s.set_input("F3", "=VLOOKUP(999, A2:D6, 2, FALSE)").unwrap();

    let stats = s.calculate().unwrap();
    assert_eq!(stats.formula_count, 3);
    assert_eq!(stats.errors, 1);

    assert_eq!(s.get_value("F1").unwrap(), CellValue::Number(39_500_000.0));
    assert_eq!(s.get_value("F2").unwrap(), CellValue::Number(7_900_000.0));
    assert_eq!(s.get_value("F3").unwrap(), CellValue::Error(CellError::Na));

    // Direct evaluation agrees with the cache
    assert_eq!(evaluate(&s, addr("F2")), Ok(FormulaValue::Number(7_900_000.0)));
}

fn cell_name() -> impl Strategy<Value = String> {
    (0u32..5, 0u16..4).prop_map(|(row, col)| CellAddress::new(row, col).to_a1_string())
}

fn cell_input() -> impl Strategy<Value = String> {
    prop_oneof![
        (-100i32..100).prop_map(|n| n.to_string()),
        Just("text".to_string()),
        (cell_name(), cell_name()).prop_map(|(a, b)| format!("={}+{}", a, b)),
        (cell_name(), cell_name()).prop_map(|(a, b)| format!("=SUM({}:{})", a, b)),
        (cell_name(), cell_name()).prop_map(|(a, b)| format!("=IFERROR({}/{}, 0)", a, b)),
        cell_name().prop_map(|a| format!("=IF({}>0, {}, \"neg\")", a, a)),
    ]
}

proptest! {
    #[test]
    fn evaluation_is_deterministic(inputs in prop::collection::vec((cell_name(), cell_input()), 0..15)) {
        let mut s = Sheet::new();
        for (address, raw) in &inputs {
            s.set_input(address, raw).unwrap();
        }

        let addresses: Vec<CellAddress> = (0..5u32)
            .flat_map(|row| (0..4u16).map(move |col| CellAddress::new(row, col)))
            .collect();

        let forward: Vec<FormulaResult> = {
            let evaluator = Evaluator::new(&s);
            addresses.iter().map(|a| evaluator.evaluate_cell(*a)).collect()
        };
        let backward: Vec<FormulaResult> = {
            let evaluator = Evaluator::new(&s);
            let mut results: Vec<_> = addresses.iter().rev().map(|a| evaluator.evaluate_cell(*a)).collect();
            results.reverse();
            results
        };
        let isolated: Vec<FormulaResult> = addresses.iter().map(|a| evaluate(&s, *a)).collect();

        prop_assert_eq!(&forward, &backward);
        prop_assert_eq!(&forward, &isolated);
    }

    #[test]
    fn reversed_ranges_aggregate_identically(
        values in prop::collection::vec(-1000i32..1000, 20),
        a in cell_name(),
        b in cell_name(),
    ) {
        let mut s = Sheet::new();
        for (i, value) in values.iter().enumerate() {
            s.set_value_at(i as u32 / 4, (i % 4) as u16, f64::from(*value)).unwrap();
        }

        prop_assert_eq!(
            evaluate_formula(&s, &format!("=SUM({}:{})", a, b)),
            evaluate_formula(&s, &format!("=SUM({}:{})", b, a))
        );
    }
}
