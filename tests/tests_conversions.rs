//! Type-conversion function tests.

use polars::df;
use polars::prelude::*;
use polars_formula::compile;

fn eval_on(frame: &DataFrame, formula: &str) -> DataFrame {
    let expr = compile(formula).unwrap_or_else(|e| panic!("compile {formula:?} failed: {e}"));
    frame
        .clone()
        .lazy()
        .select([expr.alias("out")])
        .collect()
        .unwrap_or_else(|e| panic!("evaluate {formula:?} failed: {e}"))
}

fn assert_formula(frame: &DataFrame, formula: &str, expected: DataFrame) {
    let result = eval_on(frame, formula);
    assert!(
        result.equals(&expected),
        "formula {formula:?}\nresult {result:?}\nexpected {expected:?}"
    );
}

#[test]
fn test_to_string() {
    let frame = df!("a" => [1i64, 2, 3]).unwrap();
    assert_formula(&frame, "to_string([a])", df!("out" => ["1", "2", "3"]).unwrap());
}

#[test]
fn test_to_integer() {
    let frame = df!("a" => [1.1f64, 2.2, 3.3]).unwrap();
    assert_formula(&frame, "to_integer([a])", df!("out" => [1i64, 2, 3]).unwrap());
}

#[test]
fn test_to_number_and_to_float() {
    let frame = df!("a" => ["1.1", "2.2", "3.3"]).unwrap();
    assert_formula(&frame, "to_number([a])", df!("out" => [1.1f64, 2.2, 3.3]).unwrap());
    assert_formula(&frame, "to_float([a])", df!("out" => [1.1f64, 2.2, 3.3]).unwrap());
}

#[test]
fn test_to_integer_of_to_float() {
    let frame = df!("a" => [1.1f64, 2.2, 3.3]).unwrap();
    assert_formula(
        &frame,
        "to_integer(to_float([a]))",
        df!("out" => [1i64, 2, 3]).unwrap(),
    );
}

#[test]
fn test_to_integer_of_nonnumeric_string_fails_at_evaluation() {
    let frame = df!("a" => ["1.1", "2.2", "3.3"]).unwrap();
    let expr = compile("to_integer([a])").unwrap();
    let result = frame.clone().lazy().select([expr]).collect();
    assert!(result.is_err());
}

#[test]
fn test_to_float_of_bad_string_fails_at_evaluation() {
    let frame = df!("a" => ["a", "2.2", "3.3"]).unwrap();
    let expr = compile("to_float([a])").unwrap();
    let result = frame.clone().lazy().select([expr]).collect();
    assert!(result.is_err());
}

#[test]
fn test_integer_column_to_boolean() {
    let frame = df!("a" => [1i64, 0, 1]).unwrap();
    assert_formula(&frame, "to_boolean([a])", df!("out" => [true, false, true]).unwrap());
}

#[test]
fn test_float_column_to_boolean() {
    let frame = df!("a" => [1.0f64, 0.0, 1.0]).unwrap();
    assert_formula(&frame, "to_boolean([a])", df!("out" => [true, false, true]).unwrap());
}

#[test]
fn test_literal_conversions() {
    let frame = df!("a" => [1i64]).unwrap();
    assert_formula(&frame, "to_boolean('True')", df!("out" => [true]).unwrap());
    assert_formula(&frame, "to_boolean(1)", df!("out" => [true]).unwrap());
    assert_formula(&frame, "to_boolean(1.0)", df!("out" => [true]).unwrap());
}

#[test]
fn test_to_date_roundtrip_through_parts() {
    let frame = df!("date" => ["2021-01-01", "2021-01-02", "2021-01-03"]).unwrap();
    let with_dates = frame
        .lazy()
        .select([col("date").str().to_date(StrptimeOptions::default())])
        .collect()
        .unwrap();
    let formula =
        "to_date(to_string(year([date])) + \"-\"+ to_string(month([date])) + \"-\" + to_string(day([date])))";
    let result = eval_on(&with_dates, formula);
    let expected = with_dates
        .lazy()
        .select([col("date").alias("out")])
        .collect()
        .unwrap();
    assert!(result.equals(&expected), "{result:?} vs {expected:?}");
}

#[test]
fn test_to_date_from_string_column() {
    let frame = df!("date" => ["2021-01-01", "2021-01-02", "2021-01-03"]).unwrap();
    let result = eval_on(&frame, "to_date([date])");
    let expected = frame
        .lazy()
        .select([col("date").str().to_date(StrptimeOptions::default()).alias("out")])
        .collect()
        .unwrap();
    assert!(result.equals(&expected), "{result:?} vs {expected:?}");
}
