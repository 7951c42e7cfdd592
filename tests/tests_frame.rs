//! Dataframe wrapper tests.

use polars::df;
use polars::prelude::*;
use polars_formula::ApplyExpression;

#[test]
fn test_dataframe_apply_expression() {
    let frame = df!("names" => ["Alice", "Bob"], "surnames" => ["Smith", "Jones"]).unwrap();
    let result = frame
        .apply_expression("concat([names], \" \", [surnames])", "full_name")
        .unwrap();
    let expected = df!(
        "names" => ["Alice", "Bob"],
        "surnames" => ["Smith", "Jones"],
        "full_name" => ["Alice Smith", "Bob Jones"]
    )
    .unwrap();
    assert!(result.equals(&expected), "{result:?} vs {expected:?}");
}

#[test]
fn test_lazyframe_apply_expression() {
    let frame = df!("names" => ["Alice", "Bob"], "surnames" => ["Smith", "Jones"]).unwrap();
    let result = frame
        .clone()
        .lazy()
        .apply_expression("concat([names], \" \", [surnames])", "full_name")
        .unwrap()
        .collect()
        .unwrap();
    let expected = df!(
        "names" => ["Alice", "Bob"],
        "surnames" => ["Smith", "Jones"],
        "full_name" => ["Alice Smith", "Bob Jones"]
    )
    .unwrap();
    assert!(result.equals(&expected), "{result:?} vs {expected:?}");
}

#[test]
fn test_apply_expression_broadcasts_literals() {
    let frame = df!("a" => [1i64, 2, 3]).unwrap();
    let result = frame.apply_expression("\"hello\"", "greeting").unwrap();
    let expected = df!(
        "a" => [1i64, 2, 3],
        "greeting" => ["hello", "hello", "hello"]
    )
    .unwrap();
    assert!(result.equals(&expected), "{result:?} vs {expected:?}");
}

#[test]
fn test_apply_expression_surfaces_compile_errors() {
    let frame = df!("a" => [1i64]).unwrap();
    let err = frame.apply_expression("if [a] then 1 else 2", "out");
    assert!(err.is_err());
}
