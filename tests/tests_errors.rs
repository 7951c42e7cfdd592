//! Error taxonomy tests: each failure mode surfaces as its own variant, with
//! a best-effort offset where one exists.

use polars_formula::{
    compile, CallError, CallResult, Category, CompileError, Compiler, FunctionRegistry,
    FunctionSpec, ParamType, Params, Value,
};

#[test]
fn test_unbalanced_quote_is_preprocess_error() {
    let err = compile("concat('open, [a])").unwrap_err();
    assert!(matches!(err, CompileError::Preprocess { .. }), "{err}");
}

#[test]
fn test_unclosed_column_reference_is_preprocess_error() {
    let err = compile("[open + 1").unwrap_err();
    assert!(matches!(err, CompileError::Preprocess { .. }), "{err}");
    assert!(err.offset().is_some());
}

#[test]
fn test_illegal_character_is_tokenize_error() {
    let err = compile("[a] ; 1").unwrap_err();
    assert!(matches!(err, CompileError::Tokenize { .. }), "{err}");
}

#[test]
fn test_lone_bang_is_tokenize_error() {
    let err = compile("[a] ! 1").unwrap_err();
    assert!(matches!(err, CompileError::Tokenize { .. }), "{err}");
}

#[test]
fn test_consecutive_minus_is_classify_error() {
    let err = compile("[a] - - 1").unwrap_err();
    assert!(matches!(err, CompileError::Classify { .. }), "{err}");
}

#[test]
fn test_separator_outside_call_is_unexpected_token() {
    let err = compile("1, 2").unwrap_err();
    assert!(matches!(err, CompileError::UnexpectedToken { .. }), "{err}");
}

#[test]
fn test_conditional_without_else_is_rejected() {
    let err = compile("if [a] > 1 then 2 endif").unwrap_err();
    assert!(matches!(err, CompileError::UnexpectedToken { .. }), "{err}");
}

#[test]
fn test_stray_operator_is_unexpected_token() {
    let err = compile("[a] +").unwrap_err();
    assert!(matches!(err, CompileError::UnexpectedToken { .. }), "{err}");
}

#[test]
fn test_function_without_bracket_is_missing_bracket() {
    let err = compile("concat + 1").unwrap_err();
    assert!(matches!(err, CompileError::MissingBracket { .. }), "{err}");
}

#[test]
fn test_unclosed_conditional_is_missing_endif() {
    let err = compile("if [a] > 1 then 2 else 3").unwrap_err();
    assert!(matches!(err, CompileError::MissingEndif { .. }), "{err}");
}

fn lit_only(mut args: Vec<Value>) -> CallResult {
    match args.len() {
        1 => Ok(Value::Expr(args.remove(0).into_expr())),
        n => Err(CallError::invalid(format!("expected 1 argument, got {n}"))),
    }
}

#[test]
fn test_missing_operator_entry_is_unknown_function() {
    // A registry without the operator entries classifies fine (the operator
    // set is fixed) but fails the emission-time lookup on the `+` call.
    let mut registry = FunctionRegistry::new();
    registry.register(FunctionSpec {
        name: "pl.lit",
        category: Category::Special,
        params: Params::Fixed(&[ParamType::Any]),
        doc: "Wrap a literal value as an engine expression.",
        callable: lit_only,
    });
    let err = Compiler::new(&registry).compile("1 + 2").unwrap_err();
    assert!(matches!(err, CompileError::UnknownFunction { .. }), "{err}");
    assert!(err.to_string().contains('+'), "{err}");
}

#[test]
fn test_empty_group_is_malformed_tree() {
    let err = compile("()").unwrap_err();
    assert!(matches!(err, CompileError::MalformedTree { .. }), "{err}");
}

#[test]
fn test_adjacent_operands_are_malformed_tree() {
    let err = compile("\"a\" 5").unwrap_err();
    assert!(matches!(err, CompileError::MalformedTree { .. }), "{err}");
}

#[test]
fn test_nesting_limit() {
    let registry = FunctionRegistry::builtin();
    let compiler = Compiler::new(registry).with_max_depth(8);
    let deep = format!("{}1{}", "(".repeat(20), ")".repeat(20));
    let err = compiler.compile(&deep).unwrap_err();
    assert!(matches!(err, CompileError::NestingLimit { .. }), "{err}");

    // The default guard accepts reasonable nesting.
    let shallow = format!("{}1{}", "(".repeat(20), ")".repeat(20));
    assert!(compile(&shallow).is_ok());
}

#[test]
fn test_error_messages_are_informative() {
    let err = compile("if [a] > 1 then 2 else 3").unwrap_err();
    assert!(err.to_string().contains("endif"), "{err}");
    let err = compile("concat + 1").unwrap_err();
    assert!(err.to_string().contains("concat"), "{err}");
}
