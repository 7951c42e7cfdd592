//! Type conversion functions.

use super::{
    expect_arity, raw_to_string, CallError, CallResult, Category, FunctionSpec, ParamType,
    Params, Value,
};
use polars::prelude::DataType;

const UNARY: Params = Params::Fixed(&[ParamType::Any]);

pub(super) fn register(registry: &mut super::FunctionRegistry) {
    registry.register(FunctionSpec {
        name: "to_string",
        category: Category::Conversion,
        params: UNARY,
        doc: "Convert a value to its string representation.",
        callable: to_string,
    });
    registry.register(FunctionSpec {
        name: "to_integer",
        category: Category::Conversion,
        params: UNARY,
        doc: "Convert a value to an integer.",
        callable: to_integer,
    });
    registry.register(FunctionSpec {
        name: "to_float",
        category: Category::Conversion,
        params: UNARY,
        doc: "Convert a value to a floating-point number.",
        callable: to_float,
    });
    registry.register(FunctionSpec {
        name: "to_number",
        category: Category::Conversion,
        params: UNARY,
        doc: "Convert a value to a number.",
        callable: to_float,
    });
    registry.register(FunctionSpec {
        name: "to_boolean",
        category: Category::Conversion,
        params: UNARY,
        doc: "Convert a value to a boolean.",
        callable: to_boolean,
    });
}

fn to_string(mut args: Vec<Value>) -> CallResult {
    expect_arity(&args, 1, "to_string")?;
    let arg = args.remove(0);
    match arg {
        Value::Expr(e) => Ok(Value::Expr(e.cast(DataType::String))),
        raw => Ok(Value::Str(raw_to_string(&raw).expect("raw value"))),
    }
}

fn to_integer(mut args: Vec<Value>) -> CallResult {
    expect_arity(&args, 1, "to_integer")?;
    match args.remove(0) {
        Value::Expr(e) => Ok(Value::Expr(e.cast(DataType::Int64))),
        Value::Int(v) => Ok(Value::Int(v)),
        Value::Float(v) => Ok(Value::Int(v.trunc() as i64)),
        Value::Bool(v) => Ok(Value::Int(v as i64)),
        Value::Str(s) => s
            .parse::<i64>()
            .map(Value::Int)
            .map_err(|_| CallError::invalid(format!("cannot convert {s:?} to an integer"))),
    }
}

fn to_float(mut args: Vec<Value>) -> CallResult {
    expect_arity(&args, 1, "to_float")?;
    match args.remove(0) {
        Value::Expr(e) => Ok(Value::Expr(e.cast(DataType::Float64))),
        Value::Str(s) => s
            .parse::<f64>()
            .map(Value::Float)
            .map_err(|_| CallError::invalid(format!("cannot convert {s:?} to a number"))),
        raw => Ok(Value::Float(raw.as_f64().expect("raw numeric"))),
    }
}

fn to_boolean(mut args: Vec<Value>) -> CallResult {
    expect_arity(&args, 1, "to_boolean")?;
    match args.remove(0) {
        Value::Expr(e) => Ok(Value::Expr(e.cast(DataType::Boolean))),
        Value::Bool(v) => Ok(Value::Bool(v)),
        Value::Int(v) => Ok(Value::Bool(v != 0)),
        Value::Float(v) => Ok(Value::Bool(v != 0.0)),
        Value::Str(s) => match s.to_ascii_lowercase().as_str() {
            "true" => Ok(Value::Bool(true)),
            "false" => Ok(Value::Bool(false)),
            _ => Err(CallError::invalid(format!(
                "cannot convert {s:?} to a boolean"
            ))),
        },
    }
}
