//! Operator entries.
//!
//! Every operator of the formula language is a registry function keyed by
//! its symbol; the inline resolver turns operator leaves into calls to these
//! entries. Raw operands fold eagerly (the way the host language would);
//! anything involving an engine expression builds onto the plan.

use super::{expect_arity, CallError, CallResult, Category, FunctionSpec, ParamType, Params, Value};
use polars::prelude::{binary_expr, Operator};

const BINARY: Params = Params::Fixed(&[ParamType::Any, ParamType::Any]);

pub(super) fn register(registry: &mut super::FunctionRegistry) {
    let entries: [(&'static str, &'static str, super::Callable); 13] = [
        ("+", "Add numbers or concatenate strings.", op_add),
        ("-", "Subtract the right operand from the left.", op_sub),
        ("*", "Multiply two numbers.", op_mul),
        ("/", "Divide the left operand by the right (true division).", op_div),
        ("=", "Equality comparison.", op_eq),
        ("!=", "Inequality comparison.", op_neq),
        ("<", "Less-than comparison.", op_lt),
        (">", "Greater-than comparison.", op_gt),
        ("<=", "Less-than-or-equal comparison.", op_le),
        (">=", "Greater-than-or-equal comparison.", op_ge),
        ("and", "Logical conjunction.", op_and),
        ("or", "Logical disjunction.", op_or),
        ("in", "Substring membership: left value contained in right value.", op_in),
    ];
    for (name, doc, callable) in entries {
        registry.register(FunctionSpec {
            name,
            category: Category::Operator,
            params: BINARY,
            doc,
            callable,
        });
    }
}

fn operands(mut args: Vec<Value>, name: &str) -> Result<(Value, Value), CallError> {
    expect_arity(&args, 2, name)?;
    let right = args.pop().expect("arity checked");
    let left = args.pop().expect("arity checked");
    Ok((left, right))
}

fn op_add(args: Vec<Value>) -> CallResult {
    let (l, r) = operands(args, "+")?;
    match (l, r) {
        (Value::Expr(l), Value::Expr(r)) => Ok(Value::Expr(l + r)),
        (Value::Int(a), Value::Int(b)) => Ok(Value::Int(a + b)),
        (Value::Float(a), Value::Float(b)) => Ok(Value::Float(a + b)),
        (Value::Str(a), Value::Str(b)) => Ok(Value::Str(format!("{a}{b}"))),
        (l, r) if l.is_expr() || r.is_expr() => Ok(Value::Expr(l.into_expr() + r.into_expr())),
        (l, r) if l.is_numeric() && r.is_numeric() => {
            Ok(Value::Float(l.as_f64().unwrap() + r.as_f64().unwrap()))
        }
        _ => Err(CallError::NotImplemented),
    }
}

fn op_sub(args: Vec<Value>) -> CallResult {
    let (l, r) = operands(args, "-")?;
    match (l, r) {
        (Value::Expr(l), Value::Expr(r)) => Ok(Value::Expr(l - r)),
        (Value::Int(a), Value::Int(b)) => Ok(Value::Int(a - b)),
        (Value::Float(a), Value::Float(b)) => Ok(Value::Float(a - b)),
        (l, r) if l.is_expr() || r.is_expr() => Ok(Value::Expr(l.into_expr() - r.into_expr())),
        (l, r) if l.is_numeric() && r.is_numeric() => {
            Ok(Value::Float(l.as_f64().unwrap() - r.as_f64().unwrap()))
        }
        _ => Err(CallError::NotImplemented),
    }
}

fn op_mul(args: Vec<Value>) -> CallResult {
    let (l, r) = operands(args, "*")?;
    match (l, r) {
        (Value::Expr(l), Value::Expr(r)) => Ok(Value::Expr(l * r)),
        (Value::Int(a), Value::Int(b)) => Ok(Value::Int(a * b)),
        (Value::Float(a), Value::Float(b)) => Ok(Value::Float(a * b)),
        (l, r) if l.is_expr() || r.is_expr() => Ok(Value::Expr(l.into_expr() * r.into_expr())),
        (l, r) if l.is_numeric() && r.is_numeric() => {
            Ok(Value::Float(l.as_f64().unwrap() * r.as_f64().unwrap()))
        }
        _ => Err(CallError::NotImplemented),
    }
}

fn op_div(args: Vec<Value>) -> CallResult {
    let (l, r) = operands(args, "/")?;
    match (l, r) {
        // True division, so integer columns divide into floats the way the
        // formula language promises.
        (Value::Expr(l), Value::Expr(r)) => {
            Ok(Value::Expr(binary_expr(l, Operator::TrueDivide, r)))
        }
        (l, r) if l.is_expr() || r.is_expr() => Ok(Value::Expr(binary_expr(
            l.into_expr(),
            Operator::TrueDivide,
            r.into_expr(),
        ))),
        (l, r) if l.is_numeric() && r.is_numeric() => {
            let denominator = r.as_f64().unwrap();
            if denominator == 0.0 {
                return Err(CallError::invalid("division by zero"));
            }
            Ok(Value::Float(l.as_f64().unwrap() / denominator))
        }
        _ => Err(CallError::NotImplemented),
    }
}

fn raw_equal(l: &Value, r: &Value) -> Option<bool> {
    match (l, r) {
        (Value::Str(a), Value::Str(b)) => Some(a == b),
        (Value::Bool(a), Value::Bool(b)) => Some(a == b),
        _ if l.is_numeric() && r.is_numeric() => Some(l.as_f64() == r.as_f64()),
        // Values of unrelated types are simply unequal.
        _ => None,
    }
}

fn op_eq(args: Vec<Value>) -> CallResult {
    let (l, r) = operands(args, "=")?;
    if l.is_expr() || r.is_expr() {
        return Ok(Value::Expr(l.into_expr().eq(r.into_expr())));
    }
    Ok(Value::Bool(raw_equal(&l, &r).unwrap_or(false)))
}

fn op_neq(args: Vec<Value>) -> CallResult {
    let (l, r) = operands(args, "!=")?;
    if l.is_expr() || r.is_expr() {
        return Ok(Value::Expr(l.into_expr().neq(r.into_expr())));
    }
    Ok(Value::Bool(!raw_equal(&l, &r).unwrap_or(false)))
}

fn raw_ordering(l: &Value, r: &Value) -> Option<std::cmp::Ordering> {
    match (l, r) {
        (Value::Str(a), Value::Str(b)) => Some(a.cmp(b)),
        _ if l.is_numeric() && r.is_numeric() => l.as_f64()?.partial_cmp(&r.as_f64()?),
        _ => None,
    }
}

fn op_lt(args: Vec<Value>) -> CallResult {
    let (l, r) = operands(args, "<")?;
    if l.is_expr() || r.is_expr() {
        return Ok(Value::Expr(l.into_expr().lt(r.into_expr())));
    }
    match raw_ordering(&l, &r) {
        Some(ord) => Ok(Value::Bool(ord.is_lt())),
        None => Err(CallError::NotImplemented),
    }
}

fn op_gt(args: Vec<Value>) -> CallResult {
    let (l, r) = operands(args, ">")?;
    if l.is_expr() || r.is_expr() {
        return Ok(Value::Expr(l.into_expr().gt(r.into_expr())));
    }
    match raw_ordering(&l, &r) {
        Some(ord) => Ok(Value::Bool(ord.is_gt())),
        None => Err(CallError::NotImplemented),
    }
}

fn op_le(args: Vec<Value>) -> CallResult {
    let (l, r) = operands(args, "<=")?;
    if l.is_expr() || r.is_expr() {
        return Ok(Value::Expr(l.into_expr().lt_eq(r.into_expr())));
    }
    match raw_ordering(&l, &r) {
        Some(ord) => Ok(Value::Bool(ord.is_le())),
        None => Err(CallError::NotImplemented),
    }
}

fn op_ge(args: Vec<Value>) -> CallResult {
    let (l, r) = operands(args, ">=")?;
    if l.is_expr() || r.is_expr() {
        return Ok(Value::Expr(l.into_expr().gt_eq(r.into_expr())));
    }
    match raw_ordering(&l, &r) {
        Some(ord) => Ok(Value::Bool(ord.is_ge())),
        None => Err(CallError::NotImplemented),
    }
}

fn op_and(args: Vec<Value>) -> CallResult {
    let (l, r) = operands(args, "and")?;
    match (l, r) {
        (Value::Bool(a), Value::Bool(b)) => Ok(Value::Bool(a && b)),
        (l, r) if l.is_expr() || r.is_expr() => Ok(Value::Expr(l.into_expr().and(r.into_expr()))),
        _ => Err(CallError::NotImplemented),
    }
}

fn op_or(args: Vec<Value>) -> CallResult {
    let (l, r) = operands(args, "or")?;
    match (l, r) {
        (Value::Bool(a), Value::Bool(b)) => Ok(Value::Bool(a || b)),
        (l, r) if l.is_expr() || r.is_expr() => Ok(Value::Expr(l.into_expr().or(r.into_expr()))),
        _ => Err(CallError::NotImplemented),
    }
}

fn op_in(args: Vec<Value>) -> CallResult {
    let (l, r) = operands(args, "in")?;
    match (l, r) {
        (Value::Str(needle), Value::Str(haystack)) => Ok(Value::Bool(haystack.contains(&needle))),
        (l, r) if l.is_expr() || r.is_expr() => Ok(Value::Expr(
            r.into_expr().str().contains_literal(l.into_expr()),
        )),
        _ => Err(CallError::NotImplemented),
    }
}
