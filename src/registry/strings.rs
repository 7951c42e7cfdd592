//! String functions.

use super::{
    expect_arity, raw_to_string, CallError, CallResult, Category, FunctionSpec, ParamType,
    Params, Value,
};
use polars::prelude::{concat_str, lit, DataType, NULL};

pub(super) fn register(registry: &mut super::FunctionRegistry) {
    registry.register(FunctionSpec {
        name: "concat",
        category: Category::String,
        params: Params::Variadic(ParamType::Any),
        doc: "Concatenate any number of values into one string.",
        callable: concat,
    });
    registry.register(FunctionSpec {
        name: "length",
        category: Category::String,
        params: Params::Fixed(&[ParamType::Any]),
        doc: "Number of characters in a string.",
        callable: length,
    });
    registry.register(FunctionSpec {
        name: "uppercase",
        category: Category::String,
        params: Params::Fixed(&[ParamType::Any]),
        doc: "Convert a string to upper case.",
        callable: uppercase,
    });
    registry.register(FunctionSpec {
        name: "lowercase",
        category: Category::String,
        params: Params::Fixed(&[ParamType::Any]),
        doc: "Convert a string to lower case.",
        callable: lowercase,
    });
    registry.register(FunctionSpec {
        name: "trim",
        category: Category::String,
        params: Params::Fixed(&[ParamType::Any]),
        doc: "Strip leading and trailing whitespace.",
        callable: trim,
    });
    registry.register(FunctionSpec {
        name: "left",
        category: Category::String,
        params: Params::Fixed(&[ParamType::Any, ParamType::Any]),
        doc: "First n characters of a string.",
        callable: left,
    });
    registry.register(FunctionSpec {
        name: "right",
        category: Category::String,
        params: Params::Fixed(&[ParamType::Any, ParamType::Any]),
        doc: "Last n characters of a string.",
        callable: right,
    });
    registry.register(FunctionSpec {
        name: "replace",
        category: Category::String,
        params: Params::Fixed(&[ParamType::Any, ParamType::Any, ParamType::Any]),
        doc: "Replace every occurrence of a substring.",
        callable: replace,
    });
    registry.register(FunctionSpec {
        name: "contains",
        category: Category::String,
        params: Params::Fixed(&[ParamType::Any, ParamType::Any]),
        doc: "Whether a string contains a substring.",
        callable: contains,
    });
    registry.register(FunctionSpec {
        name: "find_position",
        category: Category::String,
        params: Params::Fixed(&[ParamType::Any, ParamType::Any]),
        doc: "Zero-based position of the first occurrence of a substring, null when absent.",
        callable: find_position,
    });
    registry.register(FunctionSpec {
        name: "count_match",
        category: Category::String,
        params: Params::Fixed(&[ParamType::Any, ParamType::Any]),
        doc: "Number of occurrences of a substring.",
        callable: count_match,
    });
    registry.register(FunctionSpec {
        name: "pad_left",
        category: Category::String,
        params: Params::Fixed(&[ParamType::Any, ParamType::Integer, ParamType::String]),
        doc: "Pad a string on the left to the given length with a fill character.",
        callable: pad_left,
    });
    registry.register(FunctionSpec {
        name: "pad_right",
        category: Category::String,
        params: Params::Fixed(&[ParamType::Any, ParamType::Integer, ParamType::String]),
        doc: "Pad a string on the right to the given length with a fill character.",
        callable: pad_right,
    });
}

fn concat(args: Vec<Value>) -> CallResult {
    if args.is_empty() {
        return Err(CallError::invalid("concat expects at least one argument"));
    }
    if args.iter().any(Value::is_expr) {
        let exprs: Vec<_> = args.into_iter().map(Value::into_expr).collect();
        return Ok(Value::Expr(concat_str(exprs, "", false)));
    }
    let mut out = String::new();
    for arg in &args {
        out.push_str(&raw_to_string(arg).expect("raw argument"));
    }
    Ok(Value::Str(out))
}

fn length(mut args: Vec<Value>) -> CallResult {
    expect_arity(&args, 1, "length")?;
    let s = args.remove(0).into_expr();
    Ok(Value::Expr(s.str().len_chars().cast(DataType::Int64)))
}

fn uppercase(mut args: Vec<Value>) -> CallResult {
    expect_arity(&args, 1, "uppercase")?;
    Ok(Value::Expr(args.remove(0).into_expr().str().to_uppercase()))
}

fn lowercase(mut args: Vec<Value>) -> CallResult {
    expect_arity(&args, 1, "lowercase")?;
    Ok(Value::Expr(args.remove(0).into_expr().str().to_lowercase()))
}

fn trim(mut args: Vec<Value>) -> CallResult {
    expect_arity(&args, 1, "trim")?;
    Ok(Value::Expr(
        args.remove(0).into_expr().str().strip_chars(lit(NULL)),
    ))
}

fn left(mut args: Vec<Value>) -> CallResult {
    expect_arity(&args, 2, "left")?;
    let n = args.pop().expect("arity checked").into_expr();
    let s = args.pop().expect("arity checked").into_expr();
    Ok(Value::Expr(s.str().head(n)))
}

fn right(mut args: Vec<Value>) -> CallResult {
    expect_arity(&args, 2, "right")?;
    let n = args.pop().expect("arity checked").into_expr();
    let s = args.pop().expect("arity checked").into_expr();
    Ok(Value::Expr(s.str().tail(n)))
}

fn replace(mut args: Vec<Value>) -> CallResult {
    expect_arity(&args, 3, "replace")?;
    let with = args.pop().expect("arity checked").into_expr();
    let pattern = args.pop().expect("arity checked").into_expr();
    let s = args.pop().expect("arity checked").into_expr();
    Ok(Value::Expr(s.str().replace_all(pattern, with, true)))
}

fn contains(mut args: Vec<Value>) -> CallResult {
    expect_arity(&args, 2, "contains")?;
    let pattern = args.pop().expect("arity checked").into_expr();
    let s = args.pop().expect("arity checked").into_expr();
    Ok(Value::Expr(s.str().contains_literal(pattern)))
}

fn find_position(mut args: Vec<Value>) -> CallResult {
    expect_arity(&args, 2, "find_position")?;
    let pattern = args.pop().expect("arity checked").into_expr();
    let s = args.pop().expect("arity checked").into_expr();
    Ok(Value::Expr(s.str().find(pattern, true)))
}

fn count_match(mut args: Vec<Value>) -> CallResult {
    expect_arity(&args, 2, "count_match")?;
    let pattern = args.pop().expect("arity checked").into_expr();
    let s = args.pop().expect("arity checked").into_expr();
    Ok(Value::Expr(
        s.str().count_matches(pattern, true).cast(DataType::Int64),
    ))
}

fn pad_length_and_fill(length: Value, fill: Value, name: &str) -> Result<(usize, char), CallError> {
    let length = match length {
        Value::Int(n) if n >= 0 => n as usize,
        other => {
            return Err(CallError::invalid(format!(
                "{name} length must be a non-negative integer literal, got {}",
                other.type_name()
            )))
        }
    };
    let fill = match fill {
        Value::Str(s) => s.chars().next().ok_or_else(|| {
            CallError::invalid(format!("{name} fill string must not be empty"))
        })?,
        other => {
            return Err(CallError::invalid(format!(
                "{name} fill must be a string literal, got {}",
                other.type_name()
            )))
        }
    };
    Ok((length, fill))
}

fn pad_left(mut args: Vec<Value>) -> CallResult {
    expect_arity(&args, 3, "pad_left")?;
    let fill = args.pop().expect("arity checked");
    let length = args.pop().expect("arity checked");
    let s = args.pop().expect("arity checked").into_expr();
    let (length, fill) = pad_length_and_fill(length, fill, "pad_left")?;
    Ok(Value::Expr(s.str().pad_start(length, fill)))
}

fn pad_right(mut args: Vec<Value>) -> CallResult {
    expect_arity(&args, 3, "pad_right")?;
    let fill = args.pop().expect("arity checked");
    let length = args.pop().expect("arity checked");
    let s = args.pop().expect("arity checked").into_expr();
    let (length, fill) = pad_length_and_fill(length, fill, "pad_right")?;
    Ok(Value::Expr(s.str().pad_end(length, fill)))
}
