//! Math functions.
//!
//! Raw numeric inputs are lifted into literal expressions before the engine
//! method is applied, so `sqrt(2)` and `sqrt([col])` build the same kind of
//! plan node.

use super::{expect_arity, CallError, CallResult, Category, FunctionSpec, ParamType, Params, Value};
use polars::prelude::Expr;
use rand::Rng;

const UNARY: Params = Params::Fixed(&[ParamType::Any]);

pub(super) fn register(registry: &mut super::FunctionRegistry) {
    let unary: [(&'static str, &'static str, super::Callable); 10] = [
        ("abs", "Absolute value.", abs),
        ("sqrt", "Square root.", sqrt),
        ("exp", "Exponential function.", exp),
        ("log", "Natural logarithm.", log),
        ("sin", "Sine.", sin),
        ("cos", "Cosine.", cos),
        ("tan", "Tangent.", tan),
        ("tanh", "Hyperbolic tangent.", tanh),
        ("ceil", "Round up to the nearest integer.", ceil),
        ("floor", "Round down to the nearest integer.", floor),
    ];
    for (name, doc, callable) in unary {
        registry.register(FunctionSpec {
            name,
            category: Category::Math,
            params: UNARY,
            doc,
            callable,
        });
    }
    registry.register(FunctionSpec {
        name: "round",
        category: Category::Math,
        params: Params::Fixed(&[ParamType::Any, ParamType::Integer]),
        doc: "Round to the given number of decimals.",
        callable: round,
    });
    registry.register(FunctionSpec {
        name: "random_int",
        category: Category::Math,
        params: Params::Fixed(&[ParamType::Integer, ParamType::Integer]),
        doc: "A random integer in the half-open range [low, high).",
        callable: random_int,
    });
    registry.register(FunctionSpec {
        name: "negation",
        category: Category::Math,
        params: UNARY,
        doc: "Negate a numeric value.",
        callable: negation,
    });
    registry.register(FunctionSpec {
        name: "__negative",
        category: Category::Special,
        params: Params::Fixed(&[]),
        doc: "The constant -1 used to expand unary minus.",
        callable: negative,
    });
}

fn unary_expr(mut args: Vec<Value>, name: &str, f: fn(Expr) -> Expr) -> CallResult {
    expect_arity(&args, 1, name)?;
    Ok(Value::Expr(f(args.remove(0).into_expr())))
}

fn abs(args: Vec<Value>) -> CallResult {
    unary_expr(args, "abs", Expr::abs)
}

fn sqrt(args: Vec<Value>) -> CallResult {
    unary_expr(args, "sqrt", Expr::sqrt)
}

fn exp(args: Vec<Value>) -> CallResult {
    unary_expr(args, "exp", Expr::exp)
}

fn log(args: Vec<Value>) -> CallResult {
    unary_expr(args, "log", |e| e.log(std::f64::consts::E))
}

fn sin(args: Vec<Value>) -> CallResult {
    unary_expr(args, "sin", Expr::sin)
}

fn cos(args: Vec<Value>) -> CallResult {
    unary_expr(args, "cos", Expr::cos)
}

fn tan(args: Vec<Value>) -> CallResult {
    unary_expr(args, "tan", Expr::tan)
}

fn tanh(args: Vec<Value>) -> CallResult {
    unary_expr(args, "tanh", Expr::tanh)
}

fn ceil(args: Vec<Value>) -> CallResult {
    unary_expr(args, "ceil", Expr::ceil)
}

fn floor(args: Vec<Value>) -> CallResult {
    unary_expr(args, "floor", Expr::floor)
}

fn round(mut args: Vec<Value>) -> CallResult {
    // The decimals argument may be omitted.
    let decimals = match args.len() {
        1 => 0u32,
        2 => match args.pop().expect("length checked") {
            Value::Int(n) if n >= 0 => n as u32,
            other => {
                return Err(CallError::invalid(format!(
                    "round decimals must be a non-negative integer literal, got {}",
                    other.type_name()
                )))
            }
        },
        n => {
            return Err(CallError::invalid(format!(
                "round expects 1 or 2 arguments, got {n}"
            )))
        }
    };
    Ok(Value::Expr(args.remove(0).into_expr().round(decimals)))
}

fn random_int(mut args: Vec<Value>) -> CallResult {
    expect_arity(&args, 2, "random_int")?;
    let high = args.pop().expect("arity checked");
    let low = args.pop().expect("arity checked");
    match (low, high) {
        (Value::Int(low), Value::Int(high)) if low < high => {
            Ok(Value::Int(rand::thread_rng().gen_range(low..high)))
        }
        (Value::Int(_), Value::Int(_)) => {
            Err(CallError::invalid("random_int requires low < high"))
        }
        _ => Err(CallError::invalid(
            "random_int bounds must be integer literals",
        )),
    }
}

fn negation(mut args: Vec<Value>) -> CallResult {
    expect_arity(&args, 1, "negation")?;
    match args.remove(0) {
        Value::Expr(e) => Ok(Value::Expr(-e)),
        Value::Int(v) => Ok(Value::Int(-v)),
        Value::Float(v) => Ok(Value::Float(-v)),
        Value::Bool(v) => Ok(Value::Int(-(v as i64))),
        other => Err(CallError::invalid(format!(
            "cannot negate a {}",
            other.type_name()
        ))),
    }
}

fn negative(args: Vec<Value>) -> CallResult {
    expect_arity(&args, 0, "__negative")?;
    Ok(Value::Int(-1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_negation_folds_raw() {
        assert!(matches!(negation(vec![Value::Int(5)]), Ok(Value::Int(-5))));
        assert!(matches!(
            negation(vec![Value::Float(2.5)]),
            Ok(Value::Float(v)) if v == -2.5
        ));
    }

    #[test]
    fn test_negative_constant() {
        assert!(matches!(negative(vec![]), Ok(Value::Int(-1))));
    }

    #[test]
    fn test_round_argument_validation() {
        assert!(matches!(
            round(vec![Value::Float(1.5), Value::Str("x".into())]),
            Err(CallError::Invalid(_))
        ));
    }

    #[test]
    fn test_random_int_range() {
        for _ in 0..50 {
            match random_int(vec![Value::Int(1), Value::Int(3)]) {
                Ok(Value::Int(v)) => assert!((1..3).contains(&v)),
                other => panic!("unexpected result {other:?}"),
            }
        }
    }

    #[test]
    fn test_random_int_invalid_bounds() {
        assert!(matches!(
            random_int(vec![Value::Int(3), Value::Int(1)]),
            Err(CallError::Invalid(_))
        ));
    }
}
