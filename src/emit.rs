//! Emission: walk the finalized tree and produce the engine expression.
//!
//! Leaves yield literal values, calls look up their reference in the
//! registry, and conditionals chain into `when/then/otherwise`. Two argument
//! fix-ups run before every call:
//!
//! - **numeric alignment**: an all-raw-numeric argument list mixing integers
//!   and floats is promoted to all floats (booleans count as numeric);
//! - **standardization**: when raw literals and engine expressions are
//!   mixed, each raw literal sitting in a parameter position that accepts
//!   expressions is lit-wrapped, so the callable sees uniform inputs. On an
//!   arity mismatch with the declared metadata every raw literal is wrapped.
//!
//! A callable reporting the engine's "not implemented" outcome is logged and
//! replaced with a false literal rather than failing the whole compilation.
//! Every call, the identity-literal `pl.lit` included, dispatches through the
//! registry; the pass-through behavior of `pl.lit` lives in its callable.

use crate::classify::TokenKind;
use crate::error::CompileError;
use crate::registry::{CallError, FunctionRegistry, Params, Value};
use crate::tree::{Arena, Node, NodeId};
use polars::prelude::{col, when, Expr};

/// Evaluate the finalized tree into a polars expression.
pub fn emit(
    arena: &Arena,
    root: NodeId,
    registry: &FunctionRegistry,
) -> Result<Expr, CompileError> {
    let value = evaluate(arena, root, registry)?;
    Ok(value.into_expr())
}

fn evaluate(
    arena: &Arena,
    id: NodeId,
    registry: &FunctionRegistry,
) -> Result<Value, CompileError> {
    match arena.node(id) {
        Node::Leaf(leaf) => leaf_value(&leaf.token),
        Node::Scaffold(_) => Err(CompileError::malformed_tree(
            "scaffold reached emission",
            None,
        )),
        Node::Conditional(cond) => {
            let mut branches = Vec::with_capacity(cond.pairs.len());
            for pair in &cond.pairs {
                let condition = evaluate(arena, pair.condition, registry)?.into_expr();
                let value = evaluate(arena, pair.value, registry)?.into_expr();
                branches.push((condition, value));
            }
            if branches.is_empty() {
                return Err(CompileError::malformed_tree(
                    "conditional without branches",
                    None,
                ));
            }
            let else_val = match cond.else_val {
                Some(e) => evaluate(arena, e, registry)?.into_expr(),
                None => {
                    return Err(CompileError::malformed_tree(
                        "conditional without an else branch",
                        None,
                    ))
                }
            };
            Ok(Value::Expr(chain_conditional(branches, else_val)))
        }
        Node::Call(call) => {
            let name = call.func.text.as_str();
            let offset = call.func.offset;

            let spec = registry.get(name).ok_or_else(|| {
                CompileError::unknown_function(
                    format!("'{name}' is not a registered function"),
                    Some(offset),
                )
            })?;

            let mut args = Vec::with_capacity(call.args.len());
            for arg in &call.args {
                args.push(evaluate(arena, *arg, registry)?);
            }
            align_numeric(&mut args);
            standardize(&mut args, &spec.params);

            match (spec.callable)(args) {
                Ok(value) => Ok(value),
                Err(CallError::NotImplemented) => {
                    tracing::warn!(
                        function = name,
                        formula = %arena.render(id),
                        "operation not implemented for the given operands; yielding false"
                    );
                    Ok(Value::Bool(false))
                }
                Err(CallError::Invalid(message)) => Err(CompileError::malformed_tree(
                    format!("{name}: {message}"),
                    Some(offset),
                )),
            }
        }
    }
}

/// Literal value of a leaf token.
fn leaf_value(token: &crate::classify::Token) -> Result<Value, CompileError> {
    match token.kind {
        TokenKind::Number => {
            if token.text.contains('.') {
                token.text.parse::<f64>().map(Value::Float).map_err(|_| {
                    CompileError::malformed_tree(
                        format!("invalid number literal '{}'", token.text),
                        Some(token.offset),
                    )
                })
            } else {
                match token.text.parse::<i64>() {
                    Ok(v) => Ok(Value::Int(v)),
                    // Out-of-range integers degrade to floats.
                    Err(_) => token.text.parse::<f64>().map(Value::Float).map_err(|_| {
                        CompileError::malformed_tree(
                            format!("invalid number literal '{}'", token.text),
                            Some(token.offset),
                        )
                    }),
                }
            }
        }
        TokenKind::Boolean => Ok(Value::Bool(token.text.eq_ignore_ascii_case("true"))),
        TokenKind::String => {
            let text = token.text.as_str();
            if text.len() >= 2 && text.starts_with('"') && text.ends_with('"') {
                Ok(Value::Str(text[1..text.len() - 1].to_string()))
            } else {
                Ok(Value::Str(text.to_string()))
            }
        }
        TokenKind::Column => {
            let inner = token
                .text
                .strip_prefix('[')
                .and_then(|t| t.strip_suffix(']'))
                .unwrap_or(token.text.as_str());
            Ok(Value::Expr(col(inner)))
        }
        TokenKind::Operator => Err(CompileError::malformed_tree(
            format!("unresolved operator '{}'", token.text),
            Some(token.offset),
        )),
        other => Err(CompileError::malformed_tree(
            format!("unexpected {} token '{}' at emission", other.as_str(), token.text),
            Some(token.offset),
        )),
    }
}

/// Promote an all-raw-numeric argument list with mixed integer/float types
/// to all floats. Booleans count as integers here, so an all-boolean list
/// (a logical operator's operands) stays boolean.
fn align_numeric(args: &mut [Value]) {
    if args.is_empty() || !args.iter().all(Value::is_numeric) {
        return;
    }
    let any_float = args.iter().any(|a| matches!(a, Value::Float(_)));
    let any_int_like = args
        .iter()
        .any(|a| matches!(a, Value::Int(_) | Value::Bool(_)));
    if !(any_float && any_int_like) {
        return;
    }
    for arg in args.iter_mut() {
        let promoted = arg.as_f64().expect("numeric argument");
        *arg = Value::Float(promoted);
    }
}

/// Wrap raw literals in `lit` when the call mixes raw and expression
/// arguments, consulting the parameter metadata for which positions accept
/// expressions.
fn standardize(args: &mut [Value], params: &Params) {
    let has_expr = args.iter().any(Value::is_expr);
    let has_raw = args.iter().any(|a| !a.is_expr());
    if !(has_expr && has_raw) {
        return;
    }
    match params.fixed() {
        Some(types) if types.len() == args.len() => {
            for (arg, ty) in args.iter_mut().zip(types) {
                if !arg.is_expr() && ty.allows_expression() {
                    *arg = Value::Expr(arg.clone().into_expr());
                }
            }
        }
        _ => {
            for arg in args.iter_mut() {
                if !arg.is_expr() {
                    *arg = Value::Expr(arg.clone().into_expr());
                }
            }
        }
    }
}

/// Fold (condition, value) branches into the engine's when/then chain.
fn chain_conditional(branches: Vec<(Expr, Expr)>, else_val: Expr) -> Expr {
    enum Chain {
        First(polars::lazy::dsl::Then),
        Rest(polars::lazy::dsl::ChainedThen),
    }

    let mut iter = branches.into_iter();
    let (condition, value) = iter.next().expect("at least one branch");
    let mut chain = Chain::First(when(condition).then(value));
    for (condition, value) in iter {
        chain = Chain::Rest(match chain {
            Chain::First(t) => t.when(condition).then(value),
            Chain::Rest(t) => t.when(condition).then(value),
        });
    }
    match chain {
        Chain::First(t) => t.otherwise(else_val),
        Chain::Rest(t) => t.otherwise(else_val),
    }
}
