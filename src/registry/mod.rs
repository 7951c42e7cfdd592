//! The function registry: name → callable descriptor.
//!
//! The registry is the single lookup surface for classification (is this
//! word a function?) and emission (what does this call do, and what argument
//! types does it take?). It is read-only after construction; the built-in
//! instance is created once and shared.
//!
//! Callables work over [`Value`]: either a raw literal (integer, float,
//! boolean, string) or an already-built polars expression. Raw inputs fold
//! eagerly where the host language would (e.g. `1 + 2` is `3` before it is
//! ever lit into the plan); anything touching a column stays an expression.

mod convert;
mod dates;
mod math;
mod operators;
mod strings;

use indexmap::IndexMap;
use polars::prelude::{col, lit, Expr};
use std::sync::OnceLock;

/// An argument or result of a registry callable.
#[derive(Debug, Clone)]
pub enum Value {
    Int(i64),
    Float(f64),
    Bool(bool),
    Str(String),
    Expr(Expr),
}

impl Value {
    pub fn is_expr(&self) -> bool {
        matches!(self, Self::Expr(_))
    }

    /// Raw numerics: integers, floats, and booleans (which count as numeric
    /// for alignment purposes).
    pub fn is_numeric(&self) -> bool {
        matches!(self, Self::Int(_) | Self::Float(_) | Self::Bool(_))
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(v) => Some(*v as f64),
            Self::Float(v) => Some(*v),
            Self::Bool(v) => Some(*v as u8 as f64),
            _ => None,
        }
    }

    /// Convert into a polars expression, wrapping raw literals with `lit`.
    pub fn into_expr(self) -> Expr {
        match self {
            Self::Int(v) => lit(v),
            Self::Float(v) => lit(v),
            Self::Bool(v) => lit(v),
            Self::Str(v) => lit(v.as_str()),
            Self::Expr(e) => e,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Int(_) => "integer",
            Self::Float(_) => "float",
            Self::Bool(_) => "boolean",
            Self::Str(_) => "string",
            Self::Expr(_) => "expression",
        }
    }
}

/// Declared semantic type of one parameter.
///
/// `Any` and `Expr` positions accept engine expressions; raw literals passed
/// there are lit-wrapped when the call mixes raw and expression arguments.
/// The remaining types are raw-only: the callable wants the literal itself
/// (a pad length, a column name), never an expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamType {
    Any,
    Expr,
    Number,
    Integer,
    String,
    Boolean,
}

impl ParamType {
    pub fn allows_expression(self) -> bool {
        matches!(self, Self::Any | Self::Expr)
    }
}

/// Parameter list shape of a callable.
#[derive(Debug, Clone, Copy)]
pub enum Params {
    Fixed(&'static [ParamType]),
    Variadic(ParamType),
}

impl Params {
    /// The fixed parameter list, if this callable has one.
    pub fn fixed(&self) -> Option<&'static [ParamType]> {
        match self {
            Self::Fixed(p) => Some(p),
            Self::Variadic(_) => None,
        }
    }
}

/// Documentation category of a function.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Operator,
    String,
    Math,
    Date,
    Conversion,
    Special,
}

impl Category {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Operator => "operator",
            Self::String => "string",
            Self::Math => "math",
            Self::Date => "date",
            Self::Conversion => "conversion",
            Self::Special => "special",
        }
    }
}

/// Failure modes of a callable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallError {
    /// The engine cannot express this operand combination. Emission logs a
    /// warning and substitutes a false literal.
    NotImplemented,
    /// Bad argument count or type.
    Invalid(String),
}

impl CallError {
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::Invalid(message.into())
    }
}

pub type CallResult = Result<Value, CallError>;

/// The callable itself: arguments in, value out.
pub type Callable = fn(Vec<Value>) -> CallResult;

/// A registered function.
#[derive(Debug, Clone)]
pub struct FunctionSpec {
    pub name: &'static str,
    pub category: Category,
    pub params: Params,
    pub doc: &'static str,
    pub callable: Callable,
}

/// One record of the documentation surface.
#[derive(Debug, Clone, Copy)]
pub struct DocEntry<'a> {
    pub category: Category,
    pub name: &'a str,
    pub doc: &'a str,
}

/// Read-only mapping from function name to callable descriptor.
///
/// Iteration order is registration order, which the documentation surface
/// exposes directly.
#[derive(Debug, Default)]
pub struct FunctionRegistry {
    funcs: IndexMap<&'static str, FunctionSpec>,
}

impl FunctionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry populated with the built-in function library.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register_core();
        operators::register(&mut registry);
        strings::register(&mut registry);
        math::register(&mut registry);
        dates::register(&mut registry);
        convert::register(&mut registry);
        registry
    }

    /// The shared built-in registry, created on first use and immutable
    /// afterwards.
    pub fn builtin() -> &'static FunctionRegistry {
        static BUILTIN: OnceLock<FunctionRegistry> = OnceLock::new();
        BUILTIN.get_or_init(Self::with_builtins)
    }

    /// Register a function; host functions are added the same way.
    pub fn register(&mut self, spec: FunctionSpec) {
        self.funcs.insert(spec.name, spec);
    }

    pub fn get(&self, name: &str) -> Option<&FunctionSpec> {
        self.funcs.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.funcs.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.funcs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.funcs.is_empty()
    }

    /// The documentation surface: (category, name, docstring) records in
    /// registration order.
    pub fn docs(&self) -> impl Iterator<Item = DocEntry<'_>> {
        self.funcs.values().map(|spec| DocEntry {
            category: spec.category,
            name: spec.name,
            doc: spec.doc,
        })
    }

    fn register_core(&mut self) {
        self.register(FunctionSpec {
            name: "pl.lit",
            category: Category::Special,
            params: Params::Fixed(&[ParamType::Any]),
            doc: "Wrap a literal value as an engine expression.",
            callable: builtin_lit,
        });
        self.register(FunctionSpec {
            name: "pl.col",
            category: Category::Special,
            params: Params::Fixed(&[ParamType::String]),
            doc: "Reference a column by name.",
            callable: builtin_col,
        });
    }
}

/// The identity literal: raw values are lifted with `lit`, an argument that
/// is already an engine expression passes through unchanged.
fn builtin_lit(mut args: Vec<Value>) -> CallResult {
    if args.len() != 1 {
        return Err(CallError::invalid(format!(
            "expected exactly one argument, got {}",
            args.len()
        )));
    }
    Ok(Value::Expr(args.remove(0).into_expr()))
}

fn builtin_col(mut args: Vec<Value>) -> CallResult {
    if args.len() != 1 {
        return Err(CallError::invalid(format!(
            "expected exactly one argument, got {}",
            args.len()
        )));
    }
    match args.remove(0) {
        Value::Str(name) => Ok(Value::Expr(col(&name))),
        other => Err(CallError::invalid(format!(
            "column name must be a string, got {}",
            other.type_name()
        ))),
    }
}

/// Shared helper: render a raw value as text (string conversion and
/// raw-side `concat`).
pub(crate) fn raw_to_string(v: &Value) -> Option<String> {
    match v {
        Value::Int(i) => Some(i.to_string()),
        Value::Float(f) => Some(f.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Str(s) => Some(s.clone()),
        Value::Expr(_) => None,
    }
}

/// Shared helper: exactly `n` arguments.
pub(crate) fn expect_arity(args: &[Value], n: usize, name: &str) -> Result<(), CallError> {
    if args.len() != n {
        return Err(CallError::invalid(format!(
            "{name} expects {n} argument(s), got {}",
            args.len()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_contains_required_entries() {
        let registry = FunctionRegistry::builtin();
        for name in [
            "pl.lit", "pl.col", "+", "-", "*", "/", "=", "!=", "<", ">", "<=", ">=", "and",
            "or", "in", "negation", "__negative",
        ] {
            assert!(registry.contains(name), "missing {name:?}");
        }
    }

    #[test]
    fn test_docs_surface_in_registration_order() {
        let registry = FunctionRegistry::builtin();
        let docs: Vec<_> = registry.docs().collect();
        assert!(docs.len() > 30);
        assert_eq!(docs[0].name, "pl.lit");
        assert!(docs.iter().all(|d| !d.doc.is_empty()));
    }

    #[test]
    fn test_case_sensitive_lookup() {
        let registry = FunctionRegistry::builtin();
        assert!(registry.contains("concat"));
        assert!(!registry.contains("CONCAT"));
    }

    #[test]
    fn test_lit_lifts_raw_values() {
        let spec = FunctionRegistry::builtin().get("pl.lit").unwrap();
        let result = (spec.callable)(vec![Value::Int(7)]);
        assert!(matches!(result, Ok(Value::Expr(e)) if e == lit(7i64)));
    }

    #[test]
    fn test_lit_passes_expressions_through() {
        let spec = FunctionRegistry::builtin().get("pl.lit").unwrap();
        let result = (spec.callable)(vec![Value::Expr(col("a"))]);
        assert!(matches!(result, Ok(Value::Expr(e)) if e == col("a")));
    }

    #[test]
    fn test_lit_rejects_wrong_arity() {
        let spec = FunctionRegistry::builtin().get("pl.lit").unwrap();
        let result = (spec.callable)(vec![Value::Int(1), Value::Int(2)]);
        assert!(matches!(result, Err(CallError::Invalid(_))));
    }

    #[test]
    fn test_value_into_expr_and_back() {
        assert!(Value::Int(1).is_numeric());
        assert!(Value::Bool(true).is_numeric());
        assert!(!Value::Str("x".into()).is_numeric());
        assert_eq!(Value::Int(2).as_f64(), Some(2.0));
        assert_eq!(Value::Bool(true).as_f64(), Some(1.0));
        assert!(Value::Expr(lit(1)).is_expr());
    }
}
