//! # polars-formula
//!
//! Compiles a compact, SQL/Tableau-flavored formula language into polars
//! expressions. A string such as
//! `if [age] < 18 then "minor" else "adult" endif` becomes an opaque
//! [`polars::prelude::Expr`] the engine evaluates against a table.
//!
//! ## Pipeline (dependency order)
//!
//! ```text
//! emit        → registry lookup, argument alignment, Expr construction
//!   ↑
//! finalize    → scaffold elimination, parent-link normalization
//!   ↑
//! inline      → operator precedence resolution into binary calls
//!   ↑
//! builder     → token shift into calls / conditionals / leaves
//!   ↑
//! classify    → token kinds, precedence, unary-minus expansion
//!   ↑
//! tokenize    → logos lexer over the canonical string
//!   ↑
//! preprocess  → comments, whitespace, sentinels, column references
//! ```
//!
//! Data flows strictly forward; each pass owns its output and has no side
//! effects on earlier stages.
//!
//! ## Entry points
//!
//! - [`compile`] - one formula in, one expression out, built-in registry.
//! - [`Compiler`] - the same pipeline over a borrowed registry with a
//!   configurable nesting limit.
//! - [`ApplyExpression`](frame::ApplyExpression) - attach a compiled formula
//!   to a `DataFrame`/`LazyFrame` as a new column.

pub mod builder;
pub mod classify;
pub mod emit;
pub mod error;
pub mod finalize;
pub mod frame;
pub mod inline;
pub mod preprocess;
pub mod registry;
pub mod tokenize;
pub mod tree;

pub use builder::DEFAULT_MAX_DEPTH;
pub use error::CompileError;
pub use frame::{ApplyExpression, FrameError};
pub use registry::{
    CallError, CallResult, Callable, Category, DocEntry, FunctionRegistry, FunctionSpec,
    ParamType, Params, Value,
};

use polars::prelude::Expr;

/// The compilation pipeline over a borrowed registry.
///
/// The registry is read-only state shared by all compilations; each call to
/// [`Compiler::compile`] owns its tree exclusively from build through emit.
pub struct Compiler<'r> {
    registry: &'r FunctionRegistry,
    max_depth: usize,
}

impl<'r> Compiler<'r> {
    pub fn new(registry: &'r FunctionRegistry) -> Self {
        Self {
            registry,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    /// Override the nesting-depth guard (default 256).
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Compile a formula string into a polars expression.
    pub fn compile(&self, expression: &str) -> Result<Expr, CompileError> {
        let (arena, root) = self.build(expression)?;
        emit::emit(&arena, root, self.registry)
    }

    /// Run every pass except emission, returning the finalized tree. Useful
    /// for rendering and structural inspection.
    pub fn build(&self, expression: &str) -> Result<(tree::Arena, tree::NodeId), CompileError> {
        let canonical = preprocess::preprocess(expression)?;
        tracing::trace!(formula = %canonical, "preprocessed");
        let raw = tokenize::tokenize(&canonical)?;
        let tokens = classify::classify_tokens(raw, self.registry)?;
        let (mut arena, root) = builder::build_hierarchy(&tokens, self.max_depth)?;
        inline::resolve_inline_operators(&mut arena, root)?;
        let root = finalize::finalize(&mut arena, root)?;
        tracing::trace!(formula = %arena.render(root), "finalized");
        Ok((arena, root))
    }
}

/// Compile a formula with the built-in function registry.
pub fn compile(expression: &str) -> Result<Expr, CompileError> {
    Compiler::new(FunctionRegistry::builtin()).compile(expression)
}
