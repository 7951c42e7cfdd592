//! Dataframe integration.
//!
//! Gives `DataFrame` and `LazyFrame` an `apply_expression` method that
//! compiles a formula and materializes it as a new column.

use crate::error::CompileError;
use polars::prelude::{DataFrame, IntoLazy, LazyFrame, PolarsError};
use thiserror::Error;

/// Errors surfaced by the dataframe wrapper.
#[derive(Debug, Error)]
pub enum FrameError {
    #[error(transparent)]
    Compile(#[from] CompileError),
    #[error(transparent)]
    Polars(#[from] PolarsError),
}

/// Apply a compiled formula as a new column.
pub trait ApplyExpression: Sized {
    /// Compile `expression` and attach the result as `output_column`.
    fn apply_expression(&self, expression: &str, output_column: &str) -> Result<Self, FrameError>;
}

impl ApplyExpression for DataFrame {
    fn apply_expression(&self, expression: &str, output_column: &str) -> Result<Self, FrameError> {
        let expr = crate::compile(expression)?;
        Ok(self
            .clone()
            .lazy()
            .with_column(expr.alias(output_column))
            .collect()?)
    }
}

impl ApplyExpression for LazyFrame {
    fn apply_expression(&self, expression: &str, output_column: &str) -> Result<Self, FrameError> {
        let expr = crate::compile(expression)?;
        Ok(self.clone().with_column(expr.alias(output_column)))
    }
}
