//! Error types for formula compilation.
//!
//! One variant per pipeline failure mode. Every variant carries a
//! human-readable message and a best-effort byte offset anchoring the failure
//! in the canonical (preprocessed) formula text. Offsets are `None` for
//! invariant violations that are only discovered after the tree has been
//! built.

use thiserror::Error;

/// Errors raised while compiling a formula string into a polars expression.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CompileError {
    /// Unbalanced quotes or a malformed column reference in the raw input.
    #[error("preprocess error: {message}")]
    Preprocess {
        message: String,
        offset: Option<usize>,
    },

    /// Unterminated string/bracket or an illegal character.
    #[error("tokenize error: {message}")]
    Tokenize {
        message: String,
        offset: Option<usize>,
    },

    /// Consecutive binary operators with no operand between them.
    #[error("classify error: {message}")]
    Classify {
        message: String,
        offset: Option<usize>,
    },

    /// A token arrived in a context the builder cannot accept.
    #[error("unexpected token: {message}")]
    UnexpectedToken {
        message: String,
        offset: Option<usize>,
    },

    /// A function or conditional sentinel was not followed by `(`.
    #[error("missing bracket: {message}")]
    MissingBracket {
        message: String,
        offset: Option<usize>,
    },

    /// Input ended while a conditional was still open.
    #[error("missing endif: {message}")]
    MissingEndif {
        message: String,
        offset: Option<usize>,
    },

    /// Emission-time registry lookup failure.
    #[error("unknown function: {message}")]
    UnknownFunction {
        message: String,
        offset: Option<usize>,
    },

    /// An internal tree invariant was violated.
    #[error("malformed tree: {message}")]
    MalformedTree {
        message: String,
        offset: Option<usize>,
    },

    /// The configurable nesting-depth guard tripped.
    #[error("nesting limit exceeded: {message}")]
    NestingLimit {
        message: String,
        offset: Option<usize>,
    },
}

impl CompileError {
    pub fn preprocess(message: impl Into<String>, offset: Option<usize>) -> Self {
        Self::Preprocess {
            message: message.into(),
            offset,
        }
    }

    pub fn tokenize(message: impl Into<String>, offset: Option<usize>) -> Self {
        Self::Tokenize {
            message: message.into(),
            offset,
        }
    }

    pub fn classify(message: impl Into<String>, offset: Option<usize>) -> Self {
        Self::Classify {
            message: message.into(),
            offset,
        }
    }

    pub fn unexpected_token(message: impl Into<String>, offset: Option<usize>) -> Self {
        Self::UnexpectedToken {
            message: message.into(),
            offset,
        }
    }

    pub fn missing_bracket(message: impl Into<String>, offset: Option<usize>) -> Self {
        Self::MissingBracket {
            message: message.into(),
            offset,
        }
    }

    pub fn missing_endif(message: impl Into<String>, offset: Option<usize>) -> Self {
        Self::MissingEndif {
            message: message.into(),
            offset,
        }
    }

    pub fn unknown_function(message: impl Into<String>, offset: Option<usize>) -> Self {
        Self::UnknownFunction {
            message: message.into(),
            offset,
        }
    }

    pub fn malformed_tree(message: impl Into<String>, offset: Option<usize>) -> Self {
        Self::MalformedTree {
            message: message.into(),
            offset,
        }
    }

    pub fn nesting_limit(message: impl Into<String>, offset: Option<usize>) -> Self {
        Self::NestingLimit {
            message: message.into(),
            offset,
        }
    }

    /// The failure's anchor in the canonical formula text, when known.
    pub fn offset(&self) -> Option<usize> {
        match self {
            Self::Preprocess { offset, .. }
            | Self::Tokenize { offset, .. }
            | Self::Classify { offset, .. }
            | Self::UnexpectedToken { offset, .. }
            | Self::MissingBracket { offset, .. }
            | Self::MissingEndif { offset, .. }
            | Self::UnknownFunction { offset, .. }
            | Self::MalformedTree { offset, .. }
            | Self::NestingLimit { offset, .. } => *offset,
        }
    }

    /// The human-readable message without the variant prefix.
    pub fn message(&self) -> &str {
        match self {
            Self::Preprocess { message, .. }
            | Self::Tokenize { message, .. }
            | Self::Classify { message, .. }
            | Self::UnexpectedToken { message, .. }
            | Self::MissingBracket { message, .. }
            | Self::MissingEndif { message, .. }
            | Self::UnknownFunction { message, .. }
            | Self::MalformedTree { message, .. }
            | Self::NestingLimit { message, .. } => message,
        }
    }
}
