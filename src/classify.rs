//! Token classification.
//!
//! Wraps each raw token string with a semantic kind and, for operators, a
//! precedence. Also canonicalizes single-quoted literals to double quotes and
//! resolves the ambiguous minus sign: a unary `-` becomes the two-token
//! sequence `__negative()` `*`, and a binary `A - B` becomes
//! `A + __negative() * B`, so the operator resolver only ever sees `+` at
//! that precedence level.

use crate::error::CompileError;
use crate::registry::FunctionRegistry;
use crate::tokenize::RawToken;
use smol_str::SmolStr;

/// The sentinel emitted for a resolved unary minus.
pub const NEGATIVE_SENTINEL: &str = "__negative()";

/// Semantic kind of a classified token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    String,
    Number,
    Boolean,
    Operator,
    Function,
    Column,
    Empty,
    CaseWhen,
    Prio,
    Sep,
    Special,
}

impl TokenKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::Operator => "operator",
            Self::Function => "function",
            Self::Column => "column",
            Self::Empty => "empty",
            Self::CaseWhen => "case_when",
            Self::Prio => "prio",
            Self::Sep => "sep",
            Self::Special => "special",
        }
    }
}

/// Binding strength of an operator; higher binds tighter.
///
/// `in` is the membership test recovered from the original surface; it binds
/// like a comparison.
pub fn precedence(op: &str) -> Option<u8> {
    match op {
        "or" => Some(1),
        "and" => Some(2),
        "=" | "!=" | "<" | ">" | "<=" | ">=" | "in" => Some(3),
        "+" | "-" => Some(4),
        "*" | "/" => Some(5),
        _ => None,
    }
}

/// Whether `s` is a member of the operator set.
pub fn is_operator(s: &str) -> bool {
    precedence(s).is_some()
}

/// A classified token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub text: SmolStr,
    pub kind: TokenKind,
    pub precedence: Option<u8>,
    /// Byte offset in the canonical formula text; best-effort diagnostics
    /// anchor. Synthesized tokens reuse the offset of the token they replace.
    pub offset: usize,
}

impl Token {
    /// Classify a single token value.
    pub fn classify(text: SmolStr, offset: usize, registry: &FunctionRegistry) -> Self {
        let kind = classify_value(&text, registry);
        let precedence = if kind == TokenKind::Operator {
            precedence(&text)
        } else {
            None
        };
        Self {
            text,
            kind,
            precedence,
            offset,
        }
    }

    /// A synthesized token (not present in the source text).
    pub fn synthetic(text: &str, kind: TokenKind, offset: usize) -> Self {
        Self {
            text: SmolStr::new(text),
            kind,
            precedence: if kind == TokenKind::Operator {
                precedence(text)
            } else {
                None
            },
            offset,
        }
    }

    pub fn is_open_paren(&self) -> bool {
        self.kind == TokenKind::Prio && self.text == "("
    }

    pub fn is_close_paren(&self) -> bool {
        self.kind == TokenKind::Prio && self.text == ")"
    }

    pub fn is_operator(&self) -> bool {
        self.kind == TokenKind::Operator
    }
}

fn classify_value(val: &str, registry: &FunctionRegistry) -> TokenKind {
    if val.eq_ignore_ascii_case("true") || val.eq_ignore_ascii_case("false") {
        TokenKind::Boolean
    } else if is_operator(val) {
        TokenKind::Operator
    } else if val == "(" || val == ")" {
        TokenKind::Prio
    } else if val.is_empty() {
        TokenKind::Empty
    } else if registry.contains(val) {
        TokenKind::Function
    } else if matches!(val, "$if$" | "$then$" | "$elseif$" | "$else$" | "$endif$") {
        TokenKind::CaseWhen
    } else if is_number(val) {
        TokenKind::Number
    } else if val == NEGATIVE_SENTINEL {
        TokenKind::Special
    } else if val == "," {
        TokenKind::Sep
    } else if val.starts_with('[') && val.ends_with(']') && val.len() >= 2 {
        TokenKind::Column
    } else {
        TokenKind::String
    }
}

/// Digit runs, optionally `-`-prefixed, optionally with one decimal point.
fn is_number(val: &str) -> bool {
    let digits = val.strip_prefix('-').unwrap_or(val);
    if digits.is_empty() {
        return false;
    }
    match digits.split_once('.') {
        None => digits.bytes().all(|b| b.is_ascii_digit()),
        Some((int, frac)) => {
            !int.is_empty()
                && !frac.is_empty()
                && int.bytes().all(|b| b.is_ascii_digit())
                && frac.bytes().all(|b| b.is_ascii_digit())
        }
    }
}

/// Rewrite `'...'` tokens to `"..."`; inner content is untouched.
pub fn standardize_quotes(tokens: Vec<RawToken>) -> Vec<RawToken> {
    tokens
        .into_iter()
        .map(|t| {
            if t.text.len() >= 2 && t.text.starts_with('\'') && t.text.ends_with('\'') {
                let inner = &t.text[1..t.text.len() - 1];
                RawToken::new(format!("\"{inner}\""), t.offset)
            } else {
                t
            }
        })
        .collect()
}

/// Classify raw tokens: canonicalize quotes, wrap each value, drop empties,
/// then resolve ambiguous minus signs.
pub fn classify_tokens(
    tokens: Vec<RawToken>,
    registry: &FunctionRegistry,
) -> Result<Vec<Token>, CompileError> {
    let classified: Vec<Token> = standardize_quotes(tokens)
        .into_iter()
        .map(|t| Token::classify(t.text, t.offset, registry))
        .filter(|t| t.kind != TokenKind::Empty)
        .collect();
    resolve_minus_signs(classified)
}

/// Whether a unary `-` can directly follow this token.
fn starts_operand_context(token: &Token) -> bool {
    match token.kind {
        TokenKind::Operator | TokenKind::Sep | TokenKind::CaseWhen | TokenKind::Special => true,
        TokenKind::Prio => token.text == "(",
        _ => false,
    }
}

/// Replace ambiguous `-` tokens.
///
/// A `-` at the start of an operand position is unary and becomes
/// `__negative()` `*`; after a completed operand it is binary subtraction
/// and becomes `+` `__negative()` `*`. A `-` directly before another `-` is
/// rejected.
pub fn resolve_minus_signs(tokens: Vec<Token>) -> Result<Vec<Token>, CompileError> {
    let mut out = Vec::with_capacity(tokens.len());
    for (i, token) in tokens.iter().enumerate() {
        if !(token.kind == TokenKind::Operator && token.text == "-") {
            out.push(token.clone());
            continue;
        }
        if let Some(next) = tokens.get(i + 1) {
            if next.kind == TokenKind::Operator && next.text == "-" {
                return Err(CompileError::classify(
                    "consecutive '-' operators with no operand between them",
                    Some(next.offset),
                ));
            }
        }
        let unary = i == 0 || starts_operand_context(&tokens[i - 1]);
        if !unary {
            out.push(Token::synthetic("+", TokenKind::Operator, token.offset));
        }
        out.push(Token::synthetic(
            NEGATIVE_SENTINEL,
            TokenKind::Special,
            token.offset,
        ));
        out.push(Token::synthetic("*", TokenKind::Operator, token.offset));
    }
    Ok(out)
}
