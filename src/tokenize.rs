//! Logos-based tokenizer for canonical formula text.
//!
//! Splits the preprocessed string into raw token strings: quoted literals
//! (quotes retained), `[...]` bracket tokens (nested pairs matched by depth),
//! operators (two-character forms matched greedily), punctuation, and
//! identifier runs. The identifier character set includes `.` and `$` so
//! `pl.col`, decimal numbers, and the conditional sentinels each come out as
//! a single token. Classification happens later; this pass only splits.

use crate::error::CompileError;
use logos::Logos;
use smol_str::SmolStr;

/// A raw token: its text and byte offset in the canonical string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawToken {
    pub text: SmolStr,
    pub offset: usize,
}

impl RawToken {
    pub fn new(text: impl Into<SmolStr>, offset: usize) -> Self {
        Self {
            text: text.into(),
            offset,
        }
    }
}

/// Consume a `[...]` token, matching nested bracket pairs by depth.
fn lex_bracket(lex: &mut logos::Lexer<'_, Lexeme>) -> bool {
    let mut depth = 1usize;
    for (i, c) in lex.remainder().char_indices() {
        match c {
            '[' => depth += 1,
            ']' => {
                depth -= 1;
                if depth == 0 {
                    lex.bump(i + 1);
                    return true;
                }
            }
            _ => {}
        }
    }
    false
}

/// Logos lexeme set for the canonical formula text.
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
enum Lexeme {
    #[regex(r"[ \t\r\n]+", logos::skip)]
    Whitespace,

    #[regex(r#""[^"]*""#)]
    DoubleQuoted,

    #[regex(r"'[^']*'")]
    SingleQuoted,

    #[token("[", lex_bracket)]
    Bracket,

    // Two-character operators before their single-character prefixes.
    #[token("!=")]
    BangEq,
    #[token("<=")]
    LtEq,
    #[token(">=")]
    GtEq,
    #[token("==")]
    EqEq,

    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("/")]
    Slash,
    #[token("=")]
    Eq,
    #[token("<")]
    Lt,
    #[token(">")]
    Gt,
    #[token("%")]
    Percent,

    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token(",")]
    Comma,

    /// Identifier runs: function names, numbers, sentinels, keywords.
    #[regex(r"[A-Za-z0-9_.$]+")]
    Word,
}

/// Tokenize canonical formula text into raw token strings.
///
/// Fails with [`CompileError::Tokenize`] on an unterminated string or
/// bracket, or any character outside the split set.
pub fn tokenize(input: &str) -> Result<Vec<RawToken>, CompileError> {
    let mut lexer = Lexeme::lexer(input);
    let mut tokens = Vec::new();
    while let Some(result) = lexer.next() {
        let offset = lexer.span().start;
        match result {
            Ok(_) => tokens.push(RawToken::new(lexer.slice(), offset)),
            Err(()) => {
                let message = match lexer.slice().chars().next() {
                    Some('\'') | Some('"') => "unterminated string literal".to_string(),
                    Some('[') => "unterminated column reference".to_string(),
                    Some(c) => format!("unexpected character '{c}'"),
                    None => "unexpected end of input".to_string(),
                };
                return Err(CompileError::tokenize(message, Some(offset)));
            }
        }
    }
    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(input: &str) -> Vec<String> {
        tokenize(input)
            .unwrap()
            .into_iter()
            .map(|t| t.text.to_string())
            .collect()
    }

    #[test]
    fn test_basic_tokenization() {
        assert_eq!(texts("a + b * c"), ["a", "+", "b", "*", "c"]);
    }

    #[test]
    fn test_string_literals() {
        assert_eq!(
            texts("concat('Hello, world!', variable)"),
            ["concat", "(", "'Hello, world!'", ",", "variable", ")"]
        );
        assert_eq!(
            texts("concat(\"Hello, world!\", variable)"),
            ["concat", "(", "\"Hello, world!\"", ",", "variable", ")"]
        );
    }

    #[test]
    fn test_nested_functions() {
        assert_eq!(
            texts("round(sqrt(a * b), 2)"),
            ["round", "(", "sqrt", "(", "a", "*", "b", ")", ",", "2", ")"]
        );
    }

    #[test]
    fn test_logical_operators() {
        assert_eq!(
            texts("a > 0 and b < 10 or c == 5"),
            ["a", ">", "0", "and", "b", "<", "10", "or", "c", "==", "5"]
        );
    }

    #[test]
    fn test_brackets() {
        assert_eq!(
            texts("[column1] + [column2] * 2"),
            ["[column1]", "+", "[column2]", "*", "2"]
        );
    }

    #[test]
    fn test_nested_brackets() {
        assert_eq!(texts("[[nested_column]]"), ["[[nested_column]]"]);
    }

    #[test]
    fn test_operators_in_strings() {
        assert_eq!(texts("'a + b * c / d'"), ["'a + b * c / d'"]);
        assert_eq!(texts("\"a > b and c < d\""), ["\"a > b and c < d\""]);
    }

    #[test]
    fn test_equality_operators() {
        assert_eq!(
            texts("a == b != c >= d <= e"),
            ["a", "==", "b", "!=", "c", ">=", "d", "<=", "e"]
        );
    }

    #[test]
    fn test_parentheses() {
        assert_eq!(
            texts("(a + b) * (c - d)"),
            ["(", "a", "+", "b", ")", "*", "(", "c", "-", "d", ")"]
        );
    }

    #[test]
    fn test_whitespace_handling() {
        assert_eq!(texts("  a  +  b  *  c  "), ["a", "+", "b", "*", "c"]);
    }

    #[test]
    fn test_mixed_operators() {
        assert_eq!(
            texts("a + b * c / d - e % f"),
            ["a", "+", "b", "*", "c", "/", "d", "-", "e", "%", "f"]
        );
    }

    #[test]
    fn test_decimal_numbers() {
        assert_eq!(texts("1.23 + 4.56 * 7.89"), ["1.23", "+", "4.56", "*", "7.89"]);
    }

    #[test]
    fn test_string_with_special_chars() {
        assert_eq!(
            texts("'string with (parens) and [brackets] and operators + - * /'"),
            ["'string with (parens) and [brackets] and operators + - * /'"]
        );
    }

    #[test]
    fn test_if_else_sentinels() {
        assert_eq!(
            texts("$if$(condition)$then$(action)$else$(other_action)$endif$"),
            [
                "$if$", "(", "condition", ")", "$then$", "(", "action", ")", "$else$", "(",
                "other_action", ")", "$endif$"
            ]
        );
    }

    #[test]
    fn test_complex_formula() {
        let formula = "$if$((pl.col(\"a\")>10 and pl.col(\"b\")<5) or pl.col(\"c\")='value')$then$(concat(pl.col(\"a\"),' is ',pl.col(\"b\")))$else$('not matched')$endif$";
        assert_eq!(
            texts(formula),
            [
                "$if$", "(", "(", "pl.col", "(", "\"a\"", ")", ">", "10", "and", "pl.col", "(",
                "\"b\"", ")", "<", "5", ")", "or", "pl.col", "(", "\"c\"", ")", "=", "'value'",
                ")", "$then$", "(", "concat", "(", "pl.col", "(", "\"a\"", ")", ",", "' is '",
                ",", "pl.col", "(", "\"b\"", ")", ")", ")", "$else$", "(", "'not matched'", ")",
                "$endif$"
            ]
        );
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(texts(""), Vec::<String>::new());
    }

    #[test]
    fn test_unterminated_string() {
        let err = tokenize("concat('open").unwrap_err();
        assert!(matches!(err, CompileError::Tokenize { .. }));
    }

    #[test]
    fn test_unterminated_bracket() {
        let err = tokenize("[open + 1").unwrap_err();
        assert!(matches!(err, CompileError::Tokenize { .. }));
    }

    #[test]
    fn test_roundtrip_through_minimal_whitespace() {
        // Re-joining tokens with single spaces re-parses to the same list.
        for input in [
            "pl.col(\"a\")+pl.col(\"b\")*2",
            "$if$(a>1 and b<2)$then$('x')$else$('y')$endif$",
            "concat('a, b',[col,ref],1.5)",
        ] {
            let first = texts(input);
            let rejoined = first.join(" ");
            assert_eq!(texts(&rejoined), first, "for {input:?}");
        }
    }

    #[test]
    fn test_offsets() {
        let tokens = tokenize("a+pl.col(\"x\")").unwrap();
        assert_eq!(tokens[0].offset, 0);
        assert_eq!(tokens[1].offset, 1);
        assert_eq!(tokens[2].offset, 2);
        assert_eq!(tokens[3].offset, 8);
    }
}
