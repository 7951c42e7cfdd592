//! Text canonicalization ahead of tokenization.
//!
//! Rewrites a raw formula string into a canonical form the tokenizer can
//! split mechanically: comments stripped, whitespace collapsed, `==`
//! standardized to `=`, conditional keywords wrapped into sentinel form
//! (`if C then X else Y endif` becomes `$if$( C )$then$( X )$else$( Y )$endif$`),
//! `[name]` column references rewritten to `pl.col("name")`, and all
//! non-semantic spaces removed except those separating `and`/`or` from their
//! operands.
//!
//! Every step is a pure text transform and the whole pipeline is idempotent:
//! `preprocess(preprocess(s)) == preprocess(s)`.

use crate::error::CompileError;

/// Characters that can form part of a word. `$` is included so the sentinel
/// tokens (`$if$`, ...) are words of their own and a second pass cannot
/// re-wrap them.
fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '$'
}

/// Run the full canonicalization pipeline.
///
/// Marker restoration runs after space stripping: the `__and__`/`__or__`
/// markers exist precisely so the stripper cannot glue logical operators to
/// their operands.
pub fn preprocess(input: &str) -> Result<String, CompileError> {
    let text = strip_comments(input);
    check_quotes_balanced(&text)?;
    let text = collapse_whitespace(&text);
    let text = mark_logical_operators(&text);
    let text = standardize_equality(&text);
    let text = mark_conditional_keywords(&text);
    let text = rewrite_column_refs(&text)?;
    let text = strip_spaces_outside_quotes(&text);
    Ok(restore_logical_operators(&text))
}

/// Remove `//` line comments. A `//` inside a quoted string is literal; the
/// newline terminating a comment is kept.
pub fn strip_comments(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let chars: Vec<char> = input.chars().collect();
    let mut quote: Option<char> = None;
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        match quote {
            Some(q) => {
                out.push(c);
                if c == q {
                    quote = None;
                }
            }
            None => {
                if c == '\'' || c == '"' {
                    quote = Some(c);
                    out.push(c);
                } else if c == '/' && chars.get(i + 1) == Some(&'/') {
                    while i < chars.len() && chars[i] != '\n' {
                        i += 1;
                    }
                    continue;
                } else {
                    out.push(c);
                }
            }
        }
        i += 1;
    }
    out
}

/// Fail with a [`CompileError::Preprocess`] when a quote is left open.
pub fn check_quotes_balanced(input: &str) -> Result<(), CompileError> {
    let mut quote: Option<(char, usize)> = None;
    for (idx, c) in input.char_indices() {
        match quote {
            Some((q, _)) if c == q => quote = None,
            None if c == '\'' || c == '"' => quote = Some((c, idx)),
            _ => {}
        }
    }
    if let Some((q, idx)) = quote {
        return Err(CompileError::preprocess(
            format!("unbalanced quote {q}"),
            Some(idx),
        ));
    }
    Ok(())
}

/// Collapse all whitespace runs (newlines and tabs included) to one space.
pub fn collapse_whitespace(input: &str) -> String {
    input.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Replace the whole-word operators `and`/`or`/`in` outside quotes with
/// unique markers so later substitutions cannot damage them.
pub fn mark_logical_operators(input: &str) -> String {
    replace_words_outside_quotes(
        input,
        &[("and", "__and__"), ("or", "__or__"), ("in", "__in__")],
    )
}

/// Turn the markers back into ` and ` / ` or ` / ` in ` with surrounding
/// spaces.
pub fn restore_logical_operators(input: &str) -> String {
    let restored = replace_outside_quotes(input, "__and__", " and ");
    let restored = replace_outside_quotes(&restored, "__or__", " or ");
    replace_outside_quotes(&restored, "__in__", " in ")
}

/// Replace the `==` synonym with the canonical `=` outside quotes.
pub fn standardize_equality(input: &str) -> String {
    replace_outside_quotes(input, "==", "=")
}

/// Rewrite conditional keywords into sentinel form, wrapping each clause in
/// parentheses so the builder sees every branch as a sub-expression.
pub fn mark_conditional_keywords(input: &str) -> String {
    replace_words_outside_quotes(
        input,
        &[
            ("if", "$if$("),
            ("then", ")$then$("),
            ("elseif", ")$elseif$("),
            ("else", ")$else$("),
            ("endif", ")$endif$"),
        ],
    )
}

/// Rewrite `[name]` column references (outside quotes, comma-free content)
/// to the engine's column lookup `pl.col("name")`. Nested bracket pairs are
/// matched by depth. A reference with a comma in it is left untouched.
pub fn rewrite_column_refs(input: &str) -> Result<String, CompileError> {
    let chars: Vec<char> = input.chars().collect();
    let mut out = String::with_capacity(input.len());
    let mut quote: Option<char> = None;
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        match quote {
            Some(q) => {
                out.push(c);
                if c == q {
                    quote = None;
                }
                i += 1;
            }
            None => {
                if c == '\'' || c == '"' {
                    quote = Some(c);
                    out.push(c);
                    i += 1;
                } else if c == '[' {
                    let mut depth = 1usize;
                    let mut j = i + 1;
                    while j < chars.len() && depth > 0 {
                        match chars[j] {
                            '[' => depth += 1,
                            ']' => depth -= 1,
                            _ => {}
                        }
                        j += 1;
                    }
                    if depth > 0 {
                        return Err(CompileError::preprocess(
                            "unclosed column reference",
                            Some(i),
                        ));
                    }
                    let content: String = chars[i + 1..j - 1].iter().collect();
                    if content.contains(',') {
                        out.push('[');
                        out.push_str(&content);
                        out.push(']');
                    } else {
                        out.push_str("pl.col(\"");
                        out.push_str(&content);
                        out.push_str("\")");
                    }
                    i = j;
                } else {
                    out.push(c);
                    i += 1;
                }
            }
        }
    }
    Ok(out)
}

/// Remove spaces outside quotes. Runs while the logical operators are still
/// in marker form, so their separating spaces can be reintroduced afterwards.
pub fn strip_spaces_outside_quotes(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut quote: Option<char> = None;
    for c in input.chars() {
        match quote {
            Some(q) => {
                out.push(c);
                if c == q {
                    quote = None;
                }
            }
            None => {
                if c == '\'' || c == '"' {
                    quote = Some(c);
                    out.push(c);
                } else if c != ' ' {
                    out.push(c);
                }
            }
        }
    }
    out
}

/// Replace every whole-word occurrence from `table` outside quoted strings.
fn replace_words_outside_quotes(input: &str, table: &[(&str, &str)]) -> String {
    let chars: Vec<char> = input.chars().collect();
    let mut out = String::with_capacity(input.len());
    let mut quote: Option<char> = None;
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        match quote {
            Some(q) => {
                out.push(c);
                if c == q {
                    quote = None;
                }
                i += 1;
            }
            None => {
                if c == '\'' || c == '"' {
                    quote = Some(c);
                    out.push(c);
                    i += 1;
                } else if is_word_char(c) {
                    let start = i;
                    while i < chars.len() && is_word_char(chars[i]) {
                        i += 1;
                    }
                    let word: String = chars[start..i].iter().collect();
                    match table.iter().find(|(from, _)| *from == word) {
                        Some((_, to)) => out.push_str(to),
                        None => out.push_str(&word),
                    }
                } else {
                    out.push(c);
                    i += 1;
                }
            }
        }
    }
    out
}

/// Replace every occurrence of `pat` outside quoted strings.
fn replace_outside_quotes(input: &str, pat: &str, rep: &str) -> String {
    let chars: Vec<char> = input.chars().collect();
    let pat_chars: Vec<char> = pat.chars().collect();
    let mut out = String::with_capacity(input.len());
    let mut quote: Option<char> = None;
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        match quote {
            Some(q) => {
                out.push(c);
                if c == q {
                    quote = None;
                }
                i += 1;
            }
            None => {
                if c == '\'' || c == '"' {
                    quote = Some(c);
                    out.push(c);
                    i += 1;
                } else if chars[i..].starts_with(&pat_chars[..]) {
                    out.push_str(rep);
                    i += pat_chars.len();
                } else {
                    out.push(c);
                    i += 1;
                }
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_comments() {
        assert_eq!(strip_comments("code // This is a comment"), "code ");
        assert_eq!(
            strip_comments("line1 // comment1\nline2 // comment2\nline3"),
            "line1 \nline2 \nline3"
        );
    }

    #[test]
    fn test_strip_comments_preserves_quoted() {
        let input = "text with 'string // not a comment' continues";
        assert_eq!(strip_comments(input), input);

        let input = "text with \"string // not a comment\" continues";
        assert_eq!(strip_comments(input), input);

        assert_eq!(
            strip_comments("function(param) // comment\nreturn \"string with // preserved\""),
            "function(param) \nreturn \"string with // preserved\""
        );
    }

    #[test]
    fn test_collapse_whitespace() {
        assert_eq!(collapse_whitespace("line1\nline2\n\nline3"), "line1 line2 line3");
        assert_eq!(collapse_whitespace("simple text"), "simple text");
        assert_eq!(
            collapse_whitespace("text with\ttabs  and    spaces"),
            "text with tabs and spaces"
        );
    }

    #[test]
    fn test_mark_and_restore_logical_operators() {
        let marked = mark_logical_operators("condition1 and condition2 or condition3");
        assert_eq!(marked, "condition1 __and__ condition2 __or__ condition3");
        assert_eq!(
            restore_logical_operators(&marked),
            "condition1  and  condition2  or  condition3"
        );

        let marked = mark_logical_operators("condition1 and 'quoted and string' or condition2");
        assert_eq!(marked, "condition1 __and__ 'quoted and string' __or__ condition2");
    }

    #[test]
    fn test_mark_logical_operators_whole_words_only() {
        assert_eq!(mark_logical_operators("band or chord"), "band __or__ chord");
        assert_eq!(mark_logical_operators("android"), "android");
    }

    #[test]
    fn test_standardize_equality() {
        assert_eq!(
            standardize_equality("field1 == value1 and field2 == value2"),
            "field1 = value1 and field2 = value2"
        );
        assert_eq!(
            standardize_equality("field1 == value1 and 'text == more'"),
            "field1 = value1 and 'text == more'"
        );
    }

    #[test]
    fn test_mark_conditional_keywords() {
        assert_eq!(
            mark_conditional_keywords("if condition then action else other endif"),
            "$if$( condition )$then$( action )$else$( other )$endif$"
        );
        assert_eq!(
            mark_conditional_keywords("if condition then 'if then else' endif"),
            "$if$( condition )$then$( 'if then else' )$endif$"
        );
        assert_eq!(
            mark_conditional_keywords("if c1 then a1 elseif c2 then a2 else a3 endif"),
            "$if$( c1 )$then$( a1 )$elseif$( c2 )$then$( a2 )$else$( a3 )$endif$"
        );
    }

    #[test]
    fn test_mark_conditional_keywords_does_not_rewrap() {
        let once = mark_conditional_keywords("if c then a else b endif");
        assert_eq!(mark_conditional_keywords(&once), once);
    }

    #[test]
    fn test_rewrite_column_refs() {
        assert_eq!(
            rewrite_column_refs("function([column1] + [column2] * 2)").unwrap(),
            "function(pl.col(\"column1\") + pl.col(\"column2\") * 2)"
        );
        assert_eq!(
            rewrite_column_refs("function([column1], '[column2]')").unwrap(),
            "function(pl.col(\"column1\"), '[column2]')"
        );
        // A comma inside the reference blocks the rewrite.
        assert_eq!(
            rewrite_column_refs("function([column1, column2])").unwrap(),
            "function([column1, column2])"
        );
    }

    #[test]
    fn test_rewrite_column_refs_unclosed() {
        let err = rewrite_column_refs("[open + 1").unwrap_err();
        assert!(matches!(err, CompileError::Preprocess { .. }));
        assert_eq!(err.offset(), Some(0));
    }

    #[test]
    fn test_strip_spaces_outside_quotes() {
        assert_eq!(
            strip_spaces_outside_quotes("  function  (  param1  ,  param2  )  "),
            "function(param1,param2)"
        );
        assert_eq!(
            strip_spaces_outside_quotes("function( 'quoted  string', \"another  string\" )"),
            "function('quoted  string',\"another  string\")"
        );
    }

    #[test]
    fn test_preprocess_simple() {
        assert_eq!(
            preprocess("[col1] + [col2] * 2").unwrap(),
            "pl.col(\"col1\")+pl.col(\"col2\")*2"
        );
    }

    #[test]
    fn test_preprocess_logical_operators() {
        let result = preprocess("[col1] > 0 and [col2] < 10").unwrap();
        assert!(result.contains("pl.col(\"col1\")>0"));
        assert!(result.contains("pl.col(\"col2\")<10"));
        assert!(result.contains(" and "));
    }

    #[test]
    fn test_preprocess_conditional() {
        let input = "\n if [col1] == [col2] and length([col3]) > 5 // Check conditions\n then \n concat([col1], ' ', [col2])  // Concat columns\n else \n 'Not matched' // Default value\n endif\n ";
        let result = preprocess(input).unwrap();
        assert!(result.contains("$if$"));
        assert!(result.contains("pl.col(\"col1\")"));
        assert!(result.contains("pl.col(\"col2\")"));
        assert!(result.contains("$then$"));
        assert!(result.contains("$else$"));
        assert!(result.contains("$endif$"));
        assert!(!result.contains("//"));
    }

    #[test]
    fn test_preprocess_unbalanced_quote() {
        let err = preprocess("concat('open, [a])").unwrap_err();
        assert!(matches!(err, CompileError::Preprocess { .. }));
    }

    #[test]
    fn test_preprocess_idempotent() {
        for input in [
            "[col1] + [col2] * 2",
            "if [a] < 3 then 'small' else 'large' endif",
            "[col1] > 0 and [col2] < 10 or [col3] = 'x'",
            "concat([text], ' // literal')",
            "uppercase(trim([text]))",
        ] {
            let once = preprocess(input).unwrap();
            let twice = preprocess(&once).unwrap();
            assert_eq!(once, twice, "preprocess not idempotent for {input:?}");
        }
    }
}
