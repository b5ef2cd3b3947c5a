// ABOUTME: Converts Sexp DSL source text into an AST using nom combinators

use nom::{
    branch::alt,
    bytes::complete::{escaped, tag, take_while, take_while1},
    character::complete::{char, digit1, multispace1, none_of, one_of},
    combinator::{not, opt, peek, recognize, value},
    multi::many0,
    IResult, Parser,
};

use crate::error::EvalError;
use crate::value::{Number, Value};

/// Skip whitespace and `;`-to-end-of-line comments.
fn ws_and_comments(input: &str) -> IResult<&str, ()> {
    fn comment(input: &str) -> IResult<&str, ()> {
        let (input, _) = char(';')(input)?;
        let (input, _) = take_while(|c| c != '\n')(input)?;
        Ok((input, ()))
    }

    many0(alt((value((), multispace1), comment)))
        .map(|_| ())
        .parse(input)
}

/// Integers and decimals with optional sign: `42`, `-42`, `3.14`, `-3.14`, `.5`.
/// A fractional part (even `.0`) always yields a `Float`; its absence yields `Int`.
fn parse_number(input: &str) -> IResult<&str, Value> {
    let (rest, text) = recognize((
        opt(char('-')),
        alt((
            recognize((digit1, opt((char('.'), opt(digit1))))),
            recognize((char('.'), digit1)),
        )),
    ))
    .parse(input)?;

    if text.contains('.') {
        let f: f64 = text.parse().expect("validated float literal");
        Ok((rest, Value::Number(Number::Float(f))))
    } else {
        let i: i64 = text.parse().expect("validated integer literal");
        Ok((rest, Value::Number(Number::Int(i))))
    }
}

/// A bare word boundary: the next character (if any) cannot continue an
/// identifier, so `truex` parses as a symbol rather than `true` + `x`.
fn word_boundary(input: &str) -> IResult<&str, ()> {
    not(peek(one_of(
        "abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789-_?!<>=+*/%",
    )))
    .parse(input)
}

fn parse_bool(input: &str) -> IResult<&str, Value> {
    let (rest, v) = alt((
        value(Value::Bool(true), tag("true")),
        value(Value::Bool(false), tag("false")),
    ))
    .parse(input)?;
    let (rest, _) = word_boundary(rest)?;
    Ok((rest, v))
}

fn parse_nil(input: &str) -> IResult<&str, Value> {
    let (rest, _) = tag("nil")(input)?;
    let (rest, _) = word_boundary(rest)?;
    Ok((rest, Value::Nil))
}

/// Bare identifier: starts with a letter or an operator character, continues
/// with alphanumerics, `-`, `_`, `?`, `!`, or an operator character.
fn parse_symbol(input: &str) -> IResult<&str, Value> {
    let (input, first) =
        one_of("abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ+-*/%<>=!?")(input)?;
    let (input, rest) = take_while1::<_, _, nom::error::Error<_>>(|c: char| {
        c.is_alphanumeric() || "-_?!<>=+*/%".contains(c)
    })(input)
    .unwrap_or((input, ""));

    let mut symbol = String::new();
    symbol.push(first);
    symbol.push_str(rest);
    Ok((input, Value::Symbol(symbol)))
}

fn parse_string(input: &str) -> IResult<&str, Value> {
    let (input, _) = char('"')(input)?;
    if let Ok((input, _)) = char::<_, nom::error::Error<_>>('"')(input) {
        return Ok((input, Value::String(String::new())));
    }

    let (input, content) = escaped(none_of("\"\\"), '\\', one_of("\"\\nrt"))(input)?;
    let (input, _) = char('"')(input)?;

    let mut result = String::new();
    let mut chars = content.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some('n') => result.push('\n'),
                Some('t') => result.push('\t'),
                Some('r') => result.push('\r'),
                Some('\\') => result.push('\\'),
                Some('"') => result.push('"'),
                Some(other) => {
                    result.push('\\');
                    result.push(other);
                }
                None => result.push('\\'),
            }
        } else {
            result.push(c);
        }
    }
    Ok((input, Value::String(result)))
}

/// `'expr` lowers to the distinct `Quoted` AST node (not a `(quote expr)` list).
fn parse_quote(input: &str) -> IResult<&str, Value> {
    let (input, _) = char('\'')(input)?;
    let (input, expr) = parse_expr(input)?;
    Ok((input, Value::Quoted(Box::new(expr))))
}

/// Empty list `()` parses to `Nil`, per the data model.
fn parse_list(input: &str) -> IResult<&str, Value> {
    let (input, _) = char('(')(input)?;
    let (input, _) = ws_and_comments(input)?;

    let mut items = Vec::new();
    let mut remaining = input;
    loop {
        if let Ok((rest, _)) = char::<_, nom::error::Error<_>>(')')(remaining) {
            return Ok((
                rest,
                if items.is_empty() {
                    Value::Nil
                } else {
                    Value::List(items)
                },
            ));
        }

        let (rest, expr) = parse_expr(remaining)?;
        items.push(expr);
        let (rest, _) = ws_and_comments(rest)?;
        remaining = rest;
    }
}

fn parse_expr(input: &str) -> IResult<&str, Value> {
    let (input, _) = ws_and_comments(input)?;
    alt((
        parse_quote,
        parse_list,
        parse_bool,
        parse_nil,
        parse_number,
        parse_string,
        parse_symbol,
    ))
    .parse(input)
}

/// 1-based line/column of the first character of `remaining` within `source`.
fn line_col(source: &str, remaining: &str) -> (usize, usize) {
    let consumed = source.len() - remaining.len();
    let prefix = &source[..consumed];
    let line = prefix.matches('\n').count() + 1;
    let column = match prefix.rfind('\n') {
        Some(idx) => prefix.len() - idx,
        None => prefix.len() + 1,
    };
    (line, column)
}

/// Parses the full input as exactly one top-level expression. Partial
/// parses (unconsumed trailing text) and multiple top-level expressions are
/// both errors, per §4.1.
pub fn parse(input: &str) -> Result<Value, EvalError> {
    let (after_ws, _) = ws_and_comments(input).unwrap_or((input, ()));
    if after_ws.trim().is_empty() {
        return Ok(Value::Nil);
    }

    match parse_expr(input) {
        Ok((rest, value)) => {
            let (rest, _) = ws_and_comments(rest).unwrap_or((rest, ()));
            if rest.is_empty() {
                Ok(value)
            } else {
                let (line, column) = line_col(input, rest);
                Err(EvalError::parse_error(
                    format!("unexpected trailing input: '{}'", rest),
                    line,
                    column,
                ))
            }
        }
        Err(nom::Err::Error(e)) | Err(nom::Err::Failure(e)) => {
            let (line, column) = line_col(input, e.input);
            Err(EvalError::parse_error(
                format!("unexpected token near '{}'", &e.input[..e.input.len().min(20)]),
                line,
                column,
            ))
        }
        Err(nom::Err::Incomplete(_)) => {
            let (line, column) = line_col(input, "");
            Err(EvalError::parse_error("unexpected end of input", line, column))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_integers_and_floats() {
        assert!(matches!(parse("42"), Ok(Value::Number(Number::Int(42)))));
        assert!(matches!(parse("-42"), Ok(Value::Number(Number::Int(-42)))));
        assert!(matches!(parse("3.14"), Ok(Value::Number(Number::Float(f))) if (f - 3.14).abs() < 1e-9));
        assert!(matches!(parse(".5"), Ok(Value::Number(Number::Float(f))) if (f - 0.5).abs() < 1e-9));
    }

    #[test]
    fn parse_bool_and_nil() {
        assert!(matches!(parse("true"), Ok(Value::Bool(true))));
        assert!(matches!(parse("false"), Ok(Value::Bool(false))));
        assert!(matches!(parse("nil"), Ok(Value::Nil)));
        // word boundary: "truex" is a symbol, not "true" + trailing garbage
        assert!(matches!(parse("truex"), Ok(Value::Symbol(s)) if s == "truex"));
    }

    #[test]
    fn parse_symbols_including_operators() {
        for sym in ["x", "foo-bar", "foo_bar", "foo?", "foo!", "+", "-", "*", "/", "<", ">", "=", ">="] {
            assert!(matches!(parse(sym), Ok(Value::Symbol(s)) if s == sym), "failed on {sym}");
        }
    }

    #[test]
    fn parse_strings_with_escapes() {
        assert!(matches!(parse(r#""hello""#), Ok(Value::String(s)) if s == "hello"));
        assert!(matches!(parse(r#""""#), Ok(Value::String(s)) if s.is_empty()));
        assert!(matches!(parse(r#""a\nb""#), Ok(Value::String(s)) if s == "a\nb"));
        assert!(matches!(parse(r#""say \"hi\"""#), Ok(Value::String(s)) if s == "say \"hi\""));
    }

    #[test]
    fn empty_list_is_nil() {
        assert!(matches!(parse("()"), Ok(Value::Nil)));
        assert!(matches!(parse("(  )"), Ok(Value::Nil)));
    }

    #[test]
    fn nested_lists() {
        match parse("(1 (2 3) 4)").unwrap() {
            Value::List(items) => {
                assert_eq!(items.len(), 3);
                assert!(matches!(items[1], Value::List(ref inner) if inner.len() == 2));
            }
            _ => panic!("expected list"),
        }
    }

    #[test]
    fn quote_shorthand_produces_quoted_node() {
        match parse("'x").unwrap() {
            Value::Quoted(inner) => assert!(matches!(*inner, Value::Symbol(s) if s == "x")),
            _ => panic!("expected Quoted node"),
        }
        match parse("'(1 2)").unwrap() {
            Value::Quoted(inner) => assert!(matches!(*inner, Value::List(ref l) if l.len() == 2)),
            _ => panic!("expected Quoted list"),
        }
    }

    #[test]
    fn comments_are_skipped() {
        assert!(matches!(parse("; comment\n42"), Ok(Value::Number(Number::Int(42)))));
        match parse("(1 2 ; trailing\n 3)").unwrap() {
            Value::List(items) => assert_eq!(items.len(), 3),
            _ => panic!("expected list"),
        }
    }

    #[test]
    fn defatom_style_expression_parses() {
        match parse("(define (square x) (* x x))").unwrap() {
            Value::List(items) => {
                assert_eq!(items.len(), 3);
                assert!(matches!(&items[0], Value::Symbol(s) if s == "define"));
            }
            _ => panic!("expected list"),
        }
    }

    #[test]
    fn whitespace_is_insignificant() {
        assert!(matches!(parse("  42  "), Ok(Value::Number(Number::Int(42)))));
        assert!(matches!(parse("\n42\n"), Ok(Value::Number(Number::Int(42)))));
    }

    #[test]
    fn unclosed_list_is_parse_error() {
        let err = parse("(1 2").unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::ParseError);
    }

    #[test]
    fn unexpected_closing_paren_is_parse_error() {
        assert!(parse(")").is_err());
    }

    #[test]
    fn multiple_top_level_expressions_is_an_error() {
        assert!(parse("1 2").is_err());
    }

    #[test]
    fn error_carries_one_based_line_and_column() {
        let err = parse("(+ 1 2\n  3").unwrap_err();
        assert!(err.0.details.contains_key("line"));
        assert!(err.0.details.contains_key("column"));
    }
}
