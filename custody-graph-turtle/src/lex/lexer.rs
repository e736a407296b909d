//! winnow-based Turtle lexer.
//!
//! Produces the whole token vector up front and stops at the first invalid
//! character, reporting line, column and the offending source line.

use std::sync::Arc;

use winnow::combinator::{alt, delimited};
use winnow::error::{ContextError, ErrMode};
use winnow::stream::{Location, Stream};
use winnow::token::{any, one_of, take_while};
use winnow::{LocatingSlice, ModalResult, Parser};

use super::chars::*;
use super::token::{Token, TokenKind};
use crate::error::{Result, TurtleError};

type Input<'a> = LocatingSlice<&'a str>;

pub struct Lexer<'a> {
    source: &'a str,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Self { source }
    }

    /// Tokenize the whole source. The last token is always `Eof`.
    pub fn tokenize(self) -> Result<Vec<Token>> {
        let mut input = LocatingSlice::new(self.source);
        let mut tokens = Vec::new();

        loop {
            skip_trivia(&mut input);
            let start = input.current_token_start();
            if input.is_empty() {
                tokens.push(Token {
                    kind: TokenKind::Eof,
                    start,
                    end: start,
                });
                return Ok(tokens);
            }

            let checkpoint = input.checkpoint();
            match next_token(&mut input) {
                Ok(kind) => tokens.push(Token {
                    kind,
                    start,
                    end: input.current_token_start(),
                }),
                Err(_) => {
                    input.reset(&checkpoint);
                    return Err(self.error_at(start, remaining(&input)));
                }
            }
        }
    }

    fn error_at(&self, position: usize, rest: &str) -> TurtleError {
        let before = &self.source[..position];
        let line = before.matches('\n').count() + 1;
        let line_start = before.rfind('\n').map_or(0, |i| i + 1);
        let column = before[line_start..].chars().count() + 1;
        let source_line = self.source[line_start..].lines().next().unwrap_or("");

        let what = match rest.chars().next() {
            Some('"') | Some('\'') => "unterminated or invalid string literal".to_string(),
            Some('<') => "invalid or unterminated IRI".to_string(),
            Some(c) => format!("unexpected character '{}'", c.escape_default()),
            None => "unexpected end of input".to_string(),
        };
        let pointer = " ".repeat(column - 1);

        TurtleError::Lexer {
            position,
            line,
            column,
            message: format!("{what}\n  |\n  | {source_line}\n  | {pointer}^"),
        }
    }
}

/// Tokenize a Turtle document.
pub fn tokenize(source: &str) -> Result<Vec<Token>> {
    Lexer::new(source).tokenize()
}

fn backtrack<T>() -> ModalResult<T> {
    Err(ErrMode::Backtrack(ContextError::new()))
}

fn remaining<'a>(input: &Input<'a>) -> &'a str {
    **input
}

fn skip_trivia(input: &mut Input<'_>) {
    loop {
        let _: ModalResult<&str> = take_while(0.., is_ws).parse_next(input);
        if !input.starts_with('#') {
            return;
        }
        let _: ModalResult<&str> = take_while(0.., |c| c != '\n').parse_next(input);
    }
}

fn next_token(input: &mut Input<'_>) -> ModalResult<TokenKind> {
    alt((
        "^^".value(TokenKind::DoubleCaret),
        iri_ref,
        blank_node_label,
        delimited('[', take_while(0.., is_ws), ']').value(TokenKind::Anon),
        delimited('(', take_while(0.., is_ws), ')').value(TokenKind::Nil),
        at_word,
        prefixed_name_or_keyword,
        string_literal,
        number,
        punctuation,
    ))
    .parse_next(input)
}

fn iri_ref(input: &mut Input<'_>) -> ModalResult<TokenKind> {
    '<'.parse_next(input)?;
    let mut iri = String::new();
    loop {
        let chunk: &str = take_while(0.., is_iri_char).parse_next(input)?;
        iri.push_str(chunk);
        match any.parse_next(input)? {
            '>' => return Ok(TokenKind::Iri(Arc::from(iri))),
            '\\' => {
                let marker = one_of(['u', 'U']).parse_next(input)?;
                iri.push(unicode_escape(input, marker)?);
            }
            _ => return backtrack(),
        }
    }
}

/// Hex digits of `\uXXXX` / `\UXXXXXXXX`, after the marker letter.
fn unicode_escape(input: &mut Input<'_>, marker: char) -> ModalResult<char> {
    let width = if marker == 'u' { 4 } else { 8 };
    let hex: &str = take_while(width..=width, |c: char| c.is_ascii_hexdigit()).parse_next(input)?;
    match u32::from_str_radix(hex, 16).ok().and_then(char::from_u32) {
        Some(c) => Ok(c),
        None => backtrack(),
    }
}

/// Byte length of a name made of `first` then `rest` or `.`, never ending in `.`.
fn name_len(s: &str, first: impl Fn(char) -> bool, rest: impl Fn(char) -> bool) -> usize {
    let mut end = 0;
    for (i, c) in s.char_indices() {
        let accepted = if i == 0 { first(c) } else { rest(c) || c == '.' };
        if !accepted {
            break;
        }
        if c != '.' {
            end = i + c.len_utf8();
        }
    }
    end
}

fn blank_node_label(input: &mut Input<'_>) -> ModalResult<TokenKind> {
    "_:".parse_next(input)?;
    let len = name_len(
        remaining(input),
        |c| is_pn_chars_u(c) || c.is_ascii_digit(),
        is_pn_chars,
    );
    if len == 0 {
        return backtrack();
    }
    let label = input.next_slice(len);
    Ok(TokenKind::BlankNodeLabel(Arc::from(label)))
}

/// `@prefix`, `@base`, or a language tag.
fn at_word(input: &mut Input<'_>) -> ModalResult<TokenKind> {
    '@'.parse_next(input)?;
    let word: &str =
        take_while(1.., |c: char| c.is_ascii_alphanumeric() || c == '-').parse_next(input)?;
    Ok(match word {
        "prefix" => TokenKind::KwPrefix,
        "base" => TokenKind::KwBase,
        tag => TokenKind::LangTag(Arc::from(tag)),
    })
}

fn prefixed_name_or_keyword(input: &mut Input<'_>) -> ModalResult<TokenKind> {
    let rest = remaining(input);
    let prefix_len = name_len(rest, is_pn_chars_base, is_pn_chars);

    if rest[prefix_len..].starts_with(':') {
        let prefix: Arc<str> = Arc::from(input.next_slice(prefix_len));
        input.next_slice(1);
        return Ok(match local_name(input)? {
            Some(local) => TokenKind::PrefixedName {
                prefix,
                local: Arc::from(local),
            },
            None => TokenKind::PrefixedNameNs(prefix),
        });
    }

    let kind = match &rest[..prefix_len] {
        "a" => TokenKind::KwA,
        "true" => TokenKind::KwTrue,
        "false" => TokenKind::KwFalse,
        w if w.eq_ignore_ascii_case("prefix") => TokenKind::KwSparqlPrefix,
        w if w.eq_ignore_ascii_case("base") => TokenKind::KwSparqlBase,
        _ => return backtrack(),
    };
    input.next_slice(prefix_len);
    Ok(kind)
}

/// `PN_LOCAL` after the colon, with `%XX` kept and `\x` escapes decoded.
/// Returns `None` when no local part follows.
fn local_name(input: &mut Input<'_>) -> ModalResult<Option<String>> {
    let rest = remaining(input);
    let mut value = String::new();
    let mut consumed = 0;
    let mut kept = 0;
    let mut chars = rest.char_indices();

    while let Some((i, c)) = chars.next() {
        match c {
            '%' => {
                let Some(hex) = rest.get(i + 1..i + 3) else {
                    break;
                };
                if !hex.chars().all(|h| h.is_ascii_hexdigit()) {
                    break;
                }
                value.push('%');
                value.push_str(hex);
                chars.nth(1);
                consumed = i + 3;
            }
            '\\' => match chars.next() {
                Some((j, e)) if LOCAL_ESCAPES.contains(e) => {
                    value.push(e);
                    consumed = j + e.len_utf8();
                }
                _ => return backtrack(),
            },
            '.' if i > 0 => {
                value.push('.');
                continue;
            }
            c if i == 0 && is_pn_local_start(c) => {
                value.push(c);
                consumed = i + c.len_utf8();
            }
            c if i > 0 && (is_pn_chars(c) || c == ':') => {
                value.push(c);
                consumed = i + c.len_utf8();
            }
            _ => break,
        }
        kept = value.len();
    }

    if consumed == 0 {
        return Ok(None);
    }
    value.truncate(kept);
    input.next_slice(consumed);
    Ok(Some(value))
}

fn string_literal(input: &mut Input<'_>) -> ModalResult<TokenKind> {
    let rest = remaining(input);
    let (quote, long) = if rest.starts_with("\"\"\"") {
        ('"', true)
    } else if rest.starts_with("'''") {
        ('\'', true)
    } else if rest.starts_with('"') {
        ('"', false)
    } else if rest.starts_with('\'') {
        ('\'', false)
    } else {
        return backtrack();
    };
    let fence = if quote == '"' { "\"\"\"" } else { "'''" };
    input.next_slice(if long { 3 } else { 1 });

    let mut value = String::new();
    loop {
        let chunk: &str = take_while(0.., |c: char| {
            c != quote && c != '\\' && (long || (c != '\n' && c != '\r'))
        })
        .parse_next(input)?;
        value.push_str(chunk);

        // A quote directly before the closing fence belongs to the content.
        let rest = remaining(input);
        if long && rest.starts_with(fence) && !rest[3..].starts_with(quote) {
            input.next_slice(3);
            break;
        }
        match any.parse_next(input)? {
            '\\' => value.push(string_escape(input)?),
            c if c == quote && !long => break,
            c if c == quote => value.push(c),
            _ => return backtrack(),
        }
    }
    Ok(TokenKind::String(Arc::from(value)))
}

fn string_escape(input: &mut Input<'_>) -> ModalResult<char> {
    Ok(match any.parse_next(input)? {
        't' => '\t',
        'b' => '\x08',
        'n' => '\n',
        'r' => '\r',
        'f' => '\x0C',
        '"' => '"',
        '\'' => '\'',
        '\\' => '\\',
        m @ ('u' | 'U') => unicode_escape(input, m)?,
        _ => return backtrack(),
    })
}

/// INTEGER, DECIMAL or DOUBLE. A `.` not followed by a digit is left for the
/// statement terminator, so `ex:qty 5.` lexes as `5` then `.`.
fn number(input: &mut Input<'_>) -> ModalResult<TokenKind> {
    let bytes = remaining(input).as_bytes();
    let digits_from = |mut i: usize| {
        while bytes.get(i).is_some_and(u8::is_ascii_digit) {
            i += 1;
        }
        i
    };

    let mut end = usize::from(matches!(bytes.first(), Some(b'+' | b'-')));
    let int_end = digits_from(end);
    let has_int = int_end > end;
    end = int_end;

    let mut has_frac = false;
    if bytes.get(end) == Some(&b'.') && bytes.get(end + 1).is_some_and(u8::is_ascii_digit) {
        end = digits_from(end + 1);
        has_frac = true;
    }
    if !has_int && !has_frac {
        return backtrack();
    }

    let mut has_exp = false;
    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let sign = usize::from(matches!(bytes.get(end + 1), Some(b'+' | b'-')));
        let exp_end = digits_from(end + 1 + sign);
        if exp_end > end + 1 + sign {
            end = exp_end;
            has_exp = true;
        }
    }

    let lexical: Arc<str> = Arc::from(input.next_slice(end));
    Ok(if has_exp {
        TokenKind::Double(lexical)
    } else if has_frac {
        TokenKind::Decimal(lexical)
    } else {
        TokenKind::Integer(lexical)
    })
}

fn punctuation(input: &mut Input<'_>) -> ModalResult<TokenKind> {
    any.verify_map(|c| match c {
        '.' => Some(TokenKind::Dot),
        ',' => Some(TokenKind::Comma),
        ';' => Some(TokenKind::Semicolon),
        '[' => Some(TokenKind::LBracket),
        ']' => Some(TokenKind::RBracket),
        '(' => Some(TokenKind::LParen),
        ')' => Some(TokenKind::RParen),
        _ => None,
    })
    .parse_next(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<TokenKind> {
        tokenize(src).unwrap().into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn test_prefix_directive() {
        assert_eq!(
            kinds("@prefix nw: <http://northwind.com/> ."),
            vec![
                TokenKind::KwPrefix,
                TokenKind::PrefixedNameNs("nw".into()),
                TokenKind::Iri("http://northwind.com/".into()),
                TokenKind::Dot,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_sparql_style_keywords_are_case_insensitive() {
        assert_eq!(kinds("PREFIX")[0], TokenKind::KwSparqlPrefix);
        assert_eq!(kinds("prefix")[0], TokenKind::KwSparqlPrefix);
        assert_eq!(kinds("Base")[0], TokenKind::KwSparqlBase);
    }

    #[test]
    fn test_prefixed_names() {
        assert_eq!(
            kinds("nw:Order-10248 :x nw:"),
            vec![
                TokenKind::PrefixedName {
                    prefix: "nw".into(),
                    local: "Order-10248".into()
                },
                TokenKind::PrefixedName {
                    prefix: "".into(),
                    local: "x".into()
                },
                TokenKind::PrefixedNameNs("nw".into()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_local_name_does_not_swallow_terminating_dot() {
        assert_eq!(
            kinds("nw:a nw:b nw:c."),
            vec![
                TokenKind::PrefixedName {
                    prefix: "nw".into(),
                    local: "a".into()
                },
                TokenKind::PrefixedName {
                    prefix: "nw".into(),
                    local: "b".into()
                },
                TokenKind::PrefixedName {
                    prefix: "nw".into(),
                    local: "c".into()
                },
                TokenKind::Dot,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_local_name_escapes() {
        assert_eq!(
            kinds(r"nw:a\/b%20c")[0],
            TokenKind::PrefixedName {
                prefix: "nw".into(),
                local: "a/b%20c".into()
            }
        );
    }

    #[test]
    fn test_keywords_and_punctuation() {
        assert_eq!(
            kinds("a true false ; , [ <x> ] ( 1 ) [ ] ( ) [] () ^^"),
            vec![
                TokenKind::KwA,
                TokenKind::KwTrue,
                TokenKind::KwFalse,
                TokenKind::Semicolon,
                TokenKind::Comma,
                TokenKind::LBracket,
                TokenKind::Iri("x".into()),
                TokenKind::RBracket,
                TokenKind::LParen,
                TokenKind::Integer("1".into()),
                TokenKind::RParen,
                TokenKind::Anon,
                TokenKind::Nil,
                TokenKind::Anon,
                TokenKind::Nil,
                TokenKind::DoubleCaret,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_strings() {
        assert_eq!(kinds(r#""Chai""#)[0], TokenKind::String("Chai".into()));
        assert_eq!(kinds(r"'x\ty'")[0], TokenKind::String("x\ty".into()));
        assert_eq!(kinds(r#""é""#)[0], TokenKind::String("é".into()));
        assert_eq!(
            kinds("\"\"\"two\nlines \"quoted\"\"\"\"")[0],
            TokenKind::String("two\nlines \"quoted\"".into())
        );
        assert_eq!(kinds("'''it's'''")[0], TokenKind::String("it's".into()));
    }

    #[test]
    fn test_lang_tag() {
        assert_eq!(
            kinds(r#""Chai"@en-GB"#),
            vec![
                TokenKind::String("Chai".into()),
                TokenKind::LangTag("en-GB".into()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_numbers() {
        assert_eq!(kinds("42")[0], TokenKind::Integer("42".into()));
        assert_eq!(kinds("-7")[0], TokenKind::Integer("-7".into()));
        assert_eq!(kinds("18.00")[0], TokenKind::Decimal("18.00".into()));
        assert_eq!(kinds(".5")[0], TokenKind::Decimal(".5".into()));
        assert_eq!(kinds("1.5E0")[0], TokenKind::Double("1.5E0".into()));
        assert_eq!(kinds("2e-3")[0], TokenKind::Double("2e-3".into()));
        assert_eq!(
            kinds("5."),
            vec![TokenKind::Integer("5".into()), TokenKind::Dot, TokenKind::Eof]
        );
    }

    #[test]
    fn test_comments_are_skipped() {
        assert_eq!(
            kinds("# header\nnw:a # trailing\n."),
            vec![
                TokenKind::PrefixedName {
                    prefix: "nw".into(),
                    local: "a".into()
                },
                TokenKind::Dot,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_spans() {
        let tokens = tokenize("  nw:a .").unwrap();
        assert_eq!((tokens[0].start, tokens[0].end), (2, 6));
        assert_eq!((tokens[1].start, tokens[1].end), (7, 8));
    }

    #[test]
    fn test_error_reports_line_and_column() {
        let err = tokenize("nw:a nw:b\n  nw:c { .").unwrap_err();
        match err {
            TurtleError::Lexer {
                position,
                line,
                column,
                message,
            } => {
                assert_eq!(position, 17);
                assert_eq!((line, column), (2, 8));
                assert!(message.contains("unexpected character '{'"), "{message}");
            }
            other => panic!("expected lexer error, got {other:?}"),
        }
    }

    #[test]
    fn test_unterminated_string() {
        let err = tokenize("nw:a nw:b \"open").unwrap_err();
        assert!(err.to_string().contains("string literal"));
    }
}
