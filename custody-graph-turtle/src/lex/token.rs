use std::fmt;
use std::sync::Arc;

/// A token and its byte span in the source.
#[derive(Clone, Debug, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub start: usize,
    pub end: usize,
}

#[derive(Clone, Debug, PartialEq)]
pub enum TokenKind {
    /// `<...>` with escapes already decoded.
    Iri(Arc<str>),
    /// `prefix:` with no local part.
    PrefixedNameNs(Arc<str>),
    /// `prefix:local`; `local` has escapes decoded.
    PrefixedName { prefix: Arc<str>, local: Arc<str> },
    /// `_:label`
    BlankNodeLabel(Arc<str>),
    /// `[]`
    Anon,
    /// `()`
    Nil,
    /// String content with escapes decoded.
    String(Arc<str>),
    /// Numeric literals keep their lexical form; the parser types them.
    Integer(Arc<str>),
    Decimal(Arc<str>),
    Double(Arc<str>),
    /// `@en-GB` without the `@`.
    LangTag(Arc<str>),
    KwPrefix,
    KwBase,
    KwSparqlPrefix,
    KwSparqlBase,
    KwA,
    KwTrue,
    KwFalse,
    Dot,
    Comma,
    Semicolon,
    DoubleCaret,
    LBracket,
    RBracket,
    LParen,
    RParen,
    Eof,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Iri(s) => write!(f, "<{s}>"),
            TokenKind::PrefixedNameNs(p) => write!(f, "{p}:"),
            TokenKind::PrefixedName { prefix, local } => write!(f, "{prefix}:{local}"),
            TokenKind::BlankNodeLabel(s) => write!(f, "_:{s}"),
            TokenKind::Anon => f.write_str("[]"),
            TokenKind::Nil => f.write_str("()"),
            TokenKind::String(s) => write!(f, "{s:?}"),
            TokenKind::Integer(s) | TokenKind::Decimal(s) | TokenKind::Double(s) => f.write_str(s),
            TokenKind::LangTag(s) => write!(f, "@{s}"),
            TokenKind::KwPrefix => f.write_str("@prefix"),
            TokenKind::KwBase => f.write_str("@base"),
            TokenKind::KwSparqlPrefix => f.write_str("PREFIX"),
            TokenKind::KwSparqlBase => f.write_str("BASE"),
            TokenKind::KwA => f.write_str("a"),
            TokenKind::KwTrue => f.write_str("true"),
            TokenKind::KwFalse => f.write_str("false"),
            TokenKind::Dot => f.write_str("."),
            TokenKind::Comma => f.write_str(","),
            TokenKind::Semicolon => f.write_str(";"),
            TokenKind::DoubleCaret => f.write_str("^^"),
            TokenKind::LBracket => f.write_str("["),
            TokenKind::RBracket => f.write_str("]"),
            TokenKind::LParen => f.write_str("("),
            TokenKind::RParen => f.write_str(")"),
            TokenKind::Eof => f.write_str("end of input"),
        }
    }
}
