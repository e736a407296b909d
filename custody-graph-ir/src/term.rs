//! RDF terms: IRIs, blank nodes and literals

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use crate::Datatype;

/// Blank node label, stored without the `_:` prefix.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlankId(Arc<str>);

impl BlankId {
    pub fn new(label: impl AsRef<str>) -> Self {
        Self(Arc::from(label.as_ref()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BlankId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "_:{}", self.0)
    }
}

/// Native value of a literal.
///
/// Doubles compare and hash by bit pattern so that terms keep total
/// equality and ordering (NaN equals NaN).
#[derive(Clone, Debug)]
pub enum LiteralValue {
    String(Arc<str>),
    Boolean(bool),
    Integer(i64),
    Double(f64),
}

impl LiteralValue {
    pub fn string(s: impl AsRef<str>) -> Self {
        LiteralValue::String(Arc::from(s.as_ref()))
    }

    /// Lexical form as it would appear inside a quoted Turtle literal.
    pub fn lexical(&self) -> String {
        match self {
            LiteralValue::String(s) => s.to_string(),
            LiteralValue::Boolean(b) => b.to_string(),
            LiteralValue::Integer(i) => i.to_string(),
            LiteralValue::Double(d) if d.is_nan() => "NaN".to_string(),
            LiteralValue::Double(d) if d.is_infinite() && d.is_sign_positive() => "INF".to_string(),
            LiteralValue::Double(d) if d.is_infinite() => "-INF".to_string(),
            LiteralValue::Double(d) => format!("{d:E}"),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            LiteralValue::String(s) => Some(s),
            _ => None,
        }
    }

    fn rank(&self) -> u8 {
        match self {
            LiteralValue::String(_) => 0,
            LiteralValue::Boolean(_) => 1,
            LiteralValue::Integer(_) => 2,
            LiteralValue::Double(_) => 3,
        }
    }
}

impl PartialEq for LiteralValue {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for LiteralValue {}

impl Hash for LiteralValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.rank().hash(state);
        match self {
            LiteralValue::String(s) => s.hash(state),
            LiteralValue::Boolean(b) => b.hash(state),
            LiteralValue::Integer(i) => i.hash(state),
            LiteralValue::Double(d) => d.to_bits().hash(state),
        }
    }
}

impl PartialOrd for LiteralValue {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for LiteralValue {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (LiteralValue::String(a), LiteralValue::String(b)) => a.cmp(b),
            (LiteralValue::Boolean(a), LiteralValue::Boolean(b)) => a.cmp(b),
            (LiteralValue::Integer(a), LiteralValue::Integer(b)) => a.cmp(b),
            (LiteralValue::Double(a), LiteralValue::Double(b)) => a.total_cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

/// An RDF term in subject, predicate or object position.
///
/// `Iri` always holds an expanded IRI. A literal with a language tag has
/// datatype `rdf:langString`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Term {
    Iri(Arc<str>),
    BlankNode(BlankId),
    Literal {
        value: LiteralValue,
        datatype: Datatype,
        language: Option<Arc<str>>,
    },
}

impl Term {
    pub fn iri(iri: impl AsRef<str>) -> Self {
        Term::Iri(Arc::from(iri.as_ref()))
    }

    pub fn blank(label: impl AsRef<str>) -> Self {
        Term::BlankNode(BlankId::new(label))
    }

    /// Plain `xsd:string` literal.
    pub fn string(value: impl AsRef<str>) -> Self {
        Term::Literal {
            value: LiteralValue::string(value),
            datatype: Datatype::xsd_string(),
            language: None,
        }
    }

    pub fn integer(value: i64) -> Self {
        Term::Literal {
            value: LiteralValue::Integer(value),
            datatype: Datatype::xsd_integer(),
            language: None,
        }
    }

    pub fn boolean(value: bool) -> Self {
        Term::Literal {
            value: LiteralValue::Boolean(value),
            datatype: Datatype::xsd_boolean(),
            language: None,
        }
    }

    pub fn double(value: f64) -> Self {
        Term::Literal {
            value: LiteralValue::Double(value),
            datatype: Datatype::xsd_double(),
            language: None,
        }
    }

    pub fn lang_string(value: impl AsRef<str>, lang: impl AsRef<str>) -> Self {
        Term::Literal {
            value: LiteralValue::string(value),
            datatype: Datatype::rdf_lang_string(),
            language: Some(Arc::from(lang.as_ref())),
        }
    }

    /// Literal whose lexical form is kept verbatim under `datatype`.
    pub fn typed(value: impl AsRef<str>, datatype: Datatype) -> Self {
        Term::Literal {
            value: LiteralValue::string(value),
            datatype,
            language: None,
        }
    }

    pub fn is_iri(&self) -> bool {
        matches!(self, Term::Iri(_))
    }

    pub fn is_blank(&self) -> bool {
        matches!(self, Term::BlankNode(_))
    }

    pub fn is_literal(&self) -> bool {
        matches!(self, Term::Literal { .. })
    }

    pub fn as_iri(&self) -> Option<&str> {
        match self {
            Term::Iri(iri) => Some(iri),
            _ => None,
        }
    }

    pub fn as_blank(&self) -> Option<&BlankId> {
        match self {
            Term::BlankNode(id) => Some(id),
            _ => None,
        }
    }
}

/// N-Triples style rendering, used in logs and error messages.
impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Term::Iri(iri) => write!(f, "<{iri}>"),
            Term::BlankNode(id) => write!(f, "{id}"),
            Term::Literal {
                value,
                datatype,
                language,
            } => {
                write!(f, "\"{}\"", value.lexical())?;
                match language {
                    Some(lang) => write!(f, "@{lang}"),
                    None if datatype.is_xsd_string() => Ok(()),
                    None => write!(f, "^^{datatype}"),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constructors_and_accessors() {
        let iri = Term::iri("http://northwind.com/Order-10248");
        assert!(iri.is_iri());
        assert_eq!(iri.as_iri(), Some("http://northwind.com/Order-10248"));

        let blank = Term::blank("b0");
        assert!(blank.is_blank());
        assert_eq!(blank.as_blank().map(BlankId::as_str), Some("b0"));
        assert_eq!(blank.as_iri(), None);

        assert!(Term::string("Chai").is_literal());
    }

    #[test]
    fn test_display() {
        assert_eq!(Term::iri("http://a.org/x").to_string(), "<http://a.org/x>");
        assert_eq!(Term::blank("b1").to_string(), "_:b1");
        assert_eq!(Term::string("hi").to_string(), "\"hi\"");
        assert_eq!(Term::lang_string("salut", "fr").to_string(), "\"salut\"@fr");
        assert_eq!(
            Term::integer(7).to_string(),
            "\"7\"^^<http://www.w3.org/2001/XMLSchema#integer>"
        );
    }

    #[test]
    fn test_double_lexical_and_equality() {
        assert_eq!(LiteralValue::Double(f64::NAN).lexical(), "NaN");
        assert_eq!(LiteralValue::Double(f64::NEG_INFINITY).lexical(), "-INF");
        assert_eq!(LiteralValue::Double(1.5).lexical(), "1.5E0");
        assert_eq!(Term::double(f64::NAN), Term::double(f64::NAN));
    }

    #[test]
    fn test_ordering_groups_iris_before_blanks_before_literals() {
        let mut terms = vec![Term::string("z"), Term::blank("b0"), Term::iri("http://a.org")];
        terms.sort();
        assert!(terms[0].is_iri());
        assert!(terms[1].is_blank());
        assert!(terms[2].is_literal());
    }
}
