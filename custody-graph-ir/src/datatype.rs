//! Literal datatypes
//!
//! Every literal carries an explicit datatype. Plain strings are
//! `xsd:string`; language-tagged strings are `rdf:langString`.

use std::fmt;
use std::sync::Arc;

use crate::vocab::{rdf, xsd};

/// Expanded datatype IRI of a literal.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Datatype(Arc<str>);

impl Datatype {
    pub fn from_iri(iri: impl AsRef<str>) -> Self {
        Self(Arc::from(iri.as_ref()))
    }

    pub fn xsd_string() -> Self {
        Self::from_iri(xsd::STRING)
    }

    pub fn xsd_boolean() -> Self {
        Self::from_iri(xsd::BOOLEAN)
    }

    pub fn xsd_integer() -> Self {
        Self::from_iri(xsd::INTEGER)
    }

    pub fn xsd_decimal() -> Self {
        Self::from_iri(xsd::DECIMAL)
    }

    pub fn xsd_double() -> Self {
        Self::from_iri(xsd::DOUBLE)
    }

    pub fn rdf_lang_string() -> Self {
        Self::from_iri(rdf::LANG_STRING)
    }

    pub fn as_iri(&self) -> &str {
        &self.0
    }

    pub fn is_xsd_string(&self) -> bool {
        &*self.0 == xsd::STRING
    }

    pub fn is_lang_string(&self) -> bool {
        &*self.0 == rdf::LANG_STRING
    }
}

impl fmt::Display for Datatype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}>", self.0)
    }
}
