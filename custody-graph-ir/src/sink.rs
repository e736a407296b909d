//! Event interface between parsers and graph builders
//!
//! A parser allocates terms through the sink, gets back a [`TermId`] handle
//! for each, and emits triples by handle. [`GraphCollectorSink`] is the
//! standard sink and materializes a [`Graph`].

use std::collections::HashMap;

use crate::{Datatype, Graph, LiteralValue, Term, Triple};

/// Handle to a term allocated by a sink. Only valid for the sink that
/// returned it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TermId(u32);

impl TermId {
    pub fn new(index: u32) -> Self {
        Self(index)
    }

    pub fn index(self) -> u32 {
        self.0
    }
}

pub trait GraphSink {
    /// `@base <iri> .`
    fn on_base(&mut self, base_iri: &str);

    /// `@prefix p: <iri> .`
    fn on_prefix(&mut self, prefix: &str, namespace_iri: &str);

    /// Allocate an expanded IRI term.
    fn term_iri(&mut self, iri: &str) -> TermId;

    /// Allocate a blank node. A labelled node returns the same handle for the
    /// same label; `None` always allocates a fresh node.
    fn term_blank(&mut self, label: Option<&str>) -> TermId;

    /// Allocate a literal from its lexical form.
    fn term_literal(&mut self, value: &str, datatype: Datatype, language: Option<&str>) -> TermId;

    /// Allocate a literal from an already-parsed native value.
    fn term_literal_value(&mut self, value: LiteralValue, datatype: Datatype) -> TermId;

    fn emit_triple(&mut self, subject: TermId, predicate: TermId, object: TermId);
}

/// Collects parser events into a [`Graph`].
#[derive(Debug, Default)]
pub struct GraphCollectorSink {
    graph: Graph,
    terms: Vec<Term>,
    fresh_blanks: u32,
    blank_labels: HashMap<String, TermId>,
}

impl GraphCollectorSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn finish(self) -> Graph {
        self.graph
    }

    fn push(&mut self, term: Term) -> TermId {
        let id = TermId(self.terms.len() as u32);
        self.terms.push(term);
        id
    }

    fn term(&self, id: TermId) -> Term {
        self.terms[id.0 as usize].clone()
    }
}

impl GraphSink for GraphCollectorSink {
    fn on_base(&mut self, base_iri: &str) {
        self.graph.set_base(base_iri);
    }

    fn on_prefix(&mut self, prefix: &str, namespace_iri: &str) {
        self.graph.add_prefix(prefix, namespace_iri);
    }

    fn term_iri(&mut self, iri: &str) -> TermId {
        self.push(Term::iri(iri))
    }

    fn term_blank(&mut self, label: Option<&str>) -> TermId {
        match label {
            Some(label) => {
                if let Some(&id) = self.blank_labels.get(label) {
                    return id;
                }
                let id = self.push(Term::blank(label));
                self.blank_labels.insert(label.to_string(), id);
                id
            }
            None => {
                self.fresh_blanks += 1;
                let label = format!("genid{}", self.fresh_blanks);
                self.push(Term::blank(label))
            }
        }
    }

    fn term_literal(&mut self, value: &str, datatype: Datatype, language: Option<&str>) -> TermId {
        let term = match language {
            Some(lang) => Term::lang_string(value, lang),
            None => Term::typed(value, datatype),
        };
        self.push(term)
    }

    fn term_literal_value(&mut self, value: LiteralValue, datatype: Datatype) -> TermId {
        self.push(Term::Literal {
            value,
            datatype,
            language: None,
        })
    }

    fn emit_triple(&mut self, subject: TermId, predicate: TermId, object: TermId) {
        let triple = Triple::new(self.term(subject), self.term(predicate), self.term(object));
        self.graph.add(triple);
    }
}
