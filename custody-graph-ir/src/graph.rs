//! An in-memory RDF graph

use std::collections::{BTreeMap, BTreeSet};

use crate::{Term, Triple};

/// A bag of triples plus the prefix and base declarations seen while parsing.
///
/// Triples keep insertion order until [`Graph::canonicalize`] sorts and
/// dedupes them. Prefixes live in a `BTreeMap` so writers emit them in a
/// stable order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Graph {
    triples: Vec<Triple>,
    pub base: Option<String>,
    pub prefixes: BTreeMap<String, String>,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_base(&mut self, base: impl Into<String>) {
        self.base = Some(base.into());
    }

    pub fn add_prefix(&mut self, prefix: impl Into<String>, namespace: impl Into<String>) {
        self.prefixes.insert(prefix.into(), namespace.into());
    }

    pub fn add(&mut self, triple: Triple) {
        self.triples.push(triple);
    }

    pub fn add_triple(&mut self, s: Term, p: Term, o: Term) {
        self.add(Triple::new(s, p, o));
    }

    pub fn len(&self) -> usize {
        self.triples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.triples.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Triple> {
        self.triples.iter()
    }

    pub fn triples(&self) -> &[Triple] {
        &self.triples
    }

    /// Sort SPO and drop duplicate triples.
    pub fn canonicalize(&mut self) {
        self.triples.sort();
        self.triples.dedup();
    }

    /// Distinct subjects, in term order.
    pub fn subjects(&self) -> BTreeSet<&Term> {
        self.triples.iter().map(|t| &t.s).collect()
    }

    /// Distinct objects, in term order.
    pub fn objects(&self) -> BTreeSet<&Term> {
        self.triples.iter().map(|t| &t.o).collect()
    }

    /// Consecutive runs of triples sharing a subject.
    ///
    /// Only meaningful on a sorted graph; call [`Graph::canonicalize`] first.
    pub fn group_by_subject(&self) -> SubjectGroups<'_> {
        SubjectGroups {
            rest: &self.triples,
        }
    }
}

impl FromIterator<Triple> for Graph {
    fn from_iter<T: IntoIterator<Item = Triple>>(iter: T) -> Self {
        Graph {
            triples: iter.into_iter().collect(),
            ..Default::default()
        }
    }
}

impl<'a> IntoIterator for &'a Graph {
    type Item = &'a Triple;
    type IntoIter = std::slice::Iter<'a, Triple>;

    fn into_iter(self) -> Self::IntoIter {
        self.triples.iter()
    }
}

pub struct SubjectGroups<'a> {
    rest: &'a [Triple],
}

impl<'a> Iterator for SubjectGroups<'a> {
    type Item = (&'a Term, &'a [Triple]);

    fn next(&mut self) -> Option<Self::Item> {
        let subject = &self.rest.first()?.s;
        let len = self
            .rest
            .iter()
            .position(|t| t.s != *subject)
            .unwrap_or(self.rest.len());
        let (group, rest) = self.rest.split_at(len);
        self.rest = rest;
        Some((subject, group))
    }
}
