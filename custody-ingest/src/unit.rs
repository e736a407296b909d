//! Unit grapher
//!
//! Parses one block (with the shared preamble) and derives its single
//! subject and the in-domain IRIs it references.

use std::collections::BTreeSet;

use custody_graph_ir::{Graph, Term};
use custody_graph_turtle::TurtleError;
use tracing::debug;

use crate::error::{IngestError, Result};
use crate::splitter::{Block, SplitDocument};

pub const DEFAULT_DOMAIN: &str = "http://northwind.com/";
pub const SCHEMA_NAMESPACE: &str = "http://northwind.com/model/";
pub const DATA_NAMESPACE: &str = "http://northwind.com/data/";

/// Map a parse failure in `block.source(preamble)` back to input coordinates.
fn malformed(preamble: &[String], block: &Block, source: &str, err: TurtleError) -> IngestError {
    let at = err.position().and_then(|position| {
        let before = source.get(..position)?;
        let line = before.matches('\n').count() + 1;
        let column = before.rsplit('\n').next().map_or(0, |l| l.chars().count()) + 1;
        Some((block.input_line(preamble.len(), line)?, column))
    });
    IngestError::MalformedInput {
        line: block.start_line,
        at,
        source: err,
    }
}

/// Decides which object IRIs can name another unit.
///
/// An IRI qualifies when it starts with `domain` and with none of the
/// `excluded` sub-namespaces.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NamespacePolicy {
    pub domain: String,
    pub excluded: Vec<String>,
}

impl Default for NamespacePolicy {
    fn default() -> Self {
        Self::new(
            DEFAULT_DOMAIN,
            [SCHEMA_NAMESPACE.to_string(), DATA_NAMESPACE.to_string()],
        )
    }
}

impl NamespacePolicy {
    pub fn new(domain: impl Into<String>, excluded: impl IntoIterator<Item = String>) -> Self {
        Self {
            domain: domain.into(),
            excluded: excluded.into_iter().collect(),
        }
    }

    pub fn admits(&self, iri: &str) -> bool {
        iri.starts_with(&self.domain) && !self.excluded.iter().any(|ns| iri.starts_with(ns.as_str()))
    }
}

/// One parsed block.
#[derive(Clone, Debug, PartialEq)]
pub struct Unit {
    pub subject: String,
    /// In-domain object IRIs other than the subject itself. May name
    /// subjects that are not in the batch; the sequencer decides.
    pub references: BTreeSet<String>,
    pub body: Graph,
    pub block_index: usize,
    pub start_line: usize,
}

#[derive(Clone, Debug, Default)]
pub struct UnitGrapher {
    policy: NamespacePolicy,
    base: Option<String>,
}

impl UnitGrapher {
    pub fn new(policy: NamespacePolicy) -> Self {
        Self { policy, base: None }
    }

    /// Resolve relative IRIs in every block against `base`.
    pub fn with_base(mut self, base: Option<String>) -> Self {
        self.base = base;
        self
    }

    pub fn policy(&self) -> &NamespacePolicy {
        &self.policy
    }

    /// Graph every block of `doc`, stopping at the first failure.
    pub fn graph_all(&self, doc: &SplitDocument) -> Result<Vec<Unit>> {
        doc.blocks
            .iter()
            .map(|block| self.graph_block(&doc.preamble, block))
            .collect()
    }

    pub fn graph_block(&self, preamble: &[String], block: &Block) -> Result<Unit> {
        let source = block.source(preamble);
        let body = custody_graph_turtle::parse_to_graph(&source, self.base.as_deref())
            .map_err(|err| malformed(preamble, block, &source, err))?;

        let subjects = body.subjects();
        let subject = match subjects.first() {
            Some(Term::Iri(iri)) if subjects.len() == 1 => iri.to_string(),
            _ => {
                return Err(IngestError::SchemaViolation {
                    line: block.start_line,
                    subjects: subjects.iter().map(|s| s.to_string()).collect(),
                })
            }
        };

        let references: BTreeSet<String> = body
            .objects()
            .into_iter()
            .filter_map(Term::as_iri)
            .filter(|iri| *iri != subject && self.policy.admits(iri))
            .map(str::to_string)
            .collect();

        debug!(
            block = block.index,
            line = block.start_line,
            subject = %subject,
            triples = body.len(),
            references = references.len(),
            "parsed block"
        );

        Ok(Unit {
            subject,
            references,
            body,
            block_index: block.index,
            start_line: block.start_line,
        })
    }
}
