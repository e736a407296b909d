//! Chain-of-custody links and the per-run link map.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// How an uploaded unit relates to the content it links to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RelType {
    CausedBy,
    DerivedFrom,
}

impl RelType {
    /// Relation name as used in an HTTP `Link` header.
    pub fn as_str(self) -> &'static str {
        match self {
            RelType::CausedBy => "caused-by",
            RelType::DerivedFrom => "derived-from",
        }
    }
}

impl fmt::Display for RelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A predecessor link attached to an upload.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Link {
    pub address: String,
    pub rel: RelType,
}

impl Link {
    pub fn caused_by(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            rel: RelType::CausedBy,
        }
    }
}

/// Subject IRI to the content address its upload was assigned.
///
/// Entries are only ever added, and each subject at most once.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LinkMap {
    entries: BTreeMap<String, String>,
}

impl LinkMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `subject`'s address. Returns `false`, leaving the map
    /// unchanged, if the subject already has one.
    pub fn record(&mut self, subject: impl Into<String>, address: impl Into<String>) -> bool {
        match self.entries.entry(subject.into()) {
            std::collections::btree_map::Entry::Occupied(_) => false,
            std::collections::btree_map::Entry::Vacant(slot) => {
                slot.insert(address.into());
                true
            }
        }
    }

    pub fn get(&self, subject: &str) -> Option<&str> {
        self.entries.get(subject).map(String::as_str)
    }

    pub fn contains(&self, subject: &str) -> bool {
        self.entries.contains_key(subject)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(s, a)| (s.as_str(), a.as_str()))
    }
}
