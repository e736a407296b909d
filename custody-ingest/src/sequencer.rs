//! Dependency sequencer
//!
//! Orders units so that every unit comes after the units whose subjects it
//! references. Kahn's algorithm over an index-based adjacency list; ties are
//! broken by input position so the order is reproducible.

use std::collections::{BTreeSet, HashMap};

use clap::ValueEnum;
use tracing::warn;

use crate::error::{IngestError, Result};
use crate::unit::Unit;

/// What to do with an in-domain reference to a subject outside the batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum ExternalRefPolicy {
    /// Warn and leave it out of the dependency graph and the links.
    #[default]
    Drop,
    /// Fail the run before anything is uploaded.
    Reject,
}

/// A unit in upload position, with the subjects it must follow.
#[derive(Clone, Debug, PartialEq)]
pub struct PlannedUnit {
    pub unit: Unit,
    /// `unit.references` restricted to subjects present in the batch.
    pub dependencies: BTreeSet<String>,
}

/// Adjacency from each unit to the units it depends on, by input index.
#[derive(Debug)]
pub struct DependencyGraph {
    subjects: Vec<String>,
    depends_on: Vec<BTreeSet<usize>>,
}

impl DependencyGraph {
    /// Fails on a duplicate subject, or on an external reference under
    /// [`ExternalRefPolicy::Reject`].
    pub fn build(units: &[Unit], external: ExternalRefPolicy) -> Result<Self> {
        let mut index: HashMap<&str, usize> = HashMap::with_capacity(units.len());
        for (i, unit) in units.iter().enumerate() {
            if let Some(&first) = index.get(unit.subject.as_str()) {
                return Err(IngestError::DuplicateSubject {
                    subject: unit.subject.clone(),
                    first_line: units[first].start_line,
                    second_line: unit.start_line,
                });
            }
            index.insert(&unit.subject, i);
        }

        let mut depends_on = Vec::with_capacity(units.len());
        for unit in units {
            let mut deps = BTreeSet::new();
            for reference in &unit.references {
                match index.get(reference.as_str()) {
                    Some(&dep) => {
                        deps.insert(dep);
                    }
                    None if external == ExternalRefPolicy::Reject => {
                        return Err(IngestError::ExternalReference {
                            subject: unit.subject.clone(),
                            reference: reference.clone(),
                        });
                    }
                    None => warn!(
                        subject = %unit.subject,
                        reference = %reference,
                        "reference to a subject outside this input; no link will be attached"
                    ),
                }
            }
            depends_on.push(deps);
        }

        Ok(Self {
            subjects: units.iter().map(|u| u.subject.clone()).collect(),
            depends_on,
        })
    }

    pub fn len(&self) -> usize {
        self.subjects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subjects.is_empty()
    }

    /// Subjects unit `i` depends on.
    pub fn dependencies(&self, i: usize) -> impl Iterator<Item = &str> {
        self.depends_on[i].iter().map(|&d| self.subjects[d].as_str())
    }

    /// Input indexes in upload order.
    pub fn order(&self) -> Result<Vec<usize>> {
        let n = self.subjects.len();
        let mut in_degree: Vec<usize> = self.depends_on.iter().map(BTreeSet::len).collect();
        let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); n];
        for (i, deps) in self.depends_on.iter().enumerate() {
            for &d in deps {
                dependents[d].push(i);
            }
        }

        let mut ready: BTreeSet<usize> = (0..n).filter(|&i| in_degree[i] == 0).collect();
        let mut order = Vec::with_capacity(n);
        while let Some(i) = ready.pop_first() {
            order.push(i);
            for &dependent in &dependents[i] {
                in_degree[dependent] -= 1;
                if in_degree[dependent] == 0 {
                    ready.insert(dependent);
                }
            }
        }

        if order.len() < n {
            let unordered: BTreeSet<usize> = (0..n).filter(|&i| in_degree[i] > 0).collect();
            return Err(IngestError::CyclicDependency {
                path: self.cycle_path(&unordered),
                unordered: unordered.len(),
            });
        }
        Ok(order)
    }

    /// One concrete cycle among `unordered`, first subject repeated at the end.
    ///
    /// Every unordered unit still has an unordered dependency, so following
    /// the lowest such dependency must revisit a unit.
    fn cycle_path(&self, unordered: &BTreeSet<usize>) -> Vec<String> {
        let Some(&start) = unordered.first() else {
            return Vec::new();
        };
        let mut walk = vec![start];
        let mut current = start;
        loop {
            let Some(&next) = self.depends_on[current]
                .iter()
                .find(|&&d| unordered.contains(&d))
            else {
                break;
            };
            if let Some(pos) = walk.iter().position(|&w| w == next) {
                walk.drain(..pos);
                walk.push(next);
                break;
            }
            walk.push(next);
            current = next;
        }
        walk.into_iter().map(|i| self.subjects[i].clone()).collect()
    }
}

/// Order `units` for upload without uploading anything.
pub fn plan(units: Vec<Unit>, external: ExternalRefPolicy) -> Result<Vec<PlannedUnit>> {
    let graph = DependencyGraph::build(&units, external)?;
    let order = graph.order()?;

    let dependencies: Vec<BTreeSet<String>> = (0..graph.len())
        .map(|i| graph.dependencies(i).map(str::to_string).collect())
        .collect();
    let mut slots: Vec<Option<(Unit, BTreeSet<String>)>> =
        units.into_iter().zip(dependencies).map(Some).collect();

    Ok(order
        .into_iter()
        .filter_map(|i| slots[i].take())
        .map(|(unit, dependencies)| PlannedUnit { unit, dependencies })
        .collect())
}
