//! Ingestion errors
//!
//! Every variant is fatal to the run. Nothing is retried or skipped.

use custody_graph_turtle::TurtleError;

use crate::upload::UploadError;

#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("failed to read input: {0}")]
    Io(#[from] std::io::Error),

    /// A block is not valid Turtle. `at` is the input line and column of
    /// the error when it lies inside the block.
    #[error("block at line {line}: {}", describe_syntax(.at, .source))]
    MalformedInput {
        line: usize,
        at: Option<(usize, usize)>,
        #[source]
        source: TurtleError,
    },

    /// A block does not describe exactly one named subject.
    #[error(
        "block at line {line}: expected exactly one subject, found {}",
        describe_subjects(.subjects)
    )]
    SchemaViolation { line: usize, subjects: Vec<String> },

    #[error("subject {subject} is described by the blocks at line {first_line} and line {second_line}")]
    DuplicateSubject {
        subject: String,
        first_line: usize,
        second_line: usize,
    },

    /// An in-domain reference to a subject that is not part of this batch,
    /// under the `reject` policy.
    #[error("{subject} references {reference}, which is not described in this input")]
    ExternalReference { subject: String, reference: String },

    #[error(
        "dependency cycle {} ({unordered} units could not be ordered)",
        .path.join(" -> ")
    )]
    CyclicDependency { path: Vec<String>, unordered: usize },

    /// A dependency had no content address when its dependent was linked.
    /// Topological ordering rules this out, so seeing it is a bug.
    #[error("internal ordering error: {subject} was linked before its dependency {reference}")]
    UnresolvedReference { subject: String, reference: String },

    #[error("upload of {subject} failed: {source}")]
    UploadFailure {
        subject: String,
        #[source]
        source: UploadError,
    },

    #[error("invalid configuration: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, IngestError>;

fn describe_subjects(subjects: &[String]) -> String {
    if subjects.is_empty() {
        "none".to_string()
    } else {
        format!("{}: {}", subjects.len(), subjects.join(", "))
    }
}

fn describe_syntax(at: &Option<(usize, usize)>, err: &TurtleError) -> String {
    match (at, err.position()) {
        (Some((line, column)), _) => {
            format!("invalid Turtle at line {line}, column {column}: {}", err.detail())
        }
        (None, Some(_)) => format!("invalid Turtle in the prefix declarations: {}", err.detail()),
        (None, None) => err.to_string(),
    }
}
