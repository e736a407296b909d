//! Format-agnostic RDF graph representation
//!
//! Parsers emit into a [`GraphSink`]; the loader inspects and re-serializes
//! the resulting [`Graph`]. All IRIs held here are expanded. Prefix
//! declarations seen while parsing are carried on the graph so writers can
//! compact IRIs again on output.
//!
//! # Example
//!
//! ```
//! use custody_graph_ir::{Graph, Term};
//!
//! let mut graph = Graph::new();
//! graph.add_triple(
//!     Term::iri("http://northwind.com/Category-1"),
//!     Term::iri("http://northwind.com/model/categoryName"),
//!     Term::string("Beverages"),
//! );
//! assert_eq!(graph.subjects().len(), 1);
//! ```

pub mod datatype;
mod graph;
mod sink;
mod term;
mod triple;
pub mod vocab;

pub use datatype::Datatype;
pub use graph::Graph;
pub use sink::{GraphCollectorSink, GraphSink, TermId};
pub use term::{BlankId, LiteralValue, Term};
pub use triple::Triple;
