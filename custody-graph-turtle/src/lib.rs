//! Turtle (TTL) support for custody graphs.
//!
//! Parses Turtle into events on a [`custody_graph_ir::GraphSink`] and writes
//! a [`Graph`] back out as Turtle.
//!
//! # Example
//!
//! ```
//! use custody_graph_turtle::{parse_to_graph, to_turtle};
//!
//! let ttl = r#"
//!     @prefix nw: <http://northwind.com/> .
//!     @prefix model: <http://northwind.com/model/> .
//!     nw:Product-1 model:supplier nw:Supplier-1 ;
//!                  model:productName "Chai" .
//! "#;
//!
//! let graph = parse_to_graph(ttl, None).unwrap();
//! assert_eq!(graph.len(), 2);
//! assert!(to_turtle(&graph).contains("nw:Product-1"));
//! ```

pub mod error;
mod iri;
pub mod lex;
pub mod parser;
mod writer;

pub use error::{Result, TurtleError};
pub use lex::{tokenize, Lexer, Token, TokenKind};
pub use parser::{parse, parse_with_base};
pub use writer::to_turtle;

use custody_graph_ir::{Graph, GraphCollectorSink};

/// Parse a Turtle document into a [`Graph`], optionally resolving relative
/// IRIs against `base`.
pub fn parse_to_graph(input: &str, base: Option<&str>) -> Result<Graph> {
    let mut sink = GraphCollectorSink::new();
    match base {
        Some(base) => parse_with_base(input, base, &mut sink)?,
        None => parse(input, &mut sink)?,
    }
    let graph = sink.finish();
    tracing::trace!(
        triples = graph.len(),
        prefixes = graph.prefixes.len(),
        "parsed turtle"
    );
    Ok(graph)
}
