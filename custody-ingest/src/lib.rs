//! Dependency-ordered Turtle loader.
//!
//! A Turtle file is cut into per-subject blocks ([`splitter`]), each block is
//! parsed into a unit with the in-domain subjects it references ([`unit`]),
//! the units are ordered so references come first ([`sequencer`]), and each
//! unit is uploaded carrying `caused-by` links to the content addresses of
//! the units it references ([`linker`]).
//!
//! ```
//! use custody_ingest::{prepare, split_str, IngestOptions};
//!
//! let doc = split_str(
//!     "@prefix nw: <http://northwind.com/> .\n\
//!      @prefix model: <http://northwind.com/model/> .\n\
//!      \n\
//!      nw:Product-1 model:category nw:Category-1 .\n\
//!      \n\
//!      nw:Category-1 model:categoryName \"Beverages\" .\n",
//! );
//! let planned = prepare(&doc, &IngestOptions::default()).unwrap();
//! assert_eq!(planned[0].unit.subject, "http://northwind.com/Category-1");
//! ```

pub mod config;
pub mod error;
pub mod link;
pub mod linker;
pub mod pipeline;
pub mod sequencer;
pub mod splitter;
pub mod unit;
pub mod upload;

pub use config::IngestConfig;
pub use error::{IngestError, Result};
pub use link::{Link, LinkMap, RelType};
pub use linker::{IngestReport, Linker, UploadedUnit};
pub use pipeline::{ingest, prepare, write_plan, IngestOptions};
pub use sequencer::{plan, DependencyGraph, ExternalRefPolicy, PlannedUnit};
pub use splitter::{split_lines, split_reader, split_str, Block, SplitDocument};
pub use unit::{NamespacePolicy, Unit, UnitGrapher};
pub use upload::{HttpUploader, UploadError, UploadRequest, Uploader};
