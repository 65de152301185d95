//! Stac Graph: Lazily-Resolved Catalog Object Graph
//!
//! An in-memory graph of STAC catalogs, collections and items. Documents are
//! fetched through a pluggable I/O port only when a link is followed, cached
//! by location, and written back with hrefs computed from the tree layout.
//! Unknown document fields pass through a load/save cycle untouched.

pub mod concurrency;
pub mod config;
pub mod document;
pub mod error;
pub mod extensions;
pub mod graph;
pub mod href;
pub mod io;
pub mod link;
pub mod logging;
pub mod node;
pub mod types;
pub mod validation;

pub use concurrency::SharedGraph;
pub use error::{IoError, StacError};
pub use graph::Graph;
pub use io::{DocumentIo, FileSystemIo, MemoryIo};
pub use link::{Link, LinkTarget, Rel};
pub use node::{Asset, Extent, Node, NodeKind};
pub use types::{NodeHandle, NodeType, STAC_VERSION};
pub use validation::{JsonSchemaValidator, SchemaValidator, ValidationMode, ValidationResult};
