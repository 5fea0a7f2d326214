//! Document tree
//!
//! The canonical intermediate representation: every parser produces a
//! [`Document`] and every renderer consumes one.
//!
//! - [`elements`]: the closed set of node variants and their payloads
//! - [`document`]: the root and its metadata
//! - [`traits`]: double-dispatch visiting and pre-order walking
//! - [`rewrite`]: per-node rewriting that returns a new tree
//! - [`serialize`]: the tagged-tree interchange format
//! - [`validation`]: opt-in grammar checks

pub mod document;
pub mod elements;
pub mod location;
pub mod metadata;
pub mod rewrite;
pub mod serialize;
pub mod traits;
pub mod validation;

pub use document::Document;
pub use elements::*;
pub use location::SourceLocation;
pub use metadata::{DocumentMetadata, Metadata};
pub use rewrite::{rewrite_document, NodeRewriter, NodeTrace, Rewrite, RewriteError, Traversal};
pub use serialize::{from_json, to_json, to_json_pretty, SerializationError, SCHEMA_VERSION};
pub use traits::{visit_children, walk, Visitor};
pub use validation::{validate, Violation, ViolationKind};
