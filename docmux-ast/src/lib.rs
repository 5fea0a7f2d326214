//! # docmux-ast
//!
//! The canonical document tree every docmux parser produces and every renderer
//! consumes, plus the pipeline that rewrites it in between.
//!
//! File Layout
//!
//! src/
//!   ├── ast          Node variants, the Document root, visiting, rewriting,
//!   │                serialization and validation
//!   └── transforms   Pipeline, element hooks and the built-in transforms
//!
//! Parsers build a [`Document`] from [`Node`] values; transforms consume it by
//! value and hand back a new one; renderers only ever read it.

pub mod ast;
pub mod transforms;

pub use ast::{Document, DocumentMetadata, Node, NodeKind};
pub use transforms::{Pipeline, Transform, TransformError};
