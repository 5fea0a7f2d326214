//! Transform pipeline infrastructure
//!
//! Transforms rewrite a [`Document`] between parsing and rendering. A pipeline is
//! an ordered list of them, each consuming the previous one's output.
//!
//! # Architecture Overview
//!
//! ## 1. The `Transform` Trait
//!
//! The interface for a pipeline step. A transform receives the whole document by
//! value and returns the rewritten one:
//!
//! ```rust,ignore
//! pub trait Transform: Send + Sync {
//!     fn name(&self) -> &str;
//!     fn apply(&self, doc: Document) -> Result<Document, RewriteError>;
//! }
//! ```
//!
//! Whole-tree transforms implement this directly (usually on top of
//! [`rewrite_document`](crate::ast::rewrite_document)). Lightweight, localized
//! edits use [`ElementHooks`](hooks::ElementHooks), which dispatches handlers by
//! node kind during one generic traversal.
//!
//! ## 2. The `Pipeline` Type
//!
//! A builder that chains transforms with `.then()`:
//!
//! ```rust,ignore
//! let pipeline = Pipeline::new()
//!     .then(RemoveImages)
//!     .then(HeadingOffset::new(1));
//!
//! let rewritten = pipeline.run(&doc)?;
//! ```
//!
//! A `Pipeline` is itself a `Transform`, so pipelines nest, and nesting is
//! associative: `[T1, [T2, T3]]` and `[[T1, T2], T3]` produce the same tree.
//!
//! ## 3. Atomic Runs
//!
//! `run` takes the caller's document by reference. The first step works on a
//! copy and later steps consume their predecessor's output. If any step fails,
//! the in-progress tree is dropped and a [`TransformError`] names the step, its
//! position and the node being visited. The caller's document is never touched.
//!
//! Runs are synchronous and single-threaded. There is no cancellation
//! primitive: a caller that needs one runs the pipeline on a worker it can stop.
//!
//! # Module Organization
//!
//! - [`hooks`]: element hooks keyed by node kind
//! - [`standard`]: built-in transforms (remove images, heading offsets, ids, ...)
//! - [`slug`]: heading slug generation

pub mod hooks;
pub mod slug;
pub mod standard;

use crate::ast::{Document, NodeTrace, RewriteError};
use std::fmt;
use thiserror::Error;

/// A pipeline step failed
///
/// `position` is the zero-based index of the failing step in the pipeline it
/// was run from.
#[derive(Error, Debug, Clone, PartialEq)]
pub struct TransformError {
    pub step: String,
    pub position: usize,
    pub node: Option<NodeTrace>,
    pub message: String,
}

impl fmt::Display for TransformError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Transform '{}' (step {}) failed",
            self.step, self.position
        )?;
        if let Some(node) = &self.node {
            write!(f, " at {}", node)?;
        }
        write!(f, ": {}", self.message)
    }
}

/// One step of a pipeline
pub trait Transform: Send + Sync {
    /// Name used in errors and logs
    fn name(&self) -> &str;

    /// Rewrite the document
    fn apply(&self, doc: Document) -> Result<Document, RewriteError>;
}

impl<T: Transform + ?Sized> Transform for Box<T> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn apply(&self, doc: Document) -> Result<Document, RewriteError> {
        (**self).apply(doc)
    }
}

/// Transform built from a closure
pub struct FnTransform<F> {
    name: String,
    f: F,
}

impl<F> FnTransform<F>
where
    F: Fn(Document) -> Result<Document, RewriteError> + Send + Sync,
{
    pub fn new(name: impl Into<String>, f: F) -> Self {
        Self {
            name: name.into(),
            f,
        }
    }
}

impl<F> Transform for FnTransform<F>
where
    F: Fn(Document) -> Result<Document, RewriteError> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn apply(&self, doc: Document) -> Result<Document, RewriteError> {
        (self.f)(doc)
    }
}

/// Create a transform from a function
pub fn from_fn<F>(name: impl Into<String>, f: F) -> FnTransform<F>
where
    F: Fn(Document) -> Result<Document, RewriteError> + Send + Sync,
{
    FnTransform::new(name, f)
}

/// Ordered sequence of transforms
pub struct Pipeline {
    name: String,
    steps: Vec<Box<dyn Transform>>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::named("pipeline")
    }

    /// Create an empty pipeline with a name (shown when it is nested in another)
    pub fn named(name: impl Into<String>) -> Self {
        Pipeline {
            name: name.into(),
            steps: Vec::new(),
        }
    }

    /// Append a step, returning the extended pipeline
    pub fn then<T: Transform + 'static>(mut self, step: T) -> Self {
        self.steps.push(Box::new(step));
        self
    }

    pub fn push(&mut self, step: Box<dyn Transform>) {
        self.steps.push(step);
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Step names in execution order
    pub fn names(&self) -> Vec<&str> {
        self.steps.iter().map(|s| s.name()).collect()
    }

    /// Run every step in order on a copy of `doc`
    ///
    /// All or nothing: on failure `doc` is unchanged and the partial result is
    /// discarded.
    pub fn run(&self, doc: &Document) -> Result<Document, TransformError> {
        self.run_owned(doc.clone())
    }

    /// Like [`run`](Self::run), consuming the input instead of copying it
    pub fn run_owned(&self, doc: Document) -> Result<Document, TransformError> {
        let mut current = doc;
        for (position, step) in self.steps.iter().enumerate() {
            log::debug!("transform step {} '{}' starting", position, step.name());
            current = step.apply(current).map_err(|err| {
                log::debug!("transform step {} '{}' failed: {}", position, step.name(), err);
                TransformError {
                    step: step.name().to_string(),
                    position,
                    node: err.node,
                    message: err.message,
                }
            })?;
        }
        Ok(current)
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new()
    }
}

impl Transform for Pipeline {
    fn name(&self) -> &str {
        &self.name
    }

    fn apply(&self, doc: Document) -> Result<Document, RewriteError> {
        self.run_owned(doc).map_err(|err| RewriteError {
            message: format!("step {} '{}': {}", err.position, err.step, err.message),
            node: err.node,
        })
    }
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("name", &self.name)
            .field("steps", &self.names())
            .finish()
    }
}
