//! Element hooks
//!
//! Handlers keyed by [`NodeKind`], run during one bottom-up traversal. Only
//! nodes of a registered kind reach a handler; everything else passes through
//! untouched. Several hooks for the same kind run in registration order, each
//! one seeing the previous hook's replacement. A hook that returns several
//! nodes or removes the node ends the chain for that node.

use super::Transform;
use crate::ast::{rewrite_document, Document, Node, NodeKind, NodeTrace, Rewrite, RewriteError, Traversal};
use std::collections::HashMap;

type Hook = Box<dyn Fn(Node) -> Result<Rewrite, RewriteError> + Send + Sync>;

pub struct ElementHooks {
    name: String,
    hooks: HashMap<NodeKind, Vec<Hook>>,
}

impl ElementHooks {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            hooks: HashMap::new(),
        }
    }

    /// Register a handler for one node kind
    pub fn on<F>(mut self, kind: NodeKind, hook: F) -> Self
    where
        F: Fn(Node) -> Result<Rewrite, RewriteError> + Send + Sync + 'static,
    {
        self.hooks.entry(kind).or_default().push(Box::new(hook));
        self
    }

    pub fn kinds(&self) -> Vec<NodeKind> {
        let mut kinds: Vec<NodeKind> = self.hooks.keys().copied().collect();
        kinds.sort();
        kinds
    }

    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }

    fn dispatch(&self, node: Node, _trace: &NodeTrace) -> Result<Rewrite, RewriteError> {
        let Some(hooks) = self.hooks.get(&node.kind()) else {
            return Ok(Rewrite::Replace(node));
        };
        let mut current = node;
        for hook in hooks {
            match hook(current)? {
                Rewrite::Replace(next) => current = next,
                other => return Ok(other),
            }
        }
        Ok(Rewrite::Replace(current))
    }
}

impl Transform for ElementHooks {
    fn name(&self) -> &str {
        &self.name
    }

    fn apply(&self, doc: Document) -> Result<Document, RewriteError> {
        if self.hooks.is_empty() {
            return Ok(doc);
        }
        let mut rewriter = |node: Node, trace: &NodeTrace| self.dispatch(node, trace);
        rewrite_document(doc, Traversal::BottomUp, &mut rewriter)
    }
}
