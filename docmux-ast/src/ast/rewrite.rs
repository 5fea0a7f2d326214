//! Rewriting the tree
//!
//! A [`NodeRewriter`] sees one node at a time and answers with a [`Rewrite`]:
//! replace it with one node, with several, or remove it. [`rewrite_document`]
//! drives the traversal, handing ownership of each node to the rewriter so
//! unchanged subtrees are moved into the new tree rather than copied.
//!
//! Errors raised by a rewriter are annotated with a [`NodeTrace`] for the node
//! being visited, unless the rewriter already attached one.

use super::document::Document;
use super::elements::{Node, NodeKind};
use super::location::SourceLocation;
use std::fmt;
use thiserror::Error;

/// What to put in place of a visited node
#[derive(Debug, Clone, PartialEq)]
pub enum Rewrite {
    Replace(Node),
    Many(Vec<Node>),
    Remove,
}

impl From<Node> for Rewrite {
    fn from(node: Node) -> Self {
        Rewrite::Replace(node)
    }
}

/// Where in the tree a node sits
///
/// `path` lists child indices from the document root, e.g. `[1, 0]` is the first
/// child of the document's second child. Indices refer to the tree as it was
/// when the node was reached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeTrace {
    pub kind: NodeKind,
    pub path: Vec<usize>,
    pub source: Option<SourceLocation>,
}

impl NodeTrace {
    pub fn of(node: &Node, path: &[usize]) -> Self {
        Self {
            kind: node.kind(),
            path: path.to_vec(),
            source: node.source(),
        }
    }

    pub fn depth(&self) -> usize {
        self.path.len().saturating_sub(1)
    }
}

impl fmt::Display for NodeTrace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at /", self.kind)?;
        let path: Vec<String> = self.path.iter().map(|i| i.to_string()).collect();
        write!(f, "{}", path.join("/"))?;
        if let Some(source) = &self.source {
            write!(f, " ({})", source)?;
        }
        Ok(())
    }
}

/// Failure inside a rewriter
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{message}{}", at_suffix(.node))]
pub struct RewriteError {
    pub message: String,
    pub node: Option<NodeTrace>,
}

impl RewriteError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            node: None,
        }
    }

    pub fn at(mut self, trace: NodeTrace) -> Self {
        self.node = Some(trace);
        self
    }
}

fn at_suffix(node: &Option<NodeTrace>) -> String {
    node.as_ref()
        .map(|node| format!(" (at {})", node))
        .unwrap_or_default()
}

impl From<String> for RewriteError {
    fn from(s: String) -> Self {
        RewriteError::new(s)
    }
}

impl From<&str> for RewriteError {
    fn from(s: &str) -> Self {
        RewriteError::new(s)
    }
}

/// Per-node rewrite callback
pub trait NodeRewriter {
    fn rewrite(&mut self, node: Node, trace: &NodeTrace) -> Result<Rewrite, RewriteError>;
}

impl<F> NodeRewriter for F
where
    F: FnMut(Node, &NodeTrace) -> Result<Rewrite, RewriteError>,
{
    fn rewrite(&mut self, node: Node, trace: &NodeTrace) -> Result<Rewrite, RewriteError> {
        self(node, trace)
    }
}

/// Order in which a node and its children are offered to the rewriter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Traversal {
    /// Children first; the rewriter sees a node with already-rewritten children
    BottomUp,
    /// Node first; children of whatever the rewriter returns are then visited
    TopDown,
}

pub fn rewrite_document<R>(
    doc: Document,
    traversal: Traversal,
    rewriter: &mut R,
) -> Result<Document, RewriteError>
where
    R: NodeRewriter + ?Sized,
{
    let Document { children, metadata } = doc;
    let mut path = Vec::new();
    let children = rewrite_nodes(children, traversal, rewriter, &mut path)?;
    Ok(Document { children, metadata })
}

pub fn rewrite_nodes<R>(
    nodes: Vec<Node>,
    traversal: Traversal,
    rewriter: &mut R,
    path: &mut Vec<usize>,
) -> Result<Vec<Node>, RewriteError>
where
    R: NodeRewriter + ?Sized,
{
    let mut out = Vec::with_capacity(nodes.len());
    for (index, node) in nodes.into_iter().enumerate() {
        path.push(index);
        let result = rewrite_one(node, traversal, rewriter, path);
        path.pop();
        out.extend(result?);
    }
    Ok(out)
}

fn rewrite_one<R>(
    node: Node,
    traversal: Traversal,
    rewriter: &mut R,
    path: &mut Vec<usize>,
) -> Result<Vec<Node>, RewriteError>
where
    R: NodeRewriter + ?Sized,
{
    match traversal {
        Traversal::BottomUp => {
            let node = rewrite_children(node, traversal, rewriter, path)?;
            let trace = NodeTrace::of(&node, path);
            let rewritten = apply(rewriter, node, &trace)?;
            Ok(into_nodes(rewritten))
        }
        Traversal::TopDown => {
            let trace = NodeTrace::of(&node, path);
            let rewritten = apply(rewriter, node, &trace)?;
            into_nodes(rewritten)
                .into_iter()
                .map(|n| rewrite_children(n, traversal, rewriter, path))
                .collect()
        }
    }
}

fn rewrite_children<R>(
    mut node: Node,
    traversal: Traversal,
    rewriter: &mut R,
    path: &mut Vec<usize>,
) -> Result<Node, RewriteError>
where
    R: NodeRewriter + ?Sized,
{
    if let Some(slot) = node.children_mut() {
        let children = std::mem::take(slot);
        *slot = rewrite_nodes(children, traversal, rewriter, path)?;
    }
    Ok(node)
}

fn apply<R>(rewriter: &mut R, node: Node, trace: &NodeTrace) -> Result<Rewrite, RewriteError>
where
    R: NodeRewriter + ?Sized,
{
    rewriter.rewrite(node, trace).map_err(|err| {
        if err.node.is_some() {
            err
        } else {
            err.at(trace.clone())
        }
    })
}

fn into_nodes(rewrite: Rewrite) -> Vec<Node> {
    match rewrite {
        Rewrite::Replace(node) => vec![node],
        Rewrite::Many(nodes) => nodes,
        Rewrite::Remove => Vec::new(),
    }
}
