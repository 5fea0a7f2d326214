//! Opt-in structural validation
//!
//! Construction never checks the block/inline grammar. Parsers are trusted to
//! produce well-formed trees and [`validate`] is there for tests, debugging and
//! for callers that receive trees from untrusted places (e.g. deserialized
//! interchange files). It reports every violation, not just the first.

use super::document::Document;
use super::elements::{Node, NodeCategory, NodeKind};
use super::metadata::{is_valid_metadata_key, Metadata};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViolationKind {
    /// A node of the wrong category in a block or inline slot
    WrongCategory {
        parent: Option<NodeKind>,
        expected: NodeCategory,
        found: NodeKind,
    },
    /// A container that only admits specific children got something else
    UnexpectedChild {
        parent: NodeKind,
        expected: &'static [NodeKind],
        found: NodeKind,
    },
    /// A structural node outside the container it belongs to
    Misplaced { found: NodeKind, expected_parent: NodeKind },
    HeadingLevel(u8),
    InvalidMetadataKey(String),
    EmptyLabel(NodeKind),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// Child-index path from the document root
    pub path: Vec<usize>,
    pub kind: ViolationKind,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let path: Vec<String> = self.path.iter().map(|i| i.to_string()).collect();
        write!(f, "/{}: ", path.join("/"))?;
        match &self.kind {
            ViolationKind::WrongCategory {
                parent,
                expected,
                found,
            } => {
                let parent = parent.map(|p| p.name()).unwrap_or("Document");
                write!(f, "{} expects {} children, found {}", parent, expected, found)
            }
            ViolationKind::UnexpectedChild {
                parent,
                expected,
                found,
            } => {
                let names: Vec<&str> = expected.iter().map(|k| k.name()).collect();
                write!(
                    f,
                    "{} admits only {} children, found {}",
                    parent,
                    names.join("/"),
                    found
                )
            }
            ViolationKind::Misplaced {
                found,
                expected_parent,
            } => write!(f, "{} must be a child of {}", found, expected_parent),
            ViolationKind::HeadingLevel(level) => {
                write!(f, "heading level {} outside 1..=6", level)
            }
            ViolationKind::InvalidMetadataKey(key) => write!(f, "invalid metadata key {:?}", key),
            ViolationKind::EmptyLabel(kind) => write!(f, "{} has an empty label", kind),
        }
    }
}

/// Check the whole document and return every violation found
pub fn validate(doc: &Document) -> Vec<Violation> {
    let mut violations = Vec::new();
    let mut path = Vec::new();
    check_children(None, &doc.children, &mut path, &mut violations);
    violations
}

pub fn is_well_formed(doc: &Document) -> bool {
    validate(doc).is_empty()
}

fn allowed_children(parent: NodeKind) -> Option<&'static [NodeKind]> {
    match parent {
        NodeKind::List => Some(&[NodeKind::ListItem]),
        NodeKind::Table => Some(&[NodeKind::TableRow]),
        NodeKind::TableRow => Some(&[NodeKind::TableCell]),
        NodeKind::DefinitionList => {
            Some(&[NodeKind::DefinitionTerm, NodeKind::DefinitionDescription])
        }
        _ => None,
    }
}

fn required_parent(kind: NodeKind) -> Option<NodeKind> {
    match kind {
        NodeKind::ListItem => Some(NodeKind::List),
        NodeKind::TableRow => Some(NodeKind::Table),
        NodeKind::TableCell => Some(NodeKind::TableRow),
        NodeKind::DefinitionTerm | NodeKind::DefinitionDescription => {
            Some(NodeKind::DefinitionList)
        }
        _ => None,
    }
}

fn check_children(
    parent: Option<NodeKind>,
    children: &[Node],
    path: &mut Vec<usize>,
    out: &mut Vec<Violation>,
) {
    // The document root takes blocks; leaves have no slot at all.
    let expected = match parent {
        None => Some(NodeCategory::Block),
        Some(kind) => kind.child_category(),
    };

    for (index, child) in children.iter().enumerate() {
        path.push(index);

        if let Some(expected) = expected {
            if child.category() != expected {
                out.push(Violation {
                    path: path.clone(),
                    kind: ViolationKind::WrongCategory {
                        parent,
                        expected,
                        found: child.kind(),
                    },
                });
            }
        }

        if let Some(allowed) = parent.and_then(allowed_children) {
            if !allowed.contains(&child.kind()) {
                out.push(Violation {
                    path: path.clone(),
                    kind: ViolationKind::UnexpectedChild {
                        parent: parent.unwrap_or(NodeKind::Extension),
                        expected: allowed,
                        found: child.kind(),
                    },
                });
            }
        }

        if let Some(required) = required_parent(child.kind()) {
            if parent != Some(required) {
                out.push(Violation {
                    path: path.clone(),
                    kind: ViolationKind::Misplaced {
                        found: child.kind(),
                        expected_parent: required,
                    },
                });
            }
        }

        check_node(child, path, out);
        check_children(Some(child.kind()), child.children(), path, out);
        path.pop();
    }
}

fn check_node(node: &Node, path: &[usize], out: &mut Vec<Violation>) {
    match node {
        Node::Heading(h) if !(1..=6).contains(&h.level) => out.push(Violation {
            path: path.to_vec(),
            kind: ViolationKind::HeadingLevel(h.level),
        }),
        Node::FootnoteDefinition(f) if f.label.trim().is_empty() => out.push(Violation {
            path: path.to_vec(),
            kind: ViolationKind::EmptyLabel(NodeKind::FootnoteDefinition),
        }),
        Node::FootnoteReference(f) if f.label.trim().is_empty() => out.push(Violation {
            path: path.to_vec(),
            kind: ViolationKind::EmptyLabel(NodeKind::FootnoteReference),
        }),
        _ => {}
    }
    check_metadata(node.metadata(), path, out);
}

fn check_metadata(metadata: &Metadata, path: &[usize], out: &mut Vec<Violation>) {
    for key in metadata.keys() {
        if !is_valid_metadata_key(key) {
            out.push(Violation {
                path: path.to_vec(),
                kind: ViolationKind::InvalidMetadataKey(key.clone()),
            });
        }
    }
}
