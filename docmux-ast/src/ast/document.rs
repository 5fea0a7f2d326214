//! Document root

use super::elements::{Node, NodeKind};
use super::metadata::DocumentMetadata;
use super::serialize::DocumentEnvelope;
use serde::{Deserialize, Serialize};

/// Root of the tree: ordered block children plus document metadata
///
/// Serializes through [`DocumentEnvelope`], i.e. as
/// `{"kind": "Document", "schema_version": N, "fields": {...}}`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(into = "DocumentEnvelope", try_from = "DocumentEnvelope")]
pub struct Document {
    pub children: Vec<Node>,
    pub metadata: DocumentMetadata,
}

impl Document {
    pub fn new(children: Vec<Node>) -> Self {
        Self {
            children,
            metadata: DocumentMetadata::default(),
        }
    }

    pub fn with_metadata(mut self, metadata: DocumentMetadata) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// Count nodes of `kind` anywhere in the tree
    pub fn count(&self, kind: NodeKind) -> usize {
        let mut count = 0;
        super::traits::walk(&self.children, &mut |node, _| {
            if node.kind() == kind {
                count += 1;
            }
        });
        count
    }

    /// Plain text of all children, blocks separated by blank lines
    pub fn text_content(&self) -> String {
        self.children
            .iter()
            .map(Node::text_content)
            .filter(|text| !text.is_empty())
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_count_descends_into_children() {
        let doc = Document::new(vec![
            Node::heading(1, vec![Node::text("T")]),
            Node::list(
                false,
                vec![
                    Node::list_item(vec![Node::paragraph(vec![Node::text("a")])]),
                    Node::list_item(vec![Node::paragraph(vec![Node::text("b")])]),
                ],
            ),
        ]);
        assert_eq!(doc.count(NodeKind::Text), 3);
        assert_eq!(doc.count(NodeKind::ListItem), 2);
        assert_eq!(doc.text_content(), "T\n\nab");
    }
}
