//! Tagged-tree interchange format
//!
//! Every node serializes as `{"kind": <variant>, "fields": {...}}`, recursively;
//! the document root adds a `schema_version`. The format is meant for persistence
//! and cross-process exchange, so reading is tolerant: unknown fields are ignored,
//! optional fields default, and documents written by a newer schema version are
//! accepted as long as their structure parses.
//!
//! Round-trip law: `from_json(&to_json(&doc)?)? == doc`.

use super::document::Document;
use super::elements::Node;
use super::metadata::DocumentMetadata;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Version written into every serialized document
pub const SCHEMA_VERSION: u32 = 1;

const DOCUMENT_KIND: &str = "Document";

#[derive(Error, Debug)]
pub enum SerializationError {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("expected a Document, found kind '{0}'")]
    UnexpectedKind(String),
}

/// Wire shape of [`Document`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentEnvelope {
    pub kind: String,
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    #[serde(default)]
    pub fields: DocumentFields,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocumentFields {
    #[serde(default)]
    pub children: Vec<Node>,
    #[serde(default, skip_serializing_if = "DocumentMetadata::is_empty")]
    pub metadata: DocumentMetadata,
}

fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

impl From<Document> for DocumentEnvelope {
    fn from(doc: Document) -> Self {
        DocumentEnvelope {
            kind: DOCUMENT_KIND.to_string(),
            schema_version: SCHEMA_VERSION,
            fields: DocumentFields {
                children: doc.children,
                metadata: doc.metadata,
            },
        }
    }
}

impl TryFrom<DocumentEnvelope> for Document {
    type Error = SerializationError;

    fn try_from(envelope: DocumentEnvelope) -> Result<Self, Self::Error> {
        if envelope.kind != DOCUMENT_KIND {
            return Err(SerializationError::UnexpectedKind(envelope.kind));
        }
        if envelope.schema_version > SCHEMA_VERSION {
            log::debug!(
                "reading document written with schema version {} (current {})",
                envelope.schema_version,
                SCHEMA_VERSION
            );
        }
        Ok(Document {
            children: envelope.fields.children,
            metadata: envelope.fields.metadata,
        })
    }
}

pub fn to_json(doc: &Document) -> Result<String, SerializationError> {
    Ok(serde_json::to_string(doc)?)
}

pub fn to_json_pretty(doc: &Document) -> Result<String, SerializationError> {
    Ok(serde_json::to_string_pretty(doc)?)
}

pub fn from_json(source: &str) -> Result<Document, SerializationError> {
    Ok(serde_json::from_str(source)?)
}

pub fn to_value(doc: &Document) -> Result<serde_json::Value, SerializationError> {
    Ok(serde_json::to_value(doc)?)
}

pub fn from_value(value: serde_json::Value) -> Result<Document, SerializationError> {
    Ok(serde_json::from_value(value)?)
}

pub fn node_to_value(node: &Node) -> Result<serde_json::Value, SerializationError> {
    Ok(serde_json::to_value(node)?)
}

pub fn node_from_value(value: serde_json::Value) -> Result<Node, SerializationError> {
    Ok(serde_json::from_value(value)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::elements::{Alignment, TableCell, TableRow};
    use serde_json::json;

    #[test]
    fn test_tagged_shape() {
        let node = Node::heading(1, vec![Node::text("Title")]);
        let value = node_to_value(&node).unwrap();
        assert_eq!(
            value,
            json!({
                "kind": "Heading",
                "fields": {
                    "level": 1,
                    "children": [{"kind": "Text", "fields": {"content": "Title"}}]
                }
            })
        );
    }

    #[test]
    fn test_pretty_output() {
        let doc = Document::new(vec![Node::paragraph(vec![Node::text("hi")])]);
        insta::assert_snapshot!(to_json_pretty(&doc).unwrap(), @r#"
        {
          "kind": "Document",
          "schema_version": 1,
          "fields": {
            "children": [
              {
                "kind": "Paragraph",
                "fields": {
                  "children": [
                    {
                      "kind": "Text",
                      "fields": {
                        "content": "hi"
                      }
                    }
                  ]
                }
              }
            ]
          }
        }
        "#);
    }

    #[test]
    fn test_document_envelope() {
        let doc = Document::new(vec![Node::thematic_break()]);
        let value = to_value(&doc).unwrap();
        assert_eq!(value["kind"], "Document");
        assert_eq!(value["schema_version"], SCHEMA_VERSION);
        assert_eq!(value["fields"]["children"][0]["kind"], "ThematicBreak");
    }

    #[test]
    fn test_unknown_fields_are_ignored() {
        let value = json!({
            "kind": "Document",
            "schema_version": 7,
            "fields": {
                "children": [
                    {"kind": "Paragraph", "fields": {
                        "children": [{"kind": "Text", "fields": {"content": "x", "future": true}}],
                        "shiny_new_field": [1, 2, 3]
                    }}
                ]
            },
            "producer": "someone else"
        });
        let doc = from_value(value).unwrap();
        assert_eq!(doc, Document::new(vec![Node::paragraph(vec![Node::text("x")])]));
    }

    #[test]
    fn test_wrong_root_kind_is_rejected() {
        let err = from_json(r#"{"kind": "Paragraph", "fields": {}}"#).unwrap_err();
        assert!(err.to_string().contains("Paragraph"));
    }

    #[test]
    fn test_table_defaults_survive_roundtrip() {
        let doc = Document::new(vec![Node::Table(crate::ast::elements::Table::new(vec![
            Node::TableRow(TableRow::header(vec![Node::TableCell(
                TableCell::new(vec![Node::text("h")]).aligned(Alignment::Center),
            )])),
        ]))]);
        let back = from_json(&to_json(&doc).unwrap()).unwrap();
        assert_eq!(back, doc);
    }
}
