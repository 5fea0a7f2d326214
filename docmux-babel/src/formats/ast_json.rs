//! The tagged-tree interchange format as a regular format
//!
//! Lets a document be persisted after parsing and picked up again later, or
//! handed to another process, without losing structure.

use crate::error::{ParsingError, RenderingError};
use crate::format::{InputSource, Parser, Renderer};
use docmux_ast::ast::{from_json, to_json_pretty, SerializationError};
use docmux_ast::{Document, DocumentMetadata};
use docmux_config::DocmuxOptions;
use std::io::Write;

pub const FORMAT: &str = "ast-json";
pub const MIME_TYPE: &str = "application/vnd.docmux.ast+json";

#[derive(Debug, Clone, Copy, Default)]
pub struct AstJsonParser;

impl Parser for AstJsonParser {
    fn parse(
        &self,
        input: &InputSource,
        _options: &DocmuxOptions,
    ) -> Result<Document, ParsingError> {
        from_json(input.text()?).map_err(malformed)
    }

    fn extract_metadata(
        &self,
        input: &InputSource,
        _options: &DocmuxOptions,
    ) -> Result<DocumentMetadata, ParsingError> {
        let value: serde_json::Value = serde_json::from_str(input.text()?)
            .map_err(|e| malformed(SerializationError::Json(e)))?;
        let metadata = value
            .get("fields")
            .and_then(|fields| fields.get("metadata"))
            .cloned()
            .unwrap_or(serde_json::Value::Null);
        if metadata.is_null() {
            return Ok(DocumentMetadata::default());
        }
        serde_json::from_value(metadata).map_err(|e| malformed(SerializationError::Json(e)))
    }
}

fn malformed(err: SerializationError) -> ParsingError {
    ParsingError::malformed(FORMAT, err.to_string())
}

#[derive(Debug, Clone, Copy, Default)]
pub struct AstJsonRenderer;

impl Renderer for AstJsonRenderer {
    fn render(
        &self,
        doc: &Document,
        _options: &DocmuxOptions,
        sink: &mut dyn Write,
    ) -> Result<(), RenderingError> {
        let json =
            to_json_pretty(doc).map_err(|e| RenderingError::Serialization(e.to_string()))?;
        sink.write_all(json.as_bytes())?;
        sink.write_all(b"\n")?;
        Ok(())
    }
}
