//! Markdown
//!
//! Renders GitHub-flavoured Markdown: pipe tables, fenced code, task lists,
//! strikethrough and footnotes, plus `$`-delimited math and `: ` definition
//! lists. Raw HTML follows `markdown.html_mode`; link and image targets with
//! an unsafe scheme are dropped and only their text is kept.
//!
//! Parsing Markdown needs an external parser plugin; the built-in record
//! for it is detection-only.

mod escape;
mod render;

pub use escape::escape_text;

use crate::error::RenderingError;
use crate::format::Renderer;
use docmux_ast::{Document, DocumentMetadata};
use docmux_config::DocmuxOptions;
use render::MarkdownWriter;
use std::io::Write;

pub const FORMAT: &str = "markdown";

/// Capability an external Markdown parser provides
pub const PARSER_CAPABILITY: &str = "markdown-parser";

#[derive(Debug, Clone, Copy, Default)]
pub struct MarkdownRenderer;

impl Renderer for MarkdownRenderer {
    fn render(
        &self,
        doc: &Document,
        options: &DocmuxOptions,
        sink: &mut dyn Write,
    ) -> Result<(), RenderingError> {
        if options.markdown.front_matter && !doc.metadata.is_empty() {
            sink.write_all(front_matter(&doc.metadata)?.as_bytes())?;
        }
        let body = MarkdownWriter::new(&options.markdown).blocks(&doc.children);
        if !body.is_empty() {
            sink.write_all(body.as_bytes())?;
            sink.write_all(b"\n")?;
        }
        Ok(())
    }
}

fn front_matter(metadata: &DocumentMetadata) -> Result<String, RenderingError> {
    let yaml =
        serde_yaml::to_string(metadata).map_err(|e| RenderingError::Serialization(e.to_string()))?;
    Ok(format!("---\n{}---\n\n", yaml))
}
