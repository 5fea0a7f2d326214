//! Built-in formats
//!
//! `plaintext` and `ast-json` parse and render, `markdown` renders. Every
//! other well-known format gets a detection-only record naming the external
//! capability that would convert it, so inputs are recognized and the user
//! is told what to install instead of getting a generic "unknown format".

pub mod ast_json;
pub mod markdown;
pub mod plaintext;

use crate::format::{ConverterMetadata, MagicSignature};

pub use ast_json::{AstJsonParser, AstJsonRenderer};
pub use markdown::MarkdownRenderer;
pub use plaintext::{PlainTextParser, PlainTextRenderer};

const OFFICE_BACKEND: &str = "office-backend";

/// Records for every built-in format, in registration order
pub fn builtin_records() -> Vec<ConverterMetadata> {
    let mut records = vec![
        ConverterMetadata::parser(plaintext::FORMAT, PlainTextParser)
            .extensions(&["txt", "text"])
            .mime_types(&["text/plain"])
            .description("Plain text, paragraphs split on blank lines"),
        ConverterMetadata::renderer(plaintext::FORMAT, PlainTextRenderer)
            .extensions(&["txt"])
            .mime_types(&["text/plain"])
            .description("Plain text"),
        ConverterMetadata::parser(ast_json::FORMAT, AstJsonParser)
            .extensions(&["docmux.json"])
            .mime_types(&[ast_json::MIME_TYPE])
            .signature(MagicSignature::new(*b"{\"kind\":\"Document\""))
            .signature(MagicSignature::new(*b"{\n  \"kind\": \"Document\""))
            .priority(10)
            .description("Serialized document tree"),
        ConverterMetadata::renderer(ast_json::FORMAT, AstJsonRenderer)
            .extensions(&["docmux.json"])
            .mime_types(&[ast_json::MIME_TYPE])
            .description("Serialized document tree"),
        ConverterMetadata::renderer(markdown::FORMAT, MarkdownRenderer)
            .extensions(&["md", "markdown"])
            .mime_types(&["text/markdown"])
            .description("GitHub-flavoured Markdown"),
        ConverterMetadata::detect_only(markdown::FORMAT)
            .extensions(&["md", "markdown"])
            .mime_types(&["text/markdown", "text/x-markdown"])
            .requires(markdown::PARSER_CAPABILITY)
            .remediation("Register a Markdown parser plugin providing 'markdown-parser'."),
    ];

    records.extend([
        external("pdf", "pdf-backend", "PDF")
            .extensions(&["pdf"])
            .mime_types(&["application/pdf"])
            .signature(MagicSignature::new(*b"%PDF")),
        external("docx", OFFICE_BACKEND, "Word document").extensions(&["docx"]).mime_types(&[
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        ]),
        external("xlsx", OFFICE_BACKEND, "Excel workbook")
            .extensions(&["xlsx"])
            .mime_types(&["application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"]),
        external("pptx", OFFICE_BACKEND, "PowerPoint presentation")
            .extensions(&["pptx"])
            .mime_types(&[
                "application/vnd.openxmlformats-officedocument.presentationml.presentation",
            ]),
        external("epub", "epub-backend", "EPUB e-book")
            .extensions(&["epub"])
            .mime_types(&["application/epub+zip"]),
        external("html", "html-backend", "HTML page")
            .extensions(&["html", "htm", "xhtml"])
            .mime_types(&["text/html", "application/xhtml+xml"])
            .signature(MagicSignature::new(*b"<!DOCTYPE html"))
            .signature(MagicSignature::new(*b"<!doctype html"))
            .signature(MagicSignature::new(*b"<html")),
        external("rtf", "rtf-backend", "Rich Text Format")
            .extensions(&["rtf"])
            .mime_types(&["application/rtf", "text/rtf"])
            .signature(MagicSignature::new(*b"{\\rtf")),
        external("odt", "opendocument-backend", "OpenDocument text")
            .extensions(&["odt"])
            .mime_types(&["application/vnd.oasis.opendocument.text"]),
        external("zip", "archive-backend", "Zip archive")
            .extensions(&["zip"])
            .mime_types(&["application/zip"])
            .signature(MagicSignature::new(*b"PK\x03\x04")),
    ]);
    records
}

fn external(format: &str, capability: &str, label: &str) -> ConverterMetadata {
    ConverterMetadata::detect_only(format)
        .requires(capability)
        .description(label)
        .remediation(format!(
            "{} input needs a plugin providing '{}'; register one with the converter registry.",
            label, capability
        ))
}

/// Prefix the first line with `first` and every later line with `rest`
///
/// Empty lines only get the prefix with trailing spaces removed.
pub(crate) fn indent_lines(text: &str, first: &str, rest: &str) -> String {
    let mut out = String::with_capacity(text.len() + first.len());
    for (i, line) in text.split('\n').enumerate() {
        if i > 0 {
            out.push('\n');
        }
        let prefix = if i == 0 { first } else { rest };
        if line.is_empty() {
            out.push_str(prefix.trim_end());
        } else {
            out.push_str(prefix);
            out.push_str(line);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::CapabilityKind;

    #[test]
    fn test_indent_lines() {
        assert_eq!(indent_lines("a\n\nb", "> ", "> "), "> a\n>\n> b");
        assert_eq!(indent_lines("a\nb", "1. ", "   "), "1. a\n   b");
        assert_eq!(indent_lines("", "- ", "  "), "-");
    }

    #[test]
    fn test_external_records_are_detection_only() {
        let records = builtin_records();
        for format in ["pdf", "docx", "xlsx", "pptx", "epub", "html", "rtf", "odt", "zip"] {
            let record = records
                .iter()
                .find(|r| r.format == format)
                .unwrap_or_else(|| panic!("missing record for {format}"));
            assert_eq!(record.kind(), CapabilityKind::Detect);
            assert_eq!(record.requires.len(), 1, "{format}");
            assert!(record.remediation.is_some(), "{format}");
        }
    }

    #[test]
    fn test_ast_json_outranks_generic_records() {
        let records = builtin_records();
        let ast = records
            .iter()
            .find(|r| r.format == ast_json::FORMAT && r.kind() == CapabilityKind::Parser)
            .unwrap();
        assert!(ast.matches_content(b"{\"kind\":\"Document\",\"fields\":{}}"));
        assert!(ast.matches_file_name("report.docmux.json"));
        assert!(!ast.matches_file_name("package.json"));
    }
}
