//! Plain text
//!
//! Parsing splits on blank lines: every run of non-blank lines becomes one
//! paragraph, its lines joined by soft line breaks. Rendering writes the text
//! of every block with light-weight markers for lists and quotes.

use super::indent_lines;
use crate::error::{ParsingError, RenderingError};
use crate::format::{InputSource, Parser, Renderer};
use docmux_ast::ast::{
    visit_children, BlockQuote, Code, CodeBlock, DefinitionList, FootnoteDefinition,
    FootnoteReference, Heading, HtmlBlock, HtmlInline, Image, LineBreak, List, ListItem,
    MathBlock, MathInline, Paragraph, SourceLocation, Table, TableRow, Text, ThematicBreak,
    Visitor,
};
use docmux_ast::{Document, DocumentMetadata, Node};
use docmux_config::DocmuxOptions;
use std::io::Write;

pub const FORMAT: &str = "plaintext";

#[derive(Debug, Clone, Copy, Default)]
pub struct PlainTextParser;

impl Parser for PlainTextParser {
    fn parse(
        &self,
        input: &InputSource,
        _options: &DocmuxOptions,
    ) -> Result<Document, ParsingError> {
        Ok(Document::new(paragraphs(input.text()?)))
    }

    fn extract_metadata(
        &self,
        input: &InputSource,
        _options: &DocmuxOptions,
    ) -> Result<DocumentMetadata, ParsingError> {
        input.text()?;
        Ok(DocumentMetadata::default())
    }
}

fn paragraphs(text: &str) -> Vec<Node> {
    let mut blocks = Vec::new();
    let mut lines: Vec<&str> = Vec::new();
    let mut start = SourceLocation::default();
    let mut offset = 0;

    for (index, raw) in text.split_inclusive('\n').enumerate() {
        let line = raw.trim_end_matches(&['\n', '\r'][..]);
        if line.trim().is_empty() {
            if !lines.is_empty() {
                blocks.push(paragraph(&lines, start));
                lines.clear();
            }
        } else {
            if lines.is_empty() {
                start = SourceLocation::new(offset, index + 1, 1);
            }
            lines.push(line);
        }
        offset += raw.len();
    }
    if !lines.is_empty() {
        blocks.push(paragraph(&lines, start));
    }
    blocks
}

fn paragraph(lines: &[&str], start: SourceLocation) -> Node {
    let mut children = Vec::with_capacity(lines.len() * 2);
    for (i, line) in lines.iter().enumerate() {
        if i > 0 {
            children.push(Node::LineBreak(LineBreak {
                soft: true,
                ..Default::default()
            }));
        }
        children.push(Node::text(*line));
    }
    Node::paragraph(children).with_source(start)
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PlainTextRenderer;

impl Renderer for PlainTextRenderer {
    fn render(
        &self,
        doc: &Document,
        _options: &DocmuxOptions,
        sink: &mut dyn Write,
    ) -> Result<(), RenderingError> {
        let text = blocks(&mut TextWriter, &doc.children);
        if !text.is_empty() {
            sink.write_all(text.as_bytes())?;
            sink.write_all(b"\n")?;
        }
        Ok(())
    }
}

fn blocks(writer: &mut TextWriter, nodes: &[Node]) -> String {
    visit_children(writer, nodes)
        .into_iter()
        .filter(|block| !block.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n")
}

struct TextWriter;

impl TextWriter {
    fn inline(&mut self, nodes: &[Node]) -> String {
        visit_children(self, nodes).concat()
    }
}

impl Visitor for TextWriter {
    type Output = String;

    fn visit_default(&mut self, node: &Node) -> String {
        if node.is_inline() {
            self.inline(node.children())
        } else {
            blocks(self, node.children())
        }
    }

    fn visit_text(&mut self, text: &Text, _node: &Node) -> String {
        text.content.clone()
    }

    fn visit_code(&mut self, code: &Code, _node: &Node) -> String {
        code.content.clone()
    }

    fn visit_math_inline(&mut self, math: &MathInline, _node: &Node) -> String {
        math.content.clone()
    }

    fn visit_html_inline(&mut self, html: &HtmlInline, _node: &Node) -> String {
        html.content.clone()
    }

    fn visit_image(&mut self, image: &Image, _node: &Node) -> String {
        image.alt.clone().unwrap_or_default()
    }

    fn visit_line_break(&mut self, _brk: &LineBreak, _node: &Node) -> String {
        "\n".to_string()
    }

    fn visit_footnote_reference(
        &mut self,
        reference: &FootnoteReference,
        _node: &Node,
    ) -> String {
        format!("[{}]", reference.label)
    }

    fn visit_heading(&mut self, heading: &Heading, _node: &Node) -> String {
        self.inline(&heading.children)
    }

    fn visit_paragraph(&mut self, paragraph: &Paragraph, _node: &Node) -> String {
        self.inline(&paragraph.children)
    }

    fn visit_code_block(&mut self, code: &CodeBlock, _node: &Node) -> String {
        code.content.trim_end_matches('\n').to_string()
    }

    fn visit_math_block(&mut self, math: &MathBlock, _node: &Node) -> String {
        math.content.trim_end_matches('\n').to_string()
    }

    fn visit_html_block(&mut self, html: &HtmlBlock, _node: &Node) -> String {
        html.content.trim_end_matches('\n').to_string()
    }

    fn visit_block_quote(&mut self, quote: &BlockQuote, _node: &Node) -> String {
        indent_lines(&blocks(self, &quote.children), "> ", "> ")
    }

    fn visit_list(&mut self, list: &List, _node: &Node) -> String {
        let separator = if list.tight { "\n" } else { "\n\n" };
        list.children
            .iter()
            .enumerate()
            .map(|(i, item)| {
                let marker = if list.ordered {
                    format!("{}. ", list.start + i as u64)
                } else {
                    "- ".to_string()
                };
                let body = item.accept(self);
                indent_lines(&body, &marker, &" ".repeat(marker.len()))
            })
            .collect::<Vec<_>>()
            .join(separator)
    }

    fn visit_list_item(&mut self, item: &ListItem, _node: &Node) -> String {
        visit_children(self, &item.children)
            .into_iter()
            .filter(|block| !block.is_empty())
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn visit_table(&mut self, table: &Table, _node: &Node) -> String {
        visit_children(self, &table.children).join("\n")
    }

    fn visit_table_row(&mut self, row: &TableRow, _node: &Node) -> String {
        row.children
            .iter()
            .map(|cell| self.inline(cell.children()).replace('\n', " "))
            .collect::<Vec<_>>()
            .join("\t")
    }

    fn visit_thematic_break(&mut self, _brk: &ThematicBreak, _node: &Node) -> String {
        "* * *".to_string()
    }

    fn visit_footnote_definition(
        &mut self,
        definition: &FootnoteDefinition,
        _node: &Node,
    ) -> String {
        let marker = format!("[{}] ", definition.label);
        indent_lines(&blocks(self, &definition.children), &marker, "    ")
    }

    fn visit_definition_list(&mut self, list: &DefinitionList, _node: &Node) -> String {
        list.children
            .iter()
            .map(|child| match child {
                Node::DefinitionDescription(description) => {
                    indent_lines(&blocks(self, &description.children), "    ", "    ")
                }
                other => other.accept(self),
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> Document {
        PlainTextParser
            .parse(&InputSource::from_bytes(text), &DocmuxOptions::default())
            .unwrap()
    }

    fn render(doc: &Document) -> String {
        PlainTextRenderer
            .render_to_string(doc, &DocmuxOptions::default())
            .unwrap()
    }

    #[test]
    fn test_blank_lines_split_paragraphs() {
        let doc = parse("first line\r\nsecond line\n\n  \n\nnext\n");
        assert_eq!(doc.children.len(), 2);
        assert_eq!(doc.children[0].children().len(), 3);
        assert_eq!(
            doc.children[1].source(),
            Some(SourceLocation::new(29, 6, 1))
        );
        assert_eq!(render(&doc), "first line\nsecond line\n\nnext\n");
    }

    #[test]
    fn test_empty_input() {
        let doc = parse("\n\n");
        assert!(doc.is_empty());
        assert_eq!(render(&doc), "");
    }

    #[test]
    fn test_invalid_utf8_is_a_parsing_error() {
        let result = PlainTextParser.parse(
            &InputSource::from_bytes(vec![b'a', 0xff]),
            &DocmuxOptions::default(),
        );
        assert!(matches!(result, Err(ParsingError::Encoding(_))));
    }

    #[test]
    fn test_render_structure() {
        let doc = Document::new(vec![
            Node::heading(1, vec![Node::text("Title")]),
            Node::list(
                true,
                vec![
                    Node::list_item(vec![Node::paragraph(vec![Node::text("one")])]),
                    Node::list_item(vec![
                        Node::paragraph(vec![Node::text("two")]),
                        Node::list(
                            false,
                            vec![Node::list_item(vec![Node::paragraph(vec![Node::text(
                                "nested",
                            )])])],
                        ),
                    ]),
                ],
            ),
            Node::thematic_break(),
        ]);
        insta::assert_snapshot!(render(&doc).trim_end(), @r"
        Title

        1. one
        2. two
           - nested

        * * *
        ");
    }
}
