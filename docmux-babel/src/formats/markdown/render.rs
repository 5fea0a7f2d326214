//! Document tree to Markdown text
//!
//! Every handler returns the Markdown for its node. Block handlers return
//! their text without surrounding blank lines; the enclosing container
//! decides the separator.

use super::escape::{destination, escape_text, fence_length, inline_code_ticks, title};
use crate::formats::indent_lines;
use docmux_ast::ast::{
    visit_children, Alignment, BlockQuote, Code, CodeBlock, DefinitionList, Emphasis,
    ExtensionNode, FootnoteDefinition, FootnoteReference, Heading, HtmlBlock, HtmlInline, Image,
    LineBreak, Link, List, ListItem, MathBlock, MathInline, Paragraph, Strikethrough, Strong,
    Table, TableRow, Text, ThematicBreak, Visitor,
};
use docmux_ast::Node;
use docmux_config::{HtmlMode, MarkdownOptions};
use docmux_security::is_safe_url_scheme;

pub(super) struct MarkdownWriter<'a> {
    options: &'a MarkdownOptions,
}

impl<'a> MarkdownWriter<'a> {
    pub(super) fn new(options: &'a MarkdownOptions) -> Self {
        Self { options }
    }

    /// Blocks separated by one blank line, empty output skipped
    pub(super) fn blocks(&mut self, nodes: &[Node]) -> String {
        self.join_blocks(nodes, "\n\n")
    }

    fn join_blocks(&mut self, nodes: &[Node], separator: &str) -> String {
        visit_children(self, nodes)
            .into_iter()
            .filter(|block| !block.is_empty())
            .collect::<Vec<_>>()
            .join(separator)
    }

    fn inline(&mut self, nodes: &[Node]) -> String {
        visit_children(self, nodes).concat()
    }

    /// Inline content that has to stay on one line
    fn single_line(&mut self, nodes: &[Node]) -> String {
        self.inline(nodes).replace("\\\n", " ").replace('\n', " ")
    }

    fn list_item(&mut self, item: &ListItem, separator: &str) -> String {
        let body = self.join_blocks(&item.children, separator);
        match item.checked {
            Some(true) => format!("[x] {}", body),
            Some(false) => format!("[ ] {}", body),
            None => body,
        }
    }

    fn table_row(&mut self, row: &TableRow, columns: usize) -> String {
        let mut cells: Vec<String> = row
            .children
            .iter()
            .map(|cell| self.single_line(cell.children()))
            .collect();
        cells.resize(columns, String::new());
        format!("| {} |", cells.join(" | "))
    }
}

fn alignment_marker(alignment: Alignment) -> &'static str {
    match alignment {
        Alignment::None => "---",
        Alignment::Left => ":---",
        Alignment::Center => ":---:",
        Alignment::Right => "---:",
    }
}

impl Visitor for MarkdownWriter<'_> {
    type Output = String;

    fn visit_default(&mut self, node: &Node) -> String {
        if node.is_inline() {
            self.inline(node.children())
        } else {
            self.blocks(node.children())
        }
    }

    fn visit_extension(&mut self, extension: &ExtensionNode, _node: &Node) -> String {
        log::debug!("extension node '{}' has no markdown form", extension.name);
        String::new()
    }

    // Inline

    fn visit_text(&mut self, text: &Text, _node: &Node) -> String {
        escape_text(&text.content)
    }

    fn visit_strong(&mut self, strong: &Strong, _node: &Node) -> String {
        format!("**{}**", self.inline(&strong.children))
    }

    fn visit_emphasis(&mut self, emphasis: &Emphasis, _node: &Node) -> String {
        format!("*{}*", self.inline(&emphasis.children))
    }

    fn visit_strikethrough(&mut self, strike: &Strikethrough, _node: &Node) -> String {
        format!("~~{}~~", self.inline(&strike.children))
    }

    fn visit_code(&mut self, code: &Code, _node: &Node) -> String {
        let ticks = "`".repeat(inline_code_ticks(&code.content));
        let content = code.content.as_str();
        let padded = content.starts_with('`')
            || content.ends_with('`')
            || (content.starts_with(' ') && content.ends_with(' ') && !content.trim().is_empty());
        if padded {
            format!("{ticks} {content} {ticks}")
        } else {
            format!("{ticks}{content}{ticks}")
        }
    }

    fn visit_link(&mut self, link: &Link, _node: &Node) -> String {
        let text = self.inline(&link.children);
        if !is_safe_url_scheme(&link.url) {
            log::warn!("dropping link target with unsafe scheme");
            return text;
        }
        format!(
            "[{}]({}{})",
            text,
            destination(&link.url),
            title(link.title.as_deref())
        )
    }

    fn visit_image(&mut self, image: &Image, _node: &Node) -> String {
        let alt = escape_text(image.alt.as_deref().unwrap_or_default());
        if !is_safe_url_scheme(&image.url) {
            log::warn!("dropping image source with unsafe scheme");
            return alt;
        }
        format!(
            "![{}]({}{})",
            alt,
            destination(&image.url),
            title(image.title.as_deref())
        )
    }

    fn visit_line_break(&mut self, brk: &LineBreak, _node: &Node) -> String {
        if brk.soft {
            "\n".to_string()
        } else {
            "\\\n".to_string()
        }
    }

    fn visit_html_inline(&mut self, html: &HtmlInline, _node: &Node) -> String {
        match self.options.html_mode {
            HtmlMode::Escape => escape_text(&html.content),
            HtmlMode::PassThrough => html.content.clone(),
            HtmlMode::Drop => String::new(),
        }
    }

    fn visit_math_inline(&mut self, math: &MathInline, _node: &Node) -> String {
        format!("${}$", math.content.trim())
    }

    fn visit_footnote_reference(
        &mut self,
        reference: &FootnoteReference,
        _node: &Node,
    ) -> String {
        format!("[^{}]", reference.label)
    }

    // Block

    fn visit_heading(&mut self, heading: &Heading, _node: &Node) -> String {
        let level = heading.level.clamp(1, 6) as usize;
        let text = self.single_line(&heading.children);
        format!("{} {}", "#".repeat(level), text.trim())
    }

    fn visit_paragraph(&mut self, paragraph: &Paragraph, _node: &Node) -> String {
        self.inline(&paragraph.children)
    }

    fn visit_code_block(&mut self, code: &CodeBlock, _node: &Node) -> String {
        let fence = "`".repeat(fence_length(&code.content, '`'));
        let language = code.language.as_deref().unwrap_or_default();
        let content = code.content.trim_end_matches('\n');
        if content.is_empty() {
            format!("{fence}{language}\n{fence}")
        } else {
            format!("{fence}{language}\n{content}\n{fence}")
        }
    }

    fn visit_block_quote(&mut self, quote: &BlockQuote, _node: &Node) -> String {
        indent_lines(&self.blocks(&quote.children), "> ", "> ")
    }

    fn visit_list(&mut self, list: &List, _node: &Node) -> String {
        let separator = if list.tight { "\n" } else { "\n\n" };
        let mut number = list.start;
        list.children
            .iter()
            .map(|child| {
                let marker = if list.ordered {
                    let marker = format!("{}. ", number);
                    number += 1;
                    marker
                } else {
                    format!("{} ", self.options.bullet)
                };
                let body = match child {
                    Node::ListItem(item) => self.list_item(item, separator),
                    other => other.accept(self),
                };
                indent_lines(&body, &marker, &" ".repeat(marker.len()))
            })
            .collect::<Vec<_>>()
            .join(separator)
    }

    fn visit_list_item(&mut self, item: &ListItem, _node: &Node) -> String {
        self.list_item(item, "\n\n")
    }

    fn visit_table(&mut self, table: &Table, _node: &Node) -> String {
        let rows: Vec<&TableRow> = table
            .children
            .iter()
            .filter_map(|child| match child {
                Node::TableRow(row) => Some(row),
                _ => None,
            })
            .collect();
        let Some((head, body)) = rows.split_first() else {
            return String::new();
        };
        let columns = rows.iter().map(|row| row.children.len()).max().unwrap_or(0).max(1);

        let mut alignments: Vec<&str> = head
            .children
            .iter()
            .map(|cell| match cell {
                Node::TableCell(cell) => alignment_marker(cell.alignment),
                _ => alignment_marker(Alignment::None),
            })
            .collect();
        alignments.resize(columns, alignment_marker(Alignment::None));

        let mut lines = vec![
            self.table_row(head, columns),
            format!("| {} |", alignments.join(" | ")),
        ];
        for row in body {
            lines.push(self.table_row(row, columns));
        }
        let mut out = lines.join("\n");
        if let Some(caption) = table.caption.as_deref().filter(|c| !c.is_empty()) {
            out.push_str(&format!("\n\n*{}*", escape_text(caption)));
        }
        out
    }

    fn visit_table_row(&mut self, row: &TableRow, _node: &Node) -> String {
        let columns = row.children.len();
        self.table_row(row, columns)
    }

    fn visit_thematic_break(&mut self, _brk: &ThematicBreak, _node: &Node) -> String {
        "---".to_string()
    }

    fn visit_html_block(&mut self, html: &HtmlBlock, _node: &Node) -> String {
        let content = html.content.trim_end_matches('\n');
        match self.options.html_mode {
            HtmlMode::Escape => escape_text(content),
            HtmlMode::PassThrough => content.to_string(),
            HtmlMode::Drop => String::new(),
        }
    }

    fn visit_math_block(&mut self, math: &MathBlock, _node: &Node) -> String {
        format!("$$\n{}\n$$", math.content.trim_matches('\n'))
    }

    fn visit_footnote_definition(
        &mut self,
        definition: &FootnoteDefinition,
        _node: &Node,
    ) -> String {
        let marker = format!("[^{}]: ", definition.label);
        indent_lines(&self.blocks(&definition.children), &marker, "    ")
    }

    fn visit_definition_list(&mut self, list: &DefinitionList, _node: &Node) -> String {
        let mut out = String::new();
        for child in &list.children {
            let text = match child {
                Node::DefinitionTerm(term) => {
                    if !out.is_empty() {
                        out.push_str("\n\n");
                    }
                    self.single_line(&term.children)
                }
                Node::DefinitionDescription(description) => {
                    out.push('\n');
                    indent_lines(&self.blocks(&description.children), ":   ", "    ")
                }
                other => other.accept(self),
            };
            out.push_str(&text);
        }
        out
    }
}
