//! Node variants of the document tree
//!
//! The tree is a closed sum type: [`Node`] has one variant per element kind, each
//! wrapping a payload struct from [`block`] or [`inline`]. Adding a variant is a
//! breaking change by construction, which keeps `match` exhaustiveness meaningful
//! for every consumer. Plugins that need something the core does not model use
//! [`Node::Extension`], whose payload is untyped JSON.
//!
//! Nodes are plain values: equality is structural (`PartialEq` over every field),
//! there is no identity. Transforms consume nodes by value and return new ones, so
//! untouched subtrees are moved, never copied.

pub mod block;
pub mod inline;

pub use block::{
    Alignment, BlockQuote, CodeBlock, DefinitionDescription, DefinitionList, DefinitionTerm,
    FootnoteDefinition, Heading, HtmlBlock, List, ListItem, MathBlock, Paragraph, Table, TableCell,
    TableRow, ThematicBreak,
};
pub use inline::{
    Code, Emphasis, FootnoteReference, HtmlInline, Image, LineBreak, Link, MathInline,
    Strikethrough, Strong, Text,
};

use super::location::SourceLocation;
use super::metadata::Metadata;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Whether a node lives in block or inline slots
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeCategory {
    Block,
    Inline,
}

impl fmt::Display for NodeCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeCategory::Block => write!(f, "block"),
            NodeCategory::Inline => write!(f, "inline"),
        }
    }
}

/// Opaque node for plugin data the core does not model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtensionNode {
    pub name: String,
    pub category: NodeCategory,
    #[serde(default)]
    pub payload: serde_json::Value,
    #[serde(default, skip_serializing_if = "Metadata::is_empty")]
    pub metadata: Metadata,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<SourceLocation>,
}

impl ExtensionNode {
    pub fn new(name: impl Into<String>, category: NodeCategory, payload: serde_json::Value) -> Self {
        Self {
            name: name.into(),
            category,
            payload,
            metadata: Metadata::new(),
            source: None,
        }
    }
}

/// A node of the document tree
///
/// Serialized adjacently tagged: `{"kind": "Heading", "fields": {...}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "fields")]
pub enum Node {
    // Block
    Heading(Heading),
    Paragraph(Paragraph),
    CodeBlock(CodeBlock),
    BlockQuote(BlockQuote),
    List(List),
    ListItem(ListItem),
    Table(Table),
    TableRow(TableRow),
    TableCell(TableCell),
    ThematicBreak(ThematicBreak),
    HtmlBlock(HtmlBlock),
    MathBlock(MathBlock),
    FootnoteDefinition(FootnoteDefinition),
    DefinitionList(DefinitionList),
    DefinitionTerm(DefinitionTerm),
    DefinitionDescription(DefinitionDescription),
    // Inline
    Text(Text),
    Strong(Strong),
    Emphasis(Emphasis),
    Strikethrough(Strikethrough),
    Link(Link),
    Image(Image),
    Code(Code),
    LineBreak(LineBreak),
    HtmlInline(HtmlInline),
    MathInline(MathInline),
    FootnoteReference(FootnoteReference),
    // Either, declared by the payload
    Extension(ExtensionNode),
}

/// Payload-free discriminant of [`Node`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum NodeKind {
    Heading,
    Paragraph,
    CodeBlock,
    BlockQuote,
    List,
    ListItem,
    Table,
    TableRow,
    TableCell,
    ThematicBreak,
    HtmlBlock,
    MathBlock,
    FootnoteDefinition,
    DefinitionList,
    DefinitionTerm,
    DefinitionDescription,
    Text,
    Strong,
    Emphasis,
    Strikethrough,
    Link,
    Image,
    Code,
    LineBreak,
    HtmlInline,
    MathInline,
    FootnoteReference,
    Extension,
}

impl NodeKind {
    pub const ALL: [NodeKind; 28] = [
        NodeKind::Heading,
        NodeKind::Paragraph,
        NodeKind::CodeBlock,
        NodeKind::BlockQuote,
        NodeKind::List,
        NodeKind::ListItem,
        NodeKind::Table,
        NodeKind::TableRow,
        NodeKind::TableCell,
        NodeKind::ThematicBreak,
        NodeKind::HtmlBlock,
        NodeKind::MathBlock,
        NodeKind::FootnoteDefinition,
        NodeKind::DefinitionList,
        NodeKind::DefinitionTerm,
        NodeKind::DefinitionDescription,
        NodeKind::Text,
        NodeKind::Strong,
        NodeKind::Emphasis,
        NodeKind::Strikethrough,
        NodeKind::Link,
        NodeKind::Image,
        NodeKind::Code,
        NodeKind::LineBreak,
        NodeKind::HtmlInline,
        NodeKind::MathInline,
        NodeKind::FootnoteReference,
        NodeKind::Extension,
    ];

    pub fn name(self) -> &'static str {
        match self {
            NodeKind::Heading => "Heading",
            NodeKind::Paragraph => "Paragraph",
            NodeKind::CodeBlock => "CodeBlock",
            NodeKind::BlockQuote => "BlockQuote",
            NodeKind::List => "List",
            NodeKind::ListItem => "ListItem",
            NodeKind::Table => "Table",
            NodeKind::TableRow => "TableRow",
            NodeKind::TableCell => "TableCell",
            NodeKind::ThematicBreak => "ThematicBreak",
            NodeKind::HtmlBlock => "HtmlBlock",
            NodeKind::MathBlock => "MathBlock",
            NodeKind::FootnoteDefinition => "FootnoteDefinition",
            NodeKind::DefinitionList => "DefinitionList",
            NodeKind::DefinitionTerm => "DefinitionTerm",
            NodeKind::DefinitionDescription => "DefinitionDescription",
            NodeKind::Text => "Text",
            NodeKind::Strong => "Strong",
            NodeKind::Emphasis => "Emphasis",
            NodeKind::Strikethrough => "Strikethrough",
            NodeKind::Link => "Link",
            NodeKind::Image => "Image",
            NodeKind::Code => "Code",
            NodeKind::LineBreak => "LineBreak",
            NodeKind::HtmlInline => "HtmlInline",
            NodeKind::MathInline => "MathInline",
            NodeKind::FootnoteReference => "FootnoteReference",
            NodeKind::Extension => "Extension",
        }
    }

    /// Look a kind up by its name; matching ignores case, `-` and `_`
    pub fn from_name(name: &str) -> Option<NodeKind> {
        let wanted: String = name
            .chars()
            .filter(|c| *c != '-' && *c != '_')
            .map(|c| c.to_ascii_lowercase())
            .collect();
        NodeKind::ALL
            .iter()
            .copied()
            .find(|kind| kind.name().to_ascii_lowercase() == wanted)
    }

    /// Category of the kind itself. Extension nodes declare theirs, so `None`.
    pub fn category(self) -> Option<NodeCategory> {
        match self {
            NodeKind::Heading
            | NodeKind::Paragraph
            | NodeKind::CodeBlock
            | NodeKind::BlockQuote
            | NodeKind::List
            | NodeKind::ListItem
            | NodeKind::Table
            | NodeKind::TableRow
            | NodeKind::TableCell
            | NodeKind::ThematicBreak
            | NodeKind::HtmlBlock
            | NodeKind::MathBlock
            | NodeKind::FootnoteDefinition
            | NodeKind::DefinitionList
            | NodeKind::DefinitionTerm
            | NodeKind::DefinitionDescription => Some(NodeCategory::Block),
            NodeKind::Text
            | NodeKind::Strong
            | NodeKind::Emphasis
            | NodeKind::Strikethrough
            | NodeKind::Link
            | NodeKind::Image
            | NodeKind::Code
            | NodeKind::LineBreak
            | NodeKind::HtmlInline
            | NodeKind::MathInline
            | NodeKind::FootnoteReference => Some(NodeCategory::Inline),
            NodeKind::Extension => None,
        }
    }

    /// Category required of this kind's children, `None` for leaves
    pub fn child_category(self) -> Option<NodeCategory> {
        match self {
            NodeKind::Heading
            | NodeKind::Paragraph
            | NodeKind::TableCell
            | NodeKind::DefinitionTerm
            | NodeKind::Strong
            | NodeKind::Emphasis
            | NodeKind::Strikethrough
            | NodeKind::Link => Some(NodeCategory::Inline),
            NodeKind::BlockQuote
            | NodeKind::List
            | NodeKind::ListItem
            | NodeKind::Table
            | NodeKind::TableRow
            | NodeKind::FootnoteDefinition
            | NodeKind::DefinitionList
            | NodeKind::DefinitionDescription => Some(NodeCategory::Block),
            _ => None,
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

macro_rules! with_payload {
    ($node:expr, $payload:ident => $body:expr) => {
        match $node {
            Node::Heading($payload) => $body,
            Node::Paragraph($payload) => $body,
            Node::CodeBlock($payload) => $body,
            Node::BlockQuote($payload) => $body,
            Node::List($payload) => $body,
            Node::ListItem($payload) => $body,
            Node::Table($payload) => $body,
            Node::TableRow($payload) => $body,
            Node::TableCell($payload) => $body,
            Node::ThematicBreak($payload) => $body,
            Node::HtmlBlock($payload) => $body,
            Node::MathBlock($payload) => $body,
            Node::FootnoteDefinition($payload) => $body,
            Node::DefinitionList($payload) => $body,
            Node::DefinitionTerm($payload) => $body,
            Node::DefinitionDescription($payload) => $body,
            Node::Text($payload) => $body,
            Node::Strong($payload) => $body,
            Node::Emphasis($payload) => $body,
            Node::Strikethrough($payload) => $body,
            Node::Link($payload) => $body,
            Node::Image($payload) => $body,
            Node::Code($payload) => $body,
            Node::LineBreak($payload) => $body,
            Node::HtmlInline($payload) => $body,
            Node::MathInline($payload) => $body,
            Node::FootnoteReference($payload) => $body,
            Node::Extension($payload) => $body,
        }
    };
}

impl Node {
    pub fn kind(&self) -> NodeKind {
        match self {
            Node::Heading(_) => NodeKind::Heading,
            Node::Paragraph(_) => NodeKind::Paragraph,
            Node::CodeBlock(_) => NodeKind::CodeBlock,
            Node::BlockQuote(_) => NodeKind::BlockQuote,
            Node::List(_) => NodeKind::List,
            Node::ListItem(_) => NodeKind::ListItem,
            Node::Table(_) => NodeKind::Table,
            Node::TableRow(_) => NodeKind::TableRow,
            Node::TableCell(_) => NodeKind::TableCell,
            Node::ThematicBreak(_) => NodeKind::ThematicBreak,
            Node::HtmlBlock(_) => NodeKind::HtmlBlock,
            Node::MathBlock(_) => NodeKind::MathBlock,
            Node::FootnoteDefinition(_) => NodeKind::FootnoteDefinition,
            Node::DefinitionList(_) => NodeKind::DefinitionList,
            Node::DefinitionTerm(_) => NodeKind::DefinitionTerm,
            Node::DefinitionDescription(_) => NodeKind::DefinitionDescription,
            Node::Text(_) => NodeKind::Text,
            Node::Strong(_) => NodeKind::Strong,
            Node::Emphasis(_) => NodeKind::Emphasis,
            Node::Strikethrough(_) => NodeKind::Strikethrough,
            Node::Link(_) => NodeKind::Link,
            Node::Image(_) => NodeKind::Image,
            Node::Code(_) => NodeKind::Code,
            Node::LineBreak(_) => NodeKind::LineBreak,
            Node::HtmlInline(_) => NodeKind::HtmlInline,
            Node::MathInline(_) => NodeKind::MathInline,
            Node::FootnoteReference(_) => NodeKind::FootnoteReference,
            Node::Extension(_) => NodeKind::Extension,
        }
    }

    pub fn category(&self) -> NodeCategory {
        match self {
            Node::Extension(ext) => ext.category,
            other => other
                .kind()
                .category()
                .unwrap_or(NodeCategory::Block),
        }
    }

    pub fn is_block(&self) -> bool {
        self.category() == NodeCategory::Block
    }

    pub fn is_inline(&self) -> bool {
        self.category() == NodeCategory::Inline
    }

    pub fn metadata(&self) -> &Metadata {
        with_payload!(self, payload => &payload.metadata)
    }

    pub fn metadata_mut(&mut self) -> &mut Metadata {
        with_payload!(self, payload => &mut payload.metadata)
    }

    pub fn source(&self) -> Option<SourceLocation> {
        with_payload!(self, payload => payload.source)
    }

    /// Return the node with one metadata entry added or replaced
    pub fn with_metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata_mut().insert(key.into(), value);
        self
    }

    pub fn with_source(mut self, location: SourceLocation) -> Self {
        with_payload!(&mut self, payload => payload.source = Some(location));
        self
    }

    pub fn children(&self) -> &[Node] {
        match self {
            Node::Heading(n) => &n.children,
            Node::Paragraph(n) => &n.children,
            Node::BlockQuote(n) => &n.children,
            Node::List(n) => &n.children,
            Node::ListItem(n) => &n.children,
            Node::Table(n) => &n.children,
            Node::TableRow(n) => &n.children,
            Node::TableCell(n) => &n.children,
            Node::FootnoteDefinition(n) => &n.children,
            Node::DefinitionList(n) => &n.children,
            Node::DefinitionTerm(n) => &n.children,
            Node::DefinitionDescription(n) => &n.children,
            Node::Strong(n) => &n.children,
            Node::Emphasis(n) => &n.children,
            Node::Strikethrough(n) => &n.children,
            Node::Link(n) => &n.children,
            _ => &[],
        }
    }

    /// Mutable access to the child slot; `None` for leaf kinds
    pub fn children_mut(&mut self) -> Option<&mut Vec<Node>> {
        match self {
            Node::Heading(n) => Some(&mut n.children),
            Node::Paragraph(n) => Some(&mut n.children),
            Node::BlockQuote(n) => Some(&mut n.children),
            Node::List(n) => Some(&mut n.children),
            Node::ListItem(n) => Some(&mut n.children),
            Node::Table(n) => Some(&mut n.children),
            Node::TableRow(n) => Some(&mut n.children),
            Node::TableCell(n) => Some(&mut n.children),
            Node::FootnoteDefinition(n) => Some(&mut n.children),
            Node::DefinitionList(n) => Some(&mut n.children),
            Node::DefinitionTerm(n) => Some(&mut n.children),
            Node::DefinitionDescription(n) => Some(&mut n.children),
            Node::Strong(n) => Some(&mut n.children),
            Node::Emphasis(n) => Some(&mut n.children),
            Node::Strikethrough(n) => Some(&mut n.children),
            Node::Link(n) => Some(&mut n.children),
            _ => None,
        }
    }

    /// Concatenated plain text of this subtree
    ///
    /// Line breaks become a single space; images contribute their alt text.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        collect_text(self, &mut out);
        out
    }

    // Convenience constructors used by parsers and tests.

    pub fn text(content: impl Into<String>) -> Node {
        Node::Text(Text::new(content))
    }

    pub fn heading(level: u8, children: Vec<Node>) -> Node {
        Node::Heading(Heading::new(level, children))
    }

    pub fn paragraph(children: Vec<Node>) -> Node {
        Node::Paragraph(Paragraph::new(children))
    }

    pub fn image(url: impl Into<String>, alt: Option<&str>) -> Node {
        Node::Image(Image::new(url, alt.map(str::to_string)))
    }

    pub fn link(url: impl Into<String>, children: Vec<Node>) -> Node {
        Node::Link(Link::new(url, children))
    }

    pub fn code_block(language: Option<&str>, content: impl Into<String>) -> Node {
        Node::CodeBlock(CodeBlock::new(language.map(str::to_string), content))
    }

    pub fn list(ordered: bool, items: Vec<Node>) -> Node {
        Node::List(List::new(ordered, items))
    }

    pub fn list_item(children: Vec<Node>) -> Node {
        Node::ListItem(ListItem::new(children))
    }

    pub fn strong(children: Vec<Node>) -> Node {
        Node::Strong(Strong {
            children,
            ..Default::default()
        })
    }

    pub fn emphasis(children: Vec<Node>) -> Node {
        Node::Emphasis(Emphasis {
            children,
            ..Default::default()
        })
    }

    pub fn code(content: impl Into<String>) -> Node {
        Node::Code(Code {
            content: content.into(),
            ..Default::default()
        })
    }

    pub fn thematic_break() -> Node {
        Node::ThematicBreak(ThematicBreak::default())
    }
}

fn collect_text(node: &Node, out: &mut String) {
    match node {
        Node::Text(t) => out.push_str(&t.content),
        Node::Code(c) => out.push_str(&c.content),
        Node::MathInline(m) => out.push_str(&m.content),
        Node::LineBreak(_) => out.push(' '),
        Node::Image(img) => {
            if let Some(alt) = &img.alt {
                out.push_str(alt);
            }
        }
        other => {
            for child in other.children() {
                collect_text(child, out);
            }
        }
    }
}
