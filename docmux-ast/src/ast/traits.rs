//! Visiting the tree
//!
//! [`Visitor`] is double dispatch over [`Node`]: `node.accept(&mut v)` calls the
//! `visit_*` method for the node's variant. Every per-variant method defaults to
//! [`Visitor::visit_default`], which is the one method implementors must write.
//! A visitor written before a variant existed keeps compiling and routes the new
//! variant to its default handler.
//!
//! Visitors do not recurse on their own; call [`visit_children`] from a handler
//! when the subtree matters, or use [`walk`] for a plain pre-order traversal.
//!
//! # Example
//!
//! ```ignore
//! struct HeadingCounter(usize);
//!
//! impl Visitor for HeadingCounter {
//!     type Output = ();
//!     fn visit_default(&mut self, node: &Node) {
//!         visit_children(self, node.children());
//!     }
//!     fn visit_heading(&mut self, _heading: &Heading, _node: &Node) {
//!         self.0 += 1;
//!     }
//! }
//! ```

use super::elements::*;

pub trait Visitor {
    type Output;

    /// Fallback for every variant without a dedicated override
    fn visit_default(&mut self, node: &Node) -> Self::Output;

    fn visit_heading(&mut self, _heading: &Heading, node: &Node) -> Self::Output {
        self.visit_default(node)
    }
    fn visit_paragraph(&mut self, _paragraph: &Paragraph, node: &Node) -> Self::Output {
        self.visit_default(node)
    }
    fn visit_code_block(&mut self, _code_block: &CodeBlock, node: &Node) -> Self::Output {
        self.visit_default(node)
    }
    fn visit_block_quote(&mut self, _block_quote: &BlockQuote, node: &Node) -> Self::Output {
        self.visit_default(node)
    }
    fn visit_list(&mut self, _list: &List, node: &Node) -> Self::Output {
        self.visit_default(node)
    }
    fn visit_list_item(&mut self, _item: &ListItem, node: &Node) -> Self::Output {
        self.visit_default(node)
    }
    fn visit_table(&mut self, _table: &Table, node: &Node) -> Self::Output {
        self.visit_default(node)
    }
    fn visit_table_row(&mut self, _row: &TableRow, node: &Node) -> Self::Output {
        self.visit_default(node)
    }
    fn visit_table_cell(&mut self, _cell: &TableCell, node: &Node) -> Self::Output {
        self.visit_default(node)
    }
    fn visit_thematic_break(&mut self, _brk: &ThematicBreak, node: &Node) -> Self::Output {
        self.visit_default(node)
    }
    fn visit_html_block(&mut self, _html: &HtmlBlock, node: &Node) -> Self::Output {
        self.visit_default(node)
    }
    fn visit_math_block(&mut self, _math: &MathBlock, node: &Node) -> Self::Output {
        self.visit_default(node)
    }
    fn visit_footnote_definition(
        &mut self,
        _definition: &FootnoteDefinition,
        node: &Node,
    ) -> Self::Output {
        self.visit_default(node)
    }
    fn visit_definition_list(&mut self, _list: &DefinitionList, node: &Node) -> Self::Output {
        self.visit_default(node)
    }
    fn visit_definition_term(&mut self, _term: &DefinitionTerm, node: &Node) -> Self::Output {
        self.visit_default(node)
    }
    fn visit_definition_description(
        &mut self,
        _description: &DefinitionDescription,
        node: &Node,
    ) -> Self::Output {
        self.visit_default(node)
    }
    fn visit_text(&mut self, _text: &Text, node: &Node) -> Self::Output {
        self.visit_default(node)
    }
    fn visit_strong(&mut self, _strong: &Strong, node: &Node) -> Self::Output {
        self.visit_default(node)
    }
    fn visit_emphasis(&mut self, _emphasis: &Emphasis, node: &Node) -> Self::Output {
        self.visit_default(node)
    }
    fn visit_strikethrough(&mut self, _strike: &Strikethrough, node: &Node) -> Self::Output {
        self.visit_default(node)
    }
    fn visit_link(&mut self, _link: &Link, node: &Node) -> Self::Output {
        self.visit_default(node)
    }
    fn visit_image(&mut self, _image: &Image, node: &Node) -> Self::Output {
        self.visit_default(node)
    }
    fn visit_code(&mut self, _code: &Code, node: &Node) -> Self::Output {
        self.visit_default(node)
    }
    fn visit_line_break(&mut self, _brk: &LineBreak, node: &Node) -> Self::Output {
        self.visit_default(node)
    }
    fn visit_html_inline(&mut self, _html: &HtmlInline, node: &Node) -> Self::Output {
        self.visit_default(node)
    }
    fn visit_math_inline(&mut self, _math: &MathInline, node: &Node) -> Self::Output {
        self.visit_default(node)
    }
    fn visit_footnote_reference(
        &mut self,
        _reference: &FootnoteReference,
        node: &Node,
    ) -> Self::Output {
        self.visit_default(node)
    }
    fn visit_extension(&mut self, _extension: &ExtensionNode, node: &Node) -> Self::Output {
        self.visit_default(node)
    }
}

impl Node {
    /// Dispatch to the visitor method for this variant
    pub fn accept<V: Visitor + ?Sized>(&self, visitor: &mut V) -> V::Output {
        match self {
            Node::Heading(n) => visitor.visit_heading(n, self),
            Node::Paragraph(n) => visitor.visit_paragraph(n, self),
            Node::CodeBlock(n) => visitor.visit_code_block(n, self),
            Node::BlockQuote(n) => visitor.visit_block_quote(n, self),
            Node::List(n) => visitor.visit_list(n, self),
            Node::ListItem(n) => visitor.visit_list_item(n, self),
            Node::Table(n) => visitor.visit_table(n, self),
            Node::TableRow(n) => visitor.visit_table_row(n, self),
            Node::TableCell(n) => visitor.visit_table_cell(n, self),
            Node::ThematicBreak(n) => visitor.visit_thematic_break(n, self),
            Node::HtmlBlock(n) => visitor.visit_html_block(n, self),
            Node::MathBlock(n) => visitor.visit_math_block(n, self),
            Node::FootnoteDefinition(n) => visitor.visit_footnote_definition(n, self),
            Node::DefinitionList(n) => visitor.visit_definition_list(n, self),
            Node::DefinitionTerm(n) => visitor.visit_definition_term(n, self),
            Node::DefinitionDescription(n) => visitor.visit_definition_description(n, self),
            Node::Text(n) => visitor.visit_text(n, self),
            Node::Strong(n) => visitor.visit_strong(n, self),
            Node::Emphasis(n) => visitor.visit_emphasis(n, self),
            Node::Strikethrough(n) => visitor.visit_strikethrough(n, self),
            Node::Link(n) => visitor.visit_link(n, self),
            Node::Image(n) => visitor.visit_image(n, self),
            Node::Code(n) => visitor.visit_code(n, self),
            Node::LineBreak(n) => visitor.visit_line_break(n, self),
            Node::HtmlInline(n) => visitor.visit_html_inline(n, self),
            Node::MathInline(n) => visitor.visit_math_inline(n, self),
            Node::FootnoteReference(n) => visitor.visit_footnote_reference(n, self),
            Node::Extension(n) => visitor.visit_extension(n, self),
        }
    }
}

/// Visit every node in `nodes`, collecting the outputs in order
pub fn visit_children<V: Visitor + ?Sized>(visitor: &mut V, nodes: &[Node]) -> Vec<V::Output> {
    nodes.iter().map(|node| node.accept(visitor)).collect()
}

/// Pre-order traversal; the callback receives each node and its depth (0 for roots)
pub fn walk<F>(nodes: &[Node], f: &mut F)
where
    F: FnMut(&Node, usize),
{
    fn walk_at<F: FnMut(&Node, usize)>(nodes: &[Node], depth: usize, f: &mut F) {
        for node in nodes {
            f(node, depth);
            walk_at(node.children(), depth + 1, f);
        }
    }
    walk_at(nodes, 0, f);
}
