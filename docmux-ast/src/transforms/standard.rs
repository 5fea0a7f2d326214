//! Built-in transforms
//!
//! Common rewrites available to every pipeline. Each is a plain value
//! implementing [`Transform`]; [`by_name`] builds one with default settings
//! for configuration-driven pipelines.
//!
//! All of them are idempotent except [`HeadingOffset`], [`RewriteLinks`] and
//! [`ReplaceText`], which apply their shift or substitution on every run.

use super::slug::{slugify, SlugSet};
use super::Transform;
use crate::ast::{
    rewrite_document, walk, Document, Heading, Link, List, ListItem, Node, NodeKind, NodeTrace,
    Paragraph, Rewrite, RewriteError, Traversal,
};
use once_cell::sync::Lazy;
use regex::Regex;

/// Metadata key marking nodes generated by [`AddTableOfContents`]
pub const TOC_MARKER: &str = "docmux:toc";

/// Names accepted by [`by_name`]
pub const BUILTIN_NAMES: &[&str] = &[
    "remove-images",
    "heading-offset",
    "add-heading-ids",
    "table-of-contents",
    "remove-boilerplate",
];

/// Paragraphs commonly left behind by web page extraction
pub static DEFAULT_BOILERPLATE: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?i)advertisement",
        r"(?i)share (this|on) .*",
        r"(?i)(accept|manage) (all )?cookies.*",
        r"(?i)subscribe to (our|the) newsletter.*",
        r"(?i)skip to (main )?content",
    ]
    .iter()
    .filter_map(|p| anchored(p).ok())
    .collect()
});

fn anchored(pattern: &str) -> Result<Regex, regex::Error> {
    Regex::new(&format!("^(?:{})$", pattern))
}

/// Build a built-in transform with its default settings
pub fn by_name(name: &str) -> Option<Box<dyn Transform>> {
    let transform: Box<dyn Transform> = match name {
        "remove-images" => Box::new(RemoveImages),
        "heading-offset" => Box::new(HeadingOffset::new(1)),
        "add-heading-ids" => Box::new(AddHeadingIds::default()),
        "table-of-contents" => Box::new(AddTableOfContents::default()),
        "remove-boilerplate" => Box::new(RemoveBoilerplate::default()),
        _ => return None,
    };
    Some(transform)
}

fn keep(node: Node) -> Result<Rewrite, RewriteError> {
    Ok(Rewrite::Replace(node))
}

/// Drops every image, and paragraphs that held nothing but images
#[derive(Debug, Clone, Copy, Default)]
pub struct RemoveImages;

impl Transform for RemoveImages {
    fn name(&self) -> &str {
        "remove-images"
    }

    fn apply(&self, doc: Document) -> Result<Document, RewriteError> {
        let mut rewriter = |node: Node, _: &NodeTrace| {
            let remove = match &node {
                Node::Image(_) => true,
                Node::Paragraph(p) => {
                    !p.children.is_empty()
                        && p.children.iter().all(|c| matches!(c, Node::Image(_)))
                }
                _ => false,
            };
            if remove {
                Ok(Rewrite::Remove)
            } else {
                keep(node)
            }
        };
        rewrite_document(doc, Traversal::TopDown, &mut rewriter)
    }
}

/// Drops every node of the given kinds, with its subtree
#[derive(Debug, Clone, Default)]
pub struct RemoveNodes {
    pub kinds: Vec<NodeKind>,
}

impl RemoveNodes {
    pub fn new(kinds: impl IntoIterator<Item = NodeKind>) -> Self {
        Self {
            kinds: kinds.into_iter().collect(),
        }
    }
}

impl Transform for RemoveNodes {
    fn name(&self) -> &str {
        "remove-nodes"
    }

    fn apply(&self, doc: Document) -> Result<Document, RewriteError> {
        let mut rewriter = |node: Node, _: &NodeTrace| {
            if self.kinds.contains(&node.kind()) {
                Ok(Rewrite::Remove)
            } else {
                keep(node)
            }
        };
        rewrite_document(doc, Traversal::TopDown, &mut rewriter)
    }
}

/// Shifts heading levels, clamped to 1..=6
#[derive(Debug, Clone, Copy, Default)]
pub struct HeadingOffset(pub i8);

impl HeadingOffset {
    pub fn new(offset: i8) -> Self {
        HeadingOffset(offset)
    }
}

impl Transform for HeadingOffset {
    fn name(&self) -> &str {
        "heading-offset"
    }

    fn apply(&self, doc: Document) -> Result<Document, RewriteError> {
        if self.0 == 0 {
            return Ok(doc);
        }
        let mut rewriter = |node: Node, _: &NodeTrace| match node {
            Node::Heading(mut h) => {
                h.level = (i16::from(h.level) + i16::from(self.0)).clamp(1, 6) as u8;
                Ok(Rewrite::Replace(Node::Heading(h)))
            }
            other => keep(other),
        };
        rewrite_document(doc, Traversal::BottomUp, &mut rewriter)
    }
}

/// Gives every heading without an id a slug of its text
///
/// Existing ids are kept and reserved, so running this twice yields the
/// same ids. Repeated slugs get a numeric suffix.
#[derive(Debug, Clone)]
pub struct AddHeadingIds {
    pub prefix: String,
    pub separator: String,
}

impl Default for AddHeadingIds {
    fn default() -> Self {
        Self {
            prefix: String::new(),
            separator: "-".to_string(),
        }
    }
}

impl AddHeadingIds {
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            ..Self::default()
        }
    }

    fn existing_ids(&self, doc: &Document) -> SlugSet {
        let mut set = SlugSet::new(self.separator.clone());
        walk(&doc.children, &mut |node, _| {
            if let Node::Heading(Heading { id: Some(id), .. }) = node {
                set.reserve(id);
            }
        });
        set
    }
}

impl Transform for AddHeadingIds {
    fn name(&self) -> &str {
        "add-heading-ids"
    }

    fn apply(&self, doc: Document) -> Result<Document, RewriteError> {
        let mut ids = self.existing_ids(&doc);
        let mut rewriter = |node: Node, _: &NodeTrace| match node {
            Node::Heading(mut h) if h.id.is_none() => {
                let text = Node::Heading(h.clone()).text_content();
                let base = format!("{}{}", self.prefix, slugify(&text, &self.separator));
                h.id = Some(ids.claim(&base));
                Ok(Rewrite::Replace(Node::Heading(h)))
            }
            other => keep(other),
        };
        rewrite_document(doc, Traversal::TopDown, &mut rewriter)
    }
}

/// Regex substitution on link targets
#[derive(Debug, Clone)]
pub struct RewriteLinks {
    pub pattern: Regex,
    pub replacement: String,
}

impl RewriteLinks {
    pub fn new(pattern: &str, replacement: impl Into<String>) -> Result<Self, regex::Error> {
        Ok(Self {
            pattern: Regex::new(pattern)?,
            replacement: replacement.into(),
        })
    }
}

impl Transform for RewriteLinks {
    fn name(&self) -> &str {
        "rewrite-links"
    }

    fn apply(&self, doc: Document) -> Result<Document, RewriteError> {
        let mut rewriter = |node: Node, _: &NodeTrace| match node {
            Node::Link(mut link) => {
                link.url = self
                    .pattern
                    .replace_all(&link.url, self.replacement.as_str())
                    .into_owned();
                Ok(Rewrite::Replace(Node::Link(link)))
            }
            other => keep(other),
        };
        rewrite_document(doc, Traversal::BottomUp, &mut rewriter)
    }
}

/// Literal substitution inside text nodes
#[derive(Debug, Clone)]
pub struct ReplaceText {
    pub find: String,
    pub replace: String,
}

impl ReplaceText {
    pub fn new(find: impl Into<String>, replace: impl Into<String>) -> Self {
        Self {
            find: find.into(),
            replace: replace.into(),
        }
    }
}

impl Transform for ReplaceText {
    fn name(&self) -> &str {
        "replace-text"
    }

    fn apply(&self, doc: Document) -> Result<Document, RewriteError> {
        if self.find.is_empty() {
            return Err(RewriteError::new("replace-text needs a non-empty search string"));
        }
        let mut rewriter = |node: Node, _: &NodeTrace| match node {
            Node::Text(mut t) if t.content.contains(&self.find) => {
                t.content = t.content.replace(&self.find, &self.replace);
                Ok(Rewrite::Replace(Node::Text(t)))
            }
            other => keep(other),
        };
        rewrite_document(doc, Traversal::BottomUp, &mut rewriter)
    }
}

/// Inserts a nested list of links to headings at the top of the document
///
/// Headings without ids get them first. Generated nodes carry
/// [`TOC_MARKER`] in their metadata; a document that already has one is
/// returned unchanged.
#[derive(Debug, Clone)]
pub struct AddTableOfContents {
    pub max_level: u8,
    pub title: Option<String>,
}

impl Default for AddTableOfContents {
    fn default() -> Self {
        Self {
            max_level: 3,
            title: Some("Contents".to_string()),
        }
    }
}

struct TocEntry {
    level: u8,
    id: String,
    text: String,
}

impl AddTableOfContents {
    fn has_toc(doc: &Document) -> bool {
        doc.children
            .iter()
            .any(|n| n.metadata().contains_key(TOC_MARKER))
    }

    fn entries(&self, doc: &Document) -> Vec<TocEntry> {
        let mut entries = Vec::new();
        walk(&doc.children, &mut |node, _| {
            if let Node::Heading(h) = node {
                match &h.id {
                    Some(id) if h.level <= self.max_level => entries.push(TocEntry {
                        level: h.level,
                        id: id.clone(),
                        text: node.text_content(),
                    }),
                    _ => {}
                }
            }
        });
        entries
    }

    /// Items for `entries`, nesting each run of deeper headings under the
    /// entry before it
    fn items(entries: &[TocEntry]) -> Vec<Node> {
        let mut items = Vec::new();
        let mut i = 0;
        while i < entries.len() {
            let entry = &entries[i];
            let mut end = i + 1;
            while end < entries.len() && entries[end].level > entry.level {
                end += 1;
            }
            let link = Node::Link(Link::new(
                format!("#{}", entry.id),
                vec![Node::text(entry.text.clone())],
            ));
            let mut children = vec![Node::Paragraph(Paragraph::new(vec![link]))];
            let nested = Self::items(&entries[i + 1..end]);
            if !nested.is_empty() {
                children.push(Node::List(List::new(false, nested)));
            }
            items.push(Node::ListItem(ListItem::new(children)));
            i = end;
        }
        items
    }
}

impl Transform for AddTableOfContents {
    fn name(&self) -> &str {
        "table-of-contents"
    }

    fn apply(&self, doc: Document) -> Result<Document, RewriteError> {
        if Self::has_toc(&doc) {
            return Ok(doc);
        }
        let mut doc = AddHeadingIds::default().apply(doc)?;
        let entries = self.entries(&doc);
        if entries.is_empty() {
            return Ok(doc);
        }

        let mut toc = Vec::new();
        if let Some(title) = &self.title {
            toc.push(
                Node::paragraph(vec![Node::strong(vec![Node::text(title.clone())])])
                    .with_metadata(TOC_MARKER, serde_json::Value::Bool(true)),
            );
        }
        toc.push(
            Node::List(List::new(false, Self::items(&entries)))
                .with_metadata(TOC_MARKER, serde_json::Value::Bool(true)),
        );
        doc.children.splice(0..0, toc);
        Ok(doc)
    }
}

/// Drops paragraphs whose whole text matches one of the patterns
///
/// Patterns are anchored at both ends when compiled.
#[derive(Debug, Clone)]
pub struct RemoveBoilerplate {
    pub patterns: Vec<Regex>,
}

impl Default for RemoveBoilerplate {
    fn default() -> Self {
        Self {
            patterns: DEFAULT_BOILERPLATE.clone(),
        }
    }
}

impl RemoveBoilerplate {
    pub fn new<I, S>(patterns: I) -> Result<Self, regex::Error>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let patterns = patterns
            .into_iter()
            .map(|p| anchored(p.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { patterns })
    }

    fn is_boilerplate(&self, text: &str) -> bool {
        let text = text.trim();
        !text.is_empty() && self.patterns.iter().any(|re| re.is_match(text))
    }
}

impl Transform for RemoveBoilerplate {
    fn name(&self) -> &str {
        "remove-boilerplate"
    }

    fn apply(&self, doc: Document) -> Result<Document, RewriteError> {
        let mut rewriter = |node: Node, _: &NodeTrace| {
            if matches!(node, Node::Paragraph(_)) && self.is_boilerplate(&node.text_content()) {
                Ok(Rewrite::Remove)
            } else {
                keep(node)
            }
        };
        rewrite_document(doc, Traversal::TopDown, &mut rewriter)
    }
}
