//! Property-based tests for the interchange format
//!
//! Any tree a parser can legally produce must come back structurally equal
//! after serialization:
//! - block slots hold only block nodes, inline slots only inline nodes
//! - metadata keys follow the key grammar
//! - metadata values are JSON scalars (strings, integers, booleans)

use docmux_ast::ast::{
    from_json, to_json, to_json_pretty, validate, Alignment, BlockQuote, CodeBlock,
    DocumentMetadata, Heading, Image, Link, List, ListItem, MathBlock, Paragraph, Table,
    TableCell, TableRow,
};
use docmux_ast::{Document, Node};
use proptest::prelude::*;
use serde_json::Value;

/// Generate plain text without control characters
fn text_strategy() -> impl Strategy<Value = String> {
    prop_oneof!["[a-zA-Z0-9 ]{0,20}", "[a-zA-Z0-9 .,;:!?'\"<>&*_`-]{1,20}", "\\PC{0,10}",]
}

fn metadata_value_strategy() -> impl Strategy<Value = Value> {
    prop_oneof![
        "[a-z]{0,8}".prop_map(Value::from),
        any::<i64>().prop_map(Value::from),
        any::<bool>().prop_map(Value::from),
    ]
}

/// Generate metadata maps with valid keys
fn metadata_strategy() -> impl Strategy<Value = Vec<(String, Value)>> {
    prop::collection::vec(("[a-z_][a-z0-9_.:-]{0,8}", metadata_value_strategy()), 0..3)
}

/// Generate inline content, nesting up to a few levels
fn inline_strategy() -> impl Strategy<Value = Node> {
    let leaf = prop_oneof![
        text_strategy().prop_map(Node::text),
        text_strategy().prop_map(Node::code),
        ("[a-z]{1,8}", proptest::option::of(text_strategy())).prop_map(|(url, alt)| {
            Node::Image(Image::new(format!("https://example.com/{}.png", url), alt))
        }),
    ];
    leaf.prop_recursive(3, 16, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(Node::strong),
            prop::collection::vec(inner.clone(), 0..4).prop_map(Node::emphasis),
            ("[a-z]{1,8}", prop::collection::vec(inner, 0..3)).prop_map(|(path, children)| {
                Node::Link(Link::new(format!("https://example.com/{}", path), children))
            }),
        ]
    })
}

fn inlines() -> impl Strategy<Value = Vec<Node>> {
    prop::collection::vec(inline_strategy(), 0..4)
}

fn table_strategy() -> impl Strategy<Value = Node> {
    prop::collection::vec(prop::collection::vec(inlines(), 1..3), 1..3).prop_map(|rows| {
        let rows = rows
            .into_iter()
            .enumerate()
            .map(|(i, cells)| {
                let cells = cells
                    .into_iter()
                    .map(|c| Node::TableCell(TableCell::new(c).aligned(Alignment::Center)))
                    .collect();
                if i == 0 {
                    Node::TableRow(TableRow::header(cells))
                } else {
                    Node::TableRow(TableRow::new(cells))
                }
            })
            .collect();
        Node::Table(Table::new(rows))
    })
}

/// Generate block content, nesting quotes and lists
fn block_strategy() -> impl Strategy<Value = Node> {
    let leaf = prop_oneof![
        (1u8..=6, inlines(), proptest::option::of("[a-z-]{1,8}")).prop_map(
            |(level, children, id)| {
                let mut heading = Heading::new(level, children);
                heading.id = id;
                Node::Heading(heading)
            }
        ),
        (inlines(), metadata_strategy()).prop_map(|(children, meta)| {
            let mut paragraph = Paragraph::new(children);
            paragraph.metadata.extend(meta);
            Node::Paragraph(paragraph)
        }),
        (proptest::option::of("[a-z]{1,6}"), text_strategy())
            .prop_map(|(lang, content)| Node::CodeBlock(CodeBlock::new(lang, content))),
        text_strategy().prop_map(|c| Node::MathBlock(MathBlock::new(c))),
        Just(Node::thematic_break()),
        table_strategy(),
    ];
    leaf.prop_recursive(3, 24, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..3)
                .prop_map(|c| Node::BlockQuote(BlockQuote::new(c))),
            (
                any::<bool>(),
                prop::collection::vec(
                    (proptest::option::of(any::<bool>()), prop::collection::vec(inner, 0..3)),
                    0..3
                )
            )
                .prop_map(|(ordered, items)| {
                    let items = items
                        .into_iter()
                        .map(|(checked, children)| {
                            let mut item = ListItem::new(children);
                            item.checked = checked;
                            Node::ListItem(item)
                        })
                        .collect();
                    Node::List(List::new(ordered, items))
                }),
        ]
    })
}

fn document_strategy() -> impl Strategy<Value = Document> {
    (
        prop::collection::vec(block_strategy(), 0..6),
        proptest::option::of(text_strategy()),
        prop::collection::vec("[a-z]{1,6}", 0..3),
    )
        .prop_map(|(children, title, keywords)| {
            let mut metadata = DocumentMetadata::new();
            metadata.title = title;
            metadata.keywords = keywords;
            Document::new(children).with_metadata(metadata)
        })
}

#[cfg(test)]
mod proptest_tests {
    use super::*;

    proptest! {
        #[test]
        fn test_generated_documents_are_well_formed(doc in document_strategy()) {
            let violations = validate(&doc);
            prop_assert!(violations.is_empty(), "violations: {:?}", violations);
        }

        #[test]
        fn test_json_round_trip(doc in document_strategy()) {
            let json = to_json(&doc).unwrap();
            let back = from_json(&json).unwrap();
            prop_assert_eq!(back, doc);
        }

        #[test]
        fn test_pretty_and_compact_agree(doc in document_strategy()) {
            let compact = from_json(&to_json(&doc).unwrap()).unwrap();
            let pretty = from_json(&to_json_pretty(&doc).unwrap()).unwrap();
            prop_assert_eq!(compact, pretty);
        }
    }
}
