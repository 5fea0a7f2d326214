//! Pipeline behaviour as seen from outside the crate

use docmux_ast::ast::{Heading, NodeKind, NodeTrace, Rewrite, RewriteError, Traversal};
use docmux_ast::transforms::hooks::ElementHooks;
use docmux_ast::transforms::standard::{AddHeadingIds, HeadingOffset, RemoveImages};
use docmux_ast::transforms::{from_fn, Pipeline, Transform};
use docmux_ast::{Document, Node};
use rstest::rstest;

fn sample() -> Document {
    Document::new(vec![
        Node::heading(1, vec![Node::text("Intro")]),
        Node::paragraph(vec![Node::text("before "), Node::image("a.png", Some("a"))]),
        Node::heading(2, vec![Node::text("Details")]),
    ])
}

/// Raises on the first image it meets
fn reject_images() -> impl Transform {
    from_fn("reject-images", |doc: Document| {
        let mut rewriter = |node: Node, _: &NodeTrace| -> Result<Rewrite, RewriteError> {
            if node.kind() == NodeKind::Image {
                Err(RewriteError::new("image found"))
            } else {
                Ok(Rewrite::Replace(node))
            }
        };
        docmux_ast::ast::rewrite_document(doc, Traversal::BottomUp, &mut rewriter)
    })
}

#[test]
fn test_failed_run_leaves_input_untouched() {
    let doc = sample();
    let snapshot = doc.clone();
    let pipeline = Pipeline::new()
        .then(AddHeadingIds::default())
        .then(reject_images())
        .then(HeadingOffset::new(1));

    let err = pipeline.run(&doc).unwrap_err();

    assert_eq!(doc, snapshot);
    assert_eq!(err.step, "reject-images");
    assert_eq!(err.position, 1);
    let node = err.node.expect("failing node");
    assert_eq!(node.kind, NodeKind::Image);
    assert_eq!(node.path, vec![1, 1]);
}

#[test]
fn test_heading_ids_twice_in_one_pipeline() {
    let pipeline = Pipeline::new()
        .then(AddHeadingIds::default())
        .then(AddHeadingIds::default());
    let out = pipeline.run(&sample()).unwrap();
    let ids: Vec<_> = out
        .children
        .iter()
        .filter_map(|n| match n {
            Node::Heading(Heading { id, .. }) => id.clone(),
            _ => None,
        })
        .collect();
    assert_eq!(ids, vec!["intro".to_string(), "details".to_string()]);
}

#[rstest]
#[case(1, 2)]
#[case(5, 6)]
#[case(-1, 1)]
#[case(0, 1)]
fn test_heading_offset_levels(#[case] offset: i8, #[case] expected: u8) {
    let doc = Document::new(vec![Node::heading(1, vec![Node::text("T")])]);
    let out = HeadingOffset::new(offset).apply(doc).unwrap();
    assert_eq!(out.children, vec![Node::heading(expected, vec![Node::text("T")])]);
}

#[test]
fn test_hooks_and_transforms_mix() {
    let strip_code = ElementHooks::new("strip-code").on(NodeKind::CodeBlock, |_| Ok(Rewrite::Remove));
    let doc = Document::new(vec![
        Node::code_block(Some("rust"), "fn main() {}"),
        Node::paragraph(vec![Node::image("x.png", None)]),
        Node::heading(1, vec![Node::text("Kept")]),
    ]);
    let out = Pipeline::new()
        .then(strip_code)
        .then(RemoveImages)
        .run(&doc)
        .unwrap();
    assert_eq!(out, Document::new(vec![Node::heading(1, vec![Node::text("Kept")])]));
}
