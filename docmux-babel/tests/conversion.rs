use docmux_ast::{Document, Node};
use docmux_babel::{
    apply_transforms, extract_metadata_or_empty, ConversionError, ConverterMetadata,
    ConverterRegistry, FormatPlugin, InputSource, Parser, ParsingError,
};
use docmux_config::{DetectionOptions, DocmuxOptions};
use std::fs;

struct AsciidocPlugin;

struct AsciidocParser;

impl Parser for AsciidocParser {
    fn parse(
        &self,
        input: &InputSource,
        _options: &DocmuxOptions,
    ) -> Result<Document, ParsingError> {
        let text = input.text()?;
        let title = text
            .lines()
            .next()
            .and_then(|line| line.strip_prefix("= "))
            .ok_or_else(|| ParsingError::malformed("asciidoc", "missing document title"))?;
        Ok(Document::new(vec![Node::heading(1, vec![Node::text(title)])]))
    }
}

impl FormatPlugin for AsciidocPlugin {
    fn name(&self) -> &str {
        "asciidoc"
    }

    fn records(&self) -> Vec<ConverterMetadata> {
        vec![ConverterMetadata::parser("asciidoc", AsciidocParser)
            .extensions(&["adoc"])
            .requires("asciidoctor")]
    }

    fn provides(&self) -> Vec<String> {
        vec!["asciidoctor".to_string()]
    }
}

fn convert(registry: &ConverterRegistry, input: &InputSource, target: &str) -> String {
    let options = DocmuxOptions::default();
    let found = registry.detect(input, None, &options.detection).unwrap();
    let doc = registry
        .parser_for(&found.format)
        .unwrap()
        .parse(input, &options)
        .unwrap();
    let doc = apply_transforms(&doc, &options).unwrap();
    registry
        .renderer_for(target)
        .unwrap()
        .render_to_string(&doc, &options)
        .unwrap()
}

#[test]
fn plaintext_to_markdown() {
    let input = InputSource::from_bytes(*b"Prices rose *again*.\nSee [1].\n\n# not a heading\n")
        .with_path("notes.txt");
    let out = convert(&ConverterRegistry::with_defaults(), &input, "markdown");
    insta::assert_snapshot!(out.trim_end(), @r"
    Prices rose \*again\*.
    See \[1\].

    \# not a heading
    ");
}

#[test]
fn plaintext_through_ast_json_and_back() {
    let registry = ConverterRegistry::with_defaults();
    let input = InputSource::from_bytes(*b"one\n\ntwo\n");
    let json = convert(&registry, &input, "ast-json");
    let again = convert(&registry, &InputSource::from_bytes(json), "plaintext");
    assert_eq!(again, "one\n\ntwo\n");
}

#[test]
fn plugin_parser_with_its_capability() {
    let mut registry = ConverterRegistry::with_defaults();
    registry.register_plugin(&AsciidocPlugin);
    let input = InputSource::from_bytes(*b"= Release notes\n\nbody\n").with_path("notes.adoc");
    assert_eq!(convert(&registry, &input, "markdown"), "# Release notes\n");
}

#[test]
fn plugin_parse_errors_propagate() {
    let mut registry = ConverterRegistry::new();
    registry.register_plugin(&AsciidocPlugin);
    let parser = registry.parser_for("asciidoc").unwrap();
    let err: ConversionError = parser
        .parse(&InputSource::from_bytes(*b"no title"), &DocmuxOptions::default())
        .unwrap_err()
        .into();
    assert!(matches!(err, ConversionError::Parsing(ParsingError::Malformed { .. })));
    assert!(err.to_string().starts_with("Parsing error: "));
}

#[test]
fn manifests_are_loaded_from_a_directory() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("10-pdf.yaml"),
        "name: pdf-tools\nprovides: [pdf-backend]\n",
    )
    .unwrap();
    fs::write(
        dir.path().join("20-typst.yml"),
        "formats:\n  - format: typst\n    extensions: [typ]\n    requires: [typst-backend]\n",
    )
    .unwrap();
    fs::write(dir.path().join("notes.md"), "not a manifest").unwrap();

    let mut registry = ConverterRegistry::with_defaults();
    assert_eq!(registry.register_manifest_dir(dir.path()).unwrap(), 1);
    assert!(registry.has_capability("pdf-backend"));

    let input = InputSource::from_bytes(*b"#set page(width: 10cm)").with_path("paper.typ");
    let found = registry
        .detect(&input, None, &DetectionOptions::default())
        .unwrap();
    assert_eq!(found.format, "typst");
    match registry.parser_for("typst") {
        Err(ConversionError::Dependency(dep)) => assert_eq!(dep.missing, vec!["typst-backend"]),
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("typst should need its backend"),
    }
}

#[test]
fn bad_manifest_is_a_format_error() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("bad.yaml"), "formats: [{format: x, colour: red}]\n").unwrap();
    let mut registry = ConverterRegistry::new();
    let err = registry.register_manifest_dir(dir.path()).unwrap_err();
    assert!(matches!(err, ConversionError::Format(_)));
}

#[test]
fn metadata_degrades_on_bad_input() {
    let registry = ConverterRegistry::with_defaults();
    let parser = registry.parser_for("ast-json").unwrap();
    let metadata = extract_metadata_or_empty(
        parser.as_ref(),
        &InputSource::from_bytes(*b"{not json"),
        &DocmuxOptions::default(),
    );
    assert!(metadata.is_empty());
}

#[test]
fn configured_transforms_run_before_rendering() {
    let registry = ConverterRegistry::with_defaults();
    let options = DocmuxOptions::default()
        .with_field("transforms.heading_offset", 2i64)
        .unwrap();
    let doc = Document::new(vec![Node::heading(1, vec![Node::text("Title")])]);
    let doc = apply_transforms(&doc, &options).unwrap();
    let out = registry
        .renderer_for("markdown")
        .unwrap()
        .render_to_string(&doc, &options)
        .unwrap();
    assert_eq!(out, "### Title\n");
}
