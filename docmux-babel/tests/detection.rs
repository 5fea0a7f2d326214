use docmux_babel::{
    ConversionError, ConverterMetadata, ConverterRegistry, DetectionStage, FormatError,
    InputSource, MagicSignature,
};
use docmux_config::DetectionOptions;
use rstest::rstest;
use std::io::{Cursor, Write};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

fn zip_with(members: &[(&str, &[u8])]) -> Vec<u8> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let stored = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
    for (name, content) in members {
        zip.start_file(*name, stored).unwrap();
        zip.write_all(content).unwrap();
    }
    zip.finish().unwrap().into_inner()
}

fn detect(input: &InputSource) -> (String, DetectionStage) {
    let found = ConverterRegistry::with_defaults()
        .detect(input, None, &DetectionOptions::default())
        .unwrap();
    (found.format, found.stage)
}

#[test]
fn pdf_bytes_without_name_are_sniffed() {
    let input = InputSource::from_bytes(*b"%PDF-1.7\n%\xe2\xe3\xcf\xd3\n1 0 obj");
    assert_eq!(detect(&input), ("pdf".to_string(), DetectionStage::Content));
}

#[test]
fn extension_beats_conflicting_signature() {
    let input = InputSource::from_bytes(*b"%PDF-1.7 but really notes").with_path("notes.TXT");
    assert_eq!(
        detect(&input),
        ("plaintext".to_string(), DetectionStage::Extension)
    );
}

#[rstest]
#[case(&[("word/document.xml", b"<w:document/>" as &[u8])], "docx")]
#[case(&[("xl/workbook.xml", b"<workbook/>" as &[u8])], "xlsx")]
#[case(&[("ppt/presentation.xml", b"<p:presentation/>" as &[u8])], "pptx")]
#[case(&[("mimetype", b"application/epub+zip" as &[u8]), ("OEBPS/content.opf", b"<package/>" as &[u8])], "epub")]
#[case(&[("mimetype", b"application/vnd.oasis.opendocument.text" as &[u8])], "odt")]
#[case(&[("readme.txt", b"hello" as &[u8])], "zip")]
fn zip_containers_are_refined(#[case] members: &[(&str, &[u8])], #[case] expected: &str) {
    let input = InputSource::from_bytes(zip_with(members));
    assert_eq!(detect(&input), (expected.to_string(), DetectionStage::Content));
}

#[test]
fn refinement_only_picks_registered_formats() {
    let mut registry = ConverterRegistry::new();
    registry.register(
        ConverterMetadata::detect_only("zip").signature(MagicSignature::new(*b"PK\x03\x04")),
    );
    let docx = zip_with(&[("word/document.xml", b"<w:document/>" as &[u8])]);
    let input = InputSource::from_bytes(docx);
    let found = registry
        .detect(&input, None, &DetectionOptions::default())
        .unwrap();
    assert_eq!(found.format, "zip");
}

#[test]
fn serialized_documents_are_sniffed_as_ast_json() {
    let input = InputSource::from_bytes(*br#"{"kind":"Document","schema_version":1,"fields":{}}"#);
    assert_eq!(detect(&input), ("ast-json".to_string(), DetectionStage::Content));
}

#[test]
fn mime_parameters_are_ignored() {
    let input = InputSource::from_bytes(*b"<p>hi</p>").with_mime("Text/HTML; charset=UTF-8");
    assert_eq!(detect(&input), ("html".to_string(), DetectionStage::Mime));
}

#[test]
fn text_falls_back_to_plaintext() {
    let input = InputSource::from_bytes(*b"Just some words.\n");
    assert_eq!(
        detect(&input),
        ("plaintext".to_string(), DetectionStage::Fallback)
    );
}

#[test]
fn unknown_hint_is_an_error_not_ignored() {
    let input = InputSource::from_bytes(*b"%PDF-1.7");
    let err = ConverterRegistry::with_defaults()
        .detect(&input, Some("wordperfect"), &DetectionOptions::default())
        .unwrap_err();
    assert!(matches!(err, FormatError::UnknownFormat(name) if name == "wordperfect"));
}

#[test]
fn detected_pdf_reports_missing_backend() {
    let registry = ConverterRegistry::with_defaults();
    let input = InputSource::from_bytes(*b"%PDF-1.4");
    let found = registry
        .detect(&input, None, &DetectionOptions::default())
        .unwrap();
    let err = match registry.parser_for(&found.format) {
        Err(err) => err,
        Ok(_) => panic!("pdf has no built-in parser"),
    };
    match &err {
        ConversionError::Dependency(dep) => {
            assert_eq!(dep.format, "pdf");
            assert_eq!(dep.missing, vec!["pdf-backend"]);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(err.remediation().unwrap().contains("pdf-backend"));
}

#[test]
fn all_records_of_a_format_are_listed() {
    let registry = ConverterRegistry::with_defaults();
    let markdown = registry.records_for("markdown");
    assert_eq!(markdown.len(), 2);
    assert!(registry.can_render("markdown"));
    assert!(!registry.can_parse("markdown"));
}
