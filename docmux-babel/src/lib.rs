//! Format registry and built-in formats for docmux
//!
//!     Parsers turn input bytes into a [`Document`], renderers turn a document
//!     into output bytes. Neither knows about the other: every conversion goes
//!     through the document tree, so adding a format means writing one adapter
//!     rather than one per peer format.
//!
//! Architecture
//!
//!     - [`format`]: the Parser and Renderer capabilities, input sources and
//!       registration records
//!     - [`registry`]: holds records, runs detection, gates on external
//!       capabilities and dispatches
//!     - [`detection`]: the staged input detection algorithm
//!     - [`plugin`]: third-party formats, in code or as YAML manifests
//!     - [`formats`]: the built-in formats
//!     - [`error`]: the conversion error taxonomy
//!
//!     This is a pure library. Nothing here reads the process environment,
//!     prints, or installs a logger; wiring a request end to end is left to the
//!     caller.
//!
//! Typical use
//!
//! ```ignore
//! let options = Loader::new().with_process_env().build()?;
//! let registry = default_registry();
//! let input = InputSource::from_path("notes.txt")?;
//! let detection = registry.detect(&input, None, &options.detection)?;
//! let doc = registry.parser_for(&detection.format)?.parse(&input, &options)?;
//! let doc = pipeline_from_options(&options.transforms)?.run_owned(doc)?;
//! let out = registry.renderer_for("markdown")?.render_to_string(&doc, &options)?;
//! ```

pub mod detection;
pub mod error;
pub mod format;
pub mod formats;
pub mod plugin;
pub mod registry;

pub use detection::{Detection, DetectionStage};
pub use error::{
    ConversionError, DependencyError, FormatError, ParsingError, RenderingError, Result,
};
pub use format::{Capability, CapabilityKind, ConverterMetadata, InputSource, MagicSignature};
pub use format::{Parser, Renderer};
pub use plugin::{FormatPlugin, PluginManifest};
pub use registry::{default_registry, ConverterRegistry};

use docmux_ast::transforms::standard::{self, HeadingOffset};
use docmux_ast::{Document, DocumentMetadata, Pipeline};
use docmux_config::{DocmuxOptions, TransformOptions, ValidationError};

/// Metadata of `input`, or empty metadata when extraction fails
///
/// Metadata is never critical to a conversion, so a failure is logged and
/// swallowed instead of aborting.
pub fn extract_metadata_or_empty(
    parser: &dyn Parser,
    input: &InputSource,
    options: &DocmuxOptions,
) -> DocumentMetadata {
    match parser.extract_metadata(input, options) {
        Ok(metadata) => metadata,
        Err(err) => {
            log::warn!(
                "metadata extraction failed for {}: {}",
                input.describe(),
                err
            );
            DocumentMetadata::default()
        }
    }
}

/// Pipeline configured by the `transforms` options section
///
/// A non-zero `heading_offset` runs first, then every enabled built-in in
/// list order.
pub fn pipeline_from_options(
    options: &TransformOptions,
) -> std::result::Result<Pipeline, ConversionError> {
    let mut pipeline = Pipeline::named("configured");
    if options.heading_offset != 0 {
        pipeline.push(Box::new(HeadingOffset::new(options.heading_offset)));
    }
    for name in &options.enabled {
        let transform = standard::by_name(name).ok_or_else(|| ValidationError::InvalidValue {
            field: "transforms.enabled".to_string(),
            value: name.clone(),
            expected: format!("one of {}", standard::BUILTIN_NAMES.join(", ")),
        })?;
        pipeline.push(transform);
    }
    log::debug!("configured pipeline: {:?}", pipeline.names());
    Ok(pipeline)
}

/// Run the pipeline configured by `options` over a copy of `doc`
///
/// `doc` itself is never modified, whether the run succeeds or not.
pub fn apply_transforms(
    doc: &Document,
    options: &DocmuxOptions,
) -> std::result::Result<Document, ConversionError> {
    let pipeline = pipeline_from_options(&options.transforms)?;
    Ok(pipeline.run(doc)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use docmux_ast::Node;

    struct FailingMetadata;

    impl Parser for FailingMetadata {
        fn parse(
            &self,
            _input: &InputSource,
            _options: &DocmuxOptions,
        ) -> std::result::Result<Document, ParsingError> {
            Ok(Document::default())
        }

        fn extract_metadata(
            &self,
            _input: &InputSource,
            _options: &DocmuxOptions,
        ) -> std::result::Result<DocumentMetadata, ParsingError> {
            Err(ParsingError::PasswordProtected {
                format: "test".to_string(),
            })
        }
    }

    #[test]
    fn test_metadata_failure_degrades_to_empty() {
        let metadata = extract_metadata_or_empty(
            &FailingMetadata,
            &InputSource::default(),
            &DocmuxOptions::default(),
        );
        assert!(metadata.is_empty());
    }

    #[test]
    fn test_pipeline_from_options() {
        let options = TransformOptions {
            enabled: vec!["remove-images".to_string(), "add-heading-ids".to_string()],
            heading_offset: 1,
        };
        let pipeline = pipeline_from_options(&options).unwrap();
        assert_eq!(pipeline.len(), 3);

        let doc = Document::new(vec![
            Node::heading(1, vec![Node::text("Intro")]),
            Node::paragraph(vec![Node::image("a.png", None)]),
        ]);
        let out = pipeline.run(&doc).unwrap();
        match &out.children[..] {
            [Node::Heading(heading)] => {
                assert_eq!(heading.level, 2);
                assert_eq!(heading.id.as_deref(), Some("intro"));
            }
            other => panic!("unexpected children: {other:?}"),
        }
    }

    #[test]
    fn test_unknown_transform_is_a_validation_error() {
        let options = TransformOptions {
            enabled: vec!["shout".to_string()],
            heading_offset: 0,
        };
        match pipeline_from_options(&options) {
            Err(ConversionError::Validation(err)) => {
                assert_eq!(err.field(), Some("transforms.enabled"));
                assert!(err.to_string().contains("shout"));
            }
            other => panic!("unexpected result: {:?}", other.map(|p| p.names().len())),
        }
    }
}
