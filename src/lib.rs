//! # docmux
//!
//! Document conversion through one canonical tree. Every input format is
//! parsed into a [`Document`], optionally rewritten by a transform
//! [`Pipeline`], and rendered from that same tree, so formats never talk to
//! each other directly.
//!
//! The work is split across four crates, re-exported here:
//!
//! - [`ast`]: the document tree, visiting, serialization and transforms
//! - [`security`]: pure policy checks for network, local file, archive and
//!   markup access
//! - [`config`]: the layered options loader
//! - [`babel`]: registry, detection, error taxonomy and built-in formats
//!
//! ```ignore
//! use docmux::prelude::*;
//!
//! let options = Loader::new().with_auto_discovery(".").with_process_env().build()?;
//! let input = InputSource::from_path("report.txt")?;
//! let registry = default_registry();
//! let found = registry.detect(&input, None, &options.detection)?;
//! let doc = registry.parser_for(&found.format)?.parse(&input, &options)?;
//! let doc = apply_transforms(&doc, &options)?;
//! let markdown = registry.renderer_for("markdown")?.render_to_string(&doc, &options)?;
//! ```

pub use docmux_ast as ast;
pub use docmux_babel as babel;
pub use docmux_config as config;
pub use docmux_security as security;

pub use docmux_ast::{Document, DocumentMetadata, Node, Pipeline};
pub use docmux_babel::{ConversionError, ConverterRegistry, InputSource};
pub use docmux_config::{DocmuxOptions, Loader};

/// The types most conversions need
pub mod prelude {
    pub use docmux_ast::{Document, DocumentMetadata, Node, NodeKind, Pipeline, Transform};
    pub use docmux_babel::{
        apply_transforms, default_registry, extract_metadata_or_empty, pipeline_from_options,
        ConversionError, ConverterMetadata, ConverterRegistry, InputSource, Parser, Renderer,
    };
    pub use docmux_config::{DocmuxOptions, Loader};
    pub use docmux_security::{SecurityError, Verdict};
}
