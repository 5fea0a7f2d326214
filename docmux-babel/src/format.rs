//! Parser and renderer capabilities, and the records that register them
//!
//! A format is not one object. It is any number of [`ConverterMetadata`]
//! records sharing a format name, each describing one capability: a
//! [`Parser`], a [`Renderer`], or detection only (the format is recognized
//! but converting it needs an external capability).

use crate::error::{ParsingError, RenderingError};
use docmux_ast::{Document, DocumentMetadata};
use docmux_config::DocmuxOptions;
use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Input handed to detection and parsers
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InputSource {
    pub bytes: Vec<u8>,
    /// Name the bytes came from; only its file name is used for detection
    pub path: Option<PathBuf>,
    /// Declared MIME type, e.g. from an HTTP header
    pub mime: Option<String>,
}

impl InputSource {
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            bytes: bytes.into(),
            ..Default::default()
        }
    }

    /// Read a file from disk
    pub fn from_path(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = path.as_ref();
        Ok(Self {
            bytes: std::fs::read(path)?,
            path: Some(path.to_path_buf()),
            mime: None,
        })
    }

    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn with_mime(mut self, mime: impl Into<String>) -> Self {
        self.mime = Some(mime.into());
        self
    }

    /// Lower-cased file name, if there is one
    pub fn file_name(&self) -> Option<String> {
        self.path
            .as_deref()
            .and_then(Path::file_name)
            .map(|name| name.to_string_lossy().to_lowercase())
    }

    /// MIME type without parameters, lower-cased
    pub fn essence(&self) -> Option<String> {
        self.mime.as_deref().and_then(|mime| {
            let essence = mime.split(';').next().unwrap_or_default().trim();
            (!essence.is_empty()).then(|| essence.to_ascii_lowercase())
        })
    }

    /// Bytes as UTF-8, without a leading byte-order mark
    pub fn text(&self) -> Result<&str, ParsingError> {
        let bytes = self
            .bytes
            .strip_prefix(b"\xEF\xBB\xBF")
            .unwrap_or(&self.bytes);
        Ok(std::str::from_utf8(bytes)?)
    }

    /// Human-readable name for error messages
    pub fn describe(&self) -> String {
        match &self.path {
            Some(path) => format!("'{}'", path.display()),
            None => format!("{} bytes of input", self.bytes.len()),
        }
    }
}

/// Reads one input format into a [`Document`]
///
/// Implementations must consult the security gate before any network, local
/// file or archive access and honor its verdict: under
/// `security.strict` a denial becomes [`ParsingError::Denied`], otherwise
/// the resource is replaced by a visible placeholder.
pub trait Parser: Send + Sync {
    fn parse(&self, input: &InputSource, options: &DocmuxOptions)
        -> Result<Document, ParsingError>;

    /// Document metadata only. Defaults to a full parse.
    fn extract_metadata(
        &self,
        input: &InputSource,
        options: &DocmuxOptions,
    ) -> Result<DocumentMetadata, ParsingError> {
        Ok(self.parse(input, options)?.metadata)
    }
}

/// Writes a [`Document`] in one output format
pub trait Renderer: Send + Sync {
    fn render(
        &self,
        doc: &Document,
        options: &DocmuxOptions,
        sink: &mut dyn Write,
    ) -> Result<(), RenderingError>;

    fn render_to_bytes(
        &self,
        doc: &Document,
        options: &DocmuxOptions,
    ) -> Result<Vec<u8>, RenderingError> {
        let mut buffer = Vec::new();
        self.render(doc, options, &mut buffer)?;
        Ok(buffer)
    }

    fn render_to_string(
        &self,
        doc: &Document,
        options: &DocmuxOptions,
    ) -> Result<String, RenderingError> {
        Ok(String::from_utf8(self.render_to_bytes(doc, options)?)?)
    }
}

/// Byte pattern expected at a fixed offset
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MagicSignature {
    pub pattern: Vec<u8>,
    pub offset: usize,
}

impl MagicSignature {
    pub fn new(pattern: impl Into<Vec<u8>>) -> Self {
        Self {
            pattern: pattern.into(),
            offset: 0,
        }
    }

    pub fn at(mut self, offset: usize) -> Self {
        self.offset = offset;
        self
    }

    /// Number of leading bytes needed to test this signature
    pub fn end(&self) -> usize {
        self.offset + self.pattern.len()
    }

    pub fn matches(&self, bytes: &[u8]) -> bool {
        !self.pattern.is_empty()
            && bytes
                .get(self.offset..self.end())
                .is_some_and(|window| window == self.pattern.as_slice())
    }
}

/// What a record can do
#[derive(Clone)]
pub enum Capability {
    Parser(Arc<dyn Parser>),
    Renderer(Arc<dyn Renderer>),
    /// Recognized by detection; converting it needs a plugin
    Detect,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CapabilityKind {
    Parser,
    Renderer,
    Detect,
}

impl Capability {
    pub fn kind(&self) -> CapabilityKind {
        match self {
            Capability::Parser(_) => CapabilityKind::Parser,
            Capability::Renderer(_) => CapabilityKind::Renderer,
            Capability::Detect => CapabilityKind::Detect,
        }
    }
}

impl fmt::Debug for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.kind())
    }
}

/// Registration record for one capability of one format
#[derive(Debug, Clone)]
pub struct ConverterMetadata {
    pub format: String,
    /// Without the leading dot, lower-case; may span dots (`tar.gz`)
    pub extensions: Vec<String>,
    pub mime_types: Vec<String>,
    /// Tested in order
    pub signatures: Vec<MagicSignature>,
    pub capability: Capability,
    /// External capabilities that must be provided before dispatch
    pub requires: Vec<String>,
    /// Higher wins among records matching the same signal
    pub priority: i32,
    pub description: String,
    pub remediation: Option<String>,
}

impl ConverterMetadata {
    fn with_capability(format: impl Into<String>, capability: Capability) -> Self {
        Self {
            format: format.into(),
            extensions: Vec::new(),
            mime_types: Vec::new(),
            signatures: Vec::new(),
            capability,
            requires: Vec::new(),
            priority: 0,
            description: String::new(),
            remediation: None,
        }
    }

    pub fn parser(format: impl Into<String>, parser: impl Parser + 'static) -> Self {
        Self::with_capability(format, Capability::Parser(Arc::new(parser)))
    }

    pub fn renderer(format: impl Into<String>, renderer: impl Renderer + 'static) -> Self {
        Self::with_capability(format, Capability::Renderer(Arc::new(renderer)))
    }

    pub fn detect_only(format: impl Into<String>) -> Self {
        Self::with_capability(format, Capability::Detect)
    }

    pub fn extensions(mut self, extensions: &[&str]) -> Self {
        self.extensions.extend(
            extensions
                .iter()
                .map(|ext| ext.trim_start_matches('.').to_ascii_lowercase()),
        );
        self
    }

    pub fn mime_types(mut self, mime_types: &[&str]) -> Self {
        self.mime_types
            .extend(mime_types.iter().map(|mime| mime.to_ascii_lowercase()));
        self
    }

    pub fn signature(mut self, signature: MagicSignature) -> Self {
        self.signatures.push(signature);
        self
    }

    pub fn requires(mut self, capability: impl Into<String>) -> Self {
        self.requires.push(capability.into());
        self
    }

    pub fn priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn remediation(mut self, remediation: impl Into<String>) -> Self {
        self.remediation = Some(remediation.into());
        self
    }

    pub fn kind(&self) -> CapabilityKind {
        self.capability.kind()
    }

    /// Whether this record takes part in input detection
    pub fn detects_input(&self) -> bool {
        self.kind() != CapabilityKind::Renderer
    }

    /// Case-insensitive suffix match of `file_name` against the extensions
    pub fn matches_file_name(&self, file_name: &str) -> bool {
        let file_name = file_name.to_lowercase();
        self.extensions.iter().any(|ext| {
            file_name
                .strip_suffix(ext.as_str())
                .is_some_and(|stem| stem.ends_with('.'))
        })
    }

    pub fn matches_mime(&self, essence: &str) -> bool {
        self.mime_types.iter().any(|mime| mime == essence)
    }

    pub fn matches_content(&self, bytes: &[u8]) -> bool {
        self.signatures.iter().any(|signature| {
            let hit = signature.matches(bytes);
            log::trace!(
                "signature {:?}@{} for {}: {}",
                String::from_utf8_lossy(&signature.pattern),
                signature.offset,
                self.format,
                hit
            );
            hit
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signature_offsets() {
        let tar = MagicSignature::new(*b"ustar").at(257);
        let mut bytes = vec![0u8; 300];
        bytes[257..262].copy_from_slice(b"ustar");
        assert!(tar.matches(&bytes));
        assert!(!tar.matches(&bytes[..260]));
        assert_eq!(tar.end(), 262);
        assert!(!MagicSignature::new(Vec::new()).matches(b"anything"));
    }

    #[test]
    fn test_extension_suffix_match() {
        let record = ConverterMetadata::detect_only("tar").extensions(&[".tar.gz", "TGZ"]);
        assert!(record.matches_file_name("backup.TAR.GZ"));
        assert!(record.matches_file_name("x.tgz"));
        assert!(!record.matches_file_name("tgz"));
        assert!(!record.matches_file_name("archive.gz"));
    }

    #[test]
    fn test_input_source_helpers() {
        let input = InputSource::from_bytes(b"\xEF\xBB\xBFhello".to_vec())
            .with_path("/tmp/Notes.TXT")
            .with_mime("Text/Plain; charset=utf-8");
        assert_eq!(input.file_name().as_deref(), Some("notes.txt"));
        assert_eq!(input.essence().as_deref(), Some("text/plain"));
        assert_eq!(input.text().unwrap(), "hello");
        assert!(InputSource::from_bytes(vec![0xff, 0xfe, 0x00]).text().is_err());
    }
}
