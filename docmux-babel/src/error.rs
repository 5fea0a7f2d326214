//! Error taxonomy for conversions
//!
//! Each stage has its own error type; [`ConversionError`] is the umbrella
//! callers match on. Every sub-error converts into it with `?`.

use docmux_ast::TransformError;
use docmux_config::ValidationError;
use docmux_security::SecurityError;
use thiserror::Error;

/// Detection failed, or a format name could not be resolved
#[derive(Error, Debug)]
pub enum FormatError {
    #[error("unknown format '{0}'")]
    UnknownFormat(String),

    #[error("could not detect the format of {0}")]
    Undetected(String),

    #[error("format '{format}' has no registered {capability}")]
    NotSupported {
        format: String,
        capability: &'static str,
    },

    #[error("invalid plugin manifest: {0}")]
    Manifest(String),
}

/// The input matched a format but could not be read as one
#[derive(Error, Debug)]
pub enum ParsingError {
    #[error("malformed {format} input: {message}")]
    Malformed { format: String, message: String },

    #[error("{format} input is password protected")]
    PasswordProtected { format: String },

    #[error("input is not valid UTF-8: {0}")]
    Encoding(#[from] std::str::Utf8Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A security check failed under a strict policy
    #[error(transparent)]
    Denied(#[from] SecurityError),
}

impl ParsingError {
    pub fn malformed(format: impl Into<String>, message: impl Into<String>) -> Self {
        ParsingError::Malformed {
            format: format.into(),
            message: message.into(),
        }
    }
}

/// The selected converter needs external capabilities that are not available
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("format '{format}' requires missing capabilities: {}. {remediation}", .missing.join(", "))]
pub struct DependencyError {
    pub format: String,
    pub missing: Vec<String>,
    pub remediation: String,
}

#[derive(Error, Debug)]
pub enum RenderingError {
    #[error("{format} cannot render {node}")]
    Unsupported { format: String, node: String },

    #[error("failed to write output: {0}")]
    OutputWrite(#[from] std::io::Error),

    #[error("rendered output is not valid UTF-8: {0}")]
    Encoding(#[from] std::string::FromUtf8Error),

    #[error("serialization failed: {0}")]
    Serialization(String),
}

/// Any failure along detect, parse, transform and render
#[derive(Error, Debug)]
pub enum ConversionError {
    #[error("Configuration error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Format error: {0}")]
    Format(#[from] FormatError),

    #[error("Parsing error: {0}")]
    Parsing(ParsingError),

    #[error("Dependency error: {0}")]
    Dependency(#[from] DependencyError),

    #[error("Transform error: {0}")]
    Transform(#[from] TransformError),

    #[error("Rendering error: {0}")]
    Rendering(#[from] RenderingError),

    #[error("Security error: {0}")]
    Security(#[from] SecurityError),
}

impl From<ParsingError> for ConversionError {
    fn from(err: ParsingError) -> Self {
        match err {
            ParsingError::Denied(security) => ConversionError::Security(security),
            other => ConversionError::Parsing(other),
        }
    }
}

impl ConversionError {
    /// What the user can do about it, for dependency failures
    pub fn remediation(&self) -> Option<&str> {
        match self {
            ConversionError::Dependency(err) => Some(&err.remediation),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, ConversionError>;

#[cfg(test)]
mod tests {
    use super::*;
    use docmux_security::{NetworkDenial, SecurityError};

    #[test]
    fn test_dependency_error_display() {
        let err = DependencyError {
            format: "pdf".to_string(),
            missing: vec!["pdf-backend".to_string(), "ocr".to_string()],
            remediation: "Install the docmux-pdf plugin.".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "format 'pdf' requires missing capabilities: pdf-backend, ocr. Install the docmux-pdf plugin."
        );
        let umbrella: ConversionError = err.into();
        assert_eq!(umbrella.remediation(), Some("Install the docmux-pdf plugin."));
    }

    #[test]
    fn test_security_denial_inside_parser_surfaces_as_security_error() {
        let parsing: ParsingError = SecurityError::from(NetworkDenial::NetworkDisabled).into();
        let umbrella: ConversionError = parsing.into();
        assert!(matches!(
            umbrella,
            ConversionError::Security(SecurityError::Network(NetworkDenial::NetworkDisabled))
        ));
    }

    #[test]
    fn test_password_protected_is_a_parsing_error() {
        let err: ConversionError = ParsingError::PasswordProtected {
            format: "pdf".to_string(),
        }
        .into();
        assert_eq!(
            err.to_string(),
            "Parsing error: pdf input is password protected"
        );
    }

    #[test]
    fn test_error_size() {
        let size = std::mem::size_of::<ConversionError>();
        assert!(size < 256, "ConversionError is {size} bytes");
    }
}
