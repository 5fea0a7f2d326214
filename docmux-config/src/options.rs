//! Typed options produced by the loader
//!
//! Every node is an immutable value. "Changing" a field goes through
//! [`DocmuxOptions::with_field`], which re-validates and returns a new object.

use crate::error::ValidationError;
use crate::schema;
use config::{Config, ValueKind};
use docmux_security::{
    ArchiveValidationPolicy, LocalFileAccessPolicy, MarkupSanitizationPolicy, NetworkFetchPolicy,
};
use serde::{Deserialize, Serialize};

/// Top-level options for one conversion
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DocmuxOptions {
    pub security: SecurityOptions,
    pub detection: DetectionOptions,
    pub html: HtmlOptions,
    pub archive: ArchiveValidationPolicy,
    pub markdown: MarkdownOptions,
    pub transforms: TransformOptions,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SecurityOptions {
    pub disable_network: bool,
    /// Denials fail the conversion instead of leaving a placeholder
    pub strict: bool,
    pub local_files: LocalFileAccessPolicy,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionOptions {
    pub sniff_content: bool,
    pub fallback_to_text: bool,
}

impl Default for DetectionOptions {
    fn default() -> Self {
        Self {
            sniff_content: true,
            fallback_to_text: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HtmlOptions {
    pub network: NetworkFetchPolicy,
    pub sanitize: MarkupSanitizationPolicy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HtmlMode {
    #[default]
    Escape,
    PassThrough,
    Drop,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarkdownOptions {
    pub html_mode: HtmlMode,
    pub front_matter: bool,
    pub bullet: char,
}

impl Default for MarkdownOptions {
    fn default() -> Self {
        Self {
            html_mode: HtmlMode::Escape,
            front_matter: false,
            bullet: '-',
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TransformOptions {
    /// Built-in transform names, run in this order
    pub enabled: Vec<String>,
    pub heading_offset: i8,
}

impl DocmuxOptions {
    /// Copy of these options with one field replaced
    ///
    /// The result goes through the same validation as a loaded configuration;
    /// `self` is left as it was.
    pub fn with_field<I>(&self, path: &str, value: I) -> Result<Self, ValidationError>
    where
        I: Into<ValueKind>,
    {
        if schema::lookup(path).is_none() {
            return Err(ValidationError::UnknownField(path.to_string()));
        }
        let value: ValueKind = value.into();
        let merged = Config::builder()
            .add_source(Config::try_from(self)?)
            .set_override(path, value)?
            .build()?;
        from_config(merged)
    }

    /// Fetch policy for HTML assets, with the global network switch folded in
    pub fn network_policy(&self) -> NetworkFetchPolicy {
        NetworkFetchPolicy {
            network_disabled: self.security.disable_network,
            ..self.html.network.clone()
        }
    }

    pub fn local_file_policy(&self) -> LocalFileAccessPolicy {
        self.security.local_files.clone()
    }

    pub fn archive_policy(&self) -> ArchiveValidationPolicy {
        self.archive.clone()
    }

    pub fn markup_policy(&self) -> MarkupSanitizationPolicy {
        self.html.sanitize.clone()
    }
}

/// Validate a merged configuration and deserialize it
pub(crate) fn from_config(config: Config) -> Result<DocmuxOptions, ValidationError> {
    let root: config::Value = config.try_deserialize()?;
    let normalized = schema::normalize(root)?;
    serde_json::from_value(normalized).map_err(|e| ValidationError::Schema(e.to_string()))
}
