//! Converter registry
//!
//! Holds every registration record, runs detection over them and dispatches
//! to a parser or renderer. The registry is a plain value: build one, register
//! formats, then share it read-only. [`default_registry`] is a lazily built
//! instance with the built-in formats for callers that need nothing else.

use crate::detection::{self, Detection};
use crate::error::{ConversionError, DependencyError, FormatError};
use crate::format::{Capability, CapabilityKind, ConverterMetadata, InputSource, Parser, Renderer};
use crate::plugin::{FormatPlugin, PluginManifest};
use docmux_config::DetectionOptions;
use once_cell::sync::Lazy;
use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Arc;

static DEFAULT_REGISTRY: Lazy<ConverterRegistry> = Lazy::new(ConverterRegistry::with_defaults);

/// Shared registry holding the built-in formats
pub fn default_registry() -> &'static ConverterRegistry {
    &DEFAULT_REGISTRY
}

/// Registry of converter records
///
/// # Examples
///
/// ```ignore
/// let registry = ConverterRegistry::with_defaults();
/// let input = InputSource::from_path("notes.txt")?;
/// let detection = registry.detect(&input, None, &options.detection)?;
/// let doc = registry.parser_for(&detection.format)?.parse(&input, &options)?;
/// let md = registry.renderer_for("markdown")?.render_to_string(&doc, &options)?;
/// ```
#[derive(Debug, Clone, Default)]
pub struct ConverterRegistry {
    records: Vec<ConverterMetadata>,
    provided: BTreeSet<String>,
}

impl ConverterRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry with the built-in formats
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        for record in crate::formats::builtin_records() {
            registry.register(record);
        }
        registry
    }

    /// Add a record. Records sharing a format name are all kept.
    pub fn register(&mut self, record: ConverterMetadata) {
        log::debug!(
            "registered {:?} for '{}' (priority {})",
            record.kind(),
            record.format,
            record.priority
        );
        self.records.push(record);
    }

    /// Declare an external capability as available
    pub fn provide_capability(&mut self, capability: impl Into<String>) {
        self.provided.insert(capability.into());
    }

    pub fn has_capability(&self, capability: &str) -> bool {
        self.provided.contains(capability)
    }

    pub fn register_plugin(&mut self, plugin: &dyn FormatPlugin) {
        log::debug!("registering plugin '{}'", plugin.name());
        for capability in plugin.provides() {
            self.provide_capability(capability);
        }
        for record in plugin.records() {
            self.register(record);
        }
    }

    /// Register a YAML manifest; returns the number of records added
    pub fn register_manifest(&mut self, yaml: &str) -> Result<usize, FormatError> {
        let manifest = PluginManifest::from_yaml(yaml)?;
        let records = manifest.records()?;
        let count = records.len();
        for capability in manifest.provides {
            self.provide_capability(capability);
        }
        for record in records {
            self.register(record);
        }
        Ok(count)
    }

    /// Register every `*.yaml` / `*.yml` manifest in `dir`, in file-name order
    pub fn register_manifest_dir(&mut self, dir: impl AsRef<Path>) -> Result<usize, ConversionError> {
        let read_dir = std::fs::read_dir(dir.as_ref()).map_err(|e| {
            FormatError::Manifest(format!("cannot read {}: {}", dir.as_ref().display(), e))
        })?;
        let mut paths: Vec<_> = read_dir
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| {
                path.extension()
                    .is_some_and(|ext| ext == "yaml" || ext == "yml")
            })
            .collect();
        paths.sort();

        let mut count = 0;
        for path in paths {
            let source = std::fs::read_to_string(&path).map_err(|e| {
                FormatError::Manifest(format!("cannot read {}: {}", path.display(), e))
            })?;
            count += self.register_manifest(&source)?;
        }
        Ok(count)
    }

    /// Every record registered for `format`, in registration order
    pub fn records_for(&self, format: &str) -> Vec<&ConverterMetadata> {
        self.records.iter().filter(|r| r.format == format).collect()
    }

    pub fn records(&self) -> &[ConverterMetadata] {
        &self.records
    }

    /// Check if any record exists for a format
    pub fn has(&self, format: &str) -> bool {
        self.records.iter().any(|r| r.format == format)
    }

    /// List all registered format names (sorted)
    pub fn formats(&self) -> Vec<String> {
        let names: BTreeSet<&str> = self.records.iter().map(|r| r.format.as_str()).collect();
        names.into_iter().map(str::to_string).collect()
    }

    /// Detect the input format; see [`detection`](crate::detection) for the stages
    pub fn detect(
        &self,
        input: &InputSource,
        hint: Option<&str>,
        options: &DetectionOptions,
    ) -> Result<Detection, FormatError> {
        detection::detect(&self.records, input, hint, options)
    }

    /// Capabilities `record` requires that nobody provides
    pub fn missing_capabilities(&self, record: &ConverterMetadata) -> Vec<String> {
        record
            .requires
            .iter()
            .filter(|capability| !self.provided.contains(capability.as_str()))
            .cloned()
            .collect()
    }

    pub fn can_parse(&self, format: &str) -> bool {
        self.parser_for(format).is_ok()
    }

    pub fn can_render(&self, format: &str) -> bool {
        self.renderer_for(format).is_ok()
    }

    pub fn parser_for(&self, format: &str) -> Result<Arc<dyn Parser>, ConversionError> {
        match self.select(format, CapabilityKind::Parser)?.capability {
            Capability::Parser(ref parser) => Ok(Arc::clone(parser)),
            _ => Err(not_supported(format, "parser")),
        }
    }

    pub fn renderer_for(&self, format: &str) -> Result<Arc<dyn Renderer>, ConversionError> {
        match self.select(format, CapabilityKind::Renderer)?.capability {
            Capability::Renderer(ref renderer) => Ok(Arc::clone(renderer)),
            _ => Err(not_supported(format, "renderer")),
        }
    }

    /// Best record for `format` offering `wanted`, with dependency gating
    ///
    /// Records whose requirements are met are preferred; among those, the
    /// highest priority wins, then registration order. A detection-only record
    /// stands in for a missing parser so that its requirements can be
    /// reported.
    fn select(
        &self,
        format: &str,
        wanted: CapabilityKind,
    ) -> Result<&ConverterMetadata, ConversionError> {
        let candidates = self.records_for(format);
        if candidates.is_empty() {
            return Err(FormatError::UnknownFormat(format.to_string()).into());
        }

        let mut offering: Vec<&ConverterMetadata> = candidates
            .iter()
            .copied()
            .filter(|r| r.kind() == wanted)
            .collect();
        if offering.is_empty() && wanted == CapabilityKind::Parser {
            offering = candidates
                .iter()
                .copied()
                .filter(|r| r.kind() == CapabilityKind::Detect)
                .collect();
        }
        offering.sort_by(|a, b| b.priority.cmp(&a.priority));

        if let Some(&ready) = offering
            .iter()
            .find(|r| self.missing_capabilities(r).is_empty())
        {
            if ready.kind() == wanted {
                log::debug!("dispatching '{}' to its {:?}", format, wanted);
                return Ok(ready);
            }
        }

        let Some(best) = offering.first() else {
            let capability = match wanted {
                CapabilityKind::Renderer => "renderer",
                _ => "parser",
            };
            return Err(not_supported(format, capability));
        };
        let missing = self.missing_capabilities(best);
        if missing.is_empty() {
            // requirements met, but the record only detects
            return Err(not_supported(format, "parser"));
        }
        let remediation = best.remediation.clone().unwrap_or_else(|| {
            format!(
                "Register a plugin that provides {} to convert '{}'.",
                missing.join(", "),
                format
            )
        });
        Err(DependencyError {
            format: format.to_string(),
            missing,
            remediation,
        }
        .into())
    }
}

fn not_supported(format: &str, capability: &'static str) -> ConversionError {
    FormatError::NotSupported {
        format: format.to_string(),
        capability,
    }
    .into()
}
