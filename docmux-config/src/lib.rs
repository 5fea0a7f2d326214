//! Layered option loading for docmux conversions.
//!
//! `defaults/docmux.default.toml` is embedded so that documentation and
//! runtime behavior stay in sync. [`Loader`] layers further sources on top and
//! validates the merged result into [`DocmuxOptions`]. From lowest to highest
//! precedence:
//!
//! 1. embedded defaults
//! 2. a discovered `docmux.toml` / `.docmux.toml`
//! 3. `DOCMUX_*` environment variables
//! 4. explicit config files, in the order given
//! 5. named presets, in the order given
//! 6. call-site overrides
//!
//! The order is fixed by [`Loader::build`]; the order of the builder calls
//! only matters within one layer.

mod env;
pub mod error;
pub mod options;
pub mod schema;

pub use env::EnvSource;
pub use error::ValidationError;
pub use options::{
    DetectionOptions, DocmuxOptions, HtmlMode, HtmlOptions, MarkdownOptions, SecurityOptions,
    TransformOptions,
};
pub use schema::{surface, FieldKind, FieldSpec, SurfaceEntry, FIELDS};

use config::{Config, File, FileFormat, ValueKind};
use std::path::{Path, PathBuf};

const DEFAULT_TOML: &str = include_str!("../defaults/docmux.default.toml");

/// File names picked up by [`Loader::with_auto_discovery`], nearest first
pub const DISCOVERED_FILE_NAMES: &[&str] = &["docmux.toml", ".docmux.toml"];

/// Built-in presets: name and TOML body
pub const PRESETS: &[(&str, &str)] = &[
    ("secure", include_str!("../presets/secure.toml")),
    ("web", include_str!("../presets/web.toml")),
    (
        "permissive-local",
        include_str!("../presets/permissive-local.toml"),
    ),
];

/// Names of the built-in presets
pub fn preset_names() -> Vec<&'static str> {
    PRESETS.iter().map(|(name, _)| *name).collect()
}

fn preset(name: &str) -> Option<&'static str> {
    PRESETS
        .iter()
        .find(|(candidate, _)| *candidate == name)
        .map(|(_, body)| *body)
}

#[derive(Debug, Clone)]
enum FileLayer {
    Required(PathBuf),
    Optional(PathBuf),
}

/// Helper for layering option sources over the built-in defaults.
#[derive(Debug, Clone, Default)]
pub struct Loader {
    discovered: Option<PathBuf>,
    env: Option<EnvSource>,
    files: Vec<FileLayer>,
    presets: Vec<&'static str>,
    overrides: Vec<(String, ValueKind)>,
}

impl Loader {
    /// Start a loader seeded with the embedded defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Look for a project config file in `dir` and its ancestors.
    ///
    /// The first directory that holds one of [`DISCOVERED_FILE_NAMES`] wins.
    pub fn with_auto_discovery(mut self, dir: impl AsRef<Path>) -> Self {
        self.discovered = discover(dir.as_ref());
        if let Some(path) = &self.discovered {
            log::debug!("discovered options file {}", path.display());
        }
        self
    }

    /// Read `DOCMUX_*` values from an explicit variable set.
    pub fn with_env<I, K, V>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.env = Some(EnvSource::from_vars(vars));
        self
    }

    /// Read `DOCMUX_*` values from the process environment.
    pub fn with_process_env(mut self) -> Self {
        self.env = Some(EnvSource::from_process());
        self
    }

    /// Layer a configuration file. Missing files trigger an error at build time.
    pub fn with_file(mut self, path: impl AsRef<Path>) -> Self {
        self.files
            .push(FileLayer::Required(path.as_ref().to_path_buf()));
        self
    }

    /// Layer an optional configuration file (ignored if the file is absent).
    pub fn with_optional_file(mut self, path: impl AsRef<Path>) -> Self {
        self.files
            .push(FileLayer::Optional(path.as_ref().to_path_buf()));
        self
    }

    /// Layer a named preset.
    pub fn with_preset(mut self, name: &str) -> Result<Self, ValidationError> {
        let Some((name, _)) = PRESETS.iter().find(|(candidate, _)| *candidate == name) else {
            return Err(ValidationError::UnknownPreset {
                name: name.to_string(),
                available: preset_names().join(", "),
            });
        };
        self.presets.push(name);
        Ok(self)
    }

    /// Apply a single key/value override (useful for call-site settings).
    pub fn set_override<I>(mut self, key: &str, value: I) -> Result<Self, ValidationError>
    where
        I: Into<ValueKind>,
    {
        if schema::lookup(key).is_none() {
            return Err(ValidationError::UnknownField(key.to_string()));
        }
        self.overrides.push((key.to_string(), value.into()));
        Ok(self)
    }

    /// Merge every layer and validate the result.
    pub fn build(self) -> Result<DocmuxOptions, ValidationError> {
        let mut builder =
            Config::builder().add_source(File::from_str(DEFAULT_TOML, FileFormat::Toml));

        if let Some(path) = &self.discovered {
            builder = builder.add_source(File::from(path.as_path()).format(FileFormat::Toml));
        }
        if let Some(env) = self.env {
            if !env.is_empty() {
                log::debug!("layering environment options");
            }
            builder = builder.add_source(env);
        }
        for layer in &self.files {
            let source = match layer {
                FileLayer::Required(path) => {
                    log::debug!("layering options file {}", path.display());
                    File::from(path.as_path()).required(true)
                }
                FileLayer::Optional(path) => File::from(path.as_path()).required(false),
            };
            builder = builder.add_source(source.format(FileFormat::Toml));
        }
        for name in &self.presets {
            if let Some(body) = preset(name) {
                log::debug!("layering preset '{}'", name);
                builder = builder.add_source(File::from_str(body, FileFormat::Toml));
            }
        }
        for (key, value) in self.overrides {
            builder = builder.set_override(key, value)?;
        }

        options::from_config(builder.build()?)
    }
}

fn discover(start: &Path) -> Option<PathBuf> {
    start.ancestors().find_map(|dir| {
        DISCOVERED_FILE_NAMES
            .iter()
            .map(|name| dir.join(name))
            .find(|candidate| candidate.is_file())
    })
}

/// Convenience helper for callers that only need the defaults.
pub fn load_defaults() -> Result<DocmuxOptions, ValidationError> {
    Loader::new().build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_default_config() {
        let options = load_defaults().expect("defaults to deserialize");
        assert!(!options.security.disable_network);
        assert!(options.detection.sniff_content);
        assert_eq!(options.markdown.html_mode, HtmlMode::Escape);
        assert_eq!(options.archive.max_files, 1000);
    }

    #[test]
    fn supports_overrides() {
        let options = Loader::new()
            .set_override("markdown.html_mode", "drop")
            .expect("override to apply")
            .build()
            .expect("config to build");
        assert_eq!(options.markdown.html_mode, HtmlMode::Drop);
    }

    #[test]
    fn rejects_unknown_presets() {
        let err = Loader::new().with_preset("paranoid").unwrap_err();
        match err {
            ValidationError::UnknownPreset { name, available } => {
                assert_eq!(name, "paranoid");
                assert!(available.contains("secure"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn every_preset_builds() {
        for name in preset_names() {
            Loader::new()
                .with_preset(name)
                .and_then(Loader::build)
                .unwrap_or_else(|e| panic!("preset {name} failed: {e}"));
        }
    }
}
