//! The options schema
//!
//! One [`FieldSpec`] per configurable leaf. The table drives three things:
//!
//! - validation of the merged configuration (type, range, legal values)
//! - the environment-variable layer (which variables exist, how lists split)
//! - the derived CLI/env surface ([`flag_name`], [`negated_flag_name`], [`env_var_name`])
//!
//! Paths are dot-separated, matching the TOML layout of
//! `defaults/docmux.default.toml`.

use crate::error::ValidationError;
use config::{Value, ValueKind};
use std::collections::BTreeMap;

pub const ENV_PREFIX: &str = "DOCMUX";
pub const FLAG_PREFIX: &str = "--";

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldKind {
    Bool,
    Int { min: i64, max: i64 },
    /// Finite, strictly greater than `min` and at most `max`
    Float { min: f64, max: f64 },
    Str,
    Choice(&'static [&'static str]),
    StrList,
}

impl FieldKind {
    fn describe(&self) -> String {
        match self {
            FieldKind::Bool => "a boolean".to_string(),
            FieldKind::Int { min, max } if *max == i64::MAX => {
                format!("an integer >= {}", min)
            }
            FieldKind::Int { min, max } => format!("an integer in {}..={}", min, max),
            FieldKind::Float { min, max } => {
                format!("a number greater than {} and at most {}", min, max)
            }
            FieldKind::Str => "a string".to_string(),
            FieldKind::Choice(values) => format!("one of: {}", values.join(", ")),
            FieldKind::StrList => "a list of strings".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldSpec {
    pub path: &'static str,
    pub kind: FieldKind,
    /// Compiled default, as written in the defaults file
    pub default: &'static str,
    pub help: &'static str,
}

const POSITIVE: FieldKind = FieldKind::Int {
    min: 1,
    max: i64::MAX,
};

/// One day
pub const MAX_TIMEOUT_SECONDS: f64 = 86_400.0;

pub const HTML_MODES: &[&str] = &["escape", "pass-through", "drop"];
pub const BULLETS: &[&str] = &["-", "*", "+"];

pub const FIELDS: &[FieldSpec] = &[
    FieldSpec {
        path: "security.disable_network",
        kind: FieldKind::Bool,
        default: "false",
        help: "Forbid every network access, whatever the format options say",
    },
    FieldSpec {
        path: "security.strict",
        kind: FieldKind::Bool,
        default: "false",
        help: "Fail the conversion on a security denial instead of inserting a placeholder",
    },
    FieldSpec {
        path: "security.local_files.allow",
        kind: FieldKind::Bool,
        default: "false",
        help: "Allow formats to read referenced local files",
    },
    FieldSpec {
        path: "security.local_files.allow_current_dir",
        kind: FieldKind::Bool,
        default: "false",
        help: "Treat the working directory as an allowed root",
    },
    FieldSpec {
        path: "security.local_files.allowed_roots",
        kind: FieldKind::StrList,
        default: "",
        help: "Directories local files may be read from",
    },
    FieldSpec {
        path: "security.local_files.denied_paths",
        kind: FieldKind::StrList,
        default: "",
        help: "Paths never read, even under an allowed root",
    },
    FieldSpec {
        path: "detection.sniff_content",
        kind: FieldKind::Bool,
        default: "true",
        help: "Identify formats from their leading bytes",
    },
    FieldSpec {
        path: "detection.fallback_to_text",
        kind: FieldKind::Bool,
        default: "true",
        help: "Treat undetected textual input as plain text",
    },
    FieldSpec {
        path: "html.network.allow",
        kind: FieldKind::Bool,
        default: "false",
        help: "Fetch remote assets referenced by HTML",
    },
    FieldSpec {
        path: "html.network.allowed_hosts",
        kind: FieldKind::StrList,
        default: "",
        help: "Hosts remote assets may come from (exact or *.domain)",
    },
    FieldSpec {
        path: "html.network.require_secure_transport",
        kind: FieldKind::Bool,
        default: "true",
        help: "Only fetch over https",
    },
    FieldSpec {
        path: "html.network.max_bytes",
        kind: POSITIVE,
        default: "10485760",
        help: "Largest remote asset, in bytes",
    },
    FieldSpec {
        path: "html.network.timeout_seconds",
        kind: FieldKind::Float {
            min: 0.0,
            max: MAX_TIMEOUT_SECONDS,
        },
        default: "30.0",
        help: "Time limit for one remote fetch",
    },
    FieldSpec {
        path: "html.network.max_redirects",
        kind: FieldKind::Int { min: 0, max: 20 },
        default: "5",
        help: "Redirects followed per fetch",
    },
    FieldSpec {
        path: "html.sanitize.strip_event_handlers",
        kind: FieldKind::Bool,
        default: "true",
        help: "Remove on* event handler attributes",
    },
    FieldSpec {
        path: "html.sanitize.strip_framework_directives",
        kind: FieldKind::Bool,
        default: "false",
        help: "Remove front-end framework directive attributes",
    },
    FieldSpec {
        path: "html.sanitize.strip_unsafe_urls",
        kind: FieldKind::Bool,
        default: "true",
        help: "Remove URL attributes with script or non-image data schemes",
    },
    FieldSpec {
        path: "archive.max_files",
        kind: POSITIVE,
        default: "1000",
        help: "Most members an archive may have",
    },
    FieldSpec {
        path: "archive.max_member_bytes",
        kind: POSITIVE,
        default: "104857600",
        help: "Largest decompressed member, in bytes",
    },
    FieldSpec {
        path: "archive.max_total_bytes",
        kind: POSITIVE,
        default: "1073741824",
        help: "Largest decompressed archive, in bytes",
    },
    FieldSpec {
        path: "archive.max_compression_ratio",
        kind: FieldKind::Float {
            min: 1.0,
            max: 1_000_000.0,
        },
        default: "100.0",
        help: "Highest decompressed:compressed ratio for one member",
    },
    FieldSpec {
        path: "markdown.html_mode",
        kind: FieldKind::Choice(HTML_MODES),
        default: "escape",
        help: "What the Markdown renderer does with raw HTML nodes",
    },
    FieldSpec {
        path: "markdown.front_matter",
        kind: FieldKind::Bool,
        default: "false",
        help: "Emit document metadata as YAML front matter",
    },
    FieldSpec {
        path: "markdown.bullet",
        kind: FieldKind::Choice(BULLETS),
        default: "-",
        help: "Marker for unordered list items",
    },
    FieldSpec {
        path: "transforms.enabled",
        kind: FieldKind::StrList,
        default: "",
        help: "Built-in transforms to run, in order",
    },
    FieldSpec {
        path: "transforms.heading_offset",
        kind: FieldKind::Int { min: -5, max: 5 },
        default: "0",
        help: "Shift every heading level by this amount",
    },
];

pub fn lookup(path: &str) -> Option<&'static FieldSpec> {
    FIELDS.iter().find(|f| f.path == path)
}

/// `html.network.max_bytes` becomes `--html-network-max-bytes`
pub fn flag_name(path: &str) -> String {
    format!("{}{}", FLAG_PREFIX, path_words(path))
}

/// `--no-...` form, only for booleans that default to true
pub fn negated_flag_name(spec: &FieldSpec) -> Option<String> {
    if spec.kind == FieldKind::Bool && spec.default == "true" {
        Some(format!("{}no-{}", FLAG_PREFIX, path_words(spec.path)))
    } else {
        None
    }
}

/// `html.network.max_bytes` becomes `DOCMUX_HTML_NETWORK_MAX_BYTES`
pub fn env_var_name(path: &str) -> String {
    format!(
        "{}_{}",
        ENV_PREFIX,
        path_words(path).replace('-', "_").to_ascii_uppercase()
    )
}

fn path_words(path: &str) -> String {
    path.replace(&['.', '_'][..], "-")
}

/// Derived names for one field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SurfaceEntry {
    pub path: &'static str,
    pub flag: String,
    pub negated_flag: Option<String>,
    pub env_var: String,
    pub help: &'static str,
}

pub fn surface() -> Vec<SurfaceEntry> {
    FIELDS
        .iter()
        .map(|spec| SurfaceEntry {
            path: spec.path,
            flag: flag_name(spec.path),
            negated_flag: negated_flag_name(spec),
            env_var: env_var_name(spec.path),
            help: spec.help,
        })
        .collect()
}

/// Check a merged configuration tree against the schema
///
/// Returns the tree as JSON with every leaf converted to its declared type.
/// Keys outside the schema are rejected.
pub(crate) fn normalize(root: Value) -> Result<serde_json::Value, ValidationError> {
    let mut leaves = BTreeMap::new();
    flatten("", root, &mut leaves);

    let mut out = serde_json::Map::new();
    for (path, value) in leaves {
        let spec = lookup(&path).ok_or_else(|| ValidationError::UnknownField(path.clone()))?;
        let converted = convert(spec, value)?;
        insert(&mut out, &path, converted);
    }
    Ok(serde_json::Value::Object(out))
}

fn flatten(prefix: &str, value: Value, out: &mut BTreeMap<String, Value>) {
    match value.kind {
        ValueKind::Table(table) => {
            for (key, child) in table {
                let path = if prefix.is_empty() {
                    key
                } else {
                    format!("{}.{}", prefix, key)
                };
                flatten(&path, child, out);
            }
        }
        _ => {
            out.insert(prefix.to_string(), value);
        }
    }
}

fn insert(root: &mut serde_json::Map<String, serde_json::Value>, path: &str, value: serde_json::Value) {
    let mut segments = path.split('.').peekable();
    let mut current = root;
    while let Some(segment) = segments.next() {
        if segments.peek().is_none() {
            current.insert(segment.to_string(), value);
            return;
        }
        let entry = current
            .entry(segment.to_string())
            .or_insert_with(|| serde_json::Value::Object(serde_json::Map::new()));
        if !entry.is_object() {
            *entry = serde_json::Value::Object(serde_json::Map::new());
        }
        current = match entry {
            serde_json::Value::Object(map) => map,
            _ => return,
        };
    }
}

/// Convert one leaf to the JSON type its field declares
pub(crate) fn convert(spec: &FieldSpec, value: Value) -> Result<serde_json::Value, ValidationError> {
    let shown = value.to_string();
    let invalid = || ValidationError::InvalidValue {
        field: spec.path.to_string(),
        value: shown.clone(),
        expected: spec.kind.describe(),
    };

    match spec.kind {
        FieldKind::Bool => value
            .into_bool()
            .map(serde_json::Value::Bool)
            .map_err(|_| invalid()),
        FieldKind::Int { min, max } => {
            let n = value.into_int().map_err(|_| invalid())?;
            if n < min || n > max {
                return Err(invalid());
            }
            Ok(serde_json::Value::from(n))
        }
        FieldKind::Float { min, max } => {
            let n = value.into_float().map_err(|_| invalid())?;
            if !n.is_finite() || n <= min || n > max {
                return Err(invalid());
            }
            Ok(serde_json::Value::from(n))
        }
        FieldKind::Str => value
            .into_string()
            .map(serde_json::Value::String)
            .map_err(|_| invalid()),
        FieldKind::Choice(legal) => {
            let s = value.into_string().map_err(|_| invalid())?;
            if legal.contains(&s.as_str()) {
                Ok(serde_json::Value::String(s))
            } else {
                Err(invalid())
            }
        }
        FieldKind::StrList => {
            let items = match value.kind {
                ValueKind::Array(items) => items
                    .into_iter()
                    .map(|v| v.into_string().map_err(|_| invalid()))
                    .collect::<Result<Vec<_>, _>>()?,
                ValueKind::String(s) => split_list(&s),
                ValueKind::Nil => Vec::new(),
                _ => return Err(invalid()),
            };
            Ok(serde_json::Value::from(items))
        }
    }
}

/// Comma-separated list, blanks dropped
pub fn split_list(s: &str) -> Vec<String> {
    s.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::collections::HashSet;

    #[rstest]
    #[case("html.network.max_bytes", "--html-network-max-bytes", "DOCMUX_HTML_NETWORK_MAX_BYTES")]
    #[case("security.disable_network", "--security-disable-network", "DOCMUX_SECURITY_DISABLE_NETWORK")]
    #[case("markdown.html_mode", "--markdown-html-mode", "DOCMUX_MARKDOWN_HTML_MODE")]
    fn test_derived_names(#[case] path: &str, #[case] flag: &str, #[case] env: &str) {
        assert_eq!(flag_name(path), flag);
        assert_eq!(env_var_name(path), env);
    }

    #[test]
    fn test_negated_flags_only_for_true_booleans() {
        let secure = lookup("html.network.require_secure_transport").unwrap();
        assert_eq!(
            negated_flag_name(secure).as_deref(),
            Some("--no-html-network-require-secure-transport")
        );
        let allow = lookup("html.network.allow").unwrap();
        assert_eq!(negated_flag_name(allow), None);
        let bytes = lookup("html.network.max_bytes").unwrap();
        assert_eq!(negated_flag_name(bytes), None);
    }

    #[test]
    fn test_derived_names_are_unique() {
        let entries = surface();
        let flags: HashSet<_> = entries.iter().map(|e| e.flag.clone()).collect();
        let envs: HashSet<_> = entries.iter().map(|e| e.env_var.clone()).collect();
        assert_eq!(flags.len(), FIELDS.len());
        assert_eq!(envs.len(), FIELDS.len());
    }

    #[test]
    fn test_convert_reports_field_value_and_legal_set() {
        let spec = lookup("markdown.html_mode").unwrap();
        let err = convert(spec, Value::new(None, "raw")).unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid value 'raw' for 'markdown.html_mode': expected one of: escape, pass-through, drop"
        );
    }

    #[rstest]
    #[case("html.network.max_redirects", Value::new(None, 21i64))]
    #[case("html.network.max_bytes", Value::new(None, 0i64))]
    #[case("html.network.timeout_seconds", Value::new(None, 0.0))]
    #[case("html.network.timeout_seconds", Value::new(None, 1e300))]
    #[case("archive.max_compression_ratio", Value::new(None, f64::MAX))]
    #[case("html.network.allow", Value::new(None, "perhaps"))]
    #[case("archive.max_files", Value::new(None, "many"))]
    fn test_convert_rejects(#[case] path: &str, #[case] value: Value) {
        let spec = lookup(path).unwrap();
        let err = convert(spec, value).unwrap_err();
        assert_eq!(err.field(), Some(path));
    }

    #[test]
    fn test_lists_accept_comma_strings() {
        let spec = lookup("html.network.allowed_hosts").unwrap();
        let out = convert(spec, Value::new(None, "a.com, *.b.org,,")).unwrap();
        assert_eq!(out, serde_json::json!(["a.com", "*.b.org"]));
    }
}
