//! Third-party formats
//!
//! A plugin is either code implementing [`FormatPlugin`], or a YAML manifest
//! describing detection-only records and the capabilities the host provides.
//! Both are registered explicitly at startup; nothing is discovered through
//! package metadata.
//!
//! ```yaml
//! provides: [pdf-backend]
//! formats:
//!   - format: pdf
//!     extensions: [pdf]
//!     mime_types: [application/pdf]
//!     signatures:
//!       - text: "%PDF"
//!     requires: [pdf-backend]
//!     priority: 10
//! ```

use crate::error::FormatError;
use crate::format::{ConverterMetadata, MagicSignature};
use serde::Deserialize;

/// A bundle of records plus the external capabilities it brings
pub trait FormatPlugin {
    fn name(&self) -> &str;

    fn records(&self) -> Vec<ConverterMetadata>;

    /// Capability names this plugin satisfies
    fn provides(&self) -> Vec<String> {
        Vec::new()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PluginManifest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub provides: Vec<String>,
    #[serde(default)]
    pub formats: Vec<FormatEntry>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FormatEntry {
    pub format: String,
    #[serde(default)]
    pub extensions: Vec<String>,
    #[serde(default)]
    pub mime_types: Vec<String>,
    #[serde(default)]
    pub signatures: Vec<SignatureEntry>,
    #[serde(default)]
    pub requires: Vec<String>,
    #[serde(default)]
    pub priority: i32,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub remediation: Option<String>,
}

/// Signature given either as text or as hex digits
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SignatureEntry {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub hex: Option<String>,
    #[serde(default)]
    pub offset: usize,
}

impl PluginManifest {
    pub fn from_yaml(source: &str) -> Result<Self, FormatError> {
        serde_yaml::from_str(source).map_err(|e| FormatError::Manifest(e.to_string()))
    }

    /// Detection-only records for every entry
    pub fn records(&self) -> Result<Vec<ConverterMetadata>, FormatError> {
        self.formats.iter().map(FormatEntry::to_record).collect()
    }
}

impl FormatEntry {
    fn to_record(&self) -> Result<ConverterMetadata, FormatError> {
        if self.format.trim().is_empty() {
            return Err(FormatError::Manifest("format name is empty".to_string()));
        }
        let extensions: Vec<&str> = self.extensions.iter().map(String::as_str).collect();
        let mime_types: Vec<&str> = self.mime_types.iter().map(String::as_str).collect();
        let mut record = ConverterMetadata::detect_only(&self.format)
            .extensions(&extensions)
            .mime_types(&mime_types)
            .priority(self.priority)
            .description(&self.description);
        for signature in &self.signatures {
            record = record.signature(signature.to_signature(&self.format)?);
        }
        for capability in &self.requires {
            record = record.requires(capability);
        }
        if let Some(remediation) = &self.remediation {
            record = record.remediation(remediation);
        }
        Ok(record)
    }
}

impl SignatureEntry {
    fn to_signature(&self, format: &str) -> Result<MagicSignature, FormatError> {
        let pattern = match (&self.text, &self.hex) {
            (Some(text), None) => text.as_bytes().to_vec(),
            (None, Some(hex)) => decode_hex(hex).ok_or_else(|| {
                FormatError::Manifest(format!("bad hex signature '{}' for {}", hex, format))
            })?,
            _ => {
                return Err(FormatError::Manifest(format!(
                    "signature for {} needs exactly one of `text` or `hex`",
                    format
                )))
            }
        };
        if pattern.is_empty() {
            return Err(FormatError::Manifest(format!(
                "empty signature for {}",
                format
            )));
        }
        Ok(MagicSignature::new(pattern).at(self.offset))
    }
}

fn decode_hex(hex: &str) -> Option<Vec<u8>> {
    let digits: Vec<u8> = hex
        .bytes()
        .filter(|b| !b.is_ascii_whitespace())
        .collect();
    if digits.len() % 2 != 0 {
        return None;
    }
    digits
        .chunks(2)
        .map(|pair| {
            let pair = std::str::from_utf8(pair).ok()?;
            u8::from_str_radix(pair, 16).ok()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::CapabilityKind;

    const MANIFEST: &str = r#"
name: adoc
provides: [asciidoctor]
formats:
  - format: asciidoc
    extensions: [adoc, .asciidoc]
    mime_types: [text/asciidoc]
    signatures:
      - text: "= "
      - hex: "3a 74 6f 63 3a"
        offset: 0
    requires: [asciidoctor]
    priority: 3
    remediation: Install asciidoctor.
"#;

    #[test]
    fn test_manifest_records() {
        let manifest = PluginManifest::from_yaml(MANIFEST).unwrap();
        assert_eq!(manifest.provides, vec!["asciidoctor"]);
        let records = manifest.records().unwrap();
        assert_eq!(records.len(), 1);
        let record = &records[0];
        assert_eq!(record.kind(), CapabilityKind::Detect);
        assert_eq!(record.extensions, vec!["adoc", "asciidoc"]);
        assert_eq!(record.signatures[1].pattern, b":toc:".to_vec());
        assert_eq!(record.priority, 3);
        assert_eq!(record.remediation.as_deref(), Some("Install asciidoctor."));
    }

    #[test]
    fn test_manifest_rejects_bad_signatures() {
        let both = "formats:\n  - format: x\n    signatures:\n      - {text: a, hex: '61'}\n";
        let records = PluginManifest::from_yaml(both).unwrap().records();
        assert!(matches!(records, Err(FormatError::Manifest(_))));

        let odd = "formats:\n  - format: x\n    signatures:\n      - {hex: '616'}\n";
        assert!(PluginManifest::from_yaml(odd).unwrap().records().is_err());
    }

    #[test]
    fn test_manifest_rejects_unknown_keys() {
        let err = PluginManifest::from_yaml("formatz: []\n").unwrap_err();
        assert!(matches!(err, FormatError::Manifest(_)));
    }

    #[test]
    fn test_decode_hex() {
        assert_eq!(decode_hex("504B0304"), Some(vec![0x50, 0x4b, 0x03, 0x04]));
        assert_eq!(decode_hex("zz"), None);
    }
}
