//! Node and document metadata

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Open extension data attached to a node
///
/// A `BTreeMap` so equality and serialized key order are deterministic.
pub type Metadata = BTreeMap<String, serde_json::Value>;

static METADATA_KEY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_.:-]*$").expect("valid metadata key regex"));

/// Metadata keys start with a letter or underscore and use `[A-Za-z0-9_.:-]`
pub fn is_valid_metadata_key(key: &str) -> bool {
    METADATA_KEY.is_match(key)
}

/// Descriptive information about a whole document
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DocumentMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub keywords: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    /// Format-specific extras (page count, producer, ...)
    #[serde(default, skip_serializing_if = "Metadata::is_empty")]
    pub custom: Metadata,
}

impl DocumentMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    pub fn with_keyword(mut self, keyword: impl Into<String>) -> Self {
        self.keywords.push(keyword.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        *self == DocumentMetadata::default()
    }

    /// Fill fields missing here from `other`; fields already set win
    ///
    /// Keywords are appended without duplicates, preserving order.
    pub fn merge(mut self, other: DocumentMetadata) -> Self {
        self.title = self.title.or(other.title);
        self.author = self.author.or(other.author);
        self.date = self.date.or(other.date);
        self.description = self.description.or(other.description);
        self.language = self.language.or(other.language);
        for keyword in other.keywords {
            if !self.keywords.contains(&keyword) {
                self.keywords.push(keyword);
            }
        }
        for (key, value) in other.custom {
            self.custom.entry(key).or_insert(value);
        }
        self
    }
}
