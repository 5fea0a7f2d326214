//! Heading slugs
//!
//! GitHub-style anchors: lowercase ASCII alphanumerics, runs of whitespace,
//! `-` and `_` collapsed to a single separator, everything else dropped.

use std::collections::HashSet;

/// Generate a slug from heading text
///
/// ```rust,ignore
/// assert_eq!(slugify("Chapter One", "-"), "chapter-one");
/// assert_eq!(slugify("Hello, World!", "-"), "hello-world");
/// ```
pub fn slugify(text: &str, separator: &str) -> String {
    text.chars()
        .filter_map(|c| {
            if c.is_ascii_alphanumeric() {
                Some(c.to_ascii_lowercase())
            } else if c.is_whitespace() || c == '-' || c == '_' {
                Some(' ')
            } else {
                None
            }
        })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(separator)
}

/// Hands out unique slugs, suffixing repeats with `-1`, `-2`, ...
#[derive(Debug, Clone, Default)]
pub struct SlugSet {
    taken: HashSet<String>,
    separator: String,
}

impl SlugSet {
    pub fn new(separator: impl Into<String>) -> Self {
        Self {
            taken: HashSet::new(),
            separator: separator.into(),
        }
    }

    /// Mark an id as used without generating one
    pub fn reserve(&mut self, id: &str) {
        self.taken.insert(id.to_string());
    }

    pub fn contains(&self, id: &str) -> bool {
        self.taken.contains(id)
    }

    /// Unique slug for `base`; an empty base becomes `section`
    pub fn claim(&mut self, base: &str) -> String {
        let base = if base.is_empty() { "section" } else { base };
        if self.taken.insert(base.to_string()) {
            return base.to_string();
        }
        let mut n = 1;
        loop {
            let candidate = format!("{}{}{}", base, self.separator, n);
            if self.taken.insert(candidate.clone()) {
                return candidate;
            }
            n += 1;
        }
    }
}
