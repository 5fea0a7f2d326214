//! Markup sanitization
//!
//! Event handlers are recognized by shape (`on` followed by letters), not
//! from a table of known events, so handlers added to the platform later are
//! stripped too. Front-end framework directives are a separate, opt-in pass.

use crate::error::MarkupDenial;
use crate::verdict::Verdict;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

static EVENT_HANDLER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^on[a-z]+$").expect("valid event handler regex"));

/// Elements that execute code or change how the page loads
pub const DANGEROUS_ELEMENTS: &[&str] = &[
    "script", "iframe", "frame", "frameset", "object", "embed", "applet", "base", "meta", "link",
    "style", "noscript",
];

/// Attributes whose value is a URL
pub const URL_ATTRIBUTES: &[&str] = &[
    "href",
    "src",
    "action",
    "formaction",
    "poster",
    "background",
    "xlink:href",
    "data",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarkupSanitizationPolicy {
    pub strip_event_handlers: bool,
    pub strip_framework_directives: bool,
    pub strip_unsafe_urls: bool,
}

impl Default for MarkupSanitizationPolicy {
    fn default() -> Self {
        Self {
            strip_event_handlers: true,
            strip_framework_directives: false,
            strip_unsafe_urls: true,
        }
    }
}

/// Attributes left after sanitizing, and the names that were removed
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SanitizedAttributes {
    pub kept: Vec<(String, String)>,
    pub stripped: Vec<String>,
}

impl MarkupSanitizationPolicy {
    pub fn sanitize_attributes<'a, I>(&self, attributes: I) -> SanitizedAttributes
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut out = SanitizedAttributes::default();
        for (name, value) in attributes {
            if self.should_strip(name, value) {
                out.stripped.push(name.to_string());
            } else {
                out.kept.push((name.to_string(), value.to_string()));
            }
        }
        if !out.stripped.is_empty() {
            log::warn!("stripped {} unsafe attribute(s)", out.stripped.len());
        }
        out
    }

    fn should_strip(&self, name: &str, value: &str) -> bool {
        (self.strip_event_handlers && is_event_handler(name))
            || (self.strip_framework_directives && is_framework_directive(name))
            || (self.strip_unsafe_urls && is_url_attribute(name) && !is_safe_url_scheme(value))
    }

    pub fn check_element(&self, tag: &str) -> Verdict {
        if is_dangerous_element(tag) {
            Verdict::deny(MarkupDenial::DangerousElement(tag.to_ascii_lowercase()))
        } else {
            Verdict::Allow
        }
    }

    pub fn check_url(&self, url: &str) -> Verdict {
        if is_safe_url_scheme(url) {
            Verdict::Allow
        } else {
            Verdict::deny(MarkupDenial::UnsafeUrlScheme(
                url_scheme(url).unwrap_or_default(),
            ))
        }
    }
}

pub fn is_event_handler(name: &str) -> bool {
    EVENT_HANDLER.is_match(name.trim())
}

/// Vue, Angular, Alpine, htmx and Svelte attribute syntax
pub fn is_framework_directive(name: &str) -> bool {
    let name = name.trim().to_ascii_lowercase();
    const PREFIXES: &[&str] = &[
        "v-", "ng-", "data-ng-", "x-", "hx-", "data-hx-", "on:", "bind:", "use:",
    ];
    if PREFIXES.iter().any(|p| name.starts_with(p) && name.len() > p.len()) {
        return true;
    }
    let bracketed = |open: char, close: char| {
        name.len() > 2 && name.starts_with(open) && name.ends_with(close)
    };
    (name.len() > 1 && (name.starts_with(':') || name.starts_with('@') || name.starts_with('*')))
        || bracketed('[', ']')
        || bracketed('(', ')')
}

pub fn is_dangerous_element(tag: &str) -> bool {
    let tag = tag.trim().to_ascii_lowercase();
    DANGEROUS_ELEMENTS.contains(&tag.as_str())
}

fn is_url_attribute(name: &str) -> bool {
    let name = name.trim().to_ascii_lowercase();
    URL_ATTRIBUTES.contains(&name.as_str())
}

/// Scheme of a URL after removing the whitespace and control characters
/// browsers ignore, lowercased; `None` for relative URLs
fn url_scheme(url: &str) -> Option<String> {
    let cleaned: String = url
        .chars()
        .filter(|c| !c.is_whitespace() && !c.is_control())
        .collect();
    let colon = cleaned.find(':')?;
    let scheme = &cleaned[..colon];
    let valid = scheme
        .chars()
        .next()
        .map(|c| c.is_ascii_alphabetic())
        .unwrap_or(false)
        && scheme
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'));
    if !valid {
        return None;
    }
    Some(scheme.to_ascii_lowercase())
}

/// `javascript:` and `vbscript:` are refused; `data:` only for raster images
pub fn is_safe_url_scheme(url: &str) -> bool {
    match url_scheme(url).as_deref() {
        None => true,
        Some("javascript") | Some("vbscript") => false,
        Some("data") => {
            let lowered: String = url
                .chars()
                .filter(|c| !c.is_whitespace() && !c.is_control())
                .collect::<String>()
                .to_ascii_lowercase();
            lowered.starts_with("data:image/") && !lowered.starts_with("data:image/svg")
        }
        Some(_) => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("onclick", true)]
    #[case("ONLOAD", true)]
    #[case("onpointerrawupdate", true)]
    #[case("on", false)]
    #[case("one-thing", false)]
    #[case("on:click", false)]
    #[case("data-onclick", false)]
    fn test_event_handlers(#[case] name: &str, #[case] expected: bool) {
        assert_eq!(is_event_handler(name), expected);
    }

    #[rstest]
    #[case("v-if", true)]
    #[case(":href", true)]
    #[case("@click", true)]
    #[case("ng-click", true)]
    #[case("[value]", true)]
    #[case("(click)", true)]
    #[case("*ngFor", true)]
    #[case("x-data", true)]
    #[case("hx-get", true)]
    #[case("on:click", true)]
    #[case("bind:value", true)]
    #[case("class", false)]
    #[case("href", false)]
    #[case("v-", false)]
    #[case("data-id", false)]
    fn test_framework_directives(#[case] name: &str, #[case] expected: bool) {
        assert_eq!(is_framework_directive(name), expected);
    }

    #[rstest]
    #[case("https://example.com", true)]
    #[case("/relative/path", true)]
    #[case("page.html#a:b", true)]
    #[case("mailto:someone@example.com", true)]
    #[case("javascript:alert(1)", false)]
    #[case("  JaVaScRiPt:alert(1)", false)]
    #[case("java\tscript:alert(1)", false)]
    #[case("vbscript:msgbox", false)]
    #[case("data:image/png;base64,AAAA", true)]
    #[case("data:image/svg+xml,<svg/>", false)]
    #[case("data:text/html,<script>", false)]
    fn test_url_schemes(#[case] url: &str, #[case] expected: bool) {
        assert_eq!(is_safe_url_scheme(url), expected);
    }

    #[test]
    fn test_sanitize_default_keeps_directives() {
        let policy = MarkupSanitizationPolicy::default();
        let out = policy.sanitize_attributes([
            ("class", "x"),
            ("onclick", "steal()"),
            ("v-html", "raw"),
            ("href", "javascript:void(0)"),
        ]);
        assert_eq!(
            out.kept,
            vec![
                ("class".to_string(), "x".to_string()),
                ("v-html".to_string(), "raw".to_string())
            ]
        );
        assert_eq!(out.stripped, vec!["onclick".to_string(), "href".to_string()]);
    }

    #[test]
    fn test_sanitize_with_directive_pass() {
        let policy = MarkupSanitizationPolicy {
            strip_framework_directives: true,
            ..Default::default()
        };
        let out = policy.sanitize_attributes([("v-html", "raw"), ("@click", "go"), ("id", "a")]);
        assert_eq!(out.kept, vec![("id".to_string(), "a".to_string())]);
        assert_eq!(out.stripped.len(), 2);
    }

    #[test]
    fn test_dangerous_elements() {
        let policy = MarkupSanitizationPolicy::default();
        assert!(policy.check_element("SCRIPT").is_denied());
        assert!(policy.check_element("p").is_allowed());
        assert_eq!(
            policy.check_url("javascript:x"),
            Verdict::Deny(MarkupDenial::UnsafeUrlScheme("javascript".into()).into())
        );
    }
}
