//! Input format detection
//!
//! Stages run in a fixed order and the first one that resolves wins; later
//! stages never run once an earlier one has answered:
//!
//! 1. explicit hint (`"auto"` counts as no hint)
//! 2. file-name extension
//! 3. declared MIME type
//! 4. magic-byte signatures, if `detection.sniff_content` is on
//! 5. plain-text fallback, if `detection.fallback_to_text` is on
//!
//! Within one stage, records are ranked by priority (highest first), then by
//! registration order.

use crate::error::FormatError;
use crate::format::{ConverterMetadata, InputSource};
use docmux_config::DetectionOptions;
use std::fmt;
use std::io::{Cursor, Read};

/// Hint value meaning "detect it"
pub const AUTO_HINT: &str = "auto";

/// Format the text fallback resolves to
pub const FALLBACK_FORMAT: &str = "plaintext";

/// Formats a generic zip container can be refined into
///
/// Checked in order: the first member name present decides.
const ZIP_MEMBER_MARKERS: &[(&str, &str)] = &[
    ("word/document.xml", "docx"),
    ("xl/workbook.xml", "xlsx"),
    ("ppt/presentation.xml", "pptx"),
];

/// `mimetype` member contents of OCF and OpenDocument containers
const ZIP_MIMETYPE_MARKERS: &[(&str, &str)] = &[
    ("application/epub+zip", "epub"),
    ("application/vnd.oasis.opendocument.text", "odt"),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DetectionStage {
    Hint,
    Extension,
    Mime,
    Content,
    Fallback,
}

impl fmt::Display for DetectionStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DetectionStage::Hint => "hint",
            DetectionStage::Extension => "extension",
            DetectionStage::Mime => "mime",
            DetectionStage::Content => "content",
            DetectionStage::Fallback => "fallback",
        };
        write!(f, "{}", name)
    }
}

/// Outcome of a detection run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Detection {
    pub format: String,
    pub stage: DetectionStage,
}

impl Detection {
    fn new(format: impl Into<String>, stage: DetectionStage) -> Self {
        Self {
            format: format.into(),
            stage,
        }
    }
}

/// Run every stage over `records`, in registration order
pub fn detect(
    records: &[ConverterMetadata],
    input: &InputSource,
    hint: Option<&str>,
    options: &DetectionOptions,
) -> Result<Detection, FormatError> {
    if let Some(hint) = hint.map(str::trim).filter(|h| !h.is_empty() && *h != AUTO_HINT) {
        if !records.iter().any(|r| r.format == hint) {
            return Err(FormatError::UnknownFormat(hint.to_string()));
        }
        log::debug!("format '{}' taken from hint", hint);
        return Ok(Detection::new(hint, DetectionStage::Hint));
    }

    let ranked = ranked(records);

    if let Some(file_name) = input.file_name() {
        if let Some(record) = ranked.iter().find(|r| r.matches_file_name(&file_name)) {
            log::debug!("format '{}' detected from name {}", record.format, file_name);
            return Ok(Detection::new(&record.format, DetectionStage::Extension));
        }
    }

    if let Some(essence) = input.essence() {
        if let Some(record) = ranked.iter().find(|r| r.matches_mime(&essence)) {
            log::debug!("format '{}' detected from MIME type {}", record.format, essence);
            return Ok(Detection::new(&record.format, DetectionStage::Mime));
        }
    }

    if options.sniff_content {
        let head = &input.bytes[..input.bytes.len().min(sniff_len(records))];
        if let Some(record) = ranked.iter().find(|r| r.matches_content(head)) {
            let format = refine_container(&record.format, &input.bytes, records)
                .unwrap_or_else(|| record.format.clone());
            log::debug!("format '{}' detected from content", format);
            return Ok(Detection::new(format, DetectionStage::Content));
        }
    }

    if options.fallback_to_text
        && is_likely_text(&input.bytes)
        && records.iter().any(|r| r.format == FALLBACK_FORMAT && r.detects_input())
    {
        log::debug!("falling back to '{}'", FALLBACK_FORMAT);
        return Ok(Detection::new(FALLBACK_FORMAT, DetectionStage::Fallback));
    }

    Err(FormatError::Undetected(input.describe()))
}

/// Leading bytes needed to test every registered signature
pub fn sniff_len(records: &[ConverterMetadata]) -> usize {
    records
        .iter()
        .flat_map(|r| r.signatures.iter())
        .map(|s| s.end())
        .max()
        .unwrap_or(0)
}

/// Input-detecting records, highest priority first, stable otherwise
fn ranked(records: &[ConverterMetadata]) -> Vec<&ConverterMetadata> {
    let mut ranked: Vec<&ConverterMetadata> =
        records.iter().filter(|r| r.detects_input()).collect();
    ranked.sort_by(|a, b| b.priority.cmp(&a.priority));
    ranked
}

/// Narrow a generic zip match to the office or e-book format it contains
///
/// Only refines into formats that are registered; anything unreadable keeps
/// the generic answer.
fn refine_container(
    format: &str,
    bytes: &[u8],
    records: &[ConverterMetadata],
) -> Option<String> {
    if format != "zip" {
        return None;
    }
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).ok()?;
    let registered = |candidate: &str| records.iter().any(|r| r.format == candidate);

    let names: Vec<String> = archive.file_names().map(str::to_string).collect();
    for (member, candidate) in ZIP_MEMBER_MARKERS {
        if names.iter().any(|name| name == member) && registered(candidate) {
            return Some(candidate.to_string());
        }
    }

    let mut mimetype = String::new();
    archive
        .by_name("mimetype")
        .ok()?
        .take(128)
        .read_to_string(&mut mimetype)
        .ok()?;
    ZIP_MIMETYPE_MARKERS
        .iter()
        .find(|(marker, candidate)| mimetype.trim() == *marker && registered(candidate))
        .map(|(_, candidate)| candidate.to_string())
}

/// Valid UTF-8 without NUL bytes or a high share of control characters
pub fn is_likely_text(bytes: &[u8]) -> bool {
    if bytes.contains(&0) {
        return false;
    }
    let Ok(text) = std::str::from_utf8(bytes) else {
        return false;
    };
    let total = text.chars().count();
    if total == 0 {
        return true;
    }
    let control = text
        .chars()
        .filter(|c| c.is_control() && !matches!(c, '\n' | '\r' | '\t' | '\x0c'))
        .count();
    control * 10 <= total
}
