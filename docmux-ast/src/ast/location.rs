//! Source location hints
//!
//! Parsers may attach a [`SourceLocation`] to any node so diagnostics (validation
//! reports, transform failures) can point back into the original input. Locations
//! are hints only: nothing in the tree depends on them being present or accurate.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Position of a node in its source input
///
/// `offset` is a byte offset; `line` and `column` are 1-based when known.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct SourceLocation {
    pub offset: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column: Option<usize>,
}

impl SourceLocation {
    pub fn at_offset(offset: usize) -> Self {
        Self {
            offset,
            line: None,
            column: None,
        }
    }

    pub fn new(offset: usize, line: usize, column: usize) -> Self {
        Self {
            offset,
            line: Some(line),
            column: Some(column),
        }
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.line, self.column) {
            (Some(line), Some(column)) => write!(f, "line {}, column {}", line, column),
            (Some(line), None) => write!(f, "line {}", line),
            _ => write!(f, "offset {}", self.offset),
        }
    }
}
