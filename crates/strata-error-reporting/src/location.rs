//! Source locations attached to diagnostics.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A point in a source document.
///
/// Lines and columns are 1-based; `offset` is the 0-based byte offset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceLocation {
    /// File the location belongs to, if known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    pub line: usize,
    pub column: usize,
    pub offset: usize,
}

impl SourceLocation {
    /// Compute the line and column of a byte offset within `source`.
    ///
    /// Offsets past the end of `source` are clamped to its length.
    pub fn from_offset(source: &str, offset: usize) -> Self {
        let offset = offset.min(source.len());
        let before = &source.as_bytes()[..offset];
        let line = before.iter().filter(|&&b| b == b'\n').count() + 1;
        let line_start = before
            .iter()
            .rposition(|&b| b == b'\n')
            .map_or(0, |p| p + 1);
        let column = String::from_utf8_lossy(&before[line_start..]).chars().count() + 1;

        Self {
            file: None,
            line,
            column,
            offset,
        }
    }

    /// Attach a file name.
    pub fn with_file(mut self, file: impl Into<String>) -> Self {
        self.file = Some(file.into());
        self
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(file) = &self.file {
            write!(f, "{}:", file)?;
        }
        write!(f, "{}:{}", self.line, self.column)
    }
}
