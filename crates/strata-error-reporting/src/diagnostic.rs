//! Core diagnostic message types.
//!
//! Messages are plain text; backticks mark code but nothing is interpreted.

use crate::location::SourceLocation;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The kind of diagnostic message.
///
/// `Fatal` marks a problem after which the producer stopped (for example an
/// XML syntax error); `Error` marks a problem the producer recovered from to
/// keep collecting diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosticKind {
    Fatal,
    Error,
    Warning,
}

impl DiagnosticKind {
    /// Label used in rendered text.
    pub fn label(self) -> &'static str {
        match self {
            DiagnosticKind::Fatal => "Fatal",
            DiagnosticKind::Error => "Error",
            DiagnosticKind::Warning => "Warning",
        }
    }

    /// Whether a diagnostic of this kind fails the operation that raised it.
    pub fn is_failure(self) -> bool {
        !matches!(self, DiagnosticKind::Warning)
    }
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Bullet style of a detail line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DetailKind {
    /// `✖`: what is wrong
    Error,
    /// `ℹ`: context that helps locate the problem
    Info,
}

impl DetailKind {
    fn bullet(self) -> &'static str {
        match self {
            DetailKind::Error => "✖",
            DetailKind::Info => "ℹ",
        }
    }
}

/// One bullet under the problem statement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetailItem {
    pub kind: DetailKind,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<SourceLocation>,
}

/// A diagnostic raised while loading configuration.
///
/// A message has a `kind`, an optional `S-<subsystem>-<n>` code (see
/// [`crate::catalog`]), a short title and optionally a problem statement,
/// detail bullets, hints (phrased as questions) and a source location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagnosticMessage {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    pub title: String,
    pub kind: DiagnosticKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub problem: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub details: Vec<DetailItem>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub hints: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<SourceLocation>,
}

impl DiagnosticMessage {
    /// A bare message; [`crate::DiagnosticMessageBuilder`] fills in the rest.
    pub fn new(kind: DiagnosticKind, title: impl Into<String>) -> Self {
        Self {
            code: None,
            title: title.into(),
            kind,
            problem: None,
            details: Vec::new(),
            hints: Vec::new(),
            location: None,
        }
    }

    /// Create an error diagnostic.
    pub fn error(title: impl Into<String>) -> Self {
        Self::new(DiagnosticKind::Error, title)
    }

    /// Create a warning diagnostic.
    pub fn warning(title: impl Into<String>) -> Self {
        Self::new(DiagnosticKind::Warning, title)
    }

    /// Set the error code.
    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    /// The most specific one-line description: the problem statement if
    /// present, the title otherwise.
    pub fn message(&self) -> &str {
        self.problem
            .as_ref()
            .map_or(self.title.as_str(), String::as_str)
    }

    /// Render this diagnostic message as text.
    ///
    /// Format:
    /// ```text
    /// Error [S-2-3]: title
    ///   at config.xml:4:3
    /// Problem statement here
    /// ✖ Error detail
    /// ℹ Info detail
    /// ? Hint
    /// ```
    ///
    /// # Example
    ///
    /// ```
    /// use strata_error_reporting::DiagnosticMessageBuilder;
    ///
    /// let msg = DiagnosticMessageBuilder::error("Invalid input")
    ///     .problem("Values must be numeric")
    ///     .add_detail("Found text in column 3")
    ///     .add_hint("Convert to numbers first?")
    ///     .build();
    /// let text = msg.to_text();
    /// assert!(text.contains("Error: Invalid input"));
    /// assert!(text.contains("Values must be numeric"));
    /// ```
    pub fn to_text(&self) -> String {
        use std::fmt::Write;

        let mut result = String::new();

        match &self.code {
            Some(code) => writeln!(result, "{} [{}]: {}", self.kind, code, self.title),
            None => writeln!(result, "{}: {}", self.kind, self.title),
        }
        .ok();

        if let Some(location) = &self.location {
            writeln!(result, "  at {}", location).ok();
        }

        if let Some(problem) = &self.problem {
            writeln!(result, "{}", problem).ok();
        }

        for detail in &self.details {
            match &detail.location {
                Some(loc) => writeln!(
                    result,
                    "{} {} ({})",
                    detail.kind.bullet(),
                    detail.content,
                    loc
                ),
                None => writeln!(result, "{} {}", detail.kind.bullet(), detail.content),
            }
            .ok();
        }

        for hint in &self.hints {
            writeln!(result, "? {}", hint).ok();
        }

        result
    }

    /// Render this diagnostic message as a JSON value.
    ///
    /// # Example
    ///
    /// ```
    /// use strata_error_reporting::DiagnosticMessage;
    ///
    /// let msg = DiagnosticMessage::error("Something went wrong");
    /// let json = msg.to_json();
    /// assert_eq!(json["kind"], "error");
    /// assert_eq!(json["title"], "Something went wrong");
    /// ```
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

impl fmt::Display for DiagnosticMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.code {
            Some(code) => write!(f, "{} {}: {}", self.kind, code, self.message()),
            None => write!(f, "{}: {}", self.kind, self.message()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DiagnosticMessageBuilder;

    #[test]
    fn test_diagnostic_kind() {
        assert!(DiagnosticKind::Fatal.is_failure());
        assert!(DiagnosticKind::Error.is_failure());
        assert!(!DiagnosticKind::Warning.is_failure());
    }

    #[test]
    fn test_display_uses_problem() {
        let msg = DiagnosticMessageBuilder::fatal("XML Syntax Error")
            .with_code("S-2-1")
            .problem("unexpected end of input")
            .build();
        assert_eq!(msg.to_string(), "Fatal S-2-1: unexpected end of input");
    }

    #[test]
    fn test_display_falls_back_to_title() {
        let msg = DiagnosticMessage::warning("Something odd");
        assert_eq!(msg.to_string(), "Warning: Something odd");
    }

    #[test]
    fn test_to_text_full() {
        let msg = DiagnosticMessageBuilder::error("Mismatched XML End Tag")
            .with_code("S-2-3")
            .with_location(SourceLocation::from_offset("<a>\n</b>", 4).with_file("c.xml"))
            .problem("End tag </b> does not match start tag <a>")
            .add_info("Expected: </a>")
            .add_hint("Check that all opening tags have matching closing tags?")
            .build();

        insta::assert_snapshot!(msg.to_text(), @r"
        Error [S-2-3]: Mismatched XML End Tag
          at c.xml:2:1
        End tag </b> does not match start tag <a>
        ℹ Expected: </a>
        ? Check that all opening tags have matching closing tags?
        ");
    }

    #[test]
    fn test_to_json_simple() {
        let msg = DiagnosticMessageBuilder::error("Parameter Not Found")
            .with_code("S-1-1")
            .problem("Parameter `x` not found")
            .build();
        let json = msg.to_json();
        assert_eq!(json["kind"], "error");
        assert_eq!(json["code"], "S-1-1");
        assert_eq!(json["problem"], "Parameter `x` not found");
        assert!(json.get("details").is_none());
    }

    #[test]
    fn test_json_roundtrip_keeps_location() {
        let msg = DiagnosticMessageBuilder::fatal("Empty XML Document")
            .with_location(SourceLocation::from_offset("", 0))
            .build();
        let back: DiagnosticMessage = serde_json::from_value(msg.to_json()).unwrap();
        assert_eq!(back, msg);
    }
}
