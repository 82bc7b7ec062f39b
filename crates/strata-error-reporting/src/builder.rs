//! Builder API for diagnostic messages.

use crate::catalog::get_error_info;
use crate::diagnostic::{DetailItem, DetailKind, DiagnosticKind, DiagnosticMessage};
use crate::location::SourceLocation;

/// Builder for [`DiagnosticMessage`].
///
/// # Example
///
/// ```
/// use strata_error_reporting::{DiagnosticKind, DiagnosticMessageBuilder};
///
/// let msg = DiagnosticMessageBuilder::warning("XInclude Matched Nothing")
///     .with_code("S-2-10")
///     .problem("The pointer `/database/*` selected no elements")
///     .build();
///
/// assert_eq!(msg.kind, DiagnosticKind::Warning);
/// ```
#[derive(Debug, Clone)]
pub struct DiagnosticMessageBuilder {
    message: DiagnosticMessage,
}

impl DiagnosticMessageBuilder {
    fn new(kind: DiagnosticKind, title: impl Into<String>) -> Self {
        Self {
            message: DiagnosticMessage::new(kind, title),
        }
    }

    /// Start building a fatal diagnostic.
    pub fn fatal(title: impl Into<String>) -> Self {
        Self::new(DiagnosticKind::Fatal, title)
    }

    /// Start building an error diagnostic.
    pub fn error(title: impl Into<String>) -> Self {
        Self::new(DiagnosticKind::Error, title)
    }

    /// Start building an error diagnostic for `code`, titled from the catalog.
    ///
    /// Codes missing from the catalog are used as their own title.
    pub fn coded_error(code: &str) -> Self {
        let title = get_error_info(code).map_or(code, |info| info.title.as_str());
        Self::error(title).with_code(code)
    }

    /// Start building a warning diagnostic.
    pub fn warning(title: impl Into<String>) -> Self {
        Self::new(DiagnosticKind::Warning, title)
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.message.code = Some(code.into());
        self
    }

    pub fn with_location(mut self, location: SourceLocation) -> Self {
        self.message.location = Some(location);
        self
    }

    /// Set the problem statement.
    pub fn problem(mut self, problem: impl Into<String>) -> Self {
        self.message.problem = Some(problem.into());
        self
    }

    /// Add an error detail (✖).
    pub fn add_detail(self, detail: impl Into<String>) -> Self {
        self.push_detail(DetailKind::Error, detail.into(), None)
    }

    /// Add an error detail pointing at a source location.
    pub fn add_detail_at(self, detail: impl Into<String>, location: SourceLocation) -> Self {
        self.push_detail(DetailKind::Error, detail.into(), Some(location))
    }

    /// Add an info detail (ℹ).
    pub fn add_info(self, detail: impl Into<String>) -> Self {
        self.push_detail(DetailKind::Info, detail.into(), None)
    }

    /// Add a hint. Hints are phrased as questions.
    pub fn add_hint(mut self, hint: impl Into<String>) -> Self {
        self.message.hints.push(hint.into());
        self
    }

    fn push_detail(
        mut self,
        kind: DetailKind,
        content: String,
        location: Option<SourceLocation>,
    ) -> Self {
        self.message.details.push(DetailItem {
            kind,
            content,
            location,
        });
        self
    }

    pub fn build(self) -> DiagnosticMessage {
        self.message
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_collects_parts() {
        let msg = DiagnosticMessageBuilder::error("Circular Reference")
            .with_code("S-1-3")
            .problem("Parameter `a` refers back to itself")
            .add_detail("a -> b -> a")
            .add_info("Resolution stops at the first repeated name")
            .add_hint("Break the chain with a literal value?")
            .build();

        assert_eq!(msg.kind, DiagnosticKind::Error);
        assert_eq!(msg.code.as_deref(), Some("S-1-3"));
        assert_eq!(msg.details.len(), 2);
        assert_eq!(msg.details[1].kind, DetailKind::Info);
        assert_eq!(msg.hints.len(), 1);
    }

    #[test]
    fn test_coded_error_takes_catalog_title() {
        let msg = DiagnosticMessageBuilder::coded_error("S-3-4").build();
        assert_eq!(msg.title, "Invalid Directory");
        assert_eq!(msg.code.as_deref(), Some("S-3-4"));

        let unknown = DiagnosticMessageBuilder::coded_error("S-9-9").build();
        assert_eq!(unknown.title, "S-9-9");
    }

    #[test]
    fn test_detail_with_location() {
        let loc = SourceLocation::from_offset("<a/>", 0);
        let msg = DiagnosticMessageBuilder::fatal("x")
            .add_detail_at("here", loc.clone())
            .build();
        assert_eq!(msg.details[0].location, Some(loc));
    }
}
