//! Context for XML parsing with diagnostic collection.

use strata_error_reporting::DiagnosticMessage;

/// Collects diagnostics while a document is parsed and its includes are
/// processed.
///
/// Parsing does not stop at the first recoverable problem, so one pass can
/// report several errors. Warnings end up here too.
///
/// # Example
///
/// ```rust
/// use strata_xml::{parse_with_context, XmlParseContext};
///
/// let mut ctx = XmlParseContext::new();
/// let doc = parse_with_context("<a><b></c></a>", None, &mut ctx);
///
/// assert!(doc.is_some());
/// assert!(ctx.has_errors());
/// assert_eq!(ctx.diagnostics()[0].code.as_deref(), Some("S-2-3"));
/// ```
#[derive(Debug, Default)]
pub struct XmlParseContext {
    /// Accumulated diagnostic messages.
    diagnostics: Vec<DiagnosticMessage>,
}

impl XmlParseContext {
    /// Create a new XML parse context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a diagnostic message to the context.
    pub fn add_diagnostic(&mut self, diagnostic: DiagnosticMessage) {
        tracing::debug!(
            code = diagnostic.code.as_deref().unwrap_or(""),
            kind = %diagnostic.kind,
            "XML diagnostic"
        );
        self.diagnostics.push(diagnostic);
    }

    /// Check if any diagnostics have been collected.
    pub fn has_diagnostics(&self) -> bool {
        !self.diagnostics.is_empty()
    }

    /// Get all collected diagnostics.
    pub fn diagnostics(&self) -> &[DiagnosticMessage] {
        &self.diagnostics
    }

    /// Take all collected diagnostics, leaving the context empty.
    pub fn take_diagnostics(&mut self) -> Vec<DiagnosticMessage> {
        std::mem::take(&mut self.diagnostics)
    }

    /// Check if any fatal errors or errors (not warnings) have been collected.
    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(|d| d.kind.is_failure())
    }
}
