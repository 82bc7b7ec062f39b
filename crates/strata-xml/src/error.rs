//! Error types for XML parsing and XInclude processing.

use strata_error_reporting::{DiagnosticMessage, DiagnosticMessageBuilder, SourceLocation};
use thiserror::Error;

/// Result type for parse operations that return diagnostics.
pub type ParseResult<T> = std::result::Result<T, Vec<DiagnosticMessage>>;

/// Problems found while reading an XML document.
///
/// Each variant maps to one `S-2-*` diagnostic. Some are fatal (the parser
/// stops), the others are recorded and parsing carries on; see
/// [`Error::is_fatal`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// XML syntax error from quick-xml.
    #[error("XML syntax error: {message}")]
    XmlSyntax {
        message: String,
        location: Option<SourceLocation>,
    },

    /// Unexpected end of input.
    #[error("Unexpected end of input, expected {expected}")]
    UnexpectedEof {
        /// What was expected when EOF was encountered.
        expected: String,
        location: Option<SourceLocation>,
    },

    /// Mismatched end tag.
    #[error("Mismatched end tag: expected </{expected}>, found </{found}>")]
    MismatchedEndTag {
        /// The expected tag name.
        expected: String,
        /// The actual tag name found.
        found: String,
        location: Option<SourceLocation>,
    },

    /// Invalid XML structure.
    #[error("Invalid XML structure: {message}")]
    InvalidStructure {
        message: String,
        location: Option<SourceLocation>,
    },

    /// Empty document (no root element).
    #[error("Empty XML document: no root element found")]
    EmptyDocument,

    /// Multiple root elements.
    #[error("Invalid XML: multiple root elements")]
    MultipleRoots { location: Option<SourceLocation> },

    /// Elements nested deeper than the parser accepts.
    #[error("Elements nested deeper than {limit} levels")]
    TooDeep {
        limit: usize,
        location: Option<SourceLocation>,
    },

    /// An included resource could not be read or parsed, and there was no fallback.
    #[error("Could not load XInclude resource '{href}': {reason}")]
    IncludeNotLoaded {
        href: String,
        reason: String,
        location: Option<SourceLocation>,
    },

    /// A document includes itself, directly or through other includes.
    #[error("Recursive XInclude of '{href}'")]
    IncludeRecursion {
        href: String,
        location: Option<SourceLocation>,
    },

    /// The xpointer selected no element of the included document.
    #[error("XPointer '{xpointer}' matched nothing in '{href}'")]
    IncludeMatchedNothing {
        href: String,
        xpointer: String,
        location: Option<SourceLocation>,
    },

    /// The xpointer uses a scheme or syntax that is not supported.
    #[error("Unsupported XPointer '{xpointer}'")]
    UnsupportedXPointer {
        xpointer: String,
        location: Option<SourceLocation>,
    },

    /// An include element is malformed (missing href, unknown parse mode).
    #[error("Invalid XInclude: {message}")]
    InvalidInclude {
        message: String,
        location: Option<SourceLocation>,
    },
}

impl Error {
    /// Whether the parser stops after this error.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Error::XmlSyntax { .. }
                | Error::UnexpectedEof { .. }
                | Error::EmptyDocument
                | Error::MultipleRoots { .. }
                | Error::TooDeep { .. }
        )
    }

    /// Convert this error to a DiagnosticMessage with the appropriate S-2-* error code.
    pub fn to_diagnostic(&self) -> DiagnosticMessage {
        let (builder, location) = match self {
            Error::XmlSyntax { message, location } => (
                DiagnosticMessageBuilder::fatal("XML Syntax Error")
                    .with_code("S-2-1")
                    .problem(message.clone()),
                location,
            ),

            Error::UnexpectedEof { expected, location } => (
                DiagnosticMessageBuilder::fatal("Unexpected End of XML Input")
                    .with_code("S-2-2")
                    .problem(format!(
                        "The XML document ended unexpectedly; expected {}",
                        expected
                    )),
                location,
            ),

            Error::MismatchedEndTag {
                expected,
                found,
                location,
            } => (
                DiagnosticMessageBuilder::coded_error("S-2-3")
                    .problem(format!(
                        "End tag </{}> does not match start tag <{}>",
                        found, expected
                    ))
                    .add_detail(format!("Expected: </{}>", expected))
                    .add_detail(format!("Found: </{}>", found))
                    .add_hint("Check that all opening tags have matching closing tags?"),
                location,
            ),

            Error::InvalidStructure { message, location } => (
                DiagnosticMessageBuilder::coded_error("S-2-4")
                    .problem(message.clone()),
                location,
            ),

            Error::EmptyDocument => (
                DiagnosticMessageBuilder::fatal("Empty XML Document")
                    .with_code("S-2-5")
                    .problem("The XML document contains no root element")
                    .add_hint("Add a root element to the document?"),
                &None,
            ),

            Error::MultipleRoots { location } => (
                DiagnosticMessageBuilder::fatal("Multiple XML Root Elements")
                    .with_code("S-2-6")
                    .problem("The XML document contains multiple root elements")
                    .add_detail("XML documents must have exactly one root element")
                    .add_hint("Wrap multiple elements in a single container element?"),
                location,
            ),

            Error::TooDeep { limit, location } => (
                DiagnosticMessageBuilder::fatal("XML Nesting Too Deep")
                    .with_code("S-2-13")
                    .problem(format!("Elements are nested deeper than {} levels", limit))
                    .add_hint("Flatten the configuration structure?"),
                location,
            ),

            Error::IncludeNotLoaded {
                href,
                reason,
                location,
            } => (
                DiagnosticMessageBuilder::coded_error("S-2-8")
                    .problem(format!("Could not load include `{}`", href))
                    .add_detail(reason.clone())
                    .add_hint("Add an `xi:fallback` child to tolerate a missing resource?"),
                location,
            ),

            Error::IncludeRecursion { href, location } => (
                DiagnosticMessageBuilder::coded_error("S-2-9")
                    .problem(format!("Inclusion of `{}` loops back to itself", href)),
                location,
            ),

            Error::IncludeMatchedNothing {
                href,
                xpointer,
                location,
            } => (
                DiagnosticMessageBuilder::warning("XInclude Matched Nothing")
                    .with_code("S-2-10")
                    .problem(format!(
                        "The pointer `{}` selected no elements of `{}`",
                        xpointer, href
                    )),
                location,
            ),

            Error::UnsupportedXPointer { xpointer, location } => (
                DiagnosticMessageBuilder::coded_error("S-2-11")
                    .problem(format!("Cannot evaluate the pointer `{}`", xpointer))
                    .add_info("Supported form: `xpointer(/root/child/*)`"),
                location,
            ),

            Error::InvalidInclude { message, location } => (
                DiagnosticMessageBuilder::coded_error("S-2-12")
                    .problem(message.clone()),
                location,
            ),
        };

        match location {
            Some(loc) => builder.with_location(loc.clone()).build(),
            None => builder.build(),
        }
    }
}

impl From<quick_xml::Error> for Error {
    fn from(err: quick_xml::Error) -> Self {
        Error::XmlSyntax {
            message: err.to_string(),
            location: None,
        }
    }
}

impl From<quick_xml::events::attributes::AttrError> for Error {
    fn from(err: quick_xml::events::attributes::AttrError) -> Self {
        Error::XmlSyntax {
            message: format!("Attribute error: {}", err),
            location: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_error_reporting::DiagnosticKind;

    #[test]
    fn test_error_to_diagnostic_codes() {
        let cases = [
            (Error::EmptyDocument, "S-2-5", DiagnosticKind::Fatal),
            (Error::MultipleRoots { location: None }, "S-2-6", DiagnosticKind::Fatal),
            (
                Error::TooDeep {
                    limit: 256,
                    location: None,
                },
                "S-2-13",
                DiagnosticKind::Fatal,
            ),
            (
                Error::UnexpectedEof {
                    expected: "closing tag".to_string(),
                    location: None,
                },
                "S-2-2",
                DiagnosticKind::Fatal,
            ),
            (
                Error::MismatchedEndTag {
                    expected: "root".to_string(),
                    found: "other".to_string(),
                    location: None,
                },
                "S-2-3",
                DiagnosticKind::Error,
            ),
            (
                Error::InvalidStructure {
                    message: "test".to_string(),
                    location: None,
                },
                "S-2-4",
                DiagnosticKind::Error,
            ),
            (
                Error::XmlSyntax {
                    message: "test".to_string(),
                    location: None,
                },
                "S-2-1",
                DiagnosticKind::Fatal,
            ),
            (
                Error::IncludeMatchedNothing {
                    href: "a.xml".to_string(),
                    xpointer: "/x/*".to_string(),
                    location: None,
                },
                "S-2-10",
                DiagnosticKind::Warning,
            ),
        ];

        for (err, code, kind) in cases {
            let diag = err.to_diagnostic();
            assert_eq!(diag.code.as_deref(), Some(code), "{:?}", err);
            assert_eq!(diag.kind, kind, "{:?}", err);
            assert_eq!(err.is_fatal(), kind == DiagnosticKind::Fatal);
        }
    }

    #[test]
    fn test_mismatched_end_tag_diagnostic_text() {
        let err = Error::MismatchedEndTag {
            expected: "titles".to_string(),
            found: "title".to_string(),
            location: Some(SourceLocation::from_offset("<titles>Star Wars</title>", 17)),
        };
        insta::assert_snapshot!(err.to_diagnostic().to_text(), @r"
        Error [S-2-3]: Mismatched XML End Tag
          at 1:18
        End tag </title> does not match start tag <titles>
        ✖ Expected: </titles>
        ✖ Found: </title>
        ? Check that all opening tags have matching closing tags?
        ");
    }
}
