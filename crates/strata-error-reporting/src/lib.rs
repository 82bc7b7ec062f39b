//! Error reporting and diagnostic messages for strata.
//!
//! Every failure that reaches a user of the configuration pipeline can be
//! turned into a [`DiagnosticMessage`]: a titled, coded message with an
//! optional problem statement, detail bullets, hints and a source location.
//!
//! - [`DiagnosticMessage`]: The main message structure
//! - [`DiagnosticMessageBuilder`]: Builder encoding the title/problem/details/hints layout
//! - [`DiagnosticKind`]: Fatal, Error, Warning
//! - [`SourceLocation`]: File, line and column a diagnostic points at
//!
//! Error codes follow the `S-<subsystem>-<number>` scheme and are described in
//! an embedded catalog (see [`catalog`]).
//!
//! # Example
//!
//! ```
//! use strata_error_reporting::DiagnosticMessageBuilder;
//!
//! let error = DiagnosticMessageBuilder::error("Parameter Not Found")
//!     .with_code("S-1-1")
//!     .problem("Parameter `db_host` is not defined in the configuration")
//!     .add_hint("Check the spelling of the placeholder?")
//!     .build();
//!
//! assert!(error.to_text().contains("[S-1-1]"));
//! ```

pub mod builder;
pub mod catalog;
pub mod diagnostic;
pub mod location;

pub use builder::DiagnosticMessageBuilder;
pub use catalog::{ERROR_CATALOG, ErrorCodeInfo, get_error_info, get_subsystem};
pub use diagnostic::{DetailItem, DetailKind, DiagnosticKind, DiagnosticMessage};
pub use location::SourceLocation;
