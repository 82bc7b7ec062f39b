//! XML configuration support for strata.
//!
//! This crate reads XML configuration files into the [`strata_value::Mapping`]
//! tree shared by every strata loader. It has three layers:
//!
//! - [`parse`]: a [`quick-xml`] based parser building a tree of
//!   [`XmlElement`]s with source locations. Recoverable problems such as a
//!   mismatched end tag are collected, so one pass reports all of them.
//!   Elements may nest [`parser::MAX_DEPTH`] levels deep. General entities
//!   declared in the internal DTD subset are expanded as plain text; external
//!   DTDs and parameter entities are not read.
//! - [`process_xincludes`]: replaces `xi:include` elements with the documents
//!   (or the parts of documents) they reference.
//! - [`XmlConverter`]: turns the resulting tree into a [`strata_value::Mapping`].
//!
//! # Example
//!
//! ```rust
//! use strata_value::mapping;
//! use strata_xml::{MapIncludeResolver, XmlConverter};
//!
//! let resolver = MapIncludeResolver::new()
//!     .with("tables.xml", "<database><table><name>book</name></table></database>");
//!
//! let tree = XmlConverter::new()
//!     .with_resolver(resolver)
//!     .convert(
//!         r#"<config xmlns:xi="http://www.w3.org/2001/XInclude">
//!              <xi:include href="tables.xml" xpointer="xpointer(/database/*)"/>
//!            </config>"#,
//!     )
//!     .unwrap();
//!
//! assert_eq!(tree, mapping! { "table" => mapping! { "name" => "book" } });
//! ```
//!
//! [`quick-xml`]: https://docs.rs/quick-xml

pub mod context;
pub mod convert;
pub mod error;
pub mod parser;
pub mod types;
pub mod xinclude;

pub use context::XmlParseContext;
pub use convert::{ConvertError, ConvertOptions, XmlConverter};
pub use error::{Error, ParseResult};
pub use parser::{parse, parse_with_context};
pub use types::{XmlAttribute, XmlChild, XmlDocument, XmlElement};
pub use xinclude::{
    FsIncludeResolver, IncludeResolver, MapIncludeResolver, XINCLUDE_NS, process_xincludes,
};
