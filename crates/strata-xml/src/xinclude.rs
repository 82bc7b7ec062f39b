//! XInclude processing.
//!
//! `<xi:include href="..."/>` elements (in the `http://www.w3.org/2001/XInclude`
//! namespace) are replaced by the referenced content:
//!
//! - `parse="xml"` (the default) splices in the root element of the included
//!   document, or the elements selected by an `xpointer(/a/b/*)` pointer;
//! - `parse="text"` splices in the resource as a text node.
//!
//! When the resource cannot be loaded, the children of an `xi:fallback` child
//! are used instead. Included documents are processed recursively; a document
//! that includes itself is reported instead of followed.

use crate::{Error, XmlChild, XmlDocument, XmlElement, XmlParseContext, parse_with_context};
use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use strata_error_reporting::SourceLocation;

/// The XInclude namespace.
pub const XINCLUDE_NS: &str = "http://www.w3.org/2001/XInclude";

/// Loads the resources referenced by `href` attributes.
pub trait IncludeResolver {
    /// Turn `href` into the location of a resource. `base` is the location of
    /// the including document, `None` for a document parsed from a string.
    fn locate(&self, href: &str, base: Option<&str>) -> String;

    /// Read the resource at a location returned by [`locate`](Self::locate).
    fn read(&self, location: &str) -> io::Result<String>;
}

/// Reads includes from the filesystem.
///
/// Relative references are resolved against the directory of the including
/// document, or against `base_dir` for documents without a location.
/// A `scheme://` prefix (as in `file:///etc/app.xml`) is dropped and the rest
/// is used as a path.
#[derive(Debug, Clone)]
pub struct FsIncludeResolver {
    base_dir: PathBuf,
}

impl FsIncludeResolver {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }
}

impl Default for FsIncludeResolver {
    fn default() -> Self {
        Self::new(".")
    }
}

impl IncludeResolver for FsIncludeResolver {
    fn locate(&self, href: &str, base: Option<&str>) -> String {
        let path = Path::new(strip_scheme(href));
        let resolved = if path.is_absolute() {
            path.to_path_buf()
        } else {
            base.and_then(|b| Path::new(b).parent())
                .filter(|dir| !dir.as_os_str().is_empty())
                .unwrap_or(&self.base_dir)
                .join(path)
        };
        resolved.to_string_lossy().into_owned()
    }

    fn read(&self, location: &str) -> io::Result<String> {
        std::fs::read_to_string(location)
    }
}

fn strip_scheme(href: &str) -> &str {
    match href.split_once("://") {
        Some((scheme, rest))
            if !scheme.is_empty()
                && scheme
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || "+-.".contains(c)) =>
        {
            rest
        }
        _ => href,
    }
}

/// In-memory include sources, keyed by the exact `href`.
///
/// ```rust
/// use strata_xml::{IncludeResolver, MapIncludeResolver};
///
/// let resolver = MapIncludeResolver::new().with("parts.xml", "<parts/>");
/// let location = resolver.locate("parts.xml", None);
/// assert_eq!(resolver.read(&location).unwrap(), "<parts/>");
/// ```
#[derive(Debug, Clone, Default)]
pub struct MapIncludeResolver {
    sources: HashMap<String, String>,
}

impl MapIncludeResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, href: impl Into<String>, content: impl Into<String>) -> Self {
        self.insert(href, content);
        self
    }

    pub fn insert(&mut self, href: impl Into<String>, content: impl Into<String>) {
        self.sources.insert(href.into(), content.into());
    }
}

impl IncludeResolver for MapIncludeResolver {
    fn locate(&self, href: &str, _base: Option<&str>) -> String {
        href.to_string()
    }

    fn read(&self, location: &str) -> io::Result<String> {
        self.sources.get(location).cloned().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("no source registered for '{}'", location),
            )
        })
    }
}

/// Replace every XInclude element of `doc`, reporting problems to `ctx`.
pub fn process_xincludes(
    doc: &mut XmlDocument,
    resolver: &dyn IncludeResolver,
    ctx: &mut XmlParseContext,
) {
    let mut processor = XIncludeProcessor {
        resolver,
        ctx,
        active: doc.origin.iter().cloned().collect(),
    };
    let root = NamespaceScope::root();
    let scope = root.enter(&doc.root);
    processor.process_children(&mut doc.root, doc.origin.as_deref(), &scope);
}

struct XIncludeProcessor<'a> {
    resolver: &'a dyn IncludeResolver,
    ctx: &'a mut XmlParseContext,
    /// Locations of the documents currently being included.
    active: Vec<String>,
}

/// Outcome of trying to load one include.
enum Loaded {
    Nodes(Vec<XmlChild>),
    Failed(Error),
}

impl XIncludeProcessor<'_> {
    fn process_children(
        &mut self,
        element: &mut XmlElement,
        base: Option<&str>,
        scope: &NamespaceScope<'_>,
    ) {
        let children = std::mem::take(&mut element.children);
        let mut out = Vec::with_capacity(children.len());

        for child in children {
            match child {
                XmlChild::Element(el) if scope.is_xinclude(&el, "include") => {
                    out.extend(self.include(&el, base, &scope.enter(&el)));
                }
                XmlChild::Element(mut el) => {
                    let inner = scope.enter(&el);
                    self.process_children(&mut el, base, &inner);
                    out.push(XmlChild::Element(el));
                }
                text => out.push(text),
            }
        }

        element.children = out;
    }

    fn include(
        &mut self,
        include: &XmlElement,
        base: Option<&str>,
        scope: &NamespaceScope<'_>,
    ) -> Vec<XmlChild> {
        let fallback = include
            .elements()
            .find(|el| scope.is_xinclude(el, "fallback"));

        match self.load(include, base) {
            Loaded::Nodes(nodes) => nodes,
            Loaded::Failed(error) => match fallback {
                Some(fallback) => {
                    tracing::debug!(error = %error, "Using XInclude fallback");
                    let mut fallback = fallback.clone();
                    let inner = scope.enter(&fallback);
                    self.process_children(&mut fallback, base, &inner);
                    fallback.children
                }
                None => {
                    self.ctx.add_diagnostic(error.to_diagnostic());
                    Vec::new()
                }
            },
        }
    }

    fn load(&mut self, include: &XmlElement, base: Option<&str>) -> Loaded {
        let location = Some(include.location.clone());
        let href = include.get_attribute("href").unwrap_or("");
        if href.is_empty() {
            return Loaded::Failed(Error::InvalidInclude {
                message: "Including the current document (empty or missing href) is not supported"
                    .to_string(),
                location,
            });
        }

        let resource = self.resolver.locate(href, base);
        if self.active.contains(&resource) {
            return Loaded::Failed(Error::IncludeRecursion {
                href: href.to_string(),
                location,
            });
        }

        let content = match self.resolver.read(&resource) {
            Ok(content) => content,
            Err(err) => {
                return Loaded::Failed(Error::IncludeNotLoaded {
                    href: href.to_string(),
                    reason: err.to_string(),
                    location,
                });
            }
        };
        tracing::debug!(href, resource = %resource, "Loaded XInclude resource");

        match include.get_attribute("parse").unwrap_or("xml") {
            "text" => Loaded::Nodes(vec![XmlChild::Text {
                content,
                location: SourceLocation::default().with_file(resource),
            }]),
            "xml" => self.load_xml(include, href, &resource, &content),
            other => Loaded::Failed(Error::InvalidInclude {
                message: format!("Unknown parse mode '{}' (expected 'xml' or 'text')", other),
                location,
            }),
        }
    }

    fn load_xml(
        &mut self,
        include: &XmlElement,
        href: &str,
        resource: &str,
        content: &str,
    ) -> Loaded {
        let location = Some(include.location.clone());

        // Parse problems of the included document are reported as they are;
        // the include itself then counts as not loaded.
        let mut nested = XmlParseContext::new();
        let parsed = parse_with_context(content, Some(resource), &mut nested);
        let failed = nested.has_errors();
        for diagnostic in nested.take_diagnostics() {
            self.ctx.add_diagnostic(diagnostic);
        }
        let mut doc = match parsed {
            Some(doc) if !failed => doc,
            _ => {
                return Loaded::Failed(Error::IncludeNotLoaded {
                    href: href.to_string(),
                    reason: "the included document is not well-formed".to_string(),
                    location,
                });
            }
        };

        self.active.push(resource.to_string());
        let root = NamespaceScope::root();
        let scope = root.enter(&doc.root);
        self.process_children(&mut doc.root, Some(resource), &scope);
        self.active.pop();

        let Some(pointer) = include.get_attribute("xpointer") else {
            return Loaded::Nodes(vec![XmlChild::Element(doc.root)]);
        };

        let Some(path) = parse_xpointer(pointer) else {
            return Loaded::Failed(Error::UnsupportedXPointer {
                xpointer: pointer.to_string(),
                location,
            });
        };

        let selected = select(&doc.root, &path);
        if selected.is_empty() {
            return Loaded::Failed(Error::IncludeMatchedNothing {
                href: href.to_string(),
                xpointer: pointer.to_string(),
                location,
            });
        }
        Loaded::Nodes(selected.into_iter().cloned().map(XmlChild::Element).collect())
    }
}

/// One step of a simple absolute path.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Step {
    Name(String),
    Any,
}

/// Parse `xpointer(/a/b/*)` (whitespace allowed inside the parentheses) or a
/// bare `/a/b/*` into path steps.
fn parse_xpointer(pointer: &str) -> Option<Vec<Step>> {
    let pointer = pointer.trim();
    let path = match pointer.strip_prefix("xpointer") {
        Some(rest) => rest
            .trim_start()
            .strip_prefix('(')?
            .strip_suffix(')')?
            .trim(),
        None => pointer,
    };

    let path = path.strip_prefix('/')?;
    path.split('/')
        .map(|step| match step.trim() {
            "" => None,
            "*" => Some(Step::Any),
            name if name.chars().all(|c| c.is_alphanumeric() || "-_.:".contains(c)) => {
                Some(Step::Name(name.to_string()))
            }
            _ => None,
        })
        .collect()
}

/// Elements of the document rooted at `root` selected by `path`.
fn select<'a>(root: &'a XmlElement, path: &[Step]) -> Vec<&'a XmlElement> {
    let Some((first, rest)) = path.split_first() else {
        return Vec::new();
    };
    if !step_matches(first, root) {
        return Vec::new();
    }

    rest.iter().fold(vec![root], |current, step| {
        current
            .into_iter()
            .flat_map(XmlElement::elements)
            .filter(|el| step_matches(step, el))
            .collect()
    })
}

fn step_matches(step: &Step, element: &XmlElement) -> bool {
    match step {
        Step::Any => true,
        Step::Name(name) => *name == element.qualified_name(),
    }
}

/// In-scope namespace bindings, innermost last.
struct NamespaceScope<'a> {
    parent: Option<&'a NamespaceScope<'a>>,
    bindings: Vec<(Option<String>, String)>,
}

impl<'a> NamespaceScope<'a> {
    fn root() -> NamespaceScope<'static> {
        NamespaceScope {
            parent: None,
            bindings: Vec::new(),
        }
    }

    fn enter(&'a self, element: &XmlElement) -> NamespaceScope<'a> {
        NamespaceScope {
            parent: Some(self),
            bindings: element
                .namespace_declarations()
                .map(|(prefix, uri)| (prefix.map(str::to_string), uri.to_string()))
                .collect(),
        }
    }

    fn lookup(&self, prefix: Option<&str>) -> Option<&str> {
        self.bindings
            .iter()
            .rev()
            .find(|(p, _)| p.as_deref() == prefix)
            .map(|(_, uri)| uri.as_str())
            .or_else(|| self.parent.and_then(|parent| parent.lookup(prefix)))
    }

    /// Whether `element` is the XInclude element `local` in this scope. An
    /// undeclared `xi` prefix is taken to mean the XInclude namespace.
    fn is_xinclude(&self, element: &XmlElement, local: &str) -> bool {
        if element.name != local {
            return false;
        }
        let prefix = element.prefix.as_deref();
        match self.lookup(prefix) {
            Some(uri) => uri == XINCLUDE_NS,
            None => prefix == Some("xi"),
        }
    }
}
