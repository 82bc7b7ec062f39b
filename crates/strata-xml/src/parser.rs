//! XML parser that builds [`XmlDocument`] trees.

use crate::{Error, ParseResult, XmlAttribute, XmlChild, XmlDocument, XmlElement, XmlParseContext};
use quick_xml::Reader;
use quick_xml::escape::resolve_predefined_entity;
use quick_xml::events::{BytesCData, BytesEnd, BytesStart, BytesText, Event};
use std::collections::HashMap;
use strata_error_reporting::SourceLocation;

/// Deepest element nesting accepted, the default limit of libxml2.
pub const MAX_DEPTH: usize = 256;

/// Parse XML from a string.
///
/// Succeeds only when the document produced no diagnostic at all.
///
/// # Example
///
/// ```rust
/// use strata_xml::parse;
///
/// let doc = parse("<root><child/></root>").unwrap();
/// assert_eq!(doc.root.name, "root");
/// ```
///
/// # Errors
///
/// Returns every diagnostic found, in document order.
pub fn parse(content: &str) -> ParseResult<XmlDocument> {
    let mut ctx = XmlParseContext::new();
    match parse_with_context(content, None, &mut ctx) {
        Some(doc) if !ctx.has_diagnostics() => Ok(doc),
        _ => Err(ctx.take_diagnostics()),
    }
}

/// Parse XML from a string, collecting diagnostics into `ctx`.
///
/// `origin` names the document in diagnostic locations. Recoverable problems
/// (such as a mismatched end tag) are reported and parsing continues, so the
/// returned document may exist even though `ctx` holds errors. `None` means a
/// fatal error stopped the parser.
pub fn parse_with_context(
    content: &str,
    origin: Option<&str>,
    ctx: &mut XmlParseContext,
) -> Option<XmlDocument> {
    let mut parser = XmlParser::new(content, origin);
    let result = parser.parse();

    for error in parser.errors.drain(..) {
        ctx.add_diagnostic(error.to_diagnostic());
    }

    match result {
        Ok(doc) => Some(doc),
        Err(fatal) => {
            ctx.add_diagnostic(fatal.to_diagnostic());
            None
        }
    }
}

/// Internal parser state.
struct XmlParser<'a> {
    /// The source content being parsed.
    source: &'a str,

    /// The quick-xml reader.
    reader: Reader<&'a [u8]>,

    /// Name of the document for diagnostics.
    origin: Option<&'a str>,

    /// Stack of elements being built.
    stack: Vec<BuildNode>,

    /// Recoverable errors found so far.
    errors: Vec<Error>,

    /// General entities declared in the internal DTD subset.
    entities: HashMap<String, String>,
}

/// A node being constructed during parsing.
struct BuildNode {
    name: String,
    prefix: Option<String>,
    attributes: Vec<XmlAttribute>,
    location: SourceLocation,
    children: Vec<XmlChild>,
}

impl BuildNode {
    fn qualified_name(&self) -> String {
        match &self.prefix {
            Some(prefix) => format!("{}:{}", prefix, self.name),
            None => self.name.clone(),
        }
    }

    fn finish(self) -> XmlElement {
        XmlElement {
            name: self.name,
            prefix: self.prefix,
            attributes: self.attributes,
            children: self.children,
            location: self.location,
        }
    }
}

impl<'a> XmlParser<'a> {
    fn new(source: &'a str, origin: Option<&'a str>) -> Self {
        let mut reader = Reader::from_str(source);
        reader.config_mut().trim_text_start = false;
        reader.config_mut().trim_text_end = false;
        // End tags are matched here so that a mismatch can be reported and
        // parsing can go on.
        reader.config_mut().check_end_names = false;

        Self {
            source,
            reader,
            origin,
            stack: Vec::new(),
            errors: Vec::new(),
            entities: HashMap::new(),
        }
    }

    fn parse(&mut self) -> Result<XmlDocument, Error> {
        let mut root: Option<XmlElement> = None;

        loop {
            // Capture position before reading the event
            let event_start = self.reader.buffer_position() as usize;

            match self.reader.read_event() {
                Ok(Event::Start(e)) => {
                    self.check_depth(event_start)?;
                    let node = self.start_node(&e, event_start)?;
                    self.stack.push(node);
                }
                Ok(Event::End(e)) => {
                    if let Some(element) = self.handle_end(&e, event_start) {
                        self.attach(element, &mut root)?;
                    }
                }
                Ok(Event::Empty(e)) => {
                    self.check_depth(event_start)?;
                    let element = self.start_node(&e, event_start)?.finish();
                    self.attach(element, &mut root)?;
                }
                Ok(Event::Text(e)) => {
                    self.handle_text(&e, event_start)?;
                }
                Ok(Event::CData(e)) => {
                    self.handle_cdata(&e, event_start);
                }
                Ok(Event::DocType(e)) => {
                    for (name, value) in entity_declarations(&String::from_utf8_lossy(&e)) {
                        self.entities.entry(name).or_insert(value);
                    }
                }
                Ok(Event::Comment(_) | Event::PI(_) | Event::Decl(_)) => {}
                Ok(Event::Eof) => break,
                Err(e) => {
                    return Err(Error::XmlSyntax {
                        message: e.to_string(),
                        location: Some(self.locate(self.reader.error_position() as usize)),
                    });
                }
            }
        }

        // Check for unclosed elements
        if let Some(node) = self.stack.last() {
            return Err(Error::UnexpectedEof {
                expected: format!("closing tag </{}>", node.qualified_name()),
                location: Some(node.location.clone()),
            });
        }

        let root = root.ok_or(Error::EmptyDocument)?;
        tracing::debug!(
            origin = self.origin.unwrap_or("<string>"),
            root = %root.name,
            errors = self.errors.len(),
            "Parsed XML document"
        );

        Ok(XmlDocument {
            root,
            origin: self.origin.map(str::to_string),
        })
    }

    /// Refuse an element that would sit below [`MAX_DEPTH`] open ancestors.
    fn check_depth(&self, event_start: usize) -> Result<(), Error> {
        if self.stack.len() < MAX_DEPTH {
            return Ok(());
        }
        Err(Error::TooDeep {
            limit: MAX_DEPTH,
            location: Some(self.locate(event_start)),
        })
    }

    fn resolve_entity(&self, name: &str) -> Option<&str> {
        resolve_predefined_entity(name).or_else(|| self.entities.get(name).map(String::as_str))
    }

    /// Add a finished element to its parent, or make it the root.
    fn attach(&mut self, element: XmlElement, root: &mut Option<XmlElement>) -> Result<(), Error> {
        match self.stack.last_mut() {
            Some(parent) => parent.children.push(XmlChild::Element(element)),
            None if root.is_some() => {
                return Err(Error::MultipleRoots {
                    location: Some(element.location),
                });
            }
            None => *root = Some(element),
        }
        Ok(())
    }

    fn start_node(&self, e: &BytesStart<'_>, event_start: usize) -> Result<BuildNode, Error> {
        let (name, prefix) = split_name(&String::from_utf8_lossy(e.name().as_ref()));
        let attributes = self.parse_attributes(e, event_start)?;

        Ok(BuildNode {
            name,
            prefix,
            attributes,
            location: self.locate(event_start),
            children: Vec::new(),
        })
    }

    /// Close the innermost open element.
    ///
    /// A mismatched end tag still closes the innermost element; the mismatch
    /// is recorded. An end tag with nothing open is recorded and ignored.
    fn handle_end(&mut self, e: &BytesEnd<'_>, event_start: usize) -> Option<XmlElement> {
        let found = String::from_utf8_lossy(e.name().as_ref()).into_owned();
        let location = Some(self.locate(event_start));

        let Some(node) = self.stack.pop() else {
            self.errors.push(Error::InvalidStructure {
                message: format!("Unexpected closing tag </{}>", found),
                location,
            });
            return None;
        };

        let expected = node.qualified_name();
        if expected != found {
            self.errors.push(Error::MismatchedEndTag {
                expected,
                found,
                location,
            });
        }

        Some(node.finish())
    }

    fn handle_text(&mut self, e: &BytesText<'_>, event_start: usize) -> Result<(), Error> {
        let location = self.locate(event_start);
        let text = e
            .unescape_with(|name| self.resolve_entity(name))
            .map(|text| text.into_owned())
            .map_err(|err| Error::XmlSyntax {
                message: format!("Invalid text content: {}", err),
                location: Some(location.clone()),
            })?;

        match self.stack.last_mut() {
            Some(node) => node.children.push(XmlChild::Text {
                content: text,
                location,
            }),
            None if !text.trim().is_empty() => self.errors.push(Error::InvalidStructure {
                message: "Text content outside of the root element".to_string(),
                location: Some(location),
            }),
            None => {}
        }
        Ok(())
    }

    fn handle_cdata(&mut self, e: &BytesCData<'_>, event_start: usize) {
        let content = String::from_utf8_lossy(e.as_ref()).into_owned();
        let location = self.locate(event_start);

        match self.stack.last_mut() {
            Some(node) => node.children.push(XmlChild::Text { content, location }),
            None => self.errors.push(Error::InvalidStructure {
                message: "CDATA section outside of the root element".to_string(),
                location: Some(location),
            }),
        }
    }

    fn parse_attributes(
        &self,
        e: &BytesStart<'_>,
        tag_start: usize,
    ) -> Result<Vec<XmlAttribute>, Error> {
        let mut attributes = Vec::new();

        // Raw tag content, after '<': the element name followed by attributes
        let tag_str = String::from_utf8_lossy(e.as_ref());
        let mut search_from = e.name().as_ref().len();

        for attr_result in e.attributes() {
            let attr = attr_result.map_err(|err| Error::XmlSyntax {
                message: format!("Attribute error: {}", err),
                location: Some(self.locate(tag_start)),
            })?;

            let full_name = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
            let value = attr
                .unescape_value_with(|name| self.resolve_entity(name))
                .map_err(|err| Error::XmlSyntax {
                    message: format!("Invalid attribute value: {}", err),
                    location: Some(self.locate(tag_start)),
                })?;

            let offset = match find_attribute(&tag_str, search_from, &full_name) {
                Some(pos) => {
                    search_from = pos + full_name.len();
                    tag_start + 1 + pos
                }
                None => tag_start,
            };

            let (name, prefix) = split_name(&full_name);
            attributes.push(XmlAttribute {
                name,
                prefix,
                value: value.into_owned(),
                location: self.locate(offset),
            });
        }

        Ok(attributes)
    }

    fn locate(&self, offset: usize) -> SourceLocation {
        let location = SourceLocation::from_offset(self.source, offset);
        match self.origin {
            Some(origin) => location.with_file(origin),
            None => location,
        }
    }
}

/// `(name, replacement)` of the internal general entities declared in the
/// body of a `<!DOCTYPE>`.
///
/// Parameter entities and external (`SYSTEM`/`PUBLIC`) entities are skipped.
/// Replacement text is used as plain text: markup inside it is not parsed.
fn entity_declarations(doctype: &str) -> Vec<(String, String)> {
    const KEYWORD: &str = "<!ENTITY";
    let mut declarations = Vec::new();
    let mut rest = doctype;

    while let Some(pos) = rest.find(KEYWORD) {
        rest = rest[pos + KEYWORD.len()..].trim_start();
        if rest.starts_with('%') {
            continue;
        }

        let name_end = rest.find(char::is_whitespace).unwrap_or(rest.len());
        let (name, tail) = rest.split_at(name_end);
        let tail = tail.trim_start();
        let Some(quote) = tail.chars().next().filter(|c| *c == '"' || *c == '\'') else {
            rest = tail;
            continue;
        };
        let body = &tail[1..];
        let Some(close) = body.find(quote) else {
            break;
        };
        declarations.push((name.to_string(), body[..close].to_string()));
        rest = &body[close + 1..];
    }

    declarations
}

/// Split `prefix:name` into its local name and prefix.
fn split_name(full_name: &str) -> (String, Option<String>) {
    match full_name.split_once(':') {
        Some((prefix, local)) => (local.to_string(), Some(prefix.to_string())),
        None => (full_name.to_string(), None),
    }
}

/// Byte position of the attribute `name` within a raw tag, starting the
/// search at `from`. Only matches preceded by whitespace and followed by `=`
/// count, so values that contain the name are skipped.
fn find_attribute(tag: &str, from: usize, name: &str) -> Option<usize> {
    let area = tag.get(from..)?;
    area.match_indices(name).map(|(i, _)| from + i).find(|&pos| {
        let before_ok = tag[..pos].ends_with(|c: char| c.is_ascii_whitespace());
        let after_ok = tag[pos + name.len()..].trim_start().starts_with('=');
        before_ok && after_ok
    })
}
