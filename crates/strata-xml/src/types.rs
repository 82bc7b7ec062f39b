//! Core types for source-located XML trees.

use strata_error_reporting::SourceLocation;

/// A parsed XML document.
#[derive(Debug, Clone, PartialEq)]
pub struct XmlDocument {
    /// The root element of the document.
    pub root: XmlElement,

    /// Where the document came from (a path or include location), if known.
    pub origin: Option<String>,
}

/// An XML element.
#[derive(Debug, Clone, PartialEq)]
pub struct XmlElement {
    /// The local name of the element (without namespace prefix).
    pub name: String,

    /// Namespace prefix, if any (e.g., "xi" in `<xi:include>`).
    pub prefix: Option<String>,

    /// Attributes of this element, in document order.
    pub attributes: Vec<XmlAttribute>,

    /// Child elements and text, in document order.
    pub children: Vec<XmlChild>,

    /// Location of the start tag's `<`.
    pub location: SourceLocation,
}

/// An XML attribute.
#[derive(Debug, Clone, PartialEq)]
pub struct XmlAttribute {
    /// The local name of the attribute (without namespace prefix).
    pub name: String,

    /// Namespace prefix, if any. Namespace declarations `xmlns:x` have the
    /// prefix `xmlns` and the name `x`.
    pub prefix: Option<String>,

    /// The attribute value (after unescaping XML entities).
    pub value: String,

    /// Location of the attribute name.
    pub location: SourceLocation,
}

/// A child node of an element.
///
/// Comments and processing instructions are not kept. CDATA sections are
/// stored as text.
#[derive(Debug, Clone, PartialEq)]
pub enum XmlChild {
    /// A child element.
    Element(XmlElement),

    /// Text content.
    Text {
        /// The text content.
        content: String,
        /// Location of the first character.
        location: SourceLocation,
    },
}

impl XmlElement {
    /// Create a new element without children.
    pub fn new(
        name: impl Into<String>,
        prefix: Option<String>,
        attributes: Vec<XmlAttribute>,
        location: SourceLocation,
    ) -> Self {
        Self {
            name: name.into(),
            prefix,
            attributes,
            children: Vec::new(),
            location,
        }
    }

    /// The name as written in the source, `prefix:name` or `name`.
    pub fn qualified_name(&self) -> String {
        match &self.prefix {
            Some(prefix) => format!("{}:{}", prefix, self.name),
            None => self.name.clone(),
        }
    }

    /// Get the value of an unprefixed attribute.
    pub fn get_attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.prefix.is_none() && a.name == name)
            .map(|a| a.value.as_str())
    }

    /// Namespace declarations made on this element, as `(prefix, uri)`.
    /// The default namespace has no prefix.
    pub fn namespace_declarations(&self) -> impl Iterator<Item = (Option<&str>, &str)> {
        self.attributes.iter().filter_map(|a| match a.prefix.as_deref() {
            None if a.name == "xmlns" => Some((None, a.value.as_str())),
            Some("xmlns") => Some((Some(a.name.as_str()), a.value.as_str())),
            _ => None,
        })
    }

    /// Child elements, ignoring text.
    pub fn elements(&self) -> impl Iterator<Item = &XmlElement> {
        self.children.iter().filter_map(|c| match c {
            XmlChild::Element(e) => Some(e),
            XmlChild::Text { .. } => None,
        })
    }

    /// Check if this element has no children at all.
    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// Concatenation of the direct text children, untrimmed.
    pub fn text(&self) -> String {
        self.children
            .iter()
            .filter_map(|c| match c {
                XmlChild::Text { content, .. } => Some(content.as_str()),
                XmlChild::Element(_) => None,
            })
            .collect()
    }
}

impl XmlAttribute {
    /// Create a new attribute.
    pub fn new(
        name: impl Into<String>,
        prefix: Option<String>,
        value: impl Into<String>,
        location: SourceLocation,
    ) -> Self {
        Self {
            name: name.into(),
            prefix,
            value: value.into(),
            location,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn element(name: &str, attributes: Vec<XmlAttribute>) -> XmlElement {
        XmlElement::new(name, None, attributes, SourceLocation::default())
    }

    #[test]
    fn test_element_get_attribute() {
        let el = element(
            "test",
            vec![
                XmlAttribute::new("name", None, "value", SourceLocation::default()),
                XmlAttribute::new("lang", Some("xml".into()), "en", SourceLocation::default()),
            ],
        );

        assert_eq!(el.get_attribute("name"), Some("value"));
        assert_eq!(el.get_attribute("lang"), None);
        assert_eq!(el.get_attribute("missing"), None);
    }

    #[test]
    fn test_namespace_declarations() {
        let el = element(
            "root",
            vec![
                XmlAttribute::new("xmlns", None, "urn:default", SourceLocation::default()),
                XmlAttribute::new("xi", Some("xmlns".into()), "urn:xi", SourceLocation::default()),
                XmlAttribute::new("name", None, "x", SourceLocation::default()),
            ],
        );
        let decls: Vec<_> = el.namespace_declarations().collect();
        assert_eq!(decls, vec![(None, "urn:default"), (Some("xi"), "urn:xi")]);
    }

    #[test]
    fn test_text_concatenates_direct_text() {
        let mut el = element("p", vec![]);
        el.children.push(XmlChild::Text {
            content: " a ".into(),
            location: SourceLocation::default(),
        });
        el.children.push(XmlChild::Element(element("b", vec![])));
        el.children.push(XmlChild::Text {
            content: "c".into(),
            location: SourceLocation::default(),
        });

        assert_eq!(el.text(), " a c");
        let names: Vec<_> = el.elements().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["b"]);
    }
}
