//! Conversion of XML documents into configuration trees.

use crate::{
    FsIncludeResolver, IncludeResolver, XmlElement, XmlParseContext, parse_with_context,
    process_xincludes,
};
use std::fmt::Write;
use strata_error_reporting::DiagnosticMessage;
use strata_value::{Key, Mapping, Value, coerce_scalar, looks_like_integer};
use thiserror::Error;

/// Why an XML string could not be converted.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConvertError {
    /// Non-empty input that does not start with `<`.
    #[error("Invalid xml content")]
    InvalidXmlContent,

    /// The parser or the XInclude pass reported at least one diagnostic.
    #[error("{}", render_diagnostics(.0))]
    XmlParse(Vec<DiagnosticMessage>),
}

impl ConvertError {
    /// The diagnostics behind an [`ConvertError::XmlParse`], empty otherwise.
    pub fn diagnostics(&self) -> &[DiagnosticMessage] {
        match self {
            ConvertError::InvalidXmlContent => &[],
            ConvertError::XmlParse(diagnostics) => diagnostics,
        }
    }
}

fn render_diagnostics(diagnostics: &[DiagnosticMessage]) -> String {
    let mut message = String::from(if diagnostics.len() == 1 {
        "An error occurred while parsing XML configuration file:"
    } else {
        "Some errors occurred while parsing XML configuration file:"
    });
    for diagnostic in diagnostics {
        let _ = write!(message, "\n - {}", diagnostic);
        if let Some(location) = &diagnostic.location {
            let _ = write!(message, " (at {})", location);
        }
    }
    message
}

/// Options of an [`XmlConverter`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConvertOptions {
    /// Keep the root element as the single top-level key instead of
    /// discarding it.
    pub preserve_first_tag: bool,
}

/// Turns XML text into a [`Mapping`].
///
/// The root element is dropped and its children become the top-level keys.
/// Leaf elements become scalars (see [`coerce_scalar`]), attributes are folded
/// in as extra keys, an `id` attribute renames the element's key, and repeated
/// names collect into a sequence.
///
/// ```rust
/// use strata_value::mapping;
/// use strata_xml::XmlConverter;
///
/// let tree = XmlConverter::new()
///     .convert(r#"<config><db host="localhost"><port>5432</port></db></config>"#)
///     .unwrap();
///
/// assert_eq!(
///     tree,
///     mapping! { "db" => mapping! { "port" => 5432, "host" => "localhost" } }
/// );
/// ```
pub struct XmlConverter {
    options: ConvertOptions,
    resolver: Box<dyn IncludeResolver>,
}

impl Default for XmlConverter {
    fn default() -> Self {
        Self::new()
    }
}

impl XmlConverter {
    /// A converter with default options, resolving includes from the current
    /// directory.
    pub fn new() -> Self {
        Self {
            options: ConvertOptions::default(),
            resolver: Box::new(FsIncludeResolver::default()),
        }
    }

    pub fn with_options(mut self, options: ConvertOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_resolver(mut self, resolver: impl IncludeResolver + 'static) -> Self {
        self.resolver = Box::new(resolver);
        self
    }

    pub fn options(&self) -> ConvertOptions {
        self.options
    }

    /// Convert an XML string.
    ///
    /// # Errors
    ///
    /// [`ConvertError::InvalidXmlContent`] when the text does not start with
    /// `<`, [`ConvertError::XmlParse`] when parsing or include processing
    /// reported anything, warnings included.
    pub fn convert(&self, xml: &str) -> Result<Mapping, ConvertError> {
        self.convert_document(xml, None)
    }

    /// Convert an XML string read from `origin`.
    ///
    /// Relative includes are resolved against the directory of `origin`, and
    /// diagnostic locations name it.
    pub fn convert_document(
        &self,
        xml: &str,
        origin: Option<&str>,
    ) -> Result<Mapping, ConvertError> {
        if xml.is_empty() {
            return Ok(Mapping::new());
        }
        if !xml.starts_with('<') {
            return Err(ConvertError::InvalidXmlContent);
        }

        let mut ctx = XmlParseContext::new();
        let doc = parse_with_context(xml, origin, &mut ctx).map(|mut doc| {
            process_xincludes(&mut doc, self.resolver.as_ref(), &mut ctx);
            doc
        });

        let doc = match doc {
            Some(doc) if !ctx.has_diagnostics() => doc,
            _ => return Err(ConvertError::XmlParse(ctx.take_diagnostics())),
        };

        tracing::debug!(
            root = %doc.root.name,
            origin = origin.unwrap_or("<string>"),
            "Converting XML document"
        );

        if self.options.preserve_first_tag {
            let mut out = Mapping::new();
            insert_child(&mut out, &doc.root);
            Ok(out)
        } else {
            Ok(convert_children(&doc.root))
        }
    }
}

fn convert_children(element: &XmlElement) -> Mapping {
    let mut out = Mapping::new();
    for child in element.elements().filter(|e| e.prefix.is_none()) {
        insert_child(&mut out, child);
    }
    out
}

/// Convert `child` and add it to `parent` under its tag name or `id`.
fn insert_child(parent: &mut Mapping, child: &XmlElement) {
    let children = convert_children(child);
    let mut value = if children.is_empty() {
        coerce_scalar(&child.text())
    } else {
        Value::Mapping(children)
    };
    let mut key = Key::string(&child.name);

    for attr in child.attributes.iter().filter(|a| a.prefix.is_none()) {
        if attr.name == "xmlns" {
            continue;
        }
        if attr.name == "id" {
            key = id_key(&attr.value);
            continue;
        }
        if !matches!(value, Value::Mapping(_)) {
            value = Value::Mapping(Mapping::new());
        }
        if let Value::Mapping(map) = &mut value {
            map.insert(Key::string(&attr.name), coerce_scalar(&attr.value));
        }
    }

    match parent.get_mut(&key) {
        None => {
            parent.insert(key, value);
        }
        Some(Value::Sequence(items)) => items.push(value),
        Some(existing) => {
            let first = std::mem::take(existing);
            *existing = Value::Sequence(vec![first, value]);
        }
    }
}

fn id_key(id: &str) -> Key {
    if looks_like_integer(id) {
        if let Ok(i) = id.parse::<i64>() {
            return Key::Int(i);
        }
    }
    Key::string(id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_value::mapping;

    fn convert(xml: &str) -> Mapping {
        XmlConverter::new().convert(xml).unwrap()
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(convert(""), Mapping::new());
    }

    #[test]
    fn test_invalid_content() {
        let err = XmlConverter::new().convert("no xml").unwrap_err();
        assert_eq!(err, ConvertError::InvalidXmlContent);
        assert!(err.diagnostics().is_empty());
    }

    #[test]
    fn test_leaf_coercion() {
        let tree = convert(
            "<c><level>300</level><pct>32.5</pct><on>True</on><name> x </name><empty/></c>",
        );
        assert_eq!(
            tree,
            mapping! {
                "level" => 300,
                "pct" => 32.5,
                "on" => true,
                "name" => " x ",
                "empty" => "",
            }
        );
    }

    #[test]
    fn test_attributes_replace_text() {
        let tree = convert(r#"<c><logger name="main">ignored</logger></c>"#);
        assert_eq!(tree, mapping! { "logger" => mapping! { "name" => "main" } });
    }

    #[test]
    fn test_id_attribute_becomes_key() {
        let tree = convert(
            r#"<movies><movie><actor id="actorH" name="Harrison Ford"/></movie></movies>"#,
        );
        assert_eq!(
            tree,
            mapping! { "movie" => mapping! { "actorH" => mapping! { "name" => "Harrison Ford" } } }
        );
    }

    #[test]
    fn test_numeric_id_is_integer_key() {
        let tree = convert(r#"<c><item id="3">x</item><item id="a3">y</item></c>"#);
        let keys: Vec<_> = tree.keys().cloned().collect();
        assert_eq!(keys, vec![Key::Int(3), Key::string("a3")]);
    }

    #[test]
    fn test_repeated_names_collect_into_sequence() {
        let tree = convert("<c><v>1</v><v>2</v><v>3</v></c>");
        assert_eq!(
            tree.get("v"),
            Some(&Value::Sequence(vec![Value::Int(1), Value::Int(2), Value::Int(3)]))
        );
    }

    #[test]
    fn test_prefixed_nodes_are_skipped() {
        let tree = convert(
            r#"<c xmlns:x="urn:x" xmlns="urn:d"><x:skip>1</x:skip><keep xml:lang="en" a="1"/></c>"#,
        );
        assert_eq!(tree, mapping! { "keep" => mapping! { "a" => 1 } });
    }

    #[test]
    fn test_preserve_first_tag() {
        let converter = XmlConverter::new().with_options(ConvertOptions {
            preserve_first_tag: true,
        });
        let tree = converter
            .convert(r#"<config version="2"><debug>false</debug></config>"#)
            .unwrap();
        assert_eq!(
            tree,
            mapping! { "config" => mapping! { "debug" => false, "version" => 2 } }
        );
    }

    #[test]
    fn test_single_error_message() {
        let err = XmlConverter::new()
            .convert("<movies><titles>Star Wars</title></movies>")
            .unwrap_err();
        insta::assert_snapshot!(err.to_string(), @r"
        An error occurred while parsing XML configuration file:
         - Error S-2-3: End tag </title> does not match start tag <titles> (at 1:26)
        ");
    }

    #[test]
    fn test_repeated_name_over_mapping_with_zero_key() {
        // Only a sequence is appended to; a mapping keyed `0` is wrapped.
        let tree = convert(r#"<c><a><x id="0">first</x></a><a>second</a></c>"#);
        assert_eq!(
            tree.get("a"),
            Some(&Value::Sequence(vec![
                Value::Mapping(mapping! { Key::Int(0) => "first" }),
                Value::from("second"),
            ]))
        );
    }

    #[test]
    fn test_deep_nesting_is_a_parse_error() {
        let xml = format!("{}{}", "<a>".repeat(20_000), "</a>".repeat(20_000));
        let err = XmlConverter::new().convert(&xml).unwrap_err();
        let codes: Vec<_> = err
            .diagnostics()
            .iter()
            .map(|d| d.code.as_deref().unwrap_or(""))
            .collect();
        assert_eq!(codes, ["S-2-13"]);
    }
}
