use std::fs;
use std::path::Path;

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use crate::element::{XmlDocument, XmlElement};
use crate::error::XmlError;

// -----------------------------------------------------------------------------
// Parsing

impl XmlDocument {
    /// Parses a document from a string.
    ///
    /// Accepts exactly one root element; text content, CDATA, and multiple
    /// roots are rejected as malformed. Comments, processing instructions,
    /// and the XML declaration are skipped.
    ///
    /// # Examples
    ///
    /// ```
    /// use ogx_xml::XmlDocument;
    ///
    /// let document = XmlDocument::parse_str(
    ///     r#"<objects rootObject="1"><object id="1" type="String" value="hi"/></objects>"#,
    /// )
    /// .unwrap();
    ///
    /// assert_eq!(document.root().name(), "objects");
    /// assert_eq!(document.root().children()[0].attribute("value"), Some("hi"));
    /// ```
    pub fn parse_str(text: &str) -> Result<Self, XmlError> {
        let mut reader = Reader::from_str(text);
        reader.config_mut().trim_text(true);

        let mut stack: Vec<XmlElement> = Vec::new();
        let mut root: Option<XmlElement> = None;

        loop {
            match reader.read_event().map_err(XmlError::parse)? {
                Event::Start(start) => {
                    stack.push(element_from_start(&start)?);
                }
                Event::Empty(start) => {
                    let element = element_from_start(&start)?;
                    attach(&mut stack, &mut root, element)?;
                }
                Event::End(_) => {
                    // The parser has already matched the end tag.
                    let element = stack
                        .pop()
                        .ok_or_else(|| XmlError::malformed("unmatched end tag"))?;
                    attach(&mut stack, &mut root, element)?;
                }
                Event::Text(text) => {
                    let text = text.unescape().map_err(XmlError::parse)?;
                    if !text.trim().is_empty() {
                        return Err(XmlError::malformed("text content is not supported"));
                    }
                }
                Event::CData(_) => {
                    return Err(XmlError::malformed("CDATA content is not supported"));
                }
                Event::Eof => break,
                // Declaration, comments, PIs, doctype.
                _ => {}
            }
        }

        if !stack.is_empty() {
            return Err(XmlError::malformed("unclosed element at end of input"));
        }
        root.map(XmlDocument::new)
            .ok_or_else(|| XmlError::malformed("document has no root element"))
    }

    /// Reads and parses a document from a file.
    pub fn parse_file(path: impl AsRef<Path>) -> Result<Self, XmlError> {
        let text = fs::read_to_string(path)?;
        Self::parse_str(&text)
    }
}

fn element_from_start(start: &BytesStart<'_>) -> Result<XmlElement, XmlError> {
    let name = str::from_utf8(start.name().as_ref())
        .map_err(XmlError::encoding)?
        .to_string();
    let mut element = XmlElement::new(name);
    for attribute in start.attributes() {
        let attribute = attribute.map_err(XmlError::parse)?;
        let key = str::from_utf8(attribute.key.as_ref())
            .map_err(XmlError::encoding)?
            .to_string();
        let value = attribute.unescape_value().map_err(XmlError::parse)?;
        element.set_attribute(key, value.into_owned());
    }
    Ok(element)
}

fn attach(
    stack: &mut [XmlElement],
    root: &mut Option<XmlElement>,
    element: XmlElement,
) -> Result<(), XmlError> {
    match stack.last_mut() {
        Some(parent) => {
            parent.push_child(element);
            Ok(())
        }
        None if root.is_some() => Err(XmlError::malformed("more than one root element")),
        None => {
            *root = Some(element);
            Ok(())
        }
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use crate::element::XmlDocument;
    use crate::error::XmlError;

    #[test]
    fn parses_nested_elements_and_attributes() {
        let document = XmlDocument::parse_str(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<objects rootObject="1">
  <object id="1" type="Person">
    <field name="firstName" referencedObject="2"/>
  </object>
  <object id="2" type="String" value="John"/>
</objects>"#,
        )
        .unwrap();

        let root = document.root();
        assert_eq!(root.name(), "objects");
        assert_eq!(root.attribute("rootObject"), Some("1"));
        assert_eq!(root.children().len(), 2);

        let person = &root.children()[0];
        assert_eq!(person.attribute("type"), Some("Person"));
        let field = person.find_child("field").unwrap();
        assert_eq!(field.attribute("name"), Some("firstName"));
    }

    #[test]
    fn unescapes_attribute_values() {
        let document = XmlDocument::parse_str(
            r#"<object id="1" type="String" value="a &lt;b&gt; &amp; &quot;c&quot;"/>"#,
        )
        .unwrap();
        assert_eq!(
            document.root().attribute("value"),
            Some(r#"a <b> & "c""#)
        );
    }

    #[test]
    fn rejects_malformed_input() {
        assert!(XmlDocument::parse_str("<object><field></object>").is_err());
        assert!(matches!(
            XmlDocument::parse_str(""),
            Err(XmlError::Malformed { .. })
        ));
        assert!(matches!(
            XmlDocument::parse_str("<a/><b/>"),
            Err(XmlError::Malformed { .. })
        ));
        assert!(matches!(
            XmlDocument::parse_str("<a>text</a>"),
            Err(XmlError::Malformed { .. })
        ));
    }
}
