//! Serialization of an [`XmlDocument`] back to markup text.

use std::fs;
use std::path::Path;

use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, Event};

use crate::element::{XmlDocument, XmlElement};
use crate::error::XmlError;

impl XmlDocument {
    /// Renders the document as an indented UTF-8 XML string, including the
    /// XML declaration.
    ///
    /// Attributes are written in insertion order and childless elements are
    /// collapsed to self-closing tags.
    ///
    /// # Examples
    ///
    /// ```
    /// use ogx_xml::{XmlDocument, XmlElement};
    ///
    /// let mut root = XmlElement::new("objects");
    /// root.set_attribute("rootObject", "1");
    ///
    /// let text = XmlDocument::new(root).to_xml_string()?;
    /// assert!(text.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));
    /// assert!(text.contains("<objects rootObject=\"1\"/>"));
    /// # Ok::<(), ogx_xml::XmlError>(())
    /// ```
    pub fn to_xml_string(&self) -> Result<String, XmlError> {
        let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
        writer
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
            .map_err(XmlError::write)?;

        write_element(&mut writer, self.root())?;

        let mut bytes = writer.into_inner();
        bytes.push(b'\n');
        String::from_utf8(bytes).map_err(XmlError::encoding)
    }

    /// Writes the document to `path`, replacing any existing file.
    pub fn write_file(&self, path: impl AsRef<Path>) -> Result<(), XmlError> {
        let text = self.to_xml_string()?;
        fs::write(path, text)?;
        Ok(())
    }
}

fn write_element(writer: &mut Writer<Vec<u8>>, element: &XmlElement) -> Result<(), XmlError> {
    let mut start = BytesStart::new(element.name());
    for (key, value) in element.attributes() {
        start.push_attribute((key.as_str(), value.as_str()));
    }

    if element.children().is_empty() {
        writer
            .write_event(Event::Empty(start))
            .map_err(XmlError::write)?;
        return Ok(());
    }

    writer
        .write_event(Event::Start(start))
        .map_err(XmlError::write)?;
    for child in element.children() {
        write_element(writer, child)?;
    }
    writer
        .write_event(Event::End(BytesEnd::new(element.name())))
        .map_err(XmlError::write)?;
    Ok(())
}

// -----------------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------------
