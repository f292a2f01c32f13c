// -----------------------------------------------------------------------------
// XmlElement

/// An element node: a name, ordered attributes, and child elements.
///
/// Attribute order is preserved, so documents render deterministically.
///
/// # Examples
///
/// ```
/// use ogx_xml::XmlElement;
///
/// let mut object = XmlElement::new("object");
/// object.set_attribute("id", "1");
/// object.set_attribute("type", "Person");
/// object.push_child(XmlElement::new("field"));
///
/// assert_eq!(object.attribute("id"), Some("1"));
/// assert_eq!(object.children().len(), 1);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlElement {
    name: String,
    attributes: Vec<(String, String)>,
    children: Vec<XmlElement>,
}

impl XmlElement {
    /// Creates an element with no attributes and no children.
    #[inline]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    /// The element name.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Sets an attribute, replacing an existing value under the same name.
    pub fn set_attribute(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.attributes.iter_mut().find(|(key, _)| *key == name) {
            Some((_, existing)) => *existing = value,
            None => self.attributes.push((name, value)),
        }
    }

    /// Returns an attribute value by name.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// The attributes, in insertion order.
    #[inline]
    pub fn attributes(&self) -> &[(String, String)] {
        &self.attributes
    }

    /// Appends a child element.
    #[inline]
    pub fn push_child(&mut self, child: XmlElement) {
        self.children.push(child);
    }

    /// The child elements, in document order.
    #[inline]
    pub fn children(&self) -> &[XmlElement] {
        &self.children
    }

    /// Returns the children with the given element name, in document order.
    pub fn children_named<'a>(
        &'a self,
        name: &str,
    ) -> impl Iterator<Item = &'a XmlElement> {
        self.children.iter().filter(move |child| child.name == name)
    }

    /// Returns the first child with the given element name.
    pub fn find_child(&self, name: &str) -> Option<&XmlElement> {
        self.children_named(name).next()
    }
}

// -----------------------------------------------------------------------------
// XmlDocument

/// A document: one root [`XmlElement`].
///
/// Parsing and writing live in this crate's reader/writer modules; see
/// [`XmlDocument::parse_str`] and [`XmlDocument::to_xml_string`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlDocument {
    root: XmlElement,
}

impl XmlDocument {
    /// Creates a document from its root element.
    #[inline]
    pub fn new(root: XmlElement) -> Self {
        Self { root }
    }

    /// The root element.
    #[inline]
    pub fn root(&self) -> &XmlElement {
        &self.root
    }

    /// Consumes the document and returns the root element.
    #[inline]
    pub fn into_root(self) -> XmlElement {
        self.root
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use super::XmlElement;

    #[test]
    fn set_attribute_replaces_in_place() {
        let mut element = XmlElement::new("object");
        element.set_attribute("id", "1");
        element.set_attribute("type", "Person");
        element.set_attribute("id", "2");

        assert_eq!(element.attribute("id"), Some("2"));
        // Replacement keeps the original position.
        assert_eq!(element.attributes()[0].0, "id");
        assert_eq!(element.attributes().len(), 2);
    }

    #[test]
    fn children_named_filters_by_name() {
        let mut element = XmlElement::new("object");
        element.push_child(XmlElement::new("field"));
        element.push_child(XmlElement::new("entry"));
        element.push_child(XmlElement::new("field"));

        assert_eq!(element.children_named("field").count(), 2);
        assert!(element.find_child("entry").is_some());
        assert!(element.find_child("element").is_none());
    }

    #[test]
    fn found_child_outlives_the_name_lookup() {
        let mut element = XmlElement::new("object");
        element.push_child(XmlElement::new("field"));

        let child = {
            let name = String::from("field");
            element.find_child(&name)
        };
        assert_eq!(child.map(XmlElement::name), Some("field"));
    }
}
