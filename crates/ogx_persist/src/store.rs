//! Collecting and indexing object definitions of a document.

use std::collections::BTreeMap;
use std::collections::HashMap;
use std::rc::Rc;

use ogx_engine::{ObjectId, ReferenceError};
use ogx_xml::{XmlDocument, XmlElement};

use crate::error::PersistError;
use crate::markup::{XmlAttr, XmlTag};

// -----------------------------------------------------------------------------
// ElementStore
// -----------------------------------------------------------------------------

/// Accumulates the object elements a serialization run emits.
///
/// Each node of the object graph contributes exactly one element, keyed by
/// its identity-cache id. The finished store renders into the flat document
/// layout: an `objects` root whose children appear in ascending id order,
/// which makes output deterministic regardless of traversal order.
#[derive(Debug, Default)]
pub struct ElementStore {
    elements: BTreeMap<ObjectId, XmlElement>,
}

impl ElementStore {
    /// Creates an empty store.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the definition element for `id`.
    #[inline]
    pub fn push(&mut self, id: ObjectId, element: XmlElement) {
        self.elements.insert(id, element);
    }

    /// Number of recorded definitions.
    #[inline]
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// Whether nothing has been recorded yet.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Renders the store into a document rooted at `root`.
    pub fn into_document(self, root: ObjectId) -> XmlDocument {
        let mut objects = XmlElement::new(XmlTag::Objects.as_str());
        objects.set_attribute(XmlAttr::RootObject.as_str(), root.to_string());
        for element in self.elements.into_values() {
            objects.push_child(element);
        }
        XmlDocument::new(objects)
    }
}

// -----------------------------------------------------------------------------
// ElementIndex
// -----------------------------------------------------------------------------

/// Random access to the object definitions of a parsed document.
///
/// Built once per deserialization run; rules resolve `referencedObject`
/// style attributes against it. Elements are handed out as shared handles
/// so a definition referenced from several places is not copied per use.
#[derive(Debug, Default)]
pub struct ElementIndex {
    elements: HashMap<ObjectId, Rc<XmlElement>>,
}

impl ElementIndex {
    /// Indexes the object definitions of `document`.
    ///
    /// The root element must be `objects` and every child an `object` with a
    /// document-unique `id` attribute.
    pub fn from_document(document: &XmlDocument) -> Result<Self, PersistError> {
        let root = document.root();
        if root.name() != XmlTag::Objects.as_str() {
            return Err(PersistError::document(format!(
                "expected `{}` root element, found `{}`",
                XmlTag::Objects.as_str(),
                root.name()
            )));
        }

        let mut elements = HashMap::new();
        for child in root.children() {
            if child.name() != XmlTag::Object.as_str() {
                return Err(PersistError::document(format!(
                    "unexpected `{}` element under the document root",
                    child.name()
                )));
            }
            let id: ObjectId = child
                .attribute(XmlAttr::Id.as_str())
                .ok_or_else(|| PersistError::document("object definition without an id"))?
                .parse()?;
            if elements.insert(id, Rc::new(child.clone())).is_some() {
                return Err(PersistError::Reference(
                    ReferenceError::DuplicateDefinition { id },
                ));
            }
        }
        Ok(Self { elements })
    }

    /// Resolves `id` to its definition element.
    pub fn resolve(&self, id: ObjectId) -> Result<Rc<XmlElement>, ReferenceError> {
        self.elements
            .get(&id)
            .map(Rc::clone)
            .ok_or(ReferenceError::Dangling { id })
    }

    /// Number of indexed definitions.
    #[inline]
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// Whether the document defines no objects.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }
}

// -----------------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use ogx_engine::{ObjectId, ReferenceError};
    use ogx_xml::{XmlDocument, XmlElement};

    use super::{ElementIndex, ElementStore};
    use crate::error::PersistError;

    fn object_element(id: &str) -> XmlElement {
        let mut element = XmlElement::new("object");
        element.set_attribute("id", id);
        element.set_attribute("type", "String");
        element
    }

    #[test]
    fn store_renders_in_id_order() {
        let mut store = ElementStore::new();
        store.push("2".parse().unwrap(), object_element("2"));
        store.push("1".parse().unwrap(), object_element("1"));
        store.push("3".parse().unwrap(), object_element("3"));

        let document = store.into_document(ObjectId::ORIGIN);
        let root = document.root();
        assert_eq!(root.name(), "objects");
        assert_eq!(root.attribute("rootObject"), Some("1"));

        let ids: Vec<&str> = root
            .children()
            .iter()
            .map(|child| child.attribute("id").unwrap())
            .collect();
        assert_eq!(ids, ["1", "2", "3"]);
    }

    #[test]
    fn index_resolves_by_id() {
        let mut root = XmlElement::new("objects");
        root.set_attribute("rootObject", "1");
        root.push_child(object_element("1"));
        root.push_child(object_element("2"));

        let index = ElementIndex::from_document(&XmlDocument::new(root)).unwrap();
        assert_eq!(index.len(), 2);

        let element = index.resolve(ObjectId::ORIGIN).unwrap();
        assert_eq!(element.attribute("id"), Some("1"));
        assert!(matches!(
            index.resolve("9".parse().unwrap()),
            Err(ReferenceError::Dangling { .. })
        ));
    }

    #[test]
    fn index_rejects_duplicate_definitions() {
        let mut root = XmlElement::new("objects");
        root.push_child(object_element("1"));
        root.push_child(object_element("1"));

        assert!(matches!(
            ElementIndex::from_document(&XmlDocument::new(root)),
            Err(PersistError::Reference(
                ReferenceError::DuplicateDefinition { .. }
            ))
        ));
    }

    #[test]
    fn index_rejects_foreign_structure() {
        let document = XmlDocument::new(XmlElement::new("items"));
        assert!(matches!(
            ElementIndex::from_document(&document),
            Err(PersistError::Document { .. })
        ));

        let mut root = XmlElement::new("objects");
        root.push_child(XmlElement::new("item"));
        assert!(matches!(
            ElementIndex::from_document(&XmlDocument::new(root)),
            Err(PersistError::Document { .. })
        ));

        let mut root = XmlElement::new("objects");
        root.push_child(XmlElement::new("object"));
        assert!(matches!(
            ElementIndex::from_document(&XmlDocument::new(root)),
            Err(PersistError::Document { .. })
        ));
    }
}
