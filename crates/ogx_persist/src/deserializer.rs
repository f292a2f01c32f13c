//! The deserialization entry point.

use std::any::{Any, type_name};
use std::path::Path;
use std::rc::Rc;
use std::sync::Arc;

use ogx_engine::{ObjectId, ObjectTable, Subject, TransformationFactory, TransformationParameters};
use ogx_value::TypeRegistry;
use ogx_xml::XmlDocument;

use crate::error::PersistError;
use crate::markup::{XmlAttr, XmlTag};
use crate::paths;
use crate::rules::{self, ELEMENT_INDEX, OBJECT_TABLE};
use crate::store::ElementIndex;

// -----------------------------------------------------------------------------
// XmlDeserializer
// -----------------------------------------------------------------------------

/// Rebuilds object graphs from XML documents.
///
/// The registry handed in at construction must describe the same types the
/// document was produced with; labels are the contract between the two
/// sides.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use ogx_persist::{XmlDeserializer, XmlSerializer};
/// use ogx_value::TypeRegistry;
///
/// let registry = Arc::new(TypeRegistry::with_scalars());
/// let document = XmlSerializer::new(registry.clone()).to_document(&42_i64)?;
///
/// let deserializer = XmlDeserializer::new(registry);
/// let value: i64 = deserializer.from_document(&document)?;
/// assert_eq!(value, 42);
/// # Ok::<(), ogx_persist::PersistError>(())
/// ```
pub struct XmlDeserializer {
    registry: Arc<TypeRegistry>,
    factory: TransformationFactory,
}

impl XmlDeserializer {
    /// Creates a deserializer over `registry` with the shipped rule set.
    pub fn new(registry: Arc<TypeRegistry>) -> Self {
        Self {
            registry,
            factory: TransformationFactory::new(rules::standard_container()),
        }
    }

    /// The registry this deserializer resolves type labels against.
    #[inline]
    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    /// Rebuilds the root object of `document` as a `T`.
    ///
    /// Fails if the document is malformed, references are unresolvable or
    /// cyclic, or the rebuilt root is not a `T`.
    pub fn from_document<T: Any>(&self, document: &XmlDocument) -> Result<T, PersistError> {
        let root = document.root();
        if root.name() != XmlTag::Objects.as_str() {
            return Err(PersistError::document(format!(
                "expected `{}` root element, found `{}`",
                XmlTag::Objects.as_str(),
                root.name()
            )));
        }
        let root_id: ObjectId = root
            .attribute(XmlAttr::RootObject.as_str())
            .ok_or_else(|| {
                PersistError::document(format!(
                    "`{}` element without `{}` attribute",
                    XmlTag::Objects.as_str(),
                    XmlAttr::RootObject.as_str()
                ))
            })?
            .parse()?;

        let index = ElementIndex::from_document(document)?;
        log::debug!("indexed {} object definitions, root id {root_id}", index.len());
        let root_element = index.resolve(root_id)?;

        let mut parameters = TransformationParameters::new(
            paths::xml_to_object(),
            &self.registry,
            Subject::Element(root_element),
        );
        parameters.set_prerequisite(ELEMENT_INDEX, index);
        parameters.set_prerequisite(OBJECT_TABLE, ObjectTable::new());

        let value = self.factory.transform(&mut parameters)?.into_value()?;
        // The object table still holds a handle on the root; drop the run
        // state before moving the value out.
        drop(parameters);

        let typed = value.downcast::<T>().map_err(|_| PersistError::RootType {
            expected: type_name::<T>(),
        })?;
        Rc::try_unwrap(typed).map_err(|_| PersistError::RootShared)
    }

    /// Reads the document at `path` and rebuilds its root object as a `T`.
    pub fn deserialize<T: Any>(&self, path: impl AsRef<Path>) -> Result<T, PersistError> {
        let document = XmlDocument::parse_file(path)?;
        self.from_document(&document)
    }
}

// -----------------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use ogx_value::TypeRegistry;
    use ogx_xml::XmlDocument;

    use super::XmlDeserializer;
    use crate::error::PersistError;

    fn deserializer() -> XmlDeserializer {
        XmlDeserializer::new(Arc::new(TypeRegistry::with_scalars()))
    }

    fn document(markup: &str) -> XmlDocument {
        XmlDocument::parse_str(markup).unwrap()
    }

    #[test]
    fn scalar_root_round_trip() {
        let value: i64 = deserializer()
            .from_document(&document(
                r#"<objects rootObject="1"><object id="1" type="i64" value="42"/></objects>"#,
            ))
            .unwrap();
        assert_eq!(value, 42);
    }

    #[test]
    fn wrong_root_type_is_reported() {
        let result: Result<u32, _> = deserializer().from_document(&document(
            r#"<objects rootObject="1"><object id="1" type="i64" value="42"/></objects>"#,
        ));
        assert!(matches!(result, Err(PersistError::RootType { .. })));
    }

    #[test]
    fn missing_root_attribute_is_reported() {
        let result: Result<i64, _> = deserializer()
            .from_document(&document(r#"<objects><object id="1" type="i64" value="1"/></objects>"#));
        assert!(matches!(result, Err(PersistError::Document { .. })));
    }

    #[test]
    fn dangling_root_reference_is_reported() {
        let result: Result<i64, _> = deserializer().from_document(&document(
            r#"<objects rootObject="2"><object id="1" type="i64" value="1"/></objects>"#,
        ));
        assert!(matches!(result, Err(PersistError::Reference(_))));
    }
}
