//! The serialization entry point.

use std::any::Any;
use std::path::Path;
use std::sync::Arc;

use ogx_engine::{ObjectIdCache, Subject, TransformationFactory, TransformationParameters};
use ogx_value::TypeRegistry;
use ogx_xml::XmlDocument;

use crate::error::PersistError;
use crate::paths;
use crate::rules::{self, ELEMENT_STORE, OBJECT_CACHE};
use crate::store::ElementStore;

// -----------------------------------------------------------------------------
// XmlSerializer
// -----------------------------------------------------------------------------

/// Serializes registered object graphs into XML documents.
///
/// The serializer is stateless between calls; every call runs against a
/// fresh identity cache, so ids are stable within a document but carry no
/// meaning across documents.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use ogx_persist::XmlSerializer;
/// use ogx_value::TypeRegistry;
///
/// let serializer = XmlSerializer::new(Arc::new(TypeRegistry::with_scalars()));
/// let document = serializer.to_document(&42_i64)?;
/// let text = document.to_xml_string()?;
/// assert!(text.contains(r#"<object id="1" type="i64" value="42"/>"#));
/// # Ok::<(), ogx_persist::PersistError>(())
/// ```
pub struct XmlSerializer {
    registry: Arc<TypeRegistry>,
    factory: TransformationFactory,
}

impl XmlSerializer {
    /// Creates a serializer over `registry` with the shipped rule set.
    pub fn new(registry: Arc<TypeRegistry>) -> Self {
        Self {
            registry,
            factory: TransformationFactory::new(rules::standard_container()),
        }
    }

    /// The registry this serializer resolves types against.
    #[inline]
    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    /// Serializes the graph rooted at `root` into a document.
    ///
    /// The root's concrete type must be registered; so must the type of
    /// every node reachable through persistable fields.
    pub fn to_document(&self, root: &dyn Any) -> Result<XmlDocument, PersistError> {
        let mut parameters = TransformationParameters::new(
            paths::object_to_xml(),
            &self.registry,
            Subject::Node(root),
        );
        parameters.set_prerequisite(OBJECT_CACHE, ObjectIdCache::new());
        parameters.set_prerequisite(ELEMENT_STORE, ElementStore::new());

        let root_id = self.factory.transform(&mut parameters)?.into_reference()?;
        let store: ElementStore = parameters.take_prerequisite(ELEMENT_STORE)?;
        log::debug!(
            "serialized {} objects, root id {root_id}",
            store.len()
        );
        Ok(store.into_document(root_id))
    }

    /// Serializes the graph rooted at `root` and writes it to `path`.
    pub fn serialize(&self, path: impl AsRef<Path>, root: &dyn Any) -> Result<(), PersistError> {
        self.to_document(root)?.write_file(path)?;
        Ok(())
    }
}

// -----------------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use ogx_value::{TypeMeta, TypeRegistry};

    use super::XmlSerializer;
    use crate::error::PersistError;

    struct Person {
        first_name: String,
        last_name: String,
    }

    fn person_registry() -> Arc<TypeRegistry> {
        let mut registry = TypeRegistry::with_scalars();
        registry
            .register(
                TypeMeta::composite::<Person>("Person")
                    .field("firstName", "String", |p: &Person| &p.first_name)
                    .field("lastName", "String", |p: &Person| &p.last_name)
                    .build(|values| {
                        Ok(Person {
                            first_name: values.take("firstName")?,
                            last_name: values.take("lastName")?,
                        })
                    }),
            )
            .unwrap();
        Arc::new(registry)
    }

    #[test]
    fn composite_document_layout() {
        let serializer = XmlSerializer::new(person_registry());
        let person = Person {
            first_name: "John".into(),
            last_name: "Doe".into(),
        };

        let text = serializer
            .to_document(&person)
            .unwrap()
            .to_xml_string()
            .unwrap();
        let expected = "\
<?xml version=\"1.0\" encoding=\"UTF-8\"?>
<objects rootObject=\"1\">
  <object id=\"1\" type=\"Person\">
    <field name=\"firstName\" declaredType=\"String\" referencedObject=\"2\"/>
    <field name=\"lastName\" declaredType=\"String\" referencedObject=\"3\"/>
  </object>
  <object id=\"2\" type=\"String\" value=\"John\"/>
  <object id=\"3\" type=\"String\" value=\"Doe\"/>
</objects>
";
        assert_eq!(text, expected);
    }

    #[test]
    fn unregistered_root_is_an_error() {
        struct Unknown;

        let serializer = XmlSerializer::new(person_registry());
        assert!(matches!(
            serializer.to_document(&Unknown),
            Err(PersistError::Transformation(_))
        ));
    }
}
