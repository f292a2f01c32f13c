//! Rules serializing object graph nodes into document elements.
//!
//! Every rule follows the same protocol: intern the subject in the shared
//! identity cache, and only on first sight build its definition element and
//! push it into the element store. The rule answers with the subject's id
//! either way, so parents embed references, never nested definitions, and a
//! node shared across the graph is defined exactly once.

use std::any::Any;

use ogx_engine::{
    ObjectId, ObjectIdCache, Subject, TransformationError, TransformationFactory,
    TransformationOutput, TransformationParameters, TransformationPath, TransformationRule,
};
use ogx_value::TypeKind;
use ogx_xml::XmlElement;

use crate::markup::{XmlAttr, XmlTag};
use crate::paths;
use crate::rules::{ELEMENT_STORE, OBJECT_CACHE, priority_of};
use crate::store::ElementStore;

// -----------------------------------------------------------------------------
// Shared helpers
// -----------------------------------------------------------------------------

/// The registered kind of the subject node, if the subject is a node of a
/// registered type. Applicability checks route through this; any failure
/// means "not mine".
fn subject_kind(parameters: &TransformationParameters<'_>) -> Option<TypeKind> {
    let node = parameters.subject_node().ok()?;
    let meta = parameters.registry().meta_of(node).ok()?;
    Some(meta.kind())
}

fn intern_subject(
    parameters: &mut TransformationParameters<'_>,
    node: &dyn Any,
) -> Result<ogx_engine::Interned, TransformationError> {
    let cache: &mut ObjectIdCache = parameters.prerequisite_mut(OBJECT_CACHE)?;
    Ok(cache.intern(node))
}

fn store_element(
    parameters: &mut TransformationParameters<'_>,
    id: ObjectId,
    element: XmlElement,
) -> Result<(), TransformationError> {
    let store: &mut ElementStore = parameters.prerequisite_mut(ELEMENT_STORE)?;
    store.push(id, element);
    Ok(())
}

/// Serializes one child node and hands back its id.
///
/// Swaps the child in as the subject, recurses through the factory, and
/// restores the previous subject whether the recursion succeeded or not.
fn transform_child<'a>(
    factory: &TransformationFactory,
    parameters: &mut TransformationParameters<'a>,
    child: &'a dyn Any,
) -> Result<ObjectId, TransformationError> {
    let previous = parameters.replace_subject(Subject::Node(child));
    let result = factory.transform(parameters);
    parameters.replace_subject(previous);
    result?.into_reference()
}

fn object_element(id: ObjectId, label: &str) -> XmlElement {
    let mut element = XmlElement::new(XmlTag::Object.as_str());
    element.set_attribute(XmlAttr::Id.as_str(), id.to_string());
    element.set_attribute(XmlAttr::Type.as_str(), label);
    element
}

fn reference_element(tag: XmlTag, id: ObjectId) -> XmlElement {
    let mut element = XmlElement::new(tag.as_str());
    element.set_attribute(XmlAttr::ReferencedObject.as_str(), id.to_string());
    element
}

// -----------------------------------------------------------------------------
// ScalarToXmlRule
// -----------------------------------------------------------------------------

/// Serializes scalar nodes into `object` elements with a `value` attribute.
pub struct ScalarToXmlRule {
    path: TransformationPath,
}

impl ScalarToXmlRule {
    pub fn new() -> Self {
        Self {
            path: paths::object_to_xml(),
        }
    }
}

impl Default for ScalarToXmlRule {
    fn default() -> Self {
        Self::new()
    }
}

impl TransformationRule for ScalarToXmlRule {
    fn name(&self) -> &str {
        "scalar-to-xml"
    }

    fn priority(&self) -> u32 {
        priority_of(TypeKind::Scalar)
    }

    fn path(&self) -> &TransformationPath {
        &self.path
    }

    fn is_applicable(&self, parameters: &TransformationParameters<'_>) -> bool {
        subject_kind(parameters) == Some(TypeKind::Scalar)
    }

    fn transform(
        &self,
        _factory: &TransformationFactory,
        parameters: &mut TransformationParameters<'_>,
    ) -> Result<TransformationOutput, TransformationError> {
        let node = parameters.subject_node()?;
        let meta = parameters.registry().meta_of(node)?;

        let interned = intern_subject(parameters, node)?;
        if interned.first_seen {
            let text = meta.as_scalar()?.render(node)?;
            let mut element = object_element(interned.id, meta.label());
            element.set_attribute(XmlAttr::Value.as_str(), text);
            store_element(parameters, interned.id, element)?;
        }
        Ok(TransformationOutput::Reference(interned.id))
    }
}

// -----------------------------------------------------------------------------
// CompositeToXmlRule
// -----------------------------------------------------------------------------

/// Serializes composite nodes into `object` elements with one `field` child
/// per persistable field.
pub struct CompositeToXmlRule {
    path: TransformationPath,
}

impl CompositeToXmlRule {
    pub fn new() -> Self {
        Self {
            path: paths::object_to_xml(),
        }
    }
}

impl Default for CompositeToXmlRule {
    fn default() -> Self {
        Self::new()
    }
}

impl TransformationRule for CompositeToXmlRule {
    fn name(&self) -> &str {
        "composite-to-xml"
    }

    fn priority(&self) -> u32 {
        priority_of(TypeKind::Composite)
    }

    fn path(&self) -> &TransformationPath {
        &self.path
    }

    /// A composite without persistable fields is rejected here; nothing of
    /// it could be restored, so silently writing an empty definition would
    /// hide a registration mistake.
    fn is_applicable(&self, parameters: &TransformationParameters<'_>) -> bool {
        parameters
            .subject_node()
            .ok()
            .and_then(|node| parameters.registry().meta_of(node).ok())
            .is_some_and(|meta| meta.is_composite())
    }

    fn transform(
        &self,
        factory: &TransformationFactory,
        parameters: &mut TransformationParameters<'_>,
    ) -> Result<TransformationOutput, TransformationError> {
        let node = parameters.subject_node()?;
        let meta = parameters.registry().meta_of(node)?;

        let interned = intern_subject(parameters, node)?;
        if !interned.first_seen {
            return Ok(TransformationOutput::Reference(interned.id));
        }

        let shape = meta.as_composite()?;
        let mut element = object_element(interned.id, meta.label());
        for field in shape.persistable_fields() {
            let child = field.get(node)?;
            let child_id = transform_child(factory, parameters, child)?;

            let mut field_element = XmlElement::new(XmlTag::Field.as_str());
            field_element.set_attribute(XmlAttr::Name.as_str(), field.name());
            field_element.set_attribute(XmlAttr::DeclaredType.as_str(), field.declared_label());
            field_element.set_attribute(
                XmlAttr::ReferencedObject.as_str(),
                child_id.to_string(),
            );
            element.push_child(field_element);
        }

        store_element(parameters, interned.id, element)?;
        Ok(TransformationOutput::Reference(interned.id))
    }
}

// -----------------------------------------------------------------------------
// SequenceToXmlRule
// -----------------------------------------------------------------------------

/// Serializes sequence nodes into `object` elements with one `element`
/// child per item, in sequence order.
pub struct SequenceToXmlRule {
    path: TransformationPath,
}

impl SequenceToXmlRule {
    pub fn new() -> Self {
        Self {
            path: paths::object_to_xml(),
        }
    }
}

impl Default for SequenceToXmlRule {
    fn default() -> Self {
        Self::new()
    }
}

impl TransformationRule for SequenceToXmlRule {
    fn name(&self) -> &str {
        "sequence-to-xml"
    }

    fn priority(&self) -> u32 {
        priority_of(TypeKind::Sequence)
    }

    fn path(&self) -> &TransformationPath {
        &self.path
    }

    fn is_applicable(&self, parameters: &TransformationParameters<'_>) -> bool {
        subject_kind(parameters) == Some(TypeKind::Sequence)
    }

    fn transform(
        &self,
        factory: &TransformationFactory,
        parameters: &mut TransformationParameters<'_>,
    ) -> Result<TransformationOutput, TransformationError> {
        let node = parameters.subject_node()?;
        let meta = parameters.registry().meta_of(node)?;

        let interned = intern_subject(parameters, node)?;
        if !interned.first_seen {
            return Ok(TransformationOutput::Reference(interned.id));
        }

        let shape = meta.as_sequence()?;
        let mut element = object_element(interned.id, meta.label());
        element.set_attribute(
            XmlAttr::DeclaredElementType.as_str(),
            shape.element_label(),
        );
        for item in shape.iter(node)? {
            let item_id = transform_child(factory, parameters, item)?;
            element.push_child(reference_element(XmlTag::Element, item_id));
        }

        store_element(parameters, interned.id, element)?;
        Ok(TransformationOutput::Reference(interned.id))
    }
}

// -----------------------------------------------------------------------------
// MappingToXmlRule
// -----------------------------------------------------------------------------

/// Serializes mapping nodes into `object` elements with one `entry` child
/// per key/value pair, in key order.
pub struct MappingToXmlRule {
    path: TransformationPath,
}

impl MappingToXmlRule {
    pub fn new() -> Self {
        Self {
            path: paths::object_to_xml(),
        }
    }
}

impl Default for MappingToXmlRule {
    fn default() -> Self {
        Self::new()
    }
}

impl TransformationRule for MappingToXmlRule {
    fn name(&self) -> &str {
        "mapping-to-xml"
    }

    fn priority(&self) -> u32 {
        priority_of(TypeKind::Mapping)
    }

    fn path(&self) -> &TransformationPath {
        &self.path
    }

    fn is_applicable(&self, parameters: &TransformationParameters<'_>) -> bool {
        subject_kind(parameters) == Some(TypeKind::Mapping)
    }

    fn transform(
        &self,
        factory: &TransformationFactory,
        parameters: &mut TransformationParameters<'_>,
    ) -> Result<TransformationOutput, TransformationError> {
        let node = parameters.subject_node()?;
        let meta = parameters.registry().meta_of(node)?;

        let interned = intern_subject(parameters, node)?;
        if !interned.first_seen {
            return Ok(TransformationOutput::Reference(interned.id));
        }

        let shape = meta.as_mapping()?;
        let mut element = object_element(interned.id, meta.label());
        element.set_attribute(XmlAttr::DeclaredKeyType.as_str(), shape.key_label());
        element.set_attribute(XmlAttr::DeclaredValueType.as_str(), shape.value_label());
        for (key, value) in shape.pairs(node)? {
            let key_id = transform_child(factory, parameters, key)?;
            let value_id = transform_child(factory, parameters, value)?;

            let mut entry = XmlElement::new(XmlTag::Entry.as_str());
            entry.set_attribute(XmlAttr::ReferencedKey.as_str(), key_id.to_string());
            entry.set_attribute(XmlAttr::ReferencedValue.as_str(), value_id.to_string());
            element.push_child(entry);
        }

        store_element(parameters, interned.id, element)?;
        Ok(TransformationOutput::Reference(interned.id))
    }
}

// -----------------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use ogx_engine::{
        ObjectId, ObjectIdCache, Subject, TransformationFactory, TransformationParameters,
    };
    use ogx_value::TypeRegistry;

    use crate::paths;
    use crate::rules::{ELEMENT_STORE, OBJECT_CACHE, standard_container};
    use crate::store::ElementStore;

    fn serialize<'a>(
        registry: &'a TypeRegistry,
        node: &'a dyn std::any::Any,
    ) -> (ObjectId, ogx_xml::XmlDocument) {
        let factory = TransformationFactory::new(standard_container());
        let mut parameters = TransformationParameters::new(
            paths::object_to_xml(),
            registry,
            Subject::Node(node),
        );
        parameters.set_prerequisite(OBJECT_CACHE, ObjectIdCache::new());
        parameters.set_prerequisite(ELEMENT_STORE, ElementStore::new());

        let root = factory
            .transform(&mut parameters)
            .unwrap()
            .into_reference()
            .unwrap();
        let store: ElementStore = parameters.take_prerequisite(ELEMENT_STORE).unwrap();
        (root, store.into_document(root))
    }

    #[test]
    fn scalar_becomes_a_value_attribute() {
        let registry = TypeRegistry::with_scalars();
        let node = 42_i64;
        let (root, document) = serialize(&registry, &node);

        assert_eq!(root, ObjectId::ORIGIN);
        let object = &document.root().children()[0];
        assert_eq!(object.attribute("id"), Some("1"));
        assert_eq!(object.attribute("type"), Some("i64"));
        assert_eq!(object.attribute("value"), Some("42"));
    }

    #[test]
    fn sequence_emits_elements_in_order() {
        let mut registry = TypeRegistry::with_scalars();
        registry
            .register(ogx_value::TypeMeta::sequence_of::<u32>("Numbers", "u32"))
            .unwrap();

        let numbers = vec![5_u32, 6, 7];
        let (_, document) = serialize(&registry, &numbers);

        let object = &document.root().children()[0];
        assert_eq!(object.attribute("type"), Some("Numbers"));
        assert_eq!(object.attribute("declaredElementType"), Some("u32"));

        let references: Vec<&str> = object
            .children()
            .iter()
            .map(|child| child.attribute("referencedObject").unwrap())
            .collect();
        assert_eq!(references, ["2", "3", "4"]);
        assert_eq!(document.root().children().len(), 4);
    }

    #[test]
    fn unregistered_subject_finds_no_rule() {
        struct Unknown;

        let registry = TypeRegistry::with_scalars();
        let factory = TransformationFactory::new(standard_container());
        let node = Unknown;
        let mut parameters = TransformationParameters::new(
            paths::object_to_xml(),
            &registry,
            Subject::Node(&node),
        );
        parameters.set_prerequisite(OBJECT_CACHE, ObjectIdCache::new());
        parameters.set_prerequisite(ELEMENT_STORE, ElementStore::new());

        assert!(matches!(
            factory.transform(&mut parameters),
            Err(ogx_engine::TransformationError::NoApplicableRule { .. })
        ));
    }
}
