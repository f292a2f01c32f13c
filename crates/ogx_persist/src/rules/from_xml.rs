//! Rules rebuilding object graph nodes from document elements.
//!
//! Every rule follows the same protocol: read the subject element's header,
//! consult the shared object table, and either hand back the already rebuilt
//! value or mark the id as in progress, resolve the referenced children, and
//! finish the table entry with the rebuilt value. The in-progress mark is
//! what turns a reference cycle in the document into an error instead of
//! unbounded recursion.

use std::any::Any;
use std::borrow::Cow;
use std::rc::Rc;

use ogx_engine::{
    ObjectId, ObjectTable, ReferenceError, Subject, TransformationError, TransformationFactory,
    TransformationOutput, TransformationParameters, TransformationPath, TransformationRule,
};
use ogx_value::{FieldValues, TypeKind, TypeMeta};
use ogx_xml::XmlElement;

use crate::markup::{XmlAttr, XmlTag};
use crate::paths;
use crate::rules::{ELEMENT_INDEX, OBJECT_TABLE, priority_of};
use crate::store::ElementIndex;

// -----------------------------------------------------------------------------
// Shared helpers
// -----------------------------------------------------------------------------

fn attr<'e>(element: &'e XmlElement, name: XmlAttr) -> Result<&'e str, TransformationError> {
    element
        .attribute(name.as_str())
        .ok_or_else(|| TransformationError::Document {
            detail: format!(
                "`{}` element without `{}` attribute",
                element.name(),
                name.as_str()
            ),
        })
}

fn parse_header(element: &XmlElement) -> Result<(ObjectId, String), TransformationError> {
    let id: ObjectId = attr(element, XmlAttr::Id)?.parse()?;
    let label = attr(element, XmlAttr::Type)?.to_string();
    Ok((id, label))
}

/// The registered metadata of the subject element's type, if the subject is
/// a well-formed object element of a registered type.
fn subject_type_meta<'a>(parameters: &TransformationParameters<'a>) -> Option<&'a TypeMeta> {
    let element = parameters.subject_element().ok()?;
    let label = element.attribute(XmlAttr::Type.as_str())?;
    parameters.registry().meta_by_label(label)
}

fn subject_kind(parameters: &TransformationParameters<'_>) -> Option<TypeKind> {
    subject_type_meta(parameters).map(TypeMeta::kind)
}

/// Rejects an object whose actual type differs from the type the referring
/// context declared. There is no subtyping in this model, so the labels
/// must match exactly.
fn check_declared_label(
    parameters: &TransformationParameters<'_>,
    label: &str,
) -> Result<(), TransformationError> {
    match parameters.declared_label() {
        Some(declared) if declared != label => Err(TransformationError::Document {
            detail: format!("object of type `{label}` referenced as `{declared}`"),
        }),
        _ => Ok(()),
    }
}

/// Checks the object table for `id`: hands back the finished value, reports
/// a cycle for an in-progress id, or marks the id as in progress.
fn reuse_or_begin(
    parameters: &mut TransformationParameters<'_>,
    id: ObjectId,
) -> Result<Option<Rc<dyn Any>>, TransformationError> {
    let table: &mut ObjectTable = parameters.prerequisite_mut(OBJECT_TABLE)?;
    if let Some(existing) = table.get(id) {
        return Ok(Some(Rc::clone(existing)));
    }
    if table.is_in_progress(id) {
        return Err(ReferenceError::CyclicReference { id }.into());
    }
    table.begin(id)?;
    Ok(None)
}

fn finish(
    parameters: &mut TransformationParameters<'_>,
    id: ObjectId,
    value: Rc<dyn Any>,
) -> Result<(), TransformationError> {
    let table: &mut ObjectTable = parameters.prerequisite_mut(OBJECT_TABLE)?;
    table.finish(id, value);
    Ok(())
}

/// Rebuilds one referenced object and hands back its value.
///
/// Looks the definition up in the element index, swaps it in as the
/// subject together with the declared label, recurses through the factory,
/// and restores the previous state. With `take_ownership` the object
/// table's handle is dropped afterwards, leaving the caller as the sole
/// owner; shared consumers keep the table handle so later references alias
/// the same value.
fn resolve_reference(
    factory: &TransformationFactory,
    parameters: &mut TransformationParameters<'_>,
    reference: ObjectId,
    declared_label: &str,
    take_ownership: bool,
) -> Result<Rc<dyn Any>, TransformationError> {
    let element = {
        let index: &ElementIndex = parameters.prerequisite(ELEMENT_INDEX)?;
        index.resolve(reference)?
    };

    let previous_subject = parameters.replace_subject(Subject::Element(element));
    let previous_label =
        parameters.replace_declared_label(Some(Cow::Owned(declared_label.to_string())));
    let result = factory.transform(parameters);
    parameters.replace_declared_label(previous_label);
    parameters.replace_subject(previous_subject);

    let value = result?.into_value()?;
    if take_ownership {
        let table: &mut ObjectTable = parameters.prerequisite_mut(OBJECT_TABLE)?;
        table.release(reference);
    }
    Ok(value)
}

fn subject_meta<'a>(
    parameters: &TransformationParameters<'a>,
    label: &str,
) -> Result<&'a TypeMeta, TransformationError> {
    Ok(parameters.registry().require_label(label)?)
}

// -----------------------------------------------------------------------------
// ScalarFromXmlRule
// -----------------------------------------------------------------------------

/// Rebuilds scalar objects from their `value` attribute.
pub struct ScalarFromXmlRule {
    path: TransformationPath,
}

impl ScalarFromXmlRule {
    pub fn new() -> Self {
        Self {
            path: paths::xml_to_object(),
        }
    }
}

impl Default for ScalarFromXmlRule {
    fn default() -> Self {
        Self::new()
    }
}

impl TransformationRule for ScalarFromXmlRule {
    fn name(&self) -> &str {
        "scalar-from-xml"
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
        let element = parameters.subject_element()?;
        let (id, label) = parse_header(&element)?;
        check_declared_label(parameters, &label)?;
        let meta = subject_meta(parameters, &label)?;

        if let Some(existing) = reuse_or_begin(parameters, id)? {
            return Ok(TransformationOutput::Value(existing));
        }

        let text = attr(&element, XmlAttr::Value)?;
        let value = meta.as_scalar()?.parse(text)?;
        finish(parameters, id, Rc::clone(&value))?;
        Ok(TransformationOutput::Value(value))
    }
}

// -----------------------------------------------------------------------------
// CompositeFromXmlRule
// -----------------------------------------------------------------------------

/// Rebuilds composite objects field by field through the registered build
/// function.
pub struct CompositeFromXmlRule {
    path: TransformationPath,
}

impl CompositeFromXmlRule {
    pub fn new() -> Self {
        Self {
            path: paths::xml_to_object(),
        }
    }
}

impl Default for CompositeFromXmlRule {
    fn default() -> Self {
        Self::new()
    }
}

impl TransformationRule for CompositeFromXmlRule {
    fn name(&self) -> &str {
        "composite-from-xml"
    }

    fn priority(&self) -> u32 {
        priority_of(TypeKind::Composite)
    }

    fn path(&self) -> &TransformationPath {
        &self.path
    }

    fn is_applicable(&self, parameters: &TransformationParameters<'_>) -> bool {
        // Same predicate as the write side: a composite with no persistable
        // fields is not handled by this rule.
        subject_type_meta(parameters).is_some_and(TypeMeta::is_composite)
    }

    fn transform(
        &self,
        factory: &TransformationFactory,
        parameters: &mut TransformationParameters<'_>,
    ) -> Result<TransformationOutput, TransformationError> {
        let element = parameters.subject_element()?;
        let (id, label) = parse_header(&element)?;
        check_declared_label(parameters, &label)?;
        let meta = subject_meta(parameters, &label)?;
        let shape = meta.as_composite()?;

        if let Some(existing) = reuse_or_begin(parameters, id)? {
            return Ok(TransformationOutput::Value(existing));
        }

        let mut values = FieldValues::new();
        for child in element.children() {
            if child.name() != XmlTag::Field.as_str() {
                return Err(TransformationError::Document {
                    detail: format!(
                        "unexpected `{}` element inside a composite object",
                        child.name()
                    ),
                });
            }

            let field_name = attr(child, XmlAttr::Name)?;
            let declared = attr(child, XmlAttr::DeclaredType)?;
            let reference: ObjectId = attr(child, XmlAttr::ReferencedObject)?.parse()?;

            let spec = shape
                .persistable_fields()
                .find(|field| field.name() == field_name)
                .ok_or_else(|| TransformationError::Document {
                    detail: format!("type `{label}` has no persistable field `{field_name}`"),
                })?;
            if declared != spec.declared_label() {
                return Err(TransformationError::Document {
                    detail: format!(
                        "field `{field_name}` declared as `{declared}`, registered as `{}`",
                        spec.declared_label()
                    ),
                });
            }

            let take_ownership = !spec.is_shared();
            let value =
                resolve_reference(factory, parameters, reference, declared, take_ownership)?;
            values.insert(field_name, value)?;
        }

        // Absent fields surface as MissingField from the build function.
        let built = shape.build(&mut values)?;
        finish(parameters, id, Rc::clone(&built))?;
        Ok(TransformationOutput::Value(built))
    }
}

// -----------------------------------------------------------------------------
// SequenceFromXmlRule
// -----------------------------------------------------------------------------

/// Rebuilds sequence objects element by element, preserving order.
pub struct SequenceFromXmlRule {
    path: TransformationPath,
}

impl SequenceFromXmlRule {
    pub fn new() -> Self {
        Self {
            path: paths::xml_to_object(),
        }
    }
}

impl Default for SequenceFromXmlRule {
    fn default() -> Self {
        Self::new()
    }
}

impl TransformationRule for SequenceFromXmlRule {
    fn name(&self) -> &str {
        "sequence-from-xml"
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
        let element = parameters.subject_element()?;
        let (id, label) = parse_header(&element)?;
        check_declared_label(parameters, &label)?;
        let meta = subject_meta(parameters, &label)?;
        let shape = meta.as_sequence()?;

        let declared_element = attr(&element, XmlAttr::DeclaredElementType)?;
        if declared_element != shape.element_label() {
            return Err(TransformationError::Document {
                detail: format!(
                    "sequence `{label}` declares element type `{declared_element}`, registered as `{}`",
                    shape.element_label()
                ),
            });
        }

        if let Some(existing) = reuse_or_begin(parameters, id)? {
            return Ok(TransformationOutput::Value(existing));
        }

        let take_ownership = !shape.elements_shared();
        let mut items = Vec::with_capacity(element.children().len());
        for child in element.children() {
            if child.name() != XmlTag::Element.as_str() {
                return Err(TransformationError::Document {
                    detail: format!(
                        "unexpected `{}` element inside a sequence object",
                        child.name()
                    ),
                });
            }
            let reference: ObjectId = attr(child, XmlAttr::ReferencedObject)?.parse()?;
            let value = resolve_reference(
                factory,
                parameters,
                reference,
                declared_element,
                take_ownership,
            )?;
            items.push(value);
        }

        let built = shape.build(items)?;
        finish(parameters, id, Rc::clone(&built))?;
        Ok(TransformationOutput::Value(built))
    }
}

// -----------------------------------------------------------------------------
// MappingFromXmlRule
// -----------------------------------------------------------------------------

/// Rebuilds mapping objects entry by entry.
pub struct MappingFromXmlRule {
    path: TransformationPath,
}

impl MappingFromXmlRule {
    pub fn new() -> Self {
        Self {
            path: paths::xml_to_object(),
        }
    }
}

impl Default for MappingFromXmlRule {
    fn default() -> Self {
        Self::new()
    }
}

impl TransformationRule for MappingFromXmlRule {
    fn name(&self) -> &str {
        "mapping-from-xml"
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
        let element = parameters.subject_element()?;
        let (id, label) = parse_header(&element)?;
        check_declared_label(parameters, &label)?;
        let meta = subject_meta(parameters, &label)?;
        let shape = meta.as_mapping()?;

        let declared_key = attr(&element, XmlAttr::DeclaredKeyType)?;
        let declared_value = attr(&element, XmlAttr::DeclaredValueType)?;
        if declared_key != shape.key_label() || declared_value != shape.value_label() {
            return Err(TransformationError::Document {
                detail: format!(
                    "mapping `{label}` declares `{declared_key}`/`{declared_value}`, \
                     registered as `{}`/`{}`",
                    shape.key_label(),
                    shape.value_label()
                ),
            });
        }

        if let Some(existing) = reuse_or_begin(parameters, id)? {
            return Ok(TransformationOutput::Value(existing));
        }

        let mut entries = Vec::with_capacity(element.children().len());
        for child in element.children() {
            if child.name() != XmlTag::Entry.as_str() {
                return Err(TransformationError::Document {
                    detail: format!(
                        "unexpected `{}` element inside a mapping object",
                        child.name()
                    ),
                });
            }
            let key_reference: ObjectId = attr(child, XmlAttr::ReferencedKey)?.parse()?;
            let value_reference: ObjectId = attr(child, XmlAttr::ReferencedValue)?.parse()?;

            // Mapping entries are owned by the map on both sides.
            let key = resolve_reference(factory, parameters, key_reference, declared_key, true)?;
            let value =
                resolve_reference(factory, parameters, value_reference, declared_value, true)?;
            entries.push((key, value));
        }

        let built = shape.build(entries)?;
        finish(parameters, id, Rc::clone(&built))?;
        Ok(TransformationOutput::Value(built))
    }
}

// -----------------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------------
