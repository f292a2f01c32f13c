//! Malformed and adversarial documents must fail loudly, never panic.

use std::rc::Rc;
use std::sync::Arc;

use ogx::engine::{ReferenceError, TransformationError};
use ogx::prelude::*;
use ogx::xml::XmlDocument;

#[derive(Debug)]
struct Node {
    label: String,
    next: Rc<Node>,
}

fn node_registry() -> Arc<TypeRegistry> {
    let mut registry = TypeRegistry::with_scalars();
    registry
        .register(
            TypeMeta::composite::<Node>("Node")
                .field("label", "String", |n: &Node| &n.label)
                .shared_field("next", "Node", |n: &Node| &n.next)
                .build(|values| {
                    Ok(Node {
                        label: values.take("label")?,
                        next: values.take_shared("next")?,
                    })
                }),
        )
        .unwrap();
    Arc::new(registry)
}

fn rebuild_node(markup: &str) -> Result<Node, PersistError> {
    let document = XmlDocument::parse_str(markup).unwrap();
    XmlDeserializer::new(node_registry()).from_document(&document)
}

#[test]
fn cyclic_document_is_rejected() {
    let result = rebuild_node(
        r#"<objects rootObject="1">
             <object id="1" type="Node">
               <field name="label" declaredType="String" referencedObject="3"/>
               <field name="next" declaredType="Node" referencedObject="2"/>
             </object>
             <object id="2" type="Node">
               <field name="label" declaredType="String" referencedObject="4"/>
               <field name="next" declaredType="Node" referencedObject="1"/>
             </object>
             <object id="3" type="String" value="a"/>
             <object id="4" type="String" value="b"/>
           </objects>"#,
    );
    assert!(matches!(
        result,
        Err(PersistError::Transformation(TransformationError::Reference(
            ReferenceError::CyclicReference { .. }
        )))
    ));
}

#[test]
fn self_reference_is_rejected() {
    let result = rebuild_node(
        r#"<objects rootObject="1">
             <object id="1" type="Node">
               <field name="label" declaredType="String" referencedObject="2"/>
               <field name="next" declaredType="Node" referencedObject="1"/>
             </object>
             <object id="2" type="String" value="a"/>
           </objects>"#,
    );
    assert!(matches!(
        result,
        Err(PersistError::Transformation(TransformationError::Reference(
            ReferenceError::CyclicReference { .. }
        )))
    ));
}

#[test]
fn dangling_field_reference_is_rejected() {
    let result = rebuild_node(
        r#"<objects rootObject="1">
             <object id="1" type="Node">
               <field name="label" declaredType="String" referencedObject="9"/>
               <field name="next" declaredType="Node" referencedObject="1"/>
             </object>
           </objects>"#,
    );
    assert!(matches!(
        result,
        Err(PersistError::Transformation(TransformationError::Reference(
            ReferenceError::Dangling { .. }
        )))
    ));
}

#[test]
fn unknown_type_label_is_rejected() {
    let result = rebuild_node(
        r#"<objects rootObject="1">
             <object id="1" type="Mystery" value="?"/>
           </objects>"#,
    );
    // No rule recognizes an unregistered label.
    assert!(matches!(
        result,
        Err(PersistError::Transformation(
            TransformationError::NoApplicableRule { .. }
        ))
    ));
}

#[test]
fn unknown_field_is_rejected() {
    let result = rebuild_node(
        r#"<objects rootObject="1">
             <object id="1" type="Node">
               <field name="nickname" declaredType="String" referencedObject="2"/>
             </object>
             <object id="2" type="String" value="a"/>
           </objects>"#,
    );
    assert!(matches!(
        result,
        Err(PersistError::Transformation(TransformationError::Document { .. }))
    ));
}

#[test]
fn missing_field_is_rejected() {
    let result = rebuild_node(
        r#"<objects rootObject="1">
             <object id="1" type="Node">
               <field name="label" declaredType="String" referencedObject="2"/>
             </object>
             <object id="2" type="String" value="a"/>
           </objects>"#,
    );
    assert!(matches!(
        result,
        Err(PersistError::Transformation(TransformationError::Access(_)))
    ));
}

#[derive(Debug)]
struct Pair {
    left: String,
    right: String,
}

fn pair_registry() -> Arc<TypeRegistry> {
    let mut registry = TypeRegistry::with_scalars();
    registry
        .register(
            TypeMeta::composite::<Pair>("Pair")
                .field("left", "String", |p: &Pair| &p.left)
                .field("right", "String", |p: &Pair| &p.right)
                .build(|values| {
                    Ok(Pair {
                        left: values.take("left")?,
                        right: values.take("right")?,
                    })
                }),
        )
        .unwrap();
    Arc::new(registry)
}

#[test]
fn aliased_owned_references_are_rejected() {
    // Two owning fields cannot both move the same definition out.
    let document = XmlDocument::parse_str(
        r#"<objects rootObject="1">
             <object id="1" type="Pair">
               <field name="left" declaredType="String" referencedObject="2"/>
               <field name="right" declaredType="String" referencedObject="2"/>
             </object>
             <object id="2" type="String" value="a"/>
           </objects>"#,
    )
    .unwrap();
    let result: Result<Pair, _> = XmlDeserializer::new(pair_registry()).from_document(&document);
    assert!(matches!(
        result,
        Err(PersistError::Transformation(TransformationError::Reference(
            ReferenceError::AlreadyConsumed { .. }
        )))
    ));
}

#[derive(Debug)]
struct Badge {
    title: Rc<String>,
    motto: String,
}

fn badge_registry() -> Arc<TypeRegistry> {
    let mut registry = TypeRegistry::with_scalars();
    registry
        .register(
            TypeMeta::composite::<Badge>("Badge")
                .shared_field("title", "String", |b: &Badge| &b.title)
                .field("motto", "String", |b: &Badge| &b.motto)
                .build(|values| {
                    Ok(Badge {
                        title: values.take_shared("title")?,
                        motto: values.take("motto")?,
                    })
                }),
        )
        .unwrap();
    Arc::new(registry)
}

#[test]
fn owned_alias_of_a_shared_value_is_rejected() {
    let document = XmlDocument::parse_str(
        r#"<objects rootObject="1">
             <object id="1" type="Badge">
               <field name="title" declaredType="String" referencedObject="2"/>
               <field name="motto" declaredType="String" referencedObject="2"/>
             </object>
             <object id="2" type="String" value="a"/>
           </objects>"#,
    )
    .unwrap();
    let result: Result<Badge, _> = XmlDeserializer::new(badge_registry()).from_document(&document);
    assert!(matches!(
        result,
        Err(PersistError::Transformation(TransformationError::Access(_)))
    ));
}

#[test]
fn duplicate_object_id_is_rejected() {
    let result = rebuild_node(
        r#"<objects rootObject="1">
             <object id="1" type="String" value="a"/>
             <object id="1" type="String" value="b"/>
           </objects>"#,
    );
    assert!(matches!(
        result,
        Err(PersistError::Reference(
            ReferenceError::DuplicateDefinition { .. }
        ))
    ));
}

#[test]
fn garbage_id_is_rejected() {
    let result = rebuild_node(
        r#"<objects rootObject="first">
             <object id="first" type="String" value="a"/>
           </objects>"#,
    );
    assert!(matches!(result, Err(PersistError::Reference(_))));
}
