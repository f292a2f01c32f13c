//! Value model and type registry for the `ogx` persistence framework.
//!
//! Instead of runtime reflection, every persistable type is described once at
//! registration time by a [`TypeMeta`]: its label (the `type` attribute in
//! the XML output), its [`TypeKind`], and the accessor table matching that
//! kind. The four kinds form a closed set:
//!
//! - [`TypeKind::Scalar`]: text-renderable leaves (`bool`, the integer and
//!   float types, `char`, `String`).
//! - [`TypeKind::Composite`]: struct-like values with a named field table,
//!   built via [`TypeMeta::composite`].
//! - [`TypeKind::Sequence`]: `Vec<T>` and `Vec<Rc<T>>`.
//! - [`TypeKind::Mapping`]: `BTreeMap<K, V>`.
//!
//! The [`TypeRegistry`] stores the metadata, indexed by label and by
//! [`TypeId`](core::any::TypeId), and is read-only once built.

mod field_values;
mod meta;
mod registry;
mod scalar;

pub use field_values::FieldValues;
pub use meta::{
    AccessError, CompositeMetaBuilder, CompositeShape, FieldSpec, MappingShape, ScalarShape,
    SequenceShape, TypeKind, TypeKindError, TypeMeta, TypeShape,
};
pub use registry::{RegistryError, TypeRegistry};
pub use scalar::{ScalarParseError, ScalarValue};
