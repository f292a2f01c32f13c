use core::any::{Any, TypeId};
use core::{error, fmt};
use std::collections::HashMap;

use crate::meta::{FieldSpec, TypeMeta};
use crate::scalar::ScalarValue;

// -----------------------------------------------------------------------------
// TypeRegistry

/// A registry of persistable types.
///
/// This is the central store for [`TypeMeta`] entries, indexed both by label
/// (the `type` attribute in documents) and by [`TypeId`] (the subject of an
/// in-memory transformation). Once built it is read-only and may be shared
/// across concurrent serialize/deserialize calls.
///
/// # Examples
///
/// ```
/// use ogx_value::{TypeMeta, TypeRegistry};
///
/// struct Person {
///     name: String,
/// }
///
/// let mut registry = TypeRegistry::with_scalars();
/// registry
///     .register(
///         TypeMeta::composite::<Person>("Person")
///             .field("name", "String", |p: &Person| &p.name)
///             .build(|values| Ok(Person { name: values.take("name")? })),
///     )
///     .unwrap();
///
/// assert!(registry.is_composite("Person").unwrap());
/// assert!(!registry.is_composite("String").unwrap());
/// ```
#[derive(Default)]
pub struct TypeRegistry {
    meta_table: HashMap<TypeId, TypeMeta>,
    label_to_id: HashMap<String, TypeId>,
}

impl TypeRegistry {
    /// Creates an empty registry.
    #[inline]
    pub fn empty() -> Self {
        Self {
            meta_table: HashMap::new(),
            label_to_id: HashMap::new(),
        }
    }

    /// Creates a registry with the default scalar set pre-registered.
    ///
    /// - `bool` `char`
    /// - `u8` - `u128`, `usize`
    /// - `i8` - `i128`, `isize`
    /// - `f32` `f64`
    /// - `String`
    pub fn with_scalars() -> Self {
        let mut registry = Self::empty();
        registry.insert_scalar::<bool>();
        registry.insert_scalar::<char>();
        registry.insert_scalar::<u8>();
        registry.insert_scalar::<u16>();
        registry.insert_scalar::<u32>();
        registry.insert_scalar::<u64>();
        registry.insert_scalar::<u128>();
        registry.insert_scalar::<usize>();
        registry.insert_scalar::<i8>();
        registry.insert_scalar::<i16>();
        registry.insert_scalar::<i32>();
        registry.insert_scalar::<i64>();
        registry.insert_scalar::<i128>();
        registry.insert_scalar::<isize>();
        registry.insert_scalar::<f32>();
        registry.insert_scalar::<f64>();
        registry.insert_scalar::<String>();
        registry
    }

    // Fresh scalar set, duplicates impossible.
    fn insert_scalar<T: ScalarValue>(&mut self) {
        let meta = TypeMeta::scalar::<T>();
        self.label_to_id
            .insert(meta.label().to_string(), meta.type_id());
        self.meta_table.insert(meta.type_id(), meta);
    }

    /// Registers a type.
    ///
    /// Duplicate labels and duplicate [`TypeId`]s are configuration errors
    /// and rejected outright.
    pub fn register(&mut self, meta: TypeMeta) -> Result<(), RegistryError> {
        if self.label_to_id.contains_key(meta.label()) {
            return Err(RegistryError::DuplicateLabel {
                label: meta.label().to_string(),
            });
        }
        if self.meta_table.contains_key(&meta.type_id()) {
            return Err(RegistryError::DuplicateType {
                type_name: meta.type_name(),
            });
        }
        self.label_to_id
            .insert(meta.label().to_string(), meta.type_id());
        self.meta_table.insert(meta.type_id(), meta);
        Ok(())
    }

    /// Whether a type with the given label has been registered.
    #[inline]
    pub fn contains_label(&self, label: &str) -> bool {
        self.label_to_id.contains_key(label)
    }

    /// Whether the type with the given [`TypeId`] has been registered.
    #[inline]
    pub fn contains_id(&self, type_id: TypeId) -> bool {
        self.meta_table.contains_key(&type_id)
    }

    /// Returns the metadata registered under the given [`TypeId`], if any.
    #[inline]
    pub fn meta_by_id(&self, type_id: TypeId) -> Option<&TypeMeta> {
        self.meta_table.get(&type_id)
    }

    /// Returns the metadata registered under the given label, if any.
    pub fn meta_by_label(&self, label: &str) -> Option<&TypeMeta> {
        match self.label_to_id.get(label) {
            Some(id) => self.meta_by_id(*id),
            None => None,
        }
    }

    /// Returns the metadata for a value's concrete type.
    ///
    /// An unregistered type fails loudly; there is no fallback shape.
    pub fn meta_of(&self, value: &dyn Any) -> Result<&TypeMeta, RegistryError> {
        self.meta_by_id(value.type_id())
            .ok_or_else(|| RegistryError::UnknownType {
                detail: format!("{:?}", value.type_id()),
            })
    }

    /// Returns the metadata registered under the given label, or an
    /// unknown-label error.
    pub fn require_label(&self, label: &str) -> Result<&TypeMeta, RegistryError> {
        self.meta_by_label(label)
            .ok_or_else(|| RegistryError::UnknownLabel {
                label: label.to_string(),
            })
    }

    /// Returns the registered label of a value's concrete type.
    pub fn label_of(&self, value: &dyn Any) -> Result<&str, RegistryError> {
        Ok(self.meta_of(value)?.label())
    }

    /// Whether the labeled type is a composite with a non-empty persistable
    /// field set.
    ///
    /// See [`TypeMeta::is_composite`]; an unknown label is an error, not
    /// `false`.
    pub fn is_composite(&self, label: &str) -> Result<bool, RegistryError> {
        Ok(self.require_label(label)?.is_composite())
    }

    /// The persistable fields of a labeled composite, in registration order.
    ///
    /// Fails for unknown labels and for types registered with a
    /// non-composite shape.
    pub fn persistable_fields(&self, label: &str) -> Result<Vec<&FieldSpec>, RegistryError> {
        let meta = self.require_label(label)?;
        let shape = meta
            .as_composite()
            .map_err(|_| RegistryError::NotComposite {
                label: label.to_string(),
            })?;
        Ok(shape.persistable_fields().collect())
    }

    /// Number of registered types.
    #[inline]
    pub fn len(&self) -> usize {
        self.meta_table.len()
    }

    /// Whether the registry is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.meta_table.is_empty()
    }

    /// Returns an iterator over the registered metadata entries.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = &TypeMeta> {
        self.meta_table.values()
    }
}

impl fmt::Debug for TypeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.label_to_id.keys()).finish()
    }
}

// -----------------------------------------------------------------------------
// RegistryError

/// A enumeration of all error outcomes that might happen when registering or
/// looking up type metadata.
#[derive(Debug)]
pub enum RegistryError {
    /// A second type was registered under an existing label.
    DuplicateLabel {
        /// The contested label.
        label: String,
    },
    /// The same Rust type was registered twice.
    DuplicateType {
        /// The Rust type name.
        type_name: &'static str,
    },
    /// No type is registered under the given label.
    UnknownLabel {
        /// The unknown label.
        label: String,
    },
    /// No type is registered for a value's concrete type.
    UnknownType {
        /// Diagnostic detail (the `TypeId`).
        detail: String,
    },
    /// A composite operation was applied to a non-composite type.
    NotComposite {
        /// The label of the non-composite type.
        label: String,
    },
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateLabel { label } => {
                write!(f, "label `{label}` is already registered")
            }
            Self::DuplicateType { type_name } => {
                write!(f, "type `{type_name}` is already registered")
            }
            Self::UnknownLabel { label } => {
                write!(f, "no type registered under label `{label}`")
            }
            Self::UnknownType { detail } => {
                write!(f, "value of unregistered type ({detail})")
            }
            Self::NotComposite { label } => {
                write!(f, "type `{label}` has no field table")
            }
        }
    }
}

impl error::Error for RegistryError {}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use super::{RegistryError, TypeRegistry};
    use crate::meta::TypeMeta;

    struct Person {
        name: String,
    }

    fn person_meta() -> TypeMeta {
        TypeMeta::composite::<Person>("Person")
            .field("name", "String", |p: &Person| &p.name)
            .build(|values| {
                Ok(Person {
                    name: values.take("name")?,
                })
            })
    }

    #[test]
    fn scalar_set_is_preregistered() {
        let registry = TypeRegistry::with_scalars();
        assert!(registry.contains_label("String"));
        assert!(registry.contains_label("i64"));
        assert!(registry.meta_of(&5_u32).is_ok());
    }

    #[test]
    fn duplicate_label_is_rejected() {
        let mut registry = TypeRegistry::empty();
        registry.register(person_meta()).unwrap();

        struct Other;
        let clash = TypeMeta::composite::<Other>("Person").build(|_| Ok(Other));
        assert!(matches!(
            registry.register(clash),
            Err(RegistryError::DuplicateLabel { .. })
        ));
    }

    #[test]
    fn duplicate_type_is_rejected() {
        let mut registry = TypeRegistry::empty();
        registry.register(person_meta()).unwrap();

        let again = TypeMeta::composite::<Person>("Person2")
            .field("name", "String", |p: &Person| &p.name)
            .build(|values| {
                Ok(Person {
                    name: values.take("name")?,
                })
            });
        assert!(matches!(
            registry.register(again),
            Err(RegistryError::DuplicateType { .. })
        ));
    }

    #[test]
    fn unknown_lookups_fail_loudly() {
        let registry = TypeRegistry::empty();
        assert!(matches!(
            registry.require_label("Person"),
            Err(RegistryError::UnknownLabel { .. })
        ));
        assert!(matches!(
            registry.meta_of(&5_u32),
            Err(RegistryError::UnknownType { .. })
        ));
        assert!(registry.is_composite("Person").is_err());
    }

    #[test]
    fn persistable_fields_require_a_composite() {
        let mut registry = TypeRegistry::with_scalars();
        registry.register(person_meta()).unwrap();

        let fields = registry.persistable_fields("Person").unwrap();
        assert_eq!(fields.len(), 1);
        assert_eq!(fields[0].name(), "name");

        assert!(matches!(
            registry.persistable_fields("String"),
            Err(RegistryError::NotComposite { .. })
        ));
    }
}
