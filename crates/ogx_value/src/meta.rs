use core::any::{Any, TypeId, type_name};
use core::marker::PhantomData;
use core::{error, fmt};
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::rc::Rc;

use crate::field_values::FieldValues;
use crate::scalar::{ScalarParseError, ScalarValue};

// -----------------------------------------------------------------------------
// TypeKind

/// The closed set of shapes a registered type can take.
///
/// Rule dispatch in the shipped rule set keys off this kind, so the
/// applicability predicates of the four rules per direction are disjoint by
/// construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeKind {
    /// A text-renderable leaf value.
    Scalar,
    /// A struct-like value with a named field table.
    Composite,
    /// An ordered collection (`Vec<T>`, `Vec<Rc<T>>`).
    Sequence,
    /// A key/value collection (`BTreeMap<K, V>`).
    Mapping,
}

impl fmt::Display for TypeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scalar => f.pad("Scalar"),
            Self::Composite => f.pad("Composite"),
            Self::Sequence => f.pad("Sequence"),
            Self::Mapping => f.pad("Mapping"),
        }
    }
}

/// Error returned when a [`TypeMeta`] is not of the expected [`TypeKind`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeKindError {
    /// Label of the type whose shape was queried.
    pub label: String,
    /// The kind the caller asked for.
    pub expected: TypeKind,
    /// The kind the type is registered with.
    pub actual: TypeKind,
}

impl fmt::Display for TypeKindError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "type `{}` is registered as `{}`, not `{}`",
            self.label, self.actual, self.expected
        )
    }
}

impl error::Error for TypeKindError {}

// -----------------------------------------------------------------------------
// AccessError

/// A enumeration of all error outcomes that might happen when projecting,
/// staging, or rebuilding values through an accessor table.
#[derive(Debug)]
pub enum AccessError {
    /// An accessor was handed an instance of a different type.
    WrongInstanceType {
        /// Type name the accessor was built for.
        expected: &'static str,
    },
    /// A build function asked for a field that was never staged.
    MissingField {
        /// The requested field name.
        field: String,
    },
    /// The same field name was staged twice.
    DuplicateField {
        /// The offending field name.
        field: String,
    },
    /// An owned value was requested but the handle is still shared.
    SharedValue {
        /// Where the shared handle was encountered.
        context: String,
    },
}

impl fmt::Display for AccessError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::WrongInstanceType { expected } => {
                write!(f, "accessor expected an instance of `{expected}`")
            }
            Self::MissingField { field } => {
                write!(f, "no value staged for field `{field}`")
            }
            Self::DuplicateField { field } => {
                write!(f, "field `{field}` staged twice")
            }
            Self::SharedValue { context } => {
                write!(f, "cannot take owned value for {context}: handle is shared")
            }
        }
    }
}

impl error::Error for AccessError {}

// -----------------------------------------------------------------------------
// Accessor function aliases

type ProjectFn = Box<dyn for<'a> Fn(&'a dyn Any) -> Result<&'a dyn Any, AccessError> + Send + Sync>;
type IterFn =
    Box<dyn for<'a> Fn(&'a dyn Any) -> Result<Vec<&'a dyn Any>, AccessError> + Send + Sync>;
type PairIterFn = Box<
    dyn for<'a> Fn(&'a dyn Any) -> Result<Vec<(&'a dyn Any, &'a dyn Any)>, AccessError>
        + Send
        + Sync,
>;
type RenderFn = Box<dyn Fn(&dyn Any) -> Result<String, AccessError> + Send + Sync>;
type ParseFn = Box<dyn Fn(&str) -> Result<Rc<dyn Any>, ScalarParseError> + Send + Sync>;
type BuildFn = Box<dyn Fn(&mut FieldValues) -> Result<Rc<dyn Any>, AccessError> + Send + Sync>;
type SequenceBuildFn =
    Box<dyn Fn(Vec<Rc<dyn Any>>) -> Result<Rc<dyn Any>, AccessError> + Send + Sync>;
type MappingBuildFn =
    Box<dyn Fn(Vec<(Rc<dyn Any>, Rc<dyn Any>)>) -> Result<Rc<dyn Any>, AccessError> + Send + Sync>;

fn downcast_instance<T: Any>(instance: &dyn Any) -> Result<&T, AccessError> {
    instance
        .downcast_ref::<T>()
        .ok_or(AccessError::WrongInstanceType {
            expected: type_name::<T>(),
        })
}

/// Moves an owned `T` out of a freshly built [`Rc`] handle.
pub(crate) fn unwrap_owned<T: Any>(
    value: Rc<dyn Any>,
    context: &str,
) -> Result<T, AccessError> {
    let typed = value
        .downcast::<T>()
        .map_err(|_| AccessError::WrongInstanceType {
            expected: type_name::<T>(),
        })?;
    Rc::try_unwrap(typed).map_err(|_| AccessError::SharedValue {
        context: context.to_string(),
    })
}

// -----------------------------------------------------------------------------
// FieldSpec

/// One entry of a composite's accessor table.
///
/// Carries the persisted field name, the declared type label (the
/// `declaredType` attribute), whether the field holds a shared [`Rc`] handle,
/// whether it is exempt from persistence, and the getter projection.
pub struct FieldSpec {
    name: &'static str,
    declared_label: &'static str,
    shared: bool,
    exempt: bool,
    get: ProjectFn,
}

impl FieldSpec {
    /// The persisted field name.
    #[inline]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// The declared type label of the field.
    #[inline]
    pub fn declared_label(&self) -> &'static str {
        self.declared_label
    }

    /// Whether the field holds a shared [`Rc`] handle.
    #[inline]
    pub fn is_shared(&self) -> bool {
        self.shared
    }

    /// Whether the field is excluded from persistence.
    #[inline]
    pub fn is_exempt(&self) -> bool {
        self.exempt
    }

    /// Projects the field value out of a composite instance.
    ///
    /// For shared fields the projection already dereferences the [`Rc`], so
    /// identity follows the referenced allocation, not the handle.
    #[inline]
    pub fn get<'a>(&self, instance: &'a dyn Any) -> Result<&'a dyn Any, AccessError> {
        (self.get)(instance)
    }
}

impl fmt::Debug for FieldSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldSpec")
            .field("name", &self.name)
            .field("declared_label", &self.declared_label)
            .field("shared", &self.shared)
            .field("exempt", &self.exempt)
            .finish_non_exhaustive()
    }
}

// -----------------------------------------------------------------------------
// Shapes

/// Accessor table of a scalar type.
pub struct ScalarShape {
    render: RenderFn,
    parse: ParseFn,
}

impl ScalarShape {
    /// Renders a scalar instance into its canonical text form.
    #[inline]
    pub fn render(&self, value: &dyn Any) -> Result<String, AccessError> {
        (self.render)(value)
    }

    /// Parses a scalar instance back from its canonical text form.
    #[inline]
    pub fn parse(&self, text: &str) -> Result<Rc<dyn Any>, ScalarParseError> {
        (self.parse)(text)
    }
}

/// Accessor table of a composite type.
pub struct CompositeShape {
    fields: Vec<FieldSpec>,
    build: BuildFn,
}

impl CompositeShape {
    /// The full field table, exempt fields included, in registration order.
    #[inline]
    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    /// The persistable fields, in registration order.
    ///
    /// Exempt fields are skipped; this is the order field elements appear in
    /// the XML output.
    #[inline]
    pub fn persistable_fields(&self) -> impl Iterator<Item = &FieldSpec> {
        self.fields.iter().filter(|field| !field.exempt)
    }

    /// Number of persistable fields.
    #[inline]
    pub fn persistable_len(&self) -> usize {
        self.persistable_fields().count()
    }

    /// Rebuilds an instance from staged field values.
    #[inline]
    pub fn build(&self, values: &mut FieldValues) -> Result<Rc<dyn Any>, AccessError> {
        (self.build)(values)
    }
}

/// Accessor table of a sequence type.
pub struct SequenceShape {
    element_label: &'static str,
    elements_shared: bool,
    iter: IterFn,
    build: SequenceBuildFn,
}

impl SequenceShape {
    /// The declared type label of the sequence elements.
    #[inline]
    pub fn element_label(&self) -> &'static str {
        self.element_label
    }

    /// Whether elements are shared [`Rc`] handles rather than owned values.
    #[inline]
    pub fn elements_shared(&self) -> bool {
        self.elements_shared
    }

    /// Borrows every element of a sequence instance, in order.
    #[inline]
    pub fn iter<'a>(&self, value: &'a dyn Any) -> Result<Vec<&'a dyn Any>, AccessError> {
        (self.iter)(value)
    }

    /// Rebuilds a sequence instance from resolved elements.
    #[inline]
    pub fn build(&self, items: Vec<Rc<dyn Any>>) -> Result<Rc<dyn Any>, AccessError> {
        (self.build)(items)
    }
}

/// Accessor table of a mapping type.
pub struct MappingShape {
    key_label: &'static str,
    value_label: &'static str,
    pairs: PairIterFn,
    build: MappingBuildFn,
}

impl MappingShape {
    /// The declared type label of the mapping keys.
    #[inline]
    pub fn key_label(&self) -> &'static str {
        self.key_label
    }

    /// The declared type label of the mapping values.
    #[inline]
    pub fn value_label(&self) -> &'static str {
        self.value_label
    }

    /// Borrows every entry of a mapping instance, in key order.
    #[inline]
    pub fn pairs<'a>(
        &self,
        value: &'a dyn Any,
    ) -> Result<Vec<(&'a dyn Any, &'a dyn Any)>, AccessError> {
        (self.pairs)(value)
    }

    /// Rebuilds a mapping instance from resolved entries.
    #[inline]
    pub fn build(
        &self,
        entries: Vec<(Rc<dyn Any>, Rc<dyn Any>)>,
    ) -> Result<Rc<dyn Any>, AccessError> {
        (self.build)(entries)
    }
}

/// The kind-specific accessor table of a registered type.
pub enum TypeShape {
    /// See [`ScalarShape`].
    Scalar(ScalarShape),
    /// See [`CompositeShape`].
    Composite(CompositeShape),
    /// See [`SequenceShape`].
    Sequence(SequenceShape),
    /// See [`MappingShape`].
    Mapping(MappingShape),
}

impl TypeShape {
    /// The [`TypeKind`] tag of this shape.
    #[inline]
    pub fn kind(&self) -> TypeKind {
        match self {
            Self::Scalar(_) => TypeKind::Scalar,
            Self::Composite(_) => TypeKind::Composite,
            Self::Sequence(_) => TypeKind::Sequence,
            Self::Mapping(_) => TypeKind::Mapping,
        }
    }
}

// -----------------------------------------------------------------------------
// TypeMeta

/// Registration-time description of one persistable type.
///
/// A `TypeMeta` binds a unique label to a concrete Rust type and the accessor
/// table for its shape. Registered into a
/// [`TypeRegistry`](crate::TypeRegistry), it is everything the engine knows
/// about the type; there is no runtime reflection behind it.
///
/// # Examples
///
/// ```
/// use ogx_value::{TypeMeta, TypeKind};
///
/// #[derive(Debug, PartialEq)]
/// struct Person {
///     first_name: String,
/// }
///
/// let meta = TypeMeta::composite::<Person>("Person")
///     .field("firstName", "String", |p: &Person| &p.first_name)
///     .build(|values| {
///         Ok(Person {
///             first_name: values.take("firstName")?,
///         })
///     });
///
/// assert_eq!(meta.label(), "Person");
/// assert_eq!(meta.kind(), TypeKind::Composite);
/// assert!(meta.is_composite());
/// ```
pub struct TypeMeta {
    label: Cow<'static, str>,
    type_id: TypeId,
    type_name: &'static str,
    shape: TypeShape,
}

impl TypeMeta {
    /// Creates the metadata of a scalar type from its [`ScalarValue`] impl.
    pub fn scalar<T: ScalarValue>() -> Self {
        let render: RenderFn = Box::new(|value: &dyn Any| {
            let typed = downcast_instance::<T>(value)?;
            Ok(typed.render())
        });
        let parse: ParseFn =
            Box::new(|text: &str| T::parse(text).map(|value| Rc::new(value) as Rc<dyn Any>));
        Self {
            label: Cow::Borrowed(T::LABEL),
            type_id: TypeId::of::<T>(),
            type_name: type_name::<T>(),
            shape: TypeShape::Scalar(ScalarShape { render, parse }),
        }
    }

    /// Starts the metadata of a composite type.
    ///
    /// Fields are added in declaration order with
    /// [`field`](CompositeMetaBuilder::field) /
    /// [`shared_field`](CompositeMetaBuilder::shared_field), and the builder
    /// is finished with [`build`](CompositeMetaBuilder::build).
    pub fn composite<T: Any>(label: impl Into<Cow<'static, str>>) -> CompositeMetaBuilder<T> {
        CompositeMetaBuilder {
            label: label.into(),
            fields: Vec::new(),
            _marker: PhantomData,
        }
    }

    /// Creates the metadata of a `Vec<T>` sequence with owned elements.
    pub fn sequence_of<T: Any>(
        label: impl Into<Cow<'static, str>>,
        element_label: &'static str,
    ) -> Self {
        let iter: IterFn = Box::new(|value: &dyn Any| {
            let items = downcast_instance::<Vec<T>>(value)?;
            Ok(items.iter().map(|item| item as &dyn Any).collect())
        });
        let build: SequenceBuildFn = Box::new(|items: Vec<Rc<dyn Any>>| {
            let items = items
                .into_iter()
                .map(|item| unwrap_owned::<T>(item, "sequence element"))
                .collect::<Result<Vec<T>, AccessError>>()?;
            Ok(Rc::new(items) as Rc<dyn Any>)
        });
        Self {
            label: label.into(),
            type_id: TypeId::of::<Vec<T>>(),
            type_name: type_name::<Vec<T>>(),
            shape: TypeShape::Sequence(SequenceShape {
                element_label,
                elements_shared: false,
                iter,
                build,
            }),
        }
    }

    /// Creates the metadata of a `Vec<Rc<T>>` sequence with shared elements.
    ///
    /// Element identity follows the referenced allocations, so an element
    /// aliased elsewhere in the graph serializes once.
    pub fn shared_sequence_of<T: Any>(
        label: impl Into<Cow<'static, str>>,
        element_label: &'static str,
    ) -> Self {
        let iter: IterFn = Box::new(|value: &dyn Any| {
            let items = downcast_instance::<Vec<Rc<T>>>(value)?;
            Ok(items.iter().map(|item| &**item as &dyn Any).collect())
        });
        let build: SequenceBuildFn = Box::new(|items: Vec<Rc<dyn Any>>| {
            let items = items
                .into_iter()
                .map(|item| {
                    item.downcast::<T>()
                        .map_err(|_| AccessError::WrongInstanceType {
                            expected: type_name::<T>(),
                        })
                })
                .collect::<Result<Vec<Rc<T>>, AccessError>>()?;
            Ok(Rc::new(items) as Rc<dyn Any>)
        });
        Self {
            label: label.into(),
            type_id: TypeId::of::<Vec<Rc<T>>>(),
            type_name: type_name::<Vec<Rc<T>>>(),
            shape: TypeShape::Sequence(SequenceShape {
                element_label,
                elements_shared: true,
                iter,
                build,
            }),
        }
    }

    /// Creates the metadata of a `BTreeMap<K, V>` mapping.
    ///
    /// `BTreeMap` keeps entries in key order, so serialization output is
    /// deterministic.
    pub fn mapping_of<K: Any + Ord, V: Any>(
        label: impl Into<Cow<'static, str>>,
        key_label: &'static str,
        value_label: &'static str,
    ) -> Self {
        let pairs: PairIterFn = Box::new(|value: &dyn Any| {
            let map = downcast_instance::<BTreeMap<K, V>>(value)?;
            Ok(map
                .iter()
                .map(|(key, value)| (key as &dyn Any, value as &dyn Any))
                .collect())
        });
        let build: MappingBuildFn = Box::new(|entries: Vec<(Rc<dyn Any>, Rc<dyn Any>)>| {
            let mut map = BTreeMap::new();
            for (key, value) in entries {
                let key = unwrap_owned::<K>(key, "mapping key")?;
                let value = unwrap_owned::<V>(value, "mapping value")?;
                map.insert(key, value);
            }
            Ok(Rc::new(map) as Rc<dyn Any>)
        });
        Self {
            label: label.into(),
            type_id: TypeId::of::<BTreeMap<K, V>>(),
            type_name: type_name::<BTreeMap<K, V>>(),
            shape: TypeShape::Mapping(MappingShape {
                key_label,
                value_label,
                pairs,
                build,
            }),
        }
    }

    /// The registry label.
    #[inline]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// The [`TypeId`] of the described Rust type.
    #[inline]
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// The Rust type name, for diagnostics only.
    #[inline]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// The shape kind.
    #[inline]
    pub fn kind(&self) -> TypeKind {
        self.shape.kind()
    }

    /// The kind-specific accessor table.
    #[inline]
    pub fn shape(&self) -> &TypeShape {
        &self.shape
    }

    /// Whether this type is a composite with a non-empty persistable field
    /// set.
    ///
    /// A composite registered without persistable fields is *not* composite
    /// in this model; every listed field carries both a getter projection and
    /// a build-time setter by construction.
    #[inline]
    pub fn is_composite(&self) -> bool {
        match &self.shape {
            TypeShape::Composite(shape) => shape.persistable_len() > 0,
            _ => false,
        }
    }

    /// The scalar accessor table, or a kind error.
    pub fn as_scalar(&self) -> Result<&ScalarShape, TypeKindError> {
        match &self.shape {
            TypeShape::Scalar(shape) => Ok(shape),
            other => Err(self.kind_error(TypeKind::Scalar, other.kind())),
        }
    }

    /// The composite accessor table, or a kind error.
    pub fn as_composite(&self) -> Result<&CompositeShape, TypeKindError> {
        match &self.shape {
            TypeShape::Composite(shape) => Ok(shape),
            other => Err(self.kind_error(TypeKind::Composite, other.kind())),
        }
    }

    /// The sequence accessor table, or a kind error.
    pub fn as_sequence(&self) -> Result<&SequenceShape, TypeKindError> {
        match &self.shape {
            TypeShape::Sequence(shape) => Ok(shape),
            other => Err(self.kind_error(TypeKind::Sequence, other.kind())),
        }
    }

    /// The mapping accessor table, or a kind error.
    pub fn as_mapping(&self) -> Result<&MappingShape, TypeKindError> {
        match &self.shape {
            TypeShape::Mapping(shape) => Ok(shape),
            other => Err(self.kind_error(TypeKind::Mapping, other.kind())),
        }
    }

    fn kind_error(&self, expected: TypeKind, actual: TypeKind) -> TypeKindError {
        TypeKindError {
            label: self.label.to_string(),
            expected,
            actual,
        }
    }
}

impl fmt::Debug for TypeMeta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeMeta")
            .field("label", &self.label)
            .field("kind", &self.kind())
            .field("type_name", &self.type_name)
            .finish_non_exhaustive()
    }
}

// -----------------------------------------------------------------------------
// CompositeMetaBuilder

/// Builder for the accessor table of a composite type.
///
/// Field registration order is the persisted field order.
pub struct CompositeMetaBuilder<T> {
    label: Cow<'static, str>,
    fields: Vec<FieldSpec>,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Any> CompositeMetaBuilder<T> {
    /// Registers an owned field with its getter projection.
    pub fn field<F, G>(
        mut self,
        name: &'static str,
        declared_label: &'static str,
        project: G,
    ) -> Self
    where
        F: Any,
        G: Fn(&T) -> &F + Send + Sync + 'static,
    {
        let get: ProjectFn = Box::new(move |instance: &dyn Any| {
            let typed = downcast_instance::<T>(instance)?;
            Ok(project(typed) as &dyn Any)
        });
        self.fields.push(FieldSpec {
            name,
            declared_label,
            shared: false,
            exempt: false,
            get,
        });
        self
    }

    /// Registers a shared [`Rc`] field with its getter projection.
    ///
    /// The projection returns the handle; the stored getter dereferences it,
    /// so two clones of one `Rc` are the same instance to the identity cache.
    pub fn shared_field<F, G>(
        mut self,
        name: &'static str,
        declared_label: &'static str,
        project: G,
    ) -> Self
    where
        F: Any,
        G: Fn(&T) -> &Rc<F> + Send + Sync + 'static,
    {
        let get: ProjectFn = Box::new(move |instance: &dyn Any| {
            let typed = downcast_instance::<T>(instance)?;
            Ok(&**project(typed) as &dyn Any)
        });
        self.fields.push(FieldSpec {
            name,
            declared_label,
            shared: true,
            exempt: false,
            get,
        });
        self
    }

    /// Marks a previously registered field as exempt from persistence.
    ///
    /// # Panics
    ///
    /// Panics if no field with the given name has been registered; an exempt
    /// mark on an unknown field is a registration bug.
    pub fn exempt(mut self, name: &'static str) -> Self {
        match self.fields.iter_mut().find(|field| field.name == name) {
            Some(field) => field.exempt = true,
            None => panic!(
                "Called `CompositeMetaBuilder::exempt` for unregistered field `{name}` on `{}`",
                self.label,
            ),
        }
        self
    }

    /// Finishes the builder with the build function used by deserialization.
    pub fn build<B>(self, build: B) -> TypeMeta
    where
        B: Fn(&mut FieldValues) -> Result<T, AccessError> + Send + Sync + 'static,
    {
        let build: BuildFn = Box::new(move |values: &mut FieldValues| {
            build(values).map(|value| Rc::new(value) as Rc<dyn Any>)
        });
        TypeMeta {
            label: self.label,
            type_id: TypeId::of::<T>(),
            type_name: type_name::<T>(),
            shape: TypeShape::Composite(CompositeShape {
                fields: self.fields,
                build,
            }),
        }
    }
}

// -----------------------------------------------------------------------------
// Tests
