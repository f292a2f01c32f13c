//! The mutable state threaded through one transformation run.

use std::any::Any;
use std::borrow::Cow;
use std::collections::HashMap;
use std::rc::Rc;

use ogx_value::TypeRegistry;
use ogx_xml::XmlElement;

use crate::error::TransformationError;
use crate::path::TransformationPath;

// -----------------------------------------------------------------------------
// Subject
// -----------------------------------------------------------------------------

/// The item a transformation is currently looking at.
///
/// Serialization walks live object graph nodes, deserialization walks
/// document elements; rules on a path only ever see one of the two forms.
#[derive(Clone)]
pub enum Subject<'a> {
    /// A borrowed object graph node.
    Node(&'a dyn Any),
    /// A document element, shared so child traversals stay cheap.
    Element(Rc<XmlElement>),
}

// -----------------------------------------------------------------------------
// TransformationParameters
// -----------------------------------------------------------------------------

/// Everything a rule needs to act: the path, the subject, the type
/// registry, and a bag of named prerequisites.
///
/// Prerequisites are how rules on the same run share working state, for
/// example the object identity cache during serialization. They are keyed
/// by name and stored type-erased; accessors downcast on the way out.
///
/// A rule descending into child nodes swaps the subject (and declared
/// label) in place, recurses through the factory, then restores the
/// previous values:
///
/// ```
/// use ogx_engine::{Subject, TransformationParameters, TransformationPath};
/// use ogx_value::TypeRegistry;
///
/// let registry = TypeRegistry::with_scalars();
/// let node = 7_u32;
/// let child = String::from("child");
///
/// let mut parameters = TransformationParameters::new(
///     TransformationPath::new("Object", "XML"),
///     &registry,
///     Subject::Node(&node),
/// );
///
/// let previous = parameters.replace_subject(Subject::Node(&child));
/// // ... recurse through the factory here ...
/// parameters.replace_subject(previous);
/// assert!(parameters.subject_node().is_ok());
/// ```
pub struct TransformationParameters<'a> {
    path: TransformationPath,
    registry: &'a TypeRegistry,
    subject: Subject<'a>,
    declared_label: Option<Cow<'a, str>>,
    prerequisites: HashMap<&'static str, Box<dyn Any>>,
}

impl<'a> TransformationParameters<'a> {
    /// Creates parameters for one transformation request.
    pub fn new(path: TransformationPath, registry: &'a TypeRegistry, subject: Subject<'a>) -> Self {
        Self {
            path,
            registry,
            subject,
            declared_label: None,
            prerequisites: HashMap::new(),
        }
    }

    /// The direction this run transforms along.
    #[inline]
    pub fn path(&self) -> &TransformationPath {
        &self.path
    }

    /// The type registry rules consult for shape information.
    #[inline]
    pub fn registry(&self) -> &'a TypeRegistry {
        self.registry
    }

    /// The current subject.
    #[inline]
    pub fn subject(&self) -> Subject<'a> {
        self.subject.clone()
    }

    /// The current subject as an object graph node.
    pub fn subject_node(&self) -> Result<&'a dyn Any, TransformationError> {
        match &self.subject {
            Subject::Node(node) => Ok(*node),
            Subject::Element(_) => Err(TransformationError::WrongSubject {
                expected: "object graph node",
            }),
        }
    }

    /// The current subject as a document element.
    pub fn subject_element(&self) -> Result<Rc<XmlElement>, TransformationError> {
        match &self.subject {
            Subject::Element(element) => Ok(Rc::clone(element)),
            Subject::Node(_) => Err(TransformationError::WrongSubject {
                expected: "document element",
            }),
        }
    }

    /// Installs a new subject and returns the previous one.
    #[inline]
    pub fn replace_subject(&mut self, subject: Subject<'a>) -> Subject<'a> {
        std::mem::replace(&mut self.subject, subject)
    }

    /// The label the surrounding context declares for the subject, if any.
    ///
    /// A field carries the declared type of its value; the root subject of a
    /// run carries none.
    #[inline]
    pub fn declared_label(&self) -> Option<&str> {
        self.declared_label.as_deref()
    }

    /// Installs a declared label and returns the previous one.
    #[inline]
    pub fn replace_declared_label(
        &mut self,
        label: Option<Cow<'a, str>>,
    ) -> Option<Cow<'a, str>> {
        std::mem::replace(&mut self.declared_label, label)
    }

    /// Stores `value` under `name`, replacing any previous prerequisite of
    /// that name.
    pub fn set_prerequisite<T: Any>(&mut self, name: &'static str, value: T) {
        self.prerequisites.insert(name, Box::new(value));
    }

    /// Borrows the prerequisite stored under `name`.
    pub fn prerequisite<T: Any>(&self, name: &'static str) -> Result<&T, TransformationError> {
        self.prerequisites
            .get(name)
            .ok_or(TransformationError::MissingPrerequisite { name })?
            .downcast_ref::<T>()
            .ok_or(TransformationError::PrerequisiteType { name })
    }

    /// Mutably borrows the prerequisite stored under `name`.
    pub fn prerequisite_mut<T: Any>(
        &mut self,
        name: &'static str,
    ) -> Result<&mut T, TransformationError> {
        self.prerequisites
            .get_mut(name)
            .ok_or(TransformationError::MissingPrerequisite { name })?
            .downcast_mut::<T>()
            .ok_or(TransformationError::PrerequisiteType { name })
    }

    /// Removes and returns the prerequisite stored under `name`.
    pub fn take_prerequisite<T: Any>(
        &mut self,
        name: &'static str,
    ) -> Result<T, TransformationError> {
        let boxed = self
            .prerequisites
            .remove(name)
            .ok_or(TransformationError::MissingPrerequisite { name })?;
        match boxed.downcast::<T>() {
            Ok(value) => Ok(*value),
            Err(boxed) => {
                self.prerequisites.insert(name, boxed);
                Err(TransformationError::PrerequisiteType { name })
            }
        }
    }
}

// -----------------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------------
