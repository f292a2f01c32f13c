//! The error type transformation runs surface.

use core::fmt;

use ogx_value::{AccessError, RegistryError, ScalarParseError, TypeKindError};

use crate::cache::ReferenceError;
use crate::path::TransformationPath;

// -----------------------------------------------------------------------------
// TransformationError
// -----------------------------------------------------------------------------

/// Any failure raised while dispatching or executing transformation rules.
///
/// Rule implementations bubble the lower-level errors of the type layer and
/// the reference bookkeeping through `?`; the dispatch-level variants are
/// produced by the factory and the parameter accessors themselves.
#[derive(Debug)]
pub enum TransformationError {
    /// No rule at all is registered for the requested path.
    UnknownPath { path: TransformationPath },
    /// Rules exist for the path but every one declined the subject.
    NoApplicableRule { path: TransformationPath },
    /// A rule asked for a prerequisite nobody provided.
    MissingPrerequisite { name: &'static str },
    /// A prerequisite exists but holds a different type.
    PrerequisiteType { name: &'static str },
    /// The subject has the wrong form for the requested access.
    WrongSubject { expected: &'static str },
    /// A transformation answered with the other output form.
    UnexpectedOutput { expected: &'static str },
    /// The input document violates the expected structure.
    Document { detail: String },
    /// A field or instance access failed.
    Access(AccessError),
    /// A type was used as the wrong kind.
    Kind(TypeKindError),
    /// A registry lookup or consistency check failed.
    Registry(RegistryError),
    /// A scalar value failed to parse.
    Scalar(ScalarParseError),
    /// An object reference could not be resolved.
    Reference(ReferenceError),
}

impl fmt::Display for TransformationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownPath { path } => {
                write!(f, "no rules are registered for path {path}")
            }
            Self::NoApplicableRule { path } => {
                write!(f, "no rule on path {path} accepts the subject")
            }
            Self::MissingPrerequisite { name } => {
                write!(f, "prerequisite `{name}` was not provided")
            }
            Self::PrerequisiteType { name } => {
                write!(f, "prerequisite `{name}` holds an unexpected type")
            }
            Self::WrongSubject { expected } => {
                write!(f, "the subject is not {expected}")
            }
            Self::UnexpectedOutput { expected } => {
                write!(f, "the transformation did not produce {expected}")
            }
            Self::Document { detail } => {
                write!(f, "malformed document: {detail}")
            }
            Self::Access(error) => fmt::Display::fmt(error, f),
            Self::Kind(error) => fmt::Display::fmt(error, f),
            Self::Registry(error) => fmt::Display::fmt(error, f),
            Self::Scalar(error) => fmt::Display::fmt(error, f),
            Self::Reference(error) => fmt::Display::fmt(error, f),
        }
    }
}

impl core::error::Error for TransformationError {
    fn source(&self) -> Option<&(dyn core::error::Error + 'static)> {
        match self {
            Self::Access(error) => Some(error),
            Self::Kind(error) => Some(error),
            Self::Registry(error) => Some(error),
            Self::Scalar(error) => Some(error),
            Self::Reference(error) => Some(error),
            _ => None,
        }
    }
}

impl From<AccessError> for TransformationError {
    #[inline]
    fn from(error: AccessError) -> Self {
        Self::Access(error)
    }
}

impl From<TypeKindError> for TransformationError {
    #[inline]
    fn from(error: TypeKindError) -> Self {
        Self::Kind(error)
    }
}

impl From<RegistryError> for TransformationError {
    #[inline]
    fn from(error: RegistryError) -> Self {
        Self::Registry(error)
    }
}

impl From<ScalarParseError> for TransformationError {
    #[inline]
    fn from(error: ScalarParseError) -> Self {
        Self::Scalar(error)
    }
}

impl From<ReferenceError> for TransformationError {
    #[inline]
    fn from(error: ReferenceError) -> Self {
        Self::Reference(error)
    }
}

// -----------------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use core::error::Error as _;

    use super::TransformationError;
    use crate::cache::{ObjectId, ReferenceError};
    use crate::path::TransformationPath;

    #[test]
    fn dispatch_errors_name_the_path() {
        let error = TransformationError::NoApplicableRule {
            path: TransformationPath::new("Object", "XML"),
        };
        assert_eq!(error.to_string(), "no rule on path Object->XML accepts the subject");
    }

    #[test]
    fn wrapped_errors_expose_a_source() {
        let error = TransformationError::from(ReferenceError::Dangling {
            id: ObjectId::ORIGIN,
        });
        assert!(error.source().is_some());
        assert!(error.to_string().contains("no matching definition"));
    }
}
