//! The error type of the persistence entry points.

use core::fmt;

use ogx_engine::{ReferenceError, TransformationError};
use ogx_xml::XmlError;

// -----------------------------------------------------------------------------
// PersistError
// -----------------------------------------------------------------------------

/// Any failure raised by [`XmlSerializer`](crate::XmlSerializer) or
/// [`XmlDeserializer`](crate::XmlDeserializer).
#[derive(Debug)]
pub enum PersistError {
    /// A transformation rule failed or none applied.
    Transformation(TransformationError),
    /// The document could not be parsed or written.
    Xml(XmlError),
    /// An object reference could not be resolved.
    Reference(ReferenceError),
    /// The document violates the expected structure.
    Document { detail: String },
    /// The rebuilt root object is not of the requested type.
    RootType {
        /// Type name the caller asked for.
        expected: &'static str,
    },
    /// The rebuilt root object is still referenced elsewhere and cannot be
    /// handed out by value.
    RootShared,
}

impl PersistError {
    pub(crate) fn document(detail: impl Into<String>) -> Self {
        Self::Document {
            detail: detail.into(),
        }
    }
}

impl fmt::Display for PersistError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transformation(error) => fmt::Display::fmt(error, f),
            Self::Xml(error) => fmt::Display::fmt(error, f),
            Self::Reference(error) => fmt::Display::fmt(error, f),
            Self::Document { detail } => {
                write!(f, "malformed document: {detail}")
            }
            Self::RootType { expected } => {
                write!(f, "root object is not of type `{expected}`")
            }
            Self::RootShared => {
                write!(f, "root object is still shared and cannot be moved out")
            }
        }
    }
}

impl core::error::Error for PersistError {
    fn source(&self) -> Option<&(dyn core::error::Error + 'static)> {
        match self {
            Self::Transformation(error) => Some(error),
            Self::Xml(error) => Some(error),
            Self::Reference(error) => Some(error),
            _ => None,
        }
    }
}

impl From<TransformationError> for PersistError {
    #[inline]
    fn from(error: TransformationError) -> Self {
        Self::Transformation(error)
    }
}

impl From<XmlError> for PersistError {
    #[inline]
    fn from(error: XmlError) -> Self {
        Self::Xml(error)
    }
}

impl From<ReferenceError> for PersistError {
    #[inline]
    fn from(error: ReferenceError) -> Self {
        Self::Reference(error)
    }
}
