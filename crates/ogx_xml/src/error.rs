use core::{error, fmt};
use std::io;

// -----------------------------------------------------------------------------
// XmlError

/// A enumeration of all error outcomes that might happen when parsing or
/// writing a document.
#[derive(Debug)]
pub enum XmlError {
    /// The underlying XML stream is malformed at the lexical level.
    Parse {
        /// Parser diagnostic.
        detail: String,
    },
    /// The stream is well-formed XML but not an element-only document.
    Malformed {
        /// What was unexpected.
        detail: String,
    },
    /// Writing the event stream failed.
    Write {
        /// Writer diagnostic.
        detail: String,
    },
    /// Names or attribute values are not valid UTF-8.
    Encoding {
        /// Decoder diagnostic.
        detail: String,
    },
    /// Reading or writing the backing file failed.
    Io(io::Error),
}

impl XmlError {
    pub(crate) fn parse(detail: impl fmt::Display) -> Self {
        Self::Parse {
            detail: detail.to_string(),
        }
    }

    pub(crate) fn malformed(detail: impl Into<String>) -> Self {
        Self::Malformed {
            detail: detail.into(),
        }
    }

    pub(crate) fn write(detail: impl fmt::Display) -> Self {
        Self::Write {
            detail: detail.to_string(),
        }
    }

    pub(crate) fn encoding(detail: impl fmt::Display) -> Self {
        Self::Encoding {
            detail: detail.to_string(),
        }
    }
}

impl fmt::Display for XmlError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Parse { detail } => write!(f, "malformed XML: {detail}"),
            Self::Malformed { detail } => write!(f, "unsupported document shape: {detail}"),
            Self::Write { detail } => write!(f, "cannot write XML: {detail}"),
            Self::Encoding { detail } => write!(f, "invalid encoding: {detail}"),
            Self::Io(_) => write!(f, "file I/O failed"),
        }
    }
}

impl error::Error for XmlError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            Self::Io(source) => Some(source),
            _ => None,
        }
    }
}

impl From<io::Error> for XmlError {
    #[inline]
    fn from(source: io::Error) -> Self {
        Self::Io(source)
    }
}
