//! Identification of transformation directions.

use core::fmt;
use std::borrow::Cow;

// -----------------------------------------------------------------------------
// TransformationPath
// -----------------------------------------------------------------------------

/// An origin/destination pair naming one direction of transformation.
///
/// A path is pure identification: the engine compares paths to select the
/// rule set for a request, nothing more. Two paths are interchangeable
/// exactly when both components are equal.
///
/// # Examples
///
/// ```
/// use ogx_engine::TransformationPath;
///
/// let path = TransformationPath::new("Object", "XML");
/// assert_eq!(path.origin(), "Object");
/// assert_eq!(path.destination(), "XML");
/// assert_eq!(path.to_string(), "Object->XML");
/// assert_eq!(path, TransformationPath::new("Object", "XML"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TransformationPath {
    origin: Cow<'static, str>,
    destination: Cow<'static, str>,
}

impl TransformationPath {
    /// Creates a path from `origin` towards `destination`.
    #[inline]
    pub fn new(
        origin: impl Into<Cow<'static, str>>,
        destination: impl Into<Cow<'static, str>>,
    ) -> Self {
        Self {
            origin: origin.into(),
            destination: destination.into(),
        }
    }

    /// The format a transformation starts from.
    #[inline]
    pub fn origin(&self) -> &str {
        &self.origin
    }

    /// The format a transformation produces.
    #[inline]
    pub fn destination(&self) -> &str {
        &self.destination
    }
}

impl fmt::Display for TransformationPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}->{}", self.origin, self.destination)
    }
}

// -----------------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::TransformationPath;

    #[test]
    fn equality_covers_both_components() {
        let forward = TransformationPath::new("Object", "XML");
        assert_eq!(forward, TransformationPath::new("Object", "XML"));
        assert_ne!(forward, TransformationPath::new("XML", "Object"));
        assert_ne!(forward, TransformationPath::new("Object", "JSON"));
    }

    #[test]
    fn display_uses_arrow_notation() {
        let path = TransformationPath::new("XML", "Object");
        assert_eq!(path.to_string(), "XML->Object");
    }

    #[test]
    fn usable_as_map_key() {
        use std::collections::HashMap;

        let mut table = HashMap::new();
        table.insert(TransformationPath::new("Object", "XML"), 1);
        assert_eq!(table.get(&TransformationPath::new("Object", "XML")), Some(&1));
    }
}
