//! The markup vocabulary of persistence documents.
//!
//! Every element and attribute name the document format uses is listed
//! here once; rules and the document index never spell out a raw string.

// -----------------------------------------------------------------------------
// XmlTag
// -----------------------------------------------------------------------------

/// Element names of the document format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum XmlTag {
    /// The document root, holding all object definitions.
    Objects,
    /// One object definition.
    Object,
    /// A named field of a composite object.
    Field,
    /// One element of a sequence object.
    Element,
    /// One key/value entry of a mapping object.
    Entry,
}

impl XmlTag {
    /// The element name as it appears in the document.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Objects => "objects",
            Self::Object => "object",
            Self::Field => "field",
            Self::Element => "element",
            Self::Entry => "entry",
        }
    }
}

// -----------------------------------------------------------------------------
// XmlAttr
// -----------------------------------------------------------------------------

/// Attribute names of the document format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum XmlAttr {
    /// Document-unique object id.
    Id,
    /// Registered type label of an object.
    Type,
    /// Field name on a `field` element.
    Name,
    /// Declared type label on a `field` element.
    DeclaredType,
    /// Declared key type label on a mapping object.
    DeclaredKeyType,
    /// Declared value type label on a mapping object.
    DeclaredValueType,
    /// Declared element type label on a sequence object.
    DeclaredElementType,
    /// Rendered text of a scalar object.
    Value,
    /// Reference to an object definition.
    ReferencedObject,
    /// Reference to an entry's key object.
    ReferencedKey,
    /// Reference to an entry's value object.
    ReferencedValue,
    /// Reference to the document's root object, on the `objects` element.
    RootObject,
}

impl XmlAttr {
    /// The attribute name as it appears in the document.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::Type => "type",
            Self::Name => "name",
            Self::DeclaredType => "declaredType",
            Self::DeclaredKeyType => "declaredKeyType",
            Self::DeclaredValueType => "declaredValueType",
            Self::DeclaredElementType => "declaredElementType",
            Self::Value => "value",
            Self::ReferencedObject => "referencedObject",
            Self::ReferencedKey => "referencedKey",
            Self::ReferencedValue => "referencedValue",
            Self::RootObject => "rootObject",
        }
    }
}

// -----------------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::{XmlAttr, XmlTag};

    #[test]
    fn names_match_the_document_format() {
        assert_eq!(XmlTag::Objects.as_str(), "objects");
        assert_eq!(XmlTag::Entry.as_str(), "entry");
        assert_eq!(XmlAttr::DeclaredElementType.as_str(), "declaredElementType");
        assert_eq!(XmlAttr::RootObject.as_str(), "rootObject");
    }
}
