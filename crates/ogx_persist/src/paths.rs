//! The two transformation paths this crate ships rules for.

use ogx_engine::TransformationPath;

/// Path component naming the in-memory object graph format.
pub const OBJECT: &str = "Object";

/// Path component naming the XML document format.
pub const XML: &str = "XML";

/// The serialization direction.
#[inline]
pub fn object_to_xml() -> TransformationPath {
    TransformationPath::new(OBJECT, XML)
}

/// The deserialization direction.
#[inline]
pub fn xml_to_object() -> TransformationPath {
    TransformationPath::new(XML, OBJECT)
}
