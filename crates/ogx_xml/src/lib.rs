//! XML element tree and file adapters for the `ogx` persistence framework.
//!
//! The transformation engine works against a small in-memory tree
//! ([`XmlElement`] / [`XmlDocument`]); this crate also owns the two edge
//! collaborators, parsing ([`XmlDocument::parse_str`]) and writing
//! ([`XmlDocument::to_xml_string`]), both implemented over `quick-xml`.
//!
//! The tree is deliberately narrow: elements with ordered attributes and
//! child elements, no text nodes, no namespaces. That is the entire
//! vocabulary of the persistence document format.

mod element;
mod error;
mod reader;
mod writer;

pub use element::{XmlDocument, XmlElement};
pub use error::XmlError;
