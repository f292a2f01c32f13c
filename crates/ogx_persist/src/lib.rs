//! Object graph persistence to XML documents.
//!
//! This crate ties the pieces together: the transformation engine from
//! `ogx_engine`, the type descriptions from `ogx_value` and the element
//! tree from `ogx_xml`. It ships the standard rule set for both directions
//! plus two small entry points, [`XmlSerializer`] and [`XmlDeserializer`].
//!
//! The document format is flat: an `objects` root names its root object by
//! id, and every graph node is one `object` child referencing other nodes
//! by id. Shared nodes therefore appear once regardless of how many owners
//! reach them, and rebuilt graphs restore that sharing.
//!
//! ```
//! use std::sync::Arc;
//! use ogx_persist::{XmlDeserializer, XmlSerializer};
//! use ogx_value::{TypeMeta, TypeRegistry};
//!
//! #[derive(Debug, PartialEq)]
//! struct Person {
//!     first_name: String,
//! }
//!
//! let mut registry = TypeRegistry::with_scalars();
//! registry.register(
//!     TypeMeta::composite::<Person>("Person")
//!         .field("firstName", "String", |p: &Person| &p.first_name)
//!         .build(|values| {
//!             Ok(Person {
//!                 first_name: values.take("firstName")?,
//!             })
//!         }),
//! )?;
//! let registry = Arc::new(registry);
//!
//! let person = Person {
//!     first_name: "John".into(),
//! };
//! let document = XmlSerializer::new(registry.clone()).to_document(&person)?;
//! let rebuilt: Person = XmlDeserializer::new(registry).from_document(&document)?;
//! assert_eq!(rebuilt, person);
//! # Ok::<(), Box<dyn core::error::Error>>(())
//! ```

pub mod markup;
pub mod paths;
pub mod rules;

mod deserializer;
mod error;
mod serializer;
mod store;

pub use deserializer::XmlDeserializer;
pub use error::PersistError;
pub use serializer::XmlSerializer;
pub use store::{ElementIndex, ElementStore};
