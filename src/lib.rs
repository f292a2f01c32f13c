#![doc = include_str!("../README.md")]

pub use ogx_engine as engine;
pub use ogx_persist as persist;
pub use ogx_value as value;
pub use ogx_xml as xml;

/// The types most applications need, in one import.
pub mod prelude {
    pub use ogx_persist::{PersistError, XmlDeserializer, XmlSerializer};
    pub use ogx_value::{TypeMeta, TypeRegistry};
}
