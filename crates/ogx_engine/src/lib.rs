//! Rule-based transformation engine for the `ogx` persistence framework.
//!
//! The engine is generic over WHAT gets transformed: it knows paths
//! ([`TransformationPath`]), rules ([`TransformationRule`]), an ordered
//! container ([`RulesContainer`]) and a dispatching
//! [`TransformationFactory`]. Concrete behaviour, such as turning object
//! graphs into XML documents, is supplied by rule implementations living in
//! downstream crates.
//!
//! A request is a [`TransformationParameters`] value naming a path and a
//! [`Subject`]. The factory walks the rules registered for the path in
//! priority order and executes the first applicable one; rules recurse into
//! child subjects through the same factory and share run-wide state through
//! named prerequisites. Object identity across the run is tracked by
//! [`ObjectIdCache`] and, in the rebuilding direction, [`ObjectTable`].

mod cache;
mod container;
mod error;
mod factory;
mod parameters;
mod path;
mod rule;

pub use cache::{Interned, ObjectId, ObjectIdCache, ObjectTable, ReferenceError};
pub use container::{RuleSetupError, RulesContainer};
pub use error::TransformationError;
pub use factory::TransformationFactory;
pub use parameters::{Subject, TransformationParameters};
pub use path::TransformationPath;
pub use rule::{TransformationOutput, TransformationRule};
