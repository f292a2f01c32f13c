//! The shipped transformation rules.
//!
//! Four rules per direction, one per [`TypeKind`]: scalars, composites,
//! sequences and mappings. Applicability keys off the registered kind of
//! the subject, so exactly one rule per direction accepts any given
//! subject and rule order within a direction never changes the outcome.
//!
//! Rules on one run share state through named prerequisites: the identity
//! cache and the element store while serializing, the element index and the
//! object table while deserializing.

mod from_xml;
mod to_xml;

use std::sync::Arc;

use ogx_engine::{RulesContainer, TransformationRule};
use ogx_value::TypeKind;

pub use from_xml::{
    CompositeFromXmlRule, MappingFromXmlRule, ScalarFromXmlRule, SequenceFromXmlRule,
};
pub use to_xml::{CompositeToXmlRule, MappingToXmlRule, ScalarToXmlRule, SequenceToXmlRule};

/// Prerequisite name of the [`ObjectIdCache`](ogx_engine::ObjectIdCache)
/// shared by the serialization rules.
pub const OBJECT_CACHE: &str = "object-id-cache";

/// Prerequisite name of the [`ElementStore`](crate::store::ElementStore)
/// shared by the serialization rules.
pub const ELEMENT_STORE: &str = "element-store";

/// Prerequisite name of the [`ElementIndex`](crate::store::ElementIndex)
/// shared by the deserialization rules.
pub const ELEMENT_INDEX: &str = "element-index";

/// Prerequisite name of the [`ObjectTable`](ogx_engine::ObjectTable) shared
/// by the deserialization rules.
pub const OBJECT_TABLE: &str = "object-table";

/// Selection weight of a rule handling the given kind.
///
/// The kinds are disjoint, so the weights only fix a deterministic
/// consultation order; they never decide between two applicable rules.
pub(crate) const fn priority_of(kind: TypeKind) -> u32 {
    match kind {
        TypeKind::Scalar => 10,
        TypeKind::Composite => 20,
        TypeKind::Sequence => 30,
        TypeKind::Mapping => 40,
    }
}

/// Builds the container holding the full shipped rule set, both directions.
///
/// # Panics
///
/// Panics if the shipped set is internally inconsistent; that is a bug in
/// this crate, not a runtime condition.
pub fn standard_container() -> RulesContainer {
    let mut container = RulesContainer::new();
    install(&mut container, Arc::new(ScalarToXmlRule::new()));
    install(&mut container, Arc::new(CompositeToXmlRule::new()));
    install(&mut container, Arc::new(SequenceToXmlRule::new()));
    install(&mut container, Arc::new(MappingToXmlRule::new()));
    install(&mut container, Arc::new(ScalarFromXmlRule::new()));
    install(&mut container, Arc::new(CompositeFromXmlRule::new()));
    install(&mut container, Arc::new(SequenceFromXmlRule::new()));
    install(&mut container, Arc::new(MappingFromXmlRule::new()));
    container
}

fn install(container: &mut RulesContainer, rule: Arc<dyn TransformationRule>) {
    if let Err(error) = container.add_rule(rule) {
        panic!("Invalid shipped rule set: {error}");
    }
}

// -----------------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------------
