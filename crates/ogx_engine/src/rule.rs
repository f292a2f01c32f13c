//! The rule trait and the values rules produce.

use std::any::Any;
use std::rc::Rc;

use crate::cache::ObjectId;
use crate::error::TransformationError;
use crate::factory::TransformationFactory;
use crate::parameters::TransformationParameters;
use crate::path::TransformationPath;

// -----------------------------------------------------------------------------
// TransformationRule
// -----------------------------------------------------------------------------

/// One self-contained piece of transformation behaviour.
///
/// A rule belongs to exactly one [`TransformationPath`] and declares, via
/// [`is_applicable`](Self::is_applicable), which subjects it handles. The
/// factory consults rules in priority order (lower value first, registration
/// order within a priority) and hands the request to the first applicable
/// one; later rules are never asked.
///
/// Rules must not mutate shared state in `is_applicable`; applicability
/// checks may run against rules that end up not selected.
pub trait TransformationRule: Send + Sync {
    /// Name identifying this rule within its path. Two rules on the same
    /// path must not share a name.
    fn name(&self) -> &str;

    /// Selection weight; lower values are consulted first.
    fn priority(&self) -> u32;

    /// The direction this rule transforms along.
    fn path(&self) -> &TransformationPath;

    /// Whether this rule handles the current subject.
    fn is_applicable(&self, parameters: &TransformationParameters<'_>) -> bool;

    /// Performs the transformation.
    ///
    /// Only called after `is_applicable` returned `true` for the same
    /// parameters. Rules recurse into child subjects through `factory`.
    fn transform(
        &self,
        factory: &TransformationFactory,
        parameters: &mut TransformationParameters<'_>,
    ) -> Result<TransformationOutput, TransformationError>;
}

// -----------------------------------------------------------------------------
// TransformationOutput
// -----------------------------------------------------------------------------

/// What a transformation run handed back.
///
/// Serialization rules answer with the id their subject was recorded under;
/// deserialization rules answer with the rebuilt value.
pub enum TransformationOutput {
    /// The subject was emitted into the shared output and can be referred to
    /// by this id.
    Reference(ObjectId),
    /// A rebuilt value.
    Value(Rc<dyn Any>),
}

impl TransformationOutput {
    /// Unwraps the output as a reference id.
    pub fn into_reference(self) -> Result<ObjectId, TransformationError> {
        match self {
            Self::Reference(id) => Ok(id),
            Self::Value(_) => Err(TransformationError::UnexpectedOutput {
                expected: "object reference",
            }),
        }
    }

    /// Unwraps the output as a rebuilt value.
    pub fn into_value(self) -> Result<Rc<dyn Any>, TransformationError> {
        match self {
            Self::Value(value) => Ok(value),
            Self::Reference(_) => Err(TransformationError::UnexpectedOutput {
                expected: "rebuilt value",
            }),
        }
    }
}

// -----------------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use super::TransformationOutput;
    use crate::cache::ObjectId;
    use crate::error::TransformationError;

    #[test]
    fn output_unwraps_only_its_own_form() {
        let id = TransformationOutput::Reference(ObjectId::ORIGIN)
            .into_reference()
            .unwrap();
        assert_eq!(id, ObjectId::ORIGIN);

        let value = TransformationOutput::Value(Rc::new(3_u32))
            .into_value()
            .unwrap();
        assert_eq!(value.downcast_ref::<u32>(), Some(&3));

        assert!(matches!(
            TransformationOutput::Reference(ObjectId::ORIGIN).into_value(),
            Err(TransformationError::UnexpectedOutput { .. })
        ));
        assert!(matches!(
            TransformationOutput::Value(Rc::new(3_u32)).into_reference(),
            Err(TransformationError::UnexpectedOutput { .. })
        ));
    }
}
