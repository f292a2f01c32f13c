//! First-match rule dispatch.

use crate::container::RulesContainer;
use crate::error::TransformationError;
use crate::parameters::TransformationParameters;
use crate::rule::TransformationOutput;

// -----------------------------------------------------------------------------
// TransformationFactory
// -----------------------------------------------------------------------------

/// Dispatches transformation requests to the first applicable rule.
///
/// The factory owns a populated [`RulesContainer`]. For each request it
/// walks the rules registered for the request's path in priority order and
/// executes the first one whose [`is_applicable`] answers `true`. Rules
/// recurse into child subjects by calling back into the same factory.
///
/// [`is_applicable`]: crate::TransformationRule::is_applicable
pub struct TransformationFactory {
    container: RulesContainer,
}

impl TransformationFactory {
    /// Creates a factory over `container`.
    #[inline]
    pub fn new(container: RulesContainer) -> Self {
        Self { container }
    }

    /// The rules this factory dispatches to.
    #[inline]
    pub fn container(&self) -> &RulesContainer {
        &self.container
    }

    /// Transforms the subject in `parameters` along the parameters' path.
    ///
    /// Fails when no rule is registered for the path or when every
    /// registered rule declines the subject.
    pub fn transform(
        &self,
        parameters: &mut TransformationParameters<'_>,
    ) -> Result<TransformationOutput, TransformationError> {
        let path = parameters.path().clone();
        let rules = self
            .container
            .rules_for(&path)
            .ok_or_else(|| TransformationError::UnknownPath { path: path.clone() })?;

        for rule in rules {
            if rule.is_applicable(parameters) {
                log::trace!("path {path}: rule `{}` selected", rule.name());
                return rule.transform(self, parameters);
            }
        }

        Err(TransformationError::NoApplicableRule { path })
    }
}

// -----------------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::rc::Rc;
    use std::sync::Arc;

    use ogx_value::TypeRegistry;

    use super::TransformationFactory;
    use crate::container::RulesContainer;
    use crate::error::TransformationError;
    use crate::parameters::{Subject, TransformationParameters};
    use crate::path::TransformationPath;
    use crate::rule::{TransformationOutput, TransformationRule};

    struct AnswerRule {
        name: &'static str,
        priority: u32,
        path: TransformationPath,
        applicable: bool,
    }

    impl AnswerRule {
        fn new(name: &'static str, priority: u32, applicable: bool) -> Arc<dyn TransformationRule> {
            Arc::new(Self {
                name,
                priority,
                path: TransformationPath::new("Object", "XML"),
                applicable,
            })
        }
    }

    impl TransformationRule for AnswerRule {
        fn name(&self) -> &str {
            self.name
        }

        fn priority(&self) -> u32 {
            self.priority
        }

        fn path(&self) -> &TransformationPath {
            &self.path
        }

        fn is_applicable(&self, _parameters: &TransformationParameters<'_>) -> bool {
            self.applicable
        }

        fn transform(
            &self,
            _factory: &TransformationFactory,
            _parameters: &mut TransformationParameters<'_>,
        ) -> Result<TransformationOutput, TransformationError> {
            Ok(TransformationOutput::Value(Rc::new(self.name.to_string())))
        }
    }

    fn request<'a>(registry: &'a TypeRegistry, node: &'a u32) -> TransformationParameters<'a> {
        TransformationParameters::new(
            TransformationPath::new("Object", "XML"),
            registry,
            Subject::Node(node),
        )
    }

    fn executed_rule(factory: &TransformationFactory) -> String {
        let registry = TypeRegistry::with_scalars();
        let node = 7_u32;
        let mut parameters = request(&registry, &node);
        let output = factory.transform(&mut parameters).unwrap();
        output
            .into_value()
            .unwrap()
            .downcast_ref::<String>()
            .unwrap()
            .clone()
    }

    #[test]
    fn first_applicable_rule_wins() {
        let mut container = RulesContainer::new();
        container
            .add_rule(AnswerRule::new("declines", 10, false))
            .unwrap();
        container
            .add_rule(AnswerRule::new("accepts", 20, true))
            .unwrap();
        container
            .add_rule(AnswerRule::new("shadowed", 30, true))
            .unwrap();

        let factory = TransformationFactory::new(container);
        assert_eq!(executed_rule(&factory), "accepts");
    }

    #[test]
    fn lower_priority_beats_registration_order() {
        let mut container = RulesContainer::new();
        container
            .add_rule(AnswerRule::new("late_but_light", 5, true))
            .unwrap();
        container
            .add_rule(AnswerRule::new("early_but_heavy", 50, true))
            .unwrap();

        let factory = TransformationFactory::new(container);
        assert_eq!(executed_rule(&factory), "late_but_light");
    }

    #[test]
    fn unknown_path_is_reported() {
        let factory = TransformationFactory::new(RulesContainer::new());
        let registry = TypeRegistry::with_scalars();
        let node = 7_u32;
        let mut parameters = request(&registry, &node);

        assert!(matches!(
            factory.transform(&mut parameters),
            Err(TransformationError::UnknownPath { .. })
        ));
    }

    #[test]
    fn all_rules_declining_is_reported() {
        let mut container = RulesContainer::new();
        container
            .add_rule(AnswerRule::new("declines", 10, false))
            .unwrap();

        let factory = TransformationFactory::new(container);
        let registry = TypeRegistry::with_scalars();
        let node = 7_u32;
        let mut parameters = request(&registry, &node);

        assert!(matches!(
            factory.transform(&mut parameters),
            Err(TransformationError::NoApplicableRule { .. })
        ));
    }
}
