//! Registration and ordered lookup of transformation rules.

use core::fmt;
use std::collections::HashMap;
use std::sync::Arc;

use crate::path::TransformationPath;
use crate::rule::TransformationRule;

// -----------------------------------------------------------------------------
// RulesContainer
// -----------------------------------------------------------------------------

/// Holds the rules the factory selects from, grouped by path.
///
/// Within a path, rules are kept sorted by ascending priority; rules of
/// equal priority stay in registration order. Lookup hands the whole
/// ordered slice to the factory, which walks it front to back.
///
/// # Examples
///
/// ```
/// use ogx_engine::{RulesContainer, TransformationPath};
///
/// let container = RulesContainer::new();
/// assert!(!container.supports_path(&TransformationPath::new("Object", "XML")));
/// assert_eq!(container.len(), 0);
/// ```
#[derive(Default)]
pub struct RulesContainer {
    rules: HashMap<TransformationPath, Vec<Arc<dyn TransformationRule>>>,
}

impl RulesContainer {
    /// Creates an empty container.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `rule` under its own path.
    ///
    /// Rejects a rule whose name is already taken on that path; the name is
    /// the rule's identity there.
    pub fn add_rule(&mut self, rule: Arc<dyn TransformationRule>) -> Result<(), RuleSetupError> {
        let path = rule.path().clone();
        let bucket = self.rules.entry(path).or_default();

        if bucket.iter().any(|known| known.name() == rule.name()) {
            return Err(RuleSetupError::DuplicateRule {
                path: rule.path().clone(),
                name: rule.name().to_string(),
            });
        }

        let at = bucket.partition_point(|known| known.priority() <= rule.priority());
        bucket.insert(at, rule);
        Ok(())
    }

    /// The rules registered for `path`, in consultation order.
    #[inline]
    pub fn rules_for(&self, path: &TransformationPath) -> Option<&[Arc<dyn TransformationRule>]> {
        self.rules.get(path).map(Vec::as_slice)
    }

    /// Whether at least one rule is registered for `path`.
    #[inline]
    pub fn supports_path(&self, path: &TransformationPath) -> bool {
        self.rules.contains_key(path)
    }

    /// Total number of registered rules across all paths.
    pub fn len(&self) -> usize {
        self.rules.values().map(Vec::len).sum()
    }

    /// `true` when no rule is registered.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl fmt::Debug for RulesContainer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for (path, bucket) in &self.rules {
            let names: Vec<&str> = bucket.iter().map(|rule| rule.name()).collect();
            map.entry(&path.to_string(), &names);
        }
        map.finish()
    }
}

// -----------------------------------------------------------------------------
// RuleSetupError
// -----------------------------------------------------------------------------

/// Errors raised while populating a [`RulesContainer`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleSetupError {
    /// A rule with this name already exists on the path.
    DuplicateRule {
        path: TransformationPath,
        name: String,
    },
}

impl fmt::Display for RuleSetupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateRule { path, name } => {
                write!(f, "rule `{name}` is already registered for path {path}")
            }
        }
    }
}

impl core::error::Error for RuleSetupError {}

// -----------------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------------
