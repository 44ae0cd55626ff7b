//! Rule evaluation: decides whether one dependency fact is permitted.
//!
//! Evaluation order:
//!
//! ```text
//! same namespace?          → Allowed
//! any disallow rule match? → Violation(Disallowed)
//! no allow rule match?     → Violation(NoMatchingAllowRule)
//! most specific allow rule(s):
//!   empty type set         → Allowed
//!   type listed / visible  → Allowed
//!   otherwise              → Violation(TypeNotVisible)
//! ```

use crate::model::{AnalyzerConfig, NamespaceDependencyRule, TypeNameSet};
use crate::types::{TypeDependency, ViolationReason};

/// Outcome of evaluating one dependency.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// The dependency is permitted.
    Allowed,
    /// The dependency breaks the policy.
    Violation(ViolationReason),
}

impl Verdict {
    /// Returns true for [`Verdict::Allowed`].
    #[must_use]
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed)
    }
}

/// Stateless evaluator of dependency facts against a config snapshot.
#[derive(Debug, Clone, Copy, Default)]
pub struct RuleEvaluator;

impl RuleEvaluator {
    /// Evaluates a single dependency. Never fails.
    #[must_use]
    pub fn evaluate(config: &AnalyzerConfig, dependency: &TypeDependency) -> Verdict {
        if dependency.is_self_dependency() {
            return Verdict::Allowed;
        }

        let to = &dependency.to_namespace;

        if let Some(rule) = most_specific_disallow_rule(config, dependency) {
            return Verdict::Violation(ViolationReason::Disallowed { rule: rule.clone() });
        }

        let governing = most_specific_allow_rules(config, dependency);
        let Some((first_rule, _)) = governing.first() else {
            return Verdict::Violation(ViolationReason::NoMatchingAllowRule);
        };

        // Equally specific rules widen each other: any one admitting the type is enough.
        if governing
            .iter()
            .any(|(_, types)| types.is_empty() || types.contains(&dependency.to_type))
        {
            return Verdict::Allowed;
        }

        if config
            .visible_types(to)
            .is_some_and(|visible| visible.contains(&dependency.to_type))
        {
            return Verdict::Allowed;
        }

        Verdict::Violation(ViolationReason::TypeNotVisible {
            rule: (*first_rule).clone(),
        })
    }
}

/// Returns the matching disallow rule to report: most specific first, then by rule text.
fn most_specific_disallow_rule<'a>(
    config: &'a AnalyzerConfig,
    dependency: &TypeDependency,
) -> Option<&'a NamespaceDependencyRule> {
    config
        .disallow_rules()
        .iter()
        .filter(|rule| rule.matches(&dependency.from_namespace, &dependency.to_namespace))
        .min_by(|a, b| {
            b.specificity()
                .cmp(&a.specificity())
                .then_with(|| a.to_string().cmp(&b.to_string()))
        })
}

/// Returns every matching allow rule of the highest specificity present.
///
/// The result is sorted by rule text so the reported rule is deterministic.
fn most_specific_allow_rules<'a>(
    config: &'a AnalyzerConfig,
    dependency: &TypeDependency,
) -> Vec<(&'a NamespaceDependencyRule, &'a TypeNameSet)> {
    let mut matching: Vec<_> = config
        .allow_rules()
        .iter()
        .filter(|(rule, _)| rule.matches(&dependency.from_namespace, &dependency.to_namespace))
        .collect();

    let Some(best) = matching.iter().map(|(rule, _)| rule.specificity()).max() else {
        return matching;
    };
    matching.retain(|(rule, _)| rule.specificity() == best);
    matching.sort_by_cached_key(|(rule, _)| rule.to_string());
    matching
}
