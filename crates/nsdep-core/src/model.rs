//! Pure domain model for namespace dependency rules.
//!
//! This module contains no I/O. All invariants are enforced at construction
//! time via validated newtypes; an [`AnalyzerConfig`] is immutable once built.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap, HashSet};
use std::fmt;

use crate::types::Severity;

// ────────────────────────────────────────────
// Newtypes with validation
// ────────────────────────────────────────────

/// Token that stands for "any namespace" on either side of a rule.
pub const WILDCARD: &str = "*";

/// A validated dotted namespace name (e.g., `App.Domain.Orders`).
///
/// The empty string is the global namespace.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Namespace(String);

impl Namespace {
    /// Creates a new namespace.
    ///
    /// # Errors
    ///
    /// Returns error if a segment is empty or contains whitespace, or if the
    /// name is a wildcard pattern.
    pub fn new(name: &str) -> Result<Self, ModelError> {
        if name == WILDCARD {
            return Err(ModelError::WildcardNotNamespace);
        }
        if let Some(prefix) = name.strip_suffix(".*") {
            return Err(ModelError::SubtreePattern {
                pattern: name.to_string(),
                prefix: prefix.to_string(),
            });
        }
        if name.is_empty() {
            return Ok(Self::global());
        }
        if name
            .split('.')
            .any(|seg| seg.is_empty() || seg.contains(char::is_whitespace) || seg == WILDCARD)
        {
            return Err(ModelError::InvalidNamespace {
                name: name.to_string(),
            });
        }
        Ok(Self(name.to_string()))
    }

    /// The global (unnamed) namespace.
    #[must_use]
    pub fn global() -> Self {
        Self(String::new())
    }

    /// Returns true for the global namespace.
    #[must_use]
    pub fn is_global(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_global() {
            write!(f, "(global)")
        } else {
            write!(f, "{}", self.0)
        }
    }
}

impl TryFrom<String> for Namespace {
    type Error = ModelError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(&value)
    }
}

impl From<Namespace> for String {
    fn from(ns: Namespace) -> Self {
        ns.0
    }
}

/// One side of a dependency rule: a concrete namespace or the wildcard.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum NamespaceSpec {
    /// Matches every namespace.
    Any,
    /// Matches exactly one namespace.
    Exact(Namespace),
}

impl NamespaceSpec {
    /// Parses `*` as [`NamespaceSpec::Any`] and anything else as a namespace.
    ///
    /// # Errors
    ///
    /// Returns error if the text is neither the wildcard nor a valid namespace.
    pub fn parse(text: &str) -> Result<Self, ModelError> {
        if text == WILDCARD {
            Ok(Self::Any)
        } else {
            Namespace::new(text).map(Self::Exact)
        }
    }

    /// Tests whether a concrete namespace matches this side.
    #[must_use]
    pub fn matches(&self, namespace: &Namespace) -> bool {
        match self {
            Self::Any => true,
            Self::Exact(ns) => ns == namespace,
        }
    }

    /// Returns true for the wildcard.
    #[must_use]
    pub fn is_wildcard(&self) -> bool {
        matches!(self, Self::Any)
    }
}

impl fmt::Display for NamespaceSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Any => write!(f, "{WILDCARD}"),
            Self::Exact(ns) => write!(f, "{ns}"),
        }
    }
}

impl From<Namespace> for NamespaceSpec {
    fn from(ns: Namespace) -> Self {
        Self::Exact(ns)
    }
}

impl TryFrom<String> for NamespaceSpec {
    type Error = ModelError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<NamespaceSpec> for String {
    fn from(spec: NamespaceSpec) -> Self {
        match spec {
            NamespaceSpec::Any => WILDCARD.to_string(),
            NamespaceSpec::Exact(ns) => ns.into(),
        }
    }
}

/// How precisely a rule pins down the namespaces it covers.
///
/// When several allow rules match one dependency, the most specific wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Specificity {
    /// `* -> *`
    AnyToAny,
    /// `A -> *` or `* -> B`
    OneSideExact,
    /// `A -> B`
    ExactToExact,
}

// ────────────────────────────────────────────
// Rules and type sets
// ────────────────────────────────────────────

/// A declared `(from, to)` namespace pair.
///
/// Equality and hashing use the literal pair; wildcards only take effect
/// through [`NamespaceDependencyRule::matches`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NamespaceDependencyRule {
    from: NamespaceSpec,
    to: NamespaceSpec,
}

impl NamespaceDependencyRule {
    /// Creates a new rule.
    #[must_use]
    pub fn new(from: NamespaceSpec, to: NamespaceSpec) -> Self {
        Self { from, to }
    }

    /// Parses both sides from text.
    ///
    /// # Errors
    ///
    /// Returns error if either side is invalid.
    pub fn parse(from: &str, to: &str) -> Result<Self, ModelError> {
        Ok(Self::new(NamespaceSpec::parse(from)?, NamespaceSpec::parse(to)?))
    }

    /// Returns the referencing side.
    #[must_use]
    pub fn from_spec(&self) -> &NamespaceSpec {
        &self.from
    }

    /// Returns the referenced side.
    #[must_use]
    pub fn to_spec(&self) -> &NamespaceSpec {
        &self.to
    }

    /// Tests whether this rule covers a dependency between two namespaces.
    #[must_use]
    pub fn matches(&self, from: &Namespace, to: &Namespace) -> bool {
        self.from.matches(from) && self.to.matches(to)
    }

    /// Returns how specific this rule is.
    #[must_use]
    pub fn specificity(&self) -> Specificity {
        match (self.from.is_wildcard(), self.to.is_wildcard()) {
            (true, true) => Specificity::AnyToAny,
            (false, false) => Specificity::ExactToExact,
            _ => Specificity::OneSideExact,
        }
    }
}

impl fmt::Display for NamespaceDependencyRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.from, self.to)
    }
}

/// A set of type names. Empty means "every type".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TypeNameSet(BTreeSet<String>);

impl TypeNameSet {
    /// Creates an unrestricted (empty) set.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Creates a set from validated type names.
    ///
    /// # Errors
    ///
    /// Returns error if any name is empty or contains whitespace.
    pub fn new<I, S>(names: I) -> Result<Self, ModelError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut set = BTreeSet::new();
        for name in names {
            let name = name.into();
            if name.is_empty() || name.contains(char::is_whitespace) {
                return Err(ModelError::InvalidTypeName { name });
            }
            set.insert(name);
        }
        Ok(Self(set))
    }

    /// Returns true if no restriction applies.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the number of listed names.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Tests whether a type name is listed.
    #[must_use]
    pub fn contains(&self, type_name: &str) -> bool {
        self.0.contains(type_name)
    }

    /// Iterates the listed names in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// Merges two restrictions for the same rule; "every type" absorbs any list.
    fn merge(&mut self, other: Self) {
        if self.is_empty() {
            return;
        }
        if other.is_empty() {
            self.0.clear();
            return;
        }
        self.0.extend(other.0);
    }
}

// ────────────────────────────────────────────
// Aggregate root
// ────────────────────────────────────────────

/// An immutable policy snapshot.
///
/// Build one with [`AnalyzerConfig::builder`]; share it as `Arc<AnalyzerConfig>`.
/// A refresh replaces the whole snapshot, never a single field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnalyzerConfig {
    allow_rules: HashMap<NamespaceDependencyRule, TypeNameSet>,
    disallow_rules: HashSet<NamespaceDependencyRule>,
    visible_types_by_namespace: HashMap<Namespace, TypeNameSet>,
    max_issue_count: usize,
    issue_severity: Severity,
}

impl AnalyzerConfig {
    /// Creates a builder with no rules, no cap and warning severity.
    #[must_use]
    pub fn builder() -> AnalyzerConfigBuilder {
        AnalyzerConfigBuilder::default()
    }

    /// Returns the allow rules with their type restrictions.
    #[must_use]
    pub fn allow_rules(&self) -> &HashMap<NamespaceDependencyRule, TypeNameSet> {
        &self.allow_rules
    }

    /// Returns the disallow rules.
    #[must_use]
    pub fn disallow_rules(&self) -> &HashSet<NamespaceDependencyRule> {
        &self.disallow_rules
    }

    /// Returns the visibility overrides.
    #[must_use]
    pub fn visible_types_by_namespace(&self) -> &HashMap<Namespace, TypeNameSet> {
        &self.visible_types_by_namespace
    }

    /// Returns the visibility override for a namespace, if any.
    #[must_use]
    pub fn visible_types(&self, namespace: &Namespace) -> Option<&TypeNameSet> {
        self.visible_types_by_namespace.get(namespace)
    }

    /// Returns the raw issue ceiling (0 means no cap).
    #[must_use]
    pub fn max_issue_count(&self) -> usize {
        self.max_issue_count
    }

    /// Returns the issue ceiling, or `None` when uncapped.
    #[must_use]
    pub fn issue_limit(&self) -> Option<usize> {
        (self.max_issue_count > 0).then_some(self.max_issue_count)
    }

    /// Returns the severity stamped on reported issues.
    #[must_use]
    pub fn issue_severity(&self) -> Severity {
        self.issue_severity
    }
}

/// Builder for [`AnalyzerConfig`].
#[derive(Debug, Default)]
pub struct AnalyzerConfigBuilder {
    config: AnalyzerConfig,
}

impl AnalyzerConfigBuilder {
    /// Adds an allow rule. Repeating a rule merges its type restrictions.
    #[must_use]
    pub fn allow(mut self, rule: NamespaceDependencyRule, types: TypeNameSet) -> Self {
        match self.config.allow_rules.get_mut(&rule) {
            Some(existing) => existing.merge(types),
            None => {
                self.config.allow_rules.insert(rule, types);
            }
        }
        self
    }

    /// Adds a disallow rule.
    #[must_use]
    pub fn disallow(mut self, rule: NamespaceDependencyRule) -> Self {
        self.config.disallow_rules.insert(rule);
        self
    }

    /// Adds type names that stay visible in a namespace regardless of allow
    /// rule restrictions. Repeated namespaces accumulate their names.
    #[must_use]
    pub fn visible_types(mut self, namespace: Namespace, types: TypeNameSet) -> Self {
        self.config
            .visible_types_by_namespace
            .entry(namespace)
            .or_default()
            .0
            .extend(types.0);
        self
    }

    /// Sets the issue ceiling (0 means no cap).
    #[must_use]
    pub fn max_issue_count(mut self, count: usize) -> Self {
        self.config.max_issue_count = count;
        self
    }

    /// Sets the severity of reported issues.
    #[must_use]
    pub fn issue_severity(mut self, severity: Severity) -> Self {
        self.config.issue_severity = severity;
        self
    }

    /// Finishes the snapshot.
    #[must_use]
    pub fn build(self) -> AnalyzerConfig {
        self.config
    }
}

// ────────────────────────────────────────────
// Errors
// ────────────────────────────────────────────

/// Errors in domain model construction.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ModelError {
    /// Namespace has an empty or malformed segment.
    #[error("invalid namespace `{name}`: segments must be non-empty and contain no whitespace")]
    InvalidNamespace {
        /// The invalid name.
        name: String,
    },

    /// The wildcard was used where a concrete namespace is required.
    #[error("`*` is a wildcard, not a namespace")]
    WildcardNotNamespace,

    /// A `Prefix.*` subtree pattern was given.
    #[error("subtree pattern `{pattern}` is not supported; use `{prefix}` or `*`")]
    SubtreePattern {
        /// The rejected pattern.
        pattern: String,
        /// The namespace before `.*`.
        prefix: String,
    },

    /// Type name is empty or contains whitespace.
    #[error("invalid type name `{name}`")]
    InvalidTypeName {
        /// The invalid name.
        name: String,
    },
}

// ────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────
