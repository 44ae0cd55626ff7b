//! Dependency facts and the issues reported against them.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

use crate::model::{Namespace, NamespaceDependencyRule};

/// Severity level for reported issues.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Informational message, does not fail a build.
    Info,
    /// Warning that should be addressed.
    #[default]
    Warning,
    /// Error that must be fixed.
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Info => write!(f, "info"),
            Self::Warning => write!(f, "warning"),
            Self::Error => write!(f, "error"),
        }
    }
}

impl std::str::FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "info" => Ok(Self::Info),
            "warning" => Ok(Self::Warning),
            "error" => Ok(Self::Error),
            other => Err(other.to_string()),
        }
    }
}

/// Location span of a dependency in source.
///
/// The rule engine never looks inside; it is carried through to the issue.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceSegment {
    /// Start line (1-indexed).
    pub start_line: usize,
    /// Start column (1-indexed).
    pub start_column: usize,
    /// End line (1-indexed).
    pub end_line: usize,
    /// End column (1-indexed).
    pub end_column: usize,
    /// File the span belongs to, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    /// Raw source text of the span, if captured.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl SourceSegment {
    /// Creates a segment without path or text.
    #[must_use]
    pub fn new(start_line: usize, start_column: usize, end_line: usize, end_column: usize) -> Self {
        Self {
            start_line,
            start_column,
            end_line,
            end_column,
            path: None,
            text: None,
        }
    }

    /// Sets the file path of this segment.
    #[must_use]
    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }
}

impl fmt::Display for SourceSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.path {
            Some(path) => write!(
                f,
                "{}:{}:{}",
                path.display(),
                self.start_line,
                self.start_column
            ),
            None => write!(f, "{}:{}", self.start_line, self.start_column),
        }
    }
}

/// One observed type-to-type reference, produced by a dependency enumerator.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TypeDependency {
    /// Namespace of the referencing type.
    pub from_namespace: Namespace,
    /// Name of the referencing type.
    pub from_type: String,
    /// Namespace of the referenced type.
    pub to_namespace: Namespace,
    /// Name of the referenced type.
    pub to_type: String,
    /// Where the reference occurs.
    #[serde(default)]
    pub source: SourceSegment,
}

impl TypeDependency {
    /// Creates a new dependency fact.
    #[must_use]
    pub fn new(
        from_namespace: Namespace,
        from_type: impl Into<String>,
        to_namespace: Namespace,
        to_type: impl Into<String>,
        source: SourceSegment,
    ) -> Self {
        Self {
            from_namespace,
            from_type: from_type.into(),
            to_namespace,
            to_type: to_type.into(),
            source,
        }
    }

    /// Returns true if both ends live in the same namespace.
    #[must_use]
    pub fn is_self_dependency(&self) -> bool {
        self.from_namespace == self.to_namespace
    }
}

impl fmt::Display for TypeDependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{} -> {}.{}",
            self.from_namespace, self.from_type, self.to_namespace, self.to_type
        )
    }
}

/// Why a dependency was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum ViolationReason {
    /// A disallow rule matched the namespace pair.
    Disallowed {
        /// The matching disallow rule.
        rule: NamespaceDependencyRule,
    },
    /// No allow rule covers the namespace pair.
    NoMatchingAllowRule,
    /// An allow rule matched, but restricts the referenced types.
    TypeNotVisible {
        /// The governing allow rule.
        rule: NamespaceDependencyRule,
    },
}

impl ViolationReason {
    /// Returns the stable issue code (e.g., "NSD001").
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::Disallowed { .. } => "NSD001",
            Self::NoMatchingAllowRule => "NSD002",
            Self::TypeNotVisible { .. } => "NSD003",
        }
    }

    /// Returns the kebab-case rule name (e.g., "disallowed-namespace").
    #[must_use]
    pub fn rule_name(&self) -> &'static str {
        match self {
            Self::Disallowed { .. } => "disallowed-namespace",
            Self::NoMatchingAllowRule => "undeclared-namespace",
            Self::TypeNotVisible { .. } => "type-not-visible",
        }
    }

    /// Returns the rule that triggered the violation, if any.
    #[must_use]
    pub fn rule(&self) -> Option<&NamespaceDependencyRule> {
        match self {
            Self::Disallowed { rule } | Self::TypeNotVisible { rule } => Some(rule),
            Self::NoMatchingAllowRule => None,
        }
    }
}

/// A reported dependency violation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    /// Issue code (e.g., "NSD002").
    pub code: String,
    /// Severity of this issue.
    pub severity: Severity,
    /// The offending dependency.
    pub dependency: TypeDependency,
    /// Why the dependency is not permitted.
    pub reason: ViolationReason,
    /// Human-readable message.
    pub message: String,
}

impl Issue {
    /// Creates an issue for a dependency rejected for the given reason.
    #[must_use]
    pub fn new(dependency: TypeDependency, reason: ViolationReason, severity: Severity) -> Self {
        let message = match &reason {
            ViolationReason::Disallowed { rule } => format!(
                "Illegal namespace reference: {} -> {} (disallowed by {rule})",
                dependency.from_namespace, dependency.to_namespace
            ),
            ViolationReason::NoMatchingAllowRule => format!(
                "Illegal namespace reference: {} -> {} (no allow rule)",
                dependency.from_namespace, dependency.to_namespace
            ),
            ViolationReason::TypeNotVisible { rule } => format!(
                "Type `{}` of namespace {} is not visible from {} (allowed by {rule} for listed types only)",
                dependency.to_type, dependency.to_namespace, dependency.from_namespace
            ),
        };
        Self {
            code: reason.code().to_string(),
            severity,
            dependency,
            reason,
            message,
        }
    }

    /// Returns the kebab-case rule name of this issue.
    #[must_use]
    pub fn rule_name(&self) -> &'static str {
        self.reason.rule_name()
    }
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} [{}] {}",
            self.dependency.source, self.severity, self.code, self.message
        )
    }
}
