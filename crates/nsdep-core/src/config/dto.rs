//! TOML deserialization types (DTO layer).
//!
//! These types exist solely for serde deserialization.
//! They are converted to domain model types via the loader.

use serde::{Deserialize, Serialize};

/// Issue ceiling used when no policy level sets one.
pub const DEFAULT_MAX_ISSUE_COUNT: usize = 100;

/// Severity used when no policy level sets one.
pub const DEFAULT_ISSUE_SEVERITY: &str = "warning";

/// Raw TOML representation of a policy file.
///
/// Scalar settings stay `None` when the file omits them, so an inherited value
/// can show through; the loader fills in defaults.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PolicyFileDto {
    /// Whether analysis runs at all (default: true).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,

    /// Issue ceiling; 0 disables the cap (default: 100).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_issue_count: Option<usize>,

    /// Severity of reported issues (default: "warning").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issue_severity: Option<String>,

    /// How many parent directories above this file are searched for policies
    /// to inherit from (default: 0). Only the nearest file's value is used.
    #[serde(default)]
    pub inheritance_depth: usize,

    /// Allowed namespace dependencies.
    #[serde(default)]
    pub allow: Vec<AllowRuleDto>,

    /// Forbidden namespace dependencies.
    #[serde(default)]
    pub disallow: Vec<DisallowRuleDto>,

    /// Per-namespace visibility overrides.
    #[serde(rename = "visible-types", default)]
    pub visible_types: Vec<VisibleTypesDto>,
}

impl PolicyFileDto {
    /// Layers a nearer policy over this one.
    ///
    /// Settings the child sets win; rule lists are concatenated, parent first.
    #[must_use]
    pub fn overlay(mut self, child: Self) -> Self {
        self.allow.extend(child.allow);
        self.disallow.extend(child.disallow);
        self.visible_types.extend(child.visible_types);
        Self {
            enabled: child.enabled.or(self.enabled),
            max_issue_count: child.max_issue_count.or(self.max_issue_count),
            issue_severity: child.issue_severity.or(self.issue_severity),
            inheritance_depth: child.inheritance_depth,
            allow: self.allow,
            disallow: self.disallow,
            visible_types: self.visible_types,
        }
    }
}

/// TOML representation of an allow rule.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AllowRuleDto {
    /// Referencing namespace or `*`.
    pub from: String,
    /// Referenced namespace or `*`.
    pub to: String,
    /// Referenced type names this rule is limited to (empty: all types).
    #[serde(default)]
    pub types: Vec<String>,
}

/// TOML representation of a disallow rule.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DisallowRuleDto {
    /// Referencing namespace or `*`.
    pub from: String,
    /// Referenced namespace or `*`.
    pub to: String,
}

/// TOML representation of a visibility override.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct VisibleTypesDto {
    /// Namespace whose types are exposed.
    pub namespace: String,
    /// Type names visible to every allowed referrer.
    pub types: Vec<String>,
}
