//! DTO → Domain model conversion with validation.

use crate::model::{AnalyzerConfig, Namespace, NamespaceDependencyRule, TypeNameSet};
use crate::types::Severity;

use super::dto::{
    AllowRuleDto, DisallowRuleDto, PolicyFileDto, VisibleTypesDto, DEFAULT_ISSUE_SEVERITY,
    DEFAULT_MAX_ISSUE_COUNT,
};
use super::{ConfigError, ConfigStatus};

/// Parses policy TOML into a [`ConfigStatus`].
///
/// A policy with `enabled = false` yields [`ConfigStatus::Disabled`]; its rules
/// are still validated.
///
/// # Errors
///
/// Returns an error if TOML parsing or model validation fails.
pub fn parse_policy(content: &str) -> Result<ConfigStatus, ConfigError> {
    into_status(parse_dto(content)?)
}

/// Deserializes policy TOML without validating it.
///
/// # Errors
///
/// Returns [`ConfigError::Parse`] for malformed TOML or unknown fields.
pub fn parse_dto(content: &str) -> Result<PolicyFileDto, ConfigError> {
    toml::from_str(content).map_err(|e| ConfigError::Parse {
        message: e.to_string(),
    })
}

/// Validates a (possibly merged) policy and wraps it as a [`ConfigStatus`].
///
/// # Errors
///
/// Returns the first validation error.
pub fn into_status(dto: PolicyFileDto) -> Result<ConfigStatus, ConfigError> {
    let enabled = dto.enabled.unwrap_or(true);
    let config = load(dto)?;
    Ok(if enabled {
        ConfigStatus::enabled(config)
    } else {
        ConfigStatus::Disabled
    })
}

/// Converts a [`PolicyFileDto`] to a validated [`AnalyzerConfig`].
///
/// # Errors
///
/// Returns the first error encountered during conversion.
pub fn load(dto: PolicyFileDto) -> Result<AnalyzerConfig, ConfigError> {
    let severity = dto
        .issue_severity
        .as_deref()
        .unwrap_or(DEFAULT_ISSUE_SEVERITY)
        .parse::<Severity>()
        .map_err(|value| ConfigError::UnknownSeverity {
            context: "issue_severity".to_string(),
            value,
        })?;

    let mut builder = AnalyzerConfig::builder()
        .max_issue_count(dto.max_issue_count.unwrap_or(DEFAULT_MAX_ISSUE_COUNT))
        .issue_severity(severity);

    for (i, allow) in dto.allow.iter().enumerate() {
        let (rule, types) = convert_allow(allow, i)?;
        builder = builder.allow(rule, types);
    }

    for (i, disallow) in dto.disallow.iter().enumerate() {
        builder = builder.disallow(convert_disallow(disallow, i)?);
    }

    for (i, visible) in dto.visible_types.iter().enumerate() {
        let (namespace, types) = convert_visible(visible, i)?;
        builder = builder.visible_types(namespace, types);
    }

    Ok(builder.build())
}

fn convert_rule(from: &str, to: &str, ctx: &str) -> Result<NamespaceDependencyRule, ConfigError> {
    use crate::model::NamespaceSpec;

    let from = NamespaceSpec::parse(from).map_err(|e| ConfigError::Validation {
        context: format!("{ctx}.from"),
        source: e,
    })?;
    let to = NamespaceSpec::parse(to).map_err(|e| ConfigError::Validation {
        context: format!("{ctx}.to"),
        source: e,
    })?;
    Ok(NamespaceDependencyRule::new(from, to))
}

fn convert_types(names: &[String], ctx: &str) -> Result<TypeNameSet, ConfigError> {
    TypeNameSet::new(names.iter().cloned()).map_err(|e| ConfigError::Validation {
        context: format!("{ctx}.types"),
        source: e,
    })
}

fn convert_allow(
    dto: &AllowRuleDto,
    index: usize,
) -> Result<(NamespaceDependencyRule, TypeNameSet), ConfigError> {
    let ctx = format!("allow[{index}]");
    let rule = convert_rule(&dto.from, &dto.to, &ctx)?;
    let types = convert_types(&dto.types, &ctx)?;
    Ok((rule, types))
}

fn convert_disallow(
    dto: &DisallowRuleDto,
    index: usize,
) -> Result<NamespaceDependencyRule, ConfigError> {
    convert_rule(&dto.from, &dto.to, &format!("disallow[{index}]"))
}

fn convert_visible(
    dto: &VisibleTypesDto,
    index: usize,
) -> Result<(Namespace, TypeNameSet), ConfigError> {
    let ctx = format!("visible-types[{index}]");
    let namespace = Namespace::new(&dto.namespace).map_err(|e| ConfigError::Validation {
        context: format!("{ctx}.namespace"),
        source: e,
    })?;
    let types = convert_types(&dto.types, &ctx)?;
    Ok((namespace, types))
}
