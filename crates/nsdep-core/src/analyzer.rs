//! Policy-bound analyzer that turns dependency facts into issues.

use std::path::PathBuf;
use std::sync::Arc;

use arc_swap::ArcSwap;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::{ConfigError, ConfigProvider, ConfigState, ConfigStatus};
use crate::enumerator::TypeDependencyEnumerator;
use crate::evaluator::{RuleEvaluator, Verdict};
use crate::model::AnalyzerConfig;
use crate::types::{Issue, TypeDependency};

/// Errors raised by [`DependencyAnalyzer`].
#[derive(Debug, Error)]
pub enum AnalyzerError {
    /// Analysis was requested while the policy is not usable.
    #[error("analyzer is not enabled (config state: {state})")]
    InvalidState {
        /// State of the snapshot at the time of the call.
        state: ConfigState,
        /// Load failure, when the state is [`ConfigState::ConfigError`].
        source: Option<Arc<ConfigError>>,
    },
}

/// Evaluates the facts of one enumerator against a swappable policy snapshot.
///
/// The snapshot is read once per analysis call, so a concurrent
/// [`refresh_config`](Self::refresh_config) never mixes two policies within one run.
pub struct DependencyAnalyzer<E> {
    provider: Arc<dyn ConfigProvider>,
    enumerator: E,
    status: ArcSwap<ConfigStatus>,
}

impl<E: TypeDependencyEnumerator> DependencyAnalyzer<E> {
    /// Binds a provider and an enumerator, taking the provider's current status.
    #[must_use]
    pub fn new(provider: Arc<dyn ConfigProvider>, enumerator: E) -> Self {
        let status = provider.status();
        debug!(state = %status.state(), "Created dependency analyzer");
        Self {
            provider,
            enumerator,
            status: ArcSwap::from_pointee(status),
        }
    }

    /// Analyzes the dependencies originating in one syntax node.
    ///
    /// # Errors
    ///
    /// Returns [`AnalyzerError::InvalidState`] unless the policy is enabled.
    pub fn analyze_syntax_node(
        &self,
        node: &E::Node,
        context: &E::Context,
    ) -> Result<Vec<Issue>, AnalyzerError> {
        let config = self.enabled_config()?;
        Ok(collect_issues(
            &config,
            self.enumerator.node_dependencies(node, context),
        ))
    }

    /// Analyzes every dependency in a project.
    ///
    /// # Errors
    ///
    /// Returns [`AnalyzerError::InvalidState`] unless the policy is enabled.
    pub fn analyze_project(
        &self,
        source_paths: &[PathBuf],
        referenced_assembly_paths: &[PathBuf],
    ) -> Result<Vec<Issue>, AnalyzerError> {
        let config = self.enabled_config()?;
        debug!(
            sources = source_paths.len(),
            references = referenced_assembly_paths.len(),
            "Analyzing project"
        );
        Ok(collect_issues(
            &config,
            self.enumerator
                .project_dependencies(source_paths, referenced_assembly_paths),
        ))
    }

    /// Re-reads the provider and atomically replaces the snapshot.
    pub fn refresh_config(&self) {
        let next = Arc::new(self.provider.status());
        let next_state = next.state();
        let previous = self.status.swap(next);
        if previous.state() != next_state {
            info!(from = %previous.state(), to = %next_state, "Config state changed");
        }
    }

    /// Returns the state of the current snapshot.
    #[must_use]
    pub fn config_state(&self) -> ConfigState {
        self.status.load().state()
    }

    /// Returns the current snapshot.
    #[must_use]
    pub fn config_status(&self) -> Arc<ConfigStatus> {
        self.status.load_full()
    }

    /// Returns the bound enumerator.
    #[must_use]
    pub fn enumerator(&self) -> &E {
        &self.enumerator
    }

    fn enabled_config(&self) -> Result<Arc<AnalyzerConfig>, AnalyzerError> {
        match &**self.status.load() {
            ConfigStatus::Enabled(config) => Ok(Arc::clone(config)),
            ConfigStatus::ConfigError(err) => Err(AnalyzerError::InvalidState {
                state: ConfigState::ConfigError,
                source: Some(Arc::clone(err)),
            }),
            other => Err(AnalyzerError::InvalidState {
                state: other.state(),
                source: None,
            }),
        }
    }
}

impl<E> std::fmt::Debug for DependencyAnalyzer<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DependencyAnalyzer")
            .field("state", &self.status.load().state())
            .finish_non_exhaustive()
    }
}

/// Evaluates facts until the snapshot's issue ceiling is reached.
fn collect_issues(
    config: &AnalyzerConfig,
    facts: impl Iterator<Item = TypeDependency>,
) -> Vec<Issue> {
    let limit = config.issue_limit();
    let severity = config.issue_severity();
    let mut issues = Vec::new();
    let mut evaluated = 0usize;

    for dependency in facts {
        evaluated += 1;
        if let Verdict::Violation(reason) = RuleEvaluator::evaluate(config, &dependency) {
            issues.push(Issue::new(dependency, reason, severity));
            if limit.is_some_and(|max| issues.len() >= max) {
                warn!(
                    limit = issues.len(),
                    evaluated, "Issue limit reached, remaining dependencies skipped"
                );
                return issues;
            }
        }
    }

    debug!(evaluated, issues = issues.len(), "Analysis finished");
    issues
}
