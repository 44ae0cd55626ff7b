//! The analysis service seam and its in-process implementation.

use std::path::PathBuf;
use std::sync::Arc;

use nsdep_core::{
    AnalyzerConfig, AnalyzerError, DependencyAnalyzer, Issue, StaticConfigProvider,
    TypeDependencyEnumerator,
};
use thiserror::Error;
use tracing::debug;

/// Errors crossing the service boundary.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// No handle to the service could be obtained.
    #[error("analysis service unavailable: {0}")]
    Unavailable(String),

    /// The call was made but did not complete.
    #[error("analysis service call failed: {0}")]
    Call(String),

    /// The service ran the analysis and it failed.
    #[error(transparent)]
    Analysis(#[from] AnalyzerError),
}

impl ServiceError {
    /// Returns true for failures worth another attempt.
    ///
    /// Transport failures are transient; a failed analysis would fail the same
    /// way again.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Unavailable(_) | Self::Call(_))
    }
}

/// Runs a project analysis on behalf of a caller.
pub trait AnalyzerService: Send + Sync {
    /// Analyzes a project against the given policy snapshot.
    ///
    /// # Errors
    ///
    /// Returns a [`ServiceError`] if the call or the analysis fails.
    fn analyze_project(
        &self,
        config: &AnalyzerConfig,
        source_paths: &[PathBuf],
        referenced_assembly_paths: &[PathBuf],
    ) -> Result<Vec<Issue>, ServiceError>;
}

/// Obtains a callable handle to an [`AnalyzerService`].
pub trait ServiceConnector: Send + Sync {
    /// Connects to the service.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Unavailable`] if no handle can be obtained.
    fn connect(&self) -> Result<Arc<dyn AnalyzerService>, ServiceError>;
}

/// Service that analyzes in the current process.
///
/// Each request gets a transient [`DependencyAnalyzer`] bound to the request's
/// policy snapshot; nothing is cached between requests.
pub struct LocalAnalyzerService<E> {
    enumerator: Arc<E>,
}

impl<E: TypeDependencyEnumerator> LocalAnalyzerService<E> {
    /// Creates a service sharing `enumerator` across requests.
    #[must_use]
    pub fn new(enumerator: E) -> Self {
        Self {
            enumerator: Arc::new(enumerator),
        }
    }
}

impl<E: TypeDependencyEnumerator> AnalyzerService for LocalAnalyzerService<E> {
    fn analyze_project(
        &self,
        config: &AnalyzerConfig,
        source_paths: &[PathBuf],
        referenced_assembly_paths: &[PathBuf],
    ) -> Result<Vec<Issue>, ServiceError> {
        debug!(sources = source_paths.len(), "Serving analysis request");
        let provider = Arc::new(StaticConfigProvider::enabled(config.clone()));
        let analyzer = DependencyAnalyzer::new(provider, Arc::clone(&self.enumerator));
        Ok(analyzer.analyze_project(source_paths, referenced_assembly_paths)?)
    }
}

/// Connector that always hands out the same service instance.
#[derive(Clone)]
pub struct InProcessConnector {
    service: Arc<dyn AnalyzerService>,
}

impl InProcessConnector {
    /// Wraps a service.
    #[must_use]
    pub fn new(service: Arc<dyn AnalyzerService>) -> Self {
        Self { service }
    }
}

impl ServiceConnector for InProcessConnector {
    fn connect(&self) -> Result<Arc<dyn AnalyzerService>, ServiceError> {
        Ok(Arc::clone(&self.service))
    }
}
