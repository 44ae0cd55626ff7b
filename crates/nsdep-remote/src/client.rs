//! Retrying client for an out-of-process analysis service.

use std::path::PathBuf;

use nsdep_core::{AnalyzerConfig, Issue};
use thiserror::Error;
use tracing::debug;

use crate::retry::{retry, RetryError, RetrySchedule, Sleeper, ThreadSleeper};
use crate::service::{AnalyzerService, ServiceConnector, ServiceError};

/// Errors raised by [`RemoteAnalysisClient`].
#[derive(Debug, Error)]
pub enum RemoteError {
    /// Every attempt failed.
    #[error("unable to communicate with the analysis service after {attempts} attempts: {source}")]
    Unavailable {
        /// Number of attempts made.
        attempts: usize,
        /// Failure of the last attempt.
        source: ServiceError,
    },

    /// The service answered with a failure that retrying cannot fix.
    #[error("analysis service rejected the request: {source}")]
    Rejected {
        /// The service's failure.
        source: ServiceError,
    },
}

/// Calls an [`AnalyzerService`] through a connector, reconnecting and retrying
/// transient failures on a fixed schedule.
///
/// The calling thread blocks for the whole exchange, pauses included.
pub struct RemoteAnalysisClient<C, S = ThreadSleeper> {
    connector: C,
    schedule: RetrySchedule,
    sleeper: S,
}

impl<C: ServiceConnector> RemoteAnalysisClient<C> {
    /// Creates a client with the default schedule and a real sleeper.
    #[must_use]
    pub fn new(connector: C) -> Self {
        Self {
            connector,
            schedule: RetrySchedule::default(),
            sleeper: ThreadSleeper,
        }
    }
}

impl<C: ServiceConnector, S: Sleeper> RemoteAnalysisClient<C, S> {
    /// Replaces the retry schedule.
    #[must_use]
    pub fn with_schedule(mut self, schedule: RetrySchedule) -> Self {
        self.schedule = schedule;
        self
    }

    /// Replaces the sleeper used between attempts.
    #[must_use]
    pub fn with_sleeper<S2: Sleeper>(self, sleeper: S2) -> RemoteAnalysisClient<C, S2> {
        RemoteAnalysisClient {
            connector: self.connector,
            schedule: self.schedule,
            sleeper,
        }
    }

    /// Requests a project analysis, connecting anew on every attempt.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteError::Unavailable`] once the schedule is exhausted and
    /// [`RemoteError::Rejected`] for a non-transient service failure.
    pub fn analyze_project(
        &self,
        config: &AnalyzerConfig,
        source_paths: &[PathBuf],
        referenced_assembly_paths: &[PathBuf],
    ) -> Result<Vec<Issue>, RemoteError> {
        retry(
            &self.schedule,
            &self.sleeper,
            ServiceError::is_transient,
            |attempt| {
                debug!(attempt, "Calling analysis service");
                let service = self.connector.connect()?;
                service.analyze_project(config, source_paths, referenced_assembly_paths)
            },
        )
        .map_err(|err| match err {
            RetryError::Exhausted { attempts, last } => RemoteError::Unavailable {
                attempts,
                source: last,
            },
            RetryError::Aborted(source) => RemoteError::Rejected { source },
        })
    }
}

impl<C: ServiceConnector, S: Sleeper> AnalyzerService for RemoteAnalysisClient<C, S> {
    fn analyze_project(
        &self,
        config: &AnalyzerConfig,
        source_paths: &[PathBuf],
        referenced_assembly_paths: &[PathBuf],
    ) -> Result<Vec<Issue>, ServiceError> {
        Self::analyze_project(self, config, source_paths, referenced_assembly_paths).map_err(
            |err| match err {
                RemoteError::Rejected { source } => source,
                unavailable @ RemoteError::Unavailable { .. } => {
                    ServiceError::Unavailable(unavailable.to_string())
                }
            },
        )
    }
}
