//! # nsdep-remote
//!
//! Running nsdep analysis behind a process boundary.
//!
//! - [`AnalyzerService`] and [`ServiceConnector`] describe the callable service
//!   and how a handle to it is obtained
//! - [`LocalAnalyzerService`] is the serving half, backed by `nsdep-core`
//! - [`RemoteAnalysisClient`] is the calling half; it reconnects and retries on
//!   a [`RetrySchedule`] before giving up with a single error
//!
//! The transport itself is left to the connector implementation.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod client;
mod retry;
mod service;

pub use client::{RemoteAnalysisClient, RemoteError};
pub use retry::{retry, RetryError, RetrySchedule, Sleeper, ThreadSleeper, DEFAULT_RETRY_DELAYS_MS};
pub use service::{
    AnalyzerService, InProcessConnector, LocalAnalyzerService, ServiceConnector, ServiceError,
};
