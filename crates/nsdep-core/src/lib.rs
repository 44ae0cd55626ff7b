//! # nsdep-core
//!
//! Namespace-dependency rule engine.
//!
//! Given a policy of allowed and forbidden namespace-to-namespace references,
//! this crate evaluates type-dependency facts and reports every fact the policy
//! does not permit. It includes:
//!
//! - [`AnalyzerConfig`] and its building blocks, the immutable policy snapshot
//! - [`RuleEvaluator`] for deciding a single fact
//! - [`DependencyAnalyzer`] for analyzing a project or a syntax node
//! - [`AnalyzerCache`] for sharing one analyzer per project
//! - [`ConfigProvider`] implementations, including TOML policy files that
//!   inherit from parent directories
//!
//! ## Example
//!
//! ```ignore
//! use nsdep_core::{AnalyzerCache, FactEnumerator, FileAnalyzerFactory};
//!
//! let cache = AnalyzerCache::new(FileAnalyzerFactory::new(|_| FactEnumerator::new(facts)));
//! let analyzer = cache.get_or_create("src/App/App.csproj")?;
//! for issue in analyzer.analyze_project(&sources, &[])? {
//!     println!("{issue}");
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod analyzer;
mod cache;
pub mod config;
mod enumerator;
mod evaluator;
mod model;
mod types;

pub use analyzer::{AnalyzerError, DependencyAnalyzer};
pub use cache::{AnalyzerCache, AnalyzerFactory, CacheError, FileAnalyzerFactory};
pub use config::{
    ConfigError, ConfigProvider, ConfigState, ConfigStatus, FileConfigProvider,
    StaticConfigProvider,
};
pub use enumerator::{FactEnumerator, TypeDependencyEnumerator};
pub use evaluator::{RuleEvaluator, Verdict};
pub use model::{
    AnalyzerConfig, AnalyzerConfigBuilder, ModelError, Namespace, NamespaceDependencyRule,
    NamespaceSpec, Specificity, TypeNameSet, WILDCARD,
};
pub use types::{Issue, Severity, SourceSegment, TypeDependency, ViolationReason};
