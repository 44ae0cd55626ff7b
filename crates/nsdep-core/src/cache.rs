//! Process-wide registry of analyzers, one per project key.

use std::marker::PhantomData;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use thiserror::Error;
use tracing::debug;

use crate::analyzer::DependencyAnalyzer;
use crate::config::FileConfigProvider;
use crate::enumerator::TypeDependencyEnumerator;

/// Errors raised by [`AnalyzerCache`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CacheError {
    /// The key is empty or whitespace.
    #[error("invalid analyzer key `{key}`: must not be empty or whitespace")]
    InvalidKey {
        /// The rejected key.
        key: String,
    },

    /// The cache was disposed.
    #[error("analyzer cache has been disposed")]
    Disposed,
}

/// Builds the analyzer for a key on its first request.
pub trait AnalyzerFactory: Send + Sync {
    /// Enumerator bound into created analyzers.
    type Enumerator: TypeDependencyEnumerator;

    /// Creates the analyzer for `key`.
    fn create(&self, key: &str) -> DependencyAnalyzer<Self::Enumerator>;
}

/// Keyed analyzer registry.
///
/// The first request for a key constructs its analyzer; later requests return
/// the same instance after refreshing its config.
pub struct AnalyzerCache<F: AnalyzerFactory> {
    factory: F,
    analyzers: DashMap<String, Arc<DependencyAnalyzer<F::Enumerator>>>,
    disposed: AtomicBool,
}

impl<F: AnalyzerFactory> AnalyzerCache<F> {
    /// Creates an empty cache.
    #[must_use]
    pub fn new(factory: F) -> Self {
        Self {
            factory,
            analyzers: DashMap::new(),
            disposed: AtomicBool::new(false),
        }
    }

    /// Returns the analyzer for `key`, creating it on first use.
    ///
    /// A cached analyzer re-reads its config before being returned.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::InvalidKey`] for a blank key and
    /// [`CacheError::Disposed`] after [`dispose`](Self::dispose).
    pub fn get_or_create(
        &self,
        key: &str,
    ) -> Result<Arc<DependencyAnalyzer<F::Enumerator>>, CacheError> {
        if key.trim().is_empty() {
            return Err(CacheError::InvalidKey {
                key: key.to_string(),
            });
        }
        if self.is_disposed() {
            return Err(CacheError::Disposed);
        }

        let cached = match self.analyzers.entry(key.to_string()) {
            Entry::Occupied(entry) => Arc::clone(entry.get()),
            Entry::Vacant(entry) => {
                debug!(key, "Creating analyzer");
                let analyzer = Arc::new(self.factory.create(key));
                entry.insert(Arc::clone(&analyzer));
                return self.unless_disposed(key, analyzer);
            }
        };

        // Entry guard is gone here; refresh runs outside the shard lock.
        cached.refresh_config();
        Ok(cached)
    }

    /// Drops every cached analyzer and rejects further requests. Idempotent.
    pub fn dispose(&self) {
        if self.disposed.swap(true, Ordering::AcqRel) {
            return;
        }
        let count = self.analyzers.len();
        self.analyzers.clear();
        debug!(count, "Disposed analyzer cache");
    }

    /// Returns true after [`dispose`](Self::dispose).
    #[must_use]
    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::Acquire)
    }

    /// Number of cached analyzers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.analyzers.len()
    }

    /// Returns true if nothing is cached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.analyzers.is_empty()
    }

    // A dispose racing a first insert must not leave the new entry behind.
    fn unless_disposed(
        &self,
        key: &str,
        analyzer: Arc<DependencyAnalyzer<F::Enumerator>>,
    ) -> Result<Arc<DependencyAnalyzer<F::Enumerator>>, CacheError> {
        if self.is_disposed() {
            self.analyzers.remove(key);
            return Err(CacheError::Disposed);
        }
        Ok(analyzer)
    }
}

impl<F: AnalyzerFactory> std::fmt::Debug for AnalyzerCache<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnalyzerCache")
            .field("len", &self.analyzers.len())
            .field("disposed", &self.is_disposed())
            .finish_non_exhaustive()
    }
}

/// Factory binding each project key to the policy file next to it.
///
/// The key is a project file (or directory) path. Its directory is searched for
/// `nsdep.toml` / `.nsdep.toml`, which may inherit from parent directories; the
/// enumerator comes from `build_enumerator`.
pub struct FileAnalyzerFactory<E, B> {
    build_enumerator: B,
    _enumerator: PhantomData<fn() -> E>,
}

impl<E, B> FileAnalyzerFactory<E, B>
where
    E: TypeDependencyEnumerator,
    B: Fn(&Path) -> E + Send + Sync,
{
    /// Creates a factory using `build_enumerator` for each new project.
    #[must_use]
    pub fn new(build_enumerator: B) -> Self {
        Self {
            build_enumerator,
            _enumerator: PhantomData,
        }
    }
}

impl<E, B> AnalyzerFactory for FileAnalyzerFactory<E, B>
where
    E: TypeDependencyEnumerator,
    B: Fn(&Path) -> E + Send + Sync,
{
    type Enumerator = E;

    fn create(&self, key: &str) -> DependencyAnalyzer<E> {
        let project = Path::new(key);
        let provider = Arc::new(FileConfigProvider::for_project(project));
        DependencyAnalyzer::new(provider, (self.build_enumerator)(project))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ConfigProvider, ConfigState, ConfigStatus};
    use crate::enumerator::FactEnumerator;
    use crate::model::AnalyzerConfig;
    use crate::types::TypeDependency;
    use std::path::PathBuf;
    use std::sync::atomic::AtomicUsize;
    use std::thread;

    struct CountingProvider {
        calls: Arc<AtomicUsize>,
    }

    impl ConfigProvider for CountingProvider {
        fn status(&self) -> ConfigStatus {
            self.calls.fetch_add(1, Ordering::SeqCst);
            ConfigStatus::enabled(AnalyzerConfig::builder().build())
        }
    }

    /// Enumerator that records when it is dropped.
    struct DropTracked {
        drops: Arc<AtomicUsize>,
    }

    impl Drop for DropTracked {
        fn drop(&mut self) {
            self.drops.fetch_add(1, Ordering::SeqCst);
        }
    }

    impl TypeDependencyEnumerator for DropTracked {
        type Node = ();
        type Context = ();

        fn project_dependencies(
            &self,
            _source_paths: &[PathBuf],
            _referenced_assembly_paths: &[PathBuf],
        ) -> impl Iterator<Item = TypeDependency> {
            std::iter::empty()
        }

        fn node_dependencies(
            &self,
            _node: &(),
            _context: &(),
        ) -> impl Iterator<Item = TypeDependency> {
            std::iter::empty()
        }
    }

    #[derive(Default)]
    struct CountingFactory {
        created: AtomicUsize,
        status_calls: Arc<AtomicUsize>,
        drops: Arc<AtomicUsize>,
    }

    impl AnalyzerFactory for CountingFactory {
        type Enumerator = DropTracked;

        fn create(&self, _key: &str) -> DependencyAnalyzer<DropTracked> {
            self.created.fetch_add(1, Ordering::SeqCst);
            DependencyAnalyzer::new(
                Arc::new(CountingProvider {
                    calls: Arc::clone(&self.status_calls),
                }),
                DropTracked {
                    drops: Arc::clone(&self.drops),
                },
            )
        }
    }

    #[test]
    fn same_key_returns_same_instance_and_refreshes() {
        let cache = AnalyzerCache::new(CountingFactory::default());
        let first = cache.get_or_create("proj/App.csproj").unwrap();
        assert_eq!(cache.factory.status_calls.load(Ordering::SeqCst), 1);

        let second = cache.get_or_create("proj/App.csproj").unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.factory.created.load(Ordering::SeqCst), 1);
        assert_eq!(cache.factory.status_calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn distinct_keys_get_distinct_analyzers() {
        let cache = AnalyzerCache::new(CountingFactory::default());
        let a = cache.get_or_create("a").unwrap();
        let b = cache.get_or_create("b").unwrap();
        assert!(!Arc::ptr_eq(&a, &b));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn blank_key_rejected() {
        let cache = AnalyzerCache::new(CountingFactory::default());
        for key in ["", "   ", "\t"] {
            assert_eq!(
                cache.get_or_create(key).unwrap_err(),
                CacheError::InvalidKey {
                    key: key.to_string()
                }
            );
        }
        assert!(cache.is_empty());
    }

    #[test]
    fn dispose_drops_each_analyzer_once() {
        let cache = AnalyzerCache::new(CountingFactory::default());
        for key in ["a", "b", "c"] {
            drop(cache.get_or_create(key).unwrap());
        }
        cache.dispose();
        assert_eq!(cache.factory.drops.load(Ordering::SeqCst), 3);
        assert!(cache.is_empty());

        cache.dispose();
        assert_eq!(cache.factory.drops.load(Ordering::SeqCst), 3);
        assert_eq!(cache.get_or_create("a").unwrap_err(), CacheError::Disposed);
    }

    #[test]
    fn handle_outlives_dispose() {
        let cache = AnalyzerCache::new(CountingFactory::default());
        let held = cache.get_or_create("a").unwrap();
        cache.dispose();
        assert_eq!(cache.factory.drops.load(Ordering::SeqCst), 0);
        assert_eq!(held.config_state(), ConfigState::Enabled);
        drop(held);
        assert_eq!(cache.factory.drops.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn concurrent_first_requests_construct_once() {
        let cache = AnalyzerCache::new(CountingFactory::default());
        let handles: Vec<_> = thread::scope(|s| {
            let workers: Vec<_> = (0..8)
                .map(|_| s.spawn(|| cache.get_or_create("shared").unwrap()))
                .collect();
            workers.into_iter().map(|w| w.join().unwrap()).collect()
        });
        assert_eq!(cache.factory.created.load(Ordering::SeqCst), 1);
        assert!(handles.windows(2).all(|w| Arc::ptr_eq(&w[0], &w[1])));
    }

    #[test]
    fn file_factory_reads_policy_next_to_project() {
        let dir = tempfile::TempDir::new().unwrap();
        std::fs::write(dir.path().join("nsdep.toml"), "max_issue_count = 5\n").unwrap();
        let project = dir.path().join("App.csproj");

        let cache = AnalyzerCache::new(FileAnalyzerFactory::new(|_: &Path| {
            FactEnumerator::default()
        }));
        let analyzer = cache.get_or_create(&project.to_string_lossy()).unwrap();
        let status = analyzer.config_status();
        assert_eq!(status.config().unwrap().max_issue_count(), 5);
    }

    #[test]
    fn file_factory_without_policy_is_no_config() {
        let dir = tempfile::TempDir::new().unwrap();
        let cache = AnalyzerCache::new(FileAnalyzerFactory::new(|_: &Path| {
            FactEnumerator::default()
        }));
        let analyzer = cache
            .get_or_create(&dir.path().to_string_lossy())
            .unwrap();
        assert_eq!(analyzer.config_state(), ConfigState::NoConfig);

        std::fs::write(dir.path().join("nsdep.toml"), "enabled = false\n").unwrap();
        let again = cache
            .get_or_create(&dir.path().to_string_lossy())
            .unwrap();
        assert_eq!(again.config_state(), ConfigState::Disabled);
    }
}
