use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::debug;

use super::dto::PolicyFileDto;
use super::loader::{into_status, load, parse_dto};
use super::{ConfigError, ConfigProvider, ConfigStatus};

/// File names searched, in order, in each policy directory.
pub const CONFIG_FILE_NAMES: [&str; 2] = ["nsdep.toml", ".nsdep.toml"];

#[derive(Debug, Clone, PartialEq, Eq)]
struct PolicySource {
    path: PathBuf,
    content: String,
}

#[derive(Debug)]
struct CachedPolicy {
    /// Nearest file first.
    sources: Vec<PolicySource>,
    inheritance_depth: usize,
    status: ConfigStatus,
}

/// Reads the policy from a TOML file, re-parsing only when a file's content changes.
///
/// The nearest policy file may set `inheritance_depth = N`; the provider then also
/// looks for `nsdep.toml` or `.nsdep.toml` in up to `N` parent directories and
/// layers them underneath, outermost first. Directories without a policy are
/// skipped. Parents' own `inheritance_depth` is ignored.
///
/// A missing nearest file reports [`ConfigStatus::NoConfig`]; any read or
/// validation failure at any level reports [`ConfigStatus::ConfigError`].
#[derive(Debug)]
pub struct FileConfigProvider {
    candidates: Vec<PathBuf>,
    cache: Mutex<Option<CachedPolicy>>,
}

impl FileConfigProvider {
    /// Creates a provider whose nearest policy is the given file.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            candidates: vec![path.into()],
            cache: Mutex::new(None),
        }
    }

    /// Creates a provider that looks for `nsdep.toml` or `.nsdep.toml` in `dir`.
    ///
    /// The lookup is repeated on every [`status`](ConfigProvider::status) call, so a
    /// policy created after construction is picked up.
    #[must_use]
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            candidates: CONFIG_FILE_NAMES.iter().map(|name| dir.join(name)).collect(),
            cache: Mutex::new(None),
        }
    }

    /// Creates a provider for a project given by its directory or project file.
    ///
    /// A file path is resolved to the directory containing it.
    #[must_use]
    pub fn for_project(project: &Path) -> Self {
        if project.is_dir() {
            return Self::in_dir(project);
        }
        match project.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => Self::in_dir(parent),
            _ => Self::in_dir(Path::new(".")),
        }
    }

    /// Reads the nearest policy and the parent policies it inherits from.
    ///
    /// Returns no sources when the nearest policy does not exist.
    fn read_sources(
        &self,
        cached: Option<&CachedPolicy>,
    ) -> Result<(Vec<PolicySource>, usize), ConfigError> {
        let Some(nearest) = read_first(self.candidates.iter().cloned())? else {
            return Ok((Vec::new(), 0));
        };

        let depth = match cached {
            Some(c) if c.sources.first() == Some(&nearest) => c.inheritance_depth,
            // an unparsable file inherits nothing; the merge reports the error
            _ => parse_dto(&nearest.content).map_or(0, |dto| dto.inheritance_depth),
        };

        let dir = nearest.path.parent().map(absolute_dir);
        let mut sources = vec![nearest];
        if let Some(dir) = dir {
            for ancestor in dir.ancestors().skip(1).take(depth) {
                let names = CONFIG_FILE_NAMES.iter().map(|name| ancestor.join(name));
                if let Some(source) = read_first(names)? {
                    sources.push(source);
                }
            }
        }
        Ok((sources, depth))
    }
}

impl ConfigProvider for FileConfigProvider {
    fn status(&self) -> ConfigStatus {
        let mut cache = self.cache.lock();

        let (sources, inheritance_depth) = match self.read_sources(cache.as_ref()) {
            Ok(found) => found,
            Err(e) => {
                *cache = None;
                return ConfigStatus::ConfigError(Arc::new(e));
            }
        };
        let Some(nearest) = sources.first() else {
            *cache = None;
            return ConfigStatus::NoConfig;
        };

        if let Some(cached) = cache.as_ref() {
            if cached.sources == sources {
                return cached.status.clone();
            }
        }

        debug!(
            path = %nearest.path.display(),
            inherited = sources.len() - 1,
            "Loading policy file"
        );
        let status = merge(&sources).unwrap_or_else(|e| ConfigStatus::ConfigError(Arc::new(e)));
        *cache = Some(CachedPolicy {
            sources,
            inheritance_depth,
            status: status.clone(),
        });
        status
    }
}

/// Validates each level on its own, then layers them outermost first.
fn merge(sources: &[PolicySource]) -> Result<ConfigStatus, ConfigError> {
    let mut merged = PolicyFileDto::default();
    for source in sources.iter().rev() {
        let dto = parse_dto(&source.content)
            .and_then(|dto| load(dto.clone()).map(|_| dto))
            .map_err(|e| e.in_file(&source.path))?;
        merged = merged.overlay(dto);
    }
    into_status(merged)
}

/// Reads the first existing file among `paths`.
fn read_first(
    paths: impl IntoIterator<Item = PathBuf>,
) -> Result<Option<PolicySource>, ConfigError> {
    for path in paths {
        match std::fs::read_to_string(&path) {
            Ok(content) => return Ok(Some(PolicySource { path, content })),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(ConfigError::Io { path, source: e }),
        }
    }
    Ok(None)
}

fn absolute_dir(dir: &Path) -> PathBuf {
    let dir = if dir.as_os_str().is_empty() {
        Path::new(".")
    } else {
        dir
    };
    std::fs::canonicalize(dir).unwrap_or_else(|_| dir.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigState;
    use std::fs;
    use std::time::{Duration, SystemTime};
    use tempfile::TempDir;

    fn touch(path: &Path, offset_secs: u64) {
        let when = SystemTime::UNIX_EPOCH + Duration::from_secs(1_700_000_000 + offset_secs);
        fs::File::options()
            .write(true)
            .open(path)
            .unwrap()
            .set_modified(when)
            .unwrap();
    }

    /// Creates `root/a/b` with the given policies at `root` and `root/a/b`.
    fn nested(root_policy: Option<&str>, leaf_policy: &str) -> (TempDir, PathBuf) {
        let tmp = TempDir::new().unwrap();
        let leaf = tmp.path().join("a").join("b");
        fs::create_dir_all(&leaf).unwrap();
        if let Some(text) = root_policy {
            fs::write(tmp.path().join("nsdep.toml"), text).unwrap();
        }
        fs::write(leaf.join("nsdep.toml"), leaf_policy).unwrap();
        (tmp, leaf)
    }

    const ROOT_POLICY: &str = r#"
max_issue_count = 5

[[allow]]
from = "*"
to = "System"
"#;

    #[test]
    fn missing_file_is_no_config() {
        let dir = TempDir::new().unwrap();
        let provider = FileConfigProvider::new(dir.path().join("nsdep.toml"));
        assert_eq!(provider.status().state(), ConfigState::NoConfig);
    }

    #[test]
    fn bad_file_is_config_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nsdep.toml");
        fs::write(&path, "[[allow]]\nfrom = \"App.*\"\nto = \"*\"\n").unwrap();
        let status = FileConfigProvider::new(&path).status();
        assert_eq!(status.state(), ConfigState::ConfigError);
        assert!(status.error().unwrap().to_string().contains("allow[0].from"));
    }

    #[test]
    fn disabled_file_is_disabled() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nsdep.toml");
        fs::write(&path, "enabled = false\n").unwrap();
        assert_eq!(
            FileConfigProvider::new(&path).status().state(),
            ConfigState::Disabled
        );
    }

    #[test]
    fn good_file_is_enabled() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nsdep.toml");
        fs::write(&path, "max_issue_count = 3\n").unwrap();
        let status = FileConfigProvider::new(&path).status();
        assert_eq!(status.config().unwrap().max_issue_count(), 3);
    }

    #[test]
    fn unchanged_file_reuses_snapshot() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nsdep.toml");
        fs::write(&path, "max_issue_count = 3\n").unwrap();
        let provider = FileConfigProvider::new(&path);
        let a = provider.status();

        // rewriting identical content with a new mtime is not a change
        fs::write(&path, "max_issue_count = 3\n").unwrap();
        touch(&path, 60);
        let b = provider.status();
        assert!(Arc::ptr_eq(a.config().unwrap(), b.config().unwrap()));
    }

    #[test]
    fn modified_file_is_reloaded() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nsdep.toml");
        fs::write(&path, "max_issue_count = 3\n").unwrap();
        touch(&path, 0);
        let provider = FileConfigProvider::new(&path);
        assert_eq!(provider.status().config().unwrap().max_issue_count(), 3);

        fs::write(&path, "max_issue_count = 9\n").unwrap();
        touch(&path, 60);
        assert_eq!(provider.status().config().unwrap().max_issue_count(), 9);
    }

    #[test]
    fn edit_within_same_mtime_is_reloaded() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nsdep.toml");
        fs::write(&path, "max_issue_count = 3\n").unwrap();
        touch(&path, 0);
        let provider = FileConfigProvider::new(&path);
        assert_eq!(provider.status().state(), ConfigState::Enabled);

        fs::write(&path, "enabled = false\n").unwrap();
        touch(&path, 0);
        assert_eq!(provider.status().state(), ConfigState::Disabled);

        // same length and mtime, different content
        fs::write(&path, "max_issue_count = 4\n").unwrap();
        touch(&path, 0);
        assert_eq!(provider.status().config().unwrap().max_issue_count(), 4);
        fs::write(&path, "max_issue_count = 7\n").unwrap();
        touch(&path, 0);
        assert_eq!(provider.status().config().unwrap().max_issue_count(), 7);
    }

    #[test]
    fn in_dir_prefers_plain_name_and_sees_late_files() {
        let dir = TempDir::new().unwrap();
        let provider = FileConfigProvider::in_dir(dir.path());
        assert_eq!(provider.status().state(), ConfigState::NoConfig);

        fs::write(dir.path().join(".nsdep.toml"), "enabled = false\n").unwrap();
        assert_eq!(provider.status().state(), ConfigState::Disabled);

        fs::write(dir.path().join("nsdep.toml"), "").unwrap();
        assert_eq!(provider.status().state(), ConfigState::Enabled);
    }

    #[test]
    fn for_project_uses_the_project_file_directory() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("nsdep.toml"), "enabled = false\n").unwrap();
        let project_file = dir.path().join("Shop.csproj");
        fs::write(&project_file, "").unwrap();

        for project in [dir.path().to_path_buf(), project_file] {
            assert_eq!(
                FileConfigProvider::for_project(&project).status().state(),
                ConfigState::Disabled
            );
        }
    }

    #[test]
    fn removed_file_returns_to_no_config() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nsdep.toml");
        fs::write(&path, "").unwrap();
        let provider = FileConfigProvider::new(&path);
        assert_eq!(provider.status().state(), ConfigState::Enabled);
        fs::remove_file(&path).unwrap();
        assert_eq!(provider.status().state(), ConfigState::NoConfig);
    }

    #[test]
    fn inherits_parent_policy_within_depth() {
        let leaf_policy = r#"
inheritance_depth = 2

[[allow]]
from = "App.Ui"
to = "App.Domain"
"#;
        let (_tmp, leaf) = nested(Some(ROOT_POLICY), leaf_policy);
        let status = FileConfigProvider::in_dir(&leaf).status();
        let config = status.config().unwrap();
        assert_eq!(config.max_issue_count(), 5);
        assert_eq!(config.allow_rules().len(), 2);
    }

    #[test]
    fn parent_beyond_depth_is_ignored() {
        let (_tmp, leaf) = nested(Some(ROOT_POLICY), "inheritance_depth = 1\n");
        let status = FileConfigProvider::in_dir(&leaf).status();
        let config = status.config().unwrap();
        assert_eq!(config.max_issue_count(), 100);
        assert!(config.allow_rules().is_empty());

        let (_tmp, leaf) = nested(Some(ROOT_POLICY), "");
        let status = FileConfigProvider::in_dir(&leaf).status();
        assert!(status.config().unwrap().allow_rules().is_empty());
    }

    #[test]
    fn parent_without_nearest_policy_is_no_config() {
        let tmp = TempDir::new().unwrap();
        let leaf = tmp.path().join("a");
        fs::create_dir_all(&leaf).unwrap();
        fs::write(tmp.path().join("nsdep.toml"), ROOT_POLICY).unwrap();
        assert_eq!(
            FileConfigProvider::in_dir(&leaf).status().state(),
            ConfigState::NoConfig
        );
    }

    #[test]
    fn nearer_setting_overrides_inherited_one() {
        let (_tmp, leaf) = nested(Some("enabled = false\n"), "inheritance_depth = 2\n");
        let provider = FileConfigProvider::in_dir(&leaf);
        assert_eq!(provider.status().state(), ConfigState::Disabled);

        fs::write(leaf.join("nsdep.toml"), "inheritance_depth = 2\nenabled = true\n").unwrap();
        assert_eq!(provider.status().state(), ConfigState::Enabled);
    }

    #[test]
    fn parent_edit_is_picked_up() {
        let (tmp, leaf) = nested(Some(ROOT_POLICY), "inheritance_depth = 2\n");
        let provider = FileConfigProvider::in_dir(&leaf);
        assert_eq!(provider.status().config().unwrap().max_issue_count(), 5);

        fs::write(tmp.path().join("nsdep.toml"), "max_issue_count = 8\n").unwrap();
        assert_eq!(provider.status().config().unwrap().max_issue_count(), 8);
    }

    #[test]
    fn broken_parent_names_its_file() {
        let (tmp, leaf) = nested(
            Some("[[disallow]]\nfrom = \"App.*\"\nto = \"*\"\n"),
            "inheritance_depth = 2\n",
        );
        let status = FileConfigProvider::in_dir(&leaf).status();
        assert_eq!(status.state(), ConfigState::ConfigError);
        let message = status.error().unwrap().to_string();
        assert!(message.contains("disallow[0].from"));
        let root = fs::canonicalize(tmp.path()).unwrap().join("nsdep.toml");
        assert!(message.starts_with(&root.display().to_string()));
    }
}
