//! Policy source resolution.
//!
//! The nearest policy is:
//!
//! 1. the `--config` file, when given;
//! 2. otherwise `nsdep.toml` or `.nsdep.toml` in the project directory.
//!
//! Either one may pull in parent-directory policies through `inheritance_depth`;
//! that lookup is done by [`FileConfigProvider`] on every refresh.

use nsdep_core::FileConfigProvider;
use std::fmt;
use std::path::{Path, PathBuf};

/// Where the nearest policy is looked up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// Explicitly specified via `--config` flag.
    Explicit(PathBuf),
    /// Looked up next to the project (a directory or a project file).
    Project(PathBuf),
}

impl ConfigSource {
    /// Picks the policy source for a project.
    #[must_use]
    pub fn resolve(project: &Path, explicit: Option<&Path>) -> Self {
        match explicit {
            Some(path) => Self::Explicit(path.to_path_buf()),
            None => Self::Project(project.to_path_buf()),
        }
    }

    /// Returns the explicit file or the project path.
    #[must_use]
    pub fn location(&self) -> &Path {
        match self {
            Self::Explicit(p) | Self::Project(p) => p,
        }
    }

    /// Builds the provider reading this source.
    #[must_use]
    pub fn provider(&self) -> FileConfigProvider {
        match self {
            Self::Explicit(path) => FileConfigProvider::new(path),
            Self::Project(project) => FileConfigProvider::for_project(project),
        }
    }
}

impl fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Explicit(p) => write!(f, "policy file {}", p.display()),
            Self::Project(p) => write!(f, "project {}", p.display()),
        }
    }
}
