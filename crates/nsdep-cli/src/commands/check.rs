//! Check command implementation.

use anyhow::{bail, Context, Result};
use nsdep_core::{
    AnalyzerCache, AnalyzerFactory, ConfigState, DependencyAnalyzer, FactEnumerator,
    TypeDependency,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::output::{self, CheckReport};
use crate::config_resolver::ConfigSource;
use crate::OutputFormat;

/// Options of the check command.
#[derive(Debug, Clone)]
pub struct CheckOptions {
    /// JSON facts file.
    pub facts: PathBuf,
    /// Glob patterns of files to skip, relative to the project root.
    pub exclude: Vec<String>,
    /// Source file extensions to analyze.
    pub extensions: Vec<String>,
    /// Referenced assembly paths handed through to the enumerator.
    pub references: Vec<PathBuf>,
}

/// What a check produced.
#[derive(Debug)]
pub enum Outcome {
    /// No policy applies to the project.
    NoConfig,
    /// The policy switches analysis off; carries the policy location.
    Disabled(PathBuf),
    /// Analysis ran.
    Checked(CheckReport),
}

/// Factory binding every project to the resolved policy source.
struct ResolvedSourceFactory {
    source: ConfigSource,
    facts: Vec<TypeDependency>,
}

impl AnalyzerFactory for ResolvedSourceFactory {
    type Enumerator = FactEnumerator;

    fn create(&self, _key: &str) -> DependencyAnalyzer<FactEnumerator> {
        DependencyAnalyzer::new(
            Arc::new(self.source.provider()),
            FactEnumerator::new(self.facts.clone()),
        )
    }
}

/// Runs the check command. Returns true if error-severity issues were found.
pub fn run(
    path: &Path,
    format: OutputFormat,
    options: &CheckOptions,
    source: &ConfigSource,
) -> Result<bool> {
    match execute(path, options, source)? {
        Outcome::NoConfig => {
            println!("No nsdep policy found for {}.", path.display());
            println!("Run `nsdep init` to create nsdep.toml.");
            Ok(false)
        }
        Outcome::Disabled(policy) => {
            println!("Analysis is disabled by the policy for {}.", policy.display());
            Ok(false)
        }
        Outcome::Checked(report) => {
            output::print(&report, format)?;
            Ok(report.has_errors())
        }
    }
}

/// Resolves the policy, collects source files and runs the analysis.
pub fn execute(path: &Path, options: &CheckOptions, source: &ConfigSource) -> Result<Outcome> {
    if let ConfigSource::Explicit(p) = source {
        if !p.exists() {
            bail!("Config file not found: {}", p.display());
        }
    }
    tracing::debug!("Policy source: {source}");

    let facts = crate::facts::load(&options.facts)?;
    let cache = AnalyzerCache::new(ResolvedSourceFactory {
        source: source.clone(),
        facts,
    });
    let key = path.to_string_lossy();
    let analyzer = cache
        .get_or_create(&key)
        .with_context(|| format!("Failed to create analyzer for {}", path.display()))?;

    match analyzer.config_state() {
        ConfigState::NoConfig => return Ok(Outcome::NoConfig),
        ConfigState::Disabled => {
            return Ok(Outcome::Disabled(source.location().to_path_buf()));
        }
        ConfigState::ConfigError | ConfigState::Enabled => {}
    }

    let files = discover_files(path, &options.exclude, &options.extensions)?;
    if files.is_empty() && analyzer.config_state() == ConfigState::Enabled {
        // an empty source list would select every fact
        tracing::warn!("No source files found under {}", path.display());
        cache.dispose();
        return Ok(Outcome::Checked(CheckReport::default()));
    }
    tracing::info!("Analyzing {} with {} source file(s)", path.display(), files.len());

    let issues = analyzer
        .analyze_project(&files, &options.references)
        .with_context(|| format!("Failed to load policy for {source}"))?;

    cache.dispose();
    Ok(Outcome::Checked(CheckReport {
        issues,
        files_checked: files.len(),
    }))
}

/// Collects source files under `root`, as paths relative to `root`.
///
/// Honours `.gitignore`; `exclude` holds glob patterns matched against the
/// relative path.
fn discover_files(root: &Path, exclude: &[String], extensions: &[String]) -> Result<Vec<PathBuf>> {
    let patterns = exclude
        .iter()
        .map(|p| glob::Pattern::new(p).with_context(|| format!("Invalid exclude pattern: {p}")))
        .collect::<Result<Vec<_>>>()?;

    let mut builder = ignore::WalkBuilder::new(root);
    builder.hidden(false).git_ignore(true);

    let mut files = Vec::new();
    for entry in builder.build() {
        let entry = entry?;
        let path = entry.path();

        if !path.is_file() {
            continue;
        }

        let matches_ext = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| extensions.iter().any(|want| want.trim_start_matches('.') == ext));
        if !matches_ext {
            continue;
        }

        let rel = path.strip_prefix(root).unwrap_or(path);
        if patterns.iter().any(|p| p.matches_path(rel)) {
            tracing::debug!("Excluded {}", rel.display());
            continue;
        }

        files.push(rel.to_path_buf());
    }

    files.sort();
    Ok(files)
}
