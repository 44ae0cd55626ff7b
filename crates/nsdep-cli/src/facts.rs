//! Loading dependency facts produced by an external front end.
//!
//! The facts file is a JSON array of `TypeDependency` objects:
//!
//! ```json
//! [{ "from_namespace": "App.Ui", "from_type": "View",
//!    "to_namespace": "App.Data", "to_type": "Table",
//!    "source": { "start_line": 3, "start_column": 5, "end_line": 3,
//!                "end_column": 10, "path": "src/View.cs" } }]
//! ```

use anyhow::{Context, Result};
use nsdep_core::TypeDependency;
use std::path::Path;

/// Reads a facts file.
pub fn load(path: &Path) -> Result<Vec<TypeDependency>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read facts file: {}", path.display()))?;
    let facts: Vec<TypeDependency> = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse facts file: {}", path.display()))?;
    tracing::debug!("Loaded {} facts from {}", facts.len(), path.display());
    Ok(facts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn loads_facts_with_and_without_source() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("facts.json");
        fs::write(
            &path,
            r#"[
  {"from_namespace": "A", "from_type": "X", "to_namespace": "B", "to_type": "Y"},
  {"from_namespace": "", "from_type": "Main", "to_namespace": "System", "to_type": "Console",
   "source": {"start_line": 1, "start_column": 1, "end_line": 1, "end_column": 8, "path": "Program.cs"}}
]"#,
        )
        .unwrap();

        let facts = load(&path).unwrap();
        assert_eq!(facts.len(), 2);
        assert!(facts[0].source.path.is_none());
        assert!(facts[1].from_namespace.is_global());
    }

    #[test]
    fn invalid_namespace_is_reported_with_file_name() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("facts.json");
        fs::write(
            &path,
            r#"[{"from_namespace": "*", "from_type": "X", "to_namespace": "B", "to_type": "Y"}]"#,
        )
        .unwrap();

        let err = load(&path).unwrap_err();
        assert!(format!("{err:#}").contains("facts.json"));
    }

    #[test]
    fn missing_file_fails() {
        assert!(load(Path::new("/nonexistent/facts.json")).is_err());
    }
}
