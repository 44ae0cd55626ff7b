//! The seam to whatever produces dependency facts.
//!
//! A language front end (a compiler host, a symbol index, a facts file) implements
//! [`TypeDependencyEnumerator`]. The analyzer never asks it to filter or cap;
//! it only pulls facts until it has enough.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::types::TypeDependency;

/// Produces type-dependency facts for a project or a single syntax node.
pub trait TypeDependencyEnumerator: Send + Sync {
    /// Syntax node type accepted by [`node_dependencies`](Self::node_dependencies).
    type Node: ?Sized;
    /// Semantic context accompanying a node.
    type Context: ?Sized;

    /// Enumerates every dependency in the given sources.
    fn project_dependencies(
        &self,
        source_paths: &[PathBuf],
        referenced_assembly_paths: &[PathBuf],
    ) -> impl Iterator<Item = TypeDependency>;

    /// Enumerates the dependencies originating in one node.
    fn node_dependencies(
        &self,
        node: &Self::Node,
        context: &Self::Context,
    ) -> impl Iterator<Item = TypeDependency>;
}

impl<E: TypeDependencyEnumerator> TypeDependencyEnumerator for Arc<E> {
    type Node = E::Node;
    type Context = E::Context;

    fn project_dependencies(
        &self,
        source_paths: &[PathBuf],
        referenced_assembly_paths: &[PathBuf],
    ) -> impl Iterator<Item = TypeDependency> {
        (**self).project_dependencies(source_paths, referenced_assembly_paths)
    }

    fn node_dependencies(
        &self,
        node: &Self::Node,
        context: &Self::Context,
    ) -> impl Iterator<Item = TypeDependency> {
        (**self).node_dependencies(node, context)
    }
}

/// Enumerator over precomputed facts, e.g. loaded from a JSON file.
///
/// A "node" is a source file: [`node_dependencies`](TypeDependencyEnumerator::node_dependencies)
/// yields the facts recorded for that path.
#[derive(Debug, Clone, Default)]
pub struct FactEnumerator {
    facts: Vec<TypeDependency>,
}

impl FactEnumerator {
    /// Wraps a list of facts.
    #[must_use]
    pub fn new(facts: Vec<TypeDependency>) -> Self {
        Self { facts }
    }
}

impl TypeDependencyEnumerator for FactEnumerator {
    type Node = Path;
    type Context = ();

    /// Yields facts located in `source_paths`, plus facts without a location.
    /// An empty path list selects every fact.
    fn project_dependencies(
        &self,
        source_paths: &[PathBuf],
        _referenced_assembly_paths: &[PathBuf],
    ) -> impl Iterator<Item = TypeDependency> {
        self.facts
            .iter()
            .filter(move |fact| {
                source_paths.is_empty()
                    || fact
                        .source
                        .path
                        .as_ref()
                        .map_or(true, |p| source_paths.iter().any(|s| s == p))
            })
            .cloned()
    }

    fn node_dependencies(
        &self,
        node: &Path,
        _context: &(),
    ) -> impl Iterator<Item = TypeDependency> {
        self.facts
            .iter()
            .filter(move |fact| fact.source.path.as_deref() == Some(node))
            .cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Namespace;
    use crate::types::SourceSegment;

    fn fact(path: Option<&str>) -> TypeDependency {
        let mut source = SourceSegment::new(1, 1, 1, 10);
        if let Some(p) = path {
            source = source.with_path(p);
        }
        TypeDependency::new(
            Namespace::new("A").unwrap(),
            "X",
            Namespace::new("B").unwrap(),
            "Y",
            source,
        )
    }

    #[test]
    fn project_selects_listed_and_unlocated_facts() {
        let e = FactEnumerator::new(vec![fact(Some("a.cs")), fact(Some("b.cs")), fact(None)]);
        let got: Vec<_> = e
            .project_dependencies(&[PathBuf::from("a.cs")], &[])
            .collect();
        assert_eq!(got.len(), 2);
        assert_eq!(e.project_dependencies(&[], &[]).count(), 3);
    }

    #[test]
    fn node_selects_by_path() {
        let e = FactEnumerator::new(vec![fact(Some("a.cs")), fact(Some("b.cs")), fact(None)]);
        assert_eq!(e.node_dependencies(Path::new("b.cs"), &()).count(), 1);
        assert_eq!(e.node_dependencies(Path::new("c.cs"), &()).count(), 0);
    }
}
