//! Dependency resolvers
//!
//! The tracker never computes a dependency graph itself. It asks a
//! `DependencyResolver` for every file a source transitively depends on at
//! compile time, on every check, because the graph may change between runs.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::error::ResolveError;

/// Supplies the transitive compile-time dependencies of a source file
///
/// Whether the source itself is part of the returned set is up to the
/// implementation; the tracker treats every returned path the same way.
pub trait DependencyResolver: Send + Sync {
    /// All files `source` depends on, in a stable order
    fn dependencies(&self, source: &Path) -> Result<Vec<PathBuf>, ResolveError>;
}

impl<F> DependencyResolver for F
where
    F: Fn(&Path) -> Result<Vec<PathBuf>, ResolveError> + Send + Sync,
{
    fn dependencies(&self, source: &Path) -> Result<Vec<PathBuf>, ResolveError> {
        self(source)
    }
}

/// Resolver backed by an explicit source → dependencies map
///
/// For hosts that already know their build graph, and for tests.
#[derive(Debug, Clone, Default)]
pub struct StaticDependencies {
    graph: HashMap<PathBuf, Vec<PathBuf>>,
}

impl StaticDependencies {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare the dependency list of `source`, replacing any earlier one
    pub fn with(
        mut self,
        source: impl Into<PathBuf>,
        deps: impl IntoIterator<Item = impl Into<PathBuf>>,
    ) -> Self {
        self.insert(source, deps);
        self
    }

    pub fn insert(
        &mut self,
        source: impl Into<PathBuf>,
        deps: impl IntoIterator<Item = impl Into<PathBuf>>,
    ) {
        self.graph
            .insert(source.into(), deps.into_iter().map(Into::into).collect());
    }
}

impl DependencyResolver for StaticDependencies {
    fn dependencies(&self, source: &Path) -> Result<Vec<PathBuf>, ResolveError> {
        self.graph
            .get(source)
            .cloned()
            .ok_or_else(|| ResolveError::Failed {
                path: source.to_path_buf(),
                message: "source is not part of the declared graph".to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_static_dependencies() {
        let resolver = StaticDependencies::new().with("/a.pyx", ["/a.pyx", "/shared.pxd"]);

        assert_eq!(
            resolver.dependencies(Path::new("/a.pyx")).unwrap(),
            vec![PathBuf::from("/a.pyx"), PathBuf::from("/shared.pxd")]
        );
        assert!(matches!(
            resolver.dependencies(Path::new("/b.pyx")),
            Err(ResolveError::Failed { .. })
        ));
    }

    #[test]
    fn test_closure_resolver() {
        let resolver = |source: &Path| -> Result<Vec<PathBuf>, ResolveError> {
            Ok(vec![source.to_path_buf()])
        };
        let boxed: Box<dyn DependencyResolver> = Box::new(resolver);

        assert_eq!(
            boxed.dependencies(Path::new("/x.pyx")).unwrap(),
            vec![PathBuf::from("/x.pyx")]
        );
    }
}
