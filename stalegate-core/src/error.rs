//! Error types for staleness tracking

use stalegate_vfs::VfsError;
use std::path::PathBuf;
use thiserror::Error;

/// Main gatekeeper error type
///
/// Every variant is fatal for the import that raised it: swallowing any of
/// them could let a stale artifact load silently.
#[derive(Error, Debug)]
pub enum GateError {
    #[error("snapshot store '{}' is corrupt: {message}", path.display())]
    StorageCorrupt { path: PathBuf, message: String },

    #[error("snapshot store '{}' could not be accessed: {source}", path.display())]
    StorageIo {
        path: PathBuf,
        #[source]
        source: VfsError,
    },

    #[error("dependency '{}' does not exist", path.display())]
    MissingDependency { path: PathBuf },

    #[error("cannot stat '{}': {source}", path.display())]
    Stat {
        path: PathBuf,
        #[source]
        source: VfsError,
    },

    #[error("cannot touch '{}': {source}", path.display())]
    Touch {
        path: PathBuf,
        #[source]
        source: VfsError,
    },

    #[error(transparent)]
    Resolve(#[from] ResolveError),
}

/// Error type for dependency resolvers
#[derive(Error, Debug)]
pub enum ResolveError {
    #[error("cannot read '{}' while resolving dependencies: {source}", path.display())]
    Unreadable {
        path: PathBuf,
        #[source]
        source: VfsError,
    },

    #[error("dependency resolution failed for '{}': {message}", path.display())]
    Failed { path: PathBuf, message: String },
}

impl GateError {
    /// Whether this error means a dependency vanished
    pub fn is_missing_dependency(&self) -> bool {
        matches!(self, GateError::MissingDependency { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_path() {
        let err = GateError::MissingDependency {
            path: PathBuf::from("/src/shared.pxd"),
        };
        assert_eq!(err.to_string(), "dependency '/src/shared.pxd' does not exist");
        assert!(err.is_missing_dependency());

        let err = GateError::StorageCorrupt {
            path: PathBuf::from("/home/u/.stalegate/snapshots.json"),
            message: "expected value at line 1 column 1".to_string(),
        };
        assert!(err.to_string().contains("is corrupt"));
        assert!(!err.is_missing_dependency());
    }

    #[test]
    fn test_resolve_error_is_transparent() {
        let inner = ResolveError::Failed {
            path: PathBuf::from("/a.pyx"),
            message: "graph unavailable".to_string(),
        };
        let text = inner.to_string();
        let err: GateError = inner.into();
        assert_eq!(err.to_string(), text);
    }
}
