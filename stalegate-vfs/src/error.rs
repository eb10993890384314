//! VFS Error Types

use std::fmt;
use std::path::Path;

/// Result type for VFS operations
pub type VfsResult<T> = Result<T, VfsError>;

/// Error type for VFS operations
#[derive(Debug, Clone, PartialEq)]
pub enum VfsError {
    /// File or directory not found
    NotFound { path: String },

    /// Permission denied
    PermissionDenied { path: String },

    /// Invalid path
    InvalidPath { path: String, reason: String },

    /// IO error
    Io { message: String },

    /// Custom error message
    Custom { message: String },
}

impl VfsError {
    /// Classify an I/O error raised while operating on `path`
    pub fn from_io(path: &Path, err: std::io::Error) -> Self {
        let path = path.to_string_lossy().to_string();
        match err.kind() {
            std::io::ErrorKind::NotFound => VfsError::NotFound { path },
            std::io::ErrorKind::PermissionDenied => VfsError::PermissionDenied { path },
            _ => VfsError::Io {
                message: format!("{}: {}", path, err),
            },
        }
    }

    /// Whether the error means the path does not exist
    pub fn is_not_found(&self) -> bool {
        matches!(self, VfsError::NotFound { .. })
    }
}

impl fmt::Display for VfsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VfsError::NotFound { path } => write!(f, "Path not found: {}", path),
            VfsError::PermissionDenied { path } => write!(f, "Permission denied: {}", path),
            VfsError::InvalidPath { path, reason } => {
                write!(f, "Invalid path '{}': {}", path, reason)
            }
            VfsError::Io { message } => write!(f, "IO error: {}", message),
            VfsError::Custom { message } => write!(f, "{}", message),
        }
    }
}

impl std::error::Error for VfsError {}

impl From<std::io::Error> for VfsError {
    fn from(err: std::io::Error) -> Self {
        VfsError::Io {
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_io_classifies_kind() {
        let path = Path::new("/x/y.pxd");
        let missing = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        assert!(VfsError::from_io(path, missing).is_not_found());

        let denied = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "no");
        assert_eq!(
            VfsError::from_io(path, denied),
            VfsError::PermissionDenied {
                path: "/x/y.pxd".to_string()
            }
        );

        let other = std::io::Error::new(std::io::ErrorKind::Other, "disk on fire");
        let err = VfsError::from_io(path, other);
        assert!(err.to_string().contains("disk on fire"));
    }
}
