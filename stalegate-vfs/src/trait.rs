//! VirtualFileSystem trait definition

use crate::error::VfsResult;
use std::path::Path;

/// What a stat call reports about one path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileStat {
    /// Modification time, nanoseconds since the UNIX epoch
    pub mtime_ns: i64,
    /// Size in bytes
    pub size: u64,
    /// Whether the path is a directory
    pub is_dir: bool,
}

/// Virtual File System trait
///
/// Provides a unified interface for file operations, decoupling code from
/// specific file system implementations.
///
/// # Implementations
/// - `MemoryFileSystem`: In-memory file system with a logical clock
/// - `NativeFileSystem`: Native OS file system
pub trait VirtualFileSystem: Send + Sync {
    /// Read file contents
    ///
    /// # Arguments
    /// * `path` - File path
    ///
    /// # Returns
    /// File contents as bytes, or VfsError
    fn read_file(&self, path: &Path) -> VfsResult<Vec<u8>>;

    /// Write file contents
    ///
    /// Creates the file if it doesn't exist, replaces it if it does.
    ///
    /// # Arguments
    /// * `path` - File path
    /// * `content` - Content to write
    fn write_file(&self, path: &Path, content: &[u8]) -> VfsResult<()>;

    /// Stat a path
    ///
    /// # Returns
    /// Modification time and size, or `VfsError::NotFound`
    fn metadata(&self, path: &Path) -> VfsResult<FileStat>;

    /// Set the modification time of an existing file to now
    ///
    /// Content and size are left untouched.
    fn touch(&self, path: &Path) -> VfsResult<()>;

    /// Create a directory and all missing parents
    fn create_dir_all(&self, path: &Path) -> VfsResult<()>;

    /// Check if path exists
    fn exists(&self, path: &Path) -> bool;

    /// Check if path is a file
    fn is_file(&self, path: &Path) -> bool;

    /// Check if path is a directory
    fn is_dir(&self, path: &Path) -> bool;
}
