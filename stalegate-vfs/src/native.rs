//! Native file system implementation

use crate::error::{VfsError, VfsResult};
use crate::r#trait::FileStat;
use crate::VirtualFileSystem;
use filetime::FileTime;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// A native OS file system implementation.
///
/// This wraps `std::fs` operations and provides the `VirtualFileSystem`
/// interface for local file access. Modification times are read and set
/// through `filetime` so sub-second precision survives where the platform
/// records it.
///
/// # Example
/// ```
/// use stalegate_vfs::{NativeFileSystem, VirtualFileSystem};
/// use std::path::Path;
///
/// let fs = NativeFileSystem::new();
/// assert!(!fs.exists(Path::new("/definitely/not/here.pxd")));
/// ```
#[derive(Debug, Clone, Default)]
pub struct NativeFileSystem {}

impl NativeFileSystem {
    /// Create a new native file system.
    pub fn new() -> Self {
        Self {}
    }
}

/// Sibling path used to stage a write before it replaces `path`
fn staging_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| OsString::from("vfs"));
    name.push(format!(".tmp-{}", std::process::id()));
    path.with_file_name(name)
}

/// Nanoseconds since the UNIX epoch
fn to_nanos(time: FileTime) -> i64 {
    time.unix_seconds()
        .saturating_mul(1_000_000_000)
        .saturating_add(i64::from(time.nanoseconds()))
}

impl VirtualFileSystem for NativeFileSystem {
    fn read_file(&self, path: &Path) -> VfsResult<Vec<u8>> {
        std::fs::read(path).map_err(|e| VfsError::from_io(path, e))
    }

    fn write_file(&self, path: &Path, content: &[u8]) -> VfsResult<()> {
        // Readers see either the old or the new content, never a torn file
        let staging = staging_path(path);
        std::fs::write(&staging, content).map_err(|e| VfsError::from_io(&staging, e))?;
        std::fs::rename(&staging, path).map_err(|e| {
            let _ = std::fs::remove_file(&staging);
            VfsError::from_io(path, e)
        })
    }

    fn metadata(&self, path: &Path) -> VfsResult<FileStat> {
        let meta = std::fs::metadata(path).map_err(|e| VfsError::from_io(path, e))?;
        Ok(FileStat {
            mtime_ns: to_nanos(FileTime::from_last_modification_time(&meta)),
            size: meta.len(),
            is_dir: meta.is_dir(),
        })
    }

    fn touch(&self, path: &Path) -> VfsResult<()> {
        filetime::set_file_mtime(path, FileTime::now()).map_err(|e| VfsError::from_io(path, e))
    }

    fn create_dir_all(&self, path: &Path) -> VfsResult<()> {
        std::fs::create_dir_all(path).map_err(|e| VfsError::from_io(path, e))
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn is_file(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }
}
