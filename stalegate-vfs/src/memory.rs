//! In-memory file system implementation

use crate::error::{VfsError, VfsResult};
use crate::r#trait::FileStat;
use crate::VirtualFileSystem;
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// One logical clock tick, in nanoseconds
const TICK_NS: i64 = 1_000_000_000;

#[derive(Debug, Clone)]
struct MemoryFile {
    content: Vec<u8>,
    mtime_ns: i64,
}

#[derive(Debug, Default)]
struct MemoryState {
    files: BTreeMap<String, MemoryFile>,
    dirs: BTreeSet<String>,
    clock_ns: i64,
}

impl MemoryState {
    /// Advance the logical clock and return the new time
    fn tick(&mut self) -> i64 {
        self.clock_ns += TICK_NS;
        self.clock_ns
    }
}

/// An in-memory file system implementation.
///
/// All files are stored in memory using a `BTreeMap`, making it suitable
/// for testing and scenarios where disk access is not desired. Every write
/// and every touch advances a logical clock by one second, so modification
/// times are strictly increasing and tests never depend on wall-clock
/// resolution.
///
/// # Example
/// ```
/// use stalegate_vfs::{MemoryFileSystem, VirtualFileSystem};
/// use std::path::Path;
///
/// let fs = MemoryFileSystem::new();
/// fs.write_file(Path::new("/test.txt"), b"hello").unwrap();
/// let content = fs.read_file(Path::new("/test.txt")).unwrap();
/// assert_eq!(content, b"hello");
/// ```
#[derive(Debug, Clone)]
pub struct MemoryFileSystem {
    state: Arc<RwLock<MemoryState>>,
}

impl MemoryFileSystem {
    /// Create a new empty memory file system.
    pub fn new() -> Self {
        Self {
            state: Arc::new(RwLock::new(MemoryState::default())),
        }
    }

    /// Create a new memory file system pre-populated with files.
    ///
    /// # Arguments
    /// * `files` - Iterator of (path, content) tuples
    pub fn with_files<I, S>(files: I) -> Self
    where
        I: IntoIterator<Item = (S, Vec<u8>)>,
        S: AsRef<str>,
    {
        let fs = Self::new();
        {
            let mut state = fs.state.write().unwrap_or_else(PoisonError::into_inner);
            for (path, content) in files {
                let mtime_ns = state.tick();
                state.files.insert(
                    normalize_path(Path::new(path.as_ref())),
                    MemoryFile { content, mtime_ns },
                );
            }
        }
        fs
    }

    /// Pin the modification time of an existing file.
    ///
    /// Lets tests simulate an edit that keeps the size, or a clock that went
    /// backwards.
    pub fn set_mtime(&self, path: &Path, mtime_ns: i64) -> VfsResult<()> {
        let normalized = normalize_path(path);
        let mut state = self.write_state()?;
        match state.files.get_mut(&normalized) {
            Some(file) => {
                file.mtime_ns = mtime_ns;
                Ok(())
            }
            None => Err(VfsError::NotFound { path: normalized }),
        }
    }

    /// Current value of the logical clock
    pub fn now(&self) -> i64 {
        self.state.read().map(|s| s.clock_ns).unwrap_or_default()
    }

    /// Number of stored files
    pub fn file_count(&self) -> usize {
        self.state.read().map(|s| s.files.len()).unwrap_or_default()
    }

    fn read_state(&self) -> VfsResult<RwLockReadGuard<'_, MemoryState>> {
        self.state.read().map_err(|_| VfsError::Custom {
            message: String::from("Lock poisoned"),
        })
    }

    fn write_state(&self) -> VfsResult<RwLockWriteGuard<'_, MemoryState>> {
        self.state.write().map_err(|_| VfsError::Custom {
            message: String::from("Lock poisoned"),
        })
    }
}

/// Normalize a path string for internal storage.
/// Uses forward slashes consistently for cross-platform compatibility.
fn normalize_path(path: &Path) -> String {
    let text = path.to_string_lossy().replace('\\', "/");
    if text.len() > 1 {
        text.trim_end_matches('/').to_string()
    } else {
        text
    }
}

/// Whether `child` lies strictly below the directory `dir`
fn is_below(child: &str, dir: &str) -> bool {
    if dir == "/" {
        return child.len() > 1 && child.starts_with('/');
    }
    child.len() > dir.len() && child.starts_with(dir) && child.as_bytes()[dir.len()] == b'/'
}

impl Default for MemoryFileSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl VirtualFileSystem for MemoryFileSystem {
    fn read_file(&self, path: &Path) -> VfsResult<Vec<u8>> {
        let normalized = normalize_path(path);
        let state = self.read_state()?;

        state
            .files
            .get(&normalized)
            .map(|f| f.content.clone())
            .ok_or(VfsError::NotFound { path: normalized })
    }

    fn write_file(&self, path: &Path, content: &[u8]) -> VfsResult<()> {
        let normalized = normalize_path(path);
        let mut state = self.write_state()?;
        if state.dirs.contains(&normalized) {
            return Err(VfsError::InvalidPath {
                path: normalized,
                reason: String::from("is a directory"),
            });
        }
        let mtime_ns = state.tick();
        state.files.insert(
            normalized,
            MemoryFile {
                content: content.to_vec(),
                mtime_ns,
            },
        );
        Ok(())
    }

    fn metadata(&self, path: &Path) -> VfsResult<FileStat> {
        let normalized = normalize_path(path);
        let state = self.read_state()?;
        if let Some(file) = state.files.get(&normalized) {
            return Ok(FileStat {
                mtime_ns: file.mtime_ns,
                size: file.content.len() as u64,
                is_dir: false,
            });
        }
        drop(state);
        if self.is_dir(path) {
            return Ok(FileStat {
                mtime_ns: 0,
                size: 0,
                is_dir: true,
            });
        }
        Err(VfsError::NotFound { path: normalized })
    }

    fn touch(&self, path: &Path) -> VfsResult<()> {
        let normalized = normalize_path(path);
        let mut state = self.write_state()?;
        if !state.files.contains_key(&normalized) {
            return Err(VfsError::NotFound { path: normalized });
        }
        let now = state.tick();
        if let Some(file) = state.files.get_mut(&normalized) {
            file.mtime_ns = now;
        }
        Ok(())
    }

    fn create_dir_all(&self, path: &Path) -> VfsResult<()> {
        let normalized = normalize_path(path);
        let mut state = self.write_state()?;
        if state.files.contains_key(&normalized) {
            return Err(VfsError::InvalidPath {
                path: normalized,
                reason: String::from("is a file"),
            });
        }
        state.dirs.insert(normalized);
        Ok(())
    }

    fn exists(&self, path: &Path) -> bool {
        self.is_file(path) || self.is_dir(path)
    }

    fn is_file(&self, path: &Path) -> bool {
        let normalized = normalize_path(path);
        match self.state.read() {
            Ok(state) => state.files.contains_key(&normalized),
            Err(_) => false,
        }
    }

    fn is_dir(&self, path: &Path) -> bool {
        let normalized = normalize_path(path);
        let state = match self.state.read() {
            Ok(guard) => guard,
            Err(_) => return false,
        };
        // Directories exist explicitly or implicitly through their contents
        state.dirs.contains(&normalized)
            || state.dirs.iter().any(|d| is_below(d, &normalized))
            || state.files.keys().any(|f| is_below(f, &normalized))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_new_fs_is_empty() {
        let fs = MemoryFileSystem::new();
        assert!(!fs.exists(Path::new("/anything.txt")));
        assert_eq!(fs.file_count(), 0);
    }

    #[test]
    fn test_write_and_read() {
        let fs = MemoryFileSystem::new();
        let path = Path::new("/test.txt");

        fs.write_file(path, b"hello world").unwrap();

        let content = fs.read_file(path).unwrap();
        assert_eq!(content, b"hello world");
    }

    #[test]
    fn test_read_nonexistent() {
        let fs = MemoryFileSystem::new();
        let result = fs.read_file(Path::new("/nonexistent.txt"));

        assert!(matches!(result.unwrap_err(), VfsError::NotFound { .. }));
    }

    #[test]
    fn test_writes_advance_clock() {
        let fs = MemoryFileSystem::new();
        let path = Path::new("/a.pxd");

        fs.write_file(path, b"first").unwrap();
        let first = fs.metadata(path).unwrap();
        fs.write_file(path, b"second").unwrap();
        let second = fs.metadata(path).unwrap();

        assert!(second.mtime_ns > first.mtime_ns);
        assert_eq!(second.size, 6);
        assert_eq!(fs.now(), second.mtime_ns);
    }

    #[test]
    fn test_with_files_ticks_per_file() {
        let fs = MemoryFileSystem::with_files([
            ("/a.pyx", b"a".to_vec()),
            ("/pkg/b.pxd/", b"bb".to_vec()),
        ]);

        assert_eq!(fs.metadata(Path::new("/a.pyx")).unwrap().mtime_ns, TICK_NS);
        let b = fs.metadata(Path::new("/pkg/b.pxd")).unwrap();
        assert_eq!((b.mtime_ns, b.size), (2 * TICK_NS, 2));
        assert!(fs.is_dir(Path::new("/pkg")));
        assert_eq!(fs.now(), 2 * TICK_NS);
    }

    #[test]
    fn test_touch_keeps_content() {
        let fs = MemoryFileSystem::with_files([("/pkg/shared.pxd", b"cdef int x".to_vec())]);
        let path = Path::new("/pkg/shared.pxd");
        let before = fs.metadata(path).unwrap();

        fs.touch(path).unwrap();

        let after = fs.metadata(path).unwrap();
        assert!(after.mtime_ns > before.mtime_ns);
        assert_eq!(after.size, before.size);
        assert_eq!(fs.read_file(path).unwrap(), b"cdef int x");
    }

    #[test]
    fn test_touch_missing_file() {
        let fs = MemoryFileSystem::new();
        assert!(fs.touch(Path::new("/gone.pxd")).unwrap_err().is_not_found());
    }

    #[test]
    fn test_set_mtime() {
        let fs = MemoryFileSystem::with_files([("/a.py", b"x = 1".to_vec())]);
        fs.set_mtime(Path::new("/a.py"), 42).unwrap();
        assert_eq!(fs.metadata(Path::new("/a.py")).unwrap().mtime_ns, 42);
        assert!(fs.set_mtime(Path::new("/b.py"), 42).is_err());
    }

    #[test]
    fn test_implicit_and_explicit_dirs() {
        let fs = MemoryFileSystem::new();
        fs.write_file(Path::new("/pkg/sub/mod.py"), b"").unwrap();
        fs.create_dir_all(Path::new("/cache/stalegate")).unwrap();

        assert!(fs.is_dir(Path::new("/pkg")));
        assert!(fs.is_dir(Path::new("/pkg/sub")));
        assert!(fs.is_dir(Path::new("/pkg/sub/")));
        assert!(!fs.is_dir(Path::new("/pkg/sub/mod.py")));
        assert!(!fs.is_dir(Path::new("/pk")));
        assert!(fs.is_dir(Path::new("/cache")));
        assert!(fs.is_dir(Path::new("/cache/stalegate")));
        assert!(fs.metadata(Path::new("/cache")).unwrap().is_dir);
    }

    #[test]
    fn test_write_over_dir_rejected() {
        let fs = MemoryFileSystem::new();
        fs.create_dir_all(Path::new("/out")).unwrap();
        assert!(matches!(
            fs.write_file(Path::new("/out"), b"x"),
            Err(VfsError::InvalidPath { .. })
        ));
    }

    #[test]
    fn test_clone_shares_data() {
        let fs1 = MemoryFileSystem::new();
        let path = Path::new("/shared.txt");

        fs1.write_file(path, b"shared").unwrap();

        let fs2 = fs1.clone();
        assert!(fs2.exists(path));

        fs2.write_file(path, b"modified").unwrap();
        assert_eq!(fs1.read_file(path).unwrap(), b"modified");
    }

    #[test]
    fn test_concurrent_touches() {
        let fs = MemoryFileSystem::with_files([("/test.pxd", b"concurrent".to_vec())]);
        let mut handles = vec![];

        for _ in 0..8 {
            let fs_clone = fs.clone();
            handles.push(thread::spawn(move || {
                for _ in 0..50 {
                    fs_clone.touch(Path::new("/test.pxd")).unwrap();
                }
            }));
        }

        for handle in handles {
            handle.join().unwrap();
        }

        // 1 write + 400 touches
        assert_eq!(fs.metadata(Path::new("/test.pxd")).unwrap().mtime_ns, 401 * TICK_NS);
    }
}
