//! Stalegate Virtual File System
//!
//! A virtual file system abstraction with multiple backend implementations.
//! Beyond reading and writing, every backend can stat a file (modification
//! time and size) and touch it, which is all the staleness tracker needs.
//!
//! # Usage
//! ```rust
//! use stalegate_vfs::{VirtualFileSystem, MemoryFileSystem};
//! use std::path::Path;
//!
//! let fs = MemoryFileSystem::new();
//! fs.write_file(Path::new("/test.txt"), b"hello").unwrap();
//! let before = fs.metadata(Path::new("/test.txt")).unwrap();
//! fs.touch(Path::new("/test.txt")).unwrap();
//! let after = fs.metadata(Path::new("/test.txt")).unwrap();
//! assert!(after.mtime_ns > before.mtime_ns);
//! assert_eq!(after.size, before.size);
//! ```

mod error;
mod memory;
mod native;
mod r#trait;

pub use error::{VfsError, VfsResult};
pub use memory::MemoryFileSystem;
pub use native::NativeFileSystem;
pub use r#trait::{FileStat, VirtualFileSystem};

/// Create a new memory-based file system.
pub fn memory_fs() -> MemoryFileSystem {
    MemoryFileSystem::new()
}

/// Create a new native file system.
pub fn native_fs() -> NativeFileSystem {
    NativeFileSystem::new()
}
