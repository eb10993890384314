//! Touch propagation
//!
//! The only way a change is signalled to the external build step: bump the
//! file's modification time to now. Content and size stay as they are.
//! Concurrent touches from other processes are not coordinated; the last
//! writer wins, which still leaves the file newer than any artifact.

use stalegate_config::Target;
use stalegate_vfs::VirtualFileSystem;
use std::path::Path;
use tracing::info;

use crate::error::GateError;
use crate::snapshot::FileSnapshot;

const TARGET: &str = Target::Tracker.target();

/// Touch `path` and return its snapshot after the touch
pub fn touch(vfs: &dyn VirtualFileSystem, path: &Path) -> Result<FileSnapshot, GateError> {
    vfs.touch(path).map_err(|e| {
        if e.is_not_found() {
            GateError::MissingDependency {
                path: path.to_path_buf(),
            }
        } else {
            GateError::Touch {
                path: path.to_path_buf(),
                source: e,
            }
        }
    })?;
    let after = FileSnapshot::of(vfs, path)?;
    info!(target: TARGET, path = %path.display(), mtime = after.mtime, "touched");
    Ok(after)
}
