//! 快照存储
//!
//! 绝对路径 → 文件快照 的映射，以单个 JSON 文件持久化在固定位置。
//!
//! # 持久化规则
//! - 每个进程首次使用时加载一次，内存副本是进程内的唯一真相
//! - 每次修改后立即整体写回（write-through），崩溃不会丢失刚记录的快照
//! - 文件损坏时报错，绝不静默重置
//!
//! # 文件格式
//! ```json
//! { "/abs/path/shared.pxd": { "mtime": 1700000000000000000, "size": 42 } }
//! ```

use stalegate_config::Target;
use stalegate_vfs::VirtualFileSystem;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

use crate::error::GateError;
use crate::snapshot::FileSnapshot;

const TARGET: &str = Target::Store.target();

/// 覆盖默认存储目录的环境变量
pub const CACHE_ENV: &str = "STALEGATE_CACHE";

/// 存储文件名
pub const STORE_FILE_NAME: &str = "snapshots.json";

/// 默认存储位置
///
/// 优先 `$STALEGATE_CACHE/snapshots.json`，其次 `~/.stalegate/snapshots.json`，
/// 都不可用时退回当前目录下的 `.stalegate/snapshots.json`。
pub fn default_store_path() -> PathBuf {
    if let Some(dir) = std::env::var_os(CACHE_ENV).filter(|v| !v.is_empty()) {
        return PathBuf::from(dir).join(STORE_FILE_NAME);
    }

    if let Some(home) = dirs::home_dir() {
        return home.join(".stalegate").join(STORE_FILE_NAME);
    }

    PathBuf::from(".stalegate").join(STORE_FILE_NAME)
}

/// 快照存储
pub struct SnapshotStore {
    /// 虚拟文件系统
    vfs: Arc<dyn VirtualFileSystem>,
    /// 持久化文件位置
    path: PathBuf,
    /// 路径 → 快照（BTreeMap 保证写出顺序稳定）
    entries: BTreeMap<String, FileSnapshot>,
}

impl std::fmt::Debug for SnapshotStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SnapshotStore")
            .field("path", &self.path)
            .field("entries", &self.entries.len())
            .finish()
    }
}

impl SnapshotStore {
    /// 加载存储
    ///
    /// 文件不存在时创建空映射并立即写出，之后的加载不会再遇到文件缺失。
    pub fn load(vfs: Arc<dyn VirtualFileSystem>, path: impl AsRef<Path>) -> Result<Self, GateError> {
        let path = path.as_ref().to_path_buf();

        let entries = match vfs.read_file(&path) {
            Ok(bytes) => serde_json::from_slice::<BTreeMap<String, FileSnapshot>>(&bytes).map_err(
                |e| GateError::StorageCorrupt {
                    path: path.clone(),
                    message: e.to_string(),
                },
            )?,
            Err(e) if e.is_not_found() => {
                let store = Self {
                    vfs,
                    path,
                    entries: BTreeMap::new(),
                };
                if let Some(parent) = store.path.parent().filter(|p| !p.as_os_str().is_empty()) {
                    store
                        .vfs
                        .create_dir_all(parent)
                        .map_err(|source| GateError::StorageIo {
                            path: parent.to_path_buf(),
                            source,
                        })?;
                }
                store.persist()?;
                info!(target: TARGET, path = %store.path.display(), "initialized empty snapshot store");
                return Ok(store);
            }
            Err(source) => return Err(GateError::StorageIo { path, source }),
        };

        debug!(target: TARGET, path = %path.display(), entries = entries.len(), "loaded snapshot store");
        Ok(Self { vfs, path, entries })
    }

    /// 查询记录的快照
    pub fn get(&self, path: &Path) -> Option<FileSnapshot> {
        self.entries.get(&key(path)).copied()
    }

    /// 插入或覆盖快照，并立即写回
    pub fn set(&mut self, path: &Path, snapshot: FileSnapshot) -> Result<(), GateError> {
        self.entries.insert(key(path), snapshot);
        self.persist()
    }

    /// 删除快照，并立即写回
    ///
    /// 被删除的路径下次检查时按首次出现处理。
    pub fn remove(&mut self, path: &Path) -> Result<Option<FileSnapshot>, GateError> {
        let removed = self.entries.remove(&key(path));
        if removed.is_some() {
            self.persist()?;
        }
        Ok(removed)
    }

    /// 持久化文件位置
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 记录条数
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 按路径排序遍历
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FileSnapshot)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// 整体写回（O(存储大小)）
    fn persist(&self) -> Result<(), GateError> {
        let bytes = serde_json::to_vec_pretty(&self.entries).map_err(|e| GateError::StorageCorrupt {
            path: self.path.clone(),
            message: e.to_string(),
        })?;
        self.vfs
            .write_file(&self.path, &bytes)
            .map_err(|source| GateError::StorageIo {
                path: self.path.clone(),
                source,
            })
    }
}

fn key(path: &Path) -> String {
    path.to_string_lossy().to_string()
}
