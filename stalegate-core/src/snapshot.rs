//! 文件快照
//!
//! 一个文件的 (修改时间, 大小) 二元组，是陈旧性比较的基本单位。

use serde::{Deserialize, Serialize};
use stalegate_vfs::{FileStat, VirtualFileSystem};
use std::path::Path;

use crate::error::GateError;

/// 文件快照（值类型，创建后不可变）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FileSnapshot {
    /// 修改时间（自 UNIX 纪元起的纳秒数）
    pub mtime: i64,
    /// 文件大小（字节）
    pub size: u64,
}

impl FileSnapshot {
    pub fn new(mtime: i64, size: u64) -> Self {
        Self { mtime, size }
    }

    /// 对文件执行 stat，生成新快照
    ///
    /// 文件不存在时返回 `GateError::MissingDependency`。
    pub fn of(vfs: &dyn VirtualFileSystem, path: &Path) -> Result<Self, GateError> {
        vfs.metadata(path).map(Self::from).map_err(|e| {
            if e.is_not_found() {
                GateError::MissingDependency {
                    path: path.to_path_buf(),
                }
            } else {
                GateError::Stat {
                    path: path.to_path_buf(),
                    source: e,
                }
            }
        })
    }
}

impl From<FileStat> for FileSnapshot {
    fn from(stat: FileStat) -> Self {
        Self::new(stat.mtime_ns, stat.size)
    }
}

/// 记录快照与当前快照的比较结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freshness {
    /// 从未记录过（按"已变更"处理）
    FirstSeen,
    /// 任一字段不同
    Changed { recorded: FileSnapshot },
    /// 完全一致
    Unchanged,
}

impl Freshness {
    /// 比较记录值与当前值
    pub fn assess(recorded: Option<FileSnapshot>, current: FileSnapshot) -> Self {
        match recorded {
            None => Freshness::FirstSeen,
            Some(recorded) if recorded != current => Freshness::Changed { recorded },
            Some(_) => Freshness::Unchanged,
        }
    }

    /// 是否需要 touch
    pub fn is_stale(&self) -> bool {
        !matches!(self, Freshness::Unchanged)
    }
}
