//! 陈旧性追踪器
//!
//! 持有一个快照存储和一个依赖解析器。对给定的顶层源文件，遍历它的全部依赖，
//! 对每个快照发生变化（或从未记录过）的依赖执行 touch，并记录新快照。
//!
//! 外部构建步骤只检查顶层源文件是否变化；共享接口文件的变化原本会被忽略。
//! touch 之后，构建步骤自己的依赖扫描就能看到这次变化。

use stalegate_config::Target;
use stalegate_vfs::VirtualFileSystem;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

use crate::error::{GateError, ResolveError};
use crate::resolver::DependencyResolver;
use crate::snapshot::{FileSnapshot, Freshness};
use crate::store::SnapshotStore;
use crate::touch::touch;

const TARGET: &str = Target::Tracker.target();

/// 一次检查的结果
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CheckReport {
    /// 被 touch 的依赖（按解析器顺序）
    pub touched: Vec<PathBuf>,
    /// 未变化的依赖数量
    pub unchanged: usize,
}

impl CheckReport {
    /// 没有任何依赖被 touch
    pub fn is_clean(&self) -> bool {
        self.touched.is_empty()
    }
}

/// 陈旧性追踪器
pub struct StalenessTracker {
    /// 虚拟文件系统
    vfs: Arc<dyn VirtualFileSystem>,
    /// 依赖解析器
    resolver: Box<dyn DependencyResolver>,
    /// 存储文件位置
    store_path: PathBuf,
    /// 快照存储（首次使用时加载）
    store: Option<SnapshotStore>,
}

impl std::fmt::Debug for StalenessTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StalenessTracker")
            .field("store_path", &self.store_path)
            .field("loaded", &self.store.is_some())
            .finish()
    }
}

impl StalenessTracker {
    /// 创建追踪器（不会立即加载存储）
    pub fn new(
        vfs: Arc<dyn VirtualFileSystem>,
        resolver: Box<dyn DependencyResolver>,
        store_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            vfs,
            resolver,
            store_path: store_path.into(),
            store: None,
        }
    }

    /// 加载存储（只加载一次）
    ///
    /// 安装器借此在存储损坏时尽早失败。
    pub fn ensure_loaded(&mut self) -> Result<&mut SnapshotStore, GateError> {
        let store = match self.store.take() {
            Some(store) => store,
            None => SnapshotStore::load(self.vfs.clone(), &self.store_path)?,
        };
        Ok(self.store.insert(store))
    }

    /// 已加载的存储
    pub fn store(&self) -> Option<&SnapshotStore> {
        self.store.as_ref()
    }

    /// 存储文件位置
    pub fn store_path(&self) -> &Path {
        &self.store_path
    }

    /// 检查 `source` 的全部依赖，touch 发生变化的依赖
    ///
    /// # Errors
    /// - 解析器错误原样传播
    /// - 依赖文件不存在时返回 `GateError::MissingDependency`
    /// - 存储写回失败时返回 `GateError::StorageIo`
    pub fn check_and_touch_dependencies(&mut self, source: &Path) -> Result<CheckReport, GateError> {
        let deps = self.resolver.dependencies(source)?;
        let vfs = self.vfs.clone();
        let store = self.ensure_loaded()?;

        let mut report = CheckReport::default();
        let mut seen = HashSet::new();

        for dep in deps {
            let dep = absolute(&dep)?;
            if !seen.insert(dep.clone()) {
                continue;
            }

            let current = FileSnapshot::of(vfs.as_ref(), &dep)?;
            match Freshness::assess(store.get(&dep), current) {
                Freshness::Unchanged => {
                    report.unchanged += 1;
                }
                freshness => {
                    debug!(target: TARGET, path = %dep.display(), ?freshness, "dependency is stale");
                    // 记录 touch 之后的快照，紧接着的下一次检查才会认为它未变化
                    let after = touch(vfs.as_ref(), &dep)?;
                    store.set(&dep, after)?;
                    report.touched.push(dep);
                }
            }
        }

        debug!(
            target: TARGET,
            source = %source.display(),
            touched = report.touched.len(),
            unchanged = report.unchanged,
            "dependency check finished"
        );
        Ok(report)
    }
}

/// 存储以绝对路径为键，相对路径按当前目录补全
fn absolute(path: &Path) -> Result<PathBuf, GateError> {
    std::path::absolute(path).map_err(|e| {
        GateError::Resolve(ResolveError::Failed {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    })
}
