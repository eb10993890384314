//! 测试辅助工具
//!
//! 在临时目录中搭建项目，并提供一个记录构建请求的工具链。

#![allow(dead_code)]

use filetime::FileTime;
use stalegate::{
    BuildError, BuildRequest, BuildStep, BuildToolkit, LoadedModule, ModuleSpec, SourceKind,
};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// 临时项目目录
pub struct Project {
    pub dir: tempfile::TempDir,
}

impl Project {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().unwrap(),
        }
    }

    /// 项目根目录（已规范化）
    pub fn root(&self) -> PathBuf {
        std::fs::canonicalize(self.dir.path()).unwrap()
    }

    pub fn path(&self, rel: &str) -> PathBuf {
        self.root().join(rel)
    }

    /// 写入文件，并把修改时间设为过去的固定值
    pub fn write(&self, rel: &str, content: &str) -> PathBuf {
        let path = self.path(rel);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(&path, content).unwrap();
        set_mtime(&path, 1_600_000_000);
        path
    }

    pub fn store_path(&self) -> PathBuf {
        self.path(".cache/snapshots.json")
    }
}

/// 设置修改时间（秒）
pub fn set_mtime(path: &Path, seconds: i64) {
    filetime::set_file_mtime(path, FileTime::from_unix_time(seconds, 0)).unwrap();
}

/// 读取修改时间（纳秒）
pub fn mtime_ns(path: &Path) -> i64 {
    let meta = std::fs::metadata(path).unwrap();
    let t = FileTime::from_last_modification_time(&meta);
    t.unix_seconds() * 1_000_000_000 + i64::from(t.nanoseconds())
}

/// 记录每次构建请求的构建步骤
#[derive(Default)]
pub struct RecordingStep {
    pub built: Mutex<Vec<BuildRequest>>,
}

impl BuildStep for RecordingStep {
    fn find_loader(&self, spec: &ModuleSpec, _: SourceKind) -> Result<Option<PathBuf>, BuildError> {
        Ok(spec.origin.clone().filter(|p| p.is_file()))
    }

    fn build_and_load(&self, request: &BuildRequest) -> Result<LoadedModule, BuildError> {
        self.built.lock().unwrap().push(request.clone());
        Ok(LoadedModule {
            name: request.module.clone(),
            origin: request.source.clone(),
            artifact: request.build_dir.join(format!("{}.so", request.module)),
            rebuilt: true,
        })
    }
}

pub struct RecordingToolkit {
    pub step: Arc<RecordingStep>,
}

impl RecordingToolkit {
    pub fn new() -> Self {
        Self {
            step: Arc::new(RecordingStep::default()),
        }
    }
}

impl BuildToolkit for RecordingToolkit {
    fn name(&self) -> &str {
        "recording"
    }

    fn is_available(&self) -> bool {
        true
    }

    fn build_step(&self) -> Arc<dyn BuildStep> {
        self.step.clone()
    }
}
