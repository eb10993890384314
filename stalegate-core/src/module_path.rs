//! 模块路径解析
//!
//! 根据点分模块名和实现它的文件，计算构建产物应放置的目录。
//!
//! # 规则
//! - 单段模块名（顶层模块）→ 文件所在目录
//! - 多段模块名：去掉最后一段（模块自身），从文件所在目录开始逐级向上，
//!   每级目录名与剩余段（从后往前）比较
//! - 第一次不匹配时立即停止并返回当前目录（包被重命名或移动时继续向上不安全）
//!
//! `pkg.sub.mod` 位于 `/root/pkg/sub/mod.pyx` → `/root`；
//! 若 `pkg` 目录实际叫 `renamed_pkg` → `/root/renamed_pkg`。

use std::ffi::OsStr;
use std::path::{Path, PathBuf};

/// 计算模块的构建目录
pub fn resolve_build_dir(file_path: &Path, dotted_name: &str) -> PathBuf {
    let mut dir = file_path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_default();

    let segments: Vec<&str> = dotted_name.split('.').collect();
    let Some((_, packages)) = segments.split_last() else {
        return dir;
    };

    for segment in packages.iter().rev() {
        if dir.file_name() != Some(OsStr::new(segment)) {
            break;
        }
        match dir.parent() {
            Some(parent) => dir = parent.to_path_buf(),
            None => break,
        }
    }

    dir
}
