//! 指令扫描解析器
//!
//! 默认的依赖解析器：从源文件出发，扫描 `cimport` / `include` 指令，
//! 收集传递依赖的接口文件与被包含文件。
//!
//! # 解析规则
//! - 源文件本身总在结果中（第一项）
//! - 同名接口文件（`mod.py` → `mod.pxd`）存在时加入结果
//! - `cimport a.b` / `from a.b cimport x` → 查找 `a/b.pxd`（或 `a/b/x.pxd`）
//! - `include "x.pxi"` → 相对包含它的文件所在目录
//! - 搜索顺序：当前文件所在目录，然后是配置的 include 目录
//! - 找不到的 `cimport` 目标跳过（属于构建工具自带的声明）
//! - 找不到的 `include` 目标原样返回，由追踪器报告 `MissingDependency`

use stalegate_config::{FileExtensions, Target};
use stalegate_vfs::VirtualFileSystem;
use std::collections::{HashSet, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::error::ResolveError;
use crate::resolver::DependencyResolver;

const TARGET: &str = Target::Tracker.target();

/// 编译期依赖指令
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive {
    /// `cimport a.b [as c], d`
    Cimport(String),
    /// `from a.b cimport x, y`
    FromCimport { module: String, names: Vec<String> },
    /// `include "file"`
    Include(String),
}

/// 从源码文本中提取指令
pub fn parse_directives(text: &str) -> Vec<Directive> {
    let mut directives = Vec::new();

    for raw in text.lines() {
        let line = match raw.find('#') {
            Some(idx) => &raw[..idx],
            None => raw,
        }
        .trim();

        if let Some(rest) = line.strip_prefix("include ") {
            let name = rest.trim().trim_matches(|c| c == '"' || c == '\'');
            if !name.is_empty() {
                directives.push(Directive::Include(name.to_string()));
            }
        } else if let Some(rest) = line.strip_prefix("cimport ") {
            for item in rest.split(',') {
                if let Some(module) = item.split_whitespace().next() {
                    directives.push(Directive::Cimport(module.to_string()));
                }
            }
        } else if let Some(rest) = line.strip_prefix("from ") {
            let Some((module, names)) = rest.split_once(" cimport ") else {
                continue;
            };
            let names = names
                .trim()
                .trim_start_matches('(')
                .trim_end_matches(')')
                .split(',')
                .filter_map(|n| n.split_whitespace().next())
                .map(str::to_string)
                .collect();
            directives.push(Directive::FromCimport {
                module: module.trim().to_string(),
                names,
            });
        }
    }

    directives
}

/// 指令扫描解析器
pub struct DirectiveScanner {
    /// 虚拟文件系统
    vfs: Arc<dyn VirtualFileSystem>,
    /// 文件扩展名约定
    extensions: FileExtensions,
    /// 额外的搜索目录
    include_dirs: Vec<PathBuf>,
}

impl DirectiveScanner {
    pub fn new(vfs: Arc<dyn VirtualFileSystem>, extensions: FileExtensions) -> Self {
        Self {
            vfs,
            extensions,
            include_dirs: Vec::new(),
        }
    }

    /// 设置额外的搜索目录
    pub fn with_include_dirs(mut self, dirs: impl IntoIterator<Item = PathBuf>) -> Self {
        self.include_dirs = dirs.into_iter().collect();
        self
    }

    /// 搜索目录：当前文件所在目录优先
    fn search_roots(&self, from_file: &Path) -> Vec<PathBuf> {
        let mut roots = Vec::with_capacity(self.include_dirs.len() + 1);
        if let Some(parent) = from_file.parent() {
            roots.push(parent.to_path_buf());
        }
        roots.extend(self.include_dirs.iter().cloned());
        roots
    }

    /// 将模块名转换为接口文件的相对路径：a.b → a/b.pxd
    fn interface_rel_path(&self, dotted: &str) -> PathBuf {
        let mut rel: PathBuf = dotted.split('.').collect();
        rel.set_extension(&self.extensions.interface);
        rel
    }

    /// 查找 `cimport` 目标对应的接口文件
    ///
    /// 以 `.` 开头的相对导入只在当前文件所在目录（及其上级）中查找。
    fn find_interface(&self, from_file: &Path, dotted: &str) -> Option<PathBuf> {
        let dots = dotted.chars().take_while(|c| *c == '.').count();
        if dots > 0 {
            let mut base = from_file.parent()?.to_path_buf();
            for _ in 1..dots {
                base = base.parent()?.to_path_buf();
            }
            let rest = &dotted[dots..];
            if rest.is_empty() {
                return None;
            }
            let candidate = base.join(self.interface_rel_path(rest));
            return self.vfs.is_file(&candidate).then_some(candidate);
        }

        let rel = self.interface_rel_path(dotted);
        self.search_roots(from_file)
            .into_iter()
            .map(|root| root.join(&rel))
            .find(|candidate| self.vfs.is_file(candidate))
    }

    /// 查找 `include` 目标；都找不到时返回相对当前目录的路径
    fn find_include(&self, from_file: &Path, name: &str) -> PathBuf {
        let roots = self.search_roots(from_file);
        roots
            .iter()
            .map(|root| root.join(name))
            .find(|candidate| self.vfs.is_file(candidate))
            .unwrap_or_else(|| match roots.first() {
                Some(dir) => dir.join(name),
                None => PathBuf::from(name),
            })
    }

    /// 解析单个文件中的指令，返回新发现的依赖
    fn scan_file(&self, file: &Path) -> Result<Vec<PathBuf>, ResolveError> {
        let bytes = self
            .vfs
            .read_file(file)
            .map_err(|source| ResolveError::Unreadable {
                path: file.to_path_buf(),
                source,
            })?;
        let text = String::from_utf8_lossy(&bytes);

        let mut found = Vec::new();
        for directive in parse_directives(&text) {
            match directive {
                Directive::Cimport(module) => match self.find_interface(file, &module) {
                    Some(path) => found.push(path),
                    None => debug!(target: TARGET, module = %module, file = %file.display(), "cimport target not found locally, skipped"),
                },
                Directive::FromCimport { module, names } => {
                    // `from pkg cimport sub` 可能指向子模块 pkg/sub.pxd
                    let mut any = false;
                    for name in &names {
                        let qualified = if module.ends_with('.') {
                            format!("{}{}", module, name)
                        } else {
                            format!("{}.{}", module, name)
                        };
                        if let Some(path) = self.find_interface(file, &qualified) {
                            found.push(path);
                            any = true;
                        }
                    }
                    match self.find_interface(file, &module) {
                        Some(path) => found.push(path),
                        None if !any => {
                            debug!(target: TARGET, module = %module, file = %file.display(), "cimport target not found locally, skipped")
                        }
                        None => {}
                    }
                }
                Directive::Include(name) => found.push(self.find_include(file, &name)),
            }
        }
        Ok(found)
    }
}

impl DependencyResolver for DirectiveScanner {
    fn dependencies(&self, source: &Path) -> Result<Vec<PathBuf>, ResolveError> {
        let mut ordered = Vec::new();
        let mut seen = HashSet::new();
        let mut queue = VecDeque::new();

        let mut push = |path: PathBuf, queue: &mut VecDeque<PathBuf>| {
            if seen.insert(path.clone()) {
                ordered.push(path.clone());
                queue.push_back(path);
            }
        };

        push(source.to_path_buf(), &mut queue);
        let companion = self.extensions.companion_interface(source);
        if companion != source && self.vfs.is_file(&companion) {
            push(companion, &mut queue);
        }

        while let Some(file) = queue.pop_front() {
            if !self.vfs.is_file(&file) {
                // 缺失的文件留给追踪器报告
                if file != source {
                    warn!(target: TARGET, path = %file.display(), "included file does not exist");
                }
                continue;
            }
            for dep in self.scan_file(&file)? {
                push(dep, &mut queue);
            }
        }

        Ok(ordered)
    }
}
