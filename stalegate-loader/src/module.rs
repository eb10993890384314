//! Module specs and spec finders
//!
//! A hook learns which file backs a dotted module name through a
//! `SpecFinder`. `PathFinder` searches a list of roots the way a source
//! path lookup does: package directory first, then module files.

use stalegate_config::FileExtensions;
use stalegate_vfs::VirtualFileSystem;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// What a finder knows about a module
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleSpec {
    /// Dotted module name
    pub name: String,
    /// Backing file, `None` for namespace packages
    pub origin: Option<PathBuf>,
    /// Whether the module is a package
    pub is_package: bool,
}

impl ModuleSpec {
    /// A module backed by `origin`
    pub fn file(name: impl Into<String>, origin: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            origin: Some(origin.into()),
            is_package: false,
        }
    }

    /// A package whose initializer is `origin`
    pub fn package(name: impl Into<String>, origin: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            origin: Some(origin.into()),
            is_package: true,
        }
    }

    /// A package with no initializer
    pub fn namespace(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            origin: None,
            is_package: true,
        }
    }
}

/// Looks up the spec of a dotted module name
pub trait SpecFinder {
    fn find_spec(&self, fullname: &str) -> Option<ModuleSpec>;
}

impl<F> SpecFinder for F
where
    F: Fn(&str) -> Option<ModuleSpec>,
{
    fn find_spec(&self, fullname: &str) -> Option<ModuleSpec> {
        self(fullname)
    }
}

/// Spec finder over a list of search roots
pub struct PathFinder {
    vfs: Arc<dyn VirtualFileSystem>,
    roots: Vec<PathBuf>,
    extensions: FileExtensions,
}

impl PathFinder {
    pub fn new(
        vfs: Arc<dyn VirtualFileSystem>,
        roots: impl IntoIterator<Item = PathBuf>,
        extensions: FileExtensions,
    ) -> Self {
        Self {
            vfs,
            roots: roots.into_iter().collect(),
            extensions,
        }
    }

    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    fn first_file(&self, base: &Path, stem: &str) -> Option<PathBuf> {
        [&self.extensions.extension_source, &self.extensions.source]
            .into_iter()
            .map(|ext| base.join(format!("{stem}.{ext}")))
            .find(|candidate| self.vfs.is_file(candidate))
    }
}

impl SpecFinder for PathFinder {
    fn find_spec(&self, fullname: &str) -> Option<ModuleSpec> {
        let mut parts: Vec<&str> = fullname.split('.').collect();
        let leaf = parts.pop().filter(|s| !s.is_empty())?;
        if parts.iter().any(|p| p.is_empty()) {
            return None;
        }

        let mut namespace = None;
        for root in &self.roots {
            let parent = parts.iter().fold(root.clone(), |acc, p| acc.join(p));

            let package_dir = parent.join(leaf);
            if self.vfs.is_dir(&package_dir) {
                if let Some(init) = self.first_file(&package_dir, &self.extensions.package_initializer) {
                    return Some(ModuleSpec::package(fullname, init));
                }
                namespace.get_or_insert_with(|| ModuleSpec::namespace(fullname));
            }

            if let Some(file) = self.first_file(&parent, leaf) {
                return Some(ModuleSpec::file(fullname, file));
            }
        }
        namespace
    }
}
