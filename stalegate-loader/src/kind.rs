//! File kind classification
//!
//! Which hook may take over a module is decided by a pure function over the
//! backing file's extension and stem, and whether a companion interface file
//! sits beside it.

use stalegate_config::FileExtensions;
use stalegate_vfs::VirtualFileSystem;
use std::fmt;
use std::path::Path;

/// The kind of source file a build step is asked to compile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceKind {
    /// A plain source module
    Plain,
    /// A source written to be compiled into a native module
    Extension,
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceKind::Plain => write!(f, "plain"),
            SourceKind::Extension => write!(f, "extension"),
        }
    }
}

/// The two ways a gatekeeper hook can take over a module
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompileKind {
    /// Plain source with a companion interface file beside it
    DeclaredInterface,
    /// Extension-source file, taken over unconditionally
    ExtensionSource,
}

impl CompileKind {
    /// The file kind handed to the build step
    pub fn source_kind(self) -> SourceKind {
        match self {
            CompileKind::DeclaredInterface => SourceKind::Plain,
            CompileKind::ExtensionSource => SourceKind::Extension,
        }
    }

    /// Name of the gatekeeper hook for this kind
    pub fn hook_name(self) -> &'static str {
        match self {
            CompileKind::DeclaredInterface => "declared_interface",
            CompileKind::ExtensionSource => "extension_source",
        }
    }
}

impl fmt::Display for CompileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.hook_name())
    }
}

/// Classify a backing file
///
/// # Arguments
/// * `extension` - file extension without the dot
/// * `stem` - file name without the extension
/// * `has_companion_interface` - whether `<stem>.<interface>` exists beside it
pub fn classify(
    extension: Option<&str>,
    stem: Option<&str>,
    has_companion_interface: bool,
    extensions: &FileExtensions,
) -> Option<CompileKind> {
    let extension = extension?;
    if extension == extensions.extension_source {
        return Some(CompileKind::ExtensionSource);
    }
    if extension == extensions.source
        && stem != Some(extensions.package_initializer.as_str())
        && has_companion_interface
    {
        return Some(CompileKind::DeclaredInterface);
    }
    None
}

/// Classify `path`, probing the file system for its companion interface
pub fn classify_path(
    path: &Path,
    vfs: &dyn VirtualFileSystem,
    extensions: &FileExtensions,
) -> Option<CompileKind> {
    let extension = path.extension().and_then(|e| e.to_str());
    let stem = path.file_stem().and_then(|s| s.to_str());
    // Only plain sources need the probe
    let probe = extension == Some(extensions.source.as_str())
        && vfs.is_file(&extensions.companion_interface(path));
    classify(extension, stem, probe, extensions)
}

/// The file kind of `path` by extension alone
pub fn source_kind_of(path: &Path, extensions: &FileExtensions) -> Option<SourceKind> {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) if ext == extensions.extension_source => Some(SourceKind::Extension),
        Some(ext) if ext == extensions.source => Some(SourceKind::Plain),
        _ => None,
    }
}
