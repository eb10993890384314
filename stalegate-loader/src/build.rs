//! Build step seam
//!
//! The gatekeeper never compiles anything. It hands a `BuildRequest` to the
//! toolkit's `BuildStep`, which decides for itself whether the artifact is
//! out of date and produces the loaded module.

use stalegate_config::{BuildConfig, FileExtensions};
use stalegate_core::resolve_build_dir;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::{BuildError, HookError};
use crate::hook::LoaderHook;
use crate::kind::SourceKind;
use crate::module::ModuleSpec;

/// Build settings shared by every hook of one installation
#[derive(Debug, Clone)]
pub struct BuildSettings {
    /// Fallback build directory
    pub build_root: PathBuf,
    /// Subdirectory appended to each module's build directory
    pub build_subdir: String,
    /// Scratch directory for intermediate files
    pub scratch_dir: PathBuf,
    pub language_level: u8,
    pub annotate: bool,
    /// Build next to the source instead of in a build directory
    pub inplace: bool,
    pub extensions: FileExtensions,
}

impl BuildSettings {
    /// Resolve settings from configuration
    ///
    /// Without an explicit build root the system temp directory is used;
    /// the scratch directory defaults to a short path under the build root.
    pub fn from_config(build: &BuildConfig, extensions: &FileExtensions) -> Self {
        let build_root = build
            .build_root
            .clone()
            .unwrap_or_else(|| std::env::temp_dir().join("stalegate"));
        let scratch_dir = build
            .scratch_dir
            .clone()
            .unwrap_or_else(|| build_root.join("tmp"));
        Self {
            build_root,
            build_subdir: build.build_subdir.clone(),
            scratch_dir,
            language_level: build.language_level,
            annotate: build.annotate,
            inplace: build.inplace,
            extensions: extensions.clone(),
        }
    }

    /// Build directory for `fullname` backed by `origin`
    ///
    /// The directory sits beside the module's top-level package, so that a
    /// renamed or relocated package tree builds where it now lives.
    pub fn module_build_dir(&self, origin: &Path, fullname: &str) -> PathBuf {
        if self.inplace {
            return origin
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| self.build_root.clone());
        }
        let base = resolve_build_dir(origin, fullname);
        let base = if base.as_os_str().is_empty() {
            self.build_root.clone()
        } else {
            base
        };
        base.join(&self.build_subdir)
    }

    /// Build directory used by toolkit hooks that know nothing of packages
    pub fn flat_build_dir(&self) -> PathBuf {
        self.build_root.join(&self.build_subdir)
    }

    /// Assemble the request for one module
    pub fn request(
        &self,
        spec: &ModuleSpec,
        source: PathBuf,
        kind: SourceKind,
        build_dir: PathBuf,
    ) -> BuildRequest {
        BuildRequest {
            module: spec.name.clone(),
            source,
            kind,
            is_package: spec.is_package,
            build_dir,
            scratch_dir: self.scratch_dir.clone(),
            language_level: self.language_level,
            annotate: self.annotate,
            inplace: self.inplace,
        }
    }
}

/// Everything the build step needs to produce one module
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildRequest {
    /// Dotted module name
    pub module: String,
    /// Top-level source file
    pub source: PathBuf,
    pub kind: SourceKind,
    pub is_package: bool,
    /// Where the artifact goes
    pub build_dir: PathBuf,
    /// Where intermediate files go
    pub scratch_dir: PathBuf,
    pub language_level: u8,
    pub annotate: bool,
    pub inplace: bool,
}

/// A module produced by the build step
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedModule {
    /// Dotted module name
    pub name: String,
    /// Top-level source file
    pub origin: PathBuf,
    /// Compiled artifact
    pub artifact: PathBuf,
    /// Whether the build step actually recompiled
    pub rebuilt: bool,
}

/// The external build-and-load step
pub trait BuildStep: Send + Sync {
    /// Confirm that this step can produce `spec` as a `kind` module
    ///
    /// Returns the source file the step will compile, or `None` to decline.
    fn find_loader(&self, spec: &ModuleSpec, kind: SourceKind) -> Result<Option<PathBuf>, BuildError>;

    /// Compile if needed, then load
    fn build_and_load(&self, request: &BuildRequest) -> Result<LoadedModule, BuildError>;
}

/// A build toolkit: its build step plus the hooks it installs by default
pub trait BuildToolkit: Send + Sync {
    /// Toolkit name, used in errors and logs
    fn name(&self) -> &str;

    /// Whether the toolkit can be used in this environment
    fn is_available(&self) -> bool;

    /// The shared build step
    fn build_step(&self) -> Arc<dyn BuildStep>;

    /// Hooks the toolkit's own installer appends to a chain
    ///
    /// Default implementation returns one vanilla hook per source kind
    fn default_hooks(&self, settings: &BuildSettings) -> Vec<Box<dyn LoaderHook>> {
        use crate::hooks::VanillaHook;

        [SourceKind::Extension, SourceKind::Plain]
            .into_iter()
            .map(|kind| {
                Box::new(VanillaHook::new(kind, self.build_step(), settings.clone()))
                    as Box<dyn LoaderHook>
            })
            .collect()
    }
}

/// A loader returned by a hook, bound to one request
pub struct BuildLoader {
    step: Arc<dyn BuildStep>,
    request: BuildRequest,
}

impl std::fmt::Debug for BuildLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BuildLoader")
            .field("request", &self.request)
            .finish()
    }
}

impl BuildLoader {
    pub fn new(step: Arc<dyn BuildStep>, request: BuildRequest) -> Self {
        Self { step, request }
    }

    pub fn request(&self) -> &BuildRequest {
        &self.request
    }

    /// Run the build step
    ///
    /// Compile errors surface as `HookError::CompileFailure` with the
    /// build step's message intact.
    pub fn load(self) -> Result<LoadedModule, HookError> {
        self.step
            .build_and_load(&self.request)
            .map_err(|source| HookError::CompileFailure {
                module: self.request.module.clone(),
                source,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> BuildSettings {
        let build = BuildConfig {
            build_root: Some(PathBuf::from("/tmp/sg")),
            ..BuildConfig::default()
        };
        BuildSettings::from_config(&build, &FileExtensions::default())
    }

    #[test]
    fn test_from_config_defaults() {
        let s = settings();
        assert_eq!(s.scratch_dir, PathBuf::from("/tmp/sg/tmp"));
        assert_eq!(s.build_subdir, "_stalebuild");
        assert_eq!(s.language_level, 3);
        assert!(s.annotate);
        assert!(!s.inplace);
    }

    #[test]
    fn test_explicit_scratch_dir() {
        let build = BuildConfig {
            scratch_dir: Some(PathBuf::from("/s")),
            ..BuildConfig::default()
        };
        let s = BuildSettings::from_config(&build, &FileExtensions::default());
        assert_eq!(s.scratch_dir, PathBuf::from("/s"));
    }

    #[test]
    fn test_module_build_dir_follows_package_location() {
        let s = settings();
        assert_eq!(
            s.module_build_dir(Path::new("/work/renamed_pkg/sub/mod.pyx"), "pkg.sub.mod"),
            PathBuf::from("/work/renamed_pkg/_stalebuild")
        );
        assert_eq!(
            s.module_build_dir(Path::new("/work/top.pyx"), "top"),
            PathBuf::from("/work/_stalebuild")
        );
        // no directory component: fall back to the build root
        assert_eq!(
            s.module_build_dir(Path::new("top.pyx"), "top"),
            PathBuf::from("/tmp/sg/_stalebuild")
        );
    }

    #[test]
    fn test_inplace_builds_beside_source() {
        let mut s = settings();
        s.inplace = true;
        assert_eq!(
            s.module_build_dir(Path::new("/work/pkg/mod.pyx"), "pkg.mod"),
            PathBuf::from("/work/pkg")
        );
    }

    struct Failing;

    impl BuildStep for Failing {
        fn find_loader(&self, _: &ModuleSpec, _: SourceKind) -> Result<Option<PathBuf>, BuildError> {
            Ok(None)
        }

        fn build_and_load(&self, _: &BuildRequest) -> Result<LoadedModule, BuildError> {
            Err(BuildError::Compile {
                message: "syntax error".to_string(),
            })
        }
    }

    #[test]
    fn test_loader_wraps_compile_failure() {
        let s = settings();
        let spec = ModuleSpec::file("m", "/w/m.pyx");
        let request = s.request(
            &spec,
            PathBuf::from("/w/m.pyx"),
            SourceKind::Extension,
            PathBuf::from("/w/_stalebuild"),
        );
        let err = BuildLoader::new(Arc::new(Failing), request).load().unwrap_err();

        match err {
            HookError::CompileFailure { module, source } => {
                assert_eq!(module, "m");
                assert_eq!(source.to_string(), "compilation failed: syntax error");
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
