//! Gatekeeper hooks
//!
//! Two variants share one type, tagged by `CompileKind`:
//!
//! - `DeclaredInterface` takes over a plain source only when a companion
//!   interface file sits beside it, runs the tracker, then asks the build
//!   step for a loader.
//! - `ExtensionSource` asks the build step first and runs the tracker only
//!   when the step resolved a loader.
//!
//! A name the declared-interface hook has declined or accepted is never looked
//! at again by it; the extension-source hook only remembers names it declined.
//! A name whose check failed with an error is not remembered by either.

use stalegate_config::Target;
use stalegate_core::StalenessTracker;
use stalegate_vfs::VirtualFileSystem;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, info};

use crate::build::{BuildLoader, BuildSettings, BuildStep};
use crate::error::HookError;
use crate::hook::{HookMetadata, HookOrigin, HookStats, LoaderHook};
use crate::kind::{classify_path, CompileKind};
use crate::module::{ModuleSpec, SpecFinder};

const TARGET: &str = Target::Hooks.target();

/// Tracker shared by both gatekeeper hooks of one installation
pub type SharedTracker = Arc<Mutex<StalenessTracker>>;

/// A gatekeeping loader hook
pub struct GatekeeperHook {
    kind: CompileKind,
    tracker: SharedTracker,
    step: Arc<dyn BuildStep>,
    vfs: Arc<dyn VirtualFileSystem>,
    settings: BuildSettings,
    checked: HashSet<String>,
    stats: HookStats,
}

impl std::fmt::Debug for GatekeeperHook {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatekeeperHook")
            .field("kind", &self.kind)
            .field("checked", &self.checked.len())
            .field("stats", &self.stats)
            .finish()
    }
}

impl GatekeeperHook {
    pub fn new(
        kind: CompileKind,
        tracker: SharedTracker,
        step: Arc<dyn BuildStep>,
        vfs: Arc<dyn VirtualFileSystem>,
        settings: BuildSettings,
    ) -> Self {
        Self {
            kind,
            tracker,
            step,
            vfs,
            settings,
            checked: HashSet::new(),
            stats: HookStats::default(),
        }
    }

    pub fn kind(&self) -> CompileKind {
        self.kind
    }

    /// Whether `fullname` is cached as checked
    pub fn has_checked(&self, fullname: &str) -> bool {
        self.checked.contains(fullname)
    }

    fn decline(&mut self, fullname: &str, reason: &'static str) -> Result<Option<BuildLoader>, HookError> {
        self.checked.insert(fullname.to_string());
        self.stats.declined += 1;
        debug!(target: TARGET, hook = self.kind.hook_name(), module = fullname, reason, "declined");
        Ok(None)
    }

    fn lock_tracker(&self) -> MutexGuard<'_, StalenessTracker> {
        // 存储是 write-through 的，中毒后内存状态依然一致
        self.tracker.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn track(&self, fullname: &str, source: &Path) -> Result<(), HookError> {
        let report = self.lock_tracker().check_and_touch_dependencies(source)?;
        if !report.is_clean() {
            info!(
                target: TARGET,
                module = fullname,
                touched = report.touched.len(),
                "dependencies changed since last run"
            );
        }
        Ok(())
    }

    fn accept(
        &mut self,
        spec: &ModuleSpec,
        source: PathBuf,
    ) -> Result<Option<BuildLoader>, HookError> {
        let build_dir = self.settings.module_build_dir(&source, &spec.name);
        let request = self
            .settings
            .request(spec, source, self.kind.source_kind(), build_dir);
        self.stats.accepted += 1;
        debug!(
            target: TARGET,
            hook = self.kind.hook_name(),
            module = %spec.name,
            build_dir = %request.build_dir.display(),
            "accepted"
        );
        Ok(Some(BuildLoader::new(self.step.clone(), request)))
    }

    fn resolve_loader(&self, spec: &ModuleSpec) -> Result<Option<PathBuf>, HookError> {
        self.step
            .find_loader(spec, self.kind.source_kind())
            .map_err(|source| HookError::LoaderResolution {
                module: spec.name.clone(),
                source,
            })
    }

    fn find_declared(
        &mut self,
        fullname: &str,
        finder: &dyn SpecFinder,
    ) -> Result<Option<BuildLoader>, HookError> {
        if self.checked.contains(fullname) {
            self.stats.declined += 1;
            return Ok(None);
        }

        let Some(spec) = finder.find_spec(fullname) else {
            return self.decline(fullname, "no spec");
        };
        let Some(origin) = spec.origin.clone() else {
            return self.decline(fullname, "no backing file");
        };
        if classify_path(&origin, self.vfs.as_ref(), &self.settings.extensions)
            != Some(CompileKind::DeclaredInterface)
        {
            return self.decline(fullname, "no companion interface");
        }

        // 追踪失败不进缓存，下一次导入会再次报错
        self.track(fullname, &origin)?;

        match self.resolve_loader(&spec)? {
            Some(source) => {
                self.checked.insert(fullname.to_string());
                self.accept(&spec, source)
            }
            None => self.decline(fullname, "build step declined"),
        }
    }

    fn find_extension(
        &mut self,
        fullname: &str,
        finder: &dyn SpecFinder,
    ) -> Result<Option<BuildLoader>, HookError> {
        if self.checked.contains(fullname) {
            self.stats.declined += 1;
            return Ok(None);
        }

        let Some(spec) = finder.find_spec(fullname) else {
            return self.decline(fullname, "no spec");
        };
        let is_extension = spec.origin.as_deref().is_some_and(|origin| {
            classify_path(origin, self.vfs.as_ref(), &self.settings.extensions)
                == Some(CompileKind::ExtensionSource)
        });
        if !is_extension {
            return self.decline(fullname, "not an extension source");
        }

        let Some(source) = self.resolve_loader(&spec)? else {
            return self.decline(fullname, "build step declined");
        };

        self.track(fullname, &source)?;
        self.accept(&spec, source)
    }
}

impl LoaderHook for GatekeeperHook {
    fn metadata(&self) -> HookMetadata {
        HookMetadata::new(
            self.kind.hook_name(),
            Some(self.kind.source_kind()),
            HookOrigin::Gatekeeper,
        )
    }

    fn find_module(
        &mut self,
        fullname: &str,
        finder: &dyn SpecFinder,
    ) -> Result<Option<BuildLoader>, HookError> {
        match self.kind {
            CompileKind::DeclaredInterface => self.find_declared(fullname, finder),
            CompileKind::ExtensionSource => self.find_extension(fullname, finder),
        }
    }

    fn stats(&self) -> HookStats {
        self.stats
    }
}
