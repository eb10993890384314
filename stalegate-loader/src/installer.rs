//! Gatekeeper installer
//!
//! Installing into a chain, in order:
//!
//! 1. refuse when the toolkit is unavailable or the snapshot store is unreadable
//! 2. run the toolkit's own installation (appends its vanilla hooks)
//! 3. remove every unpatched toolkit hook for a kind the gatekeeper overrides
//! 4. put the declared-interface hook, then the extension-source hook, at
//!    the front, so the extension-source hook is consulted first
//!
//! A second installation into the same chain changes nothing.

use stalegate_config::{GatekeeperConfig, Target};
use stalegate_core::{default_store_path, DependencyResolver, DirectiveScanner, StalenessTracker};
use stalegate_vfs::VirtualFileSystem;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

use crate::build::{BuildSettings, BuildToolkit};
use crate::chain::HookChain;
use crate::error::HookError;
use crate::hooks::GatekeeperHook;
use crate::kind::CompileKind;

const TARGET: &str = Target::Installer.target();

/// What an installation did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstallReport {
    /// Names of the toolkit hooks that were removed
    pub removed: Vec<&'static str>,
    /// The chain already had gatekeepers; nothing was changed
    pub already_installed: bool,
    /// Where the snapshot store lives
    pub store_path: PathBuf,
}

/// Builder for one gatekeeper installation
pub struct Gatekeeper {
    config: GatekeeperConfig,
    vfs: Arc<dyn VirtualFileSystem>,
    toolkit: Arc<dyn BuildToolkit>,
    resolver: Option<Box<dyn DependencyResolver>>,
}

impl Gatekeeper {
    pub fn new(
        config: GatekeeperConfig,
        vfs: Arc<dyn VirtualFileSystem>,
        toolkit: Arc<dyn BuildToolkit>,
    ) -> Self {
        Self {
            config,
            vfs,
            toolkit,
            resolver: None,
        }
    }

    /// Use `resolver` instead of the directive scanner
    pub fn with_resolver(mut self, resolver: impl DependencyResolver + 'static) -> Self {
        self.resolver = Some(Box::new(resolver));
        self
    }

    /// Where the snapshot store will live
    pub fn store_path(&self) -> PathBuf {
        self.config
            .store_path
            .clone()
            .unwrap_or_else(default_store_path)
    }

    /// Resolved build settings
    pub fn settings(&self) -> BuildSettings {
        BuildSettings::from_config(&self.config.build, &self.config.extensions)
    }

    /// Install gatekeeper hooks into `chain`
    ///
    /// # Errors
    /// - `HookError::ToolkitUnavailable` when the toolkit cannot be used
    /// - `HookError::Gate` when the snapshot store cannot be loaded
    ///
    /// On error the chain is left untouched.
    pub fn install_into(self, chain: &mut HookChain) -> Result<InstallReport, HookError> {
        let store_path = self.store_path();
        if chain.is_gatekeeper_installed() {
            debug!(target: TARGET, "gatekeeper already installed");
            return Ok(InstallReport {
                already_installed: true,
                store_path,
                ..InstallReport::default()
            });
        }

        if !self.toolkit.is_available() {
            return Err(HookError::ToolkitUnavailable(self.toolkit.name().to_string()));
        }

        let settings = self.settings();
        let resolver = match self.resolver {
            Some(resolver) => resolver,
            None => Box::new(
                DirectiveScanner::new(self.vfs.clone(), self.config.extensions.clone())
                    .with_include_dirs(self.config.include_dirs.clone()),
            ),
        };
        let mut tracker = StalenessTracker::new(self.vfs.clone(), resolver, &store_path);
        tracker.ensure_loaded()?;
        let tracker = Arc::new(Mutex::new(tracker));

        for hook in self.toolkit.default_hooks(&settings) {
            chain.push(hook);
        }
        let removed: Vec<&'static str> = chain
            .retain(|meta| !meta.is_replaced_by_gatekeeper())
            .into_iter()
            .map(|meta| meta.name)
            .collect();

        let step = self.toolkit.build_step();
        for kind in [CompileKind::DeclaredInterface, CompileKind::ExtensionSource] {
            chain.insert_front(Box::new(GatekeeperHook::new(
                kind,
                tracker.clone(),
                step.clone(),
                self.vfs.clone(),
                settings.clone(),
            )));
        }
        chain.mark_gatekeeper_installed();

        info!(
            target: TARGET,
            toolkit = self.toolkit.name(),
            store = %store_path.display(),
            scratch = %settings.scratch_dir.display(),
            removed = removed.len(),
            "gatekeeper installed"
        );
        Ok(InstallReport {
            removed,
            already_installed: false,
            store_path,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build::{BuildRequest, BuildStep, LoadedModule};
    use crate::error::BuildError;
    use crate::hook::HookOrigin;
    use crate::kind::SourceKind;
    use crate::module::ModuleSpec;
    use stalegate_core::StaticDependencies;
    use stalegate_vfs::MemoryFileSystem;
    use std::path::Path;

    struct Step;

    impl BuildStep for Step {
        fn find_loader(&self, spec: &ModuleSpec, _: SourceKind) -> Result<Option<PathBuf>, BuildError> {
            Ok(spec.origin.clone())
        }

        fn build_and_load(&self, request: &BuildRequest) -> Result<LoadedModule, BuildError> {
            Ok(LoadedModule {
                name: request.module.clone(),
                origin: request.source.clone(),
                artifact: request.build_dir.join("m.so"),
                rebuilt: true,
            })
        }
    }

    struct Toolkit {
        available: bool,
    }

    impl BuildToolkit for Toolkit {
        fn name(&self) -> &str {
            "fake"
        }

        fn is_available(&self) -> bool {
            self.available
        }

        fn build_step(&self) -> Arc<dyn BuildStep> {
            Arc::new(Step)
        }
    }

    fn gatekeeper(fs: &MemoryFileSystem, available: bool) -> Gatekeeper {
        let config = GatekeeperConfig {
            store_path: Some(PathBuf::from("/cache/snapshots.json")),
            ..GatekeeperConfig::default()
        };
        Gatekeeper::new(config, Arc::new(fs.clone()), Arc::new(Toolkit { available }))
            .with_resolver(StaticDependencies::new())
    }

    #[test]
    fn test_install_orders_hooks() {
        let fs = MemoryFileSystem::new();
        let mut chain = HookChain::new();

        let report = gatekeeper(&fs, true).install_into(&mut chain).unwrap();

        assert_eq!(chain.names(), vec!["extension_source", "declared_interface"]);
        assert_eq!(
            report.removed,
            vec!["toolkit_extension_source", "toolkit_plain_source"]
        );
        assert!(!report.already_installed);
        // 存储在安装时加载
        assert!(fs.exists(Path::new("/cache/snapshots.json")));
        assert!(chain.is_gatekeeper_installed());
    }

    #[test]
    fn test_install_is_idempotent() {
        let fs = MemoryFileSystem::new();
        let mut chain = HookChain::new();
        gatekeeper(&fs, true).install_into(&mut chain).unwrap();

        let report = gatekeeper(&fs, true).install_into(&mut chain).unwrap();

        assert!(report.already_installed);
        assert!(report.removed.is_empty());
        assert_eq!(chain.len(), 2);
    }

    #[test]
    fn test_install_keeps_foreign_hooks() {
        use crate::build::BuildLoader;
        use crate::hook::{HookMetadata, LoaderHook};
        use crate::module::SpecFinder;

        struct Foreign;

        impl LoaderHook for Foreign {
            fn metadata(&self) -> HookMetadata {
                HookMetadata::new("zip_importer", None, HookOrigin::Host)
            }

            fn find_module(
                &mut self,
                _: &str,
                _: &dyn SpecFinder,
            ) -> Result<Option<BuildLoader>, HookError> {
                Ok(None)
            }
        }

        let fs = MemoryFileSystem::new();
        let mut chain = HookChain::new();
        chain.push(Box::new(Foreign));

        gatekeeper(&fs, true).install_into(&mut chain).unwrap();

        assert_eq!(
            chain.names(),
            vec!["extension_source", "declared_interface", "zip_importer"]
        );
    }

    #[test]
    fn test_unavailable_toolkit_leaves_chain_untouched() {
        let fs = MemoryFileSystem::new();
        let mut chain = HookChain::new();

        let err = gatekeeper(&fs, false).install_into(&mut chain).unwrap_err();

        assert!(matches!(err, HookError::ToolkitUnavailable(ref name) if name == "fake"));
        assert!(chain.is_empty());
        assert!(!chain.is_gatekeeper_installed());
    }

    #[test]
    fn test_corrupt_store_fails_install() {
        let fs = MemoryFileSystem::new();
        fs.write_file(Path::new("/cache/snapshots.json"), b"{").unwrap();
        let mut chain = HookChain::new();

        let err = gatekeeper(&fs, true).install_into(&mut chain).unwrap_err();

        assert!(err.as_gate().is_some());
        assert!(chain.is_empty());
    }
}
