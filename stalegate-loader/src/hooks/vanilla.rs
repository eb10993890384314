//! Toolkit default hooks
//!
//! What a build toolkit installs on its own: every file of its kind is
//! handed straight to the build step, no dependency tracking, one flat
//! build directory. The installer removes these before adding gatekeepers.

use std::sync::Arc;

use crate::build::{BuildLoader, BuildSettings, BuildStep};
use crate::error::HookError;
use crate::hook::{HookMetadata, HookOrigin, LoaderHook};
use crate::kind::{source_kind_of, SourceKind};
use crate::module::SpecFinder;

pub struct VanillaHook {
    kind: SourceKind,
    step: Arc<dyn BuildStep>,
    settings: BuildSettings,
}

impl VanillaHook {
    pub fn new(kind: SourceKind, step: Arc<dyn BuildStep>, settings: BuildSettings) -> Self {
        Self {
            kind,
            step,
            settings,
        }
    }
}

impl LoaderHook for VanillaHook {
    fn metadata(&self) -> HookMetadata {
        let name = match self.kind {
            SourceKind::Extension => "toolkit_extension_source",
            SourceKind::Plain => "toolkit_plain_source",
        };
        HookMetadata::new(name, Some(self.kind), HookOrigin::Toolkit)
    }

    fn find_module(
        &mut self,
        fullname: &str,
        finder: &dyn SpecFinder,
    ) -> Result<Option<BuildLoader>, HookError> {
        let Some(spec) = finder.find_spec(fullname) else {
            return Ok(None);
        };
        let Some(origin) = spec.origin.as_deref() else {
            return Ok(None);
        };
        if source_kind_of(origin, &self.settings.extensions) != Some(self.kind) {
            return Ok(None);
        }

        let source = self
            .step
            .find_loader(&spec, self.kind)
            .map_err(|source| HookError::LoaderResolution {
                module: fullname.to_string(),
                source,
            })?;
        Ok(source.map(|source| {
            let request =
                self.settings
                    .request(&spec, source, self.kind, self.settings.flat_build_dir());
            BuildLoader::new(self.step.clone(), request)
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build::{BuildRequest, LoadedModule};
    use crate::error::BuildError;
    use crate::module::ModuleSpec;
    use stalegate_config::{BuildConfig, FileExtensions};
    use std::path::PathBuf;

    struct Passthrough;

    impl BuildStep for Passthrough {
        fn find_loader(&self, spec: &ModuleSpec, _: SourceKind) -> Result<Option<PathBuf>, BuildError> {
            Ok(spec.origin.clone())
        }

        fn build_and_load(&self, _: &BuildRequest) -> Result<LoadedModule, BuildError> {
            Err(BuildError::Unavailable("passthrough".to_string()))
        }
    }

    fn settings() -> BuildSettings {
        let build = BuildConfig {
            build_root: Some(PathBuf::from("/tmp/sg")),
            ..BuildConfig::default()
        };
        BuildSettings::from_config(&build, &FileExtensions::default())
    }

    #[test]
    fn test_vanilla_plain_source_takes_any_plain_file() {
        let mut hook = VanillaHook::new(SourceKind::Plain, Arc::new(Passthrough), settings());
        let finder = |name: &str| Some(ModuleSpec::file(name, "/work/pkg/plain.py"));

        let loader = hook.find_module("pkg.plain", &finder).unwrap().unwrap();
        // 不按包位置修正构建目录
        assert_eq!(loader.request().build_dir, PathBuf::from("/tmp/sg/_stalebuild"));
    }

    #[test]
    fn test_vanilla_hook_filters_by_kind() {
        let mut hook = VanillaHook::new(SourceKind::Extension, Arc::new(Passthrough), settings());
        let plain = |name: &str| Some(ModuleSpec::file(name, "/work/a.py"));
        let extension = |name: &str| Some(ModuleSpec::file(name, "/work/a.pyx"));

        assert!(hook.find_module("a", &plain).unwrap().is_none());
        assert!(hook.find_module("a", &extension).unwrap().is_some());
        assert_eq!(hook.metadata().name, "toolkit_extension_source");
        assert!(hook.metadata().is_replaced_by_gatekeeper());
    }
}
