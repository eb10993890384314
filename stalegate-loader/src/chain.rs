//! Hook chain
//!
//! An ordered list of loader hooks. An import walks the chain front to back
//! and the first hook that returns a loader wins; later hooks never see the
//! name.

use stalegate_config::Target;
use tracing::debug;

use crate::build::LoadedModule;
use crate::error::HookError;
use crate::hook::{HookMetadata, HookStats, LoaderHook};
use crate::module::SpecFinder;

const TARGET: &str = Target::Hooks.target();

/// Result of an import through the chain
#[derive(Debug)]
pub enum ImportOutcome {
    /// A hook claimed the module and the build step produced it
    Loaded {
        hook: &'static str,
        module: LoadedModule,
    },
    /// Every hook declined; the host's normal import applies
    Unhandled,
}

impl ImportOutcome {
    pub fn module(&self) -> Option<&LoadedModule> {
        match self {
            ImportOutcome::Loaded { module, .. } => Some(module),
            ImportOutcome::Unhandled => None,
        }
    }
}

/// Ordered hook chain
#[derive(Default)]
pub struct HookChain {
    hooks: Vec<Box<dyn LoaderHook>>,
    gatekeeper_installed: bool,
}

impl std::fmt::Debug for HookChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HookChain")
            .field("hooks", &self.names())
            .field("gatekeeper_installed", &self.gatekeeper_installed)
            .finish()
    }
}

impl HookChain {
    /// Create a new empty chain
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a hook at the end
    pub fn push(&mut self, hook: Box<dyn LoaderHook>) {
        self.hooks.push(hook);
    }

    /// Insert a hook at the front, ahead of everything else
    pub fn insert_front(&mut self, hook: Box<dyn LoaderHook>) {
        self.hooks.insert(0, hook);
    }

    /// Keep only hooks whose metadata satisfies `keep`
    ///
    /// Returns the metadata of the removed hooks, in chain order.
    pub fn retain(&mut self, mut keep: impl FnMut(&HookMetadata) -> bool) -> Vec<HookMetadata> {
        let mut removed = Vec::new();
        self.hooks.retain(|hook| {
            let meta = hook.metadata();
            if keep(&meta) {
                true
            } else {
                removed.push(meta);
                false
            }
        });
        removed
    }

    /// Hook names in chain order
    pub fn names(&self) -> Vec<&'static str> {
        self.hooks.iter().map(|h| h.metadata().name).collect()
    }

    /// Metadata of every hook, in chain order
    pub fn metadata(&self) -> impl Iterator<Item = HookMetadata> + '_ {
        self.hooks.iter().map(|h| h.metadata())
    }

    /// Counters of the hook called `name`
    pub fn stats(&self, name: &str) -> Option<HookStats> {
        self.hooks
            .iter()
            .find(|h| h.metadata().name == name)
            .map(|h| h.stats())
    }

    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }

    /// Whether a gatekeeper installation already ran on this chain
    pub fn is_gatekeeper_installed(&self) -> bool {
        self.gatekeeper_installed
    }

    pub(crate) fn mark_gatekeeper_installed(&mut self) {
        self.gatekeeper_installed = true;
    }

    /// Ask each hook in order; the first loader wins
    pub fn find_module(
        &mut self,
        fullname: &str,
        finder: &dyn SpecFinder,
    ) -> Result<Option<(&'static str, crate::build::BuildLoader)>, HookError> {
        for hook in self.hooks.iter_mut() {
            if let Some(loader) = hook.find_module(fullname, finder)? {
                let name = hook.metadata().name;
                debug!(target: TARGET, module = fullname, hook = name, "module claimed");
                return Ok(Some((name, loader)));
            }
        }
        Ok(None)
    }

    /// Find a loader for `fullname` and run it
    pub fn import(
        &mut self,
        fullname: &str,
        finder: &dyn SpecFinder,
    ) -> Result<ImportOutcome, HookError> {
        match self.find_module(fullname, finder)? {
            Some((hook, loader)) => Ok(ImportOutcome::Loaded {
                hook,
                module: loader.load()?,
            }),
            None => {
                debug!(target: TARGET, module = fullname, "no hook claimed module");
                Ok(ImportOutcome::Unhandled)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build::{BuildLoader, BuildRequest, BuildStep};
    use crate::error::BuildError;
    use crate::hook::HookOrigin;
    use crate::kind::SourceKind;
    use crate::module::ModuleSpec;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct Echo;

    impl BuildStep for Echo {
        fn find_loader(&self, spec: &ModuleSpec, _: SourceKind) -> Result<Option<PathBuf>, BuildError> {
            Ok(spec.origin.clone())
        }

        fn build_and_load(&self, request: &BuildRequest) -> Result<LoadedModule, BuildError> {
            Ok(LoadedModule {
                name: request.module.clone(),
                origin: request.source.clone(),
                artifact: request.build_dir.join("m.so"),
                rebuilt: false,
            })
        }
    }

    /// Claims names with a fixed prefix and counts every query
    struct Prefix {
        name: &'static str,
        prefix: &'static str,
        calls: Arc<AtomicUsize>,
    }

    impl LoaderHook for Prefix {
        fn metadata(&self) -> HookMetadata {
            HookMetadata::new(self.name, None, HookOrigin::Host)
        }

        fn find_module(
            &mut self,
            fullname: &str,
            _: &dyn SpecFinder,
        ) -> Result<Option<BuildLoader>, HookError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if !fullname.starts_with(self.prefix) {
                return Ok(None);
            }
            let request = BuildRequest {
                module: fullname.to_string(),
                source: PathBuf::from("/src/m.pyx"),
                kind: SourceKind::Extension,
                is_package: false,
                build_dir: PathBuf::from("/build"),
                scratch_dir: PathBuf::from("/tmp"),
                language_level: 3,
                annotate: false,
                inplace: false,
            };
            Ok(Some(BuildLoader::new(Arc::new(Echo), request)))
        }
    }

    fn prefix(name: &'static str, prefix: &'static str) -> (Box<dyn LoaderHook>, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let hook = Prefix {
            name,
            prefix,
            calls: calls.clone(),
        };
        (Box::new(hook), calls)
    }

    fn no_specs(_: &str) -> Option<ModuleSpec> {
        None
    }

    #[test]
    fn test_first_claim_wins() {
        let mut chain = HookChain::new();
        let (first, _) = prefix("first", "fast");
        let (second, second_calls) = prefix("second", "");
        chain.push(first);
        chain.push(second);

        let outcome = chain.import("fast.mod", &no_specs).unwrap();
        match outcome {
            ImportOutcome::Loaded { hook, module } => {
                assert_eq!(hook, "first");
                assert_eq!(module.name, "fast.mod");
            }
            ImportOutcome::Unhandled => panic!("expected a loaded module"),
        }
        assert_eq!(second_calls.load(Ordering::SeqCst), 0);

        let outcome = chain.import("other", &no_specs).unwrap();
        assert!(matches!(outcome, ImportOutcome::Loaded { hook: "second", .. }));
    }

    #[test]
    fn test_unhandled_when_all_decline() {
        let mut chain = HookChain::new();
        let (hook, calls) = prefix("only", "x");
        chain.push(hook);

        let outcome = chain.import("y", &no_specs).unwrap();
        assert!(matches!(outcome, ImportOutcome::Unhandled));
        assert!(outcome.module().is_none());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_insert_front_and_retain() {
        let mut chain = HookChain::new();
        chain.push(prefix("b", "").0);
        chain.push(prefix("c", "").0);
        chain.insert_front(prefix("a", "").0);
        assert_eq!(chain.names(), vec!["a", "b", "c"]);

        let removed = chain.retain(|meta| meta.name != "b");
        assert_eq!(removed.len(), 1);
        assert_eq!(removed[0].name, "b");
        assert_eq!(chain.names(), vec!["a", "c"]);
        assert_eq!(chain.len(), 2);
        assert!(chain.stats("a").is_some());
        assert!(chain.stats("b").is_none());
    }
}
