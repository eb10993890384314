//! Loader hook trait definitions
//!
//! A loader hook is one entry of the hook chain. Given a dotted module name
//! it either declines, or returns a `BuildLoader` that produces the module.

use std::fmt;

use crate::build::BuildLoader;
use crate::error::HookError;
use crate::kind::SourceKind;
use crate::module::SpecFinder;

/// Who installed a hook
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookOrigin {
    /// The build toolkit's own, non-gatekeeping hook
    Toolkit,
    /// A gatekeeper hook
    Gatekeeper,
    /// Anything else in the host's chain
    Host,
}

impl fmt::Display for HookOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HookOrigin::Toolkit => write!(f, "toolkit"),
            HookOrigin::Gatekeeper => write!(f, "gatekeeper"),
            HookOrigin::Host => write!(f, "host"),
        }
    }
}

/// Metadata about a hook
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HookMetadata {
    /// The hook name (unique within a chain)
    pub name: &'static str,
    /// The kind of source this hook takes over, if any
    pub handles: Option<SourceKind>,
    /// Who installed it
    pub origin: HookOrigin,
}

impl HookMetadata {
    pub fn new(name: &'static str, handles: Option<SourceKind>, origin: HookOrigin) -> Self {
        Self {
            name,
            handles,
            origin,
        }
    }

    /// An unpatched toolkit hook for a source kind the gatekeeper overrides
    pub fn is_replaced_by_gatekeeper(&self) -> bool {
        self.origin == HookOrigin::Toolkit && self.handles.is_some()
    }
}

/// Per-hook counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HookStats {
    pub accepted: usize,
    pub declined: usize,
}

/// The base trait for all hooks in a chain
pub trait LoaderHook: Send + Sync {
    /// Get the hook metadata
    fn metadata(&self) -> HookMetadata;

    /// Claim `fullname` or decline it
    ///
    /// `Ok(None)` lets the chain try the next hook.
    fn find_module(
        &mut self,
        fullname: &str,
        finder: &dyn SpecFinder,
    ) -> Result<Option<BuildLoader>, HookError>;

    /// Counters since the hook was created
    ///
    /// Default implementation reports nothing
    fn stats(&self) -> HookStats {
        HookStats::default()
    }
}
