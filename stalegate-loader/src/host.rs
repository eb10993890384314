//! Process-wide hook chain
//!
//! The chain every import in the process goes through. Installation is
//! idempotent, so any number of callers may install.

use once_cell::sync::Lazy;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::chain::{HookChain, ImportOutcome};
use crate::error::HookError;
use crate::installer::{Gatekeeper, InstallReport};
use crate::module::SpecFinder;

static HOST_CHAIN: Lazy<Mutex<HookChain>> = Lazy::new(|| Mutex::new(HookChain::new()));

fn chain() -> MutexGuard<'static, HookChain> {
    HOST_CHAIN.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Install `gatekeeper` into the process-wide chain
pub fn install(gatekeeper: Gatekeeper) -> Result<InstallReport, HookError> {
    gatekeeper.install_into(&mut chain())
}

/// Import `fullname` through the process-wide chain
pub fn import(fullname: &str, finder: &dyn SpecFinder) -> Result<ImportOutcome, HookError> {
    chain().import(fullname, finder)
}

/// Inspect the process-wide chain
pub fn with_chain<R>(f: impl FnOnce(&HookChain) -> R) -> R {
    f(&chain())
}
