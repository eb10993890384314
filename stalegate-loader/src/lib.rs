//! Stalegate Loader
//!
//! Module-loading hooks that put the staleness tracker in front of an
//! external build step, and the installer that wires them into a hook chain.
//!
//! # Architecture
//!
//! ```text
//! import "pkg.fast"
//!   -> HookChain (first claim wins)
//!        extension_source     GatekeeperHook, consulted first
//!        declared_interface   GatekeeperHook
//!        ...host hooks
//!   -> BuildLoader -> BuildStep::build_and_load
//! ```

pub mod build;
pub mod chain;
pub mod error;
pub mod hook;
pub mod hooks;
pub mod host;
pub mod installer;
pub mod kind;
pub mod module;
pub mod toolkit;

pub use build::{BuildLoader, BuildRequest, BuildSettings, BuildStep, BuildToolkit, LoadedModule};
pub use chain::{HookChain, ImportOutcome};
pub use error::{BuildError, HookError};
pub use hook::{HookMetadata, HookOrigin, HookStats, LoaderHook};
pub use hooks::{GatekeeperHook, SharedTracker, VanillaHook};
pub use installer::{Gatekeeper, InstallReport};
pub use kind::{classify, classify_path, CompileKind, SourceKind};
pub use module::{ModuleSpec, PathFinder, SpecFinder};
pub use toolkit::{find_program, CommandSpec, CommandStep, CommandToolkit};
