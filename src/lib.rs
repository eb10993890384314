//! Stalegate - incremental-build staleness gatekeeper
//!
//! An external build step decides whether to recompile a module by looking
//! only at the module's own source file. Stalegate sits in the module-loading
//! hook chain ahead of that step: before a module is built it snapshots every
//! compile-time dependency, and touches the ones that changed since the last
//! run so the build step notices them.
//!
//! # Architecture
//!
//! ```text
//! stalegate-config  - configuration data and log targets
//! stalegate-vfs     - file system abstraction (native + in-memory)
//! stalegate-core    - snapshot store, staleness tracker, resolvers
//! stalegate-loader  - loader hooks, hook chain, installer, command toolkit
//! stalegate-cli     - `stalegate` binary
//! ```
//!
//! # Quick Start
//!
//! ```ignore
//! use stalegate::{host, CommandSpec, CommandToolkit, Gatekeeper, GatekeeperConfig};
//! use std::sync::Arc;
//!
//! let vfs = Arc::new(stalegate::native_fs());
//! let config = GatekeeperConfig::default();
//! let toolkit = CommandToolkit::new(
//!     CommandSpec::new("cythonize", ["-i", "{source}"]),
//!     vfs.clone(),
//!     config.extensions.clone(),
//! );
//! host::install(Gatekeeper::new(config, vfs, Arc::new(toolkit)))?;
//! ```

pub use stalegate_config as config;
pub use stalegate_core as core;
pub use stalegate_loader as loader;
pub use stalegate_vfs as vfs;

pub use stalegate_config::{BuildConfig, FileExtensions, GatekeeperConfig, Target};
pub use stalegate_core::{
    default_store_path, resolve_build_dir, touch, CheckReport, DependencyResolver,
    DirectiveScanner, FileSnapshot, Freshness, GateError, ResolveError, SnapshotStore,
    StalenessTracker, StaticDependencies,
};
pub use stalegate_loader::{
    host, BuildError, BuildRequest, BuildStep, BuildToolkit, CommandSpec, CommandToolkit,
    CompileKind, Gatekeeper, HookChain, HookError, ImportOutcome, InstallReport, LoadedModule,
    ModuleSpec, PathFinder, SourceKind, SpecFinder,
};
pub use stalegate_vfs::{memory_fs, native_fs, MemoryFileSystem, NativeFileSystem, VirtualFileSystem};
