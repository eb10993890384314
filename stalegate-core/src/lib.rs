//! Stalegate core - staleness tracking for incremental native builds
//!
//! The external build step only compares the modification time of a
//! module's top-level source against its artifact. This crate closes the
//! gap: it snapshots every compile-time dependency of a source, and when a
//! dependency changed since the last recorded run it touches that
//! dependency so the build step's own scan sees it as new.
//!
//! # Architecture
//!
//! ```text
//! snapshot     - (mtime, size) value type and the freshness decision
//! store        - disk-persisted path -> snapshot map, written through
//! resolver     - DependencyResolver trait + static map resolver
//! scanner      - default resolver scanning cimport/include directives
//! touch        - mtime bump used to signal "changed"
//! tracker      - check_and_touch_dependencies
//! module_path  - build directory for a dotted module name
//! ```

pub mod error;
pub mod module_path;
pub mod resolver;
pub mod scanner;
pub mod snapshot;
pub mod store;
pub mod touch;
pub mod tracker;

pub use error::{GateError, ResolveError};
pub use module_path::resolve_build_dir;
pub use resolver::{DependencyResolver, StaticDependencies};
pub use scanner::{Directive, DirectiveScanner};
pub use snapshot::{FileSnapshot, Freshness};
pub use store::{default_store_path, SnapshotStore, CACHE_ENV, STORE_FILE_NAME};
pub use touch::touch;
pub use tracker::{CheckReport, StalenessTracker};
