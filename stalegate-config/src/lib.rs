//! Stalegate Config - Pure configuration data structures
//!
//! This crate contains only data structures, no logic or global state.
//! It serves as the shared configuration vocabulary across all Stalegate crates.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top-level configuration for one gatekeeper installation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GatekeeperConfig {
    /// Explicit location of the snapshot blob (None = well-known location)
    pub store_path: Option<PathBuf>,
    /// Options forwarded to the external build step
    pub build: BuildConfig,
    /// File extensions that decide which hook handles a module
    pub extensions: FileExtensions,
    /// Extra directories searched for `cimport`/`include` targets
    pub include_dirs: Vec<PathBuf>,
}

/// Options forwarded to the build-and-load step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    /// Root directory for build outputs when the module path cannot supply one
    pub build_root: Option<PathBuf>,
    /// Directory name appended to the resolved module build directory
    pub build_subdir: String,
    /// Scratch directory handed to the build step (None = short path under the build root)
    pub scratch_dir: Option<PathBuf>,
    /// Source language level passed to the compiler
    pub language_level: u8,
    /// Whether the compiler should emit annotated listings
    pub annotate: bool,
    /// Whether artifacts are placed next to the sources
    pub inplace: bool,
}

/// File extensions (without the leading dot) recognised by the hooks
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileExtensions {
    /// Plain source modules, compiled only when an interface file sits beside them
    pub source: String,
    /// Companion interface/declaration files
    pub interface: String,
    /// Sources written specifically to be compiled into native modules
    pub extension_source: String,
    /// File stem of a package initializer, never compiled
    pub package_initializer: String,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            build_root: None,
            build_subdir: "_stalebuild".to_string(),
            scratch_dir: None,
            language_level: 3,
            annotate: true,
            inplace: false,
        }
    }
}

impl Default for FileExtensions {
    fn default() -> Self {
        Self {
            source: "py".to_string(),
            interface: "pxd".to_string(),
            extension_source: "pyx".to_string(),
            package_initializer: "__init__".to_string(),
        }
    }
}

impl FileExtensions {
    /// Path of the interface file that would accompany `source`
    pub fn companion_interface(&self, source: &Path) -> PathBuf {
        source.with_extension(&self.interface)
    }
}

impl GatekeeperConfig {
    /// Parse a configuration from JSON text
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}

/// Log target enum, one per gatekeeper component
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Target {
    Store,
    Tracker,
    Hooks,
    Installer,
    Cli,
}

impl Target {
    /// All component targets, in pipeline order
    pub const ALL: [Target; 5] = [
        Target::Store,
        Target::Tracker,
        Target::Hooks,
        Target::Installer,
        Target::Cli,
    ];

    /// Get the string name of the target
    pub const fn as_str(&self) -> &'static str {
        match self {
            Target::Store => "store",
            Target::Tracker => "tracker",
            Target::Hooks => "hooks",
            Target::Installer => "installer",
            Target::Cli => "cli",
        }
    }

    /// Get the log target name for this component
    pub const fn target(&self) -> &'static str {
        match self {
            Target::Store => "stalegate::store",
            Target::Tracker => "stalegate::tracker",
            Target::Hooks => "stalegate::hooks",
            Target::Installer => "stalegate::installer",
            Target::Cli => "stalegate::cli",
        }
    }
}
