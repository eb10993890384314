//! Error types for hooks and build steps

use stalegate_core::GateError;
use thiserror::Error;

/// Error raised while a hook handles an import
///
/// All variants bubble up to the original import call.
#[derive(Error, Debug)]
pub enum HookError {
    #[error(transparent)]
    Gate(#[from] GateError),

    #[error("failed to build module '{module}': {source}")]
    CompileFailure {
        module: String,
        #[source]
        source: BuildError,
    },

    #[error("build step could not resolve a loader for '{module}': {source}")]
    LoaderResolution {
        module: String,
        #[source]
        source: BuildError,
    },

    #[error("build toolkit '{0}' is unavailable")]
    ToolkitUnavailable(String),
}

/// Error type for the external build-and-load step
#[derive(Error, Debug)]
pub enum BuildError {
    #[error("compilation failed: {message}")]
    Compile { message: String },

    #[error("build toolkit unavailable: {0}")]
    Unavailable(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl HookError {
    /// The underlying gatekeeper error, if any
    pub fn as_gate(&self) -> Option<&GateError> {
        match self {
            HookError::Gate(e) => Some(e),
            _ => None,
        }
    }
}
