//! External command build toolkit
//!
//! Runs a user-supplied compiler command for each module. Argument
//! templates may use these placeholders:
//!
//! | placeholder        | value                                  |
//! |--------------------|----------------------------------------|
//! | `{source}`         | top-level source file                  |
//! | `{build_dir}`      | directory the artifact must land in    |
//! | `{scratch_dir}`    | directory for intermediate files       |
//! | `{module}`         | dotted module name                     |
//! | `{artifact}`       | expected artifact path                 |
//! | `{language_level}` | source language level                  |
//! | `{annotate}`       | `true` / `false`                       |
//!
//! Whether the artifact is out of date is the command's own business.

use stalegate_config::{FileExtensions, Target};
use stalegate_vfs::VirtualFileSystem;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::build::{BuildRequest, BuildStep, BuildToolkit, LoadedModule};
use crate::error::BuildError;
use crate::kind::{source_kind_of, SourceKind};
use crate::module::ModuleSpec;

const TARGET: &str = Target::Hooks.target();

/// Default artifact extension
pub const DEFAULT_ARTIFACT_EXTENSION: &str = "so";

/// The compiler command and how to find its output
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: PathBuf,
    pub args: Vec<String>,
    /// Extension of the produced artifact
    pub artifact_extension: String,
}

impl CommandSpec {
    pub fn new(program: impl Into<PathBuf>, args: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
            artifact_extension: DEFAULT_ARTIFACT_EXTENSION.to_string(),
        }
    }
}

/// Build step running a `CommandSpec`
pub struct CommandStep {
    command: CommandSpec,
    vfs: Arc<dyn VirtualFileSystem>,
    extensions: FileExtensions,
}

impl CommandStep {
    /// Expected artifact for `request`
    pub fn artifact_path(&self, request: &BuildRequest) -> PathBuf {
        request.build_dir.join(format!(
            "{}.{}",
            request.module, self.command.artifact_extension
        ))
    }

    fn expand(&self, template: &str, request: &BuildRequest, artifact: &Path) -> String {
        template
            .replace("{source}", &request.source.to_string_lossy())
            .replace("{build_dir}", &request.build_dir.to_string_lossy())
            .replace("{scratch_dir}", &request.scratch_dir.to_string_lossy())
            .replace("{module}", &request.module)
            .replace("{artifact}", &artifact.to_string_lossy())
            .replace("{language_level}", &request.language_level.to_string())
            .replace("{annotate}", if request.annotate { "true" } else { "false" })
    }

    fn artifact_mtime(&self, artifact: &Path) -> Option<i64> {
        self.vfs.metadata(artifact).ok().map(|stat| stat.mtime_ns)
    }
}

impl BuildStep for CommandStep {
    fn find_loader(&self, spec: &ModuleSpec, kind: SourceKind) -> Result<Option<PathBuf>, BuildError> {
        let Some(origin) = spec.origin.as_ref() else {
            return Ok(None);
        };
        if source_kind_of(origin, &self.extensions) != Some(kind) || !self.vfs.is_file(origin) {
            return Ok(None);
        }
        Ok(Some(origin.clone()))
    }

    fn build_and_load(&self, request: &BuildRequest) -> Result<LoadedModule, BuildError> {
        let artifact = self.artifact_path(request);
        for dir in [&request.build_dir, &request.scratch_dir] {
            self.vfs
                .create_dir_all(dir)
                .map_err(|e| BuildError::Io(std::io::Error::other(e.to_string())))?;
        }

        let before = self.artifact_mtime(&artifact);
        let args: Vec<String> = self
            .command
            .args
            .iter()
            .map(|arg| self.expand(arg, request, &artifact))
            .collect();
        debug!(
            target: TARGET,
            module = %request.module,
            program = %self.command.program.display(),
            ?args,
            "running build command"
        );

        let output = Command::new(&self.command.program)
            .args(&args)
            .current_dir(
                request
                    .source
                    .parent()
                    .filter(|p| !p.as_os_str().is_empty())
                    .unwrap_or(Path::new(".")),
            )
            .output()?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            let message = if stderr.is_empty() {
                format!("build command exited with {}", output.status)
            } else {
                stderr
            };
            warn!(target: TARGET, module = %request.module, "build command failed");
            return Err(BuildError::Compile { message });
        }

        let after = self.artifact_mtime(&artifact);
        if after.is_none() {
            return Err(BuildError::Compile {
                message: format!("build command did not produce '{}'", artifact.display()),
            });
        }

        Ok(LoadedModule {
            name: request.module.clone(),
            origin: request.source.clone(),
            artifact,
            rebuilt: before != after,
        })
    }
}

/// Toolkit around an external compiler command
pub struct CommandToolkit {
    step: Arc<CommandStep>,
}

impl CommandToolkit {
    pub fn new(command: CommandSpec, vfs: Arc<dyn VirtualFileSystem>, extensions: FileExtensions) -> Self {
        Self {
            step: Arc::new(CommandStep {
                command,
                vfs,
                extensions,
            }),
        }
    }

    pub fn command(&self) -> &CommandSpec {
        &self.step.command
    }
}

impl BuildToolkit for CommandToolkit {
    fn name(&self) -> &str {
        self.step
            .command
            .program
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("command")
    }

    fn is_available(&self) -> bool {
        find_program(&self.step.command.program).is_some()
    }

    fn build_step(&self) -> Arc<dyn BuildStep> {
        self.step.clone()
    }
}

/// Locate `program` the way a shell would
///
/// A program with a directory component is checked as-is; a bare name is
/// searched on `PATH`.
pub fn find_program(program: &Path) -> Option<PathBuf> {
    if program.components().count() > 1 {
        return program.is_file().then(|| program.to_path_buf());
    }
    let path = std::env::var_os("PATH")?;
    std::env::split_paths(&path)
        .map(|dir| dir.join(program))
        .find(|candidate| candidate.is_file())
}
