//! Subcommand implementations
//!
//! Each command writes its report to `out`; logging goes elsewhere.

use stalegate_config::Target;
use stalegate_core::{
    default_store_path, DirectiveScanner, FileSnapshot, Freshness, GateError, SnapshotStore,
    StalenessTracker,
};
use stalegate_loader::{host, CommandToolkit, Gatekeeper, ImportOutcome, PathFinder};
use stalegate_vfs::{NativeFileSystem, VirtualFileSystem};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

use crate::config::CliConfig;
use crate::error::CliError;

const TARGET: &str = Target::Cli.target();

/// Shared state of one CLI invocation
pub struct Session {
    pub config: CliConfig,
    vfs: Arc<dyn VirtualFileSystem>,
}

impl Session {
    pub fn new(mut config: CliConfig, store_override: Option<PathBuf>) -> Self {
        if store_override.is_some() {
            config.gatekeeper.store_path = store_override;
        }
        Self {
            config,
            vfs: Arc::new(NativeFileSystem::new()),
        }
    }

    pub fn store_path(&self) -> PathBuf {
        self.config
            .gatekeeper
            .store_path
            .clone()
            .unwrap_or_else(default_store_path)
    }

    fn scanner(&self) -> DirectiveScanner {
        DirectiveScanner::new(self.vfs.clone(), self.config.gatekeeper.extensions.clone())
            .with_include_dirs(self.config.gatekeeper.include_dirs.clone())
    }

    fn load_store(&self) -> Result<SnapshotStore, CliError> {
        Ok(SnapshotStore::load(self.vfs.clone(), self.store_path())?)
    }
}

/// Store keys are absolute paths
fn absolute(path: &Path) -> Result<PathBuf, CliError> {
    std::fs::canonicalize(path).map_err(|source| CliError::Path {
        path: path.to_path_buf(),
        source,
    })
}

/// `stalegate check`: run the tracker against each source
pub fn check(session: &Session, sources: &[PathBuf], out: &mut dyn Write) -> Result<(), CliError> {
    let mut tracker = StalenessTracker::new(
        session.vfs.clone(),
        Box::new(session.scanner()),
        session.store_path(),
    );

    for source in sources {
        let source = absolute(source)?;
        let report = tracker.check_and_touch_dependencies(&source)?;
        for path in &report.touched {
            writeln!(out, "touched {}", path.display())?;
        }
        writeln!(
            out,
            "{}: {} touched, {} unchanged",
            source.display(),
            report.touched.len(),
            report.unchanged
        )?;
    }
    Ok(())
}

/// `stalegate status`: compare every recorded snapshot with the file system
pub fn status(session: &Session, out: &mut dyn Write) -> Result<(), CliError> {
    let store = session.load_store()?;
    writeln!(out, "store: {} ({} entries)", store.path().display(), store.len())?;

    for (path, recorded) in store.iter() {
        let state = match FileSnapshot::of(session.vfs.as_ref(), Path::new(path)) {
            Ok(current) => match Freshness::assess(Some(*recorded), current) {
                Freshness::Unchanged => "ok",
                _ => "changed",
            },
            Err(GateError::MissingDependency { .. }) => "missing",
            Err(e) => return Err(e.into()),
        };
        writeln!(out, "{state:<8}{path}")?;
    }
    Ok(())
}

/// `stalegate forget`: drop recorded snapshots
///
/// Forgotten paths count as first seen on their next check.
pub fn forget(session: &Session, paths: &[PathBuf], out: &mut dyn Write) -> Result<(), CliError> {
    let mut store = session.load_store()?;
    for path in paths {
        // 文件可能已被删除，无法规范化时按原样查找
        let key = absolute(path).unwrap_or_else(|_| path.clone());
        match store.remove(&key)? {
            Some(_) => writeln!(out, "forgot {}", key.display())?,
            None => writeln!(out, "not tracked {}", key.display())?,
        }
    }
    Ok(())
}

/// `stalegate import`: install the gatekeeper and import modules through it
pub fn import(session: &Session, modules: &[String], out: &mut dyn Write) -> Result<(), CliError> {
    let command = session.config.command.as_ref().ok_or(CliError::NoCommand)?;
    let extensions = session.config.gatekeeper.extensions.clone();
    let toolkit = CommandToolkit::new(command.to_spec(), session.vfs.clone(), extensions.clone());

    let mut gatekeeper_config = session.config.gatekeeper.clone();
    gatekeeper_config.store_path = Some(session.store_path());
    let report = host::install(Gatekeeper::new(
        gatekeeper_config,
        session.vfs.clone(),
        Arc::new(toolkit),
    ))?;
    info!(target: TARGET, store = %report.store_path.display(), "gatekeeper ready");

    let finder = PathFinder::new(session.vfs.clone(), session.config.roots.clone(), extensions);
    for module in modules {
        match host::import(module, &finder)? {
            ImportOutcome::Loaded { hook, module: loaded } if loaded.rebuilt => {
                writeln!(out, "{module}: built {} ({hook})", loaded.artifact.display())?
            }
            ImportOutcome::Loaded { hook, module: loaded } => {
                writeln!(out, "{module}: up to date {} ({hook})", loaded.artifact.display())?
            }
            ImportOutcome::Unhandled => writeln!(out, "{module}: not handled")?,
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CommandConfig;

    struct Project {
        dir: tempfile::TempDir,
        session: Session,
    }

    fn project() -> Project {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("fast.pyx"), "cimport shared\n").unwrap();
        std::fs::write(dir.path().join("shared.pxd"), "cdef int x\n").unwrap();

        let mut config = CliConfig::default();
        config.roots = vec![dir.path().to_path_buf()];
        let store = dir.path().join("cache").join("snapshots.json");
        let session = Session::new(config, Some(store));
        Project { dir, session }
    }

    fn run(f: impl FnOnce(&mut Vec<u8>) -> Result<(), CliError>) -> String {
        let mut out = Vec::new();
        f(&mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_check_then_clean() {
        let p = project();
        let source = p.dir.path().join("fast.pyx");

        let first = run(|out| check(&p.session, &[source.clone()], out));
        assert!(first.contains("2 touched, 0 unchanged"), "{first}");

        let second = run(|out| check(&p.session, &[source.clone()], out));
        assert!(second.contains("0 touched, 2 unchanged"), "{second}");
        assert!(!second.contains("touched /"));
    }

    #[test]
    fn test_status_reports_changes_and_missing() {
        let p = project();
        let source = p.dir.path().join("fast.pyx");
        run(|out| check(&p.session, &[source.clone()], out));

        std::fs::write(p.dir.path().join("shared.pxd"), "cdef int x, y\n").unwrap();
        std::fs::remove_file(&source).unwrap();

        let text = run(|out| status(&p.session, out));
        assert!(text.contains("(2 entries)"));
        assert!(text.lines().any(|l| l.starts_with("changed") && l.ends_with("shared.pxd")));
        assert!(text.lines().any(|l| l.starts_with("missing") && l.ends_with("fast.pyx")));
    }

    #[test]
    fn test_forget() {
        let p = project();
        let source = p.dir.path().join("fast.pyx");
        run(|out| check(&p.session, &[source.clone()], out));

        let text = run(|out| forget(&p.session, &[p.dir.path().join("shared.pxd")], out));
        assert!(text.starts_with("forgot "));
        let text = run(|out| forget(&p.session, &[p.dir.path().join("shared.pxd")], out));
        assert!(text.starts_with("not tracked "));

        // 被遗忘的文件下一次按首次出现处理
        let text = run(|out| check(&p.session, &[source.clone()], out));
        assert!(text.contains("1 touched, 1 unchanged"), "{text}");
    }

    #[test]
    fn test_check_missing_source() {
        let p = project();
        let mut out = Vec::new();
        let err = check(&p.session, &[p.dir.path().join("nope.pyx")], &mut out).unwrap_err();
        assert!(matches!(err, CliError::Path { .. }));
    }

    #[test]
    fn test_import_requires_command() {
        let p = project();
        let mut out = Vec::new();
        let err = import(&p.session, &["fast".to_string()], &mut out).unwrap_err();
        assert!(matches!(err, CliError::NoCommand));
    }

    #[cfg(unix)]
    #[test]
    fn test_import_builds_through_command() {
        let mut p = project();
        p.session.config.command = Some(CommandConfig {
            program: PathBuf::from("sh"),
            args: vec!["-c".to_string(), "cp {source} {artifact}".to_string()],
            artifact_extension: None,
        });

        let text = run(|out| import(&p.session, &["fast".to_string(), "nothing".to_string()], out));

        assert!(text.contains("fast: built "), "{text}");
        assert!(text.contains("(extension_source)"));
        assert!(text.contains("nothing: not handled"));
        assert!(p.dir.path().join("_stalebuild").join("fast.so").is_file());
    }
}
