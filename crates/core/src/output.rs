//! All-or-nothing writing of the generated module set.
//!
//! Modules are staged in a temporary directory inside the output directory and renamed into
//! place. Files of a previous run are moved aside first, so a failed run restores them and a
//! successful one leaves exactly the new module set.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::emit::{GeneratedModule, ModuleKind};
use crate::error::{GenError, Result};

const STAGING_PREFIX: &str = ".apiconnect-";

fn write_error(path: &Path, err: &io::Error) -> GenError {
    GenError::OutputWrite {
        path: path.display().to_string(),
        message: err.to_string(),
    }
}

/// Write `modules` into `output_dir`, returning the written paths.
pub fn write_modules(output_dir: &Path, modules: &[GeneratedModule]) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(output_dir).map_err(|e| write_error(output_dir, &e))?;

    let staging = tempfile::Builder::new()
        .prefix(STAGING_PREFIX)
        .tempdir_in(output_dir)
        .map_err(|e| write_error(output_dir, &e))?;
    for module in modules {
        let staged = staging.path().join(module.file_name());
        fs::write(&staged, &module.contents).map_err(|e| write_error(&staged, &e))?;
    }

    let backup_dir = staging.path().join("previous");
    fs::create_dir(&backup_dir).map_err(|e| write_error(&backup_dir, &e))?;

    let mut commit = Commit::default();
    if let Err(err) = commit.apply(output_dir, staging.path(), &backup_dir, modules) {
        commit.rollback();
        return Err(err);
    }

    debug!(
        output = %output_dir.display(),
        files = commit.installed.len(),
        "Wrote generated modules."
    );
    // Dropping `staging` discards the previous run's files.
    Ok(commit.installed)
}

/// Renames performed so far, for rollback.
#[derive(Debug, Default)]
struct Commit {
    /// (original location, backup location)
    moved_aside: Vec<(PathBuf, PathBuf)>,
    installed: Vec<PathBuf>,
}

impl Commit {
    fn apply(
        &mut self,
        output_dir: &Path,
        staging: &Path,
        backup_dir: &Path,
        modules: &[GeneratedModule],
    ) -> Result<()> {
        for kind in ModuleKind::ALL {
            let target = output_dir.join(kind.file_name());
            if target.exists() {
                let backup = backup_dir.join(kind.file_name());
                fs::rename(&target, &backup).map_err(|e| write_error(&target, &e))?;
                self.moved_aside.push((target, backup));
            }
        }

        for module in modules {
            let target = output_dir.join(module.file_name());
            fs::rename(staging.join(module.file_name()), &target)
                .map_err(|e| write_error(&target, &e))?;
            self.installed.push(target);
        }
        Ok(())
    }

    fn rollback(&mut self) {
        for path in self.installed.drain(..) {
            if let Err(err) = fs::remove_file(&path) {
                warn!(path = %path.display(), error = %err, "Failed to remove partially written module.");
            }
        }
        for (original, backup) in self.moved_aside.drain(..) {
            if let Err(err) = fs::rename(&backup, &original) {
                warn!(path = %original.display(), error = %err, "Failed to restore previous module.");
            }
        }
    }
}
