//! Build output cleanup.
//!
//! ## Operations
//!
//! - `clean` - Remove the top-level build directory
//! - `clean-libs` - Delegate `clean` to every module and the consumer, then remove `build/lib`
//! - `clean-exe` - Remove `build/bin`
//! - `clean-all` - `clean`, then delegate `clean` to every module and the consumer

use super::backend::{Backend, Invocation};
use crate::config::BuildConfig;
use crate::error::{ForgeError, Result};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Removes a directory tree. Returns whether anything was there.
pub fn remove_dir(path: &Path) -> Result<bool> {
    match fs::remove_dir_all(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(ForgeError::io(path, e)),
    }
}

/// Runs each directory's own clean target.
///
/// Every directory is visited even if an earlier one fails; failures are reported
/// together afterwards. Directories without a build procedure are skipped.
/// Returns the directories that were cleaned.
pub fn delegate_clean<B: Backend + ?Sized>(
    backend: &B,
    dirs: &[PathBuf],
    clean_target: &str,
    config: &BuildConfig,
) -> Result<Vec<PathBuf>> {
    let mut cleaned = Vec::new();
    let mut errors = Vec::new();

    for dir in dirs {
        if !dir.is_dir() || !backend.is_buildable(dir) {
            tracing::debug!("no build procedure in {}, skipping clean", dir.display());
            continue;
        }

        let invocation = Invocation::new(dir)
            .target(clean_target)
            .var("VERBOSE", config.verbose_flag());
        match backend.invoke(&invocation) {
            Ok(outcome) if outcome.success() => cleaned.push(dir.clone()),
            Ok(outcome) => errors.push(ForgeError::StepFailed {
                step: format!("clean in {}", dir.display()),
                code: outcome.code,
                output: outcome.combined_output(),
            }),
            Err(source) => errors.push(ForgeError::Spawn {
                dir: dir.clone(),
                source,
            }),
        }
    }

    ForgeError::from_many(errors)?;
    Ok(cleaned)
}
