//! Undoing a patch: removing what it added and putting the originals back.
//!
//! Used by uninstall, and by install when copying in fails.

use log::debug;
use std::path::Path;

use super::fs_tools::{prune, remove_files};
use super::manifest::Manifest;
use crate::error::{Error, Result, is_not_found};
use crate::progress::Progress;
use crate::runtime::Runtime;

/// Delete the added files and prune the added directories.
///
/// Anything already missing is reported and skipped; any other failure is
/// fatal.
#[tracing::instrument(skip(runtime, manifest, progress))]
pub fn remove_added_items<R: Runtime>(
    runtime: &R,
    manifest: &Manifest,
    lib: &Path,
    progress: &mut dyn Progress,
) -> Result<()> {
    let files: Vec<_> = manifest
        .added_files
        .iter()
        .map(|entry| manifest.file_path(lib, entry))
        .collect();
    if !files.is_empty() {
        remove_files(runtime, &files, progress).map_err(|e| Error::fs_action(&e))?;
    }

    for entry in &manifest.added_dirs {
        let dir = manifest.dir_path(lib, entry);
        match prune(runtime, &dir) {
            Ok(()) => debug!("Pruned {:?}", dir),
            Err(e) if is_not_found(&e) => {
                progress.emit(&format!(
                    "Could not find directory {} for removal",
                    dir.display()
                ));
            }
            Err(e) => {
                progress.emit(&format!("Unable to remove directory {}", dir.display()));
                return Err(Error::fs_action(&e));
            }
        }
    }
    Ok(())
}

/// Rename every backup back to its original name.
///
/// Every entry is attempted. Each failure is reported as it happens, and
/// the first one is returned once all have been tried.
#[tracing::instrument(skip(runtime, manifest, progress))]
pub fn restore_backups<R: Runtime>(
    runtime: &R,
    manifest: &Manifest,
    lib: &Path,
    progress: &mut dyn Progress,
) -> Result<()> {
    let mut first_failure = None;

    for entry in &manifest.changed_files {
        let backup = manifest.backup_path(lib, entry);
        let original = manifest.file_path(lib, entry);
        if let Err(e) = runtime.rename(&backup, &original) {
            debug!("Failed to restore {:?}: {:#}", original, e);
            progress.emit(&format!(
                "Unable to restore {}: {}",
                original.display(),
                e.root_cause()
            ));
            first_failure.get_or_insert_with(|| Error::fs_action(&e));
        }
    }

    match first_failure {
        Some(err) => Err(err),
        None => Ok(()),
    }
}
