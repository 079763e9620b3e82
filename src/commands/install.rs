use anyhow::Context;
use log::{debug, info};
use std::path::{Path, PathBuf};

use super::config::Config;
use super::target::find_target_lib;
use crate::error::{Error, Result, is_not_found};
use crate::npm::NpmLocator;
use crate::patch::fs_tools::graft;
use crate::patch::revert::restore_backups;
use crate::patch::{Manifest, PatchState};
use crate::progress::Progress;
use crate::runtime::Runtime;

/// Install npm-two-stage into the npm at `npm_path`, or into the global npm.
///
/// Nothing is modified unless the target is the right npm version, carries
/// no remains of an earlier installation, and has every file to be
/// replaced, and the source payload is complete. Backing up the originals
/// is all-or-nothing. If copying in fails afterwards, the originals are put
/// back; files already copied in are left for `uninstall` to clear.
#[tracing::instrument(skip(config, progress))]
pub async fn install<R: Runtime, N: NpmLocator>(
    config: &Config<R, N>,
    npm_path: Option<&Path>,
    progress: &mut dyn Progress,
) -> Result<()> {
    let runtime = &config.runtime;
    let manifest = &config.manifest;
    let lib = find_target_lib(config, npm_path, progress).await?;

    let state = PatchState::probe(runtime, manifest, &lib);
    let leftovers = state.leftovers();
    if !leftovers.is_empty() {
        return Err(Error::Leftovers { items: leftovers });
    }
    if !state.standard.all() {
        return Err(Error::BadInstallation(format!(
            "npm installation at {} is missing files to be replaced: {}",
            lib.display(),
            state.standard.missing.join(", ")
        )));
    }
    expect_complete_source(runtime, manifest, &config.source_dir)?;

    let originals: Vec<String> = manifest
        .changed_files
        .iter()
        .map(|entry| manifest.file_name(entry))
        .collect();
    progress.emit(&format!(
        "Backing up files to be replaced: {}",
        originals.join(", ")
    ));
    back_up_originals(runtime, manifest, &lib, progress)?;

    let payload: Vec<String> = manifest
        .payload_files()
        .map(|entry| manifest.file_name(entry))
        .chain(manifest.added_dirs.iter().map(|entry| manifest.dir_name(entry)))
        .collect();
    progress.emit(&format!(
        "Copying into target directory: {}",
        payload.join(", ")
    ));
    if let Err(err) = copy_in(runtime, manifest, &config.source_dir, &lib) {
        return Err(recover_from_copy_failure(
            runtime, manifest, &lib, err, progress,
        ));
    }

    info!("Installed npm-two-stage into {:?}", lib);
    Ok(())
}

/// Every file and directory to be copied in must be present in the source
/// payload.
fn expect_complete_source<R: Runtime>(runtime: &R, manifest: &Manifest, src: &Path) -> Result<()> {
    let mut missing = Vec::new();
    for entry in manifest.payload_files() {
        let path = manifest.file_path(src, entry);
        if !runtime.exists(&path) || runtime.is_dir(&path) {
            missing.push(manifest.file_name(entry));
        }
    }
    for entry in &manifest.added_dirs {
        if !runtime.is_dir(&manifest.dir_path(src, entry)) {
            missing.push(manifest.dir_name(entry));
        }
    }

    if !missing.is_empty() {
        return Err(Error::BadProject(format!(
            "npm-two-stage source at {} is incomplete; missing: {}",
            src.display(),
            missing.join(", ")
        )));
    }
    Ok(())
}

/// Rename each changed file to its backup name. On failure, renames already
/// done are reversed before returning.
fn back_up_originals<R: Runtime>(
    runtime: &R,
    manifest: &Manifest,
    lib: &Path,
    progress: &mut dyn Progress,
) -> Result<()> {
    let mut renamed: Vec<(PathBuf, PathBuf)> = Vec::new();

    for entry in &manifest.changed_files {
        let original = manifest.file_path(lib, entry);
        let backup = manifest.backup_path(lib, entry);
        let Err(err) = runtime.rename(&original, &backup) else {
            renamed.push((original, backup));
            continue;
        };

        progress.emit("Error while renaming files; restoring original names...");
        let mut stuck = Vec::new();
        for (original, backup) in renamed.iter().rev() {
            if let Err(undo) = runtime.rename(backup, original) {
                debug!("Failed to undo backup of {:?}: {:#}", original, undo);
                progress.emit(&format!(
                    "Unable to restore {}: {}",
                    original.display(),
                    undo.root_cause()
                ));
                stuck.push(backup.display().to_string());
            }
        }

        if !stuck.is_empty() {
            return Err(Error::FsActionFail(format!(
                "{:#}. Backups could not be renamed back: {}. Run `npm2stage uninstall` to restore them",
                err,
                stuck.join(", ")
            )));
        }
        return Err(if is_not_found(&err) {
            Error::BadInstallation(format!("{:#}", err))
        } else {
            Error::fs_action(&err)
        });
    }
    Ok(())
}

/// Graft the added directories, then copy the payload files. Files that
/// live under an added directory arrive with the graft and are skipped.
fn copy_in<R: Runtime>(
    runtime: &R,
    manifest: &Manifest,
    src: &Path,
    lib: &Path,
) -> anyhow::Result<()> {
    for entry in &manifest.added_dirs {
        let target = manifest.dir_path(lib, entry);
        let parent = target.parent().unwrap_or(lib);
        graft(runtime, &manifest.dir_path(src, entry), parent)
            .with_context(|| format!("Failed to copy directory {}", manifest.dir_name(entry)))?;
    }
    for entry in manifest.payload_files() {
        if under_added_dir(manifest, entry) {
            debug!("{} already copied with its directory", manifest.file_name(entry));
            continue;
        }
        runtime.copy(&manifest.file_path(src, entry), &manifest.file_path(lib, entry))?;
    }
    Ok(())
}

fn under_added_dir(manifest: &Manifest, entry: &str) -> bool {
    manifest.added_dirs.iter().any(|dir| {
        entry
            .strip_prefix(dir.as_str())
            .is_some_and(|rest| rest.starts_with('/'))
    })
}

fn recover_from_copy_failure<R: Runtime>(
    runtime: &R,
    manifest: &Manifest,
    lib: &Path,
    err: anyhow::Error,
    progress: &mut dyn Progress,
) -> Error {
    debug!("Copying into {:?} failed: {:#}", lib, err);
    progress.emit("Error while copying files; restoring original files...");

    match restore_backups(runtime, manifest, lib, progress) {
        Ok(()) => Error::FsActionFail(format!(
            "{:#}. The original files were restored, but files already copied into {} remain, \
             so the installation is incomplete; run `npm2stage uninstall` before installing again",
            err,
            lib.display()
        )),
        Err(restore_err) => Error::FsActionFail(format!(
            "{:#}. Restoring the original files also failed ({}). The npm installation at {} \
             is left in an incomplete state; run `npm2stage uninstall` to finish removing \
             npm-two-stage",
            err,
            restore_err,
            lib.display()
        )),
    }
}
