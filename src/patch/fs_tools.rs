//! Directory operations: remove a list of files, prune a directory tree,
//! graft a directory tree into another directory.
//!
//! Each operation reports through the caller's [`Progress`] sink and
//! returns `anyhow` errors whose chain keeps the underlying `io::Error`, so
//! callers can decide for themselves whether "not found" is tolerable.

use anyhow::{Context, Result};
use log::debug;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::cleanup::CleanupGuard;
use crate::error::is_not_found;
use crate::progress::Progress;
use crate::runtime::Runtime;

/// Malformed arguments to a directory operation. Raised before the
/// filesystem is touched.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("{0}")]
pub struct UsageError(pub &'static str);

/// Delete each listed file, in order.
///
/// A file that does not exist is reported and skipped. Any other failure
/// stops the run and is returned; files removed before it stay removed.
#[tracing::instrument(skip(runtime, paths, progress))]
pub fn remove_files<R: Runtime>(
    runtime: &R,
    paths: &[PathBuf],
    progress: &mut dyn Progress,
) -> Result<()> {
    if paths.is_empty() {
        return Err(UsageError("remove_files: no paths given").into());
    }
    if paths.iter().any(|p| p.as_os_str().is_empty()) {
        return Err(UsageError("remove_files: empty path in list").into());
    }

    for path in paths {
        match runtime.remove_file(path) {
            Ok(()) => debug!("Removed {:?}", path),
            Err(e) if is_not_found(&e) => {
                progress.emit(&format!(
                    "Could not find file {} for removal",
                    path.display()
                ));
            }
            Err(e) => return Err(e),
        }
    }
    Ok(())
}

/// Recursively delete a directory.
///
/// Unlike [`remove_files`], a missing directory is an error here; its chain
/// contains an `io::ErrorKind::NotFound`.
#[tracing::instrument(skip(runtime))]
pub fn prune<R: Runtime>(runtime: &R, path: &Path) -> Result<()> {
    if path.as_os_str().is_empty() {
        return Err(UsageError("prune: empty path").into());
    }
    runtime.remove_dir_all(path)
}

/// Copy the tree rooted at `src` into `dest_parent`, keeping its name.
///
/// Both arguments must be existing directories, and `dest_parent` must not
/// already hold an entry with the source's name. If the copy fails partway,
/// the partial tree is pruned before the error is returned.
///
/// Returns the path of the new tree.
#[tracing::instrument(skip(runtime))]
pub fn graft<R: Runtime>(runtime: &R, src: &Path, dest_parent: &Path) -> Result<PathBuf> {
    if src.as_os_str().is_empty() || dest_parent.as_os_str().is_empty() {
        return Err(UsageError("graft: source and destination are both required").into());
    }
    let name = src
        .file_name()
        .ok_or(UsageError("graft: source path has no final component"))?;

    expect_dir(runtime, src)?;
    expect_dir(runtime, dest_parent)?;

    let dest = dest_parent.join(name);
    if runtime.exists(&dest) {
        return Err(io::Error::new(
            io::ErrorKind::AlreadyExists,
            format!("{} already exists", dest.display()),
        ))
        .context("Refusing to graft over an existing entry");
    }

    runtime.create_dir(&dest)?;
    let guard = CleanupGuard::new(runtime, dest.clone());
    copy_tree(runtime, src, &dest)?;
    guard.success();

    debug!("Grafted {:?} into {:?}", src, dest_parent);
    Ok(dest)
}

fn expect_dir<R: Runtime>(runtime: &R, path: &Path) -> Result<()> {
    if !runtime.exists(path) {
        return Err(io::Error::from(io::ErrorKind::NotFound))
            .with_context(|| format!("No such directory {}", path.display()));
    }
    if !runtime.is_dir(path) {
        return Err(io::Error::from(io::ErrorKind::NotADirectory))
            .with_context(|| format!("Not a directory {}", path.display()));
    }
    Ok(())
}

fn copy_tree<R: Runtime>(runtime: &R, src: &Path, dest: &Path) -> Result<()> {
    for entry in runtime.read_dir(src)? {
        let Some(name) = entry.file_name() else {
            continue;
        };
        let target = dest.join(name);
        if runtime.is_dir(&entry) {
            runtime.create_dir(&target)?;
            copy_tree(runtime, &entry, &target)?;
        } else {
            runtime.copy(&entry, &target)?;
        }
    }
    Ok(())
}
