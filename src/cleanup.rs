use log::{debug, warn};
use std::path::PathBuf;

use crate::error::is_not_found;
use crate::patch::fs_tools::prune;
use crate::runtime::Runtime;

/// Guard over a directory tree that is being built.
///
/// Unless [`CleanupGuard::success`] is called, dropping the guard prunes the
/// tree. The cleanup is best-effort: a failure to prune is logged and
/// swallowed, so the error that caused the unwinding is the one the caller
/// sees.
pub struct CleanupGuard<'a, R: Runtime> {
    runtime: &'a R,
    path: PathBuf,
    armed: bool,
}

impl<'a, R: Runtime> CleanupGuard<'a, R> {
    /// Create a guard for a tree the caller has just created.
    pub fn new(runtime: &'a R, path: PathBuf) -> Self {
        Self {
            runtime,
            path,
            armed: true,
        }
    }

    /// Mark the tree as complete; it will be kept.
    pub fn success(mut self) {
        self.armed = false;
    }
}

impl<R: Runtime> Drop for CleanupGuard<'_, R> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        debug!("Cleaning up partial tree {:?}", self.path);
        match prune(self.runtime, &self.path) {
            Ok(()) => {}
            Err(e) if is_not_found(&e) => {}
            Err(e) => warn!("Failed to clean up {:?}: {:#}", self.path, e),
        }
    }
}
