use log::info;
use std::path::Path;

use super::config::Config;
use super::target::find_target_lib;
use crate::error::Result;
use crate::npm::NpmLocator;
use crate::patch::revert::{remove_added_items, restore_backups};
use crate::progress::Progress;
use crate::runtime::Runtime;

/// Remove npm-two-stage from the npm at `npm_path`, or from the global npm.
///
/// Works from a partial installation too: whatever is already gone is
/// reported and skipped. Fails if an added directory cannot be removed or
/// any backup cannot be restored.
#[tracing::instrument(skip(config, progress))]
pub async fn uninstall<R: Runtime, N: NpmLocator>(
    config: &Config<R, N>,
    npm_path: Option<&Path>,
    progress: &mut dyn Progress,
) -> Result<()> {
    let runtime = &config.runtime;
    let manifest = &config.manifest;
    let lib = find_target_lib(config, npm_path, progress).await?;

    progress.emit("Removing items added by npm-two-stage install...");
    remove_added_items(runtime, manifest, &lib, progress)?;

    progress.emit("Restoring backed-up original files...");
    restore_backups(runtime, manifest, &lib, progress)?;

    info!("Removed npm-two-stage from {:?}", lib);
    Ok(())
}
