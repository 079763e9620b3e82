use log::debug;
use std::path::Path;

use super::config::Config;
use super::target::find_target_lib;
use crate::error::Result;
use crate::npm::NpmLocator;
use crate::patch::{InstallStatus, PatchState};
use crate::progress::Progress;
use crate::runtime::Runtime;

/// Report how much of npm-two-stage is present at the npm at `npm_path`, or
/// at the global npm. Read-only.
#[tracing::instrument(skip(config, progress))]
pub async fn status<R: Runtime, N: NpmLocator>(
    config: &Config<R, N>,
    npm_path: Option<&Path>,
    progress: &mut dyn Progress,
) -> Result<InstallStatus> {
    let lib = find_target_lib(config, npm_path, progress).await?;

    let state = PatchState::probe(&config.runtime, &config.manifest, &lib);
    state.report(progress);

    let status = state.classify();
    debug!("Status of {:?}: {}", lib, status);
    progress.emit(status.summary());
    Ok(status)
}
