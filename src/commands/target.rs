//! Identifying the npm installation to operate on.

use log::debug;
use serde::Deserialize;
use std::path::{Path, PathBuf};

use super::config::Config;
use crate::error::{Error, Result, is_not_found};
use crate::npm::NpmLocator;
use crate::progress::Progress;
use crate::runtime::Runtime;

/// The fields of `package.json` we care about.
#[derive(Deserialize, Debug, Default)]
struct PackageDescriptor {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    version: Option<String>,
}

/// Verify that the npm at `npm_path`, or the global npm if no path is given,
/// is the version the manifest was written for.
///
/// Nothing is modified.
#[tracing::instrument(skip(config))]
pub async fn expect_correct_npm_version<R: Runtime, N: NpmLocator>(
    config: &Config<R, N>,
    npm_path: Option<&Path>,
) -> Result<()> {
    let found = match npm_path {
        Some(path) => declared_version(config, path)?,
        None => config
            .npm
            .version()
            .await
            .map_err(|e| Error::NoTarget(format!("no response from npm: {:#}", e)))?,
    };

    let expected = &config.manifest.expected_version;
    if found.trim() != expected {
        return Err(Error::WrongVersion {
            expected: expected.clone(),
            found: found.trim().to_string(),
        });
    }
    debug!("npm version {} confirmed", found);
    Ok(())
}

fn declared_version<R: Runtime, N: NpmLocator>(config: &Config<R, N>, path: &Path) -> Result<String> {
    let runtime = &config.runtime;
    let package_name = &config.manifest.package_name;
    let descriptor_path = path.join("package.json");

    let content = match runtime.read_to_string(&descriptor_path) {
        Ok(content) => content,
        Err(e) if is_not_found(&e) || !runtime.is_dir(path) => {
            debug!("No package descriptor: {:#}", e);
            return Err(Error::NoTarget(format!(
                "no package.json found at {}",
                path.display()
            )));
        }
        Err(e) => return Err(Error::BadInstallation(format!("{:#}", e))),
    };
    let content = content.strip_prefix('\u{feff}').unwrap_or(&content);

    let descriptor: PackageDescriptor = serde_json::from_str(content).map_err(|e| {
        Error::BadInstallation(format!(
            "failed to parse package.json at {}: {}",
            descriptor_path.display(),
            e
        ))
    })?;

    if descriptor.name.as_deref() != Some(package_name.as_str()) {
        return Err(Error::NoTarget(format!(
            "package at {} is not {}",
            path.display(),
            package_name
        )));
    }
    descriptor.version.ok_or_else(|| {
        Error::BadInstallation(format!(
            "package.json at {} declares no version",
            descriptor_path.display()
        ))
    })
}

/// The `lib` directory under an npm home, if it can be listed.
pub fn resolve_lib<R: Runtime>(runtime: &R, npm_home: &Path) -> Result<PathBuf> {
    let lib = npm_home.join("lib");
    if !runtime.is_dir(&lib) || runtime.read_dir(&lib).is_err() {
        return Err(Error::BadInstallation(
            "Unable to access lib directory at supposed npm path".to_string(),
        ));
    }
    Ok(lib)
}

/// Explain a failed version check to the user.
pub fn add_fault_message(err: &Error, progress: &mut dyn Progress) {
    match err {
        Error::WrongVersion { .. } => {
            progress.emit("Wrong version of npm for this version of npm-two-stage.")
        }
        Error::NoTarget(_) => progress.emit("npm not found at given location."),
        Error::BadInstallation(message) => progress.emit(message),
        _ => {}
    }
}

/// Steps shared by every command: check the version, announce the target,
/// and hand back its `lib` directory.
pub async fn find_target_lib<R: Runtime, N: NpmLocator>(
    config: &Config<R, N>,
    npm_path: Option<&Path>,
    progress: &mut dyn Progress,
) -> Result<PathBuf> {
    progress.emit(match npm_path {
        Some(_) => "Checking npm version at given path...",
        None => "Checking version of global npm...",
    });
    if let Err(err) = expect_correct_npm_version(config, npm_path).await {
        add_fault_message(&err, progress);
        return Err(err);
    }

    let home = match npm_path {
        Some(path) => path.to_path_buf(),
        None => config
            .npm
            .home()
            .await
            .map_err(|e| Error::NoTarget(format!("unable to locate global npm: {:#}", e)))?,
    };
    progress.emit(&format!("Target npm home is {}", home.display()));

    resolve_lib(&config.runtime, &home)
}
