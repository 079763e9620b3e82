use log::debug;
use std::path::PathBuf;

use crate::error::{Error, Result};
use crate::npm::{NpmCli, NpmLocator};
use crate::patch::Manifest;
use crate::runtime::Runtime;

/// Everything a command needs: the filesystem, a way to ask the global npm
/// about itself, what to patch, and where the replacement files come from.
pub struct Config<R: Runtime, N: NpmLocator> {
    pub runtime: R,
    pub npm: N,
    pub manifest: Manifest,
    /// Directory holding the files copied in by `install`, laid out like
    /// npm's `lib`.
    pub source_dir: PathBuf,
}

impl<R: Runtime> Config<R, NpmCli> {
    pub fn new(
        runtime: R,
        source_dir: Option<PathBuf>,
        manifest_path: Option<PathBuf>,
    ) -> Result<Self> {
        let manifest = match manifest_path {
            Some(path) => {
                debug!("Loading manifest from {:?}", path);
                Manifest::load(&runtime, &path).map_err(|e| Error::BadProject(format!("{:#}", e)))?
            }
            None => Manifest::default(),
        };

        let source_dir = match source_dir {
            Some(dir) => dir,
            None => default_source_dir()?,
        };
        debug!("Using source payload at {:?}", source_dir);

        Ok(Self {
            runtime,
            npm: NpmCli::new(),
            manifest,
            source_dir,
        })
    }
}

/// `src/` beside the running executable.
fn default_source_dir() -> Result<PathBuf> {
    let exe = std::env::current_exe().map_err(|e| {
        Error::BadProject(format!("Unable to locate the npm2stage executable: {}", e))
    })?;
    Ok(exe
        .parent()
        .map(|dir| dir.join("src"))
        .unwrap_or_else(|| PathBuf::from("src")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ExitClass;
    use crate::runtime::{MockRuntime, RealRuntime};
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_defaults() {
        let config = Config::new(RealRuntime, Some(PathBuf::from("/payload")), None).unwrap();
        assert_eq!(config.manifest, Manifest::default());
        assert_eq!(config.source_dir, PathBuf::from("/payload"));
    }

    #[test]
    fn test_default_source_dir_is_beside_executable() {
        let config = Config::new(RealRuntime, None, None).unwrap();
        let exe_dir = std::env::current_exe().unwrap().parent().unwrap().to_path_buf();
        assert_eq!(config.source_dir, exe_dir.join("src"));
    }

    #[test]
    fn test_manifest_from_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("manifest.json");
        fs::write(
            &path,
            r#"{
                "expectedVersion": "6.14.4",
                "changedFiles": ["install"],
                "addedFiles": ["download"],
                "addedDirs": ["download"],
                "backupSuffix": "_ORIG"
            }"#,
        )
        .unwrap();

        let config = Config::new(RealRuntime, Some(dir.path().into()), Some(path)).unwrap();
        assert_eq!(config.manifest.expected_version, "6.14.4");
        assert_eq!(config.manifest.changed_files, vec!["install"]);
    }

    #[test]
    fn test_invalid_manifest_is_bad_project() {
        let mut runtime = MockRuntime::new();
        runtime.expect_read_to_string().returning(|_| {
            Ok(r#"{
                "expectedVersion": "6.13.4",
                "changedFiles": ["../../etc/passwd"],
                "addedFiles": [],
                "addedDirs": [],
                "backupSuffix": "_ORIG"
            }"#
            .to_string())
        });

        let err = Config::new(runtime, None, Some(PathBuf::from("manifest.json")))
            .err()
            .unwrap();
        assert_eq!(err.exit_class(), Some(ExitClass::BadProject));
        assert!(err.to_string().contains("Invalid manifest entry"));
    }
}
