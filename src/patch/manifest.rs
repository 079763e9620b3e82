//! The patch manifest: which files in npm's `lib` directory are replaced,
//! which are added, and how originals are kept aside.
//!
//! WARNING: the file lists are specific to the npm version named in
//! `expected_version`.

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::runtime::Runtime;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    /// Name the target's package descriptor must declare.
    #[serde(default = "default_package_name")]
    pub package_name: String,
    pub expected_version: String,
    /// Entries (relative to `lib`, without extension) replaced by the patch.
    pub changed_files: Vec<String>,
    /// Entries (relative to `lib`, without extension) introduced by the patch.
    pub added_files: Vec<String>,
    /// Directories (relative to `lib`) introduced wholesale by the patch.
    pub added_dirs: Vec<String>,
    /// Marker inserted before the extension of a backed-up original.
    pub backup_suffix: String,
    #[serde(default = "default_extension")]
    pub extension: String,
}

fn default_package_name() -> String {
    "npm".to_string()
}

fn default_extension() -> String {
    "js".to_string()
}

impl Default for Manifest {
    fn default() -> Self {
        let list = |items: &[&str]| -> Vec<String> { items.iter().map(|s| s.to_string()).collect() };
        Manifest {
            package_name: default_package_name(),
            expected_version: "6.13.4".to_string(),
            changed_files: list(&[
                "fetch-package-metadata",
                "install",
                "config/cmd-list",
                "install/action/refresh-package-json",
            ]),
            added_files: list(&["download", "git-offline", "offliner", "prepare-raw-module"]),
            added_dirs: list(&["download"]),
            backup_suffix: "_ORIG".to_string(),
            extension: default_extension(),
        }
    }
}

impl Manifest {
    /// Load a manifest from a JSON file and validate it.
    #[tracing::instrument(skip(runtime))]
    pub fn load<R: Runtime>(runtime: &R, path: &Path) -> Result<Self> {
        let content = runtime.read_to_string(path)?;
        let manifest: Manifest = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse manifest {}", path.display()))?;
        manifest.validate()?;
        Ok(manifest)
    }

    pub fn validate(&self) -> Result<()> {
        if self.expected_version.trim().is_empty() {
            bail!("Manifest has an empty expectedVersion");
        }
        if self.backup_suffix.is_empty() || self.backup_suffix.contains('/') {
            bail!("Invalid backupSuffix: {:?}", self.backup_suffix);
        }
        if self.extension.is_empty() || self.extension.contains(['.', '/']) {
            bail!("Invalid extension: {:?}", self.extension);
        }
        if self.changed_files.is_empty() && self.added_files.is_empty() && self.added_dirs.is_empty()
        {
            bail!("Manifest names no files to change or add");
        }
        let entries = self
            .changed_files
            .iter()
            .chain(&self.added_files)
            .chain(&self.added_dirs);
        for entry in entries {
            let valid = !entry.is_empty()
                && entry
                    .split('/')
                    .all(|part| !part.is_empty() && part != "." && part != ".." && !part.contains('\\'));
            if !valid {
                bail!("Invalid manifest entry: {:?}", entry);
            }
        }
        Ok(())
    }

    /// `config/cmd-list` -> `config/cmd-list.js`
    pub fn file_name(&self, entry: &str) -> String {
        format!("{}.{}", entry, self.extension)
    }

    /// `config/cmd-list` -> `config/cmd-list_ORIG.js`
    pub fn backup_name(&self, entry: &str) -> String {
        format!("{}{}.{}", entry, self.backup_suffix, self.extension)
    }

    /// `download` -> `download/`
    pub fn dir_name(&self, entry: &str) -> String {
        format!("{}/", entry)
    }

    pub fn file_path(&self, root: &Path, entry: &str) -> PathBuf {
        join_entry(root, &self.file_name(entry))
    }

    pub fn backup_path(&self, root: &Path, entry: &str) -> PathBuf {
        join_entry(root, &self.backup_name(entry))
    }

    pub fn dir_path(&self, root: &Path, entry: &str) -> PathBuf {
        join_entry(root, entry)
    }

    /// Changed files followed by added files: everything copied in as a file.
    pub fn payload_files(&self) -> impl Iterator<Item = &String> {
        self.changed_files.iter().chain(&self.added_files)
    }
}

/// Join a `/`-separated manifest entry onto a filesystem path.
fn join_entry(root: &Path, entry: &str) -> PathBuf {
    entry.split('/').fold(root.to_path_buf(), |path, part| path.join(part))
}
