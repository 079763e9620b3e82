//! Presence probe of the patch's three entry classes in npm's `lib`
//! directory, and the status classification derived from it.
//!
//! The probe is recomputed on every call; nothing is cached.

use std::fmt;
use std::path::Path;

use super::manifest::Manifest;
use crate::progress::Progress;
use crate::runtime::Runtime;

/// Which entries of one class were found, by display name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Presence {
    pub present: Vec<String>,
    pub missing: Vec<String>,
}

impl Presence {
    fn record(&mut self, name: String, found: bool) {
        if found {
            self.present.push(name);
        } else {
            self.missing.push(name);
        }
    }

    pub fn all(&self) -> bool {
        self.missing.is_empty()
    }

    pub fn none(&self) -> bool {
        self.present.is_empty()
    }

    /// `Missing:` line, then a `Present:` line if anything was found.
    fn itemize(&self, progress: &mut dyn Progress) {
        progress.emit(&format!("Missing: {}", self.missing.join(", ")));
        if !self.present.is_empty() {
            progress.emit(&format!("Present: {}", self.present.join(", ")));
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallStatus {
    NotInstalled,
    FullyInstalled,
    Incomplete,
    /// Files an npm installation must have are gone, and no backup accounts
    /// for them.
    Bad,
}

impl InstallStatus {
    pub fn summary(&self) -> &'static str {
        match self {
            Self::NotInstalled => "npm-two-stage is not installed at this location.",
            Self::FullyInstalled => "npm-two-stage is fully installed at this location.",
            Self::Incomplete => "Incomplete installation of npm-two-stage at this location.",
            Self::Bad => "Files expected in an npm installation are missing.",
        }
    }
}

impl fmt::Display for InstallStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::NotInstalled => "NOT_INSTALLED",
            Self::FullyInstalled => "FULLY_INSTALLED",
            Self::Incomplete => "INCOMPLETE",
            Self::Bad => "BAD",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PatchState {
    /// Backup-suffixed originals of the changed files.
    pub backups: Presence,
    /// Un-suffixed changed files. A replacement occupies the same slot as
    /// its original, so an installed tree has none of these missing.
    pub standard: Presence,
    /// Added files followed by added directories.
    pub added: Presence,
    /// Changed files with neither the file nor its backup present.
    lost: usize,
}

impl PatchState {
    #[tracing::instrument(skip(runtime, manifest))]
    pub fn probe<R: Runtime>(runtime: &R, manifest: &Manifest, lib: &Path) -> Self {
        let mut state = PatchState::default();

        for entry in &manifest.changed_files {
            let has_backup = runtime.exists(&manifest.backup_path(lib, entry));
            let has_standard = runtime.exists(&manifest.file_path(lib, entry));
            if !has_backup && !has_standard {
                state.lost += 1;
            }
            state.backups.record(manifest.backup_name(entry), has_backup);
            state.standard.record(manifest.file_name(entry), has_standard);
        }
        for entry in &manifest.added_files {
            state.added.record(
                manifest.file_name(entry),
                runtime.exists(&manifest.file_path(lib, entry)),
            );
        }
        for entry in &manifest.added_dirs {
            state.added.record(
                manifest.dir_name(entry),
                runtime.exists(&manifest.dir_path(lib, entry)),
            );
        }

        state
    }

    /// Entries that must not exist before an install.
    pub fn leftovers(&self) -> Vec<String> {
        self.backups
            .present
            .iter()
            .chain(&self.added.present)
            .cloned()
            .collect()
    }

    pub fn classify(&self) -> InstallStatus {
        if self.lost > 0 {
            InstallStatus::Bad
        } else if self.backups.none() && self.added.none() && self.standard.all() {
            InstallStatus::NotInstalled
        } else if self.backups.all() && self.added.all() && self.standard.all() {
            InstallStatus::FullyInstalled
        } else {
            InstallStatus::Incomplete
        }
    }

    /// Emit one line per entry class, each partial class followed by the
    /// lists of what is missing and what is present.
    pub fn report(&self, progress: &mut dyn Progress) {
        if self.backups.none() {
            progress.emit("No backups present.");
        } else if self.backups.all() {
            progress.emit("All backups present.");
        } else {
            progress.emit("Incomplete set of backups present.");
            self.backups.itemize(progress);
        }

        if self.standard.all() {
            progress.emit("No standard files missing.");
        } else {
            progress.emit("Some standard files are missing.");
            self.standard.itemize(progress);
        }

        if self.added.none() {
            progress.emit("No new files present.");
        } else if self.added.all() {
            progress.emit("All expected new files present.");
        } else {
            progress.emit("Some expected new files are missing.");
            self.added.itemize(progress);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::MockRuntime;
    use std::collections::HashSet;
    use std::path::PathBuf;

    fn lib() -> PathBuf {
        PathBuf::from("/npm/lib")
    }

    /// A runtime where exactly the given `lib`-relative entries exist.
    fn runtime_with(entries: &[&str]) -> MockRuntime {
        let existing: HashSet<PathBuf> = entries
            .iter()
            .map(|e| e.split('/').fold(lib(), |p, part| p.join(part)))
            .collect();
        let mut runtime = MockRuntime::new();
        runtime
            .expect_exists()
            .returning(move |p| existing.contains(p));
        runtime
    }

    const PRISTINE: &[&str] = &[
        "fetch-package-metadata.js",
        "install.js",
        "config/cmd-list.js",
        "install/action/refresh-package-json.js",
    ];

    const INSTALLED: &[&str] = &[
        "fetch-package-metadata.js",
        "install.js",
        "config/cmd-list.js",
        "install/action/refresh-package-json.js",
        "fetch-package-metadata_ORIG.js",
        "install_ORIG.js",
        "config/cmd-list_ORIG.js",
        "install/action/refresh-package-json_ORIG.js",
        "download.js",
        "git-offline.js",
        "offliner.js",
        "prepare-raw-module.js",
        "download",
    ];

    fn probe(entries: &[&str]) -> PatchState {
        PatchState::probe(&runtime_with(entries), &Manifest::default(), &lib())
    }

    fn report(state: &PatchState) -> Vec<String> {
        let mut messages: Vec<String> = Vec::new();
        state.report(&mut messages);
        messages
    }

    #[test]
    fn test_pristine_tree_is_not_installed() {
        let state = probe(PRISTINE);
        assert_eq!(state.classify(), InstallStatus::NotInstalled);
        assert!(state.leftovers().is_empty());
        assert_eq!(
            report(&state),
            vec![
                "No backups present.",
                "No standard files missing.",
                "No new files present.",
            ]
        );
    }

    #[test]
    fn test_installed_tree_is_fully_installed() {
        let state = probe(INSTALLED);
        assert_eq!(state.classify(), InstallStatus::FullyInstalled);
        assert_eq!(
            report(&state),
            vec![
                "All backups present.",
                "No standard files missing.",
                "All expected new files present.",
            ]
        );
    }

    #[test]
    fn test_missing_backup_is_incomplete_and_named() {
        let entries: Vec<&str> = INSTALLED
            .iter()
            .copied()
            .filter(|e| *e != "install/action/refresh-package-json_ORIG.js")
            .collect();
        let state = probe(&entries);

        assert_eq!(state.classify(), InstallStatus::Incomplete);
        assert_eq!(
            report(&state),
            vec![
                "Incomplete set of backups present.",
                "Missing: install/action/refresh-package-json_ORIG.js",
                "Present: fetch-package-metadata_ORIG.js, install_ORIG.js, \
                 config/cmd-list_ORIG.js",
                "No standard files missing.",
                "All expected new files present.",
            ]
        );
    }

    #[test]
    fn test_missing_added_dir_is_incomplete() {
        let entries: Vec<&str> = INSTALLED
            .iter()
            .copied()
            .filter(|e| *e != "download" && *e != "offliner.js")
            .collect();
        let state = probe(&entries);

        assert_eq!(state.classify(), InstallStatus::Incomplete);
        assert_eq!(
            state.added.missing,
            vec!["offliner.js".to_string(), "download/".to_string()]
        );
        assert_eq!(
            report(&state)[2..],
            [
                "Some expected new files are missing.",
                "Missing: offliner.js, download/",
                "Present: download.js, git-offline.js, prepare-raw-module.js",
            ]
        );
    }

    #[test]
    fn test_empty_lib_is_bad() {
        let state = probe(&[]);
        assert_eq!(state.classify(), InstallStatus::Bad);
        let messages = report(&state);
        assert_eq!(messages.len(), 4);
        assert_eq!(messages[1], "Some standard files are missing.");
        assert!(messages[2].starts_with("Missing: fetch-package-metadata.js, install.js"));
    }

    #[test]
    fn test_replacement_removed_but_backup_kept_is_incomplete() {
        let entries: Vec<&str> = INSTALLED
            .iter()
            .copied()
            .filter(|e| *e != "install.js")
            .collect();
        assert_eq!(probe(&entries).classify(), InstallStatus::Incomplete);
    }

    #[test]
    fn test_leftovers_lists_backups_then_added() {
        let state = probe(&[
            "fetch-package-metadata.js",
            "install.js",
            "install_ORIG.js",
            "config/cmd-list.js",
            "install/action/refresh-package-json.js",
            "download",
        ]);
        assert_eq!(state.leftovers(), vec!["install_ORIG.js", "download/"]);
    }

    #[test]
    fn test_summary_and_names() {
        assert_eq!(
            InstallStatus::FullyInstalled.summary(),
            "npm-two-stage is fully installed at this location."
        );
        assert_eq!(InstallStatus::Incomplete.to_string(), "INCOMPLETE");
    }
}
