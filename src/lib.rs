pub mod cleanup;
pub mod commands;
pub mod error;
pub mod npm;
pub mod patch;
pub mod progress;
pub mod runtime;

/// Fixtures shared by the unit tests.
#[cfg(test)]
pub mod test_utils {
    use crate::commands::Config;
    use crate::npm::NpmLocator;
    use crate::patch::Manifest;
    use crate::runtime::{MockRuntime, RealRuntime, Runtime};
    use std::fs;
    use std::io;
    use std::path::{Path, PathBuf};
    use std::sync::Arc;

    fn write_entry(root: &Path, manifest: &Manifest, entry: &str, content: &str) {
        let path = manifest.file_path(root, entry);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    /// Create `<parent>/npm`: a package descriptor for the expected npm
    /// version and a `lib` holding every file the patch replaces.
    pub fn mock_npm_tree(parent: &Path) -> PathBuf {
        let manifest = Manifest::default();
        let npm_dir = parent.join("npm");
        let lib = npm_dir.join("lib");
        fs::create_dir_all(&lib).unwrap();
        fs::write(
            npm_dir.join("package.json"),
            format!(
                r#"{{"name": "npm", "version": "{}"}}"#,
                manifest.expected_version
            ),
        )
        .unwrap();
        fs::write(lib.join("npm.js"), "// npm entry point\n").unwrap();
        for entry in &manifest.changed_files {
            write_entry(&lib, &manifest, entry, &format!("// original {}\n", entry));
        }
        npm_dir
    }

    /// Create `<parent>/src`: a complete payload for the default manifest.
    pub fn mock_source_tree(parent: &Path) -> PathBuf {
        let manifest = Manifest::default();
        let src = parent.join("src");
        for entry in manifest.payload_files() {
            write_entry(&src, &manifest, entry, &format!("// npm-two-stage {}\n", entry));
        }
        let download = src.join("download");
        fs::create_dir_all(download.join("nested")).unwrap();
        fs::write(download.join("fetch.js"), "// fetch\n").unwrap();
        fs::write(download.join("lockfile.js"), vec![b'x'; 4096]).unwrap();
        fs::write(download.join("nested").join("deep.js"), "// deep\n").unwrap();
        src
    }

    /// Every entry under `root` with its relative path and, for files,
    /// its content.
    pub fn snapshot(root: &Path) -> Vec<(String, Option<Vec<u8>>)> {
        fn walk(root: &Path, current: &Path, out: &mut Vec<(String, Option<Vec<u8>>)>) {
            let mut entries: Vec<PathBuf> = fs::read_dir(current)
                .unwrap()
                .map(|e| e.unwrap().path())
                .collect();
            entries.sort();
            for path in entries {
                let rel = path
                    .strip_prefix(root)
                    .unwrap()
                    .components()
                    .map(|c| c.as_os_str().to_string_lossy().into_owned())
                    .collect::<Vec<_>>()
                    .join("/");
                if path.is_dir() {
                    out.push((rel, None));
                    walk(root, &path, out);
                } else {
                    out.push((rel, Some(fs::read(&path).unwrap())));
                }
            }
        }

        let mut out = Vec::new();
        walk(root, root, &mut out);
        out
    }

    pub fn test_config<R: Runtime, N: NpmLocator>(
        runtime: R,
        npm: N,
        source_dir: &Path,
    ) -> Config<R, N> {
        Config {
            runtime,
            npm,
            manifest: Manifest::default(),
            source_dir: source_dir.to_path_buf(),
        }
    }

    fn injected(op: &str, path: &Path) -> anyhow::Error {
        anyhow::Error::new(io::Error::from(io::ErrorKind::PermissionDenied))
            .context(format!("Injected {} failure at {}", op, path.display()))
    }

    /// A runtime backed by the real filesystem, except that the operations
    /// for which `fail(op, path)` holds are denied. `path` is the source of
    /// a rename and the destination of a copy.
    pub fn failing_runtime<F>(fail: F) -> MockRuntime
    where
        F: Fn(&str, &Path) -> bool + Send + Sync + 'static,
    {
        let fail = Arc::new(fail);
        let mut runtime = MockRuntime::new();

        runtime
            .expect_read_to_string()
            .returning(|path| RealRuntime.read_to_string(path));
        runtime.expect_exists().returning(|path| RealRuntime.exists(path));
        runtime.expect_is_dir().returning(|path| RealRuntime.is_dir(path));
        runtime
            .expect_read_dir()
            .returning(|path| RealRuntime.read_dir(path));

        let check = fail.clone();
        runtime.expect_rename().returning(move |from, to| {
            if check("rename", from) {
                return Err(injected("rename", from));
            }
            RealRuntime.rename(from, to)
        });
        let check = fail.clone();
        runtime.expect_copy().returning(move |from, to| {
            if check("copy", to) {
                return Err(injected("copy", to));
            }
            RealRuntime.copy(from, to)
        });
        let check = fail.clone();
        runtime.expect_create_dir().returning(move |path| {
            if check("create_dir", path) {
                return Err(injected("create_dir", path));
            }
            RealRuntime.create_dir(path)
        });
        let check = fail.clone();
        runtime.expect_remove_file().returning(move |path| {
            if check("remove_file", path) {
                return Err(injected("remove_file", path));
            }
            RealRuntime.remove_file(path)
        });
        let check = fail;
        runtime.expect_remove_dir_all().returning(move |path| {
            if check("remove_dir_all", path) {
                return Err(injected("remove_dir_all", path));
            }
            RealRuntime.remove_dir_all(path)
        });

        runtime
    }
}
