//! Queries against the globally installed npm.

use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use log::debug;
use std::path::PathBuf;
use tokio::process::Command;

/// Asks the global npm about itself.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NpmLocator: Send + Sync {
    /// Version reported by `npm --version`.
    async fn version(&self) -> Result<String>;

    /// Directory of the global npm installation (the one holding its
    /// `package.json` and `lib`).
    async fn home(&self) -> Result<PathBuf>;
}

/// [`NpmLocator`] backed by the `npm` executable found on `PATH`.
pub struct NpmCli {
    program: String,
}

impl NpmCli {
    pub fn new() -> Self {
        let program = if cfg!(windows) { "npm.cmd" } else { "npm" };
        Self::with_program(program)
    }

    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    async fn run(&self, args: &[&str]) -> Result<String> {
        let command_line = format!("{} {}", self.program, args.join(" "));
        debug!("Running {}", command_line);

        let output = Command::new(&self.program)
            .args(args)
            .output()
            .await
            .with_context(|| format!("Failed to run `{}`", command_line))?;
        if !output.status.success() {
            bail!("`{}` exited with {}", command_line, output.status);
        }

        let stdout = String::from_utf8(output.stdout)
            .with_context(|| format!("Output of `{}` is not UTF-8", command_line))?;
        let stdout = stdout.trim();
        if stdout.is_empty() {
            bail!("`{}` printed nothing", command_line);
        }
        Ok(stdout.to_string())
    }
}

impl Default for NpmCli {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl NpmLocator for NpmCli {
    #[tracing::instrument(skip(self))]
    async fn version(&self) -> Result<String> {
        self.run(&["--version"]).await
    }

    #[tracing::instrument(skip(self))]
    async fn home(&self) -> Result<PathBuf> {
        let root = self.run(&["root", "-g"]).await?;
        Ok(PathBuf::from(root).join("npm"))
    }
}
