//! Error types for patch operations.
//!
//! Every failure that reaches the command line carries an [`ExitClass`],
//! which determines the process exit status. The classes are stable across
//! releases.

use std::fmt;
use std::io;
use thiserror::Error;

use crate::patch::fs_tools::UsageError;

/// Exit classification of a failed command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitClass {
    /// The npm-two-stage source payload is incomplete.
    BadProject,
    /// No npm found at the given (or global) location.
    NoNpm,
    /// npm found, but not the version this patch was written for.
    WrongNpmVer,
    /// npm of the right version, but its installation tree is damaged.
    BadNpmInst,
    /// Remains of a previous installation are in the way.
    Leftovers,
    /// A filesystem mutation failed.
    FsActionFail,
}

impl ExitClass {
    /// Process exit code for this class.
    pub fn code(&self) -> i32 {
        match self {
            Self::NoNpm => 11,
            Self::WrongNpmVer => 12,
            Self::BadNpmInst => 13,
            Self::Leftovers => 14,
            Self::FsActionFail => 15,
            Self::BadProject => 19,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::BadProject => "BAD_PROJECT",
            Self::NoNpm => "NO_NPM",
            Self::WrongNpmVer => "WRONG_NPM_VER",
            Self::BadNpmInst => "BAD_NPM_INST",
            Self::Leftovers => "LEFTOVERS",
            Self::FsActionFail => "FS_ACTION_FAIL",
        }
    }
}

impl fmt::Display for ExitClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Errors surfaced by the install, uninstall and status commands.
#[derive(Debug, Error)]
pub enum Error {
    /// Malformed arguments; nothing on disk was touched.
    #[error("{0}")]
    Usage(String),

    #[error("{0}")]
    NoTarget(String),

    #[error("wrong version of npm: found {found}, expected {expected}")]
    WrongVersion { expected: String, found: String },

    #[error("{0}")]
    BadInstallation(String),

    #[error("{0}")]
    BadProject(String),

    #[error(
        "evidence of previous npm-two-stage installation ({}) in target location",
        .items.join(", ")
    )]
    Leftovers { items: Vec<String> },

    #[error("{0}")]
    FsActionFail(String),
}

impl Error {
    /// Classification of this error. Usage errors are not classified.
    pub fn exit_class(&self) -> Option<ExitClass> {
        match self {
            Error::Usage(_) => None,
            Error::NoTarget(_) => Some(ExitClass::NoNpm),
            Error::WrongVersion { .. } => Some(ExitClass::WrongNpmVer),
            Error::BadInstallation(_) => Some(ExitClass::BadNpmInst),
            Error::BadProject(_) => Some(ExitClass::BadProject),
            Error::Leftovers { .. } => Some(ExitClass::Leftovers),
            Error::FsActionFail(_) => Some(ExitClass::FsActionFail),
        }
    }

    /// Process exit code; unclassified errors exit with 1.
    pub fn exit_code(&self) -> i32 {
        self.exit_class().map_or(1, |class| class.code())
    }

    /// Wrap a lower-level failure as a generic filesystem action failure,
    /// keeping the whole cause chain in the message. Argument errors from
    /// the directory tools stay usage errors.
    pub fn fs_action(err: &anyhow::Error) -> Self {
        match err.downcast_ref::<UsageError>() {
            Some(usage) => Error::Usage(usage.to_string()),
            None => Error::FsActionFail(format!("{:#}", err)),
        }
    }
}

/// Whether any error in the chain is an I/O "not found" error.
pub fn is_not_found(err: &anyhow::Error) -> bool {
    err.chain().any(|cause| {
        cause
            .downcast_ref::<io::Error>()
            .is_some_and(|e| e.kind() == io::ErrorKind::NotFound)
    })
}

/// Result type for command operations.
pub type Result<T> = std::result::Result<T, Error>;
