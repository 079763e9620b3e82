//! The patch engine: what gets changed in npm's `lib` directory, the
//! directory operations used to change it, and probes of its current state.

pub mod fs_tools;
mod manifest;
pub mod revert;
mod state;

pub use manifest::Manifest;
pub use state::{InstallStatus, PatchState, Presence};
