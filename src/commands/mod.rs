//! The install, uninstall and status commands.

pub mod config;
pub mod install;
pub mod status;
pub mod target;
pub mod uninstall;

pub use config::Config;
pub use install::install;
pub use status::status;
pub use target::{add_fault_message, expect_correct_npm_version};
pub use uninstall::uninstall;
