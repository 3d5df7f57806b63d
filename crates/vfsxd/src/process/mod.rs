//! Process supervision: launch sequencing and signal-driven shutdown.

pub(crate) mod launch;
pub(crate) mod shutdown;

mod errors;

pub use errors::LaunchError;
pub use launch::run_daemon;

pub(crate) const PROCESS_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::process");
