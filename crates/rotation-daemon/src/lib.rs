//! Sheet Rotation Daemon
//!
//! Command line, environment configuration, logging and wiring for the
//! `sheet-rotation` binary:
//! - [`config`]: environment-sourced [`Settings`]
//! - [`logging`]: `tracing-subscriber` setup
//! - [`app`]: builds the [`Runner`](rotation_core::Runner) from settings

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod app;
pub mod config;
pub mod logging;

pub use app::{build_runner, command, run_mode};
pub use config::{ConfigError, LogFormat, Settings};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
