#![forbid(unsafe_code)]

//! Command-line host for `dashgrid-layout`.
//!
//! Loads a dashboard document (JSON) and an optional TOML config, then
//! renders, validates or edits it. See [`cli::Commands`] for the surface.

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod logging;

pub use cli::{Cli, Commands, run, run_with_writer};
pub use config::CliConfig;
pub use error::{CliError, Result};
