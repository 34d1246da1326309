//! Subscriber installation for the `dashgrid` binary.
//!
//! Filtering follows `RUST_LOG` and defaults to `warn`. Records go to stderr
//! so stdout stays parseable.

use tracing_subscriber::EnvFilter;

use crate::error::{CliError, Result};

pub const DEFAULT_FILTER: &str = "warn";

#[must_use]
pub fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Install the global subscriber, as JSON lines when `json` is set.
pub fn init(json: bool) -> Result<()> {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(std::io::stderr)
        .with_target(true);
    let installed = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    installed.map_err(|err| CliError::Logging {
        message: err.to_string(),
    })
}
