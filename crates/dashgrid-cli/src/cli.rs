use std::io::Write;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use dashgrid_layout::Breakpoint;

use crate::commands::{run_apply, run_breakpoints, run_render, run_validate};
use crate::config::CliConfig;
use crate::error::Result;

#[derive(Debug, Parser)]
#[command(
    name = "dashgrid",
    about = "Render, validate and edit dashboard grid layouts",
    version
)]
pub struct Cli {
    /// Grid and panel-kind configuration (TOML).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Machine-readable output; errors are printed as JSON too.
    #[arg(long, global = true)]
    pub json: bool,

    /// Write log records to stderr as JSON lines.
    #[arg(long = "log-json", global = true)]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Compute grid boxes for every visible item.
    Render(RenderArgs),

    /// Check placements, references and panel definitions.
    Validate(ValidateArgs),

    /// Apply a JSON list of layout operations and print the result.
    Apply(ApplyArgs),

    /// Print the breakpoint table, or classify a container width.
    Breakpoints(BreakpointsArgs),
}

#[derive(Debug, Clone, Args)]
pub struct RenderArgs {
    /// Dashboard document (JSON).
    pub dashboard: PathBuf,

    #[arg(long, conflicts_with = "width")]
    pub breakpoint: Option<Breakpoint>,

    /// Container width in pixels; adds pixel rectangles to the output.
    #[arg(long)]
    pub width: Option<u32>,

    /// Toggle a collapsible row before rendering. Repeatable.
    #[arg(long = "toggle-row", value_name = "ROW")]
    pub toggle_rows: Vec<String>,
}

#[derive(Debug, Clone, Args)]
pub struct ValidateArgs {
    /// Dashboard document (JSON).
    pub dashboard: PathBuf,

    /// Report every invalid panel instead of stopping at the first.
    #[arg(long)]
    pub all: bool,
}

#[derive(Debug, Clone, Args)]
pub struct ApplyArgs {
    /// Dashboard document (JSON).
    pub dashboard: PathBuf,

    /// JSON array of layout operations, applied in order.
    #[arg(long)]
    pub ops: PathBuf,

    /// Write the edited dashboard here instead of stdout.
    #[arg(long, short)]
    pub output: Option<PathBuf>,

    /// Validate panel definitions after every operation.
    #[arg(long = "check-panels")]
    pub check_panels: bool,
}

#[derive(Debug, Clone, Args)]
pub struct BreakpointsArgs {
    /// Container width to classify.
    #[arg(long)]
    pub width: Option<u32>,
}

/// Run against stdout.
pub fn run(cli: Cli) -> Result<()> {
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    run_with_writer(cli, &mut out)
}

pub fn run_with_writer(cli: Cli, out: &mut dyn Write) -> Result<()> {
    let config = CliConfig::load(cli.config.as_deref())?;
    match cli.command {
        Commands::Render(args) => run_render(&args, &config, cli.json, out),
        Commands::Validate(args) => run_validate(&args, &config, cli.json, out),
        Commands::Apply(args) => run_apply(&args, &config, cli.json, out),
        Commands::Breakpoints(args) => run_breakpoints(&args, &config, cli.json, out),
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::{Cli, Commands};

    #[test]
    fn global_flags_parse_after_subcommand() {
        let cli = Cli::try_parse_from([
            "dashgrid",
            "render",
            "dash.json",
            "--breakpoint",
            "md",
            "--json",
        ])
        .unwrap();
        assert!(cli.json);
        match cli.command {
            Commands::Render(args) => {
                assert_eq!(args.breakpoint, Some(dashgrid_layout::Breakpoint::Md));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn breakpoint_and_width_conflict() {
        let parsed = Cli::try_parse_from([
            "dashgrid",
            "render",
            "dash.json",
            "--breakpoint",
            "md",
            "--width",
            "800",
        ]);
        assert!(parsed.is_err());
    }

    #[test]
    fn unknown_breakpoint_is_a_parse_error() {
        let parsed = Cli::try_parse_from(["dashgrid", "render", "d.json", "--breakpoint", "xl"]);
        assert!(parsed.is_err());
    }
}
