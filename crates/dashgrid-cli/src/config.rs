//! TOML configuration for the command-line host.
//!
//! ```toml
//! builtin_kinds = true
//!
//! [grid]
//! row_height_px = 30
//! margin_px = [8, 8]
//!
//! [[grid.breakpoints]]
//! name = "lg"
//! min_width_px = 1200
//! columns = 24
//!
//! [[panel_kinds]]
//! kind = "TimeSeriesChart"
//! required_options = ["queries"]
//! ```
//!
//! Every section is optional; a missing `[grid]` means the library defaults.

use std::path::Path;

use dashgrid_layout::{GridConfig, PanelKindRegistry, PanelSchema};
use serde::Deserialize;

use crate::error::{CliError, Result};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CliConfig {
    pub grid: GridConfig,
    /// Start the panel registry from the bundled chart kinds.
    pub builtin_kinds: bool,
    /// Extra panel kinds registered on top.
    pub panel_kinds: Vec<PanelSchema>,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            grid: GridConfig::default(),
            builtin_kinds: true,
            panel_kinds: Vec::new(),
        }
    }
}

impl CliConfig {
    pub fn from_toml_str(path: &Path, content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).map_err(|source| CliError::ConfigSyntax {
            path: path.to_path_buf(),
            source,
        })?;
        config.grid.validate()?;
        Ok(config)
    }

    /// Load `path`, or the defaults when no file is given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let content = std::fs::read_to_string(path).map_err(|err| CliError::read(path, err))?;
        let config = Self::from_toml_str(path, &content)?;
        tracing::debug!(
            target: "dashgrid.cli",
            path = %path.display(),
            breakpoints = config.grid.breakpoints.specs().len(),
            extra_kinds = config.panel_kinds.len(),
            "loaded config"
        );
        Ok(config)
    }

    pub fn registry(&self) -> Result<PanelKindRegistry> {
        let mut registry = if self.builtin_kinds {
            PanelKindRegistry::builtin()
        } else {
            PanelKindRegistry::new()
        };
        for schema in &self.panel_kinds {
            registry.register(schema.clone())?;
        }
        Ok(registry)
    }
}

#[cfg(test)]
mod tests {
    use dashgrid_layout::Breakpoint;

    use super::*;

    #[test]
    fn empty_file_is_default() {
        let config = CliConfig::from_toml_str(Path::new("empty.toml"), "").unwrap();
        assert_eq!(config, CliConfig::default());
    }

    #[test]
    fn custom_breakpoints_and_kinds() {
        let toml = r#"
            builtin_kinds = false

            [grid]
            row_height_px = 30

            [[grid.breakpoints]]
            name = "lg"
            min_width_px = 900
            columns = 24

            [[grid.breakpoints]]
            name = "xxs"
            min_width_px = 0
            columns = 6

            [[panel_kinds]]
            kind = "TimeSeriesChart"
            required_options = ["queries"]
        "#;
        let config = CliConfig::from_toml_str(Path::new("custom.toml"), toml).unwrap();
        assert_eq!(config.grid.row_height_px, 30);
        assert_eq!(config.grid.design_columns, 24);
        assert_eq!(config.grid.classify_width(950), Some(Breakpoint::Lg));
        assert_eq!(config.grid.columns(Breakpoint::Xxs), Some(6));

        let registry = config.registry().unwrap();
        let kinds: Vec<&str> = registry.kinds().collect();
        assert_eq!(kinds, ["TimeSeriesChart"]);
    }

    #[test]
    fn invalid_grid_is_rejected() {
        let toml = r#"
            [[grid.breakpoints]]
            name = "lg"
            min_width_px = 0
            columns = 0
        "#;
        let err = CliConfig::from_toml_str(Path::new("bad.toml"), toml).unwrap_err();
        assert!(matches!(err, CliError::Config(_)));
        assert_eq!(err.exit_code(), 5);
    }

    #[test]
    fn duplicate_kind_fails_registry() {
        let toml = r#"
            [[panel_kinds]]
            kind = "LineChart"
        "#;
        let config = CliConfig::from_toml_str(Path::new("dup.toml"), toml).unwrap();
        assert!(matches!(config.registry(), Err(CliError::Registry(_))));
    }

    #[test]
    fn unknown_keys_are_syntax_errors() {
        let err = CliConfig::from_toml_str(Path::new("typo.toml"), "grd = 1").unwrap_err();
        assert!(matches!(err, CliError::ConfigSyntax { .. }));
    }
}
