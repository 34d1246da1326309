use std::path::PathBuf;

use dashgrid_layout::{
    ConfigError, DocumentError, EngineError, PanelValidationError, RegistryError,
};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, CliError>;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write output: {0}")]
    Write(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("config file {path} is not valid TOML: {source}")]
    ConfigSyntax {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid grid config: {0}")]
    Config(#[from] ConfigError),

    #[error("invalid dashboard: {0}")]
    Document(#[from] DocumentError),

    #[error("panel kind registry: {0}")]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error("{first} ({count} invalid panel(s))")]
    Validation {
        count: usize,
        first: PanelValidationError,
    },

    #[error("operation {index} rejected: {source}")]
    OperationRejected {
        index: usize,
        #[source]
        source: EngineError,
    },

    #[error("logging setup failed: {message}")]
    Logging { message: String },
}

impl CliError {
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Validation { .. } => 3,
            Self::OperationRejected { .. } => 4,
            Self::Config(_) | Self::ConfigSyntax { .. } | Self::Registry(_) => 5,
            _ => 1,
        }
    }

    #[must_use]
    pub fn read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Read {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use dashgrid_layout::PanelValidationFailure;

    use super::CliError;

    #[test]
    fn validation_error_keeps_panel_message() {
        let error = CliError::Validation {
            count: 2,
            first: dashgrid_layout::PanelValidationError {
                key: "cpu".to_string(),
                reason: PanelValidationFailure::UnknownKind {
                    kind: "Foo".to_string(),
                },
            },
        };
        assert_eq!(error.exit_code(), 3);
        assert_eq!(
            error.to_string(),
            "invalid panel cpu: Unknown kind Foo (2 invalid panel(s))"
        );
    }

    #[test]
    fn io_failures_use_generic_exit_code() {
        let error = CliError::read(
            "missing.json",
            std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        );
        assert_eq!(error.exit_code(), 1);
        assert!(error.to_string().starts_with("failed to read missing.json"));
    }
}
