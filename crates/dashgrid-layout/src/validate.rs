//! Panel definition validation against a registry of known kinds.
//!
//! Every panel must meet the base shape (non-empty `kind`, non-empty
//! `display.name`, object `options`) and then the schema registered for its
//! kind. Validation walks panels in key order and stops at the first invalid
//! one; [`PanelKindRegistry::validate_all`] collects every failure instead.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::document::{DashboardDocument, PanelDefinition};

/// Requirements a panel kind places on its options.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PanelSchema {
    pub kind: String,
    /// Keys that must be present in `options`.
    #[serde(default)]
    pub required_options: Vec<String>,
}

impl PanelSchema {
    #[must_use]
    pub fn new<I, S>(kind: impl Into<String>, required_options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            kind: kind.into(),
            required_options: required_options.into_iter().map(Into::into).collect(),
        }
    }
}

/// Known panel kinds.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PanelKindRegistry {
    schemas: BTreeMap<String, PanelSchema>,
}

impl PanelKindRegistry {
    /// Empty registry; every kind is unknown.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry preloaded with the bundled chart kinds.
    #[must_use]
    pub fn builtin() -> Self {
        let schemas = [
            PanelSchema::new("EmptyChart", Vec::<String>::new()),
            PanelSchema::new("LineChart", ["queries"]),
            PanelSchema::new("GaugeChart", ["query"]),
            PanelSchema::new("StatChart", ["query"]),
            PanelSchema::new("Markdown", ["text"]),
        ];
        Self {
            schemas: schemas
                .into_iter()
                .map(|schema| (schema.kind.clone(), schema))
                .collect(),
        }
    }

    /// Add a kind. Registering the same kind twice is an error.
    pub fn register(&mut self, schema: PanelSchema) -> Result<(), RegistryError> {
        if schema.kind.is_empty() {
            return Err(RegistryError::EmptyKind);
        }
        if self.schemas.contains_key(&schema.kind) {
            return Err(RegistryError::DuplicateKind { kind: schema.kind });
        }
        self.schemas.insert(schema.kind.clone(), schema);
        Ok(())
    }

    #[must_use]
    pub fn get(&self, kind: &str) -> Option<&PanelSchema> {
        self.schemas.get(kind)
    }

    pub fn kinds(&self) -> impl Iterator<Item = &str> {
        self.schemas.keys().map(String::as_str)
    }

    /// Check one panel.
    pub fn validate_panel(
        &self,
        key: &str,
        panel: &PanelDefinition,
    ) -> Result<(), PanelValidationError> {
        let fail = |reason| PanelValidationError {
            key: key.to_string(),
            reason,
        };
        if panel.kind.trim().is_empty() {
            return Err(fail(PanelValidationFailure::MissingKind));
        }
        if panel.display.name.trim().is_empty() {
            return Err(fail(PanelValidationFailure::EmptyDisplayName));
        }
        let options = match &panel.options {
            serde_json::Value::Null => None,
            serde_json::Value::Object(map) => Some(map),
            _ => return Err(fail(PanelValidationFailure::OptionsNotObject)),
        };
        let schema = self
            .get(&panel.kind)
            .ok_or_else(|| fail(PanelValidationFailure::UnknownKind {
                kind: panel.kind.clone(),
            }))?;
        let missing = schema
            .required_options
            .iter()
            .find(|option| options.is_none_or(|map| !map.contains_key(option.as_str())));
        if let Some(option) = missing {
            return Err(fail(PanelValidationFailure::SchemaConditionsNotMet {
                kind: panel.kind.clone(),
                missing_option: option.clone(),
            }));
        }
        Ok(())
    }

    /// Check every panel of `document` in key order, stopping at the first failure.
    pub fn validate(&self, document: &DashboardDocument) -> Result<(), PanelValidationError> {
        for (key, panel) in document.panels() {
            if let Err(err) = self.validate_panel(key, panel) {
                warn!(target: "dashgrid.layout", %err, "panel validation failed");
                return Err(err);
            }
        }
        debug!(target: "dashgrid.layout", "all panels are valid");
        Ok(())
    }

    /// Check every panel and collect all failures.
    #[must_use]
    pub fn validate_all(&self, document: &DashboardDocument) -> Vec<PanelValidationError> {
        document
            .panels()
            .filter_map(|(key, panel)| self.validate_panel(key, panel).err())
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    EmptyKind,
    DuplicateKind { kind: String },
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyKind => write!(f, "panel kind must not be empty"),
            Self::DuplicateKind { kind } => write!(f, "panel kind {kind} is already registered"),
        }
    }
}

impl std::error::Error for RegistryError {}

/// Why a panel failed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PanelValidationFailure {
    MissingKind,
    EmptyDisplayName,
    OptionsNotObject,
    UnknownKind {
        kind: String,
    },
    SchemaConditionsNotMet {
        kind: String,
        missing_option: String,
    },
}

impl fmt::Display for PanelValidationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingKind => write!(f, "kind is missing"),
            Self::EmptyDisplayName => write!(f, "display.name is missing"),
            Self::OptionsNotObject => write!(f, "options must be an object"),
            Self::UnknownKind { kind } => write!(f, "Unknown kind {kind}"),
            Self::SchemaConditionsNotMet {
                kind,
                missing_option,
            } => write!(
                f,
                "{kind} schema conditions not met: missing option {missing_option}"
            ),
        }
    }
}

/// A failed panel, with a message meant for end users.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PanelValidationError {
    pub key: String,
    pub reason: PanelValidationFailure,
}

impl fmt::Display for PanelValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid panel {}: {}", self.key, self.reason)
    }
}

impl std::error::Error for PanelValidationError {}
