//! Content reference resolution.

use std::fmt;

use crate::document::{DashboardDocument, PanelDefinition, Reference};

/// What a placement's reference points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolvedContent<'a> {
    Panel {
        key: &'a str,
        definition: &'a PanelDefinition,
    },
    /// The reserved placeholder for a panel that has not been defined yet.
    NewPanel,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolutionError {
    UnknownPanel { reference: Reference, key: String },
    MalformedReference { reference: Reference },
}

impl fmt::Display for ResolutionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownPanel { reference, key } => {
                write!(f, "reference {reference} names unknown panel {key}")
            }
            Self::MalformedReference { reference } => {
                write!(f, "reference {reference} is not a panel reference")
            }
        }
    }
}

impl std::error::Error for ResolutionError {}

/// Resolve `reference` against the panels of `document`.
///
/// The new-panel sentinel resolves even when no panel is stored under its
/// key. Pure; the caller decides how to surface a failure.
pub fn resolve<'a>(
    reference: &'a Reference,
    document: &'a DashboardDocument,
) -> Result<ResolvedContent<'a>, ResolutionError> {
    if reference.is_new_panel() {
        return Ok(ResolvedContent::NewPanel);
    }
    let key = reference
        .panel_key()
        .ok_or_else(|| ResolutionError::MalformedReference {
            reference: reference.clone(),
        })?;
    document
        .panels
        .get(key)
        .map(|definition| ResolvedContent::Panel { key, definition })
        .ok_or_else(|| ResolutionError::UnknownPanel {
            reference: reference.clone(),
            key: key.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{ItemPlacement, Row};

    fn document() -> DashboardDocument {
        DashboardDocument::new(
            [Row::new("r").with_item(ItemPlacement::new(
                "a",
                0,
                0,
                12,
                6,
                Reference::panel("cpu"),
            ))],
            [("cpu".to_string(), PanelDefinition::new("LineChart", "CPU"))],
        )
        .unwrap()
    }

    #[test]
    fn resolves_known_panel() {
        let doc = document();
        match resolve(&Reference::panel("cpu"), &doc).unwrap() {
            ResolvedContent::Panel { key, definition } => {
                assert_eq!(key, "cpu");
                assert_eq!(definition.display.name, "CPU");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn sentinel_resolves_to_new_panel() {
        let doc = document();
        assert_eq!(
            resolve(&Reference::new_panel(), &doc),
            Ok(ResolvedContent::NewPanel)
        );
    }

    #[test]
    fn unknown_and_malformed_references_fail() {
        let doc = document();
        assert_eq!(
            resolve(&Reference::panel("mem"), &doc),
            Err(ResolutionError::UnknownPanel {
                reference: Reference::panel("mem"),
                key: "mem".into(),
            })
        );
        let bogus = Reference::new("http://example.com/panel");
        assert_eq!(
            resolve(&bogus, &doc),
            Err(ResolutionError::MalformedReference {
                reference: bogus.clone()
            })
        );
    }
}
