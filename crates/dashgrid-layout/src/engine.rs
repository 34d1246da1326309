//! Layout engine facade.
//!
//! [`LayoutEngine`] owns one document, its collapse overrides, at most one
//! drag session, the edit-mode flag, undo history and change subscribers.
//! Hosts feed it drag events and layout operations and read back
//! render-ready item lists.
//!
//! ```text
//! document -> rows::layout_sections -> resolver -> Vec<RenderItem>
//! DragEvent -> DragReorderMachine -> MoveItem -> new document -> history
//! ```
//!
//! Viewing never changes the document: collapse toggles from the engine are
//! view state, and every edit requires edit mode.
//!
//! Versions handed out by the engine only grow. A commit after an undo gets
//! a number above every version committed so far, so an abandoned redo
//! branch never shares a version with the new one.

use std::fmt;
use std::sync::Arc;

use tracing::{debug, debug_span, warn};

use crate::breakpoint::Breakpoint;
use crate::config::{ConfigError, GridConfig};
use crate::document::{DashboardDocument, DocumentError, ItemId, PanelDefinition, RowId};
use crate::drag::{
    DragEffect, DragEvent, DragMachineError, DragPhase, DragReorderMachine, DragState,
    DragTransition, DropTarget, closest_center,
};
use crate::geometry::{GeometryError, GridBox, PixelRect};
use crate::history::LayoutHistory;
use crate::mutation::{LayoutOperation, LayoutOperationKind, MutationError, MutationOutcome};
use crate::notify::{ChangeNotifier, Subscription};
use crate::resolver::{self, ResolutionError, ResolvedContent};
use crate::rows::{self, CollapseState, FlatItem, RowState};
use crate::validate::{PanelKindRegistry, PanelValidationError};

/// What a render item shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderContent {
    RowHeader {
        title: String,
        collapsible: bool,
        is_open: bool,
    },
    Panel {
        key: String,
        definition: PanelDefinition,
    },
    NewPanel,
    /// The placement's reference did not resolve; only this item is affected.
    Unresolved(ResolutionError),
}

/// One positioned item ready for a renderer.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderItem {
    pub id: ItemId,
    pub row_id: RowId,
    pub grid: GridBox,
    /// Present when rendering for a concrete container width.
    pub pixels: Option<PixelRect>,
    pub content: RenderContent,
}

/// Notification delivered to engine subscribers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    DocumentChanged {
        version: u64,
        kind: LayoutOperationKind,
    },
    DocumentReplaced {
        version: u64,
    },
    CollapseChanged {
        row: RowId,
        state: RowState,
    },
    DragChanged {
        transition_id: u64,
        phase: DragPhase,
    },
    EditModeChanged {
        editing: bool,
    },
    HistoryMoved {
        version: u64,
    },
}

/// Result of feeding one drag event to the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DragOutcome {
    pub transition: DragTransition,
    /// Set when the drag ended in a committed move.
    pub committed: Option<MutationOutcome>,
    /// Set when the drag ended in a move that could not be committed.
    pub rejected: Option<EngineError>,
}

pub struct LayoutEngine {
    config: GridConfig,
    document: Arc<DashboardDocument>,
    collapse: CollapseState,
    drag: DragReorderMachine,
    history: LayoutHistory,
    last_version: u64,
    edit_mode: bool,
    registry: Option<PanelKindRegistry>,
    notifier: ChangeNotifier<EngineEvent>,
}

impl fmt::Debug for LayoutEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LayoutEngine")
            .field("version", &self.document.version())
            .field("edit_mode", &self.edit_mode)
            .field("drag", &self.drag.state().phase())
            .field("history", &self.history)
            .finish_non_exhaustive()
    }
}

impl LayoutEngine {
    /// Build an engine after validating the configuration and the layout.
    ///
    /// Dangling content references are logged, not rejected; they render as
    /// [`RenderContent::Unresolved`].
    pub fn new(document: DashboardDocument, config: GridConfig) -> Result<Self, EngineError> {
        config.validate()?;
        let document = Arc::new(Self::prepare(document, &config)?);
        let history = LayoutHistory::new(Arc::clone(&document), config.history_depth);
        Ok(Self {
            config,
            last_version: document.version(),
            document,
            collapse: CollapseState::new(),
            drag: DragReorderMachine::new(),
            history,
            edit_mode: false,
            registry: None,
            notifier: ChangeNotifier::new(),
        })
    }

    /// Validate panels against `registry` now and whenever panels change.
    pub fn with_registry(mut self, registry: PanelKindRegistry) -> Result<Self, EngineError> {
        registry.validate(&self.document)?;
        self.registry = Some(registry);
        Ok(self)
    }

    fn prepare(
        document: DashboardDocument,
        config: &GridConfig,
    ) -> Result<DashboardDocument, EngineError> {
        let document = document.with_design_columns(config.design_columns);
        document.validate_layout()?;
        for issue in document.integrity_report() {
            warn!(
                target: "dashgrid.engine",
                row = %issue.row,
                item = %issue.item,
                error = %issue.error,
                "placement reference does not resolve"
            );
        }
        Ok(document)
    }

    #[must_use]
    pub fn document(&self) -> &Arc<DashboardDocument> {
        &self.document
    }

    #[must_use]
    pub const fn config(&self) -> &GridConfig {
        &self.config
    }

    #[must_use]
    pub const fn collapse_state(&self) -> &CollapseState {
        &self.collapse
    }

    #[must_use]
    pub const fn drag_state(&self) -> &DragState {
        self.drag.state()
    }

    #[must_use]
    pub const fn is_editing(&self) -> bool {
        self.edit_mode
    }

    #[must_use]
    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    #[must_use]
    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Register a change callback; dropping the guard unsubscribes.
    pub fn subscribe(&self, callback: impl Fn(&EngineEvent) + 'static) -> Subscription {
        self.notifier.subscribe(callback)
    }

    /// Swap in a different document, as on navigation. Clears history,
    /// collapse overrides and any drag session.
    pub fn replace_document(&mut self, document: DashboardDocument) -> Result<(), EngineError> {
        let document = Self::prepare(document, &self.config)?;
        if let Some(registry) = &self.registry {
            registry.validate(&document)?;
        }
        self.cancel_drag();
        self.last_version = document.version();
        self.document = Arc::new(document);
        self.history.reset(Arc::clone(&self.document));
        self.collapse = CollapseState::new();
        self.notifier.notify(&EngineEvent::DocumentReplaced {
            version: self.document.version(),
        });
        Ok(())
    }

    // ------------------------------------------------------------------
    // Rendering
    // ------------------------------------------------------------------

    /// Render the committed document in grid units.
    pub fn render(&self, breakpoint: Breakpoint) -> Result<Vec<RenderItem>, EngineError> {
        self.render_document(&self.document, breakpoint)
    }

    /// Render for a container width, including pixel rectangles.
    pub fn render_for_width(&self, container_width_px: u32) -> Result<Vec<RenderItem>, EngineError> {
        self.render_width(&self.document, container_width_px)
    }

    /// Render with the active drag preview applied, if any.
    pub fn render_preview(&self, breakpoint: Breakpoint) -> Result<Vec<RenderItem>, EngineError> {
        match self.drag.session() {
            Some(session) => {
                let preview = self.document.reordered(&session.preview_order);
                self.render_document(&preview, breakpoint)
            }
            None => self.render(breakpoint),
        }
    }

    /// Pixel drop zones for every visible content item.
    pub fn drop_targets(&self, container_width_px: u32) -> Result<Vec<DropTarget>, EngineError> {
        Ok(self
            .render_width(&self.document, container_width_px)?
            .into_iter()
            .filter(|item| !matches!(item.content, RenderContent::RowHeader { .. }))
            .filter_map(|item| {
                item.pixels.map(|rect| DropTarget { id: item.id, rect })
            })
            .collect())
    }

    fn render_width(
        &self,
        document: &DashboardDocument,
        container_width_px: u32,
    ) -> Result<Vec<RenderItem>, EngineError> {
        let breakpoint = self
            .config
            .classify_width(container_width_px)
            .ok_or(ConfigError::NoBreakpoints)?;
        let columns = self
            .config
            .columns(breakpoint)
            .ok_or(GeometryError::UnknownBreakpoint { breakpoint })?;
        let mut items = self.render_document(document, breakpoint)?;
        for item in &mut items {
            item.pixels = Some(item.grid.to_pixels(container_width_px, columns, &self.config));
        }
        Ok(items)
    }

    fn render_document(
        &self,
        document: &DashboardDocument,
        breakpoint: Breakpoint,
    ) -> Result<Vec<RenderItem>, EngineError> {
        let _span = debug_span!(
            "dashgrid.render",
            %breakpoint,
            version = document.version(),
        )
        .entered();
        let placed =
            rows::layout_sections(document.rows(), &self.collapse, breakpoint, &self.config)?;
        let items: Vec<RenderItem> = placed
            .into_iter()
            .map(|placed| {
                let row_id = placed.item.row_id().clone();
                let content = match &placed.item {
                    FlatItem::RowHeader {
                        title,
                        collapsible,
                        is_open,
                        ..
                    } => RenderContent::RowHeader {
                        title: title.clone(),
                        collapsible: *collapsible,
                        is_open: *is_open,
                    },
                    FlatItem::Placeholder { .. } => RenderContent::NewPanel,
                    FlatItem::Content { placement, .. } => {
                        match resolver::resolve(&placement.content, document) {
                            Ok(ResolvedContent::Panel { key, definition }) => {
                                RenderContent::Panel {
                                    key: key.to_string(),
                                    definition: definition.clone(),
                                }
                            }
                            Ok(ResolvedContent::NewPanel) => RenderContent::NewPanel,
                            Err(err) => {
                                warn!(
                                    target: "dashgrid.engine",
                                    item = %placement.id,
                                    error = %err,
                                    "rendering unresolved placement"
                                );
                                RenderContent::Unresolved(err)
                            }
                        }
                    }
                };
                RenderItem {
                    id: placed.grid.id.clone(),
                    row_id,
                    grid: placed.grid,
                    pixels: None,
                    content,
                }
            })
            .collect();
        debug!(target: "dashgrid.engine", items = items.len(), "render pass complete");
        Ok(items)
    }

    // ------------------------------------------------------------------
    // View state
    // ------------------------------------------------------------------

    /// Open or close a collapsible row in this view. The document is untouched.
    pub fn toggle_row(&mut self, row: &RowId) -> Result<RowState, EngineError> {
        let target = self
            .document
            .row(row)
            .ok_or_else(|| EngineError::UnknownRow { row: row.clone() })?;
        if !target.is_collapsible() {
            return Err(EngineError::RowNotCollapsible { row: row.clone() });
        }
        self.collapse = self.collapse.toggle(target);
        let state = self.collapse.state(target);
        self.notifier.notify(&EngineEvent::CollapseChanged {
            row: row.clone(),
            state,
        });
        Ok(state)
    }

    /// Enter or leave edit mode. Leaving cancels any active drag.
    pub fn set_edit_mode(&mut self, editing: bool) {
        if self.edit_mode == editing {
            return;
        }
        if !editing {
            self.cancel_drag();
        }
        self.edit_mode = editing;
        debug!(target: "dashgrid.engine", editing, "edit mode changed");
        self.notifier
            .notify(&EngineEvent::EditModeChanged { editing });
    }

    // ------------------------------------------------------------------
    // Mutations and history
    // ------------------------------------------------------------------

    /// Apply a layout operation to the committed document.
    pub fn apply(&mut self, operation: &LayoutOperation) -> Result<MutationOutcome, EngineError> {
        self.require_editing()?;
        if self.drag.is_active() {
            return Err(EngineError::DragInProgress);
        }
        self.commit_operation(operation)
    }

    /// "Add Panel": insert a new-panel placeholder into `row` (first row by
    /// default) and return its item id.
    pub fn add_new_panel(&mut self, row: Option<&RowId>) -> Result<ItemId, EngineError> {
        self.require_editing()?;
        let row = match row {
            Some(row) => row.clone(),
            None => self
                .document
                .rows()
                .next()
                .map(|row| row.id.clone())
                .ok_or(EngineError::NoRows)?,
        };
        let placement = self.document.new_panel_placement(&row);
        let item = placement.id.clone();
        self.apply(&LayoutOperation::InsertItem {
            row,
            index: 0,
            placement,
        })?;
        Ok(item)
    }

    /// Define `panel` under a fresh key and point `item` at it.
    pub fn assign_new_panel(
        &mut self,
        item: &ItemId,
        panel: PanelDefinition,
    ) -> Result<String, EngineError> {
        let key = self.document.fresh_panel_key();
        self.apply(&LayoutOperation::AssignPanel {
            item: item.clone(),
            key: key.clone(),
            panel: Some(panel),
        })?;
        Ok(key)
    }

    /// Step back one committed version. `Ok(None)` when nothing is left.
    pub fn undo(&mut self) -> Result<Option<u64>, EngineError> {
        self.require_editing()?;
        if self.drag.is_active() {
            return Err(EngineError::DragInProgress);
        }
        Ok(self.history.undo().map(|document| self.restore(document)))
    }

    /// Re-apply the most recently undone version.
    pub fn redo(&mut self) -> Result<Option<u64>, EngineError> {
        self.require_editing()?;
        if self.drag.is_active() {
            return Err(EngineError::DragInProgress);
        }
        Ok(self.history.redo().map(|document| self.restore(document)))
    }

    fn restore(&mut self, document: Arc<DashboardDocument>) -> u64 {
        self.document = document;
        self.collapse = self.collapse.retain_rows(self.document.rows());
        let version = self.document.version();
        debug!(target: "dashgrid.engine", version, "history moved");
        self.notifier.notify(&EngineEvent::HistoryMoved { version });
        version
    }

    /// Apply `operation`, check panels, stamp the next engine version and
    /// commit. Shared by [`apply`](Self::apply) and drag drops.
    fn commit_operation(
        &mut self,
        operation: &LayoutOperation,
    ) -> Result<MutationOutcome, EngineError> {
        let mut outcome = self.document.apply(operation)?;
        if let Some(registry) = &self.registry {
            registry.validate(&outcome.document)?;
        }
        self.last_version = self.last_version.max(self.document.version()).saturating_add(1);
        outcome.document.version = self.last_version;
        if let LayoutOperation::ToggleRow { row } = operation {
            self.collapse = self.collapse.without(row);
        }
        self.commit(&outcome);
        Ok(outcome)
    }

    fn commit(&mut self, outcome: &MutationOutcome) {
        self.document = Arc::new(outcome.document.clone());
        self.history.record(Arc::clone(&self.document));
        self.collapse = self.collapse.retain_rows(self.document.rows());
        debug!(
            target: "dashgrid.engine",
            kind = ?outcome.kind,
            version = self.document.version(),
            "document committed"
        );
        self.notifier.notify(&EngineEvent::DocumentChanged {
            version: self.document.version(),
            kind: outcome.kind,
        });
    }

    fn require_editing(&self) -> Result<(), EngineError> {
        if self.edit_mode {
            Ok(())
        } else {
            Err(EngineError::NotEditing)
        }
    }

    // ------------------------------------------------------------------
    // Drag and drop
    // ------------------------------------------------------------------

    /// Feed one drag event. A drag-end that commits is applied as a
    /// [`LayoutOperation::MoveItem`].
    pub fn handle_drag(&mut self, event: &DragEvent) -> Result<DragOutcome, EngineError> {
        if matches!(event, DragEvent::Start { .. }) {
            self.require_editing()?;
        }
        let order = self.document.content_order();
        let transition = self.drag.handle(event, &order)?;
        let mut outcome = DragOutcome {
            transition,
            committed: None,
            rejected: None,
        };
        if let DragEffect::Committed(commit) = &outcome.transition.effect {
            let operation = LayoutOperation::MoveItem {
                item: commit.item.clone(),
                target_row: commit.target_row.clone(),
                target_index: commit.target_index,
            };
            match self.commit_operation(&operation) {
                Ok(applied) => outcome.committed = Some(applied),
                Err(err) => {
                    warn!(target: "dashgrid.engine", %err, "drag commit rejected");
                    outcome.rejected = Some(err);
                }
            }
        }
        if !matches!(outcome.transition.effect, DragEffect::Noop { .. }) {
            self.notifier.notify(&EngineEvent::DragChanged {
                transition_id: outcome.transition.transition_id,
                phase: outcome.transition.to,
            });
        }
        Ok(outcome)
    }

    /// End the drag of `active` at `pointer`, picking the drop target by
    /// closest center. With no target under the pointer the drag is
    /// cancelled and [`EngineError::InvalidDragTarget`] is returned.
    pub fn drop_at(
        &mut self,
        active: &ItemId,
        pointer: (f64, f64),
        targets: &[DropTarget],
    ) -> Result<DragOutcome, EngineError> {
        let Some(over) = closest_center(pointer, targets).cloned() else {
            self.handle_drag(&DragEvent::End {
                active: active.clone(),
                over: None,
            })?;
            return Err(EngineError::InvalidDragTarget {
                active: active.clone(),
            });
        };
        self.handle_drag(&DragEvent::End {
            active: active.clone(),
            over: Some(over),
        })
    }

    fn cancel_drag(&mut self) {
        if let Some(transition) = self.drag.force_cancel() {
            self.notifier.notify(&EngineEvent::DragChanged {
                transition_id: transition.transition_id,
                phase: transition.to,
            });
        }
    }
}

/// Engine-level failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    NotEditing,
    DragInProgress,
    NoRows,
    UnknownRow { row: RowId },
    RowNotCollapsible { row: RowId },
    InvalidDragTarget { active: ItemId },
    Config(ConfigError),
    Document(DocumentError),
    Geometry(GeometryError),
    Mutation(MutationError),
    Drag(DragMachineError),
    PanelValidation(PanelValidationError),
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotEditing => write!(f, "the dashboard is not in edit mode"),
            Self::DragInProgress => write!(f, "a drag is in progress"),
            Self::NoRows => write!(f, "the dashboard has no rows"),
            Self::UnknownRow { row } => write!(f, "row {row} not found"),
            Self::RowNotCollapsible { row } => write!(f, "row {row} is not collapsible"),
            Self::InvalidDragTarget { active } => {
                write!(f, "item {active} was not dropped on a valid target")
            }
            Self::Config(err) => write!(f, "invalid configuration: {err}"),
            Self::Document(err) => write!(f, "invalid document: {err}"),
            Self::Geometry(err) => write!(f, "{err}"),
            Self::Mutation(err) => write!(f, "{err}"),
            Self::Drag(err) => write!(f, "{err}"),
            Self::PanelValidation(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for EngineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Config(err) => Some(err),
            Self::Document(err) => Some(err),
            Self::Geometry(err) => Some(err),
            Self::Mutation(err) => Some(err),
            Self::Drag(err) => Some(err),
            Self::PanelValidation(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ConfigError> for EngineError {
    fn from(err: ConfigError) -> Self {
        Self::Config(err)
    }
}

impl From<DocumentError> for EngineError {
    fn from(err: DocumentError) -> Self {
        Self::Document(err)
    }
}

impl From<GeometryError> for EngineError {
    fn from(err: GeometryError) -> Self {
        Self::Geometry(err)
    }
}

impl From<MutationError> for EngineError {
    fn from(err: MutationError) -> Self {
        Self::Mutation(err)
    }
}

impl From<DragMachineError> for EngineError {
    fn from(err: DragMachineError) -> Self {
        Self::Drag(err)
    }
}

impl From<PanelValidationError> for EngineError {
    fn from(err: PanelValidationError) -> Self {
        Self::PanelValidation(err)
    }
}
