#![forbid(unsafe_code)]

//! Dashgrid Layout
//!
//! Dashboard grid layout engine: turns a declarative dashboard document
//! (rows of placements referencing named panels) into positioned grid cells,
//! and keeps that layout consistent across breakpoints and edits.
//!
//! # Key Components
//!
//! - [`DashboardDocument`] - Immutable, versioned rows + panels
//! - [`resolve`] - Content reference resolution
//! - [`compute_boxes`] - Placements to grid boxes for a breakpoint
//! - [`layout_sections`] - Row headers, collapse state, vertical stacking
//! - [`DragReorderMachine`] - Drag-to-reorder lifecycle
//! - [`LayoutOperation`] - Transactional structural edits
//! - [`LayoutHistory`] - Undo/redo over committed versions
//! - [`PanelKindRegistry`] - Panel definition validation
//! - [`LayoutEngine`] - Facade a UI host talks to
//!
//! # Logging
//! Emits `tracing` events under the `dashgrid.layout`, `dashgrid.drag`,
//! `dashgrid.mutation` and `dashgrid.engine` targets. Installing a
//! subscriber is left to the host.

pub mod breakpoint;
pub mod config;
pub mod document;
pub mod drag;
pub mod engine;
pub mod geometry;
pub mod history;
pub mod mutation;
pub mod notify;
pub mod resolver;
pub mod rows;
pub mod spec;
pub mod validate;

pub use breakpoint::{Breakpoint, BreakpointSpec, BreakpointTable, ParseBreakpointError};
pub use config::{ConfigError, GridConfig};
pub use document::{
    DashboardDocument, DocumentError, IntegrityIssue, ItemId, ItemLocation, ItemPlacement,
    NEW_PANEL_KEY, NEW_PANEL_REF, PANEL_REF_PREFIX, PanelDefinition, PanelDisplay, Reference, Row,
    RowCollapse, RowId,
};
pub use drag::{
    DragCancelCause, DragCancelReason, DragCommit, DragEffect, DragEvent, DragMachineError,
    DragNoopReason, DragPhase, DragReorderMachine, DragSession, DragState, DragTransition,
    DropTarget, OrderSlot, array_move, closest_center,
};
pub use engine::{DragOutcome, EngineError, EngineEvent, LayoutEngine, RenderContent, RenderItem};
pub use geometry::{GeometryError, GridBox, PixelRect, compute_boxes, find_overlap};
pub use history::LayoutHistory;
pub use mutation::{
    LayoutOperation, LayoutOperationKind, MutationError, MutationFailure, MutationOutcome,
    RemovePanelPolicy,
};
pub use notify::{ChangeNotifier, Subscription};
pub use resolver::{ResolutionError, ResolvedContent, resolve};
pub use rows::{CollapseState, FlatItem, PlacedItem, RowState, expand, layout_sections};
pub use spec::DashboardSpec;
pub use validate::{
    PanelKindRegistry, PanelSchema, PanelValidationError, PanelValidationFailure, RegistryError,
};
