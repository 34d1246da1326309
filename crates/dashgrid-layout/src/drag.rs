//! Drag-to-reorder state machine.
//!
//! The machine consumes semantic drag events (start, over, end, cancel) with
//! item identities; pointer plumbing lives in the host. While a session is
//! active it keeps the order captured at drag start and a preview order
//! derived from it, so every preview is an array-move of the original and
//! never drifts across many `Over` events.
//!
//! ```text
//! Idle --Start--> Dragging --Over--> Dragging
//!                    |  \--End (moved)------> Committed -> Idle
//!                    |  \--End (outside/same)-> Cancelled -> Idle
//!                    \--Cancel----------------> Cancelled -> Idle
//! ```
//!
//! # Invariants
//!
//! 1. At most one session exists per machine.
//! 2. `preview_order` is always a permutation of `original_order`.
//! 3. A cancel in any form leaves the document order untouched.
//! 4. `transition_id` increases by one for every emitted transition.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::document::{DashboardDocument, ItemId, RowId};
use crate::geometry::PixelRect;

/// One content item's position in the flat order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OrderSlot {
    pub row_id: RowId,
    pub item_id: ItemId,
}

impl OrderSlot {
    #[must_use]
    pub fn new(row_id: impl Into<RowId>, item_id: impl Into<ItemId>) -> Self {
        Self {
            row_id: row_id.into(),
            item_id: item_id.into(),
        }
    }
}

impl DashboardDocument {
    /// Flat `(row, item)` sequence of every placement in document order.
    #[must_use]
    pub fn content_order(&self) -> Vec<OrderSlot> {
        self.items()
            .map(|(row, item)| OrderSlot {
                row_id: row.id.clone(),
                item_id: item.id.clone(),
            })
            .collect()
    }

    /// Copy of the document with items regrouped and reordered by `order`.
    ///
    /// Used for preview rendering only; the result is not validated and
    /// keeps the current version. Items missing from `order` keep their
    /// row and follow the ordered ones.
    #[must_use]
    pub(crate) fn reordered(&self, order: &[OrderSlot]) -> DashboardDocument {
        let mut next = self.clone();
        let mut rows: Vec<_> = next.rows.iter().cloned().collect();
        let mut pool: Vec<_> = rows
            .iter_mut()
            .flat_map(|row| {
                let row_id = row.id.clone();
                std::mem::take(&mut row.items)
                    .into_iter()
                    .map(move |item| (row_id.clone(), item))
            })
            .collect();
        for slot in order {
            let Some(index) = pool.iter().position(|(_, item)| item.id == slot.item_id) else {
                continue;
            };
            let (_, item) = pool.remove(index);
            if let Some(row) = rows.iter_mut().find(|row| row.id == slot.row_id) {
                row.items.push(item);
            }
        }
        for (row_id, item) in pool {
            if let Some(row) = rows.iter_mut().find(|row| row.id == row_id) {
                row.items.push(item);
            }
        }
        next.rows = rows.into_iter().collect();
        next
    }
}

/// Transient state of one drag gesture.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DragSession {
    pub active_id: ItemId,
    pub over_id: Option<ItemId>,
    pub original_order: Vec<OrderSlot>,
    pub preview_order: Vec<OrderSlot>,
    pub started_transition: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum DragState {
    #[default]
    Idle,
    Dragging(DragSession),
}

impl DragState {
    #[must_use]
    pub const fn phase(&self) -> DragPhase {
        match self {
            Self::Idle => DragPhase::Idle,
            Self::Dragging(_) => DragPhase::Dragging,
        }
    }
}

/// State discriminant recorded in transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DragPhase {
    Idle,
    Dragging,
}

/// Why the host asked for a cancel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DragCancelReason {
    Escape,
    FocusLost,
    Programmatic,
}

/// Semantic drag input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum DragEvent {
    Start {
        active: ItemId,
    },
    Over {
        active: ItemId,
        over: Option<ItemId>,
    },
    End {
        active: ItemId,
        over: Option<ItemId>,
    },
    Cancel {
        reason: DragCancelReason,
    },
}

/// Reorder decided by a drag-end.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DragCommit {
    pub item: ItemId,
    pub target_row: RowId,
    /// Index of `item` among `target_row`'s items after the move.
    pub target_index: usize,
    pub order: Vec<OrderSlot>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DragCancelCause {
    /// Released over nothing or over an unknown item.
    DropOutside,
    /// Released where the order would not change.
    NoMovement,
    Requested(DragCancelReason),
}

/// Events that are deliberately ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DragNoopReason {
    IdleWithoutSession,
    ActiveMismatch,
    OverSelf,
    UnknownTarget,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "effect", rename_all = "snake_case")]
pub enum DragEffect {
    Started {
        active: ItemId,
    },
    PreviewUpdated {
        active: ItemId,
        over: Option<ItemId>,
        order: Vec<OrderSlot>,
    },
    Committed(DragCommit),
    Cancelled {
        active: ItemId,
        cause: DragCancelCause,
    },
    Noop {
        reason: DragNoopReason,
    },
}

/// One machine step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DragTransition {
    pub transition_id: u64,
    pub from: DragPhase,
    pub to: DragPhase,
    pub effect: DragEffect,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DragMachineError {
    SessionActive { active: ItemId },
    UnknownItem { item: ItemId },
}

impl std::fmt::Display for DragMachineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SessionActive { active } => {
                write!(f, "a drag session for item {active} is already active")
            }
            Self::UnknownItem { item } => write!(f, "cannot drag unknown item {item}"),
        }
    }
}

impl std::error::Error for DragMachineError {}

/// Drag-reorder lifecycle machine.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DragReorderMachine {
    state: DragState,
    transition_counter: u64,
}

impl DragReorderMachine {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn state(&self) -> &DragState {
        &self.state
    }

    #[must_use]
    pub fn session(&self) -> Option<&DragSession> {
        match &self.state {
            DragState::Dragging(session) => Some(session),
            DragState::Idle => None,
        }
    }

    #[must_use]
    pub const fn is_active(&self) -> bool {
        matches!(self.state, DragState::Dragging(_))
    }

    #[must_use]
    pub const fn transition_count(&self) -> u64 {
        self.transition_counter
    }

    /// Reset to `Idle` from any state. Returns `None` when already idle.
    pub fn force_cancel(&mut self) -> Option<DragTransition> {
        let DragState::Dragging(session) = std::mem::take(&mut self.state) else {
            return None;
        };
        Some(self.emit(
            DragPhase::Dragging,
            DragEffect::Cancelled {
                active: session.active_id,
                cause: DragCancelCause::Requested(DragCancelReason::Programmatic),
            },
        ))
    }

    /// Apply one event. `current_order` is the document's content order and
    /// is only read by `Start`.
    pub fn handle(
        &mut self,
        event: &DragEvent,
        current_order: &[OrderSlot],
    ) -> Result<DragTransition, DragMachineError> {
        let from = self.state.phase();
        let effect = match (&mut self.state, event) {
            (DragState::Dragging(session), DragEvent::Start { .. }) => {
                return Err(DragMachineError::SessionActive {
                    active: session.active_id.clone(),
                });
            }
            (DragState::Idle, DragEvent::Start { active }) => {
                if !current_order.iter().any(|slot| &slot.item_id == active) {
                    return Err(DragMachineError::UnknownItem {
                        item: active.clone(),
                    });
                }
                self.state = DragState::Dragging(DragSession {
                    active_id: active.clone(),
                    over_id: None,
                    original_order: current_order.to_vec(),
                    preview_order: current_order.to_vec(),
                    started_transition: self.transition_counter.saturating_add(1),
                });
                DragEffect::Started {
                    active: active.clone(),
                }
            }
            (DragState::Idle, _) => DragEffect::Noop {
                reason: DragNoopReason::IdleWithoutSession,
            },
            (DragState::Dragging(session), DragEvent::Over { active, over }) => {
                update_preview(session, active, over.as_ref())
            }
            (DragState::Dragging(session), DragEvent::End { active, over }) => {
                if &session.active_id != active {
                    DragEffect::Noop {
                        reason: DragNoopReason::ActiveMismatch,
                    }
                } else {
                    let effect = finish(session, over.as_ref());
                    self.state = DragState::Idle;
                    effect
                }
            }
            (DragState::Dragging(session), DragEvent::Cancel { reason }) => {
                let active = session.active_id.clone();
                self.state = DragState::Idle;
                DragEffect::Cancelled {
                    active,
                    cause: DragCancelCause::Requested(*reason),
                }
            }
        };
        Ok(self.emit(from, effect))
    }

    fn emit(&mut self, from: DragPhase, effect: DragEffect) -> DragTransition {
        self.transition_counter = self.transition_counter.saturating_add(1);
        let transition = DragTransition {
            transition_id: self.transition_counter,
            from,
            to: self.state.phase(),
            effect,
        };
        debug!(
            target: "dashgrid.drag",
            transition_id = transition.transition_id,
            from = ?transition.from,
            to = ?transition.to,
            effect = ?transition.effect,
            "drag transition"
        );
        transition
    }
}

fn update_preview(session: &mut DragSession, active: &ItemId, over: Option<&ItemId>) -> DragEffect {
    if &session.active_id != active {
        return DragEffect::Noop {
            reason: DragNoopReason::ActiveMismatch,
        };
    }
    let Some(over) = over else {
        session.over_id = None;
        session.preview_order = session.original_order.clone();
        return DragEffect::PreviewUpdated {
            active: active.clone(),
            over: None,
            order: session.preview_order.clone(),
        };
    };
    if over == active {
        return DragEffect::Noop {
            reason: DragNoopReason::OverSelf,
        };
    }
    let Some(order) = reorder(&session.original_order, active, over) else {
        return DragEffect::Noop {
            reason: DragNoopReason::UnknownTarget,
        };
    };
    session.over_id = Some(over.clone());
    session.preview_order = order;
    DragEffect::PreviewUpdated {
        active: active.clone(),
        over: Some(over.clone()),
        order: session.preview_order.clone(),
    }
}

fn finish(session: &DragSession, over: Option<&ItemId>) -> DragEffect {
    let active = session.active_id.clone();
    let cancelled = |cause| DragEffect::Cancelled {
        active: active.clone(),
        cause,
    };
    let Some(over) = over else {
        return cancelled(DragCancelCause::DropOutside);
    };
    if over == &session.active_id {
        return cancelled(DragCancelCause::NoMovement);
    }
    let Some(order) = reorder(&session.original_order, &session.active_id, over) else {
        return cancelled(DragCancelCause::DropOutside);
    };
    if order == session.original_order {
        return cancelled(DragCancelCause::NoMovement);
    }
    let Some(slot) = order.iter().find(|slot| slot.item_id == session.active_id) else {
        return cancelled(DragCancelCause::DropOutside);
    };
    let target_row = slot.row_id.clone();
    let target_index = order
        .iter()
        .filter(|slot| slot.row_id == target_row)
        .position(|slot| slot.item_id == session.active_id)
        .unwrap_or(0);
    DragEffect::Committed(DragCommit {
        item: session.active_id.clone(),
        target_row,
        target_index,
        order,
    })
}

/// Move `active` to `over`'s position; the active item adopts `over`'s row.
fn reorder(original: &[OrderSlot], active: &ItemId, over: &ItemId) -> Option<Vec<OrderSlot>> {
    let from = original.iter().position(|slot| &slot.item_id == active)?;
    let to = original.iter().position(|slot| &slot.item_id == over)?;
    let target_row = original[to].row_id.clone();
    let mut order = array_move(original, from, to);
    if let Some(slot) = order.get_mut(to) {
        slot.row_id = target_row;
    }
    Some(order)
}

/// Remove the element at `from` and reinsert it at `to`.
#[must_use]
pub fn array_move<T: Clone>(items: &[T], from: usize, to: usize) -> Vec<T> {
    let mut moved = items.to_vec();
    if from >= moved.len() || to >= moved.len() {
        return moved;
    }
    let item = moved.remove(from);
    moved.insert(to, item);
    moved
}

/// A candidate drop zone in pixel space.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DropTarget {
    pub id: ItemId,
    pub rect: PixelRect,
}

/// Closest-center drop-target resolution.
///
/// Only targets containing the pointer qualify; among those the one whose
/// center is nearest wins, ties going to the earliest target.
#[must_use]
pub fn closest_center(pointer: (f64, f64), targets: &[DropTarget]) -> Option<&ItemId> {
    let mut best: Option<(&DropTarget, f64)> = None;
    for target in targets.iter().filter(|target| target.rect.contains(pointer)) {
        let (cx, cy) = target.rect.center();
        let distance = (cx - pointer.0).powi(2) + (cy - pointer.1).powi(2);
        if best.is_none_or(|(_, current)| distance < current) {
            best = Some((target, distance));
        }
    }
    best.map(|(target, _)| &target.id)
}
