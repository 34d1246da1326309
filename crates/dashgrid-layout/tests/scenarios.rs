//! End-to-end engine scenarios: load, render, drag, add panel, resolve.

use std::cell::RefCell;
use std::rc::Rc;

use dashgrid_layout::{
    Breakpoint, DashboardDocument, DashboardSpec, DocumentError, DragEvent, EngineError,
    EngineEvent, GridConfig, ItemId, LayoutEngine, LayoutOperation, PanelDefinition,
    RenderContent, RenderItem, ResolutionError, RowId, RowState,
};

const DASHBOARD: &str = r##"{
    "duration": "1h",
    "layouts": [
        { "kind": "Grid", "spec": {
            "display": { "title": "Overview", "collapse": { "open": true } },
            "items": [
                { "id": "P1", "x": 0, "y": 0, "width": 12, "height": 6, "content": { "$ref": "#/spec/panels/cpu" } },
                { "id": "P2", "x": 12, "y": 0, "width": 12, "height": 6, "content": { "$ref": "#/spec/panels/mem" } }
            ] } },
        { "kind": "Grid", "spec": {
            "items": [
                { "id": "P3", "x": 0, "y": 0, "width": 8, "height": 4, "content": { "$ref": "#/spec/panels/disk" } },
                { "id": "P4", "x": 8, "y": 0, "width": 8, "height": 4, "content": { "$ref": "#/spec/panels/missing" } }
            ] } }
    ],
    "panels": {
        "cpu": { "kind": "LineChart", "display": { "name": "CPU" }, "options": { "queries": [] } },
        "mem": { "kind": "LineChart", "display": { "name": "Memory" }, "options": { "queries": [] } },
        "disk": { "kind": "GaugeChart", "display": { "name": "Disk" }, "options": { "query": "disk" } }
    }
}"##;

fn engine() -> LayoutEngine {
    let spec: DashboardSpec = serde_json::from_str(DASHBOARD).unwrap();
    let document = DashboardDocument::from_spec(spec).unwrap();
    LayoutEngine::new(document, GridConfig::default()).unwrap()
}

fn find<'a>(items: &'a [RenderItem], id: &str) -> &'a RenderItem {
    items
        .iter()
        .find(|item| item.id.as_str() == id)
        .unwrap_or_else(|| panic!("missing render item {id}"))
}

#[test]
fn two_items_render_side_by_side_on_lg() {
    let engine = engine();
    let items = engine.render(Breakpoint::Lg).unwrap();
    let p1 = find(&items, "P1");
    let p2 = find(&items, "P2");
    assert_eq!((p1.grid.x, p1.grid.width), (0, 12));
    assert_eq!((p2.grid.x, p2.grid.width), (12, 12));
    assert!(!p1.grid.overlaps(&p2.grid));
    assert_eq!(p1.grid.y, p2.grid.y);
}

#[test]
fn drag_over_then_drop_reorders_and_bumps_version() {
    let mut engine = engine();
    engine.set_edit_mode(true);
    let before = engine.document().version();

    engine
        .handle_drag(&DragEvent::Start { active: "P1".into() })
        .unwrap();
    engine
        .handle_drag(&DragEvent::Over {
            active: "P1".into(),
            over: Some("P2".into()),
        })
        .unwrap();
    let outcome = engine
        .handle_drag(&DragEvent::End {
            active: "P1".into(),
            over: Some("P2".into()),
        })
        .unwrap();

    assert!(outcome.committed.is_some());
    assert!(outcome.rejected.is_none());
    let doc = engine.document();
    assert_eq!(doc.version(), before + 1);
    let row = doc.row(&RowId::from("row-0")).unwrap();
    let order: Vec<&str> = row.items.iter().map(|item| item.id.as_str()).collect();
    assert_eq!(order, ["P2", "P1"]);
}

#[test]
fn new_panel_stays_a_placeholder_until_assigned() {
    let mut engine = engine();
    engine.set_edit_mode(true);
    let item = engine.add_new_panel(None).unwrap();

    let items = engine.render(Breakpoint::Lg).unwrap();
    let placeholder = find(&items, item.as_str());
    assert_eq!(placeholder.content, RenderContent::NewPanel);
    assert_eq!((placeholder.grid.width, placeholder.grid.height), (12, 6));

    let key = engine
        .assign_new_panel(&item, PanelDefinition::new("EmptyChart", "New Panel"))
        .unwrap();
    let items = engine.render(Breakpoint::Lg).unwrap();
    match &find(&items, item.as_str()).content {
        RenderContent::Panel { key: resolved, definition } => {
            assert_eq!(resolved, &key);
            assert_eq!(definition.display.name, "New Panel");
        }
        other => panic!("expected resolved panel, got {other:?}"),
    }
}

#[test]
fn unresolved_reference_is_contained_to_its_item() {
    let engine = engine();
    let items = engine.render(Breakpoint::Lg).unwrap();
    assert!(matches!(
        &find(&items, "P4").content,
        RenderContent::Unresolved(ResolutionError::UnknownPanel { key, .. }) if key == "missing"
    ));
    for id in ["P1", "P2", "P3"] {
        assert!(matches!(find(&items, id).content, RenderContent::Panel { .. }));
    }
}

#[test]
fn narrow_width_stacks_items_full_width() {
    let engine = engine();
    let items = engine.render_for_width(400).unwrap();
    let p1 = find(&items, "P1");
    let p2 = find(&items, "P2");
    assert_eq!((p1.grid.x, p1.grid.width), (0, 12));
    assert_eq!(p2.grid.y, p1.grid.bottom());
    let pixels = p1.pixels.unwrap();
    assert!(pixels.width > 0.0);
}

#[test]
fn collapsing_a_row_hides_items_and_shifts_following_rows() {
    let mut engine = engine();
    let open = engine.render(Breakpoint::Lg).unwrap();
    let p3_open = find(&open, "P3").grid.y;

    let state = engine.toggle_row(&"row-0".into()).unwrap();
    assert_eq!(state, RowState::Closed);
    let closed = engine.render(Breakpoint::Lg).unwrap();
    assert!(closed.iter().all(|item| item.id.as_str() != "P1"));
    assert_eq!(find(&closed, "P3").grid.y, p3_open - 6);
    assert_eq!(engine.document().version(), 0);

    assert_eq!(
        engine.toggle_row(&"row-1".into()),
        Err(EngineError::RowNotCollapsible { row: "row-1".into() })
    );
}

#[test]
fn edits_require_edit_mode() {
    let mut engine = engine();
    assert_eq!(
        engine.handle_drag(&DragEvent::Start { active: "P1".into() }),
        Err(EngineError::NotEditing)
    );
    assert_eq!(
        engine.apply(&LayoutOperation::RemoveItem { item: "P1".into() }),
        Err(EngineError::NotEditing)
    );
}

#[test]
fn leaving_edit_mode_cancels_drag() {
    let mut engine = engine();
    engine.set_edit_mode(true);
    engine
        .handle_drag(&DragEvent::Start { active: "P3".into() })
        .unwrap();
    engine.set_edit_mode(false);
    assert!(matches!(
        engine.drag_state(),
        dashgrid_layout::DragState::Idle
    ));
    assert_eq!(engine.document().version(), 0);
}

#[test]
fn drop_outside_every_target_is_invalid() {
    let mut engine = engine();
    engine.set_edit_mode(true);
    let targets = engine.drop_targets(1300).unwrap();
    engine
        .handle_drag(&DragEvent::Start { active: "P1".into() })
        .unwrap();
    let err = engine
        .drop_at(&"P1".into(), (-50.0, -50.0), &targets)
        .unwrap_err();
    assert_eq!(err, EngineError::InvalidDragTarget { active: "P1".into() });
    assert!(matches!(engine.drag_state(), dashgrid_layout::DragState::Idle));
    assert_eq!(engine.document().version(), 0);
}

#[test]
fn drop_on_target_center_commits() {
    let mut engine = engine();
    engine.set_edit_mode(true);
    let targets = engine.drop_targets(1300).unwrap();
    let p2 = targets
        .iter()
        .find(|target| target.id.as_str() == "P2")
        .unwrap()
        .rect
        .center();
    engine
        .handle_drag(&DragEvent::Start { active: "P1".into() })
        .unwrap();
    let outcome = engine.drop_at(&"P1".into(), p2, &targets).unwrap();
    assert!(outcome.committed.is_some());
}

#[test]
fn undo_and_redo_walk_committed_versions() {
    let mut engine = engine();
    engine.set_edit_mode(true);
    engine
        .apply(&LayoutOperation::RemoveItem { item: "P3".into() })
        .unwrap();
    assert!(engine.document().item(&ItemId::from("P3")).is_none());

    assert_eq!(engine.undo().unwrap(), Some(0));
    assert!(engine.document().item(&ItemId::from("P3")).is_some());
    assert_eq!(engine.redo().unwrap(), Some(1));
    assert!(engine.document().item(&ItemId::from("P3")).is_none());
    assert_eq!(engine.redo().unwrap(), None);
}

#[test]
fn subscribers_see_engine_events() {
    let mut engine = engine();
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    let guard = engine.subscribe(move |event| sink.borrow_mut().push(event.clone()));

    engine.set_edit_mode(true);
    engine
        .apply(&LayoutOperation::ResizeItem {
            item: "P3".into(),
            width: 8,
            height: 5,
        })
        .unwrap();
    drop(guard);
    engine.set_edit_mode(false);

    let seen = seen.borrow();
    assert_eq!(seen.len(), 2);
    assert_eq!(seen[0], EngineEvent::EditModeChanged { editing: true });
    assert!(matches!(seen[1], EngineEvent::DocumentChanged { version: 1, .. }));
}

#[test]
fn document_round_trips_through_json_after_edits() {
    let mut engine = engine();
    engine.set_edit_mode(true);
    engine
        .apply(&LayoutOperation::MoveItem {
            item: "P3".into(),
            target_row: "row-1".into(),
            target_index: 1,
        })
        .unwrap();
    let spec = engine.document().to_spec();
    let json = serde_json::to_string(&spec).unwrap();
    let reparsed: DashboardSpec = serde_json::from_str(&json).unwrap();
    let reloaded = DashboardDocument::from_spec(reparsed).unwrap();
    assert_eq!(&reloaded, engine.document().as_ref());
    assert_eq!(reloaded.duration(), Some("1h"));
}

#[test]
fn commits_after_undo_get_fresh_versions() {
    let mut engine = engine();
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    let _guard = engine.subscribe(move |event| {
        if let EngineEvent::DocumentChanged { version, .. } = event {
            sink.borrow_mut().push(*version);
        }
    });

    engine.set_edit_mode(true);
    engine
        .apply(&LayoutOperation::RemoveItem { item: "P3".into() })
        .unwrap();
    assert_eq!(engine.undo().unwrap(), Some(0));
    let outcome = engine
        .apply(&LayoutOperation::RemoveItem { item: "P4".into() })
        .unwrap();
    assert_eq!(outcome.document.version(), 2);
    assert_eq!(engine.document().version(), 2);
    assert_eq!(engine.redo().unwrap(), None);

    engine.undo().unwrap();
    engine
        .handle_drag(&DragEvent::Start { active: "P1".into() })
        .unwrap();
    let dropped = engine
        .handle_drag(&DragEvent::End {
            active: "P1".into(),
            over: Some("P2".into()),
        })
        .unwrap();
    assert_eq!(dropped.committed.map(|applied| applied.document.version()), Some(3));
    assert_eq!(*seen.borrow(), [1, 2, 3]);
}

#[test]
fn render_ids_are_unique_across_headers_and_items() {
    let engine = engine();
    for breakpoint in Breakpoint::ALL {
        let items = engine.render(breakpoint).unwrap();
        let mut ids: Vec<&str> = items.iter().map(|item| item.id.as_str()).collect();
        let total = ids.len();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), total, "duplicate ids on {breakpoint}");
    }
}

#[test]
fn item_ids_in_the_header_namespace_are_refused_on_load() {
    let json = DASHBOARD.replace(r#""id": "P1""#, r#""id": "row-0:header""#);
    let spec: DashboardSpec = serde_json::from_str(&json).unwrap();
    assert_eq!(
        DashboardDocument::from_spec(spec),
        Err(DocumentError::ReservedItemId {
            item: "row-0:header".into()
        })
    );
}
