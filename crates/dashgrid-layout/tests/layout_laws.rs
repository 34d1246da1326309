//! Property tests for geometry and mutation laws.
//!
//! Documents are generated as rows of items packed left to right into
//! 24-column bands, so every generated document is valid by construction.

use dashgrid_layout::{
    Breakpoint, BreakpointSpec, BreakpointTable, CollapseState, DashboardDocument, GridConfig,
    ItemId, ItemPlacement, Reference, Row, RowId, compute_boxes, layout_sections,
};
use proptest::prelude::*;

/// `(width, height)` per item, per row.
fn row_shapes() -> impl Strategy<Value = Vec<Vec<(i32, i32)>>> {
    prop::collection::vec(prop::collection::vec((1i32..=24, 1i32..=8), 0..6), 1..4)
}

fn build(shapes: &[Vec<(i32, i32)>], collapsible: bool) -> DashboardDocument {
    let rows = shapes.iter().enumerate().map(|(row_index, items)| {
        let mut row = Row::new(format!("row-{row_index}").as_str());
        if collapsible {
            row = row.with_title(format!("Row {row_index}")).collapsible(true);
        }
        let (mut x, mut y, mut band) = (0i32, 0i32, 0i32);
        for (item_index, (width, height)) in items.iter().copied().enumerate() {
            if x + width > 24 {
                x = 0;
                y += band;
                band = 0;
            }
            row = row.with_item(ItemPlacement::new(
                format!("i{row_index}-{item_index}"),
                x,
                y,
                width,
                height,
                Reference::new_panel(),
            ));
            x += width;
            band = band.max(height);
        }
        row
    });
    DashboardDocument::new(rows, []).unwrap()
}

fn breakpoints() -> impl Strategy<Value = Breakpoint> {
    prop::sample::select(Breakpoint::ALL.to_vec())
}

/// Default grid, or one whose wider tiers use column counts other than the
/// 24-column design grid so edges get scaled.
fn grid_configs() -> impl Strategy<Value = GridConfig> {
    let columns = prop::sample::select(vec![6u32, 12, 18, 24, 36]);
    prop_oneof![
        Just(GridConfig::default()),
        prop::collection::vec(columns, 4).prop_map(|columns| GridConfig {
            breakpoints: BreakpointTable::new([
                BreakpointSpec::new(Breakpoint::Lg, 1200, columns[0]),
                BreakpointSpec::new(Breakpoint::Md, 996, columns[1]),
                BreakpointSpec::new(Breakpoint::Sm, 768, columns[2]),
                BreakpointSpec::new(Breakpoint::Xs, 480, columns[3]),
                BreakpointSpec::new(Breakpoint::Xxs, 0, 12),
            ]),
            ..GridConfig::default()
        }),
    ]
}

proptest! {
    #[test]
    fn one_box_per_item_and_no_overlap(
        shapes in row_shapes(),
        breakpoint in breakpoints(),
        config in grid_configs(),
    ) {
        let doc = build(&shapes, false);
        let columns = config.columns(breakpoint).unwrap();
        for row in doc.rows() {
            let boxes = compute_boxes(&row.items, breakpoint, &config).unwrap();
            prop_assert_eq!(boxes.len(), row.items.len());
            for grid in &boxes {
                prop_assert!(grid.width >= 1 && grid.right() <= columns, "{:?}", grid);
            }
            for (index, first) in boxes.iter().enumerate() {
                for second in &boxes[index + 1..] {
                    prop_assert!(!first.overlaps(second), "{:?} overlaps {:?}", first, second);
                }
            }
        }
    }

    #[test]
    fn stacked_sections_never_overlap(
        shapes in row_shapes(),
        breakpoint in breakpoints(),
        config in grid_configs(),
    ) {
        let doc = build(&shapes, true);
        let placed = layout_sections(doc.rows(), &CollapseState::new(), breakpoint, &config)
            .unwrap();
        for (index, first) in placed.iter().enumerate() {
            for second in &placed[index + 1..] {
                prop_assert!(!first.grid.overlaps(&second.grid));
            }
        }
    }

    #[test]
    fn insert_then_remove_is_identity(
        shapes in row_shapes(),
        row_pick in any::<prop::sample::Index>(),
        index_pick in any::<prop::sample::Index>(),
        width in 1i32..=24,
        height in 1i32..=8,
    ) {
        let doc = build(&shapes, false);
        let rows: Vec<&Row> = doc.rows().collect();
        let row = rows[row_pick.index(rows.len())];
        let index = index_pick.index(row.items.len() + 1);
        let below = row.items.iter().map(ItemPlacement::bottom).max().unwrap_or(0);
        let placement = ItemPlacement::new(
            "fresh",
            0,
            i32::try_from(below).unwrap(),
            width,
            height,
            Reference::new_panel(),
        );
        let inserted = doc.insert_item(&row.id, index, placement).unwrap().document;
        let removed = inserted.remove_item(&ItemId::from("fresh")).unwrap().document;
        prop_assert_eq!(&removed, &doc);
        prop_assert_eq!(removed.version(), doc.version() + 2);
    }

    #[test]
    fn move_and_move_back_restores_row_order(
        shapes in row_shapes(),
        row_pick in any::<prop::sample::Index>(),
        item_pick in any::<prop::sample::Index>(),
        target_pick in any::<prop::sample::Index>(),
    ) {
        let doc = build(&shapes, false);
        let rows: Vec<&Row> = doc.rows().collect();
        let row = rows[row_pick.index(rows.len())];
        prop_assume!(!row.items.is_empty());
        let original_index = item_pick.index(row.items.len());
        let item = row.items[original_index].id.clone();
        let target = target_pick.index(row.items.len());

        let moved = doc.move_item(&item, &row.id, target).unwrap().document;
        prop_assert_eq!(moved.row(&row.id).unwrap().position(&item), Some(target));
        let back = moved.move_item(&item, &row.id, original_index).unwrap().document;
        prop_assert_eq!(back.row(&row.id).unwrap(), row);
    }

    #[test]
    fn toggling_twice_restores_flag_and_leaves_other_rows(
        shapes in row_shapes(),
        row_pick in any::<prop::sample::Index>(),
    ) {
        let doc = build(&shapes, true);
        let rows: Vec<&Row> = doc.rows().collect();
        let target: RowId = rows[row_pick.index(rows.len())].id.clone();

        let once = doc.toggle_row(&target).unwrap().document;
        let twice = once.toggle_row(&target).unwrap().document;
        prop_assert_eq!(&twice, &doc);
        for row in once.rows().filter(|row| row.id != target) {
            prop_assert_eq!(Some(row), doc.row(&row.id));
        }
    }

    #[test]
    fn non_positive_sizes_never_reach_geometry(width in -4i32..=0, height in -4i32..=8) {
        let item = ItemPlacement::new("bad", 0, 0, width, height, Reference::new_panel());
        prop_assert!(compute_boxes(&[item], Breakpoint::Lg, &GridConfig::default()).is_err());
    }
}
