#![no_main]

use arbitrary::Arbitrary;
use dashgrid_layout::{
    DashboardDocument, ItemId, ItemPlacement, LayoutOperation, PanelDefinition, Reference, Row,
    RowId,
};
use libfuzzer_sys::fuzz_target;

const ROWS: [&str; 3] = ["a", "b", "c"];
const ITEMS: [&str; 6] = ["p0", "p1", "p2", "p3", "p4", "fresh"];

#[derive(Debug, Arbitrary)]
enum Op {
    Insert { row: u8, index: u8, x: i8, y: i8, w: i8, h: i8 },
    Remove { item: u8 },
    Move { item: u8, row: u8, index: u8 },
    Resize { item: u8, w: i8, h: i8 },
    Reposition { item: u8, x: i8, y: i8 },
    Toggle { row: u8 },
}

fn row(pick: u8) -> RowId {
    RowId::from(ROWS[usize::from(pick) % ROWS.len()])
}

fn item(pick: u8) -> ItemId {
    ItemId::from(ITEMS[usize::from(pick) % ITEMS.len()])
}

impl Op {
    fn to_operation(&self) -> LayoutOperation {
        match *self {
            Op::Insert { row: r, index, x, y, w, h } => LayoutOperation::InsertItem {
                row: row(r),
                index: usize::from(index % 8),
                placement: ItemPlacement::new(
                    "fresh",
                    i32::from(x),
                    i32::from(y),
                    i32::from(w),
                    i32::from(h),
                    Reference::panel("cpu"),
                ),
            },
            Op::Remove { item: i } => LayoutOperation::RemoveItem { item: item(i) },
            Op::Move { item: i, row: r, index } => LayoutOperation::MoveItem {
                item: item(i),
                target_row: row(r),
                target_index: usize::from(index % 8),
            },
            Op::Resize { item: i, w, h } => LayoutOperation::ResizeItem {
                item: item(i),
                width: i32::from(w),
                height: i32::from(h),
            },
            Op::Reposition { item: i, x, y } => LayoutOperation::RepositionItem {
                item: item(i),
                x: i32::from(x),
                y: i32::from(y),
            },
            Op::Toggle { row: r } => LayoutOperation::ToggleRow { row: row(r) },
        }
    }
}

fn base() -> DashboardDocument {
    let rows = [
        Row::new("a")
            .with_title("A")
            .collapsible(true)
            .with_item(ItemPlacement::new("p0", 0, 0, 12, 4, Reference::panel("cpu")))
            .with_item(ItemPlacement::new("p1", 12, 0, 12, 4, Reference::panel("cpu"))),
        Row::new("b").with_item(ItemPlacement::new("p2", 0, 0, 24, 6, Reference::new_panel())),
        Row::new("c")
            .with_title("C")
            .with_item(ItemPlacement::new("p3", 0, 0, 6, 3, Reference::panel("cpu")))
            .with_item(ItemPlacement::new("p4", 6, 0, 6, 3, Reference::panel("cpu"))),
    ];
    DashboardDocument::new(rows, [("cpu".to_string(), PanelDefinition::new("LineChart", "CPU"))])
        .expect("base document is valid")
}

fuzz_target!(|ops: Vec<Op>| {
    let mut doc = base();
    for op in ops.iter().take(64) {
        let before_hash = doc.state_hash();
        match doc.apply(&op.to_operation()) {
            Ok(outcome) => {
                assert_eq!(outcome.before_hash, before_hash);
                assert_eq!(outcome.document.version(), doc.version() + 1);
                outcome
                    .document
                    .validate_layout()
                    .expect("committed document must stay valid");
                doc = outcome.document;
            }
            Err(err) => {
                assert_eq!(err.before_hash, before_hash);
                assert_eq!(doc.state_hash(), before_hash);
            }
        }
    }
});
