#![no_main]

use dashgrid_layout::{
    Breakpoint, DashboardDocument, DashboardSpec, GridConfig, LayoutEngine, RenderContent,
};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if data.len() > 8192 {
        return;
    }
    let Ok(spec) = serde_json::from_slice::<DashboardSpec>(data) else {
        return;
    };
    let Ok(document) = DashboardDocument::from_spec(spec) else {
        return;
    };
    // Invalid geometry is rejected up front; anything accepted must lay out.
    let Ok(engine) = LayoutEngine::new(document, GridConfig::default()) else {
        return;
    };

    for breakpoint in Breakpoint::ALL {
        let items = engine.render(breakpoint).expect("accepted document must render");
        for (index, first) in items.iter().enumerate() {
            for second in &items[index + 1..] {
                assert!(
                    !first.grid.overlaps(&second.grid),
                    "{breakpoint}: {:?} overlaps {:?}",
                    first.grid,
                    second.grid
                );
            }
        }
        let unresolved = items
            .iter()
            .filter(|item| matches!(item.content, RenderContent::Unresolved(_)))
            .count();
        assert!(unresolved <= engine.document().integrity_report().len());
    }

    for width in [0, 320, 800, 1920] {
        let _ = engine.render_for_width(width).expect("width render");
    }

    let round_trip = DashboardDocument::from_spec(engine.document().to_spec())
        .expect("emitted spec must load");
    assert_eq!(&round_trip.with_design_columns(24), engine.document().as_ref());
});
