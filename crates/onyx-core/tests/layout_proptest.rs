#![forbid(unsafe_code)]

//! Property tests for placement splicing and span tables.

use proptest::prelude::*;

use onyx_core::{
    Breakpoint, GRID_COLUMNS, GridSpan, Layout, Timestamp, WidgetPlacement, WidgetSize, splice_move,
};

fn size_strategy() -> impl Strategy<Value = WidgetSize> {
    prop::sample::select(WidgetSize::ALL.to_vec())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn splice_move_lands_item_at_target(len in 1usize..20, from in 0usize..20, to in 0usize..20) {
        let mut items: Vec<usize> = (0..len).collect();
        let moved = splice_move(&mut items, from, to);
        if from < len && to < len {
            prop_assert!(moved);
            prop_assert_eq!(items[to], from);
            let mut sorted = items.clone();
            sorted.sort_unstable();
            prop_assert_eq!(sorted, (0..len).collect::<Vec<_>>());
        } else {
            prop_assert!(!moved);
            prop_assert_eq!(items, (0..len).collect::<Vec<_>>());
        }
    }

    #[test]
    fn spans_never_exceed_grid(size in size_strategy()) {
        let span = GridSpan::for_size(size);
        for bp in [Breakpoint::Narrow, Breakpoint::Medium, Breakpoint::Wide] {
            prop_assert!(span.at(bp) >= 1 && span.at(bp) <= GRID_COLUMNS);
        }
        prop_assert_eq!(span.at(Breakpoint::Narrow), GRID_COLUMNS);
        prop_assert!(span.at(Breakpoint::Medium) >= span.at(Breakpoint::Wide));
    }

    #[test]
    fn dedupe_keeps_first_occurrence(ids in prop::collection::vec(0u8..6, 0..24)) {
        let mut layout = Layout::new("l", "L", Timestamp(0))
            .with_widgets(ids.iter().map(|i| WidgetPlacement::new(format!("W{i}"))));
        layout.dedupe_widgets();
        let mut expected: Vec<String> = Vec::new();
        for i in &ids {
            let id = format!("W{i}");
            if !expected.contains(&id) {
                expected.push(id);
            }
        }
        let got: Vec<String> = layout.widgets.iter().map(|p| p.i.to_string()).collect();
        prop_assert_eq!(got, expected);
    }
}
