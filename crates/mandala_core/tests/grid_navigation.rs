use mandala_core::{GridPos, GridSlot, MandalaChart, ROOT_CELL_ID};

fn center_flagged_ids(chart: &MandalaChart) -> Vec<String> {
    chart
        .cells()
        .filter(|cell| cell.is_center_topic)
        .map(|cell| cell.id.clone())
        .collect()
}

fn assert_single_center(chart: &MandalaChart) {
    assert_eq!(
        center_flagged_ids(chart),
        vec![chart.active_center_id().to_string()]
    );
    for cell in chart.cells() {
        assert_eq!(cell.is_expandable, !cell.is_center_topic, "cell {}", cell.id);
    }
}

#[test]
fn current_grid_after_initialize_shows_root_and_sub_themes() {
    let chart = MandalaChart::initialize();
    let grid = chart.current_grid();

    assert_eq!(grid.center_id, ROOT_CELL_ID);
    assert_eq!(grid.center().unwrap().text, "Main Theme");
    for (pos, slot) in grid.iter() {
        let cell = slot.cell().unwrap();
        if pos.is_center() {
            assert_eq!(cell.id, ROOT_CELL_ID);
        } else {
            assert_eq!(cell.id, format!("main_center_{}_{}", pos.row(), pos.col()));
            assert_eq!(cell.text, format!("Sub-theme {}", pos.ordinal()));
            assert!(cell.is_expandable);
        }
    }
}

#[test]
fn expand_materializes_items_and_moves_center() {
    let mut chart = MandalaChart::initialize();
    assert!(chart.expand("main_center_0_0"));

    assert_eq!(chart.active_center_id(), "main_center_0_0");
    assert_eq!(chart.cell_count(), 17);

    let grid = chart.current_grid();
    assert_eq!(grid.center().unwrap().id, "main_center_0_0");
    let east = grid.slot(GridPos::new(1, 2).unwrap()).cell().unwrap();
    assert_eq!(east.id, "main_center_0_0_1_2");
    assert_eq!(east.text, "Item 6");
    assert_eq!(east.parent_id.as_deref(), Some("main_center_0_0"));

    let root = chart.cell(ROOT_CELL_ID).unwrap();
    assert!(!root.is_center_topic);
    assert!(root.is_expandable);
    assert_single_center(&chart);
}

#[test]
fn expand_then_go_back_restores_previous_state() {
    let mut chart = MandalaChart::initialize();
    chart.expand("main_center_2_1");
    let before = chart.clone();

    assert!(chart.expand("main_center_2_1_0_0"));
    assert!(chart.go_back());

    assert_eq!(chart.active_center_id(), before.active_center_id());
    let restored = chart.cell("main_center_2_1").unwrap();
    let original = before.cell("main_center_2_1").unwrap();
    assert_eq!(restored.is_center_topic, original.is_center_topic);
    assert_eq!(restored.is_expandable, original.is_expandable);
    assert_eq!(chart.current_grid(), before.current_grid());
    assert_single_center(&chart);
}

#[test]
fn expand_rejects_active_center_and_unknown_ids() {
    let mut chart = MandalaChart::initialize();
    let before = chart.clone();

    assert!(!chart.expand(ROOT_CELL_ID));
    assert!(!chart.expand("main_center_9_9"));
    assert!(!chart.expand("main_center_0_0_0_0"));
    assert_eq!(chart, before);
}

#[test]
fn go_back_at_root_is_noop() {
    let mut chart = MandalaChart::initialize();
    let before = chart.clone();

    assert!(!chart.go_back());
    assert!(!chart.go_to_root());
    assert_eq!(chart, before);
    assert_eq!(chart.active_center_id(), ROOT_CELL_ID);
}

#[test]
fn go_to_root_jumps_from_any_depth() {
    let mut chart = MandalaChart::initialize();
    chart.expand("main_center_0_2");
    chart.expand("main_center_0_2_2_2");
    chart.expand("main_center_0_2_2_2_1_0");
    assert_eq!(chart.breadcrumb().len(), 4);

    assert!(chart.go_to_root());
    assert_eq!(chart.active_center_id(), ROOT_CELL_ID);
    assert!(chart.cell("main_center_0_2_2_2_1_0").unwrap().is_expandable);
    assert_single_center(&chart);

    let grid = chart.current_grid();
    assert!(grid.iter().all(|(_, slot)| !slot.is_empty()));
}

#[test]
fn deep_children_use_item_placeholders() {
    let mut chart = MandalaChart::initialize();
    chart.expand("main_center_1_0");
    chart.expand("main_center_1_0_0_1");

    let grid = chart.current_grid();
    let slot = grid.slot(GridPos::new(2, 2).unwrap());
    assert!(matches!(slot, GridSlot::Cell(cell) if cell.text == "Item 9"));
}

#[test]
fn exactly_one_center_across_navigation_sequence() {
    let mut chart = MandalaChart::initialize();
    let targets: Vec<String> = GridPos::surrounding()
        .map(|pos| format!("main_center_{}_{}", pos.row(), pos.col()))
        .collect();

    for (step, target) in targets.iter().enumerate() {
        chart.expand(target);
        assert_single_center(&chart);

        let nested = format!("{target}_{}_{}", step % 3, if step % 3 == 1 { 0 } else { 1 });
        chart.expand(&nested);
        assert_single_center(&chart);

        if step % 2 == 0 {
            chart.go_back();
        } else {
            chart.go_to_root();
        }
        assert_single_center(&chart);

        chart.go_back();
        assert_single_center(&chart);
    }
    assert!(chart.validate().is_ok());
}

#[test]
fn navigating_up_never_removes_cells() {
    let mut chart = MandalaChart::initialize();
    chart.expand("main_center_2_2");
    chart.expand("main_center_2_2_0_0");
    let count = chart.cell_count();

    chart.go_back();
    chart.go_to_root();
    assert_eq!(chart.cell_count(), count);
    assert!(chart.cell("main_center_2_2_0_0_1_2").is_some());
}

#[test]
fn expanding_ancestor_directly_keeps_tree_consistent() {
    let mut chart = MandalaChart::initialize();
    chart.expand("main_center_0_1");
    chart.expand("main_center_0_1_2_0");

    assert!(chart.expand("main_center_0_1"));
    assert_eq!(chart.active_center_id(), "main_center_0_1");
    assert_eq!(chart.cell_count(), 25);
    assert_single_center(&chart);
}

#[test]
fn current_grid_shows_empty_slot_for_missing_child() {
    let mut chart = MandalaChart::initialize();
    chart.expand("main_center_0_0");
    let mut value = serde_json::to_value(&chart).unwrap();
    value["cells"]
        .as_object_mut()
        .unwrap()
        .remove("main_center_0_0_2_1");

    let chart = MandalaChart::from_json(&value.to_string()).unwrap();
    let grid = chart.current_grid();
    assert_eq!(grid.center_id, "main_center_0_0");
    assert!(grid.slot(GridPos::new(2, 1).unwrap()).is_empty());
    assert!(matches!(
        grid.slot(GridPos::new(2, 2).unwrap()),
        GridSlot::Cell(cell) if cell.id == "main_center_0_0_2_2"
    ));
}

#[test]
fn expanding_root_recreates_missing_sub_theme() {
    let mut value = serde_json::to_value(MandalaChart::initialize()).unwrap();
    value["cells"]
        .as_object_mut()
        .unwrap()
        .remove("main_center_1_0");

    let mut chart = MandalaChart::from_json(&value.to_string()).unwrap();
    assert!(chart.current_grid().slot(GridPos::new(1, 0).unwrap()).is_empty());

    assert!(chart.expand("main_center_0_0"));
    assert!(chart.expand(ROOT_CELL_ID));

    let recreated = chart.cell("main_center_1_0").unwrap();
    assert_eq!(recreated.text, "Sub-theme 4");
    assert_eq!(recreated.parent_id.as_deref(), Some(ROOT_CELL_ID));
    assert_eq!(chart.cell_count(), 17);
    assert_single_center(&chart);
}
