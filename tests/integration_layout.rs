use std::cell::RefCell;
use std::rc::Rc;

use serde_json::json;
use term_dock::config::{Dimensions, ItemType};
use term_dock::{
    ComponentRegistry, EventKind, ItemConfig, LayoutConfig, LayoutError, LayoutManager, Rect,
};

fn flat() -> Dimensions {
    Dimensions {
        border_width: 0.0,
        ..Dimensions::default()
    }
}

fn build(config: LayoutConfig, width: f64) -> LayoutManager {
    let mut manager = LayoutManager::new(config, ComponentRegistry::permissive()).unwrap();
    manager.init(Rect::new(0.0, 0.0, width, 300.0)).unwrap();
    manager
}

#[test]
fn two_leaf_row_gets_a_stack_per_component() {
    let config = LayoutConfig::from_value(json!({
        "content": [{
            "type": "row",
            "content": [
                { "type": "component", "componentName": "a" },
                { "type": "component", "componentName": "b" }
            ]
        }]
    }))
    .unwrap();
    let m = build(config.with_dimensions(flat()), 400.0);
    let tree = m.tree();

    let row = tree.children(m.root())[0];
    assert_eq!(tree.item_type(row).unwrap(), ItemType::Row);
    for stack in tree.children(row) {
        assert_eq!(tree.item_type(*stack).unwrap(), ItemType::Stack);
        assert_eq!(tree.children(*stack).len(), 1);
        assert_eq!(tree.node(*stack).unwrap().state.width, Some(50.0));
    }
}

#[test]
fn splitter_drag_moves_forty_pixels() {
    let config = LayoutConfig::new(vec![ItemConfig::row(vec![
        ItemConfig::component("a"),
        ItemConfig::component("b"),
    ])])
    .with_dimensions(flat());
    let mut m = build(config, 400.0);
    let row = m.tree().children(m.root())[0];

    m.start_splitter_drag(row, 0, 200.0, 150.0).unwrap();
    assert_eq!(m.drag_splitter(240.0, 150.0).unwrap(), Some(40.0));
    m.stop_splitter_drag().unwrap();
    m.next_frame().unwrap();

    let children = m.tree().children(row).to_vec();
    let left = m.tree().node(children[0]).unwrap();
    let right = m.tree().node(children[1]).unwrap();
    assert!((left.state.width.unwrap() - 60.0).abs() < 1e-9);
    assert!((right.state.width.unwrap() - 40.0).abs() < 1e-9);
    assert_eq!(left.rect().width, 240.0);
    assert_eq!(right.rect().width, 160.0);
}

#[test]
fn splitter_drags_stop_at_the_minimum() {
    let config = LayoutConfig::new(vec![ItemConfig::row(vec![
        ItemConfig::component("a"),
        ItemConfig::component("b"),
    ])])
    .with_dimensions(Dimensions {
        min_item_width: 50.0,
        ..flat()
    });
    let mut m = build(config, 400.0);
    let row = m.tree().children(m.root())[0];
    m.start_splitter_drag(row, 0, 200.0, 150.0).unwrap();
    assert_eq!(m.drag_splitter(399.0, 150.0).unwrap(), Some(150.0));
}

#[test]
fn to_config_round_trip_is_stable() {
    let config = LayoutConfig::new(vec![ItemConfig::row(vec![
        ItemConfig::column(vec![
            ItemConfig::component("a").with_state(json!({"n": 1})),
            ItemConfig::stack(vec![
                ItemConfig::component("b").with_title("bee"),
                ItemConfig::component("c").with_id("charlie"),
            ]),
        ]),
        ItemConfig::component("d").with_closable(false),
    ])]);
    let first = build(config, 800.0).to_config().unwrap();
    let json = first.to_json_string().unwrap();
    let reloaded = LayoutConfig::from_json_str(&json).unwrap();
    assert_eq!(reloaded, first);

    let second = build(reloaded, 800.0).to_config().unwrap();
    assert_eq!(second, first);
}

#[test]
fn layouts_load_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("layout.json");
    std::fs::write(
        &path,
        r#"{"content":[{"type":"stack","content":[{"type":"component","componentName":"x"}]}]}"#,
    )
    .unwrap();
    let m = build(LayoutConfig::from_path(&path).unwrap(), 400.0);
    assert_eq!(m.tree().get_components_by_name(m.root(), "x").len(), 1);

    let broken = dir.path().join("broken.json");
    std::fs::write(&broken, r#"{"settings":{}}"#).unwrap();
    assert!(LayoutConfig::from_path(&broken).is_err());
    assert!(LayoutConfig::from_path(dir.path().join("missing.json")).is_err());
}

#[test]
fn unknown_components_fail_without_a_fallback() {
    let config = LayoutConfig::new(vec![ItemConfig::component("nope")]);
    let mut m = LayoutManager::new(config, ComponentRegistry::default()).unwrap();
    let err = m.init(Rect::new(0.0, 0.0, 100.0, 100.0)).unwrap_err();
    assert!(matches!(err, LayoutError::Configuration(_)));
}

#[test]
fn bursts_of_changes_are_one_state_change() {
    let config = LayoutConfig::new(vec![ItemConfig::row(vec![
        ItemConfig::component("a"),
        ItemConfig::component("b"),
    ])]);
    let mut m = build(config, 400.0);
    m.next_frame().unwrap();

    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    m.subscribe(None, move |event| sink.borrow_mut().push(event.kind));

    let a = m.tree().get_components_by_name(m.root(), "a")[0];
    let stack = m.tree().parent(a).unwrap();
    for i in 0..5 {
        m.tree_mut().set_title(a, format!("a{i}")).unwrap();
    }
    m.tree_mut()
        .add_child(stack, ItemConfig::component("e"), None)
        .unwrap();
    assert!(!seen.borrow().contains(&EventKind::StateChanged));

    m.next_frame().unwrap();
    let changes = seen
        .borrow()
        .iter()
        .filter(|kind| **kind == EventKind::StateChanged)
        .count();
    assert_eq!(changes, 1);
    assert!(seen.borrow().contains(&EventKind::TabCreated));
}

#[test]
fn narrow_rows_respect_the_minimum_width() {
    let config = LayoutConfig::new(vec![ItemConfig::row(vec![
        ItemConfig::component("a").with_width(10.0),
        ItemConfig::component("b").with_width(45.0),
        ItemConfig::component("c").with_width(45.0),
    ])])
    .with_dimensions(Dimensions {
        min_item_width: 100.0,
        ..flat()
    })
    .with_settings(term_dock::config::Settings {
        responsive_mode: term_dock::config::ResponsiveMode::None,
        ..Default::default()
    });
    let m = build(config, 500.0);
    let row = m.tree().children(m.root())[0];
    let widths: Vec<f64> = m
        .tree()
        .children(row)
        .iter()
        .map(|c| m.tree().node(*c).unwrap().rect().width)
        .collect();
    assert_eq!(widths, vec![100.0, 200.0, 200.0]);
}
