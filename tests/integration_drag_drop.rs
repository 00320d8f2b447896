use term_dock::config::{Dimensions, ItemType};
use term_dock::controls::DropOutcome;
use term_dock::{ComponentRegistry, ItemConfig, LayoutConfig, LayoutManager, NodeId, Rect};

fn manager(content: Vec<ItemConfig>) -> LayoutManager {
    let config = LayoutConfig::new(content).with_dimensions(Dimensions {
        border_width: 0.0,
        ..Dimensions::default()
    });
    let mut manager = LayoutManager::new(config, ComponentRegistry::permissive()).unwrap();
    manager.init(Rect::new(0.0, 0.0, 1000.0, 600.0)).unwrap();
    manager
}

fn named(m: &LayoutManager, name: &str) -> NodeId {
    m.tree().get_components_by_name(m.root(), name)[0]
}

#[test]
fn external_drop_on_empty_layout_fills_the_root() {
    let mut m = manager(Vec::new());
    let item = m
        .start_external_drag(ItemConfig::component("new"), 500.0, 300.0)
        .unwrap();
    let outcome = m.drop_item().unwrap();
    assert_eq!(outcome, Some(DropOutcome::Dropped { target: m.root() }));
    let stack = m.tree().children(m.root())[0];
    assert_eq!(m.tree().item_type(stack).unwrap(), ItemType::Stack);
    assert_eq!(m.tree().children(stack), &[item]);
}

#[test]
fn external_drop_on_the_left_edge_splits_the_layout() {
    let mut m = manager(vec![ItemConfig::stack(vec![ItemConfig::component("a")])]);
    let a = named(&m, "a");
    let item = m
        .start_external_drag(ItemConfig::component("new"), 20.0, 300.0)
        .unwrap();
    m.drop_item().unwrap();

    let row = m.tree().children(m.root())[0];
    assert_eq!(m.tree().item_type(row).unwrap(), ItemType::Row);
    let columns = m.tree().children(row).to_vec();
    assert_eq!(m.tree().children(columns[0]), &[item]);
    assert_eq!(m.tree().parent(a), Some(columns[1]));
}

#[test]
fn dropping_on_a_stack_bottom_creates_a_column() {
    let mut m = manager(vec![ItemConfig::row(vec![
        ItemConfig::component("a"),
        ItemConfig::component("b"),
    ])]);
    let b = named(&m, "b");
    let target = m.tree().parent(b).unwrap();
    let rect = m.tree().node(target).unwrap().rect();

    let item = m
        .start_external_drag(ItemConfig::component("new"), rect.x + 10.0, rect.y + 10.0)
        .unwrap();
    m.drag_to(rect.x + rect.width / 2.0, rect.bottom() - 100.0);
    m.drop_item().unwrap();

    let column = m.tree().parent(target).unwrap();
    assert_eq!(m.tree().item_type(column).unwrap(), ItemType::Column);
    let children = m.tree().children(column).to_vec();
    assert_eq!(children[0], target);
    assert_eq!(m.tree().children(children[1]), &[item]);
    assert_eq!(m.tree().node(children[1]).unwrap().state.height, Some(50.0));
}

#[test]
fn released_outside_every_area_uses_the_last_valid_one() {
    let mut m = manager(vec![ItemConfig::row(vec![
        ItemConfig::component("a"),
        ItemConfig::component("b"),
    ])]);
    let b = named(&m, "b");
    let target = m.tree().parent(b).unwrap();
    let header = m.tree().stack_state(target).unwrap().header.rect;

    let item = m
        .start_external_drag(
            ItemConfig::component("new"),
            header.x + 150.0,
            header.y + header.height / 2.0,
        )
        .unwrap();
    m.drag_to(5000.0, 5000.0);
    let proxy = m.drag().unwrap();
    assert!(proxy.area().is_none());
    assert_eq!(proxy.last_valid_area().map(|area| area.owner), Some(target));

    let outcome = m.drop_item().unwrap();
    assert_eq!(outcome, Some(DropOutcome::Dropped { target }));
    assert_eq!(m.tree().parent(item), Some(target));
}

#[test]
fn external_drag_without_any_target_destroys_the_item() {
    let mut m = manager(vec![ItemConfig::stack(vec![ItemConfig::component("a")])]);
    let count = m.tree().len();
    let item = m
        .start_external_drag(ItemConfig::component("new"), -50.0, -50.0)
        .unwrap();
    assert_eq!(m.drop_item().unwrap(), Some(DropOutcome::Destroyed));
    assert!(!m.tree().contains(item));
    assert_eq!(m.tree().len(), count);
}

#[test]
fn dragging_the_last_tab_away_collapses_its_stack() {
    let mut m = manager(vec![ItemConfig::row(vec![
        ItemConfig::component("a"),
        ItemConfig::component("b"),
        ItemConfig::component("c"),
    ])]);
    let a = named(&m, "a");
    let c = named(&m, "c");
    let row = m.tree().children(m.root())[0];

    m.start_drag(a, 50.0, 50.0).unwrap();
    assert_eq!(m.tree().children(row).len(), 2);
    let target = m.tree().parent(c).unwrap();
    let header = m.tree().stack_state(target).unwrap().header.rect;
    m.drag_to(header.x + 150.0, header.y + header.height / 2.0);
    m.drop_item().unwrap();

    assert_eq!(m.tree().parent(a), Some(target));
    assert_eq!(m.tree().children(target), &[c, a]);
    assert_eq!(
        m.tree().stack_state(target).unwrap().active(),
        Some(a)
    );
}

#[test]
fn terminal_drops_inside_a_side_stack_target_that_stack() {
    let config = LayoutConfig::new(vec![ItemConfig::row(vec![
        ItemConfig::component("a"),
        ItemConfig::component("b"),
    ])])
    .with_dimensions(Dimensions::terminal());
    let mut m = LayoutManager::new(config, ComponentRegistry::permissive()).unwrap();
    m.init(Rect::new(0.0, 0.0, 120.0, 40.0)).unwrap();
    let left = m.tree().parent(named(&m, "a")).unwrap();
    let rect = m.tree().node(left).unwrap().rect();
    assert!(rect.right() > 45.5);

    m.start_external_drag(ItemConfig::component("new"), 45.5, 20.5)
        .unwrap();
    let owner = m.drag().unwrap().area().map(|area| area.owner);
    assert_eq!(owner, Some(left));
    assert_eq!(
        m.drop_item().unwrap(),
        Some(DropOutcome::Dropped { target: left })
    );
}
