use std::cell::RefCell;
use std::rc::Rc;

use term_dock::config::PopoutConfig;
use term_dock::{
    ComponentRegistry, ItemConfig, LayoutConfig, LayoutError, LayoutManager, PopoutHost,
    PopoutWindowId, Rect,
};

type Log = Rc<RefCell<Vec<(PopoutWindowId, PopoutConfig)>>>;

struct RecordingHost {
    opened: Log,
}

impl PopoutHost for RecordingHost {
    fn open(&mut self, window: PopoutWindowId, config: &PopoutConfig) -> bool {
        self.opened.borrow_mut().push((window, config.clone()));
        true
    }

    fn close(&mut self, _window: PopoutWindowId) {}
}

fn with_host(config: LayoutConfig) -> (LayoutManager, Log) {
    let opened = Log::default();
    let mut manager = LayoutManager::new(config, ComponentRegistry::permissive()).unwrap();
    manager.set_popout_host(Box::new(RecordingHost {
        opened: Rc::clone(&opened),
    }));
    manager.init(Rect::new(0.0, 0.0, 800.0, 600.0)).unwrap();
    (manager, opened)
}

#[test]
fn configured_popouts_open_on_init_with_default_size() {
    let mut config = LayoutConfig::new(vec![ItemConfig::stack(vec![ItemConfig::component("a")])]);
    config.open_popouts.push(PopoutConfig {
        dimensions: Default::default(),
        content: vec![ItemConfig::component("floating")],
        parent_id: None,
        index_in_parent: None,
    });
    let (m, opened) = with_host(config);

    let opened = opened.borrow();
    assert_eq!(opened.len(), 1);
    assert_eq!(opened[0].1.dimensions.width, 500.0);
    assert_eq!(opened[0].1.dimensions.height, 309.0);
    assert_eq!(m.to_config().unwrap().open_popouts.len(), 1);
}

#[test]
fn popping_in_without_a_parent_uses_the_root_child() {
    let mut config = LayoutConfig::new(vec![ItemConfig::stack(vec![ItemConfig::component("a")])]);
    config.open_popouts.push(PopoutConfig {
        dimensions: Default::default(),
        content: vec![ItemConfig::component("floating")],
        parent_id: Some("gone".into()),
        index_in_parent: Some(3),
    });
    let (mut m, opened) = with_host(config);
    let window = opened.borrow()[0].0;

    let item = m.pop_in(window).unwrap().unwrap();
    let stack = m.tree().children(m.root())[0];
    assert_eq!(m.tree().children(stack)[0], item);
    assert!(matches!(
        m.pop_in(window),
        Err(LayoutError::PopoutNotFound(_))
    ));
}

#[test]
fn closing_the_window_forgets_the_popout() {
    let config = LayoutConfig::new(vec![ItemConfig::stack(vec![
        ItemConfig::component("a"),
        ItemConfig::component("b"),
    ])]);
    let (mut m, opened) = with_host(config);
    let b = m.tree().get_components_by_name(m.root(), "b")[0];
    let window = m.create_popout(b).unwrap().unwrap();

    let recorded = opened.borrow()[0].1.clone();
    assert!(recorded.parent_id.is_some());
    assert_eq!(recorded.index_in_parent, Some(1));

    m.popout_closed(window).unwrap();
    assert!(m.popouts().is_empty());
    assert!(m.to_config().unwrap().open_popouts.is_empty());
    let stack = m.tree().children(m.root())[0];
    assert!(m.tree().node(stack).unwrap().state.id.is_none());
}

#[test]
fn popouts_need_a_host() {
    let config = LayoutConfig::new(vec![ItemConfig::stack(vec![ItemConfig::component("a")])]);
    let mut m = LayoutManager::new(config, ComponentRegistry::permissive()).unwrap();
    m.init(Rect::new(0.0, 0.0, 800.0, 600.0)).unwrap();
    let a = m.tree().get_components_by_name(m.root(), "a")[0];
    assert!(matches!(m.create_popout(a), Err(LayoutError::NoPopoutHost)));
    assert!(m.tree().contains(a));
}
