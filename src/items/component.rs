//! Leaf items and the panels they host.

use std::fmt;

use indexmap::IndexMap;
use ratatui::buffer::Buffer;
use serde_json::{Map, Value};

use crate::config::ItemConfig;
use crate::error::{self, ConfigurationError, LayoutError};
use crate::events::EventKind;

use super::{LayoutTree, Lifecycle, NodeId, Orientation};

/// Notifications delivered from a component's container to its panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerEvent {
    Open,
    Resize,
    Show,
    Shown,
    Hide,
    Close,
    Destroy,
    TitleChanged,
    StateChanged,
    Tab,
}

/// Content mounted inside a component.
pub trait Panel {
    fn on_container_event(&mut self, _event: ContainerEvent, _container: &ItemContainer) {}

    fn render(
        &mut self,
        _buffer: &mut Buffer,
        _area: ratatui::layout::Rect,
        _container: &ItemContainer,
    ) {
    }
}

/// Panel used for components that name no factory.
#[derive(Debug, Default)]
pub struct BlankPanel;

impl Panel for BlankPanel {}

/// What a panel sees of its hosting component.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemContainer {
    pub width: f64,
    pub height: f64,
    pub title: String,
    pub is_hidden: bool,
    state: Value,
}

impl ItemContainer {
    pub fn new(title: String, state: Option<Value>) -> Self {
        Self {
            width: 0.0,
            height: 0.0,
            title,
            is_hidden: false,
            state: state.unwrap_or_else(|| Value::Object(Map::new())),
        }
    }

    pub fn state(&self) -> &Value {
        &self.state
    }

    pub(crate) fn replace_state(&mut self, state: Value) {
        self.state = state;
    }

    /// Shallow merge of `patch` into an object state. A non-object state is
    /// replaced by the patch.
    pub(crate) fn extend_state(&mut self, patch: Map<String, Value>) {
        match &mut self.state {
            Value::Object(current) => current.extend(patch),
            other => *other = Value::Object(patch),
        }
    }

    /// Returns true when the size changed.
    pub(crate) fn set_size(&mut self, width: f64, height: f64) -> bool {
        if self.width == width && self.height == height {
            return false;
        }
        self.width = width;
        self.height = height;
        true
    }
}

pub struct ComponentState {
    pub container: ItemContainer,
    pub(crate) instance: Box<dyn Panel>,
}

impl fmt::Debug for ComponentState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentState")
            .field("container", &self.container)
            .finish_non_exhaustive()
    }
}

impl ComponentState {
    pub(crate) fn notify(&mut self, event: ContainerEvent) {
        let ComponentState {
            container,
            instance,
        } = self;
        instance.on_container_event(event, container);
    }

    pub fn render(&mut self, buffer: &mut Buffer, area: ratatui::layout::Rect) {
        let ComponentState {
            container,
            instance,
        } = self;
        instance.render(buffer, area, container);
    }
}

pub type ComponentFactory = Box<dyn Fn(&ItemContainer) -> Box<dyn Panel>>;

/// Named panel factories.
#[derive(Default)]
pub struct ComponentRegistry {
    factories: IndexMap<String, ComponentFactory>,
    fallback: Option<ComponentFactory>,
}

impl fmt::Debug for ComponentRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentRegistry")
            .field("names", &self.factories.keys().collect::<Vec<_>>())
            .field("fallback", &self.fallback.is_some())
            .finish()
    }
}

impl ComponentRegistry {
    /// Registry that mounts a [`BlankPanel`] for any component name.
    pub fn permissive() -> Self {
        let mut registry = Self::default();
        registry.set_fallback(|_| Box::new(BlankPanel));
        registry
    }

    pub fn register<F>(&mut self, name: impl Into<String>, factory: F)
    where
        F: Fn(&ItemContainer) -> Box<dyn Panel> + 'static,
    {
        self.factories.insert(name.into(), Box::new(factory));
    }

    pub fn set_fallback<F>(&mut self, factory: F)
    where
        F: Fn(&ItemContainer) -> Box<dyn Panel> + 'static,
    {
        self.fallback = Some(Box::new(factory));
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// Checks that `name` can be instantiated without building anything.
    pub fn resolve(&self, name: Option<&str>) -> Result<(), ConfigurationError> {
        match name {
            None => Ok(()),
            Some(name) if self.factories.contains_key(name) || self.fallback.is_some() => Ok(()),
            Some(name) => Err(ConfigurationError::UnknownComponent(name.to_string())),
        }
    }

    pub fn instantiate(
        &self,
        config: &ItemConfig,
        title: String,
    ) -> Result<ComponentState, ConfigurationError> {
        let container = ItemContainer::new(title, config.component_state.clone());
        let instance = match config.component_name.as_deref() {
            None => Box::new(BlankPanel) as Box<dyn Panel>,
            Some(name) => match self.factories.get(name).or(self.fallback.as_ref()) {
                Some(factory) => factory(&container),
                None => return Err(ConfigurationError::UnknownComponent(name.to_string())),
            },
        };
        Ok(ComponentState {
            container,
            instance,
        })
    }
}

impl LayoutTree {
    fn component_mut(&mut self, id: NodeId) -> error::Result<&mut ComponentState> {
        let item = self.node_mut(id)?;
        let found = item.item_type().as_str();
        item.as_component_mut().ok_or(LayoutError::WrongItemType {
            node: id,
            expected: "component",
            found,
        })
    }

    pub fn component_container(&self, id: NodeId) -> error::Result<&ItemContainer> {
        let item = self.node(id)?;
        item.as_component()
            .map(|c| &c.container)
            .ok_or(LayoutError::WrongItemType {
                node: id,
                expected: "component",
                found: item.item_type().as_str(),
            })
    }

    /// Replaces the panel state and notifies both the panel and the layout.
    pub fn set_component_state(&mut self, id: NodeId, state: Value) -> error::Result<()> {
        let component = self.component_mut(id)?;
        component.container.replace_state(state);
        component.notify(ContainerEvent::StateChanged);
        self.emit_bubbling_event(id, EventKind::StateChanged);
        Ok(())
    }

    pub fn extend_component_state(&mut self, id: NodeId, patch: Map<String, Value>) -> error::Result<()> {
        let component = self.component_mut(id)?;
        component.container.extend_state(patch);
        component.notify(ContainerEvent::StateChanged);
        self.emit_bubbling_event(id, EventKind::StateChanged);
        Ok(())
    }

    /// Closes a closable component. Returns false when the component refuses.
    pub fn close_component(&mut self, id: NodeId) -> error::Result<bool> {
        if !self.node(id)?.state.is_closable {
            return Ok(false);
        }
        self.component_mut(id)?.notify(ContainerEvent::Close);
        self.emit_local(id, EventKind::Close);
        self.remove(id)?;
        Ok(true)
    }

    /// Requests a new pixel size for a component by rebalancing the
    /// percentages of the nearest row or column above it. Returns false when
    /// no row or column encloses the component.
    pub fn set_component_size(&mut self, id: NodeId, width: f64, height: f64) -> error::Result<bool> {
        let mut child = id;
        let mut parent = self.parent(id);
        let owner = loop {
            let Some(p) = parent else {
                return Ok(false);
            };
            if self.orientation_of(p).is_some() {
                break p;
            }
            if self.node(p)?.is_root() {
                return Ok(false);
            }
            child = p;
            parent = self.parent(p);
        };
        let Some(orientation) = self.orientation_of(owner) else {
            return Ok(false);
        };

        let container = self.component_container(id)?;
        let (current, requested) = match orientation {
            Orientation::Row => (container.width, width),
            Orientation::Column => (container.height, height),
        };
        let declared = self.node(child)?.state.size(orientation).unwrap_or(0.0);
        let siblings = self.children(owner).len();
        if current <= 0.0 || declared <= 0.0 || siblings < 2 {
            return Ok(false);
        }
        let total = current * (100.0 / declared);
        let percentage = requested / total * 100.0;
        let delta = (declared - percentage) / (siblings - 1) as f64;

        for sibling in self.children(owner).to_vec() {
            let state = &mut self.node_mut(sibling)?.state;
            if sibling == child {
                state.set_size(orientation, Some(percentage));
            } else {
                let size = state.size(orientation).unwrap_or(0.0) + delta;
                state.set_size(orientation, Some(size));
            }
        }
        self.call_downwards(owner, Lifecycle::SetSize, false, false)?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Dimensions, LayoutConfig};
    use crate::geometry::Rect;
    use serde_json::json;

    #[test]
    fn unknown_names_need_a_fallback() {
        let mut reg = ComponentRegistry::default();
        let config = ItemConfig::component("chart");
        assert!(matches!(
            reg.instantiate(&config, "chart".into()),
            Err(ConfigurationError::UnknownComponent(_))
        ));
        reg.set_fallback(|_| Box::new(BlankPanel));
        assert!(reg.instantiate(&config, "chart".into()).is_ok());
    }

    #[test]
    fn nameless_components_get_a_blank_panel() {
        let reg = ComponentRegistry::default();
        let mut config = ItemConfig::component("x");
        config.component_name = None;
        assert!(reg.resolve(None).is_ok());
        assert!(reg.instantiate(&config, String::new()).is_ok());
    }

    #[test]
    fn container_state_extends_shallowly() {
        let mut c = ItemContainer::new("t".into(), Some(json!({"a": 1, "b": {"c": 2}})));
        let patch = json!({"b": 3, "d": 4});
        if let Value::Object(map) = patch {
            c.extend_state(map);
        }
        assert_eq!(c.state(), &json!({"a": 1, "b": 3, "d": 4}));
    }

    #[test]
    fn set_size_reports_changes() {
        let mut c = ItemContainer::new(String::new(), None);
        assert!(c.set_size(10.0, 5.0));
        assert!(!c.set_size(10.0, 5.0));
    }

    fn row_of_two() -> (LayoutTree, NodeId, NodeId) {
        let config = LayoutConfig::default().with_dimensions(Dimensions {
            border_width: 0.0,
            header_height: 0.0,
            ..Dimensions::default()
        });
        let mut tree = LayoutTree::new(&config, ComponentRegistry::permissive());
        tree.set_container(Rect::new(0.0, 0.0, 400.0, 300.0));
        let root = tree.root();
        tree.call_downwards(root, Lifecycle::Init, false, false).unwrap();
        tree.add_child(
            root,
            ItemConfig::row(vec![ItemConfig::component("a"), ItemConfig::component("b")]),
            None,
        )
        .unwrap();
        let a = tree.get_components_by_name(root, "a")[0];
        let b = tree.get_components_by_name(root, "b")[0];
        (tree, a, b)
    }

    #[test]
    fn component_size_rebalances_the_row() {
        let (mut tree, a, b) = row_of_two();
        assert_eq!(tree.component_container(a).unwrap().width, 200.0);
        assert!(tree.set_component_size(a, 100.0, 300.0).unwrap());
        assert_eq!(tree.component_container(a).unwrap().width, 100.0);
        assert_eq!(tree.component_container(b).unwrap().width, 300.0);
    }

    #[test]
    fn state_changes_reach_the_container() {
        let (mut tree, a, _) = row_of_two();
        tree.set_component_state(a, json!({"x": 1})).unwrap();
        let patch = json!({"y": 2});
        if let Value::Object(map) = patch {
            tree.extend_component_state(a, map).unwrap();
        }
        assert_eq!(tree.component_container(a).unwrap().state(), &json!({"x": 1, "y": 2}));
    }

    #[test]
    fn unclosable_components_stay() {
        let (mut tree, a, b) = row_of_two();
        tree.node_mut(b).unwrap().state.is_closable = false;
        assert!(!tree.close_component(b).unwrap());
        assert!(tree.close_component(a).unwrap());
        assert!(!tree.contains(a));
        assert!(tree.contains(b));
    }
}
