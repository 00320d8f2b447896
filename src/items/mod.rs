//! The content-item tree.
//!
//! Items live in an arena owned by [`LayoutTree`] and refer to each other by
//! [`NodeId`]. Every item has an ordered child list and an optional parent.
//! Node-kind specific behaviour lives in the sibling modules: [`root`],
//! [`row_or_column`], [`stack`] and [`component`].

pub mod component;
pub mod normalize;
pub mod root;
pub mod row_or_column;
pub mod stack;

use std::collections::BTreeMap;

use serde_json::{Map, Value};

use crate::config::{
    Dimensions, HeaderConfig, ItemConfig, ItemId, ItemType, Labels, LayoutConfig, Settings,
};
use crate::error::{LayoutError, Result};
use crate::events::{EventBus, EventKind, ItemEvent, ItemListeners, LayoutEvent, ListenerId};
use crate::geometry::Rect;

pub use component::{
    BlankPanel, ComponentRegistry, ComponentState, ContainerEvent, ItemContainer, Panel,
};
pub use normalize::ParentContext;
pub use row_or_column::{Orientation, RowOrColumnState};
pub use stack::StackState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(u64);

impl NodeId {
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> u64 {
        self.0
    }
}

#[derive(Debug)]
pub enum ItemKind {
    Root,
    RowOrColumn(RowOrColumnState),
    Stack(StackState),
    Component(ComponentState),
}

/// Retained per-item settings. Everything here survives a `to_config` round
/// trip.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemState {
    pub width: Option<f64>,
    pub height: Option<f64>,
    pub min_width: Option<f64>,
    pub min_height: Option<f64>,
    pub id: Option<ItemId>,
    pub title: String,
    pub is_closable: bool,
    pub reorder_enabled: bool,
    pub component_name: Option<String>,
    pub active_item_index: Option<usize>,
    pub has_headers: Option<bool>,
    pub header: Option<HeaderConfig>,
    pub extra: Map<String, Value>,
}

impl Default for ItemState {
    fn default() -> Self {
        Self {
            width: None,
            height: None,
            min_width: None,
            min_height: None,
            id: None,
            title: String::new(),
            is_closable: true,
            reorder_enabled: true,
            component_name: None,
            active_item_index: None,
            has_headers: None,
            header: None,
            extra: Map::new(),
        }
    }
}

impl ItemState {
    pub fn from_config(config: &ItemConfig) -> Self {
        let title = config
            .title
            .clone()
            .or_else(|| config.component_name.clone())
            .unwrap_or_default();
        Self {
            width: config.width,
            height: config.height,
            min_width: config.min_width,
            min_height: config.min_height,
            id: config.id.clone(),
            title,
            is_closable: config.is_closable.unwrap_or(true),
            reorder_enabled: config.reorder_enabled.unwrap_or(true),
            component_name: config.component_name.clone(),
            active_item_index: config.active_item_index,
            has_headers: config.has_headers,
            header: config.header.clone(),
            extra: config.extra.clone(),
        }
    }

    /// Percentage along the primary axis of `orientation`.
    pub fn size(&self, orientation: Orientation) -> Option<f64> {
        match orientation {
            Orientation::Row => self.width,
            Orientation::Column => self.height,
        }
    }

    pub fn set_size(&mut self, orientation: Orientation, value: Option<f64>) {
        match orientation {
            Orientation::Row => self.width = value,
            Orientation::Column => self.height = value,
        }
    }

    pub fn min_size(&self, orientation: Orientation) -> Option<f64> {
        match orientation {
            Orientation::Row => self.min_width,
            Orientation::Column => self.min_height,
        }
    }
}

/// Where the item sits on screen.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Surface {
    pub rect: Rect,
    pub visible: bool,
}

impl Default for Surface {
    fn default() -> Self {
        Self {
            rect: Rect::default(),
            visible: true,
        }
    }
}

#[derive(Debug)]
pub struct ContentItem {
    id: NodeId,
    pub kind: ItemKind,
    pub state: ItemState,
    pub(crate) children: Vec<NodeId>,
    pub(crate) parent: Option<NodeId>,
    pub surface: Surface,
    pub(crate) is_initialised: bool,
    pub(crate) is_maximised: bool,
    pub(crate) is_selected: bool,
    pub(crate) listeners: ItemListeners,
}

impl ContentItem {
    fn new(id: NodeId, kind: ItemKind, state: ItemState) -> Self {
        Self {
            id,
            kind,
            state,
            children: Vec::new(),
            parent: None,
            surface: Surface::default(),
            is_initialised: false,
            is_maximised: false,
            is_selected: false,
            listeners: ItemListeners::default(),
        }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn is_initialised(&self) -> bool {
        self.is_initialised
    }

    pub fn is_maximised(&self) -> bool {
        self.is_maximised
    }

    pub fn is_selected(&self) -> bool {
        self.is_selected
    }

    pub fn rect(&self) -> Rect {
        self.surface.rect
    }

    pub fn item_type(&self) -> ItemType {
        match &self.kind {
            ItemKind::Root => ItemType::Root,
            ItemKind::RowOrColumn(state) => state.orientation.item_type(),
            ItemKind::Stack(_) => ItemType::Stack,
            ItemKind::Component(_) => ItemType::Component,
        }
    }

    pub fn is_root(&self) -> bool {
        matches!(self.kind, ItemKind::Root)
    }

    pub fn as_stack(&self) -> Option<&StackState> {
        match &self.kind {
            ItemKind::Stack(stack) => Some(stack),
            _ => None,
        }
    }

    pub fn as_row_or_column(&self) -> Option<&RowOrColumnState> {
        match &self.kind {
            ItemKind::RowOrColumn(state) => Some(state),
            _ => None,
        }
    }

    pub fn as_component(&self) -> Option<&ComponentState> {
        match &self.kind {
            ItemKind::Component(component) => Some(component),
            _ => None,
        }
    }

    pub(crate) fn as_stack_mut(&mut self) -> Option<&mut StackState> {
        match &mut self.kind {
            ItemKind::Stack(stack) => Some(stack),
            _ => None,
        }
    }

    pub(crate) fn as_row_or_column_mut(&mut self) -> Option<&mut RowOrColumnState> {
        match &mut self.kind {
            ItemKind::RowOrColumn(state) => Some(state),
            _ => None,
        }
    }

    pub(crate) fn as_component_mut(&mut self) -> Option<&mut ComponentState> {
        match &mut self.kind {
            ItemKind::Component(component) => Some(component),
            _ => None,
        }
    }
}

/// A child handed to `add_child`: either an existing detached item or a
/// config to build one from.
#[derive(Debug, Clone)]
pub enum NewChild {
    Item(NodeId),
    Config(ItemConfig),
}

impl From<NodeId> for NewChild {
    fn from(id: NodeId) -> Self {
        NewChild::Item(id)
    }
}

impl From<ItemConfig> for NewChild {
    fn from(config: ItemConfig) -> Self {
        NewChild::Config(config)
    }
}

/// Operations applied over a subtree by [`LayoutTree::call_downwards`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    Init,
    SetSize,
    Show,
    Hide,
}

#[derive(Debug)]
pub struct LayoutTree {
    items: BTreeMap<NodeId, ContentItem>,
    next_id: u64,
    root: NodeId,
    pub(crate) settings: Settings,
    pub(crate) dimensions: Dimensions,
    pub(crate) labels: Labels,
    pub(crate) header: Option<HeaderConfig>,
    pub(crate) components: ComponentRegistry,
    pub(crate) bus: EventBus,
    pub(crate) is_sub_window: bool,
    container: Rect,
}

impl LayoutTree {
    pub fn new(config: &LayoutConfig, components: ComponentRegistry) -> Self {
        let mut tree = Self {
            items: BTreeMap::new(),
            next_id: 0,
            root: NodeId(0),
            settings: config.settings.clone(),
            dimensions: config.dimensions.clone(),
            labels: config.labels.clone(),
            header: config.header.clone(),
            components,
            bus: EventBus::default(),
            is_sub_window: false,
            container: Rect::default(),
        };
        let state = ItemState {
            is_closable: false,
            ..ItemState::default()
        };
        tree.root = tree.insert(ItemKind::Root, state);
        tree
    }

    fn insert(&mut self, kind: ItemKind, state: ItemState) -> NodeId {
        self.next_id += 1;
        let id = NodeId(self.next_id);
        self.items.insert(id, ContentItem::new(id, kind, state));
        id
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn dimensions(&self) -> &Dimensions {
        &self.dimensions
    }

    pub fn labels(&self) -> &Labels {
        &self.labels
    }

    pub fn container(&self) -> Rect {
        self.container
    }

    pub(crate) fn set_container(&mut self, rect: Rect) {
        self.container = rect;
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.items.contains_key(&id)
    }

    pub fn get(&self, id: NodeId) -> Option<&ContentItem> {
        self.items.get(&id)
    }

    pub(crate) fn get_mut(&mut self, id: NodeId) -> Option<&mut ContentItem> {
        self.items.get_mut(&id)
    }

    pub fn node(&self, id: NodeId) -> Result<&ContentItem> {
        self.items
            .get(&id)
            .ok_or(LayoutError::UnknownContentItem(id))
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> Result<&mut ContentItem> {
        self.items
            .get_mut(&id)
            .ok_or(LayoutError::UnknownContentItem(id))
    }

    pub fn iter(&self) -> impl Iterator<Item = &ContentItem> {
        self.items.values()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn item_type(&self, id: NodeId) -> Result<ItemType> {
        Ok(self.node(id)?.item_type())
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.items.get(&id).and_then(|item| item.parent)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.items
            .get(&id)
            .map(|item| item.children.as_slice())
            .unwrap_or(&[])
    }

    pub fn orientation_of(&self, id: NodeId) -> Option<Orientation> {
        self.items
            .get(&id)
            .and_then(ContentItem::as_row_or_column)
            .map(|state| state.orientation)
    }

    pub(crate) fn child_index(&self, parent: NodeId, child: NodeId) -> Result<usize> {
        self.node(parent)?
            .children
            .iter()
            .position(|c| *c == child)
            .ok_or(LayoutError::NotAChild { parent, child })
    }

    pub(crate) fn parent_context(&self, parent: Option<NodeId>) -> ParentContext {
        match parent.and_then(|p| self.items.get(&p)) {
            None => ParentContext::Detached,
            Some(item) => match item.kind {
                ItemKind::Root => ParentContext::Root {
                    sub_window: self.is_sub_window,
                },
                ItemKind::Stack(_) => ParentContext::Stack,
                _ => ParentContext::Other,
            },
        }
    }

    /// Builds a detached subtree from `config`. `parent` only decides whether
    /// a bare component gets wrapped in a stack; nothing is attached.
    pub fn create_content_item(
        &mut self,
        config: ItemConfig,
        parent: Option<NodeId>,
    ) -> Result<NodeId> {
        let config = normalize::wrap_bare_component(config, self.parent_context(parent))?;
        normalize::validate(&config, &self.components)?;
        self.instantiate(config)
    }

    fn instantiate(&mut self, mut config: ItemConfig) -> Result<NodeId> {
        let item_type = config.item_type()?;
        let content = std::mem::take(&mut config.content);
        let state = ItemState::from_config(&config);
        let kind = match item_type {
            ItemType::Root => ItemKind::Root,
            ItemType::Row => ItemKind::RowOrColumn(RowOrColumnState::new(Orientation::Row)),
            ItemType::Column => ItemKind::RowOrColumn(RowOrColumnState::new(Orientation::Column)),
            ItemType::Stack => ItemKind::Stack(self.new_stack_state(&config, content.first())),
            ItemType::Component => {
                ItemKind::Component(self.components.instantiate(&config, state.title.clone())?)
            }
        };
        let id = self.insert(kind, state);
        let context = self.parent_context(Some(id));
        for child in content {
            let child = normalize::wrap_bare_component(child, context)?;
            let child = self.instantiate(child)?;
            self.link(id, child, None);
        }
        tracing::trace!(node = ?id, kind = %item_type, "created content item");
        Ok(id)
    }

    fn link(&mut self, parent: NodeId, child: NodeId, index: Option<usize>) -> usize {
        let mut at = 0;
        if let Some(item) = self.items.get_mut(&parent) {
            at = index.unwrap_or(item.children.len()).min(item.children.len());
            item.children.insert(at, child);
        }
        if let Some(item) = self.items.get_mut(&child) {
            item.parent = Some(parent);
        }
        at
    }

    /// Turns a [`NewChild`] into a detached node ready to attach under
    /// `parent`.
    pub(crate) fn resolve_child(&mut self, parent: NodeId, child: NewChild) -> Result<NodeId> {
        match child {
            NewChild::Config(config) => self.create_content_item(config, Some(parent)),
            NewChild::Item(id) => {
                let item = self.node(id)?;
                if item.parent.is_some() || item.is_root() {
                    return Err(LayoutError::AlreadyAttached(id));
                }
                Ok(id)
            }
        }
    }

    // ---- child operations -------------------------------------------------

    pub fn add_child(
        &mut self,
        parent: NodeId,
        child: impl Into<NewChild>,
        index: Option<usize>,
    ) -> Result<NodeId> {
        match self.item_type(parent)? {
            ItemType::Root => self.root_add_child(parent, child.into(), index),
            ItemType::Row | ItemType::Column => {
                self.row_or_column_add_child(parent, child.into(), index, false)
            }
            ItemType::Stack => self.stack_add_child(parent, child.into(), index),
            ItemType::Component => Err(LayoutError::LeafHasNoChildren(parent)),
        }
    }

    /// Removes `child` from `parent`. With `keep_child` the child is only
    /// detached; otherwise its subtree is destroyed.
    pub fn remove_child(&mut self, parent: NodeId, child: NodeId, keep_child: bool) -> Result<()> {
        match self.item_type(parent)? {
            ItemType::Root => self.base_remove_child(parent, child, keep_child),
            ItemType::Row | ItemType::Column => {
                self.row_or_column_remove_child(parent, child, keep_child)
            }
            ItemType::Stack => self.stack_remove_child(parent, child, keep_child),
            ItemType::Component => Err(LayoutError::LeafHasNoChildren(parent)),
        }
    }

    pub fn replace_child(
        &mut self,
        parent: NodeId,
        old: NodeId,
        new: impl Into<NewChild>,
        destroy_old: bool,
    ) -> Result<NodeId> {
        let item_type = self.item_type(parent)?;
        if item_type == ItemType::Component {
            return Err(LayoutError::LeafHasNoChildren(parent));
        }
        self.child_index(parent, old)?;
        let new = self.resolve_child(parent, new.into())?;
        match item_type {
            ItemType::Row | ItemType::Column => {
                self.row_or_column_replace_child(parent, old, new, destroy_old)?
            }
            ItemType::Root | ItemType::Stack | ItemType::Component => {
                self.base_replace_child(parent, old, new, destroy_old)?
            }
        }
        Ok(new)
    }

    /// Removes `id` from its parent, destroying it.
    pub fn remove(&mut self, id: NodeId) -> Result<()> {
        match self.parent(id) {
            Some(parent) => self.remove_child(parent, id, false),
            None => {
                self.destroy(id);
                Ok(())
            }
        }
    }

    pub(crate) fn base_add_child(
        &mut self,
        parent: NodeId,
        child: NodeId,
        index: Option<usize>,
    ) -> Result<usize> {
        self.node(child)?;
        let index = self.link(parent, child, index);
        if self.node(parent)?.is_initialised && !self.node(child)?.is_initialised {
            self.call_downwards(child, Lifecycle::Init, false, false)?;
        }
        Ok(index)
    }

    pub(crate) fn base_remove_child(
        &mut self,
        parent: NodeId,
        child: NodeId,
        keep_child: bool,
    ) -> Result<()> {
        let index = self.child_index(parent, child)?;
        if keep_child {
            if let Some(item) = self.items.get_mut(&child) {
                item.parent = None;
            }
        } else {
            self.destroy(child);
        }
        let item = self.node_mut(parent)?;
        item.children.remove(index);

        let remaining = item.children.len();
        let cascade = !item.is_root() && item.state.is_closable;
        let grandparent = item.parent;
        if remaining > 0 {
            self.call_downwards(parent, Lifecycle::SetSize, false, false)?;
        } else if cascade && let Some(grandparent) = grandparent {
            tracing::debug!(node = ?parent, "removing emptied container");
            self.remove_child(grandparent, parent, false)?;
        }
        Ok(())
    }

    pub(crate) fn base_replace_child(
        &mut self,
        parent: NodeId,
        old: NodeId,
        new: NodeId,
        destroy_old: bool,
    ) -> Result<()> {
        let index = self.child_index(parent, old)?;
        if let Some(item) = self.items.get_mut(&old) {
            item.parent = None;
        }
        if destroy_old {
            self.destroy(old);
        }
        self.node_mut(parent)?.children[index] = new;
        self.node_mut(new)?.parent = Some(parent);

        let (title, closable) = {
            let item = self.node(new)?;
            (item.state.title.clone(), item.state.is_closable)
        };
        if let Some(stack) = self.node_mut(parent)?.as_stack_mut() {
            if let Some(tab) = stack.header.tabs.get_mut(index) {
                tab.content_item = new;
                tab.title = title;
                tab.is_closable = closable;
            }
            if stack.active == Some(old) {
                stack.active = Some(new);
            }
        }

        if self.node(parent)?.is_initialised && !self.node(new)?.is_initialised {
            self.call_downwards(new, Lifecycle::Init, false, false)?;
        }
        self.call_downwards(parent, Lifecycle::SetSize, false, false)
    }

    // ---- traversal ----------------------------------------------------------

    /// Applies `op` to `id` and its descendants, top-down unless `bottom_up`.
    /// `skip_self` only applies to `id` itself.
    pub fn call_downwards(
        &mut self,
        id: NodeId,
        op: Lifecycle,
        bottom_up: bool,
        skip_self: bool,
    ) -> Result<()> {
        if !bottom_up && !skip_self {
            self.apply(id, op)?;
        }
        let children = self.children(id).to_vec();
        for child in children {
            if self.contains(child) {
                self.call_downwards(child, op, bottom_up, false)?;
            }
        }
        if bottom_up && !skip_self {
            self.apply(id, op)?;
        }
        Ok(())
    }

    fn apply(&mut self, id: NodeId, op: Lifecycle) -> Result<()> {
        match op {
            Lifecycle::Init => self.init_item(id),
            Lifecycle::SetSize => self.size_item(id),
            Lifecycle::Show => self.show_item(id),
            Lifecycle::Hide => self.hide_item(id),
        }
    }

    fn init_item(&mut self, id: NodeId) -> Result<()> {
        if self.node(id)?.is_initialised {
            return Ok(());
        }
        match self.item_type(id)? {
            ItemType::Stack => self.stack_init(id),
            ItemType::Component => {
                self.base_init(id)?;
                if let Some(component) = self.node_mut(id)?.as_component_mut() {
                    component.notify(ContainerEvent::Open);
                }
                Ok(())
            }
            ItemType::Root | ItemType::Row | ItemType::Column => self.base_init(id),
        }
    }

    pub(crate) fn base_init(&mut self, id: NodeId) -> Result<()> {
        self.size_item(id)?;
        let item = self.node_mut(id)?;
        item.is_initialised = true;
        let item_type = item.item_type();
        self.emit_bubbling_event(id, EventKind::ItemCreated);
        self.emit_bubbling_event(id, EventKind::Created(item_type));
        Ok(())
    }

    fn size_item(&mut self, id: NodeId) -> Result<()> {
        match self.item_type(id)? {
            ItemType::Root => self.root_set_size(id),
            ItemType::Row | ItemType::Column => self.row_or_column_set_size(id),
            ItemType::Stack => self.stack_set_size(id),
            ItemType::Component => {
                let item = self.node_mut(id)?;
                let rect = item.surface.rect;
                let initialised = item.is_initialised;
                if let Some(component) = item.as_component_mut()
                    && component.container.set_size(rect.width, rect.height)
                    && initialised
                {
                    component.notify(ContainerEvent::Resize);
                }
                Ok(())
            }
        }
    }

    pub(crate) fn show_item(&mut self, id: NodeId) -> Result<()> {
        let item = self.node_mut(id)?;
        item.surface.visible = true;
        let rect = item.surface.rect;
        if let Some(component) = item.as_component_mut() {
            component.container.is_hidden = false;
            component.notify(ContainerEvent::Show);
            if rect.width > 0.0 && rect.height > 0.0 {
                component.notify(ContainerEvent::Shown);
            }
        }
        self.emit_local(id, EventKind::Shown);
        Ok(())
    }

    pub(crate) fn hide_item(&mut self, id: NodeId) -> Result<()> {
        let item = self.node_mut(id)?;
        item.surface.visible = false;
        if let Some(component) = item.as_component_mut() {
            component.container.is_hidden = true;
            component.notify(ContainerEvent::Hide);
        }
        self.emit_local(id, EventKind::Hidden);
        Ok(())
    }

    /// True when the item and all its ancestors are shown.
    pub fn is_visible(&self, id: NodeId) -> bool {
        let mut current = Some(id);
        while let Some(node) = current {
            let Some(item) = self.items.get(&node) else {
                return false;
            };
            if !item.surface.visible {
                return false;
            }
            current = item.parent;
        }
        true
    }

    /// Tears down `id` and its subtree. The caller is responsible for
    /// unlinking it from its parent.
    pub(crate) fn destroy(&mut self, id: NodeId) {
        if !self.contains(id) {
            return;
        }
        self.emit_bubbling_event(id, EventKind::BeforeItemDestroyed);
        for child in self.children(id).to_vec() {
            self.destroy(child);
        }
        if let Some(item) = self.items.get_mut(&id) {
            item.children.clear();
            if let Some(component) = item.as_component_mut() {
                component.notify(ContainerEvent::Destroy);
            }
        }
        self.emit_bubbling_event(id, EventKind::ItemDestroyed);
        self.items.remove(&id);
        tracing::trace!(node = ?id, "destroyed content item");
    }

    /// Destroys everything below the root and leaves an empty, uninitialised
    /// root behind.
    pub(crate) fn clear(&mut self) {
        let root = self.root;
        for child in self.children(root).to_vec() {
            self.destroy(child);
        }
        if let Some(item) = self.items.get_mut(&root) {
            item.children.clear();
            item.is_initialised = false;
        }
    }

    // ---- queries ------------------------------------------------------------

    /// Descendants of `id` (excluding `id`) matching `filter`, depth first.
    pub fn get_items_by_filter<F>(&self, id: NodeId, filter: F) -> Vec<NodeId>
    where
        F: Fn(&ContentItem) -> bool,
    {
        let mut found = Vec::new();
        self.collect(id, &filter, &mut found);
        found
    }

    fn collect<F>(&self, id: NodeId, filter: &F, found: &mut Vec<NodeId>)
    where
        F: Fn(&ContentItem) -> bool,
    {
        for child in self.children(id) {
            if let Some(item) = self.items.get(child) {
                if filter(item) {
                    found.push(*child);
                }
                self.collect(*child, filter, found);
            }
        }
    }

    pub fn get_items_by_id(&self, id: NodeId, item_id: &str) -> Vec<NodeId> {
        self.get_items_by_filter(id, |item| {
            item.state.id.as_ref().is_some_and(|ids| ids.contains(item_id))
        })
    }

    pub fn get_items_by_type(&self, id: NodeId, item_type: ItemType) -> Vec<NodeId> {
        self.get_items_by_filter(id, |item| item.item_type() == item_type)
    }

    pub fn get_components_by_name(&self, id: NodeId, name: &str) -> Vec<NodeId> {
        self.get_items_by_filter(id, |item| {
            item.item_type() == ItemType::Component
                && item.state.component_name.as_deref() == Some(name)
        })
    }

    // ---- ids ----------------------------------------------------------------

    pub fn has_id(&self, id: NodeId, item_id: &str) -> bool {
        self.items
            .get(&id)
            .and_then(|item| item.state.id.as_ref())
            .is_some_and(|ids| ids.contains(item_id))
    }

    /// Adds `item_id`; a single id is promoted to a list on the second add.
    pub fn add_id(&mut self, id: NodeId, item_id: &str) -> Result<()> {
        if self.has_id(id, item_id) {
            return Ok(());
        }
        let state = &mut self.node_mut(id)?.state;
        state.id = Some(match state.id.take() {
            None => ItemId::Single(item_id.to_string()),
            Some(ItemId::Single(existing)) => ItemId::Many(vec![existing, item_id.to_string()]),
            Some(ItemId::Many(mut ids)) => {
                ids.push(item_id.to_string());
                ItemId::Many(ids)
            }
        });
        Ok(())
    }

    pub fn remove_id(&mut self, id: NodeId, item_id: &str) -> Result<()> {
        if !self.has_id(id, item_id) {
            return Err(LayoutError::IdNotFound(item_id.to_string()));
        }
        let state = &mut self.node_mut(id)?.state;
        state.id = match state.id.take() {
            Some(ItemId::Many(mut ids)) => {
                ids.retain(|existing| existing != item_id);
                (!ids.is_empty()).then_some(ItemId::Many(ids))
            }
            _ => None,
        };
        Ok(())
    }

    // ---- events -------------------------------------------------------------

    pub fn on<F>(&mut self, id: NodeId, kind: Option<EventKind>, callback: F) -> Result<ListenerId>
    where
        F: FnMut(&mut ItemEvent) + 'static,
    {
        Ok(self.node_mut(id)?.listeners.on(kind, Box::new(callback)))
    }

    pub fn off(&mut self, id: NodeId, listener: ListenerId) -> bool {
        self.items
            .get_mut(&id)
            .is_some_and(|item| item.listeners.off(listener))
    }

    /// Delivers to `id`'s own listeners only.
    pub(crate) fn emit_local(&mut self, id: NodeId, kind: EventKind) {
        if let Some(item) = self.items.get_mut(&id) {
            let mut event = ItemEvent::local(kind, id);
            item.listeners.dispatch(&mut event);
        }
    }

    /// Delivers to `id`, then each ancestor, until propagation is stopped or
    /// an uninitialised item is reached. Events that get past the top of the
    /// tree go to the manager bus.
    pub fn emit_bubbling_event(&mut self, origin: NodeId, kind: EventKind) {
        let mut event = ItemEvent::bubbling(kind, origin);
        let mut current = origin;
        loop {
            let Some(item) = self.items.get_mut(&current) else {
                return;
            };
            item.listeners.dispatch(&mut event);
            if event.is_propagation_stopped() || !item.is_initialised {
                return;
            }
            match item.parent {
                Some(parent) if !item.is_root() => current = parent,
                _ => break,
            }
        }
        self.bus.propagate(LayoutEvent {
            kind,
            origin: Some(origin),
        });
    }

    // ---- titles and state ---------------------------------------------------

    pub fn set_title(&mut self, id: NodeId, title: impl Into<String>) -> Result<()> {
        let title = title.into();
        let item = self.node_mut(id)?;
        item.state.title = title.clone();
        if let Some(component) = item.as_component_mut() {
            component.container.title = title.clone();
            component.notify(ContainerEvent::TitleChanged);
        }
        if let Some(parent) = self.parent(id)
            && let Some(stack) = self.node_mut(parent)?.as_stack_mut()
            && let Some(tab) = stack.header.tab_mut(id)
        {
            tab.title = title;
        }
        self.emit_local(id, EventKind::TitleChanged);
        self.emit_bubbling_event(id, EventKind::StateChanged);
        Ok(())
    }

    /// Serializes `id` and its subtree.
    pub fn to_config(&self, id: NodeId) -> Result<ItemConfig> {
        let item = self.node(id)?;
        let state = &item.state;
        let mut config = ItemConfig {
            kind: Some(item.item_type().as_str().to_string()),
            width: state.width,
            height: state.height,
            min_width: state.min_width,
            min_height: state.min_height,
            id: state.id.clone(),
            title: (!state.title.is_empty()).then(|| state.title.clone()),
            is_closable: Some(state.is_closable),
            reorder_enabled: Some(state.reorder_enabled),
            component_name: state.component_name.clone(),
            active_item_index: state.active_item_index,
            has_headers: state.has_headers,
            header: state.header.clone(),
            extra: state.extra.clone(),
            ..ItemConfig::default()
        };
        match &item.kind {
            ItemKind::Stack(stack) => {
                config.active_item_index = stack
                    .active
                    .and_then(|active| item.children.iter().position(|c| *c == active))
                    .or(state.active_item_index);
            }
            ItemKind::Component(component) => {
                config.component_state = Some(component.container.state().clone());
            }
            ItemKind::Root | ItemKind::RowOrColumn(_) => {}
        }
        config.content = item
            .children
            .iter()
            .map(|child| self.to_config(*child))
            .collect::<Result<Vec<_>>>()?;
        Ok(config)
    }

    /// Serializes everything below the root.
    pub fn content_config(&self) -> Result<Vec<ItemConfig>> {
        self.children(self.root)
            .iter()
            .map(|child| self.to_config(*child))
            .collect()
    }
}
