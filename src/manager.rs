//! The layout manager.
//!
//! [`LayoutManager`] owns the item tree and everything that spans more than
//! one item: the drag session, splitter drags, the maximised item, the
//! selection, popout windows and the per-frame event queue. Front-ends feed
//! it container sizes and pointer input and call [`LayoutManager::next_frame`]
//! once per repaint.

use crate::config::{
    Dimensions, ItemConfig, ItemType, LayoutConfig, PopoutConfig, PopoutDimensions,
    ResponsiveMode,
};
use crate::constants::{DEFAULT_POPOUT_HEIGHT, DEFAULT_POPOUT_WIDTH, MAXIMISED_ITEM_ID};
use crate::controls::{AreaRegistry, DragProxy, DropOutcome};
use crate::error::{LayoutError, Result};
use crate::events::{Deferred, EventKind, LayoutEvent, ListenerId};
use crate::geometry::{ItemArea, Rect};
use crate::items::{ComponentRegistry, ItemContainer, LayoutTree, Lifecycle, NodeId, Panel};
use crate::popout::{PopoutHost, PopoutRecord, PopoutWindowId};

pub struct LayoutManager {
    tree: LayoutTree,
    config: LayoutConfig,
    drag: Option<DragProxy>,
    splitter_drag: Option<NodeId>,
    maximised: Option<NodeId>,
    selected: Option<NodeId>,
    popouts: Vec<PopoutRecord>,
    popout_host: Option<Box<dyn PopoutHost>>,
    next_window: u64,
    next_popout_parent: u64,
    is_initialised: bool,
    first_load: bool,
}

impl std::fmt::Debug for LayoutManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LayoutManager")
            .field("tree", &self.tree)
            .field("drag", &self.drag)
            .field("maximised", &self.maximised)
            .field("selected", &self.selected)
            .field("popouts", &self.popouts)
            .field("is_initialised", &self.is_initialised)
            .finish_non_exhaustive()
    }
}

impl LayoutManager {
    /// Validates `config` and prepares an empty tree. Nothing is built until
    /// [`LayoutManager::init`].
    pub fn new(config: LayoutConfig, components: ComponentRegistry) -> Result<Self> {
        config.validate()?;
        let tree = LayoutTree::new(&config, components);
        Ok(Self {
            tree,
            config,
            drag: None,
            splitter_drag: None,
            maximised: None,
            selected: None,
            popouts: Vec::new(),
            popout_host: None,
            next_window: 0,
            next_popout_parent: 0,
            is_initialised: false,
            first_load: true,
        })
    }

    /// Like [`LayoutManager::new`], for the layout inside a popout window.
    /// A bare component at the top is kept as the root's child instead of
    /// being wrapped in a stack.
    pub fn sub_window(config: LayoutConfig, components: ComponentRegistry) -> Result<Self> {
        let mut manager = Self::new(config, components)?;
        manager.tree.is_sub_window = true;
        Ok(manager)
    }

    pub fn tree(&self) -> &LayoutTree {
        &self.tree
    }

    pub fn tree_mut(&mut self) -> &mut LayoutTree {
        &mut self.tree
    }

    pub fn root(&self) -> NodeId {
        self.tree.root()
    }

    pub fn is_initialised(&self) -> bool {
        self.is_initialised
    }

    pub fn dimensions(&self) -> &Dimensions {
        self.tree.dimensions()
    }

    pub fn register_component<F>(&mut self, name: impl Into<String>, factory: F)
    where
        F: Fn(&ItemContainer) -> Box<dyn Panel> + 'static,
    {
        self.tree.components.register(name, factory);
    }

    pub fn set_fallback_component<F>(&mut self, factory: F)
    where
        F: Fn(&ItemContainer) -> Box<dyn Panel> + 'static,
    {
        self.tree.components.set_fallback(factory);
    }

    pub fn set_popout_host(&mut self, host: Box<dyn PopoutHost>) {
        self.popout_host = Some(host);
    }

    /// Builds the configured tree inside `container`.
    pub fn init(&mut self, container: Rect) -> Result<()> {
        if self.is_initialised {
            return Ok(());
        }
        self.tree.set_container(container);
        let root = self.tree.root();
        self.tree.call_downwards(root, Lifecycle::Init, false, false)?;
        if let Some(content) = self.config.content.first().cloned() {
            self.tree.add_child(root, content, None)?;
        }

        if let Some(id) = self.config.maximised_item_id.clone()
            && let Some(item) = self.tree.get_items_by_id(root, &id).first().copied()
        {
            self.maximise_item(item)?;
        }
        for popout in self.config.open_popouts.clone() {
            self.open_popout(popout)?;
        }

        self.is_initialised = true;
        self.adjust_columns_responsive()?;
        self.first_load = false;
        tracing::debug!(
            width = container.width,
            height = container.height,
            items = self.tree.len(),
            "layout initialised"
        );
        self.tree.bus.emit(LayoutEvent {
            kind: EventKind::Initialised,
            origin: None,
        });
        Ok(())
    }

    /// Resizes the layout to `container`.
    pub fn update_size(&mut self, container: Rect) -> Result<()> {
        self.tree.set_container(container);
        if !self.is_initialised {
            return Ok(());
        }
        let root = self.tree.root();
        self.tree
            .call_downwards(root, Lifecycle::SetSize, false, false)?;
        self.apply_maximised()?;
        self.adjust_columns_responsive()
    }

    /// Tears the whole tree down bottom-up and closes popouts if configured.
    pub fn destroy(&mut self) {
        if !self.is_initialised {
            return;
        }
        if self.tree.settings.close_popouts_on_unload {
            let windows: Vec<PopoutWindowId> = self.popouts.iter().map(|p| p.window).collect();
            for window in windows {
                if let Some(host) = self.popout_host.as_mut() {
                    host.close(window);
                }
            }
            self.popouts.clear();
        }
        self.drag = None;
        self.splitter_drag = None;
        self.maximised = None;
        self.selected = None;
        self.tree.clear();
        self.is_initialised = false;
        tracing::debug!("layout destroyed");
    }

    /// Serializes the current layout, including open popouts and the
    /// maximised item.
    pub fn to_config(&self) -> Result<LayoutConfig> {
        Ok(LayoutConfig {
            settings: self.tree.settings.clone(),
            dimensions: self.tree.dimensions.clone(),
            labels: self.tree.labels.clone(),
            header: self.tree.header.clone(),
            content: self.tree.content_config()?,
            open_popouts: self.popouts.iter().map(|p| p.config.clone()).collect(),
            maximised_item_id: self.maximised.map(|_| MAXIMISED_ITEM_ID.to_string()),
        })
    }

    // ---- events ----------------------------------------------------------

    pub fn subscribe<F>(&mut self, kind: Option<EventKind>, callback: F) -> ListenerId
    where
        F: FnMut(&LayoutEvent) + 'static,
    {
        self.tree.bus.subscribe(kind, Box::new(callback))
    }

    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        self.tree.bus.unsubscribe(id)
    }

    /// Runs work deferred to this frame, then delivers coalesced events.
    pub fn next_frame(&mut self) -> Result<()> {
        for task in self.tree.bus.take_deferred() {
            match task {
                Deferred::ResizeSubtree(id) if self.tree.contains(id) => {
                    self.tree.call_downwards(id, Lifecycle::SetSize, false, false)?;
                }
                Deferred::ResizeSubtree(_) => {}
            }
        }
        self.apply_maximised()?;
        self.tree.bus.flush_pending();
        Ok(())
    }

    pub fn has_pending_frame(&self) -> bool {
        self.tree.bus.has_pending()
    }

    // ---- drag and drop ---------------------------------------------------

    pub fn drag(&self) -> Option<&DragProxy> {
        self.drag.as_ref()
    }

    /// Picks `item` up at `(x, y)`. The item is detached from its parent for
    /// the duration of the drag.
    pub fn start_drag(&mut self, item: NodeId, x: f64, y: f64) -> Result<()> {
        if !self.is_initialised {
            return Err(LayoutError::NotInitialised);
        }
        if self.drag.is_some() {
            return Err(LayoutError::DragInProgress);
        }
        let node = self.tree.node(item)?;
        if node.is_root() {
            return Err(LayoutError::WrongItemType {
                node: item,
                expected: "content item",
                found: ItemType::Root.as_str(),
            });
        }
        let original_parent = node.parent();
        if let Some(parent) = original_parent
            && self.maximised == Some(parent)
        {
            self.minimise_item(parent)?;
        }
        if self.maximised == Some(item) {
            self.minimise_item(item)?;
        }
        if let Some(parent) = original_parent {
            self.tree.remove_child(parent, item, true)?;
        }
        let bounds = self
            .tree
            .settings
            .constrain_drag_to_container
            .then(|| self.tree.container());
        self.begin_drag(item, original_parent, bounds, x, y)
    }

    /// Starts dragging a new item built from `config`, as if it came from an
    /// external drag source. Such drags are never constrained to the
    /// container.
    pub fn start_external_drag(&mut self, config: ItemConfig, x: f64, y: f64) -> Result<NodeId> {
        if !self.is_initialised {
            return Err(LayoutError::NotInitialised);
        }
        if self.drag.is_some() {
            return Err(LayoutError::DragInProgress);
        }
        let item = self.tree.create_content_item(config, None)?;
        self.tree
            .call_downwards(item, Lifecycle::Init, false, false)?;
        self.begin_drag(item, None, None, x, y)?;
        Ok(item)
    }

    fn begin_drag(
        &mut self,
        item: NodeId,
        original_parent: Option<NodeId>,
        bounds: Option<Rect>,
        x: f64,
        y: f64,
    ) -> Result<()> {
        let registry = self.calculate_item_areas();
        let dims = self.tree.dimensions();
        let size = (
            dims.drag_proxy_width,
            (dims.drag_proxy_height - dims.header_height).max(0.0),
        );
        self.tree.node_mut(item)?.surface.rect = Rect::new(x, y, size.0, size.1);
        self.tree.call_downwards(item, Lifecycle::Show, false, false)?;
        self.tree
            .call_downwards(item, Lifecycle::SetSize, false, false)?;

        tracing::debug!(
            item = ?item,
            parent = ?original_parent,
            areas = registry.len(),
            "drag started"
        );
        self.drag = Some(DragProxy::new(item, original_parent, registry, bounds, size));
        self.update_drop_position(x, y);
        self.tree.bus.emit(LayoutEvent {
            kind: EventKind::ItemPickedUp,
            origin: Some(item),
        });
        Ok(())
    }

    /// Builds the drop targets for a drag. An empty layout offers only the
    /// root; otherwise the root edges and every visible stack with its
    /// header are registered.
    pub fn calculate_item_areas(&self) -> AreaRegistry {
        let mut registry = AreaRegistry::default();
        let root = self.tree.root();
        if self.tree.children(root).is_empty() {
            registry.push(ItemArea::from_rect(self.tree.container(), root));
            return registry;
        }
        for area in self.tree.root_edge_areas() {
            registry.push(area);
        }
        for stack in self.tree.get_items_by_type(root, ItemType::Stack) {
            let Some((area, zones)) = self.tree.stack_drop_zones(stack) else {
                continue;
            };
            registry.push(area);
            if let Some(header) = zones.first() {
                let mut header_area = area;
                header_area.x1 = header.highlight.x;
                header_area.y1 = header.highlight.y;
                header_area.x2 = header.highlight.right();
                header_area.y2 = header.highlight.bottom();
                header_area.recompute_surface();
                registry.push(header_area);
            }
            registry.set_zones(stack, zones);
        }
        registry
    }

    fn update_drop_position(&mut self, x: f64, y: f64) {
        let root = self.tree.root();
        let Some(proxy) = self.drag.as_mut() else {
            return;
        };
        let Some(area) = proxy.set_drop_position(x, y) else {
            return;
        };
        if area.owner == root {
            proxy.set_highlight(area.rect());
            return;
        }
        if let Some(zone) = proxy.registry().zone_at(area.owner, x, y)
            && let Some((drop, highlight)) = self.tree.stack_highlight(area.owner, zone, x, y)
        {
            proxy.record_stack_drop(area.owner, drop, highlight);
        }
    }

    /// Moves the drag to `(x, y)`. Positions outside a constrained container
    /// are ignored.
    pub fn drag_to(&mut self, x: f64, y: f64) {
        let Some(proxy) = self.drag.as_ref() else {
            return;
        };
        if !proxy.accepts(x, y) {
            return;
        }
        self.update_drop_position(x, y);
    }

    /// Ends the drag. The item goes to the current or last valid target,
    /// else back to its original parent, else it is destroyed.
    pub fn drop_item(&mut self) -> Result<Option<DropOutcome>> {
        let Some(proxy) = self.drag.take() else {
            return Ok(None);
        };
        let item = proxy.item();
        let root = self.tree.root();
        let target = proxy.drop_area().filter(|area| self.tree.contains(area.owner));
        let outcome = match target {
            Some(area) if area.owner == root => {
                self.tree.root_on_drop(item, area.side)?;
                DropOutcome::Dropped { target: root }
            }
            Some(area) => {
                self.tree
                    .stack_on_drop(area.owner, item, proxy.stack_drop(area.owner))?;
                DropOutcome::Dropped { target: area.owner }
            }
            None => match proxy
                .original_parent()
                .filter(|parent| self.tree.contains(*parent))
            {
                Some(parent) => {
                    self.tree.add_child(parent, item, None)?;
                    DropOutcome::Returned { parent }
                }
                None => {
                    self.tree.destroy(item);
                    DropOutcome::Destroyed
                }
            },
        };
        tracing::debug!(item = ?item, outcome = ?outcome, "drag ended");
        self.tree.bus.emit(LayoutEvent {
            kind: EventKind::ItemDropped,
            origin: Some(item),
        });
        Ok(Some(outcome))
    }

    // ---- splitters -------------------------------------------------------

    /// The row or column and splitter index under `(x, y)`. Nested
    /// containers win over their ancestors.
    pub fn splitter_at(&self, x: f64, y: f64) -> Option<(NodeId, usize)> {
        let root = self.tree.root();
        let mut found = None;
        let containers = self.tree.get_items_by_filter(root, |item| {
            item.as_row_or_column().is_some()
        });
        for id in containers {
            if !self.tree.is_visible(id) {
                continue;
            }
            let Some(state) = self.tree.get(id).and_then(|item| item.as_row_or_column()) else {
                continue;
            };
            if let Some(index) = state.splitters.iter().position(|s| s.hit(x, y)) {
                found = Some((id, index));
            }
        }
        found
    }

    pub fn start_splitter_drag(&mut self, owner: NodeId, index: usize, x: f64, y: f64) -> Result<()> {
        let orientation = self
            .tree
            .orientation_of(owner)
            .ok_or(LayoutError::SplitterNotFound { owner, index })?;
        self.tree
            .start_splitter_drag(owner, index, orientation.pick(x, y))?;
        self.splitter_drag = Some(owner);
        Ok(())
    }

    pub fn drag_splitter(&mut self, x: f64, y: f64) -> Result<Option<f64>> {
        let Some(owner) = self.splitter_drag else {
            return Ok(None);
        };
        let Some(orientation) = self.tree.orientation_of(owner) else {
            self.splitter_drag = None;
            return Ok(None);
        };
        self.tree
            .drag_splitter(owner, orientation.pick(x, y))
            .map(Some)
    }

    pub fn stop_splitter_drag(&mut self) -> Result<()> {
        match self.splitter_drag.take() {
            Some(owner) if self.tree.contains(owner) => self.tree.stop_splitter_drag(owner),
            _ => Ok(()),
        }
    }

    pub fn is_dragging_splitter(&self) -> bool {
        self.splitter_drag.is_some()
    }

    // ---- maximise --------------------------------------------------------

    pub fn maximised_item(&self) -> Option<NodeId> {
        self.maximised
    }

    pub fn toggle_maximise(&mut self, item: NodeId) -> Result<()> {
        if self.maximised == Some(item) {
            self.minimise_item(item)
        } else {
            self.maximise_item(item)
        }
    }

    fn maximise_item(&mut self, item: NodeId) -> Result<()> {
        if let Some(previous) = self.maximised {
            self.minimise_item(previous)?;
        }
        self.tree.add_id(item, MAXIMISED_ITEM_ID)?;
        self.tree.node_mut(item)?.is_maximised = true;
        self.maximised = Some(item);
        self.apply_maximised()?;
        tracing::debug!(item = ?item, "maximised");
        self.tree.emit_local(item, EventKind::Maximised);
        self.tree.bus.emit(LayoutEvent {
            kind: EventKind::StateChanged,
            origin: Some(item),
        });
        Ok(())
    }

    fn minimise_item(&mut self, item: NodeId) -> Result<()> {
        self.maximised = None;
        if !self.tree.contains(item) {
            return Ok(());
        }
        if self.tree.has_id(item, MAXIMISED_ITEM_ID) {
            self.tree.remove_id(item, MAXIMISED_ITEM_ID)?;
        }
        self.tree.node_mut(item)?.is_maximised = false;
        if let Some(parent) = self.tree.parent(item) {
            self.tree
                .call_downwards(parent, Lifecycle::SetSize, false, false)?;
        }
        tracing::debug!(item = ?item, "minimised");
        self.tree.emit_local(item, EventKind::Minimised);
        self.tree.bus.emit(LayoutEvent {
            kind: EventKind::StateChanged,
            origin: Some(item),
        });
        Ok(())
    }

    /// Stretches the maximised item over the container.
    fn apply_maximised(&mut self) -> Result<()> {
        let Some(item) = self.maximised else {
            return Ok(());
        };
        if !self.tree.contains(item) {
            self.maximised = None;
            return Ok(());
        }
        let container = self.tree.container();
        self.tree.node_mut(item)?.surface.rect = container;
        self.tree
            .call_downwards(item, Lifecycle::SetSize, false, false)
    }

    // ---- selection -------------------------------------------------------

    pub fn selected_item(&self) -> Option<NodeId> {
        self.selected
    }

    /// Selects `item`, or clears the selection with `None`.
    pub fn select_item(&mut self, item: Option<NodeId>) -> Result<()> {
        if !self.tree.settings.selection_enabled {
            return Err(LayoutError::SelectionDisabled);
        }
        if self.selected == item {
            return Ok(());
        }
        if let Some(item) = item {
            self.tree.node(item)?;
        }
        if let Some(previous) = self.selected
            && let Some(node) = self.tree.get_mut(previous)
        {
            node.is_selected = false;
        }
        if let Some(item) = item {
            self.tree.node_mut(item)?.is_selected = true;
        }
        self.selected = item;
        self.tree.bus.emit(LayoutEvent {
            kind: EventKind::SelectionChanged,
            origin: item,
        });
        Ok(())
    }

    // ---- popouts ---------------------------------------------------------

    pub fn popouts(&self) -> &[PopoutRecord] {
        &self.popouts
    }

    /// Moves `item` into a popout window. The nearest ancestor that survives
    /// the removal is tagged so `pop_in` can find it again.
    pub fn create_popout(&mut self, item: NodeId) -> Result<Option<PopoutWindowId>> {
        if self.popout_host.is_none() {
            return Err(LayoutError::NoPopoutHost);
        }
        let content = self.tree.to_config(item)?;
        let rect = self.tree.node(item)?.rect();

        let mut child = item;
        let mut parent = self.tree.parent(item);
        while let Some(p) = parent {
            let node = self.tree.node(p)?;
            if node.children().len() != 1 || node.is_root() {
                break;
            }
            child = p;
            parent = node.parent();
        }
        let parent = parent.filter(|p| *p != self.tree.root());
        let (parent_id, index_in_parent) = match parent {
            Some(p) => {
                self.next_popout_parent += 1;
                let tag = format!("popout-parent-{}", self.next_popout_parent);
                self.tree.add_id(p, &tag)?;
                (Some(tag), Some(self.tree.child_index(p, child)?))
            }
            None => (None, None),
        };

        let tag = parent.zip(parent_id.clone());
        let opened = self.open_popout(PopoutConfig {
            dimensions: PopoutDimensions {
                left: rect.x,
                top: rect.y,
                width: rect.width,
                height: rect.height,
            },
            content: vec![content],
            parent_id,
            index_in_parent,
        });
        match opened {
            Ok(Some(window)) => {
                self.tree.remove(item)?;
                Ok(Some(window))
            }
            other => {
                if let Some((parent, tag)) = tag {
                    self.tree.remove_id(parent, &tag)?;
                }
                other
            }
        }
    }

    /// Pops out what the header's popout control targets: the whole stack or
    /// its active item.
    pub fn popout_from_header(&mut self, stack: NodeId) -> Result<Option<PopoutWindowId>> {
        let target = if self.tree.settings.popout_whole_stack {
            Some(stack)
        } else {
            self.tree.active_content_item(stack)?
        };
        match target {
            Some(target) => self.create_popout(target),
            None => Ok(None),
        }
    }

    fn open_popout(&mut self, mut config: PopoutConfig) -> Result<Option<PopoutWindowId>> {
        if config.dimensions.width <= 0.0 || config.dimensions.height <= 0.0 {
            config.dimensions.width = DEFAULT_POPOUT_WIDTH;
            config.dimensions.height = DEFAULT_POPOUT_HEIGHT;
        }
        let host = self.popout_host.as_mut().ok_or(LayoutError::NoPopoutHost)?;
        self.next_window += 1;
        let window = PopoutWindowId(self.next_window);
        if !host.open(window, &config) {
            if self.tree.settings.blocked_popouts_throw_error {
                return Err(LayoutError::PopoutBlocked);
            }
            return Ok(None);
        }
        tracing::debug!(window = window.0, parent = ?config.parent_id, "popout opened");
        self.popouts.push(PopoutRecord { window, config });
        self.tree.bus.emit(LayoutEvent {
            kind: EventKind::WindowOpened,
            origin: None,
        });
        self.tree.bus.propagate(LayoutEvent {
            kind: EventKind::StateChanged,
            origin: None,
        });
        Ok(Some(window))
    }

    /// Returns a popout's content to the layout and closes its window.
    pub fn pop_in(&mut self, window: PopoutWindowId) -> Result<Option<NodeId>> {
        let record = self.take_popout(window)?;
        if let Some(host) = self.popout_host.as_mut() {
            host.close(window);
        }
        let root = self.tree.root();
        let tagged = record
            .config
            .parent_id
            .as_deref()
            .and_then(|tag| self.tree.get_items_by_id(root, tag).first().copied());
        let (parent, index) = match tagged {
            Some(parent) => (parent, record.config.index_in_parent),
            None => {
                let fallback = self.tree.children(root).first().copied().unwrap_or(root);
                (fallback, Some(0))
            }
        };
        if let (Some(tag), Some(_)) = (record.config.parent_id.as_deref(), tagged) {
            self.tree.remove_id(parent, tag)?;
        }
        let added = match record.config.content.into_iter().next() {
            Some(content) => Some(self.tree.add_child(parent, content, index)?),
            None => None,
        };
        self.announce_window_closed();
        Ok(added)
    }

    /// Forgets a popout whose window was closed by the host.
    pub fn popout_closed(&mut self, window: PopoutWindowId) -> Result<()> {
        let record = self.take_popout(window)?;
        if let Some(tag) = record.config.parent_id.as_deref() {
            let root = self.tree.root();
            for parent in self.tree.get_items_by_id(root, tag) {
                self.tree.remove_id(parent, tag)?;
            }
        }
        self.announce_window_closed();
        Ok(())
    }

    fn take_popout(&mut self, window: PopoutWindowId) -> Result<PopoutRecord> {
        let index = self
            .popouts
            .iter()
            .position(|p| p.window == window)
            .ok_or(LayoutError::PopoutNotFound(window.0))?;
        Ok(self.popouts.remove(index))
    }

    fn announce_window_closed(&mut self) {
        self.tree.bus.emit(LayoutEvent {
            kind: EventKind::WindowClosed,
            origin: None,
        });
        self.tree.bus.propagate(LayoutEvent {
            kind: EventKind::StateChanged,
            origin: None,
        });
    }

    // ---- responsive columns ----------------------------------------------

    /// Folds the rightmost columns of a root row into the first stack when
    /// the container is too narrow for all of them at `min_item_width`.
    fn adjust_columns_responsive(&mut self) -> Result<()> {
        let mode = self.tree.settings.responsive_mode;
        let applies = mode == ResponsiveMode::Always
            || (mode == ResponsiveMode::Onload && self.first_load);
        let min = self.tree.dimensions.min_item_width;
        if !applies || min <= 0.0 {
            return Ok(());
        }
        let root = self.tree.root();
        let Some(row) = self.tree.children(root).first().copied() else {
            return Ok(());
        };
        if self.tree.item_type(row)? != ItemType::Row {
            return Ok(());
        }
        let columns = self.tree.children(row).to_vec();
        let width = self.tree.container().width;
        if columns.len() <= 1 || columns.len() as f64 * min <= width {
            return Ok(());
        }
        let keep = ((width / min).floor() as usize).max(1);
        let Some(target) = self
            .tree
            .get_items_by_type(columns[0], ItemType::Stack)
            .first()
            .copied()
            .or_else(|| {
                (self.tree.item_type(columns[0]).ok() == Some(ItemType::Stack))
                    .then_some(columns[0])
            })
        else {
            return Ok(());
        };
        tracing::debug!(columns = columns.len(), keep, width, "folding columns");
        for column in columns.into_iter().skip(keep).rev() {
            self.fold_into(target, column)?;
        }
        Ok(())
    }

    fn fold_into(&mut self, target: NodeId, node: NodeId) -> Result<()> {
        if !self.tree.contains(node) {
            return Ok(());
        }
        let children = self.tree.children(node).to_vec();
        if self.tree.item_type(node)? == ItemType::Stack {
            for child in children {
                if !self.tree.contains(node) {
                    break;
                }
                self.tree.remove_child(node, child, true)?;
                self.tree.add_child(target, child, None)?;
            }
        } else {
            for child in children {
                self.fold_into(target, child)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn flat() -> Dimensions {
        Dimensions {
            border_width: 0.0,
            min_item_width: 0.0,
            ..Dimensions::default()
        }
    }

    fn manager(content: ItemConfig) -> LayoutManager {
        let config = LayoutConfig::new(vec![content]).with_dimensions(flat());
        let mut manager = LayoutManager::new(config, ComponentRegistry::permissive()).unwrap();
        manager.init(Rect::new(0.0, 0.0, 1000.0, 600.0)).unwrap();
        manager
    }

    fn two_stacks() -> LayoutManager {
        manager(ItemConfig::row(vec![
            ItemConfig::component("a"),
            ItemConfig::component("b"),
        ]))
    }

    fn component(manager: &LayoutManager, name: &str) -> NodeId {
        manager.tree().get_components_by_name(manager.root(), name)[0]
    }

    #[derive(Default)]
    struct Host {
        opened: Rc<RefCell<Vec<PopoutWindowId>>>,
        closed: Rc<RefCell<Vec<PopoutWindowId>>>,
        block: bool,
    }

    impl PopoutHost for Host {
        fn open(&mut self, window: PopoutWindowId, _config: &PopoutConfig) -> bool {
            if !self.block {
                self.opened.borrow_mut().push(window);
            }
            !self.block
        }

        fn close(&mut self, window: PopoutWindowId) {
            self.closed.borrow_mut().push(window);
        }
    }

    #[test]
    fn drop_without_target_returns_to_the_parent() {
        let mut m = two_stacks();
        let a = component(&m, "a");
        let stack = m.tree().parent(a).unwrap();
        m.tree_mut()
            .add_child(stack, ItemConfig::component("c"), None)
            .unwrap();
        m.start_drag(a, 5000.0, 5000.0).unwrap();
        assert!(m.tree().parent(a).is_none());
        let outcome = m.drop_item().unwrap();
        assert_eq!(outcome, Some(DropOutcome::Returned { parent: stack }));
        assert_eq!(m.tree().parent(a), Some(stack));
    }

    #[test]
    fn dropping_on_another_header_moves_the_tab() {
        let mut m = two_stacks();
        let a = component(&m, "a");
        let b = component(&m, "b");
        let target = m.tree().parent(b).unwrap();
        let header = m.tree().stack_state(target).unwrap().header.rect;
        m.start_drag(a, 100.0, 300.0).unwrap();
        m.drag_to(header.x + 150.0, header.y + header.height / 2.0);
        let outcome = m.drop_item().unwrap();
        assert!(matches!(outcome, Some(DropOutcome::Dropped { .. })));
        assert_eq!(m.tree().parent(a), m.tree().parent(b));
        assert_eq!(m.tree().children(m.tree().parent(b).unwrap()), &[b, a]);
    }

    #[test]
    fn a_second_drag_is_rejected() {
        let mut m = two_stacks();
        let a = component(&m, "a");
        let b = component(&m, "b");
        m.start_drag(a, 10.0, 10.0).unwrap();
        assert!(matches!(
            m.start_drag(b, 10.0, 10.0),
            Err(LayoutError::DragInProgress)
        ));
    }

    #[test]
    fn state_changes_coalesce_per_frame() {
        let mut m = two_stacks();
        let count = Rc::new(RefCell::new(0));
        let c = count.clone();
        m.subscribe(Some(EventKind::StateChanged), move |_| *c.borrow_mut() += 1);
        m.next_frame().unwrap();
        *count.borrow_mut() = 0;

        let a = component(&m, "a");
        let b = component(&m, "b");
        m.tree_mut().set_title(a, "one").unwrap();
        m.tree_mut().set_title(b, "two").unwrap();
        assert_eq!(*count.borrow(), 0);
        m.next_frame().unwrap();
        assert_eq!(*count.borrow(), 1);
        m.next_frame().unwrap();
        assert_eq!(*count.borrow(), 1);
    }

    #[test]
    fn maximise_fills_the_container_and_round_trips() {
        let mut m = two_stacks();
        let a = component(&m, "a");
        let stack = m.tree().parent(a).unwrap();
        m.toggle_maximise(stack).unwrap();
        assert_eq!(m.tree().node(stack).unwrap().rect().width, 1000.0);
        let config = m.to_config().unwrap();
        assert_eq!(config.maximised_item_id.as_deref(), Some(MAXIMISED_ITEM_ID));

        m.toggle_maximise(stack).unwrap();
        assert_eq!(m.maximised_item(), None);
        assert_eq!(m.tree().node(stack).unwrap().rect().width, 500.0);
        assert!(!m.tree().has_id(stack, MAXIMISED_ITEM_ID));
    }

    #[test]
    fn selection_requires_the_setting() {
        let mut m = two_stacks();
        let a = component(&m, "a");
        assert!(matches!(
            m.select_item(Some(a)),
            Err(LayoutError::SelectionDisabled)
        ));
        m.tree_mut().settings.selection_enabled = true;
        m.select_item(Some(a)).unwrap();
        assert!(m.tree().node(a).unwrap().is_selected());
        m.select_item(None).unwrap();
        assert!(!m.tree().node(a).unwrap().is_selected());
    }

    #[test]
    fn popout_and_pop_in_restore_the_item() {
        let mut m = manager(ItemConfig::row(vec![
            ItemConfig::stack(vec![ItemConfig::component("a"), ItemConfig::component("c")]),
            ItemConfig::component("b"),
        ]));
        let host = Host::default();
        let opened = host.opened.clone();
        let closed = host.closed.clone();
        m.set_popout_host(Box::new(host));

        let c = component(&m, "c");
        let window = m.create_popout(c).unwrap().unwrap();
        assert_eq!(opened.borrow().as_slice(), &[window]);
        assert!(m.tree().get_components_by_name(m.root(), "c").is_empty());
        assert_eq!(m.to_config().unwrap().open_popouts.len(), 1);

        let restored = m.pop_in(window).unwrap().unwrap();
        assert_eq!(closed.borrow().as_slice(), &[window]);
        let a = component(&m, "a");
        assert_eq!(m.tree().parent(restored), m.tree().parent(a));
        assert!(m.popouts().is_empty());
    }

    #[test]
    fn blocked_popouts_follow_the_setting() {
        let mut m = two_stacks();
        m.set_popout_host(Box::new(Host {
            block: true,
            ..Host::default()
        }));
        let a = component(&m, "a");
        assert!(matches!(m.create_popout(a), Err(LayoutError::PopoutBlocked)));

        let mut m = two_stacks();
        m.tree_mut().settings.blocked_popouts_throw_error = false;
        m.set_popout_host(Box::new(Host {
            block: true,
            ..Host::default()
        }));
        let b = component(&m, "b");
        assert_eq!(m.create_popout(b).unwrap(), None);
    }

    #[test]
    fn narrow_containers_fold_columns_on_load() {
        let config = LayoutConfig::new(vec![ItemConfig::row(vec![
            ItemConfig::component("a"),
            ItemConfig::component("b"),
            ItemConfig::component("c"),
        ])])
        .with_dimensions(Dimensions {
            border_width: 0.0,
            min_item_width: 400.0,
            ..Dimensions::default()
        });
        let mut m = LayoutManager::new(config, ComponentRegistry::permissive()).unwrap();
        m.init(Rect::new(0.0, 0.0, 900.0, 600.0)).unwrap();

        let row = m.tree().children(m.root())[0];
        assert_eq!(m.tree().children(row).len(), 2);
        let a = component(&m, "a");
        let c = component(&m, "c");
        assert_eq!(m.tree().parent(a), m.tree().parent(c));
    }

    #[test]
    fn sub_windows_keep_a_bare_top_component() {
        let config = LayoutConfig::new(vec![ItemConfig::component("a")]).with_dimensions(flat());
        let mut m = LayoutManager::sub_window(config.clone(), ComponentRegistry::permissive())
            .unwrap();
        m.init(Rect::new(0.0, 0.0, 500.0, 309.0)).unwrap();
        let top = m.tree().children(m.root())[0];
        assert_eq!(m.tree().item_type(top).unwrap(), ItemType::Component);
        assert_eq!(m.tree().node(top).unwrap().rect(), Rect::new(0.0, 0.0, 500.0, 309.0));

        let mut m = LayoutManager::new(config, ComponentRegistry::permissive()).unwrap();
        m.init(Rect::new(0.0, 0.0, 500.0, 309.0)).unwrap();
        let top = m.tree().children(m.root())[0];
        assert_eq!(m.tree().item_type(top).unwrap(), ItemType::Stack);
    }

    #[test]
    fn drags_need_an_initialised_layout() {
        let config = LayoutConfig::new(vec![ItemConfig::component("a")]);
        let mut m = LayoutManager::new(config, ComponentRegistry::permissive()).unwrap();
        assert!(matches!(
            m.start_external_drag(ItemConfig::component("b"), 0.0, 0.0),
            Err(LayoutError::NotInitialised)
        ));
        assert!(m.drag().is_none());
    }

    #[test]
    fn destroy_empties_the_tree() {
        let mut m = two_stacks();
        m.destroy();
        assert!(!m.is_initialised());
        assert!(m.tree().children(m.root()).is_empty());
    }
}
