//! Stacks: tabbed containers with a header and a single visible child.

use crate::config::{HeaderConfig, HeaderLabel, HeaderShow, ItemConfig, ItemType};
use crate::constants::SIDE_SEGMENT_FRACTION;
use crate::controls::{DropSegment, DropZone, Header, StackDrop};
use crate::error::{LayoutError, Result};
use crate::events::{EventKind, LayoutEvent};
use crate::geometry::{ItemArea, Rect, Side};

use super::{LayoutTree, Lifecycle, NewChild, NodeId, Orientation};

#[derive(Debug, Clone)]
pub struct StackState {
    pub header: Header,
    pub(crate) active: Option<NodeId>,
    /// Header settings after layering global, stack and first-child values.
    pub resolved_header: HeaderConfig,
    /// Area left for the active child once the header is placed.
    pub content_rect: Rect,
}

impl StackState {
    pub fn active(&self) -> Option<NodeId> {
        self.active
    }

    pub fn side(&self) -> Side {
        self.header.side
    }

    /// Result of the last closability validation.
    pub fn is_closable(&self) -> bool {
        self.header.can_close
    }

    fn has_close_label(&self) -> bool {
        self.resolved_header
            .close
            .as_ref()
            .is_some_and(|label| !label.is_hidden())
    }
}

fn label(enabled: bool, text: &str) -> HeaderLabel {
    if enabled {
        HeaderLabel::Text(text.to_string())
    } else {
        HeaderLabel::Visible(false)
    }
}

fn show_to_side(show: Option<HeaderShow>) -> (bool, Side) {
    match show {
        Some(HeaderShow::Enabled(false)) => (false, Side::Top),
        Some(HeaderShow::Position(side)) => (true, side),
        Some(HeaderShow::Enabled(true)) | None => (true, Side::Top),
    }
}

impl LayoutTree {
    pub(crate) fn new_stack_state(
        &self,
        config: &ItemConfig,
        first_child: Option<&ItemConfig>,
    ) -> StackState {
        let settings = &self.settings;
        let labels = &self.labels;
        let base = HeaderConfig {
            show: Some(HeaderShow::Enabled(
                settings.has_headers && config.has_headers != Some(false),
            )),
            popout: Some(label(settings.show_popout_icon, &labels.popout)),
            maximise: Some(label(settings.show_maximise_icon, &labels.maximise)),
            minimise: Some(HeaderLabel::Text(labels.minimise.clone())),
            close: Some(label(settings.show_close_icon, &labels.close)),
        };
        let mut resolved = base;
        for layer in [
            self.header.as_ref(),
            config.header.as_ref(),
            first_child.and_then(|c| c.header.as_ref()),
        ]
        .into_iter()
        .flatten()
        {
            resolved = resolved.merged(layer);
        }

        let (show, side) = show_to_side(resolved.show);
        let mut header = Header::new(side, show);
        header.show_popout = resolved.popout.as_ref().is_some_and(|l| !l.is_hidden());
        header.show_maximise = resolved.maximise.as_ref().is_some_and(|l| !l.is_hidden());
        StackState {
            header,
            active: None,
            resolved_header: resolved,
            content_rect: Rect::default(),
        }
    }

    pub fn stack_state(&self, id: NodeId) -> Result<&StackState> {
        let item = self.node(id)?;
        item.as_stack().ok_or_else(|| LayoutError::WrongItemType {
            node: id,
            expected: "stack",
            found: item.item_type().as_str(),
        })
    }

    fn stack_state_mut(&mut self, id: NodeId) -> Result<&mut StackState> {
        let item = self.node_mut(id)?;
        let found = item.item_type().as_str();
        item.as_stack_mut().ok_or(LayoutError::WrongItemType {
            node: id,
            expected: "stack",
            found,
        })
    }

    pub(crate) fn stack_init(&mut self, id: NodeId) -> Result<()> {
        self.base_init(id)?;
        let children = self.children(id).to_vec();
        for child in &children {
            let (title, closable) = {
                let item = self.node(*child)?;
                (item.state.title.clone(), item.state.is_closable)
            };
            let stack = self.stack_state_mut(id)?;
            if stack.header.tab_index(*child).is_none() {
                stack.header.create_tab(*child, title, closable, None);
            }
            self.hide_item(*child)?;
        }

        if !children.is_empty() {
            let index = self.node(id)?.state.active_item_index.unwrap_or(0);
            let initial = *children
                .get(index)
                .ok_or(LayoutError::ActiveItemIndexOutOfBounds {
                    index,
                    len: children.len(),
                })?;
            self.set_active_content_item(id, initial)?;
        }
        self.validate_closability(id)?;
        self.stack_set_size(id)
    }

    /// Places the header on its side and gives the rest to the children.
    pub(crate) fn stack_set_size(&mut self, id: NodeId) -> Result<()> {
        let rect = self.node(id)?.surface.rect;
        let header_height = self.dimensions.header_height;
        let tab_width = self.dimensions.tab_width;
        let stack = self.stack_state_mut(id)?;
        let size = if stack.header.show { header_height } else { 0.0 };
        let (header_rect, content_rect) = match stack.header.side {
            Side::Top => (
                Rect::new(rect.x, rect.y, rect.width, size),
                Rect::new(rect.x, rect.y + size, rect.width, (rect.height - size).max(0.0)),
            ),
            Side::Bottom => (
                Rect::new(rect.x, rect.bottom() - size, rect.width, size),
                Rect::new(rect.x, rect.y, rect.width, (rect.height - size).max(0.0)),
            ),
            Side::Left => (
                Rect::new(rect.x, rect.y, size, rect.height),
                Rect::new(rect.x + size, rect.y, (rect.width - size).max(0.0), rect.height),
            ),
            Side::Right => (
                Rect::new(rect.right() - size, rect.y, size, rect.height),
                Rect::new(rect.x, rect.y, (rect.width - size).max(0.0), rect.height),
            ),
        };
        stack.header.layout(header_rect, tab_width, header_height);
        stack.content_rect = content_rect;
        for child in self.children(id).to_vec() {
            self.node_mut(child)?.surface.rect = content_rect;
        }
        self.emit_local(id, EventKind::Resize);
        self.emit_bubbling_event(id, EventKind::StateChanged);
        Ok(())
    }

    /// Shows `item` and hides the previously active child.
    pub fn set_active_content_item(&mut self, id: NodeId, item: NodeId) -> Result<()> {
        self.child_index(id, item)?;
        let previous = self.stack_state(id)?.active;
        if let Some(previous) = previous
            && previous != item
            && self.contains(previous)
        {
            self.hide_item(previous)?;
        }
        let stack = self.stack_state_mut(id)?;
        let index = stack.header.set_active(item)?;
        stack.active = Some(item);
        self.node_mut(id)?.state.active_item_index = Some(index);

        self.call_downwards(item, Lifecycle::Show, false, false)?;
        self.call_downwards(item, Lifecycle::SetSize, false, false)?;
        if let Some(component) = self.node_mut(item)?.as_component_mut() {
            component.notify(super::ContainerEvent::Tab);
        }
        self.emit_local(id, EventKind::ActiveContentItemChanged);
        self.bus.emit(LayoutEvent {
            kind: EventKind::ActiveContentItemChanged,
            origin: Some(item),
        });
        self.emit_bubbling_event(id, EventKind::StateChanged);
        Ok(())
    }

    pub fn active_content_item(&self, id: NodeId) -> Result<Option<NodeId>> {
        Ok(self.stack_state(id)?.active)
    }

    pub(crate) fn stack_add_child(
        &mut self,
        id: NodeId,
        child: NewChild,
        index: Option<usize>,
    ) -> Result<NodeId> {
        self.stack_state(id)?;
        let child = self.resolve_child(id, child)?;
        let index = self.base_add_child(id, child, index)?;
        let (title, closable) = {
            let item = self.node(child)?;
            (item.state.title.clone(), item.state.is_closable)
        };
        self.stack_state_mut(id)?
            .header
            .create_tab(child, title, closable, Some(index));
        self.bus.emit(LayoutEvent {
            kind: EventKind::TabCreated,
            origin: Some(child),
        });
        self.set_active_content_item(id, child)?;
        self.call_downwards(id, Lifecycle::SetSize, false, false)?;
        self.validate_closability(id)?;
        self.emit_bubbling_event(id, EventKind::StateChanged);
        Ok(child)
    }

    /// Removes a child and its tab. If the child was active, the tab before
    /// it (or the first remaining one) becomes active.
    pub(crate) fn stack_remove_child(
        &mut self,
        id: NodeId,
        child: NodeId,
        keep_child: bool,
    ) -> Result<()> {
        let index = self.child_index(id, child)?;
        let was_active = self.stack_state(id)?.active == Some(child);
        self.stack_state_mut(id)?.header.remove_tab(child)?;

        if was_active {
            let remaining: Vec<NodeId> = self
                .children(id)
                .iter()
                .copied()
                .filter(|c| *c != child)
                .collect();
            match remaining.get(index.saturating_sub(1)) {
                Some(next) => self.set_active_content_item(id, *next)?,
                None => {
                    self.stack_state_mut(id)?.active = None;
                    self.node_mut(id)?.state.active_item_index = None;
                }
            }
        }

        self.base_remove_child(id, child, keep_child)?;
        if self.contains(id) {
            if let Some(active) = self.stack_state(id)?.active {
                let at = self.child_index(id, active)?;
                self.node_mut(id)?.state.active_item_index = Some(at);
            }
            self.validate_closability(id)?;
            self.stack_set_size(id)?;
        }
        Ok(())
    }

    /// The stack can be closed only if it and every child are closable. The
    /// close control is shown only when a close label is configured too.
    pub(crate) fn validate_closability(&mut self, id: NodeId) -> Result<bool> {
        let own = self.node(id)?.state.is_closable && self.settings.show_close_icon;
        let closable = own
            && self
                .children(id)
                .iter()
                .filter_map(|c| self.get(*c))
                .all(|item| item.state.is_closable);
        let stack = self.stack_state_mut(id)?;
        stack.header.can_close = closable;
        stack.header.close_visible = closable && stack.has_close_label();
        Ok(closable)
    }

    pub fn is_stack_closable(&self, id: NodeId) -> Result<bool> {
        Ok(self.stack_state(id)?.is_closable())
    }

    /// Handles the stack's close control. Returns false when the stack is
    /// not closable.
    pub fn close_stack(&mut self, id: NodeId) -> Result<bool> {
        if !self.is_stack_closable(id)? {
            return Ok(false);
        }
        tracing::debug!(node = ?id, "closing stack");
        self.remove(id)?;
        Ok(true)
    }

    /// Moves the header to `show`'s side, or hides it.
    pub fn set_header_position(&mut self, id: NodeId, show: HeaderShow) -> Result<()> {
        let (visible, side) = show_to_side(Some(show));
        let stack = self.stack_state_mut(id)?;
        stack.header.show = visible;
        stack.header.side = side;
        stack.resolved_header.show = Some(show);
        self.stack_set_size(id)?;
        self.call_downwards(id, Lifecycle::SetSize, false, true)
    }

    /// Drop zones of a visible stack, plus the area it registers for the
    /// drag.
    pub(crate) fn stack_drop_zones(&self, id: NodeId) -> Option<(ItemArea, Vec<DropZone>)> {
        if !self.is_visible(id) {
            return None;
        }
        let item = self.get(id)?;
        let stack = item.as_stack()?;
        let header_rect = stack.header.rect;
        let mut zones = vec![DropZone::uniform(DropSegment::Header, header_rect)];

        let active_is_container = stack
            .active
            .and_then(|a| self.get(a))
            .is_some_and(|a| a.item_type() != ItemType::Component);
        if active_is_container {
            return Some((ItemArea::from_rect(header_rect, id), zones));
        }

        let content = stack.content_rect;
        if item.children.is_empty() {
            zones.push(DropZone::uniform(DropSegment::Body, content));
            return Some((ItemArea::from_rect(item.surface.rect, id), zones));
        }

        let Rect {
            x,
            y,
            width: w,
            height: h,
        } = content;
        let segment = w * SIDE_SEGMENT_FRACTION;
        let half_w = w * 0.5;
        let half_h = h * 0.5;
        zones.push(DropZone::new(
            DropSegment::Left,
            Rect::new(x, y, segment, h),
            Rect::new(x, y, half_w, h),
        ));
        zones.push(DropZone::new(
            DropSegment::Top,
            Rect::new(x + segment, y, w - 2.0 * segment, half_h),
            Rect::new(x, y, w, half_h),
        ));
        zones.push(DropZone::new(
            DropSegment::Right,
            Rect::new(x + w - segment, y, segment, h),
            Rect::new(x + half_w, y, w - half_w, h),
        ));
        zones.push(DropZone::new(
            DropSegment::Bottom,
            Rect::new(x + segment, y + half_h, w - 2.0 * segment, h - half_h),
            Rect::new(x, y + half_h, w, h - half_h),
        ));
        Some((ItemArea::from_rect(item.surface.rect, id), zones))
    }

    /// Resolves the zone under the pointer to a drop target and the rect to
    /// highlight. Header drops carry the tab insertion index.
    pub(crate) fn stack_highlight(
        &self,
        id: NodeId,
        zone: DropZone,
        x: f64,
        y: f64,
    ) -> Option<(StackDrop, Rect)> {
        if zone.segment != DropSegment::Header {
            return Some((
                StackDrop {
                    segment: zone.segment,
                    index: None,
                },
                zone.highlight,
            ));
        }
        let header = &self.get(id)?.as_stack()?.header;
        let position = if header.side.is_sided() { y } else { x };
        let drop = header.drop_index(position, self.dimensions.tab_width);
        Some((
            StackDrop {
                segment: DropSegment::Header,
                index: Some(drop.index),
            },
            drop.highlight,
        ))
    }

    /// Executes a drop of the detached `item` onto the stack. Side drops split
    /// the stack's slot with a new stack holding `item`.
    pub(crate) fn stack_on_drop(
        &mut self,
        id: NodeId,
        item: NodeId,
        drop: Option<StackDrop>,
    ) -> Result<()> {
        let drop = drop.unwrap_or(StackDrop {
            segment: DropSegment::Header,
            index: None,
        });
        let side = match drop.segment {
            DropSegment::Header => {
                self.stack_add_child(id, item.into(), drop.index)?;
                return Ok(());
            }
            DropSegment::Body => {
                self.stack_add_child(id, item.into(), None)?;
                return Ok(());
            }
            DropSegment::Left => Side::Left,
            DropSegment::Top => Side::Top,
            DropSegment::Right => Side::Right,
            DropSegment::Bottom => Side::Bottom,
        };
        let Some(parent) = self.parent(id) else {
            self.stack_add_child(id, item.into(), None)?;
            return Ok(());
        };

        let orientation = Orientation::from_side(side);
        let before = side.is_before();
        let item = self.wrap_in_stack(id, item)?;

        if self.orientation_of(parent) == Some(orientation) {
            let index = self.child_index(parent, id)?;
            let at = if before { index } else { index + 1 };
            self.row_or_column_add_child(parent, item.into(), Some(at), true)?;
            let half = self
                .node(id)?
                .state
                .size(orientation)
                .map(|size| size * 0.5);
            self.node_mut(id)?.state.set_size(orientation, half);
            self.node_mut(item)?.state.set_size(orientation, half);
            self.call_downwards(parent, Lifecycle::SetSize, false, false)?;
        } else {
            let container =
                self.create_content_item(orientation.empty_config(), Some(id))?;
            self.replace_child(parent, id, container, false)?;
            self.row_or_column_add_child(container, item.into(), before.then_some(0), true)?;
            self.row_or_column_add_child(container, id.into(), (!before).then_some(0), true)?;
            self.node_mut(id)?.state.set_size(orientation, Some(50.0));
            self.node_mut(item)?.state.set_size(orientation, Some(50.0));
            self.call_downwards(container, Lifecycle::SetSize, false, false)?;
        }
        tracing::debug!(stack = ?id, item = ?item, side = ?side, "split stack on drop");
        Ok(())
    }

    /// Wraps a detached component in a fresh initialised stack. Anything else
    /// is returned unchanged.
    pub(crate) fn wrap_in_stack(&mut self, context: NodeId, item: NodeId) -> Result<NodeId> {
        if self.item_type(item)? != ItemType::Component {
            return Ok(item);
        }
        let mut config = ItemConfig::stack(Vec::new());
        config.header = Some(self.node(item)?.state.header.clone().unwrap_or_default());
        let stack = self.create_content_item(config, Some(context))?;
        self.call_downwards(stack, Lifecycle::Init, false, false)?;
        self.stack_add_child(stack, item.into(), None)?;
        Ok(stack)
    }
}
