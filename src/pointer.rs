//! Mouse input for the terminal front-end.
//!
//! Translates crossterm mouse events into manager operations: splitter
//! drags, header controls, tab activation and tab drags. Cell coordinates
//! are mapped to the centre of the cell so strict hit tests on area edges
//! behave the same as with sub-cell pointers.

use crossterm::event::{Event, MouseButton, MouseEventKind};

use crate::controls::HeaderControl;
use crate::error::Result;
use crate::items::NodeId;
use crate::manager::LayoutManager;

/// Tab pressed but not yet dragged far enough to pick it up.
#[derive(Debug, Clone, Copy, PartialEq)]
struct PendingTab {
    item: NodeId,
    x: f64,
    y: f64,
}

#[derive(Debug, Default)]
pub struct PointerState {
    pending_tab: Option<PendingTab>,
    hover: Option<(u16, u16)>,
}

impl PointerState {
    pub fn hover(&self) -> Option<(u16, u16)> {
        self.hover
    }
}

fn cell_centre(column: u16, row: u16) -> (f64, f64) {
    (column as f64 + 0.5, row as f64 + 0.5)
}

enum HeaderHit {
    Control(NodeId, HeaderControl),
    Tab {
        item: NodeId,
        on_close: bool,
    },
}

impl LayoutManager {
    /// Handles one terminal event. Returns true when the layout changed and
    /// needs a repaint.
    pub fn handle_event(&mut self, pointer: &mut PointerState, event: &Event) -> Result<bool> {
        let Event::Mouse(mouse) = event else {
            return Ok(false);
        };
        pointer.hover = Some((mouse.column, mouse.row));
        let (x, y) = cell_centre(mouse.column, mouse.row);
        match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => {
                if let Some((owner, index)) = self.splitter_at(x, y) {
                    self.start_splitter_drag(owner, index, x, y)?;
                    return Ok(true);
                }
                match self.header_hit(x, y) {
                    Some(HeaderHit::Control(stack, control)) => {
                        self.run_header_control(stack, control)?;
                        return Ok(true);
                    }
                    Some(HeaderHit::Tab {
                        item,
                        on_close: true,
                    }) => {
                        return self.tree_mut().close_component(item);
                    }
                    Some(HeaderHit::Tab { item, .. }) => {
                        if let Some(stack) = self.tree().parent(item) {
                            self.tree_mut().set_active_content_item(stack, item)?;
                        }
                        pointer.pending_tab = Some(PendingTab { item, x, y });
                        return Ok(true);
                    }
                    None => {}
                }
            }
            MouseEventKind::Down(MouseButton::Middle) => {
                if let Some(HeaderHit::Tab { item, .. }) = self.header_hit(x, y) {
                    return self.tree_mut().close_component(item);
                }
            }
            MouseEventKind::Drag(_) => {
                if self.is_dragging_splitter() {
                    return Ok(self.drag_splitter(x, y)?.is_some());
                }
                if self.drag().is_some() {
                    self.drag_to(x, y);
                    return Ok(true);
                }
                if let Some(pending) = pointer.pending_tab
                    && (pending.x != x || pending.y != y)
                {
                    pointer.pending_tab = None;
                    if self.can_reorder(pending.item) {
                        self.start_drag(pending.item, x, y)?;
                        return Ok(true);
                    }
                }
            }
            MouseEventKind::Up(_) => {
                pointer.pending_tab = None;
                if self.is_dragging_splitter() {
                    self.stop_splitter_drag()?;
                    return Ok(true);
                }
                if self.drag().is_some() {
                    self.drop_item()?;
                    return Ok(true);
                }
            }
            MouseEventKind::Moved => {}
            _ => {}
        }
        Ok(false)
    }

    fn can_reorder(&self, item: NodeId) -> bool {
        self.tree().settings().reorder_enabled
            && self
                .tree()
                .get(item)
                .is_some_and(|node| node.state.reorder_enabled)
    }

    /// Topmost header element under the pointer. With an item maximised only
    /// that item's headers are considered.
    fn header_hit(&self, x: f64, y: f64) -> Option<HeaderHit> {
        let scope = self.maximised_item().unwrap_or_else(|| self.root());
        let mut stacks = self
            .tree()
            .get_items_by_filter(scope, |item| item.as_stack().is_some());
        if self.tree().get(scope).is_some_and(|item| item.as_stack().is_some()) {
            stacks.push(scope);
        }
        stacks.into_iter().rev().find_map(|id| {
            if !self.tree().is_visible(id) {
                return None;
            }
            let header = &self.tree().get(id)?.as_stack()?.header;
            if !header.show {
                return None;
            }
            if let Some(control) = header.control_at(x, y) {
                return Some(HeaderHit::Control(id, control));
            }
            let tab = header.tab_at(x, y)?;
            let on_close = tab.close_rect.is_some_and(|r| {
                x >= r.x && x < r.right() && y >= r.y && y < r.bottom()
            });
            Some(HeaderHit::Tab {
                item: tab.content_item,
                on_close,
            })
        })
    }

    fn run_header_control(&mut self, stack: NodeId, control: HeaderControl) -> Result<()> {
        tracing::debug!(stack = ?stack, control = ?control, "header control");
        match control {
            HeaderControl::Close => {
                self.tree_mut().close_stack(stack)?;
            }
            HeaderControl::Maximise => self.toggle_maximise(stack)?,
            HeaderControl::Popout => {
                self.popout_from_header(stack)?;
            }
        }
        Ok(())
    }
}
