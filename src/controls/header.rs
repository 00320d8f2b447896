//! Tab strip of a stack.
//!
//! The header keeps one [`Tab`] per child of its stack, in the same order,
//! and lays tabs out along its long axis: left to right for top and bottom
//! headers, top to bottom for left and right headers.

use crate::constants::EMPTY_HEADER_HIGHLIGHT_WIDTH;
use crate::error::{LayoutError, Result};
use crate::geometry::{Rect, Side};
use crate::items::NodeId;

#[derive(Debug, Clone, PartialEq)]
pub struct Tab {
    pub content_item: NodeId,
    pub title: String,
    pub is_active: bool,
    pub is_closable: bool,
    /// Empty when the tab does not fit in the strip.
    pub rect: Rect,
    pub close_rect: Option<Rect>,
}

impl Tab {
    fn new(content_item: NodeId, title: String, is_closable: bool) -> Self {
        Self {
            content_item,
            title,
            is_active: false,
            is_closable,
            rect: Rect::default(),
            close_rect: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderControl {
    Popout,
    Maximise,
    Close,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Header {
    pub tabs: Vec<Tab>,
    pub side: Side,
    pub show: bool,
    pub rect: Rect,
    /// Whether the stack itself may show a close control.
    pub can_close: bool,
    /// Result of the last closability validation.
    pub close_visible: bool,
    pub show_popout: bool,
    pub show_maximise: bool,
    pub controls: Vec<(HeaderControl, Rect)>,
}

/// Where a tab dropped on the header would land.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeaderDrop {
    pub index: usize,
    pub highlight: Rect,
}

impl Header {
    pub fn new(side: Side, show: bool) -> Self {
        Self {
            tabs: Vec::new(),
            side,
            show,
            rect: Rect::default(),
            can_close: true,
            close_visible: true,
            show_popout: false,
            show_maximise: false,
            controls: Vec::new(),
        }
    }

    pub fn create_tab(&mut self, item: NodeId, title: String, closable: bool, index: Option<usize>) {
        let index = index.unwrap_or(self.tabs.len()).min(self.tabs.len());
        self.tabs.insert(index, Tab::new(item, title, closable));
    }

    pub fn remove_tab(&mut self, item: NodeId) -> Result<Tab> {
        let index = self
            .tab_index(item)
            .ok_or(LayoutError::TabNotFound(item))?;
        Ok(self.tabs.remove(index))
    }

    pub fn tab_index(&self, item: NodeId) -> Option<usize> {
        self.tabs.iter().position(|tab| tab.content_item == item)
    }

    pub fn tab_mut(&mut self, item: NodeId) -> Option<&mut Tab> {
        self.tabs.iter_mut().find(|tab| tab.content_item == item)
    }

    pub fn set_active(&mut self, item: NodeId) -> Result<usize> {
        let index = self
            .tab_index(item)
            .ok_or(LayoutError::TabNotFound(item))?;
        for (i, tab) in self.tabs.iter_mut().enumerate() {
            tab.is_active = i == index;
        }
        Ok(index)
    }

    pub fn active_item(&self) -> Option<NodeId> {
        self.tabs
            .iter()
            .find(|tab| tab.is_active)
            .map(|tab| tab.content_item)
    }

    fn is_vertical(&self) -> bool {
        self.side.is_sided()
    }

    /// Lays out controls at the far end of the strip and tabs from its start.
    pub fn layout(&mut self, rect: Rect, tab_width: f64, thickness: f64) {
        self.rect = rect;
        self.controls.clear();
        if !self.show || rect.is_empty() {
            for tab in &mut self.tabs {
                tab.rect = Rect::default();
                tab.close_rect = None;
            }
            return;
        }

        let vertical = self.is_vertical();
        let length = if vertical { rect.height } else { rect.width };
        let mut wanted = Vec::new();
        if self.show_popout {
            wanted.push(HeaderControl::Popout);
        }
        if self.show_maximise {
            wanted.push(HeaderControl::Maximise);
        }
        if self.close_visible {
            wanted.push(HeaderControl::Close);
        }
        let control_size = thickness.max(1.0);
        let mut end = length;
        for control in wanted.into_iter().rev() {
            if end - control_size < 0.0 {
                break;
            }
            end -= control_size;
            let r = if vertical {
                Rect::new(rect.x, rect.y + end, rect.width, control_size)
            } else {
                Rect::new(rect.x + end, rect.y, control_size, rect.height)
            };
            self.controls.insert(0, (control, r));
        }

        let mut cursor = 0.0;
        for tab in &mut self.tabs {
            if cursor + tab_width > end {
                tab.rect = Rect::default();
                tab.close_rect = None;
                continue;
            }
            tab.rect = if vertical {
                Rect::new(rect.x, rect.y + cursor, rect.width, tab_width)
            } else {
                Rect::new(rect.x + cursor, rect.y, tab_width, rect.height)
            };
            tab.close_rect = tab.is_closable.then(|| {
                if vertical {
                    Rect::new(rect.x, tab.rect.bottom() - control_size, rect.width, control_size)
                } else {
                    Rect::new(tab.rect.right() - control_size, rect.y, control_size, rect.height)
                }
            });
            cursor += tab_width;
        }
    }

    fn axis_start(&self, r: &Rect) -> f64 {
        if self.is_vertical() { r.y } else { r.x }
    }

    fn axis_len(&self, r: &Rect) -> f64 {
        if self.is_vertical() { r.height } else { r.width }
    }

    /// Span covered by the laid-out tabs along the header axis.
    fn tabs_span(&self) -> Option<(f64, f64)> {
        let visible = self.tabs.iter().filter(|t| !t.rect.is_empty());
        let mut span: Option<(f64, f64)> = None;
        for tab in visible {
            let start = self.axis_start(&tab.rect);
            let end = start + self.axis_len(&tab.rect);
            span = Some(match span {
                None => (start, end),
                Some((s, e)) => (s.min(start), e.max(end)),
            });
        }
        span
    }

    /// Insertion index for a tab dropped at `position` along the header
    /// axis. A drop before a tab's midpoint lands in front of it.
    pub fn drop_index(&self, position: f64, tab_width: f64) -> HeaderDrop {
        let header_start = self.axis_start(&self.rect);
        let Some((start, end)) = self.tabs_span() else {
            let highlight = self.highlight_at(header_start, EMPTY_HEADER_HIGHLIGHT_WIDTH);
            return HeaderDrop {
                index: 0,
                highlight,
            };
        };

        let x = position.clamp(start + 1.0, (end - 1.0).max(start + 1.0));
        let laid_out: Vec<(usize, &Tab)> = self
            .tabs
            .iter()
            .enumerate()
            .filter(|(_, t)| !t.rect.is_empty())
            .collect();
        let mut found = laid_out
            .iter()
            .find(|(_, t)| {
                let s = self.axis_start(&t.rect);
                s < x && x < s + self.axis_len(&t.rect)
            })
            .copied();
        if found.is_none() {
            found = laid_out
                .iter()
                .rev()
                .find(|(_, t)| self.axis_start(&t.rect) <= x)
                .copied();
        }

        let (index, insert_at) = match found {
            Some((i, tab)) => {
                let s = self.axis_start(&tab.rect);
                let len = self.axis_len(&tab.rect);
                if x < s + len * 0.5 {
                    (i, s)
                } else {
                    ((i + 1).min(self.tabs.len()), s + len)
                }
            }
            None => (0, start),
        };

        let from = insert_at.max(start);
        let to = (from + tab_width).min(self.axis_start(&self.rect) + self.axis_len(&self.rect));
        HeaderDrop {
            index,
            highlight: self.highlight_at(from, (to - from).max(0.0)),
        }
    }

    fn highlight_at(&self, from: f64, length: f64) -> Rect {
        if self.is_vertical() {
            Rect::new(self.rect.x, from, self.rect.width, length)
        } else {
            Rect::new(from, self.rect.y, length, self.rect.height)
        }
    }

    pub fn tab_at(&self, x: f64, y: f64) -> Option<&Tab> {
        self.tabs.iter().find(|t| {
            let r = t.rect;
            !r.is_empty() && x >= r.x && x < r.right() && y >= r.y && y < r.bottom()
        })
    }

    pub fn control_at(&self, x: f64, y: f64) -> Option<HeaderControl> {
        self.controls
            .iter()
            .find(|(_, r)| x >= r.x && x < r.right() && y >= r.y && y < r.bottom())
            .map(|(c, _)| *c)
    }
}
