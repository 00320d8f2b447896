use serde::{Deserialize, Serialize};

use crate::items::NodeId;

/// Axis-aligned rectangle in layout units.
///
/// Layout math runs in `f64` so percentage sizing and splitter offsets do not
/// accumulate rounding error; the terminal front-end converts to cells with
/// [`Rect::to_cells`].
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }

    /// Strict containment: points on the border are outside.
    pub fn contains_strict(&self, x: f64, y: f64) -> bool {
        x > self.x && x < self.right() && y > self.y && y < self.bottom()
    }

    pub fn surface(&self) -> f64 {
        self.width * self.height
    }

    pub fn to_cells(self) -> ratatui::layout::Rect {
        let clamp = |v: f64| v.max(0.0).min(u16::MAX as f64).round() as u16;
        ratatui::layout::Rect {
            x: clamp(self.x),
            y: clamp(self.y),
            width: clamp(self.width),
            height: clamp(self.height),
        }
    }

    pub fn from_cells(rect: ratatui::layout::Rect) -> Self {
        Self::new(
            rect.x as f64,
            rect.y as f64,
            rect.width as f64,
            rect.height as f64,
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Top,
    Left,
    Right,
    Bottom,
}

impl Side {
    /// Left and right place a header along the vertical edge.
    pub fn is_sided(self) -> bool {
        matches!(self, Side::Left | Side::Right)
    }

    /// Whether an item dropped on this side goes before its target.
    pub fn is_before(self) -> bool {
        matches!(self, Side::Left | Side::Top)
    }

    pub fn is_horizontal(self) -> bool {
        matches!(self, Side::Left | Side::Right)
    }
}

/// Drop target rectangle registered for the duration of a drag.
///
/// Corners are stored as `x1,y1` (inclusive top-left) and `x2,y2`
/// (bottom-right); hit tests are strict on all four edges.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ItemArea {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
    pub surface: f64,
    pub side: Option<Side>,
    pub owner: NodeId,
}

impl ItemArea {
    pub fn new(x1: f64, y1: f64, x2: f64, y2: f64, owner: NodeId) -> Self {
        Self {
            x1,
            y1,
            x2,
            y2,
            surface: (x2 - x1) * (y2 - y1),
            side: None,
            owner,
        }
    }

    pub fn from_rect(rect: Rect, owner: NodeId) -> Self {
        Self::new(rect.x, rect.y, rect.right(), rect.bottom(), owner)
    }

    pub fn with_side(mut self, side: Side) -> Self {
        self.side = Some(side);
        self
    }

    pub fn contains(&self, x: f64, y: f64) -> bool {
        x > self.x1 && x < self.x2 && y > self.y1 && y < self.y2
    }

    pub fn recompute_surface(&mut self) {
        self.surface = (self.x2 - self.x1) * (self.y2 - self.y1);
    }

    pub fn rect(&self) -> Rect {
        Rect::new(self.x1, self.y1, self.x2 - self.x1, self.y2 - self.y1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strict_containment_excludes_edges() {
        let r = Rect::new(10.0, 10.0, 20.0, 20.0);
        assert!(r.contains_strict(15.0, 15.0));
        assert!(!r.contains_strict(10.0, 15.0));
        assert!(!r.contains_strict(30.0, 15.0));
        assert!(!r.contains_strict(15.0, 30.0));
    }

    #[test]
    fn area_surface_matches_extent() {
        let a = ItemArea::new(0.0, 0.0, 10.0, 5.0, NodeId::from_raw(1));
        assert_eq!(a.surface, 50.0);
        assert!(a.contains(5.0, 2.0));
        assert!(!a.contains(0.0, 2.0));
    }

    #[test]
    fn to_cells_rounds_and_clamps() {
        let r = Rect::new(-3.0, 1.6, 10.4, 2.5).to_cells();
        assert_eq!(r.x, 0);
        assert_eq!(r.y, 2);
        assert_eq!(r.width, 10);
        assert_eq!(r.height, 3);
    }
}
