use crate::geometry::Rect;
use crate::items::Orientation;

/// Boundary between two adjacent children of a row or column.
#[derive(Debug, Clone, PartialEq)]
pub struct Splitter {
    pub orientation: Orientation,
    /// Visible bar, `border_width` thick.
    pub rect: Rect,
    /// Pointer target, `border_grab_width` thick and centred on `rect`.
    pub grab_rect: Rect,
    /// Offset from the resting position while dragged.
    pub offset: f64,
}

impl Splitter {
    pub fn new(orientation: Orientation) -> Self {
        Self {
            orientation,
            rect: Rect::default(),
            grab_rect: Rect::default(),
            offset: 0.0,
        }
    }

    pub fn place(&mut self, rect: Rect, grab_width: f64) {
        self.rect = rect;
        let grab = grab_width.max(rect_thickness(self.orientation, rect));
        self.grab_rect = match self.orientation {
            Orientation::Row => {
                let centre = rect.x + rect.width / 2.0;
                Rect::new(centre - grab / 2.0, rect.y, grab, rect.height)
            }
            Orientation::Column => {
                let centre = rect.y + rect.height / 2.0;
                Rect::new(rect.x, centre - grab / 2.0, rect.width, grab)
            }
        };
    }

    /// Inclusive hit test against the grab area.
    pub fn hit(&self, x: f64, y: f64) -> bool {
        let r = self.grab_rect;
        x >= r.x && x <= r.right() && y >= r.y && y <= r.bottom()
    }

    /// Resting rect shifted by the current drag offset.
    pub fn displayed_rect(&self) -> Rect {
        match self.orientation {
            Orientation::Row => Rect {
                x: self.rect.x + self.offset,
                ..self.rect
            },
            Orientation::Column => Rect {
                y: self.rect.y + self.offset,
                ..self.rect
            },
        }
    }
}

fn rect_thickness(orientation: Orientation, rect: Rect) -> f64 {
    match orientation {
        Orientation::Row => rect.width,
        Orientation::Column => rect.height,
    }
}

/// Drag session state for one splitter, captured on drag start so moves do
/// not need to consult the tree.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SplitterDrag {
    pub index: usize,
    pub min: f64,
    pub max: f64,
    pub offset: f64,
    pub origin: f64,
}

impl SplitterDrag {
    pub fn new(index: usize, range: (f64, f64), origin: f64) -> Self {
        Self {
            index,
            min: range.0,
            max: range.1,
            offset: 0.0,
            origin,
        }
    }

    /// Moves to `position` along the primary axis, clamped to the range.
    pub fn move_to(&mut self, position: f64) -> f64 {
        self.offset = clamp_offset(position - self.origin, self.min, self.max);
        self.offset
    }
}

/// Allowed offsets for a splitter whose neighbours are `before` and `after`
/// units long and must keep at least `before_min` and `after_min`.
pub fn drag_range(before: f64, after: f64, before_min: f64, after_min: f64) -> (f64, f64) {
    (-(before - before_min), after - after_min)
}

pub fn clamp_offset(offset: f64, min: f64, max: f64) -> f64 {
    if min > max {
        // Neighbours already below their minimum; the splitter stays put.
        return 0.0;
    }
    offset.clamp(min, max)
}

/// Converts a released offset into new percentages for the two neighbours.
/// The pair's combined percentage is preserved.
pub fn split_after_drag(
    before: f64,
    after: f64,
    offset: f64,
    before_percent: f64,
    after_percent: f64,
) -> (f64, f64) {
    let span = before + after;
    if span <= 0.0 {
        return (before_percent, after_percent);
    }
    let position = (offset + before) / span;
    let total = before_percent + after_percent;
    (position * total, (1.0 - position) * total)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn range_respects_neighbour_minimums() {
        let (min, max) = drag_range(200.0, 200.0, 10.0, 30.0);
        assert_eq!(min, -190.0);
        assert_eq!(max, 170.0);
    }

    #[test]
    fn offset_is_clamped_not_ignored() {
        let mut drag = SplitterDrag::new(0, (-50.0, 20.0), 100.0);
        assert_eq!(drag.move_to(160.0), 20.0);
        assert_eq!(drag.move_to(10.0), -50.0);
        assert_eq!(drag.move_to(105.0), 5.0);
    }

    #[test]
    fn release_preserves_pair_total() {
        let (a, b) = split_after_drag(200.0, 200.0, 40.0, 50.0, 50.0);
        assert!((a - 60.0).abs() < 1e-9);
        assert!((b - 40.0).abs() < 1e-9);

        let (a, b) = split_after_drag(100.0, 300.0, 0.0, 10.0, 30.0);
        assert!((a + b - 40.0).abs() < 1e-9);
        assert!((a - 10.0).abs() < 1e-9);
    }

    #[test]
    fn grab_area_is_centred() {
        let mut s = Splitter::new(Orientation::Row);
        s.place(Rect::new(100.0, 0.0, 4.0, 50.0), 10.0);
        assert_eq!(s.grab_rect.x, 97.0);
        assert_eq!(s.grab_rect.width, 10.0);
        assert!(s.hit(98.0, 20.0));
        assert!(!s.hit(90.0, 20.0));
    }
}
