//! Drag session for moving an item through the layout.
//!
//! A [`DragProxy`] owns everything that only exists while an item is being
//! dragged: the detached item, the [`AreaRegistry`] of drop targets built at
//! pick-up, the current and last valid candidate areas, and the drop segment
//! most recently highlighted on each stack.

use std::collections::BTreeMap;

use crate::geometry::{ItemArea, Rect};
use crate::items::NodeId;

/// Part of a stack an item can be dropped on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DropSegment {
    Header,
    Body,
    Left,
    Top,
    Right,
    Bottom,
}

/// A hover region and the region highlighted while hovering it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DropZone {
    pub segment: DropSegment,
    pub hover: Rect,
    pub highlight: Rect,
}

impl DropZone {
    pub fn new(segment: DropSegment, hover: Rect, highlight: Rect) -> Self {
        Self {
            segment,
            hover,
            highlight,
        }
    }

    pub fn uniform(segment: DropSegment, rect: Rect) -> Self {
        Self::new(segment, rect, rect)
    }
}

/// The stack-local target recorded by the last highlight on that stack.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StackDrop {
    pub segment: DropSegment,
    pub index: Option<usize>,
}

/// Drop targets registered at the start of a drag.
#[derive(Debug, Clone, Default)]
pub struct AreaRegistry {
    areas: Vec<ItemArea>,
    zones: BTreeMap<NodeId, Vec<DropZone>>,
}

impl AreaRegistry {
    pub fn push(&mut self, area: ItemArea) {
        self.areas.push(area);
    }

    pub fn set_zones(&mut self, stack: NodeId, zones: Vec<DropZone>) {
        self.zones.insert(stack, zones);
    }

    pub fn zones(&self, stack: NodeId) -> &[DropZone] {
        self.zones.get(&stack).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn areas(&self) -> &[ItemArea] {
        &self.areas
    }

    pub fn len(&self) -> usize {
        self.areas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.areas.is_empty()
    }

    /// Smallest area strictly containing the point. Equal surfaces resolve
    /// to the area registered first.
    pub fn hit_test(&self, x: f64, y: f64) -> Option<ItemArea> {
        let mut smallest = f64::INFINITY;
        let mut matching = None;
        for area in &self.areas {
            if area.contains(x, y) && smallest > area.surface {
                smallest = area.surface;
                matching = Some(*area);
            }
        }
        matching
    }

    /// First zone of `stack` whose hover region strictly contains the point.
    pub fn zone_at(&self, stack: NodeId, x: f64, y: f64) -> Option<DropZone> {
        self.zones(stack)
            .iter()
            .find(|zone| zone.hover.contains_strict(x, y))
            .copied()
    }
}

/// How a drag ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropOutcome {
    /// Dropped onto the owner of a registered area.
    Dropped { target: NodeId },
    /// No target was ever found; the item went back to where it came from.
    Returned { parent: NodeId },
    /// No target and nowhere to return to.
    Destroyed,
}

#[derive(Debug, Clone)]
pub struct DragProxy {
    item: NodeId,
    original_parent: Option<NodeId>,
    registry: AreaRegistry,
    area: Option<ItemArea>,
    last_valid_area: Option<ItemArea>,
    stack_drops: BTreeMap<NodeId, StackDrop>,
    highlight: Option<Rect>,
    /// Pointer must stay strictly inside to select new candidates.
    bounds: Option<Rect>,
    position: (f64, f64),
    size: (f64, f64),
}

impl DragProxy {
    pub fn new(
        item: NodeId,
        original_parent: Option<NodeId>,
        registry: AreaRegistry,
        bounds: Option<Rect>,
        size: (f64, f64),
    ) -> Self {
        Self {
            item,
            original_parent,
            registry,
            area: None,
            last_valid_area: None,
            stack_drops: BTreeMap::new(),
            highlight: None,
            bounds,
            position: (0.0, 0.0),
            size,
        }
    }

    pub fn item(&self) -> NodeId {
        self.item
    }

    pub fn original_parent(&self) -> Option<NodeId> {
        self.original_parent
    }

    pub fn registry(&self) -> &AreaRegistry {
        &self.registry
    }

    pub fn area(&self) -> Option<ItemArea> {
        self.area
    }

    pub fn last_valid_area(&self) -> Option<ItemArea> {
        self.last_valid_area
    }

    pub fn highlight(&self) -> Option<Rect> {
        self.highlight
    }

    pub fn position(&self) -> (f64, f64) {
        self.position
    }

    /// Rectangle of the floating proxy, anchored at the pointer.
    pub fn rect(&self) -> Rect {
        Rect::new(self.position.0, self.position.1, self.size.0, self.size.1)
    }

    pub fn stack_drop(&self, stack: NodeId) -> Option<StackDrop> {
        self.stack_drops.get(&stack).copied()
    }

    pub fn accepts(&self, x: f64, y: f64) -> bool {
        self.bounds.is_none_or(|b| b.contains_strict(x, y))
    }

    /// Moves the proxy and selects the candidate under the pointer. Returns
    /// the new candidate, if any, so the caller can compute its highlight.
    pub fn set_drop_position(&mut self, x: f64, y: f64) -> Option<ItemArea> {
        self.position = (x, y);
        self.area = self.registry.hit_test(x, y);
        if let Some(area) = self.area {
            self.last_valid_area = Some(area);
        }
        self.area
    }

    pub fn record_stack_drop(&mut self, stack: NodeId, drop: StackDrop, highlight: Rect) {
        self.stack_drops.insert(stack, drop);
        self.highlight = Some(highlight);
    }

    pub fn set_highlight(&mut self, highlight: Rect) {
        self.highlight = Some(highlight);
    }

    /// Target to hand the item to on release: the current candidate, or
    /// failing that the last valid one.
    pub fn drop_area(&self) -> Option<ItemArea> {
        self.area.or(self.last_valid_area)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Side;

    fn id(n: u64) -> NodeId {
        NodeId::from_raw(n)
    }

    #[test]
    fn smallest_surface_wins() {
        let mut reg = AreaRegistry::default();
        reg.push(ItemArea::new(0.0, 0.0, 10.0, 10.0, id(1)));
        reg.push(ItemArea::new(0.0, 0.0, 10.0, 5.0, id(2)));
        assert_eq!(reg.hit_test(5.0, 2.0).map(|a| a.owner), Some(id(2)));
        assert_eq!(reg.hit_test(5.0, 7.0).map(|a| a.owner), Some(id(1)));
    }

    #[test]
    fn equal_surfaces_prefer_first_registered() {
        let mut reg = AreaRegistry::default();
        reg.push(ItemArea::new(0.0, 0.0, 10.0, 5.0, id(1)).with_side(Side::Top));
        reg.push(ItemArea::new(0.0, 0.0, 5.0, 10.0, id(2)).with_side(Side::Left));
        let hit = reg.hit_test(2.0, 2.0).unwrap();
        assert_eq!(hit.owner, id(1));
        assert_eq!(hit.side, Some(Side::Top));
    }

    #[test]
    fn edges_do_not_hit() {
        let mut reg = AreaRegistry::default();
        reg.push(ItemArea::new(0.0, 0.0, 10.0, 10.0, id(1)));
        assert!(reg.hit_test(0.0, 5.0).is_none());
        assert!(reg.hit_test(10.0, 5.0).is_none());
    }

    #[test]
    fn last_valid_area_survives_misses() {
        let mut reg = AreaRegistry::default();
        reg.push(ItemArea::new(0.0, 0.0, 10.0, 10.0, id(1)));
        let mut proxy = DragProxy::new(id(5), None, reg, None, (30.0, 20.0));
        assert!(proxy.set_drop_position(5.0, 5.0).is_some());
        assert!(proxy.set_drop_position(50.0, 50.0).is_none());
        assert!(proxy.area().is_none());
        assert_eq!(proxy.drop_area().map(|a| a.owner), Some(id(1)));
    }

    #[test]
    fn bounds_are_strict() {
        let proxy = DragProxy::new(
            id(1),
            None,
            AreaRegistry::default(),
            Some(Rect::new(0.0, 0.0, 100.0, 100.0)),
            (1.0, 1.0),
        );
        assert!(proxy.accepts(50.0, 50.0));
        assert!(!proxy.accepts(0.0, 50.0));
        assert!(!proxy.accepts(150.0, 50.0));
    }
}
