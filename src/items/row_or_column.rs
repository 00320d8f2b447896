//! Rows and columns: percentage sizing, splitters and splitter drags.

use crate::config::{ItemConfig, ItemType};
use crate::controls::splitter::{self, Splitter, SplitterDrag};
use crate::error::{LayoutError, Result};
use crate::events::{Deferred, EventKind};
use crate::geometry::{Rect, Side};

use super::{LayoutTree, Lifecycle, NewChild, NodeId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Orientation {
    /// Children side by side, sized by width.
    Row,
    /// Children stacked vertically, sized by height.
    Column,
}

impl Orientation {
    pub fn item_type(self) -> ItemType {
        match self {
            Orientation::Row => ItemType::Row,
            Orientation::Column => ItemType::Column,
        }
    }

    /// Orientation a drop on `side` splits into.
    pub fn from_side(side: Side) -> Self {
        if side.is_horizontal() {
            Orientation::Row
        } else {
            Orientation::Column
        }
    }

    pub fn primary(self, rect: &Rect) -> f64 {
        match self {
            Orientation::Row => rect.width,
            Orientation::Column => rect.height,
        }
    }

    fn start(self, rect: &Rect) -> f64 {
        match self {
            Orientation::Row => rect.x,
            Orientation::Column => rect.y,
        }
    }

    /// Slice of `rect` starting at `from` along the primary axis.
    fn slice(self, rect: &Rect, from: f64, length: f64) -> Rect {
        match self {
            Orientation::Row => Rect::new(from, rect.y, length, rect.height),
            Orientation::Column => Rect::new(rect.x, from, rect.width, length),
        }
    }

    pub fn empty_config(self) -> ItemConfig {
        match self {
            Orientation::Row => ItemConfig::row(Vec::new()),
            Orientation::Column => ItemConfig::column(Vec::new()),
        }
    }

    /// Picks the pointer coordinate along the primary axis.
    pub fn pick(self, x: f64, y: f64) -> f64 {
        match self {
            Orientation::Row => x,
            Orientation::Column => y,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RowOrColumnState {
    pub orientation: Orientation,
    /// One per adjacent pair of children.
    pub splitters: Vec<Splitter>,
    pub(crate) drag: Option<SplitterDrag>,
}

impl RowOrColumnState {
    pub fn new(orientation: Orientation) -> Self {
        Self {
            orientation,
            splitters: Vec::new(),
            drag: None,
        }
    }

    pub fn drag(&self) -> Option<&SplitterDrag> {
        self.drag.as_ref()
    }

    fn sync_splitters(&mut self, children: usize) {
        let orientation = self.orientation;
        self.splitters
            .resize_with(children.saturating_sub(1), || Splitter::new(orientation));
    }
}

/// Normalizes declared percentages so they sum to 100.
///
/// Totals that round to 100 are kept. Below 100 the remainder is shared by
/// the undeclared entries; with nothing undeclared, or above 100, undeclared
/// entries count as 50 and everything is scaled down proportionally.
pub fn calculate_relative_sizes(declared: &[Option<f64>]) -> Vec<f64> {
    if declared.is_empty() {
        return Vec::new();
    }
    let mut total: f64 = declared.iter().flatten().sum();
    let undeclared_count = declared.iter().filter(|d| d.is_none()).count();

    if total.round() == 100.0 {
        return declared.iter().map(|d| d.unwrap_or(0.0)).collect();
    }

    if total.round() < 100.0 && undeclared_count > 0 {
        let share = (100.0 - total) / undeclared_count as f64;
        return declared.iter().map(|d| d.unwrap_or(share)).collect();
    }

    let mut sizes: Vec<f64> = declared.iter().map(|d| d.unwrap_or(0.0)).collect();
    if total.round() > 100.0 {
        for (size, declared) in sizes.iter_mut().zip(declared) {
            if declared.is_none() {
                *size = crate::constants::OVERFLOW_DEFAULT_PERCENT;
                total += *size;
            }
        }
    }
    if total <= 0.0 {
        let even = 100.0 / sizes.len() as f64;
        return vec![even; sizes.len()];
    }
    sizes.iter().map(|size| size / total * 100.0).collect()
}

/// Whole-unit sizes for `percents` of `total`, plus the units left over after
/// flooring.
pub fn calculate_absolute_sizes(percents: &[f64], total: f64) -> (Vec<f64>, f64) {
    let sizes: Vec<f64> = percents
        .iter()
        .map(|pct| (total * pct / 100.0).floor())
        .collect();
    let assigned: f64 = sizes.iter().sum();
    (sizes, (total - assigned).floor())
}

/// Hands the leftover units out one at a time from the first entry.
pub fn distribute_remainder(sizes: &mut [f64], additional: f64) {
    for (i, size) in sizes.iter_mut().enumerate() {
        if additional - i as f64 > 0.0 {
            *size += 1.0;
        }
    }
}

/// Raises entries below `min` to `min`, taking the space proportionally from
/// entries above it. Returns the new percentages, or `None` when nothing is
/// below `min` or there is not enough room to compensate.
pub fn respect_min_item_width(sizes: &[f64], total: f64, min: f64) -> Option<Vec<f64>> {
    let mut entries: Vec<f64> = Vec::with_capacity(sizes.len());
    let mut under = 0.0;
    let mut over = 0.0;
    for size in sizes {
        if *size < min {
            under += min - size;
            entries.push(min);
        } else {
            over += size - min;
            entries.push(*size);
        }
    }
    if under == 0.0 || under > over || total <= 0.0 {
        return None;
    }

    let reduce = under / over;
    let mut remaining = under;
    for (entry, original) in entries.iter_mut().zip(sizes) {
        if *original > min {
            let shrink = ((original - min) * reduce).round();
            *entry -= shrink;
            remaining -= shrink;
        }
    }
    if remaining != 0.0
        && let Some(last) = entries.last_mut()
    {
        *last -= remaining;
    }
    Some(entries.iter().map(|entry| entry / total * 100.0).collect())
}

impl LayoutTree {
    pub(crate) fn row_or_column_state(&self, id: NodeId) -> Result<&RowOrColumnState> {
        let item = self.node(id)?;
        item.as_row_or_column()
            .ok_or_else(|| LayoutError::WrongItemType {
                node: id,
                expected: "row or column",
                found: item.item_type().as_str(),
            })
    }

    fn orientation(&self, id: NodeId) -> Result<Orientation> {
        Ok(self.row_or_column_state(id)?.orientation)
    }

    /// Adds a child and gives it an even share, scaling its siblings down to
    /// make room. With `suspend_resize` the sizes are left to the caller.
    pub fn row_or_column_add_child(
        &mut self,
        id: NodeId,
        child: NewChild,
        index: Option<usize>,
        suspend_resize: bool,
    ) -> Result<NodeId> {
        let orientation = self.orientation(id)?;
        let child = self.resolve_child(id, child)?;
        let len = self.children(id).len();
        let index = index.unwrap_or(len).min(len);
        if len > 0
            && let Some(state) = self.node_mut(id)?.as_row_or_column_mut()
        {
            let at = index.saturating_sub(1).min(state.splitters.len());
            state.splitters.insert(at, Splitter::new(orientation));
        }
        self.base_add_child(id, child, Some(index))?;

        if suspend_resize {
            self.emit_bubbling_event(id, EventKind::StateChanged);
            return Ok(child);
        }

        let children = self.children(id).to_vec();
        let new_size = 100.0 / children.len() as f64;
        for sibling in children {
            let state = &mut self.node_mut(sibling)?.state;
            if sibling == child {
                state.set_size(orientation, Some(new_size));
            } else {
                let scaled = state.size(orientation).unwrap_or(0.0) * (100.0 - new_size) / 100.0;
                state.set_size(orientation, Some(scaled));
            }
        }
        self.call_downwards(id, Lifecycle::SetSize, false, false)?;
        self.emit_bubbling_event(id, EventKind::StateChanged);
        Ok(child)
    }

    /// Removes a child and shares its percentage evenly among the siblings.
    /// A closable container left with a single child is replaced by it.
    pub(crate) fn row_or_column_remove_child(
        &mut self,
        id: NodeId,
        child: NodeId,
        keep_child: bool,
    ) -> Result<()> {
        let orientation = self.orientation(id)?;
        let index = self.child_index(id, child)?;
        let removed = self.node(child)?.state.size(orientation).unwrap_or(0.0);
        let siblings: Vec<NodeId> = self
            .children(id)
            .iter()
            .copied()
            .filter(|c| *c != child)
            .collect();

        if let Some(state) = self.node_mut(id)?.as_row_or_column_mut() {
            let at = index.saturating_sub(1);
            if at < state.splitters.len() {
                state.splitters.remove(at);
            }
        }
        if !siblings.is_empty() {
            let share = removed / siblings.len() as f64;
            for sibling in &siblings {
                let state = &mut self.node_mut(*sibling)?.state;
                let current = state.size(orientation).unwrap_or(0.0);
                state.set_size(orientation, Some(current + share));
            }
        }

        self.base_remove_child(id, child, keep_child)?;
        if !self.contains(id) {
            return Ok(());
        }

        let item = self.node(id)?;
        if item.children.len() == 1
            && item.state.is_closable
            && let Some(parent) = item.parent
        {
            let only = item.children[0];
            tracing::debug!(node = ?id, child = ?only, "collapsing single-child container");
            let item = self.node_mut(id)?;
            item.children.clear();
            if let Some(state) = item.as_row_or_column_mut() {
                state.splitters.clear();
            }
            self.node_mut(only)?.parent = None;
            self.replace_child(parent, id, only, true)?;
            return Ok(());
        }

        self.call_downwards(id, Lifecycle::SetSize, false, false)?;
        self.emit_bubbling_event(id, EventKind::StateChanged);
        Ok(())
    }

    /// The replacement inherits the old child's percentage.
    pub(crate) fn row_or_column_replace_child(
        &mut self,
        id: NodeId,
        old: NodeId,
        new: NodeId,
        destroy_old: bool,
    ) -> Result<()> {
        let orientation = self.orientation(id)?;
        let size = self.node(old)?.state.size(orientation);
        self.base_replace_child(id, old, new, destroy_old)?;
        self.node_mut(new)?.state.set_size(orientation, size);
        self.call_downwards(id, Lifecycle::SetSize, false, false)?;
        self.emit_bubbling_event(id, EventKind::StateChanged);
        Ok(())
    }

    /// Lays children and splitters out along the primary axis.
    pub(crate) fn row_or_column_set_size(&mut self, id: NodeId) -> Result<()> {
        let orientation = self.orientation(id)?;
        let rect = self.node(id)?.surface.rect;
        let children = self.children(id).to_vec();
        let border = self.dimensions.border_width;
        let grab = self.dimensions.border_grab_width;
        let min_item_width = self.dimensions.min_item_width;

        if let Some(state) = self.node_mut(id)?.as_row_or_column_mut() {
            state.sync_splitters(children.len());
        }

        if !children.is_empty() {
            let declared: Vec<Option<f64>> = children
                .iter()
                .map(|c| self.node(*c).map(|item| item.state.size(orientation)))
                .collect::<Result<_>>()?;
            let mut percents = calculate_relative_sizes(&declared);
            let splitter_span = (children.len() - 1) as f64 * border;
            let total = (orientation.primary(&rect) - splitter_span).max(0.0);

            if orientation == Orientation::Row && min_item_width > 0.0 && children.len() > 1 {
                let (sizes, _) = calculate_absolute_sizes(&percents, total);
                if let Some(adjusted) = respect_min_item_width(&sizes, total, min_item_width) {
                    percents = adjusted;
                }
            }

            for (child, pct) in children.iter().zip(&percents) {
                self.node_mut(*child)?.state.set_size(orientation, Some(*pct));
            }

            let (mut sizes, additional) = calculate_absolute_sizes(&percents, total);
            distribute_remainder(&mut sizes, additional);

            let mut cursor = orientation.start(&rect);
            let mut splitter_rects = Vec::with_capacity(children.len() - 1);
            for (i, (child, size)) in children.iter().zip(&sizes).enumerate() {
                self.node_mut(*child)?.surface.rect = orientation.slice(&rect, cursor, *size);
                cursor += size;
                if i + 1 < children.len() {
                    splitter_rects.push(orientation.slice(&rect, cursor, border));
                    cursor += border;
                }
            }
            if let Some(state) = self.node_mut(id)?.as_row_or_column_mut() {
                for (splitter, r) in state.splitters.iter_mut().zip(splitter_rects) {
                    splitter.place(r, grab);
                }
            }
        }

        self.emit_bubbling_event(id, EventKind::StateChanged);
        self.emit_local(id, EventKind::Resize);
        Ok(())
    }

    /// Largest declared minimum among the direct children of `neighbour`,
    /// falling back to the layout-wide minimum.
    fn neighbour_min(&self, neighbour: NodeId, orientation: Orientation) -> f64 {
        let declared = self
            .children(neighbour)
            .iter()
            .filter_map(|c| self.get(*c))
            .filter_map(|item| item.state.min_size(orientation))
            .fold(None, |acc: Option<f64>, m| Some(acc.map_or(m, |a| a.max(m))));
        declared.unwrap_or(match orientation {
            Orientation::Row => self.dimensions.min_item_width,
            Orientation::Column => self.dimensions.min_item_height,
        })
    }

    fn splitter_neighbours(&self, id: NodeId, index: usize) -> Result<(NodeId, NodeId)> {
        let children = self.children(id);
        match (children.get(index), children.get(index + 1)) {
            (Some(before), Some(after)) => Ok((*before, *after)),
            _ => Err(LayoutError::SplitterNotFound { owner: id, index }),
        }
    }

    /// Begins dragging splitter `index` with the pointer at `position` on the
    /// primary axis.
    pub fn start_splitter_drag(&mut self, id: NodeId, index: usize, position: f64) -> Result<()> {
        let orientation = self.orientation(id)?;
        let (before, after) = self.splitter_neighbours(id, index)?;
        let before_size = orientation.primary(&self.node(before)?.surface.rect);
        let after_size = orientation.primary(&self.node(after)?.surface.rect);
        let range = splitter::drag_range(
            before_size,
            after_size,
            self.neighbour_min(before, orientation),
            self.neighbour_min(after, orientation),
        );
        tracing::debug!(node = ?id, index, min = range.0, max = range.1, "splitter drag start");
        if let Some(state) = self.node_mut(id)?.as_row_or_column_mut() {
            state.drag = Some(SplitterDrag::new(index, range, position));
        }
        Ok(())
    }

    /// Moves the dragged splitter. Returns the clamped offset.
    pub fn drag_splitter(&mut self, id: NodeId, position: f64) -> Result<f64> {
        let state = self
            .node_mut(id)?
            .as_row_or_column_mut()
            .ok_or(LayoutError::UnknownContentItem(id))?;
        let Some(drag) = state.drag.as_mut() else {
            return Ok(0.0);
        };
        let offset = drag.move_to(position);
        let index = drag.index;
        if let Some(splitter) = state.splitters.get_mut(index) {
            splitter.offset = offset;
        }
        Ok(offset)
    }

    /// Converts the drag offset into new percentages for the two neighbours
    /// and schedules the relayout for the next frame.
    pub fn stop_splitter_drag(&mut self, id: NodeId) -> Result<()> {
        let orientation = self.orientation(id)?;
        let Some(drag) = self
            .node_mut(id)?
            .as_row_or_column_mut()
            .and_then(|state| state.drag.take())
        else {
            return Ok(());
        };
        let (before, after) = self.splitter_neighbours(id, drag.index)?;
        let before_item = self.node(before)?;
        let after_item = self.node(after)?;
        let (before_pct, after_pct) = splitter::split_after_drag(
            orientation.primary(&before_item.surface.rect),
            orientation.primary(&after_item.surface.rect),
            drag.offset,
            before_item.state.size(orientation).unwrap_or(0.0),
            after_item.state.size(orientation).unwrap_or(0.0),
        );
        self.node_mut(before)?
            .state
            .set_size(orientation, Some(before_pct));
        self.node_mut(after)?
            .state
            .set_size(orientation, Some(after_pct));
        if let Some(state) = self.node_mut(id)?.as_row_or_column_mut()
            && let Some(splitter) = state.splitters.get_mut(drag.index)
        {
            splitter.offset = 0.0;
        }
        tracing::debug!(node = ?id, before = before_pct, after = after_pct, "splitter drag stop");
        self.bus.defer(Deferred::ResizeSubtree(id));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn sum(v: &[f64]) -> f64 {
        v.iter().sum()
    }

    #[test]
    fn even_split_for_undeclared_children() {
        let sizes = calculate_relative_sizes(&[None, None, None, None]);
        assert!(sizes.iter().all(|s| (*s - 25.0).abs() < 1e-9));
    }

    #[test]
    fn remainder_goes_to_undeclared_children() {
        let sizes = calculate_relative_sizes(&[Some(40.0), None, None]);
        assert_eq!(sizes, vec![40.0, 30.0, 30.0]);
    }

    #[test]
    fn overflow_scales_everything_down() {
        let sizes = calculate_relative_sizes(&[Some(100.0), None]);
        assert_eq!(sizes, vec![100.0, 0.0]);
        let sizes = calculate_relative_sizes(&[Some(150.0), None]);
        assert!((sizes[0] - 75.0).abs() < 1e-9);
        assert!((sizes[1] - 25.0).abs() < 1e-9);
    }

    #[test]
    fn absolute_sizes_hand_out_the_remainder_from_the_front() {
        let (mut sizes, extra) = calculate_absolute_sizes(&[100.0 / 3.0; 3], 100.0);
        assert_eq!(sizes, vec![33.0, 33.0, 33.0]);
        assert_eq!(extra, 1.0);
        distribute_remainder(&mut sizes, extra);
        assert_eq!(sizes, vec![34.0, 33.0, 33.0]);
    }

    #[test]
    fn min_width_takes_space_from_larger_items() {
        let (sizes, _) = calculate_absolute_sizes(&[10.0, 45.0, 45.0], 1000.0);
        let adjusted = respect_min_item_width(&sizes, 1000.0, 200.0).unwrap();
        assert_eq!(adjusted, vec![20.0, 40.0, 40.0]);
    }

    #[test]
    fn min_width_gives_up_without_room() {
        assert!(respect_min_item_width(&[100.0, 150.0], 250.0, 200.0).is_none());
        assert!(respect_min_item_width(&[500.0, 500.0], 1000.0, 200.0).is_none());
    }

    fn nested() -> LayoutTree {
        use crate::config::{Dimensions, LayoutConfig};
        use crate::items::ComponentRegistry;

        let config = LayoutConfig::default().with_dimensions(Dimensions {
            border_width: 0.0,
            ..Dimensions::default()
        });
        let mut tree = LayoutTree::new(&config, ComponentRegistry::permissive());
        tree.set_container(Rect::new(0.0, 0.0, 1000.0, 600.0));
        let root = tree.root();
        tree.call_downwards(root, Lifecycle::Init, false, false).unwrap();
        tree.add_child(
            root,
            ItemConfig::row(vec![
                ItemConfig::column(vec![ItemConfig::component("a"), ItemConfig::component("b")])
                    .with_width(30.0),
                ItemConfig::component("c").with_width(70.0),
            ]),
            None,
        )
        .unwrap();
        tree
    }

    fn stack_of(tree: &LayoutTree, name: &str) -> NodeId {
        let leaf = tree.get_components_by_name(tree.root(), name)[0];
        tree.parent(leaf).unwrap()
    }

    #[test]
    fn single_child_containers_are_hoisted_into_their_parent() {
        let mut tree = nested();
        let row = tree.children(tree.root())[0];
        let (a, b) = (stack_of(&tree, "a"), stack_of(&tree, "b"));
        let column = tree.parent(a).unwrap();

        tree.remove_child(column, b, false).unwrap();

        assert!(!tree.contains(column));
        assert!(!tree.contains(b));
        let c = stack_of(&tree, "c");
        assert_eq!(tree.children(row), &[a, c]);
        assert_eq!(tree.parent(a), Some(row));
        assert_eq!(tree.node(a).unwrap().state.width, Some(30.0));
        assert_eq!(tree.node(a).unwrap().rect().width, 300.0);
    }

    #[test]
    fn hoisting_keeps_a_detached_child_alive() {
        let mut tree = nested();
        let row = tree.children(tree.root())[0];
        let (a, b) = (stack_of(&tree, "a"), stack_of(&tree, "b"));
        let column = tree.parent(a).unwrap();
        let count = tree.len();

        tree.remove_child(column, b, true).unwrap();

        assert!(tree.contains(b));
        assert_eq!(tree.parent(b), None);
        assert_eq!(tree.children(row)[0], a);
        assert_eq!(tree.len(), count - 1);
    }

    proptest! {
        #[test]
        fn relative_sizes_sum_to_one_hundred(
            declared in prop::collection::vec(prop::option::of(0.0f64..200.0), 1..8)
        ) {
            let sizes = calculate_relative_sizes(&declared);
            prop_assert_eq!(sizes.len(), declared.len());
            prop_assert!((sum(&sizes) - 100.0).abs() <= 1.0);
        }

        #[test]
        fn absolute_sizes_fill_the_axis(count in 1usize..8, total in 0u32..4000) {
            let percents = vec![100.0 / count as f64; count];
            let (mut sizes, extra) = calculate_absolute_sizes(&percents, total as f64);
            distribute_remainder(&mut sizes, extra);
            prop_assert_eq!(sum(&sizes), total as f64);
        }
    }
}
