//! The root: a single-child container that fills the layout container.

use crate::error::{LayoutError, Result};
use crate::events::EventKind;
use crate::geometry::{ItemArea, Side};

use super::{LayoutTree, Lifecycle, NewChild, NodeId, Orientation};

impl LayoutTree {
    pub(crate) fn root_add_child(
        &mut self,
        id: NodeId,
        child: NewChild,
        index: Option<usize>,
    ) -> Result<NodeId> {
        if !self.children(id).is_empty() {
            return Err(LayoutError::RootOccupied);
        }
        let child = self.resolve_child(id, child)?;
        self.base_add_child(id, child, index)?;
        self.call_downwards(id, Lifecycle::SetSize, false, false)?;
        self.emit_bubbling_event(id, EventKind::StateChanged);
        Ok(child)
    }

    pub(crate) fn root_set_size(&mut self, id: NodeId) -> Result<()> {
        let rect = self.container();
        self.node_mut(id)?.surface.rect = rect;
        for child in self.children(id).to_vec() {
            self.node_mut(child)?.surface.rect = rect;
        }
        Ok(())
    }

    /// Bands along the four edges of the root used as drop targets for
    /// splitting the whole layout.
    pub(crate) fn root_edge_areas(&self) -> Vec<ItemArea> {
        let root = self.root();
        let rect = self.container();
        let size = self.dimensions().root_drop_area_size;
        let (x1, y1, x2, y2) = (rect.x, rect.y, rect.right(), rect.bottom());
        vec![
            ItemArea::new(x1, y1, x1 + size, y2, root).with_side(Side::Left),
            ItemArea::new(x2 - size, y1, x2, y2, root).with_side(Side::Right),
            ItemArea::new(x1, y1, x2, y1 + size, root).with_side(Side::Top),
            ItemArea::new(x1, y2 - size, x2, y2, root).with_side(Side::Bottom),
        ]
    }

    /// Drops a detached item on the root. An empty root takes the item as
    /// its child; otherwise the existing child is split along `side`.
    pub(crate) fn root_on_drop(&mut self, item: NodeId, side: Option<Side>) -> Result<()> {
        let root = self.root();
        let item = self.wrap_in_stack(root, item)?;
        let first = self.children(root).first().copied();
        let Some(column) = first else {
            self.root_add_child(root, item.into(), None)?;
            return Ok(());
        };

        let side = side.unwrap_or(Side::Right);
        let orientation = Orientation::from_side(side);
        let before = side.is_before();

        if self.orientation_of(column) == Some(orientation) && !self.children(column).is_empty() {
            let children = self.children(column);
            let sibling = if before {
                children[0]
            } else {
                children[children.len() - 1]
            };
            self.row_or_column_add_child(column, item.into(), before.then_some(0), true)?;
            let half = self
                .node(sibling)?
                .state
                .size(orientation)
                .map(|size| size * 0.5);
            self.node_mut(sibling)?.state.set_size(orientation, half);
            self.node_mut(item)?.state.set_size(orientation, half);
            self.call_downwards(column, Lifecycle::SetSize, false, false)?;
        } else {
            let container = self.create_content_item(orientation.empty_config(), Some(root))?;
            self.replace_child(root, column, container, false)?;
            self.row_or_column_add_child(container, item.into(), before.then_some(0), true)?;
            self.row_or_column_add_child(container, column.into(), (!before).then_some(0), true)?;
            self.node_mut(item)?.state.set_size(orientation, Some(50.0));
            self.node_mut(column)?.state.set_size(orientation, Some(50.0));
            self.call_downwards(container, Lifecycle::SetSize, false, false)?;
        }
        tracing::debug!(item = ?item, side = ?side, "dropped on root");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Dimensions, ItemConfig, ItemType, LayoutConfig};
    use crate::geometry::Rect;
    use crate::items::ComponentRegistry;

    fn tree(content: Option<ItemConfig>) -> LayoutTree {
        let config = LayoutConfig::default().with_dimensions(Dimensions {
            border_width: 0.0,
            ..Dimensions::default()
        });
        let mut tree = LayoutTree::new(&config, ComponentRegistry::permissive());
        tree.set_container(Rect::new(0.0, 0.0, 1000.0, 600.0));
        let root = tree.root();
        tree.call_downwards(root, Lifecycle::Init, false, false).unwrap();
        if let Some(content) = content {
            tree.add_child(root, content, None).unwrap();
        }
        tree
    }

    fn detached(tree: &mut LayoutTree, name: &str) -> NodeId {
        tree.create_content_item(ItemConfig::component(name), None)
            .unwrap()
    }

    #[test]
    fn second_child_is_rejected() {
        let mut tree = tree(Some(ItemConfig::stack(vec![ItemConfig::component("a")])));
        let root = tree.root();
        assert!(matches!(
            tree.add_child(root, ItemConfig::stack(vec![]), None),
            Err(LayoutError::RootOccupied)
        ));
    }

    #[test]
    fn drop_on_empty_root_wraps_a_component() {
        let mut tree = tree(None);
        let item = detached(&mut tree, "a");
        tree.root_on_drop(item, None).unwrap();
        let child = tree.children(tree.root())[0];
        assert_eq!(tree.item_type(child).unwrap(), ItemType::Stack);
        assert_eq!(tree.children(child), &[item]);
    }

    #[test]
    fn drop_on_left_edge_creates_a_row() {
        let mut tree = tree(Some(ItemConfig::stack(vec![ItemConfig::component("a")])));
        let original = tree.children(tree.root())[0];
        let item = detached(&mut tree, "b");
        tree.root_on_drop(item, Some(Side::Left)).unwrap();

        let row = tree.children(tree.root())[0];
        assert_eq!(tree.item_type(row).unwrap(), ItemType::Row);
        let children = tree.children(row).to_vec();
        assert_eq!(children.len(), 2);
        assert_eq!(children[1], original);
        assert_eq!(tree.children(children[0]), &[item]);
        assert_eq!(tree.node(children[0]).unwrap().rect().width, 500.0);
    }

    #[test]
    fn drop_on_matching_edge_halves_the_neighbour() {
        let mut tree = tree(Some(ItemConfig::row(vec![
            ItemConfig::component("a"),
            ItemConfig::component("b"),
        ])));
        let row = tree.children(tree.root())[0];
        let item = detached(&mut tree, "c");
        tree.root_on_drop(item, Some(Side::Right)).unwrap();
        let sizes: Vec<f64> = tree
            .children(row)
            .iter()
            .map(|c| tree.node(*c).unwrap().state.width.unwrap())
            .collect();
        assert_eq!(sizes, vec![50.0, 25.0, 25.0]);
    }

    #[test]
    fn edge_bands_hug_the_container() {
        let tree = tree(None);
        let areas = tree.root_edge_areas();
        assert_eq!(areas[0].rect(), Rect::new(0.0, 0.0, 50.0, 600.0));
        assert_eq!(areas[3].rect(), Rect::new(0.0, 550.0, 1000.0, 50.0));
    }
}
