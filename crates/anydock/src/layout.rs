//! Solving a dock tree into concrete rectangles.

use std::collections::BTreeMap;

use anydock_core::{PointerPosition, Rect};

use crate::error::{DockError, Result};
use crate::node::{DockNodeId, DockNodeKind, Orientation};
use crate::tree::DockTree;

/// Concrete layout result for a solved dock tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DockLayoutMap {
    pub area: Rect,
    rects: BTreeMap<DockNodeId, Rect>,
    dividers: BTreeMap<DockNodeId, Rect>,
    leaves: Vec<DockNodeId>,
}

impl DockLayoutMap {
    /// Rectangle for a live node.
    #[must_use]
    pub fn rect(&self, node: DockNodeId) -> Option<Rect> {
        self.rects.get(&node).copied()
    }

    /// Divider strip of a split.
    #[must_use]
    pub fn divider(&self, split: DockNodeId) -> Option<Rect> {
        self.dividers.get(&split).copied()
    }

    /// Leaves in visual order, first side before second.
    #[must_use]
    pub fn leaves(&self) -> &[DockNodeId] {
        &self.leaves
    }

    /// Iterate all solved rectangles in deterministic ID order.
    pub fn iter(&self) -> impl Iterator<Item = (DockNodeId, Rect)> + '_ {
        self.rects.iter().map(|(node, rect)| (*node, *rect))
    }

    /// The leaf under `pointer`, if any.
    #[must_use]
    pub fn target_at(&self, pointer: PointerPosition) -> Option<(DockNodeId, Rect)> {
        self.leaves.iter().find_map(|leaf| {
            self.rect(*leaf)
                .filter(|rect| rect.contains_pointer(pointer))
                .map(|rect| (*leaf, rect))
        })
    }

    /// The split whose divider strip is under `pointer`.
    #[must_use]
    pub fn divider_at(&self, pointer: PointerPosition) -> Option<DockNodeId> {
        self.dividers
            .iter()
            .find(|(_, rect)| rect.contains_pointer(pointer))
            .map(|(split, _)| *split)
    }

    /// Divider ratio that would place the divider of `split` under `pointer`.
    #[must_use]
    pub fn ratio_at(
        &self,
        split: DockNodeId,
        orientation: Orientation,
        pointer: PointerPosition,
    ) -> Option<f64> {
        let rect = self.rect(split)?;
        let (origin, extent, at) = match orientation {
            Orientation::Horizontal => (rect.x, rect.width, pointer.x),
            Orientation::Vertical => (rect.y, rect.height, pointer.y),
        };
        if extent == 0 {
            return None;
        }
        Some((f64::from(at) - f64::from(origin)) / f64::from(extent))
    }
}

impl DockTree {
    /// Solve the tree into rectangles for the provided viewport.
    ///
    /// The first child of a split gets `floor((extent - divider) * ratio)`
    /// cells, the divider takes `divider_thickness` cells, and the second child
    /// takes the remainder. Tiny areas saturate to zero-sized rectangles.
    pub fn solve_layout(&self, area: Rect) -> Result<DockLayoutMap> {
        let mut map = DockLayoutMap {
            area,
            rects: BTreeMap::new(),
            dividers: BTreeMap::new(),
            leaves: Vec::new(),
        };
        let thickness = self.config.divider_thickness;
        let mut stack = vec![(self.root, area)];
        while let Some((id, area)) = stack.pop() {
            let node = self.node(id)?;
            let _ = map.rects.insert(id, area);

            let DockNodeKind::Split(split) = &node.kind else {
                map.leaves.push(id);
                continue;
            };
            let ratio = split.divider.get();
            let extent = match split.orientation {
                Orientation::Horizontal => area.width,
                Orientation::Vertical => area.height,
            };
            let gap = thickness.min(extent);
            let first_size = (f64::from(extent - gap) * ratio).floor() as u16;
            let (first, divider, second) = match split.orientation {
                Orientation::Horizontal => area.split_columns(first_size, gap),
                Orientation::Vertical => area.split_rows(first_size, gap),
            };
            let _ = map.dividers.insert(id, divider);

            if split.first == split.second {
                return Err(DockError::invalid(format!(
                    "split {id} holds {} twice",
                    split.first
                )));
            }
            // Second is pushed first so leaves come out in visual order.
            stack.push((split.second, second));
            stack.push((split.first, first));
        }
        Ok(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::ContentHandle;
    use crate::snapshot::DockLayout;

    fn tabs(id: u64) -> DockLayout {
        DockLayout::tabs(vec![ContentHandle::new(id, format!("item {id}"))])
    }

    #[test]
    fn single_leaf_fills_area() {
        let tree = DockTree::new();
        let area = Rect::from_size(80, 24);
        let map = tree.solve_layout(area).expect("solve");
        assert_eq!(map.rect(tree.root()), Some(area));
        assert_eq!(map.divider(tree.root()), None);
    }

    #[test]
    fn horizontal_split_reserves_divider() {
        let mut tree = DockTree::new();
        let root = tree.root();
        let (first, second) = tree
            .set_children(root, Some(tabs(1)), Some(tabs(2)), Orientation::Horizontal)
            .expect("split");
        let map = tree.solve_layout(Rect::from_size(81, 10)).expect("solve");
        assert_eq!(map.rect(first), Some(Rect::new(0, 0, 40, 10)));
        assert_eq!(map.divider(root), Some(Rect::new(40, 0, 1, 10)));
        assert_eq!(map.rect(second), Some(Rect::new(41, 0, 40, 10)));
    }

    #[test]
    fn vertical_split_honors_ratio() {
        let mut tree = DockTree::new();
        let root = tree.root();
        let (first, second) = tree
            .set_children(root, Some(tabs(1)), Some(tabs(2)), Orientation::Vertical)
            .expect("split");
        let _ = tree.set_divider_ratio(root, 0.25).expect("ratio");
        let map = tree.solve_layout(Rect::new(0, 0, 20, 41)).expect("solve");
        assert_eq!(map.rect(first), Some(Rect::new(0, 0, 20, 10)));
        assert_eq!(map.rect(second), Some(Rect::new(0, 11, 20, 30)));
    }

    #[test]
    fn target_at_finds_leaf_under_pointer() {
        let mut tree = DockTree::new();
        let root = tree.root();
        let (first, second) = tree
            .set_children(root, Some(tabs(1)), Some(tabs(2)), Orientation::Horizontal)
            .expect("split");
        let map = tree.solve_layout(Rect::from_size(81, 10)).expect("solve");
        assert_eq!(map.target_at(PointerPosition::new(3, 3)).map(|t| t.0), Some(first));
        assert_eq!(map.target_at(PointerPosition::new(60, 9)).map(|t| t.0), Some(second));
        assert_eq!(map.target_at(PointerPosition::new(40, 5)), None);
        assert_eq!(map.divider_at(PointerPosition::new(40, 5)), Some(root));
        assert_eq!(map.target_at(PointerPosition::new(-1, 5)), None);
    }

    #[test]
    fn tiny_area_saturates() {
        let mut tree = DockTree::new();
        let root = tree.root();
        let _ = tree
            .set_children(root, Some(tabs(1)), Some(tabs(2)), Orientation::Horizontal)
            .expect("split");
        let map = tree.solve_layout(Rect::from_size(0, 5)).expect("solve");
        assert!(map.iter().all(|(_, rect)| rect.width == 0));
    }

    #[test]
    fn ratio_at_maps_pointer_to_fraction() {
        let mut tree = DockTree::new();
        let root = tree.root();
        let _ = tree
            .set_children(root, Some(tabs(1)), Some(tabs(2)), Orientation::Horizontal)
            .expect("split");
        let map = tree.solve_layout(Rect::from_size(100, 10)).expect("solve");
        assert_eq!(
            map.ratio_at(root, Orientation::Horizontal, PointerPosition::new(30, 0)),
            Some(0.3)
        );
    }
}
