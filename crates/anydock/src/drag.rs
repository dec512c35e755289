//! Drag-and-drop: hit regions, drop application, and the drag state machine.
//!
//! ```text
//! Idle --enter(accepted)--> DragOver --drop--> Idle (tree mutated)
//!   ^                          |  ^
//!   |                          |  +--over (region re-derived, no mutation)
//!   +------cancel / leave------+
//! ```
//!
//! A drop is applied as one transaction: the item is detached from its origin
//! and inserted at the target on a working copy of the tree, and the collapse
//! of an emptied origin runs last. Callers observe either the whole move or no
//! change at all.

use std::fmt;

use anydock_core::{PointerPosition, Rect};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, trace, warn};

use crate::content::{ContentHandle, ContentId};
use crate::error::{DockError, Result};
use crate::event::DockEvent;
use crate::node::{DockLeaf, DockNode, DockNodeId, DockNodeKind, DockSplit, Orientation};
use crate::tree::DockTree;

/// Zone of a drop target under the pointer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DropRegion {
    Center,
    Up,
    Down,
    Left,
    Right,
}

impl DropRegion {
    pub const ALL: [Self; 5] = [Self::Center, Self::Up, Self::Down, Self::Left, Self::Right];

    /// Parse a region tag. `"Middle"` is accepted as an alias of `"Center"`.
    pub fn from_tag(tag: &str) -> Result<Self> {
        match tag {
            "Center" | "Middle" => Ok(Self::Center),
            "Up" => Ok(Self::Up),
            "Down" => Ok(Self::Down),
            "Left" => Ok(Self::Left),
            "Right" => Ok(Self::Right),
            other => Err(DockError::UnknownDropRegion {
                tag: other.to_owned(),
            }),
        }
    }

    #[must_use]
    pub const fn tag(self) -> &'static str {
        match self {
            Self::Center => "Center",
            Self::Up => "Up",
            Self::Down => "Down",
            Self::Left => "Left",
            Self::Right => "Right",
        }
    }

    /// Orientation of the split an edge drop creates; `None` for `Center`.
    #[must_use]
    pub const fn orientation(self) -> Option<Orientation> {
        match self {
            Self::Left | Self::Right => Some(Orientation::Horizontal),
            Self::Up | Self::Down => Some(Orientation::Vertical),
            Self::Center => None,
        }
    }

    /// Whether the dropped item lands in the split's first slot.
    #[must_use]
    pub const fn incoming_first(self) -> bool {
        matches!(self, Self::Up | Self::Left)
    }

    #[must_use]
    pub const fn is_edge(self) -> bool {
        !matches!(self, Self::Center)
    }

    /// Classify `pointer` against `bounds`.
    ///
    /// The pointer is normalised into `[0, 1]` on both axes using cell
    /// centres. The nearest edge wins when it is closer than `edge_band`;
    /// otherwise the hit is `Center`. Ties resolve Left, Right, Up, Down.
    /// Returns `None` when the pointer is outside or `bounds` is empty.
    #[must_use]
    pub fn hit_test(bounds: Rect, pointer: PointerPosition, edge_band: f64) -> Option<Self> {
        if bounds.is_empty() || !bounds.contains_pointer(pointer) {
            return None;
        }
        let fx = (f64::from(pointer.x) - f64::from(bounds.x) + 0.5) / f64::from(bounds.width);
        let fy = (f64::from(pointer.y) - f64::from(bounds.y) + 0.5) / f64::from(bounds.height);
        let candidates = [
            (Self::Left, fx),
            (Self::Right, 1.0 - fx),
            (Self::Up, fy),
            (Self::Down, 1.0 - fy),
        ];
        let mut best = candidates[0];
        for candidate in &candidates[1..] {
            if candidate.1 < best.1 {
                best = *candidate;
            }
        }
        if best.1 < edge_band {
            Some(best.0)
        } else {
            Some(Self::Center)
        }
    }

    /// Ghost rectangle the view layer highlights while hovering this region.
    #[must_use]
    pub fn preview_rect(self, bounds: Rect) -> Rect {
        match self {
            Self::Left => Rect::new(bounds.x, bounds.y, (bounds.width / 2).max(1), bounds.height),
            Self::Right => {
                let width = (bounds.width / 2).max(1);
                Rect::new(
                    bounds.x.saturating_add(bounds.width.saturating_sub(width)),
                    bounds.y,
                    width,
                    bounds.height,
                )
            }
            Self::Up => Rect::new(bounds.x, bounds.y, bounds.width, (bounds.height / 2).max(1)),
            Self::Down => {
                let height = (bounds.height / 2).max(1);
                Rect::new(
                    bounds.x,
                    bounds.y.saturating_add(bounds.height.saturating_sub(height)),
                    bounds.width,
                    height,
                )
            }
            Self::Center => bounds,
        }
    }
}

impl fmt::Display for DropRegion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Where a dragged item is released.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "on", rename_all = "snake_case")]
pub enum DropTarget {
    /// A region of a leaf panel.
    Panel { node: DockNodeId, region: DropRegion },
    /// A tab label; the item is inserted before that tab.
    Tab { content: ContentId },
}

/// One drop to apply to the tree.
///
/// `content` may already be docked (it is moved) or come from outside the
/// tree (it is inserted).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DropRequest {
    pub content: ContentHandle,
    pub target: DropTarget,
}

/// What a drop did to the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropOutcome {
    /// The item now lives in `leaf` at `index`.
    Retabbed { leaf: DockNodeId, index: usize },
    /// The item moved inside its own leaf.
    Reordered {
        leaf: DockNodeId,
        from: usize,
        to: usize,
    },
    /// The target leaf became `split`; the dropped item sits alone in
    /// `incoming` and the target's former items in `existing`.
    Split {
        split: DockNodeId,
        incoming: DockNodeId,
        existing: DockNodeId,
        orientation: Orientation,
    },
    /// The drop had no effect.
    Unchanged,
}

impl DockTree {
    /// Apply one drop atomically.
    ///
    /// - `Center` on a leaf inserts before the target's selected tab; within
    ///   the dragged item's own leaf it is a pure reorder.
    /// - An edge region splits the target leaf: the target's ID becomes the
    ///   split, the dropped item gets a fresh leaf (first for `Up`/`Left`,
    ///   second for `Down`/`Right`), and the former items move to a fresh
    ///   sibling leaf with their selection intact.
    /// - Any region on an empty leaf inserts directly without splitting.
    /// - An abandoned target is redirected to its successor; a split target
    ///   fails with [`DockError::InvalidState`].
    pub fn apply_drop(&mut self, request: DropRequest) -> Result<DropOutcome> {
        let DropRequest { content, target } = request;
        let result = self.transact(|tree| {
            let outcome = match target {
                DropTarget::Panel { node, region } => {
                    let leaf = tree.resolve(node)?;
                    if region.is_edge() {
                        tree.drop_on_edge(content, leaf, region)?
                    } else {
                        tree.drop_on_center(content, leaf)?
                    }
                }
                DropTarget::Tab { content: anchor } => tree.drop_before_tab(content, anchor)?,
            };
            let _ = tree.tidy()?;
            Ok(outcome)
        });
        match &result {
            Ok(outcome) => debug!(message = "dock.drop", target = ?target, outcome = ?outcome),
            Err(err) => warn!(message = "dock.drop.failed", target = ?target, error = %err),
        }
        result
    }

    fn drop_target_leaf(&self, leaf: DockNodeId) -> Result<&DockLeaf> {
        let target = self.leaf(leaf)?;
        if !target.allow_drop {
            return Err(DockError::invalid(format!("leaf {leaf} does not accept drops")));
        }
        Ok(target)
    }

    fn drop_on_center(&mut self, handle: ContentHandle, leaf: DockNodeId) -> Result<DropOutcome> {
        let target = self.drop_target_leaf(leaf)?;
        if let Some(from) = target.position(handle.id) {
            let Some(anchor) = target.selected_index() else {
                return Ok(DropOutcome::Unchanged);
            };
            let to = if from < anchor { anchor - 1 } else { anchor };
            return self.reorder_dropped(leaf, from, to);
        }
        let index = target.selected_index().unwrap_or(target.len());
        self.move_in(handle, leaf, index)
    }

    fn drop_before_tab(&mut self, handle: ContentHandle, anchor: ContentId) -> Result<DropOutcome> {
        let leaf = self
            .locate(anchor)
            .ok_or(DockError::UnknownContent { content: anchor })?;
        if anchor == handle.id {
            return Ok(DropOutcome::Unchanged);
        }
        let target = self.drop_target_leaf(leaf)?;
        let anchor_index = target
            .position(anchor)
            .ok_or(DockError::UnknownContent { content: anchor })?;
        if let Some(from) = target.position(handle.id) {
            let to = if from < anchor_index {
                anchor_index - 1
            } else {
                anchor_index
            };
            return self.reorder_dropped(leaf, from, to);
        }
        let origin = self.locate(handle.id);
        let handle = match origin {
            Some(origin) => self.detach_item(origin, handle.id)?,
            None => handle,
        };
        // Origin is a different leaf, so the anchor index is unaffected.
        self.insert_dropped(leaf, handle, anchor_index)
    }

    fn drop_on_edge(
        &mut self,
        handle: ContentHandle,
        leaf: DockNodeId,
        region: DropRegion,
    ) -> Result<DropOutcome> {
        let target = self.drop_target_leaf(leaf)?;
        if target.is_empty() {
            return self.move_in(handle, leaf, 0);
        }
        let own = target.position(handle.id).is_some();
        if own && target.len() == 1 {
            return Ok(DropOutcome::Unchanged);
        }
        let handle = match self.locate(handle.id) {
            Some(origin) => self.detach_item(origin, handle.id)?,
            None => handle,
        };
        self.split_with_incoming(leaf, handle, region)
    }

    /// Detach `handle` from its origin leaf (if docked) and insert it at
    /// `index` in `leaf`.
    fn move_in(&mut self, handle: ContentHandle, leaf: DockNodeId, index: usize) -> Result<DropOutcome> {
        let handle = match self.locate(handle.id) {
            Some(origin) => self.detach_item(origin, handle.id)?,
            None => handle,
        };
        self.insert_dropped(leaf, handle, index)
    }

    fn insert_dropped(
        &mut self,
        leaf: DockNodeId,
        handle: ContentHandle,
        index: usize,
    ) -> Result<DropOutcome> {
        let focus = self.config.focus_dropped_item;
        let content = handle.id;
        let target = self.leaf_mut(leaf)?;
        let previous = target.selected;
        target.insert(index, handle)?;
        if focus {
            target.select(index)?;
        }
        let selected = target.selected;
        self.emit(DockEvent::ItemAdded {
            leaf,
            content,
            index,
        });
        if focus {
            self.emit(DockEvent::SelectionChanged { leaf, selected });
        } else {
            self.emit_selection(leaf, previous, selected);
        }
        Ok(DropOutcome::Retabbed { leaf, index })
    }

    fn reorder_dropped(&mut self, leaf: DockNodeId, from: usize, to: usize) -> Result<DropOutcome> {
        if from == to {
            return Ok(DropOutcome::Unchanged);
        }
        self.move_item_within(leaf, from, to)?;
        if self.config.focus_dropped_item {
            self.select(leaf, to)?;
        }
        Ok(DropOutcome::Reordered { leaf, from, to })
    }

    /// Turn the populated leaf `target` into a split of a fresh leaf holding
    /// `incoming` and a fresh leaf holding the target's items.
    fn split_with_incoming(
        &mut self,
        target: DockNodeId,
        incoming: ContentHandle,
        region: DropRegion,
    ) -> Result<DropOutcome> {
        let orientation = region
            .orientation()
            .ok_or_else(|| DockError::invalid("center drops never split"))?;
        let existing_items = self.leaf_mut(target)?.drain();
        let moved: Vec<ContentId> = existing_items.items.iter().map(|item| item.id).collect();
        let content = incoming.id;

        let mut incoming_leaf = DockLeaf {
            tab_strip: existing_items.tab_strip,
            ..DockLeaf::default()
        };
        incoming_leaf.insert(0, incoming)?;

        let incoming_id = self.allocate_id()?;
        let existing_id = self.allocate_id()?;
        let _ = self
            .nodes
            .insert(incoming_id, DockNode::leaf(incoming_id, Some(target), incoming_leaf));
        let _ = self
            .nodes
            .insert(existing_id, DockNode::leaf(existing_id, Some(target), existing_items));

        let (first, second) = if region.incoming_first() {
            (incoming_id, existing_id)
        } else {
            (existing_id, incoming_id)
        };
        let divider = self.config.divider_ratio();
        self.node_mut(target)?.kind = DockNodeKind::Split(DockSplit {
            orientation,
            divider,
            first,
            second,
        });

        self.emit(DockEvent::Split {
            node: target,
            first,
            second,
            orientation,
        });
        self.emit(DockEvent::ItemsTransferred {
            from: target,
            to: existing_id,
            contents: moved,
        });
        self.emit(DockEvent::ItemAdded {
            leaf: incoming_id,
            content,
            index: 0,
        });
        debug!(
            message = "dock.split",
            node = target.get(),
            first = first.get(),
            second = second.get(),
            orientation = ?orientation,
            region = region.tag()
        );

        Ok(DropOutcome::Split {
            split: target,
            incoming: incoming_id,
            existing: existing_id,
            orientation,
        })
    }
}

/// What is being dragged, as reported by the view layer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DragPayload {
    pub content: Option<ContentHandle>,
    /// Leaf the drag started from; `None` for content entering from outside.
    pub source: Option<DockNodeId>,
}

impl DragPayload {
    #[must_use]
    pub fn docked(content: ContentHandle, source: DockNodeId) -> Self {
        Self {
            content: Some(content),
            source: Some(source),
        }
    }

    #[must_use]
    pub fn external(content: ContentHandle) -> Self {
        Self {
            content: Some(content),
            source: None,
        }
    }
}

/// Why a drag was refused at enter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DragRejection {
    #[error("drag payload is missing its content or names the wrong source")]
    MalformedPayload,
    #[error("content does not allow dragging")]
    DragNotAllowed,
    #[error("drop target does not exist")]
    UnknownTarget,
    #[error("drop target is a split")]
    TargetNotLeaf,
    #[error("drop target does not accept drops")]
    DropsDisabled,
}

/// Result of [`DragMachine::enter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragDecision {
    /// The drag is over the target; `region` is `None` while the pointer is
    /// outside the target bounds.
    Accepted { region: Option<DropRegion> },
    Rejected(DragRejection),
}

/// An accepted drag hovering over one target.
#[derive(Debug, Clone, PartialEq)]
pub struct DragSession {
    pub content: ContentHandle,
    pub source: Option<DockNodeId>,
    pub target: DockNodeId,
    pub bounds: Rect,
    pub region: Option<DropRegion>,
    edge_band: f64,
}

#[derive(Debug, Clone, Default, PartialEq)]
enum DragState {
    #[default]
    Idle,
    DragOver(DragSession),
}

/// Drag gesture state machine.
///
/// Never mutates the tree except in the `drop*` methods.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DragMachine {
    state: DragState,
}

impl DragMachine {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_dragging(&self) -> bool {
        matches!(self.state, DragState::DragOver(_))
    }

    #[must_use]
    pub fn session(&self) -> Option<&DragSession> {
        match &self.state {
            DragState::DragOver(session) => Some(session),
            DragState::Idle => None,
        }
    }

    /// Start hovering `target` with `payload`.
    ///
    /// Rejections leave the machine idle. Abandoned targets are redirected to
    /// the live node that replaced them.
    pub fn enter(
        &mut self,
        tree: &DockTree,
        payload: DragPayload,
        target: DockNodeId,
        bounds: Rect,
        pointer: PointerPosition,
    ) -> DragDecision {
        self.state = DragState::Idle;
        match Self::check(tree, payload, target) {
            Ok((content, source, target)) => {
                let edge_band = tree.config().edge_band;
                let region = DropRegion::hit_test(bounds, pointer, edge_band);
                debug!(
                    message = "dock.drag.enter",
                    content = content.id.get(),
                    target = target.get(),
                    region = ?region
                );
                self.state = DragState::DragOver(DragSession {
                    content,
                    source,
                    target,
                    bounds,
                    region,
                    edge_band,
                });
                DragDecision::Accepted { region }
            }
            Err(rejection) => {
                warn!(
                    message = "dock.drag.rejected",
                    target = target.get(),
                    reason = %rejection
                );
                DragDecision::Rejected(rejection)
            }
        }
    }

    fn check(
        tree: &DockTree,
        payload: DragPayload,
        target: DockNodeId,
    ) -> std::result::Result<(ContentHandle, Option<DockNodeId>, DockNodeId), DragRejection> {
        let Some(content) = payload.content else {
            return Err(DragRejection::MalformedPayload);
        };
        let source = match payload.source {
            Some(source) => {
                let source = tree
                    .resolve(source)
                    .map_err(|_| DragRejection::MalformedPayload)?;
                if tree.locate(content.id) != Some(source) {
                    return Err(DragRejection::MalformedPayload);
                }
                Some(source)
            }
            None => None,
        };
        if !content.allow_drag {
            return Err(DragRejection::DragNotAllowed);
        }
        let target = tree
            .resolve(target)
            .map_err(|_| DragRejection::UnknownTarget)?;
        let leaf = tree.leaf(target).map_err(|_| DragRejection::TargetNotLeaf)?;
        if !leaf.allow_drop() {
            return Err(DragRejection::DropsDisabled);
        }
        Ok((content, source, target))
    }

    /// Track pointer movement; re-derives the region without touching the tree.
    pub fn over(&mut self, pointer: PointerPosition) -> Option<DropRegion> {
        let DragState::DragOver(session) = &mut self.state else {
            return None;
        };
        let region = DropRegion::hit_test(session.bounds, pointer, session.edge_band);
        if region != session.region {
            trace!(
                message = "dock.drag.over",
                target = session.target.get(),
                from = ?session.region,
                to = ?region
            );
            session.region = region;
        }
        region
    }

    /// Abort the drag without mutation.
    pub fn cancel(&mut self) {
        if let DragState::DragOver(session) = std::mem::take(&mut self.state) {
            debug!(
                message = "dock.drag.cancel",
                content = session.content.id.get(),
                target = session.target.get()
            );
        }
    }

    /// The pointer left the target; same as [`DragMachine::cancel`].
    pub fn leave(&mut self) {
        self.cancel();
    }

    /// Drop on the region last derived by `enter`/`over`.
    ///
    /// A pointer outside the target bounds drops nothing.
    pub fn drop(&mut self, tree: &mut DockTree) -> Result<DropOutcome> {
        let session = self.take_session()?;
        let Some(region) = session.region else {
            return Ok(DropOutcome::Unchanged);
        };
        Self::finish(tree, session.content, DropTarget::Panel {
            node: session.target,
            region,
        })
    }

    /// Drop on an explicit region tag reported by the view layer.
    pub fn drop_with_tag(&mut self, tree: &mut DockTree, tag: &str) -> Result<DropOutcome> {
        let session = self.take_session()?;
        let region = DropRegion::from_tag(tag)?;
        Self::finish(tree, session.content, DropTarget::Panel {
            node: session.target,
            region,
        })
    }

    /// Drop onto the tab label of `anchor`, inserting before it.
    pub fn drop_on_tab(&mut self, tree: &mut DockTree, anchor: ContentId) -> Result<DropOutcome> {
        let session = self.take_session()?;
        Self::finish(tree, session.content, DropTarget::Tab { content: anchor })
    }

    fn take_session(&mut self) -> Result<DragSession> {
        match std::mem::take(&mut self.state) {
            DragState::DragOver(session) => Ok(session),
            DragState::Idle => Err(DockError::invalid("no drag in progress")),
        }
    }

    fn finish(tree: &mut DockTree, content: ContentHandle, target: DropTarget) -> Result<DropOutcome> {
        tree.apply_drop(DropRequest { content, target })
    }
}
