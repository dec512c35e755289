//! The binary dock tree.
//!
//! Nodes live in an ID-keyed map; splits own their two children through their
//! `first`/`second` slots and every child carries a non-owning `parent`
//! back-reference. Mutations that can touch more than one node run on a cloned
//! working tree that replaces `self` only on success, so callers never observe
//! a half-applied change.
//!
//! # Collapse / promote
//!
//! When a non-root leaf becomes empty its sibling is promoted into the parent
//! split's slot (or becomes the root). The emptied leaf and the parent split
//! are abandoned: their IDs stay reserved, later access fails with
//! [`DockError::UseAfterAbandon`], and [`DockTree::resolve`] redirects them to
//! the promoted node. Collapse is deferred while a [`DockBatch`] is open and
//! runs exactly once on commit.
//!
//! [`DockBatch`]: crate::DockBatch

use std::collections::{BTreeMap, BTreeSet};
use std::fmt::{self, Write as _};

use tracing::debug;

use crate::config::DockConfig;
use crate::content::{ContentHandle, ContentId};
use crate::error::{DockError, Result};
use crate::event::DockEvent;
use crate::node::{
    DividerRatio, DockLeaf, DockNode, DockNodeId, DockNodeKind, DockSplit, Orientation,
    TabStripPlacement,
};
use crate::snapshot::DockLayout;

/// Result of promoting a sibling over an emptied leaf.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollapseOutcome {
    /// The leaf that became empty (now abandoned).
    pub emptied: DockNodeId,
    /// Its former parent split (now abandoned).
    pub split: DockNodeId,
    /// The sibling that took the split's slot.
    pub promoted: DockNodeId,
    /// The split that now holds `promoted`, or `None` if it became the root.
    pub slot_parent: Option<DockNodeId>,
}

/// Binary tree of tab containers and splits.
#[derive(Debug, Clone, PartialEq)]
pub struct DockTree {
    pub(crate) config: DockConfig,
    pub(crate) root: DockNodeId,
    pub(crate) next_id: DockNodeId,
    pub(crate) nodes: BTreeMap<DockNodeId, DockNode>,
    /// Abandoned node -> live node that took over its region.
    pub(crate) abandoned: BTreeMap<DockNodeId, DockNodeId>,
    /// Open batch depth; collapse is suppressed while non-zero.
    pub(crate) deferred: u32,
    pub(crate) events: Vec<DockEvent>,
}

impl Default for DockTree {
    fn default() -> Self {
        Self::new()
    }
}

impl DockTree {
    /// A tree holding one empty root leaf.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(DockConfig::default())
    }

    #[must_use]
    pub fn with_config(config: DockConfig) -> Self {
        let root = DockNodeId::MIN;
        let mut nodes = BTreeMap::new();
        let _ = nodes.insert(root, DockNode::leaf(root, None, DockLeaf::default()));
        Self {
            config: config.validated(),
            root,
            next_id: root.checked_next().unwrap_or(root),
            nodes,
            abandoned: BTreeMap::new(),
            deferred: 0,
            events: Vec::new(),
        }
    }

    /// Build a tree whose root matches `layout`.
    pub fn from_layout(layout: DockLayout, config: DockConfig) -> Result<Self> {
        let mut tree = Self::with_config(config);
        let root = tree.root;
        match layout {
            DockLayout::Tabs {
                items,
                selected,
                tab_strip,
            } => tree.transact(|tree| tree.populate_leaf(root, items, selected, tab_strip))?,
            DockLayout::Split {
                orientation,
                divider,
                first,
                second,
            } => {
                let divider =
                    divider.map_or_else(|| tree.config.divider_ratio(), DividerRatio::new);
                let _ = tree.compose(root, *first, *second, orientation, divider)?;
            }
        }
        Ok(tree)
    }

    #[must_use]
    pub const fn config(&self) -> &DockConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: DockConfig) {
        self.config = config.validated();
    }

    #[must_use]
    pub const fn root(&self) -> DockNodeId {
        self.root
    }

    /// Number of live nodes.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Iterate live nodes in ID order.
    pub fn nodes(&self) -> impl Iterator<Item = &DockNode> {
        self.nodes.values()
    }

    /// Look up a live node.
    pub fn node(&self, id: DockNodeId) -> Result<&DockNode> {
        if let Some(node) = self.nodes.get(&id) {
            return Ok(node);
        }
        Err(self.missing(id))
    }

    pub fn leaf(&self, id: DockNodeId) -> Result<&DockLeaf> {
        match &self.node(id)?.kind {
            DockNodeKind::Leaf(leaf) => Ok(leaf),
            DockNodeKind::Split(_) => Err(DockError::invalid(format!(
                "node {id} is a split; items live in its leaves"
            ))),
        }
    }

    pub fn split(&self, id: DockNodeId) -> Result<&DockSplit> {
        match &self.node(id)?.kind {
            DockNodeKind::Split(split) => Ok(split),
            DockNodeKind::Leaf(_) => Err(DockError::invalid(format!("node {id} is not a split"))),
        }
    }

    #[must_use]
    pub fn is_abandoned(&self, id: DockNodeId) -> bool {
        self.abandoned.contains_key(&id)
    }

    /// Follow abandoned IDs to the live node that now occupies their region.
    pub fn resolve(&self, id: DockNodeId) -> Result<DockNodeId> {
        let mut current = id;
        for _ in 0..=self.abandoned.len() {
            if self.nodes.contains_key(&current) {
                return Ok(current);
            }
            match self.abandoned.get(&current) {
                Some(successor) => current = *successor,
                None => break,
            }
        }
        Err(DockError::UnknownNode { node: id })
    }

    /// The leaf currently holding `content`.
    #[must_use]
    pub fn locate(&self, content: ContentId) -> Option<DockNodeId> {
        self.nodes.values().find_map(|node| {
            node.as_leaf()
                .filter(|leaf| leaf.position(content).is_some())
                .map(|_| node.id)
        })
    }

    /// Leaf IDs in visual order (first subtree before second).
    #[must_use]
    pub fn leaf_ids(&self) -> Vec<DockNodeId> {
        let mut out = Vec::new();
        let mut stack = vec![self.root];
        while let Some(id) = stack.pop() {
            let Some(node) = self.nodes.get(&id) else {
                continue;
            };
            match &node.kind {
                DockNodeKind::Leaf(_) => out.push(id),
                DockNodeKind::Split(split) => {
                    stack.push(split.second);
                    stack.push(split.first);
                }
            }
        }
        out
    }

    /// Total docked items across all leaves.
    #[must_use]
    pub fn item_count(&self) -> usize {
        self.nodes
            .values()
            .filter_map(DockNode::as_leaf)
            .map(DockLeaf::len)
            .sum()
    }

    /// Whether a batch is open and collapse is being deferred.
    #[must_use]
    pub const fn is_deferring(&self) -> bool {
        self.deferred > 0
    }

    /// Notifications queued since the last drain.
    ///
    /// Empty while a batch is open; see [`DockTree::take_events`].
    #[must_use]
    pub fn pending_events(&self) -> &[DockEvent] {
        if self.is_deferring() {
            return &[];
        }
        &self.events
    }

    /// Drain the notification outbox.
    ///
    /// While a batch is open nothing is handed out: events raised inside the
    /// batch are published by the outermost commit and discarded by a
    /// rollback, together with the changes they describe.
    pub fn take_events(&mut self) -> Vec<DockEvent> {
        if self.is_deferring() {
            return Vec::new();
        }
        std::mem::take(&mut self.events)
    }

    // ---------------------------------------------------------------------
    // Leaf operations
    // ---------------------------------------------------------------------

    /// Insert `handle` into `leaf` at `at` (append when `None`).
    ///
    /// The first item of an empty leaf becomes selected; otherwise the
    /// selection stays on the item it was on. Returns the insertion index.
    pub fn add_item(
        &mut self,
        leaf: DockNodeId,
        handle: ContentHandle,
        at: Option<usize>,
    ) -> Result<usize> {
        if let Some(owner) = self.locate(handle.id) {
            return Err(DockError::invalid(format!(
                "{} is already docked in {owner}",
                handle.id
            )));
        }
        let content = handle.id;
        let target = self.leaf_mut(leaf)?;
        let previous = target.selected;
        let index = at.unwrap_or(target.len());
        target.insert(index, handle)?;
        let selected = target.selected;
        self.emit(DockEvent::ItemAdded {
            leaf,
            content,
            index,
        });
        self.emit_selection(leaf, previous, selected);
        debug!(
            message = "dock.add",
            leaf = leaf.get(),
            content = content.get(),
            index,
            selected = ?selected
        );
        Ok(index)
    }

    /// Remove `content` from `leaf`.
    ///
    /// If the leaf becomes empty and has a parent, the tree collapses (unless a
    /// batch is open).
    pub fn remove_item(&mut self, leaf: DockNodeId, content: ContentId) -> Result<ContentHandle> {
        self.transact(|tree| {
            let handle = tree.detach_item(leaf, content)?;
            let _ = tree.tidy()?;
            Ok(handle)
        })
    }

    /// Remove `content` from whichever leaf holds it.
    pub fn take_item(&mut self, content: ContentId) -> Result<ContentHandle> {
        let leaf = self
            .locate(content)
            .ok_or(DockError::UnknownContent { content })?;
        self.remove_item(leaf, content)
    }

    /// Reorder tabs inside one leaf. The selection stays with its item.
    pub fn move_item_within(&mut self, leaf: DockNodeId, from: usize, to: usize) -> Result<()> {
        let target = self.leaf_mut(leaf)?;
        let previous = target.selected;
        target.move_within(from, to)?;
        if from == to {
            return Ok(());
        }
        let content = target.items[to].id;
        let selected = target.selected;
        self.emit(DockEvent::ItemMoved {
            leaf,
            content,
            from,
            to,
        });
        self.emit_selection(leaf, previous, selected);
        debug!(message = "dock.move", leaf = leaf.get(), from, to);
        Ok(())
    }

    pub fn select(&mut self, leaf: DockNodeId, index: usize) -> Result<()> {
        let target = self.leaf_mut(leaf)?;
        let previous = target.selected;
        target.select(index)?;
        if previous != Some(index) {
            self.emit(DockEvent::SelectionChanged {
                leaf,
                selected: Some(index),
            });
            debug!(message = "dock.select", leaf = leaf.get(), index);
        }
        Ok(())
    }

    /// Select `content` in the leaf that holds it; returns that leaf.
    pub fn select_content(&mut self, content: ContentId) -> Result<DockNodeId> {
        let leaf = self
            .locate(content)
            .ok_or(DockError::UnknownContent { content })?;
        let index = self
            .leaf(leaf)?
            .position(content)
            .ok_or(DockError::UnknownContent { content })?;
        self.select(leaf, index)?;
        Ok(leaf)
    }

    pub fn selected(&self, leaf: DockNodeId) -> Result<Option<&ContentHandle>> {
        Ok(self.leaf(leaf)?.selected_item())
    }

    pub fn set_allow_drop(&mut self, leaf: DockNodeId, allow: bool) -> Result<()> {
        self.leaf_mut(leaf)?.allow_drop = allow;
        Ok(())
    }

    pub fn set_tab_strip(&mut self, leaf: DockNodeId, placement: TabStripPlacement) -> Result<()> {
        self.leaf_mut(leaf)?.tab_strip = placement;
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Split composition
    // ---------------------------------------------------------------------

    /// Turn the empty leaf `node` into a split of two freshly built subtrees.
    ///
    /// Fails with [`DockError::InvalidState`] when either child is missing,
    /// when `node` still holds items or already is a split, when both children
    /// would be empty, or when any content in the layouts is already docked.
    /// A side that is empty collapses immediately unless a batch is open.
    pub fn set_children(
        &mut self,
        node: DockNodeId,
        first: Option<DockLayout>,
        second: Option<DockLayout>,
        orientation: Orientation,
    ) -> Result<(DockNodeId, DockNodeId)> {
        let (Some(first), Some(second)) = (first, second) else {
            return Err(DockError::invalid("a split needs both children"));
        };
        let divider = self.config.divider_ratio();
        self.compose(node, first, second, orientation, divider)
    }

    /// Move the divider of `split`; out-of-range ratios are clamped.
    pub fn set_divider_ratio(&mut self, split: DockNodeId, ratio: f64) -> Result<DividerRatio> {
        let node = self.node_mut(split)?;
        let DockNodeKind::Split(payload) = &mut node.kind else {
            return Err(DockError::invalid(format!("node {split} is not a split")));
        };
        payload.divider = DividerRatio::new(ratio);
        let applied = payload.divider;
        self.emit(DockEvent::DividerMoved {
            split,
            ratio: applied.get(),
        });
        Ok(applied)
    }

    /// Explicitly collapse `split`, one of whose children is an empty leaf.
    ///
    /// Equivalent to replacing the split by its other child.
    pub fn collapse(&mut self, split: DockNodeId) -> Result<CollapseOutcome> {
        self.transact(|tree| {
            let payload = tree.split(split)?;
            let emptied = [payload.first, payload.second]
                .into_iter()
                .find(|child| tree.node(*child).is_ok_and(DockNode::is_empty_leaf))
                .ok_or_else(|| DockError::invalid(format!("split {split} has no empty side")))?;
            let outcome = tree
                .collapse_leaf(emptied)?
                .ok_or_else(|| DockError::invalid(format!("leaf {emptied} has no parent")))?;
            let _ = tree.tidy()?;
            Ok(outcome)
        })
    }

    // ---------------------------------------------------------------------
    // Diagnostics
    // ---------------------------------------------------------------------

    /// Check structural invariants.
    ///
    /// - the root exists and has no parent; every node is reachable from it
    /// - split children point back at their split
    /// - no split holds two empty leaves, even inside a batch; outside a
    ///   batch no non-root leaf is empty
    /// - selection is in range exactly when a leaf has items
    /// - each content ID is docked at most once
    pub fn validate(&self) -> Result<()> {
        let root = self
            .nodes
            .get(&self.root)
            .ok_or_else(|| DockError::invalid(format!("root {} is missing", self.root)))?;
        if let Some(parent) = root.parent {
            return Err(DockError::invalid(format!(
                "root {} must not have parent {parent}",
                self.root
            )));
        }

        let mut seen = BTreeSet::new();
        let mut contents = BTreeSet::new();
        let mut stack = vec![self.root];
        while let Some(id) = stack.pop() {
            if !seen.insert(id) {
                return Err(DockError::invalid(format!("node {id} is reachable twice")));
            }
            let node = self
                .nodes
                .get(&id)
                .ok_or_else(|| DockError::invalid(format!("node {id} is referenced but missing")))?;
            if node.id != id {
                return Err(DockError::invalid(format!(
                    "node stored under {id} claims id {}",
                    node.id
                )));
            }
            match &node.kind {
                DockNodeKind::Leaf(leaf) => {
                    match (leaf.is_empty(), leaf.selected) {
                        (true, Some(index)) => {
                            return Err(DockError::invalid(format!(
                                "empty leaf {id} selects index {index}"
                            )));
                        }
                        (false, None) => {
                            return Err(DockError::invalid(format!(
                                "leaf {id} has items but no selection"
                            )));
                        }
                        (false, Some(index)) if index >= leaf.len() => {
                            return Err(DockError::IndexOutOfRange {
                                index,
                                len: leaf.len(),
                            });
                        }
                        _ => {}
                    }
                    for item in &leaf.items {
                        if !contents.insert(item.id) {
                            return Err(DockError::invalid(format!(
                                "{} is docked more than once",
                                item.id
                            )));
                        }
                    }
                    if leaf.is_empty() && node.parent.is_some() && !self.is_deferring() {
                        return Err(DockError::invalid(format!(
                            "non-root leaf {id} is empty outside a batch"
                        )));
                    }
                }
                DockNodeKind::Split(split) => {
                    if split.first == split.second {
                        return Err(DockError::invalid(format!(
                            "split {id} holds {} twice",
                            split.first
                        )));
                    }
                    let ratio = split.divider.get();
                    if !(ratio > 0.0 && ratio < 1.0) {
                        return Err(DockError::invalid(format!(
                            "split {id} divider {ratio} outside (0, 1)"
                        )));
                    }
                    let mut empty_sides = 0;
                    for child in [split.first, split.second] {
                        let child_node = self.nodes.get(&child).ok_or_else(|| {
                            DockError::invalid(format!("split {id} references missing {child}"))
                        })?;
                        if child_node.parent != Some(id) {
                            return Err(DockError::invalid(format!(
                                "node {child} parent mismatch: expected {id}, got {:?}",
                                child_node.parent.map(DockNodeId::get)
                            )));
                        }
                        if child_node.is_empty_leaf() {
                            empty_sides += 1;
                        }
                        stack.push(child);
                    }
                    if empty_sides == 2 {
                        return Err(DockError::invalid(format!(
                            "split {id} holds two empty leaves"
                        )));
                    }
                }
            }
        }

        if seen.len() != self.nodes.len() {
            return Err(DockError::invalid(format!(
                "{} node(s) are unreachable from the root",
                self.nodes.len() - seen.len()
            )));
        }
        if let Some(id) = self.abandoned.keys().find(|id| self.nodes.contains_key(id)) {
            return Err(DockError::invalid(format!("abandoned node {id} is still live")));
        }
        Ok(())
    }

    /// Indented listing of the tree, one line per leaf item.
    ///
    /// ```text
    /// Split #1 [horizontal 0.50]
    /// - [Left ]
    ///   Leaf #2 [1 item(s)]
    ///   - Scene [X]
    /// - [Right]
    ///   Leaf #3 [2 item(s)]
    ///   - Log [ ]
    ///   - Output [X]
    /// ```
    #[must_use]
    pub fn dump(&self) -> String {
        enum Line {
            Node(DockNodeId),
            Slot(&'static str),
        }

        let mut out = String::new();
        let mut stack = vec![(Line::Node(self.root), 0usize)];
        while let Some((line, level)) = stack.pop() {
            let prefix = "  ".repeat(level);
            let id = match line {
                Line::Slot(label) => {
                    let _ = writeln!(out, "{prefix}- [{label}]");
                    continue;
                }
                Line::Node(id) => id,
            };
            let Some(node) = self.nodes.get(&id) else {
                let _ = writeln!(out, "{prefix}<missing {id}>");
                continue;
            };
            match &node.kind {
                DockNodeKind::Leaf(leaf) => {
                    let _ = writeln!(out, "{prefix}Leaf {id} [{} item(s)]", leaf.len());
                    for (index, item) in leaf.items.iter().enumerate() {
                        let mark = if leaf.selected == Some(index) { 'X' } else { ' ' };
                        let _ = writeln!(out, "{prefix}- {} [{mark}]", item.label);
                    }
                }
                DockNodeKind::Split(split) => {
                    let orientation = match split.orientation {
                        Orientation::Horizontal => "horizontal",
                        Orientation::Vertical => "vertical",
                    };
                    let _ = writeln!(
                        out,
                        "{prefix}Split {id} [{orientation} {:.2}]",
                        split.divider.get()
                    );
                    let (first_label, second_label) = split.orientation.slot_labels();
                    stack.push((Line::Node(split.second), level + 1));
                    stack.push((Line::Slot(second_label), level));
                    stack.push((Line::Node(split.first), level + 1));
                    stack.push((Line::Slot(first_label), level));
                }
            }
        }
        out
    }

    // ---------------------------------------------------------------------
    // Internals
    // ---------------------------------------------------------------------

    /// Run `op` on a working copy; commit it only if `op` succeeds.
    ///
    /// The undrained outbox is set aside instead of cloned; the working copy
    /// starts with an empty one and its events are appended on success.
    pub(crate) fn transact<T>(&mut self, op: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        let queued = std::mem::take(&mut self.events);
        let mut working = self.clone();
        let result = op(&mut working);
        if result.is_ok() {
            *self = working;
        }
        let raised = std::mem::replace(&mut self.events, queued);
        self.events.extend(raised);
        if let Err(err) = &result {
            debug!(message = "dock.rejected", error = %err);
        }
        result
    }

    pub(crate) fn emit(&mut self, event: DockEvent) {
        self.events.push(event);
    }

    /// Report a selection index that shifted as a side effect of an edit.
    pub(crate) fn emit_selection(
        &mut self,
        leaf: DockNodeId,
        previous: Option<usize>,
        selected: Option<usize>,
    ) {
        if previous != selected {
            self.emit(DockEvent::SelectionChanged { leaf, selected });
        }
    }

    fn missing(&self, id: DockNodeId) -> DockError {
        if self.abandoned.contains_key(&id) {
            DockError::UseAfterAbandon { node: id }
        } else {
            DockError::UnknownNode { node: id }
        }
    }

    pub(crate) fn node_mut(&mut self, id: DockNodeId) -> Result<&mut DockNode> {
        if !self.nodes.contains_key(&id) {
            return Err(self.missing(id));
        }
        self.nodes
            .get_mut(&id)
            .ok_or(DockError::UnknownNode { node: id })
    }

    pub(crate) fn leaf_mut(&mut self, id: DockNodeId) -> Result<&mut DockLeaf> {
        match &mut self.node_mut(id)?.kind {
            DockNodeKind::Leaf(leaf) => Ok(leaf),
            DockNodeKind::Split(_) => Err(DockError::invalid(format!(
                "node {id} is a split; items live in its leaves"
            ))),
        }
    }

    pub(crate) fn allocate_id(&mut self) -> Result<DockNodeId> {
        let current = self.next_id;
        self.next_id = current.checked_next()?;
        Ok(current)
    }

    /// Remove an item without triggering collapse.
    pub(crate) fn detach_item(
        &mut self,
        leaf: DockNodeId,
        content: ContentId,
    ) -> Result<ContentHandle> {
        let target = self.leaf_mut(leaf)?;
        let index = target
            .position(content)
            .ok_or(DockError::UnknownContent { content })?;
        let previous = target.selected;
        let handle = target.remove_at(index)?;
        let remaining = target.len();
        let selected = target.selected;
        self.emit(DockEvent::ItemRemoved {
            leaf,
            content,
            index,
        });
        self.emit_selection(leaf, previous, selected);
        debug!(
            message = "dock.remove",
            leaf = leaf.get(),
            content = content.get(),
            index,
            remaining
        );
        Ok(handle)
    }

    /// Collapse after a mutation.
    ///
    /// Outside a batch every empty non-root leaf collapses. Inside one only
    /// splits left holding two empty leaves collapse, so the tree never shows
    /// such a split even while the rest of the cleanup waits for commit.
    pub(crate) fn tidy(&mut self) -> Result<Vec<CollapseOutcome>> {
        if self.is_deferring() {
            self.collapse_empty_pairs()
        } else {
            self.settle()
        }
    }

    /// Collapse the second side of every split whose children are both
    /// empty leaves; the first side is promoted.
    fn collapse_empty_pairs(&mut self) -> Result<Vec<CollapseOutcome>> {
        let mut outcomes = Vec::new();
        while let Some(emptied) = self.nodes.values().find_map(|node| {
            let split = node.as_split()?;
            let both_empty = [split.first, split.second]
                .into_iter()
                .all(|child| self.nodes.get(&child).is_some_and(DockNode::is_empty_leaf));
            both_empty.then_some(split.second)
        }) {
            match self.collapse_leaf(emptied)? {
                Some(outcome) => outcomes.push(outcome),
                None => break,
            }
        }
        Ok(outcomes)
    }

    /// Collapse every empty non-root leaf, cascading until none is left.
    pub(crate) fn settle(&mut self) -> Result<Vec<CollapseOutcome>> {
        let mut outcomes = Vec::new();
        while let Some(emptied) = self
            .nodes
            .values()
            .find(|node| node.parent.is_some() && node.is_empty_leaf())
            .map(|node| node.id)
        {
            match self.collapse_leaf(emptied)? {
                Some(outcome) => outcomes.push(outcome),
                None => break,
            }
        }
        Ok(outcomes)
    }

    /// Promote the sibling of the empty leaf `emptied` into its parent's slot.
    ///
    /// Returns `None` when `emptied` is the root, which stays an empty leaf.
    pub(crate) fn collapse_leaf(&mut self, emptied: DockNodeId) -> Result<Option<CollapseOutcome>> {
        let node = self.node(emptied)?;
        let DockNodeKind::Leaf(leaf) = &node.kind else {
            return Err(DockError::invalid(format!(
                "only an empty leaf can collapse, {emptied} is a split"
            )));
        };
        if !leaf.is_empty() {
            return Err(DockError::invalid(format!(
                "leaf {emptied} still holds {} item(s)",
                leaf.len()
            )));
        }
        let Some(split_id) = node.parent else {
            return Ok(None);
        };
        let split_node = self.node(split_id)?;
        let DockNodeKind::Split(split) = &split_node.kind else {
            return Err(DockError::invalid(format!(
                "parent {split_id} of {emptied} is not a split"
            )));
        };
        let promoted = split.sibling_of(emptied).ok_or_else(|| {
            DockError::invalid(format!("split {split_id} does not hold {emptied}"))
        })?;
        let slot_parent = split_node.parent;

        match slot_parent {
            Some(grandparent) => {
                let DockNodeKind::Split(outer) = &mut self.node_mut(grandparent)?.kind else {
                    return Err(DockError::invalid(format!(
                        "parent {grandparent} of {split_id} is not a split"
                    )));
                };
                if !outer.replace_child(split_id, promoted) {
                    return Err(DockError::invalid(format!(
                        "split {grandparent} does not hold {split_id}"
                    )));
                }
            }
            None => self.root = promoted,
        }
        self.node_mut(promoted)?.parent = slot_parent;

        let _ = self.nodes.remove(&emptied);
        let _ = self.nodes.remove(&split_id);
        for successor in self.abandoned.values_mut() {
            if *successor == emptied || *successor == split_id {
                *successor = promoted;
            }
        }
        for dead in [emptied, split_id] {
            let _ = self.abandoned.insert(dead, promoted);
        }

        self.emit(DockEvent::Collapsed {
            emptied,
            split: split_id,
            promoted,
        });
        for dead in [emptied, split_id] {
            self.emit(DockEvent::Abandoned {
                node: dead,
                successor: promoted,
            });
        }
        debug!(
            message = "dock.collapse",
            emptied = emptied.get(),
            split = split_id.get(),
            promoted = promoted.get(),
            slot_parent = ?slot_parent.map(DockNodeId::get)
        );

        Ok(Some(CollapseOutcome {
            emptied,
            split: split_id,
            promoted,
            slot_parent,
        }))
    }

    fn compose(
        &mut self,
        node: DockNodeId,
        first: DockLayout,
        second: DockLayout,
        orientation: Orientation,
        divider: DividerRatio,
    ) -> Result<(DockNodeId, DockNodeId)> {
        self.transact(|tree| {
            match &tree.node(node)?.kind {
                DockNodeKind::Split(_) => {
                    return Err(DockError::invalid(format!(
                        "node {node} already holds a split"
                    )));
                }
                DockNodeKind::Leaf(leaf) if !leaf.is_empty() => {
                    return Err(DockError::invalid(format!(
                        "leaf {node} still holds {} item(s); relocate them before splitting",
                        leaf.len()
                    )));
                }
                DockNodeKind::Leaf(_) => {}
            }
            if first.item_count() == 0 && second.item_count() == 0 {
                return Err(DockError::invalid("both children of a split would be empty"));
            }
            tree.check_layout_content(&[&first, &second])?;
            let children = tree.install_split(node, orientation, divider, first, second)?;
            let _ = tree.tidy()?;
            Ok(children)
        })
    }

    /// Replace the empty leaf `node` with a split over two built subtrees.
    pub(crate) fn install_split(
        &mut self,
        node: DockNodeId,
        orientation: Orientation,
        divider: DividerRatio,
        first: DockLayout,
        second: DockLayout,
    ) -> Result<(DockNodeId, DockNodeId)> {
        let first_id = self.build_layout(node, first)?;
        let second_id = self.build_layout(node, second)?;
        self.node_mut(node)?.kind = DockNodeKind::Split(DockSplit {
            orientation,
            divider,
            first: first_id,
            second: second_id,
        });
        self.emit(DockEvent::Split {
            node,
            first: first_id,
            second: second_id,
            orientation,
        });
        debug!(
            message = "dock.split",
            node = node.get(),
            first = first_id.get(),
            second = second_id.get(),
            orientation = ?orientation
        );
        Ok((first_id, second_id))
    }

    fn build_layout(&mut self, parent: DockNodeId, layout: DockLayout) -> Result<DockNodeId> {
        let id = self.allocate_id()?;
        let _ = self
            .nodes
            .insert(id, DockNode::leaf(id, Some(parent), DockLeaf::default()));
        match layout {
            DockLayout::Tabs {
                items,
                selected,
                tab_strip,
            } => self.populate_leaf(id, items, selected, tab_strip)?,
            DockLayout::Split {
                orientation,
                divider,
                first,
                second,
            } => {
                let divider = divider.map_or_else(|| self.config.divider_ratio(), DividerRatio::new);
                let _ = self.install_split(id, orientation, divider, *first, *second)?;
            }
        }
        Ok(id)
    }

    fn populate_leaf(
        &mut self,
        leaf: DockNodeId,
        items: Vec<ContentHandle>,
        selected: Option<usize>,
        tab_strip: TabStripPlacement,
    ) -> Result<()> {
        self.leaf_mut(leaf)?.tab_strip = tab_strip;
        for item in items {
            let _ = self.add_item(leaf, item, None)?;
        }
        if let Some(index) = selected {
            self.select(leaf, index)?;
        }
        Ok(())
    }

    fn check_layout_content(&self, layouts: &[&DockLayout]) -> Result<()> {
        let mut seen = BTreeSet::new();
        for layout in layouts {
            for content in layout.content_ids() {
                if !seen.insert(content) {
                    return Err(DockError::invalid(format!(
                        "{content} appears twice in the layout"
                    )));
                }
                if let Some(owner) = self.locate(content) {
                    return Err(DockError::invalid(format!(
                        "{content} is already docked in {owner}"
                    )));
                }
            }
        }
        Ok(())
    }
}

impl fmt::Display for DockTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.dump())
    }
}
