//! View-layer side table and close interception.
//!
//! The tree never stores view state. A [`ViewBinding`] keeps the
//! `ContentId -> owning leaf` map a view layer needs for routing input, plus
//! the set of nodes whose rendering went stale, and keeps both current by
//! replaying the tree's [`DockEvent`] outbox.

use std::collections::BTreeSet;

use rustc_hash::FxHashMap;
use tracing::debug;

use crate::content::{ContentHandle, ContentId};
use crate::error::{DockError, Result};
use crate::event::DockEvent;
use crate::node::DockNodeId;
use crate::tree::DockTree;

/// Side table from content to its owning leaf, with a dirty-node set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewBinding {
    owners: FxHashMap<ContentId, DockNodeId>,
    dirty: BTreeSet<DockNodeId>,
}

impl ViewBinding {
    /// Build the table from the current tree; every live node starts dirty.
    #[must_use]
    pub fn attach(tree: &DockTree) -> Self {
        let mut binding = Self::default();
        for node in tree.nodes() {
            let _ = binding.dirty.insert(node.id);
            if let Some(leaf) = node.as_leaf() {
                for item in leaf.items() {
                    let _ = binding.owners.insert(item.id, node.id);
                }
            }
        }
        binding
    }

    /// Drain the tree's outbox and apply every event.
    ///
    /// Inside an open batch the outbox is held back, so this applies nothing
    /// until the batch commits.
    pub fn sync(&mut self, tree: &mut DockTree) -> usize {
        let events = tree.take_events();
        for event in &events {
            self.apply(event);
        }
        events.len()
    }

    /// Apply one event.
    pub fn apply(&mut self, event: &DockEvent) {
        match event {
            DockEvent::ItemAdded { leaf, content, .. } => {
                let _ = self.owners.insert(*content, *leaf);
            }
            DockEvent::ItemRemoved { leaf, content, .. } => {
                if self.owners.get(content) == Some(leaf) {
                    let _ = self.owners.remove(content);
                }
            }
            DockEvent::ItemsTransferred { to, contents, .. } => {
                for content in contents {
                    let _ = self.owners.insert(*content, *to);
                }
            }
            DockEvent::Abandoned { node, .. } => {
                let _ = self.dirty.remove(node);
            }
            DockEvent::ItemMoved { .. }
            | DockEvent::SelectionChanged { .. }
            | DockEvent::Split { .. }
            | DockEvent::Collapsed { .. }
            | DockEvent::DividerMoved { .. } => {}
        }
        self.dirty.extend(event.touched_nodes());
    }

    /// Leaf currently showing `content`.
    #[must_use]
    pub fn owner(&self, content: ContentId) -> Option<DockNodeId> {
        self.owners.get(&content).copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.owners.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.owners.is_empty()
    }

    /// Nodes needing a re-render since the last call.
    pub fn take_dirty(&mut self) -> BTreeSet<DockNodeId> {
        std::mem::take(&mut self.dirty)
    }
}

/// A user-initiated close awaiting approval.
#[derive(Debug, Clone, Copy)]
pub struct CloseRequest<'a> {
    pub content: &'a ContentHandle,
    pub leaf: DockNodeId,
}

/// Veto hook consulted before a user-initiated close.
pub trait ClosePolicy {
    /// Return `false` to keep the item open.
    fn allow_close(&mut self, request: &CloseRequest<'_>) -> bool;
}

impl<F> ClosePolicy for F
where
    F: FnMut(&CloseRequest<'_>) -> bool,
{
    fn allow_close(&mut self, request: &CloseRequest<'_>) -> bool {
        self(request)
    }
}

/// Close policy that never vetoes.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAll;

impl ClosePolicy for AllowAll {
    fn allow_close(&mut self, _request: &CloseRequest<'_>) -> bool {
        true
    }
}

/// Result of [`DockTree::close_item`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CloseOutcome {
    /// Removed from the tree; the caller now owns disposal of the content.
    Closed(ContentHandle),
    /// The policy kept it open.
    Vetoed,
    /// The handle is not closable.
    NotClosable,
}

impl DockTree {
    /// Close `content` as if the user clicked its close button.
    ///
    /// Non-closable items and vetoed requests leave the tree unchanged.
    pub fn close_item(
        &mut self,
        content: ContentId,
        policy: &mut impl ClosePolicy,
    ) -> Result<CloseOutcome> {
        let leaf = self
            .locate(content)
            .ok_or(DockError::UnknownContent { content })?;
        let handle = self
            .leaf(leaf)?
            .items()
            .iter()
            .find(|item| item.id == content)
            .ok_or(DockError::UnknownContent { content })?;
        if !handle.can_close {
            return Ok(CloseOutcome::NotClosable);
        }
        if !policy.allow_close(&CloseRequest {
            content: handle,
            leaf,
        }) {
            debug!(message = "dock.close.vetoed", content = content.get());
            return Ok(CloseOutcome::Vetoed);
        }
        self.remove_item(leaf, content).map(CloseOutcome::Closed)
    }
}
