//! Mutation notifications.
//!
//! The tree appends one [`DockEvent`] per committed structural change to an
//! outbox; the view layer drains it with [`DockTree::take_events`] after each
//! call and re-renders the affected nodes. Events are only ever delivered
//! after the mutating call has returned, so a listener can never re-enter a
//! half-finished collapse.
//!
//! [`DockTree::take_events`]: crate::DockTree::take_events

use serde::{Deserialize, Serialize};

use crate::content::ContentId;
use crate::node::{DockNodeId, Orientation};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum DockEvent {
    ItemAdded {
        leaf: DockNodeId,
        content: ContentId,
        index: usize,
    },
    ItemRemoved {
        leaf: DockNodeId,
        content: ContentId,
        index: usize,
    },
    ItemMoved {
        leaf: DockNodeId,
        content: ContentId,
        from: usize,
        to: usize,
    },
    /// Every item of `from` now lives in `to`, in the same order.
    ItemsTransferred {
        from: DockNodeId,
        to: DockNodeId,
        contents: Vec<ContentId>,
    },
    SelectionChanged {
        leaf: DockNodeId,
        selected: Option<usize>,
    },
    /// `node` became a split holding `first` and `second`.
    Split {
        node: DockNodeId,
        first: DockNodeId,
        second: DockNodeId,
        orientation: Orientation,
    },
    /// `emptied` and its parent `split` were removed; `promoted` took the
    /// split's slot.
    Collapsed {
        emptied: DockNodeId,
        split: DockNodeId,
        promoted: DockNodeId,
    },
    Abandoned {
        node: DockNodeId,
        successor: DockNodeId,
    },
    DividerMoved {
        split: DockNodeId,
        ratio: f64,
    },
}

impl DockEvent {
    /// Nodes whose rendering is stale after this event.
    #[must_use]
    pub fn touched_nodes(&self) -> Vec<DockNodeId> {
        match self {
            Self::ItemAdded { leaf, .. }
            | Self::ItemRemoved { leaf, .. }
            | Self::ItemMoved { leaf, .. }
            | Self::SelectionChanged { leaf, .. } => vec![*leaf],
            Self::ItemsTransferred { from, to, .. } => vec![*from, *to],
            Self::Split {
                node,
                first,
                second,
                ..
            } => vec![*node, *first, *second],
            Self::Collapsed { promoted, .. } => vec![*promoted],
            Self::Abandoned { successor, .. } => vec![*successor],
            Self::DividerMoved { split, .. } => vec![*split],
        }
    }
}
