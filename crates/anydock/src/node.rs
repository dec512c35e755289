//! Dock node model: tab-container leaves and binary splits.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::content::{ContentHandle, ContentId};
use crate::error::{DockError, Result};

/// Stable identifier for dock nodes.
///
/// `0` is reserved so IDs are always non-zero. IDs are never reused, which is
/// what lets an abandoned ID be detected on later access.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u64", into = "u64")]
pub struct DockNodeId(u64);

impl DockNodeId {
    /// Lowest valid node ID.
    pub const MIN: Self = Self(1);

    /// Create a node ID, rejecting 0.
    pub fn new(raw: u64) -> Result<Self> {
        if raw == 0 {
            return Err(DockError::invalid("dock node id 0 is reserved"));
        }
        Ok(Self(raw))
    }

    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }

    /// Return the next ID, or an error on overflow.
    pub fn checked_next(self) -> Result<Self> {
        let Some(next) = self.0.checked_add(1) else {
            return Err(DockError::invalid(format!("dock node id overflow after {self}")));
        };
        Self::new(next)
    }
}

impl Default for DockNodeId {
    fn default() -> Self {
        Self::MIN
    }
}

impl fmt::Display for DockNodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl TryFrom<u64> for DockNodeId {
    type Error = DockError;

    fn try_from(raw: u64) -> Result<Self> {
        Self::new(raw)
    }
}

impl From<DockNodeId> for u64 {
    fn from(id: DockNodeId) -> Self {
        id.0
    }
}

/// Split orientation.
///
/// `Horizontal` places children left/right with a vertical divider line;
/// `Vertical` places them top/bottom.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Orientation {
    #[default]
    Horizontal,
    Vertical,
}

impl Orientation {
    /// Labels for the first and second slot, as shown in the self-check dump.
    #[must_use]
    pub const fn slot_labels(self) -> (&'static str, &'static str) {
        match self {
            Self::Horizontal => ("Left ", "Right"),
            Self::Vertical => ("Up   ", "Down "),
        }
    }
}

/// Share of the split's extent given to the first child.
///
/// Always strictly inside `(0, 1)`: out-of-range input is clamped to
/// `[MIN, MAX]`, and NaN falls back to an even split.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(from = "f64", into = "f64")]
pub struct DividerRatio(f64);

impl DividerRatio {
    pub const MIN: f64 = 0.05;
    pub const MAX: f64 = 0.95;
    pub const EVEN: Self = Self(0.5);

    #[must_use]
    pub fn new(ratio: f64) -> Self {
        if ratio.is_nan() {
            return Self::EVEN;
        }
        Self(ratio.clamp(Self::MIN, Self::MAX))
    }

    #[must_use]
    pub const fn get(self) -> f64 {
        self.0
    }
}

impl Default for DividerRatio {
    fn default() -> Self {
        Self::EVEN
    }
}

impl From<f64> for DividerRatio {
    fn from(ratio: f64) -> Self {
        Self::new(ratio)
    }
}

impl From<DividerRatio> for f64 {
    fn from(ratio: DividerRatio) -> Self {
        ratio.0
    }
}

/// Where the view layer draws a leaf's tab strip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TabStripPlacement {
    #[default]
    Top,
    Bottom,
    Left,
    Right,
}

/// Tab container payload.
///
/// Insertion order is tab order. `selected` is `Some` exactly when `items`
/// is non-empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DockLeaf {
    #[serde(default)]
    pub(crate) items: Vec<ContentHandle>,
    #[serde(default)]
    pub(crate) selected: Option<usize>,
    #[serde(default = "default_allow_drop")]
    pub(crate) allow_drop: bool,
    #[serde(default)]
    pub(crate) tab_strip: TabStripPlacement,
}

fn default_allow_drop() -> bool {
    true
}

impl Default for DockLeaf {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            selected: None,
            allow_drop: true,
            tab_strip: TabStripPlacement::Top,
        }
    }
}

impl DockLeaf {
    #[must_use]
    pub fn items(&self) -> &[ContentHandle] {
        &self.items
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    #[must_use]
    pub const fn selected_index(&self) -> Option<usize> {
        self.selected
    }

    #[must_use]
    pub fn selected_item(&self) -> Option<&ContentHandle> {
        self.selected.and_then(|index| self.items.get(index))
    }

    #[must_use]
    pub const fn allow_drop(&self) -> bool {
        self.allow_drop
    }

    #[must_use]
    pub const fn tab_strip(&self) -> TabStripPlacement {
        self.tab_strip
    }

    #[must_use]
    pub fn position(&self, content: ContentId) -> Option<usize> {
        self.items.iter().position(|item| item.id == content)
    }

    pub(crate) fn selected_content(&self) -> Option<ContentId> {
        self.selected_item().map(|item| item.id)
    }

    /// Insert keeping the previously selected item selected.
    pub(crate) fn insert(&mut self, index: usize, handle: ContentHandle) -> Result<()> {
        if index > self.items.len() {
            return Err(DockError::IndexOutOfRange {
                index,
                len: self.items.len(),
            });
        }
        self.items.insert(index, handle);
        self.selected = match self.selected {
            None => Some(index),
            Some(current) if current >= index => Some(current + 1),
            Some(current) => Some(current),
        };
        Ok(())
    }

    /// Remove the item at `index`.
    ///
    /// If the selected item is removed, the selection stays at the same index
    /// when possible, otherwise moves to the new last item.
    pub(crate) fn remove_at(&mut self, index: usize) -> Result<ContentHandle> {
        if index >= self.items.len() {
            return Err(DockError::IndexOutOfRange {
                index,
                len: self.items.len(),
            });
        }
        let removed = self.items.remove(index);
        self.selected = match self.selected {
            _ if self.items.is_empty() => None,
            Some(current) if current > index => Some(current - 1),
            Some(current) => Some(current.min(self.items.len() - 1)),
            None => Some(0),
        };
        Ok(removed)
    }

    pub(crate) fn move_within(&mut self, from: usize, to: usize) -> Result<()> {
        let len = self.items.len();
        for index in [from, to] {
            if index >= len {
                return Err(DockError::IndexOutOfRange { index, len });
            }
        }
        let selected = self.selected_content();
        let item = self.items.remove(from);
        self.items.insert(to, item);
        self.reselect(selected);
        Ok(())
    }

    pub(crate) fn select(&mut self, index: usize) -> Result<()> {
        if index >= self.items.len() {
            return Err(DockError::IndexOutOfRange {
                index,
                len: self.items.len(),
            });
        }
        self.selected = Some(index);
        Ok(())
    }

    /// Point the selection back at `content`; if it is gone, fall back to the
    /// nearest valid index, then to the first item.
    pub(crate) fn reselect(&mut self, content: Option<ContentId>) {
        if self.items.is_empty() {
            self.selected = None;
            return;
        }
        if let Some(index) = content.and_then(|id| self.position(id)) {
            self.selected = Some(index);
            return;
        }
        let last = self.items.len() - 1;
        self.selected = Some(self.selected.map_or(0, |index| index.min(last)));
    }

    /// Move every item out, leaving an empty leaf with the same flags.
    pub(crate) fn drain(&mut self) -> DockLeaf {
        DockLeaf {
            items: std::mem::take(&mut self.items),
            selected: self.selected.take(),
            allow_drop: self.allow_drop,
            tab_strip: self.tab_strip,
        }
    }
}

/// Binary split payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DockSplit {
    pub orientation: Orientation,
    #[serde(default)]
    pub divider: DividerRatio,
    pub first: DockNodeId,
    pub second: DockNodeId,
}

impl DockSplit {
    /// The child opposite `child`, if `child` belongs to this split.
    #[must_use]
    pub fn sibling_of(&self, child: DockNodeId) -> Option<DockNodeId> {
        if self.first == child {
            Some(self.second)
        } else if self.second == child {
            Some(self.first)
        } else {
            None
        }
    }

    pub(crate) fn replace_child(&mut self, old: DockNodeId, new: DockNodeId) -> bool {
        if self.first == old {
            self.first = new;
            true
        } else if self.second == old {
            self.second = new;
            true
        } else {
            false
        }
    }
}

/// Node payload variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DockNodeKind {
    Leaf(DockLeaf),
    Split(DockSplit),
}

/// One node of the dock tree.
///
/// `parent` is a non-owning back-reference; the owning edge is the parent
/// split's `first`/`second` slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DockNode {
    pub id: DockNodeId,
    #[serde(default)]
    pub parent: Option<DockNodeId>,
    #[serde(flatten)]
    pub kind: DockNodeKind,
}

impl DockNode {
    pub(crate) fn leaf(id: DockNodeId, parent: Option<DockNodeId>, leaf: DockLeaf) -> Self {
        Self {
            id,
            parent,
            kind: DockNodeKind::Leaf(leaf),
        }
    }

    #[must_use]
    pub fn as_leaf(&self) -> Option<&DockLeaf> {
        match &self.kind {
            DockNodeKind::Leaf(leaf) => Some(leaf),
            DockNodeKind::Split(_) => None,
        }
    }

    #[must_use]
    pub fn as_split(&self) -> Option<&DockSplit> {
        match &self.kind {
            DockNodeKind::Split(split) => Some(split),
            DockNodeKind::Leaf(_) => None,
        }
    }

    #[must_use]
    pub fn is_empty_leaf(&self) -> bool {
        self.as_leaf().is_some_and(DockLeaf::is_empty)
    }

    /// What the view layer should show for this node.
    #[must_use]
    pub fn visibility(&self) -> Visibility {
        match self.kind {
            DockNodeKind::Leaf(_) => Visibility {
                tab_strip: true,
                first: false,
                second: false,
                divider: false,
            },
            DockNodeKind::Split(_) => Visibility {
                tab_strip: false,
                first: true,
                second: true,
                divider: true,
            },
        }
    }
}

/// Visibility projection of one node; derived, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Visibility {
    pub tab_strip: bool,
    pub first: bool,
    pub second: bool,
    pub divider: bool,
}
