//! Declarative layouts and persisted tree snapshots.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::config::DockConfig;
use crate::content::{ContentHandle, ContentId};
use crate::error::{DockError, Result};
use crate::node::{DockNode, DockNodeId, DockNodeKind, Orientation, TabStripPlacement};
use crate::tree::DockTree;

/// Current dock snapshot schema version.
pub const DOCK_TREE_SCHEMA_VERSION: u16 = 1;

/// Deepest subtree [`DockTree::layout_of`] will describe.
///
/// [`DockLayout`] nests through boxes, so building, dropping and serializing
/// one recurses per level. The tree itself has no depth limit.
pub const MAX_LAYOUT_DEPTH: usize = 256;

/// Shape of a subtree to build, used by [`DockTree::set_children`] and
/// [`DockTree::from_layout`].
///
/// Node IDs are assigned when the layout is installed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DockLayout {
    Tabs {
        #[serde(default)]
        items: Vec<ContentHandle>,
        #[serde(default)]
        selected: Option<usize>,
        #[serde(default)]
        tab_strip: TabStripPlacement,
    },
    Split {
        #[serde(default)]
        orientation: Orientation,
        #[serde(default)]
        divider: Option<f64>,
        first: Box<DockLayout>,
        second: Box<DockLayout>,
    },
}

impl DockLayout {
    /// A tab container; the first item is selected.
    #[must_use]
    pub fn tabs(items: Vec<ContentHandle>) -> Self {
        Self::Tabs {
            items,
            selected: None,
            tab_strip: TabStripPlacement::Top,
        }
    }

    /// An empty tab container.
    #[must_use]
    pub fn empty() -> Self {
        Self::tabs(Vec::new())
    }

    #[must_use]
    pub fn split(orientation: Orientation, first: DockLayout, second: DockLayout) -> Self {
        Self::Split {
            orientation,
            divider: None,
            first: Box::new(first),
            second: Box::new(second),
        }
    }

    /// Select `index` in a tab layout. No effect on a split.
    #[must_use]
    pub fn with_selected(mut self, index: usize) -> Self {
        if let Self::Tabs { selected, .. } = &mut self {
            *selected = Some(index);
        }
        self
    }

    #[must_use]
    pub fn with_divider(mut self, ratio: f64) -> Self {
        if let Self::Split { divider, .. } = &mut self {
            *divider = Some(ratio);
        }
        self
    }

    /// Number of content items across all leaves.
    #[must_use]
    pub fn item_count(&self) -> usize {
        match self {
            Self::Tabs { items, .. } => items.len(),
            Self::Split { first, second, .. } => first.item_count() + second.item_count(),
        }
    }

    /// Content IDs in visual order.
    #[must_use]
    pub fn content_ids(&self) -> Vec<ContentId> {
        let mut out = Vec::new();
        self.collect_ids(&mut out);
        out
    }

    fn collect_ids(&self, out: &mut Vec<ContentId>) {
        match self {
            Self::Tabs { items, .. } => out.extend(items.iter().map(|item| item.id)),
            Self::Split { first, second, .. } => {
                first.collect_ids(out);
                second.collect_ids(out);
            }
        }
    }
}

/// Abandoned node and the live node that took over its region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbandonedRecord {
    pub node: DockNodeId,
    pub successor: DockNodeId,
}

/// Serializable state of a whole tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DockTreeSnapshot {
    #[serde(default = "default_schema_version")]
    pub schema_version: u16,
    #[serde(default)]
    pub config: DockConfig,
    pub root: DockNodeId,
    pub next_id: DockNodeId,
    pub nodes: Vec<DockNode>,
    #[serde(default)]
    pub abandoned: Vec<AbandonedRecord>,
}

fn default_schema_version() -> u16 {
    DOCK_TREE_SCHEMA_VERSION
}

impl DockTreeSnapshot {
    /// Canonicalize ordering by ID for deterministic serialization.
    pub fn canonicalize(&mut self) {
        self.nodes.sort_by_key(|node| node.id);
        self.abandoned.sort_by_key(|record| record.node);
    }

    pub fn to_json(&self) -> std::result::Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(json: &str) -> std::result::Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

impl DockTree {
    /// Export to canonical snapshot form.
    ///
    /// Pending events and open batches are not part of the snapshot.
    #[must_use]
    pub fn to_snapshot(&self) -> DockTreeSnapshot {
        let mut snapshot = DockTreeSnapshot {
            schema_version: DOCK_TREE_SCHEMA_VERSION,
            config: self.config,
            root: self.root,
            next_id: self.next_id,
            nodes: self.nodes.values().cloned().collect(),
            abandoned: self
                .abandoned
                .iter()
                .map(|(node, successor)| AbandonedRecord {
                    node: *node,
                    successor: *successor,
                })
                .collect(),
        };
        snapshot.canonicalize();
        snapshot
    }

    /// Rebuild a tree from a snapshot, validating every invariant.
    pub fn from_snapshot(snapshot: DockTreeSnapshot) -> Result<Self> {
        if snapshot.schema_version != DOCK_TREE_SCHEMA_VERSION {
            return Err(DockError::invalid(format!(
                "unsupported dock snapshot schema version {}",
                snapshot.schema_version
            )));
        }
        let mut nodes = BTreeMap::new();
        for node in snapshot.nodes {
            let id = node.id;
            if id >= snapshot.next_id {
                return Err(DockError::invalid(format!(
                    "node {id} is not below next id {}",
                    snapshot.next_id
                )));
            }
            if nodes.insert(id, node).is_some() {
                return Err(DockError::invalid(format!("duplicate node id {id}")));
            }
        }
        let mut abandoned = BTreeMap::new();
        for record in snapshot.abandoned {
            if record.node >= snapshot.next_id {
                return Err(DockError::invalid(format!(
                    "abandoned node {} is not below next id {}",
                    record.node, snapshot.next_id
                )));
            }
            if abandoned.insert(record.node, record.successor).is_some() {
                return Err(DockError::invalid(format!(
                    "node {} is abandoned twice",
                    record.node
                )));
            }
        }

        let tree = Self {
            config: snapshot.config.validated(),
            root: snapshot.root,
            next_id: snapshot.next_id,
            nodes,
            abandoned,
            deferred: 0,
            events: Vec::new(),
        };
        tree.validate()?;
        for (node, successor) in &tree.abandoned {
            if tree.resolve(*successor).is_err() {
                return Err(DockError::invalid(format!(
                    "abandoned node {node} has no live successor"
                )));
            }
        }
        Ok(tree)
    }

    /// Describe the subtree rooted at `node` as a [`DockLayout`].
    ///
    /// Fails with [`DockError::InvalidState`] when the subtree is deeper than
    /// [`MAX_LAYOUT_DEPTH`].
    pub fn layout_of(&self, node: DockNodeId) -> Result<DockLayout> {
        // (node, children already built, depth)
        let mut pending = vec![(node, false, 1usize)];
        let mut built: Vec<DockLayout> = Vec::new();
        while let Some((id, expanded, depth)) = pending.pop() {
            if depth > MAX_LAYOUT_DEPTH {
                return Err(DockError::invalid(format!(
                    "subtree under {node} is deeper than {MAX_LAYOUT_DEPTH} levels"
                )));
            }
            match &self.node(id)?.kind {
                DockNodeKind::Leaf(leaf) => built.push(DockLayout::Tabs {
                    items: leaf.items.clone(),
                    selected: leaf.selected,
                    tab_strip: leaf.tab_strip,
                }),
                DockNodeKind::Split(split) if !expanded => {
                    pending.push((id, true, depth));
                    pending.push((split.second, false, depth + 1));
                    pending.push((split.first, false, depth + 1));
                }
                DockNodeKind::Split(split) => {
                    let second = built.pop();
                    let first = built.pop();
                    let (Some(first), Some(second)) = (first, second) else {
                        return Err(DockError::invalid(format!("split {id} lost a child")));
                    };
                    built.push(DockLayout::Split {
                        orientation: split.orientation,
                        divider: Some(split.divider.get()),
                        first: Box::new(first),
                        second: Box::new(second),
                    });
                }
            }
        }
        built
            .pop()
            .ok_or_else(|| DockError::invalid(format!("node {node} produced no layout")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_tree() -> DockTree {
        let layout = DockLayout::split(
            Orientation::Horizontal,
            DockLayout::tabs(vec![ContentHandle::new(1, "Scene")]),
            DockLayout::split(
                Orientation::Vertical,
                DockLayout::tabs(vec![
                    ContentHandle::new(2, "Log"),
                    ContentHandle::new(3, "Output"),
                ])
                .with_selected(1),
                DockLayout::tabs(vec![ContentHandle::new(4, "Properties")]),
            )
            .with_divider(0.7),
        );
        DockTree::from_layout(layout, DockConfig::default()).expect("layout")
    }

    #[test]
    fn layout_helpers_count_items() {
        let layout = DockLayout::split(
            Orientation::Vertical,
            DockLayout::tabs(vec![ContentHandle::new(5, "A")]),
            DockLayout::empty(),
        );
        assert_eq!(layout.item_count(), 1);
        assert_eq!(layout.content_ids(), vec![ContentId::new(5)]);
    }

    #[test]
    fn layout_json_uses_kind_tag() {
        let json = r#"{
            "kind": "split",
            "orientation": "vertical",
            "first": {"kind": "tabs", "items": [{"id": 1, "label": "A"}]},
            "second": {"kind": "tabs", "items": [{"id": 2, "label": "B"}]}
        }"#;
        let layout: DockLayout = serde_json::from_str(json).expect("layout json");
        let tree = DockTree::from_layout(layout, DockConfig::default()).expect("tree");
        assert_eq!(
            tree.split(tree.root()).map(|split| split.orientation),
            Ok(Orientation::Vertical)
        );
    }

    #[test]
    fn snapshot_survives_json() {
        let mut tree = sample_tree();
        let _ = tree.take_item(ContentId::new(4)).expect("collapse inner split");
        let _ = tree.take_events();
        let json = tree.to_snapshot().to_json().expect("serialize");
        let restored =
            DockTree::from_snapshot(DockTreeSnapshot::from_json(&json).expect("parse"))
                .expect("restore");
        assert_eq!(restored, tree);
        assert_eq!(restored.dump(), tree.dump());
    }

    #[test]
    fn restored_tree_keeps_abandoned_ids() {
        let mut tree = sample_tree();
        let leaf = tree.locate(ContentId::new(4)).expect("docked");
        let _ = tree.take_item(ContentId::new(4)).expect("remove");
        let restored = DockTree::from_snapshot(tree.to_snapshot()).expect("restore");
        assert_eq!(
            restored.node(leaf),
            Err(DockError::UseAfterAbandon { node: leaf })
        );
        assert_eq!(restored.resolve(leaf), tree.resolve(leaf));
    }

    #[test]
    fn unsupported_version_is_rejected() {
        let mut snapshot = sample_tree().to_snapshot();
        snapshot.schema_version = 99;
        assert!(matches!(
            DockTree::from_snapshot(snapshot),
            Err(DockError::InvalidState { .. })
        ));
    }

    #[test]
    fn duplicate_and_dangling_nodes_are_rejected() {
        let snapshot = sample_tree().to_snapshot();

        let mut duplicated = snapshot.clone();
        let first = duplicated.nodes[0].clone();
        duplicated.nodes.push(first);
        assert!(DockTree::from_snapshot(duplicated).is_err());

        let mut orphaned = snapshot;
        let _ = orphaned.nodes.pop();
        assert!(DockTree::from_snapshot(orphaned).is_err());
    }

    fn node_id(raw: u64) -> DockNodeId {
        DockNodeId::new(raw).expect("non-zero id")
    }

    /// Snapshot of `depth` splits, each holding a one-item leaf first and the
    /// next split second, ending in a final leaf.
    fn chain_snapshot(depth: u64) -> DockTreeSnapshot {
        use crate::node::{DividerRatio, DockLeaf, DockSplit};

        let one_item_leaf = |id: u64, parent: u64| {
            let mut leaf = DockLeaf::default();
            leaf.insert(0, ContentHandle::new(id, format!("Tool {id}")))
                .expect("insert");
            DockNode::leaf(node_id(id), Some(node_id(parent)), leaf)
        };

        let mut nodes = Vec::new();
        for level in 0..depth {
            let id = 2 * level + 1;
            nodes.push(DockNode {
                id: node_id(id),
                parent: (level > 0).then(|| node_id(id - 2)),
                kind: DockNodeKind::Split(DockSplit {
                    orientation: if level % 2 == 0 {
                        Orientation::Horizontal
                    } else {
                        Orientation::Vertical
                    },
                    divider: DividerRatio::default(),
                    first: node_id(id + 1),
                    second: node_id(id + 2),
                }),
            });
            nodes.push(one_item_leaf(id + 1, id));
        }
        nodes.push(one_item_leaf(2 * depth + 1, 2 * depth - 1));

        DockTreeSnapshot {
            schema_version: DOCK_TREE_SCHEMA_VERSION,
            config: DockConfig::default(),
            root: node_id(1),
            next_id: node_id(2 * depth + 2),
            nodes,
            abandoned: Vec::new(),
        }
    }

    #[test]
    fn deep_chain_restores_and_solves() {
        let depth = 20_000;
        let tree = DockTree::from_snapshot(chain_snapshot(depth)).expect("restore");
        let leaf_count = usize::try_from(depth + 1).expect("fits");
        assert_eq!(tree.leaf_ids().len(), leaf_count);
        assert_eq!(tree.item_count(), leaf_count);

        let map = tree
            .solve_layout(anydock_core::Rect::new(0, 0, 120, 40))
            .expect("solve");
        assert_eq!(map.leaves().len(), leaf_count);
        assert_eq!(map.leaves().first(), Some(&node_id(2)));
        assert_eq!(map.leaves().last(), Some(&node_id(2 * depth + 1)));

        let json = tree.to_snapshot().to_json().expect("json");
        let reloaded = DockTreeSnapshot::from_json(&json).expect("parse");
        assert!(DockTree::from_snapshot(reloaded).is_ok());
    }

    #[test]
    fn layout_of_rejects_subtrees_past_depth_limit() {
        let tree = DockTree::from_snapshot(chain_snapshot(2_000)).expect("restore");
        assert!(matches!(
            tree.layout_of(tree.root()),
            Err(DockError::InvalidState { .. })
        ));

        // Split 3799 heads the last 101 splits of the chain.
        let near_bottom = tree.layout_of(node_id(3_799)).expect("shallow subtree");
        assert_eq!(near_bottom.item_count(), 102);
    }

    #[test]
    fn deep_chain_dumps_every_leaf() {
        let depth = 1_500;
        let tree = DockTree::from_snapshot(chain_snapshot(depth)).expect("restore");
        let dump = tree.dump();
        let leaves = dump.lines().filter(|line| line.trim_start().starts_with("Leaf ")).count();
        assert_eq!(leaves, 1_501);
        assert!(dump.starts_with("Split 1 [horizontal 0.50]"));
        assert!(dump.contains("- Tool 3001 [X]"));
    }

    #[test]
    fn layout_of_mirrors_tree() {
        let tree = sample_tree();
        let layout = tree.layout_of(tree.root()).expect("layout");
        assert_eq!(layout.item_count(), 4);
        let rebuilt = DockTree::from_layout(layout, DockConfig::default()).expect("rebuild");
        assert_eq!(rebuilt.dump(), tree.dump());
    }
}
