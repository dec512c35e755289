//! Scoped deferred-commit guard.
//!
//! Inside a batch, removing the last item of a non-root leaf leaves the leaf
//! empty instead of collapsing it. [`DockBatch::commit`] runs the collapse pass
//! once and validates the result; dropping the guard without committing puts
//! the tree back exactly as it was when the batch began.

use std::ops::{Deref, DerefMut};

use tracing::debug;

use crate::error::Result;
use crate::tree::{CollapseOutcome, DockTree};

/// Transaction boundary over a borrowed [`DockTree`].
///
/// Derefs to the tree, so every tree operation is available on the batch.
#[derive(Debug)]
#[must_use = "dropping a batch without commit() rolls it back"]
pub struct DockBatch<'a> {
    tree: &'a mut DockTree,
    base: Option<DockTree>,
}

impl DockTree {
    /// Open a batch. Batches nest; only the outermost commit collapses.
    pub fn begin_batch(&mut self) -> DockBatch<'_> {
        let base = self.clone();
        self.deferred = self.deferred.saturating_add(1);
        debug!(message = "dock.batch.begin", depth = self.deferred);
        DockBatch {
            tree: self,
            base: Some(base),
        }
    }
}

impl DockBatch<'_> {
    /// Finish the batch.
    ///
    /// For the outermost batch this collapses every emptied leaf and checks
    /// all invariants; on failure the tree is restored and the error returned.
    pub fn commit(mut self) -> Result<Vec<CollapseOutcome>> {
        let Some(base) = self.base.take() else {
            return Ok(Vec::new());
        };
        self.tree.deferred = self.tree.deferred.saturating_sub(1);
        if self.tree.is_deferring() {
            return Ok(Vec::new());
        }
        let result = self.tree.settle().and_then(|outcomes| {
            self.tree.validate()?;
            Ok(outcomes)
        });
        match result {
            Ok(outcomes) => {
                debug!(message = "dock.batch.commit", collapsed = outcomes.len());
                Ok(outcomes)
            }
            Err(err) => {
                debug!(message = "dock.batch.restore", error = %err);
                *self.tree = base;
                Err(err)
            }
        }
    }

    /// Discard every change made since the batch began.
    pub fn rollback(self) {}
}

impl Deref for DockBatch<'_> {
    type Target = DockTree;

    fn deref(&self) -> &DockTree {
        self.tree
    }
}

impl DerefMut for DockBatch<'_> {
    fn deref_mut(&mut self) -> &mut DockTree {
        self.tree
    }
}

impl Drop for DockBatch<'_> {
    fn drop(&mut self) {
        if let Some(base) = self.base.take() {
            debug!(message = "dock.batch.rollback");
            *self.tree = base;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::{ContentHandle, ContentId};
    use crate::error::DockError;
    use crate::node::Orientation;
    use crate::snapshot::DockLayout;

    fn split_tree() -> DockTree {
        let mut tree = DockTree::new();
        let root = tree.root();
        let _ = tree
            .set_children(
                root,
                Some(DockLayout::tabs(vec![ContentHandle::new(1, "A")])),
                Some(DockLayout::tabs(vec![
                    ContentHandle::new(2, "B"),
                    ContentHandle::new(3, "C"),
                ])),
                Orientation::Horizontal,
            )
            .expect("split");
        tree
    }

    #[test]
    fn collapse_is_deferred_until_commit() {
        let mut tree = split_tree();
        let first = tree.leaf_ids()[0];
        let root = tree.root();
        let mut batch = tree.begin_batch();
        let _ = batch.take_item(ContentId::new(1)).expect("remove A");
        assert!(batch.node(first).expect("still live").is_empty_leaf());
        assert_eq!(batch.root(), root);
        batch.validate().expect("empty leaf is legal inside a batch");
        let _ = batch
            .add_item(first, ContentHandle::new(4, "D"), None)
            .expect("refill");
        let outcomes = batch.commit().expect("commit");
        assert!(outcomes.is_empty());
        assert_eq!(tree.root(), root);
        tree.validate().expect("valid");
    }

    #[test]
    fn commit_collapses_once() {
        let mut tree = split_tree();
        let second = tree.leaf_ids()[1];
        let mut batch = tree.begin_batch();
        let _ = batch.take_item(ContentId::new(1)).expect("remove A");
        let outcomes = batch.commit().expect("commit");
        assert_eq!(outcomes.len(), 1);
        assert_eq!(outcomes[0].promoted, second);
        assert_eq!(tree.root(), second);
        tree.validate().expect("valid");
    }

    #[test]
    fn dropping_the_guard_rolls_back() {
        let mut tree = split_tree();
        let before = tree.clone();
        {
            let mut batch = tree.begin_batch();
            let _ = batch.take_item(ContentId::new(2)).expect("remove B");
            let _ = batch.take_item(ContentId::new(3)).expect("remove C");
        }
        assert_eq!(tree, before);

        let mut batch = tree.begin_batch();
        let _ = batch.take_item(ContentId::new(1)).expect("remove A");
        batch.rollback();
        assert_eq!(tree, before);
    }

    #[test]
    fn nested_batches_collapse_at_outermost_commit() {
        let mut tree = split_tree();
        let first = tree.leaf_ids()[0];
        let mut outer = tree.begin_batch();
        {
            let mut inner = outer.begin_batch();
            let _ = inner.take_item(ContentId::new(1)).expect("remove A");
            assert!(inner.commit().expect("inner commit").is_empty());
        }
        assert!(outer.is_deferring());
        assert!(outer.node(first).is_ok());
        assert_eq!(outer.commit().map(|outcomes| outcomes.len()), Ok(1));
        assert_eq!(tree.node(first), Err(DockError::UseAfterAbandon { node: first }));
    }

    #[test]
    fn emptying_both_sides_collapses_to_empty_root() {
        let mut tree = split_tree();
        let first = tree.leaf_ids()[0];
        let mut batch = tree.begin_batch();
        for content in 1..=3 {
            let _ = batch.take_item(ContentId::new(content)).expect("remove");
            batch.validate().expect("valid after every removal");
        }
        // The split lost both sides, so it folded before commit.
        assert_eq!(batch.root(), first);
        assert_eq!(batch.node_count(), 1);
        assert!(batch.commit().expect("commit").is_empty());
        assert!(tree.node(first).expect("root").is_empty_leaf());
        tree.validate().expect("valid");
    }

    #[test]
    fn batch_never_leaves_a_split_with_two_empty_sides() {
        let mut tree = DockTree::from_layout(
            DockLayout::split(
                Orientation::Vertical,
                DockLayout::tabs(vec![ContentHandle::new(1, "A")]),
                DockLayout::split(
                    Orientation::Horizontal,
                    DockLayout::tabs(vec![ContentHandle::new(2, "B")]),
                    DockLayout::tabs(vec![ContentHandle::new(3, "C")]),
                ),
            ),
            crate::config::DockConfig::default(),
        )
        .expect("layout");
        let outer = tree.root();
        let mut batch = tree.begin_batch();
        let _ = batch.take_item(ContentId::new(2)).expect("remove B");
        let _ = batch.take_item(ContentId::new(3)).expect("remove C");
        batch.validate().expect("no split holds two empty leaves");
        assert_eq!(batch.leaf_ids().len(), 2);
        assert_eq!(batch.root(), outer);

        let outcomes = batch.commit().expect("commit");
        assert_eq!(outcomes.len(), 1);
        assert_eq!(tree.leaf_ids().len(), 1);
        assert_eq!(tree.locate(ContentId::new(1)), Some(tree.root()));
        tree.validate().expect("valid");
    }

    #[test]
    fn events_are_held_until_the_outermost_commit() {
        let mut tree = split_tree();
        let _ = tree.take_events();
        let mut batch = tree.begin_batch();
        let _ = batch.take_item(ContentId::new(2)).expect("remove B");
        assert!(batch.pending_events().is_empty());
        assert!(batch.take_events().is_empty());
        let _ = batch.commit().expect("commit");
        assert!(!tree.take_events().is_empty());

        let mut batch = tree.begin_batch();
        let _ = batch.take_item(ContentId::new(3)).expect("remove C");
        batch.rollback();
        assert!(tree.take_events().is_empty());
    }
}
