#![no_main]

use anydock::{
    ContentHandle, ContentId, DockNodeId, DockTree, DropRegion, DropRequest, DropTarget,
    PointerPosition, Rect,
};
use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Arbitrary)]
enum Op {
    Add { leaf: u8, content: u8, at: Option<u8> },
    Remove { leaf: u8, content: u8 },
    Take { content: u8 },
    Reorder { leaf: u8, from: u8, to: u8 },
    Select { leaf: u8, index: u8 },
    Drop { content: u8, node: u8, region: u8 },
    DropOnTab { content: u8, anchor: u8 },
    Divider { node: u8, ratio: f32 },
    Collapse { node: u8 },
    Batch { takes: Vec<u8>, commit: bool },
    Hover { x: i16, y: i16 },
}

fn handle(content: u8) -> ContentHandle {
    ContentHandle::new(u64::from(content % 24), format!("item {content}"))
}

/// Raw ids include abandoned and never-allocated ones on purpose.
fn node(raw: u8) -> DockNodeId {
    DockNodeId::new(u64::from(raw % 64) + 1).unwrap()
}

fuzz_target!(|ops: Vec<Op>| {
    if ops.len() > 256 {
        return;
    }
    let mut tree = DockTree::new();
    let area = Rect::from_size(160, 48);

    for op in ops {
        let before = tree.clone();
        let result = match op {
            Op::Add { leaf, content, at } => tree
                .add_item(node(leaf), handle(content), at.map(usize::from))
                .map(drop),
            Op::Remove { leaf, content } => tree
                .remove_item(node(leaf), ContentId::new(u64::from(content % 24)))
                .map(drop),
            Op::Take { content } => tree.take_item(ContentId::new(u64::from(content % 24))).map(drop),
            Op::Reorder { leaf, from, to } => {
                tree.move_item_within(node(leaf), usize::from(from), usize::from(to))
            }
            Op::Select { leaf, index } => tree.select(node(leaf), usize::from(index)),
            Op::Drop { content, node: target, region } => tree
                .apply_drop(DropRequest {
                    content: handle(content),
                    target: DropTarget::Panel {
                        node: node(target),
                        region: DropRegion::ALL[usize::from(region) % DropRegion::ALL.len()],
                    },
                })
                .map(drop),
            Op::DropOnTab { content, anchor } => tree
                .apply_drop(DropRequest {
                    content: handle(content),
                    target: DropTarget::Tab {
                        content: ContentId::new(u64::from(anchor % 24)),
                    },
                })
                .map(drop),
            Op::Divider { node: split, ratio } => {
                tree.set_divider_ratio(node(split), f64::from(ratio)).map(drop)
            }
            Op::Collapse { node: split } => tree.collapse(node(split)).map(drop),
            Op::Batch { takes, commit } => {
                let mut batch = tree.begin_batch();
                let mut result = Ok(());
                for content in takes.into_iter().take(8) {
                    if let Err(err) = batch.take_item(ContentId::new(u64::from(content % 24))) {
                        result = Err(err);
                        break;
                    }
                }
                match result {
                    Ok(()) if commit => batch.commit().map(drop),
                    Ok(()) => {
                        batch.rollback();
                        Ok(())
                    }
                    Err(err) => Err(err),
                }
            }
            Op::Hover { x, y } => {
                let map = tree.solve_layout(area).unwrap();
                if let Some((target, bounds)) =
                    map.target_at(PointerPosition::new(i32::from(x), i32::from(y)))
                {
                    assert!(tree.leaf(target).is_ok(), "hover target must be a live leaf");
                    let region = DropRegion::hit_test(
                        bounds,
                        PointerPosition::new(i32::from(x), i32::from(y)),
                        tree.config().edge_band,
                    );
                    assert!(region.is_some(), "pointer inside bounds always classifies");
                }
                Ok(())
            }
        };

        if result.is_err() {
            assert_eq!(tree, before, "failed operation mutated the tree");
        }
        tree.validate().unwrap();
        let _ = tree.take_events();
    }

    let map = tree.solve_layout(area).unwrap();
    for leaf in tree.leaf_ids() {
        let rect = map.rect(leaf).unwrap();
        assert!(rect.right() <= area.right() && rect.bottom() <= area.bottom());
    }
});
