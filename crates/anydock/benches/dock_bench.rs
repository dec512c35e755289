//! Benchmarks for dock tree drops, collapse, and layout solving.
//!
//! Run with: cargo bench -p anydock

use anydock::{
    ContentHandle, ContentId, DockTree, DropRegion, DropRequest, DropTarget, Rect,
};
use criterion::{BatchSize, BenchmarkId, Criterion, criterion_group, criterion_main};
use std::hint::black_box;

/// A tree with `leaves` single-item leaves built by alternating edge drops.
fn make_tree(leaves: u64) -> DockTree {
    let mut tree = DockTree::new();
    let root = tree.root();
    tree.add_item(root, ContentHandle::new(1, "item 1"), None)
        .expect("seed item");
    for id in 2..=leaves {
        let target = *tree.leaf_ids().last().expect("at least one leaf");
        let region = if id % 2 == 0 {
            DropRegion::Right
        } else {
            DropRegion::Down
        };
        tree.apply_drop(DropRequest {
            content: ContentHandle::new(id, format!("item {id}")),
            target: DropTarget::Panel {
                node: target,
                region,
            },
        })
        .expect("edge drop");
    }
    let _ = tree.take_events();
    tree
}

fn bench_edge_drop(c: &mut Criterion) {
    let mut group = c.benchmark_group("dock/edge_drop");
    for n in [4u64, 16, 64] {
        let base = make_tree(n);
        let target = base.leaf_ids()[0];
        group.bench_with_input(BenchmarkId::from_parameter(n), &base, |b, base| {
            b.iter_batched(
                || base.clone(),
                |mut tree| {
                    let outcome = tree.apply_drop(DropRequest {
                        content: ContentHandle::new(10_000, "incoming"),
                        target: DropTarget::Panel {
                            node: target,
                            region: DropRegion::Left,
                        },
                    });
                    black_box(outcome).expect("drop")
                },
                BatchSize::SmallInput,
            );
        });
    }
    group.finish();
}

fn bench_move_with_collapse(c: &mut Criterion) {
    let mut group = c.benchmark_group("dock/move_with_collapse");
    for n in [4u64, 16, 64] {
        let base = make_tree(n);
        let target = base.leaf_ids()[0];
        group.bench_with_input(BenchmarkId::from_parameter(n), &base, |b, base| {
            b.iter_batched(
                || base.clone(),
                |mut tree| {
                    let outcome = tree.apply_drop(DropRequest {
                        content: ContentHandle::new(n, format!("item {n}")),
                        target: DropTarget::Panel {
                            node: target,
                            region: DropRegion::Center,
                        },
                    });
                    black_box(outcome).expect("drop")
                },
                BatchSize::SmallInput,
            );
        });
    }
    group.finish();
}

fn bench_batch_drain(c: &mut Criterion) {
    let base = make_tree(32);
    c.bench_function("dock/batch_drain_32", |b| {
        b.iter_batched(
            || base.clone(),
            |mut tree| {
                let mut batch = tree.begin_batch();
                for id in 2..=32 {
                    let _ = batch.take_item(ContentId::new(id)).expect("take");
                }
                black_box(batch.commit()).expect("commit")
            },
            BatchSize::SmallInput,
        );
    });
}

fn bench_solve_layout(c: &mut Criterion) {
    let mut group = c.benchmark_group("dock/solve_layout");
    let area = Rect::from_size(240, 80);
    for n in [4u64, 16, 64] {
        let tree = make_tree(n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &tree, |b, tree| {
            b.iter(|| black_box(tree.solve_layout(area)))
        });
    }
    group.finish();
}

fn bench_snapshot_restore(c: &mut Criterion) {
    let tree = make_tree(32);
    let snapshot = tree.to_snapshot();
    c.bench_function("dock/snapshot_restore_32", |b| {
        b.iter_batched(
            || snapshot.clone(),
            |snapshot| black_box(DockTree::from_snapshot(snapshot)).expect("restore"),
            BatchSize::SmallInput,
        );
    });
}

criterion_group!(
    benches,
    bench_edge_drop,
    bench_move_with_collapse,
    bench_batch_drain,
    bench_solve_layout,
    bench_snapshot_restore
);
criterion_main!(benches);
