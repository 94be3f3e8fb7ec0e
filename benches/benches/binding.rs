// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Benchmarks for `understory_binding`.

use criterion::{BatchSize, BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Once;

use understory_binding::{
    EditSession, FieldStorage, ObjRef, PropertyPath, SharedList, SharedMap, ValueEntry,
};

#[derive(Clone, Default)]
struct Node {
    x: f64,
    target: ObjRef,
    items: SharedList<u32>,
    lookup: SharedMap<u32, u32>,
}

type Nodes = Vec<Rc<RefCell<Node>>>;

fn nodes(count: usize, keys: u32) -> Nodes {
    let shared = ObjRef::new(0_u8);
    (0..count)
        .map(|i| {
            Rc::new(RefCell::new(Node {
                x: i as f64,
                target: shared.clone(),
                items: SharedList::new((0..keys).collect()),
                // Reverse insertion so key ordering has work to do.
                lookup: SharedMap::new((0..keys).rev().map(|k| (k, k))),
            }))
        })
        .collect()
}

fn bench_refresh(c: &mut Criterion) {
    static PRINT_SIZES: Once = Once::new();
    PRINT_SIZES.call_once(|| {
        eprintln!(
            "sizes: ValueEntry<f64>={} ValueEntry<ObjRef>={} EditSession={}",
            core::mem::size_of::<ValueEntry<f64>>(),
            core::mem::size_of::<ValueEntry<ObjRef>>(),
            core::mem::size_of::<EditSession>(),
        );
    });

    let mut group = c.benchmark_group("refresh");
    for targets in [1_usize, 4, 16, 64] {
        let nodes = nodes(targets, 8);

        let mut x = ValueEntry::new(
            PropertyPath::new("node.x"),
            FieldStorage::new(nodes.clone(), |n: &Node| n.x, |n: &mut Node, v| n.x = v),
        )
        .unwrap();
        let mut session = EditSession::new();
        group.bench_with_input(BenchmarkId::new("primitive", targets), &targets, |b, _| {
            b.iter(|| {
                session.begin_pass();
                x.refresh(&mut session);
                black_box(x.state());
            });
        });

        let mut target = ValueEntry::new(
            PropertyPath::new("node.target"),
            FieldStorage::new(
                nodes.clone(),
                |n: &Node| n.target.clone(),
                |n: &mut Node, v| n.target = v,
            ),
        )
        .unwrap();
        let mut session = EditSession::new();
        group.bench_with_input(BenchmarkId::new("reference", targets), &targets, |b, _| {
            b.iter(|| {
                session.begin_pass();
                target.refresh(&mut session);
                black_box(target.state());
            });
        });
    }
    group.finish();
}

fn bench_dictionary_keys(c: &mut Criterion) {
    let mut group = c.benchmark_group("dictionary_keys");
    for keys in [8_u32, 64, 512] {
        let nodes = nodes(4, keys);
        let mut lookup = ValueEntry::new(
            PropertyPath::new("node.lookup"),
            FieldStorage::new(
                nodes,
                |n: &Node| n.lookup.clone(),
                |n: &mut Node, v| n.lookup = v,
            ),
        )
        .unwrap();
        let mut session = EditSession::new();
        group.bench_with_input(BenchmarkId::new("refresh", keys), &keys, |b, _| {
            b.iter(|| {
                session.begin_pass();
                lookup.refresh(&mut session);
                black_box(lookup.dictionary().and_then(|d| d.key_count(0)));
            });
        });
    }
    group.finish();
}

fn bench_list_commit(c: &mut Criterion) {
    let mut group = c.benchmark_group("list_commit");
    for targets in [1_usize, 16] {
        group.bench_with_input(
            BenchmarkId::new("insert_remove", targets),
            &targets,
            |b, &targets| {
                b.iter_batched(
                    || {
                        let nodes = nodes(targets, 64);
                        let mut items = ValueEntry::new(
                            PropertyPath::new("node.items"),
                            FieldStorage::new(
                                nodes,
                                |n: &Node| n.items.clone(),
                                |n: &mut Node, v| n.items = v,
                            ),
                        )
                        .unwrap();
                        let mut session = EditSession::new();
                        session.begin_pass();
                        items.refresh(&mut session);
                        (items, session)
                    },
                    |(mut items, mut session)| {
                        let list = items.list().unwrap();
                        for i in 0..16 {
                            list.queue_insert_at(i, vec![7; targets]).unwrap();
                        }
                        for _ in 0..8 {
                            list.queue_remove_at(0).unwrap();
                        }
                        session.begin_commit();
                        black_box(items.apply_changes(&mut session).unwrap());
                        session.end_commit();
                    },
                    BatchSize::SmallInput,
                );
            },
        );
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_refresh,
    bench_dictionary_keys,
    bench_list_commit
);
criterion_main!(benches);
