// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Randomized properties of the pool and the spatial hash.

use gambit_core::{EntityKey, Point};
use gambit_data::{ObjectPool, Pooled, SpatialIndex};
use proptest::prelude::*;
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone)]
enum SpatialOp {
    Insert(u64, f64, f64),
    Remove(u64),
    Relocate(u64, f64, f64),
}

fn spatial_op() -> impl Strategy<Value = SpatialOp> {
    prop_oneof![
        (0u64..20, -500.0f64..500.0, -500.0f64..500.0).prop_map(|(k, x, y)| SpatialOp::Insert(k, x, y)),
        (0u64..20).prop_map(SpatialOp::Remove),
        (0u64..20, -500.0f64..500.0, -500.0f64..500.0)
            .prop_map(|(k, x, y)| SpatialOp::Relocate(k, x, y)),
    ]
}

proptest! {
    #[test]
    fn prop_grid_query_matches_brute_force(
        points in prop::collection::vec((-1000.0f64..1000.0, -1000.0f64..1000.0), 0..80),
        cell_size in prop_oneof![1.0f64..200.0, 1.0e-18f64..1.0e-12, 1.0e6f64..1.0e12],
        cx in -1000.0f64..1000.0,
        cy in -1000.0f64..1000.0,
        radius in 0.0f64..600.0,
    ) {
        let mut index = SpatialIndex::new(cell_size).unwrap();
        for (i, (x, y)) in points.iter().enumerate() {
            index.insert_at(EntityKey::new(i as u64), Some(Point::new(*x, *y)));
        }
        let center = Point::new(cx, cy);

        let grid: HashSet<_> = index.query_grid(center, radius).into_iter().collect();
        let linear: HashSet<_> = index.query_linear(center, radius).into_iter().collect();
        let brute: HashSet<_> = points
            .iter()
            .enumerate()
            .filter(|(_, (x, y))| Point::new(*x, *y).distance_squared(&center) <= radius * radius)
            .map(|(i, _)| EntityKey::new(i as u64))
            .collect();

        prop_assert_eq!(&grid, &brute);
        prop_assert_eq!(&linear, &brute);
    }

    #[test]
    fn prop_every_entity_lives_in_exactly_one_cell(
        ops in prop::collection::vec(spatial_op(), 0..120),
        cell_size in 4.0f64..128.0,
    ) {
        let mut index = SpatialIndex::new(cell_size).unwrap();
        let mut expected: HashMap<EntityKey, Point> = HashMap::new();

        for op in ops {
            match op {
                SpatialOp::Insert(k, x, y) => {
                    index.insert_at(EntityKey::new(k), Some(Point::new(x, y)));
                    expected.insert(EntityKey::new(k), Point::new(x, y));
                }
                SpatialOp::Remove(k) => {
                    index.remove_key(EntityKey::new(k));
                    expected.remove(&EntityKey::new(k));
                }
                SpatialOp::Relocate(k, x, y) => {
                    index.relocate_to(EntityKey::new(k), Point::new(x, y));
                    expected.insert(EntityKey::new(k), Point::new(x, y));
                }
            }
        }

        prop_assert_eq!(index.entity_count(), expected.len());

        let mut seen: HashMap<EntityKey, usize> = HashMap::new();
        for (cell, members) in index.cells() {
            for key in members {
                *seen.entry(*key).or_default() += 1;
                prop_assert_eq!(index.cell_of(*key), Some(cell));
            }
        }
        for (key, position) in &expected {
            prop_assert_eq!(seen.get(key).copied(), Some(1));
            prop_assert_eq!(index.cell_of(*key), Some(index.cell_key(*position)));

            let everything = index.query_radius(*position, 1.0e9);
            let hits = everything.iter().filter(|k| *k == key).count();
            prop_assert_eq!(hits, 1);
        }
        prop_assert_eq!(seen.len(), expected.len());
    }

    #[test]
    fn prop_pool_conserves_objects(
        initial in 0usize..10,
        ops in prop::collection::vec(0u8..3, 0..200),
    ) {
        let mut pool = ObjectPool::new("conservation", || 0u32);
        pool.prefill(initial);
        let mut held: Vec<Pooled<u32>> = Vec::new();
        let mut dropped = 0;

        for op in ops {
            match op {
                1 if !held.is_empty() => {
                    let object = held.swap_remove(0);
                    prop_assert!(pool.release(&object).is_ok());
                }
                2 if !held.is_empty() => {
                    held.pop();
                    dropped += 1;
                }
                _ => held.push(pool.acquire()),
            }
            let stats = pool.stats();
            prop_assert_eq!(stats.available + stats.in_use + stats.abandoned, stats.created);
            prop_assert_eq!(stats.in_use, held.len());
            prop_assert_eq!(stats.abandoned, dropped);
        }
    }
}
