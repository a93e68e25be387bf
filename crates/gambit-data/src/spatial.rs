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

//! # Spatial Hash
//!
//! A uniform grid over 2D space. Each entity lives in exactly one cell, keyed
//! by `(floor(x / cell_size), floor(y / cell_size))`, and a reverse map from
//! entity to placement makes removal and relocation O(1).
//!
//! Radius queries run a broad phase over the cells overlapping the query
//! circle's bounding square, then a narrow phase that keeps only entities whose
//! exact distance is within the radius. With the grid disabled the same
//! narrow-phase filter runs over every tracked entity instead.

use gambit_core::host::Tracked;
use gambit_core::{EntityKey, OptimizerError, OptimizerResult, Point};
use std::collections::HashMap;
use std::hash::Hash;

/// Default edge length of a grid cell, in host length units.
pub const DEFAULT_CELL_SIZE: f64 = 64.0;

/// Integer coordinates of a grid cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellKey {
    /// Column index.
    pub x: i64,
    /// Row index.
    pub y: i64,
}

impl CellKey {
    /// Creates a cell key from raw indices.
    #[inline]
    pub const fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }

    /// The cell containing `point` for the given cell size.
    #[inline]
    pub fn containing(point: Point, cell_size: f64) -> Self {
        Self {
            x: (point.x / cell_size).floor() as i64,
            y: (point.y / cell_size).floor() as i64,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Placement {
    cell: CellKey,
    position: Point,
}

/// A uniform-grid spatial hash over entities identified by `K`.
#[derive(Debug, Clone)]
pub struct SpatialIndex<K = EntityKey> {
    cell_size: f64,
    cells: HashMap<CellKey, Vec<K>>,
    placements: HashMap<K, Placement>,
    enabled: bool,
}

fn validate_cell_size(cell_size: f64) -> OptimizerResult<()> {
    if cell_size.is_finite() && cell_size > 0.0 {
        Ok(())
    } else {
        Err(OptimizerError::InvalidConfiguration(format!(
            "cell size must be a positive finite number, got {cell_size}"
        )))
    }
}

impl<K: Copy + Eq + Hash> SpatialIndex<K> {
    /// Creates an empty index with the given cell size.
    pub fn new(cell_size: f64) -> OptimizerResult<Self> {
        validate_cell_size(cell_size)?;
        Ok(Self {
            cell_size,
            cells: HashMap::new(),
            placements: HashMap::new(),
            enabled: true,
        })
    }

    /// Sets a new cell size and forgets every tracked entity.
    pub fn initialize(&mut self, cell_size: f64) -> OptimizerResult<()> {
        validate_cell_size(cell_size)?;
        self.cell_size = cell_size;
        self.clear();
        log::debug!("Spatial index initialized with cell size {cell_size}");
        Ok(())
    }

    /// The cell containing `point`.
    #[inline]
    pub fn cell_key(&self, point: Point) -> CellKey {
        CellKey::containing(point, self.cell_size)
    }

    /// Places `key` at `position`.
    ///
    /// Inserting a key that is already tracked moves it instead. A `None` or
    /// non-finite position makes the entity untracked. Returns `true` if the
    /// entity is tracked afterwards.
    pub fn insert_at(&mut self, key: K, position: Option<Point>) -> bool {
        let Some(position) = position.filter(Point::is_finite) else {
            self.remove_key(key);
            return false;
        };
        if self.placements.contains_key(&key) {
            self.relocate_to(key, position);
            return true;
        }
        let cell = self.cell_key(position);
        self.cells.entry(cell).or_default().push(key);
        self.placements.insert(key, Placement { cell, position });
        true
    }

    /// Stops tracking `key`. Returns `true` if it was tracked.
    pub fn remove_key(&mut self, key: K) -> bool {
        let Some(placement) = self.placements.remove(&key) else {
            return false;
        };
        if let Some(members) = self.cells.get_mut(&placement.cell) {
            if let Some(index) = members.iter().position(|member| *member == key) {
                members.swap_remove(index);
            }
        }
        true
    }

    /// Records a new position for `key`, changing cells only when needed.
    ///
    /// An untracked key is inserted.
    pub fn relocate_to(&mut self, key: K, position: Point) {
        if !position.is_finite() {
            self.remove_key(key);
            return;
        }
        let cell = self.cell_key(position);
        match self.placements.get(&key).map(|placement| placement.cell) {
            Some(current) if current == cell => {
                if let Some(placement) = self.placements.get_mut(&key) {
                    placement.position = position;
                }
            }
            Some(_) => {
                self.remove_key(key);
                self.insert_at(key, Some(position));
            }
            None => {
                self.insert_at(key, Some(position));
            }
        }
    }

    /// Every tracked entity within `radius` of `center`.
    ///
    /// Uses the grid when enabled and a linear scan otherwise; both return the
    /// same set. Result order is unspecified.
    pub fn query_radius(&self, center: Point, radius: f64) -> Vec<K> {
        if self.enabled {
            self.query_grid(center, radius)
        } else {
            self.query_linear(center, radius)
        }
    }

    /// Radius query through the grid broad phase.
    pub fn query_grid(&self, center: Point, radius: f64) -> Vec<K> {
        if radius.is_nan() || radius < 0.0 || !center.is_finite() {
            return Vec::new();
        }
        let origin = self.cell_key(center);
        let reach = (radius / self.cell_size).ceil();

        let mut found = Vec::new();
        let span = reach * 2.0 + 1.0;
        if span * span > self.cells.len() as f64 {
            // Fewer occupied cells than candidate cells: walk the occupied ones.
            // Cell keys saturate at the i64 bounds, so the reach stays in f64.
            for (cell, members) in &self.cells {
                let dx = (i128::from(cell.x) - i128::from(origin.x)).abs() as f64;
                let dy = (i128::from(cell.y) - i128::from(origin.y)).abs() as f64;
                if dx <= reach && dy <= reach {
                    self.collect_within(members, center, radius, &mut found);
                }
            }
        } else {
            let reach = reach as i64;
            for dx in -reach..=reach {
                for dy in -reach..=reach {
                    let (Some(x), Some(y)) = (origin.x.checked_add(dx), origin.y.checked_add(dy))
                    else {
                        continue;
                    };
                    if let Some(members) = self.cells.get(&CellKey::new(x, y)) {
                        self.collect_within(members, center, radius, &mut found);
                    }
                }
            }
        }
        found
    }

    /// Radius query by scanning every tracked entity.
    pub fn query_linear(&self, center: Point, radius: f64) -> Vec<K> {
        if radius.is_nan() || radius < 0.0 || !center.is_finite() {
            return Vec::new();
        }
        let limit = radius * radius;
        self.placements
            .iter()
            .filter(|(_, placement)| placement.position.distance_squared(&center) <= limit)
            .map(|(key, _)| *key)
            .collect()
    }

    fn collect_within(&self, members: &[K], center: Point, radius: f64, found: &mut Vec<K>) {
        let limit = radius * radius;
        for key in members {
            if let Some(placement) = self.placements.get(key) {
                if placement.position.distance_squared(&center) <= limit {
                    found.push(*key);
                }
            }
        }
    }

    /// Returns `true` if `key` is tracked.
    pub fn contains(&self, key: K) -> bool {
        self.placements.contains_key(&key)
    }

    /// The cell `key` currently lives in.
    pub fn cell_of(&self, key: K) -> Option<CellKey> {
        self.placements.get(&key).map(|placement| placement.cell)
    }

    /// The last recorded position of `key`.
    pub fn position_of(&self, key: K) -> Option<Point> {
        self.placements.get(&key).map(|placement| placement.position)
    }

    /// Members of `cell`, in no particular order.
    pub fn members(&self, cell: CellKey) -> &[K] {
        self.cells.get(&cell).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Iterates over every cell ever created, including empty ones.
    pub fn cells(&self) -> impl Iterator<Item = (CellKey, &[K])> {
        self.cells.iter().map(|(cell, members)| (*cell, members.as_slice()))
    }

    /// Number of cells currently allocated.
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    /// Number of cells holding at least one entity.
    pub fn occupied_cell_count(&self) -> usize {
        self.cells.values().filter(|members| !members.is_empty()).count()
    }

    /// Number of tracked entities.
    pub fn entity_count(&self) -> usize {
        self.placements.len()
    }

    /// The configured cell size.
    pub fn cell_size(&self) -> f64 {
        self.cell_size
    }

    /// Drops cells that no longer hold any entity.
    pub fn prune_empty_cells(&mut self) -> usize {
        let before = self.cells.len();
        self.cells.retain(|_, members| !members.is_empty());
        before - self.cells.len()
    }

    /// Forgets every tracked entity.
    pub fn clear(&mut self) {
        self.cells.clear();
        self.placements.clear();
    }

    /// Switches radius queries between the grid and the linear scan.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Returns `true` if radius queries use the grid.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }
}

impl SpatialIndex<EntityKey> {
    /// Tracks `entity` at its current position.
    pub fn insert<E: Tracked + ?Sized>(&mut self, entity: &E) -> bool {
        self.insert_at(entity.key(), entity.position())
    }

    /// Stops tracking `entity`.
    pub fn remove<E: Tracked + ?Sized>(&mut self, entity: &E) -> bool {
        self.remove_key(entity.key())
    }

    /// Re-reads `entity`'s position and moves it between cells if needed.
    pub fn relocate<E: Tracked + ?Sized>(&mut self, entity: &E) {
        match entity.position() {
            Some(position) => self.relocate_to(entity.key(), position),
            None => {
                self.remove_key(entity.key());
            }
        }
    }
}

impl<K: Copy + Eq + Hash> Default for SpatialIndex<K> {
    fn default() -> Self {
        Self {
            cell_size: DEFAULT_CELL_SIZE,
            cells: HashMap::new(),
            placements: HashMap::new(),
            enabled: true,
        }
    }
}
