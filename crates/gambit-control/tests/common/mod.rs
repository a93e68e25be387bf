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

#![allow(dead_code)]

use gambit_control::{Optimizer, OptimizerConfig};
use gambit_core::host::{Drawable, GridHost, Pathfinder, Positioned, Subsystem, Tracked};
use gambit_core::{EntityKey, GridPos, ManualClock, Point, Rect};
use std::cell::Cell;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

pub fn optimizer() -> (Rc<ManualClock>, Optimizer) {
    optimizer_with(OptimizerConfig::default())
}

pub fn optimizer_with(config: OptimizerConfig) -> (Rc<ManualClock>, Optimizer) {
    let clock = Rc::new(ManualClock::new(0.0));
    let optimizer = Optimizer::new(config, clock.clone()).unwrap();
    (clock, optimizer)
}

#[derive(Debug, Clone, PartialEq)]
pub struct Unit {
    pub id: u64,
    pub position: Option<Point>,
}

impl Unit {
    pub fn at(id: u64, x: f64, y: f64) -> Self {
        Self {
            id,
            position: Some(Point::new(x, y)),
        }
    }
}

impl Positioned for Unit {
    fn position(&self) -> Option<Point> {
        self.position
    }
}

impl Tracked for Unit {
    fn key(&self) -> EntityKey {
        EntityKey(self.id)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum BoardError {
    Occupied(EntityKey),
    Missing(EntityKey),
    OutOfBounds(Point),
}

impl fmt::Display for BoardError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BoardError::Occupied(key) => write!(f, "{key} is already on the board"),
            BoardError::Missing(key) => write!(f, "{key} is not on the board"),
            BoardError::OutOfBounds(p) => write!(f, "({}, {}) is off the board", p.x, p.y),
        }
    }
}

/// A board with a linear-scan range query. Moves advance the shared clock
/// by `move_cost` to make timing observable.
pub struct Board {
    pub units: BTreeMap<EntityKey, Unit>,
    pub size: f64,
    pub clock: Rc<ManualClock>,
    pub move_cost: f64,
}

impl Board {
    pub fn new(clock: Rc<ManualClock>) -> Self {
        Self {
            units: BTreeMap::new(),
            size: 1024.0,
            clock,
            move_cost: 0.0,
        }
    }

    fn in_bounds(&self, p: Point) -> bool {
        p.x >= 0.0 && p.y >= 0.0 && p.x < self.size && p.y < self.size
    }
}

impl GridHost for Board {
    type Entity = Unit;
    type Error = BoardError;

    fn add_entity(&mut self, entity: Unit) -> Result<(), BoardError> {
        let key = entity.key();
        if self.units.contains_key(&key) {
            return Err(BoardError::Occupied(key));
        }
        self.units.insert(key, entity);
        Ok(())
    }

    fn remove_entity(&mut self, key: EntityKey) -> Option<Unit> {
        self.units.remove(&key)
    }

    fn move_entity(&mut self, key: EntityKey, to: Point) -> Result<(), BoardError> {
        self.clock.advance(self.move_cost);
        if !self.in_bounds(to) {
            return Err(BoardError::OutOfBounds(to));
        }
        let unit = self.units.get_mut(&key).ok_or(BoardError::Missing(key))?;
        unit.position = Some(to);
        Ok(())
    }

    fn entity(&self, key: EntityKey) -> Option<&Unit> {
        self.units.get(&key)
    }

    fn entities_in_range(&self, center: Point, radius: f64) -> Vec<EntityKey> {
        self.units
            .values()
            .filter(|unit| {
                unit.position
                    .is_some_and(|p| p.distance_squared(&center) <= radius * radius)
            })
            .map(|unit| unit.key())
            .collect()
    }

    fn keys(&self) -> Vec<EntityKey> {
        self.units.keys().copied().collect()
    }
}

/// A pathfinder returning the straight line of tiles, counting its calls.
#[derive(Default)]
pub struct LinePathfinder {
    pub calls: Rc<Cell<usize>>,
}

impl Pathfinder for LinePathfinder {
    type Path = Vec<GridPos>;

    fn find_path(&mut self, from: GridPos, to: GridPos) -> Vec<GridPos> {
        self.calls.set(self.calls.get() + 1);
        let mut path = vec![from];
        let mut current = from;
        while current != to {
            current.x += (to.x - current.x).signum();
            current.y += (to.y - current.y).signum();
            path.push(current);
        }
        path
    }
}

pub struct Sprite {
    pub bounds: Option<Rect>,
    pub draws: Rc<Cell<usize>>,
}

impl Drawable for Sprite {
    fn draw(&mut self) {
        self.draws.set(self.draws.get() + 1);
    }

    fn bounds(&self) -> Option<Rect> {
        self.bounds
    }
}

/// A subsystem whose update costs `cost` seconds of clock time.
pub struct Busy {
    pub clock: Rc<ManualClock>,
    pub cost: f64,
    pub updates: usize,
}

impl Subsystem for Busy {
    fn update(&mut self, _dt: f64) {
        self.updates += 1;
        self.clock.advance(self.cost);
    }
}
