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

//! A small skirmish used to exercise the optimizer: two teams of units on a
//! tiled board, a breadth-first pathfinder, sprites and a particle system.

use gambit_core::host::{Drawable, GridHost, Pathfinder, Positioned, Reset, Subsystem, Tracked};
use gambit_core::{EntityKey, GridPos, Point, Rect};
use std::collections::{HashMap, HashSet, VecDeque};
use std::fmt;

/// Edge length of a board tile.
pub const TILE: f64 = 32.0;

/// Center of `tile` in board coordinates.
pub fn tile_center(tile: GridPos) -> Point {
    Point::new(
        tile.x as f64 * TILE + TILE / 2.0,
        tile.y as f64 * TILE + TILE / 2.0,
    )
}

/// The tile containing `point`.
pub fn tile_at(point: Point) -> GridPos {
    GridPos::new((point.x / TILE).floor() as i32, (point.y / TILE).floor() as i32)
}

#[derive(Debug, Clone)]
pub struct Unit {
    pub id: u64,
    pub team: u8,
    pub tile: GridPos,
}

impl Positioned for Unit {
    fn position(&self) -> Option<Point> {
        Some(tile_center(self.tile))
    }
}

impl Tracked for Unit {
    fn key(&self) -> EntityKey {
        EntityKey(self.id)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum BoardError {
    OutOfBounds(GridPos),
    Occupied(GridPos),
    Missing(EntityKey),
}

impl fmt::Display for BoardError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BoardError::OutOfBounds(tile) => write!(f, "tile {tile:?} is off the board"),
            BoardError::Occupied(tile) => write!(f, "tile {tile:?} is occupied"),
            BoardError::Missing(key) => write!(f, "unit {key} is not on the board"),
        }
    }
}

impl std::error::Error for BoardError {}

/// A board whose range query scans every unit.
pub struct Board {
    width: i32,
    height: i32,
    units: HashMap<EntityKey, Unit>,
    occupied: HashSet<GridPos>,
}

impl Board {
    pub fn new(width: i32, height: i32) -> Self {
        Self {
            width,
            height,
            units: HashMap::new(),
            occupied: HashSet::new(),
        }
    }

    fn contains(&self, tile: GridPos) -> bool {
        tile.x >= 0 && tile.y >= 0 && tile.x < self.width && tile.y < self.height
    }
}

impl GridHost for Board {
    type Entity = Unit;
    type Error = BoardError;

    fn add_entity(&mut self, unit: Unit) -> Result<(), BoardError> {
        if !self.contains(unit.tile) {
            return Err(BoardError::OutOfBounds(unit.tile));
        }
        if !self.occupied.insert(unit.tile) {
            return Err(BoardError::Occupied(unit.tile));
        }
        self.units.insert(unit.key(), unit);
        Ok(())
    }

    fn remove_entity(&mut self, key: EntityKey) -> Option<Unit> {
        let unit = self.units.remove(&key)?;
        self.occupied.remove(&unit.tile);
        Some(unit)
    }

    fn move_entity(&mut self, key: EntityKey, to: Point) -> Result<(), BoardError> {
        let tile = tile_at(to);
        if !self.contains(tile) {
            return Err(BoardError::OutOfBounds(tile));
        }
        let current = self
            .units
            .get(&key)
            .map(|unit| unit.tile)
            .ok_or(BoardError::Missing(key))?;
        if current == tile {
            return Ok(());
        }
        if !self.occupied.insert(tile) {
            return Err(BoardError::Occupied(tile));
        }
        self.occupied.remove(&current);
        if let Some(unit) = self.units.get_mut(&key) {
            unit.tile = tile;
        }
        Ok(())
    }

    fn entity(&self, key: EntityKey) -> Option<&Unit> {
        self.units.get(&key)
    }

    fn entities_in_range(&self, center: Point, radius: f64) -> Vec<EntityKey> {
        self.units
            .values()
            .filter(|unit| tile_center(unit.tile).distance(&center) <= radius)
            .map(Tracked::key)
            .collect()
    }

    fn keys(&self) -> Vec<EntityKey> {
        let mut keys: Vec<_> = self.units.keys().copied().collect();
        keys.sort();
        keys
    }
}

/// Breadth-first search over the board's tiles, ignoring units.
pub struct BfsPathfinder {
    width: i32,
    height: i32,
    walls: HashSet<GridPos>,
}

impl BfsPathfinder {
    pub fn new(width: i32, height: i32, walls: HashSet<GridPos>) -> Self {
        Self {
            width,
            height,
            walls,
        }
    }

    fn walkable(&self, tile: GridPos) -> bool {
        tile.x >= 0
            && tile.y >= 0
            && tile.x < self.width
            && tile.y < self.height
            && !self.walls.contains(&tile)
    }
}

impl Pathfinder for BfsPathfinder {
    type Path = Vec<GridPos>;

    /// Returns the tiles from `from` to `to` inclusive, or an empty path.
    fn find_path(&mut self, from: GridPos, to: GridPos) -> Vec<GridPos> {
        if !self.walkable(from) || !self.walkable(to) {
            return Vec::new();
        }
        let mut came_from: HashMap<GridPos, GridPos> = HashMap::new();
        let mut frontier = VecDeque::from([from]);
        came_from.insert(from, from);

        while let Some(tile) = frontier.pop_front() {
            if tile == to {
                break;
            }
            for (dx, dy) in [(1, 0), (-1, 0), (0, 1), (0, -1)] {
                let next = GridPos::new(tile.x + dx, tile.y + dy);
                if self.walkable(next) && !came_from.contains_key(&next) {
                    came_from.insert(next, tile);
                    frontier.push_back(next);
                }
            }
        }

        if !came_from.contains_key(&to) {
            return Vec::new();
        }
        let mut path = vec![to];
        let mut tile = to;
        while tile != from {
            match came_from.get(&tile) {
                Some(previous) => tile = *previous,
                None => return Vec::new(),
            }
            path.push(tile);
        }
        path.reverse();
        path
    }
}

/// A fixed sprite on screen.
pub struct Sprite {
    pub bounds: Rect,
    pub frames_drawn: u64,
}

impl Drawable for Sprite {
    fn draw(&mut self) {
        self.frames_drawn += 1;
    }

    fn bounds(&self) -> Option<Rect> {
        Some(self.bounds)
    }
}

/// Decorative particles with a deliberately wasteful update.
pub struct Particles {
    pub count: usize,
    pub phase: f64,
}

impl Subsystem for Particles {
    fn update(&mut self, dt: f64) {
        self.phase += dt;
        let mut energy = 0.0;
        for i in 0..self.count {
            energy += (self.phase + i as f64).sin().abs();
        }
        self.phase += energy * 1e-9;
    }
}

/// A shot in flight, recycled through an object pool.
#[derive(Debug, Default)]
pub struct Projectile {
    pub position: Point,
    pub velocity: Point,
    pub ttl: f64,
}

impl Reset for Projectile {
    fn reset(&mut self) {
        *self = Projectile::default();
    }
}
