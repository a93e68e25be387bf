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

//! Capability contracts a host application implements.
//!
//! The optimizer accelerates host code without knowing what it does. These
//! traits are the whole surface it relies on: anything that can report a
//! position can be indexed, anything with a `draw` can be culled, and so on.

use crate::entity::EntityKey;
use crate::math::{GridPos, Point, Rect};

/// Something that may occupy a position in 2D space.
pub trait Positioned {
    /// The current position, or `None` if the object is not placed anywhere.
    fn position(&self) -> Option<Point>;
}

/// A positioned object with a stable identity, eligible for spatial indexing.
pub trait Tracked: Positioned {
    /// The host-assigned identity of this object.
    fn key(&self) -> EntityKey;
}

/// An object that can be returned to a clean state before reuse.
pub trait Reset {
    /// Restores the object to its freshly-constructed state.
    fn reset(&mut self);
}

/// A host structure that owns entities laid out on a 2D board.
pub trait GridHost {
    /// The entity type stored on the board.
    type Entity: Tracked;
    /// The failure type of mutating board operations.
    type Error;

    /// Places a new entity on the board.
    fn add_entity(&mut self, entity: Self::Entity) -> Result<(), Self::Error>;

    /// Takes an entity off the board, returning it if it was present.
    fn remove_entity(&mut self, key: EntityKey) -> Option<Self::Entity>;

    /// Moves an entity to a new position.
    fn move_entity(&mut self, key: EntityKey, to: Point) -> Result<(), Self::Error>;

    /// Looks up an entity by key.
    fn entity(&self, key: EntityKey) -> Option<&Self::Entity>;

    /// Returns every entity within `radius` of `center`.
    fn entities_in_range(&self, center: Point, radius: f64) -> Vec<EntityKey>;

    /// Keys of every entity currently on the board.
    fn keys(&self) -> Vec<EntityKey>;

    /// The interception point already wrapping this object, if it is a
    /// decorator. Decorators refuse to wrap one another.
    fn intercepted_as(&self) -> Option<&str> {
        None
    }
}

/// A host service that computes routes between tiles.
pub trait Pathfinder {
    /// The route representation. Cached results are handed out as clones.
    type Path: Clone + 'static;

    /// Computes a route from `from` to `to`.
    fn find_path(&mut self, from: GridPos, to: GridPos) -> Self::Path;

    /// See [`GridHost::intercepted_as`].
    fn intercepted_as(&self) -> Option<&str> {
        None
    }
}

/// Something that renders itself.
pub trait Drawable {
    /// Issues the draw calls for this object.
    fn draw(&mut self);

    /// Screen-space bounds, used to skip drawing objects that are off-screen.
    fn bounds(&self) -> Option<Rect> {
        None
    }

    /// See [`GridHost::intercepted_as`].
    fn intercepted_as(&self) -> Option<&str> {
        None
    }
}

/// A per-frame simulation step.
pub trait Subsystem {
    /// Advances the subsystem by `dt` seconds.
    fn update(&mut self, dt: f64);

    /// See [`GridHost::intercepted_as`].
    fn intercepted_as(&self) -> Option<&str> {
        None
    }
}

/// A text surface the debug overlay can be written onto.
pub trait OverlayCanvas {
    /// Writes one line of text with its top-left corner at (`x`, `y`).
    fn text(&mut self, x: f64, y: f64, line: &str);
}
