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

use crate::instrument::{point_name, Interception};
use crate::optimizer::Optimizer;
use crate::settings::Optimization;
use gambit_core::host::{GridHost, Positioned, Tracked};
use gambit_core::{Channel, EntityKey, Point};

/// Interception point held by whichever board currently feeds the spatial index.
pub const SPATIAL_INDEX_POINT: &str = "spatial_index";

/// A board decorator that keeps the spatial index in sync and times every call.
///
/// Adds, removes and moves are forwarded to the board first; the index only
/// follows changes the board accepted. Range queries go through the index
/// while spatial hashing is on and through the board's own implementation
/// otherwise.
pub struct InstrumentedGrid<G: GridHost> {
    optimizer: Optimizer,
    inner: G,
    add_channel: Channel,
    remove_channel: Channel,
    move_channel: Channel,
    query_channel: Channel,
    interception: Interception,
}

impl<G: GridHost> InstrumentedGrid<G> {
    /// The board methods this decorator intercepts.
    pub const METHODS: [&'static str; 4] = [
        "add_entity",
        "remove_entity",
        "move_entity",
        "entities_in_range",
    ];

    pub(crate) fn new(
        optimizer: Optimizer,
        interception: Interception,
        label: &str,
        inner: G,
    ) -> Self {
        let mut indexed = 0;
        for key in inner.keys() {
            let position = inner.entity(key).and_then(|entity| entity.position());
            if optimizer.track_key(key, position) {
                indexed += 1;
            }
        }
        log::debug!("Indexed {indexed} existing entities of '{label}'");

        Self {
            add_channel: Channel::subsystem(point_name(label, "add_entity")),
            remove_channel: Channel::subsystem(point_name(label, "remove_entity")),
            move_channel: Channel::subsystem(point_name(label, "move_entity")),
            query_channel: Channel::subsystem(point_name(label, "entities_in_range")),
            optimizer,
            inner,
            interception,
        }
    }

    /// The wrapped board.
    pub fn inner(&self) -> &G {
        &self.inner
    }

    /// Mutable access to the wrapped board.
    ///
    /// Position changes made through it bypass the index; report them with
    /// [`resync`](Self::resync).
    pub fn inner_mut(&mut self) -> &mut G {
        &mut self.inner
    }

    /// Re-reads the board's position for `key` and updates the index.
    pub fn resync(&self, key: EntityKey) -> bool {
        let position = self.inner.entity(key).and_then(|entity| entity.position());
        self.optimizer.track_key(key, position)
    }

    /// The claimed interception points.
    pub fn interception(&self) -> &Interception {
        &self.interception
    }

    /// Unwraps the board, freeing the interception points.
    ///
    /// Entities stay in the spatial index.
    pub fn into_inner(self) -> G {
        self.inner
    }
}

impl<G: GridHost> GridHost for InstrumentedGrid<G> {
    type Entity = G::Entity;
    type Error = G::Error;

    fn add_entity(&mut self, entity: Self::Entity) -> Result<(), Self::Error> {
        let _timer = self.optimizer.timer(self.add_channel.clone());
        let key = entity.key();
        self.inner.add_entity(entity)?;
        let position = self.inner.entity(key).and_then(|entity| entity.position());
        self.optimizer.track_key(key, position);
        Ok(())
    }

    fn remove_entity(&mut self, key: EntityKey) -> Option<Self::Entity> {
        let _timer = self.optimizer.timer(self.remove_channel.clone());
        let removed = self.inner.remove_entity(key);
        self.optimizer.untrack_entity(key);
        removed
    }

    fn move_entity(&mut self, key: EntityKey, to: Point) -> Result<(), Self::Error> {
        let _timer = self.optimizer.timer(self.move_channel.clone());
        self.inner.move_entity(key, to)?;
        let position = self.inner.entity(key).and_then(|entity| entity.position());
        self.optimizer.track_key(key, position);
        Ok(())
    }

    fn entity(&self, key: EntityKey) -> Option<&Self::Entity> {
        self.inner.entity(key)
    }

    fn entities_in_range(&self, center: Point, radius: f64) -> Vec<EntityKey> {
        let _timer = self.optimizer.timer(self.query_channel.clone());
        if self.optimizer.is_enabled(Optimization::SpatialHashing) {
            self.optimizer.get_entities_in_range(center, radius)
        } else {
            self.inner.entities_in_range(center, radius)
        }
    }

    fn keys(&self) -> Vec<EntityKey> {
        self.inner.keys()
    }

    fn intercepted_as(&self) -> Option<&str> {
        self.interception.points().first().map(String::as_str)
    }
}
