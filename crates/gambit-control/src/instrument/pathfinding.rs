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
use gambit_core::host::Pathfinder;
use gambit_core::{Channel, GridPos};

/// Cache key of a path request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PathQuery {
    /// Start tile.
    pub from: GridPos,
    /// Goal tile.
    pub to: GridPos,
}

/// A pathfinder decorator that serves repeated requests from the result cache.
///
/// Paths live in the cache namespace named after the decorator's label and
/// are recomputed once older than the configured maximum age.
pub struct CachedPathfinder<P: Pathfinder> {
    optimizer: Optimizer,
    inner: P,
    namespace: String,
    channel: Channel,
    max_age: Option<f64>,
    interception: Interception,
}

impl<P: Pathfinder> CachedPathfinder<P> {
    pub(crate) fn new(
        optimizer: Optimizer,
        interception: Interception,
        label: &str,
        inner: P,
        max_age: Option<f64>,
    ) -> Self {
        Self {
            optimizer,
            inner,
            namespace: label.to_string(),
            channel: Channel::subsystem(point_name(label, "find_path")),
            max_age,
            interception,
        }
    }

    /// Overrides the maximum age of cached paths; `None` keeps them until cleared.
    pub fn with_max_age(mut self, max_age: Option<f64>) -> Self {
        self.max_age = max_age;
        self
    }

    /// The cache namespace holding this pathfinder's results.
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Drops every cached path, e.g. after the board layout changed.
    pub fn invalidate(&self) {
        self.optimizer.clear_cache(Some(&self.namespace));
    }

    /// The wrapped pathfinder.
    pub fn inner(&self) -> &P {
        &self.inner
    }

    /// The claimed interception point.
    pub fn interception(&self) -> &Interception {
        &self.interception
    }

    /// Unwraps the pathfinder, freeing the interception point.
    pub fn into_inner(self) -> P {
        self.inner
    }
}

impl<P: Pathfinder> Pathfinder for CachedPathfinder<P> {
    type Path = P::Path;

    fn find_path(&mut self, from: GridPos, to: GridPos) -> Self::Path {
        let _timer = self.optimizer.timer(self.channel.clone());
        let query = PathQuery { from, to };
        if let Some(path) =
            self.optimizer
                .get_cached_result::<PathQuery, P::Path>(&self.namespace, &query, self.max_age)
        {
            log::trace!("Path {from:?} -> {to:?} served from cache");
            return path;
        }

        let path = self.inner.find_path(from, to);
        if let Err(err) = self
            .optimizer
            .cache_result(&self.namespace, query, path.clone())
        {
            log::warn!("Could not cache path {from:?} -> {to:?}: {err}");
        }
        path
    }

    fn intercepted_as(&self) -> Option<&str> {
        self.interception.points().first().map(String::as_str)
    }
}
