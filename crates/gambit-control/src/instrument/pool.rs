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
use gambit_core::{Channel, OptimizerResult};
use gambit_data::Pooled;
use std::marker::PhantomData;

/// A create/destroy pair backed by an object pool.
///
/// `create` takes an object from the pool and `destroy` hands it back, so
/// the host never constructs or drops pooled objects itself. With pooling
/// off, `create` builds a fresh object every time and `destroy` does nothing.
pub struct PooledFactory<T> {
    optimizer: Optimizer,
    pool: String,
    create_channel: Channel,
    destroy_channel: Channel,
    interception: Interception,
    _marker: PhantomData<fn() -> T>,
}

impl<T: 'static> PooledFactory<T> {
    /// The pool methods this decorator intercepts.
    pub const METHODS: [&'static str; 2] = ["create", "destroy"];

    pub(crate) fn new(optimizer: Optimizer, interception: Interception, pool: &str) -> Self {
        Self {
            optimizer,
            pool: pool.to_string(),
            create_channel: Channel::subsystem(point_name(pool, "create")),
            destroy_channel: Channel::subsystem(point_name(pool, "destroy")),
            interception,
            _marker: PhantomData,
        }
    }

    /// Hands out an object.
    pub fn create(&self) -> OptimizerResult<Pooled<T>> {
        let _timer = self.optimizer.timer(self.create_channel.clone());
        self.optimizer.get_object(&self.pool)
    }

    /// Takes an object back.
    pub fn destroy(&self, object: &Pooled<T>) -> OptimizerResult<()> {
        let _timer = self.optimizer.timer(self.destroy_channel.clone());
        self.optimizer.return_object(&self.pool, object)
    }

    /// The backing pool's name.
    pub fn pool(&self) -> &str {
        &self.pool
    }

    /// The claimed interception points.
    pub fn interception(&self) -> &Interception {
        &self.interception
    }
}
