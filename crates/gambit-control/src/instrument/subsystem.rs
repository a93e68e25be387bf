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
use gambit_core::host::Subsystem;
use gambit_core::Channel;

/// An explicitly registered subsystem whose updates are timed.
pub struct TimedSubsystem<S: Subsystem> {
    optimizer: Optimizer,
    inner: S,
    channel: Channel,
    interception: Interception,
}

impl<S: Subsystem> TimedSubsystem<S> {
    pub(crate) fn new(
        optimizer: Optimizer,
        interception: Interception,
        label: &str,
        inner: S,
    ) -> Self {
        Self {
            optimizer,
            inner,
            channel: Channel::subsystem(point_name(label, "update")),
            interception,
        }
    }

    /// The channel updates are recorded under.
    pub fn channel(&self) -> &Channel {
        &self.channel
    }

    /// The wrapped subsystem.
    pub fn inner(&self) -> &S {
        &self.inner
    }

    /// Mutable access to the wrapped subsystem.
    pub fn inner_mut(&mut self) -> &mut S {
        &mut self.inner
    }

    /// The claimed interception point.
    pub fn interception(&self) -> &Interception {
        &self.interception
    }

    /// Unwraps the subsystem, freeing the interception point.
    pub fn into_inner(self) -> S {
        self.inner
    }
}

impl<S: Subsystem> Subsystem for TimedSubsystem<S> {
    fn update(&mut self, dt: f64) {
        let _timer = self.optimizer.timer(self.channel.clone());
        self.inner.update(dt);
    }

    fn intercepted_as(&self) -> Option<&str> {
        self.interception.points().first().map(String::as_str)
    }
}
