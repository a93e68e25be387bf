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
use gambit_core::host::Drawable;
use gambit_core::{Channel, Rect};

/// A drawable decorator that skips objects outside the viewport.
///
/// An object is culled only when culling is on, a viewport is set, and the
/// object reports bounds that do not touch it. Drawn frames are timed under
/// `<label>.draw`.
pub struct CulledDrawable<D: Drawable> {
    optimizer: Optimizer,
    inner: D,
    channel: Channel,
    drawn: u64,
    culled: u64,
    interception: Interception,
}

impl<D: Drawable> CulledDrawable<D> {
    pub(crate) fn new(
        optimizer: Optimizer,
        interception: Interception,
        label: &str,
        inner: D,
    ) -> Self {
        Self {
            optimizer,
            inner,
            channel: Channel::subsystem(point_name(label, "draw")),
            drawn: 0,
            culled: 0,
            interception,
        }
    }

    /// Number of `draw` calls forwarded.
    pub fn drawn(&self) -> u64 {
        self.drawn
    }

    /// Number of `draw` calls skipped.
    pub fn culled(&self) -> u64 {
        self.culled
    }

    /// The wrapped drawable.
    pub fn inner(&self) -> &D {
        &self.inner
    }

    /// Mutable access to the wrapped drawable.
    pub fn inner_mut(&mut self) -> &mut D {
        &mut self.inner
    }

    /// The claimed interception point.
    pub fn interception(&self) -> &Interception {
        &self.interception
    }

    /// Unwraps the drawable, freeing the interception point.
    pub fn into_inner(self) -> D {
        self.inner
    }
}

impl<D: Drawable> Drawable for CulledDrawable<D> {
    fn draw(&mut self) {
        if self.optimizer.should_cull(self.inner.bounds()) {
            self.culled += 1;
            return;
        }
        let _timer = self.optimizer.timer(self.channel.clone());
        self.drawn += 1;
        self.inner.draw();
    }

    fn bounds(&self) -> Option<Rect> {
        self.inner.bounds()
    }

    fn intercepted_as(&self) -> Option<&str> {
        self.interception.points().first().map(String::as_str)
    }
}
