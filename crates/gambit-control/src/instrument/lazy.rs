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

use crate::optimizer::Optimizer;
use gambit_core::Channel;
use std::cell::{Cell, LazyCell};
use std::fmt;
use std::ops::Deref;
use std::rc::Rc;

/// Channel that records how long deferred loads took.
pub const LAZY_LOAD_CHANNEL: &str = "lazy_load";

type Loader<T> = Box<dyn FnOnce() -> T>;

/// A value whose loader runs on first access.
///
/// Built through [`Optimizer::defer`]; when lazy loading is off the loader
/// runs immediately instead. Either way the load is timed under
/// [`LAZY_LOAD_CHANNEL`].
pub struct Deferred<T> {
    value: LazyCell<T, Loader<T>>,
    loaded: Rc<Cell<bool>>,
}

impl<T: 'static> Deferred<T> {
    pub(crate) fn new(
        optimizer: Optimizer,
        loader: impl FnOnce() -> T + 'static,
        eager: bool,
    ) -> Self {
        let loaded = Rc::new(Cell::new(false));
        let flag = Rc::clone(&loaded);
        let load: Loader<T> = Box::new(move || {
            let value = optimizer.time(Channel::subsystem(LAZY_LOAD_CHANNEL), loader);
            flag.set(true);
            value
        });
        let deferred = Self {
            value: LazyCell::new(load),
            loaded,
        };
        if eager {
            LazyCell::force(&deferred.value);
        }
        deferred
    }
}

impl<T> Deferred<T> {
    /// Loads the value if needed and returns it.
    pub fn get(&self) -> &T {
        LazyCell::force(&self.value)
    }

    /// Returns `true` once the loader has run.
    pub fn is_loaded(&self) -> bool {
        self.loaded.get()
    }
}

impl<T> Deref for Deferred<T> {
    type Target = T;

    fn deref(&self) -> &T {
        self.get()
    }
}

impl<T: fmt::Debug> fmt::Debug for Deferred<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut debug = f.debug_struct("Deferred");
        if self.is_loaded() {
            debug.field("value", self.get());
        } else {
            debug.field("value", &format_args!("<pending>"));
        }
        debug.finish()
    }
}
