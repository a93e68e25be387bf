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

//! Decorators that route host calls through the optimizer.
//!
//! Every decorator is built by an [`Optimizer`](crate::Optimizer) method that
//! first claims the decorator's interception points (`<label>.<method>`). A
//! point can only be claimed once while its decorator is alive, and a
//! decorator is never accepted as the host object of another one, so the same
//! host method is never timed or redirected twice.

mod draw;
mod grid;
mod lazy;
mod pathfinding;
mod pool;
mod subsystem;

pub use draw::CulledDrawable;
pub use grid::{InstrumentedGrid, SPATIAL_INDEX_POINT};
pub use lazy::{Deferred, LAZY_LOAD_CHANNEL};
pub use pathfinding::{CachedPathfinder, PathQuery};
pub use pool::PooledFactory;
pub use subsystem::TimedSubsystem;

use crate::optimizer::Optimizer;
use gambit_core::{Channel, OptimizerError, OptimizerResult};
use std::cell::RefCell;
use std::collections::BTreeSet;
use std::rc::{Rc, Weak};

/// Builds the name of an interception point.
pub fn point_name(label: &str, method: &str) -> String {
    format!("{label}.{method}")
}

/// The set of interception points currently wrapped.
#[derive(Debug, Default)]
pub struct InterceptRegistry {
    points: BTreeSet<String>,
}

impl InterceptRegistry {
    /// Claims every point in `points`, or none of them.
    ///
    /// Fails with [`OptimizerError::AlreadyIntercepted`] naming the first point
    /// that is already wrapped.
    pub fn claim(&mut self, points: &[String]) -> OptimizerResult<()> {
        if let Some(taken) = points.iter().find(|point| self.points.contains(*point)) {
            return Err(OptimizerError::AlreadyIntercepted {
                point: taken.clone(),
            });
        }
        self.points.extend(points.iter().cloned());
        Ok(())
    }

    /// Frees previously claimed points.
    pub fn release(&mut self, points: &[String]) {
        for point in points {
            self.points.remove(point);
        }
    }

    /// Returns `true` if `point` is wrapped.
    pub fn contains(&self, point: &str) -> bool {
        self.points.contains(point)
    }

    /// Number of wrapped points.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Returns `true` if nothing is wrapped.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Wrapped points in lexical order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.points.iter().map(String::as_str)
    }
}

/// Ownership of a set of interception points. Dropping it frees them.
#[derive(Debug)]
pub struct Interception {
    registry: Weak<RefCell<InterceptRegistry>>,
    points: Vec<String>,
}

impl Interception {
    pub(crate) fn new(registry: &Rc<RefCell<InterceptRegistry>>, points: Vec<String>) -> Self {
        Self {
            registry: Rc::downgrade(registry),
            points,
        }
    }

    /// The claimed points.
    pub fn points(&self) -> &[String] {
        &self.points
    }
}

impl Drop for Interception {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.upgrade() {
            if let Ok(mut registry) = registry.try_borrow_mut() {
                registry.release(&self.points);
                log::debug!("Released interception points {:?}", self.points);
            }
        }
    }
}

/// The base timing wrapper around an arbitrary callable.
///
/// Arguments are passed as a single value (use a tuple for several) and the
/// return value, `Result` or not, is forwarded untouched. The duration is
/// recorded even if the callable panics.
pub struct Timed<F> {
    optimizer: Optimizer,
    channel: Channel,
    inner: F,
    interception: Interception,
}

impl<F> Timed<F> {
    pub(crate) fn new(
        optimizer: Optimizer,
        interception: Interception,
        channel: Channel,
        inner: F,
    ) -> Self {
        Self {
            optimizer,
            channel,
            inner,
            interception,
        }
    }

    /// Calls the wrapped callable with `args` and times it.
    pub fn call<A, R>(&mut self, args: A) -> R
    where
        F: FnMut(A) -> R,
    {
        let _timer = self.optimizer.timer(self.channel.clone());
        (self.inner)(args)
    }

    /// The channel samples are recorded under.
    pub fn channel(&self) -> &Channel {
        &self.channel
    }

    /// The claimed interception point.
    pub fn interception(&self) -> &Interception {
        &self.interception
    }

    /// Unwraps the callable, freeing the interception point.
    pub fn into_inner(self) -> F {
        self.inner
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn points(names: &[&str]) -> Vec<String> {
        names.iter().map(|name| name.to_string()).collect()
    }

    #[test]
    fn test_claim_is_all_or_nothing() {
        let mut registry = InterceptRegistry::default();
        registry.claim(&points(&["board.add_entity"])).unwrap();

        let err = registry
            .claim(&points(&["board.move_entity", "board.add_entity"]))
            .unwrap_err();
        assert_eq!(
            err,
            OptimizerError::AlreadyIntercepted {
                point: "board.add_entity".to_string()
            }
        );
        assert!(!registry.contains("board.move_entity"));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_dropping_interception_frees_points() {
        let registry = Rc::new(RefCell::new(InterceptRegistry::default()));
        let claimed = points(&["paths.find_path"]);
        registry.borrow_mut().claim(&claimed).unwrap();
        let interception = Interception::new(&registry, claimed);
        assert_eq!(interception.points().to_vec(), vec!["paths.find_path".to_string()]);

        drop(interception);
        assert!(registry.borrow().is_empty());
    }

    #[test]
    fn test_point_name() {
        assert_eq!(point_name("board", "add_entity"), "board.add_entity");
    }
}
