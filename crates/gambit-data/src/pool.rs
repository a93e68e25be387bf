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

//! Reusable object pools.
//!
//! Pooled objects are handed out as shared handles ([`Pooled`]). The pool keeps
//! only a weak reference to checked-out objects, which is enough to recognise
//! them when they come back and to reject anything it never lent out.

use gambit_core::host::Reset;
use gambit_core::{OptimizerError, OptimizerResult};
use std::any::{type_name, Any};
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::{Rc, Weak};

/// A handle to a pooled object.
pub type Pooled<T> = Rc<RefCell<T>>;

type Factory<T> = Box<dyn Fn() -> T>;
type ResetHook<T> = Box<dyn Fn(&mut T)>;

#[inline]
fn identity<T>(object: &Pooled<T>) -> usize {
    Rc::as_ptr(object) as usize
}

/// Occupancy and reuse counters of a single pool.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolStats {
    /// Objects sitting in the pool, ready to be handed out.
    pub available: usize,
    /// Objects currently checked out.
    pub in_use: usize,
    /// Objects ever built by the factory for pooled use.
    pub created: usize,
    /// Acquisitions served from `available` instead of the factory.
    pub reused: usize,
    /// Objects built while pooling was bypassed; never tracked.
    pub unpooled: usize,
    /// Checked-out objects whose last handle was dropped without a release.
    pub abandoned: usize,
}

impl PoolStats {
    /// Fraction of acquisitions that were served by reuse.
    pub fn reuse_rate(&self) -> f64 {
        let acquisitions = self.reused + self.created;
        if acquisitions == 0 {
            0.0
        } else {
            self.reused as f64 / acquisitions as f64
        }
    }
}

/// A pool of reusable objects of one type.
pub struct ObjectPool<T> {
    name: String,
    factory: Factory<T>,
    reset: Option<ResetHook<T>>,
    available: Vec<Pooled<T>>,
    in_use: HashMap<usize, Weak<RefCell<T>>>,
    created: usize,
    reused: usize,
    unpooled: usize,
    abandoned: usize,
}

impl<T: 'static> ObjectPool<T> {
    /// Creates an empty pool that builds new objects with `factory`.
    pub fn new(name: impl Into<String>, factory: impl Fn() -> T + 'static) -> Self {
        Self {
            name: name.into(),
            factory: Box::new(factory),
            reset: None,
            available: Vec::new(),
            in_use: HashMap::new(),
            created: 0,
            reused: 0,
            unpooled: 0,
            abandoned: 0,
        }
    }

    /// Creates an empty pool whose objects are reset through their [`Reset`] impl.
    pub fn resettable(name: impl Into<String>, factory: impl Fn() -> T + 'static) -> Self
    where
        T: Reset,
    {
        Self::new(name, factory).with_reset(T::reset)
    }

    /// Installs a hook that runs on every object returned to the pool.
    pub fn with_reset(mut self, reset: impl Fn(&mut T) + 'static) -> Self {
        self.reset = Some(Box::new(reset));
        self
    }

    /// Builds `count` objects up front and parks them in the pool.
    pub fn prefill(&mut self, count: usize) {
        self.available.reserve(count);
        for _ in 0..count {
            let object = Rc::new(RefCell::new((self.factory)()));
            self.created += 1;
            self.available.push(object);
        }
    }

    /// Hands out an object, reusing a parked one when possible.
    pub fn acquire(&mut self) -> Pooled<T> {
        self.prune_abandoned();
        let object = match self.available.pop() {
            Some(object) => {
                self.reused += 1;
                object
            }
            None => {
                self.created += 1;
                log::debug!(
                    "Pool '{}' is empty, building a new object ({} created so far)",
                    self.name,
                    self.created
                );
                Rc::new(RefCell::new((self.factory)()))
            }
        };
        self.in_use.insert(identity(&object), Rc::downgrade(&object));
        object
    }

    /// Builds an object straight from the factory without tracking it.
    pub fn mint(&mut self) -> Pooled<T> {
        self.unpooled += 1;
        Rc::new(RefCell::new((self.factory)()))
    }

    /// Takes an object back into the pool.
    ///
    /// Fails with [`OptimizerError::NotInUse`] if the object is not currently
    /// checked out from this pool, which catches double releases.
    pub fn release(&mut self, object: &Pooled<T>) -> OptimizerResult<()> {
        let id = identity(object);
        let checked_out = self
            .in_use
            .get(&id)
            .and_then(Weak::upgrade)
            .is_some_and(|tracked| Rc::ptr_eq(&tracked, object));
        if !checked_out {
            return Err(OptimizerError::NotInUse {
                pool: self.name.clone(),
            });
        }
        self.in_use.remove(&id);

        if let Some(reset) = &self.reset {
            match object.try_borrow_mut() {
                Ok(mut inner) => reset(&mut inner),
                Err(_) => log::warn!(
                    "Object returned to pool '{}' is still borrowed; skipping reset",
                    self.name
                ),
            }
        }
        self.available.push(Rc::clone(object));
        Ok(())
    }

    /// Forgets checked-out objects that were dropped instead of released.
    ///
    /// Returns how many were found.
    pub fn prune_abandoned(&mut self) -> usize {
        let before = self.in_use.len();
        self.in_use.retain(|_, tracked| tracked.strong_count() > 0);
        let pruned = before - self.in_use.len();
        if pruned > 0 {
            self.abandoned += pruned;
            log::debug!(
                "Pool '{}' lost {pruned} objects that were never released",
                self.name
            );
        }
        pruned
    }

    /// Returns `true` if `object` is currently checked out from this pool.
    pub fn is_in_use(&self, object: &Pooled<T>) -> bool {
        self.in_use
            .get(&identity(object))
            .and_then(Weak::upgrade)
            .is_some_and(|tracked| Rc::ptr_eq(&tracked, object))
    }
}

impl<T> ObjectPool<T> {
    /// The pool's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of parked objects.
    pub fn available(&self) -> usize {
        self.available.len()
    }

    /// Number of checked-out objects that are still alive.
    pub fn in_use(&self) -> usize {
        self.in_use
            .values()
            .filter(|tracked| tracked.strong_count() > 0)
            .count()
    }

    /// Snapshot of the pool's counters.
    pub fn stats(&self) -> PoolStats {
        let in_use = self.in_use();
        PoolStats {
            available: self.available.len(),
            in_use,
            created: self.created,
            reused: self.reused,
            unpooled: self.unpooled,
            abandoned: self.abandoned + (self.in_use.len() - in_use),
        }
    }
}

impl<T> fmt::Debug for ObjectPool<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectPool")
            .field("name", &self.name)
            .field("stats", &self.stats())
            .finish()
    }
}

trait ErasedPool {
    fn as_any_mut(&mut self) -> &mut dyn Any;
    fn stats(&self) -> PoolStats;
}

impl<T: 'static> ErasedPool for ObjectPool<T> {
    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn stats(&self) -> PoolStats {
        ObjectPool::stats(self)
    }
}

/// A registry of named pools holding objects of arbitrary types.
///
/// When pooling is disabled, acquisitions come straight from the pool's
/// factory and releases are ignored; only the reuse policy changes.
pub struct ObjectPools {
    pools: HashMap<String, Box<dyn ErasedPool>>,
    enabled: bool,
}

impl ObjectPools {
    /// Creates an empty registry with pooling enabled.
    pub fn new() -> Self {
        Self {
            pools: HashMap::new(),
            enabled: true,
        }
    }

    /// Creates a pool named `name` and fills it with `initial_size` objects.
    pub fn initialize<T: 'static>(
        &mut self,
        name: impl Into<String>,
        factory: impl Fn() -> T + 'static,
        initial_size: usize,
    ) {
        self.register(ObjectPool::new(name, factory), initial_size);
    }

    /// Registers a pre-configured pool and fills it with `initial_size` objects.
    ///
    /// Registering a name twice replaces the previous pool.
    pub fn register<T: 'static>(&mut self, mut pool: ObjectPool<T>, initial_size: usize) {
        pool.prefill(initial_size);
        let name = pool.name().to_string();
        log::debug!(
            "Initialized object pool '{}' ({}) with {} objects",
            name,
            type_name::<T>(),
            initial_size
        );
        if self.pools.insert(name.clone(), Box::new(pool)).is_some() {
            log::warn!("Object pool '{name}' was re-initialized; previous objects dropped");
        }
    }

    fn typed_mut<T: 'static>(&mut self, name: &str) -> OptimizerResult<&mut ObjectPool<T>> {
        let pool = self
            .pools
            .get_mut(name)
            .ok_or_else(|| OptimizerError::UnknownPoolType {
                pool: name.to_string(),
            })?;
        pool.as_any_mut()
            .downcast_mut::<ObjectPool<T>>()
            .ok_or_else(|| OptimizerError::PoolTypeMismatch {
                pool: name.to_string(),
                expected: type_name::<T>(),
            })
    }

    /// Hands out an object from the pool named `name`.
    pub fn acquire<T: 'static>(&mut self, name: &str) -> OptimizerResult<Pooled<T>> {
        let enabled = self.enabled;
        let pool = self.typed_mut::<T>(name)?;
        Ok(if enabled { pool.acquire() } else { pool.mint() })
    }

    /// Returns an object to the pool named `name`.
    pub fn release<T: 'static>(&mut self, name: &str, object: &Pooled<T>) -> OptimizerResult<()> {
        let enabled = self.enabled;
        let pool = self.typed_mut::<T>(name)?;
        if enabled {
            pool.release(object)
        } else {
            Ok(())
        }
    }

    /// Returns `true` if a pool named `name` exists.
    pub fn contains(&self, name: &str) -> bool {
        self.pools.contains_key(name)
    }

    /// Number of registered pools.
    pub fn len(&self) -> usize {
        self.pools.len()
    }

    /// Returns `true` if no pool has been registered.
    pub fn is_empty(&self) -> bool {
        self.pools.is_empty()
    }

    /// Turns object reuse on or off.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Returns `true` if object reuse is on.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Counters of the pool named `name`, if it exists.
    pub fn pool_stats(&self, name: &str) -> Option<PoolStats> {
        self.pools.get(name).map(|pool| pool.stats())
    }

    /// Counters of every pool, sorted by name.
    pub fn stats(&self) -> Vec<(String, PoolStats)> {
        let mut stats: Vec<_> = self
            .pools
            .iter()
            .map(|(name, pool)| (name.clone(), pool.stats()))
            .collect();
        stats.sort_by(|a, b| a.0.cmp(&b.0));
        stats
    }
}

impl Default for ObjectPools {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ObjectPools {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectPools")
            .field("enabled", &self.enabled)
            .field("pools", &self.stats())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[derive(Debug, Default)]
    struct Projectile {
        serial: usize,
        travelled: f64,
    }

    impl Reset for Projectile {
        fn reset(&mut self) {
            self.travelled = 0.0;
        }
    }

    fn numbered_pool(name: &str) -> ObjectPool<Projectile> {
        let next = Rc::new(Cell::new(0usize));
        ObjectPool::resettable(name, move || {
            let serial = next.get();
            next.set(serial + 1);
            Projectile {
                serial,
                travelled: 0.0,
            }
        })
    }

    #[test]
    fn test_sixty_acquisitions_from_pool_of_five() {
        let mut pool = numbered_pool("projectile");
        pool.prefill(5);

        let handed_out: Vec<_> = (0..60).map(|_| pool.acquire()).collect();

        // The first five come from the prefilled batch.
        for object in &handed_out[..5] {
            assert!(object.borrow().serial < 5);
        }
        // The rest were built on demand.
        for object in &handed_out[5..] {
            assert!(object.borrow().serial >= 5);
        }
        let stats = pool.stats();
        assert_eq!(stats.reused, 5);
        assert_eq!(stats.created, 60);
        assert_eq!(stats.in_use, 60);

        for object in &handed_out {
            pool.release(object).unwrap();
        }
        assert_eq!(pool.available(), 60);
        assert_eq!(pool.in_use(), 0);
    }

    #[test]
    fn test_double_release_is_rejected() {
        let mut pool = numbered_pool("projectile");
        let object = pool.acquire();

        assert!(pool.release(&object).is_ok());
        assert_eq!(
            pool.release(&object),
            Err(OptimizerError::NotInUse {
                pool: "projectile".to_string()
            })
        );
        assert_eq!(pool.available(), 1);
    }

    #[test]
    fn test_dropped_handles_are_not_counted_as_in_use() {
        let mut pool = numbered_pool("projectile");
        pool.prefill(2);
        let kept = pool.acquire();
        let lost = pool.acquire();
        assert_eq!(pool.in_use(), 2);

        drop(lost);
        let stats = pool.stats();
        assert_eq!((stats.in_use, stats.abandoned), (1, 1));
        assert_eq!(stats.available + stats.in_use + stats.abandoned, stats.created);

        assert_eq!(pool.prune_abandoned(), 1);
        assert_eq!(pool.prune_abandoned(), 0);
        assert_eq!(pool.stats().abandoned, 1);
        assert!(pool.release(&kept).is_ok());
        assert_eq!(pool.in_use(), 0);
    }

    #[test]
    fn test_foreign_object_is_rejected() {
        let mut pool = numbered_pool("projectile");
        let stranger = Rc::new(RefCell::new(Projectile::default()));
        assert!(pool.release(&stranger).is_err());
        assert_eq!(pool.available(), 0);
    }

    #[test]
    fn test_reset_hook_runs_on_release() {
        let mut pool = numbered_pool("projectile");
        let object = pool.acquire();
        object.borrow_mut().travelled = 42.0;

        pool.release(&object).unwrap();
        assert_eq!(object.borrow().travelled, 0.0);

        let again = pool.acquire();
        assert!(Rc::ptr_eq(&again, &object));
        assert!(pool.is_in_use(&again));
    }

    #[test]
    fn test_registry_unknown_pool() {
        let mut pools = ObjectPools::new();
        let err = pools.acquire::<Projectile>("missing").unwrap_err();
        assert_eq!(
            err,
            OptimizerError::UnknownPoolType {
                pool: "missing".to_string()
            }
        );

        let stray = Rc::new(RefCell::new(Projectile::default()));
        assert!(matches!(
            pools.release("missing", &stray),
            Err(OptimizerError::UnknownPoolType { .. })
        ));
    }

    #[test]
    fn test_registry_type_mismatch() {
        let mut pools = ObjectPools::new();
        pools.initialize("numbers", || 0u32, 2);
        assert!(matches!(
            pools.acquire::<Projectile>("numbers"),
            Err(OptimizerError::PoolTypeMismatch { .. })
        ));
    }

    #[test]
    fn test_registry_disabled_bypasses_reuse() {
        let mut pools = ObjectPools::new();
        pools.register(numbered_pool("projectile"), 3);
        pools.set_enabled(false);

        let a = pools.acquire::<Projectile>("projectile").unwrap();
        let b = pools.acquire::<Projectile>("projectile").unwrap();
        assert!(!Rc::ptr_eq(&a, &b));
        // Built by the factory, not taken from the three parked objects.
        assert!(a.borrow().serial >= 3);
        assert!(pools.release("projectile", &a).is_ok());
        assert!(pools.release("projectile", &a).is_ok());

        let stats = pools.pool_stats("projectile").unwrap();
        assert_eq!(stats.available, 3);
        assert_eq!(stats.in_use, 0);
        assert_eq!(stats.unpooled, 2);
    }

    #[test]
    fn test_registry_stats_sorted() {
        let mut pools = ObjectPools::new();
        pools.initialize("b", || 1u8, 1);
        pools.initialize("a", || 1u16, 2);
        let names: Vec<_> = pools.stats().into_iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["a".to_string(), "b".to_string()]);
    }
}
