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

//! # Result Cache
//!
//! A namespaced key/value store whose entries carry their insertion time.
//! Callers state how old a value may be at read time; anything older is
//! deleted on the spot and reported as a miss. Nothing expires proactively.
//!
//! Each namespace is strongly typed: the first write fixes its key and value
//! types, and a later write with different types is rejected.
//!
//! An entry whose age is exactly `max_age` is still a hit; it expires once
//! `age > max_age`.

use gambit_core::{Clock, OptimizerError, OptimizerResult};
use std::any::{type_name, Any};
use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::rc::Rc;

struct Entry<V> {
    value: V,
    inserted_at: f64,
}

struct Namespace<K, V> {
    entries: HashMap<K, Entry<V>>,
}

trait ErasedNamespace {
    fn as_any_mut(&mut self) -> &mut dyn Any;
    fn len(&self) -> usize;
}

impl<K: 'static, V: 'static> ErasedNamespace for Namespace<K, V> {
    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}

/// Hit/miss counters of a [`ResultCache`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Reads that returned a value.
    pub hits: u64,
    /// Reads that returned nothing, including expired entries.
    pub misses: u64,
    /// Entries deleted because they were too old when read.
    pub expired: u64,
}

impl CacheStats {
    /// Fraction of reads that were hits.
    pub fn hit_rate(&self) -> f64 {
        let reads = self.hits + self.misses;
        if reads == 0 {
            0.0
        } else {
            self.hits as f64 / reads as f64
        }
    }
}

/// A namespaced, age-checked result cache.
pub struct ResultCache {
    clock: Rc<dyn Clock>,
    namespaces: HashMap<String, Box<dyn ErasedNamespace>>,
    enabled: bool,
    stats: CacheStats,
}

impl ResultCache {
    /// Creates an empty cache reading time from `clock`.
    pub fn new(clock: Rc<dyn Clock>) -> Self {
        Self {
            clock,
            namespaces: HashMap::new(),
            enabled: true,
            stats: CacheStats::default(),
        }
    }

    /// Looks up `key` in `namespace`.
    ///
    /// Returns the value if it was stored no more than `max_age` seconds ago
    /// (`None` means any age is acceptable). A stale entry is deleted. While
    /// caching is disabled every read misses.
    pub fn get<K, V>(&mut self, namespace: &str, key: &K, max_age: Option<f64>) -> Option<V>
    where
        K: Eq + Hash + 'static,
        V: Clone + 'static,
    {
        if !self.enabled {
            self.stats.misses += 1;
            return None;
        }
        let now = self.clock.now();
        let Some(erased) = self.namespaces.get_mut(namespace) else {
            self.stats.misses += 1;
            return None;
        };
        let Some(typed) = erased.as_any_mut().downcast_mut::<Namespace<K, V>>() else {
            log::warn!(
                "Cache namespace '{namespace}' read as {} but holds another type",
                type_name::<V>()
            );
            self.stats.misses += 1;
            return None;
        };

        let fresh = typed
            .entries
            .get(key)
            .map(|entry| max_age.map_or(true, |max| now - entry.inserted_at <= max));
        match fresh {
            Some(true) => {
                self.stats.hits += 1;
                typed.entries.get(key).map(|entry| entry.value.clone())
            }
            Some(false) => {
                typed.entries.remove(key);
                self.stats.expired += 1;
                self.stats.misses += 1;
                None
            }
            None => {
                self.stats.misses += 1;
                None
            }
        }
    }

    /// Stores `value` under `key` in `namespace` and hands it back.
    ///
    /// While caching is disabled nothing is stored.
    pub fn put<K, V>(&mut self, namespace: &str, key: K, value: V) -> OptimizerResult<V>
    where
        K: Eq + Hash + 'static,
        V: Clone + 'static,
    {
        if !self.enabled {
            return Ok(value);
        }
        let now = self.clock.now();
        let erased = self
            .namespaces
            .entry(namespace.to_string())
            .or_insert_with(|| {
                Box::new(Namespace::<K, V> {
                    entries: HashMap::new(),
                })
            });
        let typed = erased
            .as_any_mut()
            .downcast_mut::<Namespace<K, V>>()
            .ok_or_else(|| OptimizerError::NamespaceTypeMismatch {
                namespace: namespace.to_string(),
                expected: type_name::<V>(),
            })?;
        typed.entries.insert(
            key,
            Entry {
                value: value.clone(),
                inserted_at: now,
            },
        );
        Ok(value)
    }

    /// Drops one namespace, or every namespace when `namespace` is `None`.
    pub fn clear(&mut self, namespace: Option<&str>) {
        match namespace {
            Some(name) => {
                if self.namespaces.remove(name).is_some() {
                    log::debug!("Cleared cache namespace '{name}'");
                }
            }
            None => {
                log::debug!("Cleared {} cache namespaces", self.namespaces.len());
                self.namespaces.clear();
            }
        }
    }

    /// Number of entries stored in `namespace`, stale ones included.
    pub fn len(&self, namespace: &str) -> usize {
        self.namespaces.get(namespace).map_or(0, |ns| ns.len())
    }

    /// Total number of entries across all namespaces.
    pub fn total_entries(&self) -> usize {
        self.namespaces.values().map(|ns| ns.len()).sum()
    }

    /// Returns `true` if no namespace holds any entry.
    pub fn is_empty(&self) -> bool {
        self.total_entries() == 0
    }

    /// Entry counts per namespace, sorted by name.
    pub fn namespace_sizes(&self) -> Vec<(String, usize)> {
        let mut sizes: Vec<_> = self
            .namespaces
            .iter()
            .map(|(name, ns)| (name.clone(), ns.len()))
            .collect();
        sizes.sort_by(|a, b| a.0.cmp(&b.0));
        sizes
    }

    /// Hit/miss counters.
    pub fn stats(&self) -> CacheStats {
        self.stats
    }

    /// Turns caching on or off. Stored entries are kept but not read.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Returns `true` if caching is on.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }
}

impl fmt::Debug for ResultCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResultCache")
            .field("enabled", &self.enabled)
            .field("namespaces", &self.namespace_sizes())
            .field("stats", &self.stats)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gambit_core::ManualClock;

    fn cache() -> (Rc<ManualClock>, ResultCache) {
        let clock = Rc::new(ManualClock::new(100.0));
        let cache = ResultCache::new(clock.clone());
        (clock, cache)
    }

    #[test]
    fn test_put_returns_value_and_get_hits() {
        let (_clock, mut cache) = cache();
        let stored = cache.put("paths", (1, 2), vec![3, 4]).unwrap();
        assert_eq!(stored, vec![3, 4]);
        assert_eq!(cache.get::<(i32, i32), Vec<i32>>("paths", &(1, 2), Some(0.0)), Some(vec![3, 4]));
        assert_eq!(cache.stats().hits, 1);
    }

    #[test]
    fn test_stale_entry_is_purged_on_read() {
        let (clock, mut cache) = cache();
        cache.put("paths", 7u32, "route".to_string()).unwrap();

        clock.advance(2.5);
        assert_eq!(cache.get::<u32, String>("paths", &7, Some(2.0)), None);
        assert_eq!(cache.len("paths"), 0);
        // Even an unlimited read misses: the entry is gone.
        assert_eq!(cache.get::<u32, String>("paths", &7, None), None);

        let stats = cache.stats();
        assert_eq!(stats.expired, 1);
        assert_eq!(stats.misses, 2);
    }

    #[test]
    fn test_age_equal_to_max_age_is_a_hit() {
        let (clock, mut cache) = cache();
        cache.put("ns", 1u8, 10u64).unwrap();

        clock.advance(0.5);
        assert_eq!(cache.get::<u8, u64>("ns", &1, Some(0.5)), Some(10));

        clock.advance(0.25);
        assert_eq!(cache.get::<u8, u64>("ns", &1, Some(0.5)), None);
    }

    #[test]
    fn test_unlimited_max_age_never_expires() {
        let (clock, mut cache) = cache();
        cache.put("ns", "k", 1.5f64).unwrap();
        clock.advance(1.0e9);
        assert_eq!(cache.get::<&str, f64>("ns", &"k", None), Some(1.5));
    }

    #[test]
    fn test_put_overwrites_and_refreshes_timestamp() {
        let (clock, mut cache) = cache();
        cache.put("ns", 1u8, 1u8).unwrap();
        clock.advance(5.0);
        cache.put("ns", 1u8, 2u8).unwrap();
        clock.advance(1.0);
        assert_eq!(cache.get::<u8, u8>("ns", &1, Some(2.0)), Some(2));
        assert_eq!(cache.len("ns"), 1);
    }

    #[test]
    fn test_namespaces_are_isolated_and_clearable() {
        let (_clock, mut cache) = cache();
        cache.put("a", 1u8, 1u8).unwrap();
        cache.put("b", 1u8, 2u8).unwrap();
        cache.put("b", 2u8, 3u8).unwrap();

        assert_eq!(
            cache.namespace_sizes(),
            vec![("a".to_string(), 1), ("b".to_string(), 2)]
        );

        cache.clear(Some("b"));
        assert_eq!(cache.get::<u8, u8>("b", &1, None), None);
        assert_eq!(cache.get::<u8, u8>("a", &1, None), Some(1));

        cache.clear(None);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_type_mismatch() {
        let (_clock, mut cache) = cache();
        cache.put("ns", 1u8, 1u8).unwrap();

        assert!(matches!(
            cache.put("ns", 1u8, "text"),
            Err(OptimizerError::NamespaceTypeMismatch { .. })
        ));
        assert_eq!(cache.get::<u8, String>("ns", &1, None), None);
        assert_eq!(cache.get::<u8, u8>("ns", &1, None), Some(1));
    }

    #[test]
    fn test_disabled_cache_stores_nothing() {
        let (_clock, mut cache) = cache();
        cache.set_enabled(false);
        assert_eq!(cache.put("ns", 1u8, 9u8).unwrap(), 9);
        assert_eq!(cache.len("ns"), 0);
        assert_eq!(cache.get::<u8, u8>("ns", &1, None), None);

        cache.set_enabled(true);
        cache.put("ns", 1u8, 9u8).unwrap();
        cache.set_enabled(false);
        assert_eq!(cache.get::<u8, u8>("ns", &1, None), None);
        assert_eq!(cache.len("ns"), 1);
    }
}
