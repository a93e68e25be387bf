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

//! # Gambit Data
//!
//! The data structures the optimizer reroutes host work through:
//!
//! - [`pool`]: reusable object pools with identity-checked release.
//! - [`spatial`]: a uniform-grid spatial hash for radius queries.
//! - [`cache`]: a namespaced result cache with lazy, age-based expiry.

#![warn(missing_docs)]

pub mod cache;
pub mod pool;
pub mod spatial;

pub use cache::{CacheStats, ResultCache};
pub use pool::{ObjectPool, ObjectPools, PoolStats, Pooled};
pub use spatial::{CellKey, SpatialIndex, DEFAULT_CELL_SIZE};
