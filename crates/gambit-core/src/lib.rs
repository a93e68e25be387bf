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

//! # Gambit Core
//!
//! Foundational crate containing the traits, core types, and interface
//! contracts shared by the runtime optimization layer.
//!
//! Nothing in here knows about pools, grids or caches. It only describes what
//! a host application must expose (entities with positions, grids, pathfinders,
//! drawables, subsystems) and the vocabulary (clocks, channels, errors) the
//! other `gambit-*` crates speak.

#![warn(missing_docs)]

pub mod clock;
pub mod entity;
pub mod error;
pub mod host;
pub mod math;
pub mod telemetry;
pub mod utils;

pub use clock::{Clock, ManualClock, SystemClock};
pub use entity::EntityKey;
pub use error::{OptimizerError, OptimizerResult};
pub use math::{GridPos, Point, Rect};
pub use telemetry::Channel;
pub use utils::timer::Stopwatch;
