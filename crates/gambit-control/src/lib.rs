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

//! # Gambit Control
//!
//! The [`Optimizer`] owns the metrics recorder, the object pools, the spatial
//! index and the result cache, and hands out decorators that route host calls
//! through them. Hosts opt in explicitly: every decorator claims its
//! interception points once and refuses to wrap another decorator, so nothing
//! is ever wrapped twice.

#![warn(missing_docs)]

pub mod config;
pub mod instrument;
pub mod optimizer;
pub mod overlay;
pub mod settings;

pub use config::OptimizerConfig;
pub use instrument::{
    CachedPathfinder, CulledDrawable, Deferred, InstrumentedGrid, Interception, PathQuery,
    PooledFactory, Timed, TimedSubsystem,
};
pub use optimizer::Optimizer;
pub use overlay::OverlaySnapshot;
pub use settings::{Optimization, OptimizationSettings};
