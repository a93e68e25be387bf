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

//! Feature toggles read at every decision point.

use gambit_core::{OptimizerError, OptimizerResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One of the optimizations the host can switch on or off at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Optimization {
    /// Reuse objects through the pools instead of building new ones.
    Pooling,
    /// Answer radius queries through the spatial grid.
    SpatialHashing,
    /// Defer expensive loads until first access.
    LazyLoading,
    /// Skip drawing objects outside the viewport.
    Culling,
    /// Serve repeated computations from the result cache.
    Caching,
}

impl Optimization {
    /// Every toggle, in a stable order.
    pub const ALL: [Optimization; 5] = [
        Optimization::Pooling,
        Optimization::SpatialHashing,
        Optimization::LazyLoading,
        Optimization::Culling,
        Optimization::Caching,
    ];

    /// The canonical snake_case name.
    pub fn name(self) -> &'static str {
        match self {
            Optimization::Pooling => "pooling",
            Optimization::SpatialHashing => "spatial_hashing",
            Optimization::LazyLoading => "lazy_loading",
            Optimization::Culling => "culling",
            Optimization::Caching => "caching",
        }
    }
}

impl fmt::Display for Optimization {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Parses a toggle name, ignoring case, `_`, `-` and spaces.
///
/// `"spatial_hashing"`, `"spatialHashing"` and `"Spatial Hashing"` all name
/// the same toggle; `"objectPooling"` is accepted for pooling.
impl FromStr for Optimization {
    type Err = OptimizerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| !matches!(c, '_' | '-' | ' '))
            .flat_map(char::to_lowercase)
            .collect();
        match normalized.as_str() {
            "pooling" | "objectpooling" => Ok(Optimization::Pooling),
            "spatialhashing" | "spatialhash" => Ok(Optimization::SpatialHashing),
            "lazyloading" => Ok(Optimization::LazyLoading),
            "culling" => Ok(Optimization::Culling),
            "caching" => Ok(Optimization::Caching),
            _ => Err(OptimizerError::InvalidConfiguration(format!(
                "unknown optimization '{s}'"
            ))),
        }
    }
}

/// The current state of every toggle. All optimizations are on by default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizationSettings {
    /// See [`Optimization::Pooling`].
    pub pooling: bool,
    /// See [`Optimization::SpatialHashing`].
    pub spatial_hashing: bool,
    /// See [`Optimization::LazyLoading`].
    pub lazy_loading: bool,
    /// See [`Optimization::Culling`].
    pub culling: bool,
    /// See [`Optimization::Caching`].
    pub caching: bool,
}

impl Default for OptimizationSettings {
    fn default() -> Self {
        Self {
            pooling: true,
            spatial_hashing: true,
            lazy_loading: true,
            culling: true,
            caching: true,
        }
    }
}

impl OptimizationSettings {
    /// Settings with every optimization off.
    pub fn disabled() -> Self {
        Self {
            pooling: false,
            spatial_hashing: false,
            lazy_loading: false,
            culling: false,
            caching: false,
        }
    }

    /// Returns `true` if `optimization` is on.
    pub fn is_enabled(&self, optimization: Optimization) -> bool {
        match optimization {
            Optimization::Pooling => self.pooling,
            Optimization::SpatialHashing => self.spatial_hashing,
            Optimization::LazyLoading => self.lazy_loading,
            Optimization::Culling => self.culling,
            Optimization::Caching => self.caching,
        }
    }

    /// Switches `optimization` and returns its previous state.
    pub fn set(&mut self, optimization: Optimization, enabled: bool) -> bool {
        let slot = match optimization {
            Optimization::Pooling => &mut self.pooling,
            Optimization::SpatialHashing => &mut self.spatial_hashing,
            Optimization::LazyLoading => &mut self.lazy_loading,
            Optimization::Culling => &mut self.culling,
            Optimization::Caching => &mut self.caching,
        };
        std::mem::replace(slot, enabled)
    }

    /// Every toggle with its current state.
    pub fn iter(&self) -> impl Iterator<Item = (Optimization, bool)> + '_ {
        Optimization::ALL
            .into_iter()
            .map(move |optimization| (optimization, self.is_enabled(optimization)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_enabled_by_default() {
        let settings = OptimizationSettings::default();
        assert!(settings.iter().all(|(_, enabled)| enabled));
        assert!(OptimizationSettings::disabled().iter().all(|(_, enabled)| !enabled));
    }

    #[test]
    fn test_set_returns_previous_state() {
        let mut settings = OptimizationSettings::default();
        assert!(settings.set(Optimization::Culling, false));
        assert!(!settings.is_enabled(Optimization::Culling));
        assert!(!settings.set(Optimization::Culling, true));
        assert!(settings.culling);
    }

    #[test]
    fn test_parse_names() {
        assert_eq!("spatialHashing".parse::<Optimization>(), Ok(Optimization::SpatialHashing));
        assert_eq!("lazy_loading".parse::<Optimization>(), Ok(Optimization::LazyLoading));
        assert_eq!("Object Pooling".parse::<Optimization>(), Ok(Optimization::Pooling));
        for optimization in Optimization::ALL {
            assert_eq!(optimization.name().parse::<Optimization>(), Ok(optimization));
        }
        assert!(matches!(
            "vsync".parse::<Optimization>(),
            Err(OptimizerError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_settings_deserialize_with_missing_fields() {
        let settings: OptimizationSettings = serde_json::from_str(r#"{ "culling": false }"#).unwrap();
        assert!(!settings.culling);
        assert!(settings.pooling);
    }
}
