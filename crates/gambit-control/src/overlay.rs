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

//! Debug overlay with live optimizer counters.

use crate::settings::OptimizationSettings;
use gambit_core::host::OverlayCanvas;
use gambit_data::{CacheStats, PoolStats};
use std::fmt;

/// Vertical distance between overlay lines.
pub const OVERLAY_LINE_HEIGHT: f64 = 14.0;

/// A point-in-time view of the optimizer's structures.
#[derive(Debug, Clone, PartialEq)]
pub struct OverlaySnapshot {
    /// Whether a monitoring session is active.
    pub monitoring: bool,
    /// Frames per second over the retained frame samples.
    pub average_fps: f64,
    /// Occupancy of every pool, sorted by name.
    pub pools: Vec<(String, PoolStats)>,
    /// Grid cells holding at least one entity.
    pub spatial_cells: usize,
    /// Entities in the spatial index.
    pub spatial_entities: usize,
    /// Entry count of every cache namespace, sorted by name.
    pub cache_entries: Vec<(String, usize)>,
    /// Cache hit/miss counters.
    pub cache_stats: CacheStats,
    /// Current toggle states.
    pub settings: OptimizationSettings,
}

impl OverlaySnapshot {
    /// The overlay as text lines, top to bottom.
    pub fn lines(&self) -> Vec<String> {
        let mut lines = vec![format!(
            "FPS {:.1}{}",
            self.average_fps,
            if self.monitoring { " [monitoring]" } else { "" }
        )];

        for (name, stats) in &self.pools {
            lines.push(format!(
                "pool {name}: {} in use / {} free ({} created)",
                stats.in_use, stats.available, stats.created
            ));
        }

        lines.push(format!(
            "spatial: {} entities in {} cells",
            self.spatial_entities, self.spatial_cells
        ));

        for (namespace, entries) in &self.cache_entries {
            lines.push(format!("cache {namespace}: {entries} entries"));
        }
        lines.push(format!(
            "cache hits {} / misses {} ({:.0}%)",
            self.cache_stats.hits,
            self.cache_stats.misses,
            self.cache_stats.hit_rate() * 100.0
        ));

        let disabled: Vec<&str> = self
            .settings
            .iter()
            .filter(|(_, enabled)| !enabled)
            .map(|(optimization, _)| optimization.name())
            .collect();
        if !disabled.is_empty() {
            lines.push(format!("disabled: {}", disabled.join(", ")));
        }
        lines
    }

    /// Writes the lines onto `canvas`, one per [`OVERLAY_LINE_HEIGHT`].
    pub fn draw(&self, canvas: &mut dyn OverlayCanvas, x: f64, y: f64) {
        for (row, line) in self.lines().iter().enumerate() {
            canvas.text(x, y + row as f64 * OVERLAY_LINE_HEIGHT, line);
        }
    }
}

impl fmt::Display for OverlaySnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for line in self.lines() {
            writeln!(f, "{line}")?;
        }
        Ok(())
    }
}
