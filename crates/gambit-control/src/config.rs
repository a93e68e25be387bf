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

//! Optimizer configuration, loadable from JSON.

use crate::settings::OptimizationSettings;
use anyhow::Context;
use gambit_core::{OptimizerError, OptimizerResult, Rect};
use gambit_data::DEFAULT_CELL_SIZE;
use gambit_telemetry::{DEFAULT_MONITORING_DURATION, DEFAULT_SAMPLE_CAPACITY};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default age, in seconds, after which a cached path is recomputed.
pub const DEFAULT_PATH_CACHE_MAX_AGE: f64 = 1.0;

/// Everything the optimizer needs to know at construction.
///
/// Missing JSON fields fall back to their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizerConfig {
    /// Samples kept per timing channel.
    pub sample_capacity: usize,
    /// Length of a monitoring session, in seconds.
    pub monitoring_duration_secs: f64,
    /// Edge length of a spatial grid cell.
    pub cell_size: f64,
    /// Maximum age of a cached path; `None` keeps paths until cleared.
    pub path_cache_max_age_secs: Option<f64>,
    /// Visible area used for culling; `None` disables culling until set.
    pub viewport: Option<Rect>,
    /// Initial toggle states.
    pub settings: OptimizationSettings,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            sample_capacity: DEFAULT_SAMPLE_CAPACITY,
            monitoring_duration_secs: DEFAULT_MONITORING_DURATION,
            cell_size: DEFAULT_CELL_SIZE,
            path_cache_max_age_secs: Some(DEFAULT_PATH_CACHE_MAX_AGE),
            viewport: None,
            settings: OptimizationSettings::default(),
        }
    }
}

impl OptimizerConfig {
    /// Parses a configuration from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Loads and validates a configuration from a JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read optimizer config {}", path.display()))?;
        let config = Self::from_json(&content)
            .with_context(|| format!("failed to parse optimizer config {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Writes the configuration as pretty-printed JSON.
    pub fn to_file(&self, path: impl AsRef<Path>) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path.as_ref(), json)?;
        Ok(())
    }

    /// Checks every numeric field for range errors.
    pub fn validate(&self) -> OptimizerResult<()> {
        if self.sample_capacity == 0 {
            return Err(invalid("sample_capacity must be positive"));
        }
        if !(self.monitoring_duration_secs.is_finite() && self.monitoring_duration_secs > 0.0) {
            return Err(invalid("monitoring_duration_secs must be positive"));
        }
        if !(self.cell_size.is_finite() && self.cell_size > 0.0) {
            return Err(invalid("cell_size must be positive"));
        }
        if let Some(max_age) = self.path_cache_max_age_secs {
            if max_age.is_nan() || max_age < 0.0 {
                return Err(invalid("path_cache_max_age_secs must not be negative"));
            }
        }
        if let Some(viewport) = self.viewport {
            if viewport.width < 0.0 || viewport.height < 0.0 {
                return Err(invalid("viewport must have a non-negative size"));
            }
        }
        Ok(())
    }
}

fn invalid(message: &str) -> OptimizerError {
    OptimizerError::InvalidConfiguration(message.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = OptimizerConfig::default();
        assert_eq!(config.sample_capacity, 60);
        assert_eq!(config.cell_size, 64.0);
        assert_eq!(config.path_cache_max_age_secs, Some(1.0));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = OptimizerConfig::from_json(
            r#"{ "cell_size": 32.0, "settings": { "caching": false } }"#,
        )
        .unwrap();
        assert_eq!(config.cell_size, 32.0);
        assert_eq!(config.monitoring_duration_secs, 5.0);
        assert!(!config.settings.caching);
        assert!(config.settings.pooling);
    }

    #[test]
    fn test_validate_rejects_out_of_range_values() {
        let bad = [
            OptimizerConfig { sample_capacity: 0, ..Default::default() },
            OptimizerConfig { cell_size: 0.0, ..Default::default() },
            OptimizerConfig { cell_size: -8.0, ..Default::default() },
            OptimizerConfig { monitoring_duration_secs: 0.0, ..Default::default() },
            OptimizerConfig { path_cache_max_age_secs: Some(-1.0), ..Default::default() },
        ];
        for config in bad {
            assert!(matches!(
                config.validate(),
                Err(OptimizerError::InvalidConfiguration(_))
            ));
        }
    }

    #[test]
    fn test_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("optimizer.json");
        let config = OptimizerConfig {
            sample_capacity: 120,
            viewport: Some(Rect::new(0.0, 0.0, 640.0, 480.0)),
            ..Default::default()
        };
        config.to_file(&path).unwrap();
        assert_eq!(OptimizerConfig::from_file(&path).unwrap(), config);
    }

    #[test]
    fn test_from_file_rejects_invalid_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, r#"{ "cell_size": 0 }"#).unwrap();
        let err = OptimizerConfig::from_file(&path).unwrap_err();
        assert!(err.to_string().contains("cell_size"));
    }

    #[test]
    fn test_missing_file_reports_path() {
        let err = OptimizerConfig::from_file("/definitely/not/here.json").unwrap_err();
        assert!(err.to_string().contains("not/here.json"));
    }
}
