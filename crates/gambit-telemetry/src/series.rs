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

//! Bounded storage for rolling timing samples.

use serde::Serialize;
use std::collections::VecDeque;

/// Aggregate statistics of a sample series.
///
/// An empty series yields all zeros.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct SeriesStats {
    /// Smallest sample.
    pub min: f64,
    /// Arithmetic mean.
    pub avg: f64,
    /// Largest sample.
    pub max: f64,
    /// Number of samples.
    pub count: usize,
}

/// A bounded series of samples that drops its oldest value once full.
///
/// Remaining samples always stay in insertion order.
#[derive(Debug, Clone)]
pub struct SampleSeries {
    samples: VecDeque<f64>,
    capacity: usize,
}

impl SampleSeries {
    /// Creates an empty series holding at most `capacity` samples.
    pub fn new(capacity: usize) -> Self {
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Appends a sample, evicting the oldest one if the series is full.
    pub fn push(&mut self, value: f64) {
        if self.capacity == 0 {
            return;
        }
        if self.samples.len() == self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(value);
    }

    /// Returns the number of samples currently held.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Returns `true` if no sample has been recorded.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Maximum number of samples kept.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Iterates over the samples from oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = &f64> {
        self.samples.iter()
    }

    /// The most recent sample.
    pub fn latest(&self) -> Option<f64> {
        self.samples.back().copied()
    }

    /// Arithmetic mean, or 0.0 if empty.
    pub fn average(&self) -> f64 {
        if self.samples.is_empty() {
            return 0.0;
        }
        self.samples.iter().sum::<f64>() / self.samples.len() as f64
    }

    /// Minimum, average and maximum in a single pass.
    pub fn stats(&self) -> SeriesStats {
        if self.samples.is_empty() {
            return SeriesStats::default();
        }
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        let mut sum = 0.0;
        for &value in &self.samples {
            min = min.min(value);
            max = max.max(value);
            sum += value;
        }
        SeriesStats {
            min,
            avg: sum / self.samples.len() as f64,
            max,
            count: self.samples.len(),
        }
    }

    /// Removes every sample.
    pub fn clear(&mut self) {
        self.samples.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use proptest::prelude::*;

    #[test]
    fn test_series_push_and_evict() {
        let mut series = SampleSeries::new(3);
        series.push(1.0);
        series.push(2.0);
        series.push(3.0);
        series.push(4.0); // Evicts 1.0

        let values: Vec<f64> = series.iter().copied().collect();
        assert_eq!(values, vec![2.0, 3.0, 4.0]);
        assert_eq!(series.len(), 3);
        assert_eq!(series.latest(), Some(4.0));
    }

    #[test]
    fn test_series_stats() {
        let mut series = SampleSeries::new(4);
        series.push(3.0);
        series.push(1.0);
        series.push(4.0);
        series.push(1.5);

        let stats = series.stats();
        assert_eq!(stats.min, 1.0);
        assert_eq!(stats.max, 4.0);
        assert_relative_eq!(stats.avg, 2.375);
        assert_eq!(stats.count, 4);
    }

    #[test]
    fn test_series_empty_is_zero() {
        let series = SampleSeries::new(4);
        assert_eq!(series.average(), 0.0);
        assert_eq!(series.stats(), SeriesStats::default());
        assert_eq!(series.latest(), None);
    }

    #[test]
    fn test_zero_capacity_keeps_nothing() {
        let mut series = SampleSeries::new(0);
        series.push(1.0);
        assert!(series.is_empty());
    }

    proptest! {
        #[test]
        fn prop_series_keeps_last_capacity_values(
            capacity in 1usize..80,
            values in prop::collection::vec(0.0f64..1.0, 0..300),
        ) {
            let mut series = SampleSeries::new(capacity);
            for v in &values {
                series.push(*v);
            }
            let start = values.len().saturating_sub(capacity);
            let kept: Vec<f64> = series.iter().copied().collect();
            prop_assert_eq!(kept.as_slice(), &values[start..]);
            prop_assert!(series.len() <= capacity);
        }
    }
}
