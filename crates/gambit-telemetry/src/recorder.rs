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

//! Rolling per-channel timing samples and the monitoring session around them.

use crate::report::PerformanceReport;
use crate::series::SampleSeries;
use gambit_core::{Channel, Clock, OptimizerError, OptimizerResult};
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

/// Number of samples kept per channel unless configured otherwise.
pub const DEFAULT_SAMPLE_CAPACITY: usize = 60;
/// Seconds a monitoring session lasts before it stops itself.
pub const DEFAULT_MONITORING_DURATION: f64 = 5.0;

/// Collects timing samples while a monitoring session is active.
///
/// Every channel keeps at most `capacity` samples and drops the oldest once
/// full. Samples recorded outside a session are ignored.
pub struct MetricsRecorder {
    clock: Rc<dyn Clock>,
    capacity: usize,
    monitoring_duration: f64,
    monitoring: bool,
    started_at: Option<f64>,
    frame: SampleSeries,
    update: SampleSeries,
    draw: SampleSeries,
    subsystems: BTreeMap<String, SampleSeries>,
}

impl MetricsRecorder {
    /// Creates an idle recorder.
    ///
    /// Fails with [`OptimizerError::InvalidConfiguration`] if `capacity` is zero
    /// or `monitoring_duration` is not a positive number of seconds.
    pub fn new(
        clock: Rc<dyn Clock>,
        capacity: usize,
        monitoring_duration: f64,
    ) -> OptimizerResult<Self> {
        if capacity == 0 {
            return Err(OptimizerError::InvalidConfiguration(
                "sample capacity must be positive".to_string(),
            ));
        }
        if !(monitoring_duration.is_finite() && monitoring_duration > 0.0) {
            return Err(OptimizerError::InvalidConfiguration(format!(
                "monitoring duration must be positive, got {monitoring_duration}"
            )));
        }

        Ok(Self::build(clock, capacity, monitoring_duration))
    }

    /// Creates a recorder with the default capacity and duration.
    pub fn with_defaults(clock: Rc<dyn Clock>) -> Self {
        Self::build(clock, DEFAULT_SAMPLE_CAPACITY, DEFAULT_MONITORING_DURATION)
    }

    fn build(clock: Rc<dyn Clock>, capacity: usize, monitoring_duration: f64) -> Self {
        Self {
            clock,
            capacity,
            monitoring_duration,
            monitoring: false,
            started_at: None,
            frame: SampleSeries::new(capacity),
            update: SampleSeries::new(capacity),
            draw: SampleSeries::new(capacity),
            subsystems: BTreeMap::new(),
        }
    }

    /// Discards all previous samples and begins a new session.
    pub fn start_monitoring(&mut self) {
        self.frame = SampleSeries::new(self.capacity);
        self.update = SampleSeries::new(self.capacity);
        self.draw = SampleSeries::new(self.capacity);
        self.subsystems.clear();
        self.started_at = Some(self.clock.now());
        self.monitoring = true;
        log::info!(
            "Performance monitoring started ({:.1}s window, {} samples per channel)",
            self.monitoring_duration,
            self.capacity
        );
    }

    /// Ends the session and returns its report.
    ///
    /// Calling this while idle still returns a report over the samples of the
    /// last session.
    pub fn stop_monitoring(&mut self) -> PerformanceReport {
        let elapsed = self.elapsed();
        self.monitoring = false;
        let report = self.generate_report().with_monitored_secs(elapsed);
        log::info!(
            "Performance monitoring stopped after {:.2}s, average {:.1} FPS",
            elapsed,
            report.average_fps()
        );
        for recommendation in &report.recommendations {
            log::warn!("{recommendation}");
        }
        report
    }

    /// Appends one sample to `channel`. Ignored while idle.
    pub fn record_sample(&mut self, channel: &Channel, seconds: f64) {
        if !self.monitoring {
            return;
        }
        let capacity = self.capacity;
        let series = match channel {
            Channel::Frame => &mut self.frame,
            Channel::Update => &mut self.update,
            Channel::Draw => &mut self.draw,
            Channel::Subsystem(name) => self
                .subsystems
                .entry(name.clone())
                .or_insert_with(|| SampleSeries::new(capacity)),
        };
        series.push(seconds);
    }

    /// Records one frame of `dt` seconds.
    ///
    /// Returns the final report if this tick ran past the monitoring window
    /// and stopped the session.
    pub fn tick(&mut self, dt: f64) -> Option<PerformanceReport> {
        if !self.monitoring {
            return None;
        }
        self.record_sample(&Channel::Frame, dt);
        if self.elapsed() > self.monitoring_duration {
            log::info!(
                "Monitoring window of {:.1}s elapsed",
                self.monitoring_duration
            );
            return Some(self.stop_monitoring());
        }
        None
    }

    /// Builds a report over the current samples without ending the session.
    pub fn generate_report(&self) -> PerformanceReport {
        PerformanceReport::from_series(
            &self.frame,
            &self.update,
            &self.draw,
            self.subsystems
                .iter()
                .map(|(name, series)| (name.as_str(), series)),
        )
        .with_monitored_secs(self.elapsed())
    }

    /// The samples of `channel`, if it exists.
    pub fn series(&self, channel: &Channel) -> Option<&SampleSeries> {
        match channel {
            Channel::Frame => Some(&self.frame),
            Channel::Update => Some(&self.update),
            Channel::Draw => Some(&self.draw),
            Channel::Subsystem(name) => self.subsystems.get(name),
        }
    }

    /// Names of the subsystem channels that received samples this session.
    pub fn subsystem_channels(&self) -> impl Iterator<Item = &str> {
        self.subsystems.keys().map(String::as_str)
    }

    /// Returns `true` while a session is active.
    pub fn is_monitoring(&self) -> bool {
        self.monitoring
    }

    /// Seconds since the last `start_monitoring`, or 0.0 if never started.
    pub fn elapsed(&self) -> f64 {
        self.started_at
            .map_or(0.0, |start| (self.clock.now() - start).max(0.0))
    }

    /// Samples kept per channel.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Length of a monitoring session, in seconds.
    pub fn monitoring_duration(&self) -> f64 {
        self.monitoring_duration
    }
}

impl fmt::Debug for MetricsRecorder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MetricsRecorder")
            .field("capacity", &self.capacity)
            .field("monitoring_duration", &self.monitoring_duration)
            .field("monitoring", &self.monitoring)
            .field("frames", &self.frame.len())
            .field("subsystems", &self.subsystems.len())
            .finish()
    }
}
