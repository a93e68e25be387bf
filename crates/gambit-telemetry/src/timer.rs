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

//! RAII timers that feed the metrics recorder. (RAII = Resource Acquisition Is Initialization)

use crate::recorder::MetricsRecorder;
use gambit_core::utils::timer::Stopwatch;
use gambit_core::{Channel, Clock};
use std::cell::RefCell;

/// Anything that accepts timing samples through a shared reference.
///
/// Wrappers time host calls that may themselves re-enter the optimizer, so
/// recording must not require a long-lived mutable borrow.
pub trait SampleSink {
    /// Records `seconds` under `channel`.
    fn record_sample(&self, channel: &Channel, seconds: f64);
}

impl SampleSink for RefCell<MetricsRecorder> {
    fn record_sample(&self, channel: &Channel, seconds: f64) {
        match self.try_borrow_mut() {
            Ok(mut recorder) => recorder.record_sample(channel, seconds),
            Err(_) => log::warn!("Dropped '{channel}' sample: recorder is already borrowed"),
        }
    }
}

/// Times a scope and records the duration when it is dropped.
///
/// The sample is recorded even on early returns or panics, so a failing host
/// call still reports how long it ran before failing.
pub struct ScopedSampleTimer<'a, S: SampleSink + ?Sized> {
    stopwatch: Stopwatch<'a>,
    sink: &'a S,
    channel: Option<Channel>,
}

impl<'a, S: SampleSink + ?Sized> ScopedSampleTimer<'a, S> {
    /// Starts timing `channel` against `clock`.
    pub fn new(sink: &'a S, clock: &'a dyn Clock, channel: Channel) -> Self {
        Self {
            stopwatch: Stopwatch::start(clock),
            sink,
            channel: Some(channel),
        }
    }

    /// Stops the timer now and returns the recorded duration in seconds.
    pub fn finish(mut self) -> f64 {
        self.record()
    }

    fn record(&mut self) -> f64 {
        let elapsed = self.stopwatch.elapsed_secs();
        if let Some(channel) = self.channel.take() {
            self.sink.record_sample(&channel, elapsed);
        }
        elapsed
    }
}

impl<S: SampleSink + ?Sized> Drop for ScopedSampleTimer<'_, S> {
    fn drop(&mut self) {
        if self.channel.is_some() {
            self.record();
        }
    }
}
