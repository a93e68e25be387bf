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

//! # Gambit Telemetry
//!
//! Rolling timing samples per channel, the performance report built from
//! them, an RAII timer that feeds samples in, and the logging bootstrap.

#![warn(missing_docs)]

pub mod logging;
pub mod recorder;
pub mod report;
pub mod series;
pub mod timer;

pub use recorder::{MetricsRecorder, DEFAULT_MONITORING_DURATION, DEFAULT_SAMPLE_CAPACITY};
pub use report::{FramePhase, PerformanceReport, Recommendation, SubsystemTiming};
pub use series::{SampleSeries, SeriesStats};
pub use timer::{SampleSink, ScopedSampleTimer};
