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

//! Performance reports.
//!
//! A [`PerformanceReport`] summarises the frame, update, draw and subsystem
//! series, ranks subsystems by cost, and runs a small set of heuristics that
//! point at the most likely bottleneck.

use crate::series::{SampleSeries, SeriesStats};
use serde::Serialize;
use std::fmt;

/// Frame time matching 60 FPS.
pub const TARGET_FRAME_TIME: f64 = 1.0 / 60.0;
/// Share of the average frame above which a single subsystem is flagged.
const DOMINANT_SUBSYSTEM_SHARE: f64 = 0.30;
/// Ratio between update and draw averages above which the passes are unbalanced.
const PHASE_IMBALANCE_RATIO: f64 = 2.0;
/// Ratio between the worst and the average frame indicating stutter.
const FRAME_SPIKE_RATIO: f64 = 2.0;

/// One of the two halves of a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FramePhase {
    /// The simulation pass.
    Update,
    /// The rendering pass.
    Draw,
}

impl fmt::Display for FramePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FramePhase::Update => f.write_str("update"),
            FramePhase::Draw => f.write_str("draw"),
        }
    }
}

/// A finding produced by the report heuristics.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Recommendation {
    /// The average frame is slower than 60 FPS.
    LowFrameRate {
        /// Average frame time, in seconds.
        average_frame: f64,
        /// Frames per second implied by the average.
        average_fps: f64,
    },
    /// One subsystem eats a large share of every frame.
    DominantSubsystem {
        /// Channel name of the subsystem.
        name: String,
        /// Its average duration, in seconds.
        average: f64,
        /// Its share of the average frame time.
        share: f64,
    },
    /// One pass takes more than twice as long as the other.
    PhaseImbalance {
        /// The slower pass.
        heavier: FramePhase,
        /// Average update duration, in seconds.
        update_avg: f64,
        /// Average draw duration, in seconds.
        draw_avg: f64,
    },
    /// The worst frame is more than twice the average, usually a collection pause.
    FrameTimeSpikes {
        /// Average frame time, in seconds.
        average_frame: f64,
        /// Worst frame time, in seconds.
        max_frame: f64,
    },
}

impl fmt::Display for Recommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Recommendation::LowFrameRate {
                average_frame,
                average_fps,
            } => write!(
                f,
                "Average frame {:.2}ms ({average_fps:.1} FPS) is below the 60 FPS target",
                average_frame * 1000.0
            ),
            Recommendation::DominantSubsystem {
                name,
                average,
                share,
            } => write!(
                f,
                "'{name}' takes {:.2}ms, {:.0}% of the average frame; optimize it first",
                average * 1000.0,
                share * 100.0
            ),
            Recommendation::PhaseImbalance {
                heavier,
                update_avg,
                draw_avg,
            } => write!(
                f,
                "The {heavier} pass dominates (update {:.2}ms vs draw {:.2}ms)",
                update_avg * 1000.0,
                draw_avg * 1000.0
            ),
            Recommendation::FrameTimeSpikes {
                average_frame,
                max_frame,
            } => write!(
                f,
                "Worst frame {:.2}ms is over twice the average {:.2}ms; look for allocation or collection pauses",
                max_frame * 1000.0,
                average_frame * 1000.0
            ),
        }
    }
}

/// Timing summary of one subsystem channel.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubsystemTiming {
    /// Channel name.
    pub name: String,
    /// Aggregates of the channel's samples.
    pub stats: SeriesStats,
}

/// Summary of a monitoring session.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PerformanceReport {
    /// Seconds between the start of monitoring and the report.
    pub monitored_secs: f64,
    /// Frame time aggregates, absent if no frame was recorded.
    pub frame: Option<SeriesStats>,
    /// Update pass aggregates.
    pub update: Option<SeriesStats>,
    /// Draw pass aggregates.
    pub draw: Option<SeriesStats>,
    /// Non-empty subsystem channels, most expensive first.
    pub subsystems: Vec<SubsystemTiming>,
    /// Heuristic findings.
    pub recommendations: Vec<Recommendation>,
}

fn non_empty(series: &SampleSeries) -> Option<SeriesStats> {
    (!series.is_empty()).then(|| series.stats())
}

impl PerformanceReport {
    /// Builds a report from raw series. Empty series are skipped.
    pub fn from_series<'a, I>(
        frame: &SampleSeries,
        update: &SampleSeries,
        draw: &SampleSeries,
        subsystems: I,
    ) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a SampleSeries)>,
    {
        let mut subsystems: Vec<SubsystemTiming> = subsystems
            .into_iter()
            .filter(|(_, series)| !series.is_empty())
            .map(|(name, series)| SubsystemTiming {
                name: name.to_string(),
                stats: series.stats(),
            })
            .collect();
        subsystems.sort_by(|a, b| {
            b.stats
                .avg
                .total_cmp(&a.stats.avg)
                .then_with(|| a.name.cmp(&b.name))
        });

        let mut report = Self {
            monitored_secs: 0.0,
            frame: non_empty(frame),
            update: non_empty(update),
            draw: non_empty(draw),
            subsystems,
            recommendations: Vec::new(),
        };
        report.recommendations = report.analyze();
        report
    }

    /// Sets the monitored duration.
    pub fn with_monitored_secs(mut self, seconds: f64) -> Self {
        self.monitored_secs = seconds;
        self
    }

    /// Frames per second implied by the average frame time, or 0.0 without frames.
    pub fn average_fps(&self) -> f64 {
        match self.frame {
            Some(frame) if frame.avg > 0.0 => 1.0 / frame.avg,
            _ => 0.0,
        }
    }

    /// The subsystem with the highest average duration.
    pub fn heaviest_subsystem(&self) -> Option<&SubsystemTiming> {
        self.subsystems.first()
    }

    fn analyze(&self) -> Vec<Recommendation> {
        let mut findings = Vec::new();

        if let Some(frame) = self.frame {
            if frame.avg > TARGET_FRAME_TIME {
                findings.push(Recommendation::LowFrameRate {
                    average_frame: frame.avg,
                    average_fps: 1.0 / frame.avg,
                });
            }

            if let Some(heaviest) = self.heaviest_subsystem() {
                if frame.avg > 0.0 && heaviest.stats.avg > DOMINANT_SUBSYSTEM_SHARE * frame.avg {
                    findings.push(Recommendation::DominantSubsystem {
                        name: heaviest.name.clone(),
                        average: heaviest.stats.avg,
                        share: heaviest.stats.avg / frame.avg,
                    });
                }
            }

            if frame.max > FRAME_SPIKE_RATIO * frame.avg {
                findings.push(Recommendation::FrameTimeSpikes {
                    average_frame: frame.avg,
                    max_frame: frame.max,
                });
            }
        }

        if let (Some(update), Some(draw)) = (self.update, self.draw) {
            let heavier = if update.avg > PHASE_IMBALANCE_RATIO * draw.avg {
                Some(FramePhase::Update)
            } else if draw.avg > PHASE_IMBALANCE_RATIO * update.avg {
                Some(FramePhase::Draw)
            } else {
                None
            };
            if let Some(heavier) = heavier {
                findings.push(Recommendation::PhaseImbalance {
                    heavier,
                    update_avg: update.avg,
                    draw_avg: draw.avg,
                });
            }
        }

        findings
    }

    /// Serializes the report as pretty-printed JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

fn write_stats(f: &mut fmt::Formatter<'_>, label: &str, stats: &SeriesStats) -> fmt::Result {
    writeln!(
        f,
        "  {label:<24} min {:>8.3}ms  avg {:>8.3}ms  max {:>8.3}ms  ({} samples)",
        stats.min * 1000.0,
        stats.avg * 1000.0,
        stats.max * 1000.0,
        stats.count
    )
}

impl fmt::Display for PerformanceReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Performance Report ({:.2}s) ===", self.monitored_secs)?;
        if let Some(frame) = &self.frame {
            write_stats(f, "frame", frame)?;
            writeln!(f, "  average FPS: {:.1}", self.average_fps())?;
        }
        if let Some(update) = &self.update {
            write_stats(f, "update", update)?;
        }
        if let Some(draw) = &self.draw {
            write_stats(f, "draw", draw)?;
        }
        if !self.subsystems.is_empty() {
            writeln!(f, "Subsystems (most expensive first):")?;
            for subsystem in &self.subsystems {
                write_stats(f, &subsystem.name, &subsystem.stats)?;
            }
        }
        if self.recommendations.is_empty() {
            writeln!(f, "No recommendations.")?;
        } else {
            writeln!(f, "Recommendations:")?;
            for recommendation in &self.recommendations {
                writeln!(f, "  - {recommendation}")?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn series(values: &[f64]) -> SampleSeries {
        let mut series = SampleSeries::new(60);
        for v in values {
            series.push(*v);
        }
        series
    }

    #[test]
    fn test_report_statistics_match_hand_computed_values() {
        let frame = series(&[0.010, 0.020, 0.015, 0.015]);
        let update = series(&[0.004, 0.006]);
        let draw = series(&[0.005]);
        let ai = series(&[0.001, 0.003]);
        let paths = series(&[0.004, 0.004, 0.004]);
        let idle = SampleSeries::new(60);

        let report = PerformanceReport::from_series(
            &frame,
            &update,
            &draw,
            [("ai", &ai), ("paths", &paths), ("idle", &idle)],
        );

        let f = report.frame.unwrap();
        assert_relative_eq!(f.min, 0.010);
        assert_relative_eq!(f.avg, 0.015);
        assert_relative_eq!(f.max, 0.020);
        assert_eq!(f.count, 4);

        let u = report.update.unwrap();
        assert_relative_eq!(u.avg, 0.005);
        assert_relative_eq!(report.draw.unwrap().max, 0.005);

        let ranking: Vec<&str> = report.subsystems.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(ranking, vec!["paths", "ai"]);
        assert_relative_eq!(report.subsystems[1].stats.avg, 0.002);
        assert_relative_eq!(report.average_fps(), 1.0 / 0.015);
    }

    #[test]
    fn test_healthy_frames_produce_no_recommendations() {
        let report = PerformanceReport::from_series(
            &series(&[0.010, 0.011, 0.012]),
            &series(&[0.004]),
            &series(&[0.005]),
            [("ai", &series(&[0.001]))],
        );
        assert!(report.recommendations.is_empty());
    }

    #[test]
    fn test_low_frame_rate_and_dominant_subsystem() {
        let frame = series(&[0.030, 0.030]);
        let heavy = series(&[0.012]);
        let light = series(&[0.001]);
        let report = PerformanceReport::from_series(
            &frame,
            &SampleSeries::new(1),
            &SampleSeries::new(1),
            [("light", &light), ("heavy", &heavy)],
        );

        assert!(report.recommendations.iter().any(|r| matches!(
            r,
            Recommendation::LowFrameRate { average_fps, .. } if (average_fps - 33.333).abs() < 0.01
        )));
        assert!(report.recommendations.iter().any(|r| matches!(
            r,
            Recommendation::DominantSubsystem { name, share, .. } if name == "heavy" && (share - 0.4).abs() < 1e-9
        )));
    }

    #[test]
    fn test_phase_imbalance() {
        let report = PerformanceReport::from_series(
            &SampleSeries::new(1),
            &series(&[0.002]),
            &series(&[0.009]),
            [],
        );
        assert_eq!(
            report.recommendations,
            vec![Recommendation::PhaseImbalance {
                heavier: FramePhase::Draw,
                update_avg: 0.002,
                draw_avg: 0.009,
            }]
        );
    }

    #[test]
    fn test_frame_spikes() {
        let report = PerformanceReport::from_series(
            &series(&[0.005, 0.005, 0.005, 0.025]),
            &SampleSeries::new(1),
            &SampleSeries::new(1),
            [],
        );
        assert!(report
            .recommendations
            .iter()
            .any(|r| matches!(r, Recommendation::FrameTimeSpikes { .. })));
    }

    #[test]
    fn test_empty_report() {
        let empty = SampleSeries::new(1);
        let report = PerformanceReport::from_series(&empty, &empty, &empty, []);
        assert!(report.frame.is_none());
        assert_eq!(report.average_fps(), 0.0);
        assert!(report.recommendations.is_empty());
        assert!(report.to_string().contains("No recommendations."));
    }

    #[test]
    fn test_report_serializes() {
        let report = PerformanceReport::from_series(
            &series(&[0.040]),
            &SampleSeries::new(1),
            &SampleSeries::new(1),
            [],
        );
        let json = report.to_json().unwrap();
        assert!(json.contains("\"kind\": \"low_frame_rate\""));
    }
}
