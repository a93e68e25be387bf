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

use crate::clock::Clock;

/// Measures elapsed time against an injected [`Clock`].
#[derive(Clone, Copy)]
pub struct Stopwatch<'a> {
    clock: &'a dyn Clock,
    start_time: f64,
}

impl<'a> Stopwatch<'a> {
    /// Creates a new Stopwatch and starts it immediately.
    /// ## Arguments
    /// * `clock` - The time source the stopwatch reads.
    /// ## Returns
    /// A running Stopwatch.
    #[inline]
    pub fn start(clock: &'a dyn Clock) -> Self {
        Self {
            clock,
            start_time: clock.now(),
        }
    }

    /// Returns the clock reading taken when the stopwatch was started.
    #[inline]
    pub fn started_at(&self) -> f64 {
        self.start_time
    }

    /// Returns the elapsed time since the stopwatch was started, in seconds.
    /// ## Returns
    /// The elapsed seconds, never negative even if the clock was set backwards.
    #[inline]
    pub fn elapsed_secs(&self) -> f64 {
        (self.clock.now() - self.start_time).max(0.0)
    }

    /// Returns the elapsed time since the stopwatch was started, in milliseconds.
    #[inline]
    pub fn elapsed_ms(&self) -> f64 {
        self.elapsed_secs() * 1000.0
    }

    /// Restarts the stopwatch.
    /// ## Returns
    /// The seconds elapsed before the restart.
    pub fn lap(&mut self) -> f64 {
        let now = self.clock.now();
        let elapsed = (now - self.start_time).max(0.0);
        self.start_time = now;
        elapsed
    }
}

impl std::fmt::Debug for Stopwatch<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Stopwatch")
            .field("start_time", &self.start_time)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;

    /// The stopwatch reads zero until the clock moves.
    #[test]
    fn stopwatch_starts_at_zero() {
        let clock = ManualClock::new(3.0);
        let watch = Stopwatch::start(&clock);
        assert_eq!(watch.started_at(), 3.0);
        assert_eq!(watch.elapsed_secs(), 0.0);
    }

    #[test]
    fn stopwatch_tracks_clock_advances() {
        let clock = ManualClock::new(0.0);
        let watch = Stopwatch::start(&clock);
        clock.advance(0.25);
        assert_eq!(watch.elapsed_secs(), 0.25);
        assert_eq!(watch.elapsed_ms(), 250.0);
    }

    #[test]
    fn stopwatch_lap_restarts() {
        let clock = ManualClock::new(0.0);
        let mut watch = Stopwatch::start(&clock);
        clock.advance(1.0);
        assert_eq!(watch.lap(), 1.0);
        clock.advance(0.5);
        assert_eq!(watch.elapsed_secs(), 0.5);
    }

    #[test]
    fn stopwatch_never_goes_negative() {
        let clock = ManualClock::new(10.0);
        let watch = Stopwatch::start(&clock);
        clock.set(5.0);
        assert_eq!(watch.elapsed_secs(), 0.0);
    }
}
