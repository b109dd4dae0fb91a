//! Simulation clock.
//!
//! The clock decides whether the world advances and by how much. The host
//! loop (window frame callback, test harness, headless runner) reports real
//! time with [`Clock::advance`] and receives the number of fixed steps to run.
//!
//! # Example
//!
//! ```ignore
//! use physlab::clock::Clock;
//!
//! let mut clock = Clock::new();
//! clock.run();
//!
//! // In your frame callback:
//! for _ in 0..clock.advance(frame_secs) {
//!     world.step(clock.delta_ms());
//! }
//! ```

use crate::world::DEFAULT_DELTA_MS;

/// Most steps a single `advance` call may request; keeps a stalled frame
/// from triggering a burst of catch-up steps.
pub const MAX_STEPS_PER_ADVANCE: u32 = 5;

/// Whether the clock is ticking.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ClockState {
    #[default]
    Stopped,
    Running,
}

/// Fixed-step clock driving the physics world.
#[derive(Debug, Clone)]
pub struct Clock {
    state: ClockState,
    /// Step length in milliseconds.
    delta_ms: f32,
    /// Time scale multiplier (1.0 = normal speed).
    time_scale: f32,
    /// Real time not yet consumed by a step, in milliseconds.
    accumulator: f32,
    /// Steps taken since the last reset.
    tick_count: u64,
    /// Simulated time since the last reset, in milliseconds.
    elapsed_ms: f64,
}

impl Clock {
    /// A stopped clock stepping at 60 Hz.
    pub fn new() -> Self {
        Self {
            state: ClockState::Stopped,
            delta_ms: DEFAULT_DELTA_MS,
            time_scale: 1.0,
            accumulator: 0.0,
            tick_count: 0,
            elapsed_ms: 0.0,
        }
    }

    #[inline]
    pub fn state(&self) -> ClockState {
        self.state
    }

    #[inline]
    pub fn is_running(&self) -> bool {
        self.state == ClockState::Running
    }

    /// Start ticking. Has no effect when already running.
    pub fn run(&mut self) {
        self.state = ClockState::Running;
    }

    /// Stop ticking and drop any pending real time.
    pub fn stop(&mut self) {
        self.state = ClockState::Stopped;
        self.accumulator = 0.0;
    }

    /// Step length in milliseconds.
    #[inline]
    pub fn delta_ms(&self) -> f32 {
        self.delta_ms
    }

    #[inline]
    pub fn time_scale(&self) -> f32 {
        self.time_scale
    }

    /// How much simulated time one second of real time is worth.
    ///
    /// Only [`advance`](Self::advance) looks at the scale; the step length
    /// stays fixed, so a larger scale means more steps per frame. Anything
    /// below zero is stored as zero, which freezes the scene without
    /// stopping the clock.
    pub fn set_time_scale(&mut self, scale: f32) {
        self.time_scale = scale.max(0.0);
    }

    /// Steps taken since the last reset.
    #[inline]
    pub fn ticks(&self) -> u64 {
        self.tick_count
    }

    /// Simulated seconds since the last reset.
    #[inline]
    pub fn elapsed_secs(&self) -> f64 {
        self.elapsed_ms / 1000.0
    }

    /// Feed real elapsed time; returns how many fixed steps to run now.
    ///
    /// Returns 0 while stopped.
    pub fn advance(&mut self, real_secs: f32) -> u32 {
        if !self.is_running() || !real_secs.is_finite() || real_secs <= 0.0 {
            return 0;
        }
        self.accumulator += real_secs * 1000.0 * self.time_scale;
        let mut steps = 0;
        while self.accumulator >= self.delta_ms && steps < MAX_STEPS_PER_ADVANCE {
            self.accumulator -= self.delta_ms;
            steps += 1;
        }
        if steps == MAX_STEPS_PER_ADVANCE {
            self.accumulator = self.accumulator.min(self.delta_ms);
        }
        steps
    }

    /// Record that one step of `delta_ms` was taken.
    pub fn tick(&mut self, delta_ms: f32) {
        self.tick_count += 1;
        self.elapsed_ms += delta_ms as f64;
    }

    /// Zero the counters. Running state, delta and scale are kept.
    pub fn reset(&mut self) {
        self.accumulator = 0.0;
        self.tick_count = 0;
        self.elapsed_ms = 0.0;
    }
}

impl Default for Clock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clock_new() {
        let clock = Clock::new();
        assert_eq!(clock.state(), ClockState::Stopped);
        assert_eq!(clock.ticks(), 0);
        assert_eq!(clock.time_scale(), 1.0);
    }

    #[test]
    fn test_stopped_clock_does_not_advance() {
        let mut clock = Clock::new();
        assert_eq!(clock.advance(1.0), 0);
    }

    #[test]
    fn test_advance_fixed_steps() {
        let mut clock = Clock::new();
        clock.run();
        // Two and a half steps worth of time
        let steps = clock.advance(2.5 * DEFAULT_DELTA_MS / 1000.0);
        assert_eq!(steps, 2);
        // The leftover half step completes with the next half
        assert_eq!(clock.advance(0.5 * DEFAULT_DELTA_MS / 1000.0 + 1e-4), 1);
    }

    #[test]
    fn test_advance_is_capped() {
        let mut clock = Clock::new();
        clock.run();
        assert_eq!(clock.advance(10.0), MAX_STEPS_PER_ADVANCE);
        assert!(clock.advance(0.0) == 0);
    }

    #[test]
    fn test_stop_drops_pending_time() {
        let mut clock = Clock::new();
        clock.run();
        clock.advance(0.9 * DEFAULT_DELTA_MS / 1000.0);
        clock.stop();
        clock.run();
        assert_eq!(clock.advance(0.2 * DEFAULT_DELTA_MS / 1000.0), 0);
    }

    #[test]
    fn test_time_scale_changes_step_count() {
        let mut clock = Clock::new();
        clock.run();
        clock.set_time_scale(2.0);
        assert_eq!(clock.time_scale(), 2.0);
        assert_eq!(clock.advance(DEFAULT_DELTA_MS / 1000.0 + 1e-4), 2);

        clock.set_time_scale(-1.0);
        assert_eq!(clock.time_scale(), 0.0);
        assert_eq!(clock.advance(1.0), 0);
        assert!(clock.is_running());
    }

    #[test]
    fn test_tick_and_reset() {
        let mut clock = Clock::new();
        clock.run();
        clock.tick(10.0);
        clock.tick(10.0);
        assert_eq!(clock.ticks(), 2);
        assert!((clock.elapsed_secs() - 0.02).abs() < 1e-9);
        clock.reset();
        assert_eq!(clock.ticks(), 0);
        assert!(clock.is_running());
    }
}
