//! Frame timing for the game loop.
//!
//! [`StepTimer`] decides how many update steps run on each tick. In the
//! default variable-timestep mode every tick runs exactly one update with
//! the real frame delta. In fixed-timestep mode the delta accumulates and
//! one update runs per whole target step, so a slow frame may run several
//! updates and a fast one none.
//!
//! ```
//! use std::time::Duration;
//! use playground::StepTimer;
//!
//! let mut timer = StepTimer::new();
//! timer.set_fixed_time_step(true);
//! timer.set_target_elapsed_seconds(1.0 / 60.0);
//!
//! let mut updates = 0;
//! timer.tick_with(Duration::from_secs_f64(2.5 / 60.0), |_| updates += 1);
//! assert_eq!(updates, 2);
//! ```

use std::time::{Duration, Instant};

/// Deltas this close to the fixed target are snapped to it.
const SNAP_TOLERANCE: Duration = Duration::from_micros(250);

const ONE_SECOND: Duration = Duration::from_secs(1);

/// Longest delta a single tick will account for.
const MAX_DELTA: Duration = Duration::from_millis(100);

/// Variable or fixed timestep frame timer.
#[derive(Clone, Debug)]
pub struct StepTimer {
    last_tick: Instant,

    elapsed: Duration,
    total: Duration,
    left_over: Duration,

    frame_count: u64,
    frames_per_second: u32,
    frames_this_second: u32,
    second_counter: Duration,

    fixed_time_step: bool,
    target_elapsed: Duration,
}

impl Default for StepTimer {
    fn default() -> Self {
        Self::new()
    }
}

impl StepTimer {
    pub fn new() -> Self {
        Self {
            last_tick: Instant::now(),
            elapsed: Duration::ZERO,
            total: Duration::ZERO,
            left_over: Duration::ZERO,
            frame_count: 0,
            frames_per_second: 0,
            frames_this_second: 0,
            second_counter: Duration::ZERO,
            fixed_time_step: false,
            target_elapsed: Duration::from_nanos(16_666_667),
        }
    }

    /// Seconds covered by the most recent update.
    pub fn elapsed_seconds(&self) -> f64 {
        self.elapsed.as_secs_f64()
    }

    /// Seconds covered by all updates since the timer started.
    pub fn total_seconds(&self) -> f64 {
        self.total.as_secs_f64()
    }

    /// Number of updates run since the timer started.
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Ticks that ran at least one update during the last full second.
    pub fn frames_per_second(&self) -> u32 {
        self.frames_per_second
    }

    pub fn is_fixed_time_step(&self) -> bool {
        self.fixed_time_step
    }

    pub fn set_fixed_time_step(&mut self, fixed: bool) {
        self.fixed_time_step = fixed;
    }

    pub fn target_elapsed_seconds(&self) -> f64 {
        self.target_elapsed.as_secs_f64()
    }

    /// Set the fixed step length and report whether it was accepted.
    ///
    /// Non-positive or non-finite values leave the current target in place.
    pub fn set_target_elapsed_seconds(&mut self, seconds: f64) -> bool {
        match Duration::try_from_secs_f64(seconds) {
            Ok(target) if !target.is_zero() => {
                self.target_elapsed = target;
                true
            }
            _ => {
                log::warn!("Ignoring invalid target step of {} seconds", seconds);
                false
            }
        }
    }

    /// Forget the time since the last tick, e.g. after the app was suspended.
    pub fn reset_elapsed_time(&mut self) {
        self.last_tick = Instant::now();
        self.left_over = Duration::ZERO;
        self.frames_per_second = 0;
        self.frames_this_second = 0;
        self.second_counter = Duration::ZERO;
    }

    /// Measure the real time since the previous tick and run updates for it.
    pub fn tick(&mut self, update: impl FnMut(&StepTimer)) {
        let now = Instant::now();
        let delta = now.duration_since(self.last_tick);
        self.last_tick = now;
        self.tick_with(delta, update);
    }

    /// Advance by `delta` and run as many updates as the current mode allows.
    pub fn tick_with(&mut self, delta: Duration, mut update: impl FnMut(&StepTimer)) {
        self.second_counter += delta;
        let mut delta = delta.min(MAX_DELTA);
        let last_frame_count = self.frame_count;

        if self.fixed_time_step {
            if delta.abs_diff(self.target_elapsed) < SNAP_TOLERANCE {
                delta = self.target_elapsed;
            }
            self.left_over += delta;

            while self.left_over >= self.target_elapsed {
                self.elapsed = self.target_elapsed;
                self.total += self.target_elapsed;
                self.left_over -= self.target_elapsed;
                self.frame_count += 1;
                update(self);
            }
        } else {
            self.elapsed = delta;
            self.total += delta;
            self.left_over = Duration::ZERO;
            self.frame_count += 1;
            update(self);
        }

        if self.frame_count != last_frame_count {
            self.frames_this_second += 1;
        }

        if self.second_counter >= ONE_SECOND {
            self.frames_per_second = self.frames_this_second;
            self.frames_this_second = 0;
            while self.second_counter >= ONE_SECOND {
                self.second_counter -= ONE_SECOND;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn variable_step_runs_one_update_per_tick() {
        let mut timer = StepTimer::new();
        let mut seen = Vec::new();
        for _ in 0..3 {
            timer.tick_with(ms(20), |t| seen.push(t.elapsed_seconds()));
        }
        assert_eq!(seen.len(), 3);
        assert!(seen.iter().all(|&s| (s - 0.02).abs() < 1e-6));
        assert_eq!(timer.frame_count(), 3);
        assert!((timer.total_seconds() - 0.06).abs() < 1e-6);
    }

    #[test]
    fn variable_step_updates_even_on_zero_delta() {
        let mut timer = StepTimer::new();
        let mut updates = 0;
        timer.tick_with(Duration::ZERO, |_| updates += 1);
        assert_eq!(updates, 1);
        assert_eq!(timer.frame_count(), 1);
    }

    #[test]
    fn fixed_step_accumulates() {
        let mut timer = StepTimer::new();
        timer.set_fixed_time_step(true);
        timer.set_target_elapsed_seconds(0.01);

        let mut updates = 0;
        timer.tick_with(ms(5), |_| updates += 1);
        assert_eq!(updates, 0);

        timer.tick_with(ms(26), |_| updates += 1);
        assert_eq!(updates, 3);
        assert!((timer.elapsed_seconds() - 0.01).abs() < 1e-6);
        assert!((timer.total_seconds() - 0.03).abs() < 1e-6);
    }

    #[test]
    fn fixed_step_snaps_near_target() {
        let mut timer = StepTimer::new();
        timer.set_fixed_time_step(true);
        timer.set_target_elapsed_seconds(0.01);

        let mut updates = 0;
        // Slightly short of the target each tick; snapping keeps one update per tick.
        for _ in 0..100 {
            timer.tick_with(Duration::from_micros(9_900), |_| updates += 1);
        }
        assert_eq!(updates, 100);
    }

    #[test]
    fn deltas_are_clamped() {
        let mut timer = StepTimer::new();
        timer.tick_with(Duration::from_secs(5), |_| {});
        assert!((timer.elapsed_seconds() - 0.1).abs() < 1e-6);
        assert!((timer.total_seconds() - 0.1).abs() < 1e-6);
    }

    #[test]
    fn long_stall_rolls_the_fps_counter_over() {
        let mut timer = StepTimer::new();
        timer.tick_with(Duration::from_secs(2), |_| {});
        // The update saw a clamped delta, but a full second has passed on the clock.
        assert!((timer.elapsed_seconds() - 0.1).abs() < 1e-6);
        assert_eq!(timer.frames_per_second(), 1);
    }

    #[test]
    fn reset_discards_left_over() {
        let mut timer = StepTimer::new();
        timer.set_fixed_time_step(true);
        timer.set_target_elapsed_seconds(0.01);
        timer.tick_with(ms(9), |_| {});
        timer.reset_elapsed_time();

        let mut updates = 0;
        timer.tick_with(ms(5), |_| updates += 1);
        assert_eq!(updates, 0);
    }

    #[test]
    fn invalid_target_is_ignored() {
        let mut timer = StepTimer::new();
        assert!(timer.set_target_elapsed_seconds(0.02));
        assert!(!timer.set_target_elapsed_seconds(0.0));
        assert!(!timer.set_target_elapsed_seconds(-1.0));
        assert!(!timer.set_target_elapsed_seconds(f64::NAN));
        assert!(!timer.set_target_elapsed_seconds(f64::INFINITY));
        assert!((timer.target_elapsed_seconds() - 0.02).abs() < 1e-6);
    }

    #[test]
    fn frames_per_second_counts_ticks_with_updates() {
        let mut timer = StepTimer::new();
        for _ in 0..50 {
            timer.tick_with(ms(20), |_| {});
        }
        assert_eq!(timer.frames_per_second(), 50);
    }
}
