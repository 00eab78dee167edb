// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Funnel Simulation Engine - Simulation Clock
//
// Three periodic activities share one clock: the per-frame state advance, the
// batched spawn timer and the stats snapshot timer. All of them are explicit
// values that are started and cancelled here; nothing reschedules itself.

/// Real-time spawn period at speed 1.
pub const SPAWN_INTERVAL_MS: f64 = 300.0;
/// Real-time stats snapshot period (10Hz).
pub const STATS_INTERVAL_MS: f64 = 100.0;
/// Upper bound on a single real frame delta.
pub const MAX_FRAME_DELTA_MS: f64 = 100.0;

// ─── IntervalTimer ───────────────────────────────────────────────────────────

/// Fixed-period timer fed with elapsed real time.
#[derive(Debug, Clone, PartialEq)]
pub struct IntervalTimer {
    period_ms: f64,
    elapsed_ms: f64,
    active: bool,
}

impl IntervalTimer {
    pub fn new(period_ms: f64) -> Self {
        Self { period_ms, elapsed_ms: 0.0, active: false }
    }

    pub fn start(&mut self) {
        self.elapsed_ms = 0.0;
        self.active = true;
    }

    pub fn cancel(&mut self) {
        self.elapsed_ms = 0.0;
        self.active = false;
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn period_ms(&self) -> f64 {
        self.period_ms
    }

    /// Takes effect from the next firing onward.
    pub fn set_period(&mut self, period_ms: f64) {
        self.period_ms = period_ms.max(1.0);
    }

    pub fn accumulate(&mut self, dt_ms: f64) {
        if self.active {
            self.elapsed_ms += dt_ms;
        }
    }

    /// Consume one period if due.
    pub fn try_fire(&mut self) -> bool {
        if self.active && self.elapsed_ms >= self.period_ms {
            self.elapsed_ms -= self.period_ms;
            true
        } else {
            false
        }
    }
}

// ─── FrameLoop ───────────────────────────────────────────────────────────────

/// The per-frame driver. While paused it keeps running but yields no delta.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameLoop {
    active: bool,
    frames: u64,
}

impl FrameLoop {
    pub fn start(&mut self) {
        self.active = true;
        self.frames = 0;
    }

    pub fn cancel(&mut self) {
        self.active = false;
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }
}

// ─── Clock ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockState {
    Idle,
    Running,
    Paused,
    Stopped,
}

/// Work due after feeding one real frame delta into the clock.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FramePlan {
    /// Speed-scaled delta for the state machine; `None` when frozen.
    pub sim_dt: Option<f64>,
    /// Spawn batches that are due and not gated by pause.
    pub spawn_batches: u32,
    /// Stats snapshots due; the caller only needs to run one.
    pub stats_due: bool,
}

#[derive(Debug, Clone)]
pub struct SimulationClock {
    state: ClockState,
    speed: u32,
    frame: FrameLoop,
    spawn_timer: IntervalTimer,
    stats_timer: IntervalTimer,
}

impl Default for SimulationClock {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulationClock {
    pub fn new() -> Self {
        Self {
            state: ClockState::Idle,
            speed: 1,
            frame: FrameLoop::default(),
            spawn_timer: IntervalTimer::new(SPAWN_INTERVAL_MS),
            stats_timer: IntervalTimer::new(STATS_INTERVAL_MS),
        }
    }

    pub fn state(&self) -> ClockState {
        self.state
    }

    pub fn speed(&self) -> u32 {
        self.speed
    }

    pub fn is_running(&self) -> bool {
        matches!(self.state, ClockState::Running | ClockState::Paused)
    }

    pub fn is_paused(&self) -> bool {
        self.state == ClockState::Paused
    }

    pub fn frames(&self) -> u64 {
        self.frame.frames()
    }

    pub fn spawning_active(&self) -> bool {
        self.spawn_timer.is_active()
    }

    /// Start all three activities from scratch.
    pub fn start(&mut self, speed: u32) {
        self.speed = speed.max(1);
        self.spawn_timer.set_period(spawn_period(self.speed));
        self.spawn_timer.start();
        self.stats_timer.start();
        self.frame.start();
        self.state = ClockState::Running;
    }

    /// Cancel everything. Returns false if there was nothing to stop.
    pub fn stop(&mut self) -> bool {
        if !self.is_running() {
            return false;
        }
        self.spawn_timer.cancel();
        self.stats_timer.cancel();
        self.frame.cancel();
        self.state = ClockState::Stopped;
        true
    }

    pub fn toggle_pause(&mut self) -> bool {
        self.state = match self.state {
            ClockState::Running => ClockState::Paused,
            ClockState::Paused => ClockState::Running,
            other => other,
        };
        self.is_paused()
    }

    pub fn set_speed(&mut self, speed: u32) {
        self.speed = speed.max(1);
    }

    /// The spawn budget is exhausted; the spawn timer cancels itself.
    pub fn finish_spawning(&mut self) {
        self.spawn_timer.cancel();
    }

    /// Feed one real frame delta and report the work that is now due.
    pub fn tick(&mut self, real_dt_ms: f64) -> FramePlan {
        let mut plan = FramePlan::default();
        if !self.is_running() {
            return plan;
        }
        // A non-finite delta would poison every accumulator.
        let dt = if real_dt_ms.is_finite() {
            real_dt_ms.clamp(0.0, MAX_FRAME_DELTA_MS)
        } else {
            0.0
        };
        let paused = self.is_paused();

        if self.frame.is_active() {
            self.frame.frames += 1;
            if !paused {
                plan.sim_dt = Some(dt * self.speed as f64);
            }
        }

        self.spawn_timer.accumulate(dt);
        while self.spawn_timer.try_fire() {
            if !paused {
                plan.spawn_batches += 1;
            }
            self.spawn_timer.set_period(spawn_period(self.speed));
        }

        self.stats_timer.accumulate(dt);
        while self.stats_timer.try_fire() {
            plan.stats_due = true;
        }

        plan
    }
}

fn spawn_period(speed: u32) -> f64 {
    SPAWN_INTERVAL_MS / speed.max(1) as f64
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_idle_clock_does_nothing() {
        let mut clock = SimulationClock::new();
        assert_eq!(clock.tick(16.0), FramePlan::default());
        assert!(!clock.is_running());
    }

    #[test]
    fn test_frame_delta_scaled_by_speed() {
        let mut clock = SimulationClock::new();
        clock.start(4);
        let plan = clock.tick(16.0);
        assert_eq!(plan.sim_dt, Some(64.0));
    }

    #[test]
    fn test_frame_delta_clamped() {
        let mut clock = SimulationClock::new();
        clock.start(1);
        let plan = clock.tick(5_000.0);
        assert_eq!(plan.sim_dt, Some(MAX_FRAME_DELTA_MS));
    }

    #[test]
    fn test_non_finite_delta_is_ignored() {
        let mut clock = SimulationClock::new();
        clock.start(1);
        assert_eq!(clock.tick(f64::NAN).sim_dt, Some(0.0));
        assert_eq!(clock.tick(f64::INFINITY).sim_dt, Some(0.0));
        assert_eq!(clock.tick(100.0).spawn_batches, 0);
        assert_eq!(clock.tick(100.0).spawn_batches, 0);
        assert_eq!(clock.tick(100.0).spawn_batches, 1);
        assert!(clock.tick(100.0).stats_due);
    }

    #[test]
    fn test_spawn_period_follows_speed() {
        let mut clock = SimulationClock::new();
        clock.start(2);
        // 150ms period at speed 2
        assert_eq!(clock.tick(100.0).spawn_batches, 0);
        assert_eq!(clock.tick(50.0).spawn_batches, 1);
        assert_eq!(clock.tick(100.0).spawn_batches, 0);
        assert_eq!(clock.tick(50.0).spawn_batches, 1);
    }

    #[test]
    fn test_set_speed_applies_after_next_firing() {
        let mut clock = SimulationClock::new();
        clock.start(1);
        clock.set_speed(4);
        assert_eq!(clock.tick(16.0).sim_dt, Some(64.0));
        // Current period is still 300ms
        assert_eq!(clock.tick(100.0).spawn_batches, 0);
        assert_eq!(clock.tick(100.0).spawn_batches, 0);
        assert_eq!(clock.tick(84.0).spawn_batches, 1);
        // Now 75ms
        assert_eq!(clock.tick(75.0).spawn_batches, 1);
    }

    #[test]
    fn test_stats_at_10hz() {
        let mut clock = SimulationClock::new();
        clock.start(1);
        let due = (0..10).filter(|_| clock.tick(50.0).stats_due).count();
        assert_eq!(due, 5);
    }

    #[test]
    fn test_pause_freezes_frames_and_gates_spawning() {
        let mut clock = SimulationClock::new();
        clock.start(1);
        assert!(clock.toggle_pause());
        let plan = clock.tick(100.0);
        assert_eq!(plan.sim_dt, None);
        let plan = clock.tick(100.0);
        assert_eq!(plan.sim_dt, None);
        let plan = clock.tick(100.0);
        assert_eq!(plan.spawn_batches, 0);
        // Timers were not cancelled
        assert!(clock.spawning_active());
        assert!(plan.stats_due);
        assert!(!clock.toggle_pause());
        assert_eq!(clock.tick(16.0).sim_dt, Some(16.0));
    }

    #[test]
    fn test_stop_is_idempotent() {
        let mut clock = SimulationClock::new();
        assert!(!clock.stop());
        clock.start(1);
        assert!(clock.stop());
        assert!(!clock.stop());
        assert_eq!(clock.state(), ClockState::Stopped);
        assert_eq!(clock.tick(500.0), FramePlan::default());
    }

    #[test]
    fn test_finish_spawning_cancels_only_spawn_timer() {
        let mut clock = SimulationClock::new();
        clock.start(1);
        clock.finish_spawning();
        let plan = clock.tick(100.0);
        assert_eq!(plan.spawn_batches, 0);
        assert!(plan.sim_dt.is_some());
        assert!(plan.stats_due);
    }

    #[test]
    fn test_interval_timer_inactive_until_started() {
        let mut t = IntervalTimer::new(10.0);
        t.accumulate(100.0);
        assert!(!t.try_fire());
        t.start();
        t.accumulate(25.0);
        assert!(t.try_fire());
        assert!(t.try_fire());
        assert!(!t.try_fire());
    }
}
