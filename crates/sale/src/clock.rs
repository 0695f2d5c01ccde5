//! # Phase Clock
//!
//! Recomputes the phase and the three countdown strings once per second
//! and writes them into the session. Every tick derives its output from the
//! current instant, so a delayed or skipped tick never makes a countdown
//! drift.
//!
//! In [`SaleMode::Schedule`] the clock also owns the quantity bound, taken
//! from the active phase's `max_mint`.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::config::SaleMode;
use crate::constants::CLOCK_TICK;
use crate::error::TaskError;
use crate::phase::{Phase, PhaseSchedule};
use crate::session::Session;
use crate::task::TaskSlot;

/// Source of the current instant.
pub trait TimeSource: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl TimeSource for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Settable clock for tests and dry runs.
#[derive(Debug)]
pub struct ManualClock(Mutex<DateTime<Utc>>);

impl ManualClock {
    #[must_use]
    pub fn new(at: DateTime<Utc>) -> Self {
        Self(Mutex::new(at))
    }

    pub fn set(&self, at: DateTime<Utc>) {
        *self.0.lock() = at;
    }

    pub fn advance(&self, by: chrono::Duration) {
        let mut now = self.0.lock();
        *now += by;
    }
}

impl TimeSource for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.0.lock()
    }
}

struct ClockCore {
    schedule: PhaseSchedule,
    session: Session,
    time: Arc<dyn TimeSource>,
    mode: SaleMode,
}

impl ClockCore {
    fn tick(&self) -> Phase {
        let now = self.time.now();
        let phase = self.schedule.phase_at(now);
        let countdowns = self.schedule.countdowns(now);

        let mut state = self.session.write();
        if state.phase != phase {
            info!(from = %state.phase, to = %phase, "phase changed");
        }
        state.phase = phase;
        state.countdowns = countdowns;
        if self.mode == SaleMode::Schedule {
            state.quantity.set_max_mint(phase.info().max_mint);
        }
        phase
    }
}

/// 1 Hz phase and countdown ticker.
pub struct PhaseClock {
    core: Arc<ClockCore>,
    task: TaskSlot,
}

impl PhaseClock {
    #[must_use]
    pub fn new(schedule: PhaseSchedule, session: Session, time: Arc<dyn TimeSource>, mode: SaleMode) -> Self {
        Self {
            core: Arc::new(ClockCore { schedule, session, time, mode }),
            task: TaskSlot::default(),
        }
    }

    /// Recomputes phase and countdowns now.
    pub fn tick(&self) -> Phase {
        self.core.tick()
    }

    pub fn is_running(&self) -> bool {
        self.task.is_running()
    }

    /// Ticks immediately, then every second until [`stop`](Self::stop).
    pub fn start(&self) -> Result<JoinHandle<()>, TaskError> {
        let run = self.task.begin("phase clock")?;
        let core = Arc::clone(&self.core);

        Ok(tokio::spawn(async move {
            debug!("phase clock started");
            while run.is_active() {
                core.tick();
                tokio::select! {
                    _ = run.stopped() => break,
                    _ = tokio::time::sleep(CLOCK_TICK) => {}
                }
            }
            debug!("phase clock stopped");
        }))
    }

    /// Idempotent.
    pub fn stop(&self) {
        self.task.stop();
    }
}

impl Drop for PhaseClock {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(h: u32, m: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 2, 9, h, m, s).unwrap()
    }

    async fn settle() {
        for _ in 0..5 {
            tokio::task::yield_now().await;
        }
    }

    #[test]
    fn tick_writes_phase_and_countdowns() {
        let session = Session::new();
        let time = Arc::new(ManualClock::new(at(0, 59, 0)));
        let clock = PhaseClock::new(PhaseSchedule::default(), session.clone(), time.clone(), SaleMode::Schedule);

        assert_eq!(clock.tick(), Phase::NotStarted);
        {
            let s = session.read();
            assert_eq!(s.countdowns.og, "1m");
            assert_eq!(s.quantity.max_mint(), 0);
        }

        time.set(at(1, 0, 0));
        assert_eq!(clock.tick(), Phase::Og);
        let s = session.read();
        assert_eq!(s.phase, Phase::Og);
        assert_eq!(s.countdowns.og, "2d");
        assert_eq!(s.quantity.max_mint(), 3);
    }

    #[test]
    fn zones_mode_leaves_quantity_alone() {
        let session = Session::new();
        session.write().quantity.set_max_mint(7);
        let time = Arc::new(ManualClock::new(at(2, 0, 0)));
        let clock = PhaseClock::new(PhaseSchedule::default(), session.clone(), time, SaleMode::Zones);
        clock.tick();
        assert_eq!(session.read().quantity.max_mint(), 7);
    }

    #[tokio::test(start_paused = true)]
    async fn countdown_follows_the_clock_not_the_tick_count() {
        let session = Session::new();
        let time = Arc::new(ManualClock::new(at(0, 59, 50)));
        let clock = PhaseClock::new(PhaseSchedule::default(), session.clone(), time.clone(), SaleMode::Schedule);

        let handle = clock.start().unwrap();
        assert_eq!(clock.start().unwrap_err(), TaskError::AlreadyRunning("phase clock"));
        settle().await;
        assert_eq!(session.read().countdowns.og, "10s");

        // A late tick jumps straight to the current value.
        time.advance(chrono::Duration::seconds(4));
        tokio::time::sleep(CLOCK_TICK).await;
        settle().await;
        assert_eq!(session.read().countdowns.og, "6s");

        clock.stop();
        handle.await.unwrap();
        assert!(!clock.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn restart_before_old_loop_exits_keeps_new_loop() {
        let session = Session::new();
        let time = Arc::new(ManualClock::new(at(0, 59, 50)));
        let clock = PhaseClock::new(PhaseSchedule::default(), session.clone(), time.clone(), SaleMode::Schedule);

        let first = clock.start().unwrap();
        settle().await;
        clock.stop();
        let second = clock.start().unwrap();
        first.await.unwrap();

        time.advance(chrono::Duration::seconds(5));
        tokio::time::sleep(CLOCK_TICK * 2).await;
        settle().await;
        assert!(clock.is_running());
        assert_eq!(session.read().countdowns.og, "5s");

        clock.stop();
        second.await.unwrap();
        assert!(!clock.is_running());
    }
}
