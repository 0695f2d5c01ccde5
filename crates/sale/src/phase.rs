//! # Sale Phases
//!
//! The time-driven variant of the sale: a fixed [`PhaseSchedule`] of UTC
//! windows, and pure functions that map an instant onto a [`Phase`], the
//! per-phase countdown strings and the status cards shown to buyers.
//!
//! ## Window Semantics
//!
//! ```text
//!  OG     [start ─────────────── end)
//!  FCFS          [start ── end)
//!  PUBLIC                  [start ──────────────────────▶
//! ```
//!
//! - Closed windows are half-open: `start <= t < end`. An instant exactly
//!   on a boundary belongs to the phase that begins there.
//! - PUBLIC is open-ended and must be last.
//! - Windows may overlap. The current phase is the *first* window, in
//!   schedule order, that contains `t`.
//! - Validation rejects gaps, so every instant at or after the first start
//!   maps to exactly one phase, and the phase never moves backwards.
//!
//! All functions take `now` as a parameter; nothing here reads a clock.

use std::fmt;

use chrono::{DateTime, Datelike, TimeZone, Timelike, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::countdown::format_countdown;

// ════════════════════════════════════════════════════════════════════════════════
// PHASE
// ════════════════════════════════════════════════════════════════════════════════

/// A discrete stage of the time-driven sale, ordered chronologically.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Phase {
    #[default]
    NotStarted,
    Og,
    Fcfs,
    Public,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::NotStarted => "NOT_STARTED",
            Self::Og => "OG",
            Self::Fcfs => "FCFS",
            Self::Public => "PUBLIC",
        };
        write!(f, "{}", s)
    }
}

/// Presentation and quantity policy attached to a phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseInfo {
    pub title: &'static str,
    pub note: &'static str,
    /// Price label in payment-token units; empty when no price applies.
    pub price: &'static str,
    /// Largest quantity a single mint may request. Zero disables the control.
    pub max_mint: u32,
    pub show_price: bool,
}

impl Phase {
    /// Static descriptor for this phase.
    #[must_use]
    pub const fn info(self) -> PhaseInfo {
        match self {
            Self::Og => PhaseInfo {
                title: "OG Phase",
                note: "Guaranteed mint for OG members",
                price: "0.5 wAR",
                max_mint: 3,
                show_price: true,
            },
            Self::Fcfs => PhaseInfo {
                title: "FCFS Phase",
                note: "First come first served",
                price: "1 wAR",
                max_mint: 3,
                show_price: true,
            },
            Self::Public => PhaseInfo {
                title: "Public Phase",
                note: "Open for everyone",
                price: "1 wAR",
                max_mint: 3,
                show_price: true,
            },
            Self::NotStarted => PhaseInfo {
                title: "Not Started",
                note: "Minting will start soon",
                price: "",
                max_mint: 0,
                show_price: false,
            },
        }
    }

    /// Whether purchases are possible during this phase.
    #[must_use]
    pub const fn is_live(self) -> bool {
        !matches!(self, Self::NotStarted)
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// WINDOWS
// ════════════════════════════════════════════════════════════════════════════════

/// A phase's time window. `end == None` means open-ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseWindow {
    pub start: DateTime<Utc>,
    #[serde(default)]
    pub end: Option<DateTime<Utc>>,
}

impl PhaseWindow {
    #[must_use]
    pub fn closed(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end: Some(end) }
    }

    #[must_use]
    pub fn open(start: DateTime<Utc>) -> Self {
        Self { start, end: None }
    }

    /// `start <= now < end`, or `start <= now` when open-ended.
    #[must_use]
    pub fn contains(&self, now: DateTime<Utc>) -> bool {
        now >= self.start && self.end.map_or(true, |end| now < end)
    }

    #[must_use]
    pub fn is_completed(&self, now: DateTime<Utc>) -> bool {
        self.end.map_or(false, |end| now >= end)
    }

    /// The instant the countdown for this window should run towards:
    /// the start while upcoming, the end while active, nothing afterwards.
    #[must_use]
    pub fn countdown_target(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        if now < self.start {
            return Some(self.start);
        }
        match self.end {
            Some(end) if now < end => Some(end),
            _ => None,
        }
    }
}

/// Errors from [`PhaseSchedule::validate`].
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ScheduleError {
    #[error("{phase} window ends at or before it starts")]
    EmptyWindow { phase: Phase },

    #[error("{phase} window starts before the preceding window")]
    OutOfOrder { phase: Phase },

    #[error("gap before {phase}: no window covers {from} .. {to}")]
    Gap {
        phase: Phase,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    },

    #[error("PUBLIC window must be open-ended")]
    ClosedTerminal,
}

/// The three sale windows in chronological order.
///
/// Windows left out of a config keep their default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhaseSchedule {
    pub og: PhaseWindow,
    pub fcfs: PhaseWindow,
    pub public: PhaseWindow,
}

impl Default for PhaseSchedule {
    /// The February 2025 launch: OG for 48 hours from 01:00 UTC on the 9th,
    /// FCFS from 17:00 to 23:00 UTC on the 9th, PUBLIC from 22:59 UTC on the 9th.
    fn default() -> Self {
        let at = |d, h, m| Utc.with_ymd_and_hms(2025, 2, d, h, m, 0).single().unwrap_or_default();
        Self {
            og: PhaseWindow::closed(at(9, 1, 0), at(11, 1, 0)),
            fcfs: PhaseWindow::closed(at(9, 17, 0), at(9, 23, 0)),
            public: PhaseWindow::open(at(9, 22, 59)),
        }
    }
}

impl PhaseSchedule {
    /// Windows paired with their phase, in schedule order.
    #[must_use]
    pub fn windows(&self) -> [(Phase, &PhaseWindow); 3] {
        [
            (Phase::Og, &self.og),
            (Phase::Fcfs, &self.fcfs),
            (Phase::Public, &self.public),
        ]
    }

    /// The instant the sale opens.
    #[must_use]
    pub fn global_start(&self) -> DateTime<Utc> {
        self.og.start
    }

    /// Checks ordering, non-empty closed windows, an open-ended terminal
    /// window and gap-free coverage from the first start onwards.
    pub fn validate(&self) -> Result<(), ScheduleError> {
        if self.public.end.is_some() {
            return Err(ScheduleError::ClosedTerminal);
        }

        let mut previous_start: Option<DateTime<Utc>> = None;
        // Latest end seen so far; None once an open-ended window is seen.
        let mut covered_until: Option<DateTime<Utc>> = None;

        for (phase, window) in self.windows() {
            if let Some(end) = window.end {
                if end <= window.start {
                    return Err(ScheduleError::EmptyWindow { phase });
                }
            }
            if let Some(prev) = previous_start {
                if window.start < prev {
                    return Err(ScheduleError::OutOfOrder { phase });
                }
            }
            if let Some(until) = covered_until {
                if window.start > until {
                    return Err(ScheduleError::Gap { phase, from: until, to: window.start });
                }
            }
            covered_until = match (covered_until, window.end) {
                (Some(a), Some(b)) => Some(a.max(b)),
                (None, Some(b)) if previous_start.is_none() => Some(b),
                (_, None) => None,
                (other, _) => other,
            };
            previous_start = Some(window.start);
        }
        Ok(())
    }

    /// Current phase at `now`.
    ///
    /// Before the first start this is [`Phase::NotStarted`]; otherwise the
    /// first window that contains `now`.
    #[must_use]
    pub fn phase_at(&self, now: DateTime<Utc>) -> Phase {
        compute_phase(now, self)
    }

    /// Countdown strings for every phase at `now`.
    #[must_use]
    pub fn countdowns(&self, now: DateTime<Utc>) -> CountdownStrings {
        let render = |w: &PhaseWindow| {
            w.countdown_target(now)
                .map(|target| format_countdown(target, now))
                .unwrap_or_default()
        };
        CountdownStrings {
            og: render(&self.og),
            fcfs: render(&self.fcfs),
            public: render(&self.public),
        }
    }

    /// Whether minting is open at `now` in the time-driven variant.
    #[must_use]
    pub fn is_minting_enabled_at(&self, now: DateTime<Utc>) -> bool {
        self.phase_at(now).is_live()
    }

    /// Status cards for the three phases.
    #[must_use]
    pub fn board(&self, now: DateTime<Utc>) -> PhaseBoard {
        let countdowns = self.countdowns(now);
        PhaseBoard {
            og: PhaseCard::build(Phase::Og, &self.og, now, countdowns.og),
            fcfs: PhaseCard::build(Phase::Fcfs, &self.fcfs, now, countdowns.fcfs),
            public: PhaseCard::build(Phase::Public, &self.public, now, countdowns.public),
        }
    }
}

/// Sequential boundary comparison over the schedule's windows.
#[must_use]
pub fn compute_phase(now: DateTime<Utc>, schedule: &PhaseSchedule) -> Phase {
    if now < schedule.global_start() {
        return Phase::NotStarted;
    }
    for (phase, window) in schedule.windows() {
        if window.contains(now) {
            return phase;
        }
    }
    // Unreachable for a validated schedule; the terminal window is open-ended.
    if now >= schedule.public.start {
        Phase::Public
    } else {
        Phase::NotStarted
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// DERIVED DISPLAY STATE
// ════════════════════════════════════════════════════════════════════════════════

/// Human countdown per phase; empty when the phase has nothing left to count.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CountdownStrings {
    pub og: String,
    pub fcfs: String,
    pub public: String,
}

impl CountdownStrings {
    #[must_use]
    pub fn for_phase(&self, phase: Phase) -> &str {
        match phase {
            Phase::Og => &self.og,
            Phase::Fcfs => &self.fcfs,
            Phase::Public => &self.public,
            Phase::NotStarted => "",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CardState {
    Upcoming,
    Active,
    Completed,
}

/// One phase's status card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PhaseCard {
    pub name: &'static str,
    pub state: CardState,
    pub status: String,
    pub label: &'static str,
    pub time: String,
}

impl PhaseCard {
    fn build(phase: Phase, window: &PhaseWindow, now: DateTime<Utc>, countdown: String) -> Self {
        let state = if now < window.start {
            CardState::Upcoming
        } else if window.is_completed(now) {
            CardState::Completed
        } else {
            CardState::Active
        };

        let status = match state {
            CardState::Upcoming => format!("Starts {}", announce(window.start)),
            CardState::Completed => "Completed".to_string(),
            CardState::Active => active_text(phase, window),
        };

        let (label, time) = match state {
            CardState::Completed => ("", String::new()),
            _ if countdown.is_empty() => ("", String::new()),
            CardState::Upcoming => ("Time Until Start", countdown),
            CardState::Active => ("Time Remaining", countdown),
        };

        Self { name: phase.info().title, state, status, label, time }
    }

    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.state == CardState::Completed
    }
}

/// Status cards for OG, FCFS and PUBLIC.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PhaseBoard {
    pub og: PhaseCard,
    pub fcfs: PhaseCard,
    pub public: PhaseCard,
}

impl PhaseBoard {
    #[must_use]
    pub fn cards(&self) -> [&PhaseCard; 3] {
        [&self.og, &self.fcfs, &self.public]
    }
}

fn active_text(phase: Phase, window: &PhaseWindow) -> String {
    let headline = match phase {
        Phase::Og => "Guaranteed Mint",
        Phase::Fcfs => "First Come First Served",
        Phase::Public | Phase::NotStarted => "Open for Everyone",
    };
    match window.end {
        Some(end) => {
            let hours = end.signed_duration_since(window.start).num_hours();
            format!("Active - {} ({} Hours)", headline, hours)
        }
        None => format!("Active - {}", headline),
    }
}

/// "9th Feb 01:00 UTC"
fn announce(at: DateTime<Utc>) -> String {
    let day = at.day();
    let suffix = match (day % 10, day % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    };
    format!(
        "{}{} {} {:02}:{:02} UTC",
        day,
        suffix,
        at.format("%b"),
        at.hour(),
        at.minute()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn t(d: u32, h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 2, d, h, m, 0).unwrap()
    }

    /// Non-overlapping schedule where every phase is reachable.
    fn sequential() -> PhaseSchedule {
        PhaseSchedule {
            og: PhaseWindow::closed(t(9, 1, 0), t(9, 17, 0)),
            fcfs: PhaseWindow::closed(t(9, 17, 0), t(9, 23, 0)),
            public: PhaseWindow::open(t(9, 23, 0)),
        }
    }

    #[test]
    fn default_schedule_is_valid() {
        assert_eq!(PhaseSchedule::default().validate(), Ok(()));
        assert_eq!(PhaseSchedule::default().global_start(), t(9, 1, 0));
    }

    #[test]
    fn before_first_start_is_not_started() {
        let s = sequential();
        assert_eq!(s.phase_at(t(9, 0, 59)), Phase::NotStarted);
    }

    #[test]
    fn boundary_instant_belongs_to_new_phase() {
        let s = sequential();
        assert_eq!(s.phase_at(t(9, 1, 0)), Phase::Og);
        assert_eq!(s.phase_at(t(9, 17, 0) - Duration::seconds(1)), Phase::Og);
        assert_eq!(s.phase_at(t(9, 17, 0)), Phase::Fcfs);
        assert_eq!(s.phase_at(t(9, 23, 0)), Phase::Public);
        assert_eq!(s.phase_at(t(20, 0, 0)), Phase::Public);
    }

    #[test]
    fn overlapping_windows_pick_first_in_order() {
        // Default schedule: OG spans FCFS entirely, so OG wins until it ends.
        let s = PhaseSchedule::default();
        assert_eq!(s.phase_at(t(9, 18, 0)), Phase::Og);
        assert_eq!(s.phase_at(t(10, 12, 0)), Phase::Og);
        assert_eq!(s.phase_at(t(11, 1, 0)), Phase::Public);
    }

    #[test]
    fn phase_is_monotonic_over_time() {
        for schedule in [sequential(), PhaseSchedule::default()] {
            let mut now = t(8, 0, 0);
            let mut last = Phase::NotStarted;
            while now < t(13, 0, 0) {
                let phase = schedule.phase_at(now);
                assert!(phase >= last, "phase regressed from {last} to {phase} at {now}");
                last = phase;
                now += Duration::minutes(7);
            }
            assert_eq!(last, Phase::Public);
        }
    }

    #[test]
    fn validate_rejects_gaps() {
        let s = PhaseSchedule {
            og: PhaseWindow::closed(t(9, 1, 0), t(9, 10, 0)),
            fcfs: PhaseWindow::closed(t(9, 12, 0), t(9, 20, 0)),
            public: PhaseWindow::open(t(9, 20, 0)),
        };
        assert_eq!(
            s.validate(),
            Err(ScheduleError::Gap { phase: Phase::Fcfs, from: t(9, 10, 0), to: t(9, 12, 0) })
        );
    }

    #[test]
    fn validate_rejects_bad_windows() {
        let mut s = sequential();
        s.og.end = Some(s.og.start);
        assert_eq!(s.validate(), Err(ScheduleError::EmptyWindow { phase: Phase::Og }));

        let mut s = sequential();
        s.public.end = Some(t(28, 0, 0));
        assert_eq!(s.validate(), Err(ScheduleError::ClosedTerminal));

        let mut s = sequential();
        s.fcfs = PhaseWindow::closed(t(9, 0, 0), t(9, 23, 0));
        assert_eq!(s.validate(), Err(ScheduleError::OutOfOrder { phase: Phase::Fcfs }));
    }

    #[test]
    fn countdowns_track_each_window_independently() {
        let s = sequential();
        let before = s.countdowns(t(9, 0, 0));
        assert_eq!(before.og, "1h");
        assert_eq!(before.fcfs, "17h");
        assert_eq!(before.public, "23h");

        let during_og = s.countdowns(t(9, 16, 30));
        assert_eq!(during_og.og, "30m");
        assert_eq!(during_og.fcfs, "30m");

        let after = s.countdowns(t(10, 0, 0));
        assert_eq!(after, CountdownStrings::default());
    }

    #[test]
    fn not_started_disables_quantity() {
        assert_eq!(Phase::NotStarted.info().max_mint, 0);
        assert!(!Phase::NotStarted.info().show_price);
        assert_eq!(Phase::Og.info().price, "0.5 wAR");
        assert_eq!(Phase::Public.info().max_mint, 3);
    }

    #[test]
    fn minting_opens_at_global_start() {
        let s = sequential();
        assert!(!s.is_minting_enabled_at(t(9, 0, 59)));
        assert!(s.is_minting_enabled_at(t(9, 1, 0)));
    }

    #[test]
    fn board_before_start() {
        let board = sequential().board(t(9, 0, 0));
        assert_eq!(board.og.state, CardState::Upcoming);
        assert_eq!(board.og.status, "Starts 9th Feb 01:00 UTC");
        assert_eq!(board.og.label, "Time Until Start");
        assert_eq!(board.og.time, "1h");
        assert_eq!(board.public.status, "Starts 9th Feb 23:00 UTC");
    }

    #[test]
    fn board_during_and_after() {
        let s = sequential();
        let board = s.board(t(9, 18, 0));
        assert!(board.og.is_completed());
        assert_eq!(board.og.status, "Completed");
        assert_eq!(board.og.time, "");
        assert_eq!(board.fcfs.state, CardState::Active);
        assert_eq!(board.fcfs.status, "Active - First Come First Served (6 Hours)");
        assert_eq!(board.fcfs.label, "Time Remaining");
        assert_eq!(board.fcfs.time, "5h");

        let later = s.board(t(10, 0, 0));
        assert_eq!(later.public.state, CardState::Active);
        assert_eq!(later.public.status, "Active - Open for Everyone");
        assert_eq!(later.public.label, "");
        assert!(!later.public.is_completed());
    }

    #[test]
    fn announce_uses_ordinal_suffixes() {
        assert_eq!(announce(t(1, 2, 5)), "1st Feb 02:05 UTC");
        assert_eq!(announce(t(2, 0, 0)), "2nd Feb 00:00 UTC");
        assert_eq!(announce(t(3, 0, 0)), "3rd Feb 00:00 UTC");
        assert_eq!(announce(t(11, 0, 0)), "11th Feb 00:00 UTC");
        assert_eq!(announce(t(22, 0, 0)), "22nd Feb 00:00 UTC");
    }

    #[test]
    fn schedule_deserializes_from_rfc3339() {
        let raw = r#"{
            "og": {"start": "2025-02-09T01:00:00Z", "end": "2025-02-11T01:00:00Z"},
            "fcfs": {"start": "2025-02-09T17:00:00Z", "end": "2025-02-09T23:00:00Z"},
            "public": {"start": "2025-02-09T22:59:00Z"}
        }"#;
        let parsed: PhaseSchedule = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed, PhaseSchedule::default());
    }
}
