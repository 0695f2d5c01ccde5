//! `mintsale phase`: the time-driven view of the sale.

use std::sync::Arc;

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;

use mintsale_core::constants::CLOCK_TICK;
use mintsale_core::{Phase, PhaseBoard, PhaseClock, PhaseSchedule, Session, SystemClock};

use crate::context::AppContext;

#[derive(Debug, Serialize)]
pub struct PhaseReport {
    pub at: DateTime<Utc>,
    pub phase: Phase,
    pub title: &'static str,
    pub price: &'static str,
    pub note: &'static str,
    pub max_mint: u32,
    pub minting_enabled: bool,
    pub board: PhaseBoard,
}

impl PhaseReport {
    pub fn at(schedule: &PhaseSchedule, now: DateTime<Utc>) -> Self {
        let phase = schedule.phase_at(now);
        let info = phase.info();
        Self {
            at: now,
            phase,
            title: info.title,
            price: if info.show_price { info.price } else { "" },
            note: info.note,
            max_mint: info.max_mint,
            minting_enabled: schedule.is_minting_enabled_at(now),
            board: schedule.board(now),
        }
    }

    pub fn to_table(&self) -> String {
        let mut output = String::new();
        output.push_str("┌──────────────┬──────────────────────────────────────────┬──────────────────┬──────────────────┐\n");
        output.push_str(&format!(
            "│ {:12} │ {:40} │ {:16} │ {:>16} │\n",
            self.title,
            self.note,
            self.price,
            format!("max {}", self.max_mint)
        ));
        output.push_str("├──────────────┼──────────────────────────────────────────┼──────────────────┼──────────────────┤\n");
        for card in self.board.cards() {
            output.push_str(&format!(
                "│ {:12} │ {:40} │ {:16} │ {:>16} │\n",
                card.name, card.status, card.label, card.time
            ));
        }
        output.push_str("└──────────────┴──────────────────────────────────────────┴──────────────────┴──────────────────┘\n");
        output
    }
}

pub async fn run(ctx: &AppContext, at: Option<DateTime<Utc>>, watch: bool, json: bool) -> Result<()> {
    let schedule = ctx.config.schedule;

    if !watch {
        let report = PhaseReport::at(&schedule, at.unwrap_or_else(Utc::now));
        if json {
            println!("{}", serde_json::to_string_pretty(&report)?);
        } else {
            print!("{}", report.to_table());
        }
        return Ok(());
    }

    let session = Session::new();
    let clock = PhaseClock::new(schedule, session.clone(), Arc::new(SystemClock), ctx.config.mode);
    let handle = clock.start()?;

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            _ = tokio::time::sleep(CLOCK_TICK) => {
                let state = session.snapshot();
                println!(
                    "{:<11} og: {:<16} fcfs: {:<16} public: {}",
                    state.phase.to_string(),
                    state.countdowns.og,
                    state.countdowns.fcfs,
                    state.countdowns.public
                );
            }
        }
    }

    clock.stop();
    handle.await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn report_before_start() {
        let now = Utc.with_ymd_and_hms(2025, 2, 8, 1, 0, 0).unwrap();
        let report = PhaseReport::at(&PhaseSchedule::default(), now);
        assert_eq!(report.phase, Phase::NotStarted);
        assert!(!report.minting_enabled);
        assert_eq!(report.price, "");
        assert_eq!(report.board.og.time, "1d");
        assert!(report.to_table().contains("Time Until Start"));
    }

    #[test]
    fn report_serializes_phase_name() {
        let now = Utc.with_ymd_and_hms(2025, 2, 9, 1, 0, 0).unwrap();
        let report = PhaseReport::at(&PhaseSchedule::default(), now);
        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["phase"], "OG");
        assert_eq!(value["max_mint"], 3);
        assert_eq!(value["minting_enabled"], true);
    }
}
