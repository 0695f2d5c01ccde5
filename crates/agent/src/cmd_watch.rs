//! `mintsale watch`: phase clock and zone poller side by side.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tracing::{info, warn};

use mintsale_core::{PhaseClock, Session, SystemClock, TimeSource, ZoneStateReconciler};

use crate::context::AppContext;

const REPORT_EVERY: Duration = Duration::from_secs(5);

pub async fn run(ctx: &AppContext) -> Result<()> {
    let config = &ctx.config;
    let session = Session::new();
    session.write().connected_address = ctx.address(None);
    let time: Arc<dyn TimeSource> = Arc::new(SystemClock);

    let clock = PhaseClock::new(config.schedule, session.clone(), Arc::clone(&time), config.mode);
    let reconciler = ZoneStateReconciler::new(
        session.clone(),
        config.zone_rules(),
        config.poll,
        config.mode,
        Arc::clone(&time),
    );
    match ctx.client().await {
        Ok(client) => reconciler.set_client(client),
        Err(e) => warn!(error = %format!("{e:#}"), "zone polling disabled"),
    }

    let clock_task = clock.start()?;
    let poll_task = reconciler.start()?;
    info!(mode = ?config.mode, "watching sale, Ctrl-C to stop");

    let rules = config.zone_rules();
    let mut ticker = tokio::time::interval(REPORT_EVERY);
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            _ = ticker.tick() => {
                let state = session.snapshot();
                let zone = state.current_zone_info(&rules);
                info!(
                    phase = %state.phase,
                    countdown = state.countdowns.for_phase(state.phase),
                    zone = ?zone.as_ref().map(|z| z.zone),
                    can_purchase = ?zone.as_ref().map(|z| z.can_purchase),
                    max_mint = state.quantity.max_mint(),
                    total_minted = state.total_minted,
                    minted_percent = %format!("{:.1}", state.minted_percent(rules.total_supply)),
                    failures = state.consecutive_fetch_failures,
                    degraded = reconciler.policy().is_degraded(),
                    minting_enabled = reconciler.is_minting_enabled(time.now()),
                    "sale state"
                );
            }
        }
    }

    info!("stopping");
    clock.stop();
    reconciler.stop();
    clock_task.await?;
    poll_task.await?;
    Ok(())
}
