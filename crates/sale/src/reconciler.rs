//! # Zone State Reconciler
//!
//! Polls the sale process and replaces the session's zone snapshot with
//! each successful response.
//!
//! ```text
//!            ┌──────────── sleep(policy.interval) ◀──────────┐
//!            ▼                                                │
//!   get_info ─▶ decode ─▶ query_nft_count ─▶ apply ──────────┤
//!       │          │             │                            │
//!       └──────────┴─────────────┴──▶ keep last-known-good ──┘
//!                                     record failure
//! ```
//!
//! ## Invariants
//!
//! - A failed fetch never touches the previous snapshot.
//! - A successful fetch overwrites `total_minted`, including any optimistic
//!   value written by the purchase flow.
//! - The poll cadence is read from [`PollPolicy`] before each sleep.
//! - Shutdown interrupts only the sleep; a fetch in progress completes.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};
use thiserror::Error;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::client::{ClientError, SaleClient};
use crate::clock::TimeSource;
use crate::config::SaleMode;
use crate::error::TaskError;
use crate::info::{decode_sale_info, DecodeError, SaleInfo};
use crate::poll::{CadenceChange, PollConfig, PollPolicy};
use crate::session::{Session, SessionState};
use crate::task::TaskSlot;
use crate::zone::{ZoneRules, ZoneState};

/// Why a fetch produced no snapshot.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    #[error("no sale client")]
    NoClient,

    #[error(transparent)]
    Client(#[from] ClientError),

    #[error(transparent)]
    Decode(#[from] DecodeError),
}

struct ReconcilerCore {
    client: RwLock<Option<Arc<dyn SaleClient>>>,
    session: Session,
    policy: Mutex<PollPolicy>,
    rules: ZoneRules,
    mode: SaleMode,
    time: Arc<dyn TimeSource>,
}

impl ReconcilerCore {
    async fn fetch(&self) -> Result<(SaleInfo, u64), FetchError> {
        let client = self.client.read().clone().ok_or(FetchError::NoClient)?;
        let raw = client.get_info().await?;
        let info = decode_sale_info(&raw)?;
        let available = client.query_nft_count().await?;
        Ok((info, available))
    }

    async fn fetch_and_apply(&self) -> bool {
        match self.fetch().await {
            Ok((info, available)) => {
                let zone = ZoneState { info, available, last_update: self.time.now() };
                let change = self.policy.lock().record_success();
                self.apply(zone);
                if change == CadenceChange::Reset {
                    info!("zone fetch recovered, poll interval reset");
                }
                true
            }
            Err(FetchError::NoClient) => {
                debug!("zone fetch skipped: no sale client yet");
                false
            }
            Err(e) => {
                let (change, failures, interval) = {
                    let mut policy = self.policy.lock();
                    let change = policy.record_failure();
                    (change, policy.consecutive_failures(), policy.interval())
                };
                self.session.write().consecutive_fetch_failures = failures;
                warn!(error = %e, failures, "zone fetch failed");
                if change == CadenceChange::Escalated {
                    warn!(interval_secs = interval.as_secs(), "poll interval escalated");
                }
                false
            }
        }
    }

    fn apply(&self, zone: ZoneState) {
        let mut state = self.session.write();
        let minted = zone.total_minted(self.rules.total_supply);
        debug!(
            zone = zone.current_zone(),
            available = zone.available,
            total_minted = minted,
            "zone state applied"
        );
        state.total_minted = minted;
        state.consecutive_fetch_failures = 0;
        state.zone = Some(zone);
        if self.mode == SaleMode::Zones {
            apply_zone_bound(&mut state, &self.rules);
        }
    }
}

/// Sets the quantity bound from the connected address's current-zone limit.
pub fn apply_zone_bound(state: &mut SessionState, rules: &ZoneRules) {
    let max = state.current_zone_info(rules).map_or(0, |z| z.max_mint());
    state.quantity.set_max_mint(max);
}

/// Adaptive poller over a [`SaleClient`].
///
/// Cloning yields another handle to the same poller.
#[derive(Clone)]
pub struct ZoneStateReconciler {
    core: Arc<ReconcilerCore>,
    task: Arc<TaskSlot>,
    refresh: Arc<Notify>,
}

impl ZoneStateReconciler {
    #[must_use]
    pub fn new(
        session: Session,
        rules: ZoneRules,
        poll: PollConfig,
        mode: SaleMode,
        time: Arc<dyn TimeSource>,
    ) -> Self {
        Self {
            core: Arc::new(ReconcilerCore {
                client: RwLock::new(None),
                session,
                policy: Mutex::new(PollPolicy::new(poll)),
                rules,
                mode,
                time,
            }),
            task: Arc::new(TaskSlot::default()),
            refresh: Arc::new(Notify::new()),
        }
    }

    #[must_use]
    pub fn with_client(self, client: Arc<dyn SaleClient>) -> Self {
        self.set_client(client);
        self
    }

    pub fn set_client(&self, client: Arc<dyn SaleClient>) {
        *self.core.client.write() = Some(client);
    }

    /// One fetch. On success the snapshot and `total_minted` are replaced;
    /// on failure the previous snapshot stays and the failure is counted.
    pub async fn fetch_and_apply(&self) -> bool {
        self.core.fetch_and_apply().await
    }

    /// Current poll policy.
    #[must_use]
    pub fn policy(&self) -> PollPolicy {
        self.core.policy.lock().clone()
    }

    #[must_use]
    pub fn rules(&self) -> ZoneRules {
        self.core.rules
    }

    /// `None` when purchases may proceed at `now`, otherwise the reason.
    #[must_use]
    pub fn minting_block_reason(&self, now: DateTime<Utc>) -> Option<String> {
        let window = self.core.policy.lock().config().freshness_window;
        let state = self.core.session.read();
        if state.client_init_failed {
            return Some("sale client failed to initialize".to_string());
        }
        match &state.zone {
            None => Some("zone data not loaded".to_string()),
            Some(zone) if zone.is_stale(now, window) => Some(format!(
                "zone data is stale ({}s old)",
                zone.age(now).num_seconds()
            )),
            Some(_) => None,
        }
    }

    /// False when zone data is missing or older than the freshness window,
    /// or the client failed to initialize.
    #[must_use]
    pub fn is_minting_enabled(&self, now: DateTime<Utc>) -> bool {
        self.minting_block_reason(now).is_none()
    }

    /// Wakes the poll loop for an immediate fetch.
    pub fn request_refresh(&self) {
        self.refresh.notify_one();
    }

    pub fn is_running(&self) -> bool {
        self.task.is_running()
    }

    /// Fetches immediately, then once per policy interval until
    /// [`stop`](Self::stop).
    pub fn start(&self) -> Result<JoinHandle<()>, TaskError> {
        let run = self.task.begin("zone poller")?;
        let core = Arc::clone(&self.core);
        let refresh = Arc::clone(&self.refresh);

        Ok(tokio::spawn(async move {
            debug!("zone poller started");
            while run.is_active() {
                core.fetch_and_apply().await;

                let interval = core.policy.lock().interval();
                tokio::select! {
                    _ = run.stopped() => break,
                    _ = refresh.notified() => debug!("out-of-band zone refresh"),
                    _ = tokio::time::sleep(interval) => {}
                }
            }
            debug!("zone poller stopped");
        }))
    }

    /// Idempotent. A fetch in progress is allowed to finish.
    pub fn stop(&self) {
        self.task.stop();
    }
}
