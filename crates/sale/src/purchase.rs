//! # Purchase Controller
//!
//! Drives one mint batch from the connect step to the post-purchase
//! reconciliation.
//!
//! ```text
//! mint(quantity, lucky)
//!   ├─ in-flight flag ────────────── taken?  → MintInProgress
//!   ├─ wallet connected? ─────────── no      → connect (+ create client)
//!   ├─ client present? ───────────── no      → ClientNotInitialized
//!   ├─ minting enabled, quantity ok? no      → MintingDisabled / InvalidQuantity
//!   ├─ lucky: roll ≤ probability? ── no      → BetterLuckNextTime (no call)
//!   ├─ quantity × purchase call ──── error   → abort, earlier calls stand
//!   └─ total_minted += quantity, success flag, refresh now and after the flag clears
//! ```
//!
//! The lucky-draw roll happens here, on the caller's side. Anyone running a
//! modified client can skip it; it is not a fairness guarantee and the sale
//! process must not treat it as one.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};
use rand::Rng;
use tracing::{debug, info, warn};

use crate::client::{ClientError, SaleClient, SaleClientFactory};
use crate::clock::TimeSource;
use crate::config::{SaleConfig, SaleMode};
use crate::error::MintError;
use crate::reconciler::{apply_zone_bound, ZoneStateReconciler};
use crate::session::Session;
use crate::wallet::{Wallet, WalletError, REQUIRED_PERMISSIONS};

/// Message shown when a lucky draw does not proceed.
pub const BETTER_LUCK_NOTICE: &str = "Better luck next time!";

/// Uniform draws in `[0, 1)`.
pub trait RandomSource: Send + Sync {
    fn next_f64(&self) -> f64;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadRandom;

impl RandomSource for ThreadRandom {
    fn next_f64(&self) -> f64 {
        rand::thread_rng().gen::<f64>()
    }
}

/// Always returns the same value.
#[derive(Debug, Clone, Copy)]
pub struct FixedRandom(pub f64);

impl RandomSource for FixedRandom {
    fn next_f64(&self) -> f64 {
        self.0
    }
}

/// Result of a mint call that did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MintOutcome {
    Minted { quantity: u32 },
    /// Lucky draw lost; nothing was purchased.
    BetterLuckNextTime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Operation {
    Purchase,
    LuckyDraw,
}

impl Operation {
    fn label(self) -> &'static str {
        match self {
            Self::Purchase => "Purchase",
            Self::LuckyDraw => "Lucky draw",
        }
    }

    fn wrap(self, error: ClientError) -> MintError {
        match (self, error) {
            (Self::Purchase, ClientError::Purchase(msg)) => MintError::Purchase(msg),
            (Self::LuckyDraw, ClientError::Purchase(msg)) => MintError::LuckyDraw(msg),
            (_, other) => MintError::Client(other.to_string()),
        }
    }
}

/// Clears the in-flight flag and the loading indicator when a batch ends.
struct InFlight<'a> {
    flag: &'a AtomicBool,
    session: &'a Session,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.session.write().loading = false;
        self.flag.store(false, Ordering::SeqCst);
    }
}

pub struct PurchaseController {
    config: SaleConfig,
    session: Session,
    wallet: Arc<dyn Wallet>,
    factory: Arc<dyn SaleClientFactory>,
    reconciler: ZoneStateReconciler,
    random: Arc<dyn RandomSource>,
    time: Arc<dyn TimeSource>,
    client: RwLock<Option<Arc<dyn SaleClient>>>,
    init_error: Mutex<Option<String>>,
    in_flight: AtomicBool,
}

impl PurchaseController {
    #[must_use]
    pub fn new(
        config: SaleConfig,
        session: Session,
        wallet: Arc<dyn Wallet>,
        factory: Arc<dyn SaleClientFactory>,
        reconciler: ZoneStateReconciler,
        time: Arc<dyn TimeSource>,
    ) -> Self {
        Self {
            config,
            session,
            wallet,
            factory,
            reconciler,
            random: Arc::new(ThreadRandom),
            time,
            client: RwLock::new(None),
            init_error: Mutex::new(None),
            in_flight: AtomicBool::new(false),
        }
    }

    #[must_use]
    pub fn with_random(mut self, random: Arc<dyn RandomSource>) -> Self {
        self.random = random;
        self
    }

    #[must_use]
    pub fn session(&self) -> &Session {
        &self.session
    }

    #[must_use]
    pub fn is_in_flight(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst)
    }

    fn client(&self) -> Option<Arc<dyn SaleClient>> {
        self.client.read().clone()
    }

    // ════════════════════════════════════════════════════════════════════════════
    // CONNECT
    // ════════════════════════════════════════════════════════════════════════════

    /// Connects the wallet and, on first success, creates the sale client.
    ///
    /// A client construction failure is remembered: later calls return the
    /// same [`MintError::ClientInit`] without retrying.
    pub async fn connect(&self) -> Result<String, MintError> {
        self.wallet.connect(&REQUIRED_PERMISSIONS).await.map_err(wallet_error)?;
        let address = self.wallet.active_address().await.map_err(wallet_error)?;
        info!(address = %address, "wallet connected");

        {
            let mut state = self.session.write();
            state.connected_address = Some(address.clone());
            if self.config.mode == SaleMode::Zones {
                apply_zone_bound(&mut state, &self.reconciler.rules());
            }
        }

        if let Some(reason) = self.init_error.lock().clone() {
            return Err(MintError::ClientInit(reason));
        }
        if self.client().is_none() {
            match self.factory.create(&self.config).await {
                Ok(client) => {
                    *self.client.write() = Some(Arc::clone(&client));
                    self.reconciler.set_client(client);
                    debug!("sale client created");
                    self.reconciler.fetch_and_apply().await;
                }
                Err(e) => {
                    let reason = e.to_string();
                    warn!(error = %reason, "sale client initialization failed, minting disabled");
                    *self.init_error.lock() = Some(reason.clone());
                    self.session.write().client_init_failed = true;
                    return Err(MintError::ClientInit(reason));
                }
            }
        }
        Ok(address)
    }

    // ════════════════════════════════════════════════════════════════════════════
    // MINT
    // ════════════════════════════════════════════════════════════════════════════

    /// Runs one mint batch of `quantity` sequential purchases.
    ///
    /// Errors are also written to the session's error slot; a lost lucky
    /// draw is written to the notice slot instead.
    pub async fn mint(&self, quantity: u32, is_lucky_draw: bool) -> Result<MintOutcome, MintError> {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(MintError::MintInProgress);
        }
        let _in_flight = InFlight { flag: &self.in_flight, session: &self.session };
        {
            let mut state = self.session.write();
            state.loading = true;
            state.clear_messages();
        }

        let result = self.run(quantity, is_lucky_draw).await;
        match &result {
            Ok(MintOutcome::BetterLuckNextTime) => {
                self.session.write().notice = Some(BETTER_LUCK_NOTICE.to_string());
            }
            Ok(MintOutcome::Minted { .. }) => {}
            Err(e) => self.session.write().set_error(e.to_string()),
        }
        result
    }

    async fn run(&self, quantity: u32, is_lucky_draw: bool) -> Result<MintOutcome, MintError> {
        let connected = self.session.read().connected_address.is_some();
        if !connected || self.client().is_none() {
            self.connect().await?;
        }
        let client = self.client().ok_or(MintError::ClientNotInitialized)?;

        let now = self.time.now();
        let max = self.check_enabled(now)?;
        if quantity == 0 || quantity > max {
            return Err(MintError::InvalidQuantity { requested: quantity, max });
        }

        let op = if is_lucky_draw {
            let roll = self.random.next_f64();
            let threshold = self.config.purchase.lucky_draw_probability;
            if roll > threshold {
                info!(roll, threshold, "lucky draw lost, no purchase made");
                return Ok(MintOutcome::BetterLuckNextTime);
            }
            info!(roll, threshold, "lucky draw won");
            Operation::LuckyDraw
        } else {
            Operation::Purchase
        };

        info!(quantity, operation = op.label(), "mint started");
        for done in 0..quantity {
            if let Err(e) = self.call(client.as_ref(), op).await {
                warn!(completed = done, requested = quantity, error = %e, "mint aborted");
                return Err(e);
            }
        }

        self.session.write().total_minted += u64::from(quantity);
        info!(quantity, "mint succeeded");
        self.flag_success();
        Ok(MintOutcome::Minted { quantity })
    }

    /// Upper quantity bound if minting is open at `now`.
    fn check_enabled(&self, now: DateTime<Utc>) -> Result<u32, MintError> {
        match self.config.mode {
            SaleMode::Zones => {
                if let Some(reason) = self.reconciler.minting_block_reason(now) {
                    return Err(MintError::MintingDisabled(reason));
                }
                let rules = self.reconciler.rules();
                let info = self.session.read().current_zone_info(&rules);
                match info {
                    Some(z) if z.can_purchase => Ok(z.max_mint()),
                    Some(z) if !z.is_whitelisted => Err(MintError::MintingDisabled(format!(
                        "address is not whitelisted for zone {}",
                        z.zone
                    ))),
                    Some(z) => Err(MintError::MintingDisabled(format!(
                        "purchase limit of {} reached for zone {}",
                        z.limit, z.zone
                    ))),
                    None => Err(MintError::MintingDisabled("zone data not loaded".to_string())),
                }
            }
            SaleMode::Schedule => {
                if !self.config.schedule.is_minting_enabled_at(now) {
                    return Err(MintError::MintingDisabled("sale has not started".to_string()));
                }
                Ok(self.config.schedule.phase_at(now).info().max_mint)
            }
        }
    }

    async fn call(&self, client: &dyn SaleClient, op: Operation) -> Result<(), MintError> {
        let accepted = match op {
            Operation::Purchase => client.purchase_nft().await,
            Operation::LuckyDraw => match client.lucky_draw().await {
                Err(ClientError::Unsupported(_)) => {
                    debug!("lucky draw unsupported, falling back to purchase");
                    client.purchase_nft().await
                }
                other => other,
            },
        }
        .map_err(|e| op.wrap(e))?;

        if accepted {
            Ok(())
        } else {
            Err(MintError::Client(ClientError::Rejected(op.label()).to_string()))
        }
    }

    // ════════════════════════════════════════════════════════════════════════════
    // POST-PURCHASE
    // ════════════════════════════════════════════════════════════════════════════

    fn spawn_refresh(&self) {
        let reconciler = self.reconciler.clone();
        tokio::spawn(async move {
            reconciler.fetch_and_apply().await;
        });
    }

    /// Raises the success flag, refreshes now, and again once the flag clears.
    fn flag_success(&self) {
        self.session.write().show_success = true;
        self.spawn_refresh();

        let session = self.session.clone();
        let reconciler = self.reconciler.clone();
        let hold = self.config.purchase.success_indicator;
        tokio::spawn(async move {
            tokio::time::sleep(hold).await;
            session.write().show_success = false;
            reconciler.fetch_and_apply().await;
        });
    }
}

fn wallet_error(e: WalletError) -> MintError {
    match e {
        WalletError::Unavailable => MintError::WalletUnavailable,
        other => MintError::WalletConnect(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn purchase_errors_are_wrapped_per_operation() {
        let domain = ClientError::Purchase("insufficient balance".into());
        assert_eq!(
            Operation::Purchase.wrap(domain.clone()).to_string(),
            "Purchase failed: insufficient balance"
        );
        assert_eq!(
            Operation::LuckyDraw.wrap(domain).to_string(),
            "Lucky draw failed: insufficient balance"
        );
        assert_eq!(
            Operation::Purchase.wrap(ClientError::Transport("reset".into())).to_string(),
            "transport error: reset"
        );
    }

    #[test]
    fn rejected_call_message() {
        assert_eq!(ClientError::Rejected(Operation::Purchase.label()).to_string(), "Purchase failed");
    }

    #[test]
    fn wallet_errors_map_to_taxonomy() {
        assert_eq!(wallet_error(WalletError::Unavailable), MintError::WalletUnavailable);
        assert_eq!(
            wallet_error(WalletError::Rejected("denied".into())),
            MintError::WalletConnect("denied".into())
        );
    }

    #[test]
    fn thread_random_in_unit_interval() {
        for _ in 0..100 {
            let v = ThreadRandom.next_f64();
            assert!((0.0..1.0).contains(&v));
        }
    }
}
