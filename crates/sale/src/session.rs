//! # Mint Session
//!
//! All mutable state of one mint session lives in a single
//! [`SessionState`] behind [`Session`], a cheap-to-clone shared handle.
//! The clock, the poller and the purchase flow all write into it; writes
//! are last-writer-wins and nothing is merged.
//!
//! Nothing here is persisted. A new session starts from defaults.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::phase::{CountdownStrings, Phase};
use crate::quantity::QuantityControl;
use crate::zone::{ZoneInfo, ZoneRules, ZoneState};

#[derive(Debug, Clone, Default)]
pub struct SessionState {
    pub connected_address: Option<String>,
    pub quantity: QuantityControl,
    /// Optimistic after a local mint, overwritten by every successful poll.
    pub total_minted: u64,
    /// Last successfully applied zone snapshot.
    pub zone: Option<ZoneState>,
    pub consecutive_fetch_failures: u32,

    pub phase: Phase,
    pub countdowns: CountdownStrings,

    /// A mint batch is running.
    pub loading: bool,
    pub show_success: bool,
    /// Single user-visible error slot; a new error replaces the old one.
    pub last_error: Option<String>,
    /// Informational message, e.g. a lost lucky draw.
    pub notice: Option<String>,
    /// Client construction failed; minting stays disabled for this session.
    pub client_init_failed: bool,
}

impl SessionState {
    #[must_use]
    pub fn last_successful_fetch(&self) -> Option<DateTime<Utc>> {
        self.zone.as_ref().map(|z| z.last_update)
    }

    /// Eligibility of the connected address in the current zone.
    #[must_use]
    pub fn current_zone_info(&self, rules: &ZoneRules) -> Option<ZoneInfo> {
        self.zone
            .as_ref()
            .map(|z| z.current_zone_info(self.connected_address.as_deref(), rules))
    }

    pub fn set_error(&mut self, message: impl Into<String>) {
        self.last_error = Some(message.into());
    }

    /// Clears both message slots at the start of an action.
    pub fn clear_messages(&mut self) {
        self.last_error = None;
        self.notice = None;
    }

    /// `total_minted / total_supply * 100`, clamped to `[0, 100]`.
    #[must_use]
    pub fn minted_percent(&self, total_supply: u64) -> f64 {
        minted_percent(self.total_minted, total_supply)
    }
}

#[must_use]
pub fn minted_percent(total_minted: u64, total_supply: u64) -> f64 {
    if total_supply == 0 {
        return 0.0;
    }
    (total_minted as f64 / total_supply as f64 * 100.0).clamp(0.0, 100.0)
}

/// Shared handle to a [`SessionState`].
#[derive(Debug, Clone, Default)]
pub struct Session(Arc<RwLock<SessionState>>);

impl Session {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn read(&self) -> RwLockReadGuard<'_, SessionState> {
        self.0.read()
    }

    pub fn write(&self) -> RwLockWriteGuard<'_, SessionState> {
        self.0.write()
    }

    /// Copy of the current state.
    #[must_use]
    pub fn snapshot(&self) -> SessionState {
        self.0.read().clone()
    }
}
